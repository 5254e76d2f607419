//! Property-based tests for the numerically sensitive primitives.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use backline_engine::entities::{Unit, UnitKind, UnitSystem};

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000, 0u32..=4).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn ratio_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000, 0u32..=4).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn test_unit(ratio: Decimal) -> Unit {
    Unit {
        id: Uuid::new_v4(),
        name: "test unit".to_string(),
        kind: UnitKind::Mass,
        to_base_ratio: ratio,
        system: UnitSystem::Metric,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // convert_from_base(convert_to_base(q)) == q within tolerance, for any
    // positive ratio.
    #[test]
    fn unit_conversion_round_trips(qty in quantity_strategy(), ratio in ratio_strategy()) {
        let unit = test_unit(ratio);
        let round_tripped = unit.from_base(unit.to_base(qty));
        let tolerance = Decimal::new(1, 6) * (Decimal::ONE + qty.abs());
        prop_assert!(
            (round_tripped - qty).abs() <= tolerance,
            "qty {} ratio {} round-tripped to {}",
            qty,
            ratio,
            round_tripped
        );
    }

    // Conversion is linear: converting a sum equals summing conversions.
    #[test]
    fn unit_conversion_is_additive(
        a in quantity_strategy(),
        b in quantity_strategy(),
        ratio in ratio_strategy(),
    ) {
        let unit = test_unit(ratio);
        prop_assert_eq!(unit.to_base(a + b), unit.to_base(a) + unit.to_base(b));
    }
}
