use serde::Deserialize;
use validator::Validate;

use crate::errors::ServiceError;

const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;
const DEFAULT_COST_SCALE: u32 = 4;

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

fn default_cost_scale() -> u32 {
    DEFAULT_COST_SCALE
}

fn default_enforce_component_policy() -> bool {
    true
}

/// Engine tuning knobs.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Capacity of the domain-event channel.
    #[serde(default = "default_event_buffer_size")]
    #[validate(range(min = 1))]
    pub event_buffer_size: usize,

    /// Decimal places monetary values are rounded to when cached or
    /// reported. Matches the 4-place money columns of the surrounding
    /// back-office schema.
    #[serde(default = "default_cost_scale")]
    #[validate(range(max = 18))]
    pub cost_scale: u32,

    /// Whether recipes flagged `can_be_ingredient = false` are rejected when
    /// added as components of other recipes.
    #[serde(default = "default_enforce_component_policy")]
    pub enforce_component_policy: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            cost_scale: DEFAULT_COST_SCALE,
            enforce_component_policy: true,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON configuration document and validates it.
    pub fn from_json(raw: &str) -> Result<Self, ServiceError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| ServiceError::ValidationError(format!("invalid config: {}", e)))?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config.event_buffer_size, 100);
        assert_eq!(config.cost_scale, 4);
        assert!(config.enforce_component_policy);
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let result = EngineConfig::from_json(r#"{"event_buffer_size": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = EngineConfig::from_json(r#"{"selected_store": "main"}"#);
        assert!(result.is_err());
    }
}
