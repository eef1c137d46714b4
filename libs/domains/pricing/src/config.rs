use core_config::{ConfigError, FromEnv, env_parse};

/// Options for turning API payloads into models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelOptions {
    /// Validate every decoded response and reject invalid or unknown variants
    pub response_validation: bool,
}

impl ModelOptions {
    pub fn with_response_validation(mut self, enabled: bool) -> Self {
        self.response_validation = enabled;
        self
    }
}

impl FromEnv for ModelOptions {
    /// Reads `PRICING_RESPONSE_VALIDATION` (bool, default false)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            response_validation: env_parse("PRICING_RESPONSE_VALIDATION", false)?,
        })
    }
}
