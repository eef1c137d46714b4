use thiserror::Error;

/// Result type for pricing model operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Errors raised while decoding, validating or dispatching pricing models
#[derive(Debug, Error)]
pub enum PricingError {
    /// The payload's discriminator is missing or not registered for this union
    #[error("Invalid data: {union} payload does not match any known variant (discriminator: {discriminator:?})")]
    UnrecognizedVariant {
        union: &'static str,
        discriminator: Option<String>,
    },

    /// The discriminator matched, but the payload did not fit the variant's shape
    #[error("Invalid data: {union} payload tagged '{variant}' could not be decoded: {source}")]
    VariantDecodingFailed {
        union: &'static str,
        variant: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The discriminator matched, but the payload did not fit the variant's
    /// shape and was kept as unknown
    #[error("Invalid data: {union} payload tagged '{variant}' does not fit that variant: {reason}")]
    MalformedVariant {
        union: &'static str,
        variant: &'static str,
        reason: String,
    },

    /// An exhaustive dispatch was attempted on an unknown variant
    #[error("Invalid data: cannot dispatch on {union}, payload holds an unknown variant")]
    DispatchOnUnknown { union: &'static str },

    /// Field-level validation failures
    #[error("Invalid data: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Cross-field validation failure
    #[error("Invalid data in {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Malformed JSON bytes, or a model that could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PricingError {
    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        PricingError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the payload was well-formed JSON but not acceptable data
    pub fn is_invalid_data(&self) -> bool {
        !matches!(self, PricingError::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_variant_message_names_union() {
        let err = PricingError::UnrecognizedVariant {
            union: "ConversionRateConfig",
            discriminator: Some("percentage".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("ConversionRateConfig"));
        assert!(message.contains("percentage"));
        assert!(err.is_invalid_data());
    }

    #[test]
    fn test_json_error_is_not_invalid_data() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!PricingError::from(source).is_invalid_data());
    }
}
