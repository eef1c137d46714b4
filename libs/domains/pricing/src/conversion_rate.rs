//! Conversion-rate configuration: how a price's amounts convert into the
//! invoicing currency, discriminated by `conversion_rate_type`.

use serde::{Deserialize, Serialize};

use crate::error::PricingResult;
use crate::models::{Tier, TieredConfig, UnitConfig};
use crate::union::{
    DecodePolicy, TaggedUnion, UnionSchema, ValidateModel, union_accessors, union_variants,
};

/// A single conversion rate for every unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversionRateConfig {
    pub unit_config: UnitConfig,
}

impl ValidateModel for UnitConversionRateConfig {
    fn validate_model(&self) -> PricingResult<()> {
        self.unit_config.validate_model()
    }
}

/// Conversion rates that vary by usage band.
///
/// Decodes from `tiered_config.tiers` or from a flat top-level `tiers`;
/// always encodes as `tiered_config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TieredConversionRateWire")]
pub struct TieredConversionRateConfig {
    pub tiered_config: TieredConfig,
}

#[derive(Deserialize)]
struct TieredConversionRateWire {
    #[serde(default)]
    tiered_config: Option<TieredConfig>,
    #[serde(default)]
    tiers: Option<Vec<Tier>>,
}

impl TryFrom<TieredConversionRateWire> for TieredConversionRateConfig {
    type Error = String;

    fn try_from(wire: TieredConversionRateWire) -> Result<Self, Self::Error> {
        match (wire.tiered_config, wire.tiers) {
            (Some(tiered_config), None) => Ok(Self { tiered_config }),
            (None, Some(tiers)) => Ok(Self {
                tiered_config: TieredConfig { tiers },
            }),
            (Some(_), Some(_)) => {
                Err("tiered conversion rate has both `tiered_config` and `tiers`".to_string())
            }
            (None, None) => Err("missing field `tiered_config` or `tiers`".to_string()),
        }
    }
}

impl ValidateModel for TieredConversionRateConfig {
    fn validate_model(&self) -> PricingResult<()> {
        self.tiered_config.validate_model()
    }
}

union_variants! {
    /// Registered `conversion_rate_type` shapes
    pub enum ConversionRateConfigVariant on "conversion_rate_type" {
        Unit(UnitConversionRateConfig) = "unit",
        Tiered(TieredConversionRateConfig) = "tiered",
    }
}

pub struct ConversionRateConfigSchema;

impl UnionSchema for ConversionRateConfigSchema {
    type Variants = ConversionRateConfigVariant;
    const NAME: &'static str = "ConversionRateConfig";
    const POLICY: DecodePolicy = DecodePolicy::Lenient;
}

/// Conversion-rate config as carried by most prices.
///
/// A payload that fails to decode as its tagged shape is kept as unknown.
pub type ConversionRateConfig = TaggedUnion<ConversionRateConfigSchema>;

pub struct AllocationConversionRateConfigSchema;

impl UnionSchema for AllocationConversionRateConfigSchema {
    type Variants = ConversionRateConfigVariant;
    const NAME: &'static str = "AllocationConversionRateConfig";
    const POLICY: DecodePolicy = DecodePolicy::Strict;
}

/// Conversion-rate config on package-with-allocation prices.
///
/// A payload tagged `unit` or `tiered` that does not fit that shape is a
/// decoding error rather than an unknown variant.
pub type AllocationConversionRateConfig = TaggedUnion<AllocationConversionRateConfigSchema>;

union_accessors! {
    ConversionRateConfig, ConversionRateConfigVariant {
        Unit(UnitConversionRateConfig) => from_unit, try_unit, on_unit;
        Tiered(TieredConversionRateConfig) => from_tiered, try_tiered, on_tiered;
    }
}

union_accessors! {
    AllocationConversionRateConfig, ConversionRateConfigVariant {
        Unit(UnitConversionRateConfig) => from_unit, try_unit, on_unit;
        Tiered(TieredConversionRateConfig) => from_tiered, try_tiered, on_tiered;
    }
}

impl UnitConversionRateConfig {
    pub fn new(unit_amount: impl Into<String>) -> Self {
        Self {
            unit_config: UnitConfig::new(unit_amount),
        }
    }
}
