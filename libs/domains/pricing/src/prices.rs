//! Price models, discriminated by `model_type`.

use serde::{Deserialize, Serialize};

use crate::conversion_rate::{AllocationConversionRateConfig, ConversionRateConfig};
use crate::error::PricingResult;
use crate::models::{
    BulkConfig, PackageConfig, PackageWithAllocationConfig, PriceBase, TieredConfig, UnitConfig,
};
use crate::union::{
    DecodePolicy, TaggedUnion, UnionSchema, ValidateModel, union_accessors, union_variants,
};

fn validate_conversion<S: UnionSchema>(config: Option<&TaggedUnion<S>>) -> PricingResult<()> {
    match config {
        Some(config) => config.validate(),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPrice {
    #[serde(flatten)]
    pub base: PriceBase,
    pub unit_config: UnitConfig,
    #[serde(default)]
    pub conversion_rate_config: Option<ConversionRateConfig>,
}

impl ValidateModel for UnitPrice {
    fn validate_model(&self) -> PricingResult<()> {
        self.base.validate_model()?;
        self.unit_config.validate_model()?;
        validate_conversion(self.conversion_rate_config.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredPrice {
    #[serde(flatten)]
    pub base: PriceBase,
    pub tiered_config: TieredConfig,
    #[serde(default)]
    pub conversion_rate_config: Option<ConversionRateConfig>,
}

impl ValidateModel for TieredPrice {
    fn validate_model(&self) -> PricingResult<()> {
        self.base.validate_model()?;
        self.tiered_config.validate_model()?;
        validate_conversion(self.conversion_rate_config.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagePrice {
    #[serde(flatten)]
    pub base: PriceBase,
    pub package_config: PackageConfig,
    #[serde(default)]
    pub conversion_rate_config: Option<ConversionRateConfig>,
}

impl ValidateModel for PackagePrice {
    fn validate_model(&self) -> PricingResult<()> {
        self.base.validate_model()?;
        self.package_config.validate_model()?;
        validate_conversion(self.conversion_rate_config.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkPrice {
    #[serde(flatten)]
    pub base: PriceBase,
    pub bulk_config: BulkConfig,
    #[serde(default)]
    pub conversion_rate_config: Option<ConversionRateConfig>,
}

impl ValidateModel for BulkPrice {
    fn validate_model(&self) -> PricingResult<()> {
        self.base.validate_model()?;
        self.bulk_config.validate_model()?;
        validate_conversion(self.conversion_rate_config.as_ref())
    }
}

/// Package price with a recurring allocation.
///
/// Its conversion-rate config decodes strictly: a malformed one fails this
/// shape, so inside [`Price`] the whole price degrades to unknown and its
/// validation reports the conversion-rate error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageWithAllocationPrice {
    #[serde(flatten)]
    pub base: PriceBase,
    pub package_with_allocation_config: PackageWithAllocationConfig,
    #[serde(default)]
    pub conversion_rate_config: Option<AllocationConversionRateConfig>,
}

impl ValidateModel for PackageWithAllocationPrice {
    fn validate_model(&self) -> PricingResult<()> {
        self.base.validate_model()?;
        self.package_with_allocation_config.validate_model()?;
        validate_conversion(self.conversion_rate_config.as_ref())
    }
}

union_variants! {
    /// Registered `model_type` shapes
    pub enum PriceVariant on "model_type" {
        Unit(UnitPrice) = "unit",
        Tiered(TieredPrice) = "tiered",
        Package(PackagePrice) = "package",
        Bulk(BulkPrice) = "bulk",
        PackageWithAllocation(PackageWithAllocationPrice) = "package_with_allocation",
    }
}

impl PriceVariant {
    /// Fields shared by every price model
    pub fn base(&self) -> &PriceBase {
        match self {
            PriceVariant::Unit(price) => &price.base,
            PriceVariant::Tiered(price) => &price.base,
            PriceVariant::Package(price) => &price.base,
            PriceVariant::Bulk(price) => &price.base,
            PriceVariant::PackageWithAllocation(price) => &price.base,
        }
    }
}

pub struct PriceSchema;

impl UnionSchema for PriceSchema {
    type Variants = PriceVariant;
    const NAME: &'static str = "Price";
    const POLICY: DecodePolicy = DecodePolicy::Lenient;
}

/// A price of any model type. Unknown model types survive a round trip.
pub type Price = TaggedUnion<PriceSchema>;

union_accessors! {
    Price, PriceVariant {
        Unit(UnitPrice) => from_unit, try_unit, on_unit;
        Tiered(TieredPrice) => from_tiered, try_tiered, on_tiered;
        Package(PackagePrice) => from_package, try_package, on_package;
        Bulk(BulkPrice) => from_bulk, try_bulk, on_bulk;
        PackageWithAllocation(PackageWithAllocationPrice) =>
            from_package_with_allocation, try_package_with_allocation, on_package_with_allocation;
    }
}

impl Price {
    /// Price id, read from the decoded model or, for unknown models, the raw payload
    pub fn id(&self) -> Option<&str> {
        match self.variant() {
            Some(variant) => Some(variant.base().id.as_str()),
            None => self
                .raw()
                .and_then(|raw| raw.get("id"))
                .and_then(serde_json::Value::as_str),
        }
    }
}
