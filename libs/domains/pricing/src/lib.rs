//! Pricing Domain
//!
//! Client-side models for a billing API's prices.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ PriceCodec  │  ← bytes in / bytes out, optional response validation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Prices    │  ← Price union over model_type, conversion-rate unions
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │    Union    │  ← discriminated union codec with unknown fallback
//! └─────────────┘
//! ```

pub mod codec;
pub mod config;
pub mod conversion_rate;
pub mod error;
pub mod models;
pub mod prices;
pub mod union;

// Re-export commonly used types
pub use codec::{PaginationMetadata, PriceCodec, PricePage};
pub use config::ModelOptions;
pub use conversion_rate::{
    AllocationConversionRateConfig, ConversionRateConfig, ConversionRateConfigVariant,
    TieredConversionRateConfig, UnitConversionRateConfig,
};
pub use error::{PricingError, PricingResult};
pub use models::{
    BillableMetricTiny, BillingCycleConfiguration, BulkConfig, BulkTier, Cadence, DurationUnit,
    ItemSlim, PackageConfig, PackageWithAllocationConfig, PriceBase, PriceType, Tier,
    TieredConfig, UnitConfig,
};
pub use prices::{
    BulkPrice, PackagePrice, PackageWithAllocationPrice, Price, PriceVariant, TieredPrice,
    UnitPrice,
};
pub use union::{DecodePolicy, TaggedUnion, UnionSchema, UnionVariants, ValidateModel, VariantOf};
