use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use strum::{Display, EnumString};
use validator::Validate;

use crate::error::{PricingError, PricingResult};
use crate::union::ValidateModel;

/// Decimal amounts travel as strings, e.g. "1.00" or "0.0025"
static DECIMAL_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("decimal amount pattern is valid"));

/// Custom validator for non-negative decimal amount strings
pub(crate) fn validate_decimal_amount(amount: &str) -> Result<(), validator::ValidationError> {
    if !DECIMAL_AMOUNT.is_match(amount) {
        return Err(validator::ValidationError::new("invalid_decimal_amount"));
    }
    Ok(())
}

/// Billing cadence of a price
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Cadence {
    OneTime,
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
    Custom,
    /// A cadence this client does not know yet
    #[serde(other)]
    Unknown,
}

/// Whether a price charges for usage or a fixed amount
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PriceType {
    #[default]
    UsagePrice,
    FixedPrice,
    CompositePrice,
    #[serde(other)]
    Unknown,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DurationUnit {
    Day,
    #[default]
    Month,
    #[serde(other)]
    Unknown,
}

/// Rate applied to every unit of usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UnitConfig {
    #[validate(custom(function = "validate_decimal_amount"))]
    pub unit_amount: String,
}

impl UnitConfig {
    pub fn new(unit_amount: impl Into<String>) -> Self {
        Self {
            unit_amount: unit_amount.into(),
        }
    }
}

impl ValidateModel for UnitConfig {
    fn validate_model(&self) -> PricingResult<()> {
        Ok(self.validate()?)
    }
}

/// One usage band of a tiered rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Tier {
    /// Inclusive lower bound of the band
    #[validate(range(min = 0.0))]
    pub first_unit: f64,
    /// Exclusive upper bound; `None` for the open-ended last band
    #[serde(default)]
    pub last_unit: Option<f64>,
    #[validate(custom(function = "validate_decimal_amount"))]
    pub unit_amount: String,
}

/// Graduated rates: usage in each band is charged at that band's rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TieredConfig {
    #[validate(length(min = 1), nested)]
    pub tiers: Vec<Tier>,
}

impl ValidateModel for TieredConfig {
    fn validate_model(&self) -> PricingResult<()> {
        self.validate()?;

        let mut previous_first = f64::NEG_INFINITY;
        for tier in &self.tiers {
            if let Some(last) = tier.last_unit {
                if last <= tier.first_unit {
                    return Err(PricingError::invalid_field(
                        "tiers",
                        format!(
                            "tier starting at {} must end after it starts (last_unit {last})",
                            tier.first_unit
                        ),
                    ));
                }
            }
            if tier.first_unit < previous_first {
                return Err(PricingError::invalid_field(
                    "tiers",
                    "tiers must be ordered by first_unit",
                ));
            }
            previous_first = tier.first_unit;
        }
        Ok(())
    }
}

/// Charge a flat amount per started package of units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PackageConfig {
    #[validate(custom(function = "validate_decimal_amount"))]
    pub package_amount: String,
    #[validate(range(min = 1))]
    pub package_size: i64,
}

impl ValidateModel for PackageConfig {
    fn validate_model(&self) -> PricingResult<()> {
        Ok(self.validate()?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BulkTier {
    /// Upper bound of total usage for this rate; `None` means unbounded
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub maximum_units: Option<f64>,
    #[validate(custom(function = "validate_decimal_amount"))]
    pub unit_amount: String,
}

/// Volume pricing: total usage selects one rate for every unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BulkConfig {
    #[validate(length(min = 1), nested)]
    pub tiers: Vec<BulkTier>,
}

impl ValidateModel for BulkConfig {
    fn validate_model(&self) -> PricingResult<()> {
        self.validate()?;

        let (last, bounded) = match self.tiers.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };
        if bounded.iter().any(|tier| tier.maximum_units.is_none()) {
            return Err(PricingError::invalid_field(
                "tiers",
                "only the last bulk tier may be unbounded",
            ));
        }
        let mut previous = f64::NEG_INFINITY;
        for maximum in bounded
            .iter()
            .chain(std::iter::once(last))
            .filter_map(|tier| tier.maximum_units)
        {
            if maximum <= previous {
                return Err(PricingError::invalid_field(
                    "tiers",
                    "bulk tier maximums must increase",
                ));
            }
            previous = maximum;
        }
        Ok(())
    }
}

/// Package pricing with a credit allocation granted each period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PackageWithAllocationConfig {
    #[validate(custom(function = "validate_decimal_amount"))]
    pub allocation: String,
    #[validate(custom(function = "validate_decimal_amount"))]
    pub package_amount: String,
    pub package_size: String,
}

impl ValidateModel for PackageWithAllocationConfig {
    fn validate_model(&self) -> PricingResult<()> {
        self.validate()?;
        match self.package_size.parse::<u64>() {
            Ok(size) if size > 0 => Ok(()),
            _ => Err(PricingError::invalid_field(
                "package_size",
                format!("expected a positive integer, got '{}'", self.package_size),
            )),
        }
    }
}

/// Reference to the item a price bills for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ItemSlim {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BillableMetricTiny {
    #[validate(length(min = 1))]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BillingCycleConfiguration {
    #[validate(range(min = 1))]
    pub duration: i64,
    pub duration_unit: DurationUnit,
}

impl Default for BillingCycleConfiguration {
    fn default() -> Self {
        Self {
            duration: 1,
            duration_unit: DurationUnit::Month,
        }
    }
}

/// Fields shared by every price model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PriceBase {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub external_price_id: Option<String>,
    /// ISO currency code or a custom credit currency
    #[validate(length(min = 1))]
    pub currency: String,
    pub cadence: Cadence,
    pub price_type: PriceType,
    #[validate(nested)]
    pub item: ItemSlim,
    #[serde(default)]
    #[validate(nested)]
    pub billable_metric: Option<BillableMetricTiny>,
    #[validate(nested)]
    pub billing_cycle_configuration: BillingCycleConfiguration,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fixed_price_quantity: Option<f64>,
    #[serde(default)]
    #[validate(custom(function = "validate_decimal_amount"))]
    pub minimum_amount: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_decimal_amount"))]
    pub maximum_amount: Option<String>,
    #[serde(default)]
    pub plan_phase_order: Option<i64>,
    /// Legacy single-number conversion rate to the invoicing currency
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub conversion_rate: Option<f64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl PriceBase {
    /// A minimal price base with defaults for every optional field
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        currency: impl Into<String>,
        item: ItemSlim,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            external_price_id: None,
            currency: currency.into(),
            cadence: Cadence::default(),
            price_type: PriceType::default(),
            item,
            billable_metric: None,
            billing_cycle_configuration: BillingCycleConfiguration::default(),
            fixed_price_quantity: None,
            minimum_amount: None,
            maximum_amount: None,
            plan_phase_order: None,
            conversion_rate: None,
            metadata: BTreeMap::new(),
            created_at,
        }
    }
}

impl ValidateModel for PriceBase {
    fn validate_model(&self) -> PricingResult<()> {
        Ok(self.validate()?)
    }
}
