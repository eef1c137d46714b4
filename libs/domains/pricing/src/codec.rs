//! Entry point between raw response bytes and price models.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ModelOptions;
use crate::error::PricingResult;
use crate::prices::Price;

/// Cursor metadata of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaginationMetadata {
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// One page of a price list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePage {
    pub data: Vec<Price>,
    pub pagination_metadata: PaginationMetadata,
}

impl PricePage {
    /// Number of entries whose model type this client does not know
    pub fn unknown_count(&self) -> usize {
        self.data.iter().filter(|price| !price.is_known()).count()
    }
}

/// Decodes and encodes price payloads according to [`ModelOptions`]
#[derive(Debug, Clone, Default)]
pub struct PriceCodec {
    options: ModelOptions,
}

impl PriceCodec {
    pub fn new(options: ModelOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Decode a single price, validating it when response validation is on
    #[instrument(skip_all, fields(len = bytes.len()))]
    pub fn decode_price(&self, bytes: &[u8]) -> PricingResult<Price> {
        let raw: serde_json::Value = serde_json::from_slice(bytes)?;
        let price = Price::decode(raw)?;
        debug!(known = price.is_known(), model_type = ?price.discriminator(), "decoded price");

        if self.options.response_validation {
            price.validate()?;
        }
        Ok(price)
    }

    /// Decode a list page, validating every entry when response validation is on
    #[instrument(skip_all, fields(len = bytes.len()))]
    pub fn decode_page(&self, bytes: &[u8]) -> PricingResult<PricePage> {
        let page: PricePage = serde_json::from_slice(bytes)?;
        debug!(
            entries = page.data.len(),
            unknown = page.unknown_count(),
            has_more = page.pagination_metadata.has_more,
            "decoded price page"
        );

        if self.options.response_validation {
            for price in &page.data {
                price.validate()?;
            }
        }
        Ok(page)
    }

    /// Encode a price for a request body
    #[instrument(skip_all, fields(model_type = ?price.discriminator()))]
    pub fn encode_price(&self, price: &Price) -> PricingResult<Vec<u8>> {
        Ok(serde_json::to_vec(price.to_json()?)?)
    }
}
