//! Reports over decoded price payloads

use domain_pricing::{Price, PriceCodec, PricePage, PricingResult};
use serde::Serialize;
use serde_json::Value;

/// A decoded input: either one price or one list page
#[derive(Debug)]
pub enum Payload {
    Single(Price),
    Page(PricePage),
}

impl Payload {
    /// Decode `bytes`, treating objects with `data` and `pagination_metadata` as a page
    pub fn decode(codec: &PriceCodec, bytes: &[u8]) -> PricingResult<Self> {
        let raw: Value = serde_json::from_slice(bytes)?;
        let is_page = raw.get("data").is_some_and(Value::is_array)
            && raw.get("pagination_metadata").is_some();

        if is_page {
            Ok(Payload::Page(codec.decode_page(bytes)?))
        } else {
            Ok(Payload::Single(codec.decode_price(bytes)?))
        }
    }

    pub fn prices(&self) -> &[Price] {
        match self {
            Payload::Single(price) => std::slice::from_ref(price),
            Payload::Page(page) => &page.data,
        }
    }

    pub fn to_json(&self) -> PricingResult<Value> {
        match self {
            Payload::Single(price) => Ok(price.to_json()?.clone()),
            Payload::Page(page) => Ok(serde_json::to_value(page)?),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PriceSummary {
    pub id: Option<String>,
    pub model_type: Option<String>,
    pub known: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub id: Option<String>,
    pub model_type: Option<String>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoundTripReport {
    pub identical: bool,
    pub encoded: Value,
}

pub fn summarize(payload: &Payload) -> Vec<PriceSummary> {
    payload
        .prices()
        .iter()
        .map(|price| PriceSummary {
            id: price.id().map(str::to_string),
            model_type: price.discriminator().map(str::to_string),
            known: price.is_known(),
        })
        .collect()
}

pub fn validate_all(payload: &Payload) -> Vec<ValidationReport> {
    payload
        .prices()
        .iter()
        .map(|price| {
            let error = price.validate().err().map(|e| e.to_string());
            ValidationReport {
                id: price.id().map(str::to_string),
                model_type: price.discriminator().map(str::to_string),
                valid: error.is_none(),
                error,
            }
        })
        .collect()
}

pub fn round_trip(input: &Value, payload: &Payload) -> PricingResult<RoundTripReport> {
    let encoded = payload.to_json()?;
    Ok(RoundTripReport {
        identical: &encoded == input,
        encoded,
    })
}
