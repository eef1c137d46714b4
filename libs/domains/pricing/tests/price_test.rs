//! Price union and codec tests
//!
//! Payload fixtures follow the list/get responses of the prices API, including
//! fields this client does not model.

use chrono::{TimeZone, Utc};
use domain_pricing::*;
use serde_json::{Value, json};

fn price_payload(model_type: &str, config_key: &str, config: Value) -> Value {
    let mut price = json!({
        "id": "price_9Xk2",
        "name": "API requests",
        "external_price_id": null,
        "currency": "USD",
        "cadence": "monthly",
        "price_type": "usage_price",
        "item": {"id": "item_41", "name": "API requests"},
        "billable_metric": {"id": "bm_7"},
        "billing_cycle_configuration": {"duration": 1, "duration_unit": "month"},
        "fixed_price_quantity": null,
        "minimum_amount": null,
        "maximum_amount": "500.00",
        "plan_phase_order": null,
        "conversion_rate": null,
        "conversion_rate_config": null,
        "metadata": {"team": "platform"},
        "created_at": "2024-03-01T12:00:00+00:00",
        "model_type": model_type,
        "dimensional_price_configuration": null
    });
    price[config_key] = config;
    price
}

fn unit_price_payload() -> Value {
    price_payload("unit", "unit_config", json!({"unit_amount": "0.002"}))
}

fn package_with_allocation_payload(conversion: Value) -> Value {
    let mut price = price_payload(
        "package_with_allocation",
        "package_with_allocation_config",
        json!({"allocation": "1000", "package_amount": "25.00", "package_size": "100"}),
    );
    price["conversion_rate_config"] = conversion;
    price
}

fn sample_base() -> PriceBase {
    PriceBase::new(
        "price_out",
        "Seats",
        "USD",
        ItemSlim {
            id: "item_seats".to_string(),
            name: "Seats".to_string(),
        },
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

// ============================================================================
// Price union
// ============================================================================

#[test]
fn test_unit_price_round_trips_with_unmodelled_fields() {
    let raw = unit_price_payload();
    let price = Price::decode(raw.clone()).unwrap();

    let unit = price.try_unit().expect("unit price");
    assert_eq!(unit.base.id, "price_9Xk2");
    assert_eq!(unit.base.cadence, Cadence::Monthly);
    assert_eq!(unit.base.metadata.get("team").map(String::as_str), Some("platform"));
    assert!(unit.conversion_rate_config.is_none());

    price.validate().unwrap();
    assert_eq!(serde_json::to_value(&price).unwrap(), raw);
}

#[test]
fn test_every_registered_model_type_decodes() {
    let cases = [
        unit_price_payload(),
        price_payload(
            "tiered",
            "tiered_config",
            json!({"tiers": [
                {"first_unit": 0, "last_unit": 10, "unit_amount": "1.00"},
                {"first_unit": 10, "last_unit": null, "unit_amount": "0.50"}
            ]}),
        ),
        price_payload(
            "package",
            "package_config",
            json!({"package_amount": "5.00", "package_size": 10}),
        ),
        price_payload(
            "bulk",
            "bulk_config",
            json!({"tiers": [
                {"maximum_units": 100, "unit_amount": "1.00"},
                {"maximum_units": null, "unit_amount": "0.75"}
            ]}),
        ),
        package_with_allocation_payload(Value::Null),
    ];

    for raw in cases {
        let expected = raw["model_type"].as_str().unwrap().to_string();
        let price = Price::decode(raw.clone()).unwrap();
        assert_eq!(price.tag(), Some(expected.as_str()));
        assert_eq!(price.id(), Some("price_9Xk2"));
        price.validate().unwrap();
        assert_eq!(price.to_json().unwrap(), &raw);
    }
}

#[test]
fn test_unknown_model_type_is_kept() {
    let raw = price_payload(
        "matrix",
        "matrix_config",
        json!({"dimensions": ["region"], "default_unit_amount": "1.00"}),
    );
    let price = Price::decode(raw.clone()).unwrap();

    assert!(!price.is_known());
    assert_eq!(price.discriminator(), Some("matrix"));
    assert_eq!(price.id(), Some("price_9Xk2"));
    assert!(matches!(
        price.validate(),
        Err(PricingError::UnrecognizedVariant { union: "Price", .. })
    ));
    assert_eq!(price.into_json().unwrap(), raw);
}

#[test]
fn test_unknown_enum_values_do_not_degrade_price() {
    let mut raw = unit_price_payload();
    raw["cadence"] = json!("biennial");
    let price = Price::decode(raw.clone()).unwrap();

    let unit = price.try_unit().expect("still a unit price");
    assert_eq!(unit.base.cadence, Cadence::Unknown);
    assert_eq!(price.to_json().unwrap(), &raw);
}

#[test]
fn test_nested_lenient_union_keeps_unknown_conversion() {
    let mut raw = unit_price_payload();
    raw["conversion_rate_config"] = json!({"conversion_rate_type": "percentage", "rate": 3});
    let price = Price::decode(raw).unwrap();

    let unit = price.try_unit().expect("unit price");
    let conversion = unit.conversion_rate_config.as_ref().unwrap();
    assert!(!conversion.is_known());

    assert!(matches!(
        price.validate(),
        Err(PricingError::UnrecognizedVariant {
            union: "ConversionRateConfig",
            ..
        })
    ));
}

#[test]
fn test_nested_strict_union_failure_degrades_outer_price() {
    let raw = package_with_allocation_payload(json!({"conversion_rate_type": "tiered"}));

    let direct = serde_json::from_value::<PackageWithAllocationPrice>(raw.clone());
    let message = direct.unwrap_err().to_string();
    assert!(message.contains("AllocationConversionRateConfig"));

    let price = Price::decode(raw.clone()).unwrap();
    assert!(!price.is_known());
    assert_eq!(price.discriminator(), Some("package_with_allocation"));
    assert_eq!(price.to_json().unwrap(), &raw);
}

#[test]
fn test_nested_strict_failure_reported_by_validating_codec() {
    let raw = package_with_allocation_payload(json!({"conversion_rate_type": "tiered"}));
    let bytes = serde_json::to_vec(&raw).unwrap();

    let price = PriceCodec::default().decode_price(&bytes).unwrap();
    let (variant, reason) = price.rejection().expect("rejection recorded");
    assert_eq!(variant, "package_with_allocation");
    assert!(reason.contains("AllocationConversionRateConfig"));

    let validating = PriceCodec::new(ModelOptions::default().with_response_validation(true));
    match validating.decode_price(&bytes).unwrap_err() {
        PricingError::MalformedVariant {
            union,
            variant,
            reason,
        } => {
            assert_eq!(union, "Price");
            assert_eq!(variant, "package_with_allocation");
            assert!(reason.contains("AllocationConversionRateConfig"));
            assert!(reason.contains("tiered"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_strict_nested_union_accepts_well_formed_config() {
    let raw = package_with_allocation_payload(json!({
        "conversion_rate_type": "unit",
        "unit_config": {"unit_amount": "0.01"}
    }));
    let price = Price::decode(raw).unwrap();

    let allocation = price.try_package_with_allocation().expect("allocation price");
    let conversion = allocation.conversion_rate_config.as_ref().unwrap();
    assert!(conversion.try_unit().is_some());
    price.validate().unwrap();
}

#[test]
fn test_price_validation_reports_bad_config() {
    let raw = price_payload(
        "package",
        "package_config",
        json!({"package_amount": "5.00", "package_size": 0}),
    );
    let price = Price::decode(raw).unwrap();

    assert!(price.try_package().is_some());
    assert!(matches!(price.validate(), Err(PricingError::Validation(_))));
}

#[test]
fn test_match_variant_over_prices() {
    let price = Price::decode(unit_price_payload()).unwrap();
    let label = price
        .match_variant(
            |_| "unit",
            |_| "tiered",
            |_| "package",
            |_| "bulk",
            |_| "package_with_allocation",
        )
        .unwrap();
    assert_eq!(label, "unit");
}

// ============================================================================
// Outbound construction
// ============================================================================

#[test]
fn test_constructed_price_encodes_and_decodes_back() {
    let price = Price::from_unit(UnitPrice {
        base: sample_base(),
        unit_config: UnitConfig::new("12.00"),
        conversion_rate_config: Some(ConversionRateConfig::from_unit(
            UnitConversionRateConfig::new("1.10"),
        )),
    });
    price.validate().unwrap();

    let encoded = price.to_json().unwrap().clone();
    assert_eq!(encoded["model_type"], "unit");
    assert_eq!(encoded["id"], "price_out");
    assert_eq!(encoded["conversion_rate_config"]["conversion_rate_type"], "unit");
    assert_eq!(encoded["billing_cycle_configuration"]["duration_unit"], "month");

    let decoded = Price::decode(encoded).unwrap();
    assert_eq!(decoded, price);
    assert_eq!(
        decoded.try_unit().map(|u| u.unit_config.unit_amount.as_str()),
        Some("12.00")
    );
}

#[test]
fn test_price_variant_base_accessor() {
    let price: Price = BulkPrice {
        base: sample_base(),
        bulk_config: BulkConfig {
            tiers: vec![BulkTier {
                maximum_units: None,
                unit_amount: "3.00".to_string(),
            }],
        },
        conversion_rate_config: None,
    }
    .into();

    let base = price.visit(|variant| variant.base().clone()).unwrap();
    assert_eq!(base.name, "Seats");
    assert_eq!(price.tag(), Some("bulk"));
}

// ============================================================================
// Codec
// ============================================================================

#[test]
fn test_codec_decodes_page_with_unknown_entries() {
    let page = json!({
        "data": [
            unit_price_payload(),
            price_payload("matrix", "matrix_config", json!({}))
        ],
        "pagination_metadata": {"has_more": true, "next_cursor": "cur_2"}
    });
    let bytes = serde_json::to_vec(&page).unwrap();

    let lenient = PriceCodec::new(ModelOptions::default());
    let decoded = lenient.decode_page(&bytes).unwrap();
    assert_eq!(decoded.data.len(), 2);
    assert_eq!(decoded.unknown_count(), 1);
    assert_eq!(decoded.pagination_metadata.next_cursor.as_deref(), Some("cur_2"));

    let validating = PriceCodec::new(ModelOptions::default().with_response_validation(true));
    let err = validating.decode_page(&bytes).unwrap_err();
    assert!(err.is_invalid_data());
}

#[test]
fn test_codec_validates_single_price_when_enabled() {
    let mut raw = unit_price_payload();
    raw["unit_config"] = json!({"unit_amount": "free"});
    let bytes = serde_json::to_vec(&raw).unwrap();

    assert!(PriceCodec::default().decode_price(&bytes).is_ok());

    let validating = PriceCodec::new(ModelOptions {
        response_validation: true,
    });
    assert!(matches!(
        validating.decode_price(&bytes),
        Err(PricingError::Validation(_))
    ));
}

#[test]
fn test_codec_rejects_malformed_bytes() {
    let err = PriceCodec::default().decode_price(b"{\"id\":").unwrap_err();
    assert!(matches!(err, PricingError::Json(_)));
    assert!(!err.is_invalid_data());
}

#[test]
fn test_codec_encode_is_verbatim_for_decoded_prices() {
    let raw = unit_price_payload();
    let codec = PriceCodec::default();
    let price = codec.decode_price(&serde_json::to_vec(&raw).unwrap()).unwrap();

    let bytes = codec.encode_price(&price).unwrap();
    let reparsed: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reparsed, raw);
}
