use std::sync::Arc;

use morph_api::codec::TypeSupport;
use morph_api::metadata::{FieldDescriptor, FieldTag};
use morph_api::value::StorageValue;
use morph_engine::config::MappingConfig;
use morph_engine::dispatcher::Dispatcher;
use morph_engine::error::EngineError;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Currency {
    amount: f64,
    unit: String,
}

const MAPPING: &str = r#"
[[records]]
name = "Order"

[[records.fields]]
name = "price"
type = "currency"
converter = "json"

[[records.fields]]
name = "total"
type = "money"
converter = "json"
target = "currency"

[[records.fields]]
name = "created"
type = "epoch_seconds"
converter = "text"
params = { storage = "number" }
"#;

fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register_kind(Arc::new(conv_json::JsonConverterFactory));
    dispatcher.register_kind(Arc::new(conv_text::TextConverterFactory));
    dispatcher.register_type(TypeSupport::json::<Currency>("currency"));
    // u64 fields can be governed by either kind; the tag picks one.
    dispatcher.register_type(TypeSupport::json_text::<u64>("epoch_seconds"));
    dispatcher.register_type(TypeSupport::opaque("money"));
    dispatcher
}

#[test]
fn mapping_document_drives_a_full_round_trip() {
    let dispatcher = dispatcher();
    let mapping = MappingConfig::parse(MAPPING).unwrap();
    dispatcher.register_mapping(&mapping).unwrap();

    let price = Currency {
        amount: 79.99,
        unit: "USD".into(),
    };
    let total = Currency {
        amount: 85.49,
        unit: "USD".into(),
    };

    let item = dispatcher
        .marshal(
            "Order",
            &[
                ("price", &price),
                ("total", &total),
                ("created", &1_700_000_000u64),
            ],
        )
        .unwrap();

    assert_eq!(
        item["price"],
        StorageValue::Text(r#"{"amount":79.99,"unit":"USD"}"#.into())
    );
    assert_eq!(item["created"], StorageValue::Number("1700000000".into()));

    let values = dispatcher.unmarshal("Order", &item).unwrap();
    assert_eq!(values["price"].downcast_ref::<Currency>().unwrap(), &price);
    assert_eq!(values["total"].downcast_ref::<Currency>().unwrap(), &total);
    assert_eq!(values["created"].downcast_ref::<u64>().unwrap(), &1_700_000_000);
}

#[test]
fn mapping_document_matches_code_registration() {
    let from_config = dispatcher();
    from_config
        .register_mapping(&MappingConfig::parse(MAPPING).unwrap())
        .unwrap();

    let from_code = dispatcher();
    from_code
        .register_field(FieldDescriptor::new(
            "Order",
            "price",
            "currency",
            FieldTag::new("json"),
        ))
        .unwrap();
    from_code
        .register_field(FieldDescriptor::new(
            "Order",
            "total",
            "money",
            FieldTag::new("json").with_target("currency"),
        ))
        .unwrap();
    from_code
        .register_field(FieldDescriptor::new(
            "Order",
            "created",
            "epoch_seconds",
            FieldTag::new("text").with_param("storage", serde_json::json!("number")),
        ))
        .unwrap();

    let price = Currency {
        amount: 12.0,
        unit: "GBP".into(),
    };
    let fields: [(&str, &dyn std::any::Any); 2] =
        [("price", &price), ("created", &999u64)];

    let a = from_config.marshal("Order", &fields).unwrap();
    let b = from_code.marshal("Order", &fields).unwrap();
    assert_eq!(a, b);
}

#[test]
fn corrupted_item_never_yields_a_partial_record() {
    let dispatcher = dispatcher();
    dispatcher
        .register_mapping(&MappingConfig::parse(MAPPING).unwrap())
        .unwrap();

    let mut item = dispatcher
        .marshal(
            "Order",
            &[(
                "price",
                &Currency {
                    amount: 79.99,
                    unit: "USD".into(),
                },
            )],
        )
        .unwrap();
    item.insert(
        "created".into(),
        StorageValue::Number("not-a-number".into()),
    );

    let err = dispatcher.unmarshal("Order", &item).unwrap_err();
    assert!(matches!(err, EngineError::Convert(_)));
    assert!(err.to_string().contains("Order.created"));
}

#[test]
fn mapping_with_a_bad_field_registers_nothing_after_it() {
    let dispatcher = dispatcher();
    let mapping = MappingConfig::parse(
        r#"
        [[records]]
        name = "Order"

        [[records.fields]]
        name = "price"
        type = "currency"
        converter = "json"

        [[records.fields]]
        name = "created"
        type = "epoch_seconds"
        converter = "csv"
        "#,
    )
    .unwrap();

    let err = dispatcher.register_mapping(&mapping).unwrap_err();
    assert!(err.to_string().contains("unknown converter kind 'csv'"));

    // Fields before the bad one stay registered and usable.
    assert!(dispatcher.converter("Order", "price").is_ok());
    assert!(dispatcher.converter("Order", "created").is_err());
}
