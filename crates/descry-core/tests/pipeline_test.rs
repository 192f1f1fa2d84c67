//! End-to-end tests: descriptors encoded with prost, decoded and converted
//! by descry

use descry_core::schema::{Reserved, TypeKind};
use descry_core::wire::encode_varint;
use descry_core::{
    convert_file_descriptor, convert_file_descriptor_set, ConversionOptions, Error, FieldNode,
    MapField, Namespace, Nested,
};
use pretty_assertions::assert_eq;
use prost::Message;
use prost_types::{
    descriptor_proto::ReservedRange,
    field_descriptor_proto::{Label, Type as Kind},
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, MethodDescriptorProto,
    OneofDescriptorProto, ServiceDescriptorProto,
};
use serde_json::json;

fn field(name: &str, number: i32, kind: Kind) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        ..Default::default()
    }
}

fn reference(name: &str, number: i32, kind: Kind, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, kind)
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

fn map_entry(
    name: &str,
    key: FieldDescriptorProto,
    value: FieldDescriptorProto,
) -> DescriptorProto {
    DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..message(name, vec![key, value])
    }
}

fn file(name: &str, package: &str, messages: Vec<DescriptorProto>) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        message_type: messages,
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn convert(files: Vec<FileDescriptorProto>) -> descry_core::Result<Namespace> {
    let set = FileDescriptorSet { file: files };
    convert_file_descriptor_set(&set.encode_to_vec(), &ConversionOptions::default())
}

/// `message Inventory { map<string, int32> counts = 1; map<string, Item> items = 2; }`
fn inventory() -> FileDescriptorProto {
    let mut counts = reference("counts", 1, Kind::Message, ".shop.Inventory.CountsEntry");
    counts.label = Some(Label::Repeated as i32);
    let mut items = reference("items", 2, Kind::Message, "Inventory.ItemsEntry");
    items.label = Some(Label::Repeated as i32);

    let mut inventory = message("Inventory", vec![counts, items, field("note", 3, Kind::String)]);
    inventory.nested_type = vec![
        map_entry(
            "CountsEntry",
            field("key", 1, Kind::String),
            field("value", 2, Kind::Int32),
        ),
        map_entry(
            "ItemsEntry",
            field("key", 1, Kind::String),
            reference("value", 2, Kind::Message, ".shop.Item"),
        ),
    ];

    file(
        "shop.proto",
        "shop",
        vec![inventory, message("Item", vec![field("sku", 1, Kind::String)])],
    )
}

#[test]
fn test_map_fields_collapse() {
    let root = convert(vec![inventory()]).unwrap();
    let ty = root.lookup_type(".shop.Inventory").unwrap();

    assert_eq!(
        ty.fields()[0],
        FieldNode::Map(MapField {
            name: "counts".to_string(),
            id: 1,
            key_type: "string".to_string(),
            value_type: "int32".to_string(),
        })
    );
    assert_eq!(
        ty.fields()[1],
        FieldNode::Map(MapField {
            name: "items".to_string(),
            id: 2,
            key_type: "string".to_string(),
            value_type: ".shop.Item".to_string(),
        })
    );
    assert_eq!(ty.fields()[2].name(), "note");

    assert!(ty.nested().is_empty());
    assert!(root.lookup(".shop.Inventory.CountsEntry").is_none());
    assert!(root.lookup(".shop.Inventory.ItemsEntry").is_none());
}

#[test]
fn test_full_json_shape() {
    let mut shop = inventory();
    shop.enum_type = vec![EnumDescriptorProto {
        name: Some("Status".to_string()),
        value: vec![
            EnumValueDescriptorProto {
                name: Some("UNKNOWN".to_string()),
                number: Some(0),
                ..Default::default()
            },
            EnumValueDescriptorProto {
                name: Some("ACTIVE".to_string()),
                number: Some(1),
                ..Default::default()
            },
        ],
        ..Default::default()
    }];
    shop.service = vec![ServiceDescriptorProto {
        name: Some("Store".to_string()),
        method: vec![MethodDescriptorProto {
            name: Some("Watch".to_string()),
            input_type: Some(".shop.Item".to_string()),
            output_type: Some(".shop.Inventory".to_string()),
            server_streaming: Some(true),
            ..Default::default()
        }],
        ..Default::default()
    }];

    let root = convert(vec![shop]).unwrap();
    assert_eq!(
        root.to_json(),
        json!({
            "nested": {
                "shop": {
                    "nested": {
                        "Inventory": {
                            "fields": {
                                "counts": { "keyType": "string", "type": "int32", "id": 1 },
                                "items": { "keyType": "string", "type": ".shop.Item", "id": 2 },
                                "note": { "type": "string", "id": 3 }
                            }
                        },
                        "Item": {
                            "fields": {
                                "sku": { "type": "string", "id": 1 }
                            }
                        },
                        "Status": {
                            "values": { "UNKNOWN": 0, "ACTIVE": 1 }
                        },
                        "Store": {
                            "methods": {
                                "Watch": {
                                    "requestType": ".shop.Item",
                                    "responseType": ".shop.Inventory",
                                    "responseStream": true
                                }
                            }
                        }
                    }
                }
            }
        })
    );
}

#[test]
fn test_reserved_ranges() {
    let mut msg = message("Legacy", vec![field("id", 1, Kind::Int64)]);
    msg.reserved_range = vec![
        ReservedRange {
            start: Some(5),
            end: Some(10),
        },
        ReservedRange {
            start: Some(2),
            end: Some(3),
        },
    ];
    msg.reserved_name = vec!["zeta".to_string(), "alpha".to_string()];
    let set = FileDescriptorSet {
        file: vec![file("legacy.proto", "old", vec![msg])],
    };
    let bytes = set.encode_to_vec();

    let root = convert_file_descriptor_set(&bytes, &ConversionOptions::default()).unwrap();
    assert_eq!(
        root.lookup_type(".old.Legacy").unwrap().reserved(),
        &[
            Reserved::Name("zeta".to_string()),
            Reserved::Name("alpha".to_string()),
            Reserved::Range(5, 9),
            Reserved::Range(2, 2),
        ]
    );

    let sorted =
        convert_file_descriptor_set(&bytes, &ConversionOptions::new().sort_reserved(true)).unwrap();
    assert_eq!(
        sorted.lookup_type(".old.Legacy").unwrap().reserved(),
        &[
            Reserved::Name("alpha".to_string()),
            Reserved::Name("zeta".to_string()),
            Reserved::Range(2, 2),
            Reserved::Range(5, 9),
        ]
    );
    assert_eq!(
        sorted.to_json()["nested"]["old"]["nested"]["Legacy"]["reserved"],
        json!(["alpha", "zeta", [2, 2], [5, 9]])
    );
}

#[test]
fn test_oneof_grouping() {
    let member = |name: &str, number, index| FieldDescriptorProto {
        oneof_index: Some(index),
        ..field(name, number, Kind::String)
    };
    let mut msg = message(
        "Choice",
        vec![member("first", 1, 0), member("middle", 2, 1), member("last", 3, 0)],
    );
    msg.oneof_decl = vec![
        OneofDescriptorProto {
            name: Some("outer_pick".to_string()),
            ..Default::default()
        },
        OneofDescriptorProto {
            name: Some("inner".to_string()),
            ..Default::default()
        },
    ];

    let root = convert(vec![file("choice.proto", "pick", vec![msg])]).unwrap();
    let json = root.to_json();
    assert_eq!(
        json["nested"]["pick"]["nested"]["Choice"]["oneofs"],
        json!({
            "outerPick": { "oneof": ["first", "last"] },
            "inner": { "oneof": ["middle"] }
        })
    );
}

#[test]
fn test_field_names_camel_cased() {
    let msg = message("Naming", vec![field("foo_bar_baz", 1, Kind::Bool)]);
    let files = vec![file("naming.proto", "n", vec![msg])];

    let root = convert(files.clone()).unwrap();
    let ty = root.lookup_type(".n.Naming").unwrap();
    assert!(ty.field_by_name("fooBarBaz").is_some());

    let set = FileDescriptorSet { file: files };
    let kept =
        convert_file_descriptor_set(&set.encode_to_vec(), &ConversionOptions::new().keep_case(true))
            .unwrap();
    assert!(kept
        .lookup_type(".n.Naming")
        .unwrap()
        .field_by_name("foo_bar_baz")
        .is_some());
}

#[test]
fn test_unknown_fields_skipped() {
    let mut file_bytes = file("extra.proto", "x", vec![message("Plain", vec![])]).encode_to_vec();
    // field 99, varint
    encode_varint(99 << 3, &mut file_bytes);
    encode_varint(12345, &mut file_bytes);
    // field 100, fixed64
    encode_varint(100 << 3 | 1, &mut file_bytes);
    file_bytes.extend_from_slice(&[0xAB; 8]);

    let mut set_bytes = Vec::new();
    encode_varint(1 << 3 | 2, &mut set_bytes);
    encode_varint(file_bytes.len() as u64, &mut set_bytes);
    set_bytes.extend_from_slice(&file_bytes);
    // field 7, length-delimited, at the set level
    set_bytes.extend_from_slice(&[7 << 3 | 2, 2, 0xFF, 0xFF]);

    let root = convert_file_descriptor_set(&set_bytes, &ConversionOptions::default()).unwrap();
    assert!(root.lookup_type(".x.Plain").is_some());

    let single = convert_file_descriptor(&file_bytes, &ConversionOptions::default()).unwrap();
    assert_eq!(single, root);
}

#[test]
fn test_namespaces_shared_across_files() {
    let user = file("user.proto", "acme.users", vec![message("User", vec![])]);
    let order = file(
        "order.proto",
        "acme.orders",
        vec![message(
            "Order",
            vec![reference("buyer", 1, Kind::Message, "users.User")],
        )],
    );
    let extra = file("more.proto", "acme.users", vec![message("Group", vec![])]);

    let root = convert(vec![user, order, extra]).unwrap();
    let Some(Nested::Namespace(acme)) = root.lookup(".acme") else {
        panic!("missing acme namespace");
    };
    let children: Vec<_> = acme.nested().iter().map(|n| n.name()).collect();
    assert_eq!(children, vec!["users", "orders"]);
    assert!(root.lookup_type(".acme.users.Group").is_some());

    let order = root.lookup_type(".acme.orders.Order").unwrap();
    let FieldNode::Field(buyer) = &order.fields()[0] else {
        panic!("buyer should stay a plain field");
    };
    let resolved = buyer.resolved.as_ref().unwrap();
    assert_eq!(resolved.full_name, ".acme.users.User");
    assert_eq!(resolved.kind, TypeKind::Message);
    assert_eq!(buyer.type_name, "users.User");
}

#[test]
fn test_absolute_types_option() {
    let order = file(
        "order.proto",
        "acme",
        vec![
            message("Order", vec![reference("item", 1, Kind::Message, "Item")]),
            message("Item", vec![]),
        ],
    );
    let set = FileDescriptorSet { file: vec![order] };
    let root = convert_file_descriptor_set(
        &set.encode_to_vec(),
        &ConversionOptions::new().absolute_types(true),
    )
    .unwrap();
    assert_eq!(
        root.to_json()["nested"]["acme"]["nested"]["Order"]["fields"]["item"]["type"],
        ".acme.Item"
    );
}

#[test]
fn test_absolute_types_with_map_fields() {
    let bytes = FileDescriptorSet {
        file: vec![inventory()],
    }
    .encode_to_vec();
    let plain = convert_file_descriptor_set(&bytes, &ConversionOptions::default()).unwrap();
    let absolute =
        convert_file_descriptor_set(&bytes, &ConversionOptions::new().absolute_types(true))
            .unwrap();

    let inventory = absolute.lookup_type(".shop.Inventory").unwrap();
    assert!(matches!(inventory.field_by_id(1), Some(FieldNode::Map(_))));
    assert!(matches!(inventory.field_by_id(2), Some(FieldNode::Map(_))));
    assert_eq!(
        absolute.to_json()["nested"]["shop"]["nested"]["Inventory"]["fields"],
        plain.to_json()["nested"]["shop"]["nested"]["Inventory"]["fields"]
    );
}

/// Wraps `payload` as a length-delimited field
fn length_delimited(field: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 10);
    encode_varint(field << 3 | 2, &mut out);
    encode_varint(payload.len() as u64, &mut out);
    out.extend_from_slice(payload);
    out
}

#[test]
fn test_out_of_range_field_number_rejected() {
    // (1 << 32) + 1 truncates to `file` (1)
    let hijacked = file("hijacked.proto", "evil", vec![]).encode_to_vec();
    let bytes = length_delimited((1 << 32) + 1, &hijacked);

    let err = convert_file_descriptor_set(&bytes, &ConversionOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidFieldNumber { offset: 0, .. }));

    let err = convert_file_descriptor(&length_delimited(0, b""), &ConversionOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidFieldNumber { number: 0, .. }));
}

#[test]
fn test_deeply_nested_input_rejected() {
    let mut nested = message("Leaf", vec![]).encode_to_vec();
    for _ in 0..1000 {
        let mut outer = message("Outer", vec![]).encode_to_vec();
        outer.extend(length_delimited(3, &nested));
        nested = outer;
    }
    let bytes = length_delimited(1, &length_delimited(4, &nested));

    let err = convert_file_descriptor_set(&bytes, &ConversionOptions::default()).unwrap_err();
    assert!(matches!(err, Error::RecursionLimitExceeded { .. }));
    assert!(err.is_decode_error());
}

#[test]
fn test_output_is_deterministic() {
    let first = convert(vec![inventory()]).unwrap().to_json();
    let second = convert(vec![inventory()]).unwrap().to_json();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_truncated_input() {
    let bytes = FileDescriptorSet {
        file: vec![inventory()],
    }
    .encode_to_vec();
    let err = convert_file_descriptor_set(&bytes[..bytes.len() - 1], &ConversionOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::TruncatedInput { .. }));
    assert!(err.is_decode_error());
}

#[test]
fn test_group_wire_type_rejected() {
    // field 2, start group
    let err =
        convert_file_descriptor_set(&[2 << 3 | 3], &ConversionOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedWireType { wire_type: 3, .. }
    ));
}

#[test]
fn test_unnamed_message_rejected() {
    let err =
        convert(vec![file("bad.proto", "bad", vec![DescriptorProto::default()])]).unwrap_err();
    assert!(matches!(err, Error::InvalidDescriptor(_)));
}

#[test]
fn test_unresolved_reference_rejected() {
    let msg = message(
        "Dangling",
        vec![reference("ghost", 1, Kind::Message, ".nowhere.Ghost")],
    );
    let err = convert(vec![file("dangling.proto", "d", vec![msg])]).unwrap_err();
    assert_eq!(err, Error::unresolved(".nowhere.Ghost", ".d.Dangling"));
}

#[test]
fn test_duplicate_definition_rejected() {
    let a = file("a.proto", "dup", vec![message("Same", vec![])]);
    let b = file("b.proto", "dup", vec![message("Same", vec![])]);
    assert!(matches!(
        convert(vec![a, b]),
        Err(Error::DuplicateName { .. })
    ));
}

#[test]
fn test_empty_set() {
    let root = convert_file_descriptor_set(&[], &ConversionOptions::default()).unwrap();
    assert_eq!(root.to_json(), json!({}));
}
