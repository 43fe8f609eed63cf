//! End-to-end scenarios for the façade: template registration, multi-message
//! `parse`, single-message `compose`, and the round-trip law of spec §8.

use assert_matches::assert_matches;
use boxon_core::bits::{ByteOrder, Signedness};
use boxon_core::charset::Charset;
use boxon_core::template::{
    ChecksumPlan, Descriptor, EvaluatedFieldPlan, FieldPlan, Header, PrimitiveKind, Selector,
    SelectorAlternative, Template, TemplateBuilder,
};
use boxon_core::value::{StructValue, Value};
use boxon_core::{Boxon, Response};

fn header(patterns: &[&[u8]]) -> Header {
    Header {
        start_patterns: patterns.iter().map(|p| p.to_vec()).collect(),
        end_pattern: None,
        charset: Charset::Ascii,
    }
}

fn ascii_string_field(name: &str, size_bytes: &str) -> FieldPlan {
    FieldPlan::new(
        name,
        Descriptor::String {
            byte_size_expr: size_bytes.to_string(),
            charset: Charset::Ascii,
            match_pattern: None,
        },
    )
}

fn int_field(name: &str, bits: &str, order: ByteOrder, sign: Signedness) -> FieldPlan {
    FieldPlan::new(name, Descriptor::Integer { bit_size_expr: bits.to_string(), byte_order: order, signedness: sign })
}

/// A header, a 16-bit value, and a CRC-16/CCITT-FALSE tail covering
/// everything but the checksum's own two bytes (spec §8 scenario 1 shape;
/// bytes here are hand-computed rather than the original vector, since the
/// original relies on a converter outside this crate's scope).
#[test]
fn crc_tail_message_round_trips() {
    let mut boxon = Boxon::new();

    let mut builder = TemplateBuilder::new("Ping");
    builder
        .header(header(&[b"PK"]))
        .field(ascii_string_field("marker", "2"))
        .field(int_field("value", "16", ByteOrder::Big, Signedness::Unsigned))
        .field(FieldPlan::new(
            "checksum",
            Descriptor::Checksum {
                algorithm: "crc16/ccitt-false".to_string(),
                skip_start_bytes: 0,
                skip_end_bytes: 2,
                start_value: 0xFFFF,
                result_bit_size: 16,
            },
        ))
        .checksum(ChecksumPlan {
            field_name: "checksum".to_string(),
            algorithm: "crc16/ccitt-false".to_string(),
            skip_start: 0,
            skip_end: 2,
            start_value: 0xFFFF,
            result_bit_size: 16,
        });
    let template = builder.build();
    assert!(template.can_be_coded, "{:?}", template.compile_errors);
    boxon.register_template(template);

    // "PK" + 0x1234 + CRC16/CCITT-FALSE(["PK", 0x12, 0x34], 0xFFFF) == 0x0F61
    let bytes = vec![0x50, 0x4B, 0x12, 0x34, 0x0F, 0x61];

    let responses = boxon.parse(&bytes);
    assert_eq!(responses.len(), 1);
    let Response::Ok(value) = &responses[0] else {
        panic!("expected a decoded message, got {:?}", responses[0]);
    };
    let fields = value.as_struct().unwrap();
    assert_eq!(fields.get("marker"), Some(&Value::Str("PK".to_string())));
    assert_eq!(fields.get("value"), Some(&Value::Int(0x1234)));
    assert_eq!(fields.get("checksum"), Some(&Value::Int(0x0F61)));

    let encoded = boxon.compose(value).unwrap();
    assert_eq!(encoded, bytes);
}

/// A wrong checksum byte must surface as a checksum error and the façade
/// must report it as an `Err` response rather than panicking (spec §7).
#[test]
fn crc_mismatch_is_reported_as_an_error_response() {
    let mut boxon = Boxon::new();
    let mut builder = TemplateBuilder::new("Ping");
    builder
        .header(header(&[b"PK"]))
        .field(ascii_string_field("marker", "2"))
        .field(int_field("value", "16", ByteOrder::Big, Signedness::Unsigned))
        .field(FieldPlan::new(
            "checksum",
            Descriptor::Checksum {
                algorithm: "crc16/ccitt-false".to_string(),
                skip_start_bytes: 0,
                skip_end_bytes: 2,
                start_value: 0xFFFF,
                result_bit_size: 16,
            },
        ))
        .checksum(ChecksumPlan {
            field_name: "checksum".to_string(),
            algorithm: "crc16/ccitt-false".to_string(),
            skip_start: 0,
            skip_end: 2,
            start_value: 0xFFFF,
            result_bit_size: 16,
        });
    boxon.register_template(builder.build());

    let mut bytes = vec![0x50, 0x4B, 0x12, 0x34, 0x0F, 0x61];
    *bytes.last_mut().unwrap() ^= 0xFF;

    let responses = boxon.parse(&bytes);
    assert_eq!(responses.len(), 1);
    assert_matches!(responses[0], Response::Err { .. });
}

/// Spec §8 scenario 2: a flat big-endian `u32` array round-trips exactly.
#[test]
fn primitive_array_round_trips() {
    let mut boxon = Boxon::new();
    let mut builder = TemplateBuilder::new("Ints");
    builder.header(header(&[b"AP"])).field(ascii_string_field("marker", "2")).field(FieldPlan::new(
        "values",
        Descriptor::ArrayPrimitive {
            element_kind: PrimitiveKind::U32,
            length_expr: "2".to_string(),
            byte_order: ByteOrder::Big,
        },
    ));
    boxon.register_template(builder.build());

    let bytes = vec![0x41, 0x50, 0x00, 0x00, 0x01, 0x23, 0x00, 0x00, 0x04, 0x56];
    let responses = boxon.parse(&bytes);
    let Response::Ok(value) = &responses[0] else { panic!("expected ok, got {:?}", responses[0]) };
    let values = value.as_struct().unwrap().get("values").unwrap();
    assert_eq!(values, &Value::Array(vec![Value::Int(0x123), Value::Int(0x456)]));

    assert_eq!(boxon.compose(value).unwrap(), bytes);
}

/// Spec §8 scenario 3: an array of polymorphic objects selected by an
/// 8-bit prefix read ahead of each element, re-resolved per element.
#[test]
fn polymorphic_array_selected_by_prefix_round_trips() {
    let mut boxon = Boxon::new();

    let mut sub1 = TemplateBuilder::new("Sub1");
    sub1.header(header(&[b"S1"])).field(int_field("value", "16", ByteOrder::Big, Signedness::Unsigned));
    boxon.register_template(sub1.build());

    let mut sub2 = TemplateBuilder::new("Sub2");
    sub2.header(header(&[b"S2"])).field(int_field("value", "32", ByteOrder::Big, Signedness::Unsigned));
    boxon.register_template(sub2.build());

    let selector = Selector {
        prefix_size_bits: 8,
        prefix_byte_order: ByteOrder::Big,
        alternatives: vec![
            SelectorAlternative {
                condition_expr: Some("#prefix == 1".to_string()),
                target_type: "Sub1".to_string(),
                prefix_value: Some(1),
            },
            SelectorAlternative {
                condition_expr: Some("#prefix == 2".to_string()),
                target_type: "Sub2".to_string(),
                prefix_value: Some(2),
            },
        ],
    };

    let mut container = TemplateBuilder::new("Container3");
    container
        .header(header(&[b"tc4"]))
        .field(ascii_string_field("marker", "3"))
        .field(FieldPlan::new(
            "items",
            Descriptor::Array {
                element: Box::new(Descriptor::Object { static_type: "Sub1".to_string(), selector: None }),
                length_expr: "3".to_string(),
                selector: Some(selector),
            },
        ));
    boxon.register_template(container.build());

    // "tc4" + (1,0x1234) + (2,0x11223344) + (1,0x0666), exactly spec §8 scenario 3.
    let bytes = hex("7463340112340211223344010666");
    let responses = boxon.parse(&bytes);
    let Response::Ok(value) = &responses[0] else { panic!("expected ok, got {:?}", responses[0]) };

    let items = value.as_struct().unwrap().get("items").unwrap();
    let Value::Array(items) = items else { panic!("expected array") };
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].type_name(), "Sub1");
    assert_eq!(items[0].as_struct().unwrap().get("value"), Some(&Value::Int(0x1234)));
    assert_eq!(items[1].type_name(), "Sub2");
    assert_eq!(items[1].as_struct().unwrap().get("value"), Some(&Value::Int(0x11223344)));
    assert_eq!(items[2].type_name(), "Sub1");
    assert_eq!(items[2].as_struct().unwrap().get("value"), Some(&Value::Int(0x0666)));

    assert_eq!(boxon.compose(value).unwrap(), bytes);
}

/// Spec §8 scenario 4: polymorphic dispatch via a plain field reference
/// (`#self.type`), with no prefix bits read ahead of the element.
#[test]
fn polymorphic_array_selected_by_field_round_trips() {
    let mut boxon = Boxon::new();

    let mut sub1 = TemplateBuilder::new("Sub1");
    sub1.header(header(&[b"S1"])).field(int_field("value", "16", ByteOrder::Big, Signedness::Unsigned));
    boxon.register_template(sub1.build());

    let mut sub2 = TemplateBuilder::new("Sub2");
    sub2.header(header(&[b"S2"])).field(int_field("value", "32", ByteOrder::Big, Signedness::Unsigned));
    boxon.register_template(sub2.build());

    let selector = Selector {
        prefix_size_bits: 0,
        prefix_byte_order: ByteOrder::Big,
        alternatives: vec![
            SelectorAlternative {
                condition_expr: Some("#self.type == 1".to_string()),
                target_type: "Sub1".to_string(),
                prefix_value: None,
            },
            SelectorAlternative {
                condition_expr: Some("#self.type == 2".to_string()),
                target_type: "Sub2".to_string(),
                prefix_value: None,
            },
        ],
    };

    let mut container = TemplateBuilder::new("Container4");
    container
        .header(header(&[b"tc5"]))
        .field(ascii_string_field("marker", "3"))
        .field(int_field("type", "8", ByteOrder::Big, Signedness::Unsigned))
        .field(FieldPlan::new(
            "items",
            Descriptor::Array {
                element: Box::new(Descriptor::Object { static_type: "Sub1".to_string(), selector: None }),
                length_expr: "1".to_string(),
                selector: Some(selector),
            },
        ));
    boxon.register_template(container.build());

    // "tc5" + type=1 + Sub1(0x1234), exactly spec §8 scenario 4.
    let bytes = hex("746335011234");
    let responses = boxon.parse(&bytes);
    let Response::Ok(value) = &responses[0] else { panic!("expected ok, got {:?}", responses[0]) };

    let fields = value.as_struct().unwrap();
    assert_eq!(fields.get("type"), Some(&Value::Int(1)));
    let Value::Array(items) = fields.get("items").unwrap() else { panic!("expected array") };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].type_name(), "Sub1");
    assert_eq!(items[0].as_struct().unwrap().get("value"), Some(&Value::Int(0x1234)));

    assert_eq!(boxon.compose(value).unwrap(), bytes);
}

/// Spec §8 scenario 5 (simplified): terminator-delimited ASCII fields
/// round-trip exactly, including the separating comma and the trailing
/// terminator.
#[test]
fn terminator_delimited_message_round_trips() {
    let mut boxon = Boxon::new();
    let mut builder = TemplateBuilder::new("Csv");
    builder
        .header(header(&[b"#"]))
        .field(ascii_string_field("marker", "1"))
        .field(FieldPlan::new(
            "name",
            Descriptor::StringTerminated { terminator_byte: b',', consume_terminator: true, charset: Charset::Ascii },
        ))
        .field(FieldPlan::new(
            "value",
            Descriptor::StringTerminated { terminator_byte: b'$', consume_terminator: true, charset: Charset::Ascii },
        ));
    boxon.register_template(builder.build());

    let bytes = b"#hello,world$".to_vec();
    let responses = boxon.parse(&bytes);
    let Response::Ok(value) = &responses[0] else { panic!("expected ok, got {:?}", responses[0]) };
    let fields = value.as_struct().unwrap();
    assert_eq!(fields.get("name"), Some(&Value::Str("hello".to_string())));
    assert_eq!(fields.get("value"), Some(&Value::Str("world".to_string())));

    assert_eq!(boxon.compose(value).unwrap(), bytes);
}

/// An evaluated field runs after all wire fields and is never re-written
/// on encode (spec §4.6 "evaluated fields are NOT written").
#[test]
fn evaluated_field_is_computed_on_decode_and_skipped_on_encode() {
    let mut boxon = Boxon::new();
    let mut builder = TemplateBuilder::new("Doubled");
    builder
        .header(header(&[b"D"]))
        .field(ascii_string_field("marker", "1"))
        .field(int_field("value", "8", ByteOrder::Big, Signedness::Unsigned))
        .evaluated_field(EvaluatedFieldPlan { target_field: "doubled".to_string(), expression: "#self.value * 2".to_string() });
    boxon.register_template(builder.build());

    let bytes = vec![b'D', 21];
    let responses = boxon.parse(&bytes);
    let Response::Ok(value) = &responses[0] else { panic!("expected ok, got {:?}", responses[0]) };
    let fields = value.as_struct().unwrap();
    assert_eq!(fields.get("value"), Some(&Value::Int(21)));
    assert_eq!(fields.get("doubled"), Some(&Value::Int(42)));

    // `doubled` is present in the decoded value, but encoding only consults
    // the template's wire fields, so the wire form is unchanged.
    assert_eq!(boxon.compose(value).unwrap(), bytes);
}

/// A field-level error (here: a validator failure) aborts only the
/// message it occurs in; the façade reseeks to the next known header and
/// keeps draining subsequent messages (spec §7 propagation policy).
#[test]
fn parse_skips_a_failing_message_and_resumes_at_the_next_header() {
    let mut boxon = Boxon::new();
    let mut builder = TemplateBuilder::new("Strict");
    let mut field = int_field("value", "8", ByteOrder::Big, Signedness::Unsigned);
    field.validator_expr = Some("#raw < 10".to_string());
    builder.header(header(&[b"V"])).field(ascii_string_field("marker", "1")).field(field);
    boxon.register_template(builder.build());

    // First message fails validation (100 >= 10); second message is valid.
    let mut bytes = vec![b'V', 100];
    bytes.extend_from_slice(&[b'V', 5]);

    let responses = boxon.parse(&bytes);
    assert_eq!(responses.len(), 2);
    assert_matches!(responses[0], Response::Err { .. });
    let Response::Ok(second) = &responses[1] else { panic!("expected ok, got {:?}", responses[1]) };
    assert_eq!(second.as_struct().unwrap().get("value"), Some(&Value::Int(5)));
}

/// Two invocations of the Describer over the same template yield
/// structurally-equal metadata (spec §8 "Describer output ... is stable").
#[test]
fn describe_output_is_stable() {
    let mut builder = TemplateBuilder::new("Described");
    builder
        .header(header(&[b"D"]))
        .field(ascii_string_field("marker", "1"))
        .field(int_field("value", "8", ByteOrder::Big, Signedness::Unsigned));
    let template: Template = builder.build();

    let mut boxon = Boxon::new();
    boxon.register_template(template);

    let first = boxon.describe("Described").unwrap();
    let second = boxon.describe("Described").unwrap();
    assert_eq!(first, second);
}

/// `compose` looks the template up by the runtime type name carried on the
/// `Value` itself (spec §6 "compose: single message round-trip").
#[test]
fn compose_resolves_template_by_value_type_name() {
    let mut boxon = Boxon::new();
    let mut builder = TemplateBuilder::new("Solo");
    builder.header(header(&[b"SO"])).field(ascii_string_field("marker", "2")).field(int_field(
        "value",
        "8",
        ByteOrder::Big,
        Signedness::Unsigned,
    ));
    boxon.register_template(builder.build());

    let mut fields = StructValue::new("Solo");
    fields.set("marker", Value::Str("SO".to_string()));
    fields.set("value", Value::Int(7));
    let value = Value::Struct(fields);

    assert_eq!(boxon.compose(&value).unwrap(), vec![b'S', b'O', 7]);
}

fn hex(s: &str) -> Vec<u8> {
    (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect()
}
