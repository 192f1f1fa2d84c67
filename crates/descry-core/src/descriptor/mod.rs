//! Plain records mirroring `google/protobuf/descriptor.proto`.
//!
//! Singular fields keep wire presence as `Option<T>`; the accessor methods
//! of the same name collapse absence to the type default (`""`, `0`,
//! `false`). Repeated fields are plain vectors in wire order. Enumerated
//! fields stay raw integer codes; [`Label`] and [`FieldType`] map the two
//! codes the schema builder needs.
//!
//! Records are produced by [`FileDescriptorSet::decode`] or
//! [`FileDescriptorProto::decode`] and are meant to be consumed by the
//! schema builder and dropped.

#![allow(missing_docs)]

mod decode;

use bytes::Bytes;

/// Generates `&str` accessors that default absent strings to `""`
macro_rules! string_accessors {
    ($ty:ty: $($field:ident),+ $(,)?) => {
        impl $ty {
            $(
                #[doc = concat!("Returns `", stringify!($field), "`, or `\"\"` when absent")]
                pub fn $field(&self) -> &str {
                    self.$field.as_deref().unwrap_or("")
                }
            )+
        }
    };
}

/// Generates copying accessors that default absent scalars to zero/false
macro_rules! scalar_accessors {
    ($ty:ty: $($field:ident: $t:ty),+ $(,)?) => {
        impl $ty {
            $(
                #[doc = concat!("Returns `", stringify!($field), "`, or its default when absent")]
                pub fn $field(&self) -> $t {
                    self.$field.unwrap_or_default()
                }
            )+
        }
    };
}

/// A set of files, as written by `protoc --descriptor_set_out`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDescriptorSet {
    /// Field 1
    pub file: Vec<FileDescriptorProto>,
}

/// One `.proto` file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDescriptorProto {
    pub name: Option<String>,
    pub package: Option<String>,
    pub dependency: Vec<String>,
    pub public_dependency: Vec<i32>,
    pub weak_dependency: Vec<i32>,
    pub message_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    pub service: Vec<ServiceDescriptorProto>,
    pub extension: Vec<FieldDescriptorProto>,
    pub options: Option<FileOptions>,
    pub source_code_info: Option<SourceCodeInfo>,
    pub syntax: Option<String>,
}

string_accessors!(FileDescriptorProto: name, package, syntax);

/// A message type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorProto {
    pub name: Option<String>,
    pub field: Vec<FieldDescriptorProto>,
    pub extension: Vec<FieldDescriptorProto>,
    pub nested_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    pub extension_range: Vec<ExtensionRange>,
    pub oneof_decl: Vec<OneofDescriptorProto>,
    pub options: Option<MessageOptions>,
    pub reserved_range: Vec<ReservedRange>,
    pub reserved_name: Vec<String>,
}

string_accessors!(DescriptorProto: name);

impl DescriptorProto {
    /// True if the message options carry `map_entry = true`
    pub fn is_map_entry(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.map_entry)
            .unwrap_or(false)
    }
}

/// `extensions start to end;` with an exclusive end
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
    pub options: Option<ExtensionRangeOptions>,
}

scalar_accessors!(ExtensionRange: start: i32, end: i32);

/// A reserved field-number range. `end` is exclusive on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservedRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

scalar_accessors!(ReservedRange: start: i32, end: i32);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionRangeOptions {
    pub uninterpreted_option: Vec<UninterpretedOption>,
}

/// A field or extension declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDescriptorProto {
    pub name: Option<String>,
    pub number: Option<i32>,
    /// Raw [`Label`] code
    pub label: Option<i32>,
    /// Raw [`FieldType`] code
    pub r#type: Option<i32>,
    pub type_name: Option<String>,
    pub extendee: Option<String>,
    pub default_value: Option<String>,
    pub oneof_index: Option<i32>,
    pub json_name: Option<String>,
    pub options: Option<FieldOptions>,
}

string_accessors!(FieldDescriptorProto: name, type_name, extendee, default_value, json_name);
scalar_accessors!(FieldDescriptorProto: number: i32, label: i32, r#type: i32, oneof_index: i32);

/// Field cardinality codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Optional = 1,
    Required = 2,
    Repeated = 3,
}

impl Label {
    /// Maps a raw code; unknown codes yield `None`
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            1 => Some(Label::Optional),
            2 => Some(Label::Required),
            3 => Some(Label::Repeated),
            _ => None,
        }
    }

    /// The rule keyword: `optional`, `required` or `repeated`
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Optional => "optional",
            Label::Required => "required",
            Label::Repeated => "repeated",
        }
    }
}

/// Field value type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Double = 1,
    Float = 2,
    Int64 = 3,
    Uint64 = 4,
    Int32 = 5,
    Fixed64 = 6,
    Fixed32 = 7,
    Bool = 8,
    String = 9,
    Group = 10,
    Message = 11,
    Bytes = 12,
    Uint32 = 13,
    Enum = 14,
    Sfixed32 = 15,
    Sfixed64 = 16,
    Sint32 = 17,
    Sint64 = 18,
}

impl FieldType {
    /// Maps a raw code; unknown codes yield `None`
    pub fn from_i32(code: i32) -> Option<Self> {
        use FieldType::*;
        Some(match code {
            1 => Double,
            2 => Float,
            3 => Int64,
            4 => Uint64,
            5 => Int32,
            6 => Fixed64,
            7 => Fixed32,
            8 => Bool,
            9 => String,
            10 => Group,
            11 => Message,
            12 => Bytes,
            13 => Uint32,
            14 => Enum,
            15 => Sfixed32,
            16 => Sfixed64,
            17 => Sint32,
            18 => Sint64,
            _ => return None,
        })
    }

    /// The `.proto` keyword for scalar types; `None` for message, enum and group
    pub fn scalar_keyword(self) -> Option<&'static str> {
        use FieldType::*;
        Some(match self {
            Double => "double",
            Float => "float",
            Int64 => "int64",
            Uint64 => "uint64",
            Int32 => "int32",
            Fixed64 => "fixed64",
            Fixed32 => "fixed32",
            Bool => "bool",
            String => "string",
            Bytes => "bytes",
            Uint32 => "uint32",
            Sfixed32 => "sfixed32",
            Sfixed64 => "sfixed64",
            Sint32 => "sint32",
            Sint64 => "sint64",
            Group | Message | Enum => return None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OneofDescriptorProto {
    pub name: Option<String>,
    pub options: Option<OneofOptions>,
}

string_accessors!(OneofDescriptorProto: name);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumDescriptorProto {
    pub name: Option<String>,
    pub value: Vec<EnumValueDescriptorProto>,
    pub options: Option<EnumOptions>,
    pub reserved_range: Vec<EnumReservedRange>,
    pub reserved_name: Vec<String>,
}

string_accessors!(EnumDescriptorProto: name);

/// A reserved enum-number range. Unlike [`ReservedRange`], `end` is inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumReservedRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

scalar_accessors!(EnumReservedRange: start: i32, end: i32);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumValueDescriptorProto {
    pub name: Option<String>,
    pub number: Option<i32>,
    pub options: Option<EnumValueOptions>,
}

string_accessors!(EnumValueDescriptorProto: name);
scalar_accessors!(EnumValueDescriptorProto: number: i32);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDescriptorProto {
    pub name: Option<String>,
    pub method: Vec<MethodDescriptorProto>,
    pub options: Option<ServiceOptions>,
}

string_accessors!(ServiceDescriptorProto: name);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodDescriptorProto {
    pub name: Option<String>,
    pub input_type: Option<String>,
    pub output_type: Option<String>,
    pub options: Option<MethodOptions>,
    pub client_streaming: Option<bool>,
    pub server_streaming: Option<bool>,
}

string_accessors!(MethodDescriptorProto: name, input_type, output_type);
scalar_accessors!(MethodDescriptorProto: client_streaming: bool, server_streaming: bool);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileOptions {
    pub java_package: Option<String>,
    pub java_outer_classname: Option<String>,
    pub java_multiple_files: Option<bool>,
    pub java_generate_equals_and_hash: Option<bool>,
    pub java_string_check_utf8: Option<bool>,
    /// Raw OptimizeMode code
    pub optimize_for: Option<i32>,
    pub go_package: Option<String>,
    pub cc_generic_services: Option<bool>,
    pub java_generic_services: Option<bool>,
    pub py_generic_services: Option<bool>,
    pub php_generic_services: Option<bool>,
    pub deprecated: Option<bool>,
    pub cc_enable_arenas: Option<bool>,
    pub objc_class_prefix: Option<String>,
    pub csharp_namespace: Option<String>,
    pub swift_prefix: Option<String>,
    pub php_class_prefix: Option<String>,
    pub php_namespace: Option<String>,
    pub php_metadata_namespace: Option<String>,
    pub ruby_package: Option<String>,
    pub uninterpreted_option: Vec<UninterpretedOption>,
}

string_accessors!(FileOptions: java_package, go_package);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOptions {
    pub message_set_wire_format: Option<bool>,
    pub no_standard_descriptor_accessor: Option<bool>,
    pub deprecated: Option<bool>,
    pub map_entry: Option<bool>,
    pub uninterpreted_option: Vec<UninterpretedOption>,
}

impl MessageOptions {
    /// Looks up a boolean option by name.
    ///
    /// Accepts both spellings of a key (`map_entry` and `mapEntry`) and
    /// returns `None` for unknown keys and for options absent on the wire.
    pub fn flag(&self, key: &str) -> Option<bool> {
        let folded: String = key
            .chars()
            .filter(|&c| c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match folded.as_str() {
            "messagesetwireformat" => self.message_set_wire_format,
            "nostandarddescriptoraccessor" => self.no_standard_descriptor_accessor,
            "deprecated" => self.deprecated,
            "mapentry" => self.map_entry,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    /// Raw CType code
    pub ctype: Option<i32>,
    pub packed: Option<bool>,
    /// Raw JSType code
    pub jstype: Option<i32>,
    pub lazy: Option<bool>,
    pub deprecated: Option<bool>,
    pub weak: Option<bool>,
    pub uninterpreted_option: Vec<UninterpretedOption>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OneofOptions {
    pub uninterpreted_option: Vec<UninterpretedOption>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumOptions {
    pub allow_alias: Option<bool>,
    pub deprecated: Option<bool>,
    pub uninterpreted_option: Vec<UninterpretedOption>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumValueOptions {
    pub deprecated: Option<bool>,
    pub uninterpreted_option: Vec<UninterpretedOption>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceOptions {
    pub deprecated: Option<bool>,
    pub uninterpreted_option: Vec<UninterpretedOption>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodOptions {
    pub deprecated: Option<bool>,
    /// Raw IdempotencyLevel code
    pub idempotency_level: Option<i32>,
    pub uninterpreted_option: Vec<UninterpretedOption>,
}

/// An option the compiler could not interpret (custom options without
/// their extension definitions)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UninterpretedOption {
    pub name: Vec<NamePart>,
    pub identifier_value: Option<String>,
    pub positive_int_value: Option<u64>,
    pub negative_int_value: Option<i64>,
    pub double_value: Option<f64>,
    pub string_value: Option<Bytes>,
    pub aggregate_value: Option<String>,
}

string_accessors!(UninterpretedOption: identifier_value, aggregate_value);

/// One dotted component of an uninterpreted option name.
///
/// Both fields are required by the schema; decoding fails when either is
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamePart {
    pub name_part: String,
    pub is_extension: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceCodeInfo {
    pub location: Vec<Location>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub path: Vec<i32>,
    pub span: Vec<i32>,
    pub leading_comments: Option<String>,
    pub trailing_comments: Option<String>,
    pub leading_detached_comments: Vec<String>,
}

string_accessors!(Location: leading_comments, trailing_comments);
