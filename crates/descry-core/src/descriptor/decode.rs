//! Decode routines for the descriptor schema.
//!
//! Every record implements [`Decode`]: the shared loop in [`decode_from`]
//! reads tags until the reader's window is exhausted and hands each one to
//! the record's `merge_field`. Unknown field numbers are skipped by wire
//! type. Scalars are read with the wire type the schema declares for them,
//! repeated fields append, and a repeated singular message (options)
//! replaces the previous one.

use super::*;
use crate::error::{Error, Result};
use crate::wire::{Tag, WireReader};
use tracing::trace;

/// A record that can be filled from tagged fields
trait Decode: Default {
    /// Message name used in diagnostics
    const NAME: &'static str;

    /// Consumes the value of one field
    fn merge_field(&mut self, tag: Tag, reader: &mut WireReader<'_>) -> Result<()>;
}

/// Runs the tag loop over the whole of `reader`
fn decode_from<M: Decode>(mut reader: WireReader<'_>) -> Result<M> {
    let mut message = M::default();
    while !reader.is_empty() {
        let tag = reader.read_tag()?;
        message.merge_field(tag, &mut reader)?;
    }
    Ok(message)
}

/// Decodes a length-delimited sub-message
fn read_message<M: Decode>(reader: &mut WireReader<'_>) -> Result<M> {
    decode_from(reader.sub_reader()?)
}

fn skip_unknown(message: &'static str, tag: Tag, reader: &mut WireReader<'_>) -> Result<()> {
    trace!(
        "Skipping unknown field {} ({:?}) in {} at offset {}",
        tag.field_number,
        tag.wire_type,
        message,
        reader.position()
    );
    reader.skip(tag.wire_type)
}

impl FileDescriptorSet {
    /// Decodes a serialized `FileDescriptorSet`
    pub fn decode(buf: &[u8]) -> Result<Self> {
        decode_from(WireReader::new(buf))
    }
}

impl FileDescriptorProto {
    /// Decodes a single serialized `FileDescriptorProto`
    pub fn decode(buf: &[u8]) -> Result<Self> {
        decode_from(WireReader::new(buf))
    }
}

impl Decode for FileDescriptorSet {
    const NAME: &'static str = "FileDescriptorSet";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.file.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for FileDescriptorProto {
    const NAME: &'static str = "FileDescriptorProto";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(r.read_string()?),
            2 => self.package = Some(r.read_string()?),
            3 => self.dependency.push(r.read_string()?),
            4 => self.message_type.push(read_message(r)?),
            5 => self.enum_type.push(read_message(r)?),
            6 => self.service.push(read_message(r)?),
            7 => self.extension.push(read_message(r)?),
            8 => self.options = Some(read_message(r)?),
            9 => self.source_code_info = Some(read_message(r)?),
            10 => r.read_repeated_int32(tag.wire_type, &mut self.public_dependency)?,
            11 => r.read_repeated_int32(tag.wire_type, &mut self.weak_dependency)?,
            12 => self.syntax = Some(r.read_string()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for DescriptorProto {
    const NAME: &'static str = "DescriptorProto";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(r.read_string()?),
            2 => self.field.push(read_message(r)?),
            3 => self.nested_type.push(read_message(r)?),
            4 => self.enum_type.push(read_message(r)?),
            5 => self.extension_range.push(read_message(r)?),
            6 => self.extension.push(read_message(r)?),
            7 => self.options = Some(read_message(r)?),
            8 => self.oneof_decl.push(read_message(r)?),
            9 => self.reserved_range.push(read_message(r)?),
            10 => self.reserved_name.push(r.read_string()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for ExtensionRange {
    const NAME: &'static str = "DescriptorProto.ExtensionRange";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.start = Some(r.read_int32()?),
            2 => self.end = Some(r.read_int32()?),
            3 => self.options = Some(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for ReservedRange {
    const NAME: &'static str = "DescriptorProto.ReservedRange";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.start = Some(r.read_int32()?),
            2 => self.end = Some(r.read_int32()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for ExtensionRangeOptions {
    const NAME: &'static str = "ExtensionRangeOptions";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            999 => self.uninterpreted_option.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for FieldDescriptorProto {
    const NAME: &'static str = "FieldDescriptorProto";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(r.read_string()?),
            2 => self.extendee = Some(r.read_string()?),
            3 => self.number = Some(r.read_int32()?),
            4 => self.label = Some(r.read_int32()?),
            5 => self.r#type = Some(r.read_int32()?),
            6 => self.type_name = Some(r.read_string()?),
            7 => self.default_value = Some(r.read_string()?),
            8 => self.options = Some(read_message(r)?),
            9 => self.oneof_index = Some(r.read_int32()?),
            10 => self.json_name = Some(r.read_string()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for OneofDescriptorProto {
    const NAME: &'static str = "OneofDescriptorProto";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(r.read_string()?),
            2 => self.options = Some(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for EnumDescriptorProto {
    const NAME: &'static str = "EnumDescriptorProto";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(r.read_string()?),
            2 => self.value.push(read_message(r)?),
            3 => self.options = Some(read_message(r)?),
            4 => self.reserved_range.push(read_message(r)?),
            5 => self.reserved_name.push(r.read_string()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for EnumReservedRange {
    const NAME: &'static str = "EnumDescriptorProto.EnumReservedRange";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.start = Some(r.read_int32()?),
            2 => self.end = Some(r.read_int32()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for EnumValueDescriptorProto {
    const NAME: &'static str = "EnumValueDescriptorProto";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(r.read_string()?),
            2 => self.number = Some(r.read_int32()?),
            3 => self.options = Some(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for ServiceDescriptorProto {
    const NAME: &'static str = "ServiceDescriptorProto";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(r.read_string()?),
            2 => self.method.push(read_message(r)?),
            3 => self.options = Some(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for MethodDescriptorProto {
    const NAME: &'static str = "MethodDescriptorProto";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(r.read_string()?),
            2 => self.input_type = Some(r.read_string()?),
            3 => self.output_type = Some(r.read_string()?),
            4 => self.options = Some(read_message(r)?),
            5 => self.client_streaming = Some(r.read_bool()?),
            6 => self.server_streaming = Some(r.read_bool()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for FileOptions {
    const NAME: &'static str = "FileOptions";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.java_package = Some(r.read_string()?),
            8 => self.java_outer_classname = Some(r.read_string()?),
            9 => self.optimize_for = Some(r.read_int32()?),
            10 => self.java_multiple_files = Some(r.read_bool()?),
            11 => self.go_package = Some(r.read_string()?),
            16 => self.cc_generic_services = Some(r.read_bool()?),
            17 => self.java_generic_services = Some(r.read_bool()?),
            18 => self.py_generic_services = Some(r.read_bool()?),
            20 => self.java_generate_equals_and_hash = Some(r.read_bool()?),
            23 => self.deprecated = Some(r.read_bool()?),
            27 => self.java_string_check_utf8 = Some(r.read_bool()?),
            31 => self.cc_enable_arenas = Some(r.read_bool()?),
            36 => self.objc_class_prefix = Some(r.read_string()?),
            37 => self.csharp_namespace = Some(r.read_string()?),
            39 => self.swift_prefix = Some(r.read_string()?),
            40 => self.php_class_prefix = Some(r.read_string()?),
            41 => self.php_namespace = Some(r.read_string()?),
            42 => self.php_generic_services = Some(r.read_bool()?),
            44 => self.php_metadata_namespace = Some(r.read_string()?),
            45 => self.ruby_package = Some(r.read_string()?),
            999 => self.uninterpreted_option.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for MessageOptions {
    const NAME: &'static str = "MessageOptions";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.message_set_wire_format = Some(r.read_bool()?),
            2 => self.no_standard_descriptor_accessor = Some(r.read_bool()?),
            3 => self.deprecated = Some(r.read_bool()?),
            7 => self.map_entry = Some(r.read_bool()?),
            999 => self.uninterpreted_option.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for FieldOptions {
    const NAME: &'static str = "FieldOptions";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.ctype = Some(r.read_int32()?),
            2 => self.packed = Some(r.read_bool()?),
            3 => self.deprecated = Some(r.read_bool()?),
            5 => self.lazy = Some(r.read_bool()?),
            6 => self.jstype = Some(r.read_int32()?),
            10 => self.weak = Some(r.read_bool()?),
            999 => self.uninterpreted_option.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for OneofOptions {
    const NAME: &'static str = "OneofOptions";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            999 => self.uninterpreted_option.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for EnumOptions {
    const NAME: &'static str = "EnumOptions";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            2 => self.allow_alias = Some(r.read_bool()?),
            3 => self.deprecated = Some(r.read_bool()?),
            999 => self.uninterpreted_option.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for EnumValueOptions {
    const NAME: &'static str = "EnumValueOptions";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.deprecated = Some(r.read_bool()?),
            999 => self.uninterpreted_option.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for ServiceOptions {
    const NAME: &'static str = "ServiceOptions";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            33 => self.deprecated = Some(r.read_bool()?),
            999 => self.uninterpreted_option.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for MethodOptions {
    const NAME: &'static str = "MethodOptions";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            33 => self.deprecated = Some(r.read_bool()?),
            34 => self.idempotency_level = Some(r.read_int32()?),
            999 => self.uninterpreted_option.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for UninterpretedOption {
    const NAME: &'static str = "UninterpretedOption";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            2 => {
                let part: PartialNamePart = read_message(r)?;
                self.name.push(part.into_name_part()?);
            }
            3 => self.identifier_value = Some(r.read_string()?),
            4 => self.positive_int_value = Some(r.read_uint64()?),
            5 => self.negative_int_value = Some(r.read_int64()?),
            6 => self.double_value = Some(r.read_double()?),
            7 => self.string_value = Some(r.read_bytes()?),
            8 => self.aggregate_value = Some(r.read_string()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

/// [`NamePart`] while its required fields may still be absent
#[derive(Default)]
struct PartialNamePart {
    name_part: Option<String>,
    is_extension: Option<bool>,
}

impl PartialNamePart {
    fn into_name_part(self) -> Result<NamePart> {
        Ok(NamePart {
            name_part: self
                .name_part
                .ok_or_else(|| Error::missing_field(Self::NAME, "name_part"))?,
            is_extension: self
                .is_extension
                .ok_or_else(|| Error::missing_field(Self::NAME, "is_extension"))?,
        })
    }
}

impl Decode for PartialNamePart {
    const NAME: &'static str = "UninterpretedOption.NamePart";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.name_part = Some(r.read_string()?),
            2 => self.is_extension = Some(r.read_bool()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for SourceCodeInfo {
    const NAME: &'static str = "SourceCodeInfo";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => self.location.push(read_message(r)?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}

impl Decode for Location {
    const NAME: &'static str = "SourceCodeInfo.Location";

    fn merge_field(&mut self, tag: Tag, r: &mut WireReader<'_>) -> Result<()> {
        match tag.field_number {
            1 => r.read_repeated_int32(tag.wire_type, &mut self.path)?,
            2 => r.read_repeated_int32(tag.wire_type, &mut self.span)?,
            3 => self.leading_comments = Some(r.read_string()?),
            4 => self.trailing_comments = Some(r.read_string()?),
            6 => self.leading_detached_comments.push(r.read_string()?),
            _ => skip_unknown(Self::NAME, tag, r)?,
        }
        Ok(())
    }
}
