//! Schema tree construction from decoded descriptors.
//!
//! [`SchemaBuilder`] turns descriptor records into schema nodes file by
//! file. [`SchemaBuilder::finish`] then resolves type references across all
//! added files and runs the post-processing passes.

mod names;

pub use names::camel_case;

use crate::descriptor::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FieldType, FileDescriptorProto,
    FileDescriptorSet, Label, MethodDescriptorProto, ServiceDescriptorProto,
};
use crate::error::{Error, Result};
use crate::schema::{Enum, Field, Method, Namespace, Nested, OneOf, Reserved, Service, Type};
use crate::visitor::postprocess;
use crate::wire::RECURSION_LIMIT;
use tracing::{debug, trace, warn};

/// Message options copied onto schema types, by their snake_case keys
pub const MESSAGE_OPTIONS: &[&str] = &[
    "message_set_wire_format",
    "no_standard_descriptor_accessor",
    "deprecated",
    "map_entry",
];

/// Configuration for schema construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Keep field and oneof names as written instead of camelCasing them
    pub keep_case: bool,
    /// Sort reserved lists (names first, then ranges)
    pub sort_reserved: bool,
    /// Rewrite type references to fully-qualified names
    pub absolute_types: bool,
}

impl ConversionOptions {
    /// Creates options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to keep field names as written
    pub fn keep_case(mut self, keep: bool) -> Self {
        self.keep_case = keep;
        self
    }

    /// Sets whether to sort reserved lists
    pub fn sort_reserved(mut self, sort: bool) -> Self {
        self.sort_reserved = sort;
        self
    }

    /// Sets whether to rewrite type references to fully-qualified names
    pub fn absolute_types(mut self, absolute: bool) -> Self {
        self.absolute_types = absolute;
        self
    }
}

/// Accumulates files into one schema tree
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    root: Namespace,
    options: ConversionOptions,
    files: usize,
}

impl SchemaBuilder {
    /// Creates a builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with the given options
    pub fn with_options(options: ConversionOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// The tree built so far (unresolved)
    pub fn root(&self) -> &Namespace {
        &self.root
    }

    /// Builds a tree from `files` with default options
    pub fn build(files: &[FileDescriptorProto]) -> Result<Namespace> {
        let mut builder = Self::new();
        for file in files {
            builder.add_file(file)?;
        }
        builder.finish()
    }

    /// Adds every file of a descriptor set
    pub fn add_file_descriptor_set(&mut self, set: &FileDescriptorSet) -> Result<()> {
        for file in &set.file {
            self.add_file(file)?;
        }
        Ok(())
    }

    /// Adds one file: its messages, then its enums, then its services, all
    /// under the namespace named by its package
    pub fn add_file(&mut self, file: &FileDescriptorProto) -> Result<()> {
        debug!(
            "Adding file '{}' (package '{}'): {} messages, {} enums, {} services",
            file.name(),
            file.package(),
            file.message_type.len(),
            file.enum_type.len(),
            file.service.len()
        );

        let mut types = Vec::with_capacity(file.message_type.len());
        for message in &file.message_type {
            types.push(self.create_type(message, 1)?);
        }

        let segments = file.package().split('.').filter(|s| !s.is_empty()).count();
        if segments > RECURSION_LIMIT as usize {
            return Err(Error::invalid_descriptor(format!(
                "package of file '{}' has {} segments, more than {}",
                file.name(),
                segments,
                RECURSION_LIMIT
            )));
        }
        let namespace = self.root.define(file.package())?;
        for ty in types {
            namespace.add(Nested::Type(ty))?;
        }
        for en in &file.enum_type {
            namespace.add(Nested::Enum(create_enum(en)?))?;
        }
        for service in &file.service {
            namespace.add(Nested::Service(create_service(service)?))?;
        }

        self.files += 1;
        Ok(())
    }

    /// Resolves all type references and runs the post-processing passes
    pub fn finish(self) -> Result<Namespace> {
        let mut root = self.root;
        debug!("Resolving schema tree built from {} files", self.files);
        root.resolve_all()?;
        postprocess(&mut root, &self.options);
        Ok(root)
    }

    fn field_name(&self, name: &str) -> String {
        if self.options.keep_case {
            name.to_string()
        } else {
            camel_case(name)
        }
    }

    fn create_type(&self, desc: &DescriptorProto, depth: u32) -> Result<Type> {
        let name = desc.name();
        if name.is_empty() {
            return Err(Error::invalid_descriptor("message type without a name"));
        }
        if depth > RECURSION_LIMIT {
            return Err(Error::invalid_descriptor(format!(
                "message type '{}' is nested more than {} levels deep",
                name, RECURSION_LIMIT
            )));
        }
        let mut ty = Type::new(name);

        if let Some(options) = &desc.options {
            for key in MESSAGE_OPTIONS {
                if let Some(value) = options.flag(key) {
                    ty.options_mut().set(*key, value);
                }
            }
        }

        let mut oneofs: Vec<OneOf> = desc
            .oneof_decl
            .iter()
            .map(|decl| OneOf::new(self.field_name(decl.name())))
            .collect();

        for field_desc in &desc.field {
            let Some(mut field) = self.create_field(field_desc) else {
                continue;
            };
            if let Some(index) = field_desc.oneof_index {
                match usize::try_from(index).ok().and_then(|i| oneofs.get_mut(i)) {
                    Some(oneof) => {
                        oneof.fields.push(field.name.clone());
                        field.oneof = Some(oneof.name.clone());
                    }
                    None => warn!(
                        "Field {}.{} names oneof #{} which {} does not declare",
                        name, field.name, index, name
                    ),
                }
            }
            ty.add_field(field)?;
        }

        for oneof in oneofs.into_iter().filter(|o| !o.fields.is_empty()) {
            ty.add_oneof(oneof)?;
        }

        for nested in &desc.nested_type {
            ty.add(Nested::Type(self.create_type(nested, depth + 1)?))?;
        }
        for en in &desc.enum_type {
            ty.add(Nested::Enum(create_enum(en)?))?;
        }

        let reserved = desc
            .reserved_name
            .iter()
            .cloned()
            .map(Reserved::Name)
            .chain(
                desc.reserved_range
                    .iter()
                    .map(|r| Reserved::Range(r.start(), r.end().saturating_sub(1))),
            )
            .collect();
        ty.set_reserved(reserved);

        trace!(
            "Built type {} with {} fields and {} oneofs",
            name,
            ty.fields().len(),
            ty.oneofs().len()
        );
        Ok(ty)
    }

    /// `None` for group-typed fields and unknown type codes
    fn create_field(&self, desc: &FieldDescriptorProto) -> Option<Field> {
        let type_name = match desc.r#type.map(FieldType::from_i32) {
            Some(Some(FieldType::Message | FieldType::Enum)) => desc.type_name().to_string(),
            Some(Some(FieldType::Group)) => {
                trace!("Skipping group field '{}'", desc.name());
                return None;
            }
            Some(Some(scalar)) => scalar.scalar_keyword()?.to_string(),
            Some(None) => {
                trace!(
                    "Skipping field '{}' with unknown type code {}",
                    desc.name(),
                    desc.r#type()
                );
                return None;
            }
            // untyped but named: a reference left for resolution to classify
            None if !desc.type_name().is_empty() => desc.type_name().to_string(),
            None => {
                trace!("Skipping field '{}' without a type", desc.name());
                return None;
            }
        };

        if desc.number.is_none() {
            warn!("Field '{}' has no number, using 0", desc.name());
        }

        Some(Field::new(
            self.field_name(desc.name()),
            desc.number(),
            type_name,
            desc.label.and_then(Label::from_i32),
        ))
    }
}

fn create_enum(desc: &EnumDescriptorProto) -> Result<Enum> {
    let name = desc.name();
    if name.is_empty() {
        return Err(Error::invalid_descriptor("enum without a name"));
    }
    let mut en = Enum::new(name);
    for value in &desc.value {
        match value.number {
            Some(number) if !value.name().is_empty() => en.set_value(value.name(), number),
            _ => trace!("Skipping incomplete value in enum {}", name),
        }
    }

    // enum ranges are inclusive on the wire already
    let reserved = desc
        .reserved_name
        .iter()
        .cloned()
        .map(Reserved::Name)
        .chain(
            desc.reserved_range
                .iter()
                .map(|r| Reserved::Range(r.start(), r.end())),
        )
        .collect();
    en.set_reserved(reserved);
    Ok(en)
}

fn create_service(desc: &ServiceDescriptorProto) -> Result<Service> {
    let name = desc.name();
    if name.is_empty() {
        return Err(Error::invalid_descriptor("service without a name"));
    }
    let mut service = Service::new(name);
    for method in &desc.method {
        service.add_method(create_method(method))?;
    }
    Ok(service)
}

fn create_method(desc: &MethodDescriptorProto) -> Method {
    Method::new(
        desc.name(),
        desc.input_type(),
        desc.output_type(),
        desc.client_streaming(),
        desc.server_streaming(),
    )
}

/// Decodes a `FileDescriptorSet` and builds its schema tree
pub fn convert_file_descriptor_set(buf: &[u8], options: &ConversionOptions) -> Result<Namespace> {
    let set = FileDescriptorSet::decode(buf)?;
    debug!("Decoded descriptor set with {} files", set.file.len());
    let mut builder = SchemaBuilder::with_options(options.clone());
    builder.add_file_descriptor_set(&set)?;
    builder.finish()
}

/// Decodes a single `FileDescriptorProto` and builds its schema tree
pub fn convert_file_descriptor(buf: &[u8], options: &ConversionOptions) -> Result<Namespace> {
    let file = FileDescriptorProto::decode(buf)?;
    let mut builder = SchemaBuilder::with_options(options.clone());
    builder.add_file(&file)?;
    builder.finish()
}
