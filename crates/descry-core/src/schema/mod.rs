//! The schema tree.
//!
//! A tree of reflection-style nodes rooted at a nameless [`Namespace`].
//! Containers own their children in insertion order and look them up by
//! name with a linear scan. Back-references are plain names: a [`OneOf`]
//! lists its member field names, a [`Field`] names its owning oneof, and a
//! resolved type reference is a fully-qualified name (`.pkg.Msg`) to look
//! up again through [`Namespace::lookup_type`].
//!
//! Nodes know nothing about their parents. Anything that needs a full name
//! computes it from the path it walked.

mod json;
mod resolve;

use crate::descriptor::Label;
use crate::error::{Error, Result};

/// Keywords that name scalar field types and never need resolution
pub const SCALAR_KEYWORDS: &[&str] = &[
    "double", "float", "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32",
    "fixed64", "sfixed32", "sfixed64", "bool", "string", "bytes",
];

/// Returns true if `type_name` is a scalar keyword
pub fn is_scalar(type_name: &str) -> bool {
    SCALAR_KEYWORDS.contains(&type_name)
}

/// A child of a namespace or message type
#[derive(Debug, Clone, PartialEq)]
pub enum Nested {
    /// A package path segment
    Namespace(Namespace),
    /// A message type
    Type(Type),
    /// An enum
    Enum(Enum),
    /// A service
    Service(Service),
}

impl Nested {
    /// The child's own (unqualified) name
    pub fn name(&self) -> &str {
        match self {
            Nested::Namespace(n) => &n.name,
            Nested::Type(t) => &t.name,
            Nested::Enum(e) => &e.name,
            Nested::Service(s) => &s.name,
        }
    }

    /// Children of a namespace or type; `None` for leaves
    pub fn nested(&self) -> Option<&[Nested]> {
        match self {
            Nested::Namespace(n) => Some(&n.nested),
            Nested::Type(t) => Some(&t.nested),
            Nested::Enum(_) | Nested::Service(_) => None,
        }
    }

    pub(crate) fn nested_mut(&mut self) -> Option<&mut Vec<Nested>> {
        match self {
            Nested::Namespace(n) => Some(&mut n.nested),
            Nested::Type(t) => Some(&mut t.nested),
            Nested::Enum(_) | Nested::Service(_) => None,
        }
    }
}

/// Walks `path` down through namespaces and types
fn find<'a>(children: &'a [Nested], path: &[&str]) -> Option<&'a Nested> {
    let (first, rest) = path.split_first()?;
    let node = children.iter().find(|n| n.name() == *first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        find(node.nested()?, rest)
    }
}

fn find_mut<'a, S: AsRef<str>>(children: &'a mut [Nested], path: &[S]) -> Option<&'a mut Nested> {
    let (first, rest) = path.split_first()?;
    let node = children.iter_mut().find(|n| n.name() == first.as_ref())?;
    if rest.is_empty() {
        Some(node)
    } else {
        find_mut(node.nested_mut()?, rest)
    }
}

fn add_nested(children: &mut Vec<Nested>, child: Nested, scope: &str) -> Result<()> {
    if children.iter().any(|n| n.name() == child.name()) {
        return Err(Error::duplicate(child.name(), scope));
    }
    children.push(child);
    Ok(())
}

/// A package segment; the tree root is a namespace with an empty name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    name: String,
    nested: Vec<Nested>,
}

impl Namespace {
    /// Creates an empty namespace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nested: Vec::new(),
        }
    }

    /// Creates an empty tree root
    pub fn root() -> Self {
        Self::default()
    }

    /// The namespace's own name (empty for the root)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Children in insertion order
    pub fn nested(&self) -> &[Nested] {
        &self.nested
    }

    /// Looks up a direct child by name
    pub fn get(&self, name: &str) -> Option<&Nested> {
        self.nested.iter().find(|n| n.name() == name)
    }

    /// Adds a child; its name must not be taken yet
    pub fn add(&mut self, child: Nested) -> Result<()> {
        add_nested(&mut self.nested, child, &self.name)
    }

    /// Removes and returns the direct child called `name`
    pub fn remove(&mut self, name: &str) -> Option<Nested> {
        let index = self.nested.iter().position(|n| n.name() == name)?;
        Some(self.nested.remove(index))
    }

    /// Returns the namespace at the dotted `path`, creating missing
    /// segments. Segments shared with earlier calls are reused.
    pub fn define(&mut self, path: &str) -> Result<&mut Namespace> {
        let mut current = self;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let index = match current.nested.iter().position(|n| n.name() == segment) {
                Some(index) => index,
                None => {
                    current.nested.push(Nested::Namespace(Namespace::new(segment)));
                    current.nested.len() - 1
                }
            };
            current = match &mut current.nested[index] {
                Nested::Namespace(namespace) => namespace,
                _ => return Err(Error::duplicate(segment, path)),
            };
        }
        Ok(current)
    }

    /// Looks up a node by fully-qualified name (leading `.` optional)
    pub fn lookup(&self, full_name: &str) -> Option<&Nested> {
        let path: Vec<&str> = full_name
            .trim_start_matches('.')
            .split('.')
            .filter(|s| !s.is_empty())
            .collect();
        find(&self.nested, &path)
    }

    /// Looks up a message type by fully-qualified name
    pub fn lookup_type(&self, full_name: &str) -> Option<&Type> {
        match self.lookup(full_name)? {
            Nested::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// Looks up an enum by fully-qualified name
    pub fn lookup_enum(&self, full_name: &str) -> Option<&Enum> {
        match self.lookup(full_name)? {
            Nested::Enum(en) => Some(en),
            _ => None,
        }
    }

    /// The node at `path`, for applying edits
    pub(crate) fn node_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Nested> {
        find_mut(&mut self.nested, path)
    }

    /// The child list of the container at `path` (the root's for an empty path)
    pub(crate) fn children_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Vec<Nested>> {
        if path.is_empty() {
            Some(&mut self.nested)
        } else {
            self.node_mut(path)?.nested_mut()
        }
    }
}

/// Boolean options stored under their snake_case keys, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    entries: Vec<(String, bool)>,
}

/// Folds `map_entry` and `mapEntry` to the same key
fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|&c| c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl Options {
    /// Sets an option, replacing any value stored under either spelling
    pub fn set(&mut self, key: impl Into<String>, value: bool) {
        let key = key.into();
        let folded = fold_key(&key);
        match self.entries.iter_mut().find(|(k, _)| fold_key(k) == folded) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Reads an option by either its snake_case or camelCase spelling
    pub fn get(&self, key: &str) -> Option<bool> {
        let folded = fold_key(key);
        self.entries
            .iter()
            .find(|(k, _)| fold_key(k) == folded)
            .map(|(_, v)| *v)
    }

    /// True when no option is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Options in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A reserved field name or closed number range.
///
/// The derived order is the total order used for sorting: all names first,
/// compared lexicographically, then ranges by start and then end.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reserved {
    /// A reserved field name
    Name(String),
    /// A closed range `[start, end]`
    Range(i32, i32),
}

/// Whether a resolved reference points at a message or an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A message type
    Message,
    /// An enum
    Enum,
}

/// The target of a resolved type reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    /// Fully-qualified name with a leading dot (`.pkg.Msg`)
    pub full_name: String,
    /// Kind of the referenced node
    pub kind: TypeKind,
}

/// A message field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Exposed (camelCased unless case is kept) name
    pub name: String,
    /// Field number
    pub id: i32,
    /// Scalar keyword, or the reference exactly as the descriptor wrote it
    pub type_name: String,
    /// Cardinality; `None` when the descriptor carried no label
    pub label: Option<Label>,
    /// Name of the owning oneof
    pub oneof: Option<String>,
    /// Filled in by [`Namespace::resolve_all`] for non-scalar types
    pub resolved: Option<ResolvedType>,
}

impl Field {
    /// Creates an unresolved field
    pub fn new(
        name: impl Into<String>,
        id: i32,
        type_name: impl Into<String>,
        label: Option<Label>,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            type_name: type_name.into(),
            label,
            oneof: None,
            resolved: None,
        }
    }

    /// True for `repeated` fields
    pub fn is_repeated(&self) -> bool {
        self.label == Some(Label::Repeated)
    }

    /// The type name to emit: the resolved full name when there is one
    pub fn effective_type(&self) -> &str {
        self.resolved
            .as_ref()
            .map_or(self.type_name.as_str(), |r| r.full_name.as_str())
    }
}

/// A `map<K, V>` field synthesized from a field and its map-entry type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapField {
    /// Name of the field it replaced
    pub name: String,
    /// Number of the field it replaced
    pub id: i32,
    /// Key type (scalar keyword or fully-qualified name)
    pub key_type: String,
    /// Value type (scalar keyword or fully-qualified name)
    pub value_type: String,
}

/// A field slot of a [`Type`]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldNode {
    /// A plain field
    Field(Field),
    /// A collapsed map field
    Map(MapField),
}

impl FieldNode {
    /// Field name
    pub fn name(&self) -> &str {
        match self {
            FieldNode::Field(f) => &f.name,
            FieldNode::Map(m) => &m.name,
        }
    }

    /// Field number
    pub fn id(&self) -> i32 {
        match self {
            FieldNode::Field(f) => f.id,
            FieldNode::Map(m) => m.id,
        }
    }
}

/// A oneof group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneOf {
    /// Group name
    pub name: String,
    /// Member field names in declaration order
    pub fields: Vec<String>,
}

impl OneOf {
    /// Creates an empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }
}

/// A message type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Type {
    name: String,
    options: Options,
    fields: Vec<FieldNode>,
    oneofs: Vec<OneOf>,
    nested: Vec<Nested>,
    reserved: Vec<Reserved>,
}

impl Type {
    /// Creates an empty message type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Mutable message options
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// True for synthetic map-entry types
    pub fn is_map_entry(&self) -> bool {
        self.options.get("map_entry").unwrap_or(false)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldNode] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [FieldNode] {
        &mut self.fields
    }

    /// Looks up a field slot by number
    pub fn field_by_id(&self, id: i32) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.id() == id)
    }

    /// Looks up a field slot by name
    pub fn field_by_name(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Adds a field; both its number and its name must be unused
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if self.field_by_id(field.id).is_some() {
            return Err(Error::duplicate(format!("#{}", field.id), &self.name));
        }
        if self.field_by_name(&field.name).is_some() {
            return Err(Error::duplicate(field.name, &self.name));
        }
        self.fields.push(FieldNode::Field(field));
        Ok(())
    }

    /// Replaces the field numbered `id` with a map field, keeping its
    /// position. Returns false if no such field exists.
    pub fn replace_field(&mut self, id: i32, map: MapField) -> bool {
        match self.fields.iter_mut().find(|f| f.id() == id) {
            Some(slot) => {
                *slot = FieldNode::Map(map);
                true
            }
            None => false,
        }
    }

    /// Oneof groups in declaration order
    pub fn oneofs(&self) -> &[OneOf] {
        &self.oneofs
    }

    /// Adds a oneof group; its name must be unused
    pub fn add_oneof(&mut self, oneof: OneOf) -> Result<()> {
        if self.oneofs.iter().any(|o| o.name == oneof.name) {
            return Err(Error::duplicate(oneof.name, &self.name));
        }
        self.oneofs.push(oneof);
        Ok(())
    }

    /// Nested types and enums in insertion order
    pub fn nested(&self) -> &[Nested] {
        &self.nested
    }

    /// Adds a nested type or enum; its name must be unused
    pub fn add(&mut self, child: Nested) -> Result<()> {
        add_nested(&mut self.nested, child, &self.name)
    }

    /// Reserved names and ranges
    pub fn reserved(&self) -> &[Reserved] {
        &self.reserved
    }

    /// Replaces the reserved list
    pub fn set_reserved(&mut self, reserved: Vec<Reserved>) {
        self.reserved = reserved;
    }

    /// Sorts the reserved list by the [`Reserved`] total order
    pub fn sort_reserved(&mut self) {
        self.reserved.sort();
    }
}

/// An enum with its values in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enum {
    name: String,
    values: Vec<(String, i32)>,
    reserved: Vec<Reserved>,
}

impl Enum {
    /// Creates an enum without values
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Enum name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets a value. A repeated name overwrites the earlier number in place.
    pub fn set_value(&mut self, name: impl Into<String>, number: i32) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = number,
            None => self.values.push((name, number)),
        }
    }

    /// Number of the value called `name`
    pub fn value(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Values in declaration order
    pub fn values(&self) -> impl Iterator<Item = (&str, i32)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Reserved names and ranges
    pub fn reserved(&self) -> &[Reserved] {
        &self.reserved
    }

    /// Replaces the reserved list
    pub fn set_reserved(&mut self, reserved: Vec<Reserved>) {
        self.reserved = reserved;
    }
}

/// An RPC method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Method {
    /// Method name
    pub name: String,
    /// Request type as written in the descriptor
    pub request_type: String,
    /// Response type as written in the descriptor
    pub response_type: String,
    /// Client streaming
    pub request_stream: bool,
    /// Server streaming
    pub response_stream: bool,
    /// Filled in by [`Namespace::resolve_all`]
    pub resolved_request: Option<ResolvedType>,
    /// Filled in by [`Namespace::resolve_all`]
    pub resolved_response: Option<ResolvedType>,
}

impl Method {
    /// Creates an unresolved method
    pub fn new(
        name: impl Into<String>,
        request_type: impl Into<String>,
        response_type: impl Into<String>,
        request_stream: bool,
        response_stream: bool,
    ) -> Self {
        Self {
            name: name.into(),
            request_type: request_type.into(),
            response_type: response_type.into(),
            request_stream,
            response_stream,
            resolved_request: None,
            resolved_response: None,
        }
    }
}

/// A service and its methods
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    name: String,
    methods: Vec<Method>,
}

impl Service {
    /// Creates a service without methods
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Methods in declaration order
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub(crate) fn methods_mut(&mut self) -> &mut [Method] {
        &mut self.methods
    }

    /// Adds a method; its name must be unused
    pub fn add_method(&mut self, method: Method) -> Result<()> {
        if self.methods.iter().any(|m| m.name == method.name) {
            return Err(Error::duplicate(method.name, &self.name));
        }
        self.methods.push(method);
        Ok(())
    }
}
