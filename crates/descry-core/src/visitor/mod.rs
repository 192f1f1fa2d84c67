//! Tree traversal with deferred rewrites.
//!
//! [`visit`] walks the schema tree pre-order and hands every node to a
//! [`Visitor`]. Visitors only ever see shared references. A visitor that
//! wants to change the tree records an [`Edit`] on the [`VisitContext`];
//! edits are applied by [`apply_edits`] once the walk is over, so no
//! container is mutated while it is being iterated.
//!
//! Walk order:
//!
//! - the root: `visit_namespace`, then `visit_root`, then its children
//! - a namespace: `visit_namespace`, then its children
//! - a type: `visit_type`, then each field (or map field), then each
//!   oneof, then its nested children
//! - a service: `visit_service`, then each method
//! - an enum: `visit_enum`
//!
//! Children are visited in insertion order.

mod passes;

pub use passes::{
    postprocess, AbsoluteTypesVisitor, RemoveMapEntriesVisitor, ResolveMapsVisitor,
    SortReservedVisitor,
};

use crate::schema::{
    Enum, Field, FieldNode, MapField, Method, Namespace, Nested, OneOf, Service, Type,
};
use tracing::{trace, warn};

/// Callbacks for each node kind. All of them default to doing nothing.
///
/// `cx.scope()` is the path of the container holding the node, so
/// `cx.full_name(node_name)` is the node's own full name.
pub trait Visitor {
    /// Called for the root and for every package segment
    fn visit_namespace(&mut self, namespace: &Namespace, cx: &mut VisitContext<'_>) {
        let _ = (namespace, cx);
    }

    /// Called once, for the root, right after its `visit_namespace`
    fn visit_root(&mut self, root: &Namespace, cx: &mut VisitContext<'_>) {
        let _ = (root, cx);
    }

    /// Called for every message type
    fn visit_type(&mut self, ty: &Type, cx: &mut VisitContext<'_>) {
        let _ = (ty, cx);
    }

    /// Called for every plain field; `cx.scope()` ends with the owning type
    fn visit_field(&mut self, field: &Field, cx: &mut VisitContext<'_>) {
        let _ = (field, cx);
    }

    /// Called for every map field; `cx.scope()` ends with the owning type
    fn visit_map_field(&mut self, field: &MapField, cx: &mut VisitContext<'_>) {
        let _ = (field, cx);
    }

    /// Called for every oneof; `cx.scope()` ends with the owning type
    fn visit_oneof(&mut self, oneof: &OneOf, cx: &mut VisitContext<'_>) {
        let _ = (oneof, cx);
    }

    /// Called for every enum
    fn visit_enum(&mut self, en: &Enum, cx: &mut VisitContext<'_>) {
        let _ = (en, cx);
    }

    /// Called for every service
    fn visit_service(&mut self, service: &Service, cx: &mut VisitContext<'_>) {
        let _ = (service, cx);
    }

    /// Called for every method; `cx.scope()` ends with the owning service
    fn visit_method(&mut self, method: &Method, cx: &mut VisitContext<'_>) {
        let _ = (method, cx);
    }
}

/// A tree rewrite recorded during a walk.
///
/// Every edit addresses its target by path from the root, so edits stay
/// valid no matter which of them is applied first.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Replace the field numbered `id` of the type at `owner` with a map
    /// field, in the same position
    ReplaceField {
        /// Path of the owning type
        owner: Vec<String>,
        /// Number of the field to replace
        id: i32,
        /// The replacement
        with: MapField,
    },
    /// Remove the child called `name` from the container at `owner`
    RemoveNested {
        /// Path of the container (empty for the root)
        owner: Vec<String>,
        /// Child name
        name: String,
    },
    /// Sort the reserved list of the type at `path`
    SortReserved {
        /// Path of the type
        path: Vec<String>,
    },
    /// Overwrite the type name of a plain field
    SetFieldType {
        /// Path of the owning type
        owner: Vec<String>,
        /// Field number
        id: i32,
        /// New type name
        type_name: String,
    },
    /// Overwrite the request and response type names of a method
    SetMethodTypes {
        /// Path of the owning service
        owner: Vec<String>,
        /// Method name
        name: String,
        /// New request type
        request_type: String,
        /// New response type
        response_type: String,
    },
}

/// Walk state shared with visitor callbacks
#[derive(Debug)]
pub struct VisitContext<'t> {
    root: &'t Namespace,
    scope: Vec<&'t str>,
    edits: Vec<Edit>,
}

impl<'t> VisitContext<'t> {
    fn new(root: &'t Namespace) -> Self {
        Self {
            root,
            scope: Vec::new(),
            edits: Vec::new(),
        }
    }

    /// The tree being walked, for lookups by full name
    pub fn root(&self) -> &'t Namespace {
        self.root
    }

    /// Names of the containers enclosing the current node
    pub fn scope(&self) -> &[&'t str] {
        &self.scope
    }

    /// Fully-qualified name (`.pkg.Msg`) of `name` in the current scope
    pub fn full_name(&self, name: &str) -> String {
        let mut full = String::new();
        for segment in &self.scope {
            full.push('.');
            full.push_str(segment);
        }
        full.push('.');
        full.push_str(name);
        full
    }

    fn owner(&self) -> Vec<String> {
        self.scope.iter().map(|s| s.to_string()).collect()
    }

    /// Records an arbitrary edit
    pub fn push_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Replaces a field of the type currently being walked
    pub fn replace_field(&mut self, id: i32, with: MapField) {
        let owner = self.owner();
        self.push_edit(Edit::ReplaceField { owner, id, with });
    }

    /// Removes `name` from the current container
    pub fn remove_nested(&mut self, name: &str) {
        let owner = self.owner();
        self.push_edit(Edit::RemoveNested {
            owner,
            name: name.to_string(),
        });
    }

    /// Edits recorded so far
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }
}

/// Walks the tree under `root`, returning the edits the visitor recorded
pub fn visit<V: Visitor + ?Sized>(root: &Namespace, visitor: &mut V) -> Vec<Edit> {
    let mut cx = VisitContext::new(root);
    visitor.visit_namespace(root, &mut cx);
    visitor.visit_root(root, &mut cx);
    walk_children(root.nested(), visitor, &mut cx);
    cx.edits
}

fn walk_children<'t, V: Visitor + ?Sized>(
    children: &'t [Nested],
    visitor: &mut V,
    cx: &mut VisitContext<'t>,
) {
    for child in children {
        match child {
            Nested::Namespace(ns) => {
                visitor.visit_namespace(ns, cx);
                cx.scope.push(ns.name());
                walk_children(ns.nested(), visitor, cx);
                cx.scope.pop();
            }
            Nested::Type(ty) => {
                visitor.visit_type(ty, cx);
                cx.scope.push(ty.name());
                for slot in ty.fields() {
                    match slot {
                        FieldNode::Field(field) => visitor.visit_field(field, cx),
                        FieldNode::Map(map) => visitor.visit_map_field(map, cx),
                    }
                }
                for oneof in ty.oneofs() {
                    visitor.visit_oneof(oneof, cx);
                }
                walk_children(ty.nested(), visitor, cx);
                cx.scope.pop();
            }
            Nested::Enum(en) => visitor.visit_enum(en, cx),
            Nested::Service(service) => {
                visitor.visit_service(service, cx);
                cx.scope.push(service.name());
                for method in service.methods() {
                    visitor.visit_method(method, cx);
                }
                cx.scope.pop();
            }
        }
    }
}

/// Applies edits in order. Returns how many found their target; edits
/// whose target is gone are logged and skipped.
pub fn apply_edits(root: &mut Namespace, edits: Vec<Edit>) -> usize {
    let mut applied = 0;
    for edit in edits {
        trace!("Applying {:?}", edit);
        if apply_edit(root, &edit) {
            applied += 1;
        } else {
            warn!("Edit target not found, skipping: {:?}", edit);
        }
    }
    applied
}

fn apply_edit(root: &mut Namespace, edit: &Edit) -> bool {
    match edit {
        Edit::ReplaceField { owner, id, with } => match root.node_mut(owner) {
            Some(Nested::Type(ty)) => ty.replace_field(*id, with.clone()),
            _ => false,
        },
        Edit::RemoveNested { owner, name } => match root.children_mut(owner) {
            Some(children) => {
                let before = children.len();
                children.retain(|child| child.name() != name);
                children.len() != before
            }
            None => false,
        },
        Edit::SortReserved { path } => match root.node_mut(path) {
            Some(Nested::Type(ty)) => {
                ty.sort_reserved();
                true
            }
            _ => false,
        },
        Edit::SetFieldType {
            owner,
            id,
            type_name,
        } => match root.node_mut(owner) {
            Some(Nested::Type(ty)) => ty.fields_mut().iter_mut().any(|slot| match slot {
                FieldNode::Field(field) if field.id == *id => {
                    field.type_name = type_name.clone();
                    true
                }
                _ => false,
            }),
            _ => false,
        },
        Edit::SetMethodTypes {
            owner,
            name,
            request_type,
            response_type,
        } => match root.node_mut(owner) {
            Some(Nested::Service(service)) => {
                match service.methods_mut().iter_mut().find(|m| m.name == *name) {
                    Some(method) => {
                        method.request_type = request_type.clone();
                        method.response_type = response_type.clone();
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        },
    }
}

/// Forwards every callback to each registered visitor in registration order
#[derive(Default)]
pub struct CompositeVisitor {
    visitors: Vec<Box<dyn Visitor>>,
}

impl CompositeVisitor {
    /// Creates an empty composite
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a visitor
    pub fn add(&mut self, visitor: impl Visitor + 'static) -> &mut Self {
        self.visitors.push(Box::new(visitor));
        self
    }

    /// Number of registered visitors
    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}

impl std::fmt::Debug for CompositeVisitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeVisitor")
            .field("visitors", &self.visitors.len())
            .finish()
    }
}

impl Visitor for CompositeVisitor {
    fn visit_namespace(&mut self, namespace: &Namespace, cx: &mut VisitContext<'_>) {
        for v in &mut self.visitors {
            v.visit_namespace(namespace, cx);
        }
    }

    fn visit_root(&mut self, root: &Namespace, cx: &mut VisitContext<'_>) {
        for v in &mut self.visitors {
            v.visit_root(root, cx);
        }
    }

    fn visit_type(&mut self, ty: &Type, cx: &mut VisitContext<'_>) {
        for v in &mut self.visitors {
            v.visit_type(ty, cx);
        }
    }

    fn visit_field(&mut self, field: &Field, cx: &mut VisitContext<'_>) {
        for v in &mut self.visitors {
            v.visit_field(field, cx);
        }
    }

    fn visit_map_field(&mut self, field: &MapField, cx: &mut VisitContext<'_>) {
        for v in &mut self.visitors {
            v.visit_map_field(field, cx);
        }
    }

    fn visit_oneof(&mut self, oneof: &OneOf, cx: &mut VisitContext<'_>) {
        for v in &mut self.visitors {
            v.visit_oneof(oneof, cx);
        }
    }

    fn visit_enum(&mut self, en: &Enum, cx: &mut VisitContext<'_>) {
        for v in &mut self.visitors {
            v.visit_enum(en, cx);
        }
    }

    fn visit_service(&mut self, service: &Service, cx: &mut VisitContext<'_>) {
        for v in &mut self.visitors {
            v.visit_service(service, cx);
        }
    }

    fn visit_method(&mut self, method: &Method, cx: &mut VisitContext<'_>) {
        for v in &mut self.visitors {
            v.visit_method(method, cx);
        }
    }
}
