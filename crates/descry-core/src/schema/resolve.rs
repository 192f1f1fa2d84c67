//! Type reference resolution.
//!
//! References are resolved the way protoc scopes them: a leading `.` makes
//! the name absolute, anything else is tried in the referencing scope first
//! and then in each enclosing scope up to the root.

use super::{is_scalar, FieldNode, Namespace, Nested, ResolvedType, TypeKind};
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::trace;

type Index = HashMap<String, TypeKind>;

impl Namespace {
    /// Resolves every non-scalar field type and every method request and
    /// response type in the tree.
    ///
    /// Runs over the finished tree, so forward references and references
    /// across files both resolve. Fails on the first reference that names
    /// nothing.
    pub fn resolve_all(&mut self) -> Result<()> {
        let mut index = Index::new();
        collect(&self.nested, "", &mut index);
        trace!("Resolving against {} named types", index.len());
        resolve_children(&mut self.nested, "", &index)
    }
}

fn collect(children: &[Nested], prefix: &str, index: &mut Index) {
    for child in children {
        let full_name = format!("{}.{}", prefix, child.name());
        match child {
            Nested::Namespace(ns) => collect(&ns.nested, &full_name, index),
            Nested::Type(ty) => {
                collect(&ty.nested, &full_name, index);
                index.insert(full_name, TypeKind::Message);
            }
            Nested::Enum(_) => {
                index.insert(full_name, TypeKind::Enum);
            }
            Nested::Service(_) => {}
        }
    }
}

fn resolve_children(children: &mut [Nested], prefix: &str, index: &Index) -> Result<()> {
    for child in children {
        let full_name = format!("{}.{}", prefix, child.name());
        match child {
            Nested::Namespace(ns) => resolve_children(&mut ns.nested, &full_name, index)?,
            Nested::Type(ty) => {
                for slot in ty.fields.iter_mut() {
                    if let FieldNode::Field(field) = slot {
                        if !is_scalar(&field.type_name) {
                            field.resolved = Some(lookup(index, &field.type_name, &full_name)?);
                        }
                    }
                }
                resolve_children(&mut ty.nested, &full_name, index)?;
            }
            Nested::Service(svc) => {
                for method in svc.methods.iter_mut() {
                    method.resolved_request =
                        Some(lookup(index, &method.request_type, &full_name)?);
                    method.resolved_response =
                        Some(lookup(index, &method.response_type, &full_name)?);
                }
            }
            Nested::Enum(_) => {}
        }
    }
    Ok(())
}

/// Resolves `name` starting from `scope` (a full name like `.pkg.Msg`)
fn lookup(index: &Index, name: &str, scope: &str) -> Result<ResolvedType> {
    if name.starts_with('.') {
        return index
            .get(name)
            .map(|&kind| ResolvedType {
                full_name: name.to_string(),
                kind,
            })
            .ok_or_else(|| Error::unresolved(name, scope));
    }

    let mut current = scope;
    loop {
        let candidate = format!("{}.{}", current, name);
        if let Some(&kind) = index.get(&candidate) {
            return Ok(ResolvedType {
                full_name: candidate,
                kind,
            });
        }
        if current.is_empty() {
            break;
        }
        current = current.rfind('.').map_or("", |i| &current[..i]);
    }

    Err(Error::unresolved(name, scope))
}
