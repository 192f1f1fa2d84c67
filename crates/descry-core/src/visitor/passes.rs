//! Post-resolution rewrite passes.

use super::{apply_edits, visit, CompositeVisitor, Edit, VisitContext, Visitor};
use crate::builder::ConversionOptions;
use crate::schema::{Field, FieldNode, MapField, Method, Namespace, Type, TypeKind};
use tracing::{debug, warn};

/// Collapses every field whose type is a map-entry message into a
/// [`MapField`] in the same position.
///
/// Needs a resolved tree: fields without a resolution are left alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResolveMapsVisitor;

/// Key or value type of a map-entry slot
fn entry_slot_type(slot: &FieldNode) -> Option<String> {
    match slot {
        FieldNode::Field(field) => Some(field.effective_type().to_string()),
        FieldNode::Map(_) => None,
    }
}

/// The map-entry type a field refers to, if any
fn map_entry<'t>(field: &Field, root: &'t Namespace) -> Option<&'t Type> {
    let resolved = field.resolved.as_ref()?;
    if resolved.kind != TypeKind::Message {
        return None;
    }
    root.lookup_type(&resolved.full_name).filter(|entry| entry.is_map_entry())
}

/// Key and value types of a map entry with both slots present
fn map_slots(entry: &Type) -> Option<(String, String)> {
    let key = entry.field_by_id(1).and_then(entry_slot_type)?;
    let value = entry.field_by_id(2).and_then(entry_slot_type)?;
    Some((key, value))
}

impl Visitor for ResolveMapsVisitor {
    fn visit_field(&mut self, field: &Field, cx: &mut VisitContext<'_>) {
        let Some(entry) = map_entry(field, cx.root()) else {
            return;
        };
        let Some((key_type, value_type)) = map_slots(entry) else {
            warn!(
                "Map entry {} lacks a key or value field, leaving {} as is",
                field.effective_type(),
                cx.full_name(&field.name)
            );
            return;
        };

        debug!(
            "Collapsing {} into map<{}, {}>",
            cx.full_name(&field.name),
            key_type,
            value_type
        );
        cx.replace_field(
            field.id,
            MapField {
                name: field.name.clone(),
                id: field.id,
                key_type,
                value_type,
            },
        );
    }
}

/// Removes the synthetic map-entry types once their fields are collapsed
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveMapEntriesVisitor;

impl Visitor for RemoveMapEntriesVisitor {
    fn visit_type(&mut self, ty: &Type, cx: &mut VisitContext<'_>) {
        if ty.is_map_entry() {
            debug!("Removing map entry type {}", cx.full_name(ty.name()));
            cx.remove_nested(ty.name());
        }
    }
}

/// Sorts reserved lists: names first, then ranges by start and end
#[derive(Debug, Default, Clone, Copy)]
pub struct SortReservedVisitor;

impl Visitor for SortReservedVisitor {
    fn visit_type(&mut self, ty: &Type, cx: &mut VisitContext<'_>) {
        if ty.reserved().windows(2).all(|w| w[0] <= w[1]) {
            return;
        }
        let mut path: Vec<String> = cx.scope().iter().map(|s| s.to_string()).collect();
        path.push(ty.name().to_string());
        cx.push_edit(Edit::SortReserved { path });
    }
}

/// Rewrites resolved type references to their fully-qualified names
#[derive(Debug, Default, Clone, Copy)]
pub struct AbsoluteTypesVisitor;

impl Visitor for AbsoluteTypesVisitor {
    fn visit_field(&mut self, field: &Field, cx: &mut VisitContext<'_>) {
        // Collapsed in the same walk, the field is gone by the time edits apply
        if map_entry(field, cx.root()).and_then(map_slots).is_some() {
            return;
        }
        if field.effective_type() != field.type_name {
            let owner = cx.scope().iter().map(|s| s.to_string()).collect();
            cx.push_edit(Edit::SetFieldType {
                owner,
                id: field.id,
                type_name: field.effective_type().to_string(),
            });
        }
    }

    fn visit_method(&mut self, method: &Method, cx: &mut VisitContext<'_>) {
        let request = method
            .resolved_request
            .as_ref()
            .map_or(&method.request_type, |r| &r.full_name);
        let response = method
            .resolved_response
            .as_ref()
            .map_or(&method.response_type, |r| &r.full_name);
        if *request == method.request_type && *response == method.response_type {
            return;
        }
        let owner = cx.scope().iter().map(|s| s.to_string()).collect();
        cx.push_edit(Edit::SetMethodTypes {
            owner,
            name: method.name.clone(),
            request_type: request.clone(),
            response_type: response.clone(),
        });
    }
}

/// Runs the rewrite passes over a resolved tree.
///
/// The first pass collapses map fields (plus the optional passes enabled
/// in `options`). The second removes the now unreferenced map-entry types.
/// Running it on a tree that was already post-processed changes nothing.
pub fn postprocess(root: &mut Namespace, options: &ConversionOptions) {
    let mut first = CompositeVisitor::new();
    first.add(ResolveMapsVisitor);
    if options.sort_reserved {
        first.add(SortReservedVisitor);
    }
    if options.absolute_types {
        first.add(AbsoluteTypesVisitor);
    }

    let edits = visit(root, &mut first);
    let applied = apply_edits(root, edits);
    debug!("First pass: {} visitors, {} edits", first.len(), applied);

    let edits = visit(root, &mut RemoveMapEntriesVisitor);
    let applied = apply_edits(root, edits);
    debug!("Second pass: removed {} map entry types", applied);
}
