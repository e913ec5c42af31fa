//! Ordering
//!
//! Many types of operations have ordering constraints that must be respected. For example, a
//! `ClassMap` instruction must be ordered after a `StyleMap` instruction, in order to have
//! predictable semantics that match TemplateDefinitionBuilder and don't break applications.
//!
//! Ops are reordered only within runs of orderable ops that target the same element.

use crate::error::Result;
use crate::template::pipeline::ir::ops::BindingExpression;
use crate::template::pipeline::ir::{CreateOp, OpList, UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::{CompilationJob, CompilationJobKind};

/// One ordering group. Ops are assigned to the first rule whose test accepts them.
struct Rule<T> {
    test: fn(&T) -> bool,
    /// Only the last op of the group is kept. Later map bindings override earlier ones.
    keep_last: bool,
}

const fn rule<T>(test: fn(&T) -> bool) -> Rule<T> {
    Rule {
        test,
        keep_last: false,
    }
}

const fn last_wins<T>(test: fn(&T) -> bool) -> Rule<T> {
    Rule {
        test,
        keep_last: true,
    }
}

const CREATE_ORDERING: &[Rule<CreateOp>] = &[rule(is_listener)];

const UPDATE_ORDERING: &[Rule<UpdateOp>] = &[
    last_wins(is_style_map),
    last_wins(is_class_map),
    rule(is_style_prop),
    rule(is_class_prop),
    rule(is_interpolated_attribute),
    rule(is_interpolated_property),
    rule(is_plain_property),
    rule(is_plain_attribute),
];

const UPDATE_HOST_ORDERING: &[Rule<UpdateOp>] = &[
    rule(is_interpolated_dom_property),
    rule(is_plain_dom_property),
    rule(is_attribute),
    last_wins(is_style_map),
    last_wins(is_class_map),
    rule(is_style_prop),
    rule(is_class_prop),
];

fn is_listener(op: &CreateOp) -> bool {
    matches!(
        op,
        CreateOp::Listener(_) | CreateOp::TwoWayListener(_) | CreateOp::Animation(_)
    )
}

fn is_style_map(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::StyleMap(_))
}

fn is_class_map(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::ClassMap(_))
}

fn is_style_prop(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::StyleProp(_))
}

fn is_class_prop(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::ClassProp(_))
}

fn is_attribute(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::Attribute(_))
}

fn is_interpolated(expression: &BindingExpression) -> bool {
    matches!(expression, BindingExpression::Interpolation(_))
}

fn is_interpolated_attribute(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::Attribute(attr) if is_interpolated(&attr.expression))
}

fn is_plain_attribute(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::Attribute(attr) if !is_interpolated(&attr.expression))
}

fn is_interpolated_property(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::Property(prop) if is_interpolated(&prop.expression))
}

fn is_plain_property(op: &UpdateOp) -> bool {
    match op {
        UpdateOp::Property(prop) => !is_interpolated(&prop.expression),
        UpdateOp::TwoWayProperty(_) => true,
        _ => false,
    }
}

fn is_interpolated_dom_property(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::DomProperty(prop) if is_interpolated(&prop.expression))
}

fn is_plain_dom_property(op: &UpdateOp) -> bool {
    matches!(op, UpdateOp::DomProperty(prop) if !is_interpolated(&prop.expression))
}

fn update_target(op: &UpdateOp) -> Option<XrefId> {
    op.as_depends_on_slot_context().map(|op| op.target())
}

pub fn order_ops(job: &mut dyn CompilationJob) -> Result<()> {
    let update_ordering = if job.kind() == CompilationJobKind::Host {
        UPDATE_HOST_ORDERING
    } else {
        UPDATE_ORDERING
    };
    for unit in job.units_mut() {
        let (create, update) = unit.lists_mut();
        // Create ops don't depend on a slot context.
        order_within(create, CREATE_ORDERING, |_| None)?;
        order_within(update, update_ordering, update_target)?;
    }
    Ok(())
}

/// Order all the ops within the specified group.
fn order_within<T>(
    list: &mut OpList<T>,
    ordering: &[Rule<T>],
    target_of: fn(&T) -> Option<XrefId>,
) -> Result<()> {
    let mut ops_to_order: Vec<T> = Vec::new();
    // Only ops that target the same element are reordered together.
    let mut first_target_in_group: Option<XrefId> = None;

    let mut cursor = list.first();
    while let Some(id) = cursor {
        cursor = list.next(id);
        let op = list.get(id)?;
        let handled = ordering.iter().any(|rule| (rule.test)(op));
        let current_target = target_of(op);

        let target_changed = matches!(
            (first_target_in_group, current_target),
            (Some(first), Some(current)) if first != current
        );
        if !handled || target_changed {
            if !ops_to_order.is_empty() {
                list.insert_all_before(id, reorder(std::mem::take(&mut ops_to_order), ordering))?;
            }
            first_target_in_group = None;
        }

        if handled {
            ops_to_order.push(list.remove(id)?);
            first_target_in_group = current_target.or(first_target_in_group);
        }
    }
    list.push_all(reorder(ops_to_order, ordering));
    Ok(())
}

/// Reorders the given list of ops according to the ordering defined by `ordering`.
fn reorder<T>(ops: Vec<T>, ordering: &[Rule<T>]) -> Vec<T> {
    let mut groups: Vec<Vec<T>> = ordering.iter().map(|_| Vec::new()).collect();
    for op in ops {
        if let Some(index) = ordering.iter().position(|rule| (rule.test)(&op)) {
            groups[index].push(op);
        }
    }
    groups
        .into_iter()
        .zip(ordering)
        .flat_map(|(mut group, rule)| {
            if rule.keep_last && group.len() > 1 {
                group.drain(..group.len() - 1);
            }
            group
        })
        .collect()
}
