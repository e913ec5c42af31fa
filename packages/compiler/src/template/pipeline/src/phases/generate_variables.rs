//! Generate Variables
//!
//! Generate a preamble sequence for each view update block and listener function which declares
//! any variables that may be referenced in other operations in the block.
//!
//! Variables generated include:
//!   * a saved view context to be used to restore the current view in event listeners.
//!   * the context of the restored view within event listener handlers.
//!   * context variables from the current view as well as all parent views (including the root
//!     context if needed).
//!   * local references from elements within the current view and any lexical parents.
//!
//! Variables are generated here unconditionally, and may be optimized away by later phases if it
//! turns out their values (and any side effects) are unused.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::expression::{
    context, context_let_reference, next_context, reference,
};
use crate::template::pipeline::ir::ops::VariableOp;
use crate::template::pipeline::ir::variable::AliasVariable;
use crate::template::pipeline::ir::{
    CreateOp, SemanticVariable, SlotHandle, UpdateOp, VariableFlags, XrefId, CTX_REF,
};
use crate::template::pipeline::src::compilation::{ComponentCompilationJob, JobBase};

/// The lexical scope of a view, including a link to its parent view's scope, if any.
struct Scope {
    view: XrefId,
    /// Names declared in this view, with the context property each one reads.
    context_variables: Vec<(String, String)>,
    aliases: Vec<AliasVariable>,
    /// Local references collected from elements within the view.
    references: Vec<Reference>,
    /// `@let` declarations collected from the view.
    let_declarations: Vec<LetDeclaration>,
    /// Index of the parent view's scope.
    parent: Option<usize>,
}

/// A local reference collected from an element within a view.
struct Reference {
    /// Name given to the local reference in the template. Not the generated variable name.
    name: String,
    /// The element-like node which this reference targets, either the element itself or a
    /// directive on it.
    target: XrefId,
    target_slot: SlotHandle,
    /// Offset of this reference among all the references on the same element.
    offset: usize,
}

struct LetDeclaration {
    target: XrefId,
    target_slot: SlotHandle,
    name: String,
}

pub fn generate_variables(job: &mut ComponentCompilationJob) -> Result<()> {
    let (scopes, scope_of_view) = collect_scopes(job)?;

    let base = &mut job.base;
    for (xref, view) in job.views.iter_mut() {
        let Some(&scope) = scope_of_view.get(xref) else {
            continue;
        };
        for op in view.create.iter_mut() {
            // Each listener and track function body gets its own preamble.
            let (list, is_callback) = match op {
                CreateOp::RepeaterCreate(repeater) => match &mut repeater.track_by_ops {
                    Some(ops) => (ops, false),
                    None => continue,
                },
                other => match other.handler_ops_mut() {
                    Some(ops) => (ops, true),
                    None => continue,
                },
            };
            list.prepend(variables_in_scope(&scopes, scope, *xref, is_callback, base));
        }
        view.update
            .prepend(variables_in_scope(&scopes, scope, *xref, false, base));
    }
    Ok(())
}

/// Build the scope of every view reachable from the root, parents before children.
fn collect_scopes(job: &ComponentCompilationJob) -> Result<(Vec<Scope>, HashMap<XrefId, usize>)> {
    let mut scopes = Vec::new();
    let mut scope_of_view = HashMap::new();
    let mut pending = vec![(job.root, None)];
    while let Some((xref, parent)) = pending.pop() {
        let view = job.view(xref)?;
        let index = scopes.len();
        scopes.push(scope_for_view(job, xref, parent)?);
        scope_of_view.insert(xref, index);

        for op in view.create.iter() {
            match op {
                CreateOp::Template(op)
                | CreateOp::ConditionalCreate(op)
                | CreateOp::ConditionalBranchCreate(op) => {
                    pending.push((op.base.xref, Some(index)));
                }
                CreateOp::Projection(op) => {
                    if let Some(fallback) = op.fallback_view {
                        pending.push((fallback, Some(index)));
                    }
                }
                CreateOp::RepeaterCreate(op) => {
                    pending.push((op.base.xref, Some(index)));
                    if let Some(empty) = op.empty_view {
                        pending.push((empty, Some(index)));
                    }
                }
                _ => {}
            }
        }
    }
    Ok((scopes, scope_of_view))
}

fn scope_for_view(job: &ComponentCompilationJob, xref: XrefId, parent: Option<usize>) -> Result<Scope> {
    let view = job.view(xref)?;
    let mut scope = Scope {
        view: xref,
        context_variables: view
            .context_variables
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        aliases: view.aliases.clone(),
        references: Vec::new(),
        let_declarations: Vec::new(),
        parent,
    };

    for op in view.create.iter() {
        match op {
            CreateOp::ElementStart(_)
            | CreateOp::Template(_)
            | CreateOp::ConditionalCreate(_)
            | CreateOp::ConditionalBranchCreate(_) => {
                let base = op.element_base().ok_or_else(|| {
                    PipelineError::assertion("expected an element-like op to carry local refs")
                })?;
                for (offset, local_ref) in base.local_refs.iter().enumerate() {
                    scope.references.push(Reference {
                        name: local_ref.name.clone(),
                        target: base.xref,
                        target_slot: base.handle.clone(),
                        offset,
                    });
                }
            }
            CreateOp::DeclareLet(op) => scope.let_declarations.push(LetDeclaration {
                target: op.xref,
                target_slot: op.handle.clone(),
                name: op.declared_name.clone(),
            }),
            _ => {}
        }
    }
    Ok(scope)
}

/// Declarations for all variables in scope for `view`. Views inherit the variables of their
/// parent view, so this walks up the scope chain.
fn variables_in_scope(
    scopes: &[Scope],
    scope_index: usize,
    view: XrefId,
    is_callback: bool,
    base: &mut JobBase,
) -> Vec<UpdateOp> {
    let scope = &scopes[scope_index];
    let mut ops = Vec::new();
    let mut declare = |variable: SemanticVariable,
                       initializer: Expression,
                       flags: VariableFlags,
                       base: &mut JobBase| {
        ops.push(UpdateOp::Variable(VariableOp::new(
            base.allocate_xref_id(),
            variable,
            initializer,
            flags,
        )));
    };

    if scope.view != view {
        // Switch to the parent view's context before reading its variables. The switch itself
        // declares a variable, because that context may be referenced directly.
        declare(
            SemanticVariable::context(scope.view),
            next_context(1),
            VariableFlags::NONE,
            base,
        );
    }

    for (name, value) in &scope.context_variables {
        let ctx = context(scope.view);
        // CTX_REF means the variable is the context itself.
        let initializer: Expression = if value == CTX_REF {
            ctx
        } else {
            ctx.prop(value.as_str())
        };
        declare(
            SemanticVariable::identifier(name.as_str(), false),
            initializer,
            VariableFlags::NONE,
            base,
        );
    }

    for alias in &scope.aliases {
        declare(
            SemanticVariable::Alias(alias.clone()),
            alias.expression.clone(),
            VariableFlags::ALWAYS_INLINE,
            base,
        );
    }

    for local_ref in &scope.references {
        declare(
            SemanticVariable::identifier(local_ref.name.as_str(), false),
            reference(local_ref.target, local_ref.target_slot.clone(), local_ref.offset),
            VariableFlags::NONE,
            base,
        );
    }

    // Within its own view a `@let` is read through the local variable created for its `storeLet`.
    if scope.view != view || is_callback {
        for decl in &scope.let_declarations {
            declare(
                SemanticVariable::identifier(decl.name.as_str(), false),
                context_let_reference(decl.target, decl.target_slot.clone()),
                VariableFlags::NONE,
                base,
            );
        }
    }

    if let Some(parent) = scope.parent {
        ops.extend(variables_in_scope(scopes, parent, view, false, base));
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::ops::{
        create_declare_let_op, create_element_start_op, create_listener_op, create_template_op,
        LocalRef,
    };
    use crate::template::pipeline::ir::{Namespace, TemplateKind};

    fn initializers(ops: Vec<&UpdateOp>) -> Vec<Expression> {
        ops.into_iter()
            .filter_map(|op| match op {
                UpdateOp::Variable(var) => Some(var.initializer.as_ref().clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_child_view_inherits_parent_references() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let element = job.base.allocate_xref_id();
        let child = job.allocate_view(root).unwrap();

        let mut start = create_element_start_op("input", element, Namespace::HTML, None);
        if let Some(base) = start.element_base_mut() {
            base.local_refs.push(LocalRef {
                name: "field".to_string(),
                target: String::new(),
            });
        }
        job.views[&root].create.push(start);
        job.views[&root].create.push(create_template_op(
            child,
            TemplateKind::NgTemplate,
            None,
            "Template",
            Namespace::HTML,
            None,
        ));
        job.views[&child]
            .context_variables
            .insert("item".to_string(), "$implicit".to_string());

        generate_variables(&mut job).unwrap();

        let root_vars = initializers(job.views[&root].update.iter().collect());
        assert_eq!(root_vars.len(), 1);
        assert!(matches!(&root_vars[0], Expression::Reference(r) if r.target == element));

        let child_vars = initializers(job.views[&child].update.iter().collect());
        assert_eq!(child_vars.len(), 3);
        assert!(matches!(&child_vars[0], Expression::ReadProp(p) if p.name == "$implicit"));
        assert!(matches!(&child_vars[1], Expression::NextContext(n) if n.steps == 1));
        assert!(matches!(&child_vars[2], Expression::Reference(r) if r.offset == 0));
    }

    #[test]
    fn test_listeners_see_let_declarations_of_their_own_view() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let element = job.base.allocate_xref_id();
        let decl = job.base.allocate_xref_id();
        let handler_list = job.base.allocate_list_id();
        job.views[&root]
            .create
            .push(create_element_start_op("button", element, Namespace::HTML, None));
        job.views[&root]
            .create
            .push(create_declare_let_op(decl, "count"));
        job.views[&root]
            .create
            .push(CreateOp::Listener(create_listener_op(
                element,
                SlotHandle::new(),
                "click",
                None,
                vec![],
                false,
                handler_list,
            )));

        generate_variables(&mut job).unwrap();

        // The update block reads `@let` values through the local variable of its `storeLet`.
        assert!(job.views[&root].update.is_empty());
        let listener = job.views[&root]
            .create
            .iter()
            .find_map(|op| op.handler_ops())
            .unwrap();
        let vars = initializers(listener.iter().collect());
        assert_eq!(vars.len(), 1);
        assert!(matches!(&vars[0], Expression::ContextLetReference(r) if r.target == decl));
    }
}
