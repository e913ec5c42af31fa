//! Counts the variable slots used within each view and stores the count on the view, as well as on
//! the op declaring the view (for embedded views). Expressions that need to know where their
//! variables start receive their offset along the way.

use std::collections::HashMap;

use tracing::trace;

use crate::error::Result;
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::{CreateOp, UpdateOp, VisitorContextFlag, XrefId};
use crate::template::pipeline::src::compilation::{
    CompilationJob, CompilationUnit, ComponentCompilationJob,
};

/// Which expressions receive offsets in a pass over a unit.
#[derive(Clone, Copy, PartialEq, Eq)]
enum OffsetPass {
    All,
    /// Everything but pure functions, which get offsets in a later pass.
    SkipPureFunctions,
    PureFunctionsOnly,
}

pub fn count_variables(job: &mut dyn CompilationJob) -> Result<()> {
    // Compatibility mode assigns pure function offsets lazily, after every other expression.
    let passes: &[OffsetPass] = if job.base().is_compat() {
        &[OffsetPass::SkipPureFunctions, OffsetPass::PureFunctionsOnly]
    } else {
        &[OffsetPass::All]
    };

    for unit in job.units_mut() {
        let (create, update) = unit.lists_mut();
        // Top-level ops first, so conditional expressions (a pipe inside a ternary) cannot
        // shift the slots of top-level bindings.
        let mut var_count: usize = create.iter().map(CreateOp::vars_used).sum::<usize>()
            + update.iter().map(UpdateOp::vars_used).sum::<usize>();

        for &pass in passes {
            for op in create.iter_mut() {
                op.transform_expressions(
                    &mut |expr, _| assign_offset(expr, &mut var_count, pass),
                    VisitorContextFlag::NONE,
                );
            }
            for op in update.iter_mut() {
                op.transform_expressions(
                    &mut |expr, _| assign_offset(expr, &mut var_count, pass),
                    VisitorContextFlag::NONE,
                );
            }
        }
        trace!(unit = ?unit.xref(), vars = var_count, "counted variables");
        unit.set_vars(var_count)?;
    }

    if let Some(component) = job.as_component_mut() {
        propagate_view_vars(component)?;
    }
    Ok(())
}

fn assign_offset(mut expr: Expression, var_count: &mut usize, pass: OffsetPass) -> Expression {
    let is_pure_function = matches!(expr, Expression::PureFunction(_));
    let included = match pass {
        OffsetPass::All => true,
        OffsetPass::SkipPureFunctions => !is_pure_function,
        OffsetPass::PureFunctionsOnly => is_pure_function,
    };
    if !included {
        return expr;
    }
    if let Some(target) = expr.as_uses_var_offset_mut() {
        target.set_var_offset(*var_count);
    }
    if let Some(consumer) = expr.as_consumes_vars() {
        *var_count += consumer.vars_used();
    }
    expr
}

/// Copies each embedded view's count onto the op declaring it. The `@empty` view of a repeater is
/// read when the repeater is reified.
fn propagate_view_vars(job: &mut ComponentCompilationJob) -> Result<()> {
    let vars: HashMap<XrefId, usize> = job
        .views
        .iter()
        .map(|(xref, view)| Ok((*xref, view.vars()?)))
        .collect::<Result<_>>()?;

    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            match op {
                CreateOp::Template(op)
                | CreateOp::ConditionalCreate(op)
                | CreateOp::ConditionalBranchCreate(op) => {
                    op.vars = vars.get(&op.base.xref).copied();
                }
                CreateOp::RepeaterCreate(op) => {
                    op.vars = vars.get(&op.base.xref).copied();
                }
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::expression::{pipe_binding, pure_function};
    use crate::template::pipeline::ir::ops::{
        create_interpolate_text_op, create_property_op, create_template_op, Interpolation,
    };
    use crate::template::pipeline::ir::{
        BindingKind, CompatibilityMode, Namespace, SlotHandle, TemplateKind,
    };

    fn offsets(job: &mut ComponentCompilationJob) -> Vec<Option<usize>> {
        let root = job.root;
        let mut found = Vec::new();
        for op in job.views[&root].update.iter_mut() {
            op.visit_expressions(&mut |expr, _| match expr {
                Expression::PureFunction(e) => found.push(e.var_offset),
                Expression::PipeBinding(e) => found.push(e.var_offset),
                _ => {}
            });
        }
        found
    }

    fn job_with_bindings(options: &PipelineOptions) -> ComponentCompilationJob {
        let mut job = ComponentCompilationJob::new("Cmp", ConstantPool::new(), options);
        let root = job.root;
        let div = job.base.allocate_xref_id();
        let pipe = job.base.allocate_xref_id();
        let unit = &mut job.views[&root];
        // Property: 1 var. Pure function with one arg: 2 vars. Pipe with one arg: 2 vars.
        unit.update.push(UpdateOp::Property(create_property_op(
            div,
            "value",
            pure_function(o::variable("body"), vec![o::variable("a")]),
            BindingKind::Property,
            vec![],
        )));
        unit.update.push(UpdateOp::Property(create_property_op(
            div,
            "title",
            pipe_binding(pipe, SlotHandle::new(), "upper", vec![o::variable("b")]),
            BindingKind::Property,
            vec![],
        )));
        job
    }

    #[test]
    fn test_offsets_follow_top_level_bindings() {
        let mut job = job_with_bindings(&PipelineOptions::default());
        count_variables(&mut job).unwrap();

        assert_eq!(offsets(&mut job), vec![Some(2), Some(4)]);
        assert_eq!(job.views[&job.root].vars().unwrap(), 6);
    }

    #[test]
    fn test_compat_mode_offsets_pure_functions_last() {
        let options = PipelineOptions {
            compatibility: CompatibilityMode::TemplateDefinitionBuilder,
            ..Default::default()
        };
        let mut job = job_with_bindings(&options);
        count_variables(&mut job).unwrap();

        assert_eq!(offsets(&mut job), vec![Some(4), Some(2)]);
    }

    #[test]
    fn test_embedded_view_vars_reach_template_op() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let child = job.allocate_view(root).unwrap();
        let text = job.base.allocate_xref_id();
        job.views[&root].create.push(create_template_op(
            child,
            TemplateKind::NgTemplate,
            None,
            "Tmpl",
            Namespace::HTML,
            None,
        ));
        let interpolation = Interpolation::new(
            vec!["".into(), "-".into(), "".into()],
            vec![o::variable("a"), o::variable("b")],
            vec![],
        )
        .unwrap();
        job.views[&child]
            .update
            .push(create_interpolate_text_op(text, interpolation));

        count_variables(&mut job).unwrap();

        let vars = job.views[&root]
            .create
            .iter()
            .find_map(CreateOp::as_template)
            .and_then(|t| t.vars);
        assert_eq!(vars, Some(2));
    }
}
