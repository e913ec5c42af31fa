//! `track` functions in `for` repeaters can sometimes be "optimized", i.e. transformed into
//! inline expressions, in lieu of an external function call. For example, tracking by `$index`
//! can be optimized into an inline `trackByIndex` reference. This phase checks track expressions
//! for optimizable cases.

use crate::error::{PipelineError, Result};
use crate::output::output_ast::{self as o, Expression};
use crate::render3::r3_identifiers::Identifiers;
use crate::template::pipeline::ir::expression::{
    track_context, transform_expressions_in_expression,
};
use crate::template::pipeline::ir::ops::StatementOp;
use crate::template::pipeline::ir::{CreateOp, UpdateOp, VisitorContextFlag, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn optimize_track_fns(job: &mut ComponentCompilationJob) -> Result<()> {
    let root = job.root;
    let base = &mut job.base;
    for (&unit, view) in job.views.iter_mut() {
        for op in view.create.iter_mut() {
            let CreateOp::RepeaterCreate(repeater) = op else {
                continue;
            };

            match &repeater.track {
                // Top-level access of `$index` uses the built in `repeaterTrackByIndex`.
                Expression::ReadVar(read) if read.name == "$index" => {
                    repeater.track_by_fn = Some(o::import_ref(Identifiers::repeater_track_by_index()));
                    continue;
                }
                // Top-level access of the item uses the built in `repeaterTrackByIdentity`.
                Expression::ReadVar(read) if read.name == "$item" => {
                    repeater.track_by_fn =
                        Some(o::import_ref(Identifiers::repeater_track_by_identity()));
                    continue;
                }
                _ => {}
            }

            if let Some((method, view)) = track_by_method(root, &repeater.track) {
                // The method might be using `this` internally.
                repeater.uses_component_instance = true;
                if view == unit {
                    // Top-level method calls in the form of `fn($index, item)` can be passed in
                    // directly.
                    repeater.track_by_fn = Some(method);
                } else {
                    // A plain method call outside of the component's root view needs the component
                    // instance. The context is not available here, so the original track
                    // expression is overwritten rather than resolved later.
                    let Expression::ReadProp(read) = method else {
                        continue;
                    };
                    let track_by_fn = o::import_ref(Identifiers::component_instance())
                        .call_fn(vec![])
                        .prop(read.name);
                    repeater.track = track_by_fn.clone();
                    repeater.track_by_fn = Some(track_by_fn);
                }
                continue;
            }

            // The track function could not be optimized. Context reads in a track function are
            // emitted specially, so they become track context reads.
            let mut uses_component_instance = false;
            let mut has_pipe = false;
            let track = std::mem::replace(&mut repeater.track, o::null_expr());
            repeater.track = transform_expressions_in_expression(
                track,
                &mut |expr, _| match expr {
                    Expression::PipeBinding(_) | Expression::PipeBindingVariadic(_) => {
                        has_pipe = true;
                        expr
                    }
                    Expression::Context(ctx) => {
                        uses_component_instance = true;
                        track_context(ctx.view)
                    }
                    other => other,
                },
                VisitorContextFlag::NONE,
            );
            if has_pipe {
                return Err(PipelineError::assertion(
                    "pipes are not allowed in track expressions",
                ));
            }
            repeater.uses_component_instance |= uses_component_instance;

            // The track function body may need additional ops later, e.g. temporary variables.
            let mut track_by_ops = base.new_op_list();
            track_by_ops.push(UpdateOp::Statement(StatementOp::new(o::return_stmt(
                repeater.track.clone(),
            ))));
            repeater.track_by_ops = Some(track_by_ops);
        }
    }
    Ok(())
}

/// The component method in a track expression of the form `ctx.fn($index)` or
/// `ctx.fn($index, $item)`, along with the view the context was read from.
fn track_by_method(root: XrefId, track: &Expression) -> Option<(Expression, XrefId)> {
    let Expression::InvokeFn(call) = track else {
        return None;
    };
    let Expression::ReadProp(read) = call.fn_.as_ref() else {
        return None;
    };
    let Expression::Context(ctx) = read.receiver.as_ref() else {
        return None;
    };
    if ctx.view != root {
        return None;
    }
    let is_read_of = |arg: &Expression, name: &str| matches!(arg, Expression::ReadVar(v) if v.name == name);
    let matches_args = match call.args.as_slice() {
        [index] => is_read_of(index, "$index"),
        [index, item] => is_read_of(index, "$index") && is_read_of(item, "$item"),
        _ => false,
    };
    matches_args.then(|| (call.fn_.as_ref().clone(), ctx.view))
}
