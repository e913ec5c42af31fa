//! Conditionals
//!
//! Collapse the various conditions of conditional ops (`@if`, `@switch`) into a single test
//! expression, a chain of ternaries evaluating to the slot of the view to render.

use crate::error::Result;
use crate::output::output_ast as o;
use crate::template::pipeline::ir::expression::{
    assign_temporary, read_temporary, slot_literal, ConditionalCaseExpr,
};
use crate::template::pipeline::ir::ops::ConditionalOp;
use crate::template::pipeline::ir::{UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::{ComponentCompilationJob, JobBase};

pub fn generate_conditional_expressions(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        for op in unit.update.iter_mut() {
            if let UpdateOp::Conditional(conditional) = op {
                process(conditional, &mut job.base);
            }
        }
    }
    Ok(())
}

fn process(op: &mut ConditionalOp, base: &mut JobBase) {
    let mut conditions = std::mem::take(&mut op.conditions);

    // Any case with a missing condition is the default. If one exists, fall back to it instead.
    let mut test = match conditions.iter().position(|case| case.expr.is_none()) {
        Some(index) => slot_literal(conditions.remove(index).target_slot),
        // By default, a switch evaluates to `-1`, causing no template to be displayed.
        None => o::literal(-1),
    };

    // Switch expressions assign their main test to a temporary, to avoid re-executing it.
    let mut first_use = op
        .test
        .take()
        .map(|subject| (base.allocate_xref_id(), subject));
    let tmp_xref = first_use.as_ref().map(|(xref, _)| *xref);
    let mut case_temporary: Option<XrefId> = None;

    // For each remaining condition, test whether the temporary satisfies the check. If no
    // temporary is present, each expression is checked directly.
    for (index, case) in conditions.into_iter().enumerate().rev() {
        let ConditionalCaseExpr {
            expr: Some(case_expr),
            target_slot,
            alias,
            ..
        } = case
        else {
            continue;
        };
        let mut case_expr = *case_expr;

        if let Some(tmp_xref) = tmp_xref {
            let use_tmp = match first_use.take() {
                Some((xref, subject)) if index == 0 => assign_temporary(subject, xref),
                other => {
                    first_use = other;
                    read_temporary(tmp_xref)
                }
            };
            case_expr = use_tmp.identical(case_expr);
        } else if alias.is_some() {
            // Since only one variable can be passed into the conditional instruction, the same
            // temporary stores the result of every aliased case.
            let xref = *case_temporary.get_or_insert_with(|| base.allocate_xref_id());
            case_expr = assign_temporary(case_expr, xref);
            op.context_value = Some(read_temporary(xref));
        }

        test = case_expr.conditional(slot_literal(target_slot), Some(test));
    }

    op.processed = Some(test);
}
