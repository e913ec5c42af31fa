//! Chaining Phase
//!
//! Converts runs of calls to the same chainable instruction into one chained call:
//! `ɵɵelementStart(0, 'div'); ɵɵelementStart(1, 'span');` becomes
//! `ɵɵelementStart(0, 'div')(1, 'span');`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::trace;

use crate::error::Result;
use crate::output::output_ast::{self as o, Expression, ExternalReference, Statement};
use crate::render3::r3_identifiers::Identifiers;
use crate::template::pipeline::ir::{CreateOp, OpId, OpList, UpdateOp};
use crate::template::pipeline::src::compilation::CompilationJob;

/// Instructions which return themselves and so may be called again on their own result,
/// mapped to the instruction a chain of them is continued by.
static CHAIN_COMPATIBILITY: Lazy<HashMap<ExternalReference, ExternalReference>> = Lazy::new(|| {
    [
        (Identifiers::aria_property(), Identifiers::aria_property()),
        (Identifiers::attribute(), Identifiers::attribute()),
        (Identifiers::class_prop(), Identifiers::class_prop()),
        (Identifiers::element(), Identifiers::element()),
        (Identifiers::element_container(), Identifiers::element_container()),
        (Identifiers::element_container_end(), Identifiers::element_container_end()),
        (Identifiers::element_container_start(), Identifiers::element_container_start()),
        (Identifiers::element_end(), Identifiers::element_end()),
        (Identifiers::element_start(), Identifiers::element_start()),
        (Identifiers::dom_property(), Identifiers::dom_property()),
        (Identifiers::i18n_exp(), Identifiers::i18n_exp()),
        (Identifiers::listener(), Identifiers::listener()),
        (Identifiers::property(), Identifiers::property()),
        (Identifiers::style_prop(), Identifiers::style_prop()),
        (Identifiers::synthetic_host_listener(), Identifiers::synthetic_host_listener()),
        (Identifiers::synthetic_host_property(), Identifiers::synthetic_host_property()),
        (Identifiers::template_create(), Identifiers::template_create()),
        (Identifiers::two_way_property(), Identifiers::two_way_property()),
        (Identifiers::two_way_listener(), Identifiers::two_way_listener()),
        (Identifiers::declare_let(), Identifiers::declare_let()),
        (Identifiers::conditional_create(), Identifiers::conditional_branch_create()),
        (Identifiers::conditional_branch_create(), Identifiers::conditional_branch_create()),
        (Identifiers::dom_element(), Identifiers::dom_element()),
        (Identifiers::dom_element_start(), Identifiers::dom_element_start()),
        (Identifiers::dom_element_end(), Identifiers::dom_element_end()),
        (Identifiers::dom_element_container(), Identifiers::dom_element_container()),
        (Identifiers::dom_element_container_start(), Identifiers::dom_element_container_start()),
        (Identifiers::dom_element_container_end(), Identifiers::dom_element_container_end()),
        (Identifiers::dom_listener(), Identifiers::dom_listener()),
        (Identifiers::dom_template(), Identifiers::dom_template()),
        (Identifiers::animation_enter(), Identifiers::animation_enter()),
        (Identifiers::animation_leave(), Identifiers::animation_leave()),
        (Identifiers::animation_enter_listener(), Identifiers::animation_enter_listener()),
        (Identifiers::animation_leave_listener(), Identifiers::animation_leave_listener()),
    ]
    .into_iter()
    .collect()
});

trait StatementSlot {
    fn statement_mut(&mut self) -> Option<&mut Statement>;
}

impl StatementSlot for CreateOp {
    fn statement_mut(&mut self) -> Option<&mut Statement> {
        match self {
            CreateOp::Statement(op) => Some(&mut op.statement),
            _ => None,
        }
    }
}

impl StatementSlot for UpdateOp {
    fn statement_mut(&mut self) -> Option<&mut Statement> {
        match self {
            UpdateOp::Statement(op) => Some(&mut op.statement),
            _ => None,
        }
    }
}

/// An in-progress chain.
struct Chain {
    /// The statement holding the whole chain.
    op: OpId,
    /// The compatible instruction every call in the chain maps to.
    compatible: ExternalReference,
    length: usize,
}

pub fn chain(job: &mut dyn CompilationJob) -> Result<()> {
    let (base, units) = job.parts_mut();
    if !base.enable_chaining {
        return Ok(());
    }
    let max_length = base.max_chain_length;
    for unit in units {
        let xref = unit.xref();
        let (create, update) = unit.lists_mut();
        let before = create.len() + update.len();
        chain_operations_in_list(create, max_length)?;
        chain_operations_in_list(update, max_length)?;
        trace!(
            unit = ?xref,
            folded = before - (create.len() + update.len()),
            "chained instructions"
        );
    }
    Ok(())
}

fn chain_operations_in_list<T: StatementSlot>(ops: &mut OpList<T>, max_length: usize) -> Result<()> {
    let mut chain: Option<Chain> = None;
    for id in ops.ids() {
        let Some((compatible, args)) = ops.get_mut(id)?.statement_mut().and_then(chainable_call)
        else {
            chain = None;
            continue;
        };

        match chain.as_mut() {
            Some(current) if current.compatible == compatible && current.length < max_length => {
                if let Some(Statement::Expression(head)) = ops.get_mut(current.op)?.statement_mut() {
                    let expr = std::mem::replace(head.expr.as_mut(), o::null_expr());
                    *head.expr = expr.call_fn(args);
                }
                current.length += 1;
                ops.remove(id)?;
            }
            _ => {
                chain = Some(Chain {
                    op: id,
                    compatible,
                    length: 1,
                });
            }
        }
    }
    Ok(())
}

/// The compatible instruction and arguments of a statement calling a chainable instruction.
fn chainable_call(statement: &mut Statement) -> Option<(ExternalReference, Vec<Expression>)> {
    let Statement::Expression(statement) = statement else {
        return None;
    };
    let Expression::InvokeFn(call) = statement.expr.as_ref() else {
        return None;
    };
    let Expression::External(external) = call.fn_.as_ref() else {
        return None;
    };
    CHAIN_COMPATIBILITY
        .get(&external.value)
        .map(|compatible| (compatible.clone(), call.args.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::ops::StatementOp;
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;
    use crate::template::pipeline::src::instruction as ng;

    fn job(options: &PipelineOptions) -> ComponentCompilationJob {
        ComponentCompilationJob::new("Cmp", ConstantPool::new(), options)
    }

    fn push_create(job: &mut ComponentCompilationJob, statement: Statement) {
        let root = job.root;
        job.views[&root]
            .create
            .push(CreateOp::Statement(StatementOp::new(statement)));
    }

    /// Number of calls folded into the chain held by `statement`.
    fn chain_length(statement: &Statement) -> usize {
        let Statement::Expression(statement) = statement else {
            panic!("expected an expression statement");
        };
        let mut length = 0;
        let mut expr = statement.expr.as_ref();
        while let Expression::InvokeFn(call) = expr {
            length += 1;
            expr = call.fn_.as_ref();
        }
        length
    }

    fn lengths(job: &ComponentCompilationJob) -> Vec<usize> {
        job.views[&job.root]
            .create
            .iter()
            .map(|op| match op {
                CreateOp::Statement(op) => chain_length(&op.statement),
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_consecutive_calls_are_chained() {
        let mut job = job(&PipelineOptions::default());
        push_create(&mut job, ng::element_end(false));
        push_create(&mut job, ng::element_end(false));
        push_create(&mut job, ng::enable_bindings());
        push_create(&mut job, ng::element_end(false));

        chain(&mut job).unwrap();

        assert_eq!(lengths(&job), vec![2, 1, 1]);
    }

    #[test]
    fn test_different_instructions_break_the_chain() {
        let mut job = job(&PipelineOptions::default());
        push_create(&mut job, ng::element_end(false));
        push_create(&mut job, ng::element_container_end(false));

        chain(&mut job).unwrap();

        assert_eq!(lengths(&job), vec![1, 1]);
    }

    #[test]
    fn test_conditional_branches_continue_a_conditional_chain() {
        let mut job = job(&PipelineOptions::default());
        let call = |instruction: ExternalReference, slot: usize| {
            o::import_ref(instruction)
                .call_fn(vec![o::literal(slot)])
                .to_stmt()
        };
        push_create(&mut job, call(Identifiers::conditional_create(), 0));
        push_create(&mut job, call(Identifiers::conditional_branch_create(), 1));
        push_create(&mut job, call(Identifiers::conditional_branch_create(), 2));

        chain(&mut job).unwrap();

        assert_eq!(lengths(&job), vec![3]);
    }

    #[test]
    fn test_chains_are_split_at_max_length() {
        let mut job = job(&PipelineOptions::default());
        for _ in 0..300 {
            push_create(&mut job, ng::element_end(false));
        }

        chain(&mut job).unwrap();

        assert_eq!(lengths(&job), vec![256, 44]);
    }

    #[test]
    fn test_chaining_can_be_disabled() {
        let options = PipelineOptions {
            enable_chaining: false,
            ..PipelineOptions::default()
        };
        let mut job = job(&options);
        push_create(&mut job, ng::element_end(false));
        push_create(&mut job, ng::element_end(false));

        chain(&mut job).unwrap();

        assert_eq!(lengths(&job), vec![1, 1]);
    }
}
