//! Finds all assignments and usages of temporary variables, which are linked to each other with
//! cross references. Generates names for each cross-reference, and adds a `DeclareVarStmt` to
//! initialize them at the beginning of the list.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{PipelineError, Result};
use crate::output::output_ast::{self as o, Expression, StmtModifier};
use crate::template::pipeline::ir::ops::StatementOp;
use crate::template::pipeline::ir::{
    CreateOp, ExpressionHolder, OpList, UpdateOp, VisitorContextFlag, XrefId,
};
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn generate_temporary_variables(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        let (create, update) = unit.lists_mut();
        generate_create_temporaries(create)?;
        generate_update_temporaries(update)?;
    }
    Ok(())
}

fn declarations(names: Vec<String>) -> impl Iterator<Item = StatementOp> {
    names
        .into_iter()
        .map(|name| StatementOp::new(o::declare_var(name, None, StmtModifier::NONE)))
}

fn generate_create_temporaries(ops: &mut OpList<CreateOp>) -> Result<()> {
    let mut names = Vec::new();
    for (index, op) in ops.iter_mut().enumerate() {
        names.extend(name_temporaries(op, index)?);
        // Handler and track function bodies declare their own temporaries.
        if let Some(handler_ops) = op.handler_ops_mut() {
            generate_update_temporaries(handler_ops)?;
        } else if let CreateOp::RepeaterCreate(repeater) = op {
            if let Some(track_by_ops) = &mut repeater.track_by_ops {
                generate_update_temporaries(track_by_ops)?;
            }
        }
    }
    ops.prepend(declarations(names).map(CreateOp::Statement).collect());
    Ok(())
}

fn generate_update_temporaries(ops: &mut OpList<UpdateOp>) -> Result<()> {
    let mut names = Vec::new();
    for (index, op) in ops.iter_mut().enumerate() {
        names.extend(name_temporaries(op, index)?);
    }
    ops.prepend(declarations(names).map(UpdateOp::Statement).collect());
    Ok(())
}

/// Names every temporary of one op and returns the distinct names. A name becomes free for reuse
/// after the final read of the temporary holding it.
fn name_temporaries(op: &mut impl ExpressionHolder, op_index: usize) -> Result<Vec<String>> {
    let in_child = |flags: VisitorContextFlag| flags.contains(VisitorContextFlag::IN_CHILD_OPERATION);

    let mut read_counts: HashMap<XrefId, usize> = HashMap::new();
    op.transform_expressions(
        &mut |expr, flags| {
            if let Expression::ReadTemporary(read) = &expr {
                if !in_child(flags) {
                    *read_counts.entry(read.xref).or_default() += 1;
                }
            }
            expr
        },
        VisitorContextFlag::NONE,
    );

    let mut count = 0usize;
    let mut defs: IndexMap<XrefId, String> = IndexMap::new();
    let mut error = None;
    op.transform_expressions(
        &mut |expr, flags| {
            if in_child(flags) {
                return expr;
            }
            match expr {
                Expression::AssignTemporary(mut assign) => {
                    let name = defs.entry(assign.xref).or_insert_with(|| {
                        let name = format!("tmp_{}_{}", op_index, count);
                        count += 1;
                        name
                    });
                    assign.name = Some(name.clone());
                    Expression::AssignTemporary(assign)
                }
                Expression::ReadTemporary(mut read) => {
                    if let Some(remaining) = read_counts.get_mut(&read.xref) {
                        *remaining -= 1;
                        if *remaining == 0 {
                            count = count.saturating_sub(1);
                        }
                    }
                    match defs.get(&read.xref) {
                        Some(name) => read.name = Some(name.clone()),
                        None => {
                            error.get_or_insert_with(|| {
                                PipelineError::assertion(format!(
                                    "found temporary {:?} read before it was assigned",
                                    read.xref
                                ))
                            });
                        }
                    }
                    Expression::ReadTemporary(read)
                }
                other => other,
            }
        },
        VisitorContextFlag::NONE,
    );
    if let Some(error) = error {
        return Err(error);
    }

    let mut names: Vec<String> = Vec::new();
    for name in defs.into_values() {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::expression::{assign_temporary, read_temporary};
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    fn statement(expr: Expression) -> UpdateOp {
        UpdateOp::Statement(StatementOp::new(expr.to_stmt()))
    }

    #[test]
    fn test_temporaries_are_named_and_declared() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let tmp = job.base.allocate_xref_id();
        job.views[&root].update.push(statement(
            assign_temporary(o::variable("a").call_fn(vec![]), tmp)
                .equals(o::null_expr())
                .conditional(o::null_expr(), Some(read_temporary(tmp).prop("b"))),
        ));

        generate_temporary_variables(&mut job).unwrap();

        let ops: Vec<_> = job.views[&root].update.iter().collect();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            ops[0],
            UpdateOp::Statement(StatementOp { statement: o::Statement::DeclareVar(decl), .. })
                if decl.name == "tmp_0_0"
        ));
    }

    #[test]
    fn test_names_are_reused_after_final_read() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let first = job.base.allocate_xref_id();
        let second = job.base.allocate_xref_id();
        // `(tmp1 = a(), tmp1) + (tmp2 = b(), tmp2)`: the first name is free again before the second
        // assignment.
        job.views[&root].update.push(statement(
            assign_temporary(o::variable("a").call_fn(vec![]), first)
                .or(read_temporary(first))
                .binary(
                    o::BinaryOperator::Plus,
                    assign_temporary(o::variable("b").call_fn(vec![]), second)
                        .or(read_temporary(second)),
                ),
        ));

        generate_temporary_variables(&mut job).unwrap();

        let declared: Vec<_> = job.views[&root]
            .update
            .iter()
            .filter_map(|op| match op {
                UpdateOp::Statement(StatementOp {
                    statement: o::Statement::DeclareVar(decl),
                    ..
                }) => Some(decl.name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(declared, vec!["tmp_0_0".to_string()]);
    }

    #[test]
    fn test_read_without_assignment_is_an_error() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let tmp = job.base.allocate_xref_id();
        job.views[&root].update.push(statement(read_temporary(tmp)));
        assert!(generate_temporary_variables(&mut job).is_err());
    }
}
