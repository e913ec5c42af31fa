//! Inside the `track` expression of a `@for` loop, only `$index` and the item are in scope. They
//! are rewritten into the parameter names of the generated track function, `$index` and `$item`.

use crate::error::Result;
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::expression::transform_expressions_in_expression;
use crate::template::pipeline::ir::{CreateOp, VisitorContextFlag};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn generate_track_variables(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            let CreateOp::RepeaterCreate(repeater) = op else {
                continue;
            };
            let var_names = &repeater.var_names;
            let track = std::mem::replace(&mut repeater.track, o::null_expr());
            repeater.track = transform_expressions_in_expression(
                track,
                &mut |expr, _| match expr {
                    Expression::LexicalRead(read) if var_names.dollar_index.contains(&read.name) => {
                        o::variable("$index")
                    }
                    Expression::LexicalRead(read) if read.name == var_names.dollar_implicit => {
                        o::variable("$item")
                    }
                    other => other,
                },
                VisitorContextFlag::NONE,
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::expression::lexical_read;
    use crate::template::pipeline::ir::ops::{create_repeater_create_op, RepeaterVarNames};

    #[test]
    fn test_track_reads_loop_parameters() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let body = job.allocate_view(root).unwrap();
        let mut var_names = RepeaterVarNames {
            dollar_implicit: "user".to_string(),
            ..RepeaterVarNames::default()
        };
        var_names.dollar_index.insert("$index".to_string());
        var_names.dollar_index.insert("i".to_string());
        let track = lexical_read("user")
            .prop("id")
            .binary(o::BinaryOperator::Plus, lexical_read("i"));
        job.views[&root]
            .create
            .push(create_repeater_create_op(body, None, None, track, var_names, None));

        generate_track_variables(&mut job).unwrap();

        let Some(CreateOp::RepeaterCreate(repeater)) = job.views[&root].create.iter().next() else {
            panic!("expected a repeater");
        };
        let expected = o::variable("$item")
            .prop("id")
            .binary(o::BinaryOperator::Plus, o::variable("$index"));
        assert!(repeater.track.is_equivalent(&expected));
    }
}
