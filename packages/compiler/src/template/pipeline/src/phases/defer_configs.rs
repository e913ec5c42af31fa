//! Defer Configs
//!
//! Defer instructions take a configuration array, which ends up in the component consts. This
//! phase builds the timing options of each `@defer` block and wraps them for const collection,
//! which happens after i18n messages have taken their indices.

use crate::error::Result;
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::expression::const_collected;
use crate::template::pipeline::ir::CreateOp;
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

fn time_literal(time: Option<f64>) -> Expression {
    time.map_or_else(o::null_expr, |t| o::literal(t))
}

pub fn configure_defer_instructions(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            let CreateOp::Defer(defer) = op else {
                continue;
            };
            if let Some(min) = defer.placeholder_minimum_time {
                defer.placeholder_config =
                    Some(const_collected(o::literal_arr(vec![o::literal(min)])));
            }
            if defer.loading_minimum_time.is_some() || defer.loading_after_time.is_some() {
                defer.loading_config = Some(const_collected(o::literal_arr(vec![
                    time_literal(defer.loading_minimum_time),
                    time_literal(defer.loading_after_time),
                ])));
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
    use crate::template::pipeline::ir::ops::create_defer_op;
    use crate::template::pipeline::ir::SlotHandle;

    #[test]
    fn test_timing_options_are_wrapped_for_const_collection() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let defer = job.base.allocate_xref_id();
        let main = job.allocate_view(job.root).unwrap();
        let root = job.root;
        let mut op = create_defer_op(defer, main, SlotHandle::new(), None);
        op.placeholder_minimum_time = Some(100.0);
        op.loading_after_time = Some(500.0);
        job.views[&root].create.push(CreateOp::Defer(op));

        configure_defer_instructions(&mut job).unwrap();

        assert!(job.consts.is_empty());
        let Some(CreateOp::Defer(defer)) = job.views[&root].create.iter().next() else {
            panic!("expected a defer op");
        };
        let placeholder = const_collected(o::literal_arr(vec![o::literal(100.0)]));
        let loading = const_collected(o::literal_arr(vec![o::null_expr(), o::literal(500.0)]));
        assert!(defer
            .placeholder_config
            .as_ref()
            .is_some_and(|c| c.is_equivalent(&placeholder)));
        assert!(defer
            .loading_config
            .as_ref()
            .is_some_and(|c| c.is_equivalent(&loading)));
    }

    #[test]
    fn test_defer_without_timing_has_no_config() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let defer = job.base.allocate_xref_id();
        let main = job.allocate_view(job.root).unwrap();
        let root = job.root;
        job.views[&root]
            .create
            .push(CreateOp::Defer(create_defer_op(defer, main, SlotHandle::new(), None)));

        configure_defer_instructions(&mut job).unwrap();

        let Some(CreateOp::Defer(defer)) = job.views[&root].create.iter().next() else {
            panic!("expected a defer op");
        };
        assert!(defer.placeholder_config.is_none());
        assert!(defer.loading_config.is_none());
    }
}
