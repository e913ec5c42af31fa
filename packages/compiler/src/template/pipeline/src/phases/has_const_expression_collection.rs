//! A `ConstCollected` expression may appear anywhere in the IR. Its inner expression is lifted
//! into the consts array and the node is replaced by the const index.

use crate::error::Result;
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::VisitorContextFlag;
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn collect_const_expressions(job: &mut ComponentCompilationJob) -> Result<()> {
    // The views are taken out so the job can hand out const indices while they are rewritten.
    let mut views = std::mem::take(&mut job.views);
    let mut lift = |expr: Expression, _flags: VisitorContextFlag| match expr {
        Expression::ConstCollected(collected) => {
            o::literal(job.add_const(*collected.expr, vec![]).as_usize())
        }
        other => other,
    };
    for unit in views.values_mut() {
        for op in unit.create.iter_mut() {
            op.transform_expressions(&mut lift, VisitorContextFlag::NONE);
        }
        for op in unit.update.iter_mut() {
            op.transform_expressions(&mut lift, VisitorContextFlag::NONE);
        }
    }
    job.views = views;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::i18n::i18n_ast::Message;
    use crate::template::pipeline::ir::expression::const_collected;
    use crate::template::pipeline::ir::ops::{
        create_defer_op, create_i18n_end_op, create_i18n_start_op, I18nMessageOp,
    };
    use crate::template::pipeline::ir::{ConstIndex, CreateOp, SlotHandle, XrefId};
    use crate::template::pipeline::src::phases::i18n_const_collection::collect_i18n_consts;
    use indexmap::IndexMap;

    #[test]
    fn test_collected_expressions_become_const_indices() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let defer = job.base.allocate_xref_id();
        let main = job.allocate_view(job.root).unwrap();
        let root = job.root;
        job.add_const(o::literal("existing"), vec![]);
        let mut op = create_defer_op(defer, main, SlotHandle::new(), None);
        op.placeholder_config = Some(const_collected(o::literal_arr(vec![o::literal(10.0)])));
        op.loading_config = Some(const_collected(o::literal_arr(vec![o::literal(20.0)])));
        job.views[&root].create.push(CreateOp::Defer(op));

        collect_const_expressions(&mut job).unwrap();

        assert_eq!(job.consts.len(), 3);
        // Loading options are visited before placeholder options.
        assert!(job.consts[1].is_equivalent(&o::literal_arr(vec![o::literal(20.0)])));
        let Some(CreateOp::Defer(defer)) = job.views[&root].create.iter().next() else {
            panic!("expected a defer op");
        };
        assert!(defer
            .loading_config
            .as_ref()
            .is_some_and(|c| c.is_equivalent(&o::literal(1usize))));
        assert!(defer
            .placeholder_config
            .as_ref()
            .is_some_and(|c| c.is_equivalent(&o::literal(2usize))));
    }

    #[test]
    fn test_i18n_messages_are_indexed_before_collected_expressions() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let block = job.base.allocate_xref_id();
        let message = job.base.allocate_xref_id();
        let defer = job.base.allocate_xref_id();
        let main = job.allocate_view(root).unwrap();
        let mut defer_op = create_defer_op(defer, main, SlotHandle::new(), None);
        defer_op.loading_config = Some(const_collected(o::literal_arr(vec![o::literal(20.0)])));
        let unit = &mut job.views[&root];
        unit.create
            .push(create_i18n_start_op(block, Message::new("m", "m"), None));
        unit.create.push(create_i18n_end_op(block));
        unit.create.push(CreateOp::I18nMessage(I18nMessageOp {
            xref: message,
            i18n_context: XrefId(900),
            i18n_block: Some(block),
            message: Message::new("m", "m"),
            message_placeholder: None,
            params: IndexMap::new(),
            postprocessing_params: IndexMap::new(),
            needs_postprocessing: false,
            sub_messages: vec![],
        }));
        unit.create.push(CreateOp::Defer(defer_op));

        collect_i18n_consts(&mut job).unwrap();
        collect_const_expressions(&mut job).unwrap();

        let unit = &job.views[&root];
        let message_index = unit.create.iter().find_map(|op| match op {
            CreateOp::I18nStart(start) => start.message_index,
            _ => None,
        });
        assert_eq!(message_index, Some(ConstIndex(0)));
        let loading = unit.create.iter().find_map(|op| match op {
            CreateOp::Defer(defer) => defer.loading_config.clone(),
            _ => None,
        });
        assert!(loading.is_some_and(|c| c.is_equivalent(&o::literal(1usize))));
    }
}
