//! Removes the i18n context ops once messages are collected, and clears the references to them.

use crate::error::Result;
use crate::template::pipeline::ir::CreateOp;
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn remove_i18n_contexts(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        for id in unit.create.ids() {
            if let CreateOp::I18nStart(start) = unit.create.get_mut(id)? {
                start.context = None;
            } else if matches!(unit.create.get(id)?, CreateOp::I18nContext(_)) {
                unit.create.remove(id)?;
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
    use crate::i18n::i18n_ast::Message;
    use crate::template::pipeline::ir::ops::{create_i18n_context_op, create_i18n_start_op};
    use crate::template::pipeline::ir::{I18nContextKind, Op, OpKind};

    #[test]
    fn test_contexts_are_removed() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let block = job.base.allocate_xref_id();
        let context = job.base.allocate_xref_id();
        let root = job.root;
        let mut start = create_i18n_start_op(block, Message::new("m", "m"), None);
        if let CreateOp::I18nStart(op) = &mut start {
            op.context = Some(context);
        }
        let unit = &mut job.views[&root];
        unit.create.push(start);
        unit.create.push(create_i18n_context_op(
            I18nContextKind::RootI18n,
            context,
            Some(block),
            Message::new("m", "m"),
        ));

        remove_i18n_contexts(&mut job).unwrap();

        let unit = &job.views[&root];
        assert_eq!(unit.create.len(), 1);
        match unit.create.iter().next() {
            Some(CreateOp::I18nStart(start)) => assert_eq!(start.context, None),
            other => panic!("unexpected {:?}", other.map(|op| op.kind())),
        }
        assert!(unit.create.iter().all(|op| op.kind() != OpKind::I18nContext));
    }
}
