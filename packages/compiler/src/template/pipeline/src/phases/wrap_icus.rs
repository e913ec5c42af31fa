//! An ICU outside of any i18n block still needs one to be translated. Such ICUs are wrapped in a
//! new i18n block built from the ICU's own message.

use crate::error::Result;
use crate::template::pipeline::ir::ops::{create_i18n_end_op, create_i18n_start_op};
use crate::template::pipeline::ir::{CreateOp, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn wrap_i18n_icus(job: &mut ComponentCompilationJob) -> Result<()> {
    let ComponentCompilationJob { base, views, .. } = job;
    for unit in views.values_mut() {
        let mut in_block = false;
        let mut added_block: Option<XrefId> = None;
        for id in unit.create.ids() {
            let standalone_icu = match unit.create.get(id)? {
                CreateOp::I18nStart(_) => {
                    in_block = true;
                    None
                }
                CreateOp::I18nEnd(_) => {
                    in_block = false;
                    None
                }
                CreateOp::IcuStart(icu) if !in_block => Some(icu.message.clone()),
                CreateOp::IcuEnd(_) => {
                    if let Some(xref) = added_block.take() {
                        unit.create.insert_after(id, create_i18n_end_op(xref))?;
                    }
                    None
                }
                _ => None,
            };
            if let Some(message) = standalone_icu {
                let xref = base.allocate_xref_id();
                unit.create
                    .insert_before(id, create_i18n_start_op(xref, message, None))?;
                added_block = Some(xref);
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
    use crate::template::pipeline::ir::ops::{create_icu_end_op, create_icu_start_op};
    use crate::template::pipeline::ir::{Op, OpKind};

    fn kinds(job: &ComponentCompilationJob) -> Vec<OpKind> {
        job.views[&job.root].create.iter().map(|op| op.kind()).collect()
    }

    #[test]
    fn test_standalone_icu_is_wrapped() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let icu = job.base.allocate_xref_id();
        let message = Message::new("{count, plural, =1 {one}}", "m");
        let unit = &mut job.views[&root];
        unit.create
            .push(create_icu_start_op(icu, message.clone(), "ICU"));
        unit.create.push(create_icu_end_op(icu));

        wrap_i18n_icus(&mut job).unwrap();

        assert_eq!(
            kinds(&job),
            [OpKind::I18nStart, OpKind::IcuStart, OpKind::IcuEnd, OpKind::I18nEnd]
        );
        let ops: Vec<_> = job.views[&root].create.iter().collect();
        match (ops[0], ops[3]) {
            (CreateOp::I18nStart(start), CreateOp::I18nEnd(end)) => {
                assert_eq!(start.xref, end.xref);
                assert_eq!(start.root, start.xref);
                assert!(std::sync::Arc::ptr_eq(&start.message, &message));
            }
            _ => panic!("expected the ICU to be wrapped"),
        }
    }

    #[test]
    fn test_icu_inside_block_is_left_alone() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let block = job.base.allocate_xref_id();
        let icu = job.base.allocate_xref_id();
        let message = Message::new("m", "m");
        let unit = &mut job.views[&root];
        unit.create
            .push(create_i18n_start_op(block, message.clone(), None));
        unit.create
            .push(create_icu_start_op(icu, message, "ICU"));
        unit.create.push(create_icu_end_op(icu));
        unit.create.push(create_i18n_end_op(block));

        wrap_i18n_icus(&mut job).unwrap();

        assert_eq!(
            kinds(&job),
            [OpKind::I18nStart, OpKind::IcuStart, OpKind::IcuEnd, OpKind::I18nEnd]
        );
    }
}
