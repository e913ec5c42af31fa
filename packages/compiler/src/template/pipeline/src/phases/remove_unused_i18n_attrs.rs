//! An `I18nAttributes` op is created for every element with an i18n attribute, but only those
//! whose attributes hold dynamic content end up owning i18n expressions. The rest are dropped.

use std::collections::HashSet;

use crate::error::Result;
use crate::template::pipeline::ir::{CreateOp, UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn remove_unused_i18n_attributes_ops(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        let owners: HashSet<XrefId> = unit
            .update
            .iter()
            .filter_map(|op| match op {
                UpdateOp::I18nExpression(expr) => Some(expr.i18n_owner),
                _ => None,
            })
            .collect();

        for id in unit.create.ids() {
            if let CreateOp::I18nAttributes(op) = unit.create.get(id)? {
                if !owners.contains(&op.xref) {
                    unit.create.remove(id)?;
                }
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
    use crate::template::pipeline::ir::ops::{create_i18n_attributes_op, I18nExpressionOp};
    use crate::template::pipeline::ir::{
        I18nExpressionFor, I18nParamResolutionTime, SlotHandle,
    };

    #[test]
    fn test_only_owners_of_expressions_survive() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let (div, span) = (job.base.allocate_xref_id(), job.base.allocate_xref_id());
        let (used, unused) = (job.base.allocate_xref_id(), job.base.allocate_xref_id());
        let context = job.base.allocate_xref_id();
        let unit = &mut job.views[&root];
        unit.create
            .push(create_i18n_attributes_op(used, SlotHandle::new(), div));
        unit.create
            .push(create_i18n_attributes_op(unused, SlotHandle::new(), span));
        unit.update.push(UpdateOp::I18nExpression(I18nExpressionOp {
            context,
            target: div,
            i18n_owner: used,
            handle: SlotHandle::new(),
            expression: o::variable("name"),
            icu_placeholder: None,
            i18n_placeholder: Some("INTERPOLATION".into()),
            resolution_time: I18nParamResolutionTime::Creation,
            usage: I18nExpressionFor::I18nAttribute,
            name: "title".into(),
        }));

        remove_unused_i18n_attributes_ops(&mut job).unwrap();

        let remaining: Vec<_> = job.views[&root]
            .create
            .iter()
            .filter_map(CreateOp::xref)
            .collect();
        assert_eq!(remaining, vec![used]);
    }
}
