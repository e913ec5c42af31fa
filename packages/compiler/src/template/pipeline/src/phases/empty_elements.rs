//! Collapses start/end op pairs with nothing in between into a single op, e.g. `ElementStart`
//! followed by `ElementEnd` becomes `Element`.

use crate::error::Result;
use crate::template::pipeline::ir::{CreateOp, Op, OpKind};
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn collapse_empty_instructions(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        let create = unit.create_mut();
        for id in create.ids() {
            let start_kind = match create.get(id)?.kind() {
                OpKind::ElementEnd => OpKind::ElementStart,
                OpKind::ContainerEnd => OpKind::ContainerStart,
                OpKind::I18nEnd => OpKind::I18nStart,
                _ => continue,
            };
            // Pipes do not produce instructions between the pair.
            let mut prev = create.prev(id);
            while let Some(prev_id) = prev {
                if create.get(prev_id)?.kind() != OpKind::Pipe {
                    break;
                }
                prev = create.prev(prev_id);
            }
            let Some(start_id) = prev else {
                continue;
            };
            if create.get(start_id)?.kind() != start_kind {
                continue;
            }
            create.replace_with(start_id, |op| match op {
                CreateOp::ElementStart(element) => CreateOp::Element(element),
                CreateOp::ContainerStart(container) => CreateOp::Container(container),
                CreateOp::I18nStart(i18n) => CreateOp::I18n(i18n),
                other => other,
            })?;
            create.remove(id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::ops::{
        create_element_end_op, create_element_start_op, create_pipe_op,
    };
    use crate::template::pipeline::ir::{Namespace, SlotHandle};
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    fn kinds(job: &ComponentCompilationJob) -> Vec<OpKind> {
        job.views[&job.root].create.iter().map(|op| op.kind()).collect()
    }

    #[test]
    fn test_empty_element_collapses() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let outer = job.base.allocate_xref_id();
        let inner = job.base.allocate_xref_id();
        let pipe = job.base.allocate_xref_id();
        let create = &mut job.views[&root].create;
        create.push(create_element_start_op("div", outer, Namespace::HTML, None));
        create.push(create_element_start_op("span", inner, Namespace::HTML, None));
        create.push(create_pipe_op(pipe, SlotHandle::new(), "async"));
        create.push(create_element_end_op(inner));
        create.push(create_element_end_op(outer));

        collapse_empty_instructions(&mut job).unwrap();

        assert_eq!(
            kinds(&job),
            vec![OpKind::ElementStart, OpKind::Element, OpKind::Pipe, OpKind::ElementEnd]
        );
    }
}
