//! Convert Animations
//!
//! `animate.enter` / `animate.leave` bindings are applied once at creation, so they move from
//! the update list into the create list, right after the element they animate.

use crate::error::Result;
use crate::output::output_ast as o;
use crate::template::pipeline::ir::expression::is_string_literal;
use crate::template::pipeline::ir::ops::{
    AnimationBindingOp, AnimationOp, AnimationStringOp, BindingExpression, StatementOp,
};
use crate::template::pipeline::ir::{AnimationKind, CreateOp, SlotHandle, UpdateOp};
use crate::template::pipeline::src::compilation::{CompilationJob, CompilationJobKind, JobBase};
use crate::template::pipeline::src::util::elements::{create_op_xref_map, lookup_element};

const ANIMATE_ENTER: &str = "animate.enter";

pub fn convert_animations(job: &mut dyn CompilationJob) -> Result<()> {
    let is_host = job.kind() == CompilationJobKind::Host;
    let (base, units) = job.parts_mut();

    for unit in units {
        let elements = create_op_xref_map(unit.create());
        let (create, update) = unit.lists_mut();

        let mut cursor = update.first();
        while let Some(id) = cursor {
            cursor = update.next(id);
            if !matches!(update.get(id)?, UpdateOp::AnimationBinding(_)) {
                continue;
            }
            let UpdateOp::AnimationBinding(binding) = update.remove(id)? else {
                continue;
            };
            let target = binding.target;
            let animation = animation_op(binding, base);
            if is_host {
                create.push(animation);
            } else {
                let element = lookup_element(&elements, target)?;
                create.insert_after(element, animation)?;
            }
        }
    }
    Ok(())
}

fn animation_op(binding: AnimationBindingOp, base: &mut JobBase) -> CreateOp {
    let kind = if binding.name == ANIMATE_ENTER {
        AnimationKind::Enter
    } else {
        AnimationKind::Leave
    };
    match binding.expression {
        BindingExpression::Expression(expression) if !is_string_literal(&expression) => {
            let mut handler_ops = base.new_op_list();
            handler_ops.push(UpdateOp::Statement(StatementOp::new(o::return_stmt(
                expression,
            ))));
            CreateOp::Animation(AnimationOp {
                target: binding.target,
                target_slot: SlotHandle::new(),
                name: binding.name,
                kind,
                handler_ops,
                handler_fn_name: None,
                security_context: Vec::new(),
                sanitizer: None,
            })
        }
        expression => CreateOp::AnimationString(AnimationStringOp {
            target: binding.target,
            name: binding.name,
            kind,
            expression,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::ops::{create_element_start_op, create_element_end_op};
    use crate::template::pipeline::ir::{Namespace, Op, OpKind};
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    #[test]
    fn test_animation_bindings_move_after_their_element() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let element = job.base.allocate_xref_id();
        let root = job.root;
        let view = &mut job.views[&root];
        view.create
            .push(create_element_start_op("div", element, Namespace::HTML, None));
        view.create.push(create_element_end_op(element));
        view.update.push(UpdateOp::AnimationBinding(AnimationBindingOp {
            target: element,
            name: "animate.enter".to_string(),
            expression: o::literal("fade-in").into(),
        }));
        view.update.push(UpdateOp::AnimationBinding(AnimationBindingOp {
            target: element,
            name: "animate.leave".to_string(),
            expression: o::variable("cls").into(),
        }));

        convert_animations(&mut job).unwrap();

        let view = &job.views[&root];
        assert!(view.update.is_empty());
        let kinds: Vec<_> = view.create.iter().map(Op::kind).collect();
        assert_eq!(
            kinds,
            vec![
                OpKind::ElementStart,
                OpKind::Animation,
                OpKind::AnimationString,
                OpKind::ElementEnd,
            ]
        );
        let Some(CreateOp::Animation(animation)) = view.create.iter().nth(1) else {
            panic!("expected an animation op");
        };
        assert_eq!(animation.kind, AnimationKind::Leave);
        assert_eq!(animation.handler_ops.len(), 1);
    }
}
