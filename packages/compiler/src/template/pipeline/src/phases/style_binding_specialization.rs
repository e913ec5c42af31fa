//! Style Binding Specialization
//!
//! Transforms special-case bindings with 'style' or 'class' in their names. Must run before the
//! main binding specialization pass.

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::ops::{
    BindingExpression, BindingOp, ClassPropOp, MapBindingOp, StylePropOp,
};
use crate::template::pipeline::ir::{BindingKind, UpdateOp};
use crate::template::pipeline::src::compilation::CompilationJob;

enum StyleBinding {
    ClassProp,
    StyleProp,
    StyleMap,
    ClassMap,
}

pub fn specialize_style_bindings(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        let update = unit.update_mut();
        let mut cursor = update.first();
        while let Some(id) = cursor {
            cursor = update.next(id);
            let UpdateOp::Binding(binding) = update.get(id)? else {
                continue;
            };
            let Some(target_kind) = classify(binding)? else {
                continue;
            };
            update.replace_with(id, |op| match op {
                UpdateOp::Binding(binding) => specialize(binding, target_kind),
                other => other,
            })?;
        }
    }
    Ok(())
}

fn classify(binding: &BindingOp) -> Result<Option<StyleBinding>> {
    let kind = match binding.kind {
        BindingKind::ClassName => {
            if binding.expression.as_interpolation().is_some() {
                return Err(PipelineError::assertion(
                    "unexpected interpolation in ClassName binding",
                ));
            }
            StyleBinding::ClassProp
        }
        BindingKind::StyleProperty => StyleBinding::StyleProp,
        BindingKind::Property | BindingKind::Template => match binding.name.as_str() {
            "style" => StyleBinding::StyleMap,
            "class" => StyleBinding::ClassMap,
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(Some(kind))
}

fn specialize(binding: BindingOp, kind: StyleBinding) -> UpdateOp {
    if let StyleBinding::ClassProp = kind {
        return match binding.expression {
            BindingExpression::Expression(expression) => UpdateOp::ClassProp(ClassPropOp {
                target: binding.target,
                name: binding.name,
                expression,
            }),
            // Rejected by `classify`.
            expression => UpdateOp::Binding(BindingOp {
                expression,
                ..binding
            }),
        };
    }

    let BindingOp {
        target,
        name,
        expression,
        unit,
        ..
    } = binding;
    match kind {
        StyleBinding::StyleProp => UpdateOp::StyleProp(StylePropOp {
            target,
            name,
            expression,
            unit,
        }),
        StyleBinding::StyleMap => UpdateOp::StyleMap(MapBindingOp { target, expression }),
        StyleBinding::ClassMap | StyleBinding::ClassProp => {
            UpdateOp::ClassMap(MapBindingOp { target, expression })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::ops::{create_binding_op, Interpolation};
    use crate::template::pipeline::ir::XrefId;
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    #[test]
    fn test_style_and_class_bindings_are_specialized() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let update = &mut job.views[&root].update;
        for (kind, name) in [
            (BindingKind::ClassName, "active"),
            (BindingKind::StyleProperty, "width"),
            (BindingKind::Property, "style"),
            (BindingKind::Property, "class"),
            (BindingKind::Property, "title"),
        ] {
            update.push(UpdateOp::Binding(create_binding_op(
                XrefId(1),
                kind,
                name,
                o::variable("v"),
                None,
                vec![],
                false,
            )));
        }

        specialize_style_bindings(&mut job).unwrap();
        let update = &job.views[&root].update;
        assert!(matches!(update.iter().next(), Some(UpdateOp::ClassProp(_))));
        assert!(matches!(update.iter().nth(1), Some(UpdateOp::StyleProp(_))));
        assert!(matches!(update.iter().nth(2), Some(UpdateOp::StyleMap(_))));
        assert!(matches!(update.iter().nth(3), Some(UpdateOp::ClassMap(_))));
        assert!(matches!(update.iter().nth(4), Some(UpdateOp::Binding(_))));
        assert_eq!(update.len(), 5);
    }

    #[test]
    fn test_interpolated_class_name_is_rejected() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let interpolation = Interpolation::new(
            vec!["a".into(), "".into()],
            vec![o::variable("v")],
            vec![],
        )
        .unwrap();
        job.views[&root].update.push(UpdateOp::Binding(create_binding_op(
            XrefId(1),
            BindingKind::ClassName,
            "active",
            interpolation,
            None,
            vec![],
            false,
        )));
        assert!(specialize_style_bindings(&mut job).is_err());
    }
}
