/**
 * Host Binding Tests
 *
 * Host binding jobs run through the whole pipeline.
 */

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use template_pipeline::constant_pool::ConstantPool;
    use template_pipeline::output::abstract_emitter::emit_statements;
    use template_pipeline::output::output_ast::{self as o, Expression, Statement};
    use template_pipeline::template::pipeline::ir::ops::create_binding_op;
    use template_pipeline::template::pipeline::ir::{BindingKind, UpdateOp};
    use template_pipeline::template::pipeline::src::compilation::{
        CompilationUnit, HostBindingCompilationJob,
    };
    use template_pipeline::template::pipeline::src::phases::host_style_property_parsing::parse_host_style_properties;
    use template_pipeline::{AnyJob, PipelineOptions};

    fn host_job(bindings: Vec<(&str, Expression)>) -> HostBindingCompilationJob {
        let mut job =
            HostBindingCompilationJob::new("Dir", ConstantPool::new(), &PipelineOptions::default());
        let target = job.root.xref;
        for (name, value) in bindings {
            job.root.update.push(UpdateOp::Binding(create_binding_op(
                target,
                BindingKind::Property,
                name,
                value,
                None,
                vec![],
                false,
            )));
        }
        job
    }

    fn compile(job: HostBindingCompilationJob) -> Result<(HostBindingCompilationJob, Vec<Statement>)> {
        let mut job = AnyJob::from(job);
        job.transform()?;
        let AnyJob::Host(job) = job else {
            panic!("expected a host job");
        };
        let statements = job
            .root
            .update
            .iter()
            .map(|op| match op {
                UpdateOp::Statement(op) => op.statement.clone(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        Ok((job, statements))
    }

    #[test]
    fn test_style_property_name_is_split() {
        let mut job = host_job(vec![
            ("style.color.px!important", o::literal("red")),
            ("style.--brand-color", o::literal("blue")),
            ("class.is-active", o::literal(true)),
        ]);

        parse_host_style_properties(&mut job).unwrap();

        let bindings: Vec<_> = job
            .root
            .update
            .iter()
            .map(|op| match op {
                UpdateOp::Binding(binding) => {
                    (binding.kind, binding.name.clone(), binding.unit.clone())
                }
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            bindings,
            vec![
                (BindingKind::StyleProperty, "color".to_string(), Some("px".to_string())),
                (BindingKind::StyleProperty, "--brand-color".to_string(), None),
                (BindingKind::ClassName, "is-active".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_host_style_binding_compiles_to_style_prop() -> Result<()> {
        let job = host_job(vec![("style.color.px!important", o::literal("red"))]);

        let (job, statements) = compile(job)?;

        assert_eq!(emit_statements(&statements), "i0.ɵɵstyleProp('color', 'red', 'px');");
        assert_eq!(job.root.fn_name(), Some("Dir_HostBindings"));
        assert_eq!(job.root.vars()?, 2);
        Ok(())
    }

    #[test]
    fn test_host_property_uses_dom_property() -> Result<()> {
        let job = host_job(vec![("tabindex", o::literal(0usize))]);

        let (job, statements) = compile(job)?;

        assert_eq!(emit_statements(&statements), "i0.ɵɵdomProperty('tabIndex', 0);");
        assert_eq!(job.root.vars()?, 1);
        Ok(())
    }
}
