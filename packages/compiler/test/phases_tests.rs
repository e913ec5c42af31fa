/**
 * Phase Tests
 *
 * Individual phases run against hand-built jobs.
 */

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use template_pipeline::constant_pool::ConstantPool;
    use template_pipeline::output::output_ast::{self as o, Expression};
    use template_pipeline::template::pipeline::ir::expression::pipe_binding;
    use template_pipeline::template::pipeline::ir::ops::{
        create_element_end_op, create_element_start_op, create_interpolate_text_op,
        create_property_op, Interpolation, StatementOp,
    };
    use template_pipeline::template::pipeline::ir::{
        BindingKind, CreateOp, Namespace, SlotHandle, UpdateOp, XrefId,
    };
    use template_pipeline::template::pipeline::src::compilation::{
        CompilationUnit, ComponentCompilationJob,
    };
    use template_pipeline::template::pipeline::src::phases::{
        empty_elements::collapse_empty_instructions, pipe_variadic::create_variadic_pipes,
        slot_allocation::allocate_slots, var_counting::count_variables,
    };
    use template_pipeline::PipelineOptions;

    fn job() -> ComponentCompilationJob {
        ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default())
    }

    #[test]
    fn test_slots_are_assigned_by_width() {
        let mut job = job();
        let root = job.root;
        for width in [1, 1, 2, 1] {
            let xref = job.base.allocate_xref_id();
            let mut start = create_element_start_op("div", xref, Namespace::HTML, None);
            if let Some(base) = start.element_base_mut() {
                base.num_slots_used = width;
            }
            let create = &mut job.views[&root].create;
            create.push(start);
            create.push(create_element_end_op(xref));
        }

        allocate_slots(&mut job).unwrap();

        let slots: Vec<_> = job.views[&root]
            .create
            .iter()
            .filter_map(|op| op.element_base())
            .filter_map(|base| base.handle.slot())
            .collect();
        assert_eq!(slots, vec![0, 1, 2, 4]);
        assert_eq!(job.views[&root].decls().unwrap(), 5);
    }

    #[test]
    fn test_pipes_with_five_args_become_variadic() {
        let mut job = job();
        let root = job.root;
        let args = (0..5).map(|i| o::literal(i as f64)).collect();
        let pipe = pipe_binding(XrefId(10), SlotHandle::new(), "fmt", args);
        job.views[&root]
            .update
            .push(UpdateOp::Statement(StatementOp::new(pipe.to_stmt())));

        create_variadic_pipes(&mut job).unwrap();

        let mut found = Vec::new();
        for op in job.views[&root].update.iter_mut() {
            op.visit_expressions(&mut |expr, _| {
                if let Expression::PipeBindingVariadic(pipe) = expr {
                    found.push((pipe.name.clone(), pipe.num_args));
                }
            });
        }
        assert_eq!(found, vec![("fmt".to_string(), 5)]);
    }

    #[test]
    fn test_variables_are_counted_after_top_level_ops() {
        let mut job = job();
        let root = job.root;
        let div = job.base.allocate_xref_id();
        let text = job.base.allocate_xref_id();
        let pipe = pipe_binding(XrefId(20), SlotHandle::new(), "upper", vec![o::variable("name")]);
        let update = &mut job.views[&root].update;
        update.push(UpdateOp::Property(create_property_op(
            div,
            "title",
            pipe,
            BindingKind::Property,
            vec![],
        )));
        update.push(create_interpolate_text_op(
            text,
            Interpolation::new(
                vec!["".into(), " and ".into(), "".into()],
                vec![o::variable("a"), o::variable("b")],
                vec![],
            )
            .unwrap(),
        ));

        count_variables(&mut job).unwrap();

        // One for the property, two for the interpolation, then the pipe's own two.
        assert_eq!(job.views[&root].vars().unwrap(), 5);
        let mut offsets = Vec::new();
        for op in job.views[&root].update.iter_mut() {
            op.visit_expressions(&mut |expr, _| {
                if let Expression::PipeBinding(pipe) = expr {
                    offsets.push(pipe.var_offset);
                }
            });
        }
        assert_eq!(offsets, vec![Some(3)]);
    }

    #[test]
    fn test_expression_offsets_accumulate() {
        let mut job = job();
        let root = job.root;
        let narrow = pipe_binding(XrefId(30), SlotHandle::new(), "a", vec![]);
        let wide = pipe_binding(
            XrefId(31),
            SlotHandle::new(),
            "b",
            vec![o::variable("x"), o::variable("y")],
        );
        for pipe in [narrow, wide] {
            job.views[&root]
                .update
                .push(UpdateOp::Statement(StatementOp::new(pipe.to_stmt())));
        }

        count_variables(&mut job).unwrap();

        let mut offsets = Vec::new();
        for op in job.views[&root].update.iter_mut() {
            op.visit_expressions(&mut |expr, _| {
                if let Expression::PipeBinding(pipe) = expr {
                    offsets.push((pipe.name.clone(), pipe.var_offset));
                }
            });
        }
        assert_eq!(
            offsets,
            vec![("a".to_string(), Some(0)), ("b".to_string(), Some(1))]
        );
        assert_eq!(job.views[&root].vars().unwrap(), 4);
    }

    #[test]
    fn test_empty_element_pairs_collapse() {
        let mut job = job();
        let root = job.root;
        let outer = job.base.allocate_xref_id();
        let inner = job.base.allocate_xref_id();
        let create = &mut job.views[&root].create;
        create.push(create_element_start_op("div", outer, Namespace::HTML, None));
        create.push(create_element_start_op("span", inner, Namespace::HTML, None));
        create.push(create_element_end_op(inner));
        create.push(create_element_end_op(outer));

        collapse_empty_instructions(&mut job).unwrap();

        let shapes: Vec<_> = job.views[&root]
            .create
            .iter()
            .map(|op| match op {
                CreateOp::ElementStart(_) => "start",
                CreateOp::Element(_) => "element",
                CreateOp::ElementEnd(_) => "end",
                _ => "other",
            })
            .collect();
        assert_eq!(shapes, vec!["start", "element", "end"]);
    }
}
