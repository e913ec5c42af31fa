/**
 * Compilation Job Tests
 *
 * Job construction, view allocation and the options that configure a job.
 */

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use template_pipeline::constant_pool::ConstantPool;
    use template_pipeline::template::pipeline::ir::{CompatibilityMode, XrefId};
    use template_pipeline::template::pipeline::src::compilation::{
        CompilationJob, CompilationJobKind, CompilationUnit, ComponentCompilationJob,
        HostBindingCompilationJob, TemplateCompilationMode,
    };
    use template_pipeline::{PipelineError, PipelineOptions};

    #[test]
    fn test_new_component_job_has_only_a_root_view() {
        let job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());

        assert_eq!(job.views.len(), 1);
        assert_eq!(job.root_xref(), job.root);
        assert_eq!(job.kind(), CompilationJobKind::Tmpl);
        assert_eq!(job.fn_suffix(), "Template");
        assert!(job.consts.is_empty());
        assert_eq!(job.root_view().unwrap().parent(), None);
    }

    #[test]
    fn test_embedded_views_record_their_parent() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let child = job.allocate_view(root).unwrap();
        let grandchild = job.allocate_view(child).unwrap();

        assert_eq!(job.view(child).unwrap().parent(), Some(root));
        assert_eq!(job.view(grandchild).unwrap().parent(), Some(child));
        // Views are kept in creation order.
        let order: Vec<XrefId> = job.views.keys().copied().collect();
        assert_eq!(order, vec![root, child, grandchild]);
        assert_eq!(job.view(XrefId(42)).unwrap_err(), PipelineError::MissingView(XrefId(42)));
    }

    #[test]
    fn test_every_unit_gets_distinct_lists() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        job.allocate_view(root).unwrap();

        let mut lists = Vec::new();
        for unit in job.units() {
            lists.push(unit.create().id());
            lists.push(unit.update().id());
        }
        let mut deduped = lists.clone();
        deduped.sort_by_key(|id| id.0);
        deduped.dedup();
        assert_eq!(deduped.len(), lists.len());
    }

    #[test]
    fn test_options_flow_into_the_job() {
        let options = PipelineOptions::from_json(
            r#"{"compatibility": "TemplateDefinitionBuilder", "mode": "DomOnly", "enableChaining": false}"#,
        )
        .unwrap();
        let job = ComponentCompilationJob::new("Cmp", ConstantPool::new(), &options);

        assert_eq!(job.base.mode, TemplateCompilationMode::DomOnly);
        assert_eq!(job.base.compatibility, CompatibilityMode::TemplateDefinitionBuilder);
        assert!(job.base.is_compat());
        assert!(!job.base.enable_chaining);
    }

    #[test]
    fn test_host_job_ignores_requested_mode() {
        let job =
            HostBindingCompilationJob::new("Dir", ConstantPool::new(), &PipelineOptions::default());

        assert_eq!(job.base.mode, TemplateCompilationMode::DomOnly);
        assert_eq!(job.fn_suffix(), "HostBindings");
        assert_eq!(job.root_xref(), job.root.xref());
    }

    #[test]
    fn test_phase_registration_kinds() {
        assert!(CompilationJobKind::Both.applies_to(CompilationJobKind::Tmpl));
        assert!(CompilationJobKind::Both.applies_to(CompilationJobKind::Host));
        assert!(CompilationJobKind::Tmpl.applies_to(CompilationJobKind::Tmpl));
        assert!(!CompilationJobKind::Tmpl.applies_to(CompilationJobKind::Host));
        assert!(!CompilationJobKind::Host.applies_to(CompilationJobKind::Tmpl));
    }
}
