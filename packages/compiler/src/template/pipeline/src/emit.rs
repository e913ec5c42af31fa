//! Emit Module
//!
//! The ordered phase table, and the drivers that run it over one job or a batch of jobs.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;
use crate::template::pipeline::src::compilation::{
    CompilationJob, CompilationJobKind, ComponentCompilationJob, HostBindingCompilationJob,
};
use crate::template::pipeline::src::phases::{
    any_cast::delete_any_casts,
    apply_i18n_expressions::apply_i18n_expressions,
    assign_i18n_slot_dependencies::assign_i18n_slot_dependencies,
    attribute_extraction::extract_attributes, binding_specialization::specialize_bindings,
    chaining::chain, collapse_singleton_interpolations::collapse_singleton_interpolations,
    conditionals::generate_conditional_expressions, const_collection::collect_element_consts,
    convert_animations::convert_animations, convert_i18n_bindings::convert_i18n_bindings,
    create_i18n_contexts::create_i18n_contexts,
    deduplicate_text_bindings::deduplicate_text_bindings,
    defer_configs::configure_defer_instructions,
    defer_resolve_targets::resolve_defer_target_names,
    empty_elements::collapse_empty_instructions, expand_safe_reads::expand_safe_reads,
    extract_i18n_messages::extract_i18n_messages, generate_advance::generate_advance,
    generate_local_let_references::generate_local_let_references,
    generate_projection_def::generate_projection_defs, generate_variables::generate_variables,
    has_const_expression_collection::collect_const_expressions,
    host_style_property_parsing::parse_host_style_properties,
    i18n_const_collection::collect_i18n_consts, i18n_text_extraction::convert_i18n_text,
    local_refs::lift_local_refs, namespace::emit_namespace_changes,
    naming::name_functions_and_variables,
    next_context_merging::merge_next_context_expressions, ng_container::generate_ng_container_ops,
    nonbindable::disable_bindings, ordering::order_ops,
    parse_extracted_styles::parse_extracted_styles, pipe_creation::create_pipes,
    pipe_variadic::create_variadic_pipes, propagate_i18n_blocks::propagate_i18n_blocks,
    pure_function_extraction::extract_pure_functions,
    pure_literal_structures::generate_pure_literal_structures, reify::reify,
    remove_content_selectors::remove_content_selectors,
    remove_empty_bindings::remove_empty_bindings, remove_i18n_contexts::remove_i18n_contexts,
    remove_illegal_let_references::remove_illegal_let_references,
    remove_unused_i18n_attrs::remove_unused_i18n_attributes_ops,
    resolve_contexts::resolve_contexts, resolve_defer_deps_fns::resolve_defer_deps_fns,
    resolve_dollar_event::resolve_dollar_event,
    resolve_i18n_element_placeholders::resolve_i18n_element_placeholders,
    resolve_i18n_expression_placeholders::resolve_i18n_expression_placeholders,
    resolve_names::resolve_names, resolve_sanitizers::resolve_sanitizers,
    save_restore_view::save_and_restore_view, slot_allocation::allocate_slots,
    store_let_optimization::optimize_store_let,
    strip_nonrequired_parentheses::strip_nonrequired_parentheses,
    style_binding_specialization::specialize_style_bindings,
    temporary_variables::generate_temporary_variables, track_fn_optimization::optimize_track_fns,
    track_variables::generate_track_variables,
    transform_two_way_binding_set::transform_two_way_binding_set, var_counting::count_variables,
    variable_optimization::optimize_variables, wrap_icus::wrap_i18n_icus,
};

/// A phase body, typed by the job it accepts.
#[derive(Clone, Copy)]
enum PhaseFn {
    Component(fn(&mut ComponentCompilationJob) -> Result<()>),
    Host(fn(&mut HostBindingCompilationJob) -> Result<()>),
    Any(fn(&mut dyn CompilationJob) -> Result<()>),
}

#[derive(Clone, Copy)]
struct Phase {
    kind: CompilationJobKind,
    name: &'static str,
    run: PhaseFn,
}

impl Phase {
    const fn tmpl(name: &'static str, run: fn(&mut ComponentCompilationJob) -> Result<()>) -> Self {
        Phase {
            kind: CompilationJobKind::Tmpl,
            name,
            run: PhaseFn::Component(run),
        }
    }

    /// A template-only phase written against the shared job interface.
    const fn tmpl_any(name: &'static str, run: fn(&mut dyn CompilationJob) -> Result<()>) -> Self {
        Phase {
            kind: CompilationJobKind::Tmpl,
            name,
            run: PhaseFn::Any(run),
        }
    }

    const fn host(name: &'static str, run: fn(&mut HostBindingCompilationJob) -> Result<()>) -> Self {
        Phase {
            kind: CompilationJobKind::Host,
            name,
            run: PhaseFn::Host(run),
        }
    }

    const fn both(name: &'static str, run: fn(&mut dyn CompilationJob) -> Result<()>) -> Self {
        Phase {
            kind: CompilationJobKind::Both,
            name,
            run: PhaseFn::Any(run),
        }
    }
}

/// Every phase, in the order it runs. Each phase relies on what the ones before it established.
static PHASES: &[Phase] = &[
    Phase::tmpl("remove_content_selectors", remove_content_selectors),
    Phase::host("parse_host_style_properties", parse_host_style_properties),
    Phase::tmpl("emit_namespace_changes", emit_namespace_changes),
    Phase::tmpl("propagate_i18n_blocks", propagate_i18n_blocks),
    Phase::tmpl("wrap_i18n_icus", wrap_i18n_icus),
    Phase::both("deduplicate_text_bindings", deduplicate_text_bindings),
    Phase::both("specialize_style_bindings", specialize_style_bindings),
    Phase::both("specialize_bindings", specialize_bindings),
    Phase::both("convert_animations", convert_animations),
    Phase::both("extract_attributes", extract_attributes),
    Phase::tmpl("create_i18n_contexts", create_i18n_contexts),
    Phase::both("parse_extracted_styles", parse_extracted_styles),
    Phase::tmpl("remove_empty_bindings", remove_empty_bindings),
    Phase::both("collapse_singleton_interpolations", collapse_singleton_interpolations),
    Phase::both("order_ops", order_ops),
    Phase::tmpl("generate_conditional_expressions", generate_conditional_expressions),
    Phase::tmpl("create_pipes", create_pipes),
    Phase::tmpl("configure_defer_instructions", configure_defer_instructions),
    Phase::tmpl("create_variadic_pipes", create_variadic_pipes),
    Phase::both("generate_pure_literal_structures", generate_pure_literal_structures),
    Phase::tmpl("generate_projection_defs", generate_projection_defs),
    Phase::tmpl("generate_local_let_references", generate_local_let_references),
    Phase::tmpl("generate_variables", generate_variables),
    Phase::tmpl("save_and_restore_view", save_and_restore_view),
    Phase::both("delete_any_casts", delete_any_casts),
    Phase::both("resolve_dollar_event", resolve_dollar_event),
    Phase::tmpl("generate_track_variables", generate_track_variables),
    Phase::tmpl("remove_illegal_let_references", remove_illegal_let_references),
    Phase::both("resolve_names", resolve_names),
    Phase::tmpl("resolve_defer_target_names", resolve_defer_target_names),
    Phase::tmpl_any("transform_two_way_binding_set", transform_two_way_binding_set),
    Phase::tmpl("optimize_track_fns", optimize_track_fns),
    Phase::both("resolve_contexts", resolve_contexts),
    Phase::both("resolve_sanitizers", resolve_sanitizers),
    Phase::tmpl("lift_local_refs", lift_local_refs),
    Phase::both("expand_safe_reads", expand_safe_reads),
    Phase::both("strip_nonrequired_parentheses", strip_nonrequired_parentheses),
    Phase::both("generate_temporary_variables", generate_temporary_variables),
    Phase::both("optimize_variables", optimize_variables),
    Phase::both("optimize_store_let", optimize_store_let),
    Phase::tmpl("convert_i18n_text", convert_i18n_text),
    Phase::tmpl("convert_i18n_bindings", convert_i18n_bindings),
    Phase::tmpl("remove_unused_i18n_attributes_ops", remove_unused_i18n_attributes_ops),
    Phase::tmpl("assign_i18n_slot_dependencies", assign_i18n_slot_dependencies),
    Phase::tmpl("apply_i18n_expressions", apply_i18n_expressions),
    Phase::tmpl("allocate_slots", allocate_slots),
    Phase::tmpl("resolve_i18n_element_placeholders", resolve_i18n_element_placeholders),
    Phase::tmpl("resolve_i18n_expression_placeholders", resolve_i18n_expression_placeholders),
    Phase::tmpl("extract_i18n_messages", extract_i18n_messages),
    Phase::tmpl("collect_i18n_consts", collect_i18n_consts),
    Phase::tmpl("collect_const_expressions", collect_const_expressions),
    Phase::both("collect_element_consts", collect_element_consts),
    Phase::tmpl("remove_i18n_contexts", remove_i18n_contexts),
    Phase::both("count_variables", count_variables),
    Phase::tmpl("generate_advance", generate_advance),
    Phase::both("name_functions_and_variables", name_functions_and_variables),
    Phase::tmpl("resolve_defer_deps_fns", resolve_defer_deps_fns),
    Phase::tmpl_any("merge_next_context_expressions", merge_next_context_expressions),
    Phase::tmpl("generate_ng_container_ops", generate_ng_container_ops),
    Phase::tmpl_any("collapse_empty_instructions", collapse_empty_instructions),
    Phase::tmpl_any("disable_bindings", disable_bindings),
    Phase::both("extract_pure_functions", extract_pure_functions),
    Phase::both("reify", reify),
    Phase::both("chain", chain),
];

/// A job of either kind, as accepted by the batch driver.
#[derive(Debug)]
pub enum AnyJob {
    Component(ComponentCompilationJob),
    Host(HostBindingCompilationJob),
}

impl AnyJob {
    pub fn kind(&self) -> CompilationJobKind {
        match self {
            AnyJob::Component(_) => CompilationJobKind::Tmpl,
            AnyJob::Host(_) => CompilationJobKind::Host,
        }
    }

    fn name(&self) -> &str {
        match self {
            AnyJob::Component(job) => &job.base.component_name,
            AnyJob::Host(job) => &job.base.component_name,
        }
    }

    /// Run every phase that applies to this job, stopping at the first failure.
    pub fn transform(&mut self) -> Result<()> {
        self.run_phases(|_| false)
    }

    /// Run the phases up to and including `last`. Phases after it are left for a later call.
    pub fn transform_until(&mut self, last: &str) -> Result<()> {
        let mut past_last = false;
        self.run_phases(|phase| {
            let skip = past_last;
            past_last |= phase.name == last;
            skip
        })
    }

    fn run_phases(&mut self, mut stop: impl FnMut(&Phase) -> bool) -> Result<()> {
        let kind = self.kind();
        for phase in PHASES.iter().filter(|phase| phase.kind.applies_to(kind)) {
            if stop(phase) {
                break;
            }
            debug!(phase = phase.name, job = self.name(), kind = ?kind, "running phase");
            if let Err(err) = self.run_phase(phase) {
                warn!(phase = phase.name, job = self.name(), error = %err, "phase failed");
                return Err(err);
            }
        }
        Ok(())
    }

    fn run_phase(&mut self, phase: &Phase) -> Result<()> {
        match (phase.run, self) {
            (PhaseFn::Component(run), AnyJob::Component(job)) => run(job),
            (PhaseFn::Host(run), AnyJob::Host(job)) => run(job),
            (PhaseFn::Any(run), AnyJob::Component(job)) => run(job),
            (PhaseFn::Any(run), AnyJob::Host(job)) => run(job),
            _ => Ok(()),
        }
    }
}

impl From<ComponentCompilationJob> for AnyJob {
    fn from(job: ComponentCompilationJob) -> Self {
        AnyJob::Component(job)
    }
}

impl From<HostBindingCompilationJob> for AnyJob {
    fn from(job: HostBindingCompilationJob) -> Self {
        AnyJob::Host(job)
    }
}

/// Compile independent jobs in parallel. Results are in the same order as `jobs`; a failing job
/// does not affect the others.
pub fn compile_jobs(jobs: &mut [AnyJob]) -> Vec<Result<()>> {
    jobs.par_iter_mut().map(AnyJob::transform).collect()
}
