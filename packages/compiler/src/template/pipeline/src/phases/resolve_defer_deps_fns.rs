//! A defer block with its own dependency function gets that function declared in the constant
//! pool, named after the view and the block's slot. The block then refers to it by name.

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::{CreateOp, XrefId};
use crate::template::pipeline::src::compilation::{CompilationUnit, ComponentCompilationJob};

pub fn resolve_defer_deps_fns(job: &mut ComponentCompilationJob) -> Result<()> {
    let ComponentCompilationJob { base, views, .. } = job;
    for unit in views.values_mut() {
        let path = deps_fn_path(unit.xref, unit.fn_name())?;
        for op in unit.create.iter_mut() {
            let CreateOp::Defer(defer) = op else {
                continue;
            };
            if defer.resolver_fn.is_some() {
                continue;
            }
            let Some(own) = defer.own_resolver_fn.clone() else {
                continue;
            };
            let slot = defer.handle.slot().ok_or_else(|| {
                PipelineError::assertion(
                    "a defer block's slot must be assigned before its dependency function is named",
                )
            })?;
            let name = format!("{path}_Defer_{slot}_DepsFn");
            defer.resolver_fn = Some(base.pool.get_shared_function_reference(own, &name, false));
        }
    }
    Ok(())
}

fn deps_fn_path(view: XrefId, fn_name: Option<&str>) -> Result<String> {
    fn_name
        .map(|name| name.replace("_Template", ""))
        .ok_or_else(|| {
            PipelineError::assertion(format!(
                "view {view:?} must be named before its defer dependency functions"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast::{self as o, Statement};
    use crate::template::pipeline::ir::ops::create_defer_op;
    use crate::template::pipeline::ir::SlotHandle;

    fn job_with_defer(own: Option<o::Expression>, slot: Option<usize>) -> ComponentCompilationJob {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let defer = job.base.allocate_xref_id();
        let main = job.allocate_view(root).unwrap();
        let op = create_defer_op(defer, main, SlotHandle::new(), own);
        if let Some(slot) = slot {
            op.handle.assign(slot).unwrap();
        }
        let unit = &mut job.views[&root];
        unit.set_fn_name("Cmp_Template".into());
        unit.create.push(CreateOp::Defer(op));
        job
    }

    fn resolver_of(job: &ComponentCompilationJob) -> Option<o::Expression> {
        match job.views[&job.root].create.iter().next() {
            Some(CreateOp::Defer(defer)) => defer.resolver_fn.clone(),
            _ => panic!("expected a defer op"),
        }
    }

    #[test]
    fn test_own_deps_fn_is_declared_and_referenced() {
        let deps = o::variable("loadDeps");
        let mut job = job_with_defer(Some(deps.clone()), Some(3));

        resolve_defer_deps_fns(&mut job).unwrap();

        let resolver = resolver_of(&job).unwrap();
        assert!(resolver.is_equivalent(&o::variable("Cmp_Defer_3_DepsFn")));
        let declared = job.base.pool.statements.iter().any(|stmt| {
            matches!(stmt, Statement::DeclareVar(decl)
                if decl.name == "Cmp_Defer_3_DepsFn"
                    && decl.value.as_ref().is_some_and(|v| v.is_equivalent(&deps)))
        });
        assert!(declared);
    }

    #[test]
    fn test_block_without_deps_fn_is_untouched() {
        let mut job = job_with_defer(None, Some(0));
        resolve_defer_deps_fns(&mut job).unwrap();
        assert!(resolver_of(&job).is_none());
    }

    #[test]
    fn test_unassigned_slot_is_an_error() {
        let mut job = job_with_defer(Some(o::variable("loadDeps")), None);
        assert!(matches!(
            resolve_defer_deps_fns(&mut job),
            Err(PipelineError::Assertion(_))
        ));
    }
}
