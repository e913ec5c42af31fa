//! Names every view function, listener handler and variable, then pushes the variable names into
//! the `ReadVariable` expressions that refer to them.

use std::collections::HashMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constant_pool::ConstantPool;
use crate::error::{PipelineError, Result};
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::variable::SemanticVariable;
use crate::template::pipeline::ir::{
    BindingKind, CreateOp, OpList, UpdateOp, VisitorContextFlag, XrefId,
};
use crate::template::pipeline::src::compilation::{
    CompilationJob, CompilationUnit, ComponentCompilationJob, ViewCompilationUnit,
};
use crate::template::pipeline::src::phases::parse_extracted_styles::hyphenate;

static INVALID_IDENTIFIER_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_$]").expect("valid identifier regex"));

pub fn name_functions_and_variables(job: &mut dyn CompilationJob) -> Result<()> {
    let compat = job.base().is_compat();
    let fn_suffix = job.fn_suffix();
    let root = job.root_xref();

    if let Some(component) = job.as_component_mut() {
        let ComponentCompilationJob { base, views, .. } = component;
        let base_name = base.component_name.clone();
        let mut namer = Namer {
            pool: &mut base.pool,
            fn_suffix,
            compat,
            index: 0,
        };
        return namer.name_view(views, root, &base_name);
    }
    if let Some(host) = job.as_host_mut() {
        let base_name = host.base.component_name.clone();
        let mut namer = Namer {
            pool: &mut host.base.pool,
            fn_suffix,
            compat,
            index: 0,
        };
        let unit = &mut host.root;
        let fn_name = namer.ensure_fn_name(unit, &base_name);
        let mut var_names = HashMap::new();
        for op in unit.create.iter_mut() {
            namer.name_create_op(op, &fn_name, &base_name, &mut var_names)?;
            if !child_views(op, &base_name)?.is_empty() {
                return Err(PipelineError::assertion("host bindings cannot declare embedded views"));
            }
        }
        for op in unit.update.iter_mut() {
            namer.name_update_op(op, &mut var_names)?;
        }
        propagate_variable_names(&mut unit.create, &mut unit.update, &var_names)?;
    }
    Ok(())
}

/// Naming state shared by every unit of a job. The variable counter runs across views.
struct Namer<'a> {
    pool: &'a mut ConstantPool,
    fn_suffix: &'static str,
    compat: bool,
    index: usize,
}

impl Namer<'_> {
    fn ensure_fn_name(&mut self, unit: &mut dyn CompilationUnit, base_name: &str) -> String {
        if let Some(name) = unit.fn_name() {
            return name.to_string();
        }
        // Several components with the same name may share a pool.
        let candidate = sanitize_identifier(&format!("{base_name}_{}", self.fn_suffix));
        let name = self.pool.unique_name(&candidate, false);
        unit.set_fn_name(name.clone());
        name
    }

    /// Names one view, descending into embedded views in op order.
    fn name_view(
        &mut self,
        views: &mut IndexMap<XrefId, ViewCompilationUnit>,
        xref: XrefId,
        base_name: &str,
    ) -> Result<()> {
        let unit = views.get_mut(&xref).ok_or(PipelineError::MissingView(xref))?;
        let fn_name = self.ensure_fn_name(unit, base_name);
        let mut var_names = HashMap::new();

        for id in unit.create.ids() {
            let unit = views.get_mut(&xref).ok_or(PipelineError::MissingView(xref))?;
            let op = unit.create.get_mut(id)?;
            self.name_create_op(op, &fn_name, base_name, &mut var_names)?;
            for (child, child_name) in child_views(op, base_name)? {
                self.name_view(views, child, &child_name)?;
            }
        }

        let unit = views.get_mut(&xref).ok_or(PipelineError::MissingView(xref))?;
        for op in unit.update.iter_mut() {
            self.name_update_op(op, &mut var_names)?;
        }
        propagate_variable_names(&mut unit.create, &mut unit.update, &var_names)
    }

    fn name_create_op(
        &mut self,
        op: &mut CreateOp,
        fn_name: &str,
        base_name: &str,
        var_names: &mut HashMap<XrefId, String>,
    ) -> Result<()> {
        match op {
            CreateOp::Listener(listener) if listener.handler_fn_name.is_none() => {
                // Animation listeners drop the dots of `animate.enter`.
                let event = if listener.animation_kind.is_some() {
                    listener.name.replace('.', "")
                } else {
                    listener.name.clone()
                };
                let name = if listener.host_listener {
                    format!("{base_name}_{event}_HostBindingHandler")
                } else {
                    let slot = listener.target_slot.slot().ok_or_else(|| {
                        PipelineError::assertion("expected a slot to be assigned")
                    })?;
                    let tag = listener.tag.as_deref().unwrap_or_default().replace('-', "_");
                    format!("{fn_name}_{tag}_{event}_{slot}_listener")
                };
                listener.handler_fn_name = Some(sanitize_identifier(&name));
            }
            CreateOp::TwoWayListener(listener) if listener.handler_fn_name.is_none() => {
                let slot = listener
                    .target_slot
                    .slot()
                    .ok_or_else(|| PipelineError::assertion("expected a slot to be assigned"))?;
                let tag = listener.tag.as_deref().unwrap_or_default().replace('-', "_");
                listener.handler_fn_name = Some(sanitize_identifier(&format!(
                    "{fn_name}_{tag}_{}_{slot}_listener",
                    listener.name
                )));
            }
            CreateOp::Animation(animation) if animation.handler_fn_name.is_none() => {
                let kind = animation.name.replace('.', "");
                animation.handler_fn_name =
                    Some(sanitize_identifier(&format!("{fn_name}_{kind}_cb")));
            }
            CreateOp::Variable(variable) => {
                let name = self.variable_name(&mut variable.variable);
                var_names.insert(variable.xref, name);
            }
            _ => {}
        }

        // Variables declared inside handler and track function bodies belong to this view.
        let nested = match op {
            CreateOp::RepeaterCreate(repeater) => repeater.track_by_ops.as_mut(),
            other => other.handler_ops_mut(),
        };
        if let Some(nested) = nested {
            for inner in nested.iter_mut() {
                self.name_update_op(inner, var_names)?;
            }
        }
        Ok(())
    }

    fn name_update_op(
        &mut self,
        op: &mut UpdateOp,
        var_names: &mut HashMap<XrefId, String>,
    ) -> Result<()> {
        match op {
            UpdateOp::Property(property) if property.binding_kind == BindingKind::LegacyAnimation => {
                property.name = format!("@{}", property.name);
            }
            UpdateOp::DomProperty(property)
                if property.binding_kind == BindingKind::LegacyAnimation =>
            {
                property.name = format!("@{}", property.name);
            }
            UpdateOp::StyleProp(style) => {
                style.name = normalize_style_prop_name(&style.name);
                if self.compat {
                    style.name = strip_important(&style.name).to_string();
                }
            }
            UpdateOp::ClassProp(class) if self.compat => {
                class.name = strip_important(&class.name).to_string();
            }
            UpdateOp::Variable(variable) => {
                let name = self.variable_name(&mut variable.variable);
                var_names.insert(variable.xref, name);
            }
            _ => {}
        }
        Ok(())
    }

    fn variable_name(&mut self, variable: &mut SemanticVariable) -> String {
        if let Some(name) = variable.name() {
            return name.to_string();
        }
        let name = match variable {
            SemanticVariable::Context(_) => {
                let name = format!("ctx_r{}", self.index);
                self.index += 1;
                name
            }
            SemanticVariable::Identifier(identifier) if self.compat => {
                // `ctx` as an identifier would collide with the context parameter.
                let prefix = if identifier.identifier == "ctx" { "i" } else { "" };
                self.index += 1;
                format!("{}_{prefix}r{}", identifier.identifier, self.index)
            }
            SemanticVariable::Identifier(identifier) => {
                let name = format!("{}_i{}", identifier.identifier, self.index);
                self.index += 1;
                name
            }
            SemanticVariable::SavedView(_) | SemanticVariable::Alias(_) => {
                self.index += 1;
                format!("_r{}", self.index)
            }
        };
        variable.set_name(name.clone());
        name
    }
}

/// Embedded views declared by `op`, with the base name of their functions, in naming order.
fn child_views(op: &CreateOp, base_name: &str) -> Result<Vec<(XrefId, String)>> {
    let slot_of = |slot: Option<usize>| {
        slot.ok_or_else(|| PipelineError::assertion("expected slot to be assigned"))
    };
    let children = match op {
        CreateOp::Template(template)
        | CreateOp::ConditionalCreate(template)
        | CreateOp::ConditionalBranchCreate(template) => {
            let slot = slot_of(template.base.handle.slot())?;
            let suffix = if template.fn_name_suffix.is_empty() {
                String::new()
            } else {
                format!("_{}", template.fn_name_suffix)
            };
            vec![(template.base.xref, format!("{base_name}{suffix}_{slot}"))]
        }
        CreateOp::RepeaterCreate(repeater) => {
            // The first slot holds the repeater metadata.
            let slot = slot_of(repeater.base.handle.slot())?;
            let suffix = &repeater.fn_name_suffix;
            let mut children = Vec::new();
            if let Some(empty) = repeater.empty_view {
                children.push((empty, format!("{base_name}_{suffix}Empty_{}", slot + 2)));
            }
            children.push((repeater.base.xref, format!("{base_name}_{suffix}_{}", slot + 1)));
            children
        }
        CreateOp::Projection(projection) => match projection.fallback_view {
            Some(fallback) => {
                let slot = slot_of(projection.handle.slot())?;
                vec![(fallback, format!("{base_name}_ProjectionFallback_{slot}"))]
            }
            None => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(children)
}

fn propagate_variable_names(
    create: &mut OpList<CreateOp>,
    update: &mut OpList<UpdateOp>,
    var_names: &HashMap<XrefId, String>,
) -> Result<()> {
    let mut missing = None;
    let mut assign = |mut expr: Expression, _: VisitorContextFlag| {
        if let Expression::ReadVariable(read) = &mut expr {
            if read.name.is_none() {
                match var_names.get(&read.xref) {
                    Some(name) => read.name = Some(name.clone()),
                    None => missing = missing.or(Some(read.xref)),
                }
            }
        }
        expr
    };
    for op in create.iter_mut() {
        op.transform_expressions(&mut assign, VisitorContextFlag::NONE);
    }
    for op in update.iter_mut() {
        op.transform_expressions(&mut assign, VisitorContextFlag::NONE);
    }
    match missing {
        Some(xref) => Err(PipelineError::assertion(format!(
            "variable {xref:?} not yet named"
        ))),
        None => Ok(()),
    }
}

/// Replaces characters that cannot appear in an identifier and avoids a leading digit.
fn sanitize_identifier(name: &str) -> String {
    let sanitized = INVALID_IDENTIFIER_CHARS.replace_all(name, "_");
    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{sanitized}")
    } else {
        sanitized.into_owned()
    }
}

/// CSS custom properties keep their casing.
fn normalize_style_prop_name(name: &str) -> String {
    if name.starts_with("--") {
        name.to_string()
    } else {
        hyphenate(name)
    }
}

fn strip_important(name: &str) -> &str {
    match name.find("!important") {
        Some(index) => &name[..index],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::expression::read_variable;
    use crate::template::pipeline::ir::ops::{
        create_listener_op, create_template_op, BindingExpression, ClassPropOp, StylePropOp,
        VariableOp,
    };
    use crate::template::pipeline::ir::{
        CompatibilityMode, Namespace, Op, SlotHandle, TemplateKind, VariableFlags,
    };

    fn job(options: &PipelineOptions) -> ComponentCompilationJob {
        ComponentCompilationJob::new("MyCmp", ConstantPool::new(), options)
    }

    fn variable_op(xref: XrefId, variable: SemanticVariable) -> UpdateOp {
        UpdateOp::Variable(VariableOp::new(
            xref,
            variable,
            o::variable("init"),
            VariableFlags::NONE,
        ))
    }

    fn fn_name(job: &ComponentCompilationJob, xref: XrefId) -> Option<String> {
        job.views[&xref].fn_name().map(str::to_string)
    }

    #[test]
    fn test_view_function_names() {
        let mut job = job(&PipelineOptions::default());
        let root = job.root;
        let child = job.allocate_view(root).unwrap();
        let template = create_template_op(
            child,
            TemplateKind::Block,
            None,
            "Conditional",
            Namespace::HTML,
            None,
        );
        if let Some(base) = template.element_base() {
            base.handle.assign(3).unwrap();
        }
        job.views[&root].create.push(template);

        name_functions_and_variables(&mut job).unwrap();

        assert_eq!(fn_name(&job, root).as_deref(), Some("MyCmp_Template"));
        assert_eq!(
            fn_name(&job, child).as_deref(),
            Some("MyCmp_Conditional_3_Template")
        );
    }

    #[test]
    fn test_listener_handler_name() {
        let mut job = job(&PipelineOptions::default());
        let root = job.root;
        let target = job.base.allocate_xref_id();
        let slot = SlotHandle::new();
        slot.assign(1).unwrap();
        let list = job.base.allocate_list_id();
        job.views[&root].create.push(CreateOp::Listener(create_listener_op(
            target,
            slot,
            "click",
            Some("my-button".into()),
            vec![],
            false,
            list,
        )));

        name_functions_and_variables(&mut job).unwrap();

        let handler = job.views[&root].create.iter().find_map(|op| match op {
            CreateOp::Listener(listener) => listener.handler_fn_name.clone(),
            _ => None,
        });
        assert_eq!(
            handler.as_deref(),
            Some("MyCmp_Template_my_button_click_1_listener")
        );
    }

    #[test]
    fn test_variable_names_reach_reads() {
        let mut job = job(&PipelineOptions::default());
        let root = job.root;
        let ctx = job.base.allocate_xref_id();
        let item = job.base.allocate_xref_id();
        let unit = &mut job.views[&root];
        unit.update
            .push(variable_op(ctx, SemanticVariable::context(root)));
        unit.update
            .push(variable_op(item, SemanticVariable::identifier("item", false)));
        unit.update.push(UpdateOp::ClassProp(ClassPropOp {
            target: XrefId(99),
            name: "active".into(),
            expression: read_variable(item),
        }));

        name_functions_and_variables(&mut job).unwrap();

        let names: Vec<_> = job.views[&root]
            .update
            .iter()
            .filter_map(|op| match op {
                UpdateOp::Variable(v) => v.variable.name().map(str::to_string),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["ctx_r0", "item_i1"]);
        match job.views[&root].update.iter().last() {
            Some(UpdateOp::ClassProp(class)) => match &class.expression {
                Expression::ReadVariable(read) => assert_eq!(read.name.as_deref(), Some("item_i1")),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {:?}", other.map(|op| op.kind())),
        }
    }

    #[test]
    fn test_compat_identifier_names() {
        let options = PipelineOptions {
            compatibility: CompatibilityMode::TemplateDefinitionBuilder,
            ..Default::default()
        };
        let mut job = job(&options);
        let root = job.root;
        let a = job.base.allocate_xref_id();
        let b = job.base.allocate_xref_id();
        let unit = &mut job.views[&root];
        unit.update
            .push(variable_op(a, SemanticVariable::identifier("ctx", false)));
        unit.update.push(variable_op(b, SemanticVariable::saved_view(root)));

        name_functions_and_variables(&mut job).unwrap();

        let names: Vec<_> = job.views[&root]
            .update
            .iter()
            .filter_map(|op| match op {
                UpdateOp::Variable(v) => v.variable.name().map(str::to_string),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["ctx_ir1", "_r2"]);
    }

    #[test]
    fn test_unnamed_read_is_an_error() {
        let mut job = job(&PipelineOptions::default());
        let root = job.root;
        job.views[&root].update.push(UpdateOp::ClassProp(ClassPropOp {
            target: XrefId(99),
            name: "active".into(),
            expression: read_variable(XrefId(42)),
        }));
        assert!(name_functions_and_variables(&mut job).is_err());
    }

    #[test]
    fn test_style_names_are_normalized() {
        let options = PipelineOptions {
            compatibility: CompatibilityMode::TemplateDefinitionBuilder,
            ..Default::default()
        };
        let mut job = job(&options);
        let root = job.root;
        for name in ["backgroundColor!important", "--MyVar"] {
            job.views[&root].update.push(UpdateOp::StyleProp(StylePropOp {
                target: XrefId(99),
                name: name.into(),
                expression: BindingExpression::Expression(o::literal("x")),
                unit: None,
            }));
        }

        name_functions_and_variables(&mut job).unwrap();

        let names: Vec<_> = job.views[&root]
            .update
            .iter()
            .filter_map(|op| match op {
                UpdateOp::StyleProp(style) => Some(style.name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["background-color", "--MyVar"]);
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("my-cmp.x"), "my_cmp_x");
        assert_eq!(sanitize_identifier("1abc"), "_1abc");
    }
}
