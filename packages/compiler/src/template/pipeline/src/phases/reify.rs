//! Lowers every remaining IR op into a call to its runtime instruction. After this phase each
//! create and update list holds only `Statement` ops, and no IR-specific expression is left.

use std::collections::HashMap;

use crate::constant_pool::ConstantPool;
use crate::error::{PipelineError, Result};
use crate::output::output_ast::{self as o, ArrowFunctionBody, Expression, FnParam, Statement};
use crate::template::pipeline::ir::expression::RestoreViewTarget;
use crate::template::pipeline::ir::ops::{
    DeferTrigger, DeferTriggerTarget, ElementOpBase, I18nOp, RepeaterCreateOp, StatementOp,
    TemplateOp,
};
use crate::template::pipeline::ir::{
    BindingKind, CreateOp, DeferOpModifierKind, ExpressionHolder, Namespace, Op, OpList,
    SemanticVariable, TemplateKind, UpdateOp, VisitorContextFlag, XrefId,
};
use crate::template::pipeline::src::compilation::{
    CompilationJob, CompilationUnit, TemplateCompilationMode,
};
use crate::template::pipeline::src::instruction::{
    self as ng, DeferArgs, ElementInstruction, ListenerInstruction, ProjectionFallback,
    PropertyInstruction, RepeaterCreateArgs, RepeaterEmpty, TemplateArgs,
};
use crate::template::pipeline::src::util::attributes::is_aria_attribute;

/// Attribute names whose DOM property is spelled differently.
fn remap_dom_property(name: &str) -> &str {
    match name {
        "class" => "className",
        "for" => "htmlFor",
        "formaction" => "formAction",
        "innerHtml" => "innerHTML",
        "readonly" => "readOnly",
        "tabindex" => "tabIndex",
        other => other,
    }
}

/// What the parent needs to know about an embedded view to create it.
#[derive(Debug, Default)]
struct ViewInfo {
    fn_name: Option<String>,
    decls: Option<usize>,
    vars: Option<usize>,
}

struct Reifier<'a> {
    pool: &'a mut ConstantPool,
    views: &'a HashMap<XrefId, ViewInfo>,
    dom_only: bool,
}

pub fn reify(job: &mut dyn CompilationJob) -> Result<()> {
    let views: HashMap<XrefId, ViewInfo> = match job.as_component_mut() {
        Some(component) => component
            .views
            .iter()
            .map(|(xref, view)| {
                let info = ViewInfo {
                    fn_name: view.fn_name().map(str::to_string),
                    decls: view.decls().ok(),
                    vars: view.vars().ok(),
                };
                (*xref, info)
            })
            .collect(),
        None => HashMap::new(),
    };

    let (base, units) = job.parts_mut();
    let mut reifier = Reifier {
        dom_only: base.mode == TemplateCompilationMode::DomOnly,
        pool: &mut base.pool,
        views: &views,
    };
    for unit in units {
        let (create, update) = unit.lists_mut();
        reifier.reify_create_ops(create)?;
        reify_update_ops(update, reifier.dom_only)?;
    }
    Ok(())
}

impl Reifier<'_> {
    fn reify_create_ops(&mut self, ops: &mut OpList<CreateOp>) -> Result<()> {
        for id in ops.ids() {
            let op = ops.get_mut(id)?;
            reify_expressions(op)?;
            if let Some(statement) = self.reify_create_op(op)? {
                ops.replace(id, CreateOp::Statement(StatementOp::new(statement)))?;
            }
        }
        Ok(())
    }

    /// The statement replacing `op`, or `None` when `op` already is one.
    fn reify_create_op(&mut self, op: &mut CreateOp) -> Result<Option<Statement>> {
        let dom_only = self.dom_only;
        let statement = match op {
            CreateOp::Statement(_) => return Ok(None),
            CreateOp::Text(op) => ng::text(op.handle.get()?, &op.initial_value),
            CreateOp::ElementStart(op) => element(ElementInstruction::Start, dom_only, &op.base)?,
            CreateOp::Element(op) => element(ElementInstruction::Single, dom_only, &op.base)?,
            CreateOp::ContainerStart(op) => {
                element(ElementInstruction::ContainerStart, dom_only, &op.base)?
            }
            CreateOp::Container(op) => element(ElementInstruction::Container, dom_only, &op.base)?,
            CreateOp::ElementEnd(_) => ng::element_end(dom_only),
            CreateOp::ContainerEnd(_) => ng::element_container_end(dom_only),
            CreateOp::I18nStart(op) => {
                ng::i18n_start(op.handle.get()?, message_index(op)?, op.sub_template_index)
            }
            CreateOp::I18n(op) => {
                ng::i18n(op.handle.get()?, message_index(op)?, op.sub_template_index)
            }
            CreateOp::I18nEnd(_) => ng::i18n_end(),
            CreateOp::Template(op) => {
                let block_or_dom = op.template_kind == TemplateKind::Block || dom_only;
                ng::template(self.template_args(op)?, block_or_dom)
            }
            CreateOp::ConditionalCreate(op) => ng::conditional_create(self.template_args(op)?),
            CreateOp::ConditionalBranchCreate(op) => {
                ng::conditional_branch_create(self.template_args(op)?)
            }
            CreateOp::DisableBindings(_) => ng::disable_bindings(),
            CreateOp::EnableBindings(_) => ng::enable_bindings(),
            CreateOp::Pipe(op) => ng::pipe(op.handle.get()?, &op.name),
            CreateOp::DeclareLet(op) => ng::declare_let(op.handle.get()?),
            CreateOp::AnimationString(op) => {
                ng::animation_string(op.kind, op.expression.clone(), None)?
            }
            CreateOp::Animation(op) => {
                let name = handler_name(&op.handler_fn_name)?;
                let handler = reify_listener_handler(name, &mut op.handler_ops, false, dom_only)?;
                ng::animation(op.kind, handler, op.sanitizer.clone())
            }
            CreateOp::Listener(op) => {
                let name = handler_name(&op.handler_fn_name)?;
                let handler = reify_listener_handler(
                    name,
                    &mut op.handler_ops,
                    op.consumes_dollar_event,
                    dom_only,
                )?;
                let resolver = match &op.event_target {
                    Some(target) => Some(ng::global_target_resolver(target).ok_or_else(|| {
                        PipelineError::assertion(format!(
                            "unexpected global target '{target}' defined for '{}' event",
                            op.name
                        ))
                    })?),
                    None => None,
                };
                match op.animation_kind {
                    Some(kind) => ng::animation_listener(kind, handler, resolver),
                    None if dom_only && !op.host_listener => {
                        ng::listener(ListenerInstruction::DomListener, &op.name, handler, resolver)
                    }
                    None => ng::listener(ListenerInstruction::Listener, &op.name, handler, resolver),
                }
            }
            CreateOp::TwoWayListener(op) => {
                let name = handler_name(&op.handler_fn_name)?;
                let handler = reify_listener_handler(name, &mut op.handler_ops, true, dom_only)?;
                ng::two_way_listener(&op.name, handler)
            }
            CreateOp::Variable(op) => declare_variable(&op.variable, (*op.initializer).clone())?,
            CreateOp::Namespace(op) => match op.active {
                Namespace::HTML => ng::namespace_html(),
                Namespace::SVG => ng::namespace_svg(),
                Namespace::Math => ng::namespace_math(),
            },
            CreateOp::Defer(op) => ng::defer(DeferArgs {
                self_slot: op.handle.get()?,
                primary_slot: op.main_slot.get()?,
                resolver_fn: op.resolver_fn.clone(),
                loading_slot: op.loading_slot.as_ref().and_then(|slot| slot.slot()),
                placeholder_slot: op.placeholder_slot.as_ref().and_then(|slot| slot.slot()),
                error_slot: op.error_slot.as_ref().and_then(|slot| slot.slot()),
                loading_config: op.loading_config.clone(),
                placeholder_config: op.placeholder_config.clone(),
                enable_timer_scheduling: op.loading_minimum_time.is_some()
                    || op.loading_after_time.is_some()
                    || op.placeholder_minimum_time.is_some(),
                flags: (!op.flags.is_empty()).then(|| op.flags.bits()),
            }),
            CreateOp::DeferOn(op) => {
                let args = defer_trigger_args(&op.trigger, op.modifier);
                ng::defer_on(op.trigger.kind(), args, op.modifier)
            }
            CreateOp::ProjectionDef(op) => ng::projection_def(op.def.clone()),
            CreateOp::Projection(op) => {
                let fallback = match op.fallback_view {
                    Some(view) => {
                        let (fn_name, decls, vars) = self.view(view)?;
                        Some(ProjectionFallback {
                            fn_name,
                            decls,
                            vars,
                        })
                    }
                    None => None,
                };
                ng::projection(
                    op.handle.get()?,
                    op.projection_slot_index,
                    op.attributes.clone(),
                    fallback,
                )
            }
            CreateOp::RepeaterCreate(op) => self.repeater_create(op)?,
            CreateOp::ControlCreate(_) => ng::control_create(),
            CreateOp::I18nAttributes(op) => {
                let config = op.i18n_attributes_config.ok_or_else(|| {
                    PipelineError::assertion("i18n attributes config was not set")
                })?;
                ng::i18n_attributes(op.handle.get()?, config.as_usize())
            }
            other @ (CreateOp::ExtractedAttribute(_)
            | CreateOp::I18nMessage(_)
            | CreateOp::IcuStart(_)
            | CreateOp::IcuEnd(_)
            | CreateOp::I18nContext(_)) => {
                return Err(PipelineError::assertion(format!(
                    "unsupported reification of create op {:?}",
                    other.kind()
                )))
            }
        };
        Ok(Some(statement))
    }

    fn view(&self, xref: XrefId) -> Result<(&str, usize, usize)> {
        let info = self.views.get(&xref).ok_or(PipelineError::MissingView(xref))?;
        match (&info.fn_name, info.decls, info.vars) {
            (Some(fn_name), Some(decls), Some(vars)) => Ok((fn_name, decls, vars)),
            _ => Err(PipelineError::assertion(format!(
                "expected view {xref:?} to have been named and counted"
            ))),
        }
    }

    fn view_fn_name(&self, xref: XrefId) -> Result<&str> {
        self.views
            .get(&xref)
            .and_then(|info| info.fn_name.as_deref())
            .ok_or_else(|| PipelineError::assertion(format!("view {xref:?} was not named")))
    }

    fn template_args<'a>(&'a self, op: &'a TemplateOp) -> Result<TemplateArgs<'a>> {
        Ok(TemplateArgs {
            slot: op.base.handle.get()?,
            fn_name: self.view_fn_name(op.base.xref)?,
            decls: op.decls.ok_or(PipelineError::Unset { what: "template decls" })?,
            vars: op.vars.ok_or(PipelineError::Unset { what: "template vars" })?,
            tag: op.base.tag.as_deref(),
            const_index: op.base.attributes.as_ref().map(|index| index.0),
            local_refs: op.base.local_refs_index.as_ref().map(|index| index.0),
        })
    }

    fn repeater_create(&mut self, op: &mut RepeaterCreateOp) -> Result<Statement> {
        let track_by_fn = self.reify_track_by(op)?;
        let empty = match op.empty_view {
            Some(view) => {
                let (fn_name, decls, vars) = self.view(view)?;
                Some(RepeaterEmpty {
                    fn_name,
                    decls,
                    vars,
                    tag: op.empty_tag.as_deref(),
                    const_index: op.empty_attributes.as_ref().map(|index| index.0),
                })
            }
            None => None,
        };
        Ok(ng::repeater_create(RepeaterCreateArgs {
            slot: op.base.handle.get()?,
            fn_name: self.view_fn_name(op.base.xref)?,
            decls: op.decls.ok_or(PipelineError::Unset { what: "repeater decls" })?,
            vars: op.vars.ok_or(PipelineError::Unset { what: "repeater vars" })?,
            tag: op.base.tag.as_deref(),
            const_index: op.base.attributes.as_ref().map(|index| index.0),
            track_by_fn,
            track_by_uses_component_instance: op.uses_component_instance,
            empty,
        }))
    }

    /// Turns the tracking expression of a `@for` into a module-level function shared across
    /// equivalent repeaters.
    fn reify_track_by(&mut self, op: &mut RepeaterCreateOp) -> Result<Expression> {
        if let Some(track_by_fn) = &op.track_by_fn {
            return Ok(track_by_fn.clone());
        }

        let params = vec![
            FnParam {
                name: "$index".into(),
            },
            FnParam {
                name: "$item".into(),
            },
        ];
        let function = match op.track_by_ops.as_mut() {
            None if op.uses_component_instance => {
                o::fn_expr(params, vec![o::return_stmt(op.track.clone())], None)
            }
            None => o::arrow_fn(params, ArrowFunctionBody::Expression(Box::new(op.track.clone()))),
            Some(track_by_ops) => {
                reify_update_ops(track_by_ops, self.dom_only)?;
                let mut statements = collect_statements(track_by_ops)?;
                if !op.uses_component_instance && statements.len() == 1 {
                    match statements.remove(0) {
                        Statement::Return(ret) => {
                            o::arrow_fn(params, ArrowFunctionBody::Expression(ret.value))
                        }
                        other => o::fn_expr(params, vec![other], None),
                    }
                } else {
                    o::fn_expr(params, statements, None)
                }
            }
        };

        let reference = self.pool.get_shared_function_reference(function, "_forTrack", true);
        op.track_by_fn = Some(reference.clone());
        Ok(reference)
    }
}

fn element(which: ElementInstruction, dom_only: bool, base: &ElementOpBase) -> Result<Statement> {
    Ok(ng::element_like(
        which,
        dom_only,
        base.handle.get()?,
        base.tag.as_deref(),
        base.attributes.as_ref().map(|index| index.0),
        base.local_refs_index.as_ref().map(|index| index.0),
    ))
}

fn message_index(op: &I18nOp) -> Result<usize> {
    op.message_index
        .as_ref()
        .map(|index| index.0)
        .ok_or_else(|| PipelineError::assertion("i18n message index was not set before reification"))
}

fn handler_name(name: &Option<String>) -> Result<&str> {
    name.as_deref()
        .ok_or(PipelineError::Unset { what: "handler function name" })
}

fn defer_trigger_args(trigger: &DeferTrigger, modifier: DeferOpModifierKind) -> Vec<Expression> {
    // `hydrate` triggers never have a target.
    let hydrate = modifier == DeferOpModifierKind::Hydrate;
    match trigger {
        DeferTrigger::Idle | DeferTrigger::Immediate | DeferTrigger::Never => vec![],
        DeferTrigger::Timer { delay } => vec![o::literal(*delay)],
        DeferTrigger::Hover(_) | DeferTrigger::Interaction(_) if hydrate => vec![],
        DeferTrigger::Hover(target) | DeferTrigger::Interaction(target) => {
            let mut args = vec![target_slot_literal(target)];
            args.extend(target_view_steps(target));
            args
        }
        DeferTrigger::Viewport { options, .. } if hydrate => options.iter().cloned().collect(),
        DeferTrigger::Viewport { target, options } => {
            let mut args = vec![target_slot_literal(target)];
            match target_view_steps(target) {
                Some(steps) => args.push(steps),
                None if options.is_some() => args.push(o::null_expr()),
                None => {}
            }
            args.extend(options.iter().cloned());
            args
        }
    }
}

/// Unresolved targets are reported by type checking, so they reify to `null` here.
fn target_slot_literal(target: &DeferTriggerTarget) -> Expression {
    o::literal(target.target_slot.as_ref().and_then(|slot| slot.slot()))
}

fn target_view_steps(target: &DeferTriggerTarget) -> Option<Expression> {
    target
        .target_slot_view_steps
        .filter(|steps| *steps != 0)
        .map(|steps| o::literal(steps as i32))
}

fn reify_update_ops(ops: &mut OpList<UpdateOp>, dom_only: bool) -> Result<()> {
    for id in ops.ids() {
        let op = ops.get_mut(id)?;
        reify_expressions(op)?;
        if let Some(statement) = reify_update_op(op, dom_only)? {
            ops.replace(id, UpdateOp::Statement(StatementOp::new(statement)))?;
        }
    }
    Ok(())
}

fn reify_update_op(op: &UpdateOp, dom_only: bool) -> Result<Option<Statement>> {
    let statement = match op {
        UpdateOp::Statement(_) => return Ok(None),
        UpdateOp::Advance(op) => ng::advance(op.delta),
        UpdateOp::Property(op) => {
            let animation = matches!(
                op.binding_kind,
                BindingKind::LegacyAnimation | BindingKind::Animation
            );
            if dom_only && !animation {
                ng::property(
                    PropertyInstruction::DomProperty,
                    remap_dom_property(&op.name),
                    op.expression.clone(),
                    op.sanitizer.clone(),
                )?
            } else if is_aria_attribute(&op.name) {
                ng::property(
                    PropertyInstruction::AriaProperty,
                    &op.name,
                    op.expression.clone(),
                    None,
                )?
            } else {
                ng::property(
                    PropertyInstruction::Property,
                    &op.name,
                    op.expression.clone(),
                    op.sanitizer.clone(),
                )?
            }
        }
        UpdateOp::DomProperty(op) => {
            if matches!(
                op.binding_kind,
                BindingKind::LegacyAnimation | BindingKind::Animation
            ) {
                ng::property(
                    PropertyInstruction::SyntheticHostProperty,
                    &op.name,
                    op.expression.clone(),
                    op.sanitizer.clone(),
                )?
            } else {
                ng::property(
                    PropertyInstruction::DomProperty,
                    remap_dom_property(&op.name),
                    op.expression.clone(),
                    op.sanitizer.clone(),
                )?
            }
        }
        UpdateOp::Control(op) => ng::control(op.expression.clone(), op.sanitizer.clone())?,
        UpdateOp::TwoWayProperty(op) => {
            ng::two_way_property(&op.name, op.expression.clone(), op.sanitizer.clone())
        }
        UpdateOp::StyleProp(op) => {
            ng::style_prop(&op.name, op.expression.clone(), op.unit.as_deref())?
        }
        UpdateOp::ClassProp(op) => ng::class_prop(&op.name, op.expression.clone()),
        UpdateOp::StyleMap(op) => ng::style_map(op.expression.clone())?,
        UpdateOp::ClassMap(op) => ng::class_map(op.expression.clone())?,
        UpdateOp::I18nExpression(op) => ng::i18n_exp(op.expression.clone()),
        UpdateOp::I18nApply(op) => ng::i18n_apply(op.handle.get()?),
        UpdateOp::InterpolateText(op) => ng::text_interpolate(
            op.interpolation.strings.clone(),
            op.interpolation.expressions.clone(),
        )?,
        UpdateOp::Attribute(op) => ng::attribute(
            &op.name,
            op.expression.clone(),
            op.sanitizer.clone(),
            op.namespace.as_deref(),
        )?,
        UpdateOp::Variable(op) => declare_variable(&op.variable, (*op.initializer).clone())?,
        UpdateOp::Conditional(op) => {
            let processed = op.processed.clone().ok_or_else(|| {
                PipelineError::assertion("conditional test was not set before reification")
            })?;
            ng::conditional(processed, op.context_value.clone())
        }
        UpdateOp::Repeater(op) => ng::repeater(op.collection.clone()),
        UpdateOp::DeferWhen(op) => ng::defer_when(op.modifier, op.expr.clone()),
        UpdateOp::StoreLet(_) => {
            return Err(PipelineError::assertion(
                "unexpected StoreLet op left at reification",
            ))
        }
        other @ (UpdateOp::Binding(_) | UpdateOp::AnimationBinding(_)) => {
            return Err(PipelineError::assertion(format!(
                "unsupported reification of update op {:?}",
                other.kind()
            )))
        }
    };
    Ok(Some(statement))
}

fn declare_variable(variable: &SemanticVariable, initializer: Expression) -> Result<Statement> {
    let name = variable.name().ok_or_else(|| {
        PipelineError::assertion(format!("variable of kind {:?} was not named", variable.kind()))
    })?;
    Ok(o::declare_var(name, Some(initializer), o::StmtModifier::FINAL))
}

fn reify_listener_handler(
    name: &str,
    handler_ops: &mut OpList<UpdateOp>,
    consumes_dollar_event: bool,
    dom_only: bool,
) -> Result<Expression> {
    reify_update_ops(handler_ops, dom_only)?;
    let statements = collect_statements(handler_ops)?;
    let params = if consumes_dollar_event {
        vec![FnParam {
            name: "$event".into(),
        }]
    } else {
        vec![]
    };
    Ok(o::fn_expr(params, statements, Some(name.to_string())))
}

fn collect_statements(ops: &OpList<UpdateOp>) -> Result<Vec<Statement>> {
    ops.iter()
        .map(|op| match op {
            UpdateOp::Statement(op) => Ok(op.statement.clone()),
            other => Err(PipelineError::assertion(format!(
                "expected reified statements, but found op {:?}",
                other.kind()
            ))),
        })
        .collect()
}

fn reify_expressions(op: &mut impl ExpressionHolder) -> Result<()> {
    let mut error = None;
    op.transform_expressions(
        &mut |expr, _| match reify_ir_expression(expr) {
            Ok(expr) => expr,
            Err(err) => {
                error.get_or_insert(err);
                o::null_expr()
            }
        },
        VisitorContextFlag::NONE,
    );
    error.map_or(Ok(()), Err)
}

fn reify_ir_expression(expr: Expression) -> Result<Expression> {
    Ok(match expr {
        Expression::NextContext(next) => ng::next_context(next.steps),
        Expression::Reference(reference) => {
            ng::reference(reference.target_slot.get()? + 1 + reference.offset)
        }
        Expression::RestoreView(restore) => match restore.view {
            RestoreViewTarget::Dynamic(view) => ng::restore_view(*view),
            RestoreViewTarget::Static(view) => {
                return Err(PipelineError::assertion(format!(
                    "unresolved RestoreView of {view:?}"
                )))
            }
        },
        Expression::ResetView(reset) => ng::reset_view(*reset.expr),
        Expression::GetCurrentView(_) => ng::get_current_view(),
        Expression::ReadVariable(read) => {
            let name = read.name.ok_or_else(|| {
                PipelineError::assertion(format!("read of unnamed variable {:?}", read.xref))
            })?;
            o::variable(name)
        }
        Expression::ReadTemporary(read) => {
            let name = read.name.ok_or_else(|| {
                PipelineError::assertion(format!("read of unnamed temporary {:?}", read.xref))
            })?;
            o::variable(name)
        }
        Expression::AssignTemporary(assign) => {
            let name = assign.name.ok_or_else(|| {
                PipelineError::assertion(format!("assignment of unnamed temporary {:?}", assign.xref))
            })?;
            o::variable(name).set(*assign.expr)
        }
        Expression::PureFunction(pure) => {
            let fn_ = pure
                .fn_
                .ok_or_else(|| PipelineError::assertion("expected PureFunctions to have been extracted"))?;
            let var_offset = pure.var_offset.ok_or(PipelineError::VarOffsetUnset)?;
            ng::pure_function(var_offset, *fn_, pure.args)?
        }
        Expression::PipeBinding(pipe) => {
            let var_offset = pipe.var_offset.ok_or(PipelineError::VarOffsetUnset)?;
            ng::pipe_bind(pipe.target_slot.get()?, var_offset, pipe.args)?
        }
        Expression::PipeBindingVariadic(pipe) => {
            let var_offset = pipe.var_offset.ok_or(PipelineError::VarOffsetUnset)?;
            ng::pipe_bind_v(pipe.target_slot.get()?, var_offset, *pipe.args)
        }
        Expression::SlotLiteral(literal) => o::literal(literal.slot.get()?),
        Expression::ContextLetReference(reference) => {
            ng::read_context_let(reference.target_slot.get()?)
        }
        Expression::StoreLet(store) => ng::store_let(*store.value),
        Expression::TrackContext(_) => o::variable("this"),
        Expression::LexicalRead(read) => {
            return Err(PipelineError::assertion(format!(
                "unresolved LexicalRead of {}",
                read.name
            )))
        }
        Expression::TwoWayBindingSet(_) => {
            return Err(PipelineError::assertion("unresolved TwoWayBindingSet"))
        }
        Expression::PureFunctionParameter(_) => {
            return Err(PipelineError::assertion(
                "PureFunctionParameter should have been extracted with its function",
            ))
        }
        unresolved @ (Expression::Context(_)
        | Expression::SafePropertyRead(_)
        | Expression::SafeKeyedRead(_)
        | Expression::SafeInvokeFunction(_)
        | Expression::SafeTernary(_)
        | Expression::Empty(_)
        | Expression::ConditionalCase(_)
        | Expression::ConstCollected(_)) => {
            return Err(PipelineError::assertion(format!(
                "unsupported reification of IR expression {unresolved:?}"
            )))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::template::pipeline::ir::ops::{
        create_binding_op, create_element_end_op, create_element_start_op,
        create_extracted_attribute_op, create_i18n_attributes_op, create_listener_op,
        create_text_op, VariableOp,
    };
    use crate::template::pipeline::ir::{ConstIndex, OpKind, SlotHandle, VariableFlags};
    use crate::template::pipeline::src::compilation::{
        ComponentCompilationJob, HostBindingCompilationJob,
    };

    fn callee(statement: &Statement) -> String {
        match statement {
            Statement::Expression(stmt) => match stmt.expr.as_ref() {
                Expression::InvokeFn(call) => match call.fn_.as_ref() {
                    Expression::External(ext) => ext.value.name.to_string(),
                    other => panic!("unexpected callee {other:?}"),
                },
                other => panic!("expected a call, got {other:?}"),
            },
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    fn create_statements(job: &ComponentCompilationJob) -> Vec<Statement> {
        job.views[&job.root]
            .create
            .iter()
            .map(|op| match op {
                CreateOp::Statement(op) => op.statement.clone(),
                other => panic!("op {:?} was not reified", other.kind()),
            })
            .collect()
    }

    fn assigned(op: CreateOp, slot: usize) -> CreateOp {
        match &op {
            CreateOp::ElementStart(element) => element.base.handle.assign(slot).unwrap(),
            CreateOp::Text(text) => text.handle.assign(slot).unwrap(),
            _ => {}
        }
        op
    }

    #[test]
    fn test_element_and_text_become_instruction_calls() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let div = job.base.allocate_xref_id();
        let text = job.base.allocate_xref_id();
        let create = &mut job.views[&root].create;
        create.push(assigned(create_element_start_op("div", div, Namespace::HTML, None), 0));
        create.push(assigned(create_text_op(text, "hi"), 1));
        create.push(create_element_end_op(div));

        reify(&mut job).unwrap();

        let names: Vec<_> = create_statements(&job).iter().map(callee).collect();
        assert_eq!(names, ["ɵɵelementStart", "ɵɵtext", "ɵɵelementEnd"]);
    }

    #[test]
    fn test_listener_handler_becomes_named_function() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let button = job.base.allocate_xref_id();
        let list = job.base.allocate_list_id();
        let mut listener = create_listener_op(
            button,
            SlotHandle::default(),
            "click",
            Some("button".into()),
            vec![UpdateOp::Statement(StatementOp::new(o::return_stmt(o::variable("$event"))))],
            false,
            list,
        );
        listener.handler_fn_name = Some("Cmp_button_click_0_listener".into());
        listener.consumes_dollar_event = true;
        job.views[&root].create.push(CreateOp::Listener(listener));

        reify(&mut job).unwrap();

        let statements = create_statements(&job);
        assert_eq!(callee(&statements[0]), "ɵɵlistener");
        let Statement::Expression(stmt) = &statements[0] else {
            unreachable!()
        };
        let Expression::InvokeFn(call) = stmt.expr.as_ref() else {
            unreachable!()
        };
        match &call.args[1] {
            Expression::Fn(function) => {
                assert_eq!(function.name.as_deref(), Some("Cmp_button_click_0_listener"));
                assert_eq!(function.params.len(), 1);
                assert_eq!(function.params[0].name, "$event");
                assert_eq!(function.statements.len(), 1);
            }
            other => panic!("unexpected handler {other:?}"),
        }
    }

    #[test]
    fn test_unnamed_variable_is_an_error() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let xref = job.base.allocate_xref_id();
        job.views[&root].update.push(UpdateOp::Variable(VariableOp::new(
            xref,
            SemanticVariable::context(root),
            o::variable("ctx"),
            VariableFlags::NONE,
        )));
        assert!(reify(&mut job).is_err());
    }

    #[test]
    fn test_i18n_attributes_reads_its_config_index() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let div = job.base.allocate_xref_id();
        let attrs = job.base.allocate_xref_id();
        let handle = SlotHandle::new();
        handle.assign(1).unwrap();
        let mut op = create_i18n_attributes_op(attrs, handle, div);
        if let CreateOp::I18nAttributes(op) = &mut op {
            op.i18n_attributes_config = Some(ConstIndex(3));
        }
        job.views[&root].create.push(op);

        reify(&mut job).unwrap();

        let statements = create_statements(&job);
        assert_eq!(callee(&statements[0]), "ɵɵi18nAttributes");
        let Statement::Expression(stmt) = &statements[0] else {
            unreachable!()
        };
        let Expression::InvokeFn(call) = stmt.expr.as_ref() else {
            unreachable!()
        };
        assert!(call.args[0].is_equivalent(&o::literal(1usize)));
        assert!(call.args[1].is_equivalent(&o::literal(3usize)));
    }

    #[test]
    fn test_leftover_intermediate_ops_are_errors() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let div = job.base.allocate_xref_id();
        let attr = create_extracted_attribute_op(
            div,
            BindingKind::Attribute,
            None,
            "title",
            None,
            vec![],
        );
        job.views[&root].create.push(CreateOp::ExtractedAttribute(attr));
        assert!(matches!(reify(&mut job), Err(PipelineError::Assertion(_))));

        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let div = job.base.allocate_xref_id();
        job.views[&root].update.push(UpdateOp::Binding(create_binding_op(
            div,
            BindingKind::Property,
            "title",
            o::variable("title"),
            None,
            vec![],
            false,
        )));
        assert!(matches!(reify(&mut job), Err(PipelineError::Assertion(_))));
    }

    #[test]
    fn test_host_properties_use_dom_instructions() {
        let mut job = HostBindingCompilationJob::new(
            "Dir",
            ConstantPool::new(),
            &PipelineOptions::default(),
        );
        job.root.update.push(UpdateOp::DomProperty(
            crate::template::pipeline::ir::ops::DomPropertyOp {
                name: "tabindex".into(),
                expression: o::literal(0usize).into(),
                binding_kind: BindingKind::Property,
                i18n_context: None,
                security_context: vec![],
                sanitizer: None,
            },
        ));

        reify(&mut job).unwrap();

        let Some(UpdateOp::Statement(op)) = job.root.update.iter().next() else {
            panic!("update op was not reified");
        };
        assert_eq!(callee(&op.statement), "ɵɵdomProperty");
        let Statement::Expression(stmt) = &op.statement else {
            unreachable!()
        };
        let Expression::InvokeFn(call) = stmt.expr.as_ref() else {
            unreachable!()
        };
        assert!(call.args[0].is_equivalent(&o::literal("tabIndex")));
    }

    #[test]
    fn test_reified_lists_hold_only_statements() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let div = job.base.allocate_xref_id();
        let create = &mut job.views[&root].create;
        create.push(assigned(create_element_start_op("div", div, Namespace::HTML, None), 0));
        create.push(create_element_end_op(div));

        reify(&mut job).unwrap();

        assert!(job.views[&root]
            .create
            .iter()
            .all(|op| op.kind() == OpKind::Statement));
    }
}
