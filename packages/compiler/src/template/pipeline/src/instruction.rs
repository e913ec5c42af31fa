//! Helpers for generating calls to runtime instructions.
//!
//! Create/update builders return the `Statement` to wrap into a `StatementOp`; expression builders
//! return the call `Expression` itself.

use crate::error::{PipelineError, Result};
use crate::output::output_ast::{self as o, Expression, ExternalReference, LiteralValue, Statement};
use crate::render3::r3_identifiers::Identifiers;
use crate::template::pipeline::ir::enums::{AnimationKind, DeferOpModifierKind, DeferTriggerKind};
use crate::template::pipeline::ir::ops::{BindingExpression, Interpolation};

fn call_expr(instruction: ExternalReference, args: Vec<Expression>) -> Expression {
    o::import_ref(instruction).call_fn(args)
}

pub fn call(instruction: ExternalReference, args: Vec<Expression>) -> Statement {
    call_expr(instruction, args).to_stmt()
}

fn is_null_literal(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::Literal(o::LiteralExpr {
            value: LiteralValue::Null
        })
    )
}

fn trim_trailing_nulls(args: &mut Vec<Expression>) {
    while args.last().is_some_and(is_null_literal) {
        args.pop();
    }
}

fn opt_literal<T: Into<LiteralValue>>(value: Option<T>) -> Expression {
    o::literal(value)
}

fn element_or_container_base(
    instruction: ExternalReference,
    slot: usize,
    tag: Option<&str>,
    const_index: Option<usize>,
    local_ref_index: Option<usize>,
) -> Statement {
    let mut args = vec![o::literal(slot)];
    if let Some(tag) = tag {
        args.push(o::literal(tag));
    }
    if let Some(local_ref_index) = local_ref_index {
        args.push(opt_literal(const_index));
        args.push(o::literal(local_ref_index));
    } else if let Some(const_index) = const_index {
        args.push(o::literal(const_index));
    }
    call(instruction, args)
}

/// Which flavor of element instruction to emit. DOM-only templates use the `dom*` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementInstruction {
    Start,
    Single,
    ContainerStart,
    Container,
}

pub fn element_like(
    which: ElementInstruction,
    dom_only: bool,
    slot: usize,
    tag: Option<&str>,
    const_index: Option<usize>,
    local_ref_index: Option<usize>,
) -> Statement {
    let instruction = match (which, dom_only) {
        (ElementInstruction::Start, false) => Identifiers::element_start(),
        (ElementInstruction::Start, true) => Identifiers::dom_element_start(),
        (ElementInstruction::Single, false) => Identifiers::element(),
        (ElementInstruction::Single, true) => Identifiers::dom_element(),
        (ElementInstruction::ContainerStart, false) => Identifiers::element_container_start(),
        (ElementInstruction::ContainerStart, true) => Identifiers::dom_element_container_start(),
        (ElementInstruction::Container, false) => Identifiers::element_container(),
        (ElementInstruction::Container, true) => Identifiers::dom_element_container(),
    };
    let tag = match which {
        ElementInstruction::Start | ElementInstruction::Single => tag,
        ElementInstruction::ContainerStart | ElementInstruction::Container => None,
    };
    element_or_container_base(instruction, slot, tag, const_index, local_ref_index)
}

pub fn element_end(dom_only: bool) -> Statement {
    let instruction = if dom_only {
        Identifiers::dom_element_end()
    } else {
        Identifiers::element_end()
    };
    call(instruction, vec![])
}

pub fn element_container_end(dom_only: bool) -> Statement {
    let instruction = if dom_only {
        Identifiers::dom_element_container_end()
    } else {
        Identifiers::element_container_end()
    };
    call(instruction, vec![])
}

/// Arguments shared by `template`, `domTemplate` and the conditional create instructions.
#[derive(Debug, Clone)]
pub struct TemplateArgs<'a> {
    pub slot: usize,
    pub fn_name: &'a str,
    pub decls: usize,
    pub vars: usize,
    pub tag: Option<&'a str>,
    pub const_index: Option<usize>,
    pub local_refs: Option<usize>,
}

fn template_base(instruction: ExternalReference, args: TemplateArgs<'_>) -> Statement {
    let mut call_args = vec![
        o::literal(args.slot),
        o::variable(args.fn_name),
        o::literal(args.decls),
        o::literal(args.vars),
        opt_literal(args.tag),
        opt_literal(args.const_index),
    ];
    if let Some(local_refs) = args.local_refs {
        call_args.push(o::literal(local_refs));
        call_args.push(o::import_ref(Identifiers::template_ref_extractor()));
    }
    trim_trailing_nulls(&mut call_args);
    call(instruction, call_args)
}

pub fn template(args: TemplateArgs<'_>, dom_only: bool) -> Statement {
    let instruction = if dom_only {
        Identifiers::dom_template()
    } else {
        Identifiers::template_create()
    };
    template_base(instruction, args)
}

pub fn conditional_create(args: TemplateArgs<'_>) -> Statement {
    template_base(Identifiers::conditional_create(), args)
}

pub fn conditional_branch_create(args: TemplateArgs<'_>) -> Statement {
    template_base(Identifiers::conditional_branch_create(), args)
}

pub fn disable_bindings() -> Statement {
    call(Identifiers::disable_bindings(), vec![])
}

pub fn enable_bindings() -> Statement {
    call(Identifiers::enable_bindings(), vec![])
}

/// Global event targets a listener may be bound to (`window:resize`).
pub fn global_target_resolver(target: &str) -> Option<ExternalReference> {
    match target {
        "window" => Some(Identifiers::resolve_window()),
        "document" => Some(Identifiers::resolve_document()),
        "body" => Some(Identifiers::resolve_body()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerInstruction {
    Listener,
    DomListener,
    SyntheticHostListener,
}

pub fn listener(
    which: ListenerInstruction,
    name: &str,
    handler_fn: Expression,
    event_target_resolver: Option<ExternalReference>,
) -> Statement {
    let mut args = vec![o::literal(name), handler_fn];
    if let Some(resolver) = event_target_resolver {
        args.push(o::import_ref(resolver));
    }
    let instruction = match which {
        ListenerInstruction::Listener => Identifiers::listener(),
        ListenerInstruction::DomListener => Identifiers::dom_listener(),
        ListenerInstruction::SyntheticHostListener => Identifiers::synthetic_host_listener(),
    };
    call(instruction, args)
}

pub fn two_way_binding_set(target: Expression, value: Expression) -> Expression {
    call_expr(Identifiers::two_way_binding_set(), vec![target, value])
}

pub fn two_way_listener(name: &str, handler_fn: Expression) -> Statement {
    call(Identifiers::two_way_listener(), vec![o::literal(name), handler_fn])
}

pub fn animation(kind: AnimationKind, handler_fn: Expression, sanitizer: Option<Expression>) -> Statement {
    let mut args = vec![handler_fn];
    args.extend(sanitizer);
    call(animation_identifier(kind), args)
}

pub fn animation_string(
    kind: AnimationKind,
    expression: BindingExpression,
    sanitizer: Option<Expression>,
) -> Result<Statement> {
    let mut args = vec![binding_value(expression)?];
    args.extend(sanitizer);
    Ok(call(animation_identifier(kind), args))
}

fn animation_identifier(kind: AnimationKind) -> ExternalReference {
    match kind {
        AnimationKind::Enter => Identifiers::animation_enter(),
        AnimationKind::Leave => Identifiers::animation_leave(),
    }
}

pub fn animation_listener(
    kind: AnimationKind,
    handler_fn: Expression,
    event_target_resolver: Option<ExternalReference>,
) -> Statement {
    let mut args = vec![handler_fn];
    if let Some(resolver) = event_target_resolver {
        args.push(o::import_ref(resolver));
    }
    let instruction = match kind {
        AnimationKind::Enter => Identifiers::animation_enter_listener(),
        AnimationKind::Leave => Identifiers::animation_leave_listener(),
    };
    call(instruction, args)
}

pub fn pipe(slot: usize, name: &str) -> Statement {
    call(Identifiers::pipe(), vec![o::literal(slot), o::literal(name)])
}

pub fn namespace_html() -> Statement {
    call(Identifiers::namespace_html(), vec![])
}

pub fn namespace_svg() -> Statement {
    call(Identifiers::namespace_svg(), vec![])
}

pub fn namespace_math() -> Statement {
    call(Identifiers::namespace_math_ml(), vec![])
}

pub fn advance(delta: usize) -> Statement {
    let args = if delta > 1 {
        vec![o::literal(delta)]
    } else {
        vec![]
    };
    call(Identifiers::advance(), args)
}

pub fn reference(slot: usize) -> Expression {
    call_expr(Identifiers::reference(), vec![o::literal(slot)])
}

pub fn next_context(steps: usize) -> Expression {
    let args = if steps == 1 {
        vec![]
    } else {
        vec![o::literal(steps)]
    };
    call_expr(Identifiers::next_context(), args)
}

pub fn get_current_view() -> Expression {
    call_expr(Identifiers::get_current_view(), vec![])
}

pub fn restore_view(saved_view: Expression) -> Expression {
    call_expr(Identifiers::restore_view(), vec![saved_view])
}

pub fn reset_view(return_value: Expression) -> Expression {
    call_expr(Identifiers::reset_view(), vec![return_value])
}

pub fn text(slot: usize, initial_value: &str) -> Statement {
    let mut args = vec![o::literal(slot)];
    if !initial_value.is_empty() {
        args.push(o::literal(initial_value));
    }
    call(Identifiers::text(), args)
}

/// Lower a binding value, turning an interpolation into an `interpolateN` call.
pub fn binding_value(expression: BindingExpression) -> Result<Expression> {
    match expression {
        BindingExpression::Expression(expr) => Ok(expr),
        BindingExpression::Interpolation(interp) => interpolation_to_expression(interp),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyInstruction {
    Property,
    AriaProperty,
    DomProperty,
    SyntheticHostProperty,
}

pub fn property(
    which: PropertyInstruction,
    name: &str,
    expression: BindingExpression,
    sanitizer: Option<Expression>,
) -> Result<Statement> {
    let mut args = vec![o::literal(name), binding_value(expression)?];
    args.extend(sanitizer);
    let instruction = match which {
        PropertyInstruction::Property => Identifiers::property(),
        PropertyInstruction::AriaProperty => Identifiers::aria_property(),
        PropertyInstruction::DomProperty => Identifiers::dom_property(),
        PropertyInstruction::SyntheticHostProperty => Identifiers::synthetic_host_property(),
    };
    Ok(call(instruction, args))
}

pub fn control(expression: BindingExpression, sanitizer: Option<Expression>) -> Result<Statement> {
    let mut args = vec![binding_value(expression)?];
    args.extend(sanitizer);
    Ok(call(Identifiers::control(), args))
}

pub fn control_create() -> Statement {
    call(Identifiers::control_create(), vec![])
}

pub fn two_way_property(name: &str, expression: Expression, sanitizer: Option<Expression>) -> Statement {
    let mut args = vec![o::literal(name), expression];
    args.extend(sanitizer);
    call(Identifiers::two_way_property(), args)
}

pub fn attribute(
    name: &str,
    expression: BindingExpression,
    sanitizer: Option<Expression>,
    namespace: Option<&str>,
) -> Result<Statement> {
    let mut args = vec![o::literal(name), binding_value(expression)?];
    if sanitizer.is_some() || namespace.is_some() {
        args.push(sanitizer.unwrap_or_else(o::null_expr));
    }
    if let Some(namespace) = namespace {
        args.push(o::literal(namespace));
    }
    Ok(call(Identifiers::attribute(), args))
}

pub fn style_prop(name: &str, expression: BindingExpression, unit: Option<&str>) -> Result<Statement> {
    let mut args = vec![o::literal(name), binding_value(expression)?];
    if let Some(unit) = unit {
        args.push(o::literal(unit));
    }
    Ok(call(Identifiers::style_prop(), args))
}

pub fn class_prop(name: &str, expression: Expression) -> Statement {
    call(Identifiers::class_prop(), vec![o::literal(name), expression])
}

pub fn style_map(expression: BindingExpression) -> Result<Statement> {
    Ok(call(Identifiers::style_map(), vec![binding_value(expression)?]))
}

pub fn class_map(expression: BindingExpression) -> Result<Statement> {
    Ok(call(Identifiers::class_map(), vec![binding_value(expression)?]))
}

/// Interleave static strings and expressions: `'a', x, 'b', y, 'c'`. A singleton interpolation
/// collapses to the bare expression.
fn collate_interpolation_args(strings: Vec<String>, expressions: Vec<Expression>) -> Result<Vec<Expression>> {
    if strings.is_empty() || expressions.len() != strings.len() - 1 {
        return Err(PipelineError::assertion(format!(
            "expected specific shape of args for strings/expressions in interpolation: strings={}, expressions={}",
            strings.len(),
            expressions.len()
        )));
    }
    if expressions.len() == 1 && strings[0].is_empty() && strings[1].is_empty() {
        return Ok(expressions);
    }
    let mut args = Vec::with_capacity(strings.len() + expressions.len());
    let mut strings = strings.into_iter();
    for expr in expressions {
        if let Some(s) = strings.next() {
            args.push(o::literal(s));
        }
        args.push(expr);
    }
    args.extend(strings.map(o::literal));
    Ok(args)
}

fn interpolation_to_expression(interpolation: Interpolation) -> Result<Expression> {
    let args = collate_interpolation_args(interpolation.strings, interpolation.expressions)?;
    call_variadic_instruction_expr(&VALUE_INTERPOLATE_CONFIG, vec![], args, vec![])
}

pub fn text_interpolate(strings: Vec<String>, expressions: Vec<Expression>) -> Result<Statement> {
    let args = collate_interpolation_args(strings, expressions)?;
    Ok(call_variadic_instruction_expr(&TEXT_INTERPOLATE_CONFIG, vec![], args, vec![])?.to_stmt())
}

/// Describes a family of instructions with fixed-arity variants and one variadic fallback.
pub struct VariadicInstructionConfig {
    pub constant: &'static [ExternalReference],
    pub variable: ExternalReference,
    /// Maps the number of collated arguments to the arity index.
    pub mapping: fn(usize) -> Result<usize>,
}

fn interpolation_arity(n: usize) -> Result<usize> {
    if n % 2 == 0 {
        return Err(PipelineError::assertion("expected odd number of arguments"));
    }
    Ok((n - 1) / 2)
}

fn identity_arity(n: usize) -> Result<usize> {
    Ok(n)
}

static TEXT_INTERPOLATE_REFS: [ExternalReference; 9] = [
    Identifiers::text_interpolate(),
    Identifiers::text_interpolate1(),
    Identifiers::text_interpolate2(),
    Identifiers::text_interpolate3(),
    Identifiers::text_interpolate4(),
    Identifiers::text_interpolate5(),
    Identifiers::text_interpolate6(),
    Identifiers::text_interpolate7(),
    Identifiers::text_interpolate8(),
];

static VALUE_INTERPOLATE_REFS: [ExternalReference; 9] = [
    Identifiers::interpolate(),
    Identifiers::interpolate1(),
    Identifiers::interpolate2(),
    Identifiers::interpolate3(),
    Identifiers::interpolate4(),
    Identifiers::interpolate5(),
    Identifiers::interpolate6(),
    Identifiers::interpolate7(),
    Identifiers::interpolate8(),
];

static PURE_FUNCTION_REFS: [ExternalReference; 9] = [
    Identifiers::pure_function0(),
    Identifiers::pure_function1(),
    Identifiers::pure_function2(),
    Identifiers::pure_function3(),
    Identifiers::pure_function4(),
    Identifiers::pure_function5(),
    Identifiers::pure_function6(),
    Identifiers::pure_function7(),
    Identifiers::pure_function8(),
];

pub static TEXT_INTERPOLATE_CONFIG: VariadicInstructionConfig = VariadicInstructionConfig {
    constant: &TEXT_INTERPOLATE_REFS,
    variable: Identifiers::text_interpolate_v(),
    mapping: interpolation_arity,
};

pub static VALUE_INTERPOLATE_CONFIG: VariadicInstructionConfig = VariadicInstructionConfig {
    constant: &VALUE_INTERPOLATE_REFS,
    variable: Identifiers::interpolate_v(),
    mapping: interpolation_arity,
};

pub static PURE_FUNCTION_CONFIG: VariadicInstructionConfig = VariadicInstructionConfig {
    constant: &PURE_FUNCTION_REFS,
    variable: Identifiers::pure_function_v(),
    mapping: identity_arity,
};

fn call_variadic_instruction_expr(
    config: &VariadicInstructionConfig,
    base_args: Vec<Expression>,
    mut interpolation_args: Vec<Expression>,
    extra_args: Vec<Expression>,
) -> Result<Expression> {
    // The arity is computed before a trailing empty string is dropped.
    let n = (config.mapping)(interpolation_args.len())?;

    if extra_args.is_empty()
        && interpolation_args.len() > 1
        && interpolation_args
            .last()
            .and_then(Expression::as_string_literal)
            .is_some_and(str::is_empty)
    {
        interpolation_args.pop();
    }

    let mut args = base_args;
    let instruction = match config.constant.get(n) {
        Some(instruction) => {
            args.extend(interpolation_args);
            instruction.clone()
        }
        None => {
            args.push(o::literal_arr(interpolation_args));
            config.variable.clone()
        }
    };
    args.extend(extra_args);
    Ok(call_expr(instruction, args))
}

/// Arguments of the `defer` instruction.
#[derive(Debug, Clone)]
pub struct DeferArgs {
    pub self_slot: usize,
    pub primary_slot: usize,
    pub resolver_fn: Option<Expression>,
    pub loading_slot: Option<usize>,
    pub placeholder_slot: Option<usize>,
    pub error_slot: Option<usize>,
    pub loading_config: Option<Expression>,
    pub placeholder_config: Option<Expression>,
    pub enable_timer_scheduling: bool,
    pub flags: Option<u8>,
}

pub fn defer(args: DeferArgs) -> Statement {
    let mut call_args = vec![
        o::literal(args.self_slot),
        o::literal(args.primary_slot),
        args.resolver_fn.unwrap_or_else(o::null_expr),
        opt_literal(args.loading_slot),
        opt_literal(args.placeholder_slot),
        opt_literal(args.error_slot),
        args.loading_config.unwrap_or_else(o::null_expr),
        args.placeholder_config.unwrap_or_else(o::null_expr),
        if args.enable_timer_scheduling {
            o::import_ref(Identifiers::defer_enable_timer_scheduling())
        } else {
            o::null_expr()
        },
        opt_literal(args.flags.map(|f| f as usize)),
    ];
    trim_trailing_nulls(&mut call_args);
    call(Identifiers::defer(), call_args)
}

fn defer_trigger_instruction(trigger: DeferTriggerKind, modifier: DeferOpModifierKind) -> ExternalReference {
    use DeferOpModifierKind as M;
    use DeferTriggerKind as T;
    match (trigger, modifier) {
        (T::Idle, M::None) => Identifiers::defer_on_idle(),
        (T::Idle, M::Prefetch) => Identifiers::defer_prefetch_on_idle(),
        (T::Idle, M::Hydrate) => Identifiers::defer_hydrate_on_idle(),
        (T::Immediate, M::None) => Identifiers::defer_on_immediate(),
        (T::Immediate, M::Prefetch) => Identifiers::defer_prefetch_on_immediate(),
        (T::Immediate, M::Hydrate) => Identifiers::defer_hydrate_on_immediate(),
        (T::Timer, M::None) => Identifiers::defer_on_timer(),
        (T::Timer, M::Prefetch) => Identifiers::defer_prefetch_on_timer(),
        (T::Timer, M::Hydrate) => Identifiers::defer_hydrate_on_timer(),
        (T::Hover, M::None) => Identifiers::defer_on_hover(),
        (T::Hover, M::Prefetch) => Identifiers::defer_prefetch_on_hover(),
        (T::Hover, M::Hydrate) => Identifiers::defer_hydrate_on_hover(),
        (T::Interaction, M::None) => Identifiers::defer_on_interaction(),
        (T::Interaction, M::Prefetch) => Identifiers::defer_prefetch_on_interaction(),
        (T::Interaction, M::Hydrate) => Identifiers::defer_hydrate_on_interaction(),
        (T::Viewport, M::None) => Identifiers::defer_on_viewport(),
        (T::Viewport, M::Prefetch) => Identifiers::defer_prefetch_on_viewport(),
        (T::Viewport, M::Hydrate) => Identifiers::defer_hydrate_on_viewport(),
        (T::Never, _) => Identifiers::defer_hydrate_never(),
    }
}

pub fn defer_on(trigger: DeferTriggerKind, args: Vec<Expression>, modifier: DeferOpModifierKind) -> Statement {
    call(defer_trigger_instruction(trigger, modifier), args)
}

pub fn projection_def(def: Option<Expression>) -> Statement {
    call(Identifiers::projection_def(), def.into_iter().collect())
}

/// The fallback view of an `<ng-content>`.
#[derive(Debug, Clone)]
pub struct ProjectionFallback<'a> {
    pub fn_name: &'a str,
    pub decls: usize,
    pub vars: usize,
}

pub fn projection(
    slot: usize,
    projection_slot_index: usize,
    attributes: Option<Expression>,
    fallback: Option<ProjectionFallback<'_>>,
) -> Statement {
    let mut args = vec![o::literal(slot)];
    if projection_slot_index != 0 || attributes.is_some() || fallback.is_some() {
        args.push(o::literal(projection_slot_index));
        let has_attributes = attributes.is_some();
        args.extend(attributes);
        if let Some(fallback) = fallback {
            if !has_attributes {
                args.push(o::null_expr());
            }
            args.push(o::variable(fallback.fn_name));
            args.push(o::literal(fallback.decls));
            args.push(o::literal(fallback.vars));
        }
    }
    call(Identifiers::projection(), args)
}

pub fn i18n_start(slot: usize, const_index: usize, sub_template_index: Option<usize>) -> Statement {
    let mut args = vec![o::literal(slot), o::literal(const_index)];
    if let Some(index) = sub_template_index {
        args.push(o::literal(index));
    }
    call(Identifiers::i18n_start(), args)
}

pub fn i18n(slot: usize, const_index: usize, sub_template_index: Option<usize>) -> Statement {
    let mut args = vec![o::literal(slot), o::literal(const_index)];
    if let Some(index) = sub_template_index {
        args.push(o::literal(index));
    }
    call(Identifiers::i18n(), args)
}

pub fn i18n_end() -> Statement {
    call(Identifiers::i18n_end(), vec![])
}

pub fn i18n_exp(expr: Expression) -> Statement {
    call(Identifiers::i18n_exp(), vec![expr])
}

pub fn i18n_apply(slot: usize) -> Statement {
    call(Identifiers::i18n_apply(), vec![o::literal(slot)])
}

pub fn i18n_attributes(slot: usize, config_index: usize) -> Statement {
    call(
        Identifiers::i18n_attributes(),
        vec![o::literal(slot), o::literal(config_index)],
    )
}

/// The `@empty` view of a `@for` block.
#[derive(Debug, Clone)]
pub struct RepeaterEmpty<'a> {
    pub fn_name: &'a str,
    pub decls: usize,
    pub vars: usize,
    pub tag: Option<&'a str>,
    pub const_index: Option<usize>,
}

/// Arguments of the `repeaterCreate` instruction.
#[derive(Debug, Clone)]
pub struct RepeaterCreateArgs<'a> {
    pub slot: usize,
    pub fn_name: &'a str,
    pub decls: usize,
    pub vars: usize,
    pub tag: Option<&'a str>,
    pub const_index: Option<usize>,
    pub track_by_fn: Expression,
    pub track_by_uses_component_instance: bool,
    pub empty: Option<RepeaterEmpty<'a>>,
}

pub fn repeater_create(args: RepeaterCreateArgs<'_>) -> Statement {
    let mut call_args = vec![
        o::literal(args.slot),
        o::variable(args.fn_name),
        o::literal(args.decls),
        o::literal(args.vars),
        opt_literal(args.tag),
        opt_literal(args.const_index),
        args.track_by_fn,
    ];
    if args.track_by_uses_component_instance || args.empty.is_some() {
        call_args.push(o::literal(args.track_by_uses_component_instance));
        if let Some(empty) = args.empty {
            call_args.push(o::variable(empty.fn_name));
            call_args.push(o::literal(empty.decls));
            call_args.push(o::literal(empty.vars));
            if empty.tag.is_some() || empty.const_index.is_some() {
                call_args.push(opt_literal(empty.tag));
            }
            if let Some(const_index) = empty.const_index {
                call_args.push(o::literal(const_index));
            }
        }
    }
    call(Identifiers::repeater_create(), call_args)
}

pub fn repeater(collection: Expression) -> Statement {
    call(Identifiers::repeater(), vec![collection])
}

pub fn defer_when(modifier: DeferOpModifierKind, expr: Expression) -> Statement {
    let instruction = match modifier {
        DeferOpModifierKind::None => Identifiers::defer_when(),
        DeferOpModifierKind::Prefetch => Identifiers::defer_prefetch_when(),
        DeferOpModifierKind::Hydrate => Identifiers::defer_hydrate_when(),
    };
    call(instruction, vec![expr])
}

pub fn declare_let(slot: usize) -> Statement {
    call(Identifiers::declare_let(), vec![o::literal(slot)])
}

pub fn store_let(value: Expression) -> Expression {
    call_expr(Identifiers::store_let(), vec![value])
}

pub fn read_context_let(slot: usize) -> Expression {
    call_expr(Identifiers::read_context_let(), vec![o::literal(slot)])
}

pub fn conditional(condition: Expression, context_value: Option<Expression>) -> Statement {
    let mut args = vec![condition];
    args.extend(context_value);
    call(Identifiers::conditional(), args)
}

pub fn pure_function(var_offset: usize, fn_: Expression, args: Vec<Expression>) -> Result<Expression> {
    call_variadic_instruction_expr(
        &PURE_FUNCTION_CONFIG,
        vec![o::literal(var_offset), fn_],
        args,
        vec![],
    )
}

static PIPE_BINDINGS: [ExternalReference; 4] = [
    Identifiers::pipe_bind1(),
    Identifiers::pipe_bind2(),
    Identifiers::pipe_bind3(),
    Identifiers::pipe_bind4(),
];

pub fn pipe_bind(slot: usize, var_offset: usize, args: Vec<Expression>) -> Result<Expression> {
    let instruction = args
        .len()
        .checked_sub(1)
        .and_then(|i| PIPE_BINDINGS.get(i))
        .cloned()
        .ok_or_else(|| {
            PipelineError::assertion(format!("pipeBind() argument count out of bounds: {}", args.len()))
        })?;
    let mut call_args = vec![o::literal(slot), o::literal(var_offset)];
    call_args.extend(args);
    Ok(call_expr(instruction, call_args))
}

pub fn pipe_bind_v(slot: usize, var_offset: usize, args: Expression) -> Expression {
    call_expr(
        Identifiers::pipe_bind_v(),
        vec![o::literal(slot), o::literal(var_offset), args],
    )
}
