//! IR Expressions
//!
//! Expression nodes that only exist inside the pipeline, and the generic rewrite engine that walks
//! them together with ordinary output AST nodes.

use bitflags::bitflags;

use crate::output::output_ast::{ArrowFunctionBody, Expression, Statement};
use crate::template::pipeline::ir::handle::{SlotHandle, XrefId};
use crate::template::pipeline::ir::traits::{
    ConsumesVarsTrait, DependsOnSlotContextOpTrait, UsesVarOffsetTrait,
};

bitflags! {
    /// Flags for visitor context when transforming expressions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VisitorContextFlag: u8 {
        const NONE = 0b0000;
        const IN_CHILD_OPERATION = 0b0001;
    }
}

/// Transformer which converts expressions into general `Expression`s (which may be an identity
/// transformation).
pub type ExpressionTransform<'a> = dyn FnMut(Expression, VisitorContextFlag) -> Expression + 'a;

/// Base trait for all logical IR expressions.
pub trait IrExpression {
    /// Run the transformer against any nested expressions which may be present in this IR
    /// expression subtype.
    fn transform_internal_expressions(
        &mut self,
        _transform: &mut ExpressionTransform<'_>,
        _flags: VisitorContextFlag,
    ) {
    }
}

/// Logical expression representing a lexical read of a variable name.
#[derive(Debug, Clone)]
pub struct LexicalReadExpr {
    pub name: String,
}

impl LexicalReadExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl IrExpression for LexicalReadExpr {}

/// Runtime operation to retrieve the value of a local reference.
#[derive(Debug, Clone)]
pub struct ReferenceExpr {
    pub target: XrefId,
    pub target_slot: SlotHandle,
    pub offset: usize,
}

impl ReferenceExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.target == other.target && self.offset == other.offset
    }
}

impl IrExpression for ReferenceExpr {}

/// A reference to the current view context (usually the `ctx` variable in a template function).
#[derive(Debug, Clone)]
pub struct ContextExpr {
    pub view: XrefId,
}

impl ContextExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.view == other.view
    }
}

impl IrExpression for ContextExpr {}

/// A reference to the current view context inside a track function.
#[derive(Debug, Clone)]
pub struct TrackContextExpr {
    pub view: XrefId,
}

impl IrExpression for TrackContextExpr {}

/// Runtime operation to navigate to the next view context in the view hierarchy.
#[derive(Debug, Clone)]
pub struct NextContextExpr {
    pub steps: usize,
}

impl NextContextExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.steps == other.steps
    }
}

impl IrExpression for NextContextExpr {}

/// Runtime operation to snapshot the current view context.
///
/// The result of this operation can be stored in a variable and later used with the `RestoreView`
/// operation.
#[derive(Debug, Clone, Default)]
pub struct GetCurrentViewExpr;

impl IrExpression for GetCurrentViewExpr {}

/// The view whose context is restored: either known statically, or computed at runtime.
#[derive(Debug, Clone)]
pub enum RestoreViewTarget {
    Static(XrefId),
    Dynamic(Box<Expression>),
}

/// Runtime operation to restore a snapshotted view.
#[derive(Debug, Clone)]
pub struct RestoreViewExpr {
    pub view: RestoreViewTarget,
}

impl RestoreViewExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (&self.view, &other.view) {
            (RestoreViewTarget::Static(a), RestoreViewTarget::Static(b)) => a == b,
            (RestoreViewTarget::Dynamic(a), RestoreViewTarget::Dynamic(b)) => a.is_equivalent(b),
            _ => false,
        }
    }
}

impl IrExpression for RestoreViewExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        if let RestoreViewTarget::Dynamic(expr) = &mut self.view {
            transform_in_place(expr, transform, flags);
        }
    }
}

/// Runtime operation to reset the current view context after `RestoreView`.
#[derive(Debug, Clone)]
pub struct ResetViewExpr {
    pub expr: Box<Expression>,
}

impl ResetViewExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.expr.is_equivalent(&other.expr)
    }
}

impl IrExpression for ResetViewExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.expr, transform, flags);
    }
}

/// Read of a variable declared as an `ir.VariableOp` and referenced through its `ir.XrefId`.
#[derive(Debug, Clone)]
pub struct ReadVariableExpr {
    pub xref: XrefId,
    pub name: Option<String>,
}

impl ReadVariableExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.xref == other.xref
    }
}

impl IrExpression for ReadVariableExpr {}

/// Defines and calls a function with change-detected arguments.
#[derive(Debug, Clone)]
pub struct PureFunctionExpr {
    pub var_offset: Option<usize>,
    /// The expression which should be memoized as a pure computation. Contains
    /// `PureFunctionParameterExpr`s standing in for the positional `args`.
    pub body: Option<Box<Expression>>,
    /// Positional arguments to the pure function, which act as memoization keys.
    pub args: Vec<Expression>,
    /// Once extracted to the `ConstantPool`, a reference to the function which defines the
    /// computation of `body`.
    pub fn_: Option<Box<Expression>>,
}

impl PureFunctionExpr {
    pub fn new(body: Expression, args: Vec<Expression>) -> Self {
        PureFunctionExpr {
            var_offset: None,
            body: Some(Box::new(body)),
            args,
            fn_: None,
        }
    }

    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (&self.body, &other.body) {
            (Some(a), Some(b)) => {
                a.is_equivalent(b)
                    && self.args.len() == other.args.len()
                    && self.args.iter().zip(&other.args).all(|(x, y)| x.is_equivalent(y))
            }
            _ => false,
        }
    }
}

impl IrExpression for PureFunctionExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        if let Some(body) = &mut self.body {
            transform_in_place(body, transform, flags | VisitorContextFlag::IN_CHILD_OPERATION);
        } else if let Some(fn_) = &mut self.fn_ {
            transform_in_place(fn_, transform, flags);
        }
        for arg in &mut self.args {
            transform_in_place(arg, transform, flags);
        }
    }
}

impl ConsumesVarsTrait for PureFunctionExpr {
    fn vars_used(&self) -> usize {
        1 + self.args.len()
    }
}

impl UsesVarOffsetTrait for PureFunctionExpr {
    fn var_offset(&self) -> Option<usize> {
        self.var_offset
    }

    fn set_var_offset(&mut self, offset: usize) {
        self.var_offset = Some(offset);
    }
}

/// Indicates a positional parameter to a pure function definition.
#[derive(Debug, Clone)]
pub struct PureFunctionParameterExpr {
    pub index: usize,
}

impl IrExpression for PureFunctionParameterExpr {}

/// Binding to a pipe transformation.
#[derive(Debug, Clone)]
pub struct PipeBindingExpr {
    pub var_offset: Option<usize>,
    pub target: XrefId,
    pub target_slot: SlotHandle,
    pub name: String,
    pub args: Vec<Expression>,
}

impl PipeBindingExpr {
    /// Pipes are stateful, so two bindings are never interchangeable.
    pub fn is_equivalent(&self, _other: &Self) -> bool {
        false
    }
}

impl IrExpression for PipeBindingExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        for arg in &mut self.args {
            transform_in_place(arg, transform, flags);
        }
    }
}

impl ConsumesVarsTrait for PipeBindingExpr {
    fn vars_used(&self) -> usize {
        1 + self.args.len()
    }
}

impl UsesVarOffsetTrait for PipeBindingExpr {
    fn var_offset(&self) -> Option<usize> {
        self.var_offset
    }

    fn set_var_offset(&mut self, offset: usize) {
        self.var_offset = Some(offset);
    }
}

/// Binding to a pipe transformation with a variable number of arguments.
#[derive(Debug, Clone)]
pub struct PipeBindingVariadicExpr {
    pub var_offset: Option<usize>,
    pub target: XrefId,
    pub target_slot: SlotHandle,
    pub name: String,
    /// A single expression holding all arguments, usually a literal array.
    pub args: Box<Expression>,
    pub num_args: usize,
}

impl PipeBindingVariadicExpr {
    pub fn is_equivalent(&self, _other: &Self) -> bool {
        false
    }
}

impl IrExpression for PipeBindingVariadicExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.args, transform, flags);
    }
}

impl ConsumesVarsTrait for PipeBindingVariadicExpr {
    fn vars_used(&self) -> usize {
        1 + self.num_args
    }
}

impl UsesVarOffsetTrait for PipeBindingVariadicExpr {
    fn var_offset(&self) -> Option<usize> {
        self.var_offset
    }

    fn set_var_offset(&mut self, offset: usize) {
        self.var_offset = Some(offset);
    }
}

/// `receiver?.name`
#[derive(Debug, Clone)]
pub struct SafePropertyReadExpr {
    pub receiver: Box<Expression>,
    pub name: String,
}

impl SafePropertyReadExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.name == other.name && self.receiver.is_equivalent(&other.receiver)
    }
}

impl IrExpression for SafePropertyReadExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.receiver, transform, flags);
    }
}

/// `receiver?.[index]`
#[derive(Debug, Clone)]
pub struct SafeKeyedReadExpr {
    pub receiver: Box<Expression>,
    pub index: Box<Expression>,
}

impl SafeKeyedReadExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.receiver.is_equivalent(&other.receiver) && self.index.is_equivalent(&other.index)
    }
}

impl IrExpression for SafeKeyedReadExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.receiver, transform, flags);
        transform_in_place(&mut self.index, transform, flags);
    }
}

/// `receiver?.(args)`
#[derive(Debug, Clone)]
pub struct SafeInvokeFunctionExpr {
    pub receiver: Box<Expression>,
    pub args: Vec<Expression>,
}

impl SafeInvokeFunctionExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.receiver.is_equivalent(&other.receiver)
            && self.args.len() == other.args.len()
            && self.args.iter().zip(&other.args).all(|(a, b)| a.is_equivalent(b))
    }
}

impl IrExpression for SafeInvokeFunctionExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.receiver, transform, flags);
        for arg in &mut self.args {
            transform_in_place(arg, transform, flags);
        }
    }
}

/// Intermediate form of a safe access: evaluates to `null` when `guard` is nullish, otherwise to
/// `expr`.
#[derive(Debug, Clone)]
pub struct SafeTernaryExpr {
    pub guard: Box<Expression>,
    pub expr: Box<Expression>,
}

impl SafeTernaryExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.guard.is_equivalent(&other.guard) && self.expr.is_equivalent(&other.expr)
    }
}

impl IrExpression for SafeTernaryExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.guard, transform, flags);
        transform_in_place(&mut self.expr, transform, flags);
    }
}

/// An empty expression, e.g. the missing value of a binding written as `[prop]=""`.
#[derive(Debug, Clone, Default)]
pub struct EmptyExpr;

impl IrExpression for EmptyExpr {}

/// Assigns `expr` to a temporary and evaluates to the assigned value.
#[derive(Debug, Clone)]
pub struct AssignTemporaryExpr {
    pub expr: Box<Expression>,
    pub xref: XrefId,
    pub name: Option<String>,
}

impl AssignTemporaryExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.xref == other.xref && self.expr.is_equivalent(&other.expr)
    }
}

impl IrExpression for AssignTemporaryExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.expr, transform, flags);
    }
}

#[derive(Debug, Clone)]
pub struct ReadTemporaryExpr {
    pub xref: XrefId,
    pub name: Option<String>,
}

impl IrExpression for ReadTemporaryExpr {}

/// An expression that will be replaced by the slot index of the declaration behind `slot`.
#[derive(Debug, Clone)]
pub struct SlotLiteralExpr {
    pub slot: SlotHandle,
}

impl IrExpression for SlotLiteralExpr {}

/// One case of a conditional (`@if` branch or `@switch` case).
#[derive(Debug, Clone)]
pub struct ConditionalCaseExpr {
    /// The test of the case. `None` for the default case of a `@switch` and the `@else` branch.
    pub expr: Option<Box<Expression>>,
    /// The view rendered when this case matches.
    pub target: XrefId,
    pub target_slot: SlotHandle,
    /// Alias declared with `@if (expr; as alias)`.
    pub alias: Option<String>,
}

impl ConditionalCaseExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.target == other.target
            && match (&self.expr, &other.expr) {
                (Some(a), Some(b)) => a.is_equivalent(b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl IrExpression for ConditionalCaseExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        if let Some(expr) = &mut self.expr {
            transform_in_place(expr, transform, flags);
        }
    }
}

/// The write half of a two-way binding (`[(ngModel)]="target"`).
#[derive(Debug, Clone)]
pub struct TwoWayBindingSetExpr {
    pub target: Box<Expression>,
    pub value: Box<Expression>,
}

impl TwoWayBindingSetExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.target.is_equivalent(&other.target) && self.value.is_equivalent(&other.value)
    }
}

impl IrExpression for TwoWayBindingSetExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.target, transform, flags);
        transform_in_place(&mut self.value, transform, flags);
    }
}

/// Read of a `@let` declaration from a view other than the one declaring it.
#[derive(Debug, Clone)]
pub struct ContextLetReferenceExpr {
    pub target: XrefId,
    pub target_slot: SlotHandle,
}

impl IrExpression for ContextLetReferenceExpr {}

/// Stores the current value of a `@let` declaration and evaluates to it.
#[derive(Debug, Clone)]
pub struct StoreLetExpr {
    pub target: XrefId,
    pub value: Box<Expression>,
}

impl StoreLetExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.target == other.target && self.value.is_equivalent(&other.value)
    }
}

impl IrExpression for StoreLetExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.value, transform, flags);
    }
}

impl ConsumesVarsTrait for StoreLetExpr {
    fn vars_used(&self) -> usize {
        1
    }
}

impl DependsOnSlotContextOpTrait for StoreLetExpr {
    fn target(&self) -> XrefId {
        self.target
    }
}

/// An expression that is lifted into the consts array once i18n messages have taken their
/// indices, and replaced by its const index.
#[derive(Debug, Clone)]
pub struct ConstCollectedExpr {
    pub expr: Box<Expression>,
}

impl ConstCollectedExpr {
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.expr.is_equivalent(&other.expr)
    }
}

impl IrExpression for ConstCollectedExpr {
    fn transform_internal_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        transform_in_place(&mut self.expr, transform, flags);
    }
}

// Constructors. Kept as free functions so phases read like expression builders.

pub fn const_collected(expr: Expression) -> Expression {
    Expression::ConstCollected(ConstCollectedExpr {
        expr: Box::new(expr),
    })
}

pub fn lexical_read(name: impl Into<String>) -> Expression {
    Expression::LexicalRead(LexicalReadExpr { name: name.into() })
}

pub fn reference(target: XrefId, target_slot: SlotHandle, offset: usize) -> Expression {
    Expression::Reference(ReferenceExpr {
        target,
        target_slot,
        offset,
    })
}

pub fn context(view: XrefId) -> Expression {
    Expression::Context(ContextExpr { view })
}

pub fn track_context(view: XrefId) -> Expression {
    Expression::TrackContext(TrackContextExpr { view })
}

pub fn next_context(steps: usize) -> Expression {
    Expression::NextContext(NextContextExpr { steps })
}

pub fn get_current_view() -> Expression {
    Expression::GetCurrentView(GetCurrentViewExpr)
}

pub fn restore_view(view: RestoreViewTarget) -> Expression {
    Expression::RestoreView(RestoreViewExpr { view })
}

pub fn reset_view(expr: Expression) -> Expression {
    Expression::ResetView(ResetViewExpr {
        expr: Box::new(expr),
    })
}

pub fn read_variable(xref: XrefId) -> Expression {
    Expression::ReadVariable(ReadVariableExpr { xref, name: None })
}

pub fn pure_function(body: Expression, args: Vec<Expression>) -> Expression {
    Expression::PureFunction(PureFunctionExpr::new(body, args))
}

pub fn pure_function_parameter(index: usize) -> Expression {
    Expression::PureFunctionParameter(PureFunctionParameterExpr { index })
}

pub fn pipe_binding(
    target: XrefId,
    target_slot: SlotHandle,
    name: impl Into<String>,
    args: Vec<Expression>,
) -> Expression {
    Expression::PipeBinding(PipeBindingExpr {
        var_offset: None,
        target,
        target_slot,
        name: name.into(),
        args,
    })
}

pub fn safe_property_read(receiver: Expression, name: impl Into<String>) -> Expression {
    Expression::SafePropertyRead(SafePropertyReadExpr {
        receiver: Box::new(receiver),
        name: name.into(),
    })
}

pub fn safe_keyed_read(receiver: Expression, index: Expression) -> Expression {
    Expression::SafeKeyedRead(SafeKeyedReadExpr {
        receiver: Box::new(receiver),
        index: Box::new(index),
    })
}

pub fn safe_invoke_function(receiver: Expression, args: Vec<Expression>) -> Expression {
    Expression::SafeInvokeFunction(SafeInvokeFunctionExpr {
        receiver: Box::new(receiver),
        args,
    })
}

pub fn safe_ternary(guard: Expression, expr: Expression) -> Expression {
    Expression::SafeTernary(SafeTernaryExpr {
        guard: Box::new(guard),
        expr: Box::new(expr),
    })
}

pub fn empty() -> Expression {
    Expression::Empty(EmptyExpr)
}

pub fn assign_temporary(expr: Expression, xref: XrefId) -> Expression {
    Expression::AssignTemporary(AssignTemporaryExpr {
        expr: Box::new(expr),
        xref,
        name: None,
    })
}

pub fn read_temporary(xref: XrefId) -> Expression {
    Expression::ReadTemporary(ReadTemporaryExpr { xref, name: None })
}

pub fn slot_literal(slot: SlotHandle) -> Expression {
    Expression::SlotLiteral(SlotLiteralExpr { slot })
}

pub fn two_way_binding_set(target: Expression, value: Expression) -> Expression {
    Expression::TwoWayBindingSet(TwoWayBindingSetExpr {
        target: Box::new(target),
        value: Box::new(value),
    })
}

pub fn context_let_reference(target: XrefId, target_slot: SlotHandle) -> Expression {
    Expression::ContextLetReference(ContextLetReferenceExpr {
        target,
        target_slot,
    })
}

pub fn store_let(target: XrefId, value: Expression) -> Expression {
    Expression::StoreLet(StoreLetExpr {
        target,
        value: Box::new(value),
    })
}

impl Expression {
    /// The variable storage this expression needs, if it consumes any.
    pub fn as_consumes_vars(&self) -> Option<&dyn ConsumesVarsTrait> {
        match self {
            Expression::PureFunction(e) => Some(e),
            Expression::PipeBinding(e) => Some(e),
            Expression::PipeBindingVariadic(e) => Some(e),
            Expression::StoreLet(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_uses_var_offset_mut(&mut self) -> Option<&mut dyn UsesVarOffsetTrait> {
        match self {
            Expression::PureFunction(e) => Some(e),
            Expression::PipeBinding(e) => Some(e),
            Expression::PipeBindingVariadic(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_depends_on_slot_context(&self) -> Option<&dyn DependsOnSlotContextOpTrait> {
        match self {
            Expression::StoreLet(e) => Some(e),
            _ => None,
        }
    }
}

fn take_expression(expr: &mut Expression) -> Expression {
    std::mem::replace(expr, Expression::Empty(EmptyExpr))
}

/// Rewrite `expr` in place with `transform_expressions_in_expression`.
pub fn transform_in_place(
    expr: &mut Expression,
    transform: &mut ExpressionTransform<'_>,
    flags: VisitorContextFlag,
) {
    let taken = take_expression(expr);
    *expr = transform_expressions_in_expression(taken, transform, flags);
}

/// Transform all `Expression`s in the AST of `expr` with the `transform` function.
///
/// Children are rewritten first, so `transform` observes an already-transformed subtree and may
/// replace the node itself.
pub fn transform_expressions_in_expression(
    mut expr: Expression,
    transform: &mut ExpressionTransform<'_>,
    flags: VisitorContextFlag,
) -> Expression {
    use Expression as E;

    match &mut expr {
        // Output AST nodes with children.
        E::WriteVar(e) => transform_in_place(&mut e.value, transform, flags),
        E::WriteKey(e) => {
            transform_in_place(&mut e.receiver, transform, flags);
            transform_in_place(&mut e.index, transform, flags);
            transform_in_place(&mut e.value, transform, flags);
        }
        E::WriteProp(e) => {
            transform_in_place(&mut e.receiver, transform, flags);
            transform_in_place(&mut e.value, transform, flags);
        }
        E::InvokeFn(e) => {
            transform_in_place(&mut e.fn_, transform, flags);
            for arg in &mut e.args {
                transform_in_place(arg, transform, flags);
            }
        }
        E::Conditional(e) => {
            transform_in_place(&mut e.condition, transform, flags);
            transform_in_place(&mut e.true_case, transform, flags);
            if let Some(false_case) = &mut e.false_case {
                transform_in_place(false_case, transform, flags);
            }
        }
        E::NotExpr(e) => transform_in_place(&mut e.condition, transform, flags),
        E::Fn(e) => {
            for stmt in &mut e.statements {
                transform_expressions_in_statement(stmt, transform, flags);
            }
        }
        E::ArrowFn(e) => match &mut e.body {
            ArrowFunctionBody::Expression(body) => transform_in_place(body, transform, flags),
            ArrowFunctionBody::Statements(stmts) => {
                for stmt in stmts {
                    transform_expressions_in_statement(stmt, transform, flags);
                }
            }
        },
        E::BinaryOp(e) => {
            transform_in_place(&mut e.lhs, transform, flags);
            transform_in_place(&mut e.rhs, transform, flags);
        }
        E::ReadProp(e) => transform_in_place(&mut e.receiver, transform, flags),
        E::ReadKey(e) => {
            transform_in_place(&mut e.receiver, transform, flags);
            transform_in_place(&mut e.index, transform, flags);
        }
        E::LiteralArray(e) => {
            for entry in &mut e.entries {
                transform_in_place(entry, transform, flags);
            }
        }
        E::LiteralMap(e) => {
            for entry in &mut e.entries {
                transform_in_place(&mut entry.value, transform, flags);
            }
        }
        E::TypeOf(e) => transform_in_place(&mut e.expr, transform, flags),
        E::Unary(e) => transform_in_place(&mut e.expr, transform, flags),
        E::Parens(e) => transform_in_place(&mut e.expr, transform, flags),
        E::ReadVar(_) | E::Literal(_) | E::External(_) => {}

        // IR nodes delegate to their own traversal.
        E::LexicalRead(e) => e.transform_internal_expressions(transform, flags),
        E::Reference(e) => e.transform_internal_expressions(transform, flags),
        E::Context(e) => e.transform_internal_expressions(transform, flags),
        E::NextContext(e) => e.transform_internal_expressions(transform, flags),
        E::GetCurrentView(e) => e.transform_internal_expressions(transform, flags),
        E::RestoreView(e) => e.transform_internal_expressions(transform, flags),
        E::ResetView(e) => e.transform_internal_expressions(transform, flags),
        E::ReadVariable(e) => e.transform_internal_expressions(transform, flags),
        E::PureFunction(e) => e.transform_internal_expressions(transform, flags),
        E::PureFunctionParameter(e) => e.transform_internal_expressions(transform, flags),
        E::PipeBinding(e) => e.transform_internal_expressions(transform, flags),
        E::PipeBindingVariadic(e) => e.transform_internal_expressions(transform, flags),
        E::SafePropertyRead(e) => e.transform_internal_expressions(transform, flags),
        E::SafeKeyedRead(e) => e.transform_internal_expressions(transform, flags),
        E::SafeInvokeFunction(e) => e.transform_internal_expressions(transform, flags),
        E::SafeTernary(e) => e.transform_internal_expressions(transform, flags),
        E::Empty(e) => e.transform_internal_expressions(transform, flags),
        E::AssignTemporary(e) => e.transform_internal_expressions(transform, flags),
        E::ReadTemporary(e) => e.transform_internal_expressions(transform, flags),
        E::SlotLiteral(e) => e.transform_internal_expressions(transform, flags),
        E::ConditionalCase(e) => e.transform_internal_expressions(transform, flags),
        E::TwoWayBindingSet(e) => e.transform_internal_expressions(transform, flags),
        E::ContextLetReference(e) => e.transform_internal_expressions(transform, flags),
        E::StoreLet(e) => e.transform_internal_expressions(transform, flags),
        E::TrackContext(e) => e.transform_internal_expressions(transform, flags),
        E::ConstCollected(e) => e.transform_internal_expressions(transform, flags),
    }

    transform(expr, flags)
}

/// Transform all `Expression`s in the AST of `stmt` with the `transform` function.
pub fn transform_expressions_in_statement(
    stmt: &mut Statement,
    transform: &mut ExpressionTransform<'_>,
    flags: VisitorContextFlag,
) {
    match stmt {
        Statement::Expression(s) => transform_in_place(&mut s.expr, transform, flags),
        Statement::Return(s) => transform_in_place(&mut s.value, transform, flags),
        Statement::DeclareVar(s) => {
            if let Some(value) = &mut s.value {
                transform_in_place(value, transform, flags);
            }
        }
        Statement::IfStmt(s) => {
            transform_in_place(&mut s.condition, transform, flags);
            for case_stmt in &mut s.true_case {
                transform_expressions_in_statement(case_stmt, transform, flags);
            }
            for case_stmt in &mut s.false_case {
                transform_expressions_in_statement(case_stmt, transform, flags);
            }
        }
    }
}

/// Visit every node of `expr`, children before parents, without changing it.
pub fn visit_expressions_in_expression(
    expr: &mut Expression,
    visitor: &mut dyn FnMut(&Expression, VisitorContextFlag),
    flags: VisitorContextFlag,
) {
    transform_in_place(
        expr,
        &mut |e, f| {
            visitor(&e, f);
            e
        },
        flags,
    );
}

/// Checks whether the given expression is a string literal.
pub fn is_string_literal(expr: &Expression) -> bool {
    expr.as_string_literal().is_some()
}
