//! Update Operations
//!
//! Operations that run on every change detection pass: bindings, text interpolation, control
//! flow updates and i18n expression updates.

use std::sync::Arc;

use crate::core::SecurityContext;
use crate::error::{PipelineError, Result};
use crate::i18n::i18n_ast::Message;
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::enums::{
    BindingKind, DeferOpModifierKind, I18nExpressionFor, I18nParamResolutionTime, OpKind,
    TemplateKind,
};
use crate::template::pipeline::ir::expression::{
    transform_expressions_in_statement, transform_in_place, ConditionalCaseExpr,
    ExpressionTransform, IrExpression, VisitorContextFlag,
};
use crate::template::pipeline::ir::handle::{SlotHandle, XrefId};
use crate::template::pipeline::ir::operations::Op;
use crate::template::pipeline::ir::ops::shared::{StatementOp, VariableOp};
use crate::template::pipeline::ir::traits::{DependsOnSlotContextOpTrait, ExpressionHolder};

/// A logical representation of an interpolation: static `strings` interleaved with
/// `expressions`, so `strings.len() == expressions.len() + 1`.
#[derive(Debug, Clone)]
pub struct Interpolation {
    pub strings: Vec<String>,
    pub expressions: Vec<Expression>,
    /// One placeholder name per expression when the interpolation is inside an i18n message.
    pub i18n_placeholders: Vec<String>,
}

impl Interpolation {
    pub fn new(
        strings: Vec<String>,
        expressions: Vec<Expression>,
        i18n_placeholders: Vec<String>,
    ) -> Result<Self> {
        if !i18n_placeholders.is_empty() && i18n_placeholders.len() != expressions.len() {
            return Err(PipelineError::assertion(format!(
                "expected {} placeholders to match interpolation expression count, but got {}",
                expressions.len(),
                i18n_placeholders.len()
            )));
        }
        Ok(Interpolation {
            strings,
            expressions,
            i18n_placeholders,
        })
    }

    /// `{{ expr }}` with no surrounding text.
    pub fn is_singleton(&self) -> bool {
        self.expressions.len() == 1
            && self.strings.len() == 2
            && self.strings.iter().all(String::is_empty)
    }

    fn transform(&mut self, transform: &mut ExpressionTransform<'_>, flags: VisitorContextFlag) {
        for expr in &mut self.expressions {
            transform_in_place(expr, transform, flags);
        }
    }
}

/// The value of a binding: a plain expression, or an interpolation.
#[derive(Debug, Clone)]
pub enum BindingExpression {
    Expression(Expression),
    Interpolation(Interpolation),
}

impl BindingExpression {
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            BindingExpression::Expression(expr) => Some(expr),
            BindingExpression::Interpolation(_) => None,
        }
    }

    pub fn as_interpolation(&self) -> Option<&Interpolation> {
        match self {
            BindingExpression::Interpolation(interp) => Some(interp),
            BindingExpression::Expression(_) => None,
        }
    }

    /// Number of interpolated expressions, or 0 for a plain expression.
    pub fn interpolation_len(&self) -> usize {
        self.as_interpolation().map_or(0, |i| i.expressions.len())
    }

    pub(crate) fn transform(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        match self {
            BindingExpression::Expression(expr) => transform_in_place(expr, transform, flags),
            BindingExpression::Interpolation(interp) => interp.transform(transform, flags),
        }
    }
}

impl From<Expression> for BindingExpression {
    fn from(expr: Expression) -> Self {
        BindingExpression::Expression(expr)
    }
}

impl From<Interpolation> for BindingExpression {
    fn from(interp: Interpolation) -> Self {
        BindingExpression::Interpolation(interp)
    }
}

/// Interpolates text into a text node.
#[derive(Debug, Clone)]
pub struct InterpolateTextOp {
    /// Reference to the text node to which the interpolation is bound.
    pub target: XrefId,
    pub interpolation: Interpolation,
}

/// An intermediate binding that has not yet been specialized by kind.
#[derive(Debug, Clone)]
pub struct BindingOp {
    /// Reference to the element on which the binding is placed.
    pub target: XrefId,
    pub kind: BindingKind,
    pub name: String,
    pub expression: BindingExpression,
    /// The unit of the bound value, e.g. `px` in `[style.width.px]`.
    pub unit: Option<String>,
    pub security_context: Vec<SecurityContext>,
    /// Whether the binding is a static text attribute (e.g. `attr="value"`).
    pub is_text_attribute: bool,
    /// Whether this binding lives on a structural template (`*ngIf="..."`).
    pub is_structural_template_attribute: bool,
    pub template_kind: Option<TemplateKind>,
    pub i18n_context: Option<XrefId>,
    pub i18n_message: Option<Arc<Message>>,
}

/// Binds an expression to a property of an element.
#[derive(Debug, Clone)]
pub struct PropertyOp {
    pub target: XrefId,
    pub name: String,
    pub expression: BindingExpression,
    pub binding_kind: BindingKind,
    pub security_context: Vec<SecurityContext>,
    pub sanitizer: Option<Expression>,
    pub is_structural_template_attribute: bool,
    pub template_kind: Option<TemplateKind>,
    pub i18n_context: Option<XrefId>,
    pub i18n_message: Option<Arc<Message>>,
}

/// The property half of a two-way binding.
#[derive(Debug, Clone)]
pub struct TwoWayPropertyOp {
    pub target: XrefId,
    pub name: String,
    pub expression: Expression,
    pub security_context: Vec<SecurityContext>,
    pub sanitizer: Option<Expression>,
}

#[derive(Debug, Clone)]
pub struct StylePropOp {
    pub target: XrefId,
    pub name: String,
    pub expression: BindingExpression,
    pub unit: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClassPropOp {
    pub target: XrefId,
    pub name: String,
    pub expression: Expression,
}

/// Binds an expression to the styles or classes of an element as a whole.
#[derive(Debug, Clone)]
pub struct MapBindingOp {
    pub target: XrefId,
    pub expression: BindingExpression,
}

/// Binds an expression to an attribute of an element.
#[derive(Debug, Clone)]
pub struct AttributeOp {
    pub target: XrefId,
    pub namespace: Option<String>,
    pub name: String,
    pub expression: BindingExpression,
    pub security_context: Vec<SecurityContext>,
    pub sanitizer: Option<Expression>,
    /// Whether the binding is a static text attribute. Only these can be extracted into the
    /// consts array.
    pub is_text_attribute: bool,
    pub is_structural_template_attribute: bool,
    pub template_kind: Option<TemplateKind>,
    pub i18n_context: Option<XrefId>,
    pub i18n_message: Option<Arc<Message>>,
}

/// Advances the runtime's implicit slot context by `delta` slots.
#[derive(Debug, Clone)]
pub struct AdvanceOp {
    pub delta: usize,
}

/// Chooses which branch of an `@if` / `@switch` block to render.
#[derive(Debug, Clone)]
pub struct ConditionalOp {
    /// The first branch's `ConditionalCreate` op.
    pub target: XrefId,
    /// The `@switch` subject, or `None` for `@if`.
    pub test: Option<Expression>,
    pub conditions: Vec<ConditionalCaseExpr>,
    /// The combined test chain, once generated.
    pub processed: Option<Expression>,
    /// The value exposed to the rendered branch through an alias.
    pub context_value: Option<Expression>,
}

/// Feeds the collection of a `@for` block to the repeater.
#[derive(Debug, Clone)]
pub struct RepeaterOp {
    /// The `RepeaterCreate` op.
    pub target: XrefId,
    pub target_slot: SlotHandle,
    pub collection: Expression,
}

/// Loads a `@defer` block when a condition becomes truthy.
#[derive(Debug, Clone)]
pub struct DeferWhenOp {
    /// The `Defer` op this condition applies to.
    pub defer: XrefId,
    pub expr: Expression,
    pub modifier: DeferOpModifierKind,
}

/// An expression in an i18n message.
#[derive(Debug, Clone)]
pub struct I18nExpressionOp {
    /// The i18n context that this expression belongs to.
    pub context: XrefId,
    /// The element the expression is attached to, or the i18n block for text expressions.
    pub target: XrefId,
    /// The i18n block or attribute configuration this expression is applied through.
    pub i18n_owner: XrefId,
    /// Slot of the owner, once resolved.
    pub handle: SlotHandle,
    pub expression: Expression,
    pub icu_placeholder: Option<XrefId>,
    pub i18n_placeholder: Option<String>,
    pub resolution_time: I18nParamResolutionTime,
    pub usage: I18nExpressionFor,
    /// Name of the attribute for attribute expressions, empty otherwise.
    pub name: String,
}

/// Applies the i18n expressions collected since the last apply.
#[derive(Debug, Clone)]
pub struct I18nApplyOp {
    /// The i18n block or attribute configuration the expressions apply to.
    pub owner: XrefId,
    pub handle: SlotHandle,
}

/// A binding to a native DOM property, used for host bindings and DOM-only templates.
#[derive(Debug, Clone)]
pub struct DomPropertyOp {
    pub name: String,
    pub expression: BindingExpression,
    pub binding_kind: BindingKind,
    pub i18n_context: Option<XrefId>,
    pub security_context: Vec<SecurityContext>,
    pub sanitizer: Option<Expression>,
}

/// Stores the current value of a `@let` declaration.
#[derive(Debug, Clone)]
pub struct StoreLetOp {
    /// The `DeclareLet` op.
    pub target: XrefId,
    pub declared_name: String,
    pub value: Expression,
}

/// Binds a form control through its `field` input.
#[derive(Debug, Clone)]
pub struct ControlOp {
    pub target: XrefId,
    pub name: String,
    pub expression: BindingExpression,
    pub security_context: Vec<SecurityContext>,
    pub sanitizer: Option<Expression>,
}

/// An `animate.enter` / `animate.leave` binding, before it is moved into the create list.
#[derive(Debug, Clone)]
pub struct AnimationBindingOp {
    pub target: XrefId,
    pub name: String,
    pub expression: BindingExpression,
}

/// A logical operation in the update list of a view, or in a handler body.
#[derive(Debug, Clone)]
pub enum UpdateOp {
    Statement(StatementOp),
    Variable(VariableOp),
    InterpolateText(InterpolateTextOp),
    Binding(BindingOp),
    Property(PropertyOp),
    TwoWayProperty(TwoWayPropertyOp),
    StyleProp(StylePropOp),
    ClassProp(ClassPropOp),
    StyleMap(MapBindingOp),
    ClassMap(MapBindingOp),
    Attribute(AttributeOp),
    Advance(AdvanceOp),
    Conditional(ConditionalOp),
    Repeater(RepeaterOp),
    DeferWhen(DeferWhenOp),
    I18nExpression(I18nExpressionOp),
    I18nApply(I18nApplyOp),
    DomProperty(DomPropertyOp),
    StoreLet(StoreLetOp),
    Control(ControlOp),
    AnimationBinding(AnimationBindingOp),
}

impl ExpressionHolder for UpdateOp {
    fn transform_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        UpdateOp::transform_expressions(self, transform, flags)
    }
}

impl Op for UpdateOp {
    fn kind(&self) -> OpKind {
        match self {
            UpdateOp::Statement(_) => OpKind::Statement,
            UpdateOp::Variable(_) => OpKind::Variable,
            UpdateOp::InterpolateText(_) => OpKind::InterpolateText,
            UpdateOp::Binding(_) => OpKind::Binding,
            UpdateOp::Property(_) => OpKind::Property,
            UpdateOp::TwoWayProperty(_) => OpKind::TwoWayProperty,
            UpdateOp::StyleProp(_) => OpKind::StyleProp,
            UpdateOp::ClassProp(_) => OpKind::ClassProp,
            UpdateOp::StyleMap(_) => OpKind::StyleMap,
            UpdateOp::ClassMap(_) => OpKind::ClassMap,
            UpdateOp::Attribute(_) => OpKind::Attribute,
            UpdateOp::Advance(_) => OpKind::Advance,
            UpdateOp::Conditional(_) => OpKind::Conditional,
            UpdateOp::Repeater(_) => OpKind::Repeater,
            UpdateOp::DeferWhen(_) => OpKind::DeferWhen,
            UpdateOp::I18nExpression(_) => OpKind::I18nExpression,
            UpdateOp::I18nApply(_) => OpKind::I18nApply,
            UpdateOp::DomProperty(_) => OpKind::DomProperty,
            UpdateOp::StoreLet(_) => OpKind::StoreLet,
            UpdateOp::Control(_) => OpKind::Control,
            UpdateOp::AnimationBinding(_) => OpKind::AnimationBinding,
        }
    }
}

macro_rules! depends_on_target {
    ($($ty:ty),*) => {
        $(impl DependsOnSlotContextOpTrait for $ty {
            fn target(&self) -> XrefId {
                self.target
            }
        })*
    };
}

depends_on_target!(
    InterpolateTextOp,
    PropertyOp,
    TwoWayPropertyOp,
    StylePropOp,
    ClassPropOp,
    MapBindingOp,
    AttributeOp,
    ConditionalOp,
    RepeaterOp,
    I18nExpressionOp,
    StoreLetOp,
    ControlOp
);

impl DependsOnSlotContextOpTrait for DeferWhenOp {
    fn target(&self) -> XrefId {
        self.defer
    }
}

impl UpdateOp {
    pub fn as_depends_on_slot_context(&self) -> Option<&dyn DependsOnSlotContextOpTrait> {
        match self {
            UpdateOp::InterpolateText(op) => Some(op),
            UpdateOp::Property(op) => Some(op),
            UpdateOp::TwoWayProperty(op) => Some(op),
            UpdateOp::StyleProp(op) => Some(op),
            UpdateOp::ClassProp(op) => Some(op),
            UpdateOp::StyleMap(op) | UpdateOp::ClassMap(op) => Some(op),
            UpdateOp::Attribute(op) => Some(op),
            UpdateOp::Conditional(op) => Some(op),
            UpdateOp::Repeater(op) => Some(op),
            UpdateOp::DeferWhen(op) => Some(op),
            UpdateOp::I18nExpression(op) => Some(op),
            UpdateOp::StoreLet(op) => Some(op),
            UpdateOp::Control(op) => Some(op),
            _ => None,
        }
    }

    /// Variable slots used by the op itself, not counting its expressions.
    pub fn vars_used(&self) -> usize {
        match self {
            // Attribute bindings use 1 slot, plus 1 per interpolated expression. A singleton
            // interpolation is stored as the plain value.
            UpdateOp::Attribute(op) => match &op.expression {
                BindingExpression::Interpolation(interp) if !interp.is_singleton() => {
                    1 + interp.expressions.len()
                }
                _ => 1,
            },
            // Even a singleton interpolation keeps both the raw and the stringified value.
            UpdateOp::Property(op) => 1 + op.expression.interpolation_len(),
            UpdateOp::DomProperty(op) => 1 + op.expression.interpolation_len(),
            UpdateOp::TwoWayProperty(_) => 1,
            UpdateOp::Control(_) => 2,
            UpdateOp::StyleProp(op) => 2 + op.expression.interpolation_len(),
            UpdateOp::ClassProp(_) => 2,
            UpdateOp::StyleMap(op) | UpdateOp::ClassMap(op) => {
                2 + op.expression.interpolation_len()
            }
            UpdateOp::InterpolateText(op) => op.interpolation.expressions.len(),
            UpdateOp::I18nExpression(_)
            | UpdateOp::Conditional(_)
            | UpdateOp::DeferWhen(_)
            | UpdateOp::StoreLet(_) => 1,
            _ => 0,
        }
    }

    /// Visit every expression held by this op, children before parents, without changing it.
    pub fn visit_expressions(&mut self, visitor: &mut dyn FnMut(&Expression, VisitorContextFlag)) {
        self.transform_expressions(
            &mut |expr, flags| {
                visitor(&expr, flags);
                expr
            },
            VisitorContextFlag::NONE,
        );
    }

    /// Run `transform` over every expression held by this op.
    pub fn transform_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        match self {
            UpdateOp::Statement(op) => {
                transform_expressions_in_statement(&mut op.statement, transform, flags)
            }
            UpdateOp::Variable(op) => transform_in_place(&mut op.initializer, transform, flags),
            UpdateOp::InterpolateText(op) => op.interpolation.transform(transform, flags),
            UpdateOp::Binding(op) => op.expression.transform(transform, flags),
            UpdateOp::Property(op) => {
                op.expression.transform(transform, flags);
                transform_sanitizer(&mut op.sanitizer, transform, flags);
            }
            UpdateOp::TwoWayProperty(op) => {
                transform_in_place(&mut op.expression, transform, flags);
                transform_sanitizer(&mut op.sanitizer, transform, flags);
            }
            UpdateOp::StyleProp(op) => op.expression.transform(transform, flags),
            UpdateOp::ClassProp(op) => transform_in_place(&mut op.expression, transform, flags),
            UpdateOp::StyleMap(op) | UpdateOp::ClassMap(op) => {
                op.expression.transform(transform, flags)
            }
            UpdateOp::Attribute(op) => {
                op.expression.transform(transform, flags);
                transform_sanitizer(&mut op.sanitizer, transform, flags);
            }
            UpdateOp::DomProperty(op) => {
                op.expression.transform(transform, flags);
                transform_sanitizer(&mut op.sanitizer, transform, flags);
            }
            UpdateOp::Control(op) => {
                op.expression.transform(transform, flags);
                transform_sanitizer(&mut op.sanitizer, transform, flags);
            }
            UpdateOp::Conditional(op) => {
                for condition in &mut op.conditions {
                    condition.transform_internal_expressions(transform, flags);
                }
                for expr in [&mut op.test, &mut op.processed, &mut op.context_value]
                    .into_iter()
                    .flatten()
                {
                    transform_in_place(expr, transform, flags);
                }
            }
            UpdateOp::Repeater(op) => transform_in_place(&mut op.collection, transform, flags),
            UpdateOp::DeferWhen(op) => transform_in_place(&mut op.expr, transform, flags),
            UpdateOp::I18nExpression(op) => {
                transform_in_place(&mut op.expression, transform, flags)
            }
            UpdateOp::StoreLet(op) => transform_in_place(&mut op.value, transform, flags),
            UpdateOp::AnimationBinding(op) => op.expression.transform(transform, flags),
            UpdateOp::Advance(_) | UpdateOp::I18nApply(_) => {}
        }
    }
}

fn transform_sanitizer(
    sanitizer: &mut Option<Expression>,
    transform: &mut ExpressionTransform<'_>,
    flags: VisitorContextFlag,
) {
    if let Some(sanitizer) = sanitizer {
        transform_in_place(sanitizer, transform, flags);
    }
}

// Constructors.

pub fn create_interpolate_text_op(target: XrefId, interpolation: Interpolation) -> UpdateOp {
    UpdateOp::InterpolateText(InterpolateTextOp {
        target,
        interpolation,
    })
}

pub fn create_binding_op(
    target: XrefId,
    kind: BindingKind,
    name: impl Into<String>,
    expression: impl Into<BindingExpression>,
    unit: Option<String>,
    security_context: Vec<SecurityContext>,
    is_text_attribute: bool,
) -> BindingOp {
    BindingOp {
        target,
        kind,
        name: name.into(),
        expression: expression.into(),
        unit,
        security_context,
        is_text_attribute,
        is_structural_template_attribute: false,
        template_kind: None,
        i18n_context: None,
        i18n_message: None,
    }
}

pub fn create_property_op(
    target: XrefId,
    name: impl Into<String>,
    expression: impl Into<BindingExpression>,
    binding_kind: BindingKind,
    security_context: Vec<SecurityContext>,
) -> PropertyOp {
    PropertyOp {
        target,
        name: name.into(),
        expression: expression.into(),
        binding_kind,
        security_context,
        sanitizer: None,
        is_structural_template_attribute: false,
        template_kind: None,
        i18n_context: None,
        i18n_message: None,
    }
}

pub fn create_attribute_op(
    target: XrefId,
    namespace: Option<String>,
    name: impl Into<String>,
    expression: impl Into<BindingExpression>,
    security_context: Vec<SecurityContext>,
    is_text_attribute: bool,
) -> AttributeOp {
    AttributeOp {
        target,
        namespace,
        name: name.into(),
        expression: expression.into(),
        security_context,
        sanitizer: None,
        is_text_attribute,
        is_structural_template_attribute: false,
        template_kind: None,
        i18n_context: None,
        i18n_message: None,
    }
}

pub fn create_advance_op(delta: usize) -> UpdateOp {
    UpdateOp::Advance(AdvanceOp { delta })
}

pub fn create_conditional_op(
    target: XrefId,
    test: Option<Expression>,
    conditions: Vec<ConditionalCaseExpr>,
) -> UpdateOp {
    UpdateOp::Conditional(ConditionalOp {
        target,
        test,
        conditions,
        processed: None,
        context_value: None,
    })
}

pub fn create_repeater_op(target: XrefId, target_slot: SlotHandle, collection: Expression) -> UpdateOp {
    UpdateOp::Repeater(RepeaterOp {
        target,
        target_slot,
        collection,
    })
}

pub fn create_defer_when_op(defer: XrefId, expr: Expression, modifier: DeferOpModifierKind) -> UpdateOp {
    UpdateOp::DeferWhen(DeferWhenOp {
        defer,
        expr,
        modifier,
    })
}

pub fn create_store_let_op(target: XrefId, declared_name: impl Into<String>, value: Expression) -> UpdateOp {
    UpdateOp::StoreLet(StoreLetOp {
        target,
        declared_name: declared_name.into(),
        value,
    })
}

pub fn create_i18n_apply_op(owner: XrefId, handle: SlotHandle) -> UpdateOp {
    UpdateOp::I18nApply(I18nApplyOp { owner, handle })
}
