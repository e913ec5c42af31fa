//! Create Operations
//!
//! Operations that run once, when a view is first created: element structure, listeners,
//! embedded view declarations, pipes, defer blocks and i18n blocks.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::core::SecurityContext;
use crate::i18n::i18n_ast::{I18nPlaceholder, Message, TagPlaceholder};
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::enums::{
    AnimationKind, BindingKind, DeferOpModifierKind, DeferTriggerKind, I18nContextKind,
    I18nParamValueFlags, Namespace, OpKind, TDeferDetailsFlags, TemplateKind,
};
use crate::template::pipeline::ir::expression::{
    transform_expressions_in_statement, transform_in_place, ExpressionTransform,
    VisitorContextFlag,
};
use crate::template::pipeline::ir::handle::{ConstIndex, SlotHandle, XrefId};
use crate::template::pipeline::ir::operations::{ListId, Op, OpList};
use crate::template::pipeline::ir::ops::shared::{StatementOp, VariableOp};
use crate::template::pipeline::ir::ops::update::{BindingExpression, UpdateOp};
use crate::template::pipeline::ir::traits::{ConsumesSlotOpTrait, ExpressionHolder};

/// A reference to a local variable declared on an element (`#ref="target"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRef {
    /// User-defined name of the local ref variable.
    pub name: String,
    /// Target of the local reference variable (often `""`).
    pub target: String,
}

/// Fields shared by every operation that creates an element-like node: elements, containers,
/// templates and repeaters.
#[derive(Debug, Clone)]
pub struct ElementOpBase {
    /// `XrefId` allocated for this element.
    pub xref: XrefId,
    pub handle: SlotHandle,
    /// The HTML tag name, if any.
    pub tag: Option<String>,
    pub namespace: Namespace,
    /// Index of the attribute array in the consts array, once collected.
    pub attributes: Option<ConstIndex>,
    /// Local references declared on this element. Emptied once lifted into the consts array.
    pub local_refs: Vec<LocalRef>,
    pub local_refs_index: Option<ConstIndex>,
    /// Whether this element was marked `ngNonBindable`.
    pub non_bindable: bool,
    /// One for the element itself, plus one per lifted local ref.
    pub num_slots_used: usize,
}

impl ElementOpBase {
    pub fn new(xref: XrefId, tag: Option<String>, namespace: Namespace) -> Self {
        ElementOpBase {
            xref,
            handle: SlotHandle::new(),
            tag,
            namespace,
            attributes: None,
            local_refs: Vec::new(),
            local_refs_index: None,
            non_bindable: false,
            num_slots_used: 1,
        }
    }
}

impl ConsumesSlotOpTrait for ElementOpBase {
    fn handle(&self) -> &SlotHandle {
        &self.handle
    }

    fn num_slots_used(&self) -> usize {
        self.num_slots_used
    }

    fn xref(&self) -> XrefId {
        self.xref
    }
}

/// Element or `ng-container` creation: used by `ElementStart`, `Element`, `ContainerStart` and
/// `Container`.
#[derive(Debug, Clone)]
pub struct ElementOp {
    pub base: ElementOpBase,
    pub i18n_placeholder: Option<TagPlaceholder>,
}

/// Closes an element or container started with `ElementStart` / `ContainerStart`.
#[derive(Debug, Clone)]
pub struct ElementEndOp {
    /// The `XrefId` of the element declared via `ElementStart`.
    pub xref: XrefId,
}

/// Declares an embedded view: `ng-template`, a structural directive, or a control flow branch.
#[derive(Debug)]
pub struct TemplateOp {
    pub base: ElementOpBase,
    pub template_kind: TemplateKind,
    /// Number of declaration slots used by the embedded view. Set by slot allocation.
    pub decls: Option<usize>,
    /// Number of binding slots used by the embedded view. Set by variable counting.
    pub vars: Option<usize>,
    /// Suffix added to the generated template function name.
    pub fn_name_suffix: String,
    pub i18n_placeholder: Option<I18nPlaceholder>,
}

/// Disables or re-enables bindings for the subtree of a `ngNonBindable` element.
#[derive(Debug, Clone)]
pub struct BindingsToggleOp {
    /// `XrefId` of the element that was marked non-bindable.
    pub xref: XrefId,
}

/// Creates a static text node.
#[derive(Debug, Clone)]
pub struct TextOp {
    pub xref: XrefId,
    pub handle: SlotHandle,
    /// The static initial value of the text node.
    pub initial_value: String,
}

impl ConsumesSlotOpTrait for TextOp {
    fn handle(&self) -> &SlotHandle {
        &self.handle
    }

    fn xref(&self) -> XrefId {
        self.xref
    }
}

/// An event listener attached to an element, or to the host.
#[derive(Debug)]
pub struct ListenerOp {
    /// The element this listener is attached to.
    pub target: XrefId,
    pub target_slot: SlotHandle,
    /// The tag of the target element, used by event target resolution.
    pub tag: Option<String>,
    /// Whether this listener is from a host binding.
    pub host_listener: bool,
    /// Name of the event which is being listened to.
    pub name: String,
    /// The body of the handler function. Ends in a `return` statement once resolved.
    pub handler_ops: OpList<UpdateOp>,
    pub handler_fn_name: Option<String>,
    /// Whether the handler reads `$event`.
    pub consumes_dollar_event: bool,
    /// Set for `(animate.enter)` / `(animate.leave)` listeners.
    pub animation_kind: Option<AnimationKind>,
    /// Global target for the event, e.g. `window` or `document`.
    pub event_target: Option<String>,
}

/// The event half of a two-way binding.
#[derive(Debug)]
pub struct TwoWayListenerOp {
    pub target: XrefId,
    pub target_slot: SlotHandle,
    pub tag: Option<String>,
    /// Name of the event which is being listened to.
    pub name: String,
    pub handler_ops: OpList<UpdateOp>,
    pub handler_fn_name: Option<String>,
}

/// An `animate.enter` / `animate.leave` binding whose class list is computed by a callback.
#[derive(Debug)]
pub struct AnimationOp {
    pub target: XrefId,
    pub target_slot: SlotHandle,
    pub name: String,
    pub kind: AnimationKind,
    pub handler_ops: OpList<UpdateOp>,
    pub handler_fn_name: Option<String>,
    pub security_context: Vec<SecurityContext>,
    pub sanitizer: Option<Expression>,
}

/// An `animate.enter` / `animate.leave` binding with a static class string.
#[derive(Debug, Clone)]
pub struct AnimationStringOp {
    pub target: XrefId,
    pub name: String,
    pub kind: AnimationKind,
    /// A string literal, or an interpolation producing the class string.
    pub expression: BindingExpression,
}

/// Instantiates a pipe.
#[derive(Debug, Clone)]
pub struct PipeOp {
    pub xref: XrefId,
    pub handle: SlotHandle,
    pub name: String,
}

impl ConsumesSlotOpTrait for PipeOp {
    fn handle(&self) -> &SlotHandle {
        &self.handle
    }

    fn xref(&self) -> XrefId {
        self.xref
    }
}

/// Represents an attribute that has been extracted for inclusion in the consts array.
#[derive(Debug, Clone)]
pub struct ExtractedAttributeOp {
    /// The `XrefId` of the template-like element the extracted attribute will belong to.
    pub target: XrefId,
    /// The kind of binding represented by this extracted attribute.
    pub binding_kind: BindingKind,
    pub namespace: Option<String>,
    pub name: String,
    /// The value expression of the extracted attribute.
    pub expression: Option<Expression>,
    /// If this attribute has a corresponding i18n attribute, the xref of its context.
    pub i18n_context: Option<XrefId>,
    pub i18n_message: Option<Arc<Message>>,
    pub security_context: Vec<SecurityContext>,
    /// The trusted value function to use for the constant value.
    pub trusted_value_fn: Option<Expression>,
}

/// The target of a `hover`, `interaction` or `viewport` trigger, resolved from a local ref name.
#[derive(Debug, Clone, Default)]
pub struct DeferTriggerTarget {
    /// The local ref name written in the template. `None` means the placeholder's root element.
    pub target_name: Option<String>,
    /// The element the trigger listens on, once resolved.
    pub target_xref: Option<XrefId>,
    /// The view containing the target element.
    pub target_view: Option<XrefId>,
    pub target_slot: Option<SlotHandle>,
    /// Number of view levels between the defer block and the target. Negative when the target is
    /// inside the placeholder view.
    pub target_slot_view_steps: Option<isize>,
}

impl DeferTriggerTarget {
    pub fn named(name: impl Into<String>) -> Self {
        DeferTriggerTarget {
            target_name: Some(name.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub enum DeferTrigger {
    Idle,
    Immediate,
    Never,
    Timer { delay: f64 },
    Hover(DeferTriggerTarget),
    Interaction(DeferTriggerTarget),
    Viewport {
        target: DeferTriggerTarget,
        options: Option<Expression>,
    },
}

impl DeferTrigger {
    pub fn kind(&self) -> DeferTriggerKind {
        match self {
            DeferTrigger::Idle => DeferTriggerKind::Idle,
            DeferTrigger::Immediate => DeferTriggerKind::Immediate,
            DeferTrigger::Never => DeferTriggerKind::Never,
            DeferTrigger::Timer { .. } => DeferTriggerKind::Timer,
            DeferTrigger::Hover(_) => DeferTriggerKind::Hover,
            DeferTrigger::Interaction(_) => DeferTriggerKind::Interaction,
            DeferTrigger::Viewport { .. } => DeferTriggerKind::Viewport,
        }
    }

    pub fn target(&self) -> Option<&DeferTriggerTarget> {
        match self {
            DeferTrigger::Hover(target)
            | DeferTrigger::Interaction(target)
            | DeferTrigger::Viewport { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn target_mut(&mut self) -> Option<&mut DeferTriggerTarget> {
        match self {
            DeferTrigger::Hover(target)
            | DeferTrigger::Interaction(target)
            | DeferTrigger::Viewport { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Configures a `@defer` block and its secondary views.
#[derive(Debug, Clone)]
pub struct DeferOp {
    pub xref: XrefId,
    pub handle: SlotHandle,
    /// The view rendered once the dependencies are loaded.
    pub main_view: XrefId,
    pub main_slot: SlotHandle,
    pub loading_view: Option<XrefId>,
    pub loading_slot: Option<SlotHandle>,
    pub placeholder_view: Option<XrefId>,
    pub placeholder_slot: Option<SlotHandle>,
    pub error_view: Option<XrefId>,
    pub error_slot: Option<SlotHandle>,
    pub placeholder_minimum_time: Option<f64>,
    pub loading_minimum_time: Option<f64>,
    pub loading_after_time: Option<f64>,
    pub placeholder_config: Option<Expression>,
    pub loading_config: Option<Expression>,
    /// Dependency resolver function supplied by the caller for this block.
    pub own_resolver_fn: Option<Expression>,
    /// Resolver function actually passed to the runtime.
    pub resolver_fn: Option<Expression>,
    pub flags: TDeferDetailsFlags,
}

impl ConsumesSlotOpTrait for DeferOp {
    fn handle(&self) -> &SlotHandle {
        &self.handle
    }

    /// The block itself plus its runtime details.
    fn num_slots_used(&self) -> usize {
        2
    }

    fn xref(&self) -> XrefId {
        self.xref
    }
}

/// A trigger controlling when a `@defer` block loads.
#[derive(Debug, Clone)]
pub struct DeferOnOp {
    pub defer: XrefId,
    pub trigger: DeferTrigger,
    pub modifier: DeferOpModifierKind,
}

/// The value of one i18n parameter, before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum I18nValue {
    Slot(usize),
    String(String),
    /// An element and a template sharing one placeholder (structural directive on an element).
    Compound { element: usize, template: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct I18nParamValue {
    pub value: I18nValue,
    /// The sub-template index associated with the value.
    pub sub_template_index: Option<usize>,
    pub flags: I18nParamValueFlags,
}

/// An i18n message that has been extracted for inclusion in the consts array.
#[derive(Debug, Clone)]
pub struct I18nMessageOp {
    pub xref: XrefId,
    /// The i18n context this message was generated from.
    pub i18n_context: XrefId,
    /// The owning i18n block, if any.
    pub i18n_block: Option<XrefId>,
    pub message: Arc<Message>,
    /// Placeholder used to reference this message in its parent message, for ICU sub-messages.
    pub message_placeholder: Option<String>,
    /// Parameters resolved at message creation time.
    pub params: IndexMap<String, Expression>,
    /// Parameters resolved during post-processing.
    pub postprocessing_params: IndexMap<String, Expression>,
    pub needs_postprocessing: bool,
    /// Messages combined into this one.
    pub sub_messages: Vec<XrefId>,
}

/// Switches the active namespace for subsequent elements.
#[derive(Debug, Clone)]
pub struct NamespaceOp {
    pub active: Namespace,
}

/// Declares the content projection slots of a component.
#[derive(Debug, Clone)]
pub struct ProjectionDefOp {
    /// The parsed selector information, or `None` for the default slot only.
    pub def: Option<Expression>,
}

/// Creates a content projection slot (`<ng-content>`).
#[derive(Debug, Clone)]
pub struct ProjectionOp {
    pub xref: XrefId,
    pub handle: SlotHandle,
    pub projection_slot_index: usize,
    pub attributes: Option<Expression>,
    pub selector: String,
    pub fallback_view: Option<XrefId>,
    pub i18n_placeholder: Option<TagPlaceholder>,
    pub fallback_i18n_placeholder: Option<I18nPlaceholder>,
}

impl ConsumesSlotOpTrait for ProjectionOp {
    fn handle(&self) -> &SlotHandle {
        &self.handle
    }

    fn num_slots_used(&self) -> usize {
        if self.fallback_view.is_some() {
            2
        } else {
            1
        }
    }

    fn xref(&self) -> XrefId {
        self.xref
    }
}

/// The names a `@for` block exposes for its implicit context variables.
#[derive(Debug, Clone, Default)]
pub struct RepeaterVarNames {
    /// Every alias of `$index` (the index itself plus user aliases).
    pub dollar_index: IndexSet<String>,
    /// The name of the loop item.
    pub dollar_implicit: String,
}

/// Creates a `@for` repeater with its template and optional `@empty` view.
#[derive(Debug)]
pub struct RepeaterCreateOp {
    pub base: ElementOpBase,
    pub decls: Option<usize>,
    pub vars: Option<usize>,
    pub empty_view: Option<XrefId>,
    /// The track expression, read against the repeated item.
    pub track: Expression,
    /// Ops for a track function that needs a full body, once generated.
    pub track_by_ops: Option<OpList<UpdateOp>>,
    /// The resolved track function, once generated.
    pub track_by_fn: Option<Expression>,
    pub var_names: RepeaterVarNames,
    /// Whether the track function reads the component instance.
    pub uses_component_instance: bool,
    pub fn_name_suffix: String,
    pub empty_tag: Option<String>,
    pub empty_attributes: Option<ConstIndex>,
    pub i18n_placeholder: Option<I18nPlaceholder>,
    pub empty_i18n_placeholder: Option<I18nPlaceholder>,
}

/// Initializes the slot of a `@let` declaration.
#[derive(Debug, Clone)]
pub struct DeclareLetOp {
    pub xref: XrefId,
    pub handle: SlotHandle,
    pub declared_name: String,
}

impl ConsumesSlotOpTrait for DeclareLetOp {
    fn handle(&self) -> &SlotHandle {
        &self.handle
    }

    fn xref(&self) -> XrefId {
        self.xref
    }
}

/// Start of an i18n block (`I18nStart`), or a self-contained i18n element (`I18n`).
#[derive(Debug, Clone)]
pub struct I18nOp {
    pub xref: XrefId,
    pub handle: SlotHandle,
    /// The root i18n block this one belongs to. Equals `xref` for a root block.
    pub root: XrefId,
    pub message: Arc<Message>,
    /// Index of the message in the consts array, once collected.
    pub message_index: Option<ConstIndex>,
    /// The index of this sub-block in the i18n template of its root.
    pub sub_template_index: Option<usize>,
    /// The i18n context generated from this block.
    pub context: Option<XrefId>,
}

impl ConsumesSlotOpTrait for I18nOp {
    fn handle(&self) -> &SlotHandle {
        &self.handle
    }

    fn xref(&self) -> XrefId {
        self.xref
    }
}

#[derive(Debug, Clone)]
pub struct I18nEndOp {
    /// The `XrefId` of the `I18nStart` this op closes.
    pub xref: XrefId,
}

/// The start of an ICU expression.
#[derive(Debug, Clone)]
pub struct IcuStartOp {
    pub xref: XrefId,
    pub message: Arc<Message>,
    /// Placeholder used to reference this ICU in its parent message.
    pub message_placeholder: String,
    pub context: Option<XrefId>,
}

#[derive(Debug, Clone)]
pub struct IcuEndOp {
    pub xref: XrefId,
}

/// Everything needed to generate one i18n message: the message itself and its accumulated
/// parameter values.
#[derive(Debug, Clone)]
pub struct I18nContextOp {
    pub context_kind: I18nContextKind,
    pub xref: XrefId,
    /// The i18n block this context belongs to. `None` for attribute contexts.
    pub i18n_block: Option<XrefId>,
    pub message: Arc<Message>,
    pub params: IndexMap<String, Vec<I18nParamValue>>,
    pub postprocessing_params: IndexMap<String, Vec<I18nParamValue>>,
}

/// Configures the i18n attributes of one element. Reified as `i18nAttributes`, which reads its
/// config from the consts array.
#[derive(Debug, Clone)]
pub struct I18nAttributesOp {
    pub xref: XrefId,
    pub handle: SlotHandle,
    /// The element whose attributes are translated.
    pub target: XrefId,
    /// Alternating attribute names and message variables, once collected into the consts.
    pub i18n_attributes_config: Option<ConstIndex>,
}

impl ConsumesSlotOpTrait for I18nAttributesOp {
    fn handle(&self) -> &SlotHandle {
        &self.handle
    }

    fn xref(&self) -> XrefId {
        self.xref
    }
}

/// Creation-time setup of a form control bound through `[field]`.
#[derive(Debug, Clone)]
pub struct ControlCreateOp {
    /// The element carrying the control binding.
    pub target: XrefId,
}

/// A logical operation in the creation list of a view.
#[derive(Debug)]
pub enum CreateOp {
    Statement(StatementOp),
    Variable(VariableOp),
    ElementStart(ElementOp),
    Element(ElementOp),
    ElementEnd(ElementEndOp),
    ContainerStart(ElementOp),
    Container(ElementOp),
    ContainerEnd(ElementEndOp),
    Template(TemplateOp),
    ConditionalCreate(TemplateOp),
    ConditionalBranchCreate(TemplateOp),
    DisableBindings(BindingsToggleOp),
    EnableBindings(BindingsToggleOp),
    Text(TextOp),
    Listener(ListenerOp),
    TwoWayListener(TwoWayListenerOp),
    Animation(AnimationOp),
    AnimationString(AnimationStringOp),
    Pipe(PipeOp),
    ExtractedAttribute(ExtractedAttributeOp),
    Defer(DeferOp),
    DeferOn(DeferOnOp),
    I18nMessage(I18nMessageOp),
    Namespace(NamespaceOp),
    ProjectionDef(ProjectionDefOp),
    Projection(ProjectionOp),
    RepeaterCreate(RepeaterCreateOp),
    DeclareLet(DeclareLetOp),
    I18nStart(I18nOp),
    I18n(I18nOp),
    I18nEnd(I18nEndOp),
    IcuStart(IcuStartOp),
    IcuEnd(IcuEndOp),
    I18nContext(I18nContextOp),
    I18nAttributes(I18nAttributesOp),
    ControlCreate(ControlCreateOp),
}

impl ExpressionHolder for CreateOp {
    fn transform_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        CreateOp::transform_expressions(self, transform, flags)
    }
}

impl Op for CreateOp {
    fn kind(&self) -> OpKind {
        match self {
            CreateOp::Statement(_) => OpKind::Statement,
            CreateOp::Variable(_) => OpKind::Variable,
            CreateOp::ElementStart(_) => OpKind::ElementStart,
            CreateOp::Element(_) => OpKind::Element,
            CreateOp::ElementEnd(_) => OpKind::ElementEnd,
            CreateOp::ContainerStart(_) => OpKind::ContainerStart,
            CreateOp::Container(_) => OpKind::Container,
            CreateOp::ContainerEnd(_) => OpKind::ContainerEnd,
            CreateOp::Template(_) => OpKind::Template,
            CreateOp::ConditionalCreate(_) => OpKind::ConditionalCreate,
            CreateOp::ConditionalBranchCreate(_) => OpKind::ConditionalBranchCreate,
            CreateOp::DisableBindings(_) => OpKind::DisableBindings,
            CreateOp::EnableBindings(_) => OpKind::EnableBindings,
            CreateOp::Text(_) => OpKind::Text,
            CreateOp::Listener(_) => OpKind::Listener,
            CreateOp::TwoWayListener(_) => OpKind::TwoWayListener,
            CreateOp::Animation(_) => OpKind::Animation,
            CreateOp::AnimationString(_) => OpKind::AnimationString,
            CreateOp::Pipe(_) => OpKind::Pipe,
            CreateOp::ExtractedAttribute(_) => OpKind::ExtractedAttribute,
            CreateOp::Defer(_) => OpKind::Defer,
            CreateOp::DeferOn(_) => OpKind::DeferOn,
            CreateOp::I18nMessage(_) => OpKind::I18nMessage,
            CreateOp::Namespace(_) => OpKind::Namespace,
            CreateOp::ProjectionDef(_) => OpKind::ProjectionDef,
            CreateOp::Projection(_) => OpKind::Projection,
            CreateOp::RepeaterCreate(_) => OpKind::RepeaterCreate,
            CreateOp::DeclareLet(_) => OpKind::DeclareLet,
            CreateOp::I18nStart(_) => OpKind::I18nStart,
            CreateOp::I18n(_) => OpKind::I18n,
            CreateOp::I18nEnd(_) => OpKind::I18nEnd,
            CreateOp::IcuStart(_) => OpKind::IcuStart,
            CreateOp::IcuEnd(_) => OpKind::IcuEnd,
            CreateOp::I18nContext(_) => OpKind::I18nContext,
            CreateOp::I18nAttributes(_) => OpKind::I18nAttributes,
            CreateOp::ControlCreate(_) => OpKind::ControlCreate,
        }
    }
}

impl CreateOp {
    /// The `XrefId` this op declares, for kinds that declare one.
    pub fn xref(&self) -> Option<XrefId> {
        match self {
            CreateOp::Variable(op) => Some(op.xref),
            CreateOp::ElementEnd(op) | CreateOp::ContainerEnd(op) => Some(op.xref),
            CreateOp::DisableBindings(op) | CreateOp::EnableBindings(op) => Some(op.xref),
            CreateOp::Text(op) => Some(op.xref),
            CreateOp::Pipe(op) => Some(op.xref),
            CreateOp::Defer(op) => Some(op.xref),
            CreateOp::I18nMessage(op) => Some(op.xref),
            CreateOp::Projection(op) => Some(op.xref),
            CreateOp::DeclareLet(op) => Some(op.xref),
            CreateOp::I18nStart(op) | CreateOp::I18n(op) => Some(op.xref),
            CreateOp::I18nEnd(op) => Some(op.xref),
            CreateOp::IcuStart(op) => Some(op.xref),
            CreateOp::IcuEnd(op) => Some(op.xref),
            CreateOp::I18nContext(op) => Some(op.xref),
            CreateOp::I18nAttributes(op) => Some(op.xref),
            other => other.element_base().map(|base| base.xref),
        }
    }

    /// Whether this op creates an element-like node that attributes and bindings can target.
    pub fn is_element_or_container(&self) -> bool {
        self.element_base().is_some()
    }

    pub fn element_base(&self) -> Option<&ElementOpBase> {
        match self {
            CreateOp::ElementStart(op)
            | CreateOp::Element(op)
            | CreateOp::ContainerStart(op)
            | CreateOp::Container(op) => Some(&op.base),
            CreateOp::Template(op)
            | CreateOp::ConditionalCreate(op)
            | CreateOp::ConditionalBranchCreate(op) => Some(&op.base),
            CreateOp::RepeaterCreate(op) => Some(&op.base),
            _ => None,
        }
    }

    pub fn element_base_mut(&mut self) -> Option<&mut ElementOpBase> {
        match self {
            CreateOp::ElementStart(op)
            | CreateOp::Element(op)
            | CreateOp::ContainerStart(op)
            | CreateOp::Container(op) => Some(&mut op.base),
            CreateOp::Template(op)
            | CreateOp::ConditionalCreate(op)
            | CreateOp::ConditionalBranchCreate(op) => Some(&mut op.base),
            CreateOp::RepeaterCreate(op) => Some(&mut op.base),
            _ => None,
        }
    }

    /// The template-like op for `Template`, `ConditionalCreate` and `ConditionalBranchCreate`.
    pub fn as_template(&self) -> Option<&TemplateOp> {
        match self {
            CreateOp::Template(op)
            | CreateOp::ConditionalCreate(op)
            | CreateOp::ConditionalBranchCreate(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_template_mut(&mut self) -> Option<&mut TemplateOp> {
        match self {
            CreateOp::Template(op)
            | CreateOp::ConditionalCreate(op)
            | CreateOp::ConditionalBranchCreate(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_consumes_slot(&self) -> Option<&dyn ConsumesSlotOpTrait> {
        match self {
            CreateOp::Text(op) => Some(op),
            CreateOp::Pipe(op) => Some(op),
            CreateOp::Defer(op) => Some(op),
            CreateOp::Projection(op) => Some(op),
            CreateOp::DeclareLet(op) => Some(op),
            CreateOp::I18nStart(op) | CreateOp::I18n(op) => Some(op),
            CreateOp::I18nAttributes(op) => Some(op),
            other => other
                .element_base()
                .map(|base| base as &dyn ConsumesSlotOpTrait),
        }
    }

    /// Variable slots used by the op itself. Only a repeater with an `@empty` view uses one.
    pub fn vars_used(&self) -> usize {
        match self {
            CreateOp::RepeaterCreate(op) if op.empty_view.is_some() => 1,
            _ => 0,
        }
    }

    /// The nested handler body of listener-like ops.
    pub fn handler_ops_mut(&mut self) -> Option<&mut OpList<UpdateOp>> {
        match self {
            CreateOp::Listener(op) => Some(&mut op.handler_ops),
            CreateOp::TwoWayListener(op) => Some(&mut op.handler_ops),
            CreateOp::Animation(op) => Some(&mut op.handler_ops),
            _ => None,
        }
    }

    pub fn handler_ops(&self) -> Option<&OpList<UpdateOp>> {
        match self {
            CreateOp::Listener(op) => Some(&op.handler_ops),
            CreateOp::TwoWayListener(op) => Some(&op.handler_ops),
            CreateOp::Animation(op) => Some(&op.handler_ops),
            _ => None,
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

    /// Run `transform` over every expression held by this op, including those in nested handler
    /// and track function bodies, which are visited with `IN_CHILD_OPERATION`. Once a track
    /// function body exists, the original `track` expression is no longer visited.
    pub fn transform_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    ) {
        let child = flags | VisitorContextFlag::IN_CHILD_OPERATION;
        match self {
            CreateOp::Statement(op) => {
                transform_expressions_in_statement(&mut op.statement, transform, flags)
            }
            CreateOp::Variable(op) => transform_in_place(&mut op.initializer, transform, flags),
            CreateOp::Listener(ListenerOp { handler_ops, .. })
            | CreateOp::TwoWayListener(TwoWayListenerOp { handler_ops, .. }) => {
                for inner in handler_ops.iter_mut() {
                    inner.transform_expressions(transform, child);
                }
            }
            CreateOp::Animation(op) => {
                for inner in op.handler_ops.iter_mut() {
                    inner.transform_expressions(transform, child);
                }
                if let Some(sanitizer) = &mut op.sanitizer {
                    transform_in_place(sanitizer, transform, flags);
                }
            }
            CreateOp::AnimationString(op) => op.expression.transform(transform, flags),
            CreateOp::ExtractedAttribute(op) => {
                if let Some(expr) = &mut op.expression {
                    transform_in_place(expr, transform, flags);
                }
                if let Some(trusted) = &mut op.trusted_value_fn {
                    transform_in_place(trusted, transform, flags);
                }
            }
            CreateOp::RepeaterCreate(op) => {
                match &mut op.track_by_ops {
                    Some(track_by_ops) => {
                        for inner in track_by_ops.iter_mut() {
                            inner.transform_expressions(transform, child);
                        }
                    }
                    None => transform_in_place(&mut op.track, transform, flags),
                }
                if let Some(track_by_fn) = &mut op.track_by_fn {
                    transform_in_place(track_by_fn, transform, flags);
                }
            }
            CreateOp::Defer(op) => {
                for expr in [
                    &mut op.loading_config,
                    &mut op.placeholder_config,
                    &mut op.resolver_fn,
                ]
                .into_iter()
                .flatten()
                {
                    transform_in_place(expr, transform, flags);
                }
            }
            CreateOp::DeferOn(op) => {
                if let DeferTrigger::Viewport {
                    options: Some(options),
                    ..
                } = &mut op.trigger
                {
                    transform_in_place(options, transform, flags);
                }
            }
            CreateOp::I18nMessage(op) => {
                for value in op.params.values_mut() {
                    transform_in_place(value, transform, flags);
                }
                for value in op.postprocessing_params.values_mut() {
                    transform_in_place(value, transform, flags);
                }
            }
            CreateOp::ElementStart(_)
            | CreateOp::Element(_)
            | CreateOp::ElementEnd(_)
            | CreateOp::ContainerStart(_)
            | CreateOp::Container(_)
            | CreateOp::ContainerEnd(_)
            | CreateOp::Template(_)
            | CreateOp::ConditionalCreate(_)
            | CreateOp::ConditionalBranchCreate(_)
            | CreateOp::DisableBindings(_)
            | CreateOp::EnableBindings(_)
            | CreateOp::Text(_)
            | CreateOp::Pipe(_)
            | CreateOp::Namespace(_)
            | CreateOp::ProjectionDef(_)
            | CreateOp::Projection(_)
            | CreateOp::DeclareLet(_)
            | CreateOp::I18nStart(_)
            | CreateOp::I18n(_)
            | CreateOp::I18nEnd(_)
            | CreateOp::IcuStart(_)
            | CreateOp::IcuEnd(_)
            | CreateOp::I18nContext(_)
            | CreateOp::I18nAttributes(_)
            | CreateOp::ControlCreate(_) => {}
        }
    }
}

// Constructors.

pub fn create_element_start_op(
    tag: impl Into<String>,
    xref: XrefId,
    namespace: Namespace,
    i18n_placeholder: Option<TagPlaceholder>,
) -> CreateOp {
    CreateOp::ElementStart(ElementOp {
        base: ElementOpBase::new(xref, Some(tag.into()), namespace),
        i18n_placeholder,
    })
}

pub fn create_element_end_op(xref: XrefId) -> CreateOp {
    CreateOp::ElementEnd(ElementEndOp { xref })
}

pub fn create_container_start_op(xref: XrefId, i18n_placeholder: Option<TagPlaceholder>) -> CreateOp {
    CreateOp::ContainerStart(ElementOp {
        base: ElementOpBase::new(xref, None, Namespace::HTML),
        i18n_placeholder,
    })
}

pub fn create_container_end_op(xref: XrefId) -> CreateOp {
    CreateOp::ContainerEnd(ElementEndOp { xref })
}

pub fn create_template_op(
    xref: XrefId,
    template_kind: TemplateKind,
    tag: Option<String>,
    fn_name_suffix: impl Into<String>,
    namespace: Namespace,
    i18n_placeholder: Option<I18nPlaceholder>,
) -> CreateOp {
    CreateOp::Template(TemplateOp {
        base: ElementOpBase::new(xref, tag, namespace),
        template_kind,
        decls: None,
        vars: None,
        fn_name_suffix: fn_name_suffix.into(),
        i18n_placeholder,
    })
}

/// The first branch of an `@if` / `@switch` block.
pub fn create_conditional_create_op(
    xref: XrefId,
    tag: Option<String>,
    fn_name_suffix: impl Into<String>,
    i18n_placeholder: Option<I18nPlaceholder>,
) -> CreateOp {
    CreateOp::ConditionalCreate(TemplateOp {
        base: ElementOpBase::new(xref, tag, Namespace::HTML),
        template_kind: TemplateKind::Block,
        decls: None,
        vars: None,
        fn_name_suffix: fn_name_suffix.into(),
        i18n_placeholder,
    })
}

/// Every branch of an `@if` / `@switch` block after the first.
pub fn create_conditional_branch_create_op(
    xref: XrefId,
    tag: Option<String>,
    fn_name_suffix: impl Into<String>,
    i18n_placeholder: Option<I18nPlaceholder>,
) -> CreateOp {
    CreateOp::ConditionalBranchCreate(TemplateOp {
        base: ElementOpBase::new(xref, tag, Namespace::HTML),
        template_kind: TemplateKind::Block,
        decls: None,
        vars: None,
        fn_name_suffix: fn_name_suffix.into(),
        i18n_placeholder,
    })
}

pub fn create_text_op(xref: XrefId, initial_value: impl Into<String>) -> CreateOp {
    CreateOp::Text(TextOp {
        xref,
        handle: SlotHandle::new(),
        initial_value: initial_value.into(),
    })
}

pub fn create_listener_op(
    target: XrefId,
    target_slot: SlotHandle,
    name: impl Into<String>,
    tag: Option<String>,
    handler_ops: Vec<UpdateOp>,
    host_listener: bool,
    handler_list: ListId,
) -> ListenerOp {
    let mut list = OpList::new(handler_list);
    list.push_all(handler_ops);
    ListenerOp {
        target,
        target_slot,
        tag,
        host_listener,
        name: name.into(),
        handler_ops: list,
        handler_fn_name: None,
        consumes_dollar_event: false,
        animation_kind: None,
        event_target: None,
    }
}

pub fn create_two_way_listener_op(
    target: XrefId,
    target_slot: SlotHandle,
    name: impl Into<String>,
    tag: Option<String>,
    handler_ops: Vec<UpdateOp>,
    handler_list: ListId,
) -> CreateOp {
    let mut list = OpList::new(handler_list);
    list.push_all(handler_ops);
    CreateOp::TwoWayListener(TwoWayListenerOp {
        target,
        target_slot,
        tag,
        name: name.into(),
        handler_ops: list,
        handler_fn_name: None,
    })
}

pub fn create_pipe_op(xref: XrefId, handle: SlotHandle, name: impl Into<String>) -> CreateOp {
    CreateOp::Pipe(PipeOp {
        xref,
        handle,
        name: name.into(),
    })
}

pub fn create_extracted_attribute_op(
    target: XrefId,
    binding_kind: BindingKind,
    namespace: Option<String>,
    name: impl Into<String>,
    expression: Option<Expression>,
    security_context: Vec<SecurityContext>,
) -> ExtractedAttributeOp {
    ExtractedAttributeOp {
        target,
        binding_kind,
        namespace,
        name: name.into(),
        expression,
        i18n_context: None,
        i18n_message: None,
        security_context,
        trusted_value_fn: None,
    }
}

pub fn create_defer_op(
    xref: XrefId,
    main_view: XrefId,
    main_slot: SlotHandle,
    own_resolver_fn: Option<Expression>,
) -> DeferOp {
    DeferOp {
        xref,
        handle: SlotHandle::new(),
        main_view,
        main_slot,
        loading_view: None,
        loading_slot: None,
        placeholder_view: None,
        placeholder_slot: None,
        error_view: None,
        error_slot: None,
        placeholder_minimum_time: None,
        loading_minimum_time: None,
        loading_after_time: None,
        placeholder_config: None,
        loading_config: None,
        own_resolver_fn,
        resolver_fn: None,
        flags: TDeferDetailsFlags::DEFAULT,
    }
}

pub fn create_defer_on_op(
    defer: XrefId,
    trigger: DeferTrigger,
    modifier: DeferOpModifierKind,
) -> CreateOp {
    CreateOp::DeferOn(DeferOnOp {
        defer,
        trigger,
        modifier,
    })
}

pub fn create_projection_op(
    xref: XrefId,
    selector: impl Into<String>,
    i18n_placeholder: Option<TagPlaceholder>,
    fallback_view: Option<XrefId>,
) -> CreateOp {
    CreateOp::Projection(ProjectionOp {
        xref,
        handle: SlotHandle::new(),
        projection_slot_index: 0,
        attributes: None,
        selector: selector.into(),
        fallback_view,
        i18n_placeholder,
        fallback_i18n_placeholder: None,
    })
}

pub fn create_repeater_create_op(
    primary_view: XrefId,
    empty_view: Option<XrefId>,
    tag: Option<String>,
    track: Expression,
    var_names: RepeaterVarNames,
    empty_tag: Option<String>,
) -> CreateOp {
    let mut base = ElementOpBase::new(primary_view, tag, Namespace::HTML);
    base.num_slots_used = if empty_view.is_some() { 3 } else { 2 };
    CreateOp::RepeaterCreate(RepeaterCreateOp {
        base,
        decls: None,
        vars: None,
        empty_view,
        track,
        track_by_ops: None,
        track_by_fn: None,
        var_names,
        uses_component_instance: false,
        fn_name_suffix: "For".to_string(),
        empty_tag,
        empty_attributes: None,
        i18n_placeholder: None,
        empty_i18n_placeholder: None,
    })
}

pub fn create_declare_let_op(xref: XrefId, declared_name: impl Into<String>) -> CreateOp {
    CreateOp::DeclareLet(DeclareLetOp {
        xref,
        handle: SlotHandle::new(),
        declared_name: declared_name.into(),
    })
}

pub fn create_i18n_start_op(
    xref: XrefId,
    message: Arc<Message>,
    root: Option<XrefId>,
) -> CreateOp {
    CreateOp::I18nStart(I18nOp {
        xref,
        handle: SlotHandle::new(),
        root: root.unwrap_or(xref),
        message,
        message_index: None,
        sub_template_index: None,
        context: None,
    })
}

pub fn create_i18n_end_op(xref: XrefId) -> CreateOp {
    CreateOp::I18nEnd(I18nEndOp { xref })
}

pub fn create_icu_start_op(
    xref: XrefId,
    message: Arc<Message>,
    message_placeholder: impl Into<String>,
) -> CreateOp {
    CreateOp::IcuStart(IcuStartOp {
        xref,
        message,
        message_placeholder: message_placeholder.into(),
        context: None,
    })
}

pub fn create_icu_end_op(xref: XrefId) -> CreateOp {
    CreateOp::IcuEnd(IcuEndOp { xref })
}

pub fn create_i18n_context_op(
    context_kind: I18nContextKind,
    xref: XrefId,
    i18n_block: Option<XrefId>,
    message: Arc<Message>,
) -> CreateOp {
    CreateOp::I18nContext(I18nContextOp {
        context_kind,
        xref,
        i18n_block,
        message,
        params: IndexMap::new(),
        postprocessing_params: IndexMap::new(),
    })
}

pub fn create_i18n_attributes_op(xref: XrefId, handle: SlotHandle, target: XrefId) -> CreateOp {
    CreateOp::I18nAttributes(I18nAttributesOp {
        xref,
        handle,
        target,
        i18n_attributes_config: None,
    })
}

pub fn create_namespace_op(active: Namespace) -> CreateOp {
    CreateOp::Namespace(NamespaceOp { active })
}

pub fn create_projection_def_op(def: Option<Expression>) -> CreateOp {
    CreateOp::ProjectionDef(ProjectionDefOp { def })
}
