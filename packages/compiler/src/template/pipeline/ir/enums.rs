//! IR Enums
//!
//! Closed enumerations shared by operations, expressions and phases.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Distinguishes different kinds of IR operations.
///
/// Includes both creation and update operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// A special operation type which is used to represent the beginning and end nodes of a linked
    /// list of operations.
    ListEnd,
    /// An operation which wraps an output AST statement.
    Statement,
    /// An operation which declares and initializes a `SemanticVariable`.
    Variable,
    /// An operation to begin rendering of an element.
    ElementStart,
    /// An operation to render an element with no children.
    Element,
    /// An operation which declares an embedded view.
    Template,
    /// An operation to end rendering of an element previously started with `ElementStart`.
    ElementEnd,
    /// An operation to begin an `ng-container`.
    ContainerStart,
    /// An operation for an `ng-container` with no children.
    Container,
    /// An operation to end an `ng-container`.
    ContainerEnd,
    /// An operation disable binding for subsequent elements, which are descendants of a non-bindable
    /// node.
    DisableBindings,
    /// Create a conditional creation instruction op.
    ConditionalCreate,
    /// Create a conditional branch creation instruction op.
    ConditionalBranchCreate,
    /// An op to conditionally render a template.
    Conditional,
    /// An operation to re-enable binding, after it was previously disabled.
    EnableBindings,
    /// An operation to render a text node.
    Text,
    /// An operation declaring an event listener for an element.
    Listener,
    /// An operation to interpolate text into a text node.
    InterpolateText,
    /// An intermediate binding op, that has not had the execution order determined and thus has
    /// not been split into a specific kind yet.
    Binding,
    /// An operation to bind an expression to a property of an element.
    Property,
    /// An operation to bind an expression to a style property of an element.
    StyleProp,
    /// An operation to bind an expression to a class property of an element.
    ClassProp,
    /// An operation to bind an expression to the styles of an element.
    StyleMap,
    /// An operation to bind an expression to the classes of an element.
    ClassMap,
    /// An operation to advance the runtime's implicit slot context during the update phase of a view.
    Advance,
    /// An operation to instantiate a pipe.
    Pipe,
    /// An operation to associate an attribute with an element.
    Attribute,
    /// An attribute that has been extracted for inclusion in the consts array.
    ExtractedAttribute,
    /// An operation that configures a `@defer` block.
    Defer,
    /// An operation that controls when a `@defer` loads.
    DeferOn,
    /// An operation that controls when a `@defer` loads, using a custom expression as the condition.
    DeferWhen,
    /// An i18n message that has been extracted for inclusion in the consts array.
    I18nMessage,
    /// A binding to a native DOM property.
    DomProperty,
    /// A namespace change, which causes the subsequent elements to be processed as either HTML or SVG.
    Namespace,
    /// Configure a content projection definition for the view.
    ProjectionDef,
    /// Create a content projection slot.
    Projection,
    /// Create a repeater creation instruction op.
    RepeaterCreate,
    /// An update up for a repeater.
    Repeater,
    /// An operation to bind an expression to the property side of a two-way binding.
    TwoWayProperty,
    /// An operation declaring the event side of a two-way binding.
    TwoWayListener,
    /// A creation-time operation that initializes the slot for a `@let` declaration.
    DeclareLet,
    /// An update-time operation that stores the current value of a `@let` declaration.
    StoreLet,
    /// The start of an i18n block.
    I18nStart,
    /// A self-closing i18n on a single element.
    I18n,
    /// The end of an i18n block.
    I18nEnd,
    /// An expression in an i18n message.
    I18nExpression,
    /// An instruction that applies a set of i18n expressions.
    I18nApply,
    /// An instruction to create an ICU expression.
    IcuStart,
    /// An instruction to update an ICU expression.
    IcuEnd,
    /// An i18n context containing information needed to generate an i18n message.
    I18nContext,
    /// Configures the i18n attributes of an element whose bindings carry i18n messages.
    I18nAttributes,
    /// A binding of a form control to a `field` input.
    Control,
    /// Creation-time setup for a form control binding.
    ControlCreate,
    /// An `animate.enter` / `animate.leave` binding whose value is computed by a handler.
    Animation,
    /// An `animate.enter` / `animate.leave` binding with a static class string.
    AnimationString,
    /// An animation binding before it has been moved into the create list.
    AnimationBinding,
}

/// Distinguishes between different kinds of `SemanticVariable`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticVariableKind {
    /// Represents the context of a particular view.
    Context,
    /// Represents an identifier declared in the lexical scope of a view.
    Identifier,
    /// Represents a saved state that can be used to restore a view in a listener handler function.
    SavedView,
    /// An alias generated by a special embedded view type (e.g. a `@for` block).
    Alias,
}

/// Whether to compile in compatibility mode. In compatibility mode, the template pipeline will
/// attempt to match the output of `TemplateDefinitionBuilder` as exactly as possible, at the cost
/// of producing quirky or larger code in some cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompatibilityMode {
    #[default]
    Normal,
    TemplateDefinitionBuilder,
}

/// Enumeration of the types of attributes which can be applied to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Static attributes.
    Attribute,
    /// Class bindings.
    ClassName,
    /// Style bindings.
    StyleProperty,
    /// Dynamic property bindings.
    Property,
    /// Property or attribute bindings on a template.
    Template,
    /// Internationalized attributes.
    I18n,
    /// Legacy animation property bindings.
    LegacyAnimation,
    /// Property side of a two-way binding.
    TwoWayProperty,
    /// Property side of an animation binding.
    Animation,
}

/// Enumeration of possible times i18n params can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I18nParamResolutionTime {
    /// Param is resolved at message creation time. Most params should be resolved at message
    /// creation time. However, ICU params need to be handled in post-processing.
    Creation,
    /// Param is resolved during post-processing. This should be used for params whose value comes
    /// from an ICU.
    Postprocessing,
}

/// The contexts in which an i18n expression can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I18nExpressionFor {
    /// This expression is used as a value (i.e. inside an i18n block).
    I18nText,
    /// This expression is used in a binding.
    I18nAttribute,
}

bitflags! {
    /// Flags that describe what an i18n param value. These determine how the value is serialized
    /// into the final map.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct I18nParamValueFlags: u8 {
        const NONE = 0;
        /// This value represents an element tag.
        const ELEMENT_TAG = 0b1;
        /// This value represents a template tag.
        const TEMPLATE_TAG = 0b10;
        /// This value represents the opening of a tag.
        const OPEN_TAG = 0b0100;
        /// This value represents the closing of a tag.
        const CLOSE_TAG = 0b1000;
        /// This value represents an i18n expression index.
        const EXPRESSION_INDEX = 0b10000;
    }
}

/// Whether the active namespace is HTML, MathML, or SVG mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    HTML,
    SVG,
    Math,
}

/// The type of a `@defer` trigger, for use in the ir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferTriggerKind {
    Idle,
    Immediate,
    Timer,
    Hover,
    Interaction,
    Viewport,
    Never,
}

/// Kinds of i18n contexts. They can be created because of root i18n blocks, or ICUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I18nContextKind {
    RootI18n,
    Icu,
    Attr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    NgTemplate,
    Structural,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    Enter,
    Leave,
}

impl AnimationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationKind::Enter => "enter",
            AnimationKind::Leave => "leave",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeferOpModifierKind {
    #[default]
    None,
    Prefetch,
    Hydrate,
}

bitflags! {
    /// Runtime flags passed to the `defer` instruction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TDeferDetailsFlags: u8 {
        const DEFAULT = 0;
        const HAS_HYDRATE_TRIGGERS = 1 << 0;
    }
}
