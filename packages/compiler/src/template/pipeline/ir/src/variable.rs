//! IR Variables
//!
//! Named values materialized once per view or listener scope.

use bitflags::bitflags;

use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::handle::XrefId;

pub use crate::template::pipeline::ir::enums::SemanticVariableKind;

/// Marker symbol for `ctx` references inside alias expressions. Replaced with the real context
/// variable once naming has run.
pub const CTX_REF: &str = "CTX_REF_MARKER";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VariableFlags: u8 {
        const NONE = 0;
        /// Always inline this variable, regardless of the number of times it's used.
        const ALWAYS_INLINE = 1 << 0;
    }
}

/// A variable that represents the context of a particular view.
#[derive(Debug, Clone)]
pub struct ContextVariable {
    /// `XrefId` of the view that this variable represents.
    pub view: XrefId,
    pub name: Option<String>,
}

/// A variable that represents a specific identifier within a template.
#[derive(Debug, Clone)]
pub struct IdentifierVariable {
    /// The identifier whose value in the template is tracked in this variable.
    pub identifier: String,
    /// Whether the variable was declared locally within the same view or somewhere else.
    pub local: bool,
    pub name: Option<String>,
}

/// A variable that represents a saved view context.
#[derive(Debug, Clone)]
pub struct SavedViewVariable {
    pub view: XrefId,
    pub name: Option<String>,
}

/// A variable that will be inlined at every location it is used. An alias is also allowed to
/// depend on the value of a semantic variable.
#[derive(Debug, Clone)]
pub struct AliasVariable {
    pub identifier: String,
    /// Expression representing the value of the alias.
    pub expression: Expression,
    pub name: Option<String>,
}

/// Union type for the different kinds of variables.
#[derive(Debug, Clone)]
pub enum SemanticVariable {
    Context(ContextVariable),
    Identifier(IdentifierVariable),
    SavedView(SavedViewVariable),
    Alias(AliasVariable),
}

impl SemanticVariable {
    pub fn context(view: XrefId) -> Self {
        SemanticVariable::Context(ContextVariable { view, name: None })
    }

    pub fn identifier(identifier: impl Into<String>, local: bool) -> Self {
        SemanticVariable::Identifier(IdentifierVariable {
            identifier: identifier.into(),
            local,
            name: None,
        })
    }

    pub fn saved_view(view: XrefId) -> Self {
        SemanticVariable::SavedView(SavedViewVariable { view, name: None })
    }

    pub fn alias(identifier: impl Into<String>, expression: Expression) -> Self {
        SemanticVariable::Alias(AliasVariable {
            identifier: identifier.into(),
            expression,
            name: None,
        })
    }

    pub fn kind(&self) -> SemanticVariableKind {
        match self {
            SemanticVariable::Context(_) => SemanticVariableKind::Context,
            SemanticVariable::Identifier(_) => SemanticVariableKind::Identifier,
            SemanticVariable::SavedView(_) => SemanticVariableKind::SavedView,
            SemanticVariable::Alias(_) => SemanticVariableKind::Alias,
        }
    }

    /// Name assigned to this variable in generated code, or `None` before naming.
    pub fn name(&self) -> Option<&str> {
        match self {
            SemanticVariable::Context(v) => v.name.as_deref(),
            SemanticVariable::Identifier(v) => v.name.as_deref(),
            SemanticVariable::SavedView(v) => v.name.as_deref(),
            SemanticVariable::Alias(v) => v.name.as_deref(),
        }
    }

    pub fn set_name(&mut self, name: String) {
        let slot = match self {
            SemanticVariable::Context(v) => &mut v.name,
            SemanticVariable::Identifier(v) => &mut v.name,
            SemanticVariable::SavedView(v) => &mut v.name,
            SemanticVariable::Alias(v) => &mut v.name,
        };
        *slot = Some(name);
    }
}
