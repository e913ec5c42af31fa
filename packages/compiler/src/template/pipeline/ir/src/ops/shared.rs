//! Shared Operations
//!
//! Operations valid in both the create and update lists.

use crate::output::output_ast::{Expression, Statement};
use crate::template::pipeline::ir::handle::XrefId;
use crate::template::pipeline::ir::variable::{SemanticVariable, VariableFlags};

/// An `Op` which directly wraps an output `Statement`.
///
/// Often `StatementOp`s are the final result of IR processing.
#[derive(Debug, Clone)]
pub struct StatementOp {
    pub statement: Statement,
}

impl StatementOp {
    pub fn new(statement: Statement) -> Self {
        StatementOp { statement }
    }
}

/// Operation which declares and initializes a `SemanticVariable`, that is valid either in create
/// or update IR.
#[derive(Debug, Clone)]
pub struct VariableOp {
    /// `XrefId` which identifies this specific variable, and is used to reference this variable
    /// from other parts of the IR.
    pub xref: XrefId,
    pub variable: SemanticVariable,
    /// Expression representing the value of the variable.
    pub initializer: Box<Expression>,
    pub flags: VariableFlags,
}

impl VariableOp {
    pub fn new(
        xref: XrefId,
        variable: SemanticVariable,
        initializer: Expression,
        flags: VariableFlags,
    ) -> Self {
        VariableOp {
            xref,
            variable,
            initializer: Box::new(initializer),
            flags,
        }
    }
}
