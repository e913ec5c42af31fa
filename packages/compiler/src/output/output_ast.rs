//! Output AST
//!
//! Statement and expression nodes produced by the pipeline. IR-specific expressions live in the
//! same enum so the generic rewrite engine can walk mixed trees without a second representation.

use std::borrow::Cow;

use bitflags::bitflags;

use crate::template::pipeline::ir::expression::{
    AssignTemporaryExpr, ConditionalCaseExpr, ConstCollectedExpr, ContextExpr,
    ContextLetReferenceExpr, EmptyExpr, GetCurrentViewExpr, LexicalReadExpr, NextContextExpr,
    PipeBindingExpr, PipeBindingVariadicExpr, PureFunctionExpr, PureFunctionParameterExpr, ReadTemporaryExpr,
    ReadVariableExpr, ReferenceExpr, ResetViewExpr, RestoreViewExpr, SafeInvokeFunctionExpr,
    SafeKeyedReadExpr, SafePropertyReadExpr, SafeTernaryExpr, SlotLiteralExpr, StoreLetExpr,
    TrackContextExpr, TwoWayBindingSetExpr,
};

///// Expressions

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    Assign,
    Identical,
    NotIdentical,
    Minus,
    Plus,
    Divide,
    Multiply,
    Modulo,
    And,
    Or,
    Lower,
    LowerEquals,
    Bigger,
    BiggerEquals,
    NullishCoalesce,
    Exponentiation,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::Assign => "=",
            BinaryOperator::Identical => "===",
            BinaryOperator::NotIdentical => "!==",
            BinaryOperator::Minus => "-",
            BinaryOperator::Plus => "+",
            BinaryOperator::Divide => "/",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Modulo => "%",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Lower => "<",
            BinaryOperator::LowerEquals => "<=",
            BinaryOperator::Bigger => ">",
            BinaryOperator::BiggerEquals => ">=",
            BinaryOperator::NullishCoalesce => "??",
            BinaryOperator::Exponentiation => "**",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
}

/// A symbol imported from a runtime module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalReference {
    pub module_name: Cow<'static, str>,
    pub name: Cow<'static, str>,
}

impl ExternalReference {
    pub const fn new(module_name: &'static str, name: &'static str) -> Self {
        ExternalReference {
            module_name: Cow::Borrowed(module_name),
            name: Cow::Borrowed(name),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    ReadVar(ReadVarExpr),
    WriteVar(WriteVarExpr),
    WriteKey(WriteKeyExpr),
    WriteProp(WritePropExpr),
    InvokeFn(InvokeFunctionExpr),
    Literal(LiteralExpr),
    External(ExternalExpr),
    Conditional(ConditionalExpr),
    NotExpr(NotExpr),
    Fn(FunctionExpr),
    ArrowFn(ArrowFunctionExpr),
    BinaryOp(BinaryOperatorExpr),
    ReadProp(ReadPropExpr),
    ReadKey(ReadKeyExpr),
    LiteralArray(LiteralArrayExpr),
    LiteralMap(LiteralMapExpr),
    TypeOf(TypeofExpr),
    Unary(UnaryOperatorExpr),
    Parens(ParenthesizedExpr),

    // IR Expression variants
    LexicalRead(LexicalReadExpr),
    Reference(ReferenceExpr),
    Context(ContextExpr),
    NextContext(NextContextExpr),
    GetCurrentView(GetCurrentViewExpr),
    RestoreView(RestoreViewExpr),
    ResetView(ResetViewExpr),
    ReadVariable(ReadVariableExpr),
    PureFunction(PureFunctionExpr),
    PureFunctionParameter(PureFunctionParameterExpr),
    PipeBinding(PipeBindingExpr),
    PipeBindingVariadic(PipeBindingVariadicExpr),
    SafePropertyRead(SafePropertyReadExpr),
    SafeKeyedRead(SafeKeyedReadExpr),
    SafeInvokeFunction(SafeInvokeFunctionExpr),
    SafeTernary(SafeTernaryExpr),
    Empty(EmptyExpr),
    AssignTemporary(AssignTemporaryExpr),
    ReadTemporary(ReadTemporaryExpr),
    SlotLiteral(SlotLiteralExpr),
    ConditionalCase(ConditionalCaseExpr),
    TwoWayBindingSet(TwoWayBindingSetExpr),
    ContextLetReference(ContextLetReferenceExpr),
    StoreLet(StoreLetExpr),
    TrackContext(TrackContextExpr),
    ConstCollected(ConstCollectedExpr),
}

#[derive(Debug, Clone)]
pub struct ReadVarExpr {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct WriteVarExpr {
    pub name: String,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct WriteKeyExpr {
    pub receiver: Box<Expression>,
    pub index: Box<Expression>,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct WritePropExpr {
    pub receiver: Box<Expression>,
    pub name: String,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct InvokeFunctionExpr {
    pub fn_: Box<Expression>,
    pub args: Vec<Expression>,
    pub pure: bool,
}

#[derive(Debug, Clone)]
pub struct LiteralExpr {
    pub value: LiteralValue,
}

#[derive(Debug, Clone)]
pub struct ExternalExpr {
    pub value: ExternalReference,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub condition: Box<Expression>,
    pub true_case: Box<Expression>,
    pub false_case: Option<Box<Expression>>,
}

#[derive(Debug, Clone)]
pub struct NotExpr {
    pub condition: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnParam {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct FunctionExpr {
    pub params: Vec<FnParam>,
    pub statements: Vec<Statement>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ArrowFunctionBody {
    Expression(Box<Expression>),
    Statements(Vec<Statement>),
}

#[derive(Debug, Clone)]
pub struct ArrowFunctionExpr {
    pub params: Vec<FnParam>,
    pub body: ArrowFunctionBody,
}

#[derive(Debug, Clone)]
pub struct BinaryOperatorExpr {
    pub operator: BinaryOperator,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct ReadPropExpr {
    pub receiver: Box<Expression>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ReadKeyExpr {
    pub receiver: Box<Expression>,
    pub index: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct LiteralArrayExpr {
    pub entries: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct LiteralMapEntry {
    pub key: String,
    pub value: Box<Expression>,
    pub quoted: bool,
}

#[derive(Debug, Clone)]
pub struct LiteralMapExpr {
    pub entries: Vec<LiteralMapEntry>,
}

#[derive(Debug, Clone)]
pub struct TypeofExpr {
    pub expr: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct UnaryOperatorExpr {
    pub operator: UnaryOperator,
    pub expr: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct ParenthesizedExpr {
    pub expr: Box<Expression>,
}

// Helper functions for creating common expressions
pub fn variable(name: impl Into<String>) -> Expression {
    Expression::ReadVar(ReadVarExpr { name: name.into() })
}

pub fn literal(value: impl Into<LiteralValue>) -> Expression {
    Expression::Literal(LiteralExpr {
        value: value.into(),
    })
}

pub fn null_expr() -> Expression {
    Expression::Literal(LiteralExpr {
        value: LiteralValue::Null,
    })
}

pub fn literal_arr(entries: Vec<Expression>) -> Expression {
    Expression::LiteralArray(LiteralArrayExpr { entries })
}

pub fn literal_map(entries: Vec<LiteralMapEntry>) -> Expression {
    Expression::LiteralMap(LiteralMapExpr { entries })
}

pub fn import_ref(value: ExternalReference) -> Expression {
    Expression::External(ExternalExpr { value })
}

pub fn not(condition: Expression) -> Expression {
    Expression::NotExpr(NotExpr {
        condition: Box::new(condition),
    })
}

pub fn parens(expr: Expression) -> Expression {
    Expression::Parens(ParenthesizedExpr {
        expr: Box::new(expr),
    })
}

pub fn arrow_fn(params: Vec<FnParam>, body: ArrowFunctionBody) -> Expression {
    Expression::ArrowFn(ArrowFunctionExpr { params, body })
}

pub fn fn_expr(params: Vec<FnParam>, statements: Vec<Statement>, name: Option<String>) -> Expression {
    Expression::Fn(FunctionExpr {
        params,
        statements,
        name,
    })
}

// Implement conversions
impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::String(s)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(s.to_string())
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Number(n)
    }
}

impl From<usize> for LiteralValue {
    fn from(n: usize) -> Self {
        LiteralValue::Number(n as f64)
    }
}

impl From<i32> for LiteralValue {
    fn from(n: i32) -> Self {
        LiteralValue::Number(f64::from(n))
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Bool(b)
    }
}

impl<T: Into<LiteralValue>> From<Option<T>> for LiteralValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(LiteralValue::Null, Into::into)
    }
}

impl LiteralValue {
    fn is_equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (LiteralValue::Number(a), LiteralValue::Number(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

fn boxed_equivalent(a: &Expression, b: &Expression) -> bool {
    a.is_equivalent(b)
}

fn all_equivalent(a: &[Expression], b: &[Expression]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_equivalent(y))
}

fn optional_equivalent(a: &Option<Box<Expression>>, b: &Option<Box<Expression>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.is_equivalent(b),
        (None, None) => true,
        _ => false,
    }
}

impl Expression {
    /// Structural equality. Used to deduplicate constants and shared functions.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        use Expression as E;
        match (self, other) {
            (E::ReadVar(a), E::ReadVar(b)) => a.name == b.name,
            (E::WriteVar(a), E::WriteVar(b)) => a.name == b.name && boxed_equivalent(&a.value, &b.value),
            (E::WriteKey(a), E::WriteKey(b)) => {
                a.receiver.is_equivalent(&b.receiver)
                    && a.index.is_equivalent(&b.index)
                    && a.value.is_equivalent(&b.value)
            }
            (E::WriteProp(a), E::WriteProp(b)) => {
                a.name == b.name
                    && a.receiver.is_equivalent(&b.receiver)
                    && a.value.is_equivalent(&b.value)
            }
            (E::InvokeFn(a), E::InvokeFn(b)) => {
                a.fn_.is_equivalent(&b.fn_) && all_equivalent(&a.args, &b.args) && a.pure == b.pure
            }
            (E::Literal(a), E::Literal(b)) => a.value.is_equivalent(&b.value),
            (E::External(a), E::External(b)) => a.value == b.value,
            (E::Conditional(a), E::Conditional(b)) => {
                a.condition.is_equivalent(&b.condition)
                    && a.true_case.is_equivalent(&b.true_case)
                    && optional_equivalent(&a.false_case, &b.false_case)
            }
            (E::NotExpr(a), E::NotExpr(b)) => a.condition.is_equivalent(&b.condition),
            (E::Fn(a), E::Fn(b)) => {
                a.params == b.params && statements_equivalent(&a.statements, &b.statements)
            }
            (E::ArrowFn(a), E::ArrowFn(b)) => {
                a.params == b.params
                    && match (&a.body, &b.body) {
                        (ArrowFunctionBody::Expression(x), ArrowFunctionBody::Expression(y)) => {
                            x.is_equivalent(y)
                        }
                        (ArrowFunctionBody::Statements(x), ArrowFunctionBody::Statements(y)) => {
                            statements_equivalent(x, y)
                        }
                        _ => false,
                    }
            }
            (E::BinaryOp(a), E::BinaryOp(b)) => {
                a.operator == b.operator && a.lhs.is_equivalent(&b.lhs) && a.rhs.is_equivalent(&b.rhs)
            }
            (E::ReadProp(a), E::ReadProp(b)) => a.name == b.name && a.receiver.is_equivalent(&b.receiver),
            (E::ReadKey(a), E::ReadKey(b)) => {
                a.receiver.is_equivalent(&b.receiver) && a.index.is_equivalent(&b.index)
            }
            (E::LiteralArray(a), E::LiteralArray(b)) => all_equivalent(&a.entries, &b.entries),
            (E::LiteralMap(a), E::LiteralMap(b)) => {
                a.entries.len() == b.entries.len()
                    && a.entries.iter().zip(&b.entries).all(|(x, y)| {
                        x.key == y.key && x.quoted == y.quoted && x.value.is_equivalent(&y.value)
                    })
            }
            (E::TypeOf(a), E::TypeOf(b)) => a.expr.is_equivalent(&b.expr),
            (E::Unary(a), E::Unary(b)) => a.operator == b.operator && a.expr.is_equivalent(&b.expr),
            (E::Parens(a), E::Parens(b)) => a.expr.is_equivalent(&b.expr),

            (E::LexicalRead(a), E::LexicalRead(b)) => a.is_equivalent(b),
            (E::Reference(a), E::Reference(b)) => a.is_equivalent(b),
            (E::Context(a), E::Context(b)) => a.is_equivalent(b),
            (E::NextContext(a), E::NextContext(b)) => a.is_equivalent(b),
            (E::GetCurrentView(_), E::GetCurrentView(_)) => true,
            (E::RestoreView(a), E::RestoreView(b)) => a.is_equivalent(b),
            (E::ResetView(a), E::ResetView(b)) => a.is_equivalent(b),
            (E::ReadVariable(a), E::ReadVariable(b)) => a.is_equivalent(b),
            (E::PureFunction(a), E::PureFunction(b)) => a.is_equivalent(b),
            (E::PureFunctionParameter(a), E::PureFunctionParameter(b)) => a.index == b.index,
            (E::PipeBinding(a), E::PipeBinding(b)) => a.is_equivalent(b),
            (E::PipeBindingVariadic(a), E::PipeBindingVariadic(b)) => a.is_equivalent(b),
            (E::SafePropertyRead(a), E::SafePropertyRead(b)) => a.is_equivalent(b),
            (E::SafeKeyedRead(a), E::SafeKeyedRead(b)) => a.is_equivalent(b),
            (E::SafeInvokeFunction(a), E::SafeInvokeFunction(b)) => a.is_equivalent(b),
            (E::SafeTernary(a), E::SafeTernary(b)) => a.is_equivalent(b),
            (E::Empty(_), E::Empty(_)) => true,
            (E::AssignTemporary(a), E::AssignTemporary(b)) => a.is_equivalent(b),
            (E::ReadTemporary(a), E::ReadTemporary(b)) => a.xref == b.xref,
            (E::SlotLiteral(a), E::SlotLiteral(b)) => a.slot.same_as(&b.slot),
            (E::ConditionalCase(a), E::ConditionalCase(b)) => a.is_equivalent(b),
            (E::TwoWayBindingSet(a), E::TwoWayBindingSet(b)) => a.is_equivalent(b),
            (E::ContextLetReference(a), E::ContextLetReference(b)) => a.target == b.target,
            (E::StoreLet(a), E::StoreLet(b)) => a.is_equivalent(b),
            (E::TrackContext(a), E::TrackContext(b)) => a.view == b.view,
            (E::ConstCollected(a), E::ConstCollected(b)) => a.is_equivalent(b),
            _ => false,
        }
    }

    /// Whether this expression can be hoisted into the constant pool as-is.
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::LiteralArray(arr) => arr.entries.iter().all(Expression::is_constant),
            Expression::LiteralMap(map) => map.entries.iter().all(|e| e.value.is_constant()),
            Expression::Parens(p) => p.expr.is_constant(),
            _ => false,
        }
    }

    pub fn is_ir_expression(&self) -> bool {
        !matches!(
            self,
            Expression::ReadVar(_)
                | Expression::WriteVar(_)
                | Expression::WriteKey(_)
                | Expression::WriteProp(_)
                | Expression::InvokeFn(_)
                | Expression::Literal(_)
                | Expression::External(_)
                | Expression::Conditional(_)
                | Expression::NotExpr(_)
                | Expression::Fn(_)
                | Expression::ArrowFn(_)
                | Expression::BinaryOp(_)
                | Expression::ReadProp(_)
                | Expression::ReadKey(_)
                | Expression::LiteralArray(_)
                | Expression::LiteralMap(_)
                | Expression::TypeOf(_)
                | Expression::Unary(_)
                | Expression::Parens(_)
        )
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expression::Literal(LiteralExpr {
                value: LiteralValue::String(s),
            }) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty_expr(&self) -> bool {
        matches!(self, Expression::Empty(_))
    }

    pub fn prop(self, name: impl Into<String>) -> Expression {
        Expression::ReadProp(ReadPropExpr {
            receiver: Box::new(self),
            name: name.into(),
        })
    }

    pub fn key(self, index: Expression) -> Expression {
        Expression::ReadKey(ReadKeyExpr {
            receiver: Box::new(self),
            index: Box::new(index),
        })
    }

    pub fn call_fn(self, args: Vec<Expression>) -> Expression {
        Expression::InvokeFn(InvokeFunctionExpr {
            fn_: Box::new(self),
            args,
            pure: false,
        })
    }

    pub fn set(self, value: Expression) -> Expression {
        match self {
            Expression::ReadVar(v) => Expression::WriteVar(WriteVarExpr {
                name: v.name,
                value: Box::new(value),
            }),
            Expression::ReadProp(p) => Expression::WriteProp(WritePropExpr {
                receiver: p.receiver,
                name: p.name,
                value: Box::new(value),
            }),
            Expression::ReadKey(k) => Expression::WriteKey(WriteKeyExpr {
                receiver: k.receiver,
                index: k.index,
                value: Box::new(value),
            }),
            other => other.binary(BinaryOperator::Assign, value),
        }
    }

    pub fn binary(self, operator: BinaryOperator, rhs: Expression) -> Expression {
        Expression::BinaryOp(BinaryOperatorExpr {
            operator,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        })
    }

    pub fn identical(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Identical, rhs)
    }

    pub fn equals(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Equals, rhs)
    }

    pub fn or(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Or, rhs)
    }

    pub fn conditional(self, true_case: Expression, false_case: Option<Expression>) -> Expression {
        Expression::Conditional(ConditionalExpr {
            condition: Box::new(self),
            true_case: Box::new(true_case),
            false_case: false_case.map(Box::new),
        })
    }

    pub fn to_stmt(self) -> Statement {
        Statement::Expression(ExpressionStatement {
            expr: Box::new(self),
        })
    }
}

///// Statements

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StmtModifier: u8 {
        const NONE = 0;
        const FINAL = 1 << 0;
        const EXPORTED = 1 << 1;
    }
}

#[derive(Debug, Clone)]
pub enum Statement {
    DeclareVar(DeclareVarStmt),
    Expression(ExpressionStatement),
    Return(ReturnStatement),
    IfStmt(IfStmt),
}

#[derive(Debug, Clone)]
pub struct DeclareVarStmt {
    pub name: String,
    pub value: Option<Box<Expression>>,
    pub modifiers: StmtModifier,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expr: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub value: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Box<Expression>,
    pub true_case: Vec<Statement>,
    pub false_case: Vec<Statement>,
}

pub fn declare_var(name: impl Into<String>, value: Option<Expression>, modifiers: StmtModifier) -> Statement {
    Statement::DeclareVar(DeclareVarStmt {
        name: name.into(),
        value: value.map(Box::new),
        modifiers,
    })
}

pub fn return_stmt(value: Expression) -> Statement {
    Statement::Return(ReturnStatement {
        value: Box::new(value),
    })
}

fn statements_equivalent(a: &[Statement], b: &[Statement]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_equivalent(y))
}

impl Statement {
    pub fn is_equivalent(&self, other: &Statement) -> bool {
        match (self, other) {
            (Statement::DeclareVar(a), Statement::DeclareVar(b)) => {
                a.name == b.name && a.modifiers == b.modifiers && optional_equivalent(&a.value, &b.value)
            }
            (Statement::Expression(a), Statement::Expression(b)) => a.expr.is_equivalent(&b.expr),
            (Statement::Return(a), Statement::Return(b)) => a.value.is_equivalent(&b.value),
            (Statement::IfStmt(a), Statement::IfStmt(b)) => {
                a.condition.is_equivalent(&b.condition)
                    && statements_equivalent(&a.true_case, &b.true_case)
                    && statements_equivalent(&a.false_case, &b.false_case)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_array_equivalence_is_structural() {
        let a = literal_arr(vec![literal("a"), literal(1.0)]);
        let b = literal_arr(vec![literal("a"), literal(1.0)]);
        let c = literal_arr(vec![literal("a"), literal(2.0)]);
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
    }

    #[test]
    fn test_is_constant() {
        assert!(literal_arr(vec![literal("x"), null_expr()]).is_constant());
        assert!(!literal_arr(vec![variable("x")]).is_constant());
    }

    #[test]
    fn test_set_turns_reads_into_writes() {
        let write = variable("ctx").prop("name").set(literal("v"));
        assert!(matches!(write, Expression::WriteProp(ref w) if w.name == "name"));
    }
}
