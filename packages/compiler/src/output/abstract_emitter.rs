//! Abstract Emitter Module
//!
//! Prints output AST as JavaScript-like source. The pipeline hands its statements to an external
//! printer, so this one only exists to render diagnostics and make test expectations readable.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::output::output_ast as o;
use crate::template::pipeline::ir::expression::RestoreViewTarget;

static LEGAL_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_$ɵ][0-9a-zA-Z_$ɵ]*$").expect("valid identifier pattern"));
const INDENT_WITH: &str = "  ";

#[derive(Debug, Clone)]
struct EmittedLine {
    parts: Vec<String>,
    indent: usize,
}

impl EmittedLine {
    fn new(indent: usize) -> Self {
        EmittedLine {
            parts: Vec::new(),
            indent,
        }
    }
}

pub struct EmitterVisitorContext {
    lines: Vec<EmittedLine>,
    indent: usize,
}

impl EmitterVisitorContext {
    pub fn create_root() -> Self {
        EmitterVisitorContext {
            lines: vec![EmittedLine::new(0)],
            indent: 0,
        }
    }

    pub fn print(&mut self, part: &str, new_line: bool) {
        if !part.is_empty() {
            if let Some(current) = self.lines.last_mut() {
                current.parts.push(part.to_string());
            }
        }
        if new_line {
            self.lines.push(EmittedLine::new(self.indent));
        }
    }

    pub fn println(&mut self, last_part: &str) {
        self.print(last_part, true);
    }

    fn line_is_empty(&self) -> bool {
        self.lines.last().map_or(true, |l| l.parts.is_empty())
    }

    pub fn inc_indent(&mut self) {
        self.indent += 1;
        if self.line_is_empty() {
            if let Some(current) = self.lines.last_mut() {
                current.indent = self.indent;
            }
        }
    }

    pub fn dec_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        if self.line_is_empty() {
            if let Some(current) = self.lines.last_mut() {
                current.indent = self.indent;
            }
        }
    }

    pub fn to_source(&self) -> String {
        let mut lines: Vec<String> = self
            .lines
            .iter()
            .map(|l| {
                if l.parts.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", INDENT_WITH.repeat(l.indent), l.parts.join(""))
                }
            })
            .collect();
        while lines.last().map_or(false, String::is_empty) {
            lines.pop();
        }
        lines.join("\n")
    }
}

/// Escape identifier for safe use in generated code
pub fn escape_identifier(input: &str, escape_dollar: bool, always_quote: bool) -> String {
    if input.is_empty() {
        return "''".to_string();
    }
    if !always_quote && LEGAL_IDENTIFIER_RE.is_match(input) {
        return input.to_string();
    }

    let mut escaped = input.replace('\\', "\\\\");
    escaped = escaped.replace('\'', "\\'");
    escaped = escaped.replace('\n', "\\n");
    escaped = escaped.replace('\r', "\\r");
    if escape_dollar {
        escaped = escaped.replace('$', "\\$");
    }

    format!("'{}'", escaped)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Render a single expression on one line.
pub fn emit_expression(expr: &o::Expression) -> String {
    let mut ctx = EmitterVisitorContext::create_root();
    visit_expression(expr, &mut ctx);
    ctx.to_source()
}

/// Render a list of statements, one per line.
pub fn emit_statements(stmts: &[o::Statement]) -> String {
    let mut ctx = EmitterVisitorContext::create_root();
    for stmt in stmts {
        visit_statement(stmt, &mut ctx);
    }
    ctx.to_source()
}

fn visit_all(exprs: &[o::Expression], ctx: &mut EmitterVisitorContext, separator: &str) {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            ctx.print(separator, false);
        }
        visit_expression(expr, ctx);
    }
}

fn visit_params(params: &[o::FnParam], ctx: &mut EmitterVisitorContext) {
    let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    ctx.print(&names.join(", "), false);
}

fn visit_block(stmts: &[o::Statement], ctx: &mut EmitterVisitorContext) {
    ctx.println("{");
    ctx.inc_indent();
    for stmt in stmts {
        visit_statement(stmt, ctx);
    }
    ctx.dec_indent();
    ctx.print("}", false);
}

pub fn visit_statement(stmt: &o::Statement, ctx: &mut EmitterVisitorContext) {
    match stmt {
        o::Statement::DeclareVar(decl) => {
            let keyword = if decl.modifiers.contains(o::StmtModifier::FINAL) {
                "const"
            } else {
                "let"
            };
            ctx.print(&format!("{} {}", keyword, decl.name), false);
            if let Some(value) = &decl.value {
                ctx.print(" = ", false);
                visit_expression(value, ctx);
            }
            ctx.println(";");
        }
        o::Statement::Expression(s) => {
            visit_expression(&s.expr, ctx);
            ctx.println(";");
        }
        o::Statement::Return(s) => {
            ctx.print("return ", false);
            visit_expression(&s.value, ctx);
            ctx.println(";");
        }
        o::Statement::IfStmt(s) => {
            ctx.print("if (", false);
            visit_expression(&s.condition, ctx);
            ctx.print(") ", false);
            visit_block(&s.true_case, ctx);
            if !s.false_case.is_empty() {
                ctx.print(" else ", false);
                visit_block(&s.false_case, ctx);
            }
            ctx.println("");
        }
    }
}

pub fn visit_expression(expr: &o::Expression, ctx: &mut EmitterVisitorContext) {
    use o::Expression as E;
    match expr {
        E::ReadVar(e) => ctx.print(&escape_identifier(&e.name, false, false), false),
        E::WriteVar(e) => {
            ctx.print(&format!("{} = ", e.name), false);
            visit_expression(&e.value, ctx);
        }
        E::WriteKey(e) => {
            visit_expression(&e.receiver, ctx);
            ctx.print("[", false);
            visit_expression(&e.index, ctx);
            ctx.print("] = ", false);
            visit_expression(&e.value, ctx);
        }
        E::WriteProp(e) => {
            visit_expression(&e.receiver, ctx);
            ctx.print(&format!(".{} = ", e.name), false);
            visit_expression(&e.value, ctx);
        }
        E::InvokeFn(e) => {
            visit_operand(&e.fn_, ctx);
            ctx.print("(", false);
            visit_all(&e.args, ctx, ", ");
            ctx.print(")", false);
        }
        E::Literal(e) => {
            let text = match &e.value {
                o::LiteralValue::Null => "null".to_string(),
                o::LiteralValue::Undefined => "undefined".to_string(),
                o::LiteralValue::Bool(b) => b.to_string(),
                o::LiteralValue::Number(n) => format_number(*n),
                o::LiteralValue::String(s) => escape_identifier(s, true, true),
            };
            ctx.print(&text, false);
        }
        E::External(e) => ctx.print(&format!("i0.{}", e.value.name), false),
        E::Conditional(e) => {
            ctx.print("(", false);
            visit_expression(&e.condition, ctx);
            ctx.print(" ? ", false);
            visit_expression(&e.true_case, ctx);
            ctx.print(" : ", false);
            match &e.false_case {
                Some(f) => visit_expression(f, ctx),
                None => ctx.print("null", false),
            }
            ctx.print(")", false);
        }
        E::NotExpr(e) => {
            ctx.print("!", false);
            visit_operand(&e.condition, ctx);
        }
        E::Fn(e) => {
            ctx.print(&format!("function {}(", e.name.as_deref().unwrap_or("")), false);
            visit_params(&e.params, ctx);
            ctx.print(") ", false);
            visit_block(&e.statements, ctx);
        }
        E::ArrowFn(e) => {
            ctx.print("(", false);
            visit_params(&e.params, ctx);
            ctx.print(") => ", false);
            match &e.body {
                o::ArrowFunctionBody::Expression(body) => {
                    if matches!(**body, E::LiteralMap(_)) {
                        ctx.print("(", false);
                        visit_expression(body, ctx);
                        ctx.print(")", false);
                    } else {
                        visit_expression(body, ctx);
                    }
                }
                o::ArrowFunctionBody::Statements(stmts) => visit_block(stmts, ctx),
            }
        }
        E::BinaryOp(e) => {
            ctx.print("(", false);
            visit_expression(&e.lhs, ctx);
            ctx.print(&format!(" {} ", e.operator.as_str()), false);
            visit_expression(&e.rhs, ctx);
            ctx.print(")", false);
        }
        E::ReadProp(e) => {
            visit_operand(&e.receiver, ctx);
            ctx.print(&format!(".{}", e.name), false);
        }
        E::ReadKey(e) => {
            visit_operand(&e.receiver, ctx);
            ctx.print("[", false);
            visit_expression(&e.index, ctx);
            ctx.print("]", false);
        }
        E::LiteralArray(e) => {
            ctx.print("[", false);
            visit_all(&e.entries, ctx, ", ");
            ctx.print("]", false);
        }
        E::LiteralMap(e) => {
            ctx.print("{", false);
            for (i, entry) in e.entries.iter().enumerate() {
                if i > 0 {
                    ctx.print(", ", false);
                }
                ctx.print(
                    &format!("{}: ", escape_identifier(&entry.key, true, entry.quoted)),
                    false,
                );
                visit_expression(&entry.value, ctx);
            }
            ctx.print("}", false);
        }
        E::TypeOf(e) => {
            ctx.print("typeof ", false);
            visit_operand(&e.expr, ctx);
        }
        E::Unary(e) => {
            ctx.print(
                match e.operator {
                    o::UnaryOperator::Minus => "-",
                    o::UnaryOperator::Plus => "+",
                },
                false,
            );
            visit_operand(&e.expr, ctx);
        }
        E::Parens(e) => {
            ctx.print("(", false);
            visit_expression(&e.expr, ctx);
            ctx.print(")", false);
        }
        ir => visit_ir_expression(ir, ctx),
    }
}

/// Operands of prefix operators and member accesses. Expressions that bind looser than those
/// are wrapped, since redundant parentheses are stripped from the tree.
fn visit_operand(expr: &o::Expression, ctx: &mut EmitterVisitorContext) {
    use o::Expression as E;
    if matches!(
        expr,
        E::WriteVar(_)
            | E::WriteKey(_)
            | E::WriteProp(_)
            | E::ArrowFn(_)
            | E::Fn(_)
            | E::Unary(_)
            | E::NotExpr(_)
            | E::TypeOf(_)
    ) {
        ctx.print("(", false);
        visit_expression(expr, ctx);
        ctx.print(")", false);
    } else {
        visit_expression(expr, ctx);
    }
}

/// IR expressions should all be lowered by the time anything is printed; they render in a
/// bracketed debug form so leftovers are easy to spot.
fn visit_ir_expression(expr: &o::Expression, ctx: &mut EmitterVisitorContext) {
    use o::Expression as E;
    match expr {
        E::LexicalRead(e) => ctx.print(&format!("<read {}>", e.name), false),
        E::Reference(e) => ctx.print(&format!("<ref {:?}[{}]>", e.target, e.offset), false),
        E::Context(e) => ctx.print(&format!("<ctx {:?}>", e.view), false),
        E::NextContext(e) => ctx.print(&format!("<nextContext {}>", e.steps), false),
        E::GetCurrentView(_) => ctx.print("<getCurrentView>", false),
        E::RestoreView(e) => match &e.view {
            RestoreViewTarget::Static(view) => ctx.print(&format!("<restoreView {:?}>", view), false),
            RestoreViewTarget::Dynamic(inner) => {
                ctx.print("<restoreView ", false);
                visit_expression(inner, ctx);
                ctx.print(">", false);
            }
        },
        E::ResetView(e) => {
            ctx.print("<resetView ", false);
            visit_expression(&e.expr, ctx);
            ctx.print(">", false);
        }
        E::ReadVariable(e) => match &e.name {
            Some(name) => ctx.print(name, false),
            None => ctx.print(&format!("<var {:?}>", e.xref), false),
        },
        E::PureFunctionParameter(e) => ctx.print(&format!("a{}", e.index), false),
        E::ReadTemporary(e) => match &e.name {
            Some(name) => ctx.print(name, false),
            None => ctx.print(&format!("<tmp {:?}>", e.xref), false),
        },
        E::AssignTemporary(e) => {
            ctx.print(&format!("<{:?} = ", e.xref), false);
            visit_expression(&e.expr, ctx);
            ctx.print(">", false);
        }
        E::SlotLiteral(e) => match e.slot.slot() {
            Some(slot) => ctx.print(&slot.to_string(), false),
            None => ctx.print("<slot>", false),
        },
        E::Empty(_) => ctx.print("<empty>", false),
        other => ctx.print(&format!("<{}>", ir_kind_name(other)), false),
    }
}

fn ir_kind_name(expr: &o::Expression) -> &'static str {
    use o::Expression as E;
    match expr {
        E::PureFunction(_) => "pureFunction",
        E::PipeBinding(_) => "pipeBind",
        E::PipeBindingVariadic(_) => "pipeBindV",
        E::SafePropertyRead(_) => "safeProp",
        E::SafeKeyedRead(_) => "safeKey",
        E::SafeInvokeFunction(_) => "safeInvoke",
        E::SafeTernary(_) => "safeTernary",
        E::ConditionalCase(_) => "conditionalCase",
        E::TwoWayBindingSet(_) => "twoWayBindingSet",
        E::ContextLetReference(_) => "contextLetReference",
        E::StoreLet(_) => "storeLet",
        E::TrackContext(_) => "trackContext",
        E::ConstCollected(_) => "constCollected",
        _ => "ir",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::output_ast::{literal, literal_arr, variable};

    #[test]
    fn test_emit_call_with_literals() {
        let call = variable("foo").call_fn(vec![literal(0.0), literal("div"), literal_arr(vec![])]);
        assert_eq!(emit_expression(&call), "foo(0, 'div', [])");
    }

    #[test]
    fn test_loose_operands_are_wrapped() {
        let negate = |expr| {
            o::Expression::Unary(o::UnaryOperatorExpr {
                operator: o::UnaryOperator::Minus,
                expr: Box::new(expr),
            })
        };
        assert_eq!(emit_expression(&negate(negate(variable("x")))), "-(-x)");
        let read = o::Expression::ReadProp(o::ReadPropExpr {
            receiver: Box::new(negate(variable("a"))),
            name: "b".into(),
        });
        assert_eq!(emit_expression(&read), "(-a).b");
    }

    #[test]
    fn test_escape_identifier_quotes_illegal_names() {
        assert_eq!(escape_identifier("ok_name", false, false), "ok_name");
        assert_eq!(escape_identifier("aria-label", false, false), "'aria-label'");
    }
}
