//! Constant Pool
//!
//! ConstantPool hoists literals and shared functions out of template functions into module-level
//! declarations, and hands out unique names for everything the pipeline declares.

use indexmap::IndexMap;

use crate::output::output_ast as o;

const CONSTANT_PREFIX: &str = "_c";
const POOL_INCLUSION_LENGTH_THRESHOLD_FOR_STRINGS: usize = 50;

/// A hoisted literal and whether it already has a shared declaration.
#[derive(Debug, Clone)]
struct PooledLiteral {
    resolved: o::Expression,
    shared: bool,
}

/// Describes how a family of shared constants is keyed and declared.
pub trait SharedConstantDefinition {
    fn key_of(&self, expr: &o::Expression) -> String;
    fn to_shared_constant_declaration(&self, name: String, expr: o::Expression) -> o::Statement;
}

/// Generic key function (for expression deduplication)
pub struct GenericKeyFn;

impl GenericKeyFn {
    pub const INSTANCE: GenericKeyFn = GenericKeyFn;

    pub fn key_of(&self, expr: &o::Expression) -> String {
        format!("{:?}", expr)
    }
}

#[derive(Debug, Default)]
pub struct ConstantPool {
    pub statements: Vec<o::Statement>,
    literals: IndexMap<String, PooledLiteral>,
    shared_constants: IndexMap<String, o::Expression>,
    claimed_names: IndexMap<String, u32>,
    next_name_index: u32,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an expression to use in place of `literal`.
    ///
    /// Literals seen for the first time stay inline unless `force_shared` is set; the second
    /// sighting declares a `_cN` constant that this and every later use refers to.
    pub fn get_const_literal(&mut self, literal: o::Expression, force_shared: bool) -> o::Expression {
        if is_simple_literal(&literal) {
            return literal;
        }

        let key = GenericKeyFn::INSTANCE.key_of(&literal);
        match self.literals.get(&key) {
            Some(pooled) if pooled.shared => return pooled.resolved.clone(),
            Some(_) => {}
            None if !force_shared => {
                self.literals.insert(
                    key,
                    PooledLiteral {
                        resolved: literal.clone(),
                        shared: false,
                    },
                );
                return literal;
            }
            None => {}
        }

        let name = self.fresh_name();
        self.statements
            .push(o::declare_var(name.clone(), Some(literal), o::StmtModifier::FINAL));
        let reference = o::variable(name);
        self.literals.insert(
            key,
            PooledLiteral {
                resolved: reference.clone(),
                shared: true,
            },
        );
        reference
    }

    pub fn get_shared_constant(
        &mut self,
        definition: &dyn SharedConstantDefinition,
        initial_value: o::Expression,
    ) -> o::Expression {
        let key = definition.key_of(&initial_value);
        if let Some(existing) = self.shared_constants.get(&key) {
            return existing.clone();
        }

        let id = self.fresh_name();
        let stmt = definition.to_shared_constant_declaration(id.clone(), initial_value);
        self.statements.push(stmt);

        let var_expr = o::variable(id);
        self.shared_constants.insert(key, var_expr.clone());
        var_expr
    }

    /// Declares `fn_expr` at module level, reusing an equivalent earlier declaration if one exists.
    pub fn get_shared_function_reference(
        &mut self,
        fn_expr: o::Expression,
        prefix: &str,
        use_unique_name: bool,
    ) -> o::Expression {
        for stmt in &self.statements {
            if let o::Statement::DeclareVar(decl) = stmt {
                if let Some(value) = &decl.value {
                    if value.is_equivalent(&fn_expr) {
                        return o::variable(decl.name.clone());
                    }
                }
            }
        }

        let name = if use_unique_name {
            self.unique_name(prefix, true)
        } else {
            prefix.to_string()
        };
        self.statements
            .push(o::declare_var(name.clone(), Some(fn_expr), o::StmtModifier::FINAL));
        o::variable(name)
    }

    /// Claims a module-unique name. The first claim of `name` gets it unchanged unless
    /// `always_include_suffix` is set; later claims get a numeric suffix.
    pub fn unique_name(&mut self, name: &str, always_include_suffix: bool) -> String {
        let count = self.claimed_names.get(name).copied().unwrap_or(0);
        let result = if count == 0 && !always_include_suffix {
            name.to_string()
        } else {
            format!("{}{}", name, count)
        };
        self.claimed_names.insert(name.to_string(), count + 1);
        result
    }

    fn fresh_name(&mut self) -> String {
        let name = format!("{}{}", CONSTANT_PREFIX, self.next_name_index);
        self.next_name_index += 1;
        name
    }
}

fn is_simple_literal(expr: &o::Expression) -> bool {
    match expr {
        o::Expression::Literal(lit) => match &lit.value {
            o::LiteralValue::String(s) => s.len() < POOL_INCLUSION_LENGTH_THRESHOLD_FOR_STRINGS,
            _ => true,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr() -> o::Expression {
        o::literal_arr(vec![o::literal("a"), o::literal("b")])
    }

    #[test]
    fn test_literal_shared_on_second_use() {
        let mut pool = ConstantPool::new();
        let first = pool.get_const_literal(arr(), false);
        assert!(matches!(first, o::Expression::LiteralArray(_)));
        let second = pool.get_const_literal(arr(), false);
        assert!(matches!(second, o::Expression::ReadVar(ref v) if v.name == "_c0"));
        let third = pool.get_const_literal(arr(), false);
        assert!(third.is_equivalent(&second));
        assert_eq!(pool.statements.len(), 1);
    }

    #[test]
    fn test_forced_literal_is_shared_immediately() {
        let mut pool = ConstantPool::new();
        let shared = pool.get_const_literal(arr(), true);
        assert!(matches!(shared, o::Expression::ReadVar(ref v) if v.name == "_c0"));
    }

    #[test]
    fn test_unique_name_suffixes() {
        let mut pool = ConstantPool::new();
        assert_eq!(pool.unique_name("Cmp_div_0_Template", false), "Cmp_div_0_Template");
        assert_eq!(pool.unique_name("Cmp_div_0_Template", false), "Cmp_div_0_Template1");
        assert_eq!(pool.unique_name("_forTrack", true), "_forTrack0");
    }

    #[test]
    fn test_shared_function_deduplicates() {
        let mut pool = ConstantPool::new();
        let f = o::arrow_fn(
            vec![o::FnParam { name: "$index".into() }],
            o::ArrowFunctionBody::Expression(Box::new(o::variable("$index"))),
        );
        let a = pool.get_shared_function_reference(f.clone(), "_forTrack", true);
        let b = pool.get_shared_function_reference(f, "_forTrack", true);
        assert!(a.is_equivalent(&o::variable("_forTrack0")));
        assert!(a.is_equivalent(&b));
        assert_eq!(pool.statements.len(), 1);
    }
}
