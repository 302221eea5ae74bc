//! Runtime values.
//!
//! Every value the evaluator touches is one [`Value`] variant. S- and
//! Q-expressions hold their children in a `VecDeque` because evaluation
//! keeps popping heads off argument lists while builtins append at the
//! tail.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Node, NodeKind};
use crate::env::Environment;

/// A shared, mutable environment handle.
pub type EnvRef = Rc<RefCell<Environment>>;

/// The signature of a builtin function: the environment the call happens
/// in, and the argument list as an S-expression value.
pub type BuiltinFn = fn(&EnvRef, Value) -> Value;

/// A callable value.
#[derive(Debug, PartialEq)]
pub enum Function {
    /// A native function registered on an environment.
    Builtin(BuiltinFn),
    /// A user-defined function: captured environment, formal parameter
    /// list and body. Calling one is not implemented yet; the variant
    /// exists so the data model is complete.
    Lambda {
        /// The environment captured at definition time.
        env: EnvRef,
        /// The formal parameters, a Q-expression of symbols.
        formals: Box<Value>,
        /// The body, a Q-expression.
        body: Box<Value>,
    },
}

impl Clone for Function {
    fn clone(&self) -> Self {
        match self {
            Function::Builtin(f) => Function::Builtin(*f),
            // A copied lambda owns a deep copy of its captured environment.
            Function::Lambda { env, formals, body } => Function::Lambda {
                env: Rc::new(RefCell::new(env.borrow().deep_copy())),
                formals: formals.clone(),
                body: body.clone(),
            },
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A first-class error. Evaluation propagates these instead of
    /// unwinding.
    Error(String),
    /// An unsigned integer.
    Number(u64),
    /// A symbol, looked up in the environment when evaluated.
    Symbol(String),
    /// A string.
    Str(String),
    /// A callable.
    Function(Function),
    /// An evaluated, parenthesized list.
    SExpr(VecDeque<Value>),
    /// A quoted, brace-enclosed list; evaluates to itself.
    QExpr(VecDeque<Value>),
}

impl Value {
    /// Creates an error value.
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    /// Creates a number value.
    pub fn number(value: u64) -> Self {
        Value::Number(value)
    }

    /// Creates a symbol value.
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    /// Creates a string value.
    pub fn string(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    /// Creates a builtin function value.
    pub fn builtin(function: BuiltinFn) -> Self {
        Value::Function(Function::Builtin(function))
    }

    /// Creates a user-defined function value with a fresh captured
    /// environment.
    pub fn lambda(formals: Value, body: Value) -> Self {
        Value::Function(Function::Lambda {
            env: Environment::new_ref(),
            formals: Box::new(formals),
            body: Box::new(body),
        })
    }

    /// Creates an empty S-expression.
    pub fn sexpr() -> Self {
        Value::SExpr(VecDeque::new())
    }

    /// Creates an empty Q-expression.
    pub fn qexpr() -> Self {
        Value::QExpr(VecDeque::new())
    }

    /// Appends a value at the tail of an S- or Q-expression.
    ///
    /// # Panics
    ///
    /// Panics when called on a non-expression value.
    pub fn push(&mut self, value: Value) {
        match self {
            Value::SExpr(items) | Value::QExpr(items) => items.push_back(value),
            _ => panic!("push on a non-expression value"),
        }
    }

    /// Splices all children of `other` onto the tail of this expression,
    /// leaving `other` empty.
    ///
    /// # Panics
    ///
    /// Panics when either value is not an expression.
    pub fn join(&mut self, other: &mut Value) {
        match (self, other) {
            (
                Value::SExpr(items) | Value::QExpr(items),
                Value::SExpr(tail) | Value::QExpr(tail),
            ) => items.append(tail),
            _ => panic!("join on a non-expression value"),
        }
    }

    /// The human-readable name of this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Error(_) => "Error",
            Value::Number(_) => "Number",
            Value::Symbol(_) => "Symbol",
            Value::Str(_) => "String",
            Value::Function(_) => "Function",
            Value::SExpr(_) => "S-Expression",
            Value::QExpr(_) => "Q-Expression",
        }
    }

    /// Converts an AST node into a value.
    ///
    /// Numbers parse as unsigned integers (a literal exceeding the number
    /// range becomes an error value), comments convert to strings, and an
    /// `Expression` wrapper is transparent.
    pub fn from_ast(node: &Node) -> Value {
        match node.kind {
            NodeKind::Number => match node.value.parse::<u64>() {
                Ok(number) => Value::Number(number),
                Err(_) => Value::error(format!("Number literal '{}' is out of range!", node.value)),
            },
            NodeKind::Symbol => Value::Symbol(node.value.clone()),
            NodeKind::String | NodeKind::Comment => Value::Str(node.value.clone()),
            NodeKind::Expression => {
                debug_assert_eq!(node.children.len(), 1);
                Value::from_ast(&node.children[0])
            }
            NodeKind::SExpression | NodeKind::QExpression | NodeKind::Program => {
                let mut items = VecDeque::with_capacity(node.children.len());
                for child in &node.children {
                    items.push_back(Value::from_ast(child));
                }
                if node.kind == NodeKind::QExpression {
                    Value::QExpr(items)
                } else {
                    Value::SExpr(items)
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Error(message) => write!(f, "Error: {}", message),
            Value::Number(number) => write!(f, "{}", number),
            Value::Symbol(name) => write!(f, "{}", name),
            Value::Str(text) => write!(f, "\"{}\"", text),
            Value::Function(Function::Builtin(_)) => write!(f, "<builtin>"),
            Value::Function(Function::Lambda { formals, body, .. }) => {
                write!(f, "\\ {} {}", formals, body)
            }
            Value::SExpr(items) => fmt_expr(f, items, '(', ')'),
            Value::QExpr(items) => fmt_expr(f, items, '{', '}'),
        }
    }
}

fn fmt_expr(
    f: &mut fmt::Formatter<'_>,
    items: &VecDeque<Value>,
    open: char,
    close: char,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::Blackboard;
    use crate::{lexer, parser};

    fn values_of(source: &str) -> Vec<Value> {
        let mut bb = Blackboard::new("<test>", source);
        lexer::tokenize(&mut bb);
        parser::parse(&mut bb);
        assert!(bb.diagnostics.is_empty(), "{:?}", bb.diagnostics);
        bb.ast.children.iter().map(Value::from_ast).collect()
    }

    #[test]
    fn test_print_atoms() {
        assert_eq!(Value::number(42).to_string(), "42");
        assert_eq!(Value::symbol("head").to_string(), "head");
        assert_eq!(Value::string("hi").to_string(), "\"hi\"");
        assert_eq!(Value::error("boom").to_string(), "Error: boom");
    }

    #[test]
    fn test_print_expressions() {
        let mut sexpr = Value::sexpr();
        sexpr.push(Value::symbol("add"));
        sexpr.push(Value::number(1));
        sexpr.push(Value::number(2));
        assert_eq!(sexpr.to_string(), "(add 1 2)");

        let mut qexpr = Value::qexpr();
        qexpr.push(Value::number(7));
        assert_eq!(qexpr.to_string(), "{7}");

        assert_eq!(Value::sexpr().to_string(), "()");
    }

    #[test]
    fn test_print_nested() {
        let mut inner = Value::qexpr();
        inner.push(Value::symbol("x"));
        let mut outer = Value::sexpr();
        outer.push(Value::symbol("eval"));
        outer.push(inner);
        assert_eq!(outer.to_string(), "(eval {x})");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::error("e").type_name(), "Error");
        assert_eq!(Value::number(0).type_name(), "Number");
        assert_eq!(Value::symbol("s").type_name(), "Symbol");
        assert_eq!(Value::string("t").type_name(), "String");
        assert_eq!(Value::sexpr().type_name(), "S-Expression");
        assert_eq!(Value::qexpr().type_name(), "Q-Expression");
        assert_eq!(
            Value::lambda(Value::qexpr(), Value::qexpr()).type_name(),
            "Function"
        );
    }

    #[test]
    fn test_push_and_join() {
        let mut a = Value::qexpr();
        a.push(Value::number(1));
        let mut b = Value::qexpr();
        b.push(Value::number(2));
        b.push(Value::number(3));

        a.join(&mut b);
        assert_eq!(a.to_string(), "{1 2 3}");
        assert_eq!(b.to_string(), "{}");
    }

    #[test]
    fn test_from_ast_atoms() {
        let values = values_of("42 foo \"bar\"\n");
        assert_eq!(values[0], Value::number(42));
        assert_eq!(values[1], Value::symbol("foo"));
        assert_eq!(values[2], Value::string("bar"));
    }

    #[test]
    fn test_from_ast_comment_is_string() {
        let values = values_of("; remark\n");
        assert_eq!(values[0], Value::string(" remark"));
    }

    #[test]
    fn test_from_ast_expressions() {
        let values = values_of("(a {b 1})\n");
        assert_eq!(values[0].to_string(), "(a {b 1})");
        match &values[0] {
            Value::SExpr(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(items[1], Value::QExpr(_)));
            }
            other => panic!("expected S-Expression, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_from_ast_number_overflow_is_error() {
        let values = values_of("99999999999999999999999999\n");
        assert!(matches!(values[0], Value::Error(_)));
    }

    #[test]
    fn test_print_parse_round_trip() {
        // Printing a converted value and parsing the result again must
        // print identically.
        for source in ["42\n", "foo\n", "\"text\"\n", "(a (b 1) {c {d}})\n", "{}\n"] {
            let first = values_of(source);
            let printed = format!("{}\n", first[0]);
            let second = values_of(&printed);
            assert_eq!(first[0].to_string(), second[0].to_string());
        }
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let mut original = Value::qexpr();
        original.push(Value::number(1));
        let copy = original.clone();
        original.push(Value::number(2));

        assert_eq!(original.to_string(), "{1 2}");
        assert_eq!(copy.to_string(), "{1}");
    }
}
