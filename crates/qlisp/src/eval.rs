//! The evaluator.

use crate::value::{EnvRef, Function, Value};

/// Evaluates a value in an environment.
///
/// The value is consumed; the result is a freshly constructed value.
/// Errors, numbers, strings, functions and Q-expressions evaluate to
/// themselves, symbols are looked up, and S-expressions are applied.
pub fn eval(env: &EnvRef, value: Value) -> Value {
    match value {
        Value::Symbol(name) => env.borrow().get(&name),
        Value::SExpr(_) => eval_sexpr(env, value),
        other => other,
    }
}

/// Evaluates an S-expression.
///
/// - An empty S-expression is returned as-is.
/// - Every child is evaluated left to right; the first error short-circuits.
/// - A single-element S-expression is transparent: its element is
///   evaluated again and returned.
/// - Otherwise the head must be a function; it is applied to the remaining
///   elements.
fn eval_sexpr(env: &EnvRef, value: Value) -> Value {
    let mut items = match value {
        Value::SExpr(items) => items,
        _ => unreachable!("eval_sexpr called on a non-S-expression"),
    };

    if items.is_empty() {
        return Value::SExpr(items);
    }

    for slot in items.iter_mut() {
        let child = std::mem::replace(slot, Value::Number(0));
        let evaluated = eval(env, child);
        if let Value::Error(_) = evaluated {
            return evaluated;
        }
        *slot = evaluated;
    }

    if items.len() == 1 {
        let only = items.pop_front().expect("length checked above");
        return eval(env, only);
    }

    let head = items.pop_front().expect("non-empty checked above");
    let function = match head {
        Value::Function(function) => function,
        other => {
            return Value::error(format!(
                "S-Expression starts with incorrect type! Got {}, expected Function!",
                other.type_name()
            ));
        }
    };

    call(env, function, Value::SExpr(items))
}

fn call(env: &EnvRef, function: Function, arguments: Value) -> Value {
    match function {
        Function::Builtin(builtin) => builtin(env, arguments),
        Function::Lambda { .. } => Value::error("User-defined functions are not implemented yet!"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::Blackboard;
    use crate::env::Environment;
    use crate::{lexer, parser};

    /// Lex, parse, convert and evaluate every top-level datum, returning
    /// the results.
    fn eval_source(env: &EnvRef, source: &str) -> Vec<Value> {
        let mut bb = Blackboard::new("<test>", source);
        lexer::tokenize(&mut bb);
        parser::parse(&mut bb);
        assert!(bb.diagnostics.is_empty(), "{:?}", bb.diagnostics);
        bb.ast
            .children
            .iter()
            .map(|node| eval(env, Value::from_ast(node)))
            .collect()
    }

    #[test]
    fn test_self_evaluating_values() {
        let env = Environment::new_ref();
        let results = eval_source(&env, "42 \"text\" {a b}\n");
        assert_eq!(results[0].to_string(), "42");
        assert_eq!(results[1].to_string(), "\"text\"");
        assert_eq!(results[2].to_string(), "{a b}");
    }

    #[test]
    fn test_empty_sexpr_evaluates_to_itself() {
        let env = Environment::new_ref();
        let results = eval_source(&env, "()\n");
        assert_eq!(results[0].to_string(), "()");
    }

    #[test]
    fn test_unbound_symbol_is_error() {
        let env = Environment::new_ref();
        let results = eval_source(&env, "foo\n");
        assert_eq!(results[0], Value::error("Unbound symbol 'foo'!"));
    }

    #[test]
    fn test_bound_symbol_resolves() {
        let env = Environment::new_ref();
        env.borrow_mut().put("x", Value::number(5));
        let results = eval_source(&env, "x\n");
        assert_eq!(results[0], Value::number(5));
    }

    #[test]
    fn test_single_element_sexpr_is_transparent() {
        let env = Environment::new_ref();
        env.borrow_mut().put("x", Value::number(5));
        // ((x)) evaluates to the same thing as x.
        let results = eval_source(&env, "((x))\n");
        assert_eq!(results[0], Value::number(5));
    }

    #[test]
    fn test_error_short_circuits_children() {
        fn explode(_env: &EnvRef, _args: Value) -> Value {
            panic!("must not be called");
        }
        let env = Environment::new_ref();
        env.borrow_mut().add_builtin("explode", explode);
        // The unbound symbol errors before `explode` is ever applied.
        let results = eval_source(&env, "(explode missing)\n");
        assert_eq!(results[0], Value::error("Unbound symbol 'missing'!"));
    }

    #[test]
    fn test_non_function_head_is_error() {
        let env = Environment::new_ref();
        let results = eval_source(&env, "(1 2 3)\n");
        assert_eq!(
            results[0],
            Value::error("S-Expression starts with incorrect type! Got Number, expected Function!")
        );
    }

    #[test]
    fn test_builtin_receives_evaluated_arguments() {
        fn sum(_env: &EnvRef, args: Value) -> Value {
            let items = match args {
                Value::SExpr(items) => items,
                other => return Value::error(format!("expected arguments, got {}", other)),
            };
            let mut total: u64 = 0;
            for item in items {
                match item {
                    Value::Number(n) => total += n,
                    other => {
                        return Value::error(format!(
                            "Cannot operate on non-number! Got {}.",
                            other.type_name()
                        ))
                    }
                }
            }
            Value::number(total)
        }

        let env = Environment::new_ref();
        env.borrow_mut().add_builtin("add", sum);
        env.borrow_mut().put("x", Value::number(10));

        let results = eval_source(&env, "(add 1 2 x)\n");
        assert_eq!(results[0], Value::number(13));
    }

    #[test]
    fn test_builtin_can_define_bindings() {
        fn define(env: &EnvRef, args: Value) -> Value {
            let mut items = match args {
                Value::SExpr(items) => items,
                _ => return Value::error("malformed arguments"),
            };
            let name = match items.pop_front() {
                Some(Value::QExpr(mut q)) => match q.pop_front() {
                    Some(Value::Symbol(name)) => name,
                    _ => return Value::error("def expects a symbol"),
                },
                _ => return Value::error("def expects a Q-Expression"),
            };
            let value = match items.pop_front() {
                Some(value) => value,
                None => return Value::error("def expects a value"),
            };
            env.borrow_mut().def(&name, value);
            Value::sexpr()
        }

        let env = Environment::new_ref();
        env.borrow_mut().add_builtin("def", define);

        let results = eval_source(&env, "(def {answer} 42) answer\n");
        assert_eq!(results[0].to_string(), "()");
        assert_eq!(results[1], Value::number(42));
    }

    #[test]
    fn test_calling_lambda_is_unimplemented() {
        let env = Environment::new_ref();
        env.borrow_mut()
            .put("f", Value::lambda(Value::qexpr(), Value::qexpr()));
        let results = eval_source(&env, "(f 1)\n");
        assert_eq!(
            results[0],
            Value::error("User-defined functions are not implemented yet!")
        );
    }

    #[test]
    fn test_qexpr_contents_not_evaluated() {
        let env = Environment::new_ref();
        // `missing` is unbound, but inside a Q-expression nothing runs.
        let results = eval_source(&env, "{missing (1 2)}\n");
        assert_eq!(results[0].to_string(), "{missing (1 2)}");
    }
}
