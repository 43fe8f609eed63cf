//! The restricted expression dialect used for conditions, sizes,
//! selectors, and default values (spec §4.2).

mod ast;
mod interpreter;
mod lexer;
mod parser;

pub use ast::{BinOp, Expr, UnaryOp};
pub use interpreter::eval;
pub use parser::parse;

use crate::context::Context;
use crate::error::Result;
use crate::value::Value;

/// Parses and evaluates `src` in one step, used by descriptors whose
/// expressions are interpreted fresh every call (e.g. array lengths that
/// may depend on `#self`).
pub fn eval_str(src: &str, ctx: &Context) -> Result<Value> {
    eval(&parse(src)?, ctx)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;

    use crate::error::{Error, Result as BoxonResult};
    use crate::value::HostObject;

    use super::*;

    #[test]
    fn ternary_picks_the_matching_branch() {
        let ctx = Context::default();
        assert_eq!(eval_str("1 < 2 ? 'yes' : 'no'", &ctx).unwrap(), Value::Str("yes".to_string()));
        assert_eq!(eval_str("1 > 2 ? 'yes' : 'no'", &ctx).unwrap(), Value::Str("no".to_string()));
    }

    #[test]
    fn integer_division_by_zero_is_an_expression_error_not_a_panic() {
        let ctx = Context::default();
        assert!(eval_str("1 / 0", &ctx).is_err());
        assert!(eval_str("1 % 0", &ctx).is_err());
    }

    #[derive(Debug)]
    struct DeviceTypes;

    impl HostObject for DeviceTypes {
        fn call(&self, method: &str, args: &[Value]) -> BoxonResult<Value> {
            match method {
                "nameFor" => {
                    let code = args[0].as_i64()?;
                    Ok(Value::Str(if code == 1 { "tracker".to_string() } else { "unknown".to_string() }))
                }
                other => Err(Error::Expression {
                    expression: other.to_string(),
                    message: "no such method".to_string(),
                }),
            }
        }
    }

    #[test]
    fn method_call_dispatches_to_the_host_object() {
        let mut base = IndexMap::new();
        base.insert("deviceTypes".to_string(), Value::Host(Arc::new(DeviceTypes)));
        let ctx = Context::new(base);

        assert_eq!(eval_str("#deviceTypes.nameFor(1)", &ctx).unwrap(), Value::Str("tracker".to_string()));
    }

    #[test]
    fn static_call_resolves_through_the_allowlist() {
        let mut ctx = Context::default();
        ctx.register_static("com.example.Math", "double", Arc::new(|args: &[Value]| Ok(Value::Int(args[0].as_i64()? * 2))));

        assert_eq!(eval_str("T(com.example.Math).double(21)", &ctx).unwrap(), Value::Int(42));
    }

    #[test]
    fn static_call_outside_the_allowlist_is_an_error() {
        let ctx = Context::default();
        assert!(eval_str("T(com.example.Math).double(21)", &ctx).is_err());
    }
}
