use crate::context::Context;
use crate::error::{Error, Result};
use crate::value::Value;

use super::ast::{BinOp, Expr, UnaryOp};

/// Evaluates `expr` against `ctx`. This is the evaluator's only entry
/// point — codecs never interpret strings directly (spec §4.2).
pub fn eval(expr: &Expr, ctx: &Context) -> Result<Value> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::ContextRef(name) => ctx.get(name).cloned().ok_or_else(|| unresolved(name)),
        Expr::FieldAccess(base, field) => {
            let base_val = eval(base, ctx)?;
            match &base_val {
                Value::Struct(s) => s.get(field).cloned().ok_or_else(|| unresolved(field)),
                other => Err(Error::Expression {
                    expression: field.clone(),
                    message: format!("cannot access field `{field}` on {other:?}"),
                }),
            }
        }
        Expr::MethodCall(base, method, args) => {
            let base_val = eval(base, ctx)?;
            let arg_vals: Result<Vec<Value>> = args.iter().map(|a| eval(a, ctx)).collect();
            let arg_vals = arg_vals?;
            match &base_val {
                Value::Host(obj) => obj.call(method, &arg_vals),
                other => Err(Error::Expression {
                    expression: method.clone(),
                    message: format!("cannot call method `{method}` on {other:?}"),
                }),
            }
        }
        Expr::StaticCall(type_path, method, args) => {
            let arg_vals: Result<Vec<Value>> = args.iter().map(|a| eval(a, ctx)).collect();
            let arg_vals = arg_vals?;
            ctx.static_call(type_path, method, &arg_vals).unwrap_or_else(|| {
                Err(Error::Expression {
                    expression: format!("T({type_path}).{method}"),
                    message: "static call is not in the allowlist".to_string(),
                })
            })
        }
        Expr::Unary(op, inner) => eval_unary(*op, &eval(inner, ctx)?),
        Expr::Binary(op, lhs, rhs) => {
            // short-circuit boolean operators
            match op {
                BinOp::And => {
                    let l = eval(lhs, ctx)?.as_bool()?;
                    if !l {
                        return Ok(Value::Bool(false));
                    }
                    return Ok(Value::Bool(eval(rhs, ctx)?.as_bool()?));
                }
                BinOp::Or => {
                    let l = eval(lhs, ctx)?.as_bool()?;
                    if l {
                        return Ok(Value::Bool(true));
                    }
                    return Ok(Value::Bool(eval(rhs, ctx)?.as_bool()?));
                }
                _ => {}
            }
            let l = eval(lhs, ctx)?;
            let r = eval(rhs, ctx)?;
            eval_binary(*op, &l, &r)
        }
        Expr::Ternary(cond, then_branch, else_branch) => {
            if eval(cond, ctx)?.as_bool()? {
                eval(then_branch, ctx)
            } else {
                eval(else_branch, ctx)
            }
        }
    }
}

fn unresolved(name: &str) -> Error {
    Error::Expression {
        expression: name.to_string(),
        message: format!("unresolved identifier `{name}`"),
    }
}

fn eval_unary(op: UnaryOp, v: &Value) -> Result<Value> {
    match op {
        UnaryOp::Neg => match v {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => type_error("unary -", other),
        },
        UnaryOp::Not => Ok(Value::Bool(!v.as_bool()?)),
        UnaryOp::BitNot => Ok(Value::Int(!v.as_i64()?)),
    }
}

fn eval_binary(op: BinOp, l: &Value, r: &Value) -> Result<Value> {
    use BinOp::*;
    match op {
        Add => numeric_or_concat(l, r, |a, b| a + b, |a, b| a + b),
        Sub => numeric(l, r, |a, b| a - b, |a, b| a - b),
        Mul => numeric(l, r, |a, b| a * b, |a, b| a * b),
        Div => checked_numeric(l, r, "/", i64::checked_div, |a, b| a / b),
        Mod => checked_numeric(l, r, "%", i64::checked_rem, |a, b| a % b),
        Eq => Ok(Value::Bool(values_equal(l, r))),
        Ne => Ok(Value::Bool(!values_equal(l, r))),
        Lt => Ok(Value::Bool(compare(l, r)? < 0)),
        Le => Ok(Value::Bool(compare(l, r)? <= 0)),
        Gt => Ok(Value::Bool(compare(l, r)? > 0)),
        Ge => Ok(Value::Bool(compare(l, r)? >= 0)),
        BitAnd => Ok(Value::Int(l.as_i64()? & r.as_i64()?)),
        BitOr => Ok(Value::Int(l.as_i64()? | r.as_i64()?)),
        BitXor => Ok(Value::Int(l.as_i64()? ^ r.as_i64()?)),
        Shl => Ok(Value::Int(l.as_i64()? << r.as_i64()?)),
        Shr => Ok(Value::Int(l.as_i64()? >> r.as_i64()?)),
        And | Or => unreachable!("short-circuited above"),
    }
}

fn type_error(op: &str, v: &Value) -> Result<Value> {
    Err(Error::Expression {
        expression: op.to_string(),
        message: format!("unsupported operand {v:?}"),
    })
}

fn numeric(
    l: &Value,
    r: &Value,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    match (l, r) {
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            let a = as_f64(l)?;
            let b = as_f64(r)?;
            Ok(Value::Float(float_op(a, b)))
        }
        _ => Ok(Value::Int(int_op(l.as_i64()?, r.as_i64()?))),
    }
}

/// Like [`numeric`], but for `/` and `%`: a zero integer divisor must
/// surface as an [`Error::Expression`] (spec §7 "Evaluation errors ...
/// surface as an ExpressionError"), not a panic, since a malformed
/// message can make a size/condition/validator expression divide by a
/// wire-derived field that happens to be zero. Float division by zero
/// doesn't panic in Rust (it yields `inf`/`NaN`), so only the integer
/// path needs the `checked_*` guard.
fn checked_numeric(
    l: &Value,
    r: &Value,
    op: &str,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    match (l, r) {
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            let a = as_f64(l)?;
            let b = as_f64(r)?;
            Ok(Value::Float(float_op(a, b)))
        }
        _ => {
            let a = l.as_i64()?;
            let b = r.as_i64()?;
            int_op(a, b).map(Value::Int).ok_or_else(|| Error::Expression {
                expression: format!("{a} {op} {b}"),
                message: "division by zero".to_string(),
            })
        }
    }
}

fn numeric_or_concat(
    l: &Value,
    r: &Value,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    if let (Value::Str(a), Value::Str(b)) = (l, r) {
        return Ok(Value::Str(format!("{a}{b}")));
    }
    numeric(l, r, int_op, float_op)
}

fn as_f64(v: &Value) -> Result<f64> {
    match v {
        Value::Float(f) => Ok(*f),
        other => Ok(other.as_i64()? as f64),
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        _ => {
            if let (Ok(a), Ok(b)) = (l.as_i64(), r.as_i64()) {
                a == b
            } else {
                false
            }
        }
    }
}

fn compare(l: &Value, r: &Value) -> Result<i32> {
    if let (Value::Str(a), Value::Str(b)) = (l, r) {
        return Ok(match a.cmp(b) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        });
    }
    let a = as_f64(l)?;
    let b = as_f64(r)?;
    Ok(if a < b {
        -1
    } else if a > b {
        1
    } else {
        0
    })
}
