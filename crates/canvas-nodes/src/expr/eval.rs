//! Expression evaluation over record values

use serde_json::Value;

use super::parser::{Ast, BinaryOp, UnaryOp};
use super::ExprError;

/// Evaluate an expression tree against a record
pub(crate) fn eval(ast: &Ast, record: &Value) -> Result<Value, ExprError> {
    match ast {
        Ast::Literal(value) => Ok(value.clone()),
        Ast::Field(path) => Ok(resolve_field(record, path)),
        Ast::Unary { op, operand } => {
            let value = eval(operand, record)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                UnaryOp::Neg => {
                    let n = as_number(&value).ok_or_else(|| {
                        ExprError::eval(format!("cannot negate {}", type_name(&value)))
                    })?;
                    Ok(number_value(-n))
                }
            }
        }
        Ast::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, record),
        Ast::Call { function, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg, record)?);
            }
            call_builtin(function, &values)
        }
    }
}

fn eval_binary(op: BinaryOp, lhs: &Ast, rhs: &Ast, record: &Value) -> Result<Value, ExprError> {
    // Short-circuit boolean operators
    match op {
        BinaryOp::Or => {
            let left = eval(lhs, record)?;
            if truthy(&left) {
                return Ok(Value::Bool(true));
            }
            let right = eval(rhs, record)?;
            return Ok(Value::Bool(truthy(&right)));
        }
        BinaryOp::And => {
            let left = eval(lhs, record)?;
            if !truthy(&left) {
                return Ok(Value::Bool(false));
            }
            let right = eval(rhs, record)?;
            return Ok(Value::Bool(truthy(&right)));
        }
        _ => {}
    }

    let left = eval(lhs, record)?;
    let right = eval(rhs, record)?;

    match op {
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(&left, &right))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_eq(&left, &right))),
        BinaryOp::Lt => compare(&left, &right, |o| o == std::cmp::Ordering::Less),
        BinaryOp::LtEq => compare(&left, &right, |o| o != std::cmp::Ordering::Greater),
        BinaryOp::Gt => compare(&left, &right, |o| o == std::cmp::Ordering::Greater),
        BinaryOp::GtEq => compare(&left, &right, |o| o != std::cmp::Ordering::Less),
        BinaryOp::Add => {
            // String + anything concatenates; otherwise numeric addition
            if left.is_string() || right.is_string() {
                Ok(Value::String(format!(
                    "{}{}",
                    display_string(&left),
                    display_string(&right)
                )))
            } else {
                arithmetic(&left, &right, "+", |a, b| Ok(a + b))
            }
        }
        BinaryOp::Sub => arithmetic(&left, &right, "-", |a, b| Ok(a - b)),
        BinaryOp::Mul => arithmetic(&left, &right, "*", |a, b| Ok(a * b)),
        BinaryOp::Div => arithmetic(&left, &right, "/", |a, b| {
            if b == 0.0 {
                Err(ExprError::eval("division by zero"))
            } else {
                Ok(a / b)
            }
        }),
        BinaryOp::Rem => arithmetic(&left, &right, "%", |a, b| {
            if b == 0.0 {
                Err(ExprError::eval("division by zero"))
            } else {
                Ok(a % b)
            }
        }),
        BinaryOp::Or | BinaryOp::And => unreachable!("handled above"),
    }
}

fn arithmetic(
    left: &Value,
    right: &Value,
    op: &str,
    f: impl Fn(f64, f64) -> Result<f64, ExprError>,
) -> Result<Value, ExprError> {
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => Ok(number_value(f(a, b)?)),
        _ => Err(ExprError::eval(format!(
            "cannot apply '{}' to {} and {}",
            op,
            type_name(left),
            type_name(right)
        ))),
    }
}

fn compare(
    left: &Value,
    right: &Value,
    check: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, ExprError> {
    // Comparisons against a missing field are false, not an error
    if left.is_null() || right.is_null() {
        return Ok(Value::Bool(false));
    }
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        let ordering = a
            .partial_cmp(&b)
            .ok_or_else(|| ExprError::eval("cannot order NaN"))?;
        return Ok(Value::Bool(check(ordering)));
    }
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(Value::Bool(check(a.cmp(b))));
    }
    Err(ExprError::eval(format!(
        "cannot compare {} and {}",
        type_name(left),
        type_name(right)
    )))
}

fn call_builtin(function: &str, args: &[Value]) -> Result<Value, ExprError> {
    let arity = |n: usize| -> Result<(), ExprError> {
        if args.len() == n {
            Ok(())
        } else {
            Err(ExprError::eval(format!(
                "{}() takes {} argument(s), got {}",
                function,
                n,
                args.len()
            )))
        }
    };

    match function {
        "contains" => {
            arity(2)?;
            match &args[0] {
                Value::Array(items) => Ok(Value::Bool(items.iter().any(|v| loose_eq(v, &args[1])))),
                value => Ok(Value::Bool(
                    display_string(value).contains(&display_string(&args[1])),
                )),
            }
        }
        "starts_with" => {
            arity(2)?;
            Ok(Value::Bool(
                display_string(&args[0]).starts_with(&display_string(&args[1])),
            ))
        }
        "ends_with" => {
            arity(2)?;
            Ok(Value::Bool(
                display_string(&args[0]).ends_with(&display_string(&args[1])),
            ))
        }
        "lower" => {
            arity(1)?;
            Ok(Value::String(display_string(&args[0]).to_lowercase()))
        }
        "upper" => {
            arity(1)?;
            Ok(Value::String(display_string(&args[0]).to_uppercase()))
        }
        "trim" => {
            arity(1)?;
            Ok(Value::String(display_string(&args[0]).trim().to_string()))
        }
        "len" => {
            arity(1)?;
            let len = match &args[0] {
                Value::String(s) => s.chars().count(),
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                other => {
                    return Err(ExprError::eval(format!(
                        "len() does not apply to {}",
                        type_name(other)
                    )))
                }
            };
            Ok(number_value(len as f64))
        }
        "num" => {
            arity(1)?;
            as_number(&args[0]).map(number_value).ok_or_else(|| {
                ExprError::eval(format!("cannot convert {} to a number", type_name(&args[0])))
            })
        }
        "str" => {
            arity(1)?;
            Ok(Value::String(display_string(&args[0])))
        }
        "round" => {
            arity(1)?;
            let n = as_number(&args[0])
                .ok_or_else(|| ExprError::eval("round() expects a number"))?;
            Ok(number_value(n.round()))
        }
        "abs" => {
            arity(1)?;
            let n = as_number(&args[0])
                .ok_or_else(|| ExprError::eval("abs() expects a number"))?;
            Ok(number_value(n.abs()))
        }
        other => Err(ExprError::eval(format!("unknown function '{}'", other))),
    }
}

/// Walk a dot path into the record; a missing field reads as null
fn resolve_field(record: &Value, path: &[String]) -> Value {
    let mut current = record;
    for segment in path {
        match current.get(segment) {
            Some(value) => current = value,
            None => return Value::Null,
        }
    }
    current.clone()
}

/// Truthiness of a value: null and empty things are false
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Coerce a value to a number, accepting numeric strings
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Build a JSON number, preferring integers for whole values
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) {
        Value::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Loose equality matching the record model: numeric strings equal their
/// numbers, otherwise same-type equality
fn loose_eq(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return a == b;
    }
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => a == b,
        _ => false,
    }
}

/// Render a value the way it would appear in a text field
fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
