// sas - an interpreter for a subset of the SAS data-analysis language.
// Copyright (C) 2026 sas-rs contributors.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! Expression evaluation.
//!
//! Walks a closed AST and reports domain errors through the shared
//! diagnostic sink rather than panicking.

use std::collections::HashMap;

use crate::{
    ast::{BinOp, Expr, UnOp},
    message::Location,
    pdv::Pdv,
    value::Value,
};

use super::Interpreter;

/// Maps an array's canonical (uppercased) name to the names of the
/// variables it indexes, in declared order.
pub type ArrayTable = HashMap<String, Vec<String>>;

pub fn array_key(name: &str) -> String {
    name.to_uppercase()
}

/// Evaluates `expr` against the current PDV. Returns `Err(())` on a fatal
/// evaluation error (an array index out of range, an undefined variable)
/// after the error has already been reported; recoverable domain errors
/// (e.g. `sqrt(-1)`) are reported as warnings and yield a missing value
/// instead of aborting.
pub fn eval(
    interp: &mut Interpreter,
    pdv: &Pdv,
    arrays: &ArrayTable,
    expr: &Expr,
) -> Result<Value, ()> {
    match expr {
        Expr::Number(n) => Ok(Value::number(*n)),
        Expr::String(s) => Ok(Value::string(s)),
        Expr::Variable(name) => match pdv.locate(name) {
            Some(idx) => Ok(pdv.get(idx).clone()),
            None => {
                interp.warning_kind(
                    crate::message::ErrorKind::UndefinedName,
                    Location::none(),
                    format!("variable {name} is not defined"),
                );
                Ok(Value::MISSING_NUMBER)
            }
        },
        Expr::ArrayElement(name, index_expr) => {
            let vars = arrays.get(&array_key(name)).ok_or_else(|| {
                interp.error_kind(crate::message::ErrorKind::RuntimeFatal, Location::none(), format!("array {name} is not defined"));
            })?;
            let index = eval(interp, pdv, arrays, index_expr)?;
            let i = index.as_f64().unwrap_or(0.0) as i64;
            if i < 1 || i as usize > vars.len() {
                interp.error_kind(
                    crate::message::ErrorKind::Range,
                    Location::none(),
                    format!("subscript {i} is out of range for array {name}"),
                );
                return Err(());
            }
            let var_name = &vars[(i - 1) as usize];
            Ok(pdv.get_by_name(var_name).cloned().unwrap_or(Value::MISSING_NUMBER))
        }
        Expr::FunctionCall(name, args) => {
            let values = args
                .iter()
                .map(|a| eval(interp, pdv, arrays, a))
                .collect::<Result<Vec<_>, _>>()?;
            call_function(interp, name, &values)
        }
        Expr::BinaryOp(op, lhs, rhs) => {
            if matches!(op, BinOp::Or | BinOp::And) {
                let left = eval(interp, pdv, arrays, lhs)?;
                let result = match op {
                    BinOp::Or => left.is_truthy() || eval(interp, pdv, arrays, rhs)?.is_truthy(),
                    BinOp::And => left.is_truthy() && eval(interp, pdv, arrays, rhs)?.is_truthy(),
                    _ => unreachable!(),
                };
                return Ok(Value::number(if result { 1.0 } else { 0.0 }));
            }
            let left = eval(interp, pdv, arrays, lhs)?;
            let right = eval(interp, pdv, arrays, rhs)?;
            Ok(binary(interp, *op, &left, &right))
        }
        Expr::UnaryOp(op, operand) => {
            let value = eval(interp, pdv, arrays, operand)?;
            Ok(match op {
                UnOp::Neg => Value::number(-value.as_f64().unwrap_or(0.0)),
                UnOp::Not => Value::number(if value.is_truthy() { 0.0 } else { 1.0 }),
            })
        }
    }
}

/// Comparison rule for missing operands: when both sides are missing,
/// `=`/`<=`/`>=` hold and the rest don't; comparing one missing operand
/// against a non-missing one holds for no operator, including `ne` — a
/// missing value compares false to everything except another missing value.
/// Neither-missing falls back to the natural ordering on numbers or strings,
/// coercing a string operand through `to_number` when the other side is
/// numeric.
fn relational(op: BinOp, left: &Value, right: &Value) -> f64 {
    let truth = |b: bool| if b { 1.0 } else { 0.0 };
    if left.is_missing() && right.is_missing() {
        return truth(matches!(op, BinOp::Eq | BinOp::Le | BinOp::Ge));
    }
    if left.is_missing() || right.is_missing() {
        return truth(false);
    }
    let (left, right) = match (left, right) {
        (Value::String(_), Value::Number(_)) => (left.to_number(), right.clone()),
        (Value::Number(_), Value::String(_)) => (left.clone(), right.to_number()),
        _ => (left.clone(), right.clone()),
    };
    use std::cmp::Ordering::*;
    let ordering = left.cmp(&right);
    truth(match op {
        BinOp::Eq => ordering == Equal,
        BinOp::Ne => ordering != Equal,
        BinOp::Lt => ordering == Less,
        BinOp::Le => ordering != Greater,
        BinOp::Gt => ordering == Greater,
        BinOp::Ge => ordering != Less,
        BinOp::Or | BinOp::And | BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Pow => {
            unreachable!()
        }
    })
}

fn binary(interp: &mut Interpreter, op: BinOp, left: &Value, right: &Value) -> Value {
    match op {
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            Value::number(relational(op, left, right))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Pow => {
            if left.is_missing() || right.is_missing() {
                return Value::MISSING_NUMBER;
            }
            let a = left.as_f64().unwrap_or(0.0);
            let b = right.as_f64().unwrap_or(0.0);
            let result = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => {
                    if b == 0.0 {
                        interp.warning_kind(crate::message::ErrorKind::Arith, Location::none(), "division by zero");
                        return Value::MISSING_NUMBER;
                    }
                    a / b
                }
                BinOp::Pow => a.powf(b),
                _ => unreachable!(),
            };
            if result.is_finite() {
                Value::number(result)
            } else {
                Value::MISSING_NUMBER
            }
        }
        BinOp::Or | BinOp::And => unreachable!("handled by short-circuit path in eval"),
    }
}

fn call_function(interp: &mut Interpreter, name: &str, args: &[Value]) -> Result<Value, ()> {
    let location = Location::none();
    let numeric_arg = |i: usize| args.get(i).and_then(Value::as_f64);
    let missing_if_any = args.iter().any(Value::is_missing);

    let result = match name.to_ascii_lowercase().as_str() {
        "sqrt" => match numeric_arg(0) {
            Some(n) if n >= 0.0 => Value::number(n.sqrt()),
            Some(_) => {
                interp.warning_kind(crate::message::ErrorKind::Arith, location, "argument to function SQRT is negative");
                Value::MISSING_NUMBER
            }
            None => Value::MISSING_NUMBER,
        },
        "abs" => numeric_arg(0).map_or(Value::MISSING_NUMBER, |n| Value::number(n.abs())),
        "exp" => numeric_arg(0).map_or(Value::MISSING_NUMBER, |n| Value::number(n.exp())),
        "log" => match numeric_arg(0) {
            Some(n) if n > 0.0 => Value::number(n.ln()),
            Some(_) => {
                interp.warning_kind(crate::message::ErrorKind::Arith, location, "argument to function LOG is not positive");
                Value::MISSING_NUMBER
            }
            None => Value::MISSING_NUMBER,
        },
        "log10" => match numeric_arg(0) {
            Some(n) if n > 0.0 => Value::number(n.log10()),
            Some(_) => {
                interp.warning_kind(crate::message::ErrorKind::Arith, location, "argument to function LOG10 is not positive");
                Value::MISSING_NUMBER
            }
            None => Value::MISSING_NUMBER,
        },
        "ceil" => numeric_arg(0).map_or(Value::MISSING_NUMBER, |n| Value::number(n.ceil())),
        "floor" => numeric_arg(0).map_or(Value::MISSING_NUMBER, |n| Value::number(n.floor())),
        "round" => {
            let decimals = numeric_arg(1).unwrap_or(0.0) as i32;
            numeric_arg(0).map_or(Value::MISSING_NUMBER, |n| {
                let factor = 10f64.powi(decimals);
                Value::number((n * factor).round() / factor)
            })
        }
        "mod" => match (numeric_arg(0), numeric_arg(1)) {
            (Some(_), Some(b)) if b == 0.0 => {
                interp.warning_kind(crate::message::ErrorKind::Arith, location, "second argument to function MOD is zero");
                Value::MISSING_NUMBER
            }
            (Some(a), Some(b)) => Value::number(a % b),
            _ => Value::MISSING_NUMBER,
        },
        "max" => {
            if missing_if_any || args.is_empty() {
                Value::MISSING_NUMBER
            } else {
                args.iter()
                    .filter_map(Value::as_f64)
                    .fold(f64::NEG_INFINITY, f64::max)
                    .into()
            }
        }
        "min" => {
            if missing_if_any || args.is_empty() {
                Value::MISSING_NUMBER
            } else {
                args.iter()
                    .filter_map(Value::as_f64)
                    .fold(f64::INFINITY, f64::min)
                    .into()
            }
        }
        "substr" => {
            let Some(Value::String(s)) = args.first() else {
                return Ok(Value::string(""));
            };
            let chars: Vec<char> = s.chars().collect();
            let start = (numeric_arg(1).unwrap_or(1.0) as usize).max(1) - 1;
            let len = numeric_arg(2)
                .map(|n| n as usize)
                .unwrap_or(chars.len().saturating_sub(start));
            let end = (start + len).min(chars.len());
            if start >= chars.len() {
                Value::string("")
            } else {
                Value::string(chars[start..end].iter().collect::<String>())
            }
        }
        "trim" => args
            .first()
            .map_or(Value::string(""), |v| Value::string(v.to_display_string().trim_end())),
        "left" => args
            .first()
            .map_or(Value::string(""), |v| Value::string(v.to_display_string().trim_start())),
        "upcase" => args
            .first()
            .map_or(Value::string(""), |v| Value::string(v.to_display_string().to_uppercase())),
        "lowcase" => args
            .first()
            .map_or(Value::string(""), |v| Value::string(v.to_display_string().to_lowercase())),
        "today" => Value::number(crate::calendar::today_yyyymmdd() as f64),
        "intck" => {
            let a = numeric_arg(1).unwrap_or(0.0);
            let b = numeric_arg(2).unwrap_or(0.0);
            crate::calendar::intck_day(a, b).map_or(Value::MISSING_NUMBER, |n| Value::number(n as f64))
        }
        "intnx" => {
            let start = numeric_arg(1).unwrap_or(0.0);
            let n = numeric_arg(2).unwrap_or(0.0);
            crate::calendar::intnx_day(start, n).map_or(Value::MISSING_NUMBER, Value::number)
        }
        other => {
            interp.error_kind(crate::message::ErrorKind::RuntimeFatal, location, format!("undefined function {other}"));
            return Err(());
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{VecListingSink, VecLogSink};

    fn interp() -> Interpreter {
        Interpreter::new(Box::new(VecLogSink::default()), Box::new(VecListingSink::default()))
    }

    #[test]
    fn missing_propagates_through_arithmetic() {
        let mut interp = interp();
        let pdv = Pdv::new();
        let arrays = ArrayTable::new();
        let expr = Expr::BinaryOp(
            BinOp::Add,
            Box::new(Expr::Number(1.0)),
            Box::new(Expr::FunctionCall("sqrt".into(), vec![Expr::Number(-1.0)])),
        );
        let value = eval(&mut interp, &pdv, &arrays, &expr).unwrap();
        assert_eq!(value, Value::MISSING_NUMBER);
    }

    #[test]
    fn both_missing_compares_equal() {
        let mut interp = interp();
        let pdv = Pdv::new();
        assert_eq!(relational(BinOp::Eq, &Value::MISSING_NUMBER, &Value::MISSING_NUMBER), 1.0);
        // A missing operand compares false to everything except another
        // missing value, `ne` included.
        assert_eq!(relational(BinOp::Ne, &Value::MISSING_NUMBER, &Value::number(1.0)), 0.0);
        let _ = (&mut interp, &pdv);
    }

    #[test]
    fn division_by_zero_yields_missing_not_abort() {
        let mut interp = interp();
        let result = binary(&mut interp, BinOp::Div, &Value::number(1.0), &Value::number(0.0));
        assert_eq!(result, Value::MISSING_NUMBER);
    }

    #[test]
    fn substr_extracts_by_position_and_length() {
        let mut interp = interp();
        let args = vec![Value::string("hello world"), Value::number(1.0), Value::number(5.0)];
        assert_eq!(call_function(&mut interp, "substr", &args).unwrap(), Value::string("hello"));
    }
}
