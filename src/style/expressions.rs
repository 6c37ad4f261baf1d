//! Show expressions: boolean predicates over a feature's properties.
//!
//! `JsonExpression` evaluates the array expression syntax used by style
//! documents:
//! - `get`, `has`, `literal`: property access and constants
//! - `time`: frame time in seconds (makes the expression time-dynamic)
//! - Comparison: `==`, `!=`, `<`, `<=`, `>`, `>=`
//! - Logic: `all`, `any`, `!`, `case`, `coalesce`
//! - Math: `+`, `-`, `*`, `/`, `%`, `to-number`

use std::fmt;

use serde_json::Value;

use crate::error::{StyleError, StyleResult};
use crate::tiles3d::{FeatureView, PropertyValue};

/// Evaluation context: the feature being styled and the frame time.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub feature: FeatureView<'a>,
    /// Frame time in seconds
    pub time: f64,
}

impl<'a> EvalContext<'a> {
    pub fn new(feature: FeatureView<'a>, time: f64) -> Self {
        Self { feature, time }
    }
}

/// Visibility predicate supplied by a style
pub trait ShowExpression: fmt::Debug + Send + Sync {
    /// Whether the feature in `ctx` is shown
    fn evaluate(&self, ctx: &EvalContext<'_>) -> bool;

    /// Whether the result can change between frames for the same feature
    fn is_time_dynamic(&self) -> bool {
        false
    }
}

/// Show every feature, or none
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantShow(pub bool);

impl ShowExpression for ConstantShow {
    fn evaluate(&self, _ctx: &EvalContext<'_>) -> bool {
        self.0
    }
}

/// Predicate written as a JSON array expression
#[derive(Debug, Clone, PartialEq)]
pub struct JsonExpression {
    expr: Value,
    time_dynamic: bool,
}

const OPERATORS: &[&str] = &[
    "get", "has", "literal", "time", "==", "!=", "<", "<=", ">", ">=", "all", "any", "!", "case",
    "coalesce", "+", "-", "*", "/", "%", "to-number",
];

impl JsonExpression {
    /// Validate and wrap an expression. Every array must start with a known
    /// operator; `literal` arguments are not inspected.
    pub fn new(expr: Value) -> StyleResult<Self> {
        validate(&expr)?;
        let time_dynamic = uses_time(&expr);
        Ok(Self { expr, time_dynamic })
    }

    pub fn expression(&self) -> &Value {
        &self.expr
    }

    /// Evaluate to a value; `None` is the null/missing result.
    pub fn evaluate_value(&self, ctx: &EvalContext<'_>) -> Option<PropertyValue> {
        evaluate_expression(&self.expr, ctx)
    }
}

impl ShowExpression for JsonExpression {
    /// Anything other than boolean `true` hides the feature.
    fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        matches!(self.evaluate_value(ctx), Some(PropertyValue::Boolean(true)))
    }

    fn is_time_dynamic(&self) -> bool {
        self.time_dynamic
    }
}

fn validate(expr: &Value) -> StyleResult<()> {
    let Value::Array(arr) = expr else {
        return Ok(());
    };
    let op = arr
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| StyleError::invalid_style(format!("expected an operator in {expr}")))?;
    if !OPERATORS.contains(&op) {
        return Err(StyleError::invalid_style(format!("unknown operator {op:?}")));
    }
    if op == "literal" {
        return Ok(());
    }
    arr[1..].iter().try_for_each(validate)
}

fn uses_time(expr: &Value) -> bool {
    match expr.as_array() {
        Some(arr) => match arr.first().and_then(Value::as_str) {
            Some("time") => true,
            Some("literal") => false,
            _ => arr.iter().any(uses_time),
        },
        None => false,
    }
}

/// Evaluate an expression against a feature.
pub fn evaluate_expression(expr: &Value, ctx: &EvalContext<'_>) -> Option<PropertyValue> {
    match expr {
        Value::Array(arr) => evaluate_array_expression(arr, ctx),
        other => PropertyValue::from_json(other),
    }
}

fn evaluate_array_expression(arr: &[Value], ctx: &EvalContext<'_>) -> Option<PropertyValue> {
    let op = arr.first()?.as_str()?;
    let args = &arr[1..];

    match op {
        "get" => ctx.feature.property(args.first()?.as_str()?).cloned(),
        "has" => Some(PropertyValue::Boolean(ctx.feature.has_property(args.first()?.as_str()?))),
        "literal" => PropertyValue::from_json(args.first()?),
        "time" => Some(PropertyValue::Number(ctx.time)),

        "==" => eval_equality(args, ctx).map(PropertyValue::Boolean),
        "!=" => eval_equality(args, ctx).map(|eq| PropertyValue::Boolean(!eq)),
        "<" => eval_compare(args, ctx, |o| o.is_lt()),
        "<=" => eval_compare(args, ctx, |o| o.is_le()),
        ">" => eval_compare(args, ctx, |o| o.is_gt()),
        ">=" => eval_compare(args, ctx, |o| o.is_ge()),

        "all" => Some(PropertyValue::Boolean(
            args.iter().all(|a| eval_bool(a, ctx) == Some(true)),
        )),
        "any" => Some(PropertyValue::Boolean(
            args.iter().any(|a| eval_bool(a, ctx) == Some(true)),
        )),
        "!" => eval_bool(args.first()?, ctx).map(|b| PropertyValue::Boolean(!b)),
        "case" => eval_case(args, ctx),
        "coalesce" => args.iter().find_map(|a| evaluate_expression(a, ctx)),

        "+" => fold_numbers(args, ctx, 0.0, |a, b| a + b),
        "*" => fold_numbers(args, ctx, 1.0, |a, b| a * b),
        "-" => match args {
            [a] => Some(PropertyValue::Number(-eval_number(a, ctx)?)),
            [a, b] => Some(PropertyValue::Number(eval_number(a, ctx)? - eval_number(b, ctx)?)),
            _ => None,
        },
        "/" => binary_number(args, ctx, |a, b| a / b),
        "%" => binary_number(args, ctx, |a, b| a % b),
        "to-number" => {
            let n = evaluate_expression(args.first()?, ctx)?.as_number();
            (!n.is_nan()).then_some(PropertyValue::Number(n))
        }

        _ => None,
    }
}

fn eval_bool(expr: &Value, ctx: &EvalContext<'_>) -> Option<bool> {
    evaluate_expression(expr, ctx)?.as_bool()
}

fn eval_number(expr: &Value, ctx: &EvalContext<'_>) -> Option<f64> {
    match evaluate_expression(expr, ctx)? {
        PropertyValue::Number(n) => Some(n),
        _ => None,
    }
}

fn eval_equality(args: &[Value], ctx: &EvalContext<'_>) -> Option<bool> {
    let [a, b] = args else {
        return None;
    };
    Some(evaluate_expression(a, ctx) == evaluate_expression(b, ctx))
}

fn eval_compare(
    args: &[Value],
    ctx: &EvalContext<'_>,
    test: fn(std::cmp::Ordering) -> bool,
) -> Option<PropertyValue> {
    let [a, b] = args else {
        return None;
    };
    let ordering = match (evaluate_expression(a, ctx), evaluate_expression(b, ctx)) {
        (Some(PropertyValue::Number(x)), Some(PropertyValue::Number(y))) => x.partial_cmp(&y),
        (Some(PropertyValue::String(x)), Some(PropertyValue::String(y))) => Some(x.cmp(&y)),
        _ => None,
    };
    // Mixed types, missing values and NaN compare false
    Some(PropertyValue::Boolean(ordering.is_some_and(test)))
}

fn eval_case(args: &[Value], ctx: &EvalContext<'_>) -> Option<PropertyValue> {
    // ["case", cond1, out1, cond2, out2, ..., fallback]
    let (fallback, branches) = args.split_last()?;
    for pair in branches.chunks_exact(2) {
        if eval_bool(&pair[0], ctx) == Some(true) {
            return evaluate_expression(&pair[1], ctx);
        }
    }
    evaluate_expression(fallback, ctx)
}

fn fold_numbers(
    args: &[Value],
    ctx: &EvalContext<'_>,
    init: f64,
    f: fn(f64, f64) -> f64,
) -> Option<PropertyValue> {
    let mut acc = init;
    for a in args {
        acc = f(acc, eval_number(a, ctx)?);
    }
    Some(PropertyValue::Number(acc))
}

fn binary_number(
    args: &[Value],
    ctx: &EvalContext<'_>,
    f: fn(f64, f64) -> f64,
) -> Option<PropertyValue> {
    let [a, b] = args else {
        return None;
    };
    Some(PropertyValue::Number(f(eval_number(a, ctx)?, eval_number(b, ctx)?)))
}
