//! Expression parsing and evaluation for formula parameters
//!
//! Formulas are pure arithmetic/boolean expressions over named variables and a
//! small fixed set of math functions. There is no assignment and no access to
//! anything beyond the bindings supplied by an [`EvaluationContext`].
//!
//! Operator precedence, loosest first: `or`, `and`, `not`, comparisons
//! (`== != < <= > >=`), `+ -`, `* / // %`, unary `- +`, power (`**` or `^`,
//! right associative).

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{not, opt, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
    IResult, Parser,
};
use std::collections::HashMap;
use thiserror::Error;

use crate::parameters::value::Value;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },
}

/// Result type for expression evaluation
type ExprResult<T> = Result<T, ExpressionError>;

type PResult<'a, T> = IResult<&'a str, T>;

/// Words that are never variable names.
const KEYWORDS: &[&str] = &["and", "or", "not", "True", "False", "true", "false"];

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant value
    Literal(Value),

    /// Variable reference, possibly dotted
    Variable(String),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,

    /// Identity (+)
    Pos,

    /// Logical negation (not)
    Not,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Floor division (//)
    FloorDiv,
    /// Remainder with the sign of the divisor (%)
    Mod,
    /// Power (** or ^)
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Context for expression evaluation, providing variable values
pub trait EvaluationContext {
    /// Get the value of a variable
    fn get_variable(&self, name: &str) -> ExprResult<Value>;

    /// Check if a variable exists
    fn has_variable(&self, name: &str) -> bool;

    /// Get the names of all variables
    fn variable_names(&self) -> Vec<String>;
}

/// Simple implementation of EvaluationContext using a HashMap
#[derive(Debug, Clone, Default)]
pub struct SimpleContext {
    variables: HashMap<String, Value>,
}

impl SimpleContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
        }
    }

    /// Set a variable value
    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) {
        self.variables.insert(name.to_string(), value.into());
    }

    /// Builder form of [`SimpleContext::set_variable`]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Remove a variable
    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    /// Create a new context with the given variables
    pub fn with_variables(variables: HashMap<String, Value>) -> Self {
        Self { variables }
    }
}

impl EvaluationContext for SimpleContext {
    fn get_variable(&self, name: &str) -> ExprResult<Value> {
        self.variables.get_variable(name)
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }
}

impl EvaluationContext for HashMap<String, Value> {
    fn get_variable(&self, name: &str) -> ExprResult<Value> {
        self.get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn variable_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

/// Named constants available to every formula unless shadowed.
fn constant(name: &str) -> Option<Value> {
    match name {
        "pi" => Some(Value::Float(std::f64::consts::PI)),
        "e" => Some(Value::Float(std::f64::consts::E)),
        _ => None,
    }
}

impl Expression {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> ExprResult<Self> {
        match expr_parser(input.trim()) {
            Ok((remainder, expr)) => {
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{:?}", e),
            }),
        }
    }

    /// Evaluate the expression with the given context
    pub fn evaluate<C: EvaluationContext + ?Sized>(&self, context: &C) -> ExprResult<Value> {
        match self {
            Self::Literal(value) => Ok(value.clone()),

            Self::Variable(name) => {
                if context.has_variable(name) {
                    return context.get_variable(name);
                }
                constant(name).ok_or_else(|| ExpressionError::UndefinedVariable {
                    name: name.clone(),
                })
            }

            Self::Unary(op, expr) => {
                let value = expr.evaluate(context)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                    UnaryOp::Neg => match value {
                        Value::Float(f) => Ok(Value::Float(-f)),
                        Value::Int(_) | Value::Bool(_) => value
                            .as_i64()
                            .and_then(i64::checked_neg)
                            .map(Value::Int)
                            .ok_or_else(|| invalid("integer overflow in negation")),
                        other => Err(invalid(format!("cannot negate {}", other.kind()))),
                    },
                    UnaryOp::Pos => match value {
                        Value::Float(_) | Value::Int(_) => Ok(value),
                        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
                        other => Err(invalid(format!("unary + on {}", other.kind()))),
                    },
                }
            }

            Self::Binary(BinaryOp::And, left, right) => {
                let lhs = left.evaluate(context)?;
                if !lhs.truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(right.evaluate(context)?.truthy()))
            }

            Self::Binary(BinaryOp::Or, left, right) => {
                let lhs = left.evaluate(context)?;
                if lhs.truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(right.evaluate(context)?.truthy()))
            }

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(context)?;
                let rhs = right.evaluate(context)?;
                binary(*op, &lhs, &rhs)
            }

            Self::Function(name, args) => {
                let mut evaluated_args = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated_args.push(arg.evaluate(context)?);
                }
                call(name, &evaluated_args)
            }
        }
    }

    /// Find all variable names used in the expression
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Variable(name) => vars.push(name.clone()),
            Self::Unary(_, expr) => expr.collect_variables(vars),
            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

/// Extracts the free variable names of a formula without parsing it.
///
/// Matches identifiers, optionally dotted, that are not followed by `(`, so
/// function names such as `sqrt` are not reported. Numeric literals and
/// keywords are skipped. Names are returned in order of first appearance.
///
/// ```
/// use paramtree::parameters::expression::extract_variables;
///
/// assert_eq!(extract_variables("sqrt(a.b) * 2e3 + c"), vec!["a.b", "c"]);
/// ```
pub fn extract_variables(formula: &str) -> Vec<String> {
    let mut vars: Vec<String> = Vec::new();
    let mut rest = formula;
    while !rest.is_empty() {
        if let Ok((after, _)) = number_text(rest) {
            rest = after;
            continue;
        }
        if let Ok((after, name)) = dotted_name(rest) {
            let called = after.trim_start().starts_with('(');
            if !called && !KEYWORDS.contains(&name) && !vars.iter().any(|v| v == name) {
                vars.push(name.to_string());
            }
            rest = after;
            continue;
        }
        let mut chars = rest.chars();
        chars.next();
        rest = chars.as_str();
    }
    vars
}

fn invalid(message: impl Into<String>) -> ExpressionError {
    ExpressionError::InvalidOperation {
        message: message.into(),
    }
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a.checked_rem(b)? != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        r.checked_add(b)
    } else {
        Some(r)
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> ExprResult<Value> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(lhs.loose_eq(rhs))),
        BinaryOp::Ne => return Ok(Value::Bool(!lhs.loose_eq(rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (lhs, rhs) {
                (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
                _ => match (lhs.as_f64(), rhs.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => {
                        return Err(invalid(format!(
                            "cannot compare {} with {}",
                            lhs.kind(),
                            rhs.kind()
                        )))
                    }
                },
            };
            let result = match ordering {
                None => false,
                Some(ord) => match op {
                    BinaryOp::Lt => ord.is_lt(),
                    BinaryOp::Le => ord.is_le(),
                    BinaryOp::Gt => ord.is_gt(),
                    _ => ord.is_ge(),
                },
            };
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    if let (BinaryOp::Add, Value::Str(a), Value::Str(b)) = (op, lhs, rhs) {
        return Ok(Value::Str(format!("{}{}", a, b)));
    }

    // integer operands stay integral, except for true division
    if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
        let overflow = || invalid("integer overflow");
        return match op {
            BinaryOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
            BinaryOp::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
            BinaryOp::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
            BinaryOp::Div if b == 0 => Err(ExpressionError::DivisionByZero),
            BinaryOp::Div => Ok(Value::Float(a as f64 / b as f64)),
            BinaryOp::FloorDiv | BinaryOp::Mod if b == 0 => Err(ExpressionError::DivisionByZero),
            BinaryOp::FloorDiv => floor_div(a, b).map(Value::Int).ok_or_else(overflow),
            BinaryOp::Mod => floor_mod(a, b).map(Value::Int).ok_or_else(overflow),
            BinaryOp::Pow if b >= 0 => u32::try_from(b)
                .ok()
                .and_then(|exp| a.checked_pow(exp))
                .map(Value::Int)
                .ok_or_else(overflow),
            BinaryOp::Pow => Ok(Value::Float((a as f64).powf(b as f64))),
            _ => unreachable!("comparison and logic operators are handled above"),
        };
    }

    let (a, b) = match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(invalid(format!(
                "unsupported operand types {} and {}",
                lhs.kind(),
                rhs.kind()
            )))
        }
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(ExpressionError::DivisionByZero)
        }
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a - b * (a / b).floor(),
        BinaryOp::Pow => a.powf(b),
        _ => unreachable!("comparison and logic operators are handled above"),
    };
    Ok(Value::Float(result))
}

fn number_arg(name: &str, value: &Value) -> ExprResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| invalid(format!("{}() expects numbers, got {}", name, value.kind())))
}

fn unary_fn(name: &str, args: &[Value], f: fn(f64) -> f64) -> ExprResult<Value> {
    if args.len() != 1 {
        return Err(invalid(format!(
            "{}() requires 1 argument, got {}",
            name,
            args.len()
        )));
    }
    Ok(Value::Float(f(number_arg(name, &args[0])?)))
}

fn call(name: &str, args: &[Value]) -> ExprResult<Value> {
    match name {
        "sin" => unary_fn(name, args, f64::sin),
        "cos" => unary_fn(name, args, f64::cos),
        "tan" => unary_fn(name, args, f64::tan),
        "asin" => unary_fn(name, args, f64::asin),
        "acos" => unary_fn(name, args, f64::acos),
        "atan" => unary_fn(name, args, f64::atan),
        "exp" => unary_fn(name, args, f64::exp),
        "log" | "ln" => unary_fn(name, args, f64::ln),
        "log10" => unary_fn(name, args, f64::log10),
        "sqrt" => unary_fn(name, args, f64::sqrt),
        "floor" => unary_fn(name, args, f64::floor),
        "ceil" => unary_fn(name, args, f64::ceil),
        "abs" => match args {
            [Value::Int(i)] => i
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| invalid("integer overflow in abs()")),
            _ => unary_fn(name, args, f64::abs),
        },
        "pow" => match args {
            [base, exp] => Ok(Value::Float(
                number_arg(name, base)?.powf(number_arg(name, exp)?),
            )),
            _ => Err(invalid(format!(
                "pow() requires 2 arguments, got {}",
                args.len()
            ))),
        },
        "max" | "min" => {
            if args.len() < 2 {
                return Err(invalid(format!(
                    "{}() requires at least 2 arguments, got {}",
                    name,
                    args.len()
                )));
            }
            let mut best = &args[0];
            let mut best_value = number_arg(name, best)?;
            for arg in &args[1..] {
                let x = number_arg(name, arg)?;
                let better = if name == "max" {
                    x > best_value
                } else {
                    x < best_value
                };
                if better {
                    best = arg;
                    best_value = x;
                }
            }
            Ok(best.clone())
        }
        _ => Err(ExpressionError::UndefinedFunction {
            name: name.to_string(),
        }),
    }
}

// Parser functions using nom

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn space(input: &str) -> PResult<&str> {
    multispace0(input)
}

/// An operator or punctuation token surrounded by optional whitespace
fn symbol<'a>(sym: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input| delimited(multispace0, tag(sym), multispace0).parse(input)
}

/// A keyword that is not the prefix of a longer identifier
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input| {
        delimited(
            multispace0,
            terminated(tag(word), not(satisfy(is_ident_char))),
            multispace0,
        )
        .parse(input)
    }
}

/// Parse an identifier (variable or function name)
fn identifier(input: &str) -> PResult<&str> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_ident_char),
    ))
    .parse(input)
}

/// Parse an identifier path such as `group.child`
fn dotted_name(input: &str) -> PResult<&str> {
    recognize(pair(identifier, many0(preceded(char('.'), identifier)))).parse(input)
}

fn exponent(input: &str) -> PResult<&str> {
    recognize(pair(one_of("eE"), pair(opt(one_of("+-")), digit1))).parse(input)
}

fn mantissa(input: &str) -> PResult<&str> {
    alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ))
    .parse(input)
}

fn number_text(input: &str) -> PResult<&str> {
    recognize(pair(mantissa, opt(exponent))).parse(input)
}

/// Parse a number; integers without fraction or exponent stay integral
fn number(input: &str) -> PResult<Expression> {
    let (rest, text) = number_text(input)?;
    let is_float = text.contains(['.', 'e', 'E']);
    let value = match text.parse::<i64>() {
        Ok(i) if !is_float => Value::Int(i),
        _ => match text.parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Float,
                )))
            }
        },
    };
    Ok((rest, Expression::Literal(value)))
}

fn boolean(input: &str) -> PResult<Expression> {
    if let Ok((rest, _)) = alt((keyword("True"), keyword("true"))).parse(input) {
        return Ok((rest, Expression::Literal(Value::Bool(true))));
    }
    let (rest, _) = alt((keyword("False"), keyword("false"))).parse(input)?;
    Ok((rest, Expression::Literal(Value::Bool(false))))
}

/// Parse a comma-separated list of expressions (for function arguments)
fn args_list(input: &str) -> PResult<Vec<Expression>> {
    separated_list0(symbol(","), expr_parser).parse(input)
}

/// Parse a function call
fn function_call(input: &str) -> PResult<Expression> {
    let (input, name) = identifier(input)?;
    let (input, _) = symbol("(")(input)?;
    let (input, args) = args_list(input)?;
    let (input, _) = symbol(")")(input)?;
    Ok((input, Expression::Function(name.to_string(), args)))
}

/// Parse a variable reference
fn variable(input: &str) -> PResult<Expression> {
    let (rest, name) = dotted_name(input)?;
    if KEYWORDS.contains(&name) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    Ok((rest, Expression::Variable(name.to_string())))
}

/// Parse a parenthesized expression
fn parens(input: &str) -> PResult<Expression> {
    let (input, _) = symbol("(")(input)?;
    let (input, expr) = expr_parser(input)?;
    let (input, _) = symbol(")")(input)?;
    Ok((input, expr))
}

/// Parse a primary expression (literal, function call, variable, or parenthesized expression)
fn primary(input: &str) -> PResult<Expression> {
    let (input, _) = space(input)?;
    alt((number, boolean, function_call, variable, parens)).parse(input)
}

/// Parse a power expression (primary ** unary)
fn power(input: &str) -> PResult<Expression> {
    let (input, base) = primary(input)?;
    match alt((symbol("**"), symbol("^"))).parse(input) {
        Ok((after_op, _)) => {
            let (rest, exp) = unary(after_op)?;
            Ok((
                rest,
                Expression::Binary(BinaryOp::Pow, Box::new(base), Box::new(exp)),
            ))
        }
        Err(nom::Err::Error(_)) => Ok((input, base)),
        Err(e) => Err(e),
    }
}

/// Parse a unary expression (-expr, +expr)
fn unary(input: &str) -> PResult<Expression> {
    if let Ok((rest, _)) = symbol("-")(input) {
        let (rest, expr) = unary(rest)?;
        return Ok((rest, Expression::Unary(UnaryOp::Neg, Box::new(expr))));
    }
    if let Ok((rest, _)) = symbol("+")(input) {
        let (rest, expr) = unary(rest)?;
        return Ok((rest, Expression::Unary(UnaryOp::Pos, Box::new(expr))));
    }
    power(input)
}

/// Repeatedly applies `op operand`, folding to the left
fn fold_left<'a>(
    mut input: &'a str,
    mut acc: Expression,
    mut op: impl FnMut(&'a str) -> PResult<'a, BinaryOp>,
    operand: fn(&'a str) -> PResult<'a, Expression>,
) -> PResult<'a, Expression> {
    loop {
        match op(input) {
            Ok((after_op, operator)) => {
                let (rest, rhs) = operand(after_op)?;
                acc = Expression::Binary(operator, Box::new(acc), Box::new(rhs));
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, acc)),
            Err(e) => return Err(e),
        }
    }
}

fn term_op(input: &str) -> PResult<BinaryOp> {
    alt((
        symbol("//").map(|_| BinaryOp::FloorDiv),
        terminated(symbol("*"), not(char('*'))).map(|_| BinaryOp::Mul),
        symbol("/").map(|_| BinaryOp::Div),
        symbol("%").map(|_| BinaryOp::Mod),
    ))
    .parse(input)
}

/// Parse a multiplicative expression
fn term(input: &str) -> PResult<Expression> {
    let (input, first) = unary(input)?;
    fold_left(input, first, term_op, unary)
}

fn additive_op(input: &str) -> PResult<BinaryOp> {
    alt((
        symbol("+").map(|_| BinaryOp::Add),
        symbol("-").map(|_| BinaryOp::Sub),
    ))
    .parse(input)
}

/// Parse an additive expression
fn additive(input: &str) -> PResult<Expression> {
    let (input, first) = term(input)?;
    fold_left(input, first, additive_op, term)
}

fn comparison_op(input: &str) -> PResult<BinaryOp> {
    alt((
        symbol("==").map(|_| BinaryOp::Eq),
        symbol("!=").map(|_| BinaryOp::Ne),
        symbol("<=").map(|_| BinaryOp::Le),
        symbol(">=").map(|_| BinaryOp::Ge),
        symbol("<").map(|_| BinaryOp::Lt),
        symbol(">").map(|_| BinaryOp::Gt),
    ))
    .parse(input)
}

/// Parse a comparison (non-chaining)
fn comparison(input: &str) -> PResult<Expression> {
    let (input, left) = additive(input)?;
    match comparison_op(input) {
        Ok((after_op, op)) => {
            let (rest, right) = additive(after_op)?;
            Ok((rest, Expression::Binary(op, Box::new(left), Box::new(right))))
        }
        Err(nom::Err::Error(_)) => Ok((input, left)),
        Err(e) => Err(e),
    }
}

fn not_expr(input: &str) -> PResult<Expression> {
    if let Ok((rest, _)) = keyword("not")(input) {
        let (rest, expr) = not_expr(rest)?;
        return Ok((rest, Expression::Unary(UnaryOp::Not, Box::new(expr))));
    }
    comparison(input)
}

fn and_op(input: &str) -> PResult<BinaryOp> {
    let (rest, _) = keyword("and")(input)?;
    Ok((rest, BinaryOp::And))
}

fn and_expr(input: &str) -> PResult<Expression> {
    let (input, first) = not_expr(input)?;
    fold_left(input, first, and_op, not_expr)
}

fn or_op(input: &str) -> PResult<BinaryOp> {
    let (rest, _) = keyword("or")(input)?;
    Ok((rest, BinaryOp::Or))
}

/// Parse a full expression
fn expr_parser(input: &str) -> PResult<Expression> {
    let (input, first) = and_expr(input)?;
    fold_left(input, first, or_op, and_expr)
}
