//! Array-length expression model and parser.
//!
//! Parameter metadata in the registry carries a tiny arithmetic sub-language
//! describing data-dependent element counts, e.g. `COMPSIZE(width,height)`,
//! `n+1` or `n*4`. This is a recursive-descent parser with two precedence
//! tiers: `+ -` bind looser than `* / %`. There is no unary minus and no
//! grouping parentheses beyond the size function's own.
//!
//! The parser has no knowledge of parameter existence; resolving a
//! [`Expression::ParameterRef`] against the owning command's parameter list is
//! a downstream obligation.

use crate::error::ParseError;

/// The reserved identifier recognized as a size-of-arguments call.
const SIZE_FN: &str = "COMPSIZE";

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOperator {
    /// The source spelling of the operator.
    pub fn symbol(self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Sub => '-',
            BinaryOperator::Mul => '*',
            BinaryOperator::Div => '/',
            BinaryOperator::Mod => '%',
        }
    }
}

/// A parsed array-length expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Unsigned decimal integer literal.
    Constant(i64),
    /// Reference to a sibling parameter of the owning command.
    ParameterRef(String),
    /// `COMPSIZE(...)` call over a non-empty argument list.
    SizeOf(Vec<Expression>),
    /// Binary arithmetic over two sub-expressions.
    BinaryOp {
        /// Left operand.
        left: Box<Expression>,
        /// Operator.
        op: BinaryOperator,
        /// Right operand.
        right: Box<Expression>,
    },
}

impl Expression {
    /// Render the expression back to its source form.
    pub fn render(&self) -> String {
        match self {
            Expression::Constant(value) => value.to_string(),
            Expression::ParameterRef(name) => name.clone(),
            Expression::SizeOf(args) => {
                let rendered: Vec<String> = args.iter().map(Expression::render).collect();
                format!("{SIZE_FN}({})", rendered.join(","))
            }
            Expression::BinaryOp { left, op, right } => {
                format!("{}{}{}", left.render(), op.symbol(), right.render())
            }
        }
    }
}

/// Parse a length expression, failing when the input is invalid or not fully
/// consumed.
pub fn parse_expression(text: &str) -> Result<Expression, ParseError> {
    let (expression, rest) = parse_additive(text)?;
    if !rest.is_empty() {
        return Err(malformed(text, rest));
    }
    Ok(expression)
}

fn malformed(text: &str, remainder: &str) -> ParseError {
    ParseError::MalformedExpression {
        text: text.to_string(),
        remainder: remainder.to_string(),
    }
}

/// `expr2 := expr1 (('+'|'-') expr1)*`
fn parse_additive(input: &str) -> Result<(Expression, &str), ParseError> {
    let (mut expression, mut rest) = parse_multiplicative(input)?;
    rest = rest.trim_start();

    loop {
        let op = match rest.chars().next() {
            Some('+') => BinaryOperator::Add,
            Some('-') => BinaryOperator::Sub,
            _ => break,
        };
        let (right, after) = parse_multiplicative(&rest[1..])?;
        rest = after.trim_start();
        expression = Expression::BinaryOp {
            left: Box::new(expression),
            op,
            right: Box::new(right),
        };
    }

    Ok((expression, rest))
}

/// `expr1 := expr0 (('*'|'/'|'%') expr0)*`
fn parse_multiplicative(input: &str) -> Result<(Expression, &str), ParseError> {
    let (mut expression, mut rest) = parse_operand(input)?;
    rest = rest.trim_start();

    loop {
        let op = match rest.chars().next() {
            Some('*') => BinaryOperator::Mul,
            Some('/') => BinaryOperator::Div,
            Some('%') => BinaryOperator::Mod,
            _ => break,
        };
        let (right, after) = parse_operand(&rest[1..])?;
        rest = after.trim_start();
        expression = Expression::BinaryOp {
            left: Box::new(expression),
            op,
            right: Box::new(right),
        };
    }

    Ok((expression, rest))
}

/// `expr0 := COMPSIZE '(' expr2 (',' expr2)* ')' | DIGITS | IDENT`
fn parse_operand(input: &str) -> Result<(Expression, &str), ParseError> {
    let input = input.trim_start();

    if let Some(mut rest) = input.strip_prefix(SIZE_FN).and_then(|r| r.strip_prefix('(')) {
        let mut arguments = Vec::new();
        loop {
            match rest.chars().next() {
                None => return Err(malformed(input, rest)),
                Some(')') => {
                    rest = &rest[1..];
                    break;
                }
                _ => {}
            }
            let (argument, after) = parse_additive(rest)?;
            arguments.push(argument);
            rest = after;
            if let Some(after_comma) = rest.strip_prefix(',') {
                rest = after_comma;
            }
        }
        if arguments.is_empty() {
            return Err(malformed(input, rest));
        }
        return Ok((Expression::SizeOf(arguments), rest));
    }

    let first = input.chars().next().ok_or_else(|| malformed(input, input))?;

    if first.is_ascii_digit() {
        let end = input
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(input.len());
        let value: i64 = input[..end]
            .parse()
            .map_err(|_| ParseError::MalformedLiteral(input[..end].to_string()))?;
        return Ok((Expression::Constant(value), &input[end..]));
    }

    if first.is_ascii_alphabetic() {
        let end = input
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(input.len());
        return Ok((
            Expression::ParameterRef(input[..end].to_string()),
            &input[end..],
        ));
    }

    Err(malformed(input, input))
}
