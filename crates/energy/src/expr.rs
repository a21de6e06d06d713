// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Arithmetic over metric columns for the `total_power` expression
//! (e.g. `pow_pkg0 + pow_pkg1 + pow_dram0 + pow_dram1`).

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("unexpected character {0:?} in power expression")]
    UnexpectedChar(char),
    #[error("malformed power expression")]
    Malformed,
    #[error("unbalanced parentheses")]
    Unbalanced,
    #[error("unknown metric {0:?} in power expression")]
    UnknownMetric(String),
    #[error("division by zero in power expression")]
    DivisionByZero,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Metric(String),
    Op(char),
    Open,
    Close,
}

/// A parsed `total_power` expression, kept in postfix form.
#[derive(Debug, Clone)]
pub struct PowerExpr {
    postfix: Vec<Token>,
    source: String,
}

fn precedence(op: char) -> u8 {
    match op {
        '*' | '/' => 2,
        _ => 1,
    }
}

impl PowerExpr {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        let postfix = to_postfix(tokens)?;
        if postfix.is_empty() {
            return Err(ExprError::Malformed);
        }
        Ok(Self {
            postfix,
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Metric names the expression reads.
    pub fn metrics(&self) -> Vec<&str> {
        self.postfix
            .iter()
            .filter_map(|t| match t {
                Token::Metric(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Evaluate against one timestamp's metric values.
    pub fn eval(&self, values: &HashMap<String, f64>) -> Result<f64, ExprError> {
        let mut stack: Vec<f64> = Vec::new();
        for token in &self.postfix {
            match token {
                Token::Number(n) => stack.push(*n),
                Token::Metric(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| ExprError::UnknownMetric(name.clone()))?;
                    stack.push(*value);
                }
                Token::Op(op) => {
                    let rhs = stack.pop().ok_or(ExprError::Malformed)?;
                    let lhs = stack.pop().ok_or(ExprError::Malformed)?;
                    let result = match op {
                        '+' => lhs + rhs,
                        '-' => lhs - rhs,
                        '*' => lhs * rhs,
                        '/' => {
                            if rhs == 0.0 {
                                return Err(ExprError::DivisionByZero);
                            }
                            lhs / rhs
                        }
                        _ => return Err(ExprError::Malformed),
                    };
                    stack.push(result);
                }
                Token::Open | Token::Close => return Err(ExprError::Malformed),
            }
        }
        match stack.as_slice() {
            [single] => Ok(*single),
            _ => Err(ExprError::Malformed),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut number = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        number.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = number.parse().map_err(|_| ExprError::Malformed)?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' || d == '.' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Metric(name));
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

/// Shunting-yard: infix tokens to postfix.
fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, ExprError> {
    let mut output = Vec::new();
    let mut ops: Vec<Token> = Vec::new();
    for token in tokens {
        match token {
            Token::Number(_) | Token::Metric(_) => output.push(token),
            Token::Op(op) => {
                while let Some(Token::Op(top)) = ops.last() {
                    if precedence(*top) >= precedence(op) {
                        output.push(ops.pop().ok_or(ExprError::Malformed)?);
                    } else {
                        break;
                    }
                }
                ops.push(Token::Op(op));
            }
            Token::Open => ops.push(Token::Open),
            Token::Close => loop {
                match ops.pop() {
                    Some(Token::Open) => break,
                    Some(op) => output.push(op),
                    None => return Err(ExprError::Unbalanced),
                }
            },
        }
    }
    while let Some(op) = ops.pop() {
        if op == Token::Open {
            return Err(ExprError::Unbalanced);
        }
        output.push(op);
    }
    Ok(output)
}

#[cfg(test)]
#[path = "expr_tests.rs"]
mod tests;
