//! Preprocessor Conditionals
//!
//! Evaluates the `#if`-style expressions found in `if` attributes of program
//! documents and in `context` requirements of effect techniques, against the
//! active [`DefineSet`].
//!
//! Supported grammar (C preprocessor subset, lowest precedence first):
//!
//! ```text
//! expr    := or
//! or      := and ( "||" and )*
//! and     := bitor ( "&&" bitor )*
//! bitor   := bitxor ( "|" bitxor )*
//! bitxor  := bitand ( "^" bitand )*
//! bitand  := equal ( "&" equal )*
//! equal   := rel ( ( "==" | "!=" ) rel )*
//! rel     := shift ( ( "<" | "<=" | ">" | ">=" ) shift )*
//! shift   := add ( ( "<<" | ">>" ) add )*
//! add     := mul ( ( "+" | "-" ) mul )*
//! mul     := unary ( ( "*" | "/" | "%" ) unary )*
//! unary   := ( "!" | "-" | "+" | "~" ) unary | primary
//! primary := INT | IDENT | "defined" ( "(" IDENT ")" | IDENT ) | "(" expr ")"
//! ```
//!
//! An identifier evaluates to its define value, itself parsed as an
//! expression; undefined identifiers evaluate to `0`.

use umbra_core::errors::{Result, ShaderError};
use umbra_resources::DefineSet;

/// Maximum nesting of define values referencing other defines.
const MAX_EXPANSION_DEPTH: usize = 16;

/// Maximum nesting of parentheses and unary operators, define expansions
/// included.
const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Int(i64),
    Ident(&'a str),
    Op(&'static str),
    LParen,
    RParen,
}

const OPERATORS: &[&str] = &[
    "||", "&&", "==", "!=", "<=", ">=", "<<", ">>", "|", "^", "&", "<", ">", "+", "-", "*", "/",
    "%", "!", "~",
];

fn tokenize(expr: &str) -> std::result::Result<Vec<Token<'_>>, String> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
        } else if c == b'(' {
            tokens.push(Token::LParen);
            pos += 1;
        } else if c == b')' {
            tokens.push(Token::RParen);
            pos += 1;
        } else if c.is_ascii_digit() {
            let start = pos;
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            tokens.push(Token::Int(parse_int(&expr[start..pos])?));
        } else if c.is_ascii_alphabetic() || c == b'_' {
            let start = pos;
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            tokens.push(Token::Ident(&expr[start..pos]));
        } else if let Some(op) = OPERATORS.iter().find(|op| expr[pos..].starts_with(**op)) {
            tokens.push(Token::Op(*op));
            pos += op.len();
        } else {
            let c = expr[pos..].chars().next().unwrap_or('?');
            return Err(format!("unexpected character '{c}'"));
        }
    }

    Ok(tokens)
}

fn parse_int(literal: &str) -> std::result::Result<i64, String> {
    let trimmed = literal.trim_end_matches(['u', 'U', 'l', 'L']);
    let hex = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"));
    let parsed = if let Some(hex) = hex {
        i64::from_str_radix(hex, 16)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        i64::from_str_radix(&trimmed[1..], 8)
    } else {
        trimmed.parse::<i64>()
    };
    parsed.map_err(|_| format!("invalid integer literal '{literal}'"))
}

struct Parser<'a, 'd> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    defines: &'d DefineSet,
    depth: usize,
    nesting: usize,
}

impl<'a> Parser<'a, '_> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_expression(&mut self) -> std::result::Result<i64, String> {
        self.parse_binary(0)
    }

    /// Runs `parse` one nesting level deeper.
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> std::result::Result<i64, String>,
    ) -> std::result::Result<i64, String> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Err(format!("expression nested deeper than {MAX_NESTING_DEPTH} levels"));
        }
        self.nesting += 1;
        let value = parse(self);
        self.nesting -= 1;
        value
    }

    fn parse_binary(&mut self, level: usize) -> std::result::Result<i64, String> {
        const LEVELS: &[&[&str]] = &[
            &["||"],
            &["&&"],
            &["|"],
            &["^"],
            &["&"],
            &["==", "!="],
            &["<", "<=", ">", ">="],
            &["<<", ">>"],
            &["+", "-"],
            &["*", "/", "%"],
        ];

        let Some(ops) = LEVELS.get(level) else {
            return self.parse_unary();
        };

        let mut lhs = self.parse_binary(level + 1)?;
        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if !ops.contains(&op) {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_binary(level + 1)?;
            lhs = apply_binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> std::result::Result<i64, String> {
        match self.peek() {
            Some(Token::Op("!")) => {
                self.pos += 1;
                Ok(i64::from(self.nested(Self::parse_unary)? == 0))
            }
            Some(Token::Op("-")) => {
                self.pos += 1;
                Ok(self.nested(Self::parse_unary)?.wrapping_neg())
            }
            Some(Token::Op("+")) => {
                self.pos += 1;
                self.nested(Self::parse_unary)
            }
            Some(Token::Op("~")) => {
                self.pos += 1;
                Ok(!self.nested(Self::parse_unary)?)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> std::result::Result<i64, String> {
        match self.next() {
            Some(Token::Int(value)) => Ok(value),
            Some(Token::Ident("defined")) => {
                let name = match self.next() {
                    Some(Token::LParen) => {
                        let Some(Token::Ident(name)) = self.next() else {
                            return Err("expected identifier after 'defined('".to_string());
                        };
                        if self.next() != Some(Token::RParen) {
                            return Err("expected ')' after 'defined(NAME'".to_string());
                        }
                        name
                    }
                    Some(Token::Ident(name)) => name,
                    _ => return Err("expected identifier after 'defined'".to_string()),
                };
                Ok(i64::from(self.defines.contains(name)))
            }
            Some(Token::Ident(name)) => self.expand(name),
            Some(Token::LParen) => {
                let value = self.nested(Self::parse_expression)?;
                if self.next() != Some(Token::RParen) {
                    return Err("missing ')'".to_string());
                }
                Ok(value)
            }
            Some(token) => Err(format!("unexpected token {token:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn expand(&self, name: &str) -> std::result::Result<i64, String> {
        let Some(value) = self.defines.get(name) else {
            return Ok(0);
        };
        if value.trim().is_empty() {
            return Ok(0);
        }
        if self.depth >= MAX_EXPANSION_DEPTH {
            return Err(format!("define '{name}' expands recursively"));
        }
        evaluate(value, self.defines, self.depth + 1, self.nesting + 1)
    }
}

fn apply_binary(op: &str, lhs: i64, rhs: i64) -> std::result::Result<i64, String> {
    Ok(match op {
        "||" => i64::from(lhs != 0 || rhs != 0),
        "&&" => i64::from(lhs != 0 && rhs != 0),
        "|" => lhs | rhs,
        "^" => lhs ^ rhs,
        "&" => lhs & rhs,
        "==" => i64::from(lhs == rhs),
        "!=" => i64::from(lhs != rhs),
        "<" => i64::from(lhs < rhs),
        "<=" => i64::from(lhs <= rhs),
        ">" => i64::from(lhs > rhs),
        ">=" => i64::from(lhs >= rhs),
        "<<" => lhs.wrapping_shl(rhs as u32),
        ">>" => lhs.wrapping_shr(rhs as u32),
        "+" => lhs.wrapping_add(rhs),
        "-" => lhs.wrapping_sub(rhs),
        "*" => lhs.wrapping_mul(rhs),
        "/" | "%" if rhs == 0 => return Err("division by zero".to_string()),
        "/" => lhs.wrapping_div(rhs),
        "%" => lhs.wrapping_rem(rhs),
        _ => return Err(format!("unknown operator '{op}'")),
    })
}

fn evaluate(
    expr: &str,
    defines: &DefineSet,
    depth: usize,
    nesting: usize,
) -> std::result::Result<i64, String> {
    let mut parser = Parser {
        tokens: tokenize(expr)?,
        pos: 0,
        defines,
        depth,
        nesting,
    };
    if parser.tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let value = parser.parse_expression()?;
    if let Some(token) = parser.peek() {
        return Err(format!("unexpected trailing token {token:?}"));
    }
    Ok(value)
}

/// Conditional evaluator bound to a define set.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    defines: DefineSet,
}

impl Preprocessor {
    #[must_use]
    pub fn new(defines: &DefineSet) -> Self {
        Self {
            defines: defines.clone(),
        }
    }

    pub fn add_defines(&mut self, defines: &DefineSet) {
        self.defines.merge(defines);
    }

    #[must_use]
    pub fn defines(&self) -> &DefineSet {
        &self.defines
    }

    /// Evaluates `expr`; non-zero is `true`.
    pub fn test_conditional(&self, expr: &str) -> Result<bool> {
        evaluate(expr, &self.defines, 0, 0)
            .map(|value| value != 0)
            .map_err(|reason| ShaderError::Condition {
                expression: expr.to_string(),
                reason,
            })
    }

    /// Keeps the lines of the active `#if`/`#ifdef`/`#ifndef`/`#elif`/`#else`
    /// branches of `source` and drops the conditional directives. Every other
    /// line, directives included, passes through untouched.
    pub fn resolve_conditionals(&self, source: &str) -> Result<String> {
        let mut stack: Vec<Branch> = Vec::new();
        let mut out = String::with_capacity(source.len());

        for line in source.lines() {
            let active = stack.last().is_none_or(|b| b.active);
            let Some((directive, rest)) = split_directive(line) else {
                if active {
                    out.push_str(line);
                    out.push('\n');
                }
                continue;
            };

            match directive {
                "if" | "ifdef" | "ifndef" => {
                    let taken = active
                        && match directive {
                            "ifdef" => self.defines.contains(rest),
                            "ifndef" => !self.defines.contains(rest),
                            _ => self.test_conditional(rest)?,
                        };
                    stack.push(Branch {
                        enclosing_active: active,
                        taken,
                        active: taken,
                    });
                }
                "elif" => {
                    let branch = stack.last_mut().ok_or_else(|| unbalanced(line))?;
                    branch.active = branch.enclosing_active
                        && !branch.taken
                        && self.test_conditional(rest)?;
                    branch.taken |= branch.active;
                }
                "else" => {
                    let branch = stack.last_mut().ok_or_else(|| unbalanced(line))?;
                    branch.active = branch.enclosing_active && !branch.taken;
                    branch.taken = true;
                }
                "endif" => {
                    stack.pop().ok_or_else(|| unbalanced(line))?;
                }
                _ if active => {
                    out.push_str(line);
                    out.push('\n');
                }
                _ => {}
            }
        }

        if stack.is_empty() {
            Ok(out)
        } else {
            Err(ShaderError::Condition {
                expression: String::new(),
                reason: format!("{} unterminated conditional block(s)", stack.len()),
            })
        }
    }
}

struct Branch {
    enclosing_active: bool,
    /// Whether an earlier branch of the same block was taken.
    taken: bool,
    active: bool,
}

/// Splits `#name rest` into `("name", "rest")`.
fn split_directive(line: &str) -> Option<(&str, &str)> {
    let body = line.trim_start().strip_prefix('#')?.trim_start();
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    Some((&body[..end], body[end..].trim()))
}

fn unbalanced(line: &str) -> ShaderError {
    ShaderError::Condition {
        expression: line.trim().to_string(),
        reason: "directive outside a conditional block".to_string(),
    }
}
