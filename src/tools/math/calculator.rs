//! Calculator tool
//!
//! Evaluates arithmetic expressions locally with a small recursive-descent
//! parser. Supports `+ - * / % ^ **`, parentheses, unary signs, the
//! constants `pi` and `e`, and common one-argument functions.

use async_trait::async_trait;
use tracing::debug;

use crate::core::{Result, ToolCategory, TutorError};
use crate::tools::Tool;

/// Tool for evaluating arithmetic
#[derive(Debug, Clone, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    /// Create a new calculator tool
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "Calculator"
    }

    fn description(&self) -> &str {
        "useful for when you need to perform calculations to answer questions about math. Inputs must be numbers and operations."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Math
    }

    async fn run(&self, input: &str) -> Result<String> {
        let value = evaluate(input)?;
        debug!(expression = input, value, "calculator");
        Ok(format_number(value))
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(TutorError::tool("Empty expression"));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;

    if let Some(token) = parser.peek() {
        return Err(TutorError::tool(format!("Unexpected {:?} in expression", token)));
    }
    if !value.is_finite() {
        return Err(TutorError::tool("Result is not a finite number"));
    }

    Ok(value)
}

/// Whole numbers print without a fractional part
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut number = String::new();
                while let Some(&d) = chars.peek() {
                    match d {
                        '0'..='9' | '.' => number.push(d),
                        // thousands separators
                        ',' | '_' => {}
                        _ => break,
                    }
                    chars.next();
                }
                let value = number
                    .parse::<f64>()
                    .map_err(|_| TutorError::tool(format!("Invalid number '{}'", number)))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_alphabetic() => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident.to_lowercase()));
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Op('^'));
                } else {
                    tokens.push(Token::Op('*'));
                }
            }
            '+' | '-' | '/' | '%' | '^' => {
                chars.next();
                tokens.push(Token::Op(c));
            }
            '×' => {
                chars.next();
                tokens.push(Token::Op('*'));
            }
            '÷' => {
                chars.next();
                tokens.push(Token::Op('/'));
            }
            '(' | '[' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' | ']' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            other => {
                return Err(TutorError::tool(format!(
                    "Unsupported character '{}' in expression",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => return Err(TutorError::tool("Division by zero")),
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> Result<f64> {
        match self.eat_op(&['-', '+']) {
            Some('-') => Ok(-self.unary()?),
            Some(_) => self.unary(),
            None => self.power(),
        }
    }

    // power := primary ('^' unary)?, right associative
    fn power(&mut self) -> Result<f64> {
        let base = self.primary()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Num(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect_rparen()?;
                Ok(value)
            }
            Some(Token::Ident(name)) => self.identifier(&name),
            Some(token) => Err(TutorError::tool(format!(
                "Unexpected {:?} in expression",
                token
            ))),
            None => Err(TutorError::tool("Unexpected end of expression")),
        }
    }

    fn identifier(&mut self, name: &str) -> Result<f64> {
        match name {
            "pi" | "π" => return Ok(std::f64::consts::PI),
            "e" => return Ok(std::f64::consts::E),
            _ => {}
        }

        if self.peek() != Some(&Token::LParen) {
            return Err(TutorError::tool(format!("Unknown name '{}'", name)));
        }
        self.pos += 1;
        let arg = self.expr()?;
        self.expect_rparen()?;

        let value = match name {
            "sqrt" if arg < 0.0 => {
                return Err(TutorError::tool("Square root of a negative number"))
            }
            "sqrt" => arg.sqrt(),
            "abs" => arg.abs(),
            "ln" => arg.ln(),
            "log" => arg.log10(),
            "exp" => arg.exp(),
            "sin" => arg.sin(),
            "cos" => arg.cos(),
            "tan" => arg.tan(),
            "floor" => arg.floor(),
            "ceil" => arg.ceil(),
            "round" => arg.round(),
            other => return Err(TutorError::tool(format!("Unknown function '{}'", other))),
        };
        Ok(value)
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            _ => Err(TutorError::tool("Missing closing parenthesis")),
        }
    }
}
