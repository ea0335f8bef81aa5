//! Meta-code expression evaluator.
//!
//! Scripts may embed small expression-language snippets between `<?` and
//! `?>` markers; the preprocessor evaluates them and splices whatever they
//! `printf` into the output text. The full script VM lives behind the host's
//! compiler service, but this interpreter covers the statement subset that
//! meta-code actually uses, so preprocessing works standalone (CLI, tests):
//!
//! ```text
//! script ::= stmt ( ';' stmt )* ';'?
//! stmt   ::= ident ('=' | '+=' | '-=' | '*=' | '/=') expr
//!          | 'printf' '(' string ( ',' expr )* ')'
//!          | expr
//! expr   ::= term ( ('+' | '-') term )*
//! term   ::= unary ( ('*' | '/' | '%') unary )*
//! unary  ::= ('-' | '+') unary | number | ident | '(' expr ')'
//! ```
//!
//! `printf` supports `%d`, `%u`, `%f`, `%g` and `%%`. Variables are plain
//! numbers; undefined reads evaluate to 0, matching the scripting dialect.

use std::collections::HashMap;

/// Failure inside a meta-code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    /// Byte offset into the evaluated code where parsing failed.
    pub offset: usize,
    /// Short description, e.g. `"syntax error"`.
    pub message: String,
}

/// Evaluates meta-code blocks for the preprocessor.
///
/// Implementations accumulate printed output and return it per block; a
/// host with a full script VM can substitute its own evaluator.
pub trait MetaEvaluator {
    /// Evaluate `code` and return whatever it printed.
    ///
    /// Variable state persists across calls within one preprocessor run.
    fn evaluate(&mut self, code: &str) -> Result<String, EvalError>;
}

/// The built-in [`MetaEvaluator`]: a small tree-walking interpreter.
#[derive(Debug, Default)]
pub struct Interpreter {
    vars: HashMap<String, f64>,
}

impl Interpreter {
    /// Create an interpreter with no predefined variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an interpreter seeded with caller-supplied named values.
    pub fn with_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            vars: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Current value of a variable, if any statement assigned it.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }
}

impl MetaEvaluator for Interpreter {
    fn evaluate(&mut self, code: &str) -> Result<String, EvalError> {
        let mut parser = Parser {
            input: code.as_bytes(),
            pos: 0,
            vars: &mut self.vars,
            output: String::new(),
        };
        parser.run()?;
        Ok(parser.output)
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    vars: &'a mut HashMap<String, f64>,
    output: String,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn fail(&self, message: &str) -> EvalError {
        EvalError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn run(&mut self) -> Result<(), EvalError> {
        loop {
            self.skip_ws();
            if self.pos >= self.input.len() {
                return Ok(());
            }
            self.parse_statement()?;
            self.skip_ws();
            match self.peek() {
                None => return Ok(()),
                Some(b';') => self.pos += 1,
                Some(_) => return Err(self.fail("syntax error")),
            }
        }
    }

    fn parse_statement(&mut self) -> Result<(), EvalError> {
        self.skip_ws();

        if self.starts_with_ident("printf") {
            let after = self.pos + "printf".len();
            let mut probe = after;
            while probe < self.input.len() && self.input[probe].is_ascii_whitespace() {
                probe += 1;
            }
            if self.input.get(probe) == Some(&b'(') {
                self.pos = probe + 1;
                return self.parse_printf();
            }
        }

        // Assignment: ident op expr, where op is '=' or a compound form.
        let save = self.pos;
        if let Some(name) = self.parse_ident() {
            self.skip_ws();
            let op = self.parse_assign_op();
            if let Some(op) = op {
                let value = self.parse_expr()?;
                let slot = self.vars.entry(name).or_insert(0.0);
                match op {
                    b'=' => *slot = value,
                    b'+' => *slot += value,
                    b'-' => *slot -= value,
                    b'*' => *slot *= value,
                    b'/' => *slot /= value,
                    _ => unreachable!("checked by parse_assign_op"),
                }
                return Ok(());
            }
            self.pos = save;
        }

        // Bare expression, evaluated for side effects only.
        self.parse_expr()?;
        Ok(())
    }

    fn parse_assign_op(&mut self) -> Option<u8> {
        match self.peek() {
            Some(b'=') if self.input.get(self.pos + 1) != Some(&b'=') => {
                self.pos += 1;
                Some(b'=')
            }
            Some(op @ (b'+' | b'-' | b'*' | b'/'))
                if self.input.get(self.pos + 1) == Some(&b'=') =>
            {
                self.pos += 2;
                Some(op)
            }
            _ => None,
        }
    }

    fn parse_printf(&mut self) -> Result<(), EvalError> {
        self.skip_ws();
        let format = self.parse_string()?;

        let mut args = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    args.push(self.parse_expr()?);
                }
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.fail("expected ',' or ')' in printf")),
            }
        }

        let text = format_printf(&format, &args)
            .map_err(|message| self.fail(&message))?;
        self.output.push_str(&text);
        Ok(())
    }

    fn parse_string(&mut self) -> Result<String, EvalError> {
        if self.peek() != Some(b'"') {
            return Err(self.fail("expected string literal"));
        }
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b'"' {
                let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                self.pos += 1;
                return Ok(text);
            }
            if c == b'\\' && self.pos + 1 < self.input.len() {
                self.pos += 1;
            }
            self.pos += 1;
        }
        Err(self.fail("unterminated string literal"))
    }

    fn parse_expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.parse_term()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'+') if self.input.get(self.pos + 1) != Some(&b'=') => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Some(b'-') if self.input.get(self.pos + 1) != Some(&b'=') => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.parse_unary()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') if self.input.get(self.pos + 1) != Some(&b'=') => {
                    self.pos += 1;
                    value *= self.parse_unary()?;
                }
                Some(b'/') if self.input.get(self.pos + 1) != Some(&b'=') => {
                    self.pos += 1;
                    value /= self.parse_unary()?;
                }
                Some(b'%') => {
                    self.pos += 1;
                    value %= self.parse_unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<f64, EvalError> {
        self.skip_ws();
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.parse_unary()?)
            }
            Some(b'+') => {
                self.pos += 1;
                self.parse_unary()
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.parse_expr()?;
                self.skip_ws();
                if self.peek() != Some(b')') {
                    return Err(self.fail("expected ')'"));
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.parse_number(),
            Some(c) if c == b'_' || c.is_ascii_alphabetic() => {
                let name = match self.parse_ident() {
                    Some(name) => name,
                    None => return Err(self.fail("syntax error")),
                };
                Ok(self.vars.get(&name).copied().unwrap_or(0.0))
            }
            _ => Err(self.fail("syntax error")),
        }
    }

    fn parse_number(&mut self) -> Result<f64, EvalError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.input[start..self.pos]);
        text.parse::<f64>().map_err(|_| EvalError {
            offset: start,
            message: "malformed number".to_string(),
        })
    }

    fn parse_ident(&mut self) -> Option<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c == b'_' || c.is_ascii_alphabetic() => {}
            _ => return None,
        }
        while let Some(c) = self.peek() {
            if c == b'_' || c.is_ascii_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        Some(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn starts_with_ident(&self, word: &str) -> bool {
        let end = self.pos + word.len();
        self.input[self.pos..].starts_with(word.as_bytes())
            && !matches!(self.input.get(end), Some(c) if *c == b'_' || c.is_ascii_alphanumeric())
    }
}

fn format_printf(format: &str, args: &[f64]) -> Result<String, String> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars();
    let mut next_arg = 0;

    let mut take = |next_arg: &mut usize| -> Result<f64, String> {
        let value = args
            .get(*next_arg)
            .copied()
            .ok_or_else(|| "missing printf argument".to_string())?;
        *next_arg += 1;
        Ok(value)
    };

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('d' | 'i') => {
                let v = take(&mut next_arg)?;
                out.push_str(&format!("{}", v as i64));
            }
            Some('u') => {
                let v = take(&mut next_arg)?;
                out.push_str(&format!("{}", v.max(0.0) as u64));
            }
            Some('f') => {
                let v = take(&mut next_arg)?;
                out.push_str(&format!("{v:.6}"));
            }
            Some('g') => {
                let v = take(&mut next_arg)?;
                out.push_str(&format!("{v}"));
            }
            Some(other) => return Err(format!("unsupported format specifier '%{other}'")),
            None => return Err("dangling '%' in format string".to_string()),
        }
    }
    Ok(out)
}
