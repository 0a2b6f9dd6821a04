//! Text to form-tree reader

use thiserror::Error;

use super::form::Form;

/// Error produced when input cannot be read as a form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the input
    pub offset: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Parse exactly one form, allowing only trivia after it
pub fn parse_form(input: &str) -> Result<Form, ParseError> {
    let mut reader = Reader::new(input);
    let form = reader.read_form()?;
    reader.skip_trivia();
    if !reader.at_end() {
        return Err(ParseError::new("trailing content after form", reader.pos));
    }
    Ok(form)
}

/// Parse every top-level form in the input
pub fn parse_forms(input: &str) -> Result<Vec<Form>, ParseError> {
    let mut reader = Reader::new(input);
    let mut forms = Vec::new();
    loop {
        reader.skip_trivia();
        if reader.at_end() {
            return Ok(forms);
        }
        forms.push(reader.read_form()?);
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';')
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace, commas and line comments
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_form(&mut self) -> Result<Form, ParseError> {
        self.skip_trivia();
        let start = self.pos;
        match self.peek() {
            None => Err(ParseError::new("unexpected end of input", start)),
            Some('(') => {
                self.bump();
                self.read_seq(')', start).map(Form::List)
            }
            Some('[') => {
                self.bump();
                self.read_seq(']', start).map(Form::Vector)
            }
            Some('{') => self.read_map(),
            Some('"') => self.read_string().map(Form::Str),
            Some(c @ (')' | ']' | '}')) => {
                Err(ParseError::new(format!("unexpected '{}'", c), start))
            }
            Some('#') => self.read_dispatch(),
            Some('\'') => {
                self.bump();
                let inner = self.read_form()?;
                Ok(Form::List(vec![Form::Symbol("quote".to_string()), inner]))
            }
            Some('\\') => self.read_char(),
            Some(_) => self.read_atom(),
        }
    }

    /// Read items until `close`, opener already consumed
    fn read_seq(&mut self, close: char, open_at: usize) -> Result<Vec<Form>, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(ParseError::new("unterminated sequence", open_at)),
                Some(c) if c == close => {
                    self.bump();
                    return Ok(items);
                }
                Some(c @ (')' | ']' | '}')) => {
                    return Err(ParseError::new(format!("mismatched '{}'", c), self.pos));
                }
                Some(_) => items.push(self.read_form()?),
            }
        }
    }

    fn read_map(&mut self) -> Result<Form, ParseError> {
        let open_at = self.pos;
        self.bump();
        let items = self.read_seq('}', open_at)?;
        if items.len() % 2 != 0 {
            return Err(ParseError::new(
                "map literal with odd number of forms",
                open_at,
            ));
        }
        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            pairs.push((k, v));
        }
        Ok(Form::Map(pairs))
    }

    /// `#{...}` sets, `#"..."` regexes and `#tag form` tagged literals
    fn read_dispatch(&mut self) -> Result<Form, ParseError> {
        let start = self.pos;
        self.bump();
        match self.peek() {
            Some('{') => {
                self.bump();
                self.read_seq('}', start).map(Form::Set)
            }
            Some('"') => self.read_string().map(Form::Regex),
            Some(c) if !is_delimiter(c) => {
                let tag = self.read_token();
                let value = self.read_form()?;
                Ok(Form::Tagged(tag, Box::new(value)))
            }
            _ => Err(ParseError::new("unsupported dispatch", start)),
        }
    }

    fn read_string(&mut self) -> Result<String, ParseError> {
        let open_at = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::new("unterminated string", open_at)),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escape_at = self.pos;
                    match self.bump() {
                        None => return Err(ParseError::new("unterminated string", open_at)),
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some('\\') => out.push('\\'),
                        Some('"') => out.push('"'),
                        Some('u') => out.push(self.read_hex4(escape_at)?),
                        Some(c) => {
                            return Err(ParseError::new(
                                format!("unknown escape '\\{}'", c),
                                escape_at,
                            ));
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn read_hex4(&mut self, at: usize) -> Result<char, ParseError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| ParseError::new("invalid unicode escape", at))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| ParseError::new("invalid unicode escape", at))
    }

    fn read_char(&mut self) -> Result<Form, ParseError> {
        let start = self.pos;
        self.bump();
        let token = self.read_token();
        if token.is_empty() {
            // Delimiter characters print as e.g. `\(`
            return match self.bump() {
                Some(c) => Ok(Form::Char(c)),
                None => Err(ParseError::new("unterminated character literal", start)),
            };
        }
        let c = match token.as_str() {
            "newline" => '\n',
            "space" => ' ',
            "tab" => '\t',
            "return" => '\r',
            "backspace" => '\u{8}',
            "formfeed" => '\u{c}',
            _ => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    (Some('u'), Some(_)) if token.len() == 5 => {
                        u32::from_str_radix(&token[1..], 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| {
                                ParseError::new("invalid unicode character literal", start)
                            })?
                    }
                    _ => {
                        return Err(ParseError::new(
                            format!("unknown character literal '\\{}'", token),
                            start,
                        ));
                    }
                }
            }
        };
        Ok(Form::Char(c))
    }

    fn read_token(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            self.bump();
        }
        self.input[start..self.pos].to_string()
    }

    fn read_atom(&mut self) -> Result<Form, ParseError> {
        let start = self.pos;
        let token = self.read_token();
        if token.is_empty() {
            return Err(ParseError::new("unexpected character", start));
        }
        Ok(classify(token))
    }
}

/// Classify an atom token. Anything that is not nil, a boolean, a keyword
/// or a number falls through to a symbol.
fn classify(token: String) -> Form {
    match token.as_str() {
        "nil" => return Form::Nil,
        "true" => return Form::Bool(true),
        "false" => return Form::Bool(false),
        _ => {}
    }
    if let Some(name) = token.strip_prefix(':') {
        return Form::Keyword(name.to_string());
    }
    let mut chars = token.chars();
    let first = chars.next().unwrap_or('\0');
    let numeric_start =
        first.is_ascii_digit() || (matches!(first, '+' | '-') && chars.next().is_some_and(|c| c.is_ascii_digit()));
    if numeric_start {
        if let Ok(n) = token.parse::<i64>() {
            return Form::Int(n);
        }
        if let Ok(x) = token.parse::<f64>() {
            return Form::Float(x);
        }
    }
    Form::Symbol(token)
}
