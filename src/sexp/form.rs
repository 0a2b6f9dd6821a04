//! The form tree produced by the reader

use std::fmt;

/// A parsed s-expression form
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    /// Keyword without the leading colon
    Keyword(String),
    Symbol(String),
    List(Vec<Form>),
    Vector(Vec<Form>),
    /// Key/value pairs in source order
    Map(Vec<(Form, Form)>),
    Set(Vec<Form>),
    /// Regex literal, kept as its source text
    Regex(String),
    /// Tagged literal such as `#inst "..."` or `#object[...]`
    Tagged(String, Box<Form>),
}

impl Form {
    pub fn is_nil(&self) -> bool {
        matches!(self, Form::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Form::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Form::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Form::Keyword(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Form::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Items of a list or vector
    pub fn items(&self) -> Option<&[Form]> {
        match self {
            Form::List(items) | Form::Vector(items) => Some(items),
            _ => None,
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Form]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Nil => write!(f, "nil"),
            Form::Bool(b) => write!(f, "{}", b),
            Form::Int(n) => write!(f, "{}", n),
            Form::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Form::Char(c) => match c {
                '\n' => write!(f, "\\newline"),
                ' ' => write!(f, "\\space"),
                '\t' => write!(f, "\\tab"),
                '\r' => write!(f, "\\return"),
                _ => write!(f, "\\{}", c),
            },
            Form::Str(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        _ => write!(f, "{}", c)?,
                    }
                }
                write!(f, "\"")
            }
            Form::Keyword(k) => write!(f, ":{}", k),
            Form::Symbol(s) => write!(f, "{}", s),
            Form::List(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                write!(f, ")")
            }
            Form::Vector(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Form::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", k, v)?;
                }
                write!(f, "}}")
            }
            Form::Set(items) => {
                write!(f, "#{{")?;
                write_items(f, items)?;
                write!(f, "}}")
            }
            Form::Regex(src) => write!(f, "#\"{}\"", src),
            Form::Tagged(tag, value) => write!(f, "#{} {}", tag, value),
        }
    }
}
