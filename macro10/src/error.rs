use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Line failed the tokenizer.
    Syntax(String),
    /// Unmatched delimiters or a scope left open at end of input.
    Scope(String),
    /// Bad DEFINE/OPDEF header, redefined label, missing body.
    Definition(String),
    /// Expression the host could not evaluate.
    Expression(String),
    /// Resource could not be loaded.
    Resource(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Syntax(s)
            | ErrorKind::Scope(s)
            | ErrorKind::Definition(s)
            | ErrorKind::Expression(s)
            | ErrorKind::Resource(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    pub line: u32,
    pub kind: ErrorKind,
}

impl Error {
    pub fn syntax(line: u32, message: impl Into<String>) -> Error {
        Error {
            line,
            kind: ErrorKind::Syntax(message.into()),
        }
    }

    pub fn scope(line: u32, message: impl Into<String>) -> Error {
        Error {
            line,
            kind: ErrorKind::Scope(message.into()),
        }
    }

    pub fn definition(line: u32, message: impl Into<String>) -> Error {
        Error {
            line,
            kind: ErrorKind::Definition(message.into()),
        }
    }

    pub fn expression(line: u32, message: impl Into<String>) -> Error {
        Error {
            line,
            kind: ErrorKind::Expression(message.into()),
        }
    }

    pub fn resource(message: impl Into<String>) -> Error {
        Error {
            line: 0,
            kind: ErrorKind::Resource(message.into()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.line == 0 {
            write!(f, "error: {}", self.kind)
        } else {
            write!(f, "error at line {}: {}", self.line, self.kind)
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
