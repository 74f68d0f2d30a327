use std::io;

use thiserror::Error;

/// Everything that can go wrong while reading or evaluating.
///
/// Three variants are fatal (see [`Error::is_fatal`]): the interpreter state
/// is not meant to be used after them. Syntax errors leave the reader
/// resynchronised at the next top-level form. Everything else aborts the
/// current top-level evaluation only.
#[derive(Debug, Error)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,
    #[error("root stack overflow ({0})")]
    RootStackOverflow(&'static str),
    #[error("no cond clause matched")]
    NoMatchingClause,

    #[error("unexpected )")]
    UnexpectedParen,
    #[error("malformed dotted cons")]
    MalformedDot,
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unbound variable {0}")]
    Unbound(String),
    #[error("not a procedure: {0}")]
    NotCallable(String),
    #[error("{name}: expected {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("{name}: expected {expected}")]
    WrongType {
        name: &'static str,
        expected: &'static str,
    },
    #[error("malformed {0} form")]
    BadForm(&'static str),
    #[error("{0}: integer overflow")]
    Overflow(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::OutOfMemory
            | Error::RootStackOverflow(_)
            | Error::NoMatchingClause => true,
            _ => false,
        }
    }

    pub fn is_syntax(&self) -> bool {
        match self {
            Error::UnexpectedParen
            | Error::MalformedDot
            | Error::UnexpectedChar(_) => true,
            _ => false,
        }
    }

    pub(crate) fn arity<S: ToString>(name: &str, expected: S, got: usize)
        -> Error {

        Error::Arity {
            name: name.to_string(),
            expected: expected.to_string(),
            got,
        }
    }

    pub(crate) fn wrong_type(name: &'static str, expected: &'static str)
        -> Error {

        Error::WrongType { name, expected }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[test]
fn test_classification() {
    assert!(Error::OutOfMemory.is_fatal());
    assert!(Error::NoMatchingClause.is_fatal());
    assert!(!Error::UnexpectedParen.is_fatal());
    assert!(Error::UnexpectedParen.is_syntax());
    assert!(!Error::UnexpectedEof.is_syntax());
    assert!(!Error::Unbound("x".to_string()).is_fatal());
}

#[test]
fn test_messages() {
    assert_eq!(Error::arity("car", 1, 2).to_string(),
        "car: expected 1 argument(s), got 2");
    assert_eq!(Error::Unbound("foo".to_string()).to_string(),
        "unbound variable foo");
}
