use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Result};
use std::path::Path;

/// Where a port's text comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortKind {
    File,
    Stdin,
    String,
}

/// A line-oriented input source for the reader. Top-level results are
/// echoed only for interactive ports.
pub struct Port {
    kind: PortKind,
    interactive: bool,
    source: Box<dyn BufRead>,
    raw: Vec<u8>,
}

impl Port {
    fn new(kind: PortKind, interactive: bool, source: Box<dyn BufRead>)
        -> Port {

        Port { kind, interactive, source, raw: Vec::new() }
    }

    pub fn open_input_file<P: AsRef<Path>>(path: P) -> Result<Port> {
        let file = BufReader::new(File::open(path)?);
        Ok(Port::new(PortKind::File, false, Box::new(file)))
    }

    pub fn stdin() -> Port {
        Port::new(PortKind::Stdin, true, Box::new(BufReader::new(io::stdin())))
    }

    pub fn from_string<S: Into<String>>(text: S) -> Port {
        Port::from_bytes(text.into().into_bytes())
    }

    /// Input that need not be valid UTF-8.
    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Port {
        Port::new(PortKind::String, false, Box::new(Cursor::new(bytes.into())))
    }

    /// An in-memory port that echoes results like a terminal session.
    pub fn interactive<S: Into<String>>(text: S) -> Port {
        let bytes = text.into().into_bytes();
        Port::new(PortKind::String, true, Box::new(Cursor::new(bytes)))
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Appends the next line, newline included, to `buf`. Returns the number
    /// of bytes consumed, 0 at end of input. Bytes that aren't valid UTF-8
    /// come through as U+FFFD.
    pub fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        self.raw.clear();
        let len = self.source.read_until(b'\n', &mut self.raw)?;
        buf.push_str(&String::from_utf8_lossy(&self.raw));
        Ok(len)
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{:?} port>", self.kind)
    }
}

#[test]
fn test_string_port() {
    let mut port = Port::from_string("(a)\nb");
    assert!(!port.is_interactive());
    let mut line = String::new();
    assert_eq!(port.read_line(&mut line).unwrap(), 4);
    assert_eq!(line, "(a)\n");
    line.clear();
    port.read_line(&mut line).unwrap();
    assert_eq!(line, "b");
    line.clear();
    assert_eq!(port.read_line(&mut line).unwrap(), 0);
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let mut port = Port::from_bytes(&b"a\xe9b\nc"[..]);
    let mut line = String::new();
    assert_eq!(port.read_line(&mut line).unwrap(), 4);
    assert_eq!(line, "a\u{fffd}b\n");
}

#[test]
fn test_interactive_port() {
    assert!(Port::interactive("x").is_interactive());
    assert_eq!(format!("{:?}", Port::stdin()), "<Stdin port>");
}

#[test]
fn test_missing_file() {
    assert!(Port::open_input_file("/nonexistent/input.lisp").is_err());
}
