use nom::branch::alt;
use nom::bytes::complete::{take_while, take_while1};
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{all_consuming, map, opt, recognize, value};
use nom::sequence::{pair, preceded};
use nom::IResult;

use crate::error::{Error, Result};
use crate::port::Port;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    LeftParen,
    RightParen,
    Atom(String),
}

/// Printable ASCII other than space and parentheses.
pub fn is_atom_char(c: char) -> bool {
    ('!'..='\'').contains(&c) || ('*'..='~').contains(&c)
}

// ASCII whitespace, vertical tab included.
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b'
}

fn token(input: &str) -> IResult<&str, Token> {
    preceded(
        take_while(is_space),
        alt((
            value(Token::LeftParen, char('(')),
            value(Token::RightParen, char(')')),
            map(take_while1(is_atom_char),
                |text: &str| Token::Atom(text.to_string())),
        )),
    )(input)
}

fn integer(input: &str) -> IResult<&str, &str> {
    all_consuming(recognize(pair(opt(one_of("+-")), digit1)))(input)
}

/// An optional sign followed by one or more decimal digits.
pub fn is_integer_literal(text: &str) -> bool {
    integer(text).is_ok()
}

/// Splits a port into tokens. Tokens never span lines, so input is pulled
/// one line at a time and a form typed at a terminal is read as soon as it
/// is complete.
#[derive(Debug)]
pub struct Lexer {
    port: Port,
    line: String,
    pos: usize,
}

impl Lexer {
    pub fn new(port: Port) -> Lexer {
        Lexer {
            port,
            line: String::new(),
            pos: 0,
        }
    }

    pub fn port(&self) -> &Port {
        &self.port
    }

    /// The next token, or `None` at end of input. A character that can't
    /// start a token is skipped and reported.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            let rest = &self.line[self.pos..];
            if let Ok((remaining, tok)) = token(rest) {
                self.pos = self.line.len() - remaining.len();
                return Ok(Some(tok));
            }
            let trimmed = rest.trim_start_matches(is_space);
            if let Some(c) = trimmed.chars().next() {
                self.pos = self.line.len() - trimmed.len() + c.len_utf8();
                return Err(Error::UnexpectedChar(c));
            }
            self.line.clear();
            self.pos = 0;
            if self.port.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}
