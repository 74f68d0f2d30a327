mod lexer;

use crate::error::{Error, Result};
use crate::heap::Mutator;
use crate::port::Port;
use crate::runtime::Interpreter;
use crate::scheme::Value;

pub use self::lexer::{is_integer_literal, Lexer, Token};

/// Recursive-descent reader building expressions directly on the heap.
#[derive(Debug)]
pub struct Reader {
    lexer: Lexer,
    // Open parentheses of the form being read.
    depth: usize,
}

impl Reader {
    pub fn new(port: Port) -> Self {
        Reader {
            lexer: Lexer::new(port),
            depth: 0,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.lexer.port().is_interactive()
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        let token = self.lexer.next_token()?;
        match token {
            Some(Token::LeftParen) => self.depth += 1,
            Some(Token::RightParen) =>
                self.depth = self.depth.saturating_sub(1),
            _ => {},
        }
        Ok(token)
    }

    fn expect_token(&mut self) -> Result<Token> {
        self.next_token()?.ok_or(Error::UnexpectedEof)
    }

    /// Reads one top-level expression. `Ok(None)` means the input is
    /// exhausted. After a syntax error the rest of the broken form is
    /// skipped, so the next call starts at a fresh top-level form.
    pub fn read(&mut self, interp: &mut Interpreter) -> Result<Option<Value>>
    {
        self.depth = 0;
        let result = match self.next_token() {
            Ok(Some(token)) => self.read_expr(token, interp).map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        if let Err(ref err) = result {
            if err.is_syntax() {
                self.recover()?;
            }
        }
        result
    }

    fn recover(&mut self) -> Result<()> {
        while self.depth > 0 {
            match self.next_token() {
                Ok(Some(_)) | Err(Error::UnexpectedChar(_)) => {},
                Ok(None) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn read_expr(&mut self, token: Token, interp: &mut Interpreter)
        -> Result<Value> {

        match token {
            Token::Atom(text) => interp.atom(&text),
            Token::LeftParen => self.read_list(interp),
            Token::RightParen => Err(Error::UnexpectedParen),
        }
    }

    // Elements are consed onto a rooted list in reverse, then the pairs are
    // turned around in place onto the (possibly dotted) tail.
    fn read_list(&mut self, interp: &mut Interpreter) -> Result<Value> {
        interp.with_roots(&[None], |interp, frame| loop {
            let token = self.expect_token()?;
            let items = interp.heap.root(frame, 0);
            match token {
                Token::RightParen => {
                    return Ok(interp.heap.reverse_in_place(items, None));
                },
                Token::Atom(ref dot) if dot == "." && items.is_some() => {
                    let tail = match self.expect_token()? {
                        Token::RightParen => return Err(Error::MalformedDot),
                        token => self.read_expr(token, interp)?,
                    };
                    if self.expect_token()? != Token::RightParen {
                        return Err(Error::MalformedDot);
                    }
                    let items = interp.heap.root(frame, 0);
                    return Ok(interp.heap.reverse_in_place(items, tail));
                },
                token => {
                    let item = self.read_expr(token, interp)?;
                    let items = interp.heap.root(frame, 0);
                    let items = interp.heap.cons(item, items)?;
                    interp.heap.set_root(frame, 0, items);
                },
            }
        })
    }
}
