use std::collections::HashMap;
use std::rc::Rc;

use crate::read::is_integer_literal;

/// Handle to an interned atom name. Two symbols are equal iff their text is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

#[derive(Debug)]
struct Entry {
    text: Rc<str>,
    // Checked once at interning time, so evaluating a number atom doesn't
    // re-scan its text.
    numeric: bool,
}

/// Deduplicating string table. Names are never reclaimed and live outside
/// the traced heap.
#[derive(Debug, Default)]
pub struct Interner {
    entries: Vec<Entry>,
    index: HashMap<Rc<str>, Symbol>,
}

impl Interner {
    pub fn new() -> Interner {
        Interner::default()
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(&symbol) = self.index.get(text) {
            return symbol;
        }
        let symbol = Symbol(self.entries.len() as u32);
        let text: Rc<str> = Rc::from(text);
        log::trace!("interned {:?} as #{}", text, symbol.0);
        self.entries.push(Entry {
            numeric: is_integer_literal(&text),
            text: text.clone(),
        });
        self.index.insert(text, symbol);
        symbol
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        &self.entries[symbol.0 as usize].text
    }

    /// Whether the symbol's text is a signed integer literal. Such atoms
    /// evaluate to themselves.
    pub fn is_number(&self, symbol: Symbol) -> bool {
        self.entries[symbol.0 as usize].numeric
    }

    /// The value of a numeric symbol. `None` for non-numbers and for
    /// literals that don't fit in an `i64`.
    pub fn integer(&self, symbol: Symbol) -> Option<i64> {
        if self.is_number(symbol) {
            self.name(symbol).parse().ok()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
