//! Fixed-capacity object store.
//!
//! The heap is two equal semispaces of [`Object`] cells. Allocation bumps a
//! cursor in the active one; when it is full the collector (see `collect`)
//! copies everything reachable from the root stack into the other one and
//! the two swap roles.
//!
//! Cell indices move during a collection. Any [`Value`] that must survive a
//! call that might allocate has to sit in a root slot (see `roots`) and be
//! read back from it afterwards.

mod collect;
pub mod roots;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::intern::Symbol;
use crate::scheme::{Obj, Object, Value};

pub use self::collect::GcStats;
pub use self::roots::{Frame, Mutator, RootStack};

#[derive(Debug)]
pub struct Heap {
    /// Active semispace; its length is the allocation cursor.
    space: Vec<Object>,
    /// Empty between collections.
    reserve: Vec<Object>,
    capacity: usize,
    roots: RootStack,
    stats: GcStats,
}

impl Heap {
    pub fn new(config: &Config) -> Heap {
        Heap {
            space: Vec::with_capacity(config.heap_size),
            reserve: Vec::with_capacity(config.heap_size),
            capacity: config.heap_size,
            roots: RootStack::new(config.max_roots, config.max_frames),
            stats: GcStats::default(),
        }
    }

    /// Cells per semispace.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cells in use in the active semispace.
    pub fn len(&self) -> usize {
        self.space.len()
    }

    pub fn is_empty(&self) -> bool {
        self.space.is_empty()
    }

    fn is_full(&self) -> bool {
        self.space.len() >= self.capacity
    }

    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    pub fn roots(&self) -> &RootStack {
        &self.roots
    }

    /// Stores `object` in a fresh cell, collecting first if the active
    /// semispace is full. The object's own fields are kept alive across that
    /// collection and rewritten to their new locations.
    pub fn alloc(&mut self, mut object: Object) -> Result<Obj> {
        if self.is_full() {
            let mut fields = Vec::new();
            object.trace(|field| fields.push(*field));
            let frame = self.roots.push_scope(&fields)?;
            self.collect();
            let roots = &self.roots;
            let mut i = 0;
            object.trace(|field| {
                *field = roots.get(frame, i);
                i += 1;
            });
            self.roots.pop_scope(frame);
            if self.is_full() {
                log::error!("heap exhausted: {} live cells", self.space.len());
                return Err(Error::OutOfMemory);
            }
        }
        let obj = Obj::new(self.space.len());
        self.space.push(object);
        self.stats.allocated += 1;
        Ok(obj)
    }

    pub fn cons(&mut self, first: Value, second: Value) -> Result<Value> {
        self.alloc(Object::Cons(first, second)).map(Some)
    }

    pub fn atom(&mut self, symbol: Symbol) -> Result<Value> {
        self.alloc(Object::Atom(symbol)).map(Some)
    }

    pub fn object(&self, obj: Obj) -> Object {
        self.space[obj.index()]
    }

    pub fn pair(&self, value: Value) -> Option<(Value, Value)> {
        match self.object(value?) {
            Object::Cons(first, second) => Some((first, second)),
            _ => None,
        }
    }

    /// Head of a pair; absent for anything else.
    pub fn car(&self, value: Value) -> Value {
        self.pair(value).and_then(|(first, _)| first)
    }

    /// Tail of a pair; absent for anything else.
    pub fn cdr(&self, value: Value) -> Value {
        self.pair(value).and_then(|(_, second)| second)
    }

    pub fn set_car(&mut self, value: Value, first: Value) -> Result<()> {
        match value.map(|obj| (obj, self.object(obj))) {
            Some((obj, Object::Cons(_, second))) => {
                self.space[obj.index()] = Object::Cons(first, second);
                Ok(())
            },
            _ => Err(Error::wrong_type("set-car", "a pair")),
        }
    }

    pub fn set_cdr(&mut self, value: Value, second: Value) -> Result<()> {
        match value.map(|obj| (obj, self.object(obj))) {
            Some((obj, Object::Cons(first, _))) => {
                self.space[obj.index()] = Object::Cons(first, second);
                Ok(())
            },
            _ => Err(Error::wrong_type("set-cdr", "a pair")),
        }
    }

    pub fn symbol(&self, value: Value) -> Option<Symbol> {
        match self.object(value?) {
            Object::Atom(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Elements of a proper list, stopping at the first non-pair tail.
    ///
    /// The returned values are plain indices: don't allocate while holding
    /// on to them.
    pub fn list_items(&self, list: Value) -> Vec<Value> {
        let mut items = Vec::new();
        let mut head = list;
        while let Some((first, rest)) = self.pair(head) {
            items.push(first);
            head = rest;
        }
        items
    }

    pub fn list_len(&self, list: Value) -> usize {
        let mut len = 0;
        let mut head = list;
        while let Some((_, rest)) = self.pair(head) {
            len += 1;
            head = rest;
        }
        len
    }

    /// Reverses the pairs of `list` in place and appends `tail`. Doesn't
    /// allocate.
    pub fn reverse_in_place(&mut self, list: Value, tail: Value) -> Value {
        let mut reversed = tail;
        let mut rest = list;
        while let Some(obj) = rest {
            if let Object::Cons(first, next) = self.object(obj) {
                self.space[obj.index()] = Object::Cons(first, reversed);
                reversed = rest;
                rest = next;
            } else {
                break;
            }
        }
        reversed
    }

    pub fn push_scope(&mut self, values: &[Value]) -> Result<Frame> {
        self.roots.push_scope(values)
    }

    pub fn pop_scope(&mut self, frame: Frame) {
        self.roots.pop_scope(frame)
    }

    pub fn root(&self, frame: Frame, index: usize) -> Value {
        self.roots.get(frame, index)
    }

    pub fn set_root(&mut self, frame: Frame, index: usize, value: Value) {
        self.roots.set(frame, index, value)
    }
}
