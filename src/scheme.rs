use std::fmt;

use crate::builtin::Native;
use crate::heap::Heap;
use crate::intern::{Interner, Symbol};

/// Index of a cell in the active semispace. Only meaningful until the next
/// collection unless it is kept in a root slot or in another live cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Obj(u32);

impl Obj {
    pub(crate) fn new(index: usize) -> Obj {
        Obj(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A heap reference. `None` is the empty list, which doubles as false.
pub type Value = Option<Obj>;

#[derive(Clone, Copy, Debug)]
pub enum Object {
    Cons(Value, Value),
    /// Not traced: the name lives in the interner.
    Atom(Symbol),
    /// Not traced.
    Native(Native),
    /// A lambda together with the environment it was created in. Calls bind
    /// their arguments in a new frame on top of `env`, not the caller's.
    Closure {
        params: Value,
        body: Value,
        env: Value,
    },
    /// Left behind in the old semispace by the collector.
    Forwarded(Obj),
}

impl Object {
    /// Calls `f` on every field that refers into the heap.
    pub fn trace<F: FnMut(&mut Value)>(&mut self, mut f: F) {
        match self {
            Object::Cons(first, second) => {
                f(first);
                f(second);
            },
            Object::Closure {params, body, env} => {
                f(params);
                f(body);
                f(env);
            },
            Object::Atom(_) | Object::Native(_) | Object::Forwarded(_) => {},
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Object::Cons(..) => "cons",
            Object::Atom(_) => "atom",
            Object::Native(_) => "builtin",
            Object::Closure {..} => "lambda",
            Object::Forwarded(_) => "forwarded",
        }
    }
}

/// Renders a value in list notation.
pub struct Printer<'a> {
    heap: &'a Heap,
    symbols: &'a Interner,
    value: Value,
}

impl<'a> Printer<'a> {
    pub fn new(heap: &'a Heap, symbols: &'a Interner, value: Value)
        -> Printer<'a> {

        Printer { heap, symbols, value }
    }

    fn write_value(&self, f: &mut fmt::Formatter, value: Value) -> fmt::Result
    {
        let obj = match value {
            Some(obj) => obj,
            None => return write!(f, "()"),
        };
        match self.heap.object(obj) {
            Object::Atom(symbol) => write!(f, "{}", self.symbols.name(symbol)),
            Object::Native(native) => write!(f, "<builtin {}>", native.name),
            Object::Closure {params, ..} => {
                write!(f, "<lambda ")?;
                self.write_value(f, params)?;
                write!(f, ">")
            },
            Object::Cons(first, second) => {
                write!(f, "(")?;
                self.write_value(f, first)?;
                let mut tail = second;
                while let Some(next) = tail {
                    if let Object::Cons(first, second) = self.heap.object(next) {
                        write!(f, " ")?;
                        self.write_value(f, first)?;
                        tail = second;
                    } else {
                        write!(f, " . ")?;
                        self.write_value(f, tail)?;
                        break;
                    }
                }
                write!(f, ")")
            },
            Object::Forwarded(_) => write!(f, "<forwarded>"),
        }
    }
}

impl<'a> fmt::Display for Printer<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_value(f, self.value)
    }
}
