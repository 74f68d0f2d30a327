//! A small Lisp with a fixed-size semispace heap and Cheney's copying
//! collector.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate maplit;

pub mod builtin;
pub mod config;
mod equality;
pub mod error;
pub mod heap;
pub mod intern;
pub mod port;
pub mod read;
pub mod runtime;
pub mod scheme;

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::heap::{Frame, GcStats, Heap, Mutator};
pub use crate::intern::{Interner, Symbol};
pub use crate::port::Port;
pub use crate::runtime::Interpreter;
pub use crate::scheme::{Obj, Object, Printer, Value};
