use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use num::{CheckedAdd, CheckedMul, CheckedSub};

use crate::error::{Error, Result};
use crate::heap::Mutator;
use crate::runtime::Interpreter;
use crate::scheme::{Object, Printer, Value};

/// A native function. Receives its evaluated arguments as a proper list,
/// which the caller keeps rooted for the duration of the call.
pub type Builtin = fn(&mut Interpreter, Value) -> Result<Value>;

#[derive(Clone, Copy)]
pub struct Native {
    pub name: &'static str,
    pub func: Builtin,
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

lazy_static! {
    static ref BUILTINS: BTreeMap<&'static str, Builtin> = btreemap! {
        "car" => car as Builtin,
        "cdr" => cdr,
        "cons" => cons,
        "list" => list,
        "equal?" => equal,
        "pair?" => is_pair,
        "null?" => is_null,
        "+" => add,
        "-" => subtract,
        "*" => multiply,
        "display" => display,
        "newline" => newline,
    };
}

/// Binds `#t`, `#f` and every native function in the global environment.
pub fn install(interp: &mut Interpreter) -> Result<()> {
    let truth = interp.truth();
    let env = interp.global_env();
    interp.define(env, truth, truth)?;
    let falsity = interp.atom("#f")?;
    let env = interp.global_env();
    interp.define(env, falsity, None)?;

    for (&name, &func) in BUILTINS.iter() {
        interp.with_roots(&[None], |interp, frame| {
            let native = Object::Native(Native { name, func });
            let native = interp.heap.alloc(native)?;
            interp.heap.set_root(frame, 0, Some(native));
            let key = interp.atom(name)?;
            let value = interp.heap.root(frame, 0);
            let env = interp.global_env();
            interp.define(env, key, value)
        })?;
    }
    log::debug!("installed {} builtins", BUILTINS.len());
    Ok(())
}

fn exactly(interp: &Interpreter, name: &'static str, args: Value, n: usize)
    -> Result<Vec<Value>> {

    let items = interp.heap.list_items(args);
    if items.len() == n {
        Ok(items)
    } else {
        Err(Error::arity(name, n, items.len()))
    }
}

fn at_least(interp: &Interpreter, name: &'static str, args: Value, n: usize)
    -> Result<Vec<Value>> {

    let items = interp.heap.list_items(args);
    if items.len() >= n {
        Ok(items)
    } else {
        Err(Error::arity(name, format!("at least {}", n), items.len()))
    }
}

// Arithmetic reads the decimal text of its atom arguments.
fn integers(interp: &Interpreter, name: &'static str, args: &[Value])
    -> Result<Vec<i64>> {

    args.iter()
        .map(|&arg| interp.heap.symbol(arg)
            .and_then(|symbol| interp.symbols.integer(symbol))
            .ok_or_else(|| Error::wrong_type(name, "integer arguments")))
        .collect()
}

fn fold<F>(name: &'static str, init: i64, numbers: &[i64], op: F)
    -> Result<i64>
    where F: Fn(&i64, &i64) -> Option<i64> {

    numbers.iter().try_fold(init, |acc, n| {
        op(&acc, n).ok_or(Error::Overflow(name))
    })
}

fn car(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = exactly(interp, "car", args, 1)?;
    interp.heap.pair(args[0])
        .map(|(first, _)| first)
        .ok_or_else(|| Error::wrong_type("car", "a pair"))
}

fn cdr(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = exactly(interp, "cdr", args, 1)?;
    interp.heap.pair(args[0])
        .map(|(_, second)| second)
        .ok_or_else(|| Error::wrong_type("cdr", "a pair"))
}

fn cons(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = exactly(interp, "cons", args, 2)?;
    interp.heap.cons(args[0], args[1])
}

fn list(_interp: &mut Interpreter, args: Value) -> Result<Value> {
    Ok(args)
}

fn equal(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = at_least(interp, "equal?", args, 1)?;
    let all = args[1..].iter().all(|&arg| interp.heap.equal(args[0], arg));
    Ok(interp.boolean(all))
}

fn is_pair(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = exactly(interp, "pair?", args, 1)?;
    Ok(interp.boolean(interp.heap.pair(args[0]).is_some()))
}

fn is_null(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = exactly(interp, "null?", args, 1)?;
    Ok(interp.boolean(args[0].is_none()))
}

fn add(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = interp.heap.list_items(args);
    let numbers = integers(interp, "+", &args)?;
    let sum = fold("+", 0, &numbers, CheckedAdd::checked_add)?;
    interp.number(sum)
}

/// Negation with one argument, left-to-right subtraction with more.
fn subtract(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = at_least(interp, "-", args, 1)?;
    let numbers = integers(interp, "-", &args)?;
    let difference = match numbers.split_first() {
        Some((&n, [])) => fold("-", 0, &[n], CheckedSub::checked_sub)?,
        Some((&first, rest)) =>
            fold("-", first, rest, CheckedSub::checked_sub)?,
        None => return Err(Error::arity("-", "at least 1", 0)),
    };
    interp.number(difference)
}

fn multiply(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = interp.heap.list_items(args);
    let numbers = integers(interp, "*", &args)?;
    let product = fold("*", 1, &numbers, CheckedMul::checked_mul)?;
    interp.number(product)
}

fn display(interp: &mut Interpreter, args: Value) -> Result<Value> {
    let args = exactly(interp, "display", args, 1)?;
    write!(interp.out, "{}", Printer::new(&interp.heap, &interp.symbols,
        args[0]))?;
    Ok(None)
}

fn newline(interp: &mut Interpreter, args: Value) -> Result<Value> {
    exactly(interp, "newline", args, 0)?;
    writeln!(interp.out)?;
    Ok(None)
}
