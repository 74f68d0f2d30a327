use std::collections::HashMap;
use std::io::{self, Write};

use either::{Either, Left, Right};

use crate::builtin;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::heap::{Frame, GcStats, Heap, Mutator};
use crate::intern::{Interner, Symbol};
use crate::port::Port;
use crate::read::Reader;
use crate::scheme::{Object, Printer, Value};

/// Outcome of one evaluation step: either an expression and environment to
/// continue with in tail position, or a finished value.
type Step = Either<(Value, Value), Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Form {
    Quote,
    Cond,
    Begin,
    Or,
    Define,
    Lambda,
}

// Slots of the permanent scope registered at construction.
const GLOBAL_ENV: usize = 0;
const TRUE: usize = 1;

// Slots of the scope held by `apply`.
const FUNC: usize = 0;
const ARGS: usize = 1;
const OPERANDS: usize = 2;
const ENV: usize = 3;
const CALL_ENV: usize = 4;
const PARAMS: usize = 5;

/// A complete interpreter: heap, symbol table, global environment and the
/// sink `display` writes to. Independent instances don't share anything.
pub struct Interpreter {
    pub(crate) heap: Heap,
    pub(crate) symbols: Interner,
    forms: HashMap<Symbol, Form>,
    globals: Frame,
    pub(crate) out: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Result<Interpreter> {
        Interpreter::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Interpreter> {
        Interpreter::with_output(config, Box::new(io::stdout()))
    }

    pub fn with_output(config: Config, out: Box<dyn Write>)
        -> Result<Interpreter> {

        let mut heap = Heap::new(&config);
        let mut symbols = Interner::new();
        let forms = hashmap! {
            symbols.intern("quote") => Form::Quote,
            symbols.intern("cond") => Form::Cond,
            symbols.intern("begin") => Form::Begin,
            symbols.intern("or") => Form::Or,
            symbols.intern("define") => Form::Define,
            symbols.intern("lambda") => Form::Lambda,
        };
        let globals = heap.push_scope(&[None, None])?;
        let mut interp = Interpreter { heap, symbols, forms, globals, out };

        let env = interp.new_env(None)?;
        interp.heap.set_root(globals, GLOBAL_ENV, env);
        let truth = interp.atom("#t")?;
        interp.heap.set_root(globals, TRUE, truth);
        builtin::install(&mut interp)?;
        log::debug!("interpreter ready: {} of {} cells in use",
            interp.heap.len(), interp.heap.capacity());
        Ok(interp)
    }

    pub fn global_env(&self) -> Value {
        self.heap.root(self.globals, GLOBAL_ENV)
    }

    /// The canonical true atom, `#t`.
    pub fn truth(&self) -> Value {
        self.heap.root(self.globals, TRUE)
    }

    pub fn boolean(&self, condition: bool) -> Value {
        if condition {
            self.truth()
        } else {
            None
        }
    }

    pub fn stats(&self) -> &GcStats {
        self.heap.stats()
    }

    /// Allocates an atom named `text`.
    pub fn atom(&mut self, text: &str) -> Result<Value> {
        let symbol = self.symbols.intern(text);
        self.heap.atom(symbol)
    }

    pub fn number(&mut self, n: i64) -> Result<Value> {
        self.atom(&n.to_string())
    }

    pub fn show(&self, value: Value) -> Printer<'_> {
        Printer::new(&self.heap, &self.symbols, value)
    }

    /// An empty frame in front of `parent`.
    pub fn new_env(&mut self, parent: Value) -> Result<Value> {
        self.heap.cons(None, parent)
    }

    /// Binds `name` to `value` in the innermost frame of `env`, shadowing
    /// any earlier binding. Returns `value`.
    pub fn define(&mut self, env: Value, name: Value, value: Value)
        -> Result<Value> {

        self.with_roots(&[env], |interp, frame| {
            let binding = interp.heap.cons(name, value)?;
            let bindings = interp.heap.car(interp.heap.root(frame, 0));
            let bindings = interp.heap.cons(binding, bindings)?;
            let env = interp.heap.root(frame, 0);
            interp.heap.set_car(env, bindings)?;
            Ok(interp.heap.cdr(interp.heap.car(bindings)))
        })
    }

    /// Searches frames from the innermost outwards. `None` if unbound.
    pub fn lookup(&self, env: Value, name: Symbol) -> Option<Value> {
        let mut frames = env;
        while let Some((bindings, parent)) = self.heap.pair(frames) {
            let mut bindings = bindings;
            while let Some((binding, rest)) = self.heap.pair(bindings) {
                if let Some((key, value)) = self.heap.pair(binding) {
                    if self.heap.symbol(key) == Some(name) {
                        return Some(value);
                    }
                }
                bindings = rest;
            }
            frames = parent;
        }
        None
    }

    pub fn eval_global(&mut self, expr: Value) -> Result<Value> {
        let env = self.global_env();
        self.eval(expr, env)
    }

    /// Evaluates `expr` in `env`. Calls in tail position replace the
    /// current expression instead of recursing, so they run in constant
    /// native stack.
    pub fn eval(&mut self, expr: Value, env: Value) -> Result<Value> {
        self.with_roots(&[expr, env], |interp, frame| loop {
            let expr = interp.heap.root(frame, 0);
            let env = interp.heap.root(frame, 1);
            match interp.step(expr, env)? {
                Left((expr, env)) => {
                    interp.heap.set_root(frame, 0, expr);
                    interp.heap.set_root(frame, 1, env);
                },
                Right(value) => return Ok(value),
            }
        })
    }

    fn step(&mut self, expr: Value, env: Value) -> Result<Step> {
        let obj = match expr {
            Some(obj) => obj,
            None => return Ok(Right(None)),
        };
        match self.heap.object(obj) {
            Object::Atom(symbol) => {
                if self.symbols.is_number(symbol) {
                    return Ok(Right(expr));
                }
                match self.lookup(env, symbol) {
                    Some(value) => Ok(Right(value)),
                    None => Err(Error::Unbound(
                        self.symbols.name(symbol).to_string())),
                }
            },
            Object::Cons(head, operands) => {
                let form = self.heap.symbol(head)
                    .and_then(|symbol| self.forms.get(&symbol).copied());
                match form {
                    Some(form) => self.eval_form(form, operands, env),
                    None => self.apply(head, operands, env),
                }
            },
            Object::Native(_) | Object::Closure {..} => Ok(Right(expr)),
            Object::Forwarded(_) =>
                unreachable!("forwarded cell reachable outside collection"),
        }
    }

    fn eval_form(&mut self, form: Form, operands: Value, env: Value)
        -> Result<Step> {

        match form {
            Form::Quote => Ok(Right(self.heap.car(operands))),
            Form::Cond => self.eval_cond(operands, env),
            Form::Begin => self.eval_body(operands, env),
            Form::Or => self.eval_or(operands, env),
            Form::Define => self.eval_define(operands, env).map(Right),
            Form::Lambda => self.eval_lambda(operands, env).map(Right),
        }
    }

    /// Evaluates all but the last expression of `body` for effect and
    /// hands the last one back as a tail call.
    fn eval_body(&mut self, body: Value, env: Value) -> Result<Step> {
        self.with_roots(&[body, env], |interp, frame| loop {
            let body = interp.heap.root(frame, 0);
            let env = interp.heap.root(frame, 1);
            let (expr, rest) = match interp.heap.pair(body) {
                Some(pair) => pair,
                None => return Ok(Right(None)),
            };
            if rest.is_none() {
                return Ok(Left((expr, env)));
            }
            interp.eval(expr, env)?;
            let rest = interp.heap.cdr(interp.heap.root(frame, 0));
            interp.heap.set_root(frame, 0, rest);
        })
    }

    fn eval_cond(&mut self, clauses: Value, env: Value) -> Result<Step> {
        self.with_roots(&[clauses, env], |interp, frame| loop {
            let clause = match interp.heap.pair(interp.heap.root(frame, 0)) {
                Some((clause, _)) => clause,
                None => return Err(Error::NoMatchingClause),
            };
            let test = match interp.heap.pair(clause) {
                Some((test, _)) => test,
                None => return Err(Error::BadForm("cond")),
            };
            let env = interp.heap.root(frame, 1);
            let value = interp.eval(test, env)?;
            if value.is_some() {
                let clause = interp.heap.car(interp.heap.root(frame, 0));
                let body = interp.heap.cdr(clause);
                if body.is_none() {
                    return Ok(Right(value));
                }
                let env = interp.heap.root(frame, 1);
                return interp.eval_body(body, env);
            }
            let rest = interp.heap.cdr(interp.heap.root(frame, 0));
            interp.heap.set_root(frame, 0, rest);
        })
    }

    fn eval_or(&mut self, operands: Value, env: Value) -> Result<Step> {
        self.with_roots(&[operands, env], |interp, frame| loop {
            let operands = interp.heap.root(frame, 0);
            let env = interp.heap.root(frame, 1);
            let (expr, rest) = match interp.heap.pair(operands) {
                Some(pair) => pair,
                None => return Ok(Right(None)),
            };
            if rest.is_none() {
                return Ok(Left((expr, env)));
            }
            let value = interp.eval(expr, env)?;
            if value.is_some() {
                return Ok(Right(value));
            }
            let rest = interp.heap.cdr(interp.heap.root(frame, 0));
            interp.heap.set_root(frame, 0, rest);
        })
    }

    fn eval_define(&mut self, operands: Value, env: Value) -> Result<Value> {
        if self.heap.symbol(self.heap.car(operands)).is_none() {
            return Err(Error::BadForm("define"));
        }
        self.with_roots(&[operands, env], |interp, frame| {
            let expr = interp.heap.car(interp.heap.cdr(operands));
            let value = interp.eval(expr, env)?;
            let name = interp.heap.car(interp.heap.root(frame, 0));
            let env = interp.heap.root(frame, 1);
            interp.define(env, name, value)
        })
    }

    fn eval_lambda(&mut self, operands: Value, env: Value) -> Result<Value> {
        let (params, body) = self.heap.pair(operands)
            .ok_or(Error::BadForm("lambda"))?;
        self.heap.alloc(Object::Closure { params, body, env }).map(Some)
    }

    fn closure(&self, value: Value) -> Option<(Value, Value, Value)> {
        match self.heap.object(value?) {
            Object::Closure {params, body, env} => Some((params, body, env)),
            _ => None,
        }
    }

    /// Evaluates the operator and then the operands left to right, and
    /// calls the result. A closure body comes back as a tail call.
    fn apply(&mut self, operator: Value, operands: Value, env: Value)
        -> Result<Step> {

        let slots = [None, None, operands, env, None, None];
        self.with_roots(&slots, |interp, frame| {
            let func = interp.eval(operator, env)?;
            interp.heap.set_root(frame, FUNC, func);
            match func.map(|obj| interp.heap.object(obj)) {
                Some(Object::Native(_)) | Some(Object::Closure {..}) => {},
                _ => return Err(Error::NotCallable(
                    interp.show(func).to_string())),
            }

            while let Some((expr, _)) =
                interp.heap.pair(interp.heap.root(frame, OPERANDS)) {

                let env = interp.heap.root(frame, ENV);
                let arg = interp.eval(expr, env)?;
                let args = interp.heap.root(frame, ARGS);
                let args = interp.heap.cons(arg, args)?;
                interp.heap.set_root(frame, ARGS, args);
                let rest = interp.heap.cdr(interp.heap.root(frame, OPERANDS));
                interp.heap.set_root(frame, OPERANDS, rest);
            }
            let args = interp.heap.reverse_in_place(
                interp.heap.root(frame, ARGS), None);
            interp.heap.set_root(frame, ARGS, args);

            let func = interp.heap.root(frame, FUNC);
            if let Some(Object::Native(native)) =
                func.map(|obj| interp.heap.object(obj)) {

                return (native.func)(interp, args).map(Right);
            }
            interp.apply_closure(frame)
        })
    }

    // Binds the evaluated arguments in a fresh frame on top of the
    // closure's captured environment.
    fn apply_closure(&mut self, frame: Frame) -> Result<Step> {
        let func = self.heap.root(frame, FUNC);
        let (params, _, captured) = match self.closure(func) {
            Some(closure) => closure,
            None => return Err(Error::NotCallable(self.show(func).to_string())),
        };
        let expected = self.heap.list_len(params);
        let got = self.heap.list_len(self.heap.root(frame, ARGS));
        if expected != got {
            let name = self.show(func).to_string();
            return Err(Error::arity(&name, expected, got));
        }

        let call_env = self.new_env(captured)?;
        self.heap.set_root(frame, CALL_ENV, call_env);
        let (params, _, _) = self.closure(self.heap.root(frame, FUNC))
            .ok_or(Error::wrong_type("apply", "a procedure"))?;
        self.heap.set_root(frame, PARAMS, params);
        loop {
            let params = self.heap.pair(self.heap.root(frame, PARAMS));
            let args = self.heap.pair(self.heap.root(frame, ARGS));
            let (name, arg) = match (params, args) {
                (Some((name, params)), Some((arg, args))) => {
                    self.heap.set_root(frame, PARAMS, params);
                    self.heap.set_root(frame, ARGS, args);
                    (name, arg)
                },
                _ => break,
            };
            let call_env = self.heap.root(frame, CALL_ENV);
            self.define(call_env, name, arg)?;
        }

        let (_, body, _) = self.closure(self.heap.root(frame, FUNC))
            .ok_or(Error::wrong_type("apply", "a procedure"))?;
        let call_env = self.heap.root(frame, CALL_ENV);
        self.eval_body(body, call_env)
    }

    /// Reads and evaluates every expression in `source`, returning the
    /// printed results. Stops at the first error.
    pub fn run_str(&mut self, source: &str) -> Result<Vec<String>> {
        let mut reader = Reader::new(Port::from_string(source));
        let mut results = Vec::new();
        while let Some(expr) = reader.read(self)? {
            let value = self.eval_global(expr)?;
            results.push(self.show(value).to_string());
        }
        Ok(results)
    }

    /// The read-eval-print loop. Results are echoed only for interactive
    /// ports. Recoverable errors are reported on stderr and evaluate to
    /// `()`; fatal ones end the loop.
    pub fn run(&mut self, port: Port) -> Result<()> {
        let mut reader = Reader::new(port);
        let echo = reader.is_interactive();
        loop {
            let result = match reader.read(self) {
                Ok(Some(expr)) => self.eval_global(expr),
                Ok(None) => break,
                Err(Error::UnexpectedEof) => {
                    eprintln!("Error: {}", Error::UnexpectedEof);
                    break;
                },
                Err(err) => Err(err),
            };
            let value = match result {
                Ok(value) => value,
                Err(err @ Error::Io(_)) => return Err(err),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    eprintln!("Error: {}", err);
                    None
                },
            };
            if echo {
                writeln!(self.out, "{}",
                    Printer::new(&self.heap, &self.symbols, value))?;
                self.out.flush()?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

impl Mutator for Interpreter {
    fn heap(&mut self) -> &mut Heap {
        &mut self.heap
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use crate::config::Config;
    use crate::error::Error;
    use super::Interpreter;

    /// An output sink that can still be read after being handed to an
    /// interpreter.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Interpreter {
        pub(crate) fn for_test() -> Interpreter {
            Interpreter::for_test_with_heap(Config::default().heap_size)
        }

        pub(crate) fn for_test_with_heap(heap_size: usize) -> Interpreter {
            let config = Config::default().heap_size(heap_size);
            Interpreter::with_output(config, Box::new(io::sink())).unwrap()
        }
    }

    fn eval_str(source: &str) -> String {
        Interpreter::for_test().run_str(source).unwrap().pop().unwrap()
    }

    fn eval_err(source: &str) -> Error {
        match Interpreter::for_test().run_str(source) {
            Ok(results) => panic!("expected an error, got {:?}", results),
            Err(err) => err,
        }
    }

    #[test]
    fn test_numbers_self_evaluate() {
        assert_eq!(eval_str("42"), "42");
        assert_eq!(eval_str("-7"), "-7");
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(eval_str("()"), "()");
    }

    #[test]
    fn test_quote() {
        assert_eq!(eval_str("(quote (a b . c))"), "(a b . c)");
        assert_eq!(eval_str("(quote x)"), "x");
    }

    #[test]
    fn test_booleans() {
        assert_eq!(eval_str("#t"), "#t");
        assert_eq!(eval_str("#f"), "()");
    }

    #[test]
    fn test_cond() {
        assert_eq!(eval_str("(cond (#f 1) (#t 2 3))"), "3");
        assert_eq!(eval_str("(cond ((quote x)))"), "x");
        assert_eq!(eval_str("(cond (#f 1) (#t))"), "#t");
    }

    #[test]
    fn test_cond_without_match() {
        match eval_err("(cond (#f 1))") {
            Error::NoMatchingClause => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_begin() {
        assert_eq!(eval_str("(begin)"), "()");
        assert_eq!(eval_str("(begin (define x 1) (define y 2) x)"), "1");
    }

    #[test]
    fn test_or() {
        assert_eq!(eval_str("(or)"), "()");
        assert_eq!(eval_str("(or #f (quote a) (car ()))"), "a");
        assert_eq!(eval_str("(or #f #f)"), "()");
    }

    #[test]
    fn test_define_returns_value() {
        let mut interp = Interpreter::for_test();
        assert_eq!(interp.run_str("(define x 5) x").unwrap(), vec!["5", "5"]);
    }

    #[test]
    fn test_redefinition_shadows() {
        assert_eq!(eval_str("(define x 1) (define x 2) x"), "2");
    }

    #[test]
    fn test_lambda() {
        assert_eq!(eval_str("((lambda (x y) (cons y x)) 1 2)"), "(2 . 1)");
        assert_eq!(eval_str("(lambda (x) x)"), "<lambda (x)>");
        assert_eq!(eval_str("car"), "<builtin car>");
    }

    #[test]
    fn test_lexical_scope() {
        assert_eq!(eval_str("
            (define make-adder (lambda (n) (lambda (x) (+ x n))))
            (define add2 (make-adder 2))
            (define n 100)
            (add2 40)"), "42");
    }

    #[test]
    fn test_closure_body_sequence() {
        assert_eq!(eval_str("
            (define f (lambda (x) (define y (* x x)) (+ y 1)))
            (f 3)"), "10");
    }

    #[test]
    fn test_parameters_are_local() {
        assert_eq!(eval_str("(define x 1) ((lambda (x) x) 2) x"), "1");
    }

    #[test]
    fn test_unbound() {
        match eval_err("(car nothing)") {
            Error::Unbound(name) => assert_eq!(name, "nothing"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_callable() {
        match eval_err("(1 2)") {
            Error::NotCallable(text) => assert_eq!(text, "1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_closure_arity() {
        match eval_err("((lambda (x y) x) 1)") {
            Error::Arity {expected, got, ..} => {
                assert_eq!(expected, "2");
                assert_eq!(got, 1);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_forms() {
        match eval_err("(define (f x) x)") {
            Error::BadForm("define") => {},
            other => panic!("unexpected {:?}", other),
        }
        match eval_err("(lambda)") {
            Error::BadForm("lambda") => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tail_calls_in_constant_roots() {
        let mut interp = Interpreter::for_test();
        interp.run_str("
            (define count (lambda (n)
              (cond ((equal? n 0) (quote done))
                    (#t (begin (count (- n 1)))))))").unwrap();
        assert_eq!(interp.run_str("(count 5000)").unwrap(), vec!["done"]);
        assert_eq!(interp.heap.roots().depth(), 1);
    }

    #[test]
    fn test_collection_during_evaluation() {
        let mut interp = Interpreter::for_test_with_heap(256);
        interp.run_str("
            (define build (lambda (n acc)
              (cond ((equal? n 0) acc)
                    (#t (build (- n 1) (cons n acc))))))
            (define xs (build 50 ()))").unwrap();
        assert!(interp.stats().collections > 0);
        assert_eq!(interp.run_str("(car xs) (car (cdr xs))").unwrap(),
            vec!["1", "2"]);
    }

    #[test]
    fn test_deep_recursion_overflows_roots() {
        let mut interp = Interpreter::for_test();
        interp.run_str("
            (define sum (lambda (n)
              (cond ((equal? n 0) 0) (#t (+ n (sum (- n 1)))))))").unwrap();
        assert_eq!(interp.run_str("(sum 10)").unwrap(), vec!["55"]);
        match interp.run_str("(sum 100000)") {
            Err(Error::RootStackOverflow(_)) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_display_writes_to_output() {
        let buffer = SharedBuffer::default();
        let mut interp = Interpreter::with_output(Config::default(),
            Box::new(buffer.clone())).unwrap();
        interp.run_str("(display (quote (a . b))) (newline) (display 7)")
            .unwrap();
        assert_eq!(buffer.contents(), "(a . b)\n7");
    }

    #[test]
    fn test_instances_are_independent() {
        let mut first = Interpreter::for_test();
        let mut second = Interpreter::for_test();
        first.run_str("(define x 1)").unwrap();
        match second.run_str("x") {
            Err(Error::Unbound(_)) => {},
            other => panic!("unexpected {:?}", other),
        }
    }
}
