use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use cheney::{Config, Error, Interpreter, Mutator, Port};

#[derive(Clone, Default)]
struct Output(Rc<RefCell<Vec<u8>>>);

impl Output {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn interpreter(config: Config) -> Interpreter {
    Interpreter::with_output(config, Box::new(io::sink())).unwrap()
}

fn run(source: &str) -> Vec<String> {
    interpreter(Config::default()).run_str(source).unwrap()
}

const LOOP: &str = "
    (define loop (lambda (n)
      (cond ((equal? n 0) 0)
            (#t (loop (- n 1))))))";

const BUILD: &str = "
    (define build (lambda (n acc)
      (cond ((equal? n 0) acc)
            (#t (build (- n 1) (cons n acc))))))";

#[test]
fn arithmetic() {
    assert_eq!(run("(+ 1 2 3) (- 5) (- 10 3 2) (* 2 3 4)"),
        vec!["6", "-5", "5", "24"]);
}

#[test]
fn equality_is_structural() {
    assert_eq!(run("
        (equal? (cons 1 2) (cons 1 2))
        (equal? (cons 1 2) (cons 1 3))
        (equal? (list 1 (list 2 3)) (list 1 (list 2 3)))"),
        vec!["#t", "()", "#t"]);
}

#[test]
fn tail_calls_run_in_bounded_space() {
    let mut interp = interpreter(Config::default());
    interp.run_str(LOOP).unwrap();
    assert_eq!(interp.run_str("(loop 100000)").unwrap(), vec!["0"]);
    assert!(interp.stats().collections > 0);
}

#[test]
fn cond_without_match_is_fatal() {
    let err = interpreter(Config::default()).run_str("(cond (#f 1))")
        .unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn dotted_pair_round_trip() {
    assert_eq!(run("(quote (1 . 2))"), vec!["(1 . 2)"]);
    assert_eq!(run("(cons 1 2)"), vec!["(1 . 2)"]);
}

#[test]
fn live_data_larger_than_one_collection_cycle() {
    let mut interp = interpreter(Config::default().heap_size(512));
    interp.run_str(BUILD).unwrap();
    interp.run_str("(define xs (build 120 ()))").unwrap();
    let collections = interp.stats().collections;
    assert!(collections > 0);
    interp.run_str("(define ys (build 30 ()))").unwrap();
    assert!(interp.stats().collections > collections);
    assert_eq!(interp.run_str("(car xs) (car (cdr (cdr ys)))").unwrap(),
        vec!["1", "3"]);
}

#[test]
fn too_much_live_data_is_out_of_memory() {
    let mut interp = interpreter(Config::default().heap_size(256));
    interp.run_str(BUILD).unwrap();
    match interp.run_str("(define xs (build 1000 ()))") {
        Err(Error::OutOfMemory) => {},
        other => panic!("expected out of memory, got {:?}", other),
    }
    assert_eq!(interp.heap().roots().depth(), 1);
}

#[test]
fn closures_and_higher_order_functions() {
    let results = run("
        (define map (lambda (f xs)
          (cond ((null? xs) ())
                (#t (cons (f (car xs)) (map f (cdr xs)))))))
        (define scale (lambda (k) (lambda (x) (* k x))))
        (map (scale 3) (list 1 2 3))");
    assert_eq!(results, vec!["<lambda (f xs)>", "<lambda (k)>", "(3 6 9)"]);
}

#[test]
fn display_output() {
    let output = Output::default();
    let mut interp = Interpreter::with_output(Config::default(),
        Box::new(output.clone())).unwrap();
    interp.run_str("
        (define show (lambda (x) (display x) (newline)))
        (show (quote hello))
        (show (list 1 (cons 2 3)))").unwrap();
    assert_eq!(output.text(), "hello\n(1 (2 . 3))\n");
}

#[test]
fn loop_recovers_from_errors() {
    let output = Output::default();
    let mut interp = Interpreter::with_output(Config::default(),
        Box::new(output.clone())).unwrap();
    interp.run(Port::from_string("(+ 1 2) ) (car 1) (a . b c) (quote x)"))
        .unwrap();
    // String ports aren't interactive: nothing is echoed.
    assert_eq!(output.text(), "");
    assert_eq!(interp.run_str("(quote still-alive)").unwrap(),
        vec!["still-alive"]);
}

#[test]
fn fatal_errors_stop_the_loop() {
    let output = Output::default();
    let mut interp = Interpreter::with_output(Config::default(),
        Box::new(output.clone())).unwrap();
    let source = "(display 1) (cond (#f 1)) (display 2)";
    match interp.run(Port::from_string(source)) {
        Err(Error::NoMatchingClause) => {},
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(output.text(), "1");
}

#[test]
fn unterminated_input_ends_normally() {
    let mut interp = interpreter(Config::default());
    interp.run(Port::from_string("(define x 1) (car x")).unwrap();
}

#[test]
fn interactive_loop_echoes_results() {
    let output = Output::default();
    let mut interp = Interpreter::with_output(Config::default(),
        Box::new(output.clone())).unwrap();
    interp.run(Port::interactive("(+ 1 2) ) (quote x)")).unwrap();
    assert_eq!(output.text(), "3\n()\nx\n");
}

#[test]
fn invalid_utf8_input_is_a_syntax_error() {
    let output = Output::default();
    let mut interp = Interpreter::with_output(Config::default(),
        Box::new(output.clone())).unwrap();
    let input = &b"(display (+ 1 2))\n\xe9\n(display (+ 3 4))\n"[..];
    interp.run(Port::from_bytes(input)).unwrap();
    assert_eq!(output.text(), "37");
}
