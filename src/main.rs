use std::path::PathBuf;
use std::process;

use clap::Parser;

use cheney::{Error, Interpreter, Port};

#[derive(Parser, Debug)]
#[command(name = "cheney")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lisp interpreter with a copying garbage collector",
    long_about = None)]
struct Args {
    /// Program to run. Reads standard input and echoes results if absent.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), Error> {
    let port = match args.file {
        Some(path) => Port::open_input_file(path)?,
        None => Port::stdin(),
    };
    let mut interp = Interpreter::new()?;
    interp.run(port)
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
