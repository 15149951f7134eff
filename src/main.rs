use std::env;
use std::io::{self, Read, Write};

use cellforth::runtime::interpreter::Engine;

/// Print the banner shown once at REPL startup.
fn print_banner() {
    println!("cellforth");
    println!("type BYE to exit");
}

/// Read one line from `reader`, terminated by a newline, EOF, or an embedded NUL byte (matching
/// the original's `getc` loop, which treats `s[len-1] == 0` the same as end of input). The
/// terminator itself is not included in the returned text. Returns the accumulated text plus
/// whether the line ended on EOF/NUL rather than a newline.
fn read_repl_line(reader: &mut impl Read) -> (String, bool) {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) => return (String::from_utf8_lossy(&bytes).into_owned(), true),
            Ok(_) => match byte[0] {
                b'\n' => return (String::from_utf8_lossy(&bytes).into_owned(), false),
                0 => return (String::from_utf8_lossy(&bytes).into_owned(), true),
                b => bytes.push(b),
            },
            Err(_) => return (String::from_utf8_lossy(&bytes).into_owned(), true),
        }
    }
}

/// Read lines from stdin and run each one through the engine, printing the `ok` prompt after
/// every line that did not quit. Ends at EOF, an embedded NUL byte, or once the engine's quit
/// flag is set.
fn run_repl(engine: &mut Engine) {
    print_banner();

    let stdin = io::stdin();
    let mut lock = stdin.lock();

    loop {
        let (line, ended_input) = read_repl_line(&mut lock);

        engine.run_source(&line);
        let _ = io::stdout().flush();

        if engine.has_quit() || ended_input {
            break;
        }

        println!("    ok");
    }
}

/// Load and run a single script file, reporting (not aborting on) a failure to read it, matching
/// the same `failed to open <path>` diagnostic `INCLUDE` uses.
fn run_file(path: &str) {
    match std::fs::read_to_string(path) {
        Ok(source) => {
            let mut engine = Engine::new();
            engine.run_source(&source);
            let _ = io::stdout().flush();
        }
        Err(_) => println!("failed to open {}", path),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => run_repl(&mut Engine::new()),
        2 => run_file(&args[1]),
        _ => println!("usage: {} <file>", args[0]),
    }
}
