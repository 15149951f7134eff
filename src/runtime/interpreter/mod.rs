/// Module for the single-pass compiler: translates a token stream into a word's instruction
/// program, patching forward jumps for structured control flow as it goes.
pub mod compiler;

use std::io::Write;

use crate::lang::code::{disassemble, Op};
use crate::lang::numeral;
use crate::lang::tokenizing::{self, tokenize, Token};
use crate::runtime::data_structures::dictionary::Dictionary;
use crate::runtime::error::{ForthError, Result};
use compiler::Compiler;

const DATA_STACK_CAPACITY: usize = 256;
const LOOP_STACK_CAPACITY: usize = 128;
const MEMORY_SIZE: usize = 65536;

/// Names that can never be used as an identifier and are only meaningful while compiling a word.
const COMPILE_ONLY_WORDS: &[&str] = &[
    "IF", "THEN", "ELSE", "DO", "LOOP", "I", "RECURSE", "BEGIN", "UNTIL", "LOOP+",
    tokenizing::QUOTE_OPENER,
];

fn is_compile_only(name: &str) -> bool {
    COMPILE_ONLY_WORDS.contains(&name)
}

/// Read a file for `INCLUDE` or for the single-file form of the CLI. The returned `Result`
/// exists only to carry the failure up to whichever caller turns it into the printed
/// `failed to open <path>` diagnostic; it is never itself shown to the user.
fn read_script_file(path: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(ForthError::from)
}

/// The cellforth virtual machine: dictionary, data stack, loop stack, linear memory, and the
/// word-in-progress compiler state, all bundled into one instance so a script never shares state
/// with another.
pub struct Engine {
    dictionary: Dictionary,
    data_stack: Vec<i32>,
    loop_stack: Vec<i32>,
    memory: Box<[i32; MEMORY_SIZE]>,
    here: usize,
    quit: bool,
    compiler: Option<Compiler>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Build a fresh engine with the built-in vocabulary installed and locked.
    pub fn new() -> Engine {
        let mut engine = Engine {
            dictionary: Dictionary::new(),
            data_stack: Vec::with_capacity(DATA_STACK_CAPACITY),
            loop_stack: Vec::with_capacity(LOOP_STACK_CAPACITY),
            memory: Box::new([0; MEMORY_SIZE]),
            here: 0,
            quit: false,
            compiler: None,
        };

        engine.install_builtins();
        engine
    }

    fn install_builtins(&mut self) {
        let builtins: Vec<(&str, Vec<Op>)> = vec![
            ("+", vec![Op::Add]),
            ("-", vec![Op::Sub]),
            ("/", vec![Op::Div]),
            ("*", vec![Op::Mul]),
            ("MOD", vec![Op::Mod]),
            ("DUP", vec![Op::Dup]),
            ("OVER", vec![Op::Over]),
            ("ROT", vec![Op::Rot]),
            ("SWAP", vec![Op::Swap]),
            ("DROP", vec![Op::Drop]),
            ("DEPTH", vec![Op::Depth]),
            (".", vec![Op::Print]),
            ("CR", vec![Op::Cr]),
            ("<", vec![Op::Less]),
            (">", vec![Op::Greater]),
            ("1+", vec![Op::OnePlus]),
            ("1-", vec![Op::OneMinus]),
            ("<=", vec![Op::OneMinus, Op::Less]),
            (">=", vec![Op::OnePlus, Op::Greater]),
            ("=", vec![Op::Equal]),
            ("BYE", vec![Op::Bye]),
            ("@", vec![Op::Fetch]),
            ("!", vec![Op::Store]),
            ("HERE", vec![Op::Here]),
            ("ALLOT", vec![Op::Allot]),
            ("EMIT", vec![Op::Emit]),
        ];

        for (name, program) in builtins {
            self.dictionary.define_builtin(name, program);
        }

        self.dictionary.lock();
    }

    /// Whether `BYE` has been executed. Once set this is never cleared.
    pub fn has_quit(&self) -> bool {
        self.quit
    }

    /// The current contents of the data stack, bottom first. Exposed for tests; the REPL and
    /// file loader never need to look at it directly.
    pub fn stack(&self) -> &[i32] {
        &self.data_stack
    }

    /// Tokenize and run a chunk of source text, picking up wherever the word-in-progress (if
    /// any) left off. The REPL calls this once per line; the file loader calls it once with the
    /// whole file.
    pub fn run_source(&mut self, source: &str) {
        let tokens = tokenize(source);
        self.feed(&tokens);
    }

    fn feed(&mut self, tokens: &[Token]) {
        let mut i = 0;

        while i < tokens.len() {
            if self.quit {
                return;
            }

            let token = &tokens[i];

            if token.is_sentinel() {
                i += 1;
                continue;
            }

            if self.compiler.is_some() {
                i = self.feed_compiling(tokens, i);
            } else {
                i = self.feed_interpreting(tokens, i);
            }
        }
    }

    fn feed_compiling(&mut self, tokens: &[Token], i: usize) -> usize {
        let token = &tokens[i];

        if token.text == ";" {
            let compiler = self.compiler.take().expect("compiler is Some in this branch");
            self.install(compiler);
            return i + 1;
        }

        if token.text == tokenizing::QUOTE_OPENER {
            let body = tokens.get(i + 1).map(|t| t.text.clone()).unwrap_or_default();
            self.compiler.as_mut().expect("compiler is Some in this branch").emit_put_str(body);
            return i + 2;
        }

        let mut compiler = self.compiler.take().expect("compiler is Some in this branch");
        compiler.compile_token(&token.text, &self.dictionary);
        self.compiler = Some(compiler);
        i + 1
    }

    fn feed_interpreting(&mut self, tokens: &[Token], i: usize) -> usize {
        let token = &tokens[i];

        match token.text.as_str() {
            ":" => match tokens.get(i + 1) {
                Some(name_token) => {
                    self.compiler = Some(Compiler::new(name_token.text.clone()));
                    i + 2
                }
                None => {
                    println!("expect identifier after :");
                    i + 1
                }
            },
            "CREATE" => match tokens.get(i + 1) {
                Some(name_token) => {
                    self.create_word(&name_token.text);
                    i + 2
                }
                None => {
                    println!("expect identifier after CREATE");
                    i + 1
                }
            },
            "INCLUDE" => match tokens.get(i + 1) {
                Some(name_token) => {
                    self.include_file(&name_token.text);
                    i + 2
                }
                None => {
                    println!("expect filename after INCLUDE");
                    i + 1
                }
            },
            "PRINTDEBUG" => match tokens.get(i + 1) {
                Some(name_token) => {
                    self.print_debug(&name_token.text);
                    i + 2
                }
                None => {
                    println!("expect identifier after PRINTDEBUG");
                    i + 1
                }
            },
            text if text == tokenizing::QUOTE_OPENER => {
                let body = tokens.get(i + 1).map(|t| t.text.clone()).unwrap_or_default();
                print!("{}", body);
                let _ = std::io::stdout().flush();
                i + 2
            }
            text => {
                self.interpret_token(text);
                i + 1
            }
        }
    }

    fn interpret_token(&mut self, text: &str) {
        if let Some(n) = numeral::parse(text) {
            self.push(n);
            return;
        }

        if is_compile_only(text) {
            println!("{} is compile only !", text);
            return;
        }

        match self.dictionary.find(text) {
            Some(slot) => self.run_word(slot),
            None => println!("{} ?", text),
        }
    }

    fn install(&mut self, compiler: Compiler) {
        let name = compiler.name().to_string();

        if numeral::parse(&name).is_some() {
            println!("identifier cannot be an integer !");
            return;
        }

        if let Some(slot) = self.dictionary.find(&name) {
            if self.dictionary.is_locked(slot) {
                println!("cannot redefine {}", name);
                return;
            }
        }

        if is_compile_only(&name) {
            println!("cannot redefine {}", name);
            return;
        }

        if let Some(missing) = compiler.missing_closer() {
            println!("expect {} in {}", missing, name);
            return;
        }

        let (name, program, strings) = compiler.into_parts();
        self.dictionary.define_user(name, program, strings);
    }

    fn create_word(&mut self, name: &str) {
        if numeral::parse(name).is_some() {
            println!("identifier cannot be an integer !");
            return;
        }

        if let Some(slot) = self.dictionary.find(name) {
            if self.dictionary.is_locked(slot) {
                println!("cannot redefine {}", name);
                return;
            }
        }

        if is_compile_only(name) {
            println!("cannot redefine {}", name);
            return;
        }

        let program = vec![Op::Push(self.here as i32)];
        self.dictionary.define_user(name.to_string(), program, Vec::new());
    }

    fn include_file(&mut self, path: &str) {
        match read_script_file(path) {
            Ok(source) => self.run_source(&source),
            Err(_) => println!("failed to open {}", path),
        }
    }

    fn print_debug(&self, name: &str) {
        match self.dictionary.find(name) {
            Some(slot) => {
                let word = self.dictionary.word(slot);
                let text = disassemble(&word.name, &word.program, &word.strings, |callee| {
                    self.dictionary.word(callee).name.clone()
                });
                print!("{}", text);
            }
            None => println!("{} ?", name),
        }
    }

    fn push(&mut self, value: i32) {
        if self.data_stack.len() >= DATA_STACK_CAPACITY {
            println!("stack overflow !");
            return;
        }

        self.data_stack.push(value);
    }

    fn pop(&mut self) -> i32 {
        match self.data_stack.pop() {
            Some(value) => value,
            None => {
                println!("stack underflow !");
                0
            }
        }
    }

    /// Advance the current loop frame's index by `delta`; loop back to `target` while the index
    /// stays below the limit, otherwise drop the frame and fall through to `fallthrough_pc`.
    /// `LOOP` calls this with `delta == 1`; `LOOP+` calls it with the popped step, which is the
    /// same compare-and-branch the original source falls through from `LOOP+` into `LOOP` for.
    fn loop_step(&mut self, delta: i32, target: usize, fallthrough_pc: usize) -> usize {
        let len = self.loop_stack.len();

        if len < 2 {
            println!("stack underflow !");
            return fallthrough_pc;
        }

        self.loop_stack[len - 2] += delta;

        if self.loop_stack[len - 2] < self.loop_stack[len - 1] {
            target
        } else {
            self.loop_stack.truncate(len - 2);
            fallthrough_pc
        }
    }

    fn loop_index(&mut self) -> i32 {
        let len = self.loop_stack.len();

        if len < 2 {
            println!("stack underflow !");
            return 0;
        }

        self.loop_stack[len - 2]
    }

    /// Run the word at the given dictionary slot to completion (or until the quit flag is set).
    /// `Call` and `Recurse` invoke this recursively, using the host call stack as the language's
    /// return stack.
    fn run_word(&mut self, slot: usize) {
        if self.quit {
            return;
        }

        let mut pc = 0usize;

        loop {
            let len = self.dictionary.word(slot).program.len();

            if pc >= len {
                return;
            }

            let op = self.dictionary.word(slot).program[pc].clone();
            pc += 1;

            match op {
                Op::Push(n) => self.push(n),
                Op::Drop => {
                    self.pop();
                }
                Op::Add => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(a + b);
                }
                Op::Sub => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(a - b);
                }
                Op::Mul => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(a * b);
                }
                Op::Div => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(a / b);
                }
                Op::Mod => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(a % b);
                }
                Op::Dup => {
                    let a = self.pop();
                    self.push(a);
                    self.push(a);
                }
                Op::Over => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(a);
                    self.push(b);
                    self.push(a);
                }
                Op::Rot => {
                    let c = self.pop();
                    let b = self.pop();
                    let a = self.pop();
                    self.push(b);
                    self.push(c);
                    self.push(a);
                }
                Op::Swap => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(b);
                    self.push(a);
                }
                Op::Depth => {
                    let depth = self.data_stack.len() as i32;
                    self.push(depth);
                }
                Op::OnePlus => {
                    let a = self.pop();
                    self.push(a + 1);
                }
                Op::OneMinus => {
                    let a = self.pop();
                    self.push(a - 1);
                }
                Op::Less => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(if a < b { -1 } else { 0 });
                }
                Op::Greater => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(if a > b { -1 } else { 0 });
                }
                Op::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(if a == b { -1 } else { 0 });
                }
                Op::Print => {
                    let a = self.pop();
                    print!("{} ", a);
                }
                Op::Cr => println!(),
                Op::Emit => {
                    let a = self.pop();
                    print!("{}", (a as u8) as char);
                }
                Op::PutStr(idx) => {
                    let text = self.dictionary.word(slot).strings[idx].clone();
                    print!("{}", text);
                }
                Op::Jump(target) => pc = target,
                Op::Jz(target) => {
                    let a = self.pop();
                    if a == 0 {
                        pc = target;
                    }
                }
                Op::Jnz(target) => {
                    let a = self.pop();
                    if a != 0 {
                        pc = target;
                    }
                }
                Op::Call(target) => self.run_word(target),
                Op::Recurse => self.run_word(slot),
                Op::Do => {
                    let index = self.pop();
                    let limit = self.pop();
                    self.loop_stack.push(index);
                    self.loop_stack.push(limit);
                }
                Op::Loop(target) => pc = self.loop_step(1, target, pc),
                Op::LoopPlus(target) => {
                    let step = self.pop();
                    pc = self.loop_step(step, target, pc);
                }
                Op::I => {
                    let index = self.loop_index();
                    self.push(index);
                }
                Op::Bye => {
                    self.quit = true;
                }
                Op::Here => {
                    let here = self.here as i32;
                    self.push(here);
                }
                Op::Allot => {
                    let n = self.pop();
                    self.here = (self.here as i32).wrapping_add(n) as usize;
                }
                Op::Fetch => {
                    let addr = self.pop() as usize;
                    self.push(self.memory[addr]);
                }
                Op::Store => {
                    let addr = self.pop() as usize;
                    let value = self.pop();
                    self.memory[addr] = value;
                }
            }

            if self.quit {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn run(source: &str) -> Vec<i32> {
        let mut engine = Engine::new();
        engine.run_source(source);
        engine.stack().to_vec()
    }

    #[test_case("2 2 +", &[4]; "simple add")]
    #[test_case("5 2 -", &[3]; "subtract keeps operand order")]
    #[test_case("3 4 *", &[12]; "multiply")]
    #[test_case("12 3 /", &[4]; "divide")]
    #[test_case("13 5 mod", &[3]; "mod")]
    #[test_case("1 2", &[1, 2]; "literals push in order")]
    #[test_case("1 drop", &[]; "drop")]
    #[test_case("1 2 swap", &[2, 1]; "swap")]
    #[test_case("1 2 over", &[1, 2, 1]; "over")]
    #[test_case("1 2 3 rot", &[2, 3, 1]; "rot")]
    #[test_case("1 2 3 depth", &[1, 2, 3, 3]; "depth")]
    #[test_case("3 4 <", &[-1]; "less true")]
    #[test_case("4 3 <", &[0]; "less false")]
    #[test_case("4 3 >", &[-1]; "greater true")]
    #[test_case("5 5 =", &[-1]; "equal true")]
    #[test_case("5 6 =", &[0]; "equal false")]
    #[test_case("41 1+", &[42]; "one plus")]
    #[test_case("43 1-", &[42]; "one minus")]
    fn arithmetic_and_stack_words(source: &str, expected: &[i32]) {
        assert_eq!(run(source), expected);
    }

    #[test]
    fn underflow_is_reported_and_pop_yields_zero() {
        // popping from an empty stack must not panic; it reports and yields 0.
        assert_eq!(run("drop 5"), vec![5]);
    }

    #[test]
    fn colon_definition_is_callable() {
        assert_eq!(run(": sq dup * ; 5 sq"), vec![25]);
    }

    #[test]
    fn redefining_a_word_updates_existing_calls() {
        assert_eq!(run(": f 1 ; : g f ; : f 2 ; g"), vec![2]);
    }

    #[test]
    fn recursive_word_computes_factorial() {
        assert_eq!(
            run(": fact dup 1 > if dup 1- recurse * then ; 5 fact"),
            vec![120]
        );
    }

    #[test]
    fn do_loop_counts_up_to_limit() {
        assert_eq!(run(": count 11 1 do i loop ; count"), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn create_allot_store_fetch_round_trip() {
        assert_eq!(
            run("create x 1 allot : store x ! ; : load x @ ; 42 store load"),
            vec![42]
        );
    }

    #[test]
    fn bye_stops_remaining_tokens() {
        assert_eq!(run("1 bye 2 3"), vec![1]);
    }

    #[test]
    fn division_by_zero_panics_rather_than_being_caught() {
        let result = std::panic::catch_unwind(|| run("1 0 /"));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_token_is_reported_and_does_not_change_the_stack() {
        assert_eq!(run("1 bogus 2"), vec![1, 2]);
    }

    #[test]
    fn builtins_cannot_be_redefined() {
        assert_eq!(run(": + 99 ; 1 2 +"), vec![3]);
    }
}
