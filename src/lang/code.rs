use std::fmt::{self, Display, Formatter};

/// The instructions of the cellforth virtual machine.
///
/// The original this language is ported from packs a one-byte opcode plus an optional 4-byte
/// big-endian operand into a flat byte buffer. Representing a program as `Vec<Op>` instead buys
/// the same thing (a compact, append-only instruction stream the compiler builds up and the
/// interpreter walks with a program counter) without needing an encode/decode step or a shared
/// endianness convention between the compiler and the disassembler — there is only one
/// representation to keep consistent.
///
/// Operands that are positions within the program (`Jump`, `Jz`, `Jnz`, `Loop`, `LoopPlus`) are
/// instruction indices, not byte offsets; `Call` operands are dictionary slot indices; `PutStr`
/// operands are indices into the executing word's string table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// Push a literal cell onto the data stack.
    Push(i32),

    /// Pop and discard the top of the data stack.
    Drop,

    /// Pop two, push their sum.
    Add,

    /// Pop two (`a b`), push `a - b`.
    Sub,

    /// Pop two, push their product.
    Mul,

    /// Pop two (`a b`), push `a / b` using host integer division.
    Div,

    /// Pop two (`a b`), push `a % b` using host integer remainder.
    Mod,

    /// Duplicate the top of the data stack.
    Dup,

    /// Push a copy of the second-from-top value.
    Over,

    /// Rotate the top three values: `a b c -- b c a`.
    Rot,

    /// Swap the top two values.
    Swap,

    /// Push the current depth of the data stack.
    Depth,

    /// Add one to the top of the data stack.
    OnePlus,

    /// Subtract one from the top of the data stack.
    OneMinus,

    /// Pop two (`a b`), push `-1` if `a < b`, else `0`.
    Less,

    /// Pop two (`a b`), push `-1` if `a > b`, else `0`.
    Greater,

    /// Pop two, push `-1` if equal, else `0`.
    Equal,

    /// Pop and print as a decimal integer followed by a single space.
    Print,

    /// Print a newline.
    Cr,

    /// Pop and print the low byte as a character.
    Emit,

    /// Print the executing word's string literal at this index.
    PutStr(usize),

    /// Unconditionally jump to the given instruction index.
    Jump(usize),

    /// Pop a cell; jump to the given index if it is zero.
    Jz(usize),

    /// Pop a cell; jump to the given index if it is non-zero.
    Jnz(usize),

    /// Call the dictionary word at the given slot index.
    Call(usize),

    /// Call the word currently executing.
    Recurse,

    /// Open a new `DO` loop frame: pops `limit` then `index`, pushes `index` then `limit` onto
    /// the loop stack.
    Do,

    /// Advance the current loop frame's index by one; if still less than the limit, jump to the
    /// given loop-top index, otherwise drop the frame and fall through.
    Loop(usize),

    /// Like `Loop`, but first adds `(popped step - 1)` to the loop frame's index.
    LoopPlus(usize),

    /// Push the index of the innermost active loop frame.
    I,

    /// Set the quit flag, ending execution of the current word and all its callers.
    Bye,

    /// Push the current `here` pointer.
    Here,

    /// Pop `n`, advance `here` by `n` cells.
    Allot,

    /// Pop an address, push the cell stored there.
    Fetch,

    /// Pop an address then a value, store the value at that address.
    Store,
}

/// A word's compiled instruction program.
pub type Program = Vec<Op>;

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Op::Push(n) => write!(f, "push {}", n),
            Op::Drop => write!(f, "drop"),
            Op::Add => write!(f, "+"),
            Op::Sub => write!(f, "-"),
            Op::Mul => write!(f, "*"),
            Op::Div => write!(f, "/"),
            Op::Mod => write!(f, "mod"),
            Op::Dup => write!(f, "dup"),
            Op::Over => write!(f, "over"),
            Op::Rot => write!(f, "rot"),
            Op::Swap => write!(f, "swap"),
            Op::Depth => write!(f, "depth"),
            Op::OnePlus => write!(f, "1+"),
            Op::OneMinus => write!(f, "1-"),
            Op::Less => write!(f, "<"),
            Op::Greater => write!(f, ">"),
            Op::Equal => write!(f, "="),
            Op::Print => write!(f, "."),
            Op::Cr => write!(f, "cr"),
            Op::Emit => write!(f, "emit"),
            Op::PutStr(idx) => write!(f, "putstr {}", idx),
            Op::Jump(target) => write!(f, "jump {}", target),
            Op::Jz(target) => write!(f, "jz {}", target),
            Op::Jnz(target) => write!(f, "jnz {}", target),
            Op::Call(slot) => write!(f, "call {}", slot),
            Op::Recurse => write!(f, "recurse"),
            Op::Do => write!(f, "do"),
            Op::Loop(target) => write!(f, "loop {}", target),
            Op::LoopPlus(target) => write!(f, "loop+ {}", target),
            Op::I => write!(f, "i"),
            Op::Bye => write!(f, "bye"),
            Op::Here => write!(f, "here"),
            Op::Allot => write!(f, "allot"),
            Op::Fetch => write!(f, "@"),
            Op::Store => write!(f, "!"),
        }
    }
}

/// Print a word's program symbolically, one instruction per line, prefixed with its index.
/// `Call` operands are resolved to the callee's identifier via `call_name`, and `PutStr` operands
/// are resolved to the literal text via `strings`. Used by `PRINTDEBUG`.
pub fn disassemble(name: &str, program: &Program, strings: &[String], call_name: impl Fn(usize) -> String) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    writeln!(&mut out, "{}:", name).expect("writing to String never fails");

    for (index, op) in program.iter().enumerate() {
        match op {
            Op::Call(slot) => {
                writeln!(&mut out, "{}\tcall {}", index, call_name(*slot))
            }
            Op::PutStr(idx) => {
                let text = strings.get(*idx).map(String::as_str).unwrap_or("");
                writeln!(&mut out, "{}\tputstr \"{}\"", index, text)
            }
            _ => writeln!(&mut out, "{}\t{}", index, op),
        }
        .expect("writing to String never fails");
    }

    out
}
