//! cellforth is an interpreter for a small stack-oriented, concatenative language in the
//! Forth tradition. Source text is tokenized, user-defined words are compiled to a compact
//! instruction program, and a threaded interpreter executes those programs against a data
//! stack, a loop-control stack, and a flat cell-addressable memory region.
//!
//! This crate is split the way the binary uses it: `lang` turns text into instruction
//! programs, `runtime` is everything needed to execute them.

/// Module for turning source text into a list of tokens, and tokens into instruction programs.
pub mod lang;

/// Module for the runtime: the dictionary, the interpreter's data structures, and the
/// interpreter itself.
pub mod runtime;
