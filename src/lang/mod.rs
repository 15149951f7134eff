/// Module for managing the source text buffer and tracking position within it.
pub mod source_buffer;

/// Module for turning the source text into a list of tokens for the compiler to consume.
pub mod tokenizing;

/// Module for the instruction set of the cellforth virtual machine, and the disassembler that
/// prints a word's instruction program symbolically.
pub mod code;

/// Module for recognizing a token as an integer literal, matching the original's `forth_isnum`.
pub mod numeral;
