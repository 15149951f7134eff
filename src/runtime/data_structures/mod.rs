/// Module for the two-tier word dictionary: built-in words the interpreter installs at startup,
/// and user words defined by `:` ... `;` at compile time.
pub mod dictionary;
