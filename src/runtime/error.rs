use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Almost every error a cellforth script can raise — an unknown token, a stack underflow, an
/// unterminated `IF`, trying to redefine a built-in — is reported as a single line printed to
/// stdout, after which the interpreter keeps going. `ForthError` exists only for the handful of
/// conditions that genuinely abort the run: right now, failing to read a file named by `INCLUDE`
/// or given on the command line.
pub type Result<T> = std::result::Result<T, ForthError>;

/// An error that aborts loading or running a script outright.
#[derive(Clone, Debug)]
pub struct ForthError {
    message: String,
}

impl ForthError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> ForthError {
        ForthError {
            message: message.into(),
        }
    }
}

impl Error for ForthError {}

impl Display for ForthError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<std::io::Error> for ForthError {
    fn from(error: std::io::Error) -> ForthError {
        ForthError::new(format!("I/O error: {}", error))
    }
}
