//! Diagnostics and error types for the script compiler.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Classification of a compile diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnexpectedToken,
    UnbalancedBraces,
    ObjectNameExpected,
    NumberExpected,
    StringExpected,
    FewerParametersExpected,
    InvalidParameters,
    ReferenceToNonexistentObject,
    UndefinedVariable,
    UnknownObject,
    ImportFailed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::UnbalancedBraces => "unbalanced braces",
            ErrorCode::ObjectNameExpected => "object name expected",
            ErrorCode::NumberExpected => "number expected",
            ErrorCode::StringExpected => "string expected",
            ErrorCode::FewerParametersExpected => "fewer parameters expected",
            ErrorCode::InvalidParameters => "invalid parameters",
            ErrorCode::ReferenceToNonexistentObject => "reference to a non-existent object",
            ErrorCode::UndefinedVariable => "undefined variable",
            ErrorCode::UnknownObject => "unknown object",
            ErrorCode::ImportFailed => "import failed",
        }
    }
}

/// A located problem found while compiling a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn unexpected(file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnexpectedToken, file, line, message)
    }

    pub fn invalid(file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameters, file, line, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.file,
            self.line,
            self.code.as_str(),
            self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

/// A failure that stops one file from compiling.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0} does not exist")]
    MissingInput(PathBuf),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Syntax(Diagnostic),
    #[error("invalid compiled file {path}: {reason}")]
    Link { path: PathBuf, reason: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CompileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_has_location() {
        let d = Diagnostic::invalid("a.material", 12, "depth_bias takes 1 or 2 arguments");
        assert_eq!(
            d.to_string(),
            "a.material:12: invalid parameters: depth_bias takes 1 or 2 arguments"
        );
    }

    #[test]
    fn missing_input_message() {
        let e = CompileError::MissingInput(PathBuf::from("nope.material"));
        assert_eq!(e.to_string(), "nope.material does not exist");
    }
}
