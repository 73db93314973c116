//! Crate-wide error type.
//!
//! The core defines a closed [ErrorKind] taxonomy. Every fallible call
//! site constructs an [Error] through the [err_at] macro, which captures
//! the source location so diagnostics carry file/line context without
//! every call site doing it by hand.

use std::{error, fmt, result};

/// Closed set of error categories the core can raise.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    AlreadyPresent,
    MalformedFormat,
    ChecksumMismatch,
    Ghost,
    InconsistentGraph,
    Locked,
    NotLocked,
    Transport,
    Cancelled,
    /// Non-taxonomy escape hatch for `std::io::Error` that doesn't cleanly
    /// map to `Transport` (e.g. local-only path errors surfaced before a
    /// transport boundary is crossed).
    IoError,
    /// Failure converting to/from an on-disk numeric/byte representation.
    FailConvert,
    /// Failure encoding/decoding a Cbor-framed structure.
    FailCbor,
    /// Invariant violated that does not fit any of the above.
    Fatal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Crate-wide error, carrying the [ErrorKind], the call site split into
/// `file`/`line`, a human-readable message, and, when `err_at!` wrapped
/// another [Error], the one it replaced — so a chain of `err_at!`
/// re-wraps (e.g. a knit format error wrapping a transport error
/// wrapping an IO error) is never silently flattened to its outermost
/// link.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub file: &'static str,
    pub line: u32,
    pub message: String,
    pub source: Option<Box<Error>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {}:{}: {}", self.kind, self.file, self.line, self.message)?;
        if let Some(source) = &self.source {
            write!(f, ", caused by: {}", source)?;
        }
        Ok(())
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn error::Error + 'static))
    }
}

impl Error {
    pub fn new(kind: ErrorKind, file: &'static str, line: u32, message: String) -> Error {
        Error { kind, file, line, message, source: None }
    }

    /// Like [Error::new], but chains `source` as the cause.
    pub fn wrap(kind: ErrorKind, file: &'static str, line: u32, message: String, source: Error) -> Error {
        Error { kind, file, line, message, source: Some(Box::new(source)) }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Construct an [Error], optionally wrapping a `Result`-returning expression.
///
/// Two forms:
/// ```ignore
/// err_at!(IoError, fs::File::open(path))?;         // wraps a Result, maps Err
/// err_at!(NotFound, msg: "missing {:?}", file)?;   // builds an Err directly
/// ```
///
/// The first form only records the wrapped error's `Display` text; call
/// sites that need to keep the original [Error] itself (not just its
/// message) reachable via [error::Error::source] should build one with
/// [Error::wrap] instead.
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let message = format!($($arg),+);
        Result::Err($crate::error::Error::new($crate::error::ErrorKind::$v, file!(), line!(), message))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => Result::Err($crate::error::Error::new(
                $crate::error::ErrorKind::$v,
                file!(),
                line!(),
                format!("{}", err),
            )),
        }
    }};
}
