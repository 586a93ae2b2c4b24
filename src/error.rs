use thiserror::Error;

use crate::channel::BitRes;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Header error: {0}")]
    Header(String),

    #[error("Invalid token `{0}`")]
    Grammar(String),

    #[error("Expected instrument {expected}, found {found}")]
    Order { expected: usize, found: i64 },

    #[error("Sample {value} does not fit in {bit_res} bits")]
    Overflow { value: i64, bit_res: BitRes },

    #[error("Bit resolutions differ ({0} and {1})")]
    Resolution(BitRes, BitRes),

    #[error("Lengths differ ({0} and {1} samples)")]
    Length(usize, usize),

    #[error("Sample rates differ ({0} Hz and {1} Hz)")]
    Rate(u32, u32),

    #[error("Channel counts differ ({0} and {1})")]
    ChannelCount(usize, usize),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Error on line {line}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Error>,
    },
}

/// Classification of an [`Error`], ignoring any line information.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Header,
    Grammar,
    Order,
    Overflow,
    Resolution,
    Length,
    Rate,
    ChannelCount,
    Config,
    Io,
}

impl Error {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub(crate) fn header(message: impl Into<String>) -> Self {
        Error::Header(message.into())
    }

    pub(crate) fn grammar(token: impl Into<String>) -> Self {
        Error::Grammar(token.into())
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Attach a 1-based line number. An error that already has one keeps it.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Error::AtLine { .. } => self,
            source => Error::AtLine {
                line,
                source: Box::new(source),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Format(_) => ErrorKind::Format,
            Error::Header(_) => ErrorKind::Header,
            Error::Grammar(_) => ErrorKind::Grammar,
            Error::Order { .. } => ErrorKind::Order,
            Error::Overflow { .. } => ErrorKind::Overflow,
            Error::Resolution(..) => ErrorKind::Resolution,
            Error::Length(..) => ErrorKind::Length,
            Error::Rate(..) => ErrorKind::Rate,
            Error::ChannelCount(..) => ErrorKind::ChannelCount,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::AtLine { source, .. } => source.kind(),
        }
    }

    /// The input line the error was found on, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}
