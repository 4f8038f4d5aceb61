use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    NotFound,
    InvalidPeriodKey,
    Io,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ArcError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ArcError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_period_key(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPeriodKey, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::Usage => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::InvalidPeriodKey => 4,
            ErrorKind::Io => 5,
        }
    }
}
