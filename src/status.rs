//! Outcome of a mutating manager operation
//!
//! Storage-layer failures are returned as `Err`. Everything the caller can act
//! on (bad input, missing book, duplicate) is a `JobStatus`.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The operation changed the database
    Success,
    /// Nothing to do: the entity already exists or was already absent
    Cancelled,
    /// The request was rejected (validation, missing book)
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Cancelled => "cancelled",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub struct JobStatus<T> {
    pub status: Status,
    pub value: Option<T>,
    pub message: String,
    pub error: Option<Error>,
}

impl<T> JobStatus<T> {
    pub fn success(value: T, message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            value: Some(value),
            message: message.into(),
            error: None,
        }
    }

    pub fn cancelled(value: Option<T>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Cancelled,
            value,
            message: message.into(),
            error: None,
        }
    }

    pub fn error(error: Error) -> Self {
        Self {
            status: Status::Error,
            value: None,
            message: error.to_string(),
            error: Some(error),
        }
    }

    /// Attach the error that explains a cancellation
    pub fn because(mut self, error: Error) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == Status::Cancelled
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

impl<T> fmt::Display for JobStatus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_constructors() {
        let ok = JobStatus::success(1, "created");
        assert!(ok.is_success());
        assert_eq!(ok.to_string(), "[success] created");

        let dup: JobStatus<i32> = JobStatus::cancelled(Some(1), "already there")
            .because(Error::AlreadyExists("x".into()));
        assert!(dup.is_cancelled());
        assert!(matches!(dup.error, Some(Error::AlreadyExists(_))));
        assert_eq!(dup.into_value(), Some(1));

        let err: JobStatus<i32> = JobStatus::error(Error::NotFound("Book 'x'".into()));
        assert!(err.is_error());
        assert!(err.value.is_none());
        assert!(err.message.contains("Book 'x'"));
    }
}
