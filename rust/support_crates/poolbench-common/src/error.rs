use std::any::Any;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn task_panicked(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::TaskPanicked {
                message: message.into(),
            }
            .into(),
        )
    }

    /// Builds a `TaskPanicked` error from a payload captured by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Error {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Error::task_panicked(message)
    }

    pub fn worker_lost() -> Error {
        Error(ErrorKind::WorkerLost.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Returns `true` if this error originates from a panicking task.
    pub fn is_task_panic(&self) -> bool {
        matches!(self.kind(), ErrorKind::TaskPanicked { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("task panicked: {message}")]
    TaskPanicked { message: String },

    #[error("worker exited before delivering a result")]
    WorkerLost,

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
