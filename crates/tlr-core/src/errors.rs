/// Core error type for the link remover.
///
/// Adapter crates should map their specific errors into this type so the
/// dispatcher can treat every transport failure the same way (log and drop).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("scheduler is shut down")]
    SchedulerClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
