use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistrationError>;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("registration for this exam is closed")]
    RegistrationClosed,
    #[error("this exam is already registered and paid for")]
    AlreadyPaid,
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("payment signature verification failed")]
    SignatureInvalid,
    #[error("no registration matches payment order {0}")]
    ReconciliationNotFound(String),
    #[error("notification dispatch failed: {0}")]
    NotificationDispatchFailed(String),
    #[error("could not allocate a unique registration number after {0} attempts")]
    NumberGenerationExhausted(usize),
    #[error("access denied")]
    AccessDenied,
    #[error("hall ticket is only available for approved registrations")]
    NotApproved,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
