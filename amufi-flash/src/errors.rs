use amufi_hal::HalError;
use thiserror::Error;

pub type FlashResult<T> = std::result::Result<T, FlashError>;

#[derive(Error, Debug)]
pub enum FlashError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Operation aborted by user")]
    ConfirmationDeclined,

    #[error(transparent)]
    Hal(#[from] HalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
