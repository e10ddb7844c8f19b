/// Errors surfaced by radio channel implementations.
#[derive(Debug, thiserror::Error)]
pub enum RadioError {
    /// The driver reported a hardware-level fault.
    #[error("radio hardware fault: {0}")]
    Hardware(String),

    /// A read was attempted with no fragment pending.
    #[error("no fragment available to read")]
    Empty,

    /// An I/O error from the underlying bus.
    #[error("radio I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RadioError>;
