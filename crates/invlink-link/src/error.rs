/// Errors that can occur while driving the link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Frame encoding failed.
    #[error("wire error: {0}")]
    Wire(#[from] invlink_wire::WireError),

    /// The radio driver reported a fault.
    #[error("radio error: {0}")]
    Radio(#[from] invlink_radio::RadioError),
}

pub type Result<T> = std::result::Result<T, LinkError>;
