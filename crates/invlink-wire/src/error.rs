/// Errors that can occur while encoding or parsing radio frames.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The encoded frame would exceed the radio's payload ceiling.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The fragment is too short to contain a header and checksum.
    #[error("fragment too short ({size} bytes, min {min})")]
    Truncated { size: usize, min: usize },

    /// The fragment's trailing CRC8 does not match its contents.
    #[error("fragment checksum mismatch (computed 0x{computed:02x}, found 0x{found:02x})")]
    FragmentCrc { computed: u8, found: u8 },
}

pub type Result<T> = std::result::Result<T, WireError>;
