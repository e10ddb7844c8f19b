use std::fmt;

use invlink_link::LinkError;
use invlink_radio::RadioError;
use invlink_wire::WireError;

// Exit code constants, sysexits-flavored.
pub const SUCCESS: i32 = 0;
pub const RADIO_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn wire_error(context: &str, err: WireError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn radio_error(context: &str, err: RadioError) -> CliError {
    match err {
        RadioError::Io(source) => CliError::new(INTERNAL, format!("{context}: {source}")),
        other => CliError::new(RADIO_ERROR, format!("{context}: {other}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Wire(err) => wire_error(context, err),
        LinkError::Radio(err) => radio_error(context, err),
    }
}
