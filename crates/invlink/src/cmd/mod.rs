use clap::{Args, Subcommand, ValueEnum};

use invlink_wire::DeviceCommand;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod run;
pub mod version;

/// Example controller serial, matching the documentation walkthroughs.
const DEFAULT_LOCAL_SERIAL: u64 = 99_978_563_001;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a link: periodic time sync plus continuous telemetry receive.
    Run(RunArgs),
    /// Encode a command frame and print it as hex.
    Encode(EncodeArgs),
    /// Decode and validate a hex-encoded fragment or assembled message.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Control opcodes addressable from the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CommandName {
    On,
    Off,
    RestoreLastAction,
    Lock,
    Unlock,
    ActivePowerLimit,
    ReactivePowerLimit,
    PowerFactor,
    LockAndAlarm,
    SelfInspect,
}

impl CommandName {
    pub fn device_command(self) -> DeviceCommand {
        match self {
            CommandName::On => DeviceCommand::On,
            CommandName::Off => DeviceCommand::Off,
            CommandName::RestoreLastAction => DeviceCommand::RestoreLastAction,
            CommandName::Lock => DeviceCommand::Lock,
            CommandName::Unlock => DeviceCommand::Unlock,
            CommandName::ActivePowerLimit => DeviceCommand::ActivePowerLimit,
            CommandName::ReactivePowerLimit => DeviceCommand::ReactivePowerLimit,
            CommandName::PowerFactor => DeviceCommand::PowerFactor,
            CommandName::LockAndAlarm => DeviceCommand::LockAndAlarm,
            CommandName::SelfInspect => DeviceCommand::SelfInspect,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Serial of the remote inverter.
    #[arg(long)]
    pub peer_serial: u64,
    /// Serial of the local controller.
    #[arg(long, default_value_t = DEFAULT_LOCAL_SERIAL)]
    pub local_serial: u64,
    /// Run against a simulated inverter instead of radio hardware.
    #[arg(long)]
    pub simulate: bool,
    /// Exit after this many telemetry readings (default: run until killed).
    #[arg(long)]
    pub count: Option<usize>,
    /// Power limit pushed once at startup, in whole units.
    #[arg(long, default_value_t = 25)]
    pub limit: u16,
    /// Interpret the startup limit as a percentage of rated power.
    #[arg(long)]
    pub relative: bool,
    /// Persist the startup limit across inverter restarts.
    #[arg(long)]
    pub persist: bool,
    /// Interval between time-sync sends (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "5s")]
    pub sync_interval: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Serial of the remote inverter.
    #[arg(long)]
    pub peer_serial: u64,
    /// Serial of the local controller.
    #[arg(long, default_value_t = DEFAULT_LOCAL_SERIAL)]
    pub local_serial: u64,
    /// Encode an active power limit, in whole units.
    #[arg(long, conflicts_with_all = ["command", "time_sync"])]
    pub power_limit: Option<u16>,
    /// Interpret the limit as a percentage of rated power.
    #[arg(long, requires = "power_limit")]
    pub relative: bool,
    /// Persist the limit across inverter restarts.
    #[arg(long, requires = "power_limit")]
    pub persist: bool,
    /// Encode a device control command.
    #[arg(long, value_enum, conflicts_with_all = ["power_limit", "time_sync"])]
    pub command: Option<CommandName>,
    /// Data word accompanying --command.
    #[arg(long, requires = "command")]
    pub data: Option<u16>,
    /// Modifier word accompanying --data.
    #[arg(long, requires = "data")]
    pub modifier: Option<u16>,
    /// Encode a time synchronization command.
    #[arg(long, conflicts_with_all = ["power_limit", "command"])]
    pub time_sync: bool,
    /// Unix timestamp for --time-sync (defaults to the current time).
    #[arg(long, requires = "time_sync")]
    pub at: Option<u32>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded bytes, as captured off the air.
    pub hex: String,
    /// Treat the input as a reassembled message instead of one fragment.
    #[arg(long)]
    pub assembled: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
