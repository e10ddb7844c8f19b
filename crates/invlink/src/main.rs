mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "invlink", version, about = "Solar micro-inverter radio link")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "invlink",
            "encode",
            "--peer-serial",
            "116180215597",
            "--power-limit",
            "25",
        ])
        .expect("encode args should parse");

        assert!(matches!(cli.command, Command::Encode(_)));
    }

    #[test]
    fn rejects_conflicting_encode_payloads() {
        let err = Cli::try_parse_from([
            "invlink",
            "encode",
            "--peer-serial",
            "116180215597",
            "--power-limit",
            "25",
            "--time-sync",
        ])
        .expect_err("conflicting payload args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_run_subcommand() {
        let cli = Cli::try_parse_from([
            "invlink",
            "run",
            "--peer-serial",
            "116180215597",
            "--simulate",
            "--count",
            "3",
        ])
        .expect("run args should parse");
        assert!(matches!(cli.command, Command::Run(_)));
    }

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from(["invlink", "decode", "158021559778563001026b"])
            .expect("decode args should parse");
        assert!(matches!(cli.command, Command::Decode(_)));
    }
}
