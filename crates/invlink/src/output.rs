use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use invlink_link::TelemetryReading;
use invlink_wire::Fragment;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    kind: &'a str,
    frame: String,
    length: usize,
}

pub fn print_encoded_frame(kind: &str, frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                kind,
                frame: hex(frame),
                length: frame.len(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "BYTES", "FRAME"])
                .add_row(vec![kind.to_string(), frame.len().to_string(), hex(frame)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("kind={} bytes={} frame={}", kind, frame.len(), hex(frame));
        }
    }
}

#[derive(Serialize)]
struct FragmentOutput {
    kind: u8,
    dst: String,
    src: String,
    index: u8,
    last: bool,
    payload: String,
}

pub fn print_fragment(fragment: &Fragment, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FragmentOutput {
                kind: fragment.kind,
                dst: fragment.dst.to_string(),
                src: fragment.src.to_string(),
                index: fragment.index(),
                last: fragment.is_last(),
                payload: hex(&fragment.payload),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "DST", "SRC", "INDEX", "LAST", "PAYLOAD"])
                .add_row(vec![
                    format!("0x{:02x}", fragment.kind),
                    fragment.dst.to_string(),
                    fragment.src.to_string(),
                    fragment.index().to_string(),
                    fragment.is_last().to_string(),
                    hex(&fragment.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "kind=0x{:02x} dst={} src={} index={} last={} payload={}",
                fragment.kind,
                fragment.dst,
                fragment.src,
                fragment.index(),
                fragment.is_last(),
                hex(&fragment.payload)
            );
        }
    }
}

pub fn print_reading(reading: &TelemetryReading, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(reading).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["AC POWER (W)", "BYTES", "RAW"])
                .add_row(vec![
                    reading
                        .ac_power_watts()
                        .map(|w| format!("{w:.1}"))
                        .unwrap_or_else(|| "-".to_string()),
                    reading.raw.len().to_string(),
                    hex(&reading.raw),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "power={} len={} raw={}",
                reading
                    .ac_power_watts()
                    .map(|w| format!("{w:.1}W"))
                    .unwrap_or_else(|| "unknown".to_string()),
                reading.raw.len(),
                hex(&reading.raw)
            );
        }
    }
}
