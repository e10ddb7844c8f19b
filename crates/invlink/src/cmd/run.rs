use std::time::Duration;

use invlink_link::{InverterLink, LinkConfig};
use invlink_radio::sim::Responder;
use invlink_radio::SimRadio;
use invlink_wire::{
    fragment_crc8, message_crc16, parse_fragment, NodeAddr, PowerLimit, TX_REQ_INFO,
};

use crate::cmd::RunArgs;
use crate::exit::{link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_reading, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.simulate {
        return Err(CliError::new(
            USAGE,
            "no radio hardware driver is linked into this build; use --simulate",
        ));
    }

    let mut config = LinkConfig::new(args.local_serial, args.peer_serial);
    config.time_sync_interval = parse_duration(&args.sync_interval)?;
    config.startup_power_limit = Some(PowerLimit {
        limit: args.limit,
        relative: args.relative,
        persist: args.persist,
    });

    let mut radio = SimRadio::new();
    radio.set_responder(simulated_inverter(args.local_serial, args.peer_serial));

    let (link, events) = InverterLink::new(radio, config);
    link.startup().map_err(|err| link_error("startup failed", err))?;
    link.spawn();

    let _ = ctrlc::set_handler(|| std::process::exit(SUCCESS));

    let mut printed = 0usize;
    for reading in events {
        print_reading(&reading, format);
        printed = printed.saturating_add(1);
        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }
    }
    Ok(SUCCESS)
}

/// A scripted inverter behind the simulated radio.
///
/// Answers each time-sync with a three-fragment telemetry report but holds
/// the middle fragment back until it is re-requested, so a simulation run
/// exercises the whole reassembly/retry path.
fn simulated_inverter(local_serial: u64, peer_serial: u64) -> Responder {
    let dtu = NodeAddr::from_serial(local_serial);
    let inverter = NodeAddr::from_serial(peer_serial);
    let mut reports: u16 = 0;
    let mut withheld: Option<Vec<u8>> = None;

    Box::new(move |frame: &[u8]| {
        let Ok(request) = parse_fragment(frame) else {
            return Vec::new();
        };
        if request.kind != TX_REQ_INFO {
            return Vec::new();
        }

        if request.payload.is_empty() {
            // fragment re-request
            return withheld.take().into_iter().collect();
        }

        if request.payload.first() == Some(&0x0B) {
            // time-sync: produce a fresh report
            reports = reports.wrapping_add(1);
            let mut body = vec![0u8; 56];
            let power = 3000u16.wrapping_add(reports.wrapping_mul(7));
            body[50..52].copy_from_slice(&power.to_be_bytes());

            let mut fragments = report_fragments(&body, dtu, inverter);
            if withheld.is_none() && fragments.len() > 2 {
                withheld = Some(fragments.remove(1));
            }
            return fragments;
        }

        Vec::new()
    })
}

/// Split a report body into inbound fragments the way the inverter frames
/// them: header, body slice, CRC8 — the message CRC16 rides inside the
/// final fragment's payload.
fn report_fragments(body: &[u8], dtu: NodeAddr, inverter: NodeAddr) -> Vec<Vec<u8>> {
    const RX_INFO: u8 = 0x95;
    const CHUNK: usize = 20;

    let mut message = body.to_vec();
    message.extend_from_slice(&message_crc16(body).to_be_bytes());

    let count = message.len().div_ceil(CHUNK);
    message
        .chunks(CHUNK)
        .enumerate()
        .map(|(i, part)| {
            let index = (i + 1) as u8;
            let frame_id = if i + 1 == count { index | 0x80 } else { index };

            let mut raw = vec![RX_INFO];
            raw.extend_from_slice(dtu.as_bytes());
            raw.extend_from_slice(inverter.as_bytes());
            raw.push(frame_id);
            raw.extend_from_slice(part);
            raw.push(fragment_crc8(&raw));
            raw
        })
        .collect()
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn simulated_inverter_fragments_and_withholds() {
        let dtu_serial = 99_978_563_001;
        let inverter_serial = 116_180_215_597;
        let mut responder = simulated_inverter(dtu_serial, inverter_serial);

        let time_sync = invlink_wire::encode_frame(
            TX_REQ_INFO,
            NodeAddr::from_serial(inverter_serial),
            NodeAddr::from_serial(dtu_serial),
            invlink_wire::SOLO_FRAME_ID,
            &invlink_wire::time_sync_payload(0),
        )
        .unwrap();
        let fragments = responder(&time_sync);

        // three-fragment report with the middle one withheld
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0][9], 1);
        assert_eq!(fragments[1][9], 0x83);

        // a re-request releases the withheld fragment
        let rerequest = invlink_wire::encode_frame(
            TX_REQ_INFO,
            NodeAddr::from_serial(inverter_serial),
            NodeAddr::from_serial(dtu_serial),
            2,
            &[],
        )
        .unwrap();
        let released = responder(&rerequest);
        assert_eq!(released.len(), 1);
        assert_eq!(released[0][9], 2);

        // nothing left to release
        assert!(responder(&rerequest).is_empty());
    }

    #[test]
    fn report_fragments_reassemble_to_the_body() {
        let dtu = NodeAddr::from_serial(1);
        let inverter = NodeAddr::from_serial(2);
        let body: Vec<u8> = (0..56).collect();

        let fragments = report_fragments(&body, dtu, inverter);
        assert_eq!(fragments.len(), 3);

        let mut assembled = Vec::new();
        for raw in &fragments {
            assert!(invlink_wire::check_fragment_crc8(raw));
            assembled.extend_from_slice(&raw[10..raw.len() - 1]);
        }
        assert!(invlink_wire::check_assembled_crc16(&assembled));
        assert_eq!(&assembled[..56], &body[..]);
    }
}
