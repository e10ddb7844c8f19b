use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use invlink_wire::{
    control_payload, encode_frame, power_limit_payload, time_sync_payload, NodeAddr, SOLO_FRAME_ID,
    TX_REQ_DEVCONTROL, TX_REQ_INFO,
};

use crate::cmd::EncodeArgs;
use crate::exit::{wire_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_encoded_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let local = NodeAddr::from_serial(args.local_serial);
    let peer = NodeAddr::from_serial(args.peer_serial);

    let (label, kind, payload): (&str, u8, Bytes) = if let Some(limit) = args.power_limit {
        (
            "power-limit",
            TX_REQ_DEVCONTROL,
            power_limit_payload(limit, args.relative, args.persist),
        )
    } else if let Some(command) = args.command {
        (
            "control",
            TX_REQ_DEVCONTROL,
            control_payload(
                command.device_command(),
                args.data,
                args.modifier.unwrap_or(0),
            ),
        )
    } else if args.time_sync {
        let at = args.at.unwrap_or_else(unix_now);
        ("time-sync", TX_REQ_INFO, time_sync_payload(at))
    } else {
        return Err(CliError::new(
            USAGE,
            "choose one of --power-limit, --command, --time-sync",
        ));
    };

    let frame = encode_frame(kind, peer, local, SOLO_FRAME_ID, &payload)
        .map_err(|err| wire_error("encode failed", err))?;
    print_encoded_frame(label, &frame, format);
    Ok(SUCCESS)
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
