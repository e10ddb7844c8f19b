use bytes::Bytes;

use invlink_link::telemetry;
use invlink_wire::{check_assembled_crc16, parse_fragment};

use crate::cmd::DecodeArgs;
use crate::exit::{wire_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_fragment, print_reading, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;

    if args.assembled {
        if !check_assembled_crc16(&bytes) {
            return Err(CliError::new(
                DATA_INVALID,
                "assembled message failed its CRC16",
            ));
        }
        let reading = telemetry::decode(&Bytes::from(bytes))
            .ok_or_else(|| CliError::new(DATA_INVALID, "message too short to decode"))?;
        print_reading(&reading, format);
    } else {
        let fragment =
            parse_fragment(&bytes).map_err(|err| wire_error("fragment rejected", err))?;
        print_fragment(&fragment, format);
    }
    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(CliError::new(USAGE, "hex input must not be empty"));
    }
    if cleaned.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }
    (0..cleaned.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&cleaned[i..i + 2], 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex at offset {i}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_spaced_input() {
        assert_eq!(parse_hex("de ad be ef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn parse_hex_rejects_bad_input() {
        assert!(parse_hex("").is_err());
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
