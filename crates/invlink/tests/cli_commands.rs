use std::process::Command;

const INVERTER_SERIAL: &str = "116180215597";

fn invlink(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_invlink"))
        .args(args)
        .output()
        .expect("binary should run")
}

#[test]
fn encode_power_limit_prints_golden_frame() {
    let output = invlink(&[
        "--format",
        "json",
        "encode",
        "--peer-serial",
        INVERTER_SERIAL,
        "--power-limit",
        "25",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("518021559778563001800b0001f400006e417c"),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn encode_time_sync_respects_fixed_timestamp() {
    let output = invlink(&[
        "--format",
        "json",
        "encode",
        "--peer-serial",
        INVERTER_SERIAL,
        "--time-sync",
        "--at",
        "1610612736", // 0x60000000
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("158021559778563001800b006000000000000005000000ade7cd"),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn encode_requires_a_payload_choice() {
    let output = invlink(&["encode", "--peer-serial", INVERTER_SERIAL]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn decode_fragment_round_trips() {
    let output = invlink(&["--format", "json", "decode", "158021559778563001026b"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"index\":2"), "unexpected stdout: {stdout}");
    assert!(stdout.contains("\"src\":\"78563001\""));
}

#[test]
fn decode_rejects_corrupted_fragment() {
    // same frame with the checksum byte flipped
    let output = invlink(&["decode", "15802155977856300102ff"]);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("fragment rejected"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn run_requires_simulation_without_hardware() {
    let output = invlink(&["run", "--peer-serial", INVERTER_SERIAL]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn simulated_run_emits_requested_readings() {
    let output = invlink(&[
        "--format",
        "json",
        "--log-level",
        "error",
        "run",
        "--peer-serial",
        INVERTER_SERIAL,
        "--simulate",
        "--count",
        "2",
        "--sync-interval",
        "300ms",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let readings: Vec<&str> = stdout.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(readings.len(), 2, "unexpected stdout: {stdout}");
    for line in readings {
        assert!(line.contains("ac_power_deciwatts"), "unexpected line: {line}");
    }
}

#[test]
fn version_prints_package_version() {
    let output = invlink(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("invlink "));
}
