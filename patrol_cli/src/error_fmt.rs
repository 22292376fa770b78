//! Human-readable error descriptions and structured JSON error formatting.

use patrol_core::error::{BuildError, PatrolError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingHead => {
                "What happened: No head actuator was provided to the patrol loop.\nLikely causes: The head servo driver failed to initialize or was not wired into the builder.\nHow to fix: Ensure the head actuator is created and passed via with_head(...).".to_string()
            }
            BuildError::MissingBody => {
                "What happened: No body actuator was provided to the patrol loop.\nLikely causes: The leg driver failed to initialize or was not wired into the builder.\nHow to fix: Ensure the body actuator is created and passed via with_body(...).".to_string()
            }
            BuildError::MissingRange => {
                "What happened: No range sensor was provided to the patrol loop.\nLikely causes: The HC-SR04 failed to initialize or was not wired into the builder.\nHow to fix: Ensure the range sensor is created and passed via with_range(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the overrides, then rerun."
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<PatrolError>() {
        return match pe {
            PatrolError::Timeout => "What happened: Range sensor read timed out.\nLikely causes: HC-SR04 not wired correctly, no power/ground, or timeout too low.\nHow to fix: Verify TRIG/ECHO pins and power, and consider increasing hardware.sensor_timeout_ms in the config.".to_string(),
            PatrolError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file and run `patrol check-config` to verify."
            ),
            PatrolError::Hardware(msg) | PatrolError::HardwareFault(msg) => format!(
                "What happened: A device reported an error ({msg}).\nLikely causes: Loose wiring, missing power, or a driver that is not running.\nHow to fix: Check the device connections, then run `patrol self-check`."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({msg}).\nLikely causes: Wrong path or missing permissions.\nHow to fix: Pass an existing file via --config, or omit it to use built-in defaults."
        );
    }

    if lower.contains("parse config") {
        return format!(
            "What happened: The config file is not valid TOML for this program ({msg}).\nLikely causes: A typo in a key or a value of the wrong type.\nHow to fix: Fix the reported line; valid sections are [scan], [timing], [reaction], [tilt], [logging] and [hardware], and every key may be omitted to use its default."
        );
    }

    if lower.contains("open hc-sr04") || lower.contains("gpio") {
        return "What happened: Failed to initialize hardware pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix hardware.range_trig_pin/range_echo_pin in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file and run `patrol check-config` to verify."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<PatrolError>() {
        Some(PatrolError::Config(_)) => "Config",
        Some(PatrolError::Hardware(_) | PatrolError::HardwareFault(_)) => "Hardware",
        Some(PatrolError::Timeout) => "Timeout",
        Some(PatrolError::State(_)) => "State",
        Some(PatrolError::Command(_)) => "Command",
        None => {
            let lower = err.to_string().to_ascii_lowercase();
            if lower.contains("config") || lower.contains("must be") {
                "Config"
            } else {
                "Error"
            }
        }
    }
}

/// Stable exit codes: 3 config, 4 hardware, 5 timeout, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "Config" => 3,
        "Hardware" => 4,
        "Timeout" => 5,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
