//! Remote command decoding.
//!
//! Commands arrive as JSON objects such as
//! `{"run": "start", "scanArcWidth": "45"}`. Decoding happens once at the
//! transport boundary; the loop only ever sees a [`PatrolCommand`].
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::posture::Posture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCommand {
    Start,
    Stop,
    Stand,
    Sit,
    PostureA,
    PostureB,
}

impl RunCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Stand => "stand",
            Self::Sit => "sit",
            Self::PostureA => "posture-A",
            Self::PostureB => "posture-B",
        }
    }

    /// The posture this command runs, if any.
    pub fn posture(self) -> Option<Posture> {
        match self {
            Self::PostureA => Some(Posture::PowerBow),
            Self::PostureB => Some(Posture::PowerWave),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown run command `{0}`")]
pub struct UnknownRun(pub String);

impl FromStr for RunCommand {
    type Err = UnknownRun;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "stand" => Ok(Self::Stand),
            "sit" => Ok(Self::Sit),
            "posture-A" | "posture-a" | "powerbow" => Ok(Self::PostureA),
            "posture-B" | "posture-b" | "powerwave" => Ok(Self::PostureB),
            other => Err(UnknownRun(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcSetting {
    Degrees(f64),
    /// Arc value that did not parse; scanning is switched off.
    Disabled,
}

impl ArcSetting {
    /// Arc width to store: `Disabled` maps to 0.
    pub fn width_deg(self) -> f64 {
        match self {
            Self::Degrees(d) => d,
            Self::Disabled => 0.0,
        }
    }

    fn parse(s: &str) -> Self {
        match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Degrees(v),
            _ => Self::Disabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PatrolCommand {
    pub run: Option<RunCommand>,
    pub arc: Option<ArcSetting>,
}

impl PatrolCommand {
    pub fn run(cmd: RunCommand) -> Self {
        Self {
            run: Some(cmd),
            arc: None,
        }
    }

    pub fn arc(deg: f64) -> Self {
        Self {
            run: None,
            arc: Some(ArcSetting::Degrees(deg)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.run.is_none() && self.arc.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("malformed command payload: {0}")]
    Malformed(String),
    #[error("command payload is not a JSON object")]
    NotAnObject,
    #[error("unrecognized text command `{0}`")]
    UnrecognizedText(String),
}

const ARC_KEYS: [&str; 2] = ["scanArcWidth", "hsr"];

/// Decode a JSON command object.
///
/// Unknown `run` values decode to no run command; an arc value that does not
/// parse as a number decodes to [`ArcSetting::Disabled`].
pub fn decode_json(payload: &[u8]) -> Result<PatrolCommand, CommandError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| CommandError::Malformed(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(CommandError::NotAnObject);
    };

    let run = match map.get("run") {
        Some(Value::String(s)) => match s.parse::<RunCommand>() {
            Ok(cmd) => Some(cmd),
            Err(e) => {
                tracing::info!(error = %e, "ignoring run value");
                None
            }
        },
        Some(other) => {
            tracing::info!(value = %other, "ignoring non-string run value");
            None
        }
        None => None,
    };

    let arc = ARC_KEYS
        .iter()
        .find_map(|k| map.get(*k))
        .map(|v| match v {
            Value::String(s) => ArcSetting::parse(s),
            Value::Number(n) => n
                .as_f64()
                .filter(|d| d.is_finite())
                .map_or(ArcSetting::Disabled, ArcSetting::Degrees),
            _ => ArcSetting::Disabled,
        });

    Ok(PatrolCommand { run, arc })
}

/// Plain text payloads carry no commands; they are reported back so the
/// transport can log them.
pub fn decode_text(text: &str) -> Result<PatrolCommand, CommandError> {
    Err(CommandError::UnrecognizedText(text.trim().to_owned()))
}

/// Decode a transport line: JSON objects are commands, anything else is text.
pub fn decode_line(line: &str) -> Result<PatrolCommand, CommandError> {
    let trimmed = line.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        decode_json(trimmed.as_bytes())
    } else {
        decode_text(trimmed)
    }
}
