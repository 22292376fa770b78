//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "patrol", version, about = "Head patrol controller")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Reaction policy override for `run`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum PolicyArg {
    /// Stop the head and wait out the cooldown
    Halt,
    /// Step toward the object, then back away
    ApproachAndRetreat,
    /// Run the configured posture
    TriggerPosture,
}

impl From<PolicyArg> for patrol_config::ReactionPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Halt => Self::Halt,
            PolicyArg::ApproachAndRetreat => Self::ApproachAndRetreat,
            PolicyArg::TriggerPosture => Self::TriggerPosture,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the patrol loop; commands are read as JSON lines from stdin
    Run {
        /// Override scan.arc_width_deg
        #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
        arc: Option<f64>,
        /// Override reaction.policy
        #[arg(long, value_enum, value_name = "POLICY")]
        policy: Option<PolicyArg>,
        /// Stop after this many milliseconds of loop time
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Run on a virtual clock: sleeps return immediately
        #[arg(
            long,
            action = ArgAction::SetTrue,
            requires = "duration_ms",
            long_help = "Run on a virtual clock. Every pause (tick sleeps, reaction cooldowns, settle walks) advances virtual time instead of blocking, so a long session completes instantly. Requires --duration-ms. Stdin commands race with the virtual loop; use --start to begin scanning deterministically."
        )]
        virtual_time: bool,
        /// Submit a start command before the first tick
        #[arg(long, action = ArgAction::SetTrue)]
        start: bool,
    },
    /// Load and validate the config, then exit
    CheckConfig,
    /// Exercise each device once
    SelfCheck,
}
