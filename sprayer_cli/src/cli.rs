//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "sprayer", version, about = "Weed sprayer actuation controller")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/sprayer.toml")]
    pub config: PathBuf,

    /// Log as JSON lines and print results as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Enable real-time mode (SCHED_FIFO, mlockall)
    #[arg(
        long,
        action = ArgAction::SetTrue,
        long_help = "Enable real-time mode on supported OSes.\n\nLinux: Attempts SCHED_FIFO priority and calls mlockall to keep the process resident in RAM. Lane worker threads inherit the policy, which reduces jitter of relay switching. May require CAP_SYS_NICE, CAP_IPC_LOCK or a raised 'ulimit -l'.\n\nmacOS: Only mlockall is applied."
    )]
    pub rt: bool,

    /// Real-time priority for SCHED_FIFO on Linux (1..=max)
    #[arg(long, value_name = "PRIO")]
    pub rt_prio: Option<i32>,

    /// Memory locking mode for --rt: none, current, or all
    #[arg(long, value_enum, value_name = "MODE")]
    pub rt_lock: Option<RtLock>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        if cfg!(target_os = "linux") {
            RtLock::All
        } else {
            RtLock::None
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OverrideState {
    On,
    Off,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Feed a JSON-lines detection stream through the dispatcher at recorded pace
    Replay {
        /// JSONL file: {"t_ms": 0, "centers": [[x, y], ...], "boxes": [[x, y, w, h], ...]}
        #[arg(long, value_name = "FILE")]
        detections: PathBuf,
        /// Playback speed factor (2.0 = twice as fast)
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    /// Start, pulse every lane in turn, stop
    SelfCheck {
        /// Pulse length per lane in ms
        #[arg(long, value_name = "MS", default_value_t = 100)]
        pulse_ms: u64,
    },
    /// Switch every nozzle on or off manually
    Override {
        #[arg(long, value_enum)]
        state: OverrideState,
        /// How long to hold the state before shutting down (ms)
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        hold_ms: u64,
    },
    /// Print lane boundaries for the configured camera width
    Lanes,
}
