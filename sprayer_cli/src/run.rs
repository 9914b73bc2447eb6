//! Hardware assembly and command execution.

use std::fs::File;
use std::io::{BufReader, IsTerminal};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use serde_json::json;
use sprayer_config::Config;
use sprayer_core::{
    ActuationJob, ControllerCfg, CsvJobLogger, DispatchCfg, Dispatcher, JobLogger, LaneMap,
    LaneSnapshot, SprayController, SprayerError, TracingJobLogger, TransitionSink,
};
use sprayer_ui::NozzleVis;

use crate::cli::OverrideState;
use crate::replay;

/// Polling step while waiting, so Ctrl-C is noticed promptly.
const WAIT_SLICE: Duration = Duration::from_millis(20);

pub fn config_error(e: eyre::Report) -> eyre::Report {
    eyre::Report::new(SprayerError::Config(format!("{e:#}")))
}

fn backend(cfg: &Config) -> sprayer_hardware::Backend {
    match cfg.hardware.backend {
        sprayer_config::Backend::Simulated => sprayer_hardware::Backend::Simulated,
        sprayer_config::Backend::Gpio => sprayer_hardware::Backend::Gpio,
    }
}

/// Terminal nozzle row, when enabled and stdout is an interactive terminal.
pub fn display_sink(cfg: &Config, json: bool) -> Option<Arc<NozzleVis>> {
    if !cfg.display.nozzle_vis || json || !std::io::stdout().is_terminal() {
        return None;
    }
    match NozzleVis::stdout(cfg.system.relay_num) {
        Ok(vis) => Some(Arc::new(vis)),
        Err(e) => {
            tracing::warn!(error = %e, "nozzle display unavailable");
            None
        }
    }
}

/// Open relays and buzzer for the configured backend and start the lanes.
pub fn start_controller(
    cfg: &Config,
    sink: Option<Arc<dyn TransitionSink>>,
) -> eyre::Result<SprayController> {
    let pins = cfg.relay_pins().map_err(config_error)?;
    let backend = backend(cfg);
    let relays = sprayer_hardware::make_relays(backend, &pins).wrap_err("open relays")?;
    let buzzer =
        sprayer_hardware::make_buzzer(backend, cfg.hardware.buzzer_pin).wrap_err("open buzzer")?;
    tracing::info!(?backend, ?pins, "relays opened");

    let mut builder = SprayController::builder()
        .with_relays(relays)
        .with_config(ControllerCfg::from(cfg));
    if let Some(b) = buzzer {
        builder = builder.with_buzzer(b);
    }
    if let Some(s) = sink {
        builder = builder.with_sink(s);
    }
    Ok(builder.start()?)
}

/// Sleep until `deadline`; false if interrupted by the shutdown flag.
fn sleep_until(deadline: Instant, shutdown: &AtomicBool) -> bool {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(WAIT_SLICE));
    }
}

/// Wall-clock instant a frame captured at `at` is replayed at.
fn paced(start: Instant, at: Duration, speed: f64) -> eyre::Result<Instant> {
    Duration::try_from_secs_f64(at.as_secs_f64() / speed)
        .ok()
        .and_then(|offset| start.checked_add(offset))
        .ok_or_else(|| {
            eyre::eyre!(
                "frame at t_ms={} cannot be replayed at speed {speed}",
                at.as_millis()
            )
        })
}

fn job_logger(cfg: &Config) -> eyre::Result<Box<dyn JobLogger>> {
    Ok(match cfg.logging.job_log.as_deref() {
        Some(path) => Box::new(CsvJobLogger::open(Path::new(path))?),
        None => Box::new(TracingJobLogger),
    })
}

pub fn run_replay(
    cfg: &Config,
    ctl: &SprayController,
    detections: &Path,
    speed: f64,
    shutdown: &AtomicBool,
    json_out: bool,
) -> eyre::Result<()> {
    if !(speed.is_finite() && speed > 0.0) {
        eyre::bail!("--speed must be a positive number, got {speed}");
    }
    let file = File::open(detections)
        .wrap_err_with(|| format!("open detection stream {}", detections.display()))?;
    let frames = replay::parse(BufReader::new(file))?;
    let mut dispatcher = Dispatcher::new(&DispatchCfg::from(cfg))?.with_job_log(job_logger(cfg)?);
    tracing::info!(
        frames = frames.len(),
        activation_y = dispatcher.activation_y(),
        "replay started"
    );

    let start = Instant::now();
    let (mut played, mut eligible, mut submitted) = (0usize, 0usize, 0usize);
    let mut interrupted = false;
    for frame in &frames {
        let captured = paced(start, frame.at, speed)?;
        if !sleep_until(captured, shutdown) {
            interrupted = true;
            break;
        }
        let s = dispatcher.dispatch(&frame.detections, captured, ctl);
        played += 1;
        eligible += s.eligible;
        submitted += s.submitted;
    }
    if interrupted {
        tracing::warn!(played, "replay interrupted");
    }

    if json_out {
        println!(
            "{}",
            json!({
                "command": "replay",
                "frames": played,
                "eligible": eligible,
                "jobs": submitted,
                "interrupted": interrupted,
            })
        );
    } else {
        println!(
            "replay {}: {played} frames, {eligible} detections past the activation line, {submitted} jobs",
            if interrupted { "interrupted" } else { "complete" }
        );
    }
    Ok(())
}

pub fn run_self_check(
    ctl: &SprayController,
    pulse: Duration,
    shutdown: &AtomicBool,
    json_out: bool,
) -> eyre::Result<()> {
    for lane in 0..ctl.lane_count() {
        tracing::info!(lane, pulse_ms = pulse.as_millis() as u64, "self-check pulse");
        ctl.submit(ActuationJob::new(lane, Instant::now(), Duration::ZERO, pulse))?;
        if !sleep_until(Instant::now() + pulse + WAIT_SLICE, shutdown) {
            eyre::bail!("self-check interrupted at lane {lane}");
        }
    }
    if json_out {
        println!(
            "{}",
            json!({ "command": "self-check", "ok": true, "lanes": ctl.lane_count() })
        );
    } else {
        println!("self-check ok: {} lanes pulsed", ctl.lane_count());
    }
    Ok(())
}

pub fn run_override(
    ctl: &SprayController,
    state: OverrideState,
    hold: Duration,
    shutdown: &AtomicBool,
    json_out: bool,
) -> eyre::Result<()> {
    match state {
        OverrideState::On => ctl.all_on()?,
        OverrideState::Off => ctl.all_off()?,
    }
    let held = sleep_until(Instant::now() + hold, shutdown);
    let name = match state {
        OverrideState::On => "on",
        OverrideState::Off => "off",
    };
    if json_out {
        println!(
            "{}",
            json!({
                "command": "override",
                "state": name,
                "hold_ms": hold.as_millis() as u64,
                "interrupted": !held,
            })
        );
    } else {
        println!("override {name} held for {} ms", hold.as_millis());
    }
    Ok(())
}

pub fn print_lanes(cfg: &Config, json_out: bool) -> eyre::Result<()> {
    let map = LaneMap::new(cfg.camera.resolution_width, cfg.system.relay_num)
        .map_err(|e| config_error(eyre::Report::new(e)))?;
    if json_out {
        let lanes: Vec<_> = map
            .lanes()
            .iter()
            .map(|l| json!({ "lane": l.index, "start": l.start, "end": l.end }))
            .collect();
        println!("{}", json!({ "width": map.width(), "lanes": lanes }));
    } else {
        for l in map.lanes() {
            println!("lane {}: [{}, {})", l.index, l.start, l.end);
        }
    }
    Ok(())
}

pub fn print_stats(stats: &[LaneSnapshot], json_out: bool) {
    if json_out {
        let lanes: Vec<_> = stats
            .iter()
            .enumerate()
            .map(|(lane, s)| {
                json!({
                    "lane": lane,
                    "submitted": s.submitted,
                    "dropped": s.dropped,
                    "processed": s.processed,
                    "anomalies": s.anomalies,
                    "hw_failures": s.hw_failures,
                })
            })
            .collect();
        println!("{}", json!({ "stats": lanes }));
        return;
    }
    println!("lane  submitted  dropped  processed  anomalies  hw_failures");
    for (lane, s) in stats.iter().enumerate() {
        println!(
            "{lane:>4}  {:>9}  {:>7}  {:>9}  {:>9}  {:>11}",
            s.submitted, s.dropped, s.processed, s.anomalies, s.hw_failures
        );
    }
}
