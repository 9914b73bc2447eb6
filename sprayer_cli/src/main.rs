mod cli;
mod error_fmt;
mod logging;
mod replay;
mod rt;
mod run;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use sprayer_core::TransitionSink;

use crate::cli::{Cli, Commands, JSON_MODE, RtLock};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let json = cli.json;
    let _ = JSON_MODE.set(json);
    if !json {
        let _ = color_eyre::install();
    }

    if let Err(err) = real_main(cli) {
        tracing::error!(error = %format!("{err:#}"), "sprayer failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = sprayer_config::load_file(&cli.config).map_err(run::config_error);
    logging::init(
        cli.json,
        cli.log_level.as_deref(),
        cfg.as_ref().ok().map(|c| &c.logging),
    )?;
    let cfg = cfg?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    if matches!(cli.cmd, Commands::Lanes) {
        return run::print_lanes(&cfg, cli.json);
    }

    rt::setup_rt_once(
        cli.rt,
        cli.rt_prio,
        cli.rt_lock.unwrap_or_else(RtLock::os_default),
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .wrap_err("install Ctrl-C handler")?;
    }

    let vis = run::display_sink(&cfg, cli.json);
    let mut ctl = run::start_controller(
        &cfg,
        vis.clone().map(|v| v as Arc<dyn TransitionSink>),
    )?;

    let outcome = match &cli.cmd {
        Commands::Replay { detections, speed } => {
            run::run_replay(&cfg, &ctl, detections, *speed, &shutdown, cli.json)
        }
        Commands::SelfCheck { pulse_ms } => {
            run::run_self_check(&ctl, Duration::from_millis(*pulse_ms), &shutdown, cli.json)
        }
        Commands::Override { state, hold_ms } => run::run_override(
            &ctl,
            *state,
            Duration::from_millis(*hold_ms),
            &shutdown,
            cli.json,
        ),
        Commands::Lanes => Ok(()),
    };

    // every relay is forced off here, whatever the command did
    let stopped = ctl.stop();
    if let Some(vis) = vis.and_then(|v| Arc::try_unwrap(v).ok()) {
        let _ = vis.close();
    }
    run::print_stats(&ctl.all_stats(), cli.json);

    outcome?;
    stopped?;
    Ok(())
}
