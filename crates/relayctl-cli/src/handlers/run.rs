//! Interactive streaming session.
//!
//! Starts the log flusher and the health monitor, then reads operator
//! commands from stdin until `quit`, end of input or Ctrl+C. Every exit
//! path stops all streams and the relay before returning.

use std::ops::ControlFlow;
use std::sync::Arc;

use anyhow::Result;
use relayctl_core::{LogDisplay, Settings};
use relayctl_runtime::{
    DEFAULT_HEALTH_INTERVAL, StartOutcome, spawn_health_monitor, spawn_log_flusher,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bootstrap::CliContext;
use crate::presentation::{format_start_report, print_slots};
use crate::session::{ConsoleLog, SESSION_HELP, SessionCommand, Target};

/// Execute the run command.
///
/// # Errors
///
/// Only setup failures are returned; failures of individual session
/// commands are printed and the session continues.
pub async fn execute(ctx: &CliContext, start_all: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    let console = Arc::new(ConsoleLog::new(ctx.settings.max_log_lines));

    let flusher = spawn_log_flusher(
        ctx.log.clone(),
        ctx.settings.flush_interval(),
        Arc::clone(&console) as Arc<dyn LogDisplay>,
        cancel.clone(),
    );
    let monitor = spawn_health_monitor(
        Arc::clone(&ctx.orchestrator),
        DEFAULT_HEALTH_INTERVAL,
        cancel.clone(),
    );

    let slots = ctx.orchestrator().len().await;
    println!("{}", session_banner(&ctx.settings, slots));
    println!("Type 'help' for commands.");

    if start_all {
        dispatch(ctx, &console, SessionCommand::Start(Target::All)).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<SessionCommand>() {
                    Ok(command) => {
                        if dispatch(ctx, &console, command).await.is_break() {
                            break;
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                },
                Ok(None) => {
                    debug!("stdin closed, ending session");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin, ending session");
                    break;
                }
            },
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!(error = %e, "Ctrl+C handler failed, ending session");
                }
                println!();
                info!("Interrupted");
                break;
            }
        }
    }

    println!("Stopping all streams...");
    ctx.orchestrator().shutdown_all().await;
    ctx.log.append("Session ended");

    cancel.cancel();
    for (name, task) in [("log flusher", flusher), ("health monitor", monitor)] {
        if let Err(e) = task.await {
            warn!(task = name, error = %e, "Background task did not finish cleanly");
        }
    }
    Ok(())
}

/// Run one session command. Returns `Break` when the session should end.
pub(crate) async fn dispatch(
    ctx: &CliContext,
    console: &ConsoleLog,
    command: SessionCommand,
) -> ControlFlow<()> {
    let orchestrator = ctx.orchestrator();

    match command {
        SessionCommand::Start(Target::All) => match orchestrator.start_all().await {
            Ok(report) if report.is_complete_success() => {
                debug!(started = report.started.len(), "Start all finished");
            }
            Ok(report) => {
                for line in format_start_report(&report) {
                    eprintln!("{line}");
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        },
        SessionCommand::Start(Target::Slot(index)) => match orchestrator.start_one(index).await {
            Ok(StartOutcome::AlreadyRunning) => {
                println!("Stream {} is already running", index + 1);
            }
            Ok(StartOutcome::Started { pid }) => debug!(index, ?pid, "Stream started"),
            Err(e) => eprintln!("Error: {e}"),
        },
        SessionCommand::Stop(Target::All) => orchestrator.stop_all().await,
        SessionCommand::Stop(Target::Slot(index)) => {
            if let Err(e) = orchestrator.stop_one(index).await {
                eprintln!("Error: {e}");
            }
        }
        SessionCommand::Delete(index) => {
            if let Err(e) = orchestrator.delete_one(index).await {
                eprintln!("Error: {e}");
            }
        }
        SessionCommand::Add(path) => match orchestrator.add_source(&path).await {
            Ok(true) => {}
            Ok(false) => println!("Already in the slot list: {}", path.display()),
            Err(e) => eprintln!("Cannot add {}: {e}", path.display()),
        },
        SessionCommand::List => {
            let slots = orchestrator.slots().await;
            if slots.is_empty() {
                println!("The slot list is empty.");
            } else {
                print_slots(&slots);
            }
        }
        SessionCommand::Urls => {
            let urls = orchestrator.stream_urls().await;
            if urls.is_empty() {
                println!("No streams are running.");
            }
            for url in urls {
                println!("{url}");
            }
        }
        SessionCommand::Log(n) => {
            for line in console.view().tail(n) {
                println!("{line}");
            }
        }
        SessionCommand::Help => println!("{SESSION_HELP}"),
        SessionCommand::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

fn session_banner(settings: &Settings, slots: usize) -> String {
    let video = if settings.needs_reencode() {
        "re-encode"
    } else {
        "copy"
    };
    format!(
        "relayctl session: {slots} slot(s), {} mode, RTSP port {}, video {video}",
        settings.mode, settings.rtsp_port
    )
}
