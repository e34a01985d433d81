//! `dialer` - drive the call-session controller from a terminal
//!
//! The platform side is simulated, so every command runs anywhere:
//!
//! ```text
//! dialer call "+91 9119515866" --seconds 5 --speaker
//! dialer call 5550100 --deny
//! dialer keys "911951586<6" --call
//! dialer logs --limit 2
//! dialer config
//! ```

mod logging;
mod render;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialer_core::sim::SimulatedPlatform;
use dialer_core::{
    CallLogViewer, CallSessionController, DialerError, DialpadInputModel, PermissionDecision,
    PlatformServices, SessionEvent, SessionState,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::logging::{log_welcome, setup_logging, LoggingConfig};
use crate::settings::{default_path, Settings};

#[derive(Parser, Debug)]
#[command(name = "dialer")]
#[command(version, about = "Phone dialer call-session controller over a simulated platform")]
struct Cli {
    /// Settings file (defaults to <config dir>/dialer/config.toml)
    #[arg(short, long, global = true, env = "DIALER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Simulated platform delay in milliseconds
    #[arg(long, global = true)]
    latency_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Place a call, hold it for a while, then hang up
    Call {
        /// Number to dial
        number: String,

        #[command(flatten)]
        call: CallArgs,
    },
    /// Type on the dial pad ('<' is backspace, '!' clears)
    Keys {
        /// Keys to press, in order
        keys: String,

        /// Start from an empty pad even if a prefill number is configured
        #[arg(long)]
        empty: bool,

        /// Dial whatever is on the pad afterwards
        #[arg(long)]
        call: bool,

        #[command(flatten)]
        call_args: CallArgs,
    },
    /// Show recent calls
    Logs {
        /// Answer "Deny" to the call-log permission prompt
        #[arg(long)]
        deny: bool,

        /// Maximum number of entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective settings
    Config,
}

#[derive(clap::Args, Debug, Clone)]
struct CallArgs {
    /// Answer "Disagree" to the call permission prompt
    #[arg(long)]
    deny: bool,

    /// Seconds to stay in the call
    #[arg(short, long, default_value = "3")]
    seconds: u64,

    /// Mute the microphone once connected
    #[arg(long)]
    mute: bool,

    /// Turn on the speakerphone once connected
    #[arg(long)]
    speaker: bool,

    /// Dial directly instead of through the system call UI
    #[arg(long)]
    direct: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Also show audio route and timer events
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        settings.logging.level = level.clone();
    }
    if let Some(latency) = cli.latency_ms {
        settings.simulation.latency_ms = latency;
    }

    setup_logging(&LoggingConfig::from_settings(&settings.logging)?)?;
    log_welcome(dialer_core::VERSION);

    match cli.command {
        Commands::Call { number, call } => run_call(&settings, &number, &call).await,
        Commands::Keys {
            keys,
            empty,
            call,
            call_args,
        } => {
            let model = if empty {
                DialpadInputModel::new()
            } else {
                DialpadInputModel::from_config(&settings.dialer)
            };
            let model = press_keys(model, &keys);
            print!("{}", render::dialpad(&model));
            if call {
                run_call(&settings, model.value(), &call_args).await?;
            }
            Ok(())
        }
        Commands::Logs { deny, limit, json } => show_logs(&settings, deny, limit, json).await,
        Commands::Config => {
            if let Some(path) = cli.config.clone().or_else(default_path) {
                println!("# {}", path.display().to_string().dimmed());
            }
            print!("{}", settings.to_toml()?);
            Ok(())
        }
    }
}

fn press_keys(mut model: DialpadInputModel, keys: &str) -> DialpadInputModel {
    for key in keys.chars() {
        match key {
            '<' => model.backspace(),
            '!' => model.clear(),
            key => model.append(key),
        }
    }
    model
}

fn platform(settings: &Settings) -> Arc<SimulatedPlatform> {
    SimulatedPlatform::with_latency(Duration::from_millis(settings.simulation.latency_ms))
}

/// Print controller events until the controller goes away
fn spawn_printer(
    mut events: broadcast::Receiver<SessionEvent>,
    json: bool,
    verbose: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if json {
                        match serde_json::to_string(&event) {
                            Ok(line) => println!("{}", line),
                            Err(e) => debug!("Unserializable event: {}", e),
                        }
                    } else if let Some(line) = render::event_line(&event, verbose) {
                        println!("{}", line);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!("Event printer lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn run_call(settings: &Settings, number: &str, args: &CallArgs) -> Result<()> {
    let platform = platform(settings);
    if args.deny {
        platform.set_default_permission(PermissionDecision::Denied);
    }

    let mut config = settings.dialer.clone();
    if args.direct {
        config.use_system_ui = false;
    }

    let controller =
        CallSessionController::new(config, PlatformServices::from_platform(platform.clone()))
            .context("Failed to start call session controller")?;
    let printer = spawn_printer(controller.subscribe(), args.json, args.verbose);
    controller.open_dialer().await?;

    match controller.start_call(number).await {
        Ok(session) => {
            debug!("Started session {}", session);
            let mut snapshots = controller.watch();
            let connected = snapshots
                .wait_for(|s| matches!(s.state, SessionState::InCall | SessionState::Idle))
                .await?
                .state
                == SessionState::InCall;

            if connected {
                if args.mute {
                    controller.toggle_mute().await;
                }
                if args.speaker {
                    controller.toggle_speaker().await;
                }
                tokio::time::sleep(Duration::from_secs(args.seconds)).await;
                controller.end_call().await;
            }
        }
        // Notices already went out as events
        Err(DialerError::MissingNumber) => {}
        Err(e) => return Err(e.into()),
    }

    controller.shutdown().await;
    drop(controller);
    printer.await?;

    debug!(
        "Audio route enabled {} time(s), disabled {} time(s)",
        platform.audio_enable_count(),
        platform.audio_disable_count()
    );
    Ok(())
}

async fn show_logs(settings: &Settings, deny: bool, limit: Option<usize>, json: bool) -> Result<()> {
    let platform = platform(settings);
    platform.load_sample_call_log();
    if deny {
        platform.set_default_permission(PermissionDecision::Denied);
    }

    let mut config = settings.dialer.clone();
    if let Some(limit) = limit {
        config = config.with_call_log_limit(limit);
    }
    config.validate()?;

    let mut viewer = CallLogViewer::new(platform.clone(), platform, &config);
    match viewer.refresh().await {
        Ok(entries) if json => println!("{}", serde_json::to_string_pretty(entries)?),
        Ok(entries) => println!("{}", render::call_log_table(entries)),
        Err(e) => match e.user_notice() {
            Some(notice) => println!("{}", render::notice(&notice)),
            None => return Err(e.into()),
        },
    }
    Ok(())
}
