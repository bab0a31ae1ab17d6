//! IR+ remote control bridge
//!
//! Main entry point: CLI, logging setup and the run loop.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use irplus::app::{App, BoxedSink, BoxedSource};
use irplus::config::AppConfig;
use irplus::console;
use irplus::detector::StopToken;
use irplus::device::{RecordingSink, VirtualInput};
use irplus::notify::{self, Notice};
use irplus::serial;
use irplus::store::ConfigStore;
use irplus_engine::{ActionId, Signal};

#[derive(Parser)]
#[command(name = "irplus")]
#[command(about = "Control the desktop with an IR remote through an Arduino receiver")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file path (default: ~/.config/irplus/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bindings file path (default: ~/.config/irplus/bindings.toml)
    #[arg(short, long, global = true)]
    bindings: Option<PathBuf>,

    /// Serial port of the receiver (skips discovery)
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Start detecting and performing actions immediately, without a prompt
    #[arg(long)]
    headless: bool,

    /// Log actions instead of injecting input
    #[arg(long)]
    dry_run: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Run the remote control (default)
    Run,
    /// Bind a signal to an action, making it the signal's default
    Bind {
        /// Signal code as printed by the receiver (e.g. FF30CF)
        signal: String,
        /// Action name (see `irplus actions`)
        #[arg(required = true, num_args = 1..)]
        action: Vec<String>,
    },
    /// Show saved bindings and available modes
    List,
    /// Show every action name grouped by mode
    Actions,
    /// Remove all saved bindings
    Reset,
    /// List serial ports
    Ports,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(port) = cli.port.clone() {
        config.serial.port = Some(port);
    }
    let store = ConfigStore::new(cli.bindings.clone().unwrap_or_else(ConfigStore::default_path));

    match cli.command {
        None | Some(Command::Run) => run(config, store, cli.headless, cli.dry_run).await,
        Some(Command::Bind { signal, action }) => {
            let signal: Signal = signal.parse()?;
            let action: ActionId = action.join(" ").parse()?;
            let bindings = store.bind(signal.clone(), action)?;
            if let Some(actions) = bindings.get(&signal) {
                let names: Vec<&str> = actions.iter().map(|a| a.name()).collect();
                println!("{} -> {}", signal, names.join(", "));
            }
            Ok(())
        }
        Some(Command::List) => {
            console::print_bindings(&store.try_load()?);
            Ok(())
        }
        Some(Command::Actions) => {
            console::print_actions();
            Ok(())
        }
        Some(Command::Reset) => {
            store.clear()?;
            println!("All bindings removed from {}", store.path().display());
            Ok(())
        }
        Some(Command::Ports) => {
            let ports = serial::list_ports()?;
            if ports.is_empty() {
                println!("No serial ports found");
            }
            for port in ports {
                println!(
                    "{:<16} {}",
                    port.name,
                    port.description.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
    }
}

async fn run(config: AppConfig, store: ConfigStore, headless: bool, dry_run: bool) -> Result<()> {
    let shutdown = StopToken::new();
    let ctrlc_token = shutdown.clone();
    ctrlc::set_handler(move || {
        ctrlc_token.request();
    })
    .ok();

    let notifier = notify::spawn(shutdown.clone());

    let sink: BoxedSink = if dry_run {
        info!("Dry run: input is logged, not injected");
        Box::new(RecordingSink::verbose())
    } else {
        let mut device = VirtualInput::new(&config.device_name)
            .context("Is the uinput module loaded and /dev/uinput writable?")?;
        if let Some(path) = device.device_path() {
            info!("Device path: {}", path.display());
        }
        Box::new(device)
    };

    let mut app = App::new(
        config,
        store,
        notifier,
        sink,
        Box::new(|config: &AppConfig| -> Result<BoxedSource, serial::SourceError> {
            Ok(Box::new(serial::open(&config.serial)?))
        }),
    );

    if let Err(e) = app.connect() {
        error!("Receiver unavailable: {}", e);
        app.notify(Notice::new("Arduino not connected").then_exit());
        shutdown.cancelled().await;
        return Err(e).context("IR receiver not connected");
    }

    if headless {
        info!("Running in headless mode");
        app.set_actions_enabled(true);
        app.start_detection()?;
        info!("Press Ctrl+C to exit.");
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = app.detection_finished() => {
                error!("Receiver disconnected, exiting");
                anyhow::bail!("IR receiver disconnected");
            }
        }
    } else {
        console::run(&mut app, &shutdown).await?;
    }

    app.stop_detection();
    info!("Goodbye");
    Ok(())
}
