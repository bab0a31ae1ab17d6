//! Interactive command prompt
//!
//! Reads one command per line from stdin while detection runs in the
//! background. Type `help` for the command list.

use std::io::BufRead;
use std::thread;

use anyhow::Result;
use irplus_engine::{modes, ActionId, Bindings, Mode};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::app::App;
use crate::detector::StopToken;

const HELP: &str = "\
Commands:
  start            start listening to the receiver
  stop             stop listening
  enable           perform actions for received signals
  disable          only show received signals
  echo on|off      print every received signal
  save <action>    bind the last received signal to <action>
  list             show saved bindings
  actions          show action names
  reset            remove all bindings
  status           show detector state
  help             show this text
  quit             exit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Enable,
    Disable,
    Echo(bool),
    Save(ActionId),
    List,
    Actions,
    Reset,
    Status,
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let cmd = match word.to_lowercase().as_str() {
        "start" => Command::Start,
        "stop" => Command::Stop,
        "enable" => Command::Enable,
        "disable" => Command::Disable,
        "echo" => match rest {
            "on" => Command::Echo(true),
            "off" => Command::Echo(false),
            _ => return Err("usage: echo on|off".to_string()),
        },
        "save" => {
            if rest.is_empty() {
                return Err("usage: save <action>".to_string());
            }
            Command::Save(rest.parse().map_err(|e| format!("{}", e))?)
        }
        "list" => Command::List,
        "actions" => Command::Actions,
        "reset" => Command::Reset,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(cmd))
}

/// Run the prompt until `quit`, end of input, or a shutdown request.
pub async fn run(app: &mut App, shutdown: &StopToken) -> Result<()> {
    println!("IR + remote control. Type 'help' for commands.");
    let mut lines = spawn_stdin_reader()?;

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            debug!("stdin closed");
            break;
        };
        match parse_command(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => execute(app, cmd),
            Ok(None) => {}
            Err(msg) => println!("{}", msg),
        }
    }
    Ok(())
}

/// Read stdin on a detached thread so a pending read never holds up exit.
fn spawn_stdin_reader() -> std::io::Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("stdin read failed: {}", e);
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

fn execute(app: &mut App, cmd: Command) {
    match cmd {
        Command::Start => match app.start_detection() {
            Ok(true) => println!("Detection started"),
            Ok(false) => println!("Detection is already running"),
            Err(e) => error!("Cannot start detection: {:#}", e),
        },
        Command::Stop => {
            if app.stop_detection() {
                println!("Detection stopped");
            } else {
                println!("Detection is not running");
            }
        }
        Command::Enable => {
            app.set_actions_enabled(true);
            println!("Actions enabled");
        }
        Command::Disable => {
            app.set_actions_enabled(false);
            println!("Actions disabled");
        }
        Command::Echo(on) => app.set_echo(on),
        Command::Save(action) => match app.save(action) {
            Ok(Some(signal)) => println!("{} -> {}", signal, action),
            Ok(None) => println!("No signal received yet; press a remote button first"),
            Err(e) => error!("Failed to save binding: {}", e),
        },
        Command::List => print_bindings(&app.bindings()),
        Command::Actions => print_actions(),
        Command::Reset => match app.reset_bindings() {
            Ok(()) => println!("All bindings removed"),
            Err(e) => error!("Failed to reset bindings: {}", e),
        },
        Command::Status => {
            println!(
                "detection: {}",
                if app.is_running() { "running" } else { "stopped" }
            );
            println!(
                "actions:   {}",
                if app.actions_enabled() { "enabled" } else { "disabled" }
            );
            match app.last_seen() {
                Some(signal) => println!("last seen: {}", signal),
                None => println!("last seen: -"),
            }
            println!("bindings:  {}", app.store().path().display());
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

/// Print every binding, default action first
pub fn print_bindings(bindings: &Bindings) {
    if bindings.is_empty() {
        println!("No bindings saved");
        return;
    }
    for (signal, actions) in bindings.iter() {
        let names: Vec<&str> = actions.iter().map(|a| a.name()).collect();
        println!("{:<12} {}", signal.as_str(), names.join(", "));
    }
    let available = modes::available_modes(bindings);
    let names: Vec<&str> = available.iter().map(|m| m.display_name()).collect();
    if !names.is_empty() {
        println!();
        println!("Modes: {}", names.join(" -> "));
    }
}

/// Print action names grouped by mode
pub fn print_actions() {
    for mode in Mode::ALL {
        println!("{}:", mode);
        for action in mode.actions() {
            println!("  {}", action);
        }
    }
}
