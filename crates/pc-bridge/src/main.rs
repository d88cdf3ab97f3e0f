//! pc-replay: drive a canvas session from newline-delimited JSON.
//!
//! Reads one client message per line from stdin and prints every
//! resulting server event as one JSON line on stdout. Useful for
//! scripted sessions and for checking engine behaviour by hand:
//!
//! ```text
//! pc-replay [config.toml] < session.jsonl
//! pc-replay --print-config [config.toml]
//! ```
//!
//! `--print-config` writes the effective configuration as TOML and exits.
//!
//! Logging goes to stderr; `RUST_LOG` overrides the configured filter.

use pc_bridge::{ServerEvent, Session};
use pc_editor::EngineConfig;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

fn emit(out: &mut impl Write, event: &ServerEvent) -> io::Result<()> {
    let line = serde_json::to_string(event).map_err(io::Error::other)?;
    writeln!(out, "{line}")
}

fn run(config: EngineConfig) -> io::Result<()> {
    let mut session = Session::new(config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(event) = session.initial_state() {
        emit(&mut out, &event)?;
    }
    for (n, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        log::debug!("line {}: {line}", n + 1);
        for event in session.handle_text(&line) {
            emit(&mut out, &event)?;
        }
    }
    out.flush()
}

fn main() -> ExitCode {
    let mut print_config = false;
    let mut config_path = None;
    for arg in std::env::args_os().skip(1) {
        if arg == "--print-config" {
            print_config = true;
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }

    let config = match config_path {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("pc-replay: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    if print_config {
        return match config.to_toml_string() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("pc-replay: {err}");
                ExitCode::FAILURE
            }
        };
    }

    env_logger::Builder::new()
        .parse_filters(&config.log_filter)
        .parse_default_env()
        .init();
    log::info!("pc-replay v{} ready", env!("CARGO_PKG_VERSION"));

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("pc-replay: {err}");
            ExitCode::FAILURE
        }
    }
}
