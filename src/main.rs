//! Command-line front end for the eyeshade engine.
//!
//! Subcommands:
//! - `invert <COLOR>` prints the lightness-inverted `rgba(...)` of a CSS color,
//!   or `unknown` with exit code 2 when the color cannot be parsed
//! - `filter <BRIGHTNESS>` prints the brightness-filter stylesheet
//! - `status` prints the effective feature states of a settings file
//!
//! # Environment Variables
//!
//! - `DEBUG`: When set, enables debug output to stderr.
//! - `RUST_LOG`: Overrides the log filter entirely.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};

use eyeshade::color::parse_color;
use eyeshade::filter::BrightnessFilter;
use eyeshade::logs;
use eyeshade::schedule::{TimeOfDay, check_schedule};
use eyeshade::settings::{FileStore, Settings, SettingsStore};

/// Eye-strain reduction toolkit.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Invert the lightness of an `rgb()`/`rgba()` color.
    Invert {
        /// Color string, e.g. "rgb(255, 255, 255)".
        color: String,
    },
    /// Print the brightness filter stylesheet.
    Filter {
        /// Brightness percentage (clamped to 1-200).
        #[arg(allow_negative_numbers = true)]
        brightness: i64,
    },
    /// Show which features a settings snapshot turns on.
    Status {
        /// Settings JSON file; defaults are used when omitted.
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Evaluate the schedule at this time (HH:MM) instead of now.
        #[arg(long)]
        at: Option<String>,
        /// Write the schedule's tint decision back to the settings file.
        #[arg(long, requires = "settings")]
        save: bool,
    },
}

fn main() -> ExitCode {
    logs::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Invert { color } => {
            let Some(parsed) = parse_color(&color) else {
                tracing::debug!(%color, "unrecognized color");
                print!("unknown");
                return Ok(ExitCode::from(2));
            };
            println!("{}", parsed.invert_lightness().to_css());
        }
        Command::Filter { brightness } => {
            println!("{}", BrightnessFilter::new(brightness).css());
        }
        Command::Status { settings, at, save } => {
            let now = match at {
                Some(at) => TimeOfDay::parse(&at)?,
                None => TimeOfDay::from_time(Local::now().time()),
            };
            let mut store = settings.map(FileStore::new);
            let snapshot = match &store {
                Some(store) => store.get()?,
                None => Settings::default(),
            };
            let snapshot = match check_schedule(&snapshot, now)? {
                Some(updated) => {
                    if let (true, Some(store)) = (save, store.as_mut()) {
                        store.set(updated.clone())?;
                    }
                    updated
                }
                None => snapshot,
            };
            print_status(&snapshot.sanitized(), now);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_status(s: &Settings, now: TimeOfDay) {
    let flag = |on: bool| if on { "on" } else { "off" };
    println!("time: {now}");
    println!("master: {}", flag(s.master_enabled));
    println!(
        "color-temp: {} (intensity {})",
        flag(s.color_temp_effective()),
        s.color_temp.intensity
    );
    println!(
        "dark-mode: {} (brightness {})",
        flag(s.dark_mode_effective()),
        s.dark_mode.brightness
    );
    println!(
        "break-reminder: {} (every {} min)",
        flag(s.break_reminder_effective()),
        s.break_reminder.interval_min
    );
    println!(
        "schedule: {} ({}-{})",
        flag(s.schedule.enabled),
        s.schedule.start_time,
        s.schedule.end_time
    );
}
