use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wallcal::{OutputFormat, Theme};

/// One-page year wall calendar renderer.
#[derive(Parser)]
#[command(name = "wallcal", version, about = "Render one-page year wall calendars")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render a calendar to a file or stdout.
    Render(RenderArgs),
    /// Serve calendars over HTTP.
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct RenderArgs {
    /// JSON file with render options (same keys as the HTTP body).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Calendar year; overrides startDate from the config file.
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Background theme.
    #[arg(short, long, value_parser = parse_theme)]
    pub theme: Option<Theme>,

    /// Outline every cell.
    #[arg(long)]
    pub grid: bool,

    /// Print weekday names.
    #[arg(long)]
    pub day_names: bool,

    /// Shade weekends.
    #[arg(long)]
    pub highlight_weekends: bool,

    /// Mark new, quarter and full moons once per month.
    #[arg(long)]
    pub moon_phase: bool,

    /// Draw the lit part of the moon on every day.
    #[arg(long)]
    pub moon_illumination: bool,

    /// svg, png or pdf (png and pdf need the `cdp` feature).
    #[arg(short, long, default_value = "svg", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Output path; `-` is stdout. Defaults to stdout for SVG and
    /// `calendar-<date>.<ext>` otherwise.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Request worker threads (defaults to the number of CPUs).
    #[arg(short, long)]
    pub workers: Option<usize>,
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    s.parse()
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse().map_err(|e: wallcal::Error| e.to_string())
}
