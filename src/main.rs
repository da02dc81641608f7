mod cli;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use log::{info, warn};

use cli::{Cli, Command, RenderArgs, ServeArgs};
use wallcal::server::{CalendarService, HttpServer, ServerConfig, SharedConverter};
use wallcal::{new_converter, render, resolve, AsyncConverter, Converter, ConverterConfig, PartialConfig};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let res = match cli.command {
        Command::Render(args) => run_render(args),
        Command::Serve(args) => run_serve(args),
    };
    if let Err(e) = res {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise -v steps warn -> info -> debug -> trace.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn request_from_args(args: &RenderArgs) -> Result<PartialConfig> {
    let mut partial = match &args.config {
        Some(path) => {
            let body = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            PartialConfig::from_json(&body).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PartialConfig::default(),
    };

    if let Some(year) = args.year {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .with_context(|| format!("year {year} is out of range"))?;
        partial.start_date = Some(start);
    }
    if let Some(theme) = args.theme {
        partial.theme = Some(theme.as_str().to_string());
    }
    // flags only ever switch features on
    let switches = [
        (args.grid, &mut partial.show_grid),
        (args.day_names, &mut partial.show_day_names),
        (args.highlight_weekends, &mut partial.highlight_weekends),
        (args.moon_phase, &mut partial.show_moon_phase),
        (args.moon_illumination, &mut partial.show_moon_illumination),
    ];
    for (on, field) in switches {
        if on {
            *field = Some(true);
        }
    }
    Ok(partial)
}

fn run_render(args: RenderArgs) -> Result<()> {
    let config = resolve(request_from_args(&args)?)?;
    let calendar = render(&config);

    let bytes = if args.format.needs_converter() {
        let converter = new_converter(ConverterConfig::default())?;
        converter.convert(&calendar, args.format)?
    } else {
        calendar.svg.into_bytes()
    };

    let output = args.output.clone().or_else(|| {
        args.format
            .needs_converter()
            .then(|| PathBuf::from(args.format.attachment_filename()))
    });
    match output {
        Some(path) if path.as_os_str() != "-" => {
            fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        }
        _ => {
            let mut out = io::stdout().lock();
            out.write_all(&bytes)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn server_converter() -> Option<SharedConverter> {
    match AsyncConverter::start(|| new_converter(ConverterConfig::default())) {
        Ok(handle) => Some(Arc::new(handle)),
        Err(e) => {
            warn!("PNG/PDF output disabled: {}", e);
            None
        }
    }
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        workers: args.workers.unwrap_or(defaults.workers),
    };
    let service = CalendarService::new(server_converter());
    let server = HttpServer::bind(&config, service)?;
    info!("wallcal {} serving on http://{}", env!("CARGO_PKG_VERSION"), config.addr());
    server.run()?;
    Ok(())
}
