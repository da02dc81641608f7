//! Wallcal
//!
//! Renders a one-page wall calendar for a whole year as a standalone SVG:
//! twelve month rows of up to 31 day cells, with optional weekday names,
//! themed backgrounds, a cell grid and moon overlays computed for an
//! observer's location.
//!
//! # Features
//!
//! - **SVG core**: pure and deterministic, no I/O
//! - **CDP backend** (`cdp` feature): PNG and PDF output through headless Chrome
//! - **HTTP front end**: a small `tiny_http` server around the renderer
//!
//! # Example
//!
//! ```no_run
//! use wallcal::{render, resolve, PartialConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let partial = PartialConfig::from_json(r#"{"theme": "vermontWeekends", "optShowGrid": true}"#)?;
//! let config = resolve(partial)?;
//! let calendar = render(&config);
//! std::fs::write("calendar.svg", calendar.svg)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, FieldError, Result, ValidationErrors};

pub mod config;
pub mod grid;
pub mod moon;
pub mod projection;
pub mod render;
pub mod svg;
pub mod theme;

pub mod convert;
pub mod server;

// Headless Chrome backend for PNG/PDF
#[cfg(feature = "cdp")]
pub mod cdp;

// Worker-thread wrapper usable from async code and from plain threads
pub mod async_api;

pub use async_api::AsyncConverter;
pub use config::{resolve, resolve_over, CalendarConfig, PartialConfig, Theme};
pub use convert::{Converter, ConverterConfig, OutputFormat};
pub use render::{render, render_svg, RenderedCalendar};

/// Parse a JSON request body, resolve it and render the calendar.
pub fn render_request(body: &str) -> Result<RenderedCalendar> {
    let config = resolve(PartialConfig::from_json(body)?)?;
    Ok(render(&config))
}

/// Create the converter compiled into this build.
#[cfg(feature = "cdp")]
pub fn new_converter(config: ConverterConfig) -> Result<Box<dyn Converter>> {
    Ok(Box::new(cdp::CdpConverter::new(config)?))
}

/// Create the converter compiled into this build.
#[cfg(not(feature = "cdp"))]
pub fn new_converter(_config: ConverterConfig) -> Result<Box<dyn Converter>> {
    Err(Error::ConversionUnavailable)
}
