//! Output formats and the converter seam for raster/print output.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::render::RenderedCalendar;

/// What the caller wants back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Png => "image/png",
            OutputFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// Whether producing this format needs a [`Converter`] backend
    pub fn needs_converter(self) -> bool {
        !matches!(self, OutputFormat::Svg)
    }

    /// `calendar-<date>.<ext>`
    pub fn attachment_filename_on(self, date: NaiveDate) -> String {
        format!("calendar-{}.{}", date.format("%Y-%m-%d"), self.extension())
    }

    /// Download name stamped with today's UTC date.
    pub fn attachment_filename(self) -> String {
        self.attachment_filename_on(Utc::now().date_naive())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Print settings for the PDF output and limits for the conversion backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterConfig {
    /// Upper bound for a single page load
    pub timeout: Duration,
    /// Paper size in inches (A1 by default)
    pub paper_width_in: f64,
    pub paper_height_in: f64,
    pub landscape: bool,
    pub scale: f64,
    pub print_background: bool,
    /// Launch the browser without its sandbox (needed in most containers)
    pub sandbox: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            paper_width_in: 23.39,
            paper_height_in: 33.11,
            landscape: true,
            scale: 2.0,
            print_background: true,
            sandbox: false,
        }
    }
}

/// Turns a rendered calendar into bytes of the requested format.
pub trait Converter {
    /// Produce raster or print output. Implementations only need to handle
    /// the formats for which [`OutputFormat::needs_converter`] is true.
    fn rasterize(&self, calendar: &RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>>;

    /// SVG passes through unchanged; everything else goes to [`Converter::rasterize`].
    fn convert(&self, calendar: &RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Svg => Ok(calendar.svg.as_bytes().to_vec()),
            other => self.rasterize(calendar, other),
        }
    }
}

impl<C: Converter + ?Sized> Converter for Box<C> {
    fn rasterize(&self, calendar: &RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>> {
        (**self).rasterize(calendar, format)
    }
}

impl<C: Converter + ?Sized> Converter for std::sync::Arc<C> {
    fn rasterize(&self, calendar: &RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>> {
        (**self).rasterize(calendar, format)
    }
}

/// Minimal HTML page that shows the SVG at its natural size with no margins.
pub fn html_wrapper(calendar: &RenderedCalendar) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>\
         html,body{{margin:0;padding:0;background:#fff}}svg{{display:block}}\
         </style></head><body>{}</body></html>",
        calendar.svg
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fails;

    impl Converter for Fails {
        fn rasterize(&self, _: &RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>> {
            Err(Error::ConversionError(format!("no {format}")))
        }
    }

    fn calendar() -> RenderedCalendar {
        RenderedCalendar {
            year: 2024,
            width: 10.0,
            height: 10.0,
            svg: "<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>".to_string(),
        }
    }

    #[test]
    fn parse_formats() {
        assert_eq!("svg".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
        assert_eq!("PNG".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!(" pdf ".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert!(matches!(
            "gif".parse::<OutputFormat>(),
            Err(Error::UnsupportedFormat(f)) if f == "gif"
        ));
    }

    #[test]
    fn content_types_and_filenames() {
        assert_eq!(OutputFormat::Svg.content_type(), "image/svg+xml");
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
        assert_eq!(OutputFormat::Pdf.content_type(), "application/pdf");
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(OutputFormat::Pdf.attachment_filename_on(d), "calendar-2024-03-07.pdf");
        assert!(OutputFormat::Png.attachment_filename().starts_with("calendar-"));
    }

    #[test]
    fn svg_passes_through_without_backend() {
        let cal = calendar();
        assert_eq!(Fails.convert(&cal, OutputFormat::Svg).unwrap(), cal.svg.as_bytes());
        assert!(matches!(
            Fails.convert(&cal, OutputFormat::Png),
            Err(Error::ConversionError(_))
        ));
    }

    #[test]
    fn default_print_settings_are_a1_landscape_double_scale() {
        let c = ConverterConfig::default();
        assert!(c.landscape);
        assert_eq!(c.scale, 2.0);
        assert_eq!((c.paper_width_in, c.paper_height_in), (23.39, 33.11));
    }

    #[test]
    fn wrapper_embeds_document() {
        let cal = calendar();
        let html = html_wrapper(&cal);
        assert!(html.contains(&cal.svg));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
