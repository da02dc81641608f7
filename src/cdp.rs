//! Headless Chrome converter (DevTools Protocol via `headless_chrome`)

use std::sync::{Arc, Mutex};

use base64::Engine as Base64Engine;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info};

use crate::convert::{html_wrapper, Converter, ConverterConfig, OutputFormat};
use crate::error::{Error, Result};
use crate::grid::Canvas;
use crate::render::RenderedCalendar;

/// Rasterizes calendars in a single long-lived Chrome tab.
///
/// The browser is launched once; documents are loaded as `data:` URLs so no
/// files or local server are involved. Calls are serialized on the tab.
pub struct CdpConverter {
    // kept alive for as long as the tab is in use
    _browser: Browser,
    tab: Mutex<Arc<Tab>>,
    config: ConverterConfig,
}

impl CdpConverter {
    pub fn new(config: ConverterConfig) -> Result<Self> {
        // Big enough for the default canvas; taller calendars are clipped in
        // the screenshot call instead.
        let (w, h) = Canvas::for_header(100.0).pixel_size();
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .window_size(Some((w, h)))
            .idle_browser_timeout(config.timeout * 10)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(config.timeout);

        info!("Headless Chrome ready ({}x{} window)", w, h);
        Ok(Self {
            _browser: browser,
            tab: Mutex::new(tab),
            config,
        })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    fn load(&self, tab: &Tab, calendar: &RenderedCalendar) -> Result<()> {
        let html = html_wrapper(calendar);
        let url = format!(
            "data:text/html;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(html.as_bytes())
        );
        debug!("Loading {} byte document into Chrome", url.len());

        tab.navigate_to(&url)
            .map_err(|e| Error::ConversionError(format!("Navigation failed: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| Error::ConversionError(format!("Wait for navigation failed: {}", e)))?;
        Ok(())
    }

    fn screenshot(&self, tab: &Tab, calendar: &RenderedCalendar) -> Result<Vec<u8>> {
        let (w, h) = calendar.canvas().pixel_size();
        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: w as f64,
            height: h as f64,
            scale: 1.0,
        };
        tab.capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| Error::ConversionError(format!("Screenshot failed: {}", e)))
    }

    fn pdf(&self, tab: &Tab) -> Result<Vec<u8>> {
        let options = PrintToPdfOptions {
            landscape: Some(self.config.landscape),
            print_background: Some(self.config.print_background),
            scale: Some(self.config.scale),
            paper_width: Some(self.config.paper_width_in),
            paper_height: Some(self.config.paper_height_in),
            ..Default::default()
        };
        tab.print_to_pdf(Some(options))
            .map_err(|e| Error::ConversionError(format!("PDF printing failed: {}", e)))
    }
}

impl Converter for CdpConverter {
    fn rasterize(&self, calendar: &RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>> {
        let tab = self
            .tab
            .lock()
            .map_err(|_| Error::ConversionError("Chrome tab lock poisoned".into()))?;
        self.load(&tab, calendar)?;
        let bytes = match format {
            OutputFormat::Png => self.screenshot(&tab, calendar)?,
            OutputFormat::Pdf => self.pdf(&tab)?,
            OutputFormat::Svg => calendar.svg.as_bytes().to_vec(),
        };
        debug!("Chrome produced {} bytes of {}", bytes.len(), format);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdp_converter_creation() {
        // This test requires Chrome to be installed, so we skip it in CI
        if std::env::var("CI").is_ok() {
            return;
        }
        if let Err(e) = CdpConverter::new(ConverterConfig::default()) {
            eprintln!("Skipping CDP converter test because Chrome is not available: {}", e);
        }
    }
}
