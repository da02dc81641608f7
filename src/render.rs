//! Calendar assembly: walks the grid once and lays down every shape.

use chrono::Datelike;
use log::debug;

use crate::config::CalendarConfig;
use crate::grid::{self, Canvas, Cell, CellKind, DayCell, CELL_HEIGHT, CELL_PADDING, CELL_WIDTH};
use crate::moon::{MoonState, PhaseTracker};
use crate::projection::{lit_path, Rotation};
use crate::svg::{Font, Paint, Shape, SvgDocument, Transform};
use crate::theme;

const MONTH_LABELS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Indexed by days from Sunday.
const DAY_NAMES: [&str; 7] = ["Su", "M", "Tu", "W", "Th", "F", "Sa"];

const MOON_BASE: &str = "#c1c1c1";
const MOON_LIT: &str = "#FFFFFF";
const ILLUMINATION_RADIUS: f64 = 20.0;
const PHASE_ICON_RADIUS: f64 = 7.0;

/// A finished SVG calendar and its canvas size.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCalendar {
    pub year: i32,
    pub width: f64,
    pub height: f64,
    pub svg: String,
}

impl RenderedCalendar {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Counters reported after each render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub day_cells: usize,
    pub blank_cells: usize,
    pub illumination_overlays: usize,
    pub phase_icons: usize,
}

/// State for one render call. Nothing here outlives the call.
pub struct RenderContext<'a> {
    config: &'a CalendarConfig,
    doc: SvgDocument,
    phases: PhaseTracker,
    current_row: Option<u32>,
    stats: RenderStats,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a CalendarConfig) -> Self {
        let canvas = Canvas::for_header(config.header_height);
        Self {
            config,
            doc: SvgDocument::new(canvas.width, canvas.height),
            phases: PhaseTracker::new(),
            current_row: None,
            stats: RenderStats::default(),
        }
    }

    fn year_header(&mut self) {
        let cfg = self.config;
        self.doc.push(Shape::Text {
            x: cfg.year_x,
            y: cfg.year_y,
            content: cfg.year().to_string(),
            font: Font {
                size: cfg.year_font_size.clone(),
                family: cfg.year_font_family.clone(),
                weight: Some(cfg.year_font_weight.clone()),
                fill: Some(cfg.year_fill.clone()),
            },
            class: "year",
            transform: None,
        });
    }

    fn visit(&mut self, cell: Cell) {
        if self.current_row != Some(cell.row) {
            self.current_row = Some(cell.row);
            self.phases.reset();
        }
        let (x, y) = grid::cell_origin(cell.row, cell.column, self.config.header_height);
        match cell.kind {
            CellKind::MonthLabel => self.month_label(cell.row, x, y),
            CellKind::Day(day) => {
                self.stats.day_cells += 1;
                self.day(&day, x, y);
            }
            CellKind::Blank => {
                self.stats.blank_cells += 1;
                self.grid_outline(x, y);
            }
        }
    }

    fn month_label(&mut self, row: u32, x: f64, y: f64) {
        let cfg = self.config;
        let transform = cfg.rotate_month_names.then_some(Transform::Rotate {
            angle: -25.0,
            cx: x,
            cy: y + 40.0,
        });
        self.doc.push(Shape::Text {
            x,
            y: y + 50.0,
            content: MONTH_LABELS[row as usize].to_string(),
            font: Font {
                size: cfg.month_name_font_size.clone(),
                family: cfg.month_name_font_family.clone(),
                weight: Some(cfg.month_name_font_weight.clone()),
                fill: Some(cfg.month_name_fill.clone()),
            },
            class: "month",
            transform,
        });
    }

    fn day(&mut self, day: &DayCell, x: f64, y: f64) {
        let cfg = self.config;
        self.doc.push(Shape::Rect {
            x,
            y,
            width: CELL_WIDTH,
            height: CELL_HEIGHT,
            paint: Paint::fill(theme::color_for(day, cfg)),
        });
        self.doc.push(Shape::Text {
            x: x + CELL_PADDING,
            y: y + 14.0,
            content: day.date.day().to_string(),
            font: small_font(None),
            class: "day-number",
            transform: None,
        });

        if cfg.show_day_names && !(cfg.hide_weekend_day_names && day.is_weekend) {
            let name = DAY_NAMES[day.weekday().num_days_from_sunday() as usize];
            self.doc.push(Shape::Text {
                x: x + CELL_PADDING,
                y: y + 64.0,
                content: name.to_string(),
                font: small_font(Some("bold")),
                class: "day-name",
                transform: None,
            });
        }

        let moon = (cfg.show_moon_illumination || cfg.show_moon_phase)
            .then(|| MoonState::for_date(day.date, cfg.latitude, cfg.longitude))
            .flatten();
        if let Some(moon) = moon {
            if cfg.show_moon_illumination {
                self.illumination(&moon, x, y);
            }
            if cfg.show_moon_phase {
                self.phase_icon(&moon, x, y);
            }
        }

        self.grid_outline(x, y);
    }

    fn illumination(&mut self, moon: &MoonState, x: f64, y: f64) {
        let at = Transform::Translate(x + 24.0, y + 42.0);
        let rotation = Rotation::new(moon.light_angle_degrees(), 0.0, moon.sky_rotation_degrees());
        self.moon_disc(ILLUMINATION_RADIUS, rotation, at);
        self.stats.illumination_overlays += 1;
    }

    fn phase_icon(&mut self, moon: &MoonState, x: f64, y: f64) {
        let Some(name) = moon.phase_name() else {
            return;
        };
        if !self.phases.admit(name) {
            return;
        }
        let at = Transform::Translate(x + 35.0, y + 12.0);
        self.moon_disc(PHASE_ICON_RADIUS, Rotation::new(moon.light_angle_degrees(), 0.0, 0.0), at);
        self.stats.phase_icons += 1;
    }

    /// Dark base, lit region, outline.
    fn moon_disc(&mut self, r: f64, rotation: Rotation, at: Transform) {
        self.doc.push(Shape::Circle {
            r,
            paint: Paint::fill(MOON_BASE),
            transform: at,
        });
        if let Some(d) = lit_path(r, rotation) {
            self.doc.push(Shape::Path {
                d,
                paint: Paint::fill(MOON_LIT),
                transform: at,
            });
        }
        self.doc.push(Shape::Circle {
            r,
            paint: Paint::outline(MOON_BASE),
            transform: at,
        });
    }

    fn grid_outline(&mut self, x: f64, y: f64) {
        if !self.config.show_grid {
            return;
        }
        self.doc.push(Shape::Rect {
            x,
            y,
            width: CELL_WIDTH,
            height: CELL_HEIGHT,
            paint: Paint::outline(self.config.grid_stroke.clone()),
        });
    }

    fn outer_border(&mut self) {
        if !self.config.show_grid {
            return;
        }
        self.doc.push(Shape::Rect {
            x: CELL_WIDTH,
            y: self.config.header_height - 1.0,
            width: CELL_WIDTH * (grid::COLUMNS - 1) as f64,
            height: CELL_HEIGHT * grid::ROWS as f64 + 2.0,
            paint: Paint::outline(self.config.grid_stroke.clone()).with_stroke_width(1.0),
        });
    }

    /// Consume the context and return the finished document.
    pub fn finish(self) -> (SvgDocument, RenderStats) {
        (self.doc, self.stats)
    }
}

fn small_font(weight: Option<&str>) -> Font {
    Font {
        size: "12px".to_string(),
        family: "Helvetica".to_string(),
        weight: weight.map(str::to_string),
        fill: None,
    }
}

/// Build the shape list for `config` without serializing it.
pub fn build_document(config: &CalendarConfig) -> (SvgDocument, RenderStats) {
    let mut ctx = RenderContext::new(config);
    ctx.year_header();
    grid::for_each_cell(config.year(), |cell| ctx.visit(cell));
    ctx.outer_border();
    ctx.finish()
}

/// Render a resolved configuration to a standalone SVG calendar.
pub fn render(config: &CalendarConfig) -> RenderedCalendar {
    if log::log_enabled!(log::Level::Debug) {
        match serde_json::to_string(config) {
            Ok(js) => debug!("Rendering calendar with config {}", js),
            Err(e) => debug!("Rendering calendar (config not serializable: {})", e),
        }
    }

    let (doc, stats) = build_document(config);
    let svg = doc.to_string();
    debug!(
        "Rendered {}: {} shapes, {} days, {} blank, {} illumination overlays, {} phase icons, {} bytes",
        config.year(),
        doc.len(),
        stats.day_cells,
        stats.blank_cells,
        stats.illumination_overlays,
        stats.phase_icons,
        svg.len()
    );

    RenderedCalendar {
        year: config.year(),
        width: doc.width,
        height: doc.height,
        svg,
    }
}

/// Shorthand for [`render`] returning only the SVG text.
pub fn render_svg(config: &CalendarConfig) -> String {
    render(config).svg
}
