//! Render options: the caller's sparse request and the fully resolved config.
//!
//! Requests are JSON objects with any subset of the recognized keys. Each key
//! is read and type-checked on its own so a bad request is reported field by
//! field; unknown keys are ignored and `null` counts as absent.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result, ValidationErrors};

/// Background color policy selected by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "vermontWeekends")]
    VermontWeekends,
    #[serde(rename = "rainbowWeekends")]
    RainbowWeekends,
    #[serde(rename = "rainbowDays1")]
    RainbowDays1,
    #[serde(rename = "rainbowDays2")]
    RainbowDays2,
    #[serde(rename = "rainbowDays3")]
    RainbowDays3,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::None,
        Theme::VermontWeekends,
        Theme::RainbowWeekends,
        Theme::RainbowDays1,
        Theme::RainbowDays2,
        Theme::RainbowDays3,
    ];

    /// Wire name, as accepted in the `theme` request key
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::None => "",
            Theme::VermontWeekends => "vermontWeekends",
            Theme::RainbowWeekends => "rainbowWeekends",
            Theme::RainbowDays1 => "rainbowDays1",
            Theme::RainbowDays2 => "rainbowDays2",
            Theme::RainbowDays3 => "rainbowDays3",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Theme::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<String> = Theme::ALL.iter().map(|t| format!("{:?}", t.as_str())).collect();
                format!("unknown theme {s:?}; expected one of {}", names.join(", "))
            })
    }
}

/// Fully resolved render options.
///
/// Every field is populated; construct one with [`resolve`] or start from
/// `CalendarConfig::default()` / [`CalendarConfig::for_year`]. Cell geometry is
/// fixed and lives in [`crate::grid`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConfig {
    pub header_height: f64,

    pub year_x: f64,
    pub year_y: f64,
    pub year_fill: String,
    pub year_font_size: String,
    pub year_font_family: String,
    pub year_font_weight: String,

    pub month_name_fill: String,
    pub month_name_font_size: String,
    pub month_name_font_family: String,
    pub month_name_font_weight: String,
    pub rotate_month_names: bool,

    #[serde(rename = "optHighlightWeekends")]
    pub highlight_weekends: bool,
    #[serde(rename = "optShowDayNames")]
    pub show_day_names: bool,
    pub hide_weekend_day_names: bool,

    pub theme: Theme,

    #[serde(rename = "optShowMoonIllumination")]
    pub show_moon_illumination: bool,
    #[serde(rename = "optShowMoonPhase")]
    pub show_moon_phase: bool,

    #[serde(rename = "optShowGrid")]
    pub show_grid: bool,
    pub grid_stroke: String,

    /// Observer latitude in degrees, used for the parallactic angle only
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Observer longitude in degrees (east positive)
    #[serde(rename = "lng")]
    pub longitude: f64,

    /// Anchors the displayed year
    pub start_date: NaiveDate,

    pub cell_background_color: String,
    pub weekend_background_color: String,
}

impl CalendarConfig {
    /// Defaults anchored on January 1st of `year`.
    pub fn for_year(year: i32) -> Self {
        Self {
            header_height: 100.0,
            year_x: 50.0,
            year_y: 80.0,
            year_fill: "#a1a1a1".to_string(),
            year_font_size: "80px".to_string(),
            year_font_family: "Helvetica".to_string(),
            year_font_weight: "bold".to_string(),
            month_name_fill: "#a1a1a1".to_string(),
            month_name_font_size: "20px".to_string(),
            month_name_font_family: "Helvetica".to_string(),
            month_name_font_weight: "bold".to_string(),
            rotate_month_names: false,
            highlight_weekends: false,
            show_day_names: false,
            hide_weekend_day_names: false,
            theme: Theme::None,
            show_moon_illumination: false,
            show_moon_phase: false,
            show_grid: false,
            grid_stroke: "#c1c1c1".to_string(),
            latitude: 44.25644,
            longitude: -72.26793,
            start_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default(),
            cell_background_color: "rgba(255, 255, 255, 0)".to_string(),
            weekend_background_color: "rgba(0, 0, 0, 0.1)".to_string(),
        }
    }

    /// The calendar year being drawn
    pub fn year(&self) -> i32 {
        self.start_date.year()
    }
}

impl Default for CalendarConfig {
    /// Defaults for the current local year.
    fn default() -> Self {
        Self::for_year(Local::now().year())
    }
}

/// Boolean flags accepted by older clients. The `theme` key supersedes them.
const LEGACY_FLAGS: &[&str] = &[
    "optRainbowDays1",
    "optRainbowDays2",
    "optRainbowDays3",
    "optRainbowWeekends",
    "optVermontWeekends",
    "optShowWeekendDayNames",
];

/// A sparse render request: `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialConfig {
    pub header_height: Option<f64>,
    pub year_x: Option<f64>,
    pub year_y: Option<f64>,
    pub year_fill: Option<String>,
    pub year_font_size: Option<String>,
    pub year_font_family: Option<String>,
    pub year_font_weight: Option<String>,
    pub month_name_fill: Option<String>,
    pub month_name_font_size: Option<String>,
    pub month_name_font_family: Option<String>,
    pub month_name_font_weight: Option<String>,
    pub rotate_month_names: Option<bool>,
    pub highlight_weekends: Option<bool>,
    pub show_day_names: Option<bool>,
    pub hide_weekend_day_names: Option<bool>,
    /// Raw theme name; checked against the closed set in [`resolve`]
    pub theme: Option<String>,
    pub show_moon_illumination: Option<bool>,
    pub show_moon_phase: Option<bool>,
    pub show_grid: Option<bool>,
    pub grid_stroke: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub cell_background_color: Option<String>,
    pub weekend_background_color: Option<String>,
}

impl PartialConfig {
    /// Parse a JSON request body.
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| Error::MalformedRequest(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Read the recognized keys out of a JSON object.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::MalformedRequest("request body must be a JSON object".into()))?;

        let mut r = FieldReader {
            map,
            errors: ValidationErrors::new(),
        };

        let partial = PartialConfig {
            header_height: r.read("headerHeight", "a number"),
            year_x: r.read("yearX", "a number"),
            year_y: r.read("yearY", "a number"),
            year_fill: r.read("yearFill", "a string"),
            year_font_size: r.read("yearFontSize", "a string"),
            year_font_family: r.read("yearFontFamily", "a string"),
            year_font_weight: r.read("yearFontWeight", "a string"),
            month_name_fill: r.read("monthNameFill", "a string"),
            month_name_font_size: r.read("monthNameFontSize", "a string"),
            month_name_font_family: r.read("monthNameFontFamily", "a string"),
            month_name_font_weight: r.read("monthNameFontWeight", "a string"),
            rotate_month_names: r.read("rotateMonthNames", "a boolean"),
            highlight_weekends: r.read("optHighlightWeekends", "a boolean"),
            show_day_names: r.read("optShowDayNames", "a boolean"),
            hide_weekend_day_names: r.read("hideWeekendDayNames", "a boolean"),
            theme: r.read("theme", "a string"),
            show_moon_illumination: r.read("optShowMoonIllumination", "a boolean"),
            show_moon_phase: r.read("optShowMoonPhase", "a boolean"),
            show_grid: r.read("optShowGrid", "a boolean"),
            grid_stroke: r.read("gridStroke", "a string"),
            latitude: r.read("lat", "a number"),
            longitude: r.read("lng", "a number"),
            start_date: r.date("startDate"),
            cell_background_color: r.read("cellBackgroundColor", "a string"),
            weekend_background_color: r.read("weekendBackgroundColor", "a string"),
        };

        for key in LEGACY_FLAGS.iter().filter(|k| map.contains_key(**k)) {
            debug!("ignoring legacy flag {key}; use the theme key instead");
        }

        if !r.errors.is_empty() {
            return Err(r.errors.into());
        }
        Ok(partial)
    }
}

struct FieldReader<'a> {
    map: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl FieldReader<'_> {
    fn read<T: DeserializeOwned>(&mut self, key: &str, expected: &str) -> Option<T> {
        match self.map.get(key) {
            None | Some(Value::Null) => None,
            Some(v) => match T::deserialize(v) {
                Ok(t) => Some(t),
                Err(_) => {
                    self.errors.push(key, format!("expected {expected}, got {v}"));
                    None
                }
            },
        }
    }

    fn date(&mut self, key: &str) -> Option<NaiveDate> {
        let raw: String = self.read(key, "a date string")?;
        match parse_start_date(&raw) {
            Some(d) => Some(d),
            None => {
                self.errors
                    .push(key, format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got {raw:?}"));
                None
            }
        }
    }
}

/// Accepts `2024-01-01` or `2024-01-01T00:00:00Z`.
pub fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Style values land in attributes verbatim, so markup characters are refused.
fn is_attribute_safe(value: &str) -> bool {
    !value.contains(['<', '&']) && !(value.contains('"') && value.contains('\''))
}

/// Merge `partial` over the default configuration.
pub fn resolve(partial: PartialConfig) -> Result<CalendarConfig> {
    resolve_over(CalendarConfig::default(), partial)
}

/// Merge `partial` over `base`: every key present replaces the base value.
///
/// Fails without touching anything when the theme is outside the closed set,
/// a numeric field is not finite, the header height is negative or a style
/// value carries markup.
pub fn resolve_over(base: CalendarConfig, partial: PartialConfig) -> Result<CalendarConfig> {
    let mut errors = ValidationErrors::new();

    let numbers = [
        ("headerHeight", partial.header_height),
        ("yearX", partial.year_x),
        ("yearY", partial.year_y),
        ("lat", partial.latitude),
        ("lng", partial.longitude),
    ];
    for (field, value) in numbers {
        if matches!(value, Some(v) if !v.is_finite()) {
            errors.push(field, "must be a finite number");
        }
    }
    if matches!(partial.header_height, Some(h) if h < 0.0) {
        errors.push("headerHeight", "must not be negative");
    }

    let styles = [
        ("yearFill", &partial.year_fill),
        ("yearFontSize", &partial.year_font_size),
        ("yearFontFamily", &partial.year_font_family),
        ("yearFontWeight", &partial.year_font_weight),
        ("monthNameFill", &partial.month_name_fill),
        ("monthNameFontSize", &partial.month_name_font_size),
        ("monthNameFontFamily", &partial.month_name_font_family),
        ("monthNameFontWeight", &partial.month_name_font_weight),
        ("gridStroke", &partial.grid_stroke),
        ("cellBackgroundColor", &partial.cell_background_color),
        ("weekendBackgroundColor", &partial.weekend_background_color),
    ];
    for (field, value) in styles {
        if matches!(value, Some(v) if !is_attribute_safe(v)) {
            errors.push(field, "must not contain '<', '&' or both kinds of quote");
        }
    }

    let theme = match partial.theme.as_deref().map(Theme::from_str) {
        Some(Ok(t)) => Some(t),
        Some(Err(msg)) => {
            errors.push("theme", msg);
            None
        }
        None => None,
    };

    if !errors.is_empty() {
        return Err(errors.into());
    }

    let mut cfg = base;

    macro_rules! merge {
        ($($field:ident),* $(,)?) => {
            $(if let Some(v) = partial.$field { cfg.$field = v; })*
        };
    }
    merge!(
        header_height,
        year_x,
        year_y,
        year_fill,
        year_font_size,
        year_font_family,
        year_font_weight,
        month_name_fill,
        month_name_font_size,
        month_name_font_family,
        month_name_font_weight,
        rotate_month_names,
        highlight_weekends,
        show_day_names,
        hide_weekend_day_names,
        show_moon_illumination,
        show_moon_phase,
        show_grid,
        grid_stroke,
        latitude,
        longitude,
        start_date,
        cell_background_color,
        weekend_background_color,
    );
    if let Some(t) = theme {
        cfg.theme = t;
    }

    Ok(cfg)
}
