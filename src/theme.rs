//! Per-day background color policy.
//!
//! The policy is an ordered list of rules. Every rule whose predicate holds
//! would paint the cell; the last one in list order wins. A cell no rule
//! claims keeps `cellBackgroundColor`.

use chrono::Datelike;
use log::warn;

use crate::config::{CalendarConfig, Theme};
use crate::grid::{DayCell, COLUMNS, ROWS};

/// One entry of the color policy.
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&DayCell, &CalendarConfig) -> bool,
    /// `None` means the rule matched but could not produce a color
    pub color: fn(&DayCell, &CalendarConfig) -> Option<String>,
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "rainbowDays1",
        applies: |_, cfg| cfg.theme == Theme::RainbowDays1,
        color: |day, _| {
            let hue = day.weekday().num_days_from_sunday() as f64 * 30.0;
            Some(hsl(hue, 100.0, 90.0))
        },
    },
    Rule {
        name: "rainbowDays2",
        applies: |_, cfg| cfg.theme == Theme::RainbowDays2,
        color: |day, _| Some(hsl(day_of_month_hue(day), 100.0, 50.0)),
    },
    Rule {
        name: "rainbowDays3",
        applies: |_, cfg| cfg.theme == Theme::RainbowDays3,
        color: |day, _| {
            let d = corner_distance(day);
            let lightness = RAINBOW3_LIGHTNESS.0 + (1.0 - d) * (RAINBOW3_LIGHTNESS.1 - RAINBOW3_LIGHTNESS.0);
            Some(hsl(d * 360.0, 100.0, lightness))
        },
    },
    Rule {
        name: "highlightWeekends",
        applies: |day, cfg| day.is_weekend && cfg.highlight_weekends,
        color: |_, cfg| Some(cfg.weekend_background_color.clone()),
    },
    Rule {
        name: "rainbowWeekends",
        applies: |day, cfg| day.is_weekend && cfg.theme == Theme::RainbowWeekends,
        color: |day, _| Some(hsl(day_of_month_hue(day), 100.0, 90.0)),
    },
    Rule {
        name: "vermontWeekends",
        applies: |day, cfg| day.is_weekend && cfg.theme == Theme::VermontWeekends,
        color: |day, _| vermont_color(day.date.month0(), day.weekend_index).map(str::to_string),
    },
];

/// Lightness range for `rainbowDays3`; both ends are equal so the lightness is flat.
const RAINBOW3_LIGHTNESS: (f64, f64) = (80.0, 80.0);

/// The rule that decides this cell's color, if any.
pub fn winning_rule(day: &DayCell, config: &CalendarConfig) -> Option<&'static Rule> {
    RULES.iter().rev().find(|r| (r.applies)(day, config))
}

/// Background color for a day cell.
pub fn color_for(day: &DayCell, config: &CalendarConfig) -> String {
    let Some(rule) = winning_rule(day, config) else {
        return config.cell_background_color.clone();
    };
    (rule.color)(day, config).unwrap_or_else(|| {
        warn!(
            "{} has no color for {} (weekend #{}); using the cell background",
            rule.name, day.date, day.weekend_index
        );
        config.cell_background_color.clone()
    })
}

pub fn hsl(hue: f64, saturation: f64, lightness: f64) -> String {
    format!("hsl({hue}, {saturation}%, {lightness}%)")
}

fn day_of_month_hue(day: &DayCell) -> f64 {
    (day.date.day() as f64 / 30.0) * 360.0
}

/// Distance from the bottom-right corner of the day grid, normalized by the
/// grid diagonal.
fn corner_distance(day: &DayCell) -> f64 {
    let dm = (ROWS - 1) as f64 - day.date.month0() as f64;
    let dd = (COLUMNS - 2) as f64 - day.date.day() as f64;
    let diagonal = (ROWS as f64).hypot((COLUMNS - 1) as f64);
    dm.hypot(dd) / diagonal
}

pub fn vermont_color(month0: u32, weekend_index: usize) -> Option<&'static str> {
    VERMONT_WEEKENDS
        .get(month0 as usize)
        .and_then(|row| row.get(weekend_index))
        .copied()
}

/// Seasonal weekend colors, one row per month.
pub static VERMONT_WEEKENDS: [&[&str]; 12] = [
    // snowy and frosty
    &[
        "#FFFFFF", "#E8F1F2", "#BBD5DA", "#95A5A6", "#D9E4DD", "#4D6D9A", "#597D35", "#154406",
        "#FFD700", "#A4978E",
    ],
    // late winter
    &[
        "#F0F8FF", "#E0FFFF", "#5F9EA0", "#4682B4", "#6495ED", "#2E8B57", "#6B8E23", "#B0C4DE",
        "#BC8F8F", "#FFDAB9",
    ],
    // snow melt, fresh greens
    &[
        "#E9F7EF", "#D4EFDF", "#A9DFBF", "#7DCEA0", "#52BE80", "#3498DB", "#85C1E9", "#AED6F1",
        "#D6DBDF", "#6a00c46c",
    ],
    // clear skies
    &[
        "#EAF2F8", "#D4E6F1", "#AED6F1", "#85C1E9", "#5499C7", "#48C9B0", "#76D7C4", "#A2D9CE",
        "#EBF5FB", "#B3B6B7",
    ],
    &[
        "#E8F6F3", "#D0ECE7", "#A2D9CE", "#73C6B6", "#45B39D", "#58D68D", "#82E0AA", "#ABEBC6",
        "#D5F5E3", "#FEF9E7",
    ],
    // maple leaves
    &[
        "#006400", "#228B22", "#32CD32", "#90EE90", "#8FBC8F", "#556B2F", "#7CFC00", "#ADFF2F",
        "#9ACD32", "#00FF00",
    ],
    &[
        "#01632C", "#228B22", "#006400", "#3CB371", "#2E8B57", "#66CDAA", "#8FBC8B", "#20B2AA",
        "#32CD32", "#98FB98",
    ],
    // late summer into fall
    &[
        "#F5CBA7", "#F0B27A", "#EB984E", "#E67E22", "#CA6F1E", "#AF601A", "#935116", "#784212",
        "#6E2C00", "#566573",
    ],
    &[
        "#FAD7A0", "#F8C471", "#F5B041", "#F39C12", "#D68910", "#B9770E", "#9C640C", "#7E5109",
        "#6E2C00", "#1A5276",
    ],
    // peak foliage
    &[
        "#FF4500", "#FF8C00", "#FFD700", "#DAA520", "#8B4513", "#A0522D", "#CD853F", "#DEB887",
        "#C0C0C0", "#808080",
    ],
    // bare trees
    &[
        "#f5f5f5", "#e5e5e5", "#cdcdcd", "#b2b2b2", "#a1a1a1", "#9a9a9a", "#898989", "#818181",
        "#797979", "#747474",
    ],
    // early winter
    &[
        "#a1a1a1", "#9a9a9a", "#898989", "#818181", "#797979", "#747474", "#6e6e6e", "#686868",
        "#626262",
    ],
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32, weekend_index: usize) -> DayCell {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        DayCell {
            date,
            is_weekend: crate::grid::is_weekend(date.weekday()),
            weekend_index,
        }
    }

    fn cfg(theme: Theme) -> CalendarConfig {
        CalendarConfig {
            theme,
            ..CalendarConfig::for_year(2024)
        }
    }

    #[test]
    fn no_theme_uses_cell_background() {
        let c = cfg(Theme::None);
        assert_eq!(color_for(&day(2024, 1, 3, 0), &c), c.cell_background_color);
        assert_eq!(color_for(&day(2024, 1, 6, 0), &c), c.cell_background_color);
        assert!(winning_rule(&day(2024, 1, 6, 0), &c).is_none());
    }

    #[test]
    fn highlight_weekends_only_touches_weekends() {
        let c = CalendarConfig {
            highlight_weekends: true,
            ..cfg(Theme::None)
        };
        // 2024-01-06 is a Saturday, 2024-01-05 a Friday
        assert_eq!(color_for(&day(2024, 1, 6, 0), &c), "rgba(0, 0, 0, 0.1)");
        assert_eq!(color_for(&day(2024, 1, 5, 0), &c), "rgba(255, 255, 255, 0)");
    }

    #[test]
    fn rainbow_days_1_uses_weekday() {
        let c = cfg(Theme::RainbowDays1);
        // Wednesday
        assert_eq!(color_for(&day(2024, 1, 3, 0), &c), "hsl(90, 100%, 90%)");
        // Sunday
        assert_eq!(color_for(&day(2024, 1, 7, 1), &c), "hsl(0, 100%, 90%)");
    }

    #[test]
    fn rainbow_days_2_uses_day_of_month() {
        let c = cfg(Theme::RainbowDays2);
        assert_eq!(color_for(&day(2024, 3, 15, 0), &c), "hsl(180, 100%, 50%)");
    }

    #[test]
    fn rainbow_days_3_has_flat_lightness() {
        let c = cfg(Theme::RainbowDays3);
        let corner = color_for(&day(2024, 12, 30, 0), &c);
        assert_eq!(corner, "hsl(0, 100%, 80%)");
        for (m, d) in [(1, 1), (6, 15), (9, 3)] {
            let color = color_for(&day(2024, m, d, 0), &c);
            assert!(color.ends_with(", 100%, 80%)"), "{color}");
        }
    }

    #[test]
    fn weekend_themes_override_day_themes_and_highlight() {
        let c = CalendarConfig {
            highlight_weekends: true,
            ..cfg(Theme::RainbowWeekends)
        };
        let sat = day(2024, 3, 9, 2);
        assert_eq!(winning_rule(&sat, &c).unwrap().name, "rainbowWeekends");
        assert_eq!(color_for(&sat, &c), "hsl(108, 100%, 90%)");

        let c = CalendarConfig {
            highlight_weekends: true,
            ..cfg(Theme::RainbowDays2)
        };
        assert_eq!(winning_rule(&sat, &c).unwrap().name, "highlightWeekends");
    }

    #[test]
    fn vermont_weekends_index_by_weekend_ordinal() {
        let c = cfg(Theme::VermontWeekends);
        assert_eq!(color_for(&day(2024, 10, 5, 0), &c), "#FF4500");
        assert_eq!(color_for(&day(2024, 10, 6, 1), &c), "#FF8C00");
        // weekday keeps the default
        assert_eq!(color_for(&day(2024, 10, 7, 2), &c), c.cell_background_color);
    }

    #[test]
    fn vermont_overrun_falls_back_to_cell_background() {
        let c = cfg(Theme::VermontWeekends);
        // December 2029 starts on a Saturday and has ten weekend days
        let last = day(2029, 12, 30, 9);
        assert!(last.is_weekend);
        assert_eq!(vermont_color(11, 9), None);
        assert_eq!(color_for(&last, &c), c.cell_background_color);
    }

    #[test]
    fn palette_rows_are_long_enough_except_december() {
        for (m, row) in VERMONT_WEEKENDS.iter().enumerate() {
            let expected = if m == 11 { 9 } else { 10 };
            assert_eq!(row.len(), expected, "month {m}");
            assert!(row.iter().all(|c| c.starts_with('#')));
        }
    }

    #[test]
    fn color_policy_is_deterministic() {
        for theme in Theme::ALL {
            let c = cfg(theme);
            let d = day(2024, 5, 18, 4);
            assert_eq!(color_for(&d, &c), color_for(&d, &c));
        }
    }
}
