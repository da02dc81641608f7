//! Low-precision lunar ephemeris.
//!
//! Sun and Moon positions come from the usual truncated series (a degree or
//! so of error), which is plenty for drawing a 40px moon. Angles are in
//! radians unless a name says otherwise.

use std::f64::consts::{PI, TAU};
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

const RAD: f64 = PI / 180.0;
const DAY_MS: f64 = 86_400_000.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
/// Obliquity of the ecliptic
const OBLIQUITY: f64 = RAD * 23.4397;
/// Mean Earth-Sun distance in km
const SUN_DISTANCE_KM: f64 = 149_598_000.0;

/// Hour of the evening each calendar day is observed at, in UTC-5.
const OBSERVATION_HOUR: u32 = 21;
const OBSERVATION_UTC_OFFSET_HOURS: i64 = -5;

/// Fixed local evening instant used for a calendar day. `None` when the
/// instant falls past the last representable date.
pub fn observation_instant(date: NaiveDate) -> Option<DateTime<Utc>> {
    let local = date.and_hms_opt(OBSERVATION_HOUR, 0, 0)?;
    let utc = local.checked_add_signed(Duration::hours(-OBSERVATION_UTC_OFFSET_HOURS))?;
    Some(Utc.from_utc_datetime(&utc))
}

fn days_since_j2000(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / DAY_MS - 0.5 + J1970 - J2000
}

fn right_ascension(l: f64, b: f64) -> f64 {
    (l.sin() * OBLIQUITY.cos() - b.tan() * OBLIQUITY.sin()).atan2(l.cos())
}

fn declination(l: f64, b: f64) -> f64 {
    (b.sin() * OBLIQUITY.cos() + b.cos() * OBLIQUITY.sin() * l.sin()).asin()
}

fn sidereal_time(d: f64, lw: f64) -> f64 {
    RAD * (280.16 + 360.985_623_5 * d) - lw
}

#[derive(Debug, Clone, Copy)]
struct Equatorial {
    ra: f64,
    dec: f64,
    /// km
    dist: f64,
}

fn sun_coords(d: f64) -> Equatorial {
    let m = RAD * (357.5291 + 0.985_600_28 * d);
    let center = RAD * (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin());
    let perihelion = RAD * 102.9372;
    let l = m + center + perihelion + PI;
    Equatorial {
        ra: right_ascension(l, 0.0),
        dec: declination(l, 0.0),
        dist: SUN_DISTANCE_KM,
    }
}

fn moon_coords(d: f64) -> Equatorial {
    let l0 = RAD * (218.316 + 13.176_396 * d);
    let m = RAD * (134.963 + 13.064_993 * d);
    let f = RAD * (93.272 + 13.229_350 * d);

    let l = l0 + RAD * 6.289 * m.sin();
    let b = RAD * 5.128 * f.sin();
    Equatorial {
        ra: right_ascension(l, b),
        dec: declination(l, b),
        dist: 385_001.0 - 20_905.0 * m.cos(),
    }
}

/// Illuminated part of the disc as seen from Earth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonIllumination {
    /// Lit fraction of the disc, 0..=1
    pub fraction: f64,
    /// Position in the synodic cycle: 0 new, 0.25 first quarter, 0.5 full, 0.75 last quarter
    pub phase: f64,
    /// Position angle of the bright limb's midpoint, east of north
    pub angle: f64,
}

pub fn illumination(at: DateTime<Utc>) -> MoonIllumination {
    let d = days_since_j2000(at);
    let s = sun_coords(d);
    let m = moon_coords(d);

    let elongation = (s.dec.sin() * m.dec.sin() + s.dec.cos() * m.dec.cos() * (s.ra - m.ra).cos())
        .clamp(-1.0, 1.0)
        .acos();
    let inc = (s.dist * elongation.sin()).atan2(m.dist - s.dist * elongation.cos());
    let angle = (s.dec.cos() * (s.ra - m.ra).sin())
        .atan2(s.dec.sin() * m.dec.cos() - s.dec.cos() * m.dec.sin() * (s.ra - m.ra).cos());

    let sign = if angle < 0.0 { -1.0 } else { 1.0 };
    MoonIllumination {
        fraction: (1.0 + inc.cos()) / 2.0,
        phase: 0.5 + 0.5 * inc * sign / PI,
        angle,
    }
}

/// Parallactic angle of the Moon for an observer (degrees in, radians out).
pub fn parallactic_angle(at: DateTime<Utc>, latitude: f64, longitude: f64) -> f64 {
    let lw = RAD * -longitude;
    let phi = RAD * latitude;
    let d = days_since_j2000(at);
    let c = moon_coords(d);
    let h = sidereal_time(d, lw) - c.ra;
    h.sin().atan2(phi.tan() * c.dec.cos() - c.dec.sin() * h.cos())
}

/// Coarse lunar phase used for the once-a-month phase icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhaseName {
    NewMoon,
    FirstQuarter,
    FullMoon,
    LastQuarter,
}

impl PhaseName {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseName::NewMoon => "new moon",
            PhaseName::FirstQuarter => "first quarter",
            PhaseName::FullMoon => "full moon",
            PhaseName::LastQuarter => "last quarter",
        }
    }

    /// Classify a cycle position. The value is rounded to three decimals
    /// before the (deliberately uneven) windows are applied.
    pub fn classify(phase: f64) -> Option<PhaseName> {
        let p = (phase * 1e3).round() / 1e3;
        if p <= 0.032 {
            Some(PhaseName::NewMoon)
        } else if (0.22..=0.30).contains(&p) {
            Some(PhaseName::FirstQuarter)
        } else if (0.475..=0.52).contains(&p) {
            Some(PhaseName::FullMoon)
        } else if (0.73..=0.76).contains(&p) {
            Some(PhaseName::LastQuarter)
        } else {
            None
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the overlays need to know about the Moon on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonState {
    pub illumination: MoonIllumination,
    pub parallactic_angle: f64,
}

impl MoonState {
    pub fn for_date(date: NaiveDate, latitude: f64, longitude: f64) -> Option<Self> {
        let at = observation_instant(date)?;
        Some(Self {
            illumination: illumination(at),
            parallactic_angle: parallactic_angle(at, latitude, longitude),
        })
    }

    pub fn illumination_fraction(&self) -> f64 {
        self.illumination.fraction
    }

    pub fn phase_angle_degrees(&self) -> f64 {
        self.illumination.angle.to_degrees()
    }

    pub fn parallactic_angle_degrees(&self) -> f64 {
        self.parallactic_angle.to_degrees()
    }

    /// Longitude the lit hemisphere is turned to: 180 at new moon, 0 at full.
    pub fn light_angle_degrees(&self) -> f64 {
        180.0 - self.illumination.phase * 360.0
    }

    /// Roll that lines the terminator up with the observer's horizon.
    pub fn sky_rotation_degrees(&self) -> f64 {
        -((self.illumination.angle - self.parallactic_angle) / TAU) * 360.0
    }

    pub fn phase_name(&self) -> Option<PhaseName> {
        PhaseName::classify(self.illumination.phase)
    }
}

/// Remembers which phase names already got an icon in the current month.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    shown: Vec<PhaseName>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time `name` is offered since the last reset.
    pub fn admit(&mut self, name: PhaseName) -> bool {
        if self.shown.contains(&name) {
            return false;
        }
        self.shown.push(name);
        true
    }

    pub fn reset(&mut self) {
        self.shown.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn observation_is_nine_pm_eastern_standard() {
        let at = observation_instant(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()).unwrap();
        assert_eq!(at.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(at.hour(), 2);
    }

    #[test]
    fn last_representable_day_has_no_observation() {
        assert!(observation_instant(NaiveDate::MAX).is_none());
        assert!(MoonState::for_date(NaiveDate::MAX, 44.25644, -72.26793).is_none());
        assert!(observation_instant(NaiveDate::MIN).is_some());
    }

    #[test]
    fn full_moon_january_2024() {
        let ill = illumination(utc(2024, 1, 25, 17, 54));
        assert!(ill.fraction > 0.98, "fraction {}", ill.fraction);
        assert!((ill.phase - 0.5).abs() < 0.03, "phase {}", ill.phase);
    }

    #[test]
    fn new_moon_january_2024() {
        let ill = illumination(utc(2024, 1, 11, 11, 57));
        assert!(ill.fraction < 0.02, "fraction {}", ill.fraction);
        assert!(ill.phase < 0.03 || ill.phase > 0.97, "phase {}", ill.phase);
    }

    #[test]
    fn first_quarter_january_2024() {
        let ill = illumination(utc(2024, 1, 18, 3, 53));
        assert!((ill.fraction - 0.5).abs() < 0.06, "fraction {}", ill.fraction);
        assert!((ill.phase - 0.25).abs() < 0.03, "phase {}", ill.phase);
    }

    #[test]
    fn bright_limb_angle_flips_sign_at_full_moon() {
        let waxing = illumination(utc(2024, 1, 15, 0, 0));
        let waning = illumination(utc(2024, 1, 30, 0, 0));
        assert!(waxing.phase < 0.5 && waning.phase > 0.5);
        assert!(waxing.angle.signum() != waning.angle.signum());
    }

    #[test]
    fn parallactic_angle_is_bounded() {
        for day in 1..=28 {
            let q = parallactic_angle(utc(2024, 2, day, 2, 0), 44.25644, -72.26793);
            assert!(q.abs() <= PI + 1e-12);
        }
    }

    #[test]
    fn classify_windows() {
        assert_eq!(PhaseName::classify(0.0), Some(PhaseName::NewMoon));
        assert_eq!(PhaseName::classify(0.032), Some(PhaseName::NewMoon));
        assert_eq!(PhaseName::classify(0.033), None);
        assert_eq!(PhaseName::classify(0.22), Some(PhaseName::FirstQuarter));
        assert_eq!(PhaseName::classify(0.30), Some(PhaseName::FirstQuarter));
        assert_eq!(PhaseName::classify(0.31), None);
        assert_eq!(PhaseName::classify(0.474), None);
        assert_eq!(PhaseName::classify(0.475), Some(PhaseName::FullMoon));
        assert_eq!(PhaseName::classify(0.52), Some(PhaseName::FullMoon));
        assert_eq!(PhaseName::classify(0.73), Some(PhaseName::LastQuarter));
        assert_eq!(PhaseName::classify(0.76), Some(PhaseName::LastQuarter));
        assert_eq!(PhaseName::classify(0.761), None);
        assert_eq!(PhaseName::classify(0.99), None);
    }

    #[test]
    fn classify_rounds_to_three_decimals() {
        assert_eq!(PhaseName::classify(0.0324), Some(PhaseName::NewMoon));
        assert_eq!(PhaseName::classify(0.2196), Some(PhaseName::FirstQuarter));
    }

    #[test]
    fn tracker_admits_each_name_once_per_reset() {
        let mut t = PhaseTracker::new();
        assert!(t.admit(PhaseName::FullMoon));
        assert!(!t.admit(PhaseName::FullMoon));
        assert!(t.admit(PhaseName::NewMoon));
        t.reset();
        assert!(t.admit(PhaseName::FullMoon));
    }

    #[test]
    fn moon_state_angles() {
        // full moon 2024-03-25 07:00 UTC, observed five hours earlier
        let s = MoonState::for_date(NaiveDate::from_ymd_opt(2024, 3, 24).unwrap(), 44.25644, -72.26793)
            .unwrap();
        assert!(s.light_angle_degrees().abs() < 15.0);
        assert_eq!(s.phase_name(), Some(PhaseName::FullMoon));
        assert!(s.sky_rotation_degrees().is_finite());
        assert!((0.0..=1.0).contains(&s.illumination_fraction()));
    }
}
