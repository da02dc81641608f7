//! Orthographic view of a half-lit sphere.
//!
//! The lit hemisphere starts centered on longitude 0, latitude 0 (facing the
//! viewer) and is turned by a [`Rotation`]. What remains visible is bounded by
//! half of the limb and the near half of the terminator, which projects to a
//! half ellipse. Coordinates come out in SVG space: disc centered on the
//! origin, y pointing down.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use ::svg::node::element::path::Data;

/// Angular step between outline vertices, in degrees.
const STEP_DEGREES: f64 = 6.0;

/// Sphere rotation in degrees: `lambda` spins around the polar axis, `phi`
/// tilts toward the viewer and `gamma` rolls around the line of sight.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation {
    pub lambda: f64,
    pub phi: f64,
    pub gamma: f64,
}

impl Rotation {
    pub fn new(lambda: f64, phi: f64, gamma: f64) -> Self {
        Self { lambda, phi, gamma }
    }

    /// Where the lit hemisphere's center ends up, as `[right, up, toward viewer]`.
    pub fn light_direction(&self) -> [f64; 3] {
        let (l, p, g) = (
            self.lambda.to_radians(),
            self.phi.to_radians(),
            self.gamma.to_radians(),
        );
        // x toward the viewer, y toward longitude 90, z toward the north pole
        let (x, y, z) = (l.cos(), l.sin(), 0.0);
        let k = z * p.cos() + x * p.sin();
        let x = x * p.cos() - z * p.sin();
        let (y, z) = (y * g.cos() - k * g.sin(), k * g.cos() + y * g.sin());
        [y, z, x]
    }
}

fn to_screen(radius: f64, right: f64, up: f64) -> (f64, f64) {
    (radius * right, -radius * up)
}

fn segments() -> usize {
    (180.0 / STEP_DEGREES) as usize
}

fn full_disc(radius: f64) -> Vec<(f64, f64)> {
    let n = 2 * segments();
    (0..n)
        .map(|i| {
            let a = TAU * i as f64 / n as f64;
            to_screen(radius, a.cos(), a.sin())
        })
        .collect()
}

/// Visible lit region of a sphere of `radius`, or `None` when none of it
/// faces the viewer.
pub fn lit_outline(radius: f64, rotation: Rotation) -> Option<Vec<(f64, f64)>> {
    let light = rotation.light_direction();
    let rho = light[0].hypot(light[1]);
    if rho < 1e-9 {
        return (light[2] > 0.0).then(|| full_disc(radius));
    }

    // u lies on the limb and on the terminator; v completes the terminator's
    // basis and always points toward the viewer (its z component is rho).
    let theta = light[1].atan2(light[0]);
    let u = (-theta.sin(), theta.cos());
    let v = (-light[2] * theta.cos(), -light[2] * theta.sin());

    let n = segments();
    let mut points = Vec::with_capacity(2 * n);

    // lit half of the limb, from -u around to u
    for i in 0..=n {
        let a = theta - FRAC_PI_2 + PI * i as f64 / n as f64;
        points.push(to_screen(radius, a.cos(), a.sin()));
    }
    // near half of the terminator, back from u to -u
    for i in 1..n {
        let s = PI * i as f64 / n as f64;
        points.push(to_screen(
            radius,
            s.cos() * u.0 + s.sin() * v.0,
            s.cos() * u.1 + s.sin() * v.1,
        ));
    }

    Some(points)
}

/// Path coordinates are kept to three decimals; `-0` collapses to `0`.
fn coord(v: f64) -> f32 {
    let r = (v * 1000.0).round() / 1000.0;
    if r == 0.0 {
        0.0
    } else {
        r as f32
    }
}

/// Closed polygon through `points` as SVG path data.
pub fn path_data(points: &[(f64, f64)]) -> Data {
    let Some((&(x0, y0), rest)) = points.split_first() else {
        return Data::new();
    };
    rest.iter()
        .fold(Data::new().move_to((coord(x0), coord(y0))), |d, &(x, y)| {
            d.line_to((coord(x), coord(y)))
        })
        .close()
}

/// Lit region as path data, `None` when nothing is lit.
pub fn lit_path(radius: f64, rotation: Rotation) -> Option<Data> {
    lit_outline(radius, rotation).map(|p| path_data(&p))
}
