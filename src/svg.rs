//! Typed shape list, serialized through the `svg` crate

use std::fmt;

use ::svg::node::element::path::Data;
use ::svg::node::element::{Circle, Path, Rectangle, Text};
use ::svg::Document;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Format a coordinate with at most three decimals and no trailing zeros.
pub fn fmt_num(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    // avoid printing "-0"
    let r = if r == 0.0 { 0.0 } else { r };
    format!("{r}")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Translate(f64, f64),
    /// Degrees around (cx, cy)
    Rotate { angle: f64, cx: f64, cy: f64 },
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Transform::Translate(x, y) => write!(f, "translate({}, {})", fmt_num(x), fmt_num(y)),
            Transform::Rotate { angle, cx, cy } => {
                write!(f, "rotate({},{},{})", fmt_num(angle), fmt_num(cx), fmt_num(cy))
            }
        }
    }
}

/// Fill and stroke of a shape. `None` leaves the attribute out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paint {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
}

impl Paint {
    pub fn fill(color: impl Into<String>) -> Self {
        Self {
            fill: Some(color.into()),
            ..Default::default()
        }
    }

    /// Outline only (`fill="none"`)
    pub fn outline(color: impl Into<String>) -> Self {
        Self {
            fill: Some("none".to_string()),
            stroke: Some(color.into()),
            stroke_width: None,
        }
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    fn apply<N: ::svg::Node>(&self, mut node: N) -> N {
        if let Some(fill) = &self.fill {
            node.assign("fill", fill.as_str());
        }
        if let Some(stroke) = &self.stroke {
            node.assign("stroke", stroke.as_str());
        }
        if let Some(w) = self.stroke_width {
            node.assign("stroke-width", fmt_num(w));
        }
        node
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    pub size: String,
    pub family: String,
    pub weight: Option<String>,
    pub fill: Option<String>,
}

/// Drawing primitives, serialized in insertion order.
#[derive(Debug, Clone)]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        paint: Paint,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        font: Font,
        class: &'static str,
        transform: Option<Transform>,
    },
    /// Circle centered on the origin, placed with a translate transform
    Circle {
        r: f64,
        paint: Paint,
        transform: Transform,
    },
    Path {
        d: Data,
        paint: Paint,
        transform: Transform,
    },
}

impl Shape {
    fn append_to(&self, doc: Document) -> Document {
        match self {
            Shape::Rect {
                x,
                y,
                width,
                height,
                paint,
            } => doc.add(
                paint.apply(
                    Rectangle::new()
                        .set("x", fmt_num(*x))
                        .set("y", fmt_num(*y))
                        .set("width", fmt_num(*width))
                        .set("height", fmt_num(*height)),
                ),
            ),
            Shape::Text {
                x,
                y,
                content,
                font,
                class,
                transform,
            } => {
                let mut text = Text::new(content.as_str())
                    .set("class", *class)
                    .set("x", fmt_num(*x))
                    .set("y", fmt_num(*y))
                    .set("font-size", font.size.as_str())
                    .set("font-family", font.family.as_str());
                if let Some(fill) = &font.fill {
                    text = text.set("fill", fill.as_str());
                }
                if let Some(weight) = &font.weight {
                    text = text.set("font-weight", weight.as_str());
                }
                if let Some(t) = transform {
                    text = text.set("transform", t.to_string());
                }
                doc.add(text)
            }
            Shape::Circle {
                r,
                paint,
                transform,
            } => doc.add(
                paint.apply(
                    Circle::new()
                        .set("r", fmt_num(*r))
                        .set("transform", transform.to_string()),
                ),
            ),
            Shape::Path {
                d,
                paint,
                transform,
            } => doc.add(
                paint.apply(
                    Path::new()
                        .set("d", d.clone())
                        .set("transform", transform.to_string()),
                ),
            ),
        }
    }
}

/// A standalone SVG document under construction.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    pub width: f64,
    pub height: f64,
    shapes: Vec<Shape>,
}

impl SvgDocument {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Root `<svg>` element sized to the canvas, with every shape appended.
    pub fn to_document(&self) -> Document {
        let (w, h) = (fmt_num(self.width), fmt_num(self.height));
        let root = Document::new()
            .set("xmlns", SVG_NS)
            .set("width", w.as_str())
            .set("height", h.as_str())
            .set("viewBox", format!("0 0 {w} {h}"))
            .set("preserveAspectRatio", "xMidYMid meet");
        self.shapes
            .iter()
            .fold(root, |doc, shape| shape.append_to(doc))
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_compact() {
        assert_eq!(fmt_num(50.0), "50");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(12.3456), "12.346");
        assert_eq!(fmt_num(-72.5), "-72.5");
    }

    #[test]
    fn document_root_and_shapes() {
        let mut doc = SvgDocument::new(100.0, 40.0);
        doc.push(Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            paint: Paint::outline("#c1c1c1").with_stroke_width(2.0),
        });
        doc.push(Shape::Text {
            x: 5.0,
            y: 14.0,
            content: "1".into(),
            font: Font {
                size: "12px".into(),
                family: "Helvetica".into(),
                ..Default::default()
            },
            class: "day-number",
            transform: None,
        });
        doc.push(Shape::Circle {
            r: 7.0,
            paint: Paint::fill("#c1c1c1"),
            transform: Transform::Translate(35.5, 12.0),
        });
        doc.push(Shape::Path {
            d: Data::new().move_to((0.0_f32, -7.0_f32)).line_to((7.0_f32, 0.0_f32)).close(),
            paint: Paint::fill("#FFFFFF"),
            transform: Transform::Translate(35.5, 12.0),
        });
        assert_eq!(doc.len(), 4);

        let s = doc.to_string();
        let xml = roxmltree::Document::parse(&s).expect("well-formed");
        let root = xml.root_element();
        assert_eq!(root.tag_name().name(), "svg");
        assert_eq!(root.tag_name().namespace(), Some("http://www.w3.org/2000/svg"));
        assert_eq!(root.attribute("width"), Some("100"));
        assert_eq!(root.attribute("height"), Some("40"));
        assert_eq!(root.attribute("viewBox"), Some("0 0 100 40"));
        assert_eq!(root.attribute("preserveAspectRatio"), Some("xMidYMid meet"));

        let children: Vec<_> = root.children().filter(|n| n.is_element()).collect();
        let names: Vec<_> = children.iter().map(|n| n.tag_name().name()).collect();
        assert_eq!(names, ["rect", "text", "circle", "path"]);

        let rect = children[0];
        assert_eq!(rect.attribute("fill"), Some("none"));
        assert_eq!(rect.attribute("stroke"), Some("#c1c1c1"));
        assert_eq!(rect.attribute("stroke-width"), Some("2"));

        let text = children[1];
        assert_eq!(text.attribute("class"), Some("day-number"));
        assert_eq!(text.attribute("x"), Some("5"));
        assert_eq!(text.attribute("font-family"), Some("Helvetica"));
        assert_eq!(text.attribute("font-weight"), None);
        assert_eq!(text.text().map(str::trim), Some("1"));

        assert_eq!(children[2].attribute("transform"), Some("translate(35.5, 12)"));
        assert!(children[3].attribute("d").unwrap().starts_with('M'));
    }

    #[test]
    fn empty_document_is_just_the_root() {
        let s = SvgDocument::new(1600.0, 1000.0).to_string();
        let xml = roxmltree::Document::parse(&s).expect("well-formed");
        assert_eq!(xml.root_element().children().filter(|n| n.is_element()).count(), 0);
    }

    #[test]
    fn rotate_transform() {
        let t = Transform::Rotate {
            angle: -25.0,
            cx: 0.0,
            cy: 139.0,
        };
        assert_eq!(t.to_string(), "rotate(-25,0,139)");
    }
}
