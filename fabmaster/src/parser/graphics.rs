//! Graphics primitive factory
//!
//! Graphic rows (traces, footprint artwork, custom pad outlines) all share
//! the same `GRAPHIC_DATA_NAME` plus nine data fields layout. The meaning of
//! each field depends on the primitive name; this module turns one row into
//! a typed [`GraphicItem`] in board coordinates.

use serde::Serialize;
use thiserror::Error;

use super::columns::{read_double, resolve_column, scaled, scaled_y, ColumnNotFound};
use super::tokenizer::Row;
use crate::board::HorizontalJustify;
use crate::diagnostics::Diagnostics;
use crate::geometry::{ki_round, regular_polygon, ArcGeometry, Point};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphicError {
    #[error("unknown graphic primitive '{0}'")]
    UnknownShape(String),
    #[error("circle size mismatch: {width} x {height}")]
    CircleSizeMismatch { width: i64, height: i64 },
}

/// Optional tenth field attached to etch primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Connectivity {
    Connect,
    NotConnect,
    Shape,
    Void,
    Polygon,
}

impl Connectivity {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "CONNECT" => Some(Connectivity::Connect),
            "NOTCONNECT" => Some(Connectivity::NotConnect),
            "SHAPE" => Some(Connectivity::Shape),
            "VOID" => Some(Connectivity::Void),
            "POLYGON" => Some(Connectivity::Polygon),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicText {
    pub position: Point,
    pub rotation: f64,
    pub mirror: bool,
    pub justify: HorizontalJustify,
    pub height: i64,
    pub width: i64,
    pub italic: bool,
    pub thickness: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GraphicShape {
    Line { start: Point, end: Point },
    Arc(ArcGeometry),
    /// Full circle stored as a degenerate arc.
    Circle(ArcGeometry),
    Rectangle { start: Point, end: Point, fill: bool },
    Oblong { center: Point, size_x: i64, size_y: i64, along_x: bool },
    Polygon(Vec<Point>),
    Cross { center: Point, size_x: i64, size_y: i64 },
    Text(GraphicText),
}

impl GraphicShape {
    pub fn name(&self) -> &'static str {
        match self {
            GraphicShape::Line { .. } => "line",
            GraphicShape::Arc(_) => "arc",
            GraphicShape::Circle(_) => "circle",
            GraphicShape::Rectangle { .. } => "rectangle",
            GraphicShape::Oblong { .. } => "oblong",
            GraphicShape::Polygon(_) => "polygon",
            GraphicShape::Cross { .. } => "cross",
            GraphicShape::Text(_) => "text",
        }
    }

    /// First point of the primitive, used to test contour continuity.
    pub fn start(&self) -> Option<Point> {
        match self {
            GraphicShape::Line { start, .. } | GraphicShape::Rectangle { start, .. } => Some(*start),
            GraphicShape::Arc(arc) | GraphicShape::Circle(arc) => Some(arc.start),
            _ => None,
        }
    }

    /// Last point of the primitive.
    pub fn end(&self) -> Option<Point> {
        match self {
            GraphicShape::Line { end, .. } | GraphicShape::Rectangle { end, .. } => Some(*end),
            GraphicShape::Arc(arc) | GraphicShape::Circle(arc) => Some(arc.end),
            _ => None,
        }
    }
}

/// One graphic primitive plus the grouping metadata it was read with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicItem {
    pub shape: GraphicShape,
    pub width: i64,
    /// Source subclass (layer name).
    pub layer: String,
    pub seq: i32,
    pub subseq: i32,
    pub connectivity: Option<Connectivity>,
}

/// Borrowed view of the graphic fields of one row.
#[derive(Debug, Clone, Copy)]
pub struct GraphicData<'a> {
    pub name: &'a str,
    pub fields: [&'a str; 9],
    pub connectivity: &'a str,
}

/// Column indices of the shared graphic fields.
#[derive(Debug, Clone)]
pub struct GraphicColumns {
    pub name: usize,
    pub tag: usize,
    pub fields: [usize; 9],
    pub connectivity: Option<usize>,
}

impl GraphicColumns {
    pub fn resolve(header: &Row) -> Result<Self, ColumnNotFound> {
        let mut fields = [0usize; 9];
        for (i, slot) in fields.iter_mut().enumerate() {
            *slot = resolve_column(header, &format!("GRAPHICDATA{}", i + 1))?;
        }
        Ok(Self {
            name: resolve_column(header, "GRAPHICDATANAME")?,
            tag: resolve_column(header, "RECORDTAG")?,
            fields,
            connectivity: resolve_column(header, "GRAPHICDATA10").ok(),
        })
    }

    pub fn data<'a>(&self, row: &'a Row) -> GraphicData<'a> {
        let get = move |c: usize| -> &'a str { row.get(c).map(String::as_str).unwrap_or("") };
        GraphicData {
            name: get(self.name),
            fields: self.fields.map(get),
            connectivity: self.connectivity.map(get).unwrap_or(""),
        }
    }
}

/// Build a primitive from one graphic row.
///
/// The returned item carries an empty layer and zero sequence numbers; the
/// section processor fills those from the row's subclass and record tag.
pub fn make_graphic(
    data: &GraphicData<'_>,
    scale: f64,
    diags: &mut Diagnostics,
    row: usize,
) -> Result<GraphicItem, GraphicError> {
    let f = &data.fields;
    let point = |x: usize, y: usize| Point::new(scaled(f[x], scale), scaled_y(f[y], scale));

    let (shape, width) = match data.name {
        "LINE" => (
            GraphicShape::Line {
                start: point(0, 1),
                end: point(2, 3),
            },
            scaled(f[4], scale),
        ),
        "ARC" => {
            let start = point(0, 1);
            let end = point(2, 3);
            let center = point(4, 5);
            let radius = scaled(f[6], scale);
            let clockwise = f[8] != "COUNTERCLOCKWISE";
            (
                GraphicShape::Arc(ArcGeometry::from_endpoints(start, end, center, radius, clockwise)),
                scaled(f[7], scale),
            )
        }
        "CIRCLE" => {
            let center = point(0, 1);
            let size_x = scaled(f[2], scale);
            let size_y = scaled(f[3], scale);
            if size_x != size_y {
                return Err(GraphicError::CircleSizeMismatch {
                    width: size_x,
                    height: size_y,
                });
            }
            let radius = size_x.max(size_y).abs() / 2;
            (
                GraphicShape::Circle(ArcGeometry::full_circle(center, radius)),
                scaled(f[4], scale),
            )
        }
        "RECTANGLE" => (
            GraphicShape::Rectangle {
                start: point(0, 1),
                end: point(2, 3),
                fill: f[4] == "1",
            },
            0,
        ),
        "FIG_RECTANGLE" | "SQUARE" => {
            let center = point(0, 1);
            let size_x = scaled(f[2], scale).abs();
            let size_y = if data.name == "SQUARE" {
                size_x
            } else {
                scaled(f[3], scale).abs()
            };
            let half = Point::new(size_x / 2, size_y / 2);
            (
                GraphicShape::Rectangle {
                    start: center - half,
                    end: center + half,
                    fill: f[4] == "1",
                },
                0,
            )
        }
        "OBLONG_X" | "OBLONG_Y" => (
            GraphicShape::Oblong {
                center: point(0, 1),
                size_x: scaled(f[2], scale).abs(),
                size_y: scaled(f[3], scale).abs(),
                along_x: data.name == "OBLONG_X",
            },
            0,
        ),
        "TRIANGLE_1" | "DIAMOND" | "HEXAGON_X" | "HEXAGON_Y" | "OCTAGON" => {
            let center = point(0, 1);
            let size = read_double(f[2]).abs() * scale;
            let (count, start_angle, radius) = match data.name {
                "TRIANGLE_1" => (3, 90.0, size / 2.0),
                "DIAMOND" => (4, 0.0, size / 2.0),
                "HEXAGON_X" => (6, 0.0, size / 2.0),
                "HEXAGON_Y" => (6, 30.0, size / 2.0),
                _ => (8, 22.5, size / 2.0 / 22.5f64.to_radians().cos()),
            };
            (
                GraphicShape::Polygon(regular_polygon(center, radius, count, start_angle)),
                0,
            )
        }
        "CROSS" => (
            GraphicShape::Cross {
                center: point(0, 1),
                size_x: scaled(f[2], scale).abs(),
                size_y: scaled(f[3], scale).abs(),
            },
            0,
        ),
        "TEXT" => (GraphicShape::Text(make_text(data, scale, diags, row)), 0),
        other => return Err(GraphicError::UnknownShape(other.to_string())),
    };

    Ok(GraphicItem {
        shape,
        width,
        layer: String::new(),
        seq: 0,
        subseq: 0,
        connectivity: Connectivity::parse(data.connectivity),
    })
}

fn make_text(data: &GraphicData<'_>, scale: f64, diags: &mut Diagnostics, row: usize) -> GraphicText {
    let f = &data.fields;
    let justify = match f[4] {
        "RIGHT" => HorizontalJustify::Right,
        "CENTER" => HorizontalJustify::Center,
        _ => HorizontalJustify::Left,
    };

    let mut text = GraphicText {
        position: Point::new(scaled(f[0], scale), scaled_y(f[1], scale)),
        rotation: read_double(f[2]),
        mirror: f[3] == "YES",
        justify,
        height: 0,
        width: 0,
        italic: false,
        thickness: 0,
        text: f[6].to_string(),
    };

    // size, font, height, width, italic, char spacing, line spacing, thickness
    let tokens: Vec<&str> = f[5].split([' ', '\t']).filter(|t| !t.is_empty()).collect();
    if tokens.len() < 8 {
        diags.error(
            format!("invalid text token count, expected 8 but found {}", tokens.len()),
            Some(row + 1),
        );
    } else {
        text.height = ki_round(read_double(tokens[2]) * scale);
        text.width = ki_round(read_double(tokens[3]) * scale);
        text.italic = read_double(tokens[4]) != 0.0;
        text.thickness = ki_round(read_double(tokens[7]) * scale);
    }

    text
}
