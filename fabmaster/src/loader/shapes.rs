//! Conversion of parsed graphic primitives into board drawings, and contour
//! reconstruction for zones, polygons and custom pads.

use crate::board::{BoardLayer, DesignSettings, Shape, ShapeKind, Text};
use crate::diagnostics::Diagnostics;
use crate::geometry::{Point, Polygon};
use crate::parser::graphics::{GraphicItem, GraphicShape, GraphicText};

/// A drawing produced from one primitive.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BoardItem {
    Shape(Shape),
    Text(Text),
}

/// What a change of subsequence number means while walking a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubContour {
    /// Start a new hole.
    Hole,
    /// Stop reading; the rest of the record is ignored.
    Stop,
    /// Keep appending to the outline.
    Merge,
}

/// Accumulates primitives into an outline plus holes.
pub(crate) struct ContourBuilder<'a> {
    outline: Vec<Point>,
    holes: Vec<Vec<Point>>,
    pending: Option<Vec<Point>>,
    last_subseq: i32,
    mode: SubContour,
    max_error: i64,
    context: &'a str,
}

impl<'a> ContourBuilder<'a> {
    /// `context` names the record in diagnostics.
    pub(crate) fn new(mode: SubContour, max_error: i64, context: &'a str) -> Self {
        Self {
            outline: Vec::new(),
            holes: Vec::new(),
            pending: None,
            last_subseq: 0,
            mode,
            max_error,
            context,
        }
    }

    /// Walk `items` in order. Returns the resulting polygon; the outline may
    /// be degenerate.
    pub(crate) fn build<'i>(
        mut self,
        items: impl IntoIterator<Item = &'i GraphicItem>,
        diags: &mut Diagnostics,
    ) -> Polygon {
        for item in items {
            if item.subseq > 0 && item.subseq != self.last_subseq {
                match self.mode {
                    SubContour::Stop => break,
                    SubContour::Hole => {
                        self.finish_hole(diags);
                        self.pending = Some(Vec::new());
                    }
                    SubContour::Merge => {}
                }
                self.last_subseq = item.subseq;
            }
            self.append(item, diags);
        }
        self.finish_hole(diags);

        close_chain(&mut self.outline);
        Polygon {
            outline: self.outline,
            holes: self.holes,
        }
    }

    fn finish_hole(&mut self, diags: &mut Diagnostics) {
        let Some(mut hole) = self.pending.take() else {
            return;
        };
        close_chain(&mut hole);
        if hole.len() < 3 {
            diags.warn(
                format!("invalid hole with {} points in {}", hole.len(), self.context),
                None,
            );
        } else {
            self.holes.push(hole);
        }
    }

    fn append(&mut self, item: &GraphicItem, diags: &mut Diagnostics) {
        let context = self.context;
        let chain = match self.pending.as_mut() {
            Some(hole) => hole,
            None => &mut self.outline,
        };

        match &item.shape {
            GraphicShape::Line { start, end } => {
                match chain.last() {
                    None => chain.push(*start),
                    Some(last) if last != start => diags.warn(
                        format!(
                            "outline seems discontinuous in {}: last point was ({}, {}), next segment starts at ({}, {})",
                            context, last.x, last.y, start.x, start.y
                        ),
                        None,
                    ),
                    Some(_) => {}
                }
                push_point(chain, *end);
            }
            GraphicShape::Arc(arc) => {
                for p in arc.to_polyline(self.max_error) {
                    push_point(chain, p);
                }
            }
            GraphicShape::Circle(arc) => {
                if chain.is_empty() {
                    chain.extend(arc.to_polyline(self.max_error));
                }
            }
            GraphicShape::Rectangle { start, end, .. } if chain.is_empty() => {
                chain.extend([
                    *start,
                    Point::new(end.x, start.y),
                    *end,
                    Point::new(start.x, end.y),
                ]);
            }
            GraphicShape::Polygon(points) if chain.is_empty() => chain.extend(points.iter().copied()),
            GraphicShape::Text(_) => {}
            other => diags.warn(
                format!("unsupported {} primitive in outline of {}", other.name(), context),
                None,
            ),
        }
    }
}

fn push_point(chain: &mut Vec<Point>, p: Point) {
    if chain.last() != Some(&p) {
        chain.push(p);
    }
}

/// Drop a repeated closing point.
fn close_chain(chain: &mut Vec<Point>) {
    if chain.len() > 1 && chain.first() == chain.last() {
        chain.pop();
    }
}

fn stroke(width: i64, layer: BoardLayer, settings: &DesignSettings) -> i64 {
    if width > 0 {
        width
    } else {
        settings.line_thickness(layer)
    }
}

pub(crate) fn make_text(src: &GraphicText, layer: BoardLayer) -> Text {
    Text {
        text: src.text.clone(),
        position: src.position,
        layer,
        angle: src.rotation,
        height: src.height,
        width: src.width,
        thickness: src.thickness,
        italic: src.italic,
        mirrored: src.mirror,
        justify: src.justify,
        visible: true,
    }
}

/// Board drawings for one primitive on `layer`.
pub(crate) fn create_board_items(
    item: &GraphicItem,
    layer: BoardLayer,
    settings: &DesignSettings,
) -> Vec<BoardItem> {
    let width = stroke(item.width, layer, settings);
    let shape = |kind: ShapeKind, width: i64, filled: bool| {
        BoardItem::Shape(Shape {
            kind,
            layer,
            width,
            filled,
        })
    };

    match &item.shape {
        GraphicShape::Line { start, end } => vec![shape(
            ShapeKind::Segment {
                start: *start,
                end: *end,
            },
            width,
            false,
        )],
        GraphicShape::Arc(arc) if arc.is_full_circle() => vec![shape(
            ShapeKind::Circle {
                center: arc.center,
                radius: arc.radius,
            },
            width,
            false,
        )],
        GraphicShape::Arc(arc) => vec![shape(ShapeKind::Arc(*arc), width, false)],
        GraphicShape::Circle(arc) => vec![shape(
            ShapeKind::Circle {
                center: arc.center,
                radius: arc.radius,
            },
            width,
            false,
        )],
        GraphicShape::Rectangle { start, end, fill } => vec![shape(
            ShapeKind::Rect {
                start: *start,
                end: *end,
            },
            width,
            *fill,
        )],
        GraphicShape::Oblong {
            center,
            size_x,
            size_y,
            along_x,
        } => {
            let (long, short) = if *along_x {
                (*size_x, *size_y)
            } else {
                (*size_y, *size_x)
            };
            let half = (long - short).max(0) / 2;
            let delta = if *along_x {
                Point::new(half, 0)
            } else {
                Point::new(0, half)
            };
            vec![shape(
                ShapeKind::Segment {
                    start: *center - delta,
                    end: *center + delta,
                },
                short,
                false,
            )]
        }
        GraphicShape::Polygon(points) => {
            vec![shape(ShapeKind::Polygon(Polygon::new(points.clone())), 0, true)]
        }
        GraphicShape::Cross {
            center,
            size_x,
            size_y,
        } => {
            let hx = Point::new(size_x / 2, 0);
            let hy = Point::new(0, size_y / 2);
            vec![
                shape(
                    ShapeKind::Segment {
                        start: *center - hx,
                        end: *center + hx,
                    },
                    width,
                    false,
                ),
                shape(
                    ShapeKind::Segment {
                        start: *center - hy,
                        end: *center + hy,
                    },
                    width,
                    false,
                ),
            ]
        }
        GraphicShape::Text(text) => vec![BoardItem::Text(make_text(text, layer))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ArcGeometry;

    fn line(x0: i64, y0: i64, x1: i64, y1: i64, subseq: i32) -> GraphicItem {
        GraphicItem {
            shape: GraphicShape::Line {
                start: Point::new(x0, y0),
                end: Point::new(x1, y1),
            },
            width: 0,
            layer: "TOP".into(),
            seq: 0,
            subseq,
            connectivity: None,
        }
    }

    fn square(x0: i64, size: i64, subseq: i32) -> Vec<GraphicItem> {
        let x1 = x0 + size;
        vec![
            line(x0, x0, x1, x0, subseq),
            line(x1, x0, x1, x1, subseq),
            line(x1, x1, x0, x1, subseq),
            line(x0, x1, x0, x0, subseq),
        ]
    }

    #[test]
    fn test_closed_square_outline() {
        let items = square(0, 100, 0);
        let mut diags = Diagnostics::new();
        let poly = ContourBuilder::new(SubContour::Hole, 5, "test").build(&items, &mut diags);
        assert_eq!(poly.outline.len(), 4);
        assert!(poly.holes.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_subsequence_change_starts_hole() {
        let mut items = square(0, 100, 0);
        items.extend(square(25, 50, 1));
        let mut diags = Diagnostics::new();
        let poly = ContourBuilder::new(SubContour::Hole, 5, "zone").build(&items, &mut diags);
        assert_eq!(poly.outline.len(), 4);
        assert_eq!(poly.holes.len(), 1);
        assert_eq!(poly.holes[0].len(), 4);
    }

    #[test]
    fn test_boundary_mode_stops_at_subsequence() {
        let mut items = square(0, 100, 0);
        items.extend(square(25, 50, 1));
        let mut diags = Diagnostics::new();
        let poly = ContourBuilder::new(SubContour::Stop, 5, "zone").build(&items, &mut diags);
        assert_eq!(poly.outline.len(), 4);
        assert!(poly.holes.is_empty());
    }

    #[test]
    fn test_discontinuity_is_reported_not_repaired() {
        let items = vec![line(0, 0, 10, 0, 0), line(20, 0, 20, 10, 0), line(20, 10, 0, 0, 0)];
        let mut diags = Diagnostics::new();
        let poly = ContourBuilder::new(SubContour::Merge, 5, "zone 7").build(&items, &mut diags);
        assert_eq!(diags.len(), 1);
        assert!(diags.iter().any(|d| d.message.contains("zone 7")));
        assert_eq!(poly.outline.len(), 3);
    }

    #[test]
    fn test_short_hole_dropped() {
        let mut items = square(0, 100, 0);
        items.push(line(10, 10, 20, 20, 1));
        let mut diags = Diagnostics::new();
        let poly = ContourBuilder::new(SubContour::Hole, 5, "zone").build(&items, &mut diags);
        assert!(poly.holes.is_empty());
        assert!(diags.iter().any(|d| d.message.contains("invalid hole")));
    }

    #[test]
    fn test_zero_width_line_gets_layer_default() {
        let item = line(0, 0, 10, 0, 0);
        let settings = DesignSettings::default();
        let items = create_board_items(&item, BoardLayer::FSilkS, &settings);
        let BoardItem::Shape(shape) = &items[0] else {
            panic!("expected shape");
        };
        assert_eq!(shape.width, settings.silk_line_width);
    }

    #[test]
    fn test_cross_becomes_two_segments() {
        let item = GraphicItem {
            shape: GraphicShape::Cross {
                center: Point::new(0, 0),
                size_x: 100,
                size_y: 50,
            },
            width: 10,
            layer: String::new(),
            seq: 0,
            subseq: 0,
            connectivity: None,
        };
        let items = create_board_items(&item, BoardLayer::DwgsUser, &DesignSettings::default());
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_full_arc_becomes_circle() {
        let arc = ArcGeometry::from_endpoints(Point::new(10, 0), Point::new(10, 0), Point::new(0, 0), 10, true);
        let item = GraphicItem {
            shape: GraphicShape::Arc(arc),
            width: 5,
            layer: String::new(),
            seq: 0,
            subseq: 0,
            connectivity: None,
        };
        let items = create_board_items(&item, BoardLayer::CmtsUser, &DesignSettings::default());
        assert!(matches!(
            &items[0],
            BoardItem::Shape(Shape {
                kind: ShapeKind::Circle { radius: 10, .. },
                ..
            })
        ));
    }
}
