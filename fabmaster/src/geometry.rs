//! Geometry helpers
//!
//! Coordinates are integer internal units (nanometres) with the Y axis pointing
//! down, which is the convention of the target board model. Source files are
//! Y-up; the section processors flip Y while scaling so everything in here
//! already lives in board space.
//!
//! Angles are degrees. A positive arc sweep means increasing `atan2` angle in
//! board space, which is a clockwise turn on screen.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Largest coordinate magnitude kept, in internal units (about 2.1 m).
pub const MAX_COORD: i64 = i32::MAX as i64;

/// Round to the nearest internal unit, clamped to `±MAX_COORD`. Non-finite
/// values collapse to zero.
pub fn ki_round(value: f64) -> i64 {
    if value.is_finite() {
        (value.round() as i64).clamp(-MAX_COORD, MAX_COORD)
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }

    /// Mirror across the horizontal line `y = axis_y`.
    pub fn mirror_y(&self, axis_y: i64) -> Point {
        Point::new(self.x, 2 * axis_y - self.y)
    }

    /// Angle of the vector from the origin to this point, in degrees.
    fn angle(&self) -> f64 {
        (self.y as f64).atan2(self.x as f64).to_degrees()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Rotate `point` about `center`, board convention: positive angles turn
/// counter-clockwise on screen.
pub fn rotate_point(point: Point, center: Point, degrees: f64) -> Point {
    if degrees == 0.0 {
        return point;
    }
    let dx = (point.x - center.x) as f64;
    let dy = (point.y - center.y) as f64;
    let (sin, cos) = degrees.to_radians().sin_cos();
    let x = dy * sin + dx * cos;
    let y = dy * cos - dx * sin;
    Point::new(center.x + ki_round(x), center.y + ki_round(y))
}

/// Axis-aligned bounding box, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = BoundingBox { min: first, max: first };
        for p in iter {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn width(&self) -> i64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }
}

// ============================================================================
// Arcs
// ============================================================================

/// Canonical arc representation: a start/mid/end triple plus the center,
/// radius and signed sweep it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArcGeometry {
    pub start: Point,
    pub mid: Point,
    pub end: Point,
    pub center: Point,
    pub radius: i64,
    /// Signed sweep in degrees, magnitude in (0, 360].
    pub sweep: f64,
}

impl ArcGeometry {
    /// Build an arc from its endpoints and center.
    ///
    /// `clockwise` is the direction flag of the source file. Source files are
    /// Y-up, so after the Y flip a clockwise arc sweeps through increasing
    /// angles. Coincident endpoints describe a full turn.
    pub fn from_endpoints(start: Point, end: Point, center: Point, radius: i64, clockwise: bool) -> Self {
        let sweep = if start == end {
            if clockwise {
                360.0
            } else {
                -360.0
            }
        } else {
            let start_angle = (start - center).angle();
            let end_angle = (end - center).angle();
            normalize_sweep(end_angle - start_angle, clockwise)
        };

        let mid = point_on_circle(center, start, sweep / 2.0, radius);
        let radius = if radius > 0 {
            radius
        } else {
            ki_round(start.distance(center))
        };

        Self {
            start,
            mid,
            end,
            center,
            radius,
            sweep,
        }
    }

    /// A full circle as a degenerate arc: start, mid and end coincide on the
    /// +X side of the center and the sweep is a clockwise full turn.
    pub fn full_circle(center: Point, radius: i64) -> Self {
        let start = Point::new(center.x + radius, center.y);
        Self {
            start,
            mid: start,
            end: start,
            center,
            radius,
            sweep: 360.0,
        }
    }

    pub fn is_full_circle(&self) -> bool {
        self.sweep.abs() >= 360.0 - 1e-9
    }

    /// Direction recovered from the start/mid/end triple alone.
    pub fn is_clockwise(&self) -> bool {
        if self.start == self.end {
            return self.sweep > 0.0;
        }
        let a = self.mid - self.start;
        let b = self.end - self.mid;
        let cross = a.x as f64 * b.y as f64 - a.y as f64 * b.x as f64;
        cross > 0.0
    }

    /// Recover the signed sweep from the start/mid/end triple and the center.
    pub fn sweep_from_triple(&self) -> f64 {
        if self.start == self.end {
            return if self.is_clockwise() { 360.0 } else { -360.0 };
        }
        let start_angle = (self.start - self.center).angle();
        let end_angle = (self.end - self.center).angle();
        normalize_sweep(end_angle - start_angle, self.is_clockwise())
    }

    /// Approximate the arc with points whose chords deviate from the true
    /// arc by at most `max_error`. The first and last points are exactly the
    /// arc endpoints.
    pub fn to_polyline(&self, max_error: i64) -> Vec<Point> {
        let r = self.start.distance(self.center);
        let max_error = max_error.max(1) as f64;
        if r <= max_error {
            return vec![self.start, self.end];
        }

        let max_step = 2.0 * (1.0 - max_error / r).acos().to_degrees();
        let mut count = (self.sweep.abs() / max_step).ceil() as usize;
        count = count.max(if self.is_full_circle() { 8 } else { 2 });

        let mut points = Vec::with_capacity(count + 1);
        points.push(self.start);
        for k in 1..count {
            let step = self.sweep * k as f64 / count as f64;
            points.push(point_on_circle(self.center, self.start, step, 0));
        }
        points.push(self.end);
        points
    }
}

fn normalize_sweep(mut sweep: f64, clockwise: bool) -> f64 {
    if clockwise {
        while sweep <= 0.0 {
            sweep += 360.0;
        }
        while sweep > 360.0 {
            sweep -= 360.0;
        }
    } else {
        while sweep >= 0.0 {
            sweep -= 360.0;
        }
        while sweep < -360.0 {
            sweep += 360.0;
        }
    }
    sweep
}

/// Point reached by turning `start` about `center` through `sweep` degrees
/// (positive is increasing angle). When `start` sits on the center the
/// supplied radius is used instead.
fn point_on_circle(center: Point, start: Point, sweep: f64, radius: i64) -> Point {
    let offset = start - center;
    let r = if offset == Point::default() {
        radius as f64
    } else {
        start.distance(center)
    };
    let angle = (offset.angle() + sweep).to_radians();
    Point::new(
        center.x + ki_round(r * angle.cos()),
        center.y + ki_round(r * angle.sin()),
    )
}

/// Vertices of a regular polygon around `center`.
pub fn regular_polygon(center: Point, radius: f64, count: usize, start_degrees: f64) -> Vec<Point> {
    (0..count)
        .map(|i| {
            let angle = (start_degrees + 360.0 * i as f64 / count as f64).to_radians();
            Point::new(
                center.x + ki_round(radius * angle.cos()),
                center.y + ki_round(radius * angle.sin()),
            )
        })
        .collect()
}

// ============================================================================
// Polygons
// ============================================================================

/// A single outline with optional holes. Chains are implicitly closed; the
/// closing point is never repeated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Polygon {
    pub outline: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(outline: Vec<Point>) -> Self {
        Self {
            outline,
            holes: Vec::new(),
        }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.outline)
    }

    pub fn is_degenerate(&self) -> bool {
        self.outline.len() < 3
    }

    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Polygon {
        Polygon {
            outline: self.outline.iter().copied().map(&f).collect(),
            holes: self
                .holes
                .iter()
                .map(|hole| hole.iter().copied().map(&f).collect())
                .collect(),
        }
    }

    /// Merge all holes into the outline through zero-width bridges, giving a
    /// single chain that fills the same area.
    pub fn fracture(&self) -> Vec<Point> {
        let mut result = self.outline.clone();
        if result.is_empty() {
            return result;
        }
        let outline_area = signed_area(&self.outline);

        let mut holes: Vec<Vec<Point>> = self
            .holes
            .iter()
            .filter(|hole| hole.len() >= 3)
            .cloned()
            .collect();
        holes.sort_by_key(|hole| hole.iter().map(|p| p.x).min().unwrap_or(0));

        for mut hole in holes {
            if signed_area(&hole).signum() == outline_area.signum() {
                hole.reverse();
            }
            let Some((hole_idx, hole_pt)) = hole
                .iter()
                .copied()
                .enumerate()
                .min_by_key(|(_, p)| (p.x, p.y))
            else {
                continue;
            };
            let Some((outer_idx, _)) = result.iter().enumerate().min_by(|(_, a), (_, b)| {
                a.distance(hole_pt).total_cmp(&b.distance(hole_pt))
            }) else {
                continue;
            };

            let mut bridged = Vec::with_capacity(result.len() + hole.len() + 2);
            bridged.extend_from_slice(&result[..=outer_idx]);
            bridged.extend_from_slice(&hole[hole_idx..]);
            bridged.extend_from_slice(&hole[..=hole_idx]);
            bridged.extend_from_slice(&result[outer_idx..]);
            result = bridged;
        }

        result
    }
}

/// Twice the signed area of a closed chain (shoelace).
pub fn signed_area(chain: &[Point]) -> f64 {
    if chain.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in chain.iter().enumerate() {
        let b = chain[(i + 1) % chain.len()];
        sum += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    sum
}

/// True when `point` lies within `tolerance` of any edge of the closed chain.
pub fn point_on_edge(chain: &[Point], point: Point, tolerance: i64) -> bool {
    match chain.len() {
        0 => false,
        1 => chain[0].distance(point) <= tolerance as f64,
        n => (0..n).any(|i| {
            let a = chain[i];
            let b = chain[(i + 1) % n];
            segment_distance(a, b, point) <= tolerance as f64
        }),
    }
}

fn segment_distance(a: Point, b: Point, p: Point) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (px, py) = (p.x as f64, p.y as f64);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (px - ax).hypot(py - ay);
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    (px - (ax + t * dx)).hypot(py - (ay + t * dy))
}

/// Resolve a set of contours with the even-odd rule: nested contours become
/// holes, disjoint contours become separate polygons.
pub fn merge_contours(contours: &[Vec<Point>]) -> Vec<Polygon> {
    let subject: Vec<Vec<[f64; 2]>> = contours
        .iter()
        .filter(|contour| contour.len() >= 3)
        .map(|contour| contour.iter().map(|p| [p.x as f64, p.y as f64]).collect())
        .collect();
    if subject.is_empty() {
        return Vec::new();
    }

    let subject_shapes: Vec<Vec<Vec<[f64; 2]>>> = vec![subject];
    let clip_shapes: Vec<Vec<Vec<[f64; 2]>>> = Vec::new();
    let merged = subject_shapes.overlay(&clip_shapes, OverlayRule::Union, FillRule::EvenOdd);

    merged
        .into_iter()
        .filter_map(|shape| {
            let mut contours = shape.into_iter().map(|contour| {
                contour
                    .into_iter()
                    .map(|[x, y]| Point::new(ki_round(x), ki_round(y)))
                    .collect::<Vec<_>>()
            });
            let outline = contours.next()?;
            Some(Polygon {
                outline,
                holes: contours.collect(),
            })
        })
        .collect()
}
