//! Board model
//!
//! The in-memory board the importer writes into. Coordinates are nanometres
//! with Y pointing down; angles are degrees, counter-clockwise positive on
//! screen. Pad primitives are stored in pad-local coordinates, everything
//! else in board coordinates.

pub mod layer;

pub use layer::{flip_set, BoardLayer, LayerSet};

use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::geometry::{ArcGeometry, BoundingBox, Point, Polygon};

/// Net code of the "no net" entry.
pub const NO_NET: usize = 0;

/// A complete imported board
#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub filename: String,
    pub enabled_layers: LayerSet,
    pub layer_names: BTreeMap<BoardLayer, String>,
    pub copper_layer_count: usize,
    pub nets: Vec<Net>,
    pub footprints: Vec<Footprint>,
    pub tracks: Vec<Track>,
    pub arcs: Vec<ArcTrack>,
    pub vias: Vec<Via>,
    pub zones: Vec<Zone>,
    pub shapes: Vec<Shape>,
    pub texts: Vec<Text>,
    pub settings: DesignSettings,
}

impl Default for Board {
    fn default() -> Self {
        Self::new("")
    }
}

impl Board {
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            enabled_layers: LayerSet::new(),
            layer_names: BTreeMap::new(),
            copper_layer_count: 2,
            nets: vec![Net {
                code: NO_NET,
                name: String::new(),
            }],
            footprints: Vec::new(),
            tracks: Vec::new(),
            arcs: Vec::new(),
            vias: Vec::new(),
            zones: Vec::new(),
            shapes: Vec::new(),
            texts: Vec::new(),
            settings: DesignSettings::default(),
        }
    }

    /// Add a net, returning the existing code if the name is already known.
    pub fn add_net(&mut self, name: &str) -> usize {
        if let Some(code) = self.find_net(name) {
            return code;
        }
        let code = self.nets.len();
        self.nets.push(Net {
            code,
            name: name.to_string(),
        });
        code
    }

    pub fn find_net(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.nets.iter().find(|n| n.name == name).map(|n| n.code)
    }

    pub fn net_name(&self, code: usize) -> &str {
        self.nets.get(code).map(|n| n.name.as_str()).unwrap_or("")
    }

    /// Number of real nets, excluding the unconnected entry.
    pub fn net_count(&self) -> usize {
        self.nets.len().saturating_sub(1)
    }

    pub fn enable_layers(&mut self, layers: impl IntoIterator<Item = BoardLayer>) {
        self.enabled_layers.extend(layers);
    }

    pub fn set_layer_name(&mut self, layer: BoardLayer, name: &str) {
        self.layer_names.insert(layer, name.to_string());
    }

    /// Display name of a layer: the user name if set, else the canonical one.
    pub fn layer_name(&self, layer: BoardLayer) -> String {
        self.layer_names
            .get(&layer)
            .cloned()
            .unwrap_or_else(|| layer.name())
    }

    pub fn copper_layers(&self) -> Vec<BoardLayer> {
        BoardLayer::copper_stack(self.copper_layer_count)
    }

    pub fn add_footprint(&mut self, footprint: Footprint) {
        self.footprints.push(footprint);
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn add_arc(&mut self, arc: ArcTrack) {
        self.arcs.push(arc);
    }

    pub fn add_via(&mut self, via: Via) {
        self.vias.push(via);
    }

    pub fn add_zone(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn add_text(&mut self, text: Text) {
        self.texts.push(text);
    }

    pub fn pad_count(&self) -> usize {
        self.footprints.iter().map(|fp| fp.pads.len()).sum()
    }

    pub fn find_footprint(&self, reference: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|fp| fp.reference.text == reference)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Net {
    pub code: usize,
    pub name: String,
}

/// Default dimensions used when the source does not specify them.
#[derive(Debug, Clone, Serialize)]
pub struct DesignSettings {
    pub via_diameter: i64,
    pub via_drill: i64,
    pub silk_line_width: i64,
    pub copper_line_width: i64,
    pub edge_line_width: i64,
    pub courtyard_line_width: i64,
    pub fab_line_width: i64,
    pub other_line_width: i64,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            via_diameter: 600_000,
            via_drill: 300_000,
            silk_line_width: 120_000,
            copper_line_width: 200_000,
            edge_line_width: 50_000,
            courtyard_line_width: 50_000,
            fab_line_width: 100_000,
            other_line_width: 100_000,
        }
    }
}

impl DesignSettings {
    /// Default stroke width for graphics on `layer`.
    pub fn line_thickness(&self, layer: BoardLayer) -> i64 {
        match layer {
            BoardLayer::FSilkS | BoardLayer::BSilkS => self.silk_line_width,
            BoardLayer::EdgeCuts => self.edge_line_width,
            BoardLayer::FCrtYd | BoardLayer::BCrtYd => self.courtyard_line_width,
            BoardLayer::FFab | BoardLayer::BFab => self.fab_line_width,
            l if l.is_copper() => self.copper_line_width,
            _ => self.other_line_width,
        }
    }
}

// ============================================================================
// Graphics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ShapeKind {
    Segment { start: Point, end: Point },
    Arc(ArcGeometry),
    Circle { center: Point, radius: i64 },
    Rect { start: Point, end: Point },
    Polygon(Polygon),
}

/// Free-standing drawing on a board or footprint layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub layer: BoardLayer,
    pub width: i64,
    pub filled: bool,
}

impl Shape {
    /// Mirror across the horizontal line `y = axis_y`, keeping the layer.
    pub fn mirror_y(&mut self, axis_y: i64) {
        let m = |p: Point| p.mirror_y(axis_y);
        self.kind = match &self.kind {
            ShapeKind::Segment { start, end } => ShapeKind::Segment {
                start: m(*start),
                end: m(*end),
            },
            ShapeKind::Arc(arc) => ShapeKind::Arc(ArcGeometry {
                start: m(arc.start),
                mid: m(arc.mid),
                end: m(arc.end),
                center: m(arc.center),
                radius: arc.radius,
                sweep: -arc.sweep,
            }),
            ShapeKind::Circle { center, radius } => ShapeKind::Circle {
                center: m(*center),
                radius: *radius,
            },
            ShapeKind::Rect { start, end } => ShapeKind::Rect {
                start: m(*start),
                end: m(*end),
            },
            ShapeKind::Polygon(poly) => ShapeKind::Polygon(poly.map_points(m)),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HorizontalJustify {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub text: String,
    pub position: Point,
    pub layer: BoardLayer,
    pub angle: f64,
    pub height: i64,
    pub width: i64,
    pub thickness: i64,
    pub italic: bool,
    pub mirrored: bool,
    pub justify: HorizontalJustify,
    pub visible: bool,
}

impl Text {
    pub fn new(text: &str, position: Point, layer: BoardLayer) -> Self {
        Self {
            text: text.to_string(),
            position,
            layer,
            angle: 0.0,
            height: 1_000_000,
            width: 1_000_000,
            thickness: 150_000,
            italic: false,
            mirrored: false,
            justify: HorizontalJustify::Left,
            visible: true,
        }
    }

    /// Flip to the other board side about `axis_y`.
    pub fn flip(&mut self, axis_y: i64) {
        self.position = self.position.mirror_y(axis_y);
        self.layer = self.layer.flip();
        self.angle = normalize_angle(-self.angle);
        self.mirrored = !self.mirrored;
    }
}

// ============================================================================
// Footprints and pads
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Footprint {
    pub uuid: Uuid,
    pub fpid: String,
    pub reference: Text,
    pub value: Text,
    pub position: Point,
    pub orientation: f64,
    pub layer: BoardLayer,
    pub pads: Vec<Pad>,
    pub shapes: Vec<Shape>,
    pub texts: Vec<Text>,
    pub properties: BTreeMap<String, String>,
}

impl Footprint {
    pub fn new(fpid: &str, position: Point) -> Self {
        let mut value = Text::new("", position, BoardLayer::FFab);
        value.visible = false;
        Self {
            uuid: Uuid::new_v4(),
            fpid: fpid.to_string(),
            reference: Text::new("", position, BoardLayer::FSilkS),
            value,
            position,
            orientation: 0.0,
            layer: BoardLayer::FCu,
            pads: Vec::new(),
            shapes: Vec::new(),
            texts: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn is_flipped(&self) -> bool {
        self.layer == BoardLayer::BCu
    }

    /// Flip the footprint to the other side about its own origin: mirror
    /// every child in Y, swap front/back layers and negate orientations.
    pub fn flip(&mut self) {
        let axis = self.position.y;
        self.layer = self.layer.flip();
        self.orientation = normalize_angle(-self.orientation);

        self.reference.flip(axis);
        self.value.flip(axis);
        for text in &mut self.texts {
            text.flip(axis);
        }
        for shape in &mut self.shapes {
            shape.mirror_y(axis);
            shape.layer = shape.layer.flip();
        }
        for pad in &mut self.pads {
            pad.flip(axis);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Size2D {
    pub width: i64,
    pub height: i64,
}

impl Size2D {
    pub const fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    pub fn is_zero(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PadShape {
    Circle,
    Rect,
    RoundRect { ratio: f64 },
    Oval,
    /// Rectangle with all four corners chamfered.
    ChamferedRect { ratio: f64 },
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PadAttribute {
    Pth,
    Npth,
    Smd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrillShape {
    Circle,
    Oblong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Drill {
    pub shape: DrillShape,
    pub size: Size2D,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pad {
    pub number: String,
    pub net: usize,
    pub position: Point,
    pub size: Size2D,
    pub shape: PadShape,
    pub attribute: PadAttribute,
    pub layers: LayerSet,
    pub drill: Option<Drill>,
    pub orientation: f64,
    pub offset: Point,
    pub mask_size: Option<Size2D>,
    pub paste_size: Option<Size2D>,
    /// Custom shape outlines in pad-local coordinates.
    pub primitives: Vec<Polygon>,
    pub test_point: bool,
}

impl Pad {
    pub fn new(number: &str, position: Point) -> Self {
        Self {
            number: number.to_string(),
            net: NO_NET,
            position,
            size: Size2D::default(),
            shape: PadShape::Circle,
            attribute: PadAttribute::Smd,
            layers: LayerSet::new(),
            drill: None,
            orientation: 0.0,
            offset: Point::default(),
            mask_size: None,
            paste_size: None,
            primitives: Vec::new(),
            test_point: false,
        }
    }

    pub fn flip(&mut self, axis_y: i64) {
        self.position = self.position.mirror_y(axis_y);
        self.orientation = normalize_angle(-self.orientation);
        self.offset = Point::new(self.offset.x, -self.offset.y);
        self.layers = flip_set(&self.layers);
        for poly in &mut self.primitives {
            *poly = poly.map_points(|p| Point::new(p.x, -p.y));
        }
    }
}

// ============================================================================
// Routing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub uuid: Uuid,
    pub start: Point,
    pub end: Point,
    pub width: i64,
    pub layer: BoardLayer,
    pub net: usize,
}

impl Track {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcTrack {
    pub uuid: Uuid,
    pub arc: ArcGeometry,
    pub width: i64,
    pub layer: BoardLayer,
    pub net: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Via {
    pub uuid: Uuid,
    pub position: Point,
    pub width: i64,
    pub drill: i64,
    pub net: usize,
    pub test_point: bool,
}

/// Restrictions carried by a rule area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ZoneKeepout {
    pub tracks: bool,
    pub vias: bool,
    pub pads: bool,
    pub copperpour: bool,
    pub footprints: bool,
}

/// Copper zone or rule area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub uuid: Uuid,
    pub name: String,
    pub net: usize,
    pub layers: LayerSet,
    pub outline: Polygon,
    pub priority: u32,
    /// Present for rule areas.
    pub keepout: Option<ZoneKeepout>,
}

impl Zone {
    pub fn new(layers: LayerSet, outline: Polygon) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: String::new(),
            net: NO_NET,
            layers,
            outline,
            priority: 0,
            keepout: None,
        }
    }

    pub fn is_rule_area(&self) -> bool {
        self.keepout.is_some()
    }

    /// Lowest-numbered layer of the zone.
    pub fn primary_layer(&self) -> Option<BoardLayer> {
        self.layers.iter().next().copied()
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.outline.bbox()
    }
}

/// Normalize into (-180, 180].
pub fn normalize_angle(mut angle: f64) -> f64 {
    while angle <= -180.0 {
        angle += 360.0;
    }
    while angle > 180.0 {
        angle -= 360.0;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_net_reuses_existing_name() {
        let mut board = Board::new("test.txt");
        let gnd = board.add_net("GND");
        let vcc = board.add_net("VCC");
        assert_eq!(board.add_net("GND"), gnd);
        assert_ne!(gnd, vcc);
        assert_eq!(board.net_count(), 2);
        assert_eq!(board.find_net(""), None);
        assert_eq!(board.net_name(vcc), "VCC");
    }

    #[test]
    fn test_line_thickness_defaults() {
        let ds = DesignSettings::default();
        assert_eq!(ds.line_thickness(BoardLayer::FSilkS), 120_000);
        assert_eq!(ds.line_thickness(BoardLayer::Inner(2)), 200_000);
        assert_eq!(ds.line_thickness(BoardLayer::EdgeCuts), 50_000);
        assert_eq!(ds.line_thickness(BoardLayer::BCrtYd), 50_000);
        assert_eq!(ds.line_thickness(BoardLayer::FFab), 100_000);
        assert_eq!(ds.line_thickness(BoardLayer::User(1)), 100_000);
    }

    #[test]
    fn test_footprint_flip_mirrors_children() {
        let origin = Point::new(1000, 1000);
        let mut fp = Footprint::new("LIB:R", origin);
        fp.orientation = 30.0;
        let mut pad = Pad::new("1", Point::new(1500, 1200));
        pad.layers = [BoardLayer::FCu, BoardLayer::FMask].into_iter().collect();
        pad.orientation = 30.0;
        fp.pads.push(pad);
        fp.shapes.push(Shape {
            kind: ShapeKind::Segment {
                start: Point::new(900, 900),
                end: Point::new(1100, 900),
            },
            layer: BoardLayer::FSilkS,
            width: 100,
            filled: false,
        });

        fp.flip();

        assert!(fp.is_flipped());
        assert_eq!(fp.orientation, -30.0);
        assert_eq!(fp.reference.layer, BoardLayer::BSilkS);
        assert!(fp.reference.mirrored);
        let pad = &fp.pads[0];
        assert_eq!(pad.position, Point::new(1500, 800));
        assert!(pad.layers.contains(&BoardLayer::BCu));
        assert!(pad.layers.contains(&BoardLayer::BMask));
        assert_eq!(fp.shapes[0].layer, BoardLayer::BSilkS);
        assert_eq!(
            fp.shapes[0].kind,
            ShapeKind::Segment {
                start: Point::new(900, 1100),
                end: Point::new(1100, 1100),
            }
        );
    }

    #[test]
    fn test_zone_primary_layer_is_lowest_id() {
        let layers: LayerSet = [BoardLayer::BCu, BoardLayer::FCu].into_iter().collect();
        let zone = Zone::new(layers, Polygon::default());
        assert_eq!(zone.primary_layer(), Some(BoardLayer::FCu));
        assert!(!zone.is_rule_area());
    }

    #[test]
    fn test_size_with_any_zero_side_is_zero() {
        assert!(Size2D::new(0, 0).is_zero());
        assert!(Size2D::new(500_000, 0).is_zero());
        assert!(Size2D::new(0, 500_000).is_zero());
        assert!(!Size2D::new(500_000, 800_000).is_zero());
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(270.0), -90.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert_eq!(normalize_angle(45.0), 45.0);
    }
}
