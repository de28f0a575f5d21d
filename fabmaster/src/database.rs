//! Intermediate import database
//!
//! Everything the section processors extract lives here, keyed by name so
//! that cross references (pin to padstack, pin to net, graphic to layer) are
//! plain lookups. The database is built by the parser and consumed by the
//! board loader; it holds no board objects itself.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::board::BoardLayer;
use crate::parser::graphics::GraphicItem;

/// Primitives of one contour group, ordered by (seq, subseq).
pub type GraphicSet = BTreeMap<(i32, i32), GraphicItem>;

/// A source layer and where it landed on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FabLayer {
    pub name: String,
    /// Declared stackup position, used to order copper layers.
    pub sort_key: i64,
    pub conductive: bool,
    pub positive: bool,
    pub disabled: bool,
    pub target: Option<BoardLayer>,
}

impl FabLayer {
    pub fn new(name: &str, sort_key: i64, conductive: bool) -> Self {
        Self {
            name: name.to_string(),
            sort_key,
            conductive,
            positive: true,
            disabled: false,
            target: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PadStackShape {
    #[default]
    Circle,
    Rect,
    RoundRect,
    Square,
    Oblong,
    Octagon,
    Custom,
}

/// Named padstack definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PadStack {
    pub name: String,
    pub shape: PadStackShape,
    /// Suffix of the `FIG_SHAPE` outline used by custom pads.
    pub custom_name: String,
    pub width: i64,
    pub height: i64,
    pub x_offset: i64,
    pub y_offset: i64,
    pub mask_width: i64,
    pub mask_height: i64,
    pub paste_width: i64,
    pub paste_height: i64,
    pub drill: bool,
    pub drill_size_x: i64,
    pub drill_size_y: i64,
    pub plated: bool,
    pub fixed: bool,
    pub via: bool,
    /// Source copper layers the padstack has geometry on.
    pub copper_layers: BTreeSet<String>,
}

/// Key of a custom pad outline: (shape name, refdes, pin number).
pub type CustomPadKey = (String, String, String);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomPadShape {
    pub name: String,
    pub padstack: String,
    pub refdes: String,
    pub pin: String,
    /// Outline groups by record id.
    pub elements: BTreeMap<i32, GraphicSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ComponentClass {
    Io,
    Ic,
    Discrete,
    #[default]
    Unknown,
}

impl ComponentClass {
    pub fn parse(text: &str) -> Self {
        match text {
            "IO" => ComponentClass::Io,
            "IC" => ComponentClass::Ic,
            "DISCRETE" => ComponentClass::Discrete,
            _ => ComponentClass::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SymbolType {
    Package,
    Mechanical,
    Format,
    #[default]
    Unknown,
}

impl SymbolType {
    pub fn parse(text: &str) -> Self {
        match text {
            "PACKAGE" => SymbolType::Package,
            "MECHANICAL" => SymbolType::Mechanical,
            "FORMAT" => SymbolType::Format,
            _ => SymbolType::Unknown,
        }
    }
}

/// One placed component.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Component {
    pub refdes: String,
    pub class: ComponentClass,
    pub part_number: String,
    pub height: String,
    pub device_label: String,
    pub insertion_code: String,
    pub symbol_type: SymbolType,
    /// Symbol (footprint) name.
    pub name: String,
    pub mirror: bool,
    pub rotation: f64,
    pub x: i64,
    pub y: i64,
    pub value: String,
    pub tolerance: String,
    pub voltage: String,
}

/// Absolute pin placement of one component pin.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pin {
    pub symbol: String,
    pub name: String,
    pub number: String,
    pub x: i64,
    pub y: i64,
    pub rotation: f64,
    pub padstack: String,
    pub refdes: String,
    pub mirror: bool,
    pub test_point: bool,
}

/// Net membership of one pin.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetBinding {
    pub name: String,
    pub refdes: String,
    pub pin_number: String,
    pub pin_name: String,
    pub ground: bool,
    pub power: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViaRecord {
    pub x: i64,
    pub y: i64,
    pub padstack: String,
    pub net: String,
    pub test_point: bool,
}

/// A group of etch or drawing primitives sharing one record id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceRecord {
    pub id: i32,
    pub layer: String,
    pub net: String,
    pub class: String,
    pub segments: GraphicSet,
}

/// Footprint or board artwork grouped by record id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphicGroup {
    pub id: i32,
    pub subclass: String,
    pub class: String,
    pub name: String,
    pub refdes: String,
    pub elements: GraphicSet,
}

/// Key of a trace bucket entry: (record id, source layer).
pub type TraceKey = (i32, String);

#[derive(Debug, Clone, Default, Serialize)]
pub struct Database {
    pub layers: BTreeMap<String, FabLayer>,
    pub padstacks: BTreeMap<String, PadStack>,
    pub pad_shapes: BTreeMap<CustomPadKey, CustomPadShape>,
    /// Placements per refdes; more than one entry means a repeated refdes.
    pub components: BTreeMap<String, Vec<Component>>,
    /// Pins per refdes, keyed by pin number.
    pub pins: BTreeMap<String, BTreeMap<String, Pin>>,
    #[serde(skip)]
    pub pin_nets: HashMap<(String, String), NetBinding>,
    pub net_names: BTreeSet<String>,
    pub vias: Vec<ViaRecord>,
    /// Reference designator text records.
    pub refdes_texts: BTreeMap<TraceKey, TraceRecord>,
    /// Zero-width etch records: fills, keepouts and outlines.
    pub zones: BTreeMap<TraceKey, TraceRecord>,
    /// Stroked etch and drawing records.
    pub traces: BTreeMap<TraceKey, TraceRecord>,
    pub board_graphics: Vec<GraphicGroup>,
    pub comp_graphics: BTreeMap<String, BTreeMap<i32, GraphicGroup>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Board layer a source layer name was assigned to.
    pub fn board_layer(&self, name: &str) -> Option<BoardLayer> {
        self.layers
            .get(name)
            .filter(|l| !l.disabled)
            .and_then(|l| l.target)
    }

    /// Conductive source layers in stackup order.
    pub fn conductive_layers(&self) -> Vec<&FabLayer> {
        let mut copper: Vec<&FabLayer> = self.layers.values().filter(|l| l.conductive).collect();
        copper.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then_with(|| a.name.cmp(&b.name)));
        copper
    }

    pub fn copper_layer_count(&self) -> usize {
        self.layers.values().filter(|l| l.conductive).count()
    }

    /// Add a layer if it is not known yet; new layers are ordered after all
    /// existing ones.
    pub fn ensure_layer(&mut self, name: &str, conductive: bool) -> &mut FabLayer {
        let next = self.layers.len() as i64;
        self.layers
            .entry(name.to_string())
            .or_insert_with(|| FabLayer::new(name, next, conductive))
    }

    /// Number of entries the loader will walk, used for progress reporting.
    pub fn entry_count(&self) -> usize {
        self.net_names.len()
            + self.layers.len()
            + self.vias.len()
            + self.components.values().map(Vec::len).sum::<usize>()
            + self.zones.len()
            + self.board_graphics.len()
            + self.traces.len()
    }

    /// Custom pad outline for a pin, falling back to any outline of the same
    /// name when no per-pin entry exists.
    pub fn custom_pad(&self, name: &str, refdes: &str, pin: &str) -> Option<&CustomPadShape> {
        let key = (name.to_string(), refdes.to_string(), pin.to_string());
        self.pad_shapes.get(&key).or_else(|| {
            self.pad_shapes
                .range((name.to_string(), String::new(), String::new())..)
                .take_while(|((n, _, _), _)| n == name)
                .map(|(_, shape)| shape)
                .next()
        })
    }
}
