//! Footprint, pad and reference text synthesis.
//!
//! Mirrored components are built in their top-side form (pads, graphics and
//! text mirrored about the footprint origin) and flipped as the last step,
//! so the flip restores the source geometry on the bottom side.

use tracing::debug;

use super::shapes::{create_board_items, make_text, BoardItem, ContourBuilder, SubContour};
use super::BoardLoader;
use crate::board::{
    flip_set, normalize_angle, BoardLayer, Drill, DrillShape, Footprint, LayerSet, Pad, PadAttribute, PadShape,
    Size2D, NO_NET,
};
use crate::core::ImportError;
use crate::database::{Component, PadStack, PadStackShape, Pin};
use crate::geometry::{merge_contours, rotate_point, Point, Polygon};
use crate::parser::graphics::GraphicShape;
use crate::progress::Checkpoint;

/// Corner ratio of rounded-rect pads.
const ROUNDRECT_RATIO: f64 = 0.25;

/// Characters that may not appear in a footprint id.
const ILLEGAL_ID_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Chamfer ratio that turns a square into a regular octagon.
pub fn octagon_chamfer_ratio() -> f64 {
    1.0 - std::f64::consts::FRAC_1_SQRT_2
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_ID_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// `<library>:<symbol>[_<index>]`
pub fn footprint_id(library: &str, symbol: &str, index: Option<usize>) -> String {
    let name = match index {
        Some(i) => format!("{}_{}", symbol, i),
        None => symbol.to_string(),
    };
    format!("{}:{}", sanitize(library), sanitize(&name))
}

/// References must start with a letter; anything else gets a `UNK` prefix.
pub fn normalize_reference(refdes: &str) -> String {
    if refdes.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        refdes.to_string()
    } else {
        format!("UNK{}", refdes)
    }
}

fn circle_fallback(pad: &mut Pad, stack: &PadStack) {
    let diameter = stack.width.min(stack.height);
    pad.shape = PadShape::Circle;
    pad.size = Size2D::new(diameter, diameter);
    pad.primitives.clear();
}

impl BoardLoader<'_> {
    pub(super) fn load_footprints(&mut self, progress: &mut Checkpoint<'_>) -> Result<(), ImportError> {
        let db = self.db;
        for placements in db.components.values() {
            let multiple = placements.len() > 1;
            for (i, comp) in placements.iter().enumerate() {
                progress.tick()?;
                let footprint = self.build_footprint(comp, multiple.then_some(i));
                self.board.add_footprint(footprint);
            }
        }
        Ok(())
    }

    fn build_footprint(&mut self, comp: &Component, index: Option<usize>) -> Footprint {
        let position = Point::new(comp.x, comp.y);
        let mut fp = Footprint::new(&footprint_id(self.nickname, &comp.name, index), position);
        fp.reference.text = normalize_reference(&comp.refdes);
        fp.value.text = comp.value.clone();

        for (key, value) in [
            ("Part Number", &comp.part_number),
            ("Height", &comp.height),
            ("Device Label", &comp.device_label),
            ("Insertion Code", &comp.insertion_code),
            ("Tolerance", &comp.tolerance),
            ("Voltage", &comp.voltage),
        ] {
            if !value.is_empty() {
                fp.properties.insert(key.to_string(), value.clone());
            }
        }

        self.attach_reference_text(&mut fp, comp);
        fp.orientation = normalize_angle(if comp.mirror { -comp.rotation } else { comp.rotation });
        self.attach_graphics(&mut fp, comp);
        self.attach_pads(&mut fp, comp);

        if comp.mirror {
            fp.flip();
        }
        fp
    }

    fn attach_reference_text(&mut self, fp: &mut Footprint, comp: &Component) {
        let db = self.db;
        for record in db.refdes_texts.values() {
            let Some(first) = record.segments.values().next() else {
                continue;
            };
            let GraphicShape::Text(src) = &first.shape else {
                continue;
            };
            if src.text != comp.refdes {
                continue;
            }
            let Some(layer) = db.board_layer(&record.layer) else {
                debug!("layer {} is not mapped to a board layer", record.layer);
                continue;
            };

            let mut text = make_text(src, layer);
            text.position = Point::new(src.position.x, src.position.y - src.height / 2);
            if comp.mirror {
                text.flip(comp.y);
            }
            if layer.is_silk() {
                text.text = fp.reference.text.clone();
                fp.reference = text;
            } else {
                fp.texts.push(text);
            }
        }
    }

    fn attach_graphics(&mut self, fp: &mut Footprint, comp: &Component) {
        let db = self.db;
        let Some(groups) = db.comp_graphics.get(&comp.refdes) else {
            return;
        };
        for item in groups.values().flat_map(|g| g.elements.values()) {
            let layer = db.board_layer(&item.layer).unwrap_or(BoardLayer::DwgsUser);
            for board_item in create_board_items(item, layer, &self.board.settings) {
                match board_item {
                    BoardItem::Shape(mut shape) => {
                        if comp.mirror {
                            shape.mirror_y(comp.y);
                            shape.layer = shape.layer.flip();
                        }
                        fp.shapes.push(shape);
                    }
                    BoardItem::Text(mut text) => {
                        if comp.mirror {
                            text.flip(comp.y);
                        }
                        fp.texts.push(text);
                    }
                }
            }
        }
    }

    fn attach_pads(&mut self, fp: &mut Footprint, comp: &Component) {
        let db = self.db;
        let Some(pins) = db.pins.get(&comp.refdes) else {
            return;
        };
        for pin in pins.values() {
            let Some(stack) = db.padstacks.get(&pin.padstack) else {
                self.diags.warn(
                    format!(
                        "unable to locate padstack {} for pin {}.{}",
                        pin.padstack, comp.refdes, pin.number
                    ),
                    None,
                );
                continue;
            };
            let pad = self.build_pad(comp, pin, stack);
            if pad.size.is_zero() {
                self.diags.warn(
                    format!("invalid zero-sized pad {}.{} ignored", comp.refdes, pin.number),
                    None,
                );
                continue;
            }
            fp.pads.push(pad);
        }
    }

    fn build_pad(&mut self, comp: &Component, pin: &Pin, stack: &PadStack) -> Pad {
        let db = self.db;
        let y = if comp.mirror { 2 * comp.y - pin.y } else { pin.y };
        let mut pad = Pad::new(&pin.number, Point::new(pin.x, y));
        pad.test_point = pin.test_point;
        pad.net = db
            .pin_nets
            .get(&(comp.refdes.clone(), pin.number.clone()))
            .and_then(|binding| self.board.find_net(&binding.name))
            .unwrap_or(NO_NET);
        pad.orientation = normalize_angle(if comp.mirror {
            pin.rotation - comp.rotation
        } else {
            comp.rotation - pin.rotation
        });
        pad.offset = Point::new(stack.x_offset, stack.y_offset);
        if stack.mask_width > 0 {
            pad.mask_size = Some(Size2D::new(stack.mask_width, stack.mask_height));
        }
        if stack.paste_width > 0 {
            pad.paste_size = Some(Size2D::new(stack.paste_width, stack.paste_height));
        }

        pad.size = Size2D::new(stack.width, stack.height);
        pad.shape = match stack.shape {
            PadStackShape::Circle => PadShape::Circle,
            PadStackShape::Rect | PadStackShape::Square => PadShape::Rect,
            PadStackShape::RoundRect => PadShape::RoundRect {
                ratio: ROUNDRECT_RATIO,
            },
            PadStackShape::Oblong => PadShape::Oval,
            PadStackShape::Octagon => PadShape::ChamferedRect {
                ratio: octagon_chamfer_ratio(),
            },
            PadStackShape::Custom => PadShape::Custom,
        };
        if stack.shape == PadStackShape::Custom {
            self.apply_custom_shape(&mut pad, comp, pin, stack);
        }

        let sides: Vec<BoardLayer> = stack
            .copper_layers
            .iter()
            .filter_map(|name| db.board_layer(name))
            .collect();
        let top = sides.contains(&BoardLayer::FCu);
        let bottom = sides.contains(&BoardLayer::BCu);

        if stack.drill {
            let size = Size2D::new(stack.drill_size_x, stack.drill_size_y);
            pad.drill = Some(Drill {
                shape: if size.width == size.height {
                    DrillShape::Circle
                } else {
                    DrillShape::Oblong
                },
                size,
            });
            if stack.plated {
                pad.attribute = PadAttribute::Pth;
                pad.layers = self.board.copper_layers().into_iter().collect();
                pad.layers.extend([BoardLayer::FMask, BoardLayer::BMask]);
            } else {
                pad.attribute = PadAttribute::Npth;
                pad.layers =
                    LayerSet::from([BoardLayer::FCu, BoardLayer::BCu, BoardLayer::FMask, BoardLayer::BMask]);
            }
        } else {
            pad.attribute = PadAttribute::Smd;
            let smd = LayerSet::from([BoardLayer::FCu, BoardLayer::FPaste, BoardLayer::FMask]);
            pad.layers = if bottom && !top { flip_set(&smd) } else { smd };
        }

        pad
    }

    /// Build the outline of a custom pad from its `FIG_SHAPE` records, in
    /// pad-local coordinates. Degenerate or disjoint outlines fall back to a
    /// circular pad.
    fn apply_custom_shape(&mut self, pad: &mut Pad, comp: &Component, pin: &Pin, stack: &PadStack) {
        let db = self.db;
        let anchor = stack.width.min(stack.height) / 2;
        pad.size = Size2D::new(anchor, anchor);

        let Some(custom) = db.custom_pad(&stack.custom_name, &comp.refdes, &pin.number) else {
            self.diags.warn(
                format!(
                    "could not find custom pad '{}', replacing {}.{} with a circular pad",
                    stack.custom_name, comp.refdes, pin.number
                ),
                None,
            );
            circle_fallback(pad, stack);
            return;
        };

        let primary = if comp.mirror {
            BoardLayer::BCu
        } else {
            BoardLayer::FCu
        };
        let context = format!("custom pad '{}'", custom.name);
        let mut chains = Vec::new();
        for group in custom.elements.values() {
            let Some(first) = group.values().next() else {
                continue;
            };
            if db.board_layer(&first.layer) != Some(primary) {
                continue;
            }
            let poly = ContourBuilder::new(SubContour::Hole, self.options.arc_max_error, &context)
                .build(group.values(), self.diags);
            chains.push(poly.outline);
            chains.extend(poly.holes);
        }

        let merged = merge_contours(&chains);
        let [shape] = merged.as_slice() else {
            self.diags.warn(
                format!(
                    "invalid custom pad '{}' ({} outlines), replacing with circular pad",
                    custom.name,
                    merged.len()
                ),
                None,
            );
            circle_fallback(pad, stack);
            return;
        };
        if shape.is_degenerate() {
            self.diags.warn(
                format!("invalid custom pad '{}', replacing with circular pad", custom.name),
                None,
            );
            circle_fallback(pad, stack);
            return;
        }

        let origin = pad.position;
        let orientation = pad.orientation;
        let local = shape
            .fracture()
            .into_iter()
            .map(|p| {
                let p = if comp.mirror { p.mirror_y(comp.y) } else { p };
                rotate_point(p - origin, Point::default(), -orientation)
            })
            .collect();
        pad.primitives = vec![Polygon::new(local)];
    }
}
