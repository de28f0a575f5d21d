//! Padstack and custom pad outline sections.

use std::collections::btree_map::Entry;

use super::columns::{
    cell, opt_cell, parse_record_tag, read_double, read_int, resolve_column, scaled, scaled_y, try_read_double,
    ColumnNotFound,
};
use super::graphics::{make_graphic, GraphicColumns};
use super::section::SectionKind;
use super::tokenizer::Row;
use super::{walk_section, ImportContext};
use crate::database::{CustomPadShape, PadStack, PadStackShape};
use crate::geometry::ki_round;

/// Prefix marking custom pad outline rows.
const FIG_SHAPE_PREFIX: &str = "FIG_SHAPE ";

struct PadStackColumns {
    name: usize,
    recnum: usize,
    layer: usize,
    fixed: Option<usize>,
    via: Option<usize>,
    shape: usize,
    width: usize,
    height: usize,
    x_offset: usize,
    y_offset: usize,
    shape_name: usize,
}

impl PadStackColumns {
    fn resolve(header: &Row) -> Result<Self, ColumnNotFound> {
        Ok(Self {
            name: resolve_column(header, "PADNAME")?,
            recnum: resolve_column(header, "RECNUMBER")?,
            layer: resolve_column(header, "LAYER")?,
            fixed: resolve_column(header, "FIXFLAG").ok(),
            via: resolve_column(header, "VIAFLAG").ok(),
            shape: resolve_column(header, "PADSHAPE1")?,
            width: resolve_column(header, "PADWIDTH")?,
            height: resolve_column(header, "PADHGHT")?,
            x_offset: resolve_column(header, "PADXOFF")?,
            y_offset: resolve_column(header, "PADYOFF")?,
            shape_name: resolve_column(header, "PADSHAPENAME")?,
        })
    }
}

pub(super) fn process_padstacks(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::PadStacks,
        PadStackColumns::resolve,
        |c, row, rownum, scale, ctx| {
            let name = cell(row, c.name);
            let layer = cell(row, c.layer);
            let shape = cell(row, c.shape);
            let shape_name = cell(row, c.shape_name);
            let width = scaled(cell(row, c.width), scale);
            let height = scaled(cell(row, c.height), scale);

            if !layer.is_empty() && !layer.starts_with('~') && !shape.is_empty() && width > 0 {
                ctx.db.ensure_layer(layer, true);
            }

            let pad = ctx
                .db
                .padstacks
                .entry(name.to_string())
                .or_insert_with(|| PadStack {
                    name: name.to_string(),
                    ..Default::default()
                });
            pad.fixed |= opt_cell(row, c.fixed) == "YES";
            pad.via |= opt_cell(row, c.via) == "YES";

            if layer == "~DRILL" {
                let fields = [
                    ("hit", shape),
                    ("width", cell(row, c.width)),
                    ("height", cell(row, c.height)),
                ];
                for (field, text) in fields {
                    if !text.is_empty() && try_read_double(text).is_none() {
                        ctx.diagnostics.warn(
                            format!("invalid drill {} '{}' in padstack '{}'", field, text, name),
                            Some(rownum + 1),
                        );
                    }
                }
                let hit = ki_round((read_double(shape) * scale).abs());
                if hit == 0 {
                    pad.drill = false;
                    return;
                }
                pad.drill = true;
                let (dx, dy) = (width.abs(), height.abs());
                // Some exporters leave the hit at a nominal value for round
                // drills and only the x/y sizes agree.
                if dx == dy {
                    pad.drill_size_x = hit;
                    pad.drill_size_y = hit;
                } else {
                    pad.drill_size_x = dx;
                    pad.drill_size_y = dy;
                }
                pad.plated = shape_name.starts_with('P');
                return;
            }

            if shape.is_empty() || width <= 0 {
                return;
            }

            if layer.starts_with('~') {
                match layer {
                    "~TSM" | "~BSM" => {
                        pad.mask_width = width;
                        pad.mask_height = height;
                    }
                    "~TSP" | "~BSP" => {
                        pad.paste_width = width;
                        pad.paste_height = height;
                    }
                    _ => {}
                }
                return;
            }

            pad.copper_layers.insert(layer.to_string());

            if read_int(cell(row, c.recnum)) != 1 {
                return;
            }

            let kind = match shape {
                "CIRCLE" => PadStackShape::Circle,
                "RECTANGLE" => PadStackShape::Rect,
                "ROUNDED_RECT" => PadStackShape::RoundRect,
                "SQUARE" => PadStackShape::Square,
                "OBLONG" | "OBLONG_X" | "OBLONG_Y" => PadStackShape::Oblong,
                "OCTAGON" => PadStackShape::Octagon,
                "SHAPE" => PadStackShape::Custom,
                other => {
                    ctx.diagnostics.warn(
                        format!("unknown pad shape name '{}' on layer '{}'", other, layer),
                        Some(rownum + 1),
                    );
                    return;
                }
            };

            pad.shape = kind;
            pad.x_offset = scaled(cell(row, c.x_offset), scale);
            pad.y_offset = scaled_y(cell(row, c.y_offset), scale);
            pad.width = width;
            pad.height = match kind {
                PadStackShape::Circle | PadStackShape::Square => width,
                _ => height,
            };
            if kind == PadStackShape::Custom {
                pad.custom_name = shape_name
                    .strip_prefix(FIG_SHAPE_PREFIX)
                    .unwrap_or(shape_name)
                    .to_string();
            }
        },
    )
}

struct PadShapeColumns {
    subclass: usize,
    shape_name: usize,
    graphic: GraphicColumns,
    padstack: usize,
    refdes: usize,
    pin: usize,
}

impl PadShapeColumns {
    fn resolve(header: &Row) -> Result<Self, ColumnNotFound> {
        Ok(Self {
            subclass: resolve_column(header, "SUBCLASS")?,
            shape_name: resolve_column(header, "PADSHAPENAME")?,
            graphic: GraphicColumns::resolve(header)?,
            padstack: resolve_column(header, "PADSTACKNAME")?,
            refdes: resolve_column(header, "REFDES")?,
            pin: resolve_column(header, "PINNUMBER")?,
        })
    }
}

pub(super) fn process_pad_shapes(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::PadShapes,
        PadShapeColumns::resolve,
        |c, row, rownum, scale, ctx| {
            let Some(name) = cell(row, c.shape_name).strip_prefix(FIG_SHAPE_PREFIX) else {
                return;
            };
            let padstack = cell(row, c.padstack);
            let refdes = cell(row, c.refdes);
            let pin = cell(row, c.pin);

            let tag = cell(row, c.graphic.tag);
            let Some((id, seq, _)) = parse_record_tag(tag) else {
                ctx.diagnostics.error(
                    format!("invalid record tag '{}' in pad shape '{}'", tag, name),
                    Some(rownum + 1),
                );
                return;
            };

            let mut item = match make_graphic(&c.graphic.data(row), scale, &mut ctx.diagnostics, rownum) {
                Ok(item) => item,
                Err(e) => {
                    ctx.diagnostics.error(
                        format!("pad shape '{}': {}", name, e),
                        Some(rownum + 1),
                    );
                    return;
                }
            };
            item.layer = cell(row, c.subclass).to_string();
            item.seq = seq;
            item.subseq = 0;

            let shape = ctx
                .db
                .pad_shapes
                .entry((name.to_string(), refdes.to_string(), pin.to_string()))
                .or_insert_with(|| CustomPadShape {
                    name: name.to_string(),
                    padstack: padstack.to_string(),
                    refdes: refdes.to_string(),
                    pin: pin.to_string(),
                    ..Default::default()
                });

            match shape.elements.entry(id).or_default().entry((seq, 0)) {
                Entry::Vacant(slot) => {
                    slot.insert(item);
                }
                Entry::Occupied(_) => {
                    ctx.diagnostics.warn(
                        format!("could not insert graphical item {} into padstack '{}'", seq, padstack),
                        Some(rownum + 1),
                    );
                }
            }
        },
    )
}
