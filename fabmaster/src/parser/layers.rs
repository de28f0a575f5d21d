//! Layer sections: the short CLASS/SUBCLASS list and the full LAYERSORT
//! stackup.

use super::columns::{cell, opt_cell, read_int, resolve_column, ColumnNotFound};
use super::section::SectionKind;
use super::tokenizer::Row;
use super::{walk_section, ImportContext};

struct SimpleLayerColumns {
    class: usize,
    subclass: usize,
}

pub(super) fn process_simple_layers(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::SimpleLayers,
        |header| {
            Ok::<_, ColumnNotFound>(SimpleLayerColumns {
                class: resolve_column(header, "CLASS")?,
                subclass: resolve_column(header, "SUBCLASS")?,
            })
        },
        |c, row, _, _, ctx| {
            let subclass = cell(row, c.subclass);
            if subclass.is_empty() || ctx.db.layers.contains_key(subclass) {
                return;
            }
            let class = cell(row, c.class);
            let conductive = class == "ETCH" || class == "ANTI ETCH";
            let layer = ctx.db.ensure_layer(subclass, conductive);
            layer.positive = class != "ANTI ETCH";
        },
    )
}

struct FullLayerColumns {
    sort: usize,
    subclass: usize,
    artwork: usize,
    conductor: usize,
    material: Option<usize>,
}

pub(super) fn process_full_layers(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::FullLayers,
        |header| {
            Ok::<_, ColumnNotFound>(FullLayerColumns {
                sort: resolve_column(header, "LAYERSORT")?,
                subclass: resolve_column(header, "LAYERSUBCLASS")?,
                artwork: resolve_column(header, "LAYERARTWORK")?,
                conductor: resolve_column(header, "LAYERCONDUCTOR")?,
                material: resolve_column(header, "LAYERMATERIAL").ok(),
            })
        },
        |c, row, _, _, ctx| {
            let name = cell(row, c.subclass);
            if name.is_empty() || opt_cell(row, c.material) == "AIR" {
                return;
            }
            let conductive = cell(row, c.conductor) == "YES";
            let layer = ctx.db.ensure_layer(name, conductive);
            layer.sort_key = read_int(cell(row, c.sort));
            layer.conductive = conductive;
            layer.positive = cell(row, c.artwork) != "NEGATIVE";
        },
    )
}
