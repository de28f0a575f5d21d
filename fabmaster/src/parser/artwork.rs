//! Trace (etch and outline) and free artwork sections.

use std::collections::btree_map::Entry;

use super::columns::{cell, opt_cell, parse_record_tag, resolve_column, ColumnNotFound};
use super::graphics::{make_graphic, GraphicColumns, GraphicItem};
use super::section::SectionKind;
use super::tokenizer::Row;
use super::{walk_section, ImportContext};
use crate::database::{GraphicGroup, GraphicSet, TraceRecord};
use crate::diagnostics::Diagnostics;

/// Class of trace records that carry reference designator text.
const REFDES_CLASS: &str = "REF DES";

/// Parse the record tag and primitive of one graphic row. Failures are
/// reported and yield `None`.
fn read_item(
    graphic: &GraphicColumns,
    row: &Row,
    rownum: usize,
    scale: f64,
    layer: &str,
    diags: &mut Diagnostics,
) -> Option<(i32, GraphicItem)> {
    let tag = cell(row, graphic.tag);
    let Some((id, seq, subseq)) = parse_record_tag(tag) else {
        diags.error(format!("invalid record tag '{}'", tag), Some(rownum + 1));
        return None;
    };

    let mut item = match make_graphic(&graphic.data(row), scale, diags, rownum) {
        Ok(item) => item,
        Err(e) => {
            diags.error(e.to_string(), Some(rownum + 1));
            return None;
        }
    };
    item.layer = layer.to_string();
    item.seq = seq;
    item.subseq = subseq;
    Some((id, item))
}

fn insert_item(set: &mut GraphicSet, id: i32, item: GraphicItem, rownum: usize, diags: &mut Diagnostics) {
    match set.entry((item.seq, item.subseq)) {
        Entry::Vacant(slot) => {
            slot.insert(item);
        }
        Entry::Occupied(_) => diags.warn(
            format!(
                "duplicate graphic item {} {} {} ignored",
                id, item.seq, item.subseq
            ),
            Some(rownum + 1),
        ),
    }
}

struct TraceColumns {
    class: usize,
    subclass: usize,
    graphic: GraphicColumns,
    net: Option<usize>,
}

pub(super) fn process_traces(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::Traces,
        |header| {
            Ok::<_, ColumnNotFound>(TraceColumns {
                class: resolve_column(header, "CLASS")?,
                subclass: resolve_column(header, "SUBCLASS")?,
                graphic: GraphicColumns::resolve(header)?,
                net: resolve_column(header, "NETNAME").ok(),
            })
        },
        |c, row, rownum, scale, ctx| {
            let class = cell(row, c.class);
            let layer = cell(row, c.subclass);
            let Some((id, item)) = read_item(&c.graphic, row, rownum, scale, layer, &mut ctx.diagnostics) else {
                return;
            };

            let db = &mut ctx.db;
            let bucket = if class == REFDES_CLASS {
                &mut db.refdes_texts
            } else if item.width == 0 {
                &mut db.zones
            } else {
                &mut db.traces
            };

            let record = bucket
                .entry((id, layer.to_string()))
                .or_insert_with(|| TraceRecord {
                    id,
                    layer: layer.to_string(),
                    net: opt_cell(row, c.net).to_string(),
                    class: class.to_string(),
                    segments: GraphicSet::new(),
                });
            insert_item(&mut record.segments, id, item, rownum, &mut ctx.diagnostics);
        },
    )
}

struct GraphicsColumns {
    graphic: GraphicColumns,
    subclass: usize,
    class: Option<usize>,
    symbol: Option<usize>,
    refdes: Option<usize>,
}

pub(super) fn process_graphics(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::Graphics,
        |header| {
            Ok::<_, ColumnNotFound>(GraphicsColumns {
                graphic: GraphicColumns::resolve(header)?,
                subclass: resolve_column(header, "SUBCLASS")?,
                class: resolve_column(header, "CLASS").ok(),
                symbol: resolve_column(header, "SYMNAME").ok(),
                refdes: resolve_column(header, "REFDES").ok(),
            })
        },
        |c, row, rownum, scale, ctx| {
            let layer = cell(row, c.subclass);
            let refdes = opt_cell(row, c.refdes);
            let Some((id, item)) = read_item(&c.graphic, row, rownum, scale, layer, &mut ctx.diagnostics) else {
                return;
            };

            let new_group = || GraphicGroup {
                id,
                subclass: layer.to_string(),
                class: opt_cell(row, c.class).to_string(),
                name: opt_cell(row, c.symbol).to_string(),
                refdes: refdes.to_string(),
                elements: GraphicSet::new(),
            };

            let db = &mut ctx.db;
            let group = if refdes.is_empty() {
                if db.board_graphics.last().map_or(true, |g| g.id != id) {
                    db.board_graphics.push(new_group());
                }
                match db.board_graphics.last_mut() {
                    Some(group) => group,
                    None => return,
                }
            } else {
                db.comp_graphics
                    .entry(refdes.to_string())
                    .or_default()
                    .entry(id)
                    .or_insert_with(new_group)
            };
            insert_item(&mut group.elements, id, item, rownum, &mut ctx.diagnostics);
        },
    )
}

#[cfg(test)]
mod tests {
    use crate::parser::FabmasterParser;

    const TRACE_HEADER: &str = "\
A!CLASS!SUBCLASS!GRAPHIC_DATA_NAME!GRAPHIC_DATA_NUMBER!RECORD_TAG!GRAPHIC_DATA_1!GRAPHIC_DATA_2!GRAPHIC_DATA_3!GRAPHIC_DATA_4!GRAPHIC_DATA_5!GRAPHIC_DATA_6!GRAPHIC_DATA_7!GRAPHIC_DATA_8!GRAPHIC_DATA_9!GRAPHIC_DATA_10!NET_NAME!
J!X!X!X!X!X!X!MILLIMETERS!X!X!X
";

    #[test]
    fn test_traces_bucketed_by_class_and_width() {
        let text = format!(
            "{TRACE_HEADER}\
S!ETCH!TOP!LINE!1!10 1 0!0!0!1!0!0.2!!!!!CONNECT!GND!
S!ETCH!TOP!LINE!2!10 2 0!1!0!2!0!0.2!!!!!CONNECT!GND!
S!ETCH!TOP!LINE!1!11 1 0!0!0!1!0!0!!!!!!GND!
S!REF DES!SILKSCREEN_TOP!TEXT!1!12 1 0!0!0!0!NO!LEFT!1 0 1 1 0 0 0 0.1!R1!!!!!
S!ETCH!TOP!LINE!1!10 2 0!5!5!6!6!0.2!!!!!!GND!
"
        );
        let ctx = FabmasterParser::parse_str(&text);
        let db = &ctx.db;
        assert_eq!(db.traces.len(), 1);
        assert_eq!(db.zones.len(), 1);
        assert_eq!(db.refdes_texts.len(), 1);
        let trace = &db.traces[&(10, "TOP".to_string())];
        assert_eq!(trace.net, "GND");
        assert_eq!(trace.class, "ETCH");
        assert_eq!(trace.segments.len(), 2);
        assert!(ctx
            .diagnostics
            .iter()
            .any(|d| d.message.contains("duplicate graphic item 10 2 0")));
    }

    #[test]
    fn test_invalid_record_tag_is_error() {
        let text = format!(
            "{TRACE_HEADER}S!ETCH!TOP!LINE!1!BAD!0!0!1!0!0.2!!!!!!GND!\n"
        );
        let ctx = FabmasterParser::parse_str(&text);
        assert!(ctx.db.traces.is_empty());
        assert!(ctx.diagnostics.iter().any(|d| d.message.contains("BAD")));
    }

    #[test]
    fn test_graphics_split_board_and_component() {
        let text = "\
A!GRAPHIC_DATA_NAME!GRAPHIC_DATA_NUMBER!RECORD_TAG!GRAPHIC_DATA_1!GRAPHIC_DATA_2!GRAPHIC_DATA_3!GRAPHIC_DATA_4!GRAPHIC_DATA_5!GRAPHIC_DATA_6!GRAPHIC_DATA_7!GRAPHIC_DATA_8!GRAPHIC_DATA_9!SUBCLASS!SYM_NAME!REFDES!
J!X!X!X!X!X!X!MILLIMETERS!X!X!X
S!LINE!1!1 1!0!0!1!0!0.1!!!!!SILKSCREEN_TOP!R0603!R1!
S!LINE!2!1 2!1!0!1!1!0.1!!!!!SILKSCREEN_TOP!R0603!R1!
S!LINE!1!5 1!0!0!9!0!0!!!!!OUTLINE!!!
S!LINE!2!5 2!9!0!9!9!0!!!!!OUTLINE!!!
S!LINE!1!6 1!0!0!1!1!0!!!!!ASSEMBLY_TOP!!!
";
        let ctx = FabmasterParser::parse_str(text);
        let db = &ctx.db;
        assert_eq!(db.comp_graphics["R1"].len(), 1);
        assert_eq!(db.comp_graphics["R1"][&1].elements.len(), 2);
        assert_eq!(db.board_graphics.len(), 2);
        assert_eq!(db.board_graphics[0].elements.len(), 2);
        assert_eq!(db.board_graphics[1].subclass, "ASSEMBLY_TOP");
    }
}
