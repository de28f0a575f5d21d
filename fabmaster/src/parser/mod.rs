//! FABMASTER parser
//!
//! Turns tokenized rows into a populated [`Database`]. The outer scan walks
//! the rows, detects section headers and hands each section to its processor
//! through a fixed dispatch table. Processors report how many rows they
//! consumed; the scan always advances at least one row.

pub mod columns;
pub mod format_detector;
pub mod graphics;
pub mod section;
pub mod tokenizer;

mod artwork;
mod layers;
mod padstacks;
mod placement;

pub use columns::{read_double, resolve_column, scale_factor, ColumnNotFound};
pub use format_detector::can_read_board;
pub use graphics::{make_graphic, GraphicData, GraphicError, GraphicItem, GraphicShape};
pub use section::{detect_section, detect_sections, SectionKind};
pub use tokenizer::{tokenize, Row};

use tracing::debug;

use crate::database::Database;
use crate::diagnostics::Diagnostics;
use crate::stackup::assign_layers;

/// Per-import parse state. Constructed fresh for every load.
#[derive(Debug, Default)]
pub struct ImportContext {
    pub db: Database,
    pub diagnostics: Diagnostics,
}

impl ImportContext {
    pub fn new() -> Self {
        Self::default()
    }
}

type SectionProcessor = fn(&[Row], usize, &mut ImportContext) -> usize;

fn processor_for(kind: SectionKind) -> Option<SectionProcessor> {
    match kind {
        SectionKind::PadStacks => Some(padstacks::process_padstacks),
        SectionKind::PadShapes => Some(padstacks::process_pad_shapes),
        SectionKind::SymbolPins | SectionKind::Pins => Some(placement::process_pins),
        SectionKind::Traces => Some(artwork::process_traces),
        SectionKind::Vias => Some(placement::process_vias),
        SectionKind::Nets => Some(placement::process_nets),
        SectionKind::SimpleLayers => Some(layers::process_simple_layers),
        SectionKind::Graphics => Some(artwork::process_graphics),
        SectionKind::Footprints => Some(placement::process_components),
        SectionKind::FullLayers => Some(layers::process_full_layers),
        SectionKind::Unknown => None,
    }
}

/// Parser entry points.
pub struct FabmasterParser;

impl FabmasterParser {
    /// Tokenize and parse a whole file.
    pub fn parse_str(content: &str) -> ImportContext {
        let rows = tokenize(content);
        let mut ctx = ImportContext::new();
        Self::parse_rows(&rows, &mut ctx);
        ctx
    }

    /// Run every section processor over `rows`, then assign board layers.
    pub fn parse_rows(rows: &[Row], ctx: &mut ImportContext) {
        let mut offset = 0;
        while offset < rows.len() {
            let kind = detect_section(rows, offset, &mut ctx.diagnostics);
            let consumed = match processor_for(kind) {
                Some(process) => {
                    debug!("processing {} section at row {}", kind, offset + 1);
                    process(rows, offset, ctx)
                }
                None => 0,
            };
            offset += consumed.max(1);
        }

        assign_layers(&mut ctx.db, &mut ctx.diagnostics);
    }
}

/// Walk the data rows of one section.
///
/// Reads the units row, resolves the section's columns and calls `visit` for
/// every `S` row whose cell count matches the header. Returns the number of
/// rows consumed including header and units row, or 0 when a required column
/// is missing.
pub(crate) fn walk_section<C>(
    rows: &[Row],
    offset: usize,
    ctx: &mut ImportContext,
    kind: SectionKind,
    resolve: impl FnOnce(&Row) -> Result<C, ColumnNotFound>,
    mut visit: impl FnMut(&C, &Row, usize, f64, &mut ImportContext),
) -> usize {
    let Some(header) = rows.get(offset) else {
        return 0;
    };
    let scale = scale_factor(rows, offset + 1, &mut ctx.diagnostics);
    let columns = match resolve(header) {
        Ok(columns) => columns,
        Err(e) => {
            ctx.diagnostics
                .error(format!("{} section: {}", kind, e), Some(offset + 1));
            return 0;
        }
    };

    let mut rownum = offset + 2;
    while let Some(row) = rows.get(rownum) {
        if row.first().map(String::as_str) != Some("S") {
            break;
        }
        if row.len() != header.len() {
            ctx.diagnostics.warn(
                format!(
                    "invalid row size, expected {} cells but found {}",
                    header.len(),
                    row.len()
                ),
                Some(rownum + 1),
            );
        } else {
            visit(&columns, row, rownum, scale, ctx);
        }
        rownum += 1;
    }

    rownum - offset
}
