//! Section detection
//!
//! A section starts with a header row whose first cell ends in `A`. The next
//! two or three header labels identify what the section holds.

use serde::Serialize;
use std::fmt;

use super::tokenizer::Row;
use crate::diagnostics::Diagnostics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionKind {
    PadStacks,
    PadShapes,
    SymbolPins,
    Pins,
    Traces,
    Vias,
    Nets,
    SimpleLayers,
    Graphics,
    Footprints,
    FullLayers,
    Unknown,
}

impl SectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::PadStacks => "pad stacks",
            SectionKind::PadShapes => "pad shapes",
            SectionKind::SymbolPins => "symbol pins",
            SectionKind::Pins => "pins",
            SectionKind::Traces => "traces",
            SectionKind::Vias => "vias",
            SectionKind::Nets => "nets",
            SectionKind::SimpleLayers => "simple layers",
            SectionKind::Graphics => "graphics",
            SectionKind::Footprints => "footprints",
            SectionKind::FullLayers => "full layers",
            SectionKind::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != SectionKind::Unknown
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn strip(label: Option<&String>) -> String {
    label
        .map(|s| s.chars().filter(|c| *c != '_').collect())
        .unwrap_or_default()
}

/// True when the row looks like a section header.
pub fn is_header_row(row: &Row) -> bool {
    row.len() >= 3 && row[0].ends_with('A')
}

/// Classify the header row at `offset` without reporting anything.
pub fn classify(rows: &[Row], offset: usize) -> SectionKind {
    let Some(row) = rows.get(offset) else {
        return SectionKind::Unknown;
    };
    if !is_header_row(row) {
        return SectionKind::Unknown;
    }

    let h1 = strip(row.get(1));
    let h2 = strip(row.get(2));
    let h3 = strip(row.get(3));

    match (h1.as_str(), h2.as_str(), h3.as_str()) {
        ("REFDES", "COMPCLASS", _) => SectionKind::Footprints,
        ("NETNAME", "REFDES", _) => SectionKind::Nets,
        ("CLASS", "SUBCLASS", "") => SectionKind::SimpleLayers,
        ("GRAPHICDATANAME", "GRAPHICDATANUMBER", _) => SectionKind::Graphics,
        ("CLASS", "SUBCLASS", "GRAPHICDATANAME") => SectionKind::Traces,
        ("SYMNAME", "PINNAME", _) => SectionKind::SymbolPins,
        ("SYMNAME", "SYMMIRROR", "PINNAME") => SectionKind::Pins,
        ("VIAX", "VIAY", _) => SectionKind::Vias,
        ("SUBCLASS", "PADSHAPENAME", _) => SectionKind::PadShapes,
        ("PADNAME", _, _) => SectionKind::PadStacks,
        ("LAYERSORT", _, _) => SectionKind::FullLayers,
        _ => SectionKind::Unknown,
    }
}

/// Classify the row at `offset`, warning about header rows that match no
/// known section.
pub fn detect_section(rows: &[Row], offset: usize, diags: &mut Diagnostics) -> SectionKind {
    let kind = classify(rows, offset);
    if kind == SectionKind::Unknown {
        if let Some(row) = rows.get(offset).filter(|r| is_header_row(r)) {
            diags.warn(
                format!("unknown FABMASTER section {}:{}", row[1], row[2]),
                Some(offset + 1),
            );
        }
    }
    kind
}

/// Every known section header in the file, with its 1-based row number.
pub fn detect_sections(rows: &[Row]) -> Vec<(usize, SectionKind)> {
    (0..rows.len())
        .filter_map(|i| {
            let kind = classify(rows, i);
            kind.is_known().then_some((i + 1, kind))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenizer::tokenize;

    fn detect(line: &str) -> SectionKind {
        classify(&tokenize(line), 0)
    }

    #[test]
    fn test_detect_known_sections() {
        assert_eq!(detect("A!REFDES!COMP_CLASS!COMP_PART_NUMBER!"), SectionKind::Footprints);
        assert_eq!(detect("A!NET_NAME!REFDES!PIN_NUMBER!"), SectionKind::Nets);
        assert_eq!(detect("A!CLASS!SUBCLASS!"), SectionKind::SimpleLayers);
        assert_eq!(
            detect("A!GRAPHIC_DATA_NAME!GRAPHIC_DATA_NUMBER!RECORD_TAG!"),
            SectionKind::Graphics
        );
        assert_eq!(
            detect("A!CLASS!SUBCLASS!GRAPHIC_DATA_NAME!GRAPHIC_DATA_NUMBER!"),
            SectionKind::Traces
        );
        assert_eq!(detect("A!SYM_NAME!PIN_NAME!PIN_NUMBER!"), SectionKind::SymbolPins);
        assert_eq!(detect("A!SYM_NAME!SYM_MIRROR!PIN_NAME!"), SectionKind::Pins);
        assert_eq!(detect("A!VIA_X!VIA_Y!PAD_STACK_NAME!"), SectionKind::Vias);
        assert_eq!(detect("A!SUBCLASS!PAD_SHAPE_NAME!GRAPHIC_DATA_NAME!"), SectionKind::PadShapes);
        assert_eq!(detect("A!PAD_NAME!REC_NUMBER!LAYER!"), SectionKind::PadStacks);
        assert_eq!(detect("A!LAYER_SORT!LAYER_SUBCLASS!LAYER_ARTWORK!"), SectionKind::FullLayers);
    }

    #[test]
    fn test_header_marker_required() {
        assert_eq!(detect("S!REFDES!COMP_CLASS!"), SectionKind::Unknown);
        assert_eq!(detect("A!REFDES"), SectionKind::Unknown);
    }

    #[test]
    fn test_unknown_header_warns_once() {
        let rows = tokenize("A!FOO!BAR!BAZ!\nS!1!2!3!\n");
        let mut diags = Diagnostics::new();
        assert_eq!(detect_section(&rows, 0, &mut diags), SectionKind::Unknown);
        assert_eq!(detect_section(&rows, 1, &mut diags), SectionKind::Unknown);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_detect_sections_lists_rows() {
        let rows = tokenize("J!X\nA!REFDES!COMP_CLASS!\nS!R1!IC!\nA!VIA_X!VIA_Y!\n");
        let found = detect_sections(&rows);
        assert_eq!(
            found,
            vec![(2, SectionKind::Footprints), (4, SectionKind::Vias)]
        );
    }
}
