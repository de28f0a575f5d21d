//! Tests for format detection, section parsing and load control

use fabmaster::parser::{detect_sections, tokenize, SectionKind};
use fabmaster::prelude::*;
use fabmaster::{can_read_board, FabmasterParser};
use std::io::Write;
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_fixture_sections_detected() {
    let text = std::fs::read_to_string(fixture_path("minimal_board.txt")).unwrap();
    let kinds: Vec<SectionKind> = detect_sections(&tokenize(&text))
        .into_iter()
        .map(|(_, kind)| kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            SectionKind::FullLayers,
            SectionKind::SimpleLayers,
            SectionKind::PadStacks,
            SectionKind::Footprints,
            SectionKind::Pins,
            SectionKind::Nets,
            SectionKind::Vias,
            SectionKind::Traces,
            SectionKind::Graphics,
        ]
    );
}

#[test]
fn test_parse_fixture_database() {
    let text = std::fs::read_to_string(fixture_path("minimal_board.txt")).unwrap();
    let ctx = FabmasterParser::parse_str(&text);
    let db = &ctx.db;

    assert_eq!(db.components.len(), 2);
    assert_eq!(db.padstacks.len(), 3);
    assert_eq!(db.pins["R1"].len(), 2);
    assert_eq!(db.net_names.len(), 2);
    assert_eq!(db.vias.len(), 1);
    assert_eq!(db.traces.len(), 1);
    assert_eq!(db.zones.len(), 3);
    assert_eq!(db.refdes_texts.len(), 1);
    assert_eq!(db.board_graphics.len(), 1);
    assert_eq!(db.board_layer("TOP"), Some(BoardLayer::FCu));
    assert_eq!(db.board_layer("BOTTOM"), Some(BoardLayer::BCu));
    assert_eq!(db.board_layer("SILKSCREEN_BOTTOM"), Some(BoardLayer::BSilkS));
    assert_eq!(db.board_layer("ASSEMBLY_TOP"), Some(BoardLayer::FFab));
}

#[test]
fn test_can_read_fixture() {
    assert!(can_read_board(&fixture_path("minimal_board.txt")));
}

#[test]
fn test_cannot_read_other_text() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "just some notes").unwrap();
    writeln!(file, "A!FOO!BAR!BAZ!").unwrap();
    assert!(!can_read_board(file.path()));
    assert!(!can_read_board(Path::new("/nonexistent/board.txt")));
}

#[test]
fn test_malformed_rows_are_diagnostics_not_failures() {
    let text = "\
A!VIA_X!VIA_Y!PAD_STACK_NAME!NET_NAME!
J!X!X!X!X!X!X!MILS!X!X!X
S!10!20!VIA!GND!
S!10!20!
A!REFDES!COMP_CLASS!
S!R1!IC!
";
    let result = FabmasterImporter::load_str(text, None, &ImportOptions::default(), None).unwrap();
    assert_eq!(result.stats.vias, 1);
    assert!(result.stats.errors > 0 || result.stats.warnings > 0);
}

/// Reporter that cancels after a fixed number of progress updates.
struct CancelAfter {
    updates: usize,
    limit: usize,
    phases: Vec<String>,
}

impl ProgressReporter for CancelAfter {
    fn report(&mut self, message: &str) {
        self.phases.push(message.to_string());
    }

    fn set_progress(&mut self, _fraction: f64) {
        self.updates += 1;
    }

    fn keep_going(&self) -> bool {
        self.updates < self.limit
    }
}

#[test]
fn test_cancellation_stops_load() {
    let options = ImportOptions {
        progress_interval: 1,
        ..Default::default()
    };
    let mut reporter = CancelAfter {
        updates: 0,
        limit: 3,
        phases: Vec::new(),
    };
    let err = FabmasterImporter::load(
        &fixture_path("minimal_board.txt"),
        None,
        &options,
        Some(&mut reporter),
    )
    .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(reporter.updates, 3);
    assert_eq!(reporter.phases.first().map(String::as_str), Some("Reading file"));
}

#[test]
fn test_progress_runs_to_completion() {
    let options = ImportOptions {
        progress_interval: 1,
        ..Default::default()
    };
    let mut reporter = CancelAfter {
        updates: 0,
        limit: usize::MAX,
        phases: Vec::new(),
    };
    let result = FabmasterImporter::load(
        &fixture_path("minimal_board.txt"),
        None,
        &options,
        Some(&mut reporter),
    )
    .unwrap();

    assert_eq!(result.stats.footprints, 2);
    assert!(reporter.updates > 0);
    assert!(reporter.phases.iter().any(|p| p == "Loading footprints"));
}

#[test]
fn test_unreadable_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FabmasterImporter::load(
        &dir.path().join("missing.txt"),
        None,
        &ImportOptions::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::Io { .. }));
}
