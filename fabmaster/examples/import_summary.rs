//! Import a FABMASTER export and print what was built.
//! Run with: cargo run --example import_summary [path/to/board.txt]

use fabmaster::prelude::*;
use std::path::Path;

fn main() -> Result<(), ImportError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/minimal_board.txt".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example import_summary [path/to/board.txt]");
        std::process::exit(1);
    }

    let result = FabmasterImporter::load(path, None, &ImportOptions::default(), None)?;
    let stats = &result.stats;

    println!("Imported {}", path.display());
    println!("  Copper layers: {}", result.board.copper_layer_count);
    println!("  Nets:          {}", stats.nets);
    println!("  Footprints:    {} ({} pads)", stats.footprints, stats.pads);
    println!("  Tracks:        {} (+{} arcs)", stats.tracks, stats.arcs);
    println!("  Vias:          {}", stats.vias);
    println!("  Zones:         {}", stats.zones);
    println!("  Drawings:      {} shapes, {} texts", stats.shapes, stats.texts);

    if !result.diagnostics.is_empty() {
        println!();
        for diag in &result.diagnostics {
            println!("  {}", diag);
        }
    }

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
