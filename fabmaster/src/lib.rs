//! Fabmaster - Allegro FABMASTER ASCII board importer
//!
//! This library reads the tabular text exports produced by Cadence Allegro's
//! `extracta` (FABMASTER "FATF" reports) and rebuilds a complete board from
//! them: layer stackup, nets, footprints with pads, vias, tracks, zones and
//! board drawings.
//!
//! # Quick Start
//!
//! ```no_run
//! use fabmaster::{FabmasterImporter, ImportOptions};
//! use std::path::Path;
//!
//! let result = FabmasterImporter::load(
//!     Path::new("board.txt"),
//!     None,
//!     &ImportOptions::default(),
//!     None,
//! ).unwrap();
//!
//! println!("{} footprints", result.stats.footprints);
//! for diag in &result.diagnostics {
//!     println!("{}", diag);
//! }
//! ```
//!
//! # Features
//!
//! - **Tolerant parsing**: malformed rows are reported and skipped, never fatal
//! - **Layer mapping**: Allegro subclasses are mapped onto a fixed board layer set
//! - **Custom pads**: `FIG_SHAPE` outlines become polygon pad primitives
//! - **Zone recovery**: fills are matched back to their outlines to recover nets
//! - **Cancellation**: a [`ProgressReporter`] can stop a load between entries

pub mod board;
pub mod core;
pub mod database;
pub mod diagnostics;
pub mod geometry;
pub mod parser;
pub mod progress;
pub mod stackup;

mod loader;

// Re-export main types
pub use crate::core::{
    discover_fabmaster_files, FabmasterImporter, ImportError, ImportOptions, ImportResult, ImportStats,
};
pub use board::{Board, BoardLayer};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use loader::{assign_zone_nets, order_zones};
pub use parser::format_detector::can_read_board;
pub use parser::FabmasterParser;
pub use progress::{NullProgress, ProgressReporter};

/// Import a board with default options (convenience wrapper).
pub fn import_board(path: &std::path::Path) -> Result<ImportResult, ImportError> {
    FabmasterImporter::load(path, None, &ImportOptions::default(), None)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Board, BoardLayer, Diagnostic, FabmasterImporter, ImportError, ImportOptions, ImportResult,
        ImportStats, ProgressReporter, Severity,
    };
}
