//! Import entry points shared by library callers and the CLI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::Board;
use crate::diagnostics::{Diagnostics, Severity};
use crate::loader::BoardLoader;
use crate::parser::format_detector::has_fabmaster_extension;
use crate::parser::tokenizer::tokenize_bytes;
use crate::parser::{FabmasterParser, ImportContext};
use crate::progress::{Checkpoint, ProgressReporter};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("import cancelled")]
    Cancelled,
}

impl ImportError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImportError::Cancelled)
    }
}

/// Per-load properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Maximum chord deviation when arcs become polygon points, in nm.
    pub arc_max_error: i64,
    /// Database entries between progress checkpoints.
    pub progress_interval: usize,
    /// Library part of footprint ids; the file stem when unset.
    pub library_nickname: Option<String>,
    /// Give unnetted zone outlines the net of the fill they overlap most.
    pub assign_zone_nets: bool,
    /// Assign fill priorities so smaller zones win.
    pub order_zones: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            arc_max_error: 5_000,
            progress_interval: 100,
            library_nickname: None,
            assign_zone_nets: true,
            order_zones: true,
        }
    }
}

/// Counts of what a load produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub footprints: usize,
    pub pads: usize,
    pub tracks: usize,
    pub arcs: usize,
    pub vias: usize,
    pub zones: usize,
    pub shapes: usize,
    pub texts: usize,
    pub nets: usize,
    pub enabled_layers: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl ImportStats {
    pub fn collect(board: &Board, diagnostics: &Diagnostics) -> Self {
        Self {
            footprints: board.footprints.len(),
            pads: board.pad_count(),
            tracks: board.tracks.len(),
            arcs: board.arcs.len(),
            vias: board.vias.len(),
            zones: board.zones.len(),
            shapes: board.shapes.len(),
            texts: board.texts.len(),
            nets: board.net_count(),
            enabled_layers: board.enabled_layers.len(),
            errors: diagnostics.count(Severity::Error),
            warnings: diagnostics.count(Severity::Warning),
            infos: diagnostics.count(Severity::Info),
        }
    }
}

/// A synthesized board plus everything reported while building it.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub board: Board,
    pub diagnostics: Diagnostics,
    pub stats: ImportStats,
}

impl ImportResult {
    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    /// Fail-on check used by the CLI.
    pub fn has_at_least(&self, severity: Severity) -> bool {
        self.diagnostics.has_at_least(severity)
    }
}

/// Recursively discover FABMASTER exports in a directory.
pub fn discover_fabmaster_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), ImportError> {
    if depth > 20 {
        return Ok(());
    }
    let io_err = |source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "target" {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.is_file() && has_fabmaster_extension(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Import API used by library callers and the CLI.
pub struct FabmasterImporter;

impl FabmasterImporter {
    /// Load a FABMASTER file into a new board, or into `append_to` when given.
    ///
    /// Only an unreadable file or a cancellation request fail the load;
    /// everything else is reported through the result's diagnostics.
    pub fn load(
        path: &Path,
        append_to: Option<Board>,
        options: &ImportOptions,
        progress: Option<&mut dyn ProgressReporter>,
    ) -> Result<ImportResult, ImportError> {
        let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("loading {} ({} bytes)", path.display(), bytes.len());

        let nickname = options.library_nickname.clone().unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("fabmaster")
                .to_string()
        });
        let filename = path.display().to_string();
        let board = append_to.unwrap_or_else(|| Board::new(&filename));

        Self::run(&tokenize_bytes(&bytes), board, &nickname, options, progress)
    }

    /// Load from in-memory file contents.
    pub fn load_str(
        content: &str,
        append_to: Option<Board>,
        options: &ImportOptions,
        progress: Option<&mut dyn ProgressReporter>,
    ) -> Result<ImportResult, ImportError> {
        let nickname = options
            .library_nickname
            .clone()
            .unwrap_or_else(|| "fabmaster".to_string());
        let board = append_to.unwrap_or_default();
        Self::run(&crate::parser::tokenize(content), board, &nickname, options, progress)
    }

    fn run(
        rows: &[crate::parser::Row],
        mut board: Board,
        nickname: &str,
        options: &ImportOptions,
        progress: Option<&mut dyn ProgressReporter>,
    ) -> Result<ImportResult, ImportError> {
        let mut checkpoint = Checkpoint::new(progress, options.progress_interval, 0);
        checkpoint.report("Reading file");
        checkpoint.check()?;

        let mut ctx = ImportContext::new();
        FabmasterParser::parse_rows(rows, &mut ctx);
        info!(
            "parsed {} rows: {} components, {} padstacks, {} layers",
            rows.len(),
            ctx.db.components.len(),
            ctx.db.padstacks.len(),
            ctx.db.layers.len()
        );
        checkpoint.check()?;

        let ImportContext { db, mut diagnostics } = ctx;
        checkpoint.set_total(db.entry_count());
        BoardLoader::new(&db, &mut board, &mut diagnostics, options, nickname).run(&mut checkpoint)?;

        let stats = ImportStats::collect(&board, &diagnostics);
        info!(
            "imported {} footprints, {} tracks, {} zones with {} errors and {} warnings",
            stats.footprints, stats.tracks, stats.zones, stats.errors, stats.warnings
        );
        Ok(ImportResult {
            board,
            diagnostics,
            stats,
        })
    }
}
