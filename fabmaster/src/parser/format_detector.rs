//! Cheap check that a file is a FABMASTER export, without parsing it fully.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::section::classify;
use super::tokenizer::tokenize_bytes;

/// Bytes read from the start of a candidate file.
const SNIFF_LEN: u64 = 64 * 1024;

/// Extensions FABMASTER exports are written with.
const EXTENSIONS: [&str; 2] = ["txt", "fab"];

/// Extension matches, case-insensitive.
pub fn has_fabmaster_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// True if `path` has a FABMASTER extension and its head contains at least
/// one recognisable section header. Unreadable files are not boards.
pub fn can_read_board(path: &Path) -> bool {
    if !has_fabmaster_extension(path) {
        return false;
    }

    let mut head = Vec::new();
    let read = File::open(path).and_then(|f| f.take(SNIFF_LEN).read_to_end(&mut head));
    if let Err(e) = read {
        debug!("cannot sniff {}: {}", path.display(), e);
        return false;
    }

    let rows = tokenize_bytes(&head);
    (0..rows.len()).any(|i| classify(&rows, i).is_known())
}
