//! Row reader for the `!`-delimited FABMASTER table format.
//!
//! The scan is a single pass over the input. Every input line yields exactly
//! one row, so `row index + 1` is the line number used in diagnostics.

/// One input line split into cells.
pub type Row = Vec<String>;

/// Split raw file contents into rows of upper-cased cells.
///
/// - `"` toggles quote mode when it opens a fresh cell or the cell already
///   started with a quote; the quote itself is kept in the cell.
/// - `!` outside quotes ends a cell, even an empty one.
/// - `\n` ends the row (a pending non-empty cell is flushed first) and
///   resets quote mode.
/// - `\r` is dropped.
pub fn tokenize(input: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut row: Row = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                if cell.is_empty() || cell.starts_with('"') {
                    quoted = !quoted;
                }
                cell.push(ch);
            }
            '!' if !quoted => {
                row.push(std::mem::take(&mut cell));
            }
            '\n' => {
                if !cell.is_empty() {
                    row.push(std::mem::take(&mut cell));
                }
                rows.push(std::mem::take(&mut row));
                quoted = false;
            }
            '\r' => {}
            _ => cell.extend(ch.to_uppercase()),
        }
    }

    if !cell.is_empty() {
        row.push(cell);
    }
    if !row.is_empty() {
        rows.push(row);
    }

    rows
}

/// Decode raw bytes and tokenize them. Invalid UTF-8 is replaced rather than
/// rejected; the format is nominally ASCII.
pub fn tokenize_bytes(bytes: &[u8]) -> Vec<Row> {
    tokenize(&String::from_utf8_lossy(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_rows_and_cells() {
        let rows = tokenize("A!REFDES!COMP_CLASS!\nS!r1!discrete!\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["A", "REFDES", "COMP_CLASS"]);
        assert_eq!(rows[1], vec!["S", "R1", "DISCRETE"]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(tokenize("abc!def"), tokenize("ABC!DEF"));
    }

    #[test]
    fn test_empty_cells_are_kept() {
        let rows = tokenize("S!!X!\n");
        assert_eq!(rows[0], vec!["S", "", "X"]);
    }

    #[test]
    fn test_quoted_bang_does_not_split() {
        let rows = tokenize("S!\"A!B\"!C\n");
        assert_eq!(rows[0], vec!["S", "\"A!B\"", "C"]);
    }

    #[test]
    fn test_quote_inside_cell_is_literal() {
        // The quote does not open a fresh cell, so the bang still splits.
        let rows = tokenize("S!AB\"C!D\n");
        assert_eq!(rows[0], vec!["S", "AB\"C", "D"]);
    }

    #[test]
    fn test_newline_resets_quote_state() {
        let rows = tokenize("S!\"OPEN\nS!X!Y\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["S", "X", "Y"]);
    }

    #[test]
    fn test_carriage_returns_dropped() {
        let rows = tokenize("A!B\r\nC!D\r\n");
        assert_eq!(rows, vec![vec!["A", "B"], vec!["C", "D"]]);
    }

    #[test]
    fn test_trailing_line_without_newline_is_flushed() {
        let rows = tokenize("A!B\nC!D");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["C", "D"]);
    }

    #[test]
    fn test_blank_lines_keep_line_numbering() {
        let rows = tokenize("A!B\n\nC!D\n");
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_empty());
    }

    #[test]
    fn test_rejoin_reproduces_uppercased_input() {
        let input = "a!b!c\nd!e\nfoo bar!baz";
        let rows = tokenize(input);
        let rejoined = rows
            .iter()
            .map(|r| r.join("!"))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(rejoined, input.to_uppercase());
    }
}
