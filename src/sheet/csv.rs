// src/sheet/csv.rs

use super::raw_table::RawTable;

/// Tokenize a published-sheet CSV export into rows of fields.
///
/// Quoted fields may contain commas, newlines and `""` escapes. `\r` is
/// dropped everywhere, quoted or not, so a literal carriage return inside a
/// quoted cell does not survive. Lines that tokenize to a single empty field
/// are discarded. Unbalanced quotes never fail: whatever was read so far is
/// returned.
pub fn parse_csv(text: &str) -> RawTable {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\r' => {}
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            '\r' => {}
            _ => field.push(c),
        }
    }

    // trailing row (no final newline, or an open quote at EOF)
    row.push(field);
    rows.push(row);

    rows.retain(|r| !(r.len() == 1 && r[0].is_empty()));
    RawTable::new(rows)
}
