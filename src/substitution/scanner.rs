//! Extraction of embedded `$(...)` expressions.
//!
//! Only the text between an opening `$(` and its matching `)` is returned;
//! parentheses nested inside an expression are balanced, and everything
//! outside a delimiter pair is ignored.

/// Opening delimiter of an embedded expression
pub const OPEN_DELIMITER: &str = "$(";

/// Returns the bodies of every `$(...)` expression in `text`, in order
///
/// An opening delimiter without a matching close yields nothing for that
/// occurrence; scanning resumes right after it, so complete expressions
/// nested inside it are still found.
#[must_use]
pub fn scan(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(OPEN_DELIMITER) {
        let start = pos + offset + OPEN_DELIMITER.len();
        match matching_close(&text.as_bytes()[start..]) {
            Some(len) => {
                found.push(&text[start..start + len]);
                pos = start + len + 1;
            }
            None => pos = start,
        }
    }

    found
}

/// Scans every string in order and concatenates the results
pub fn scan_all<'a, I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + ?Sized + 'a,
{
    texts
        .into_iter()
        .flat_map(|text| scan(text.as_ref()))
        .map(str::to_string)
        .collect()
}

// Offset of the `)` closing depth zero.
fn matching_close(rest: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, byte) in rest.iter().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' if depth == 0 => return Some(i),
            b')' => depth -= 1,
            _ => {}
        }
    }
    None
}
