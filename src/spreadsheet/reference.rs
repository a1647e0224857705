//! Conversions between A1-style references and 0-based row/column indexes.

/// Parses column letters ("A", "k", "AA") into a 0-based column index.
/// Letters too long to fit in `usize` yield `None`.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |index, letter| {
        let letter = letter.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return None;
        }
        index.checked_mul(26)?.checked_add(letter as usize - 'A' as usize + 1)
    })
    .map(|number| number - 1)
}

/// Parses a 1-based row number into a 0-based row index.
pub(crate) fn row_to_index(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok().filter(|row| *row > 0).map(|row| row - 1)
}

/// Renders a 0-based column index as column letters.
pub(crate) fn index_to_col(col: usize) -> String {
    let mut letters = Vec::new();
    let mut number = col + 1;
    while number > 0 {
        number -= 1;
        letters.push((b'A' + (number % 26) as u8) as char);
        number /= 26;
    }
    letters.iter().rev().collect()
}

/// Renders 0-based coordinates as an A1-style cell reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}
