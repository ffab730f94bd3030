/// Parses an A1-style reference (`"C12"`, `"$C$12"`) into a zero-based
/// `(row, col)` pair.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u32 = 0;
    for b in letters.bytes() {
        col = col
            .checked_mul(26)?
            .checked_add(u32::from(b.to_ascii_uppercase() - b'A') + 1)?;
    }

    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some((row - 1, col - 1))
}

/// Inclusive rectangle of zero-based cells, from `"A5"` or `"A5:B7"`.
///
/// Kept as bounds and tested per cell, since a reference may span the
/// whole sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    first: (u32, u32),
    last: (u32, u32),
}

impl CellRange {
    pub fn parse(reference: &str) -> Option<Self> {
        let (from, to) = match reference.split_once(':') {
            Some((from, to)) => (parse_cell_ref(from)?, parse_cell_ref(to)?),
            None => {
                let cell = parse_cell_ref(reference)?;
                (cell, cell)
            }
        };
        Some(CellRange {
            first: (from.0.min(to.0), from.1.min(to.1)),
            last: (from.0.max(to.0), from.1.max(to.1)),
        })
    }

    /// The single cell this range covers, if it covers exactly one.
    pub fn single(&self) -> Option<(u32, u32)> {
        (self.first == self.last).then_some(self.first)
    }

    pub fn contains(&self, (row, col): (u32, u32)) -> bool {
        (self.first.0..=self.last.0).contains(&row) && (self.first.1..=self.last.1).contains(&col)
    }
}
