/// Standardizes a column (or sheet) name into a storage identifier.
///
/// The name is lowercased, every run of characters outside `[a-z0-9]`
/// collapses into a single `_`, and leading/trailing underscores are
/// dropped. Distinct inputs may map to the same identifier
/// (`"Amount (USD)"` and `"Amount_USD"` both give `amount_usd`).
pub fn standardize_column_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Whether `name` already satisfies the identifier rules: non-empty,
/// `[a-z0-9_]` only, no leading/trailing or doubled underscores.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        && !name.starts_with('_')
        && !name.ends_with('_')
        && !name.contains("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators() {
        assert_eq!(standardize_column_name("Amount (USD)"), "amount_usd");
        assert_eq!(standardize_column_name("Amount_USD"), "amount_usd");
        assert_eq!(standardize_column_name("  As Of Date "), "as_of_date");
        assert_eq!(standardize_column_name("__Project--ID__"), "project_id");
        assert_eq!(
            standardize_column_name("Borrower's Obligation (US$)"),
            "borrower_s_obligation_us"
        );
        assert_eq!(standardize_column_name("GEO Locations"), "geo_locations");
    }

    #[test]
    fn non_ascii_becomes_separator() {
        assert_eq!(standardize_column_name("Côte d'Ivoire"), "c_te_d_ivoire");
        assert_eq!(standardize_column_name("%%%"), "");
        assert_eq!(standardize_column_name(""), "");
    }

    #[test]
    fn idempotent_and_well_formed() {
        let samples = [
            "Amount (USD)",
            "___",
            "a__b",
            "ÄÖÜ straße",
            "Fiscal Year 2024/25",
            "x",
            " Total  Cost -- (est.) ",
            "already_clean_1",
        ];

        for raw in samples {
            let once = standardize_column_name(raw);
            assert_eq!(standardize_column_name(&once), once, "input {raw:?}");
            assert!(
                once.bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
            );
            assert!(!once.starts_with('_') && !once.ends_with('_'));
            assert!(!once.contains("__"));
            if !once.is_empty() {
                assert!(is_valid_identifier(&once));
            }
        }
    }

    /// Every string of up to four characters drawn from ASCII letters,
    /// digits, separators and characters whose lowercase form is
    /// multi-char or ASCII (`İ`, the Kelvin sign).
    #[test]
    fn idempotent_over_generated_names() {
        const ALPHABET: [char; 14] = [
            'A', 'z', '0', '9', ' ', '_', '-', '(', '.', '\t', 'é', 'ß', 'İ', '\u{212A}',
        ];

        let mut names = vec![String::new()];
        let mut frontier = names.clone();
        for _ in 0..4 {
            frontier = frontier
                .iter()
                .flat_map(|prefix| ALPHABET.iter().map(move |c| format!("{prefix}{c}")))
                .collect();
            names.extend(frontier.iter().cloned());
        }
        assert_eq!(names.len(), 1 + 14 + 196 + 2744 + 38416);

        for raw in &names {
            let once = standardize_column_name(raw);
            assert_eq!(standardize_column_name(&once), once, "input {raw:?}");
            assert!(once.is_empty() || is_valid_identifier(&once), "input {raw:?}");
            if is_valid_identifier(raw) {
                assert_eq!(&once, raw);
            }
        }
    }
}
