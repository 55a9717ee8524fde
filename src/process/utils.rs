/// Trim + upper-case a label cell for vocabulary lookups.
pub fn clean_label(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Like `clean_label`, but also drops non-breaking spaces anywhere in the cell,
/// which some exporters put between the letter and the sign (`"A\u{a0}+"`).
pub fn clean_direction(raw: &str) -> String {
    raw.trim().replace('\u{a0}', "").to_uppercase()
}

/// Parse a reading written with either decimal separator (`"1,25"` or `"1.25"`).
pub fn parse_reading(raw: &str) -> Option<f64> {
    raw.replace(',', ".").trim().parse().ok()
}
