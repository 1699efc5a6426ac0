//! Output comparison
//!
//! A program's output is correct when it equals the expected output after
//! leading and trailing whitespace of the whole text is removed. Interior
//! whitespace, line endings included, must match exactly.

/// Strip leading and trailing whitespace of the whole output
pub fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Whether `actual` is accepted for `expected`
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}
