// Output formatting — terminal display and delimited precision rows.

pub mod terminal;

use std::io::Write;

use anyhow::{Context, Result};

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Unlike byte slicing (`&text[..40]`), this respects UTF-8 character boundaries
/// and will never panic on accented letters in place names.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Write a precision curve as `sample_size<delimiter>precision` rows.
pub fn write_precision_rows<W: Write>(
    out: &mut W,
    curve: &[(usize, f64)],
    delimiter: char,
) -> Result<()> {
    for (size, precision) in curve {
        writeln!(out, "{size}{delimiter}{precision}").context("Failed to write precision row")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_chars("Île de la Cité", 4), "Île ...");
        assert_eq!(truncate_chars("Opéra", 10), "Opéra");
    }

    #[test]
    fn test_precision_rows() {
        let mut out = Vec::new();
        write_precision_rows(&mut out, &[(10, 0.5), (20, 0.75)], ';').unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "10;0.5\n20;0.75\n");
    }
}
