// Ground truth — hand-annotated core words for a sample of places.
//
// File format, one place per line, four `|`-separated fields:
//
//   id|title|space-separated title words|space-separated core word(s)
//
// A template with the fourth field left empty can be exported from an
// indexed corpus, annotated by hand, and loaded back.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::vocabulary::normalize_token;
use crate::model::WordProbabilities;
use crate::places::models::{Place, PlaceId};

#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthRecord {
    pub id: PlaceId,
    pub title: String,
    /// Every normalized word of the title
    pub words: Vec<String>,
    /// The annotated core word(s)
    pub core_words: Vec<String>,
}

impl GroundTruthRecord {
    pub fn is_core(&self, word: &str) -> bool {
        self.core_words.iter().any(|w| w == word)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    records: Vec<GroundTruthRecord>,
}

fn split_words(field: &str) -> Vec<String> {
    field
        .split_whitespace()
        .map(normalize_token)
        .filter(|w| !w.is_empty())
        .collect()
}

fn parse_line(line: &str) -> Result<GroundTruthRecord> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != 4 {
        anyhow::bail!("expected exactly 4 '|'-separated fields, found {}", fields.len());
    }
    let id = fields[0]
        .trim()
        .parse::<PlaceId>()
        .with_context(|| format!("invalid place id '{}'", fields[0]))?;

    Ok(GroundTruthRecord {
        id,
        title: fields[1].to_string(),
        words: split_words(fields[2]),
        core_words: split_words(fields[3]),
    })
}

impl GroundTruth {
    pub fn new(records: Vec<GroundTruthRecord>) -> Self {
        Self { records }
    }

    /// Parse ground truth text. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let records = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                parse_line(line).with_context(|| format!("Ground truth line {}", i + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ground truth file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn records(&self) -> &[GroundTruthRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Write up to `max_records` annotation template lines (`id|title|words|`).
/// Returns the number of lines written.
pub fn write_template<'a, W: Write>(
    out: &mut W,
    places: impl IntoIterator<Item = (&'a Place, &'a WordProbabilities)>,
    max_records: usize,
) -> Result<usize> {
    let mut written = 0;
    for (place, posterior) in places.into_iter().take(max_records) {
        let words: Vec<&str> = posterior.words().collect();
        // A '|' in the title would add a field
        let title = place.title.replace('|', "/");
        writeln!(out, "{}|{}|{}|", place.id, title, words.join(" "))
            .context("Failed to write ground truth template")?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let text = "12|Hyde Park|hyde park|hyde\n\n13|Tower of London|tower of london|tower london\n";
        let gt = GroundTruth::parse(text).unwrap();
        assert_eq!(gt.len(), 2);
        assert_eq!(gt.records()[0].id, 12);
        assert_eq!(gt.records()[0].core_words, vec!["hyde"]);
        assert_eq!(gt.records()[1].words, vec!["tower", "of", "london"]);
        assert!(gt.records()[1].is_core("london"));
    }

    #[test]
    fn test_core_words_are_normalized() {
        let gt = GroundTruth::parse("1|Park (Hyde)|park hyde|(Hyde)").unwrap();
        assert_eq!(gt.records()[0].core_words, vec!["hyde"]);
    }

    #[test]
    fn test_short_line_names_line_number() {
        let err = GroundTruth::parse("1|A|a|a\n2|B|b").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"), "{err:#}");
    }

    #[test]
    fn test_extra_field_is_rejected() {
        let err = GroundTruth::parse("1|Hyde Park|hyde park|hyde|park").unwrap_err();
        assert!(format!("{err:#}").contains("found 5"), "{err:#}");
    }

    #[test]
    fn test_template_title_with_pipe_stays_parseable() {
        let place = Place::new(8, "Hyde | Park");
        let posterior: WordProbabilities = [("hyde", 0.6), ("park", 0.4)].into_iter().collect();
        let mut out = Vec::new();
        write_template(&mut out, [(&place, &posterior)], 1).unwrap();
        let line = format!("{}hyde", String::from_utf8(out).unwrap().trim_end());
        let gt = GroundTruth::parse(&line).unwrap();
        assert_eq!(gt.records()[0].title, "Hyde / Park");
    }

    #[test]
    fn test_bad_id_is_an_error() {
        assert!(GroundTruth::parse("x|A|a|a").is_err());
    }

    #[test]
    fn test_write_template() {
        let place = Place::new(7, "Hyde Park");
        let posterior: WordProbabilities = [("hyde", 0.6), ("park", 0.4)].into_iter().collect();
        let mut out = Vec::new();
        let n = write_template(&mut out, [(&place, &posterior)], 10).unwrap();
        assert_eq!(n, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "7|Hyde Park|hyde park|\n");
    }
}
