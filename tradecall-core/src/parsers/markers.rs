//! Declarative marker tables for replace-then-split segmentation.
//!
//! Each channel format is an ordered list of marker phrases. Every marker is
//! replaced, in table order, by `DELIMITER`, and the result is split into
//! positional segments. Segment 0 is whatever precedes the first marker.

use crate::error::ParseError;

pub const DELIMITER: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerTable {
    name: &'static str,
    markers: &'static [&'static str],
}

impl MarkerTable {
    pub const fn new(name: &'static str, markers: &'static [&'static str]) -> Self {
        Self { name, markers }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn markers(&self) -> &'static [&'static str] {
        self.markers
    }

    /// Replace every marker with the delimiter. Matching is case-sensitive.
    pub fn delimit(&self, text: &str) -> String {
        let delimiter = DELIMITER.to_string();
        self.markers
            .iter()
            .fold(text.to_string(), |acc, marker| acc.replace(marker, &delimiter))
    }

    pub fn segment(&self, text: &str) -> Segments {
        let delimited = self.delimit(text);
        let parts = delimited.split(DELIMITER).map(str::to_string).collect();
        Segments {
            table: self.name,
            delimited,
            parts,
        }
    }
}

/// Positional segments of a delimited message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    table: &'static str,
    delimited: String,
    parts: Vec<String>,
}

impl Segments {
    /// Segment `index`, or a tokenization error naming what was expected there.
    pub fn get(&self, index: usize, what: &str) -> Result<&str, ParseError> {
        self.parts.get(index).map(String::as_str).ok_or_else(|| {
            ParseError::tokenization(format!(
                "{what} segment #{index} absent: {} segment(s) after splitting on {} markers",
                self.parts.len(),
                self.table
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The whole message with markers replaced by the delimiter.
    pub fn delimited(&self) -> &str {
        &self.delimited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;

    const TABLE: MarkerTable = MarkerTable::new("test", &["BUY", "NEAR", "TARGET", "TARGE"]);

    #[test]
    fn splits_on_markers_in_order() {
        let seg = TABLE.segment("BUY #NIFTY 20000 CE NEAR 120 TARGET 150");
        assert_eq!(seg.len(), 4);
        assert_eq!(seg.get(0, "lead").unwrap(), "");
        assert_eq!(seg.get(1, "symbol").unwrap(), " #NIFTY 20000 CE ");
        assert_eq!(seg.get(3, "targets").unwrap(), " 150");
    }

    #[test]
    fn longer_marker_first_avoids_leftovers() {
        // TARGET is replaced before TARGE so no stray 'T' remains
        let seg = TABLE.segment("TARGET 1 TARGE 2");
        assert_eq!(seg.delimited(), "| 1 | 2");
    }

    #[test]
    fn missing_segment_is_tokenization_error() {
        let seg = TABLE.segment("no markers here");
        let err = seg.get(2, "entry range").unwrap_err();
        assert_eq!(err.stage(), Stage::Tokenize);
        assert!(err.to_string().contains("entry range"));
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert_eq!(TABLE.segment("buy near").len(), 1);
    }
}
