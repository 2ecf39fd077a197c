//! Annotated document — the linguistic annotation handed to the extractor.
//!
//! Produced upstream (OCR + NLP annotation) and only read here. All offsets are
//! byte offsets into `text`.

use serde::{Deserialize, Serialize};

use crate::errors::ExtractionError;

/// Named-entity label vocabulary. Labels outside the vocabulary collapse to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Person,
    Org,
    Gpe,
    Loc,
    Date,
    Skill,
    #[serde(other)]
    Other,
}

impl EntityLabel {
    /// GPE and LOC both feed the address heuristic.
    pub fn is_location(self) -> bool {
        matches!(self, EntityLabel::Gpe | EntityLabel::Loc)
    }
}

/// Coarse part-of-speech tags (Universal Dependencies names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    Propn,
    Noun,
    Verb,
    Adj,
    Adv,
    Num,
    Punct,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub pos: PosTag,
}

/// Text plus sentence boundaries, entity spans and POS-tagged tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub text: String,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
    #[serde(default)]
    pub entities: Vec<EntitySpan>,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl AnnotatedDocument {
    /// Checks that every span lies inside `text` on char boundaries.
    pub fn check(&self) -> Result<(), ExtractionError> {
        let spans = self
            .sentences
            .iter()
            .map(|s| ("sentence", s.start, s.end))
            .chain(self.entities.iter().map(|e| ("entity", e.start, e.end)))
            .chain(self.tokens.iter().map(|t| ("token", t.start, t.end)));

        for (kind, start, end) in spans {
            if start > end || self.text.get(start..end).is_none() {
                return Err(ExtractionError::InvalidDocument(format!(
                    "{kind} span {start}..{end} is outside the document text ({} bytes)",
                    self.text.len()
                )));
            }
        }
        Ok(())
    }

    /// Entities fully contained in the given sentence, in document order.
    pub fn entities_in<'a>(&'a self, sentence: &'a Sentence) -> impl Iterator<Item = &'a EntitySpan> {
        self.entities
            .iter()
            .filter(move |e| e.start >= sentence.start && e.end <= sentence.end)
    }

    /// Tokens fully contained in the given sentence, in document order.
    pub fn tokens_in<'a>(&'a self, sentence: &'a Sentence) -> impl Iterator<Item = &'a Token> {
        self.tokens
            .iter()
            .filter(move |t| t.start >= sentence.start && t.end <= sentence.end)
    }

    /// Entity texts carrying `label`, in document order.
    pub fn entity_texts(&self, label: EntityLabel) -> impl Iterator<Item = &str> {
        self.entities
            .iter()
            .filter(move |e| e.label == label)
            .map(|e| e.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> AnnotatedDocument {
        let text = "Jane Doe. Worked at Acme Corp.".to_string();
        AnnotatedDocument {
            sentences: vec![
                Sentence { text: "Jane Doe.".into(), start: 0, end: 9 },
                Sentence { text: "Worked at Acme Corp.".into(), start: 10, end: 30 },
            ],
            entities: vec![
                EntitySpan { text: "Jane Doe".into(), start: 0, end: 8, label: EntityLabel::Person },
                EntitySpan { text: "Acme Corp".into(), start: 20, end: 29, label: EntityLabel::Org },
            ],
            tokens: vec![Token { text: "Acme".into(), start: 20, end: 24, pos: PosTag::Propn }],
            text,
        }
    }

    #[test]
    fn test_check_accepts_valid_spans() {
        assert!(doc().check().is_ok());
    }

    #[test]
    fn test_check_rejects_out_of_bounds() {
        let mut d = doc();
        d.entities[1].end = 400;
        assert!(matches!(d.check(), Err(ExtractionError::InvalidDocument(_))));
    }

    #[test]
    fn test_check_rejects_inverted_span() {
        let mut d = doc();
        d.sentences[0].start = 5;
        d.sentences[0].end = 2;
        assert!(d.check().is_err());
    }

    #[test]
    fn test_entities_in_sentence() {
        let d = doc();
        let found: Vec<_> = d.entities_in(&d.sentences[1]).map(|e| e.text.as_str()).collect();
        assert_eq!(found, vec!["Acme Corp"]);
        assert_eq!(d.tokens_in(&d.sentences[0]).count(), 0);
    }

    #[test]
    fn test_unknown_label_deserializes_as_other() {
        let e: EntitySpan =
            serde_json::from_str(r#"{"text":"x","start":0,"end":1,"label":"NORP"}"#).unwrap();
        assert_eq!(e.label, EntityLabel::Other);
    }
}
