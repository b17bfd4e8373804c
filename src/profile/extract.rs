use super::{ BusinessProfile, Field };
use crate::conversation::Transcript;
use once_cell::sync::Lazy;
use regex::Regex;

pub const DELIMITER: &str = " | ";

static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)\bcalled\s+["“]([^"”]+)["”]"#,
        r#"(?i)\bname\s+is\s+["“]?([^"”.,!?\n]+)"#,
        r#"\b(?:[Cc]alled|[Nn]amed)\s+([A-Z][\w&'-]*(?:\s+[A-Z][\w&'-]*)*)"#,
    ]
        .iter()
        .map(|p| Regex::new(p).expect("name pattern is valid"))
        .collect()
});

/// One answer in the normalized form extraction works on.
///
/// Conversational lines carry the question they answered (if known) and are
/// keyword-matched; positional lines come from the delimited form and fill the
/// field of their slot directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerLine {
    pub question: Option<String>,
    pub text: String,
    pub slot: Option<Field>,
}

impl AnswerLine {
    pub fn conversational(question: Option<&str>, text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            question: question.map(|q| q.to_string()),
            text: text.to_string(),
            slot: None,
        })
    }

    fn matches(&self, keywords: &[&str]) -> bool {
        let answer = self.text.to_lowercase();
        let question = self.question.as_deref().unwrap_or("").to_lowercase();
        keywords.iter().any(|kw| question.contains(kw) || answer.contains(kw))
    }
}

pub fn from_transcript(transcript: &Transcript) -> Vec<AnswerLine> {
    transcript
        .answers()
        .filter_map(|(question, answer)| AnswerLine::conversational(Some(question), answer))
        .collect()
}

/// Splits `"name | description | services | ..."` into positional lines.
/// Only the spaced delimiter separates fields; a bare `|` stays inside its
/// value. Empty segments and segments past the last field are dropped.
pub fn from_delimited(joined: &str) -> Vec<AnswerLine> {
    joined
        .split(DELIMITER)
        .zip(Field::ALL.iter())
        .filter_map(|(segment, field)| {
            let text = segment.trim();
            if text.is_empty() {
                return None;
            }
            Some(AnswerLine {
                question: None,
                text: text.to_string(),
                slot: Some(*field),
            })
        })
        .collect()
}

/// Free-text input: the delimited form when it contains the delimiter,
/// otherwise one conversational line per non-empty line of text.
pub fn from_description(description: &str) -> Vec<AnswerLine> {
    if description.contains(DELIMITER) {
        return from_delimited(description);
    }
    description
        .lines()
        .filter_map(|line| AnswerLine::conversational(None, line))
        .collect()
}

fn name_from_patterns(lines: &[AnswerLine]) -> Option<String> {
    lines
        .iter()
        .filter(|line| line.slot.is_none())
        .find_map(|line| {
            NAME_PATTERNS.iter().find_map(|re| {
                re.captures(&line.text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|name| !name.is_empty())
            })
        })
}

fn resolve(field: Field, lines: &[AnswerLine]) -> Option<String> {
    if let Some(line) = lines.iter().find(|line| line.slot == Some(field)) {
        return Some(line.text.clone());
    }
    if field == Field::Name {
        if let Some(name) = name_from_patterns(lines) {
            return Some(name);
        }
    }
    let keywords = field.rule().keywords;
    lines
        .iter()
        .filter(|line| line.slot.is_none())
        .find(|line| line.matches(keywords))
        .map(|line| line.text.clone())
}

/// Derives a profile from normalized answer lines. Total over any input: a
/// field nothing matched takes its rule default.
pub fn extract(lines: &[AnswerLine]) -> BusinessProfile {
    let mut profile = BusinessProfile::default();
    for field in Field::ALL {
        if let Some(value) = resolve(field, lines) {
            profile.set(field, value);
        }
    }
    profile
}
