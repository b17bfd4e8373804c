//! Scripted question/answer collection.
//!
//! A [`ConversationCollector`] walks a fixed [`QuestionScript`], appending every
//! accepted answer to its [`Transcript`] followed by the next question. The
//! transcript always starts with an assistant entry and strictly alternates
//! assistant and user speakers.

use crate::config::script::QuestionScript;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Assistant,
    User,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Assistant => "assistant",
            Speaker::User => "user",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    /// Answers paired with the question that preceded them, in conversation order.
    pub fn answers(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .windows(2)
            .filter(|pair| pair[0].speaker == Speaker::Assistant && pair[1].speaker == Speaker::User)
            .map(|pair| (pair[0].text.as_str(), pair[1].text.as_str()))
    }

    fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(Entry { speaker, text: text.into() });
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("answer must not be empty")]
    EmptyAnswer,
    #[error("every question has already been answered")]
    AlreadyComplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The next question that was appended to the transcript.
    Next(String),
    Finished,
}

#[derive(Debug, Clone)]
pub struct ConversationCollector {
    script: Arc<QuestionScript>,
    transcript: Transcript,
    answered: usize,
}

impl ConversationCollector {
    pub fn new(script: Arc<QuestionScript>) -> Self {
        let mut collector = Self {
            script,
            transcript: Transcript::default(),
            answered: 0,
        };
        collector.seed();
        collector
    }

    /// Replaces the transcript with the single greeting entry.
    pub fn seed(&mut self) {
        self.transcript = Transcript::default();
        self.transcript.push(Speaker::Assistant, self.script.greeting.clone());
        self.answered = 0;
    }

    pub fn record_answer(&mut self, text: &str) -> Result<AnswerOutcome, ConversationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyAnswer);
        }
        if self.is_complete() {
            return Err(ConversationError::AlreadyComplete);
        }

        self.transcript.push(Speaker::User, text);
        self.answered += 1;

        match self.script.prompt(self.answered) {
            Some(question) => {
                let question = question.to_string();
                self.transcript.push(Speaker::Assistant, question.clone());
                Ok(AnswerOutcome::Next(question))
            }
            None => Ok(AnswerOutcome::Finished),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.answered >= self.script.total()
    }

    pub fn reset(&mut self) {
        self.seed();
    }

    pub fn current_question(&self) -> Option<&str> {
        if self.is_complete() {
            return None;
        }
        self.transcript
            .last()
            .filter(|entry| entry.speaker == Speaker::Assistant)
            .map(|entry| entry.text.as_str())
    }

    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn total_questions(&self) -> usize {
        self.script.total()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::script::DEFAULT_GREETING;

    fn collector() -> ConversationCollector {
        ConversationCollector::new(Arc::new(QuestionScript::default()))
    }

    #[test]
    fn seeded_with_greeting() {
        let c = collector();
        assert_eq!(c.transcript().len(), 1);
        assert_eq!(c.current_question(), Some(DEFAULT_GREETING));
        assert_eq!(c.transcript().entries()[0].speaker, Speaker::Assistant);
        assert!(!c.is_complete());
    }

    #[test]
    fn blank_answers_leave_state_untouched() {
        let mut c = collector();
        c.record_answer("We sell pontoon boat rentals").unwrap();
        let before = c.transcript().clone();

        assert_eq!(c.record_answer(""), Err(ConversationError::EmptyAnswer));
        assert_eq!(c.record_answer("  \n\t "), Err(ConversationError::EmptyAnswer));
        assert_eq!(c.transcript(), &before);
        assert_eq!(c.current_question(), Some("Where is your business located?"));
        assert_eq!(c.answered(), 1);
    }

    #[test]
    fn each_answer_is_followed_by_next_question() {
        let mut c = collector();
        let outcome = c.record_answer("  We sell pontoon boat rentals ").unwrap();
        assert_eq!(outcome, AnswerOutcome::Next("Where is your business located?".into()));

        let entries = c.transcript().entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], Entry {
            speaker: Speaker::User,
            text: "We sell pontoon boat rentals".into(),
        });
        assert_eq!(entries[2].speaker, Speaker::Assistant);
    }

    #[test]
    fn eleven_answers_complete_the_script() {
        let mut c = collector();
        for i in 0..10 {
            assert!(matches!(c.record_answer(&format!("answer {}", i)), Ok(AnswerOutcome::Next(_))));
            assert!(!c.is_complete());
        }
        assert_eq!(c.record_answer("last"), Ok(AnswerOutcome::Finished));
        assert!(c.is_complete());
        assert_eq!(c.current_question(), None);
        assert_eq!(c.record_answer("extra"), Err(ConversationError::AlreadyComplete));

        let speakers: Vec<Speaker> = c.transcript().entries().iter().map(|e| e.speaker).collect();
        for (i, speaker) in speakers.iter().enumerate() {
            let expected = if i % 2 == 0 { Speaker::Assistant } else { Speaker::User };
            assert_eq!(*speaker, expected);
        }
        assert_eq!(c.transcript().answers().count(), 11);
    }

    #[test]
    fn reset_returns_to_single_greeting() {
        let mut c = collector();
        for i in 0..11 {
            c.record_answer(&format!("answer {}", i)).unwrap();
        }
        c.reset();
        assert_eq!(c.transcript().len(), 1);
        assert_eq!(c.answered(), 0);
        assert_eq!(c.current_question(), Some(DEFAULT_GREETING));
    }

    #[test]
    fn answers_keep_their_questions() {
        let mut c = collector();
        c.record_answer("We sell pontoon boat rentals").unwrap();
        c.record_answer("Port Orange, FL").unwrap();
        let pairs: Vec<_> = c.transcript().answers().collect();
        assert_eq!(pairs, vec![
            (DEFAULT_GREETING, "We sell pontoon boat rentals"),
            ("Where is your business located?", "Port Orange, FL"),
        ]);
    }
}
