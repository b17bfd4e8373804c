use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use log::{ info, warn };

pub const DEFAULT_GREETING: &str =
    "Hi! I'm your website assistant. Let's build your business a website. To start, tell me what your business does.";

pub const DEFAULT_QUESTIONS: [&str; 10] = [
    "Where is your business located?",
    "What is the name of your business?",
    "What products or services do you offer?",
    "Who is your target audience or ideal customer?",
    "How would you describe your brand personality?",
    "What visual style do you prefer for your website (modern, classic, bold, minimal)?",
    "What phone number should people call to reach you?",
    "What email should appear on your website?",
    "What is your street address?",
    "What is the main thing visitors should do on your site (book, buy, visit, get a quote)?",
];

#[derive(Debug)]
pub enum ScriptError {
    EmptyGreeting,
    EmptyQuestion(usize),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::EmptyGreeting => write!(f, "Question script greeting is empty"),
            ScriptError::EmptyQuestion(idx) => write!(f, "Question script entry {} is empty", idx),
            ScriptError::IoError(e) => write!(f, "Question script IO error: {}", e),
            ScriptError::JsonError(e) => write!(f, "Question script JSON parsing error: {}", e),
        }
    }
}

impl Error for ScriptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScriptError::IoError(e) => Some(e),
            ScriptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScriptError {
    fn from(err: std::io::Error) -> Self {
        ScriptError::IoError(err)
    }
}

impl From<serde_json::Error> for ScriptError {
    fn from(err: serde_json::Error) -> Self {
        ScriptError::JsonError(err)
    }
}

/// The fixed prompts the collector walks through. The greeting is asked first
/// and counts as the first question.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct QuestionScript {
    pub greeting: String,
    pub questions: Vec<String>,
    #[serde(skip)]
    pub last_loaded: Option<SystemTime>,
}

impl Default for QuestionScript {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            questions: DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            last_loaded: None,
        }
    }
}

impl QuestionScript {
    /// Greeting followed by the follow-up questions.
    pub fn total(&self) -> usize {
        1 + self.questions.len()
    }

    pub fn prompt(&self, index: usize) -> Option<&str> {
        if index == 0 {
            Some(self.greeting.as_str())
        } else {
            self.questions.get(index - 1).map(|q| q.as_str())
        }
    }

    fn validate(&self) -> Result<(), ScriptError> {
        if self.greeting.trim().is_empty() {
            return Err(ScriptError::EmptyGreeting);
        }
        if let Some(idx) = self.questions.iter().position(|q| q.trim().is_empty()) {
            return Err(ScriptError::EmptyQuestion(idx));
        }
        Ok(())
    }
}

pub fn parse_script(json: &str) -> Result<QuestionScript, ScriptError> {
    let script: QuestionScript = serde_json::from_str(json)?;
    script.validate()?;
    Ok(script)
}

pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Arc<QuestionScript>, ScriptError> {
    let content = fs::read_to_string(path.as_ref())?;
    let mut script = parse_script(&content)?;
    script.last_loaded = Some(SystemTime::now());
    Ok(Arc::new(script))
}

/// Loads the script file, falling back to the built-in script when the file is
/// missing. A present but invalid file is still an error.
pub fn load_script_or_default<P: AsRef<Path>>(
    path: P
) -> Result<Arc<QuestionScript>, ScriptError> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("Question script '{}' not found, using built-in script", path.display());
        return Ok(Arc::new(QuestionScript::default()));
    }
    let script = load_script(path)?;
    info!("Loaded question script from {} ({} prompts)", path.display(), script.total());
    Ok(script)
}

pub fn reload_script_if_changed<P: AsRef<Path>>(
    path: P,
    current: &Arc<QuestionScript>
) -> Result<Option<Arc<QuestionScript>>, ScriptError> {
    let metadata = fs::metadata(&path)?;

    if let Ok(modified) = metadata.modified() {
        match current.last_loaded {
            Some(last_loaded) if modified <= last_loaded => {}
            Some(_) => {
                info!("Question script changed, reloading...");
                return load_script(path).map(Some);
            }
            None => {
                info!("No last_loaded timestamp, reloading question script...");
                return load_script(path).map(Some);
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn default_script_has_eleven_prompts() {
        let script = QuestionScript::default();
        assert_eq!(script.total(), 11);
        assert_eq!(script.prompt(0), Some(DEFAULT_GREETING));
        assert_eq!(script.prompt(1), Some("Where is your business located?"));
        assert_eq!(script.prompt(11), None);
    }

    #[test]
    fn parse_rejects_blank_questions() {
        let err = parse_script(r#"{"greeting":"Hi","questions":["One?","  "]}"#).unwrap_err();
        assert!(matches!(err, ScriptError::EmptyQuestion(1)));

        let err = parse_script(r#"{"greeting":" ","questions":[]}"#).unwrap_err();
        assert!(matches!(err, ScriptError::EmptyGreeting));
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let script = load_script_or_default(temp_path("missing-script")).unwrap();
        assert_eq!(*script, QuestionScript::default());
    }

    #[test]
    fn reload_picks_up_unloaded_script() {
        let path = temp_path("script");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{"greeting":"Hello there","questions":["Where?"]}}"#).unwrap();

        let current = Arc::new(QuestionScript::default());
        let reloaded = reload_script_if_changed(&path, &current).unwrap().unwrap();
        assert_eq!(reloaded.greeting, "Hello there");
        assert_eq!(reloaded.total(), 2);

        assert!(reload_script_if_changed(&path, &reloaded).unwrap().is_none());
        let _ = fs::remove_file(&path);
    }
}
