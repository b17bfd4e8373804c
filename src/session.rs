use crate::config::script::QuestionScript;
use crate::conversation::{ AnswerOutcome, ConversationCollector, ConversationError, Transcript };
use chrono::{ DateTime, Utc };
use log::{ debug, info };
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error("image reference must not be empty")]
    EmptyImage,
    #[error("image limit of {0} reached")]
    TooManyImages(usize),
    #[error("a generation is already in progress for this session")]
    GenerationInFlight,
    #[error("session {0} was reset while the site was being generated")]
    Superseded(Uuid),
    #[error("site generation failed")]
    GenerationFailed,
}

/// One conversation: transcript, uploaded image references and generation state.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    collector: ConversationCollector,
    images: Vec<String>,
    epoch: u64,
    generating: bool,
    last_site_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    last_active: Instant,
    /// Owned by a live connection; never evicted for idleness.
    pinned: bool,
}

impl Session {
    fn new(script: Arc<QuestionScript>, pinned: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            collector: ConversationCollector::new(script),
            images: Vec::new(),
            epoch: 0,
            generating: false,
            last_site_id: None,
            created_at: Utc::now(),
            last_active: Instant::now(),
            pinned,
        }
    }

    fn is_idle(&self, timeout: Duration) -> bool {
        !self.pinned && !self.generating && self.last_active.elapsed() >= timeout
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            transcript: self.collector.transcript().clone(),
            question: self.collector.current_question().map(str::to_string),
            complete: self.collector.is_complete(),
            images: self.images.clone(),
            answered: self.collector.answered(),
            total: self.collector.total_questions(),
            generating: self.generating,
            last_site_id: self.last_site_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub transcript: Transcript,
    pub question: Option<String>,
    pub complete: bool,
    pub images: Vec<String>,
    pub answered: usize,
    pub total: usize,
    pub generating: bool,
    pub last_site_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Handed out when a generation starts. Carries the inputs captured at that
/// moment and the epoch used to detect a reset in the meantime.
#[derive(Clone, Debug)]
pub struct GenerationTicket {
    pub session_id: Uuid,
    pub epoch: u64,
    pub transcript: Transcript,
    pub images: Vec<String>,
}

/// Looks up a session and marks it active.
fn touch(sessions: &mut HashMap<Uuid, Session>, id: Uuid) -> Result<&mut Session, SessionError> {
    let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
    session.last_active = Instant::now();
    Ok(session)
}

pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
    max_images: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(max_images: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_images,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// A session reachable by id only. Evicted once idle for the timeout.
    pub async fn create(&self, script: Arc<QuestionScript>) -> SessionSnapshot {
        self.insert(Session::new(script, false)).await
    }

    /// A session owned by a connection, removed explicitly when it closes.
    pub async fn create_pinned(&self, script: Arc<QuestionScript>) -> SessionSnapshot {
        self.insert(Session::new(script, true)).await
    }

    async fn insert(&self, session: Session) -> SessionSnapshot {
        let snapshot = session.snapshot();
        let mut sessions = self.sessions.lock().await;
        self.evict_idle(&mut sessions);
        sessions.insert(session.id, session);
        info!("Created session {} ({} active)", snapshot.session_id, sessions.len());
        snapshot
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, Session>) {
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(self.idle_timeout));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle session(s)", evicted);
        }
    }

    /// Returns false when no such session exists.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.lock().await.remove(&id).is_some();
        if removed {
            debug!("Removed session {}", id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = self.sessions.lock().await;
        touch(&mut sessions, id).map(|session| session.snapshot())
    }

    pub async fn record_answer(
        &self,
        id: Uuid,
        text: &str
    ) -> Result<(AnswerOutcome, SessionSnapshot), SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = touch(&mut sessions, id)?;
        let outcome = session.collector.record_answer(text)?;
        Ok((outcome, session.snapshot()))
    }

    /// Returns the number of images now attached to the session.
    pub async fn add_image(&self, id: Uuid, url: &str) -> Result<usize, SessionError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SessionError::EmptyImage);
        }
        let mut sessions = self.sessions.lock().await;
        let session = touch(&mut sessions, id)?;
        if session.images.len() >= self.max_images {
            return Err(SessionError::TooManyImages(self.max_images));
        }
        session.images.push(url.to_string());
        Ok(session.images.len())
    }

    /// Back to the greeting. Images, the last site and any outstanding
    /// generation are discarded; a generation still running becomes stale.
    pub async fn reset(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = touch(&mut sessions, id)?;
        session.collector.reset();
        session.images.clear();
        session.last_site_id = None;
        session.generating = false;
        session.epoch += 1;
        info!("Reset session {} (epoch {})", id, session.epoch);
        Ok(session.snapshot())
    }

    pub async fn begin_generation(&self, id: Uuid) -> Result<GenerationTicket, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = touch(&mut sessions, id)?;
        if session.generating {
            return Err(SessionError::GenerationInFlight);
        }
        session.generating = true;
        Ok(GenerationTicket {
            session_id: id,
            epoch: session.epoch,
            transcript: session.collector.transcript().clone(),
            images: session.images.clone(),
        })
    }

    /// Clears the in-flight flag and records the site. Returns false when the
    /// session was reset or removed since the ticket was issued.
    pub async fn finish_generation(&self, ticket: &GenerationTicket, site_id: Uuid) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&ticket.session_id) {
            Some(session) if session.epoch == ticket.epoch => {
                session.generating = false;
                session.last_site_id = Some(site_id);
                session.last_active = Instant::now();
                true
            }
            _ => false,
        }
    }

    pub async fn abandon_generation(&self, ticket: &GenerationTicket) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&ticket.session_id) {
            if session.epoch == ticket.epoch {
                session.generating = false;
            }
        }
    }
}
