use crate::cli::Args;
use crate::config::script::{ self, QuestionScript, ScriptError };
use crate::conversation::{ AnswerOutcome, Speaker };
use crate::generator::{ recommend, GeneratedSite, GenerationRequest, SiteGenerator };
use crate::history::{ initialize_history_store, HistoryStore };
use crate::llm::LlmConfig;
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::models::site::SiteRecord;
use crate::profile::BusinessProfile;
use crate::profile::extract::{ extract, from_description, from_transcript };
use crate::prompt::{ ImageSet, Variant };
use crate::session::{ GenerationTicket, SessionError, SessionSnapshot, SessionStore };

use chrono::Utc;
use log::{ error, info, warn };
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Caller-chosen knobs for one generation. A missing variant means "use the
/// recommended one".
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    pub variant: Option<i64>,
    pub business_type: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SiteOutcome {
    pub site: GeneratedSite,
    pub recommendation: String,
    pub site_id: Uuid,
}

pub struct SiteAgent {
    generator: SiteGenerator,
    history_store: Arc<dyn HistoryStore>,
    sessions: SessionStore,
    script: RwLock<Arc<QuestionScript>>,
    questions_path: Option<String>,
}

impl SiteAgent {
    fn initialize_chat_client(
        args: &Args
    ) -> Result<Arc<dyn ChatClient>, Box<dyn Error + Send + Sync>> {
        let chat_api_key = if !args.chat_api_key.is_empty() {
            Some(args.chat_api_key.clone())
        } else {
            None
        };
        let chat_config = LlmConfig {
            llm_type: args.chat_llm_type.parse()?,
            api_key: chat_api_key,
            completion_model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
            temperature: args.chat_temperature,
            max_tokens: args.chat_max_tokens,
            timeout_secs: args.chat_timeout_secs,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={:?}",
            args.chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url()
        );
        Ok(chat_client)
    }

    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let chat_client = Self::initialize_chat_client(args)?;
        let history_store = initialize_history_store(args)?;
        let question_script = script::load_script_or_default(&args.questions_path)?;

        let mut agent = Self::with_parts(
            chat_client,
            history_store,
            question_script,
            args.max_images
        ).with_session_idle_timeout(Duration::from_secs(args.session_idle_secs));
        agent.questions_path = Some(args.questions_path.clone());
        Ok(agent)
    }

    /// Builds an agent from ready collaborators. No script file is watched.
    pub fn with_parts(
        chat_client: Arc<dyn ChatClient>,
        history_store: Arc<dyn HistoryStore>,
        question_script: Arc<QuestionScript>,
        max_images: usize
    ) -> Self {
        Self {
            generator: SiteGenerator::new(chat_client),
            history_store,
            sessions: SessionStore::new(max_images),
            script: RwLock::new(question_script),
            questions_path: None,
        }
    }

    /// Sessions untouched for this long are dropped when the next one is created.
    pub fn with_session_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.sessions = self.sessions.with_idle_timeout(idle_timeout);
        self
    }

    async fn record_history(&self, session_id: Uuid, role: Speaker, content: &str) {
        if
            let Err(e) = self.history_store.add_message(
                &session_id.to_string(),
                role,
                content
            ).await
        {
            warn!("Failed to store {} message for session {}: {}", role.as_str(), session_id, e);
        }
    }

    async fn save_site(&self, record: &SiteRecord) {
        if let Err(e) = self.history_store.save_site(record).await {
            warn!("Failed to store site {}: {}", record.id, e);
        }
    }

    pub async fn create_session(&self) -> SessionSnapshot {
        let question_script = Arc::clone(&*self.script.read().await);
        let snapshot = self.sessions.create(question_script).await;
        self.greet(&snapshot).await;
        snapshot
    }

    /// Session for a WebSocket connection. Not evicted while idle; the
    /// connection removes it on close.
    pub async fn open_connection_session(&self) -> SessionSnapshot {
        let question_script = Arc::clone(&*self.script.read().await);
        let snapshot = self.sessions.create_pinned(question_script).await;
        self.greet(&snapshot).await;
        snapshot
    }

    async fn greet(&self, snapshot: &SessionSnapshot) {
        if let Some(greeting) = snapshot.question.as_deref() {
            self.record_history(snapshot.session_id, Speaker::Assistant, greeting).await;
        }
    }

    pub async fn session(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        self.sessions.snapshot(id).await
    }

    pub async fn remove_session(&self, id: Uuid) -> Result<(), SessionError> {
        if self.sessions.remove(id).await {
            Ok(())
        } else {
            Err(SessionError::NotFound(id))
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    pub async fn answer(
        &self,
        id: Uuid,
        text: &str
    ) -> Result<(AnswerOutcome, SessionSnapshot), SessionError> {
        let (outcome, snapshot) = self.sessions.record_answer(id, text).await?;
        self.record_history(id, Speaker::User, text.trim()).await;
        match &outcome {
            AnswerOutcome::Next(question) => {
                self.record_history(id, Speaker::Assistant, question).await;
            }
            AnswerOutcome::Finished => {
                info!("Session {} answered all {} questions", id, snapshot.total);
            }
        }
        Ok((outcome, snapshot))
    }

    pub async fn add_image(&self, id: Uuid, url: &str) -> Result<usize, SessionError> {
        self.sessions.add_image(id, url).await
    }

    pub async fn reset(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let snapshot = self.sessions.reset(id).await?;
        if let Err(e) = self.history_store.clear_conversation(&id.to_string()).await {
            warn!("Failed to clear history for session {}: {}", id, e);
        }
        if let Some(greeting) = snapshot.question.as_deref() {
            self.record_history(id, Speaker::Assistant, greeting).await;
        }
        Ok(snapshot)
    }

    /// Marks the session as generating and captures its inputs.
    pub async fn start_generation(&self, id: Uuid) -> Result<GenerationTicket, SessionError> {
        self.sessions.begin_generation(id).await
    }

    pub async fn cancel_generation(&self, ticket: &GenerationTicket) {
        info!("Generation for session {} cancelled", ticket.session_id);
        self.sessions.abandon_generation(ticket).await;
    }

    /// Runs the oracle for a ticket. The result is stored only if the session
    /// has not been reset or removed in the meantime.
    pub async fn complete_generation(
        &self,
        ticket: GenerationTicket,
        options: GenerateOptions
    ) -> Result<SiteOutcome, SessionError> {
        let profile = extract(&from_transcript(&ticket.transcript));
        let (site, recommendation) = self.run_generator(
            profile.clone(),
            &ticket.images,
            options
        ).await;

        let site_id = Uuid::new_v4();
        if !self.sessions.finish_generation(&ticket, site_id).await {
            warn!("Discarding site for session {}: session changed", ticket.session_id);
            return Err(SessionError::Superseded(ticket.session_id));
        }

        let record = site_record(site_id, Some(ticket.session_id), &profile, &site, ticket.images);
        self.save_site(&record).await;
        Ok(SiteOutcome { site, recommendation, site_id })
    }

    /// Generation runs on its own task, so a caller that stops waiting still
    /// leaves the session with its flag cleared and the site stored.
    pub async fn generate_for_session(
        self: &Arc<Self>,
        id: Uuid,
        options: GenerateOptions
    ) -> Result<SiteOutcome, SessionError> {
        let ticket = self.start_generation(id).await?;
        let agent = Arc::clone(self);
        let task_ticket = ticket.clone();
        let task = tokio::spawn(async move {
            agent.complete_generation(task_ticket, options).await
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Generation task for session {} failed: {}", id, e);
                self.cancel_generation(&ticket).await;
                Err(SessionError::GenerationFailed)
            }
        }
    }

    /// Stateless generation from a free-text description. The site is stored
    /// without a session.
    pub async fn generate_from_description(
        &self,
        description: &str,
        images: Vec<String>,
        business_type: Option<String>
    ) -> SiteOutcome {
        let profile = extract(&from_description(description));
        let options = GenerateOptions { variant: None, business_type };
        let (site, recommendation) = self.run_generator(profile.clone(), &images, options).await;

        let site_id = Uuid::new_v4();
        let record = site_record(site_id, None, &profile, &site, images);
        self.save_site(&record).await;
        SiteOutcome { site, recommendation, site_id }
    }

    pub async fn generate_variant(
        &self,
        description: &str,
        images: Vec<String>,
        variant: i64
    ) -> GeneratedSite {
        let profile = extract(&from_description(description));
        let options = GenerateOptions { variant: Some(variant), business_type: None };
        self.run_generator(profile, &images, options).await.0
    }

    async fn run_generator(
        &self,
        profile: BusinessProfile,
        images: &[String],
        options: GenerateOptions
    ) -> (GeneratedSite, String) {
        let (recommended, recommendation) = recommend(&profile);
        let variant = options.variant.map(Variant::from_selector).unwrap_or(recommended);
        let request = GenerationRequest {
            profile,
            images: ImageSet::new(images),
            variant,
            business_type: options.business_type,
        };
        let site = self.generator.generate(&request).await;
        info!(
            "Generated {} bytes of HTML for '{}' ({:?})",
            site.html.len(),
            request.profile.name,
            site.source
        );
        (site, recommendation)
    }

    pub async fn get_site(
        &self,
        id: Uuid
    ) -> Result<Option<SiteRecord>, Box<dyn Error + Send + Sync>> {
        self.history_store.get_site(id).await
    }

    /// Reloads the question script when its file changed. New sessions use the
    /// new script; running sessions keep theirs.
    pub async fn reload_script_if_changed(&self) -> Result<bool, ScriptError> {
        let Some(path) = self.questions_path.as_deref() else {
            return Ok(false);
        };
        if !Path::new(path).exists() {
            return Ok(false);
        }

        let mut current = self.script.write().await;
        match script::reload_script_if_changed(path, &current)? {
            Some(new_script) => {
                info!("Question script reloaded ({} prompts)", new_script.total());
                *current = new_script;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn site_record(
    id: Uuid,
    session_id: Option<Uuid>,
    profile: &BusinessProfile,
    site: &GeneratedSite,
    images: Vec<String>
) -> SiteRecord {
    SiteRecord {
        id,
        session_id,
        name: profile.name.clone(),
        description: profile.description.clone(),
        html: site.html.clone(),
        css: serde_json::json!({}),
        images,
        variant: site.variant.number(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::SiteSource;
    use crate::history::MemoryHistoryStore;
    use crate::llm::chat::CompletionResponse;
    use async_trait::async_trait;
    use std::error::Error as StdError;

    struct EchoClient;

    #[async_trait]
    impl ChatClient for EchoClient {
        async fn complete(
            &self,
            _prompt: &str
        ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
            Ok(CompletionResponse {
                response: "<!DOCTYPE html><html><body>site</body></html>".into(),
            })
        }

        fn get_model(&self) -> String {
            "echo".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    struct SlowClient {
        delay: Duration,
    }

    #[async_trait]
    impl ChatClient for SlowClient {
        async fn complete(
            &self,
            _prompt: &str
        ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
            tokio::time::sleep(self.delay).await;
            Ok(CompletionResponse {
                response: "<!DOCTYPE html><html><body>slow</body></html>".into(),
            })
        }

        fn get_model(&self) -> String {
            "slow".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn agent_with(client: Arc<dyn ChatClient>) -> (Arc<SiteAgent>, Arc<MemoryHistoryStore>) {
        let history = Arc::new(MemoryHistoryStore::new());
        let agent = SiteAgent::with_parts(
            client,
            history.clone(),
            Arc::new(QuestionScript::default()),
            10
        );
        (Arc::new(agent), history)
    }

    fn agent() -> (Arc<SiteAgent>, Arc<MemoryHistoryStore>) {
        agent_with(Arc::new(EchoClient))
    }

    #[tokio::test]
    async fn answers_are_written_to_history() {
        let (agent, history) = agent();
        let id = agent.create_session().await.session_id;
        agent.answer(id, "  We sell kayaks ").await.unwrap();

        let conv = history.get_conversation(&id.to_string(), 10).await.unwrap();
        let roles: Vec<_> = conv.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Speaker::Assistant, Speaker::User, Speaker::Assistant]);
        assert_eq!(conv.messages[1].content, "We sell kayaks");
    }

    #[tokio::test]
    async fn reset_clears_history_back_to_greeting() {
        let (agent, history) = agent();
        let id = agent.create_session().await.session_id;
        agent.answer(id, "We sell kayaks").await.unwrap();
        agent.reset(id).await.unwrap();

        let conv = history.get_conversation(&id.to_string(), 10).await.unwrap();
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].role, Speaker::Assistant);
    }

    #[tokio::test]
    async fn session_generation_stores_site() {
        let (agent, _) = agent();
        let id = agent.create_session().await.session_id;
        agent.answer(id, "We sell kayaks").await.unwrap();

        let outcome = agent.generate_for_session(id, GenerateOptions::default()).await.unwrap();
        assert_eq!(outcome.site.source, SiteSource::Oracle);
        let record = agent.get_site(outcome.site_id).await.unwrap().unwrap();
        assert_eq!(record.session_id, Some(id));
        assert_eq!(record.html, outcome.site.html);
        assert_eq!(agent.session(id).await.unwrap().last_site_id, Some(outcome.site_id));
    }

    #[tokio::test]
    async fn abandoned_request_still_finishes_generation() {
        let (agent, _) = agent_with(Arc::new(SlowClient { delay: Duration::from_millis(200) }));
        let id = agent.create_session().await.session_id;

        let waited = tokio::time::timeout(
            Duration::from_millis(20),
            agent.generate_for_session(id, GenerateOptions::default())
        ).await;
        assert!(waited.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = agent.session(id).await.unwrap();
        assert!(!snapshot.generating);
        let site_id = snapshot.last_site_id.unwrap();
        assert!(agent.get_site(site_id).await.unwrap().is_some());

        assert!(agent.generate_for_session(id, GenerateOptions::default()).await.is_ok());
    }

    #[tokio::test]
    async fn removing_unknown_session_is_not_found() {
        let (agent, _) = agent();
        let id = agent.create_session().await.session_id;
        assert_eq!(agent.session_count().await, 1);
        agent.remove_session(id).await.unwrap();
        assert!(matches!(agent.remove_session(id).await, Err(SessionError::NotFound(_))));
        assert_eq!(agent.session_count().await, 0);
    }

    #[tokio::test]
    async fn reset_during_generation_discards_result() {
        let (agent, _) = agent();
        let id = agent.create_session().await.session_id;
        let ticket = agent.start_generation(id).await.unwrap();
        agent.reset(id).await.unwrap();

        let result = agent.complete_generation(ticket, GenerateOptions::default()).await;
        assert!(matches!(result, Err(SessionError::Superseded(x)) if x == id));
        assert_eq!(agent.session(id).await.unwrap().last_site_id, None);
    }

    #[tokio::test]
    async fn explicit_variant_overrides_recommendation() {
        let (agent, _) = agent();
        let site = agent.generate_variant("Acme | We sell anvils", vec![], 3).await;
        assert_eq!(site.variant, Variant::BoldCreative);

        let outcome = agent.generate_from_description(
            "Acme | We sell anvils",
            vec![],
            None
        ).await;
        assert_eq!(outcome.site.variant, Variant::ModernProfessional);
        assert!(outcome.recommendation.contains("MODERN PROFESSIONAL"));
    }

    #[tokio::test]
    async fn reload_without_script_file_is_noop() {
        let (agent, _) = agent();
        assert!(!agent.reload_script_if_changed().await.unwrap());
    }
}
