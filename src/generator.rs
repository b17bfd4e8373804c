use crate::llm::chat::ChatClient;
use crate::profile::BusinessProfile;
use crate::prompt::{ extract_document, fallback_document, ImageSet, PromptBuilder, Variant };
use log::{ info, warn };
use serde::Serialize;
use std::sync::Arc;

/// Everything one generation attempt needs. Built per attempt and dropped after.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub profile: BusinessProfile,
    pub images: ImageSet,
    pub variant: Variant,
    pub business_type: Option<String>,
}

impl GenerationRequest {
    pub fn prompt(&self) -> String {
        PromptBuilder::new(&self.profile, &self.images, self.variant)
            .business_type(self.business_type.as_deref())
            .build()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteSource {
    Oracle,
    Fallback,
}

#[derive(Clone, Debug)]
pub struct GeneratedSite {
    pub html: String,
    pub source: SiteSource,
    pub variant: Variant,
}

const LUXURY_HINTS: &[&str] = &["luxury", "premium", "elegant", "upscale", "high-end", "exclusive"];
const BOLD_HINTS: &[&str] = &["bold", "vibrant", "fun", "creative", "playful", "colorful"];

/// Picks the preset that best fits the profile's style, personality and
/// description, with a one-line explanation.
pub fn recommend(profile: &BusinessProfile) -> (Variant, String) {
    let haystack = format!(
        "{} {} {}",
        profile.style,
        profile.personality,
        profile.description
    ).to_lowercase();
    let words: Vec<&str> = haystack
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty())
        .collect();
    let mentions = |hints: &[&str]| hints.iter().any(|h| words.contains(h));

    let variant = if mentions(LUXURY_HINTS) {
        Variant::PremiumLuxury
    } else if mentions(BOLD_HINTS) {
        Variant::BoldCreative
    } else {
        Variant::ModernProfessional
    };

    let text = format!(
        "Recommended design: {} (variant {}) fits a {} brand with a \"{}\" style.",
        variant.name(),
        variant.number(),
        profile.personality.to_lowercase(),
        profile.style
    );
    (variant, text)
}

#[derive(Clone)]
pub struct SiteGenerator {
    chat_client: Arc<dyn ChatClient>,
}

impl SiteGenerator {
    pub fn new(chat_client: Arc<dyn ChatClient>) -> Self {
        Self { chat_client }
    }

    /// Never fails: oracle errors and responses without a doctype are both
    /// replaced by the local fallback document.
    pub async fn generate(&self, request: &GenerationRequest) -> GeneratedSite {
        let prompt = request.prompt();
        info!(
            "Generating site for '{}' (variant {}, {} images, model {})",
            request.profile.name,
            request.variant.number(),
            request.images.len(),
            self.chat_client.get_model()
        );

        let html = match self.chat_client.complete(&prompt).await {
            Ok(resp) => {
                match extract_document(&resp.response) {
                    Some(doc) => Some(doc),
                    None => {
                        warn!("Oracle response has no doctype marker ({} chars); using fallback", resp.response.len());
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Oracle request failed: {}; using fallback", e);
                None
            }
        };

        match html {
            Some(html) =>
                GeneratedSite {
                    html,
                    source: SiteSource::Oracle,
                    variant: request.variant,
                },
            None =>
                GeneratedSite {
                    html: fallback_document(&request.profile, &request.images),
                    source: SiteSource::Fallback,
                    variant: request.variant,
                },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::CompletionResponse;
    use crate::prompt::DOCTYPE_MARKER;
    use async_trait::async_trait;
    use std::error::Error as StdError;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(reply: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(
            &self,
            prompt: &str
        ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(CompletionResponse { response: text.clone() }),
                Err(e) => Err(e.clone().into()),
            }
        }

        fn get_model(&self) -> String {
            "scripted".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn request(variant: i64) -> GenerationRequest {
        GenerationRequest {
            profile: BusinessProfile::default(),
            images: ImageSet::new(["/uploads/a.jpg"]),
            variant: Variant::from_selector(variant),
            business_type: None,
        }
    }

    #[tokio::test]
    async fn fenced_oracle_output_is_cleaned() {
        let client = ScriptedClient::new(Ok("```html\n<!DOCTYPE html><html><body>ok</body></html>\n```"));
        let site = SiteGenerator::new(client.clone()).generate(&request(2)).await;
        assert_eq!(site.source, SiteSource::Oracle);
        assert_eq!(site.html, "<!DOCTYPE html><html><body>ok</body></html>");
        assert_eq!(site.variant, Variant::PremiumLuxury);

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("PREMIUM LUXURY"));
    }

    #[tokio::test]
    async fn missing_doctype_uses_fallback() {
        let client = ScriptedClient::new(Ok("<html><body>partial</body></html>"));
        let site = SiteGenerator::new(client).generate(&request(1)).await;
        assert_eq!(site.source, SiteSource::Fallback);
        assert!(site.html.starts_with(DOCTYPE_MARKER));
        assert!(site.html.contains("/uploads/a.jpg"));
    }

    #[tokio::test]
    async fn oracle_error_uses_fallback_without_retry() {
        let client = ScriptedClient::new(Err("connection refused"));
        let site = SiteGenerator::new(client.clone()).generate(&request(1)).await;
        assert_eq!(site.source, SiteSource::Fallback);
        assert!(site.html.contains(DOCTYPE_MARKER));
        assert_eq!(client.prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn recommendation_follows_style_keywords() {
        let mut profile = BusinessProfile::default();
        assert_eq!(recommend(&profile).0, Variant::ModernProfessional);

        profile.style = "Elegant and upscale".into();
        let (variant, text) = recommend(&profile);
        assert_eq!(variant, Variant::PremiumLuxury);
        assert!(text.contains("PREMIUM LUXURY"));

        profile.style = "Minimal".into();
        profile.personality = "Playful and loud".into();
        assert_eq!(recommend(&profile).0, Variant::BoldCreative);
    }

    #[test]
    fn recommendation_matches_whole_words_only() {
        let mut profile = BusinessProfile::default();
        profile.description = "A family funeral home offering refunds on functional caskets".into();
        assert_eq!(recommend(&profile).0, Variant::ModernProfessional);

        profile.style = "Sleek, high-end finishes".into();
        assert_eq!(recommend(&profile).0, Variant::PremiumLuxury);

        profile.style = "Clean".into();
        profile.personality = "Fun!".into();
        assert_eq!(recommend(&profile).0, Variant::BoldCreative);
    }
}
