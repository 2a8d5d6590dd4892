//! Support chatbot: language detection, prompts, caching and the service
//! that answers visitors through an external language model.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use tracing::{error, warn};
use zeroize::Zeroizing;

use crate::domain::Error;
use crate::domain::ports::{
    ChatbotCache, ChatbotQuery, CompletionRequest, LanguageModel, LanguageModelError,
};

type HmacSha256 = Hmac<Sha256>;

/// Reply for a blank question.
pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a message to get a response.";

/// Generic reply for every upstream failure.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to process your request.";

/// Base lifetime of a cached answer.
pub const RESPONSE_CACHE_TTL: Duration = Duration::from_secs(200);

/// Upper bound of the random extension added to [`RESPONSE_CACHE_TTL`].
pub const RESPONSE_CACHE_JITTER: Duration = Duration::from_secs(20);

const SWEDISH_GREETINGS: [&str; 4] = ["hej", "hallå", "tjena", "hejsan"];

const ENGLISH_PROMPT: &str = "You are the support assistant for Nordic Code Works, a studio \
that builds websites and web applications for small businesses. Answer questions about our \
services, the project process, pricing packages and timelines briefly and politely. If you do \
not know the answer, suggest contacting the team through the contact page. Answer in English.";

const SWEDISH_PROMPT: &str = "Du är supportassistent för Nordic Code Works, en studio som \
bygger webbplatser och webbapplikationer åt små företag. Svara kort och vänligt på frågor om \
våra tjänster, projektprocessen, prispaket och tidsplaner. Om du inte vet svaret, föreslå att \
kunden kontaktar teamet via kontaktsidan. Svara på svenska.";

/// Language of a chatbot exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatbotLanguage {
    English,
    Swedish,
}

impl ChatbotLanguage {
    /// ISO 639-1 code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Swedish => "sv",
        }
    }

    /// System prompt in this language.
    pub const fn system_prompt(self) -> &'static str {
        match self {
            Self::English => ENGLISH_PROMPT,
            Self::Swedish => SWEDISH_PROMPT,
        }
    }
}

impl fmt::Display for ChatbotLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Answer returned to the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatbotReply {
    pub response: String,
    pub language: ChatbotLanguage,
    pub cached: bool,
}

/// Guess the visitor's language from their message.
///
/// # Examples
/// ```
/// use portal::domain::{ChatbotLanguage, detect_language};
///
/// assert_eq!(detect_language("Hej!"), ChatbotLanguage::Swedish);
/// assert_eq!(detect_language("ok"), ChatbotLanguage::English);
/// ```
pub fn detect_language(message: &str) -> ChatbotLanguage {
    let lowered = message.trim().to_lowercase();
    let bare = lowered.strip_suffix('!').unwrap_or(&lowered);
    if SWEDISH_GREETINGS.contains(&bare) {
        return ChatbotLanguage::Swedish;
    }
    if lowered.chars().count() <= 2 {
        return ChatbotLanguage::English;
    }
    if lowered.contains(['å', 'ä', 'ö']) {
        ChatbotLanguage::Swedish
    } else {
        ChatbotLanguage::English
    }
}

/// Escape the characters HTML treats specially.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Cache key for an answer: a keyed hash, so raw questions never reach the
/// cache.
pub fn response_cache_key(pepper: &[u8], message: &str) -> Result<String, Error> {
    let mut mac = HmacSha256::new_from_slice(pepper)
        .map_err(|err| Error::internal(format!("invalid chatbot cache pepper: {err}")))?;
    mac.update(message.as_bytes());
    Ok(format!(
        "secure_chatbot_response_{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn map_model_error(error: &LanguageModelError) -> Error {
    match error {
        LanguageModelError::Timeout { .. } => Error::upstream_timeout(UPSTREAM_FAILURE_MESSAGE),
        LanguageModelError::Unavailable { .. } => {
            Error::service_unavailable(UPSTREAM_FAILURE_MESSAGE)
        }
        LanguageModelError::Upstream { .. } | LanguageModelError::InvalidResponse { .. } => {
            Error::upstream_failure(UPSTREAM_FAILURE_MESSAGE)
        }
    }
}

/// Chatbot service implementing [`ChatbotQuery`].
#[derive(Clone)]
pub struct ChatbotService<C, L> {
    cache: Arc<C>,
    model: Arc<L>,
    pepper: Arc<Zeroizing<Vec<u8>>>,
}

impl<C, L> ChatbotService<C, L> {
    /// Create a service; `pepper` keys the cache hash.
    pub fn new(cache: Arc<C>, model: Arc<L>, pepper: Zeroizing<Vec<u8>>) -> Self {
        Self {
            cache,
            model,
            pepper: Arc::new(pepper),
        }
    }

    fn ttl() -> Duration {
        let jitter = rand::thread_rng().gen_range(0..=RESPONSE_CACHE_JITTER.as_secs());
        RESPONSE_CACHE_TTL + Duration::from_secs(jitter)
    }
}

#[async_trait]
impl<C, L> ChatbotQuery for ChatbotService<C, L>
where
    C: ChatbotCache,
    L: LanguageModel,
{
    async fn ask(&self, message: &str) -> Result<ChatbotReply, Error> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_request(EMPTY_QUESTION_MESSAGE));
        }
        let language = detect_language(trimmed);
        let question = escape_html(trimmed);
        let key = response_cache_key(self.pepper.as_slice(), &question)?;

        match self.cache.get(&key).await {
            Ok(Some(response)) => {
                return Ok(ChatbotReply {
                    response,
                    language,
                    cached: true,
                });
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "chatbot cache read failed"),
        }

        let request = CompletionRequest {
            system_prompt: language.system_prompt().to_owned(),
            user_message: question,
        };
        let response = self.model.complete(&request).await.map_err(|err| {
            error!(error = %err, "language model request failed");
            map_model_error(&err)
        })?;

        if let Err(err) = self.cache.put(&key, &response, Self::ttl()).await {
            warn!(error = %err, "chatbot cache write failed");
        }

        Ok(ChatbotReply {
            response,
            language,
            cached: false,
        })
    }
}
