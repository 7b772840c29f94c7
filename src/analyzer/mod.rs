//! Security review of source text through an external text-generation service.
//!
//! The [`Analyzer`] wraps a [`TextGenerator`] with the fixed AppSec review
//! instruction. Service failures never escape [`Analyzer::analyze`]; they come
//! back as in-band error text so that one failing file cannot abort a scan.

mod groq;

pub use groq::GroqClient;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Label used for free-form snippets typed in interactive mode.
pub const SNIPPET_LABEL: &str = "snippet";

/// Sentence the model is told to answer with when nothing is found.
pub const NO_FINDINGS: &str = "Nenhuma vulnerabilidade significativa detectada";

/// System instruction sent with every request.
pub const SYSTEM_PROMPT: &str = concat!(
    "Você é um engenheiro de segurança AppSec especialista em PHP e aplicações web estáticas ",
    "(HTML, CSS e JavaScript). ",
    "Analise o código fornecido em busca de vulnerabilidades de segurança, especialmente SQL Injection, ",
    "XSS e problemas de validação de entrada em páginas estáticas. ",
    "Responda sempre em português com um relatório conciso contendo: ",
    "1. Tipo de vulnerabilidade, 2. Linha (aprox.), 3. Gravidade, 4. Sugestão de correção. ",
    "Se não houver vulnerabilidades relevantes, escreva 'Nenhuma vulnerabilidade significativa detectada'."
);

/// Errors from the text-generation service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by service")]
    RateLimited,
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// A chat-style text generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply to `user` under the `system` instruction.
    async fn generate(&self, system: &str, user: &str) -> Result<String, ServiceError>;
}

/// Build the user message for a file.
///
/// The content is appended as-is; it never passes through a format string, so
/// braces and other delimiters inside the file are preserved.
pub fn user_message(label: &str, content: &str) -> String {
    let mut msg = String::with_capacity(label.len() + content.len() + 32);
    msg.push_str("Arquivo: ");
    msg.push_str(label);
    msg.push_str("\n\nCódigo:\n```");
    msg.push_str(content);
    msg.push_str("```");
    msg
}

/// Formats the in-band text recorded when analysis of `label` fails.
pub fn failure_text(label: &str, err: &ServiceError) -> String {
    format!("Error analyzing {}: {}", label, err)
}

/// The analyzer adapter.
#[derive(Clone)]
pub struct Analyzer {
    generator: Arc<dyn TextGenerator>,
}

impl Analyzer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Analyze `content`, propagating service errors.
    pub async fn try_analyze(&self, content: &str, label: &str) -> Result<String, ServiceError> {
        self.generator
            .generate(SYSTEM_PROMPT, &user_message(label, content))
            .await
    }

    /// Analyze `content`, turning service errors into report text.
    pub async fn analyze(&self, content: &str, label: &str) -> String {
        match self.try_analyze(content, label).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(label, error = %e, "analysis failed");
                failure_text(label, &e)
            }
        }
    }
}
