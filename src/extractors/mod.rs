//! Task-field extractors.
//!
//! Both strategies implement [`TaskExtractor`]. Neither ever fails: the
//! worst case is [`TaskFields::fallback`], reported through
//! [`Extraction::fallback`] so the caller can tell the user.
//!
//! - [`rules::RuleBasedExtractor`]: ordered regex passes, fully local.
//! - [`remote::RemoteModelExtractor`]: one chat-completion call per input.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::providers::ProviderError;
use crate::types::TaskFields;

pub mod remote;
pub mod rules;

pub use remote::RemoteModelExtractor;
pub use rules::RuleBasedExtractor;

/// Which extraction strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Local pattern rules.
    #[default]
    Rules,
    /// Remote chat-completion model.
    Remote,
}

impl ExtractorKind {
    /// Config/CLI spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" | "rule" | "rule-based" => Ok(Self::Rules),
            "remote" | "llm" | "openai" => Ok(Self::Remote),
            other => Err(format!(
                "unknown extractor {other:?}, expected \"rules\" or \"remote\""
            )),
        }
    }
}

/// Why an extraction fell back to the default record.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The transport failed (network, non-2xx, undecodable envelope).
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The model answered with no text.
    #[error("model reply was empty")]
    EmptyReply,
    /// The reply text was not JSON.
    #[error("model reply is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    /// The reply was JSON but not an object.
    #[error("model reply is not a JSON object")]
    NotAnObject,
}

/// The result of one extraction.
#[derive(Debug)]
pub struct Extraction {
    /// Extracted (or fallback) fields. Always valid.
    pub fields: TaskFields,
    /// Set when `fields` is the fallback record.
    pub fallback: Option<ExtractError>,
}

impl Extraction {
    /// A successful extraction.
    pub fn parsed(fields: TaskFields) -> Self {
        Self {
            fields,
            fallback: None,
        }
    }

    /// The fallback record for `input`, remembering why.
    pub fn fallback(input: &str, reason: ExtractError) -> Self {
        Self {
            fields: TaskFields::fallback(input),
            fallback: Some(reason),
        }
    }

    /// Whether the fallback record was used.
    pub fn used_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Turns one free-text sentence into [`TaskFields`].
///
/// Implementations are total: every call completes with a valid record.
#[async_trait]
pub trait TaskExtractor: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Extract fields and report whether a fallback was used.
    async fn extract_detailed(&self, input: &str) -> Extraction;

    /// Extract fields, discarding the fallback reason.
    async fn extract(&self, input: &str) -> TaskFields {
        self.extract_detailed(input).await.fields
    }
}
