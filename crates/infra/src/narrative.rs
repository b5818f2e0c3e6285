//! Natural-language descriptions of summaries.
//!
//! Generation itself lives outside this crate; the service only needs
//! something that implements [`NarrativeGenerator`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use matchlens_analytics::{DuoSummary, PlayerSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Narrative {
    Text(String),
    /// No generator is configured.
    Disabled,
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative generation failed: {0}")]
    Generation(String),
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync + 'static {
    /// `focus` optionally steers the description towards one topic.
    async fn describe_player(
        &self,
        summary: &PlayerSummary,
        focus: Option<&str>,
    ) -> Result<Narrative, NarrativeError>;

    /// `names` are the display names of the two players, in summary order.
    async fn describe_duo(
        &self,
        summary: &DuoSummary,
        names: Option<(&str, &str)>,
    ) -> Result<Narrative, NarrativeError>;
}

/// Always answers [`Narrative::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNarrator;

#[async_trait]
impl NarrativeGenerator for DisabledNarrator {
    async fn describe_player(
        &self,
        _summary: &PlayerSummary,
        _focus: Option<&str>,
    ) -> Result<Narrative, NarrativeError> {
        Ok(Narrative::Disabled)
    }

    async fn describe_duo(
        &self,
        _summary: &DuoSummary,
        _names: Option<(&str, &str)>,
    ) -> Result<Narrative, NarrativeError> {
        Ok(Narrative::Disabled)
    }
}
