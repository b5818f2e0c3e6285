//! Human-facing player handle (`GameName#TAG`).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const MAX_GAME_NAME_LEN: usize = 16;
const MAX_TAG_LINE_LEN: usize = 5;
const MIN_TAG_LINE_LEN: usize = 3;

/// The name/tag pair a player is searched by.
///
/// Comparison via [`RiotId::matches`] is case-insensitive, the way the
/// upstream account service treats handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

impl RiotId {
    /// Build a validated handle from its two halves.
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>) -> Result<Self, DomainError> {
        let game_name = game_name.into().trim().to_string();
        let tag_line = tag_line.into().trim().trim_start_matches('#').to_string();

        if game_name.is_empty() {
            return Err(DomainError::validation("game name must not be empty"));
        }
        if game_name.chars().count() > MAX_GAME_NAME_LEN {
            return Err(DomainError::validation(format!(
                "game name must be at most {MAX_GAME_NAME_LEN} characters"
            )));
        }
        let tag_len = tag_line.chars().count();
        if !(MIN_TAG_LINE_LEN..=MAX_TAG_LINE_LEN).contains(&tag_len) {
            return Err(DomainError::validation(format!(
                "tag line must be {MIN_TAG_LINE_LEN}-{MAX_TAG_LINE_LEN} characters"
            )));
        }
        if !tag_line.chars().all(char::is_alphanumeric) {
            return Err(DomainError::validation("tag line must be alphanumeric"));
        }

        Ok(Self {
            game_name,
            tag_line,
        })
    }

    /// Case-insensitive equality on both halves.
    pub fn matches(&self, other: &RiotId) -> bool {
        self.game_name.to_lowercase() == other.game_name.to_lowercase()
            && self.tag_line.to_lowercase() == other.tag_line.to_lowercase()
    }
}

impl core::fmt::Display for RiotId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

impl FromStr for RiotId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, tag) = s
            .rsplit_once('#')
            .ok_or_else(|| DomainError::validation(format!("expected Name#TAG, got {s:?}")))?;
        Self::new(name, tag)
    }
}
