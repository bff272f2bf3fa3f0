//! Study topic rotation and its persisted cursor.
//!
//! The cursor is stored as `{"topic_index": N}`. It only moves forward after
//! a study post has been generated *and* written, and it is only saved when
//! that happened, so a failed run retries the same topic next time.

use crate::error::{PostError, PostResult};
use crate::models::StudyTopic;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Persisted rotation cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RotationState {
    pub topic_index: usize,
}

impl RotationState {
    /// Read the cursor from `path`.
    ///
    /// A missing, unreadable or corrupt file resets the rotation to index 0;
    /// it is never an error.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No rotation state yet; starting at topic 0");
                return Self::default();
            }
            Err(e) => {
                warn!(error = %e, "Rotation state unreadable; starting at topic 0");
                return Self::default();
            }
        };
        match serde_json::from_str::<RotationState>(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Rotation state corrupt; starting at topic 0");
                Self::default()
            }
        }
    }

    /// Write the cursor back as pretty JSON, creating parent directories.
    #[instrument(
        level = "info",
        skip_all,
        fields(path = %path.display(), topic_index = self.topic_index)
    )]
    pub async fn save(&self, path: &Path) -> PostResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json).await?;
        info!("Saved rotation state");
        Ok(())
    }
}

/// Round-robin cursor over a fixed, non-empty topic list.
#[derive(Debug)]
pub struct TopicRotator<'a> {
    topics: &'a [StudyTopic],
    index: usize,
}

impl<'a> TopicRotator<'a> {
    /// Start from a persisted state. An out-of-range index wraps.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Config`] when `topics` is empty.
    pub fn new(topics: &'a [StudyTopic], state: RotationState) -> PostResult<Self> {
        if topics.is_empty() {
            return Err(PostError::Config("study topic list is empty".to_string()));
        }
        let index = state.topic_index % topics.len();
        Ok(Self { topics, index })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &'a StudyTopic {
        &self.topics[self.index]
    }

    /// Move to the next topic, wrapping after the last one.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.topics.len();
    }

    pub fn state(&self) -> RotationState {
        RotationState {
            topic_index: self.index,
        }
    }
}
