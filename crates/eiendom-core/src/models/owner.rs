use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;

/// One row of `matrikkel_owners.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerRecord {
    #[serde(default)]
    pub matrikkelnummer: Option<String>,
    #[serde(default)]
    pub eier: Option<String>,
}

impl OwnerRecord {
    pub fn new(matrikkelnummer: &str, eier: &str) -> Self {
        Self {
            matrikkelnummer: Some(matrikkelnummer.to_string()),
            eier: Some(eier.to_string()),
        }
    }

    /// Raw identifier, or `None` when missing or empty.
    pub fn raw_id(&self) -> Option<&str> {
        self.matrikkelnummer.as_deref().filter(|s| !s.is_empty())
    }
}

/// Load the owner list from disk.
pub fn load_owners(path: &Path) -> Result<Vec<OwnerRecord>, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::OwnersNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path).map_err(|source| PipelineError::OwnersUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| PipelineError::OwnersMalformed {
        path: path.to_path_buf(),
        source,
    })
}
