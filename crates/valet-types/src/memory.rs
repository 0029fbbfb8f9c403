//! Memory types for Valet.
//!
//! These types model long-term memory: durable facts extracted from user
//! utterances by the rule-based extractor, and knowledge snippets retrieved
//! from the vector index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Category of an extracted memory.
///
/// Matches the categories of the extraction rule table; used to classify
/// memories for retrieval prioritization and operator browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    PersonalInfo,
    ProfessionalInfo,
    ContactInfo,
    ProjectInfo,
    Goals,
    Preferences,
    ExplicitMemory,
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemoryCategory::PersonalInfo => "personal_info",
            MemoryCategory::ProfessionalInfo => "professional_info",
            MemoryCategory::ContactInfo => "contact_info",
            MemoryCategory::ProjectInfo => "project_info",
            MemoryCategory::Goals => "goals",
            MemoryCategory::Preferences => "preferences",
            MemoryCategory::ExplicitMemory => "explicit_memory",
        };
        write!(f, "{s}")
    }
}

impl FromStr for MemoryCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal_info" => Ok(MemoryCategory::PersonalInfo),
            "professional_info" => Ok(MemoryCategory::ProfessionalInfo),
            "contact_info" => Ok(MemoryCategory::ContactInfo),
            "project_info" => Ok(MemoryCategory::ProjectInfo),
            "goals" => Ok(MemoryCategory::Goals),
            "preferences" => Ok(MemoryCategory::Preferences),
            "explicit_memory" => Ok(MemoryCategory::ExplicitMemory),
            other => Err(format!("invalid memory category: '{other}'")),
        }
    }
}

/// A durable memory persisted to the memory bank.
///
/// Independent of any session. Never mutated; only deleted by explicit
/// operator action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub category: MemoryCategory,
    pub content: String,
    /// Importance score from 0 to 10, assigned by the extraction rule table.
    pub importance: u8,
    pub created_at: DateTime<Utc>,
}

/// The result of scoring a single utterance against the extraction rules,
/// before it is persisted as a [`Memory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFact {
    pub category: MemoryCategory,
    pub content: String,
    pub importance: u8,
}

/// A knowledge snippet returned by the context retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub score: f32,
    pub title: Option<String>,
    pub source: Option<String>,
}
