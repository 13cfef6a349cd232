use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommunityTree {
    pub id: Uuid,
    #[serde(skip_serializing)] // garden entries are served anonymously
    pub user_id: Uuid,
    pub tree_type: String,
    pub whisper: String,
    pub mood: WhisperMood,
    pub growth_level: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "whisper_mood", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WhisperMood {
    Peaceful,
    Encouraging,
    Wise,
    Hopeful,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlantTreeRequest {
    #[validate(length(min = 1, max = 64, message = "Tree type must be 1-64 characters"))]
    pub tree_type: String,
    #[validate(
        length(min = 1, max = 280, message = "Whisper must be 1-280 characters"),
        custom = "not_blank"
    )]
    pub whisper: String,
    pub mood: WhisperMood,
}

// The handler stores the trimmed whisper, so the length rule alone would
// let a whitespace-only value through as an empty string.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

#[derive(Debug, Serialize, FromRow)]
pub struct GardenStats {
    pub total_trees: i64,
    pub total_whispers: i64,
    pub gardeners: i64,
}

#[derive(Debug, Serialize)]
pub struct GardenResponse {
    pub trees: Vec<CommunityTree>,
    pub stats: GardenStats,
}
