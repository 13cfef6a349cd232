use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One recorded mood submission and the analysis it produced.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_type: String,
    pub mood_detected: Option<String>,
    pub intensity: Option<i32>,
    pub quick_mood: Option<String>,
    pub ai_response: Option<String>,
    pub experience_gained: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeMoodRequest {
    #[validate(length(min = 1, max = 2000, message = "Mood text must be 1-2000 characters"))]
    pub text: String,
    pub quick_mood: Option<String>,
}

/// The structured analysis extracted from the model reply (or the fallback).
#[derive(Debug, Serialize, Deserialize)]
pub struct MoodAnalysis {
    pub emotion: String,
    pub intensity: i32,
    pub supportive_message: String,
    pub experience_points: i32,
    pub mood_insights: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeMoodResponse {
    pub analysis: MoodAnalysis,
    pub source: String, // "gemini" or "fallback"
    pub total_experience: i64,
    pub current_level: i32,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}
