use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyQuestion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_date: NaiveDate,
    pub question_type: QuestionCategory,
    pub question_text: String,
    pub user_response: Option<String>,
    pub points_earned: Option<i32>,
    pub answered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "question_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Gratitude,
    Reflection,
    Growth,
    Connection,
}

impl QuestionCategory {
    pub const ALL: [QuestionCategory; 4] = [
        QuestionCategory::Gratitude,
        QuestionCategory::Reflection,
        QuestionCategory::Growth,
        QuestionCategory::Connection,
    ];
}

#[derive(Debug, Serialize)]
pub struct TodayQuestionResponse {
    pub question: DailyQuestion,
    pub has_answered: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerRequest {
    pub question_id: Uuid,
    #[validate(length(min = 1, max = 4000, message = "Response must be 1-4000 characters"))]
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub points_earned: i32,
    pub new_streak: i32,
    pub total_experience: i64,
    pub current_level: i32,
}
