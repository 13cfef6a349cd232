use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub display_name: String,
    pub is_guest: bool,
    pub guest_token: Option<Uuid>,
    pub timezone: String,
    pub total_experience: i64,
    pub current_level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, returned from /api/me.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: String,
    pub is_guest: bool,
    pub timezone: String,
    pub total_experience: i64,
    pub current_level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub experience_to_next_level: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        let threshold = u.current_level as i64 * 100;
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            is_guest: u.is_guest,
            timezone: u.timezone,
            total_experience: u.total_experience,
            current_level: u.current_level,
            current_streak: u.current_streak,
            longest_streak: u.longest_streak,
            last_activity_date: u.last_activity_date,
            experience_to_next_level: (threshold - u.total_experience).max(0),
            created_at: u.created_at,
        }
    }
}
