use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::user::{User, UserProfile};
use crate::services::progress::growth_stage;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProgressSummary {
    pub profile: UserProfile,
    pub growth_stage: &'static str,
    pub mood_sessions: i64,
    pub chat_interactions: i64,
    pub days_reflected: i64,
}

/// Everything the growth-tree screen needs in one round trip.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ProgressSummary>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let mood_sessions =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM mood_sessions WHERE user_id = $1")
            .bind(auth_user.id)
            .fetch_one(&state.db)
            .await?;

    let chat_interactions =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ai_interactions WHERE user_id = $1")
            .bind(auth_user.id)
            .fetch_one(&state.db)
            .await?;

    let days_reflected = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(DISTINCT question_date) FROM daily_questions
        WHERE user_id = $1 AND answered_at IS NOT NULL
        "#,
    )
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    let stage = growth_stage(user.current_level);

    Ok(Json(ProgressSummary {
        profile: user.into(),
        growth_stage: stage,
        mood_sessions,
        chat_interactions,
        days_reflected,
    }))
}
