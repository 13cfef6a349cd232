use axum::{extract::State, Extension, Json};
use chrono::Utc;
use rand::seq::SliceRandom;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::question::{
    AnswerRequest, AnswerResponse, DailyQuestion, QuestionCategory, TodayQuestionResponse,
};
use crate::services::progress;
use crate::AppState;

const GRATITUDE: [&str; 5] = [
    "What are 3 things you're grateful for today?",
    "Who is someone you appreciate and why?",
    "What small moment brought you joy recently?",
    "What's something about your body you're thankful for?",
    "What opportunity are you grateful to have?",
];

const REFLECTION: [&str; 5] = [
    "What did you learn about yourself today?",
    "How did you show kindness to someone?",
    "What challenge helped you grow?",
    "What would you tell your past self?",
    "How did you practice self-care today?",
];

const GROWTH: [&str; 5] = [
    "What's one thing you want to improve about yourself?",
    "How did you step out of your comfort zone?",
    "What fear did you face today?",
    "What new skill do you want to learn?",
    "How can you be more present tomorrow?",
];

const CONNECTION: [&str; 5] = [
    "Who made you feel understood today?",
    "How did you connect with nature?",
    "What act of kindness did you witness?",
    "How did you support someone else?",
    "What made you feel part of something bigger?",
];

pub fn question_bank(category: QuestionCategory) -> &'static [&'static str] {
    match category {
        QuestionCategory::Gratitude => &GRATITUDE,
        QuestionCategory::Reflection => &REFLECTION,
        QuestionCategory::Growth => &GROWTH,
        QuestionCategory::Connection => &CONNECTION,
    }
}

fn pick_question() -> (QuestionCategory, &'static str) {
    let mut rng = rand::thread_rng();
    let category = *QuestionCategory::ALL
        .choose(&mut rng)
        .expect("category list is non-empty");
    let text = *question_bank(category)
        .choose(&mut rng)
        .expect("question bank is non-empty");
    (category, text)
}

/// Return today's question for the user, creating one on first request.
/// The UNIQUE (user_id, question_date) constraint makes concurrent first
/// requests converge on a single row.
pub async fn today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<TodayQuestionResponse>> {
    let today = Utc::now().date_naive();

    let existing = sqlx::query_as::<_, DailyQuestion>(
        "SELECT * FROM daily_questions WHERE user_id = $1 AND question_date = $2",
    )
    .bind(auth_user.id)
    .bind(today)
    .fetch_optional(&state.db)
    .await?;

    let question = match existing {
        Some(q) => q,
        None => {
            let (category, text) = pick_question();
            // no-op update on conflict so RETURNING yields the winner's row
            sqlx::query_as::<_, DailyQuestion>(
                r#"
                INSERT INTO daily_questions (id, user_id, question_date, question_type, question_text)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (user_id, question_date) DO UPDATE
                    SET question_text = daily_questions.question_text
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(auth_user.id)
            .bind(today)
            .bind(category)
            .bind(text)
            .fetch_one(&state.db)
            .await?
        }
    };

    let has_answered = question.answered_at.is_some();
    Ok(Json(TodayQuestionResponse {
        question,
        has_answered,
    }))
}

pub async fn answer(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<AnswerRequest>,
) -> AppResult<Json<AnswerResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let points = progress::answer_points(&body.response);

    // The answered_at guard makes double submission lose the race cleanly
    let updated = sqlx::query(
        r#"
        UPDATE daily_questions SET
            user_response = $3,
            points_earned = $4,
            answered_at = NOW()
        WHERE id = $1 AND user_id = $2 AND answered_at IS NULL
        "#,
    )
    .bind(body.question_id)
    .bind(auth_user.id)
    .bind(&body.response)
    .bind(points)
    .execute(&state.db)
    .await?;

    if updated.rows_affected() == 0 {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM daily_questions WHERE id = $1 AND user_id = $2",
        )
        .bind(body.question_id)
        .bind(auth_user.id)
        .fetch_one(&state.db)
        .await?;

        return Err(if exists > 0 {
            AppError::Conflict("Question already answered".into())
        } else {
            AppError::NotFound("Question not found".into())
        });
    }

    let today = Utc::now().date_naive();
    let counters = progress::record_daily_activity(&state.db, auth_user.id, points, today).await?;

    tracing::info!(
        user_id = %auth_user.id,
        points = points,
        streak = counters.current_streak,
        "Daily question answered"
    );

    Ok(Json(AnswerResponse {
        points_earned: points,
        new_streak: counters.current_streak,
        total_experience: counters.total_experience,
        current_level: counters.current_level,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_five_questions() {
        for category in QuestionCategory::ALL {
            assert_eq!(question_bank(category).len(), 5);
        }
    }

    #[test]
    fn picked_question_belongs_to_its_category() {
        for _ in 0..20 {
            let (category, text) = pick_question();
            assert!(question_bank(category).contains(&text));
        }
    }
}
