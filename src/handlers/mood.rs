use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::session::{
    AnalyzeMoodRequest, AnalyzeMoodResponse, MoodAnalysis, MoodSession, SessionQuery,
};
use crate::services::gemini::{self, Content, GenerateContentRequest, GenerationConfig, Part};
use crate::services::progress;
use crate::AppState;

fn analysis_prompt(text: &str, quick_mood: Option<&str>) -> String {
    format!(
        r#"Analyze this emotional input and provide:
1. Primary emotion detected (happy, sad, anxious, angry, peaceful, excited, etc.)
2. Emotional intensity (1-10)
3. A supportive response that acknowledges their feelings
4. Experience points to award (1-5 based on emotional depth shared)

User input: "{}"
{}

Respond in JSON format:
{{
  "emotion": "primary emotion",
  "intensity": number,
  "supportive_message": "empathetic response",
  "experience_points": number,
  "mood_insights": "brief insight about their emotional state"
}}"#,
        text,
        quick_mood
            .map(|m| format!("Quick mood selected: {}", m))
            .unwrap_or_default()
    )
}

fn fallback_analysis(quick_mood: Option<&str>) -> MoodAnalysis {
    MoodAnalysis {
        emotion: quick_mood.unwrap_or("mixed").to_string(),
        intensity: 5,
        supportive_message: "Thank you for sharing your feelings with me. \
            Your emotional awareness is a sign of strength. 🌟"
            .into(),
        experience_points: 2,
        mood_insights: "Every emotion you feel is valid and part of your healing journey.".into(),
    }
}

async fn run_analysis(state: &AppState, body: &AnalyzeMoodRequest) -> anyhow::Result<MoodAnalysis> {
    let request = GenerateContentRequest {
        contents: vec![Content {
            role: "user".into(),
            parts: vec![Part {
                text: analysis_prompt(&body.text, body.quick_mood.as_deref()),
            }],
        }],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            temperature: Some(0.3),
            top_k: Some(40),
            top_p: Some(0.8),
            max_output_tokens: Some(300),
        }),
        safety_settings: None,
    };

    let reply = state.gemini.generate(&request).await?;
    let json = gemini::extract_json(&reply)
        .ok_or_else(|| anyhow::anyhow!("No JSON object in model reply"))?;
    let mut analysis: MoodAnalysis = serde_json::from_str(json)?;

    // The model occasionally ignores the 1-5 instruction
    analysis.experience_points = analysis.experience_points.clamp(1, 5);
    analysis.intensity = analysis.intensity.clamp(1, 10);
    Ok(analysis)
}

pub async fn analyze_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<AnalyzeMoodRequest>,
) -> AppResult<Json<AnalyzeMoodResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (analysis, source) = match run_analysis(&state, &body).await {
        Ok(analysis) => (analysis, "gemini"),
        Err(e) => {
            tracing::warn!(error = %e, "Mood analysis unavailable, using fallback");
            (fallback_analysis(body.quick_mood.as_deref()), "fallback")
        }
    };

    sqlx::query(
        r#"
        INSERT INTO mood_sessions
            (id, user_id, session_type, mood_detected, intensity, quick_mood, ai_response, experience_gained)
        VALUES ($1, $2, 'mood_analysis', $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&analysis.emotion)
    .bind(analysis.intensity)
    .bind(&body.quick_mood)
    .bind(&analysis.supportive_message)
    .bind(analysis.experience_points)
    .execute(&state.db)
    .await?;

    let counters =
        progress::award_experience(&state.db, auth_user.id, analysis.experience_points).await?;

    tracing::info!(
        user_id = %auth_user.id,
        emotion = %analysis.emotion,
        source = source,
        "Mood analysis completed"
    );

    Ok(Json(AnalyzeMoodResponse {
        analysis,
        source: source.into(),
        total_experience: counters.total_experience,
        current_level: counters.current_level,
    }))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SessionQuery>,
) -> AppResult<Json<Vec<MoodSession>>> {
    let start = query
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive() - chrono::Duration::days(30));
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());

    let sessions = sqlx::query_as::<_, MoodSession>(
        r#"
        SELECT * FROM mood_sessions
        WHERE user_id = $1 AND created_at::date BETWEEN $2 AND $3
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(sessions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_input_and_quick_mood() {
        let prompt = analysis_prompt("feeling heavy today", Some("sad"));
        assert!(prompt.contains("feeling heavy today"));
        assert!(prompt.contains("Quick mood selected: sad"));

        let prompt = analysis_prompt("good day", None);
        assert!(!prompt.contains("Quick mood selected"));
    }

    #[test]
    fn fallback_uses_quick_mood_when_present() {
        assert_eq!(fallback_analysis(Some("anxious")).emotion, "anxious");
        assert_eq!(fallback_analysis(None).emotion, "mixed");
        assert_eq!(fallback_analysis(None).experience_points, 2);
    }

    #[test]
    fn model_analysis_parses_from_wrapped_reply() {
        let reply = "Sure! ```json\n{\"emotion\": \"hopeful\", \"intensity\": 12, \
            \"supportive_message\": \"m\", \"experience_points\": 9, \"mood_insights\": \"i\"}\n```";
        let json = gemini::extract_json(reply).unwrap();
        let mut analysis: MoodAnalysis = serde_json::from_str(json).unwrap();
        analysis.experience_points = analysis.experience_points.clamp(1, 5);
        analysis.intensity = analysis.intensity.clamp(1, 10);
        assert_eq!(analysis.emotion, "hopeful");
        assert_eq!(analysis.experience_points, 5);
        assert_eq!(analysis.intensity, 10);
    }
}
