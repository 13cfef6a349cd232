use axum::{extract::State, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::interaction::{AiInteraction, ChatRequest, ChatResponse, ChatRole};
use crate::services::gemini::{
    default_safety_settings, Content, GenerateContentRequest, GenerationConfig, Part,
    SystemInstruction,
};
use crate::AppState;

const FALLBACK_REPLY: &str =
    "I'm having trouble connecting right now, but I'm still here with you 🌲";

fn companion_system_prompt(mood: Option<&str>) -> String {
    format!(
        r#"You are a wise, empathetic AI companion in a mystical healing forest.
Traits:
- Warm, supportive, mystical tone
- Use nature metaphors
- Keep responses short (2-3 sentences)
- Sprinkle forest/nature emojis

Current mood: {}"#,
        mood.unwrap_or("neutral")
    )
}

fn build_chat_request(body: &ChatRequest) -> GenerateContentRequest {
    let mut contents: Vec<Content> = body
        .history
        .iter()
        .map(|turn| Content {
            role: match turn.role {
                ChatRole::User => "user".into(),
                ChatRole::Companion => "model".into(),
            },
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        })
        .collect();

    contents.push(Content {
        role: "user".into(),
        parts: vec![Part {
            text: body.message.clone(),
        }],
    });

    GenerateContentRequest {
        contents,
        system_instruction: Some(SystemInstruction {
            parts: vec![Part {
                text: companion_system_prompt(body.mood.as_deref()),
            }],
        }),
        generation_config: Some(GenerationConfig {
            temperature: Some(0.7),
            max_output_tokens: Some(200),
            ..Default::default()
        }),
        safety_settings: Some(default_safety_settings()),
    }
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = build_chat_request(&body);

    // A silent companion is worse than a canned one: upstream failures
    // become the fallback line, not an error response.
    let (reply, source) = match state.gemini.generate(&request).await {
        Ok(reply) => (reply, "gemini"),
        Err(e) => {
            tracing::warn!(error = %e, "Companion chat unavailable, using fallback");
            (FALLBACK_REPLY.to_string(), "fallback")
        }
    };

    sqlx::query(
        r#"
        INSERT INTO ai_interactions (id, user_id, interaction_type, user_input, ai_response, mood_context)
        VALUES ($1, $2, 'companion_chat', $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.message)
    .bind(&reply)
    .bind(&body.mood)
    .execute(&state.db)
    .await?;

    Ok(Json(ChatResponse {
        response: reply,
        source: source.into(),
    }))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<AiInteraction>>> {
    let interactions = sqlx::query_as::<_, AiInteraction>(
        r#"
        SELECT * FROM ai_interactions
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(interactions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interaction::ChatTurn;

    #[test]
    fn system_prompt_carries_mood() {
        assert!(companion_system_prompt(Some("anxious")).contains("Current mood: anxious"));
        assert!(companion_system_prompt(None).contains("Current mood: neutral"));
    }

    #[test]
    fn history_maps_to_gemini_roles() {
        let body = ChatRequest {
            message: "still feeling low".into(),
            mood: None,
            history: vec![
                ChatTurn {
                    role: ChatRole::User,
                    text: "hello".into(),
                },
                ChatTurn {
                    role: ChatRole::Companion,
                    text: "welcome back 🌿".into(),
                },
            ],
        };

        let request = build_chat_request(&body);
        assert_eq!(request.contents.len(), 3);
        assert_eq!(request.contents[0].role, "user");
        assert_eq!(request.contents[1].role, "model");
        assert_eq!(request.contents[2].role, "user");
        assert_eq!(request.contents[2].parts[0].text, "still feeling low");
        assert!(request.system_instruction.is_some());
        assert_eq!(request.safety_settings.as_ref().unwrap().len(), 4);
    }
}
