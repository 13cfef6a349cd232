use axum::{extract::State, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::garden::{CommunityTree, GardenResponse, GardenStats, PlantTreeRequest};
use crate::AppState;

/// Public view of the community garden: recent trees plus aggregate stats.
/// Author ids never leave the server.
pub async fn list_garden(State(state): State<AppState>) -> AppResult<Json<GardenResponse>> {
    let trees = sqlx::query_as::<_, CommunityTree>(
        r#"
        SELECT * FROM community_trees
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let stats = sqlx::query_as::<_, GardenStats>(
        r#"
        SELECT
            COUNT(*) AS total_trees,
            COUNT(*) FILTER (WHERE whisper <> '') AS total_whispers,
            COUNT(DISTINCT user_id) AS gardeners
        FROM community_trees
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(GardenResponse { trees, stats }))
}

pub async fn plant_tree(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<PlantTreeRequest>,
) -> AppResult<Json<CommunityTree>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tree = sqlx::query_as::<_, CommunityTree>(
        r#"
        INSERT INTO community_trees (id, user_id, tree_type, whisper, mood)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.tree_type)
    .bind(body.whisper.trim())
    .bind(body.mood)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(tree_id = %tree.id, tree_type = %tree.tree_type, "Tree planted in the garden");

    Ok(Json(tree))
}

#[cfg(test)]
mod tests {
    use crate::models::garden::{PlantTreeRequest, WhisperMood};
    use validator::Validate;

    #[test]
    fn whisper_length_is_bounded() {
        let ok = PlantTreeRequest {
            tree_type: "hope_pine".into(),
            whisper: "Light always finds a way through the canopy ✨".into(),
            mood: WhisperMood::Hopeful,
        };
        assert!(ok.validate().is_ok());

        let too_long = PlantTreeRequest {
            tree_type: "hope_pine".into(),
            whisper: "x".repeat(281),
            mood: WhisperMood::Hopeful,
        };
        assert!(too_long.validate().is_err());

        let empty = PlantTreeRequest {
            tree_type: "hope_pine".into(),
            whisper: String::new(),
            mood: WhisperMood::Peaceful,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn whitespace_only_whisper_rejected() {
        // Stored whispers are trimmed, so blanks must fail validation
        // rather than persist as an empty string.
        let blank = PlantTreeRequest {
            tree_type: "hope_pine".into(),
            whisper: "   \n\t ".into(),
            mood: WhisperMood::Peaceful,
        };
        assert!(blank.validate().is_err());
        assert_eq!(blank.whisper.trim(), "");
    }

    #[test]
    fn tree_serializes_without_author() {
        let tree = crate::models::garden::CommunityTree {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            tree_type: "wisdom_willow".into(),
            whisper: "Storms pass, roots deepen.".into(),
            mood: WhisperMood::Wise,
            growth_level: 1,
            created_at: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&tree).unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["mood"], "wise");
    }
}
