//! Gamification bookkeeping: experience, levels, and daily streaks.
//!
//! The arithmetic lives in pure functions; the async functions wrap it in a
//! transaction that locks the profile row, so two submissions landing at the
//! same time serialize instead of clobbering each other's totals.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// Experience required to leave the current level.
pub fn level_threshold(level: i32) -> i64 {
    level as i64 * 100
}

/// Apply an experience award. Levels advance at most one step per award,
/// when the new total reaches the current level's threshold.
pub fn apply_award(total_experience: i64, current_level: i32, points: i32) -> (i64, i32) {
    let new_total = total_experience + points as i64;
    let new_level = if new_total >= level_threshold(current_level) {
        current_level + 1
    } else {
        current_level
    };
    (new_total, new_level)
}

/// Next streak value given the last recorded activity date:
/// yesterday extends, today keeps, anything else restarts at 1.
pub fn next_streak(last_activity: Option<NaiveDate>, today: NaiveDate, current: i32) -> i32 {
    match last_activity {
        Some(last) if last == today => current.max(1),
        Some(last) if today - last == chrono::Duration::days(1) => current + 1,
        _ => 1,
    }
}

/// Points for a daily-question answer: base 3 plus a length bonus.
pub fn answer_points(response: &str) -> i32 {
    3 + (response.chars().count() / 10) as i32
}

/// Growth stage shown on the progress screen, derived from level.
pub fn growth_stage(level: i32) -> &'static str {
    match level {
        i32::MIN..=1 => "seed",
        2..=3 => "sprout",
        4..=6 => "sapling",
        7..=10 => "young tree",
        11..=20 => "mighty tree",
        _ => "ancient guardian",
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressCounters {
    pub total_experience: i64,
    pub current_level: i32,
    pub current_streak: i32,
}

/// Add experience to a profile under a row lock.
pub async fn award_experience(
    db: &PgPool,
    user_id: Uuid,
    points: i32,
) -> AppResult<ProgressCounters> {
    let mut tx = db.begin().await?;

    let (total, level, streak) = sqlx::query_as::<_, (i64, i32, i32)>(
        "SELECT total_experience, current_level, current_streak FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let (new_total, new_level) = apply_award(total, level, points);

    sqlx::query(
        r#"
        UPDATE users SET
            total_experience = $2,
            current_level = $3,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(new_total)
    .bind(new_level)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    if new_level > level {
        tracing::info!(user_id = %user_id, level = new_level, "User leveled up");
    }

    Ok(ProgressCounters {
        total_experience: new_total,
        current_level: new_level,
        current_streak: streak,
    })
}

/// Record a day of activity: advance the streak and add experience, all
/// under the same row lock.
pub async fn record_daily_activity(
    db: &PgPool,
    user_id: Uuid,
    points: i32,
    today: NaiveDate,
) -> AppResult<ProgressCounters> {
    let mut tx = db.begin().await?;

    let (total, level, streak, last_activity) =
        sqlx::query_as::<_, (i64, i32, i32, Option<NaiveDate>)>(
            r#"
            SELECT total_experience, current_level, current_streak, last_activity_date
            FROM users WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    let new_streak = next_streak(last_activity, today, streak);
    let (new_total, new_level) = apply_award(total, level, points);

    sqlx::query(
        r#"
        UPDATE users SET
            total_experience = $2,
            current_level = $3,
            current_streak = $4,
            longest_streak = GREATEST(longest_streak, $4),
            last_activity_date = $5,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(new_total)
    .bind(new_level)
    .bind(new_streak)
    .bind(today)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ProgressCounters {
        total_experience: new_total,
        current_level: new_level,
        current_streak: new_streak,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn award_below_threshold_keeps_level() {
        assert_eq!(apply_award(50, 1, 5), (55, 1));
    }

    #[test]
    fn award_reaching_threshold_levels_up() {
        // Level 1 threshold is 100
        assert_eq!(apply_award(98, 1, 2), (100, 2));
        assert_eq!(apply_award(98, 1, 5), (103, 2));
    }

    #[test]
    fn level_up_is_at_most_one_step() {
        // A huge award still only advances one level per submission
        assert_eq!(apply_award(0, 1, 500), (500, 2));
    }

    #[test]
    fn higher_levels_need_more_experience() {
        // Level 4 threshold is 400
        assert_eq!(apply_award(395, 4, 3), (398, 4));
        assert_eq!(apply_award(395, 4, 5), (400, 5));
    }

    #[test]
    fn streak_extends_after_yesterday() {
        let today = date(2026, 3, 10);
        assert_eq!(next_streak(Some(date(2026, 3, 9)), today, 4), 5);
    }

    #[test]
    fn streak_unchanged_same_day() {
        let today = date(2026, 3, 10);
        assert_eq!(next_streak(Some(today), today, 4), 4);
    }

    #[test]
    fn streak_resets_after_gap() {
        let today = date(2026, 3, 10);
        assert_eq!(next_streak(Some(date(2026, 3, 7)), today, 12), 1);
    }

    #[test]
    fn streak_starts_at_one_for_first_activity() {
        assert_eq!(next_streak(None, date(2026, 3, 10), 0), 1);
        // Same-day activity on a fresh profile still counts as a streak of 1
        let today = date(2026, 3, 10);
        assert_eq!(next_streak(Some(today), today, 0), 1);
    }

    #[test]
    fn answer_points_scale_with_length() {
        assert_eq!(answer_points("short"), 3);
        assert_eq!(answer_points(&"x".repeat(10)), 4);
        assert_eq!(answer_points(&"x".repeat(95)), 12);
    }

    #[test]
    fn answer_points_count_chars_not_bytes() {
        // 10 multi-byte characters should earn the same bonus as 10 ASCII ones
        assert_eq!(answer_points(&"🌲".repeat(10)), 4);
    }

    #[test]
    fn growth_stages_cover_all_levels() {
        assert_eq!(growth_stage(1), "seed");
        assert_eq!(growth_stage(2), "sprout");
        assert_eq!(growth_stage(5), "sapling");
        assert_eq!(growth_stage(8), "young tree");
        assert_eq!(growth_stage(15), "mighty tree");
        assert_eq!(growth_stage(40), "ancient guardian");
    }
}
