//! Account, profile and transcript queries.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::models::*;
use super::Database;
use crate::error::{CounselorError, CounselorResult};

impl Database {
    /// Insert the account row on first sight, refresh the email otherwise.
    pub async fn ensure_user(&self, user_id: &str, email: Option<&str>) -> CounselorResult<User> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                email = COALESCE(excluded.email, users.email)
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(user_id)
            .await?
            .ok_or_else(|| CounselorError::NotFound(format!("User {}", user_id)))
    }

    pub async fn get_user(&self, user_id: &str) -> CounselorResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> CounselorResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = ? ORDER BY created_at, id LIMIT 1",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    pub async fn activate_subscription(
        &self,
        user_id: &str,
        customer_id: Option<&str>,
    ) -> CounselorResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET subscription_status = 'active',
                stripe_customer_id = COALESCE(?, stripe_customer_id),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(customer_id)
        .bind(Utc::now())
        .bind(user_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CounselorError::NotFound(format!("User {}", user_id)));
        }
        info!("Subscription activated for user {}", user_id);
        Ok(())
    }

    pub async fn get_profile(&self, user_id: &str) -> CounselorResult<Option<CombatantProfile>> {
        let profile = sqlx::query_as::<_, CombatantProfile>(
            "SELECT * FROM combatant_profile WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(profile)
    }

    /// Write the profile and mirror codename, intensity and completion onto
    /// `users` in one transaction.
    pub async fn save_profile(&self, profile: &CombatantProfile) -> CounselorResult<()> {
        let intensity = profile
            .commitment_level
            .as_deref()
            .and_then(IntensityMode::from_str)
            .map(|mode| mode.as_str());

        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO combatant_profile (
                user_id, codename, age, physical_condition, occupation, living_situation,
                relationship_status, primary_mission, greatest_enemy, past_defeats,
                daily_routine, core_values, commitment_level, disc_type, profile_complete,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                codename = excluded.codename,
                age = excluded.age,
                physical_condition = excluded.physical_condition,
                occupation = excluded.occupation,
                living_situation = excluded.living_situation,
                relationship_status = excluded.relationship_status,
                primary_mission = excluded.primary_mission,
                greatest_enemy = excluded.greatest_enemy,
                past_defeats = excluded.past_defeats,
                daily_routine = excluded.daily_routine,
                core_values = excluded.core_values,
                commitment_level = excluded.commitment_level,
                disc_type = excluded.disc_type,
                profile_complete = excluded.profile_complete,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.codename)
        .bind(profile.age)
        .bind(&profile.physical_condition)
        .bind(&profile.occupation)
        .bind(&profile.living_situation)
        .bind(&profile.relationship_status)
        .bind(&profile.primary_mission)
        .bind(&profile.greatest_enemy)
        .bind(&profile.past_defeats)
        .bind(&profile.daily_routine)
        .bind(&profile.core_values)
        .bind(&profile.commitment_level)
        .bind(&profile.disc_type)
        .bind(profile.profile_complete)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET codename = ?,
                onboarding_complete = ?,
                intensity_mode = COALESCE(?, intensity_mode),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&profile.codename)
        .bind(profile.profile_complete)
        .bind(intensity)
        .bind(profile.updated_at)
        .bind(&profile.user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the profile write.
            return Err(CounselorError::NotFound(format!("User {}", profile.user_id)));
        }

        tx.commit().await?;
        debug!(
            "Saved profile for {} (complete: {})",
            profile.user_id, profile.profile_complete
        );
        Ok(())
    }

    /// Store one exchange: the user's message and the counselor's reply.
    pub async fn append_chat_turn(
        &self,
        user_id: &str,
        message: &str,
        reply: &str,
        at: DateTime<Utc>,
    ) -> CounselorResult<()> {
        let mut tx = self.pool().begin().await?;
        for (role, content) in [("user", message), ("assistant", reply)] {
            sqlx::query("INSERT INTO chats (user_id, role, content, created_at) VALUES (?, ?, ?, ?)")
                .bind(user_id)
                .bind(role)
                .bind(content)
                .bind(at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Most recent `limit` messages, oldest first.
    pub async fn recent_chats(&self, user_id: &str, limit: i64) -> CounselorResult<Vec<ChatRecord>> {
        let mut rows = sqlx::query_as::<_, ChatRecord>(
            "SELECT * FROM chats WHERE user_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.reverse();
        Ok(rows)
    }
}
