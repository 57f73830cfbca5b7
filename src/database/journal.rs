//! Per-user collections: war logs, rituals, fragments, nudges, missions,
//! goals, decisions and check-ins.

use chrono::Utc;
use tracing::info;

use super::models::*;
use super::Database;
use crate::error::{CounselorError, CounselorResult};

impl Database {
    pub async fn create_war_log(
        &self,
        user_id: &str,
        title: &str,
        dilemma: &str,
        counsel: Option<&str>,
        outcome: Option<&str>,
    ) -> CounselorResult<WarLog> {
        let result = sqlx::query(
            r#"
            INSERT INTO war_logs (user_id, title, dilemma, counsel, outcome, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(dilemma)
        .bind(counsel)
        .bind(outcome)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        info!("Created war log {} for {}", id, user_id);

        let log = sqlx::query_as::<_, WarLog>("SELECT * FROM war_logs WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(log)
    }

    pub async fn list_war_logs(&self, user_id: &str, limit: i64) -> CounselorResult<Vec<WarLog>> {
        let logs = sqlx::query_as::<_, WarLog>(
            "SELECT * FROM war_logs WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(logs)
    }

    pub async fn create_ritual(
        &self,
        user_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> CounselorResult<Ritual> {
        let result = sqlx::query(
            r#"
            INSERT INTO rituals (user_id, name, description, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, name) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CounselorError::ValidationError(format!(
                "Ritual '{}' already exists",
                name
            )));
        }

        self.get_ritual(user_id, name)
            .await?
            .ok_or_else(|| CounselorError::NotFound(format!("Ritual '{}'", name)))
    }

    pub async fn get_ritual(&self, user_id: &str, name: &str) -> CounselorResult<Option<Ritual>> {
        let ritual =
            sqlx::query_as::<_, Ritual>("SELECT * FROM rituals WHERE user_id = ? AND name = ?")
                .bind(user_id)
                .bind(name)
                .fetch_optional(self.pool())
                .await?;
        Ok(ritual)
    }

    pub async fn list_rituals(&self, user_id: &str) -> CounselorResult<Vec<Ritual>> {
        let rituals =
            sqlx::query_as::<_, Ritual>("SELECT * FROM rituals WHERE user_id = ? ORDER BY name")
                .bind(user_id)
                .fetch_all(self.pool())
                .await?;
        Ok(rituals)
    }

    /// Bump the streak and stamp the completion time in one statement.
    pub async fn complete_ritual(&self, user_id: &str, name: &str) -> CounselorResult<Ritual> {
        let result = sqlx::query(
            r#"
            UPDATE rituals
            SET streak = streak + 1, last_completed_at = ?
            WHERE user_id = ? AND name = ?
            "#,
        )
        .bind(Utc::now())
        .bind(user_id)
        .bind(name)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CounselorError::NotFound(format!("Ritual '{}'", name)));
        }

        self.get_ritual(user_id, name)
            .await?
            .ok_or_else(|| CounselorError::NotFound(format!("Ritual '{}'", name)))
    }

    pub async fn create_fragment(
        &self,
        user_id: &str,
        fragment: &str,
        source: Option<&str>,
    ) -> CounselorResult<WarCodeFragment> {
        let result = sqlx::query(
            "INSERT INTO war_code_fragments (user_id, fragment, source, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(fragment)
        .bind(source)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        let fragment = sqlx::query_as::<_, WarCodeFragment>(
            "SELECT * FROM war_code_fragments WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_one(self.pool())
        .await?;
        Ok(fragment)
    }

    pub async fn list_fragments(&self, user_id: &str) -> CounselorResult<Vec<WarCodeFragment>> {
        let fragments = sqlx::query_as::<_, WarCodeFragment>(
            "SELECT * FROM war_code_fragments WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(fragments)
    }

    pub async fn create_nudge(
        &self,
        user_id: &str,
        habit: &str,
        missed_days: i64,
        message: &str,
    ) -> CounselorResult<HabitNudge> {
        let result = sqlx::query(
            r#"
            INSERT INTO habit_nudges (user_id, habit, missed_days, message, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(habit)
        .bind(missed_days)
        .bind(message)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        let nudge = sqlx::query_as::<_, HabitNudge>("SELECT * FROM habit_nudges WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(self.pool())
            .await?;
        Ok(nudge)
    }

    pub async fn create_mission(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
        due_date: Option<&str>,
    ) -> CounselorResult<Mission> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO missions (user_id, title, description, due_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(due_date)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_mission(user_id, result.last_insert_rowid()).await
    }

    pub async fn get_mission(&self, user_id: &str, id: i64) -> CounselorResult<Mission> {
        sqlx::query_as::<_, Mission>("SELECT * FROM missions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CounselorError::NotFound(format!("Mission {}", id)))
    }

    pub async fn list_missions(&self, user_id: &str) -> CounselorResult<Vec<Mission>> {
        let missions = sqlx::query_as::<_, Mission>(
            "SELECT * FROM missions WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(missions)
    }

    pub async fn update_mission_status(
        &self,
        user_id: &str,
        id: i64,
        status: MissionStatus,
    ) -> CounselorResult<Mission> {
        let result = sqlx::query(
            "UPDATE missions SET status = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CounselorError::NotFound(format!("Mission {}", id)));
        }
        self.get_mission(user_id, id).await
    }

    pub async fn delete_mission(&self, user_id: &str, id: i64) -> CounselorResult<()> {
        let result = sqlx::query("DELETE FROM missions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CounselorError::NotFound(format!("Mission {}", id)));
        }
        Ok(())
    }

    pub async fn create_goal(
        &self,
        user_id: &str,
        title: &str,
        target_date: Option<&str>,
    ) -> CounselorResult<Goal> {
        let result = sqlx::query(
            "INSERT INTO goals (user_id, title, target_date, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(title)
        .bind(target_date)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        let goal = sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(self.pool())
            .await?;
        Ok(goal)
    }

    pub async fn list_goals(&self, user_id: &str) -> CounselorResult<Vec<Goal>> {
        let goals =
            sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE user_id = ? ORDER BY id DESC")
                .bind(user_id)
                .fetch_all(self.pool())
                .await?;
        Ok(goals)
    }

    pub async fn create_decision(
        &self,
        user_id: &str,
        question: &str,
        choice: Option<&str>,
        rationale: Option<&str>,
    ) -> CounselorResult<Decision> {
        let result = sqlx::query(
            r#"
            INSERT INTO decisions (user_id, question, choice, rationale, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(question)
        .bind(choice)
        .bind(rationale)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        let decision = sqlx::query_as::<_, Decision>("SELECT * FROM decisions WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(self.pool())
            .await?;
        Ok(decision)
    }

    pub async fn list_decisions(&self, user_id: &str) -> CounselorResult<Vec<Decision>> {
        let decisions = sqlx::query_as::<_, Decision>(
            "SELECT * FROM decisions WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(decisions)
    }

    pub async fn create_check_in(
        &self,
        user_id: &str,
        mood: i64,
        energy: i64,
        note: Option<&str>,
    ) -> CounselorResult<CheckIn> {
        let result = sqlx::query(
            "INSERT INTO check_ins (user_id, mood, energy, note, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(mood)
        .bind(energy)
        .bind(note)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        let check_in = sqlx::query_as::<_, CheckIn>("SELECT * FROM check_ins WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(self.pool())
            .await?;
        Ok(check_in)
    }

    pub async fn list_check_ins(&self, user_id: &str) -> CounselorResult<Vec<CheckIn>> {
        let check_ins = sqlx::query_as::<_, CheckIn>(
            "SELECT * FROM check_ins WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(check_ins)
    }
}
