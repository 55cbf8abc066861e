//! SQLite-backed store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nms_common::db::{NewRundown, NewStory, RundownRecord, StoryRecord, StoryStatus};
use nms_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::RundownStore;

const RUNDOWN_COLUMNS: &str = "id, client_id, external_id, slug, meta, received_at";
const STORY_COLUMNS: &str =
    "id, rundown_id, client_id, external_id, title, status, position, created_at";

/// Store over the `rundowns` and `stories` tables
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn rundown_from_row(row: &SqliteRow) -> Result<RundownRecord> {
    Ok(RundownRecord {
        id: row.try_get("id")?,
        external_id: row.try_get("external_id")?,
        slug: row.try_get("slug")?,
        meta: row.try_get("meta")?,
        client_id: row.try_get("client_id")?,
        received_at: row.try_get::<DateTime<Utc>, _>("received_at")?,
    })
}

fn story_from_row(row: &SqliteRow) -> Result<StoryRecord> {
    let status: Option<String> = row.try_get("status")?;
    Ok(StoryRecord {
        id: row.try_get("id")?,
        external_id: row.try_get("external_id")?,
        title: row.try_get("title")?,
        status: status.as_deref().and_then(StoryStatus::parse),
        position: row.try_get("position")?,
        rundown_id: row.try_get("rundown_id")?,
        client_id: row.try_get("client_id")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl RundownStore for SqliteStore {
    async fn find_rundown(
        &self,
        client_id: i64,
        external_id: &str,
    ) -> Result<Option<RundownRecord>> {
        let sql = format!(
            "SELECT {} FROM rundowns WHERE client_id = ? AND external_id = ?",
            RUNDOWN_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(client_id)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(rundown_from_row).transpose()
    }

    async fn create_rundown_if_absent(&self, new: NewRundown) -> Result<(RundownRecord, bool)> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO rundowns (client_id, external_id, slug, meta, received_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (client_id, external_id) DO NOTHING
            "#,
        )
        .bind(new.client_id)
        .bind(&new.external_id)
        .bind(&new.slug)
        .bind(&new.meta)
        .bind(new.received_at)
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        let record = self
            .find_rundown(new.client_id, &new.external_id)
            .await?
            .ok_or_else(|| {
                Error::Internal(format!("rundown {} vanished after insert", new.external_id))
            })?;

        debug!(
            roID = %record.external_id,
            rundown_id = record.id,
            created = inserted,
            "Resolved rundown"
        );
        Ok((record, inserted))
    }

    async fn save_rundown(&self, rundown: &RundownRecord) -> Result<()> {
        let updated = sqlx::query("UPDATE rundowns SET slug = ?, meta = ? WHERE id = ?")
            .bind(&rundown.slug)
            .bind(&rundown.meta)
            .bind(rundown.id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(Error::RundownNotFound(rundown.id));
        }
        Ok(())
    }

    async fn delete_rundown(&self, rundown_id: i64) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        let stories = sqlx::query("DELETE FROM stories WHERE rundown_id = ?")
            .bind(rundown_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let rundowns = sqlx::query("DELETE FROM rundowns WHERE id = ?")
            .bind(rundown_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rundowns == 0 {
            tx.rollback().await?;
            return Err(Error::RundownNotFound(rundown_id));
        }

        tx.commit().await?;
        Ok(stories as usize)
    }

    async fn find_story(&self, rundown_id: i64, external_id: &str) -> Result<Option<StoryRecord>> {
        let sql = format!(
            "SELECT {} FROM stories WHERE rundown_id = ? AND external_id = ?",
            STORY_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(rundown_id)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(story_from_row).transpose()
    }

    async fn list_stories(&self, rundown_id: i64) -> Result<Vec<StoryRecord>> {
        let sql = format!(
            "SELECT {} FROM stories WHERE rundown_id = ? ORDER BY position, id",
            STORY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(rundown_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(story_from_row).collect()
    }

    async fn create_story_if_absent(&self, new: NewStory) -> Result<(StoryRecord, bool)> {
        // Next position is computed in the same statement as the insert
        let inserted = sqlx::query(
            r#"
            INSERT INTO stories (rundown_id, client_id, external_id, title, status, position, created_at)
            SELECT ?, ?, ?, ?, NULL, COALESCE(MAX(position) + 1, 0), ?
            FROM stories WHERE rundown_id = ?
            ON CONFLICT (rundown_id, external_id) DO NOTHING
            "#,
        )
        .bind(new.rundown_id)
        .bind(new.client_id)
        .bind(&new.external_id)
        .bind(&new.title)
        .bind(new.created_at)
        .bind(new.rundown_id)
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        let record = self
            .find_story(new.rundown_id, &new.external_id)
            .await?
            .ok_or_else(|| {
                Error::Internal(format!("story {} vanished after insert", new.external_id))
            })?;

        Ok((record, inserted))
    }

    async fn save_story(&self, story: &StoryRecord) -> Result<()> {
        let updated = sqlx::query("UPDATE stories SET title = ?, status = ? WHERE id = ?")
            .bind(&story.title)
            .bind(story.status.map(|status| status.as_str()))
            .bind(story.id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(Error::StoryNotFound(story.id));
        }
        Ok(())
    }

    async fn delete_story(&self, story_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let placement: Option<(i64, i64)> =
            sqlx::query_as("SELECT rundown_id, position FROM stories WHERE id = ?")
                .bind(story_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((rundown_id, position)) = placement else {
            tx.rollback().await?;
            return Err(Error::StoryNotFound(story_id));
        };

        sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(story_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE stories SET position = position - 1 WHERE rundown_id = ? AND position > ?",
        )
        .bind(rundown_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn save_story_order(&self, rundown_id: i64, ordered_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (position, story_id) in ordered_ids.iter().enumerate() {
            let updated =
                sqlx::query("UPDATE stories SET position = ? WHERE id = ? AND rundown_id = ?")
                    .bind(position as i64)
                    .bind(story_id)
                    .bind(rundown_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

            if updated == 0 {
                tx.rollback().await?;
                return Err(Error::ForeignStory {
                    story_id: *story_id,
                    rundown_id,
                });
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
