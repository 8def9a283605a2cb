use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_flag, parse_optional_datetime, to_i64, to_u64},
    models::{SubmissionCounts, SubmissionRecord},
};

const SUBMISSION_COLUMNS: &str = "id, data, synced, created_at, synced_at";

fn row_to_submission(row: &Row) -> Result<SubmissionRecord> {
    let id: i64 = row.get("id")?;
    let synced: i64 = row.get("synced")?;
    let created_at: String = row.get("created_at")?;
    let synced_at: Option<String> = row.get("synced_at")?;

    Ok(SubmissionRecord {
        id: to_u64(id, "id")?,
        payload: row.get("data")?,
        synced: parse_flag(synced, "synced")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        synced_at: parse_optional_datetime(synced_at, "synced_at")?,
    })
}

impl Database {
    /// Appends an unsynced record and returns its id.
    pub async fn enqueue(&self, payload: &str) -> Result<u64> {
        let payload = payload.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO submissions (data, synced, created_at) VALUES (?1, 0, ?2)",
                params![payload, Utc::now().to_rfc3339()],
            )
            .context("failed to insert submission")?;
            to_u64(conn.last_insert_rowid(), "id")
        })
        .await
    }

    /// All records still waiting for delivery, oldest first.
    pub async fn list_unsynced(&self) -> Result<Vec<SubmissionRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUBMISSION_COLUMNS}
                 FROM submissions
                 WHERE synced = 0
                 ORDER BY id ASC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_submission(row)?);
            }

            Ok(records)
        })
        .await
    }

    /// Every stored record, delivered or not, oldest first.
    pub async fn list_submissions(&self) -> Result<Vec<SubmissionRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUBMISSION_COLUMNS}
                 FROM submissions
                 ORDER BY id ASC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_submission(row)?);
            }

            Ok(records)
        })
        .await
    }

    /// Flags one record as delivered. Calling it again for the same id leaves the
    /// row untouched, including its `synced_at`.
    pub async fn mark_synced(&self, id: u64) -> Result<()> {
        self.execute(move |conn| {
            let sql_id = to_i64(id)?;
            let updated = conn
                .execute(
                    "UPDATE submissions
                     SET synced = 1,
                         synced_at = ?1
                     WHERE id = ?2 AND synced = 0",
                    params![Utc::now().to_rfc3339(), sql_id],
                )
                .with_context(|| format!("failed to mark submission {id} synced"))?;

            if updated == 0 {
                let exists: Option<i64> = conn
                    .query_row(
                        "SELECT id FROM submissions WHERE id = ?1",
                        params![sql_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if exists.is_none() {
                    bail!("no submission with id {id}");
                }
            }

            Ok(())
        })
        .await
    }

    pub async fn get_submission(&self, id: u64) -> Result<Option<SubmissionRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"
            ))?;

            let mut rows = stmt.query(params![to_i64(id)?])?;
            match rows.next()? {
                Some(row) => row_to_submission(row).map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn submission_counts(&self) -> Result<SubmissionCounts> {
        self.execute(|conn| {
            let (synced, unsynced): (i64, i64) = conn.query_row(
                "SELECT
                    COALESCE(SUM(CASE WHEN synced = 1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN synced = 0 THEN 1 ELSE 0 END), 0)
                 FROM submissions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            Ok(SubmissionCounts {
                synced: to_u64(synced, "synced count")?,
                unsynced: to_u64(unsynced, "unsynced count")?,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("survey.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn enqueue_assigns_increasing_ids() {
        let (_dir, db) = open_temp();
        let first = db.enqueue("{\"n\":1}").await.unwrap();
        let second = db.enqueue("{\"n\":2}").await.unwrap();
        assert!(second > first);

        let unsynced = db.list_unsynced().await.unwrap();
        let ids: Vec<u64> = unsynced.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(unsynced.iter().all(|r| !r.synced && r.synced_at.is_none()));
    }

    #[tokio::test]
    async fn mark_synced_twice_matches_once() {
        let (_dir, db) = open_temp();
        let id = db.enqueue("{}").await.unwrap();

        db.mark_synced(id).await.unwrap();
        let once = db.get_submission(id).await.unwrap().unwrap();
        db.mark_synced(id).await.unwrap();
        let twice = db.get_submission(id).await.unwrap().unwrap();

        assert!(once.synced);
        assert_eq!(once, twice);
        assert!(db.list_unsynced().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_submissions_includes_delivered_rows() {
        let (_dir, db) = open_temp();
        let first = db.enqueue("{\"n\":1}").await.unwrap();
        let second = db.enqueue("{\"n\":2}").await.unwrap();
        db.mark_synced(first).await.unwrap();

        let all = db.list_submissions().await.unwrap();
        let ids: Vec<(u64, bool)> = all.iter().map(|r| (r.id, r.synced)).collect();
        assert_eq!(ids, vec![(first, true), (second, false)]);
    }

    #[tokio::test]
    async fn mark_synced_unknown_id_is_an_error() {
        let (_dir, db) = open_temp();
        assert!(db.mark_synced(42).await.is_err());
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let (_dir, db) = open_temp();
        let first = db.enqueue("{}").await.unwrap();
        db.execute(move |conn| {
            conn.execute("DELETE FROM submissions WHERE id = ?1", params![first as i64])?;
            Ok(())
        })
        .await
        .unwrap();

        let second = db.enqueue("{}").await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn counts_track_both_states() {
        let (_dir, db) = open_temp();
        assert_eq!(db.submission_counts().await.unwrap(), SubmissionCounts::default());

        let a = db.enqueue("{}").await.unwrap();
        db.enqueue("{}").await.unwrap();
        db.enqueue("{}").await.unwrap();
        db.mark_synced(a).await.unwrap();

        let counts = db.submission_counts().await.unwrap();
        assert_eq!(counts.synced, 1);
        assert_eq!(counts.unsynced, 2);
    }
}
