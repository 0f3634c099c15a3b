use std::fs;
use std::path::PathBuf;

use rusqlite::{Connection, params};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database directory error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub image_url: String,
    pub disease_name: String,
    pub confidence: f64,
    pub timestamp: String,
    pub verified: bool,
    pub feedback: Option<String>,
}

/// Append-only prediction log backing statistics and future retraining.
/// Opens a connection per call; sqlite serializes concurrent writers.
#[derive(Clone)]
pub struct PredictionRepository {
    db_path: PathBuf,
}

impl PredictionRepository {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn connect(&self) -> Result<Connection, RepositoryError> {
        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                image_url TEXT NOT NULL,
                disease_name TEXT NOT NULL,
                confidence REAL NOT NULL,
                timestamp TEXT NOT NULL,
                verified BOOLEAN DEFAULT 0,
                feedback TEXT
            );
            CREATE TABLE IF NOT EXISTS retraining_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                model_version TEXT NOT NULL,
                accuracy REAL,
                timestamp TEXT NOT NULL,
                notes TEXT
            );",
        )?;
        Ok(conn)
    }

    pub fn save_prediction(
        &self,
        image_url: &str,
        disease_name: &str,
        confidence: f64,
        timestamp: &str,
    ) -> Result<(), RepositoryError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO predictions (image_url, disease_name, confidence, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![image_url, disease_name, confidence, timestamp],
        )?;
        Ok(())
    }

    pub fn recent_predictions(&self, limit: u32) -> Result<Vec<PredictionRecord>, RepositoryError> {
        let conn = self.connect()?;
        let mut statement = conn.prepare(
            "SELECT id, image_url, disease_name, confidence, timestamp, verified, feedback
             FROM predictions ORDER BY timestamp DESC LIMIT ?1",
        )?;
        let rows = statement.query_map(params![limit], |row| {
            Ok(PredictionRecord {
                id: row.get(0)?,
                image_url: row.get(1)?,
                disease_name: row.get(2)?,
                confidence: row.get(3)?,
                timestamp: row.get(4)?,
                verified: row.get(5)?,
                feedback: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn record_retraining(
        &self,
        model_version: &str,
        accuracy: Option<f64>,
        timestamp: &str,
        notes: &str,
    ) -> Result<(), RepositoryError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO retraining_history (model_version, accuracy, timestamp, notes)
             VALUES (?1, ?2, ?3, ?4)",
            params![model_version, accuracy, timestamp, notes],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_repository() -> PredictionRepository {
        let path = std::env::temp_dir().join(format!("predictions-{}.db", Uuid::new_v4()));
        PredictionRepository::new(path)
    }

    #[test]
    fn saved_predictions_come_back_most_recent_first() {
        let repo = temp_repository();
        repo.save_prediction("http://img/a.jpg", "leaf_blight", 81.2, "2026-01-01T10:00:00Z")
            .unwrap();
        repo.save_prediction("http://img/b.jpg", "rust", 64.0, "2026-01-02T10:00:00Z")
            .unwrap();

        let records = repo.recent_predictions(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].disease_name, "rust");
        assert_eq!(records[1].disease_name, "leaf_blight");
        assert!(!records[0].verified);
    }

    #[test]
    fn limit_caps_returned_rows() {
        let repo = temp_repository();
        for i in 0..5 {
            repo.save_prediction(
                "http://img/x.jpg",
                "leaf_spot",
                50.0,
                &format!("2026-01-0{}T00:00:00Z", i + 1),
            )
            .unwrap();
        }
        assert_eq!(repo.recent_predictions(3).unwrap().len(), 3);
    }
}
