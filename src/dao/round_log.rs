use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};

use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::dao::{
    models::RoundRecord,
    storage::{StorageError, StorageResult},
};

/// Sink for completed rounds.
pub trait RoundLogger: Send {
    /// Append one record. Implementations never overwrite earlier records.
    fn log_round(&self, record: &RoundRecord) -> StorageResult<()>;
}

/// Appends rounds as newline-delimited JSON.
#[derive(Debug, Clone)]
pub struct JsonlRoundLogger {
    path: PathBuf,
}

#[derive(Serialize)]
struct TimestampedRound<'a> {
    #[serde(flatten)]
    record: &'a RoundRecord,
    timestamp: String,
}

impl JsonlRoundLogger {
    /// Create a logger writing to `path`, creating missing parent folders lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RoundLogger for JsonlRoundLogger {
    fn log_round(&self, record: &RoundRecord) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| StorageError::io(parent, "creating log folder", err))?;
        }

        let mut line = serde_json::to_string(&TimestampedRound {
            record,
            timestamp: format_system_time(SystemTime::now()),
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| StorageError::io(&self.path, "opening round log", err))?;
        file.write_all(line.as_bytes())
            .map_err(|err| StorageError::io(&self.path, "appending round", err))
    }
}

/// Hands records to a blocking writer task so the game loop never waits on the disk.
#[derive(Debug, Clone)]
pub struct BackgroundRoundLogger {
    sender: mpsc::UnboundedSender<RoundRecord>,
}

impl BackgroundRoundLogger {
    /// Move `inner` onto the blocking pool. Must be called inside a tokio runtime.
    ///
    /// The writer drains every queued record and stops once all senders are dropped;
    /// await the returned handle to make sure the log is flushed.
    pub fn spawn<L>(inner: L) -> (Self, JoinHandle<()>)
    where
        L: RoundLogger + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<RoundRecord>();
        let writer = tokio::task::spawn_blocking(move || {
            while let Some(record) = receiver.blocking_recv() {
                if let Err(err) = inner.log_round(&record) {
                    warn!(error = %err, round = record.round_index, "failed to log round");
                }
            }
            debug!("round log writer stopped");
        });
        (Self { sender }, writer)
    }
}

impl RoundLogger for BackgroundRoundLogger {
    fn log_round(&self, record: &RoundRecord) -> StorageResult<()> {
        self.sender
            .send(record.clone())
            .map_err(|_| StorageError::WriterClosed)
    }
}

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{dao::models::PlayerRoundRecord, state::game::Category};

    fn record(round_index: u32) -> RoundRecord {
        RoundRecord {
            match_id: Uuid::nil(),
            round_index,
            track_path: "songs/ai/one.mp3".into(),
            category: Category::Silicon.log_label(),
            correct_answer: Category::Silicon,
            players: vec![PlayerRoundRecord {
                name: "Player 1".into(),
                vote: Some(Category::Silicon),
                reaction_time: Some(2.0),
                correct: true,
                points_delta: 2,
                score_after: 2,
            }],
        }
    }

    #[test]
    fn appends_one_line_per_round() {
        let dir = tempfile::tempdir().unwrap();
        let logger = JsonlRoundLogger::new(dir.path().join("logs/game_log.jsonl"));

        logger.log_round(&record(1)).unwrap();
        logger.log_round(&record(2)).unwrap();

        let contents = fs::read_to_string(logger.path()).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["round_index"], 1);
        assert_eq!(lines[1]["round_index"], 2);
        assert_eq!(lines[0]["category"], "ai");
        assert_eq!(lines[0]["correct_answer"], "Silicon");
        assert_eq!(lines[0]["players"][0]["reaction_time"], 2.0);
        assert!(lines[0]["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn background_writer_appends_in_order_and_flushes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let target = JsonlRoundLogger::new(dir.path().join("logs/game_log.jsonl"));
        let path = target.path().to_path_buf();
        let (logger, writer) = BackgroundRoundLogger::spawn(target);

        for round_index in 1..=3 {
            logger.log_round(&record(round_index)).unwrap();
        }
        drop(logger);
        writer.await.unwrap();

        let rounds: Vec<u64> = fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["round_index"].as_u64().unwrap()
            })
            .collect();
        assert_eq!(rounds, [1, 2, 3]);
    }

    #[tokio::test]
    async fn background_write_failures_are_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, writer) = BackgroundRoundLogger::spawn(JsonlRoundLogger::new(dir.path()));

        assert!(logger.log_round(&record(1)).is_ok());
        drop(logger);
        writer.await.unwrap();
    }

    #[test]
    fn unwritable_target_reports_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let logger = JsonlRoundLogger::new(dir.path());
        assert!(logger.log_round(&record(1)).is_err());
    }
}
