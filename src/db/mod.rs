use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

mod helpers;
mod migrations;
pub mod models;
pub mod repositories;

use migrations::run_migrations;

pub use models::{TripKind, TripRecord};

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Owns the history connection on its own thread. The thread exits once the
/// job sender is dropped and the queue has drained.
struct HistoryWorker {
    jobs: Mutex<Option<mpsc::Sender<Job>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl HistoryWorker {
    fn spawn(db_path: PathBuf) -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let thread = thread::Builder::new()
            .name("taximeter-history".into())
            .spawn(move || {
                let mut conn = match open_connection(&db_path) {
                    Ok(conn) => {
                        let _ = ready_tx.send(Ok(()));
                        conn
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                for job in job_rx {
                    job(&mut conn);
                }
                info!("History worker for {} stopped", db_path.display());
            })
            .context("failed to spawn history worker thread")?;

        ready_rx
            .recv()
            .context("history worker exited before opening the database")??;

        Ok(Self {
            jobs: Mutex::new(Some(job_tx)),
            thread: Mutex::new(Some(thread)),
        })
    }

    fn submit(&self, job: Job) -> Result<()> {
        let jobs = self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let sender = jobs
            .as_ref()
            .ok_or_else(|| anyhow!("history worker already closed"))?;
        sender
            .send(job)
            .map_err(|_| anyhow!("history worker is no longer running"))
    }
}

impl Drop for HistoryWorker {
    fn drop(&mut self) {
        let sender = self
            .jobs
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(sender);

        let thread = self
            .thread
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(thread) = thread {
            if let Err(panic) = thread.join() {
                error!("History worker panicked: {panic:?}");
            }
        }
    }
}

fn open_connection(db_path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("failed to open history database {}", db_path.display()))?;

    // Readers of the history file should not block the meter while it writes.
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("WAL journal unavailable for {}: {err}", db_path.display());
    }

    run_migrations(&mut conn).context("failed to migrate history database")?;
    info!("History database opened at {}", db_path.display());
    Ok(conn)
}

/// Trip history backed by SQLite. All statements run on one worker thread;
/// clones share it.
#[derive(Clone)]
pub struct Database {
    worker: Arc<HistoryWorker>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        Ok(Self {
            worker: Arc::new(HistoryWorker::spawn(db_path)?),
        })
    }

    /// Runs `task` on the worker thread and waits for its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.worker.submit(Box::new(move |conn| {
            if reply_tx.send(task(conn)).is_err() {
                warn!("history caller went away before its result arrived");
            }
        }))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("history worker dropped the request"))?
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use uuid::Uuid;

    use super::Database;

    /// Fresh database file under the system temp dir.
    pub fn temp_database() -> (Database, PathBuf) {
        let dir = std::env::temp_dir().join(format!("taximeter-test-{}", Uuid::new_v4()));
        let db = Database::new(dir.join("history.sqlite3")).unwrap();
        (db, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::temp_database;
    use super::*;

    #[tokio::test]
    async fn execute_runs_on_the_worker_and_returns() {
        let (db, dir) = temp_database();

        let (answer, worker) = db
            .execute(|conn| {
                let answer: i64 = conn.query_row("SELECT 40 + 2", [], |row| row.get(0))?;
                Ok((answer, thread::current().name().map(str::to_string)))
            })
            .await
            .unwrap();

        assert_eq!(answer, 42);
        assert_eq!(worker.as_deref(), Some("taximeter-history"));

        drop(db);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn task_errors_reach_the_caller() {
        let (db, dir) = temp_database();

        let result: Result<()> = db
            .execute(|conn| {
                conn.execute("INSERT INTO no_such_table VALUES (1)", [])?;
                Ok(())
            })
            .await;

        assert!(result.is_err());
        // the worker survives a failed task
        assert_eq!(db.count_trip_records().await.unwrap(), 0);

        drop(db);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn unopenable_path_fails_at_construction() {
        let dir = std::env::temp_dir().join(format!("taximeter-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        // a directory is not a database file
        assert!(Database::new(dir.clone()).is_err());

        let _ = std::fs::remove_dir_all(dir);
    }
}
