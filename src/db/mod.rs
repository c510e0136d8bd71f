use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

mod helpers;
mod migrations;
pub mod repositories;

use migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// Where the worker thread opens its connection.
enum Location {
    File(PathBuf),
    Memory,
}

/// Handle to the SQLite worker thread. Every task runs on that one thread, in
/// submission order, so writes never interleave.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Option<Arc<PathBuf>>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let inner = Self::spawn_worker(Location::File(db_path.clone()))?;
        info!("Database initialized at {}", db_path.display());

        Ok(Self {
            inner,
            db_path: Some(Arc::new(db_path)),
        })
    }

    /// Private database that disappears with the last handle.
    pub fn in_memory() -> Result<Self> {
        let inner = Self::spawn_worker(Location::Memory)?;
        Ok(Self {
            inner,
            db_path: None,
        })
    }

    fn spawn_worker(location: Location) -> Result<Arc<DatabaseInner>> {
        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("fishpad-db".into())
            .spawn(move || {
                let opened = match &location {
                    Location::File(path) => Connection::open(path),
                    Location::Memory => Connection::open_in_memory(),
                };
                let mut conn = match opened {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if matches!(location, Location::File(_)) {
                    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                        error!("Failed to enable WAL mode: {err}");
                    }
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        Ok(Arc::new(DatabaseInner {
            sender: command_tx,
            worker: Mutex::new(Some(worker)),
        }))
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref().map(PathBuf::as_path)
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_database_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("fishpad.sqlite3");
        let db = Database::new(path.clone()).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn tasks_run_in_submission_order() {
        let db = Database::in_memory().unwrap();
        db.execute(|conn| {
            conn.execute_batch("CREATE TABLE log (n INTEGER)")?;
            Ok(())
        })
        .await
        .unwrap();

        let mut pending = Vec::new();
        for n in 0..20 {
            let db = db.clone();
            pending.push(tokio::spawn(async move {
                db.execute(move |conn| {
                    conn.execute("INSERT INTO log (n) VALUES (?1)", [n])?;
                    Ok(())
                })
                .await
            }));
        }
        for handle in pending {
            handle.await.unwrap().unwrap();
        }

        let count: i64 = db
            .execute(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM log", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 20);
    }

    #[tokio::test]
    async fn task_errors_propagate_to_caller() {
        let db = Database::in_memory().unwrap();
        let err = db
            .execute(|conn| {
                conn.execute_batch("SELECT * FROM no_such_table")?;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no_such_table"));
    }
}
