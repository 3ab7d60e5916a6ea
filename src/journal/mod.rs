use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info, Level};

/// One line in the audit trail.
struct JournalEntry {
    at: DateTime<Utc>,
    level: Level,
    message: String,
}

enum JournalCommand {
    Append(JournalEntry),
    Shutdown,
}

struct JournalInner {
    sender: mpsc::Sender<JournalCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for JournalInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(JournalCommand::Shutdown) {
                error!("Failed to send shutdown to journal thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join journal thread: {join_err:?}");
            }
        }
    }
}

fn write_entry(writer: &mut BufWriter<File>, entry: &JournalEntry) -> Result<()> {
    writeln!(
        writer,
        "{} {:<5} {}",
        entry.at.to_rfc3339(),
        entry.level,
        entry.message
    )?;
    // The trail must survive an abrupt exit, hence a flush per record.
    writer.flush()?;
    Ok(())
}

/// Append-only audit trail of tracking activity. Cloneable handle over a
/// dedicated writer thread; entries are timestamped lines, flushed as they
/// arrive, and the file is appended to across runs.
#[derive(Clone)]
pub struct Journal {
    inner: Arc<JournalInner>,
    journal_path: Arc<PathBuf>,
}

impl Journal {
    pub fn new(journal_path: PathBuf) -> Result<Self> {
        if let Some(parent) = journal_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create journal directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<JournalCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = journal_path.clone();

        let worker = thread::Builder::new()
            .name("worktrace-journal".into())
            .spawn(move || {
                let file = match OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path_for_thread)
                {
                    Ok(file) => file,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open journal file")));
                        return;
                    }
                };
                let mut writer = BufWriter::new(file);

                if ready_tx.send(Ok(())).is_err() {
                    error!("Journal receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        JournalCommand::Append(entry) => {
                            if let Err(err) = write_entry(&mut writer, &entry) {
                                error!("Failed to append journal entry: {err}");
                            }
                        }
                        JournalCommand::Shutdown => break,
                    }
                }

                info!("Journal thread shutting down");
            })
            .with_context(|| "failed to spawn journal worker thread")?;

        ready_rx
            .recv()
            .context("journal worker exited before signaling readiness")??;

        Ok(Self {
            inner: Arc::new(JournalInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            journal_path: Arc::new(journal_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.journal_path.as_path()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.append(Level::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.append(Level::Error, message.into());
    }

    fn append(&self, level: Level, message: String) {
        let command = JournalCommand::Append(JournalEntry {
            at: Utc::now(),
            level,
            message,
        });
        if let Err(err) = self
            .inner
            .sender
            .send(command)
            .map_err(|err| anyhow!("failed to send entry to journal thread: {err}"))
        {
            error!("{err}");
        }
    }
}
