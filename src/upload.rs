use crate::config::UploadConfig;
use crate::documents::DocumentList;
use crate::error::{ClientError, Operation};
use crate::gateway::{Gateway, TaskStatus};
use log::{error, info};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

/// Extensions offered in the file picker. Only a convenience filter; the
/// backend validates again.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "md", "doc", "pptx", "xlsx"];

#[derive(Debug, Clone, PartialEq)]
pub enum UploadPhase {
    Idle,
    Submitting {
        filename: String,
    },
    Polling {
        task_id: String,
        attempt: u32,
        progress: Option<f64>,
        /// Processed and total chunks, when the backend reports them.
        chunks: Option<(u64, u64)>,
    },
    Done {
        task_id: String,
    },
    Failed {
        reason: String,
    },
}

impl UploadPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, UploadPhase::Submitting { .. } | UploadPhase::Polling { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub task_id: String,
    pub filename: String,
    /// Status checks made before the backend reported completion.
    pub polls: u32,
}

/// Drives one upload at a time from submission to a terminal status.
pub struct UploadController {
    gateway: Gateway,
    poll_interval: Duration,
    max_poll_attempts: u32,
    max_file_bytes: u64,
    phase: watch::Sender<UploadPhase>,
    active: Mutex<Option<ActiveRun>>,
    generation: AtomicU64,
}

/// The upload that currently owns the phase. Older runs may still be
/// unwinding, but only this generation writes the phase or clears the slot.
struct ActiveRun {
    generation: u64,
    cancel: watch::Sender<bool>,
}

impl UploadController {
    pub fn new(gateway: Gateway, config: &UploadConfig) -> Self {
        let (phase, _) = watch::channel(UploadPhase::Idle);
        Self {
            gateway,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_poll_attempts: config.max_poll_attempts,
            max_file_bytes: config.max_file_bytes,
            phase,
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.phase.borrow().is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadPhase> {
        self.phase.subscribe()
    }

    /// Stops the upload in flight, if any. It ends with `ClientError::Cancelled`.
    pub fn cancel(&self) {
        if let Some(run) = self.active_slot().as_ref() {
            run.cancel.send_replace(true);
        }
    }

    fn active_slot(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publishes `phase` only while `generation` still owns the controller.
    fn set_phase(&self, generation: u64, phase: UploadPhase) {
        let slot = self.active_slot();
        if slot.as_ref().is_some_and(|run| run.generation == generation) {
            self.phase.send_replace(phase);
        }
    }

    /// Publishes the terminal phase and releases the controller, unless a
    /// newer upload has taken it over in the meantime.
    fn finish(&self, generation: u64, phase: UploadPhase) {
        let mut slot = self.active_slot();
        if slot.as_ref().is_some_and(|run| run.generation == generation) {
            self.phase.send_replace(phase);
            *slot = None;
        }
    }

    /// Uploads `path`, polls until the backend finishes processing it, and
    /// refreshes `documents` once on success.
    ///
    /// Dropping the returned future stops polling; no timer outlives it.
    /// Starting a second upload on the same controller cancels the first.
    pub async fn upload(
        &self,
        path: &Path,
        documents: &mut DocumentList,
    ) -> Result<UploadOutcome, ClientError> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let previous = self.active_slot().replace(ActiveRun {
            generation,
            cancel: cancel_tx,
        });
        if let Some(previous) = previous {
            info!("Upload superseded by a newer one");
            previous.cancel.send_replace(true);
        }
        let _guard = RunGuard {
            controller: self,
            generation,
        };

        let result = match self.admit(path).await {
            Ok((filename, bytes)) => {
                self.run(generation, filename, bytes, documents, &mut cancel_rx)
                    .await
            }
            Err(e) => Err(e),
        };

        let terminal = match &result {
            Ok(outcome) => UploadPhase::Done {
                task_id: outcome.task_id.clone(),
            },
            Err(e) => UploadPhase::Failed {
                reason: e.to_string(),
            },
        };
        self.finish(generation, terminal);
        result
    }

    async fn admit(&self, path: &Path) -> Result<(String, Vec<u8>), ClientError> {
        if !is_accepted(path) {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            return Err(ClientError::UnsupportedFile(ext));
        }

        let size = tokio::fs::metadata(path).await?.len();
        if size > self.max_file_bytes {
            return Err(ClientError::FileTooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok((filename, bytes))
    }

    async fn run(
        &self,
        generation: u64,
        filename: String,
        bytes: Vec<u8>,
        documents: &mut DocumentList,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<UploadOutcome, ClientError> {
        self.set_phase(
            generation,
            UploadPhase::Submitting {
                filename: filename.clone(),
            },
        );
        info!("Uploading {} ({} bytes)", filename, bytes.len());

        let submitted = until_cancelled(cancel, self.gateway.upload(&filename, bytes))
            .await?
            .map_err(|e| {
                error!("Upload of {} failed: {}", filename, e);
                ClientError::Fetch {
                    operation: Operation::Upload,
                    source: e,
                }
            })?;
        let task_id = submitted.task_id;
        info!("{} accepted as task {}", filename, task_id);

        for attempt in 1..=self.max_poll_attempts {
            self.set_phase(
                generation,
                UploadPhase::Polling {
                    task_id: task_id.clone(),
                    attempt,
                    progress: None,
                    chunks: None,
                },
            );

            let status = until_cancelled(cancel, self.gateway.status(&task_id))
                .await?
                .map_err(|e| {
                    error!("Status check for {} failed: {}", task_id, e);
                    ClientError::Fetch {
                        operation: Operation::UploadStatus,
                        source: e,
                    }
                })?;

            match status.status {
                TaskStatus::Processing => {
                    let chunks = status.processed_chunks.zip(status.total_chunks);
                    if status.progress.is_some() || chunks.is_some() {
                        match chunks {
                            Some((done, total)) => info!(
                                "Task {} at {:.0}% ({}/{} chunks)",
                                task_id,
                                status.progress.unwrap_or_default(),
                                done,
                                total
                            ),
                            None => info!(
                                "Task {} at {:.0}%",
                                task_id,
                                status.progress.unwrap_or_default()
                            ),
                        }
                        self.set_phase(
                            generation,
                            UploadPhase::Polling {
                                task_id: task_id.clone(),
                                attempt,
                                progress: status.progress,
                                chunks,
                            },
                        );
                    }
                    if attempt < self.max_poll_attempts {
                        until_cancelled(cancel, tokio::time::sleep(self.poll_interval)).await?;
                    }
                }
                TaskStatus::Completed => {
                    info!("Task {} completed after {} status checks", task_id, attempt);
                    documents.refresh(&self.gateway).await?;
                    return Ok(UploadOutcome {
                        task_id,
                        filename,
                        polls: attempt,
                    });
                }
                TaskStatus::Failed | TaskStatus::Other => {
                    let reason = status
                        .error
                        .unwrap_or_else(|| "backend reported a non-success status".to_string());
                    error!("Task {} failed: {}", task_id, reason);
                    return Err(ClientError::Processing { task_id, reason });
                }
            }
        }

        Err(ClientError::Timeout {
            task_id,
            attempts: self.max_poll_attempts,
        })
    }
}

pub fn is_accepted(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Races `fut` against the cancel flag. A dropped sender also counts as
/// cancelled.
async fn until_cancelled<F: Future>(
    cancel: &mut watch::Receiver<bool>,
    fut: F,
) -> Result<F::Output, ClientError> {
    tokio::select! {
        biased;
        _ = cancel.wait_for(|cancelled| *cancelled) => Err(ClientError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Leaves the phase terminal if the upload future is dropped mid-flight.
/// A run that no longer owns the controller leaves everything alone.
struct RunGuard<'a> {
    controller: &'a UploadController,
    generation: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.controller.active_slot();
        if !slot
            .as_ref()
            .is_some_and(|run| run.generation == self.generation)
        {
            return;
        }
        self.controller.phase.send_if_modified(|phase| {
            if phase.is_loading() {
                *phase = UploadPhase::Failed {
                    reason: ClientError::Cancelled.to_string(),
                };
                true
            } else {
                false
            }
        });
        *slot = None;
    }
}
