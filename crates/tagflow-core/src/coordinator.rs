//! Host-side coordination: FIFO correlation of submissions with results and
//! drain-triggered publication into tag fields.
//!
//! Every submission appends a queue entry and sends one `Execute`; every
//! `Finished` pops the oldest entry. Because the worker is single-flight,
//! response order matches request order and the implicit FIFO correlation is
//! sound. When the queue drains, accumulated results are published into the
//! registered tag fields, each field at most once.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::LimitsConfig;
use crate::error::{InferenceError, Result, TagflowError, WorkerError};
use crate::types::{ClassificationRequest, ClassificationResult, TagField, UploadEvent};
use crate::worker::{WorkerHandle, WorkerRequest, WorkerResponse};

/// One outstanding submission awaiting its result.
struct QueueEntry {
    source: String,
}

/// Bridges the upload source to the single-flight worker and republishes
/// completed results into tag fields.
pub struct ClassificationCoordinator {
    worker: WorkerHandle,
    limits: LimitsConfig,
    queue: VecDeque<QueueEntry>,
    results: Vec<ClassificationResult>,
    fields: Vec<TagField>,
    /// Entries already resolved by a timeout whose `Finished` may still
    /// arrive from a slow worker. That many subsequent `Finished` messages
    /// must be discarded, or a late answer would bind to the wrong entry.
    stale_finished: usize,
}

impl ClassificationCoordinator {
    pub fn new(worker: WorkerHandle, limits: LimitsConfig) -> Self {
        Self {
            worker,
            limits,
            queue: VecDeque::new(),
            results: Vec::new(),
            fields: Vec::new(),
            stale_finished: 0,
        }
    }

    /// Register a tag entry target. Fields are filled positionally on drain.
    pub fn add_field(&mut self, field: TagField) {
        self.fields.push(field);
    }

    /// The registered tag fields, in registration order.
    pub fn fields(&self) -> &[TagField] {
        &self.fields
    }

    /// All completed results, in submission order.
    pub fn results(&self) -> &[ClassificationResult] {
        &self.results
    }

    /// Number of submissions still awaiting a result.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Wait for the worker's `Init`, then load the named model.
    ///
    /// Both waits are bounded by `limits.load_timeout_ms`. A reported load
    /// failure surfaces as `WorkerError::LoadFailed` instead of leaving the
    /// pipeline silently stuck.
    pub async fn start(&mut self, model_name: &str) -> Result<()> {
        let started = Instant::now();
        self.wait_for(
            |r| matches!(r, WorkerResponse::Init),
            "worker init",
            self.limits.load_timeout_ms,
        )
        .await?;

        self.worker
            .send(WorkerRequest::Load {
                model_name: model_name.to_string(),
            })
            .await?;

        let response = self
            .wait_for(
                |r| {
                    matches!(
                        r,
                        WorkerResponse::Ready | WorkerResponse::LoadFailed { .. }
                    )
                },
                "model load",
                self.limits.load_timeout_ms,
            )
            .await?;

        match response {
            WorkerResponse::Ready => {
                tracing::debug!("Worker ready after {:?}", started.elapsed());
                Ok(())
            }
            WorkerResponse::LoadFailed { reason } => Err(WorkerError::LoadFailed(reason).into()),
            _ => unreachable!("wait_for returned a non-matching response"),
        }
    }

    /// Submit one upload event.
    ///
    /// Events whose MIME type does not start with `image/` are ignored;
    /// returns whether the event was submitted. Images over the configured
    /// megapixel limit are rejected before any tensor work.
    pub async fn submit(&mut self, upload: UploadEvent) -> Result<bool> {
        if !upload.mime.starts_with("image/") {
            tracing::debug!(
                "Ignoring non-image upload {:?} ({})",
                upload.source,
                upload.mime
            );
            return Ok(false);
        }

        let request = ClassificationRequest::from_bytes(&upload.bytes)?;
        let pixels = request.width as u64 * request.height as u64;
        if pixels > self.limits.max_megapixels as u64 * 1_000_000 {
            return Err(InferenceError::ImageTooLarge {
                width: request.width,
                height: request.height,
                max_megapixels: self.limits.max_megapixels,
            }
            .into());
        }
        self.queue.push_back(QueueEntry {
            source: upload.source.clone(),
        });
        self.worker
            .send(WorkerRequest::Execute { request })
            .await?;

        tracing::debug!("Classification started for {:?}", upload.source);
        Ok(true)
    }

    /// Pump worker responses until every outstanding entry is resolved.
    ///
    /// Publication into tag fields happens when the queue drains.
    pub async fn drain(&mut self) -> Result<()> {
        while !self.queue.is_empty() {
            self.pump_one().await?;
        }
        Ok(())
    }

    /// Resolve the oldest queue entry with the next `Finished`.
    ///
    /// A wait that expires resolves the entry with an error result instead
    /// of hanging, so the queue always drains. The single-flight worker has
    /// no cancellation, so a timed-out classification may still complete
    /// later; that late `Finished` is discarded rather than matched against
    /// the next entry, keeping results bound to the images that produced
    /// them.
    async fn pump_one(&mut self) -> Result<()> {
        let started = Instant::now();
        loop {
            let response = self
                .wait_for(
                    |r| matches!(r, WorkerResponse::Finished { .. }),
                    "classification",
                    self.limits.execute_timeout_ms,
                )
                .await;

            match response {
                Ok(WorkerResponse::Finished { labels, error }) => {
                    if self.stale_finished > 0 {
                        self.stale_finished -= 1;
                        tracing::debug!("Discarding classification for a timed-out entry");
                        continue;
                    }
                    tracing::debug!("Got classifications after {:?}", started.elapsed());
                    return self.resolve(labels, error);
                }
                Ok(_) => unreachable!("wait_for returned a non-matching response"),
                Err(TagflowError::Worker(WorkerError::Timeout {
                    waiting_for,
                    timeout_ms,
                })) => {
                    // The faulting entry must not vanish silently; its
                    // eventual answer is now stale.
                    self.stale_finished += 1;
                    return self.resolve(
                        Vec::new(),
                        Some(format!(
                            "timed out waiting for {waiting_for} after {timeout_ms}ms"
                        )),
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Pop the oldest entry, record its result, and publish on drain.
    fn resolve(&mut self, labels: Vec<String>, error: Option<String>) -> Result<()> {
        let entry = self.queue.pop_front().ok_or_else(|| {
            WorkerError::Protocol("Finished received with no pending entry".to_string())
        })?;

        if let Some(reason) = &error {
            tracing::warn!("Classification of {:?} failed: {}", entry.source, reason);
        }

        let mut deduped: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels {
            if !deduped.contains(&label) {
                deduped.push(label);
            }
        }

        self.results.push(ClassificationResult {
            source: entry.source,
            labels: deduped,
            error,
        });

        if self.queue.is_empty() {
            self.fill_classifications();
        }
        Ok(())
    }

    /// Publish accumulated results into the tag fields.
    ///
    /// Multiple unfilled fields receive the Nth result by position; a single
    /// unfilled field receives the most recent result. Fields with no
    /// matching result are left untouched.
    fn fill_classifications(&mut self) {
        let results = &self.results;
        let mut unfilled: Vec<&mut TagField> = self
            .fields
            .iter_mut()
            .filter(|f| !f.is_filled())
            .collect();

        if unfilled.len() > 1 {
            for (index, field) in unfilled.iter_mut().enumerate() {
                if let Some(result) = results.get(index) {
                    field.fill(&result.labels);
                }
            }
        } else if let Some(field) = unfilled.into_iter().next() {
            if let Some(result) = results.last() {
                field.fill(&result.labels);
            }
        }
    }

    /// Receive responses until one matches, within a bounded wait.
    ///
    /// `Debug` messages are logged and skipped; other non-matching responses
    /// are logged and ignored so interleaving never affects control flow.
    async fn wait_for(
        &mut self,
        matches: impl Fn(&WorkerResponse) -> bool,
        waiting_for: &str,
        timeout_ms: u64,
    ) -> Result<WorkerResponse> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let response = tokio::time::timeout(remaining, self.worker.recv())
                .await
                .map_err(|_| WorkerError::Timeout {
                    waiting_for: waiting_for.to_string(),
                    timeout_ms,
                })?
                .ok_or(WorkerError::ChannelClosed)?;

            match response {
                WorkerResponse::Debug { source, message } => {
                    tracing::debug!("[{source}] {message}");
                }
                r if matches(&r) => return Ok(r),
                other => {
                    tracing::debug!("Ignoring out-of-order worker response: {other:?}");
                }
            }
        }
    }
}
