//! The classification worker: a spawned task owning the inference engine,
//! joined to the host by a pair of bounded channels.
//!
//! Message contract: exactly one `Init` is sent before any request is
//! processed; each `Load` yields exactly one `Ready` or `LoadFailed`; each
//! `Execute` yields exactly one `Finished` before the next request is
//! touched. `Debug` messages may interleave anywhere and carry no control
//! flow. Single-flight execution falls out of the worker's sequential
//! receive loop: the next request is only received after the previous
//! response has been sent.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::engine::InferenceEngine;
use crate::error::WorkerError;
use crate::model::ModelStore;
use crate::types::ClassificationRequest;

/// Source tag on `Debug` messages emitted by the worker.
pub const WORKER_SOURCE: &str = "classification worker";

/// Host-to-worker requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerRequest {
    /// Load the named model; answered by `Ready` or `LoadFailed`.
    Load { model_name: String },

    /// Classify one image; answered by `Finished`.
    Execute { request: ClassificationRequest },
}

/// Worker-to-host responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerResponse {
    /// The worker task is up and accepting requests.
    Init,

    /// The last `Load` succeeded; the engine is Ready.
    Ready,

    /// The last `Load` failed; the engine holds no usable model.
    LoadFailed { reason: String },

    /// One `Execute` completed. `error` is set when the request failed,
    /// in which case `labels` is empty.
    Finished {
        labels: Vec<String>,
        error: Option<String>,
    },

    /// Advisory logging; never affects control flow.
    Debug { source: String, message: String },
}

/// Host-side handle to a running worker.
pub struct WorkerHandle {
    requests: mpsc::Sender<WorkerRequest>,
    responses: mpsc::Receiver<WorkerResponse>,
}

impl WorkerHandle {
    /// Join an externally driven channel pair. Used by tests and by hosts
    /// that transport the protocol themselves.
    pub fn from_channels(
        requests: mpsc::Sender<WorkerRequest>,
        responses: mpsc::Receiver<WorkerResponse>,
    ) -> Self {
        Self {
            requests,
            responses,
        }
    }

    /// Send one request to the worker.
    pub async fn send(&self, request: WorkerRequest) -> Result<(), WorkerError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| WorkerError::ChannelClosed)
    }

    /// Receive the next response; `None` when the worker is gone.
    pub async fn recv(&mut self) -> Option<WorkerResponse> {
        self.responses.recv().await
    }
}

/// Spawn the worker task owning `engine`.
///
/// `Init` is emitted before any request is processed.
pub fn spawn<S>(engine: InferenceEngine<S>, channel_capacity: usize) -> WorkerHandle
where
    S: ModelStore + 'static,
{
    let (request_tx, request_rx) = mpsc::channel(channel_capacity);
    let (response_tx, response_rx) = mpsc::channel(channel_capacity);

    tokio::spawn(run(engine, request_rx, response_tx));

    WorkerHandle::from_channels(request_tx, response_rx)
}

async fn run<S: ModelStore>(
    mut engine: InferenceEngine<S>,
    mut requests: mpsc::Receiver<WorkerRequest>,
    responses: mpsc::Sender<WorkerResponse>,
) {
    if responses.send(WorkerResponse::Init).await.is_err() {
        return;
    }

    while let Some(request) = requests.recv().await {
        let response = match request {
            WorkerRequest::Load { model_name } => {
                debug(&responses, format!("Loading model: {model_name}")).await;
                match engine.load_model(&model_name).await {
                    Ok(()) => WorkerResponse::Ready,
                    Err(e) => {
                        tracing::warn!("Model load failed: {e}");
                        WorkerResponse::LoadFailed {
                            reason: e.to_string(),
                        }
                    }
                }
            }

            WorkerRequest::Execute { request } => {
                if !engine.is_ready() {
                    // Protocol violation: report it and drop the request
                    // instead of crashing the worker.
                    debug(
                        &responses,
                        "Execute received before a model was loaded".to_string(),
                    )
                    .await;
                    continue;
                }
                match engine.classify(&request) {
                    Ok(labels) => WorkerResponse::Finished {
                        labels,
                        error: None,
                    },
                    Err(e) => {
                        tracing::warn!("Classification failed: {e}");
                        WorkerResponse::Finished {
                            labels: Vec::new(),
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
        };

        if responses.send(response).await.is_err() {
            break;
        }
    }
}

async fn debug(responses: &mpsc::Sender<WorkerResponse>, message: String) {
    tracing::debug!(source = WORKER_SOURCE, "{message}");
    // The host may already be gone; the next send will notice.
    let _ = responses
        .send(WorkerResponse::Debug {
            source: WORKER_SOURCE.to_string(),
            message,
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{descriptor_json, solid_image_request, MapStore, StubFactory};

    fn spawn_stub_worker(output: Vec<f32>) -> WorkerHandle {
        let engine = InferenceEngine::with_factory(
            MapStore::with_model("test", &descriptor_json("tensorflow")),
            Box::new(StubFactory::new(output)),
        );
        spawn(engine, 8)
    }

    /// Receive the next non-Debug response.
    async fn next_response(handle: &mut WorkerHandle) -> WorkerResponse {
        loop {
            match handle.recv().await.expect("worker closed") {
                WorkerResponse::Debug { .. } => continue,
                other => return other,
            }
        }
    }

    #[tokio::test]
    async fn test_init_is_first_message() {
        let mut handle = spawn_stub_worker(vec![]);
        assert_eq!(handle.recv().await, Some(WorkerResponse::Init));
    }

    #[tokio::test]
    async fn test_load_yields_ready() {
        let mut handle = spawn_stub_worker(vec![]);
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Init);

        handle
            .send(WorkerRequest::Load {
                model_name: "test".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Ready);
    }

    #[tokio::test]
    async fn test_load_failure_yields_load_failed() {
        let mut handle = spawn_stub_worker(vec![]);
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Init);

        handle
            .send(WorkerRequest::Load {
                model_name: "nonexistent".to_string(),
            })
            .await
            .unwrap();
        match next_response(&mut handle).await {
            WorkerResponse::LoadFailed { reason } => assert!(reason.contains("nonexistent")),
            other => panic!("expected LoadFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_yields_finished_with_labels() {
        let mut handle = spawn_stub_worker(vec![0.0, 0.0, 0.91, 2.0]);
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Init);

        handle
            .send(WorkerRequest::Load {
                model_name: "test".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Ready);

        handle
            .send(WorkerRequest::Execute {
                request: solid_image_request(),
            })
            .await
            .unwrap();
        assert_eq!(
            next_response(&mut handle).await,
            WorkerResponse::Finished {
                labels: vec!["bird".to_string()],
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn test_each_execute_yields_exactly_one_finished() {
        let mut handle = spawn_stub_worker(vec![0.0, 0.0, 0.9, 0.0]);
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Init);

        handle
            .send(WorkerRequest::Load {
                model_name: "test".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Ready);

        for _ in 0..3 {
            handle
                .send(WorkerRequest::Execute {
                    request: solid_image_request(),
                })
                .await
                .unwrap();
        }
        for _ in 0..3 {
            assert!(matches!(
                next_response(&mut handle).await,
                WorkerResponse::Finished { error: None, .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_execute_before_load_is_reported_not_answered() {
        let mut handle = spawn_stub_worker(vec![]);
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Init);

        handle
            .send(WorkerRequest::Execute {
                request: solid_image_request(),
            })
            .await
            .unwrap();
        // The violation is reported via Debug only; a subsequent Load still
        // works, proving the worker did not crash.
        match handle.recv().await.unwrap() {
            WorkerResponse::Debug { source, message } => {
                assert_eq!(source, WORKER_SOURCE);
                assert!(message.contains("before a model"));
            }
            other => panic!("expected Debug, got {other:?}"),
        }

        handle
            .send(WorkerRequest::Load {
                model_name: "test".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Ready);
    }

    #[tokio::test]
    async fn test_engine_failure_becomes_finished_error() {
        // Class index 9 is out of range for the 3-tag descriptor.
        let mut handle = spawn_stub_worker(vec![0.0, 0.0, 0.9, 9.0]);
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Init);

        handle
            .send(WorkerRequest::Load {
                model_name: "test".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Ready);

        handle
            .send(WorkerRequest::Execute {
                request: solid_image_request(),
            })
            .await
            .unwrap();
        match next_response(&mut handle).await {
            WorkerResponse::Finished { labels, error } => {
                assert!(labels.is_empty());
                assert!(error.unwrap().contains("out of range"));
            }
            other => panic!("expected Finished, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reload_replaces_model() {
        let mut handle = spawn_stub_worker(vec![0.0, 0.0, 0.9, 1.0]);
        assert_eq!(next_response(&mut handle).await, WorkerResponse::Init);

        for _ in 0..2 {
            handle
                .send(WorkerRequest::Load {
                    model_name: "test".to_string(),
                })
                .await
                .unwrap();
            assert_eq!(next_response(&mut handle).await, WorkerResponse::Ready);
        }

        handle
            .send(WorkerRequest::Execute {
                request: solid_image_request(),
            })
            .await
            .unwrap();
        assert_eq!(
            next_response(&mut handle).await,
            WorkerResponse::Finished {
                labels: vec!["dog".to_string()],
                error: None,
            }
        );
    }
}
