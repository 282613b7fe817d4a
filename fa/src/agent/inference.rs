//! Two-tier inference with fallback
//!
//! An explicit state machine: `TryPrimary -> TryFallback -> Exhausted`.
//! Each configured backend is attempted at most once per query.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::FailureKind;
use crate::llm::{Backends, CompletionRequest, LlmClient};

/// Where the fallback sequence stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceState {
    TryPrimary,
    TryFallback,
    Exhausted,
}

impl InferenceState {
    /// First state for the configured backends
    pub fn initial(backends: &Backends) -> Self {
        if backends.primary.is_some() {
            Self::TryPrimary
        } else if backends.fallback.is_some() {
            Self::TryFallback
        } else {
            Self::Exhausted
        }
    }

    /// Next state after the current backend failed
    pub fn after_failure(self, backends: &Backends) -> Self {
        match self {
            Self::TryPrimary if backends.fallback.is_some() => Self::TryFallback,
            _ => Self::Exhausted,
        }
    }
}

/// Result of driving the state machine to a terminal state
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    Completed { text: String, backend: String },
    Failed { error: FailureKind, detail: String },
}

/// Run `request` against the primary backend, then the fallback
pub async fn infer(backends: &Backends, request: &CompletionRequest) -> InferenceOutcome {
    let mut state = InferenceState::initial(backends);
    let mut failures: Vec<String> = Vec::new();
    debug!(?state, ?backends, "infer: called");

    loop {
        let client = match state {
            InferenceState::TryPrimary => backends.primary.as_ref(),
            InferenceState::TryFallback => backends.fallback.as_ref(),
            InferenceState::Exhausted => return exhausted(backends, failures),
        };
        let Some(client) = client else {
            state = InferenceState::Exhausted;
            continue;
        };

        match attempt(client, request).await {
            Ok(text) => {
                info!(backend = %client.label(), ?state, "Inference completed");
                return InferenceOutcome::Completed {
                    text,
                    backend: client.label(),
                };
            }
            Err(detail) => {
                warn!(backend = %client.label(), ?state, error = %detail, "Inference backend failed");
                failures.push(format!("{}: {}", client.label(), detail));
                state = state.after_failure(backends);
            }
        }
    }
}

async fn attempt(client: &Arc<dyn LlmClient>, request: &CompletionRequest) -> Result<String, String> {
    client
        .complete(request.clone())
        .await
        .and_then(|response| response.into_text())
        .map_err(|e| e.to_string())
}

fn exhausted(backends: &Backends, failures: Vec<String>) -> InferenceOutcome {
    let (error, detail) = if !failures.is_empty() {
        (FailureKind::InferenceFailed, failures.join("; "))
    } else if backends.remote_auth_missing {
        (
            FailureKind::AuthRequired,
            "Remote inference backend is selected but its credential is not set".to_string(),
        )
    } else {
        (FailureKind::NoInferenceEngine, "No inference backend is configured".to_string())
    };
    debug!(?error, %detail, "exhausted: no completion");
    InferenceOutcome::Failed { error, detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;

    fn request() -> CompletionRequest {
        CompletionRequest::new("sys", "user", 64)
    }

    fn client(mock: &Arc<MockLlmClient>) -> Option<Arc<dyn LlmClient>> {
        Some(mock.clone() as Arc<dyn LlmClient>)
    }

    fn scripted(responses: Vec<&str>) -> Option<Arc<dyn LlmClient>> {
        client(&Arc::new(MockLlmClient::new(responses)))
    }

    #[test]
    fn test_transitions() {
        let none = Backends::default();
        assert_eq!(InferenceState::initial(&none), InferenceState::Exhausted);

        let both = Backends::new(scripted(vec![]), scripted(vec![]));
        assert_eq!(InferenceState::initial(&both), InferenceState::TryPrimary);
        assert_eq!(InferenceState::TryPrimary.after_failure(&both), InferenceState::TryFallback);
        assert_eq!(InferenceState::TryFallback.after_failure(&both), InferenceState::Exhausted);

        let primary_only = Backends::new(scripted(vec![]), None);
        assert_eq!(InferenceState::TryPrimary.after_failure(&primary_only), InferenceState::Exhausted);

        let fallback_only = Backends::new(None, scripted(vec![]));
        assert_eq!(InferenceState::initial(&fallback_only), InferenceState::TryFallback);
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = Arc::new(MockLlmClient::new(vec!["{}"]).with_label("remote"));
        let fallback = Arc::new(MockLlmClient::new(vec!["[]"]).with_label("local"));
        let backends = Backends::new(client(&primary), client(&fallback));

        let outcome = infer(&backends, &request()).await;

        assert_eq!(
            outcome,
            InferenceOutcome::Completed {
                text: "{}".to_string(),
                backend: "remote".to_string()
            }
        );
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_once() {
        let primary = Arc::new(MockLlmClient::failing("down").with_label("remote"));
        let fallback = Arc::new(MockLlmClient::new(vec!["{}"]).with_label("local"));
        let backends = Backends::new(client(&primary), client(&fallback));

        let outcome = infer(&backends, &request()).await;

        assert!(matches!(outcome, InferenceOutcome::Completed { ref backend, .. } if backend == "local"));
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_completion_counts_as_failure() {
        let backends = Backends::new(scripted(vec!["   "]), None);

        let outcome = infer(&backends, &request()).await;
        assert!(matches!(
            outcome,
            InferenceOutcome::Failed {
                error: FailureKind::InferenceFailed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_both_fail() {
        let backends = Backends::new(
            client(&Arc::new(MockLlmClient::failing("remote down").with_label("remote"))),
            client(&Arc::new(MockLlmClient::failing("local down").with_label("local"))),
        );

        match infer(&backends, &request()).await {
            InferenceOutcome::Failed { error, detail } => {
                assert_eq!(error, FailureKind::InferenceFailed);
                assert!(detail.contains("remote down"));
                assert!(detail.contains("local down"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_backends() {
        let outcome = infer(&Backends::default(), &request()).await;
        assert!(matches!(
            outcome,
            InferenceOutcome::Failed {
                error: FailureKind::NoInferenceEngine,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_only() {
        let backends = Backends {
            remote_auth_missing: true,
            ..Default::default()
        };
        let outcome = infer(&backends, &request()).await;
        assert!(matches!(
            outcome,
            InferenceOutcome::Failed {
                error: FailureKind::AuthRequired,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_with_failing_local_is_inference_failed() {
        let backends = Backends {
            primary: None,
            fallback: client(&Arc::new(MockLlmClient::failing("local down"))),
            remote_auth_missing: true,
        };
        let outcome = infer(&backends, &request()).await;
        assert!(matches!(
            outcome,
            InferenceOutcome::Failed {
                error: FailureKind::InferenceFailed,
                ..
            }
        ));
    }
}
