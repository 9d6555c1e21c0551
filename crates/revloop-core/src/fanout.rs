use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{info, warn};

use revloop_logging::{LogEvent, Logger};
use revloop_oracle::{Message, Oracle};
use revloop_roles::{Prompts, Role};

use crate::error::TeamReviewError;

/// Outcome of one perspective's review. Written once by the worker that owns the slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerspectiveResult {
    pub perspective_id: String,
    pub perspective_name: String,
    pub focus: String,
    pub raw_text: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_secs: f64,
}

impl PerspectiveResult {
    pub fn succeeded(role: &Role, raw_text: String, duration_secs: f64) -> Self {
        Self {
            perspective_id: role.id.clone(),
            perspective_name: role.name.clone(),
            focus: role.focus_or_default().to_string(),
            raw_text,
            ok: true,
            error: None,
            duration_secs,
        }
    }

    pub fn failed(role: &Role, error: String, duration_secs: f64) -> Self {
        Self {
            perspective_id: role.id.clone(),
            perspective_name: role.name.clone(),
            focus: role.focus_or_default().to_string(),
            raw_text: String::new(),
            ok: false,
            error: Some(error),
            duration_secs,
        }
    }
}

/// Runs every perspective against the same artifact concurrently
pub struct FanOutCoordinator {
    oracle: Arc<dyn Oracle>,
    logger: Arc<Logger>,
}

impl FanOutCoordinator {
    pub fn new(oracle: Arc<dyn Oracle>, logger: Arc<Logger>) -> Self {
        Self { oracle, logger }
    }

    /// Review `artifact` from every perspective at once.
    ///
    /// Returns one slot per perspective in the order given, whatever order the
    /// workers finish in. A failing perspective fills its own slot and leaves
    /// the others running. Fails only when the list is empty or every slot failed.
    pub async fn review_all_perspectives(
        &self,
        artifact: &str,
        shared_context: &str,
        perspectives: &[Role],
    ) -> Result<Vec<PerspectiveResult>, TeamReviewError> {
        if perspectives.is_empty() {
            return Err(TeamReviewError::ConfigError(
                "at least one perspective is required".to_string(),
            ));
        }

        self.logger.log(&LogEvent::TeamReviewStarted {
            perspectives: perspectives.iter().map(|p| p.id.clone()).collect(),
        });

        let request: Arc<str> = Prompts::perspective_request(shared_context, artifact).into();
        let mut join_set = JoinSet::new();
        let mut slot_of_task = HashMap::with_capacity(perspectives.len());

        for (slot, role) in perspectives.iter().enumerate() {
            let oracle = Arc::clone(&self.oracle);
            let logger = Arc::clone(&self.logger);
            let request = Arc::clone(&request);
            let role = role.clone();

            let handle = join_set.spawn(async move {
                let started = Instant::now();
                let history = [Message::user(request.as_ref())];
                let outcome = oracle.complete(&role, &history, role.temperature).await;
                let duration_secs = started.elapsed().as_secs_f64();

                let result = match outcome {
                    Ok(text) => PerspectiveResult::succeeded(&role, text, duration_secs),
                    Err(e) => {
                        warn!(perspective = %role.id, error = %e, "Perspective failed");
                        PerspectiveResult::failed(&role, e.to_string(), duration_secs)
                    }
                };
                logger.log(&LogEvent::PerspectiveCompleted {
                    perspective: role.id.clone(),
                    ok: result.ok,
                    duration_secs,
                    error: result.error.clone(),
                });
                (slot, result)
            });
            slot_of_task.insert(handle.id(), slot);
        }

        let mut slots: Vec<Option<PerspectiveResult>> = vec![None; perspectives.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((slot, result)) => slots[slot] = Some(result),
                Err(e) => {
                    warn!("Perspective task join error: {}", e);
                    if let Some(&slot) = slot_of_task.get(&e.id()) {
                        slots[slot] = Some(PerspectiveResult::failed(
                            &perspectives[slot],
                            format!("review task terminated: {}", e),
                            0.0,
                        ));
                    }
                }
            }
        }

        let results: Vec<PerspectiveResult> = slots
            .into_iter()
            .zip(perspectives)
            .map(|(slot, role)| {
                slot.unwrap_or_else(|| {
                    PerspectiveResult::failed(role, "review task terminated".to_string(), 0.0)
                })
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.ok).count();
        info!(succeeded, total = results.len(), "Perspective reviews finished");

        if succeeded == 0 {
            return Err(TeamReviewError::AllPerspectivesFailed { results });
        }
        Ok(results)
    }
}
