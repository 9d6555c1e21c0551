use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use revloop_oracle::{Message, Oracle, OracleError};
use revloop_roles::Role;

#[derive(Clone)]
struct Reply {
    delay: Duration,
    result: Result<String, String>,
}

/// Oracle double answering from per-role scripts. The last scripted reply of
/// a role repeats once the earlier ones are used up.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(Role, Vec<Message>)>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, role_id: &str, text: &str) -> Self {
        self.push(role_id, Duration::ZERO, Ok(text.to_string()))
    }

    pub fn reply_after(self, role_id: &str, delay_ms: u64, text: &str) -> Self {
        self.push(role_id, Duration::from_millis(delay_ms), Ok(text.to_string()))
    }

    pub fn fail(self, role_id: &str, error: &str) -> Self {
        self.push(role_id, Duration::ZERO, Err(error.to_string()))
    }

    fn push(self, role_id: &str, delay: Duration, result: Result<String, String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(role_id.to_string())
            .or_default()
            .push_back(Reply { delay, result });
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, role_id: &str) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(role, _)| role.id == role_id)
            .map(|(_, history)| history.clone())
            .collect()
    }

    /// Instructions the oracle was handed for each call made as `role_id`
    pub fn instructions_for(&self, role_id: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(role, _)| role.id == role_id)
            .map(|(role, _)| role.instructions.clone())
            .collect()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        role: &Role,
        history: &[Message],
        _temperature: f32,
    ) -> Result<String, OracleError> {
        self.calls
            .lock()
            .unwrap()
            .push((role.clone(), history.to_vec()));

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            let queue = replies.get_mut(&role.id).ok_or_else(|| {
                OracleError::ExecutionFailed(format!("no script for role {}", role.id))
            })?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        }
        .ok_or(OracleError::EmptyResponse)?;

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result.map_err(OracleError::ExecutionFailed)
    }
}
