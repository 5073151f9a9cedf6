/*!
Human-in-the-loop interrupt handling.

When the execution runtime pauses at a node it hands this module a state
snapshot keyed by execution thread. The controller holds that snapshot
(redacted for display) while the user decides, then issues exactly one
structured resume command back to the runtime: continue as-is, continue
with a patched state, or jump to a different node.

Phase machine: `Running → Interrupted → {Continuing | Updating | Routing}
→ Running`. A failed resume returns the controller to `Interrupted` with
the snapshot intact so the user can retry.
*/

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::events::{EditorEvent, EventSender};
use crate::utils::redact_state;

/// A paused execution thread awaiting a human decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterruptInfo {
    pub node_id: String,
    pub node_label: String,
    pub thread_id: String,
    /// Execution-state snapshot at the pause point, redacted on ingest.
    pub state: Value,
}

/// Where the paused thread is in its resume lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionPhase {
    #[default]
    Running,
    Interrupted,
    Continuing,
    Updating,
    Routing,
}

/// The structured command sent to the runtime to resume a thread. Both
/// fields empty means "continue on the existing planned path".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<serde_json::Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goto: Option<String>,
}

/// Resume endpoint of the execution runtime.
#[async_trait]
pub trait ResumeApi: Send + Sync {
    async fn resume_with_command(
        &self,
        thread_id: &str,
        command: ResumeCommand,
    ) -> Result<(), InterruptError>;
}

/// Maps an editor node id to the identifier the runtime knows the node by.
/// The namespaces are distinct; the mapping lives with the embedding host.
pub trait NodeIdTranslator: Send + Sync {
    fn runtime_id(&self, editor_id: &str) -> Option<String>;
}

#[derive(Debug, Error, Diagnostic)]
pub enum InterruptError {
    #[error("no execution thread is currently interrupted")]
    #[diagnostic(code(flowboard::interrupt::no_active_interrupt))]
    NoActiveInterrupt,

    #[error("state patch must be a JSON object")]
    #[diagnostic(
        code(flowboard::interrupt::invalid_state_patch),
        help("Fix the edited state and resume again; the previous snapshot is retained.")
    )]
    InvalidStatePatch,

    #[error("node '{node_id}' has no runtime counterpart to jump to")]
    #[diagnostic(code(flowboard::interrupt::unknown_jump_target))]
    UnknownJumpTarget { node_id: String },

    #[error("resume request failed: {message}")]
    #[diagnostic(
        code(flowboard::interrupt::resume_failed),
        help("The interrupt is retained; retry or discard it.")
    )]
    ResumeFailed { message: String },
}

/// State machine over a single interrupted thread.
pub struct InterruptController {
    api: Arc<dyn ResumeApi>,
    translator: Arc<dyn NodeIdTranslator>,
    events: EventSender,
    phase: ExecutionPhase,
    interrupt: Option<InterruptInfo>,
}

impl InterruptController {
    #[must_use]
    pub fn new(
        api: Arc<dyn ResumeApi>,
        translator: Arc<dyn NodeIdTranslator>,
        events: EventSender,
    ) -> Self {
        Self {
            api,
            translator,
            events,
            phase: ExecutionPhase::Running,
            interrupt: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> ExecutionPhase {
        self.phase
    }

    /// The held interrupt, if any. The state inside has already been
    /// redacted and is safe to display.
    #[must_use]
    pub fn current(&self) -> Option<&InterruptInfo> {
        self.interrupt.as_ref()
    }

    /// Ingest a pause reported by the runtime. Sensitive values in the
    /// snapshot are redacted before anything is stored.
    #[instrument(skip(self, info), fields(node_id = %info.node_id, thread_id = %info.thread_id))]
    pub fn on_interrupt(&mut self, mut info: InterruptInfo) {
        info.state = redact_state(&info.state);
        self.events.emit(EditorEvent::Interrupted {
            node_id: info.node_id.clone(),
            thread_id: info.thread_id.clone(),
        });
        self.interrupt = Some(info);
        self.phase = ExecutionPhase::Interrupted;
    }

    /// Resume with an empty command: no state changes, execution proceeds
    /// along its planned path.
    pub async fn resume_continue(&mut self) -> Result<(), InterruptError> {
        self.require_interrupted()?;
        self.phase = ExecutionPhase::Continuing;
        self.dispatch(ResumeCommand::default()).await
    }

    /// Resume with an explicit state patch. A patch that is not a JSON
    /// object is rejected locally before anything is sent; the held
    /// snapshot stays valid.
    pub async fn resume_with_update(&mut self, patch: Value) -> Result<(), InterruptError> {
        self.require_interrupted()?;
        let Value::Object(update) = patch else {
            return Err(InterruptError::InvalidStatePatch);
        };
        self.phase = ExecutionPhase::Updating;
        self.dispatch(ResumeCommand {
            update: Some(update),
            goto: None,
        })
        .await
    }

    /// Resume with a jump target, translating the editor node id into the
    /// runtime's identifier namespace.
    pub async fn resume_goto(&mut self, node_id: &str) -> Result<(), InterruptError> {
        self.require_interrupted()?;
        let Some(runtime_id) = self.translator.runtime_id(node_id) else {
            return Err(InterruptError::UnknownJumpTarget {
                node_id: node_id.to_string(),
            });
        };
        self.phase = ExecutionPhase::Routing;
        self.dispatch(ResumeCommand {
            update: None,
            goto: Some(runtime_id),
        })
        .await
    }

    /// Drop the interrupt without resuming the thread.
    pub fn discard(&mut self) {
        if let Some(info) = self.interrupt.take() {
            self.events.emit(EditorEvent::InterruptDiscarded {
                thread_id: info.thread_id,
            });
        }
        self.phase = ExecutionPhase::Running;
    }

    fn require_interrupted(&self) -> Result<(), InterruptError> {
        if self.interrupt.is_none() {
            return Err(InterruptError::NoActiveInterrupt);
        }
        Ok(())
    }

    async fn dispatch(&mut self, command: ResumeCommand) -> Result<(), InterruptError> {
        let thread_id = self
            .interrupt
            .as_ref()
            .map(|i| i.thread_id.clone())
            .ok_or(InterruptError::NoActiveInterrupt)?;
        match self.api.resume_with_command(&thread_id, command).await {
            Ok(()) => {
                self.interrupt = None;
                self.phase = ExecutionPhase::Running;
                self.events.emit(EditorEvent::Resumed { thread_id });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, %thread_id, "resume failed; interrupt retained");
                self.phase = ExecutionPhase::Interrupted;
                Err(err)
            }
        }
    }
}
