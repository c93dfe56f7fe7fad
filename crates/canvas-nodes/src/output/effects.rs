//! Effect-only nodes
//!
//! `email`, `print`, `screenshot`, and `social_share` have no data
//! outputs: they perform a one-shot external action when the user
//! explicitly triggers them. Cascaded recomputes only refresh the status
//! preview, so an upstream edit never re-sends an email.
//!
//! The action itself goes through the [`EffectSink`] collaborator; hosts
//! plug in a real transport, the default sink just logs.

use std::sync::{Arc, Mutex};

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
use serde::Serialize;
use serde_json::{json, Value};

/// The external action a node performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Email,
    Print,
    Screenshot,
    SocialShare,
}

impl EffectKind {
    fn node_type(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Print => "print",
            Self::Screenshot => "screenshot",
            Self::SocialShare => "social_share",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Print => "Print",
            Self::Screenshot => "Screenshot",
            Self::SocialShare => "Social Share",
        }
    }

    fn done_status(&self) -> &'static str {
        match self {
            Self::Email => "email sent",
            Self::Print => "sent to printer",
            Self::Screenshot => "screenshot captured",
            Self::SocialShare => "shared",
        }
    }
}

/// A one-shot action handed to the sink
#[derive(Debug, Clone, Serialize)]
pub struct EffectRequest {
    /// The triggering node
    pub node_id: String,
    /// Which action to perform
    pub kind: EffectKind,
    /// The content the node resolved from its input and parameters
    pub payload: Value,
}

/// Host collaborator that performs one-shot external actions
pub trait EffectSink: Send + Sync {
    /// Perform the action; the error string becomes the node's status
    fn perform(&self, request: EffectRequest) -> Result<(), String>;
}

/// Default sink: logs the request and succeeds
pub struct LogEffectSink;

impl EffectSink for LogEffectSink {
    fn perform(&self, request: EffectRequest) -> Result<(), String> {
        log::info!(
            "effect {:?} from {}: {}",
            request.kind,
            request.node_id,
            request.payload
        );
        Ok(())
    }
}

/// Collecting sink for tests and dry runs
pub struct RecordingEffectSink {
    requests: Mutex<Vec<EffectRequest>>,
}

impl RecordingEffectSink {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests performed so far
    pub fn requests(&self) -> Vec<EffectRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for RecordingEffectSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectSink for RecordingEffectSink {
    fn perform(&self, request: EffectRequest) -> Result<(), String> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// An effect-only node bound to one action kind
pub struct EffectNode {
    kind: EffectKind,
    sink: Arc<dyn EffectSink>,
}

impl EffectNode {
    pub const SOCKET_CONTENT: &'static str = "content";

    /// Create an effect node with the default logging sink
    pub fn new(kind: EffectKind) -> Self {
        Self::with_sink(kind, Arc::new(LogEffectSink))
    }

    /// Create an effect node with a host-provided sink
    pub fn with_sink(kind: EffectKind, sink: Arc<dyn EffectSink>) -> Self {
        Self { kind, sink }
    }

    pub fn descriptor(kind: EffectKind) -> NodeMetadata {
        NodeMetadata {
            node_type: kind.node_type().to_string(),
            category: NodeCategory::Effect,
            label: kind.label().to_string(),
            description: format!("{} the connected content when triggered", kind.label()),
            inputs: vec![SocketMetadata::optional(
                Self::SOCKET_CONTENT,
                "Content",
                SocketType::Any,
            )],
            outputs: vec![],
        }
    }

    fn payload(&self, ctx: &ProcessContext<'_>) -> Value {
        let content = ctx.input(Self::SOCKET_CONTENT).cloned().unwrap_or(Value::Null);
        match self.kind {
            EffectKind::Email => json!({
                "to": ctx.param_or("to", ""),
                "subject": ctx.param_or("subject", ""),
                "body": content,
            }),
            _ => content,
        }
    }
}

impl NodeProcessor for EffectNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        if !ctx.triggered() {
            // Cascaded recompute: refresh the preview only
            let status = if ctx.input(Self::SOCKET_CONTENT).is_some() {
                format!("{}: ready", self.kind.label())
            } else {
                format!("{}: no input connected", self.kind.label())
            };
            return Ok(ProcessorOutput::empty().with_status(status));
        }

        let request = EffectRequest {
            node_id: ctx.node_id().to_string(),
            kind: self.kind,
            payload: self.payload(ctx),
        };
        self.sink
            .perform(request)
            .map_err(ProcessorError::EffectFailed)?;
        Ok(ProcessorOutput::empty().with_status(self.kind.done_status().to_string()))
    }
}

fn email_descriptor() -> NodeMetadata {
    EffectNode::descriptor(EffectKind::Email)
}
fn print_descriptor() -> NodeMetadata {
    EffectNode::descriptor(EffectKind::Print)
}
fn screenshot_descriptor() -> NodeMetadata {
    EffectNode::descriptor(EffectKind::Screenshot)
}
fn social_share_descriptor() -> NodeMetadata {
    EffectNode::descriptor(EffectKind::SocialShare)
}

inventory::submit!(ProcessorRegistration::new(email_descriptor, || {
    Arc::new(EffectNode::new(EffectKind::Email)) as Arc<dyn NodeProcessor>
}));
inventory::submit!(ProcessorRegistration::new(print_descriptor, || {
    Arc::new(EffectNode::new(EffectKind::Print)) as Arc<dyn NodeProcessor>
}));
inventory::submit!(ProcessorRegistration::new(screenshot_descriptor, || {
    Arc::new(EffectNode::new(EffectKind::Screenshot)) as Arc<dyn NodeProcessor>
}));
inventory::submit!(ProcessorRegistration::new(social_share_descriptor, || {
    Arc::new(EffectNode::new(EffectKind::SocialShare)) as Arc<dyn NodeProcessor>
}));
