//! Boundary event bus for host transports
//!
//! The transport layer (HTTP/WebSocket, out of scope here) renders progress
//! from these events: node lifecycle, streamed content chunks, completion
//! and error. Bounded channel with `try_send` so a slow or absent consumer
//! never blocks the pipeline.

use std::fmt;
use tokio::sync::mpsc;

/// Events emitted at node boundaries during a run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A graph node began executing
    NodeEntered { name: String },

    /// A chunk of streamed output text
    ContentChunk { text: String },

    /// A graph node finished executing
    NodeExited { name: String },

    /// The run completed successfully
    Done,

    /// The run terminated with an error; no further content follows
    Error { message: String },
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::NodeEntered { name } => write!(f, "enter:{}", name),
            PipelineEvent::ContentChunk { text } => write!(f, "chunk:{} bytes", text.len()),
            PipelineEvent::NodeExited { name } => write!(f, "exit:{}", name),
            PipelineEvent::Done => write!(f, "done"),
            PipelineEvent::Error { message } => write!(f, "error:{}", message),
        }
    }
}

/// Event bus for publishing pipeline events to the host
pub struct EventBus {
    sender: mpsc::Sender<PipelineEvent>,
}

impl EventBus {
    /// Create new event bus with bounded channel
    ///
    /// Channel capacity: 100 events (prevents unbounded memory growth)
    pub fn new() -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (sender, receiver) = mpsc::channel(100);
        (EventBus { sender }, receiver)
    }

    /// Emit an event to the subscriber
    ///
    /// Non-blocking: if the channel is full the event is dropped rather
    /// than stalling the run.
    pub fn emit(&self, event: PipelineEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Emit a node-entered event
    pub fn node_entered(&self, name: &str) {
        self.emit(PipelineEvent::NodeEntered {
            name: name.to_string(),
        });
    }

    /// Emit a node-exited event
    pub fn node_exited(&self, name: &str) {
        self.emit(PipelineEvent::NodeExited {
            name: name.to_string(),
        });
    }

    /// Emit a content chunk
    pub fn chunk(&self, text: &str) {
        self.emit(PipelineEvent::ContentChunk {
            text: text.to_string(),
        });
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        EventBus {
            sender: self.sender.clone(),
        }
    }
}
