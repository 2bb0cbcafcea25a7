use crate::chain::{BlockId, ChainId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub type RunId = Uuid;

/// Events emitted while a chain runs.
///
/// `BlockCompleted` carries the published port names rather than the
/// containers themselves; meshes can be large and the run report already
/// holds the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    ChainStarted {
        run_id: RunId,
        chain_id: ChainId,
        timestamp: DateTime<Utc>,
    },
    ChainCompleted {
        run_id: RunId,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    BlockStarted {
        run_id: RunId,
        block_id: BlockId,
        block_type: String,
        timestamp: DateTime<Utc>,
    },
    BlockCompleted {
        run_id: RunId,
        block_id: BlockId,
        ports: Vec<String>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    BlockFailed {
        run_id: RunId,
        block_id: BlockId,
        error: String,
        timestamp: DateTime<Utc>,
    },
    BlockSkipped {
        run_id: RunId,
        block_id: BlockId,
        timestamp: DateTime<Utc>,
    },
    BlockMessage {
        run_id: RunId,
        block_id: BlockId,
        message: BlockMessage,
        timestamp: DateTime<Utc>,
    },
}

/// Free-form messages a block may emit mid-execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type")]
pub enum BlockMessage {
    Info { message: String },
    Warning { message: String },
    Progress { percent: f64, message: Option<String> },
}

/// Per-block handle for emitting messages during execution
#[derive(Clone)]
pub struct EventEmitter {
    run_id: RunId,
    block_id: BlockId,
    sender: broadcast::Sender<RunEvent>,
}

impl EventEmitter {
    pub fn new(run_id: RunId, block_id: BlockId, sender: broadcast::Sender<RunEvent>) -> Self {
        Self {
            run_id,
            block_id,
            sender,
        }
    }

    pub fn emit(&self, message: BlockMessage) {
        let _ = self.sender.send(RunEvent::BlockMessage {
            run_id: self.run_id,
            block_id: self.block_id,
            message,
            timestamp: Utc::now(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(BlockMessage::Info {
            message: message.into(),
        });
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(BlockMessage::Warning {
            message: message.into(),
        });
    }

    pub fn progress(&self, percent: f64, message: Option<String>) {
        self.emit(BlockMessage::Progress { percent, message });
    }
}

/// Broadcast bus for run events
pub struct EventBus {
    sender: broadcast::Sender<RunEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: RunEvent) {
        let _ = self.sender.send(event);
    }

    pub fn create_emitter(&self, run_id: RunId, block_id: BlockId) -> EventEmitter {
        EventEmitter::new(run_id, block_id, self.sender.clone())
    }
}
