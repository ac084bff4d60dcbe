use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Which readiness condition a wait was blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    PageReady,
    ElementReady,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitStage::PageReady => write!(f, "page readiness"),
            WaitStage::ElementReady => write!(f, "element readiness"),
        }
    }
}

/// Lifecycle of a single interaction call, recorded on tracing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    Pending,
    Waiting,
    Resolved,
    Acting,
    Done,
    TimedOut,
    Absent,
}

impl fmt::Display for InteractionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteractionPhase::Pending => "pending",
            InteractionPhase::Waiting => "waiting",
            InteractionPhase::Resolved => "resolved",
            InteractionPhase::Acting => "acting",
            InteractionPhase::Done => "done",
            InteractionPhase::TimedOut => "timed_out",
            InteractionPhase::Absent => "absent",
        };
        f.write_str(name)
    }
}
