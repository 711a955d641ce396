//! Block lifecycle state machine.
//!
//! ```text
//! start:  Idle -> Active, Finished -> Active
//! pause:  Active -> Paused
//! resume: Paused -> Active
//! finish: Active -> Finished
//! skip:   Active -> Finished
//! reset:  * -> Idle
//! ```
//!
//! Events from any other source state are ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockState {
    #[default]
    Idle,
    Active,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockEvent {
    Start,
    Pause,
    Resume,
    Finish,
    Skip,
    Reset,
}

/// `(event, source, target)`; a `None` source matches every state.
const TRANSITIONS: &[(BlockEvent, Option<BlockState>, BlockState)] = &[
    (BlockEvent::Start, Some(BlockState::Idle), BlockState::Active),
    (BlockEvent::Start, Some(BlockState::Finished), BlockState::Active),
    (BlockEvent::Pause, Some(BlockState::Active), BlockState::Paused),
    (BlockEvent::Resume, Some(BlockState::Paused), BlockState::Active),
    (BlockEvent::Finish, Some(BlockState::Active), BlockState::Finished),
    (BlockEvent::Skip, Some(BlockState::Active), BlockState::Finished),
    (BlockEvent::Reset, None, BlockState::Idle),
];

/// Target state for `event` fired in `from`, if the table allows it.
pub fn transition(from: BlockState, event: BlockEvent) -> Option<BlockState> {
    TRANSITIONS
        .iter()
        .find(|(e, source, _)| *e == event && source.map_or(true, |s| s == from))
        .map(|(_, _, target)| *target)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMachine {
    state: BlockState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    /// Apply `event`. Returns the new state, or `None` if the event is not
    /// valid from the current state (the machine is left unchanged).
    pub fn apply(&mut self, event: BlockEvent) -> Option<BlockState> {
        let next = transition(self.state, event)?;
        tracing::debug!(from = ?self.state, to = ?next, ?event, "block state transition");
        self.state = next;
        Some(next)
    }
}
