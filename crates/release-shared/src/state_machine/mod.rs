//! # Release and Task State Machines
//!
//! The two coupled finite state machines from spec §4.3/§4.4, plus the
//! [`machine::StateMachine`] driver that atomically validates an edge,
//! persists it, and journals an Event (spec §9 design note: "transition()
//! should validate the edge, persist the new state, and append an Event, all
//! within one commit").

pub mod events;
pub mod machine;
pub mod states;

pub use events::{ReleaseEvent, TaskEvent};
pub use machine::StateMachine;
pub use states::{ReleaseState, TaskState};
