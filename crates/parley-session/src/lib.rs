//! Parley session crate - dialogue state machine, turn history, and the
//! session controller.
//!
//! The controller owns every piece of mutable session state (transcript,
//! current answer, history, state machine) and changes it only in response to
//! [`SessionEvent`](parley_core::SessionEvent)s, processed one at a time:
//! Idle -> Listening -> Idle -> Speaking -> Idle.

pub mod controller;
pub mod history;
pub mod state;

pub use controller::{SessionController, SessionView};
pub use history::DialogueHistory;
pub use state::{SessionState, StateMachine};
