//! Assembly lifecycle state machine.
//!
//! The transition table lives in [`events::determine_target_state`]; the
//! [`AssemblyStateMachine`] validates each event against it and persists the result.

pub mod assembly_state_machine;
pub mod errors;
pub mod events;
pub mod states;

pub use assembly_state_machine::AssemblyStateMachine;
pub use errors::{StateMachineError, StateMachineResult};
pub use events::{determine_target_state, AssemblyEvent};
pub use states::AssemblyState;
