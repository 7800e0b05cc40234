// Per-language publishing state machine
//
// Each language of each entity version moves through its own states; guards
// enforce the structural rules and actions announce committed transitions.

pub mod actions;
pub mod errors;
pub mod events;
pub mod guards;
pub mod language_state_machine;
pub mod persistence;
pub mod states;

// Re-export main types for convenient access
pub use errors::{ActionError, GuardError, StateMachineError, StateMachineResult};
pub use events::LanguageEvent;
pub use language_state_machine::{LanguageStateMachine, LanguageTransition};
pub use states::{PublishingStatus, TargetState};

// Common traits and utilities
pub use actions::StateAction;
pub use guards::StateGuard;
pub use persistence::TransitionPersistence;
