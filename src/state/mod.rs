//! # Shared service state.
//!
//! - [`Collaborator`] - lifecycle contract for injected handles (start/stop)
//! - [`ServiceState`] - immutable, role-keyed bundle of collaborator handles
//! - [`ServiceStateBuilder`] - the single explicit construction path
//! - [`SharedState`] - `Arc<ServiceState>` handed to every work unit

mod collaborator;
mod service_state;

pub use collaborator::Collaborator;
pub use service_state::{ServiceState, ServiceStateBuilder, SharedState};
