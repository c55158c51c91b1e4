//! # Service state: an immutable bundle of collaborator handles.
//!
//! [`ServiceState`] maps a role name (`"storage"`, `"notifier"`, ...) to the handle
//! bound for it. It is built exactly once through [`ServiceStateBuilder::build`] and then
//! shared as [`SharedState`] by the supervisor and every dispatched unit.
//!
//! ## Rules
//! - Required roles are declared up front; a missing one fails the build with `Validation`.
//! - A role is bound at most once; there is no API to rebind after construction.
//! - Reconfiguration means building a new state (and a new supervisor).
//! - Lookups are read-only and lock-free; handles synchronize themselves.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use servicecore::{Collaborator, ServiceState};
//!
//! struct Storage;
//! impl Collaborator for Storage {}
//!
//! let state = ServiceState::builder()
//!     .require("storage")
//!     .bind("storage", Arc::new(Storage))
//!     .build()
//!     .unwrap();
//!
//! let storage: Arc<Storage> = state.handle("storage").unwrap();
//! # let _ = storage;
//!
//! let missing = ServiceState::builder().require("storage").build();
//! assert!(missing.is_err());
//! ```

use std::any::Any;
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::state::collaborator::Collaborator;

/// Shared handle to the service state.
pub type SharedState = Arc<ServiceState>;

/// One role binding. `handle` and `lifecycle` point at the same allocation.
struct Binding {
    role: String,
    handle: Arc<dyn Any + Send + Sync>,
    lifecycle: Arc<dyn Collaborator>,
}

/// Immutable bundle of collaborator handles keyed by role.
pub struct ServiceState {
    bindings: Vec<Binding>,
}

impl ServiceState {
    /// Starts a new builder.
    pub fn builder() -> ServiceStateBuilder {
        ServiceStateBuilder::new()
    }

    /// Returns the handle bound for `role`, typed as `T`.
    ///
    /// An unknown role or a type mismatch is a programming error and is reported as
    /// [`ErrorKind::Internal`].
    pub fn handle<T>(&self, role: &str) -> Result<Arc<T>, ErrorKind>
    where
        T: Collaborator,
    {
        let binding = self.binding(role).ok_or_else(|| {
            ErrorKind::internal("service_state", format!("no collaborator bound for role '{role}'"))
        })?;

        Arc::clone(&binding.handle).downcast::<T>().map_err(|_| {
            ErrorKind::internal(
                "service_state",
                format!(
                    "role '{role}' is not bound to {}",
                    std::any::type_name::<T>()
                ),
            )
        })
    }

    /// Returns true if `role` is bound.
    pub fn contains(&self, role: &str) -> bool {
        self.binding(role).is_some()
    }

    /// Returns bound role names in bind order.
    pub fn roles(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.role.as_str()).collect()
    }

    /// Starts every collaborator in bind order.
    ///
    /// On the first failure, collaborators that were already started are stopped in
    /// reverse order and the failure is returned.
    pub async fn start_all(&self) -> Result<(), ErrorKind> {
        for (idx, binding) in self.bindings.iter().enumerate() {
            if let Err(err) = binding.lifecycle.start().await {
                for started in self.bindings[..idx].iter().rev() {
                    if let Err(_stop_err) = started.lifecycle.stop().await {
                        #[cfg(feature = "logging")]
                        tracing::warn!(
                            role = %started.role,
                            error = %_stop_err,
                            "rollback stop failed"
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Stops every collaborator in reverse bind order.
    ///
    /// All collaborators are attempted; the first error encountered is returned.
    pub async fn stop_all(&self) -> Result<(), ErrorKind> {
        let mut first_err = None;
        for binding in self.bindings.iter().rev() {
            if let Err(err) = binding.lifecycle.stop().await {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn binding(&self, role: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.role == role)
    }
}

impl std::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceState")
            .field("roles", &self.roles())
            .finish()
    }
}

/// Builder collecting role bindings; validated all at once by [`build`](Self::build).
#[derive(Default)]
pub struct ServiceStateBuilder {
    required: Vec<String>,
    bindings: Vec<Binding>,
}

impl ServiceStateBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a role that must be bound for the build to succeed.
    pub fn require(mut self, role: impl Into<String>) -> Self {
        let role = role.into();
        if !self.required.contains(&role) {
            self.required.push(role);
        }
        self
    }

    /// Binds `handle` to `role`.
    pub fn bind<T>(mut self, role: impl Into<String>, handle: Arc<T>) -> Self
    where
        T: Collaborator,
    {
        let any: Arc<dyn Any + Send + Sync> = handle.clone();
        let lifecycle: Arc<dyn Collaborator> = handle;
        self.bindings.push(Binding {
            role: role.into(),
            handle: any,
            lifecycle,
        });
        self
    }

    /// Validates the bindings and produces the immutable state.
    ///
    /// Fails with [`ErrorKind::Validation`] when:
    /// - a role name is empty;
    /// - a role is bound twice;
    /// - a required role is missing.
    pub fn build(self) -> Result<ServiceState, ErrorKind> {
        for (idx, binding) in self.bindings.iter().enumerate() {
            if binding.role.trim().is_empty() {
                return Err(ErrorKind::validation("collaborator role name is empty"));
            }
            if self.bindings[..idx].iter().any(|b| b.role == binding.role) {
                return Err(ErrorKind::validation(format!(
                    "collaborator role '{}' bound more than once",
                    binding.role
                )));
            }
        }

        if let Some(missing) = self
            .required
            .iter()
            .find(|role| !self.bindings.iter().any(|b| &b.role == *role))
        {
            return Err(ErrorKind::validation(format!(
                "missing required collaborator role '{missing}'"
            )));
        }

        Ok(ServiceState {
            bindings: self.bindings,
        })
    }
}
