//! # Collaborator contract.
//!
//! A collaborator is any handle the runtime injects into [`ServiceState`](crate::ServiceState):
//! a storage client, a notification client, a cache. The core only needs to be able to
//! start and stop it; everything else is whatever operations the work units call.
//!
//! Handles are shared by reference across all running units, so they must do their own
//! internal synchronization.

use async_trait::async_trait;

use crate::error::ErrorKind;

/// Lifecycle contract for an injected collaborator handle.
///
/// Both hooks default to a no-op. Failures should be reported as
/// [`ErrorKind::Unavailable`] or [`ErrorKind::Internal`].
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use servicecore::{Collaborator, ErrorKind};
///
/// struct Storage;
///
/// #[async_trait]
/// impl Collaborator for Storage {
///     async fn start(&self) -> Result<(), ErrorKind> {
///         // open pool...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Collaborator: Send + Sync + 'static {
    /// Brings the collaborator into a usable state.
    async fn start(&self) -> Result<(), ErrorKind> {
        Ok(())
    }

    /// Releases the collaborator's resources.
    async fn stop(&self) -> Result<(), ErrorKind> {
        Ok(())
    }
}
