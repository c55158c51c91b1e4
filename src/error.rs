//! Error taxonomy shared by every component of the runtime core.
//!
//! [`ErrorKind`] is the only failure type that crosses a component boundary:
//! collaborators, work units and the supervisor all report through it.
//!
//! - [`ErrorKind::Validation`]: caller input rejected before any side effect.
//! - [`ErrorKind::Unavailable`]: a collaborator (or the supervisor itself) refuses work.
//! - [`ErrorKind::Cancelled`]: a shutdown/cancellation signal was observed.
//! - [`ErrorKind::Timeout`]: a caller-configured deadline elapsed.
//! - [`ErrorKind::Internal`]: programming errors and unexpected collaborator failures.
//!
//! Untyped lower-level failures are converted with [`ErrorKind::wrap`] at the point
//! where they enter the core.

use std::time::Duration;
use thiserror::Error;

/// # Failure kinds surfaced across component boundaries.
///
/// `Internal` may carry one prior kind for diagnostics. Chains are bounded to a
/// single level: when a prior kind is itself chained, its cause is dropped.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-supplied input was rejected; nothing was changed.
    #[error("validation failed: {detail}")]
    Validation {
        /// What was wrong with the input.
        detail: String,
    },

    /// A collaborator could not be reached or is refusing work.
    ///
    /// The supervisor reports itself as role `"supervisor"` once draining has begun.
    #[error("collaborator unavailable: {role}")]
    Unavailable {
        /// Role name of the unavailable collaborator.
        role: String,
    },

    /// Work stopped because cancellation was observed.
    #[error("cancelled")]
    Cancelled,

    /// A caller-configured deadline elapsed before completion.
    #[error("timed out after {elapsed:?}")]
    Timeout {
        /// How long the operation ran before the deadline fired.
        elapsed: Duration,
    },

    /// Unexpected failure; carries enough context to be logged as-is.
    #[error("internal error in {role}: {message}")]
    Internal {
        /// Role (collaborator or unit name) where the failure surfaced.
        role: String,
        /// Underlying message.
        message: String,
        /// Optional prior kind (at most one level deep).
        cause: Option<Box<ErrorKind>>,
    },
}

impl ErrorKind {
    /// Builds a [`ErrorKind::Validation`].
    pub fn validation(detail: impl Into<String>) -> Self {
        ErrorKind::Validation {
            detail: detail.into(),
        }
    }

    /// Builds a [`ErrorKind::Unavailable`] for the given role.
    pub fn unavailable(role: impl Into<String>) -> Self {
        ErrorKind::Unavailable { role: role.into() }
    }

    /// Builds an [`ErrorKind::Internal`] without a prior cause.
    pub fn internal(role: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorKind::Internal {
            role: role.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Builds an [`ErrorKind::Internal`] chained to a prior kind.
    ///
    /// The chain never grows past one level: if `prior` is an `Internal` with its own
    /// cause, that inner cause is discarded.
    ///
    /// # Example
    /// ```
    /// use servicecore::ErrorKind;
    ///
    /// let first = ErrorKind::internal_caused_by("storage", "read", ErrorKind::Cancelled);
    /// let second = ErrorKind::internal_caused_by("api", "handler", first);
    /// assert_eq!(second.chain_depth(), 1);
    /// ```
    pub fn internal_caused_by(
        role: impl Into<String>,
        message: impl Into<String>,
        prior: ErrorKind,
    ) -> Self {
        ErrorKind::Internal {
            role: role.into(),
            message: message.into(),
            cause: Some(Box::new(prior.without_cause())),
        }
    }

    /// Converts an untyped error into [`ErrorKind::Internal`] at a boundary.
    pub fn wrap<E>(role: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error,
    {
        ErrorKind::internal(role, err.to_string())
    }

    /// Returns the prior kind of an `Internal`, if any.
    pub fn cause(&self) -> Option<&ErrorKind> {
        match self {
            ErrorKind::Internal { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }

    /// Number of chained prior kinds (0 or 1).
    pub fn chain_depth(&self) -> usize {
        let mut depth = 0;
        let mut cur = self.cause();
        while let Some(next) = cur {
            depth += 1;
            cur = next.cause();
        }
        depth
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servicecore::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::Cancelled.as_label(), "cancelled");
    /// assert_eq!(ErrorKind::unavailable("storage").as_label(), "unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorKind::Validation { .. } => "validation",
            ErrorKind::Unavailable { .. } => "unavailable",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Timeout { .. } => "timeout",
            ErrorKind::Internal { .. } => "internal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ErrorKind::Validation { detail } => format!("invalid input: {detail}"),
            ErrorKind::Unavailable { role } => format!("{role} unavailable"),
            ErrorKind::Cancelled => "cancelled".to_string(),
            ErrorKind::Timeout { elapsed } => format!("timeout after {elapsed:?}"),
            ErrorKind::Internal {
                role,
                message,
                cause: Some(prior),
            } => format!("{role}: {message} (caused by {})", prior.as_label()),
            ErrorKind::Internal { role, message, .. } => format!("{role}: {message}"),
        }
    }

    /// Indicates whether a higher layer may reasonably retry.
    ///
    /// Returns `true` for [`ErrorKind::Unavailable`] and [`ErrorKind::Timeout`].
    /// The core itself never retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::Unavailable { .. } | ErrorKind::Timeout { .. }
        )
    }

    /// Returns `true` for [`ErrorKind::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ErrorKind::Cancelled)
    }

    fn without_cause(self) -> Self {
        match self {
            ErrorKind::Internal { role, message, .. } => ErrorKind::Internal {
                role,
                message,
                cause: None,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_is_bounded_to_one_level() {
        let inner = ErrorKind::internal_caused_by("db", "pool", ErrorKind::unavailable("db"));
        assert_eq!(inner.chain_depth(), 1);

        let outer = ErrorKind::internal_caused_by("api", "handler", inner);
        assert_eq!(outer.chain_depth(), 1);
        match outer.cause() {
            Some(ErrorKind::Internal { role, cause, .. }) => {
                assert_eq!(role, "db");
                assert!(cause.is_none());
            }
            other => panic!("unexpected cause: {other:?}"),
        }
    }

    #[test]
    fn wrap_keeps_role_and_message() {
        let io = std::io::Error::other("connection reset");
        let err = ErrorKind::wrap("notifier", io);
        assert_eq!(
            err,
            ErrorKind::internal("notifier", "connection reset"),
        );
        assert_eq!(err.to_string(), "internal error in notifier: connection reset");
    }

    #[test]
    fn transient_kinds() {
        assert!(ErrorKind::unavailable("x").is_transient());
        assert!(
            ErrorKind::Timeout {
                elapsed: Duration::from_millis(5)
            }
            .is_transient()
        );
        assert!(!ErrorKind::Cancelled.is_transient());
        assert!(!ErrorKind::validation("bad").is_transient());
        assert!(!ErrorKind::internal("x", "y").is_transient());
    }

    #[test]
    fn message_mentions_cause_label() {
        let err = ErrorKind::internal_caused_by("api", "lookup", ErrorKind::Cancelled);
        assert_eq!(err.as_message(), "api: lookup (caused by cancelled)");
    }
}
