//! Error types.
//!
//! Nothing in the core is retried: every operation is synchronous and
//! deterministic, so an error means the element tree or the host surface
//! is wrong. Errors abort the render cycle in flight and leave the last
//! committed tree in place.

use thiserror::Error;

use crate::types::HostNode;

/// Failure reported by a host surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("unknown host node {0}")]
    UnknownNode(HostNode),

    #[error("host rejected creation of `{0}`")]
    CreateRejected(String),

    #[error("host node {child} is not a child of {parent}")]
    NotAChild { parent: HostNode, child: HostNode },
}

/// Failure of a render cycle.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A fiber reached commit in a shape that cannot be applied.
    #[error("malformed fiber tree: {0}")]
    MalformedTree(String),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("no host surface installed")]
    HostNotInstalled,

    /// A runtime entry point was called while the runtime was busy
    /// (e.g. from a component render function).
    #[error("render runtime entered re-entrantly")]
    Reentrant,
}
