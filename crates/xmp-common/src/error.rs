//! The fatal diagnostic taxonomy (`spec.md` §7).
//!
//! All four kinds are programming-error invariants, never recoverable at
//! runtime. Modeled the way the teacher models `LexError`/`LexErrorKind` in
//! `mesh-common`: a plain enum with a hand-written `Display`, rather than
//! reaching for `thiserror` (the teacher workspace depends on neither
//! `thiserror` nor `anyhow` anywhere).

use std::fmt;

use crate::ids::{ActorId, ActorKind};

/// A fatal simulator error, carrying enough context to name the offending
/// actor and reconstruct the request state that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimError {
    pub kind: SimErrorKind,
}

impl SimError {
    pub fn new(kind: SimErrorKind) -> Self {
        SimError { kind }
    }
}

/// The specific kind of fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimErrorKind {
    /// An actor dequeued a request it cannot handle.
    TypeMismatch { actor: ActorId, kind: ActorKind },
    /// The current phase's permitted-device set does not include the
    /// dequeuing actor's class.
    DeviceMismatch {
        actor: ActorId,
        kind: ActorKind,
        phase_index: usize,
        permitted: String,
    },
    /// An AXC incremented `current` past the last phase.
    TerminalFromAccelerator { actor: ActorId },
    /// A topology could not be constructed as configured.
    TopologyMalformed { reason: String },
}

impl fmt::Display for SimErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimErrorKind::TypeMismatch { actor, kind } => {
                write!(f, "{kind} {actor}: dequeued a request it cannot handle")
            }
            SimErrorKind::DeviceMismatch {
                actor,
                kind,
                phase_index,
                permitted,
            } => write!(
                f,
                "{kind} {actor}: phase {phase_index} permits only {{{permitted}}}, \
                 which does not include this actor's device class"
            ),
            SimErrorKind::TerminalFromAccelerator { actor } => write!(
                f,
                "AXC {actor}: incremented past the last phase -- accelerators may never terminate a request"
            ),
            SimErrorKind::TopologyMalformed { reason } => {
                write!(f, "topology malformed: {reason}")
            }
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for SimError {}
