//! Arena handles. Queues and actors live in engine-owned arenas and are
//! referenced by index rather than by shared pointer, so a GPC's output
//! queue and an AXC's input queue can name the same queue without either
//! of them owning it (`spec.md` §9's "Shared queues" design note).

use std::fmt;

/// Index into the engine's actor arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Index into the engine's queue arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(pub u32);

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue#{}", self.0)
    }
}

/// A GPC's position among *only* the GPCs in a topology (0-based,
/// contiguous), distinct from its `ActorId` in the engine's global actor
/// arena. Generators and AXCs occupy `ActorId` slots too, so `ActorId` is
/// never dense over GPCs alone; to-offloader forwarding needs a dense
/// index to use directly into an AXC's `out_queues`, which is what this
/// type supplies (`spec.md` §4.5's "gpc_idx (identity)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpcId(pub u32);

impl fmt::Display for GpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpc#{}", self.0)
    }
}

/// The kind of actor, kept alongside `ActorId` purely for diagnostics —
/// error messages should say "GPC 2" rather than "actor#2".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Generator,
    Gpc,
    Axc,
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorKind::Generator => write!(f, "Generator"),
            ActorKind::Gpc => write!(f, "GPC"),
            ActorKind::Axc => write!(f, "AXC"),
        }
    }
}
