//! Virtual-time event loop and coroutine-based actor primitives.
//!
//! This crate knows nothing about requests, phases, or topologies -- it
//! only knows how to move a clock forward, hand queued items of some
//! generic `T` between coroutines, and suspend/resume those coroutines at
//! the right virtual times. `xmp-sim` builds the domain model on top of it.

pub mod actor;
pub mod clock;
pub mod core;
pub mod engine;
pub mod queue;

pub use actor::{ActorCtx, Suspend};
pub use core::SimCore;
pub use engine::Engine;
pub use xmp_common::{ActorId, QueueId};
