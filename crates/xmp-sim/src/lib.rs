//! The domain model: phases/requests, generator distributions, GPC/AXC
//! actor bodies, the policy library, the termination sink, and the
//! topology builder. Built on top of `xmp-engine`'s generic virtual-time
//! primitives.

pub mod axc;
pub mod dist;
pub mod generator;
pub mod gpc;
pub mod policy;
pub mod request;
pub mod sink;
pub mod topology;

pub use request::MultiPhaseReq;
pub use sink::{SummarySink, TerminationSink};
pub use topology::{Topology, TopologyConfig};
