//! AXC actor body (`spec.md` §4.6): serve exactly one accelerator phase per
//! dequeue, apply speedup, then forward by policy. Never terminates a
//! request.

use log::{debug, error};
use xmp_common::{ActorKind, Device, SimError, SimErrorKind};
use xmp_engine::{ActorCtx, QueueId};

use crate::policy::AxcForwardPolicy;
use crate::request::MultiPhaseReq;

pub struct AxcConfig {
    pub in_queue: QueueId,
    pub out_queues: Vec<QueueId>,
    pub forward: AxcForwardPolicy,
    pub speedup: f64,
}

fn fatal(err: SimErrorKind) -> ! {
    let e = SimError::new(err);
    error!("{e}");
    panic!("{e}");
}

/// Runs as an actor body: `Engine::register_actor(move |ctx| axc_body(ctx, cfg))`.
pub fn axc_body(ctx: ActorCtx<'_, MultiPhaseReq>, cfg: AxcConfig) {
    let axc_idx = ctx.id();
    debug_assert!(cfg.speedup > 0.0, "speedup must be positive");

    loop {
        let mut req = ctx.read_queue(cfg.in_queue);

        let cur = req.current;
        let phase = req.phases[cur];
        if !phase.devices.contains(Device::Accelerator) {
            fatal(SimErrorKind::DeviceMismatch {
                actor: axc_idx,
                kind: ActorKind::Axc,
                phase_index: cur,
                permitted: phase.devices.to_string(),
            });
        }

        debug!(
            "AXC {axc_idx} serving phase {cur} for {} units (speedup {})",
            phase.service_time, cfg.speedup
        );
        ctx.wait(phase.service_time / cfg.speedup);

        req.current += 1;
        if req.is_terminated() {
            fatal(SimErrorKind::TerminalFromAccelerator { actor: axc_idx });
        }

        let idx = cfg.forward.decide(&req);
        ctx.write_queue(cfg.out_queues[idx], req);
    }
}
