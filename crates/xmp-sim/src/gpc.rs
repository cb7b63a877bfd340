//! GPC actor body (`spec.md` §4.5): dequeue, serve consecutive
//! Processor-permitted phases, then either terminate, offload, or fall
//! back to self-service.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error};
use xmp_common::{ActorKind, Device, GpcId, SimError, SimErrorKind};
use xmp_engine::{ActorCtx, QueueId};

use crate::policy::{GpcForwardPolicy, QueueChoosePolicy};
use crate::request::MultiPhaseReq;
use crate::sink::TerminationSink;

pub struct GpcConfig {
    pub in_queues: Vec<QueueId>,
    pub out_queues: Vec<QueueId>,
    pub queue_choose: QueueChoosePolicy,
    pub forward: GpcForwardPolicy,
    pub outbound_max: usize,
    pub offload_cost: f64,
    pub sink: Rc<RefCell<dyn TerminationSink>>,
    /// This GPC's dense identity among the topology's GPCs, stamped onto
    /// every request as `last_gpc_idx` -- distinct from its engine-wide
    /// `ActorId`, which is not dense over GPCs alone (`spec.md` §4.5).
    pub gpc_idx: GpcId,
}

fn fatal(err: SimErrorKind) -> ! {
    let e = SimError::new(err);
    error!("{e}");
    panic!("{e}");
}

/// Runs as an actor body: `Engine::register_actor(move |ctx| gpc_body(ctx, cfg))`.
/// This GPC's own id (read from `ctx`) is stamped onto every request it
/// services as `last_gpc_idx`.
pub fn gpc_body(ctx: ActorCtx<'_, MultiPhaseReq>, cfg: GpcConfig) {
    let actor_id = ctx.id();
    let gpc_idx = cfg.gpc_idx;
    let mut last_out_queue: usize = 0;

    'dispatch: loop {
        let i = cfg.queue_choose.choose(&ctx, &cfg.in_queues);
        let mut req = if i < 0 {
            ctx.read_any(&cfg.in_queues).0
        } else {
            ctx.read_queue(cfg.in_queues[i as usize])
        };

        let mut cur = req.current;
        'phase: loop {
            let phase = req.phases[cur];
            if !phase.devices.contains(Device::Processor) {
                fatal(SimErrorKind::DeviceMismatch {
                    actor: actor_id,
                    kind: ActorKind::Gpc,
                    phase_index: cur,
                    permitted: phase.devices.to_string(),
                });
            }

            debug!("GPC {gpc_idx} serving phase {cur} for {} units", phase.service_time);
            ctx.wait(phase.service_time);

            req.current += 1;
            req.last_gpc_idx = Some(gpc_idx);

            if req.is_terminated() {
                let now = ctx.now();
                let delay = req.delay(now);
                cfg.sink.borrow_mut().record(delay, now);
                continue 'dispatch;
            }

            let idx = cfg.forward.decide(
                &ctx,
                &cfg.out_queues,
                cfg.outbound_max,
                cfg.offload_cost,
                &mut last_out_queue,
            );

            if idx < 0 {
                cur = req.current;
                continue 'phase;
            }

            ctx.wait(cfg.offload_cost);
            ctx.write_queue(cfg.out_queues[idx as usize], req);
            continue 'dispatch;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use xmp_common::DeviceSet;
    use xmp_engine::Engine;

    use super::*;
    use crate::request::two_phase_req;
    use crate::sink::SummarySink;

    /// No AXC wired (`out_queues: vec![]`) must fall back to self-service
    /// rather than panic on an empty out-queues slice, for both offload
    /// policies that index `out_queues[0]`.
    fn runs_to_termination_with_no_out_queues(forward: GpcForwardPolicy) {
        let mut engine: Engine<MultiPhaseReq> = Engine::new();
        let q = engine.core().borrow_mut().add_queue();
        let sink: Rc<RefCell<SummarySink>> = Rc::new(RefCell::new(SummarySink::new()));
        let sink_handle = sink.clone();

        engine.register_actor(move |ctx| {
            gpc_body(
                ctx,
                GpcConfig {
                    in_queues: vec![q],
                    out_queues: vec![],
                    queue_choose: QueueChoosePolicy::FirstNonEmpty,
                    forward,
                    outbound_max: 0,
                    offload_cost: 1.0,
                    sink: sink_handle,
                    gpc_idx: GpcId(0),
                },
            )
        });

        engine.core().borrow_mut().push_and_wake(
            q,
            two_phase_req(0.0, 5.0, [DeviceSet::processor(), DeviceSet::processor()]),
        );

        engine.run(100.0);

        assert_eq!(sink.borrow().count(), 1, "request must self-service both phases and terminate");
    }

    #[test]
    fn try_axcore_then_fallback_degrades_to_self_service_with_no_axc() {
        runs_to_termination_with_no_out_queues(GpcForwardPolicy::TryAxcoreThenFallback);
    }

    #[test]
    fn block_until_accepts_degrades_to_self_service_with_no_axc() {
        runs_to_termination_with_no_out_queues(GpcForwardPolicy::BlockUntilAccepts);
    }
}
