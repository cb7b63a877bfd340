//! Generator actor body (`spec.md` §4.4): no input queues, one output
//! queue, loops forever sampling an inter-arrival gap and pushing a freshly
//! created request.

use rand::rngs::StdRng;

use xmp_engine::{ActorCtx, QueueId};

use crate::dist::GenDist;
use crate::request::MultiPhaseReq;

/// Runs as an actor body: `Engine::register_actor(move |ctx| generator_body(ctx, ...))`.
///
/// `make_req` receives `(now, sampled_service_time)` and returns the
/// request to enqueue -- the creator (`SimpleReq`/two-phase/three-phase)
/// is bound by the topology builder, not here.
pub fn generator_body(
    ctx: ActorCtx<'_, MultiPhaseReq>,
    dist: GenDist,
    mut rng: StdRng,
    out_q: QueueId,
    make_req: impl Fn(f64, f64) -> MultiPhaseReq,
) {
    loop {
        let tau = dist.interarrival.sample(&mut rng);
        ctx.wait(tau);
        let now = ctx.now();
        let service_time = dist.service.sample(&mut rng);
        let req = make_req(now, service_time);
        ctx.write_queue(out_q, req);
    }
}
