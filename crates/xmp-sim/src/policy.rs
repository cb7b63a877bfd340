//! The policy library (`spec.md` §4.5, §4.6, §9). Policies are named enum
//! variants dispatched by a match, not first-class closures -- so a
//! diagnostic or a topology dump can name the policy a GPC/AXC is running,
//! per the "pass policy references by identity" design note.

use xmp_engine::{ActorCtx, QueueId};

use crate::request::MultiPhaseReq;

/// `queue_choose_fn` (`spec.md` §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueChoosePolicy {
    /// Return the smallest index whose queue is non-empty, else -1.
    FirstNonEmpty,
    /// Always -1: defer entirely to the multi-queue blocking select,
    /// letting index order imply priority.
    StrictByIndex,
}

impl QueueChoosePolicy {
    /// Returns an index into `in_queues`, or `-1` meaning "use
    /// `ReadInQueues()`".
    pub fn choose(&self, ctx: &ActorCtx<'_, MultiPhaseReq>, in_queues: &[QueueId]) -> i64 {
        match self {
            QueueChoosePolicy::StrictByIndex => -1,
            QueueChoosePolicy::FirstNonEmpty => {
                for (i, &q) in in_queues.iter().enumerate() {
                    if ctx.queue_len(q) > 0 {
                        return i as i64;
                    }
                }
                -1
            }
        }
    }
}

/// `forward_fn` for a GPC (`spec.md` §4.5). Carries whatever per-call state
/// a policy needs (`round-robin`'s `last_out_queue`) as explicit arguments
/// rather than hidden closure captures, so the state survives across the
/// GPC's repeated phase-loop iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpcForwardPolicy {
    TryAxcoreThenFallback,
    BlockUntilAccepts,
    RoundRobinWithFallback,
}

impl GpcForwardPolicy {
    /// Returns an output-queue index to write to, or `-1` meaning
    /// "fall back to self-service".
    pub fn decide(
        &self,
        ctx: &ActorCtx<'_, MultiPhaseReq>,
        out_queues: &[QueueId],
        outbound_max: usize,
        offload_cost: f64,
        last_out_queue: &mut usize,
    ) -> i64 {
        match self {
            GpcForwardPolicy::TryAxcoreThenFallback => match out_queues.first() {
                Some(&q) if ctx.queue_len(q) < outbound_max => 0,
                // No AXC wired (or it's full): fall back to self-service.
                _ => -1,
            },
            GpcForwardPolicy::BlockUntilAccepts => match out_queues.first() {
                Some(&q) => {
                    while ctx.queue_len(q) >= outbound_max {
                        ctx.wait(offload_cost);
                    }
                    0
                }
                // Nothing to offload to; this policy never returns -1 when
                // an out-queue exists, but a no-AXC topology still must not
                // panic -- fall back to self-service instead of blocking
                // forever on a queue that doesn't exist.
                None => -1,
            },
            GpcForwardPolicy::RoundRobinWithFallback => {
                let n = out_queues.len();
                for _ in 0..n {
                    *last_out_queue = (*last_out_queue + 1) % n;
                    if ctx.queue_len(out_queues[*last_out_queue]) < outbound_max {
                        return *last_out_queue as i64;
                    }
                    ctx.wait(offload_cost);
                }
                -1
            }
        }
    }
}

/// `forward_fn` for an AXC (`spec.md` §4.6). Flat form: `(out_queues, req)
/// -> index`; unlike the GPC form it never needs actor-local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxcForwardPolicy {
    ToCentralizedPost,
    ToCentralizedPre,
    ToOffloader,
    /// Return-to-sender with a +2 offset, for topologies (T5) whose output
    /// layout reserves indices 0 and 1 for centralized queues.
    ToOffloaderThreePhase,
}

impl AxcForwardPolicy {
    pub fn decide(&self, req: &MultiPhaseReq) -> usize {
        match self {
            AxcForwardPolicy::ToCentralizedPost => 0,
            AxcForwardPolicy::ToCentralizedPre => 1,
            AxcForwardPolicy::ToOffloader => req
                .last_gpc_idx
                .expect("to-offloader forwarding requires a GPC to have touched this request first")
                .0 as usize,
            AxcForwardPolicy::ToOffloaderThreePhase => {
                req.last_gpc_idx
                    .expect("to-offloader forwarding requires a GPC to have touched this request first")
                    .0 as usize
                    + 2
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmp_common::GpcId;

    fn req_with_last_gpc(idx: u32) -> MultiPhaseReq {
        let mut r = crate::request::simple_req(0.0, 1.0, xmp_common::DeviceSet::processor());
        r.last_gpc_idx = Some(GpcId(idx));
        r
    }

    #[test]
    fn to_offloader_returns_last_gpc_index() {
        let r = req_with_last_gpc(3);
        assert_eq!(AxcForwardPolicy::ToOffloader.decide(&r), 3);
    }

    #[test]
    #[should_panic(expected = "to-offloader forwarding requires")]
    fn to_offloader_panics_without_a_prior_gpc() {
        let r = crate::request::simple_req(0.0, 1.0, xmp_common::DeviceSet::processor());
        AxcForwardPolicy::ToOffloader.decide(&r);
    }

    #[test]
    fn to_offloader_three_phase_adds_two() {
        let r = req_with_last_gpc(1);
        assert_eq!(AxcForwardPolicy::ToOffloaderThreePhase.decide(&r), 3);
    }

    #[test]
    fn centralized_policies_are_fixed_indices() {
        let r = req_with_last_gpc(0);
        assert_eq!(AxcForwardPolicy::ToCentralizedPost.decide(&r), 0);
        assert_eq!(AxcForwardPolicy::ToCentralizedPre.decide(&r), 1);
    }
}
