//! Declarative wiring of queues, actors, and policies per named experiment
//! (`spec.md` §2 "TopologyBuilder", §6 "Topologies", §9's arena-indexed
//! shared-queue design note).
//!
//! `TopologyBuilder::add_gpc`/`add_axc`/`add_generator` each spawn and
//! register an actor in one atomic call, so there is no code path that
//! builds an actor without registering it with the engine (resolving
//! `spec.md` §9's `fallback_chained_cores_single_queue_three_phase` open
//! question by construction rather than by a runtime check).

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use xmp_common::{ActorId, DeviceSet, GpcId, SimError, SimErrorKind};
use xmp_engine::{Engine, QueueId};

use crate::axc::{axc_body, AxcConfig};
use crate::dist::{GenDist, GenType};
use crate::generator::generator_body;
use crate::gpc::{gpc_body, GpcConfig};
use crate::policy::{AxcForwardPolicy, GpcForwardPolicy, QueueChoosePolicy};
use crate::request::{Phase, MultiPhaseReq, DEFERRED_INIT_TIME};
use crate::sink::SummarySink;

/// Everything a `build_t*` function needs, assembled from §6's CLI flags.
#[derive(Debug, Clone)]
pub struct TopologyConfig {
    pub lambda: f64,
    pub mu: f64,
    pub gen_type: u32,
    pub buffersize: usize,
    pub num_cores: usize,
    pub num_accelerators: usize,
    pub phase_one_ratio: f64,
    pub phase_two_ratio: f64,
    pub phase_three_ratio: f64,
    pub speedup: f64,
    pub gpcore_offload_style: u32,
    pub axcore_notify_recipient: u32,
    pub gpcore_input_queue_selector: u32,
    /// Not named in `spec.md` §6's flag list but required by the concrete
    /// offload-cost scenarios in §8; defaults to 0 like the original
    /// source's unconfigured runs.
    pub offload_cost: f64,
    pub seed: u64,
    /// `Some((interarrival, service))` forces the fully-deterministic `DD`
    /// generator used by §8's concrete scenarios, bypassing `--genType`.
    pub deterministic: Option<(f64, f64)>,
}

fn gpc_forward_policy(cfg: &TopologyConfig) -> GpcForwardPolicy {
    match cfg.gpcore_offload_style {
        0 => GpcForwardPolicy::TryAxcoreThenFallback,
        1 => GpcForwardPolicy::BlockUntilAccepts,
        _ => GpcForwardPolicy::RoundRobinWithFallback,
    }
}

fn gpc_choose_policy(cfg: &TopologyConfig) -> QueueChoosePolicy {
    match cfg.gpcore_input_queue_selector {
        0 => QueueChoosePolicy::FirstNonEmpty,
        _ => QueueChoosePolicy::StrictByIndex,
    }
}

fn axc_forward_policy(cfg: &TopologyConfig) -> AxcForwardPolicy {
    match cfg.axcore_notify_recipient {
        0 => AxcForwardPolicy::ToCentralizedPost,
        1 => AxcForwardPolicy::ToCentralizedPre,
        _ => AxcForwardPolicy::ToOffloaderThreePhase,
    }
}

fn gen_type(cfg: &TopologyConfig) -> GenType {
    if let Some((interarrival, service)) = cfg.deterministic {
        return GenType::Dd { interarrival, service };
    }
    match cfg.gen_type {
        0 => GenType::Mm { lambda: cfg.lambda, mu: cfg.mu },
        1 => GenType::Md { lambda: cfg.lambda, mu: cfg.mu },
        2 => GenType::MbA { lambda: cfg.lambda, mu: cfg.mu },
        _ => GenType::MbB { lambda: cfg.lambda, mu: cfg.mu },
    }
}

/// The bundle a CLI harness needs after `build_t*`: a ready-to-run engine
/// plus a handle to read statistics back out once `run()` returns.
pub struct Topology {
    pub engine: Engine<MultiPhaseReq>,
    pub sink: Rc<RefCell<SummarySink>>,
}

impl Topology {
    pub fn run(&mut self, duration: f64) {
        self.engine.run(duration);
    }
}

/// Builds actors and queues into one `Engine`, assigning each a fresh
/// `QueueId`/`ActorId` from the engine's arenas.
pub struct TopologyBuilder {
    engine: Engine<MultiPhaseReq>,
    sink: Rc<RefCell<SummarySink>>,
}

impl TopologyBuilder {
    fn new() -> Self {
        TopologyBuilder {
            engine: Engine::new(),
            sink: Rc::new(RefCell::new(SummarySink::new())),
        }
    }

    fn add_queue(&mut self) -> QueueId {
        self.engine.core().borrow_mut().add_queue()
    }

    fn add_generator(
        &mut self,
        dist: GenDist,
        seed: u64,
        out_q: QueueId,
        make_req: impl Fn(f64, f64) -> MultiPhaseReq + 'static,
    ) -> ActorId {
        self.engine
            .register_actor(move |ctx| generator_body(ctx, dist, StdRng::seed_from_u64(seed), out_q, make_req))
    }

    fn add_gpc(&mut self, cfg: GpcConfig) -> ActorId {
        self.engine.register_actor(move |ctx| gpc_body(ctx, cfg))
    }

    fn add_axc(&mut self, cfg: AxcConfig) -> ActorId {
        self.engine.register_actor(move |ctx| axc_body(ctx, cfg))
    }

    fn finish(self) -> Topology {
        Topology {
            engine: self.engine,
            sink: self.sink,
        }
    }
}

/// The three-phase creator shared by T1–T5: `[Processor, Processor|Accelerator, Processor]`.
/// The middle phase permits both device classes so a GPC forward policy
/// that returns fallback (`-1`) can self-service it, matching §8 scenario 4.
fn three_phase_make_req(cfg: &TopologyConfig) -> impl Fn(f64, f64) -> MultiPhaseReq {
    let ratios = (cfg.phase_one_ratio, cfg.phase_two_ratio, cfg.phase_three_ratio);
    move |now, service_time| {
        crate::request::three_phase_req(
            now,
            service_time,
            ratios,
            [DeviceSet::processor(), DeviceSet::both(), DeviceSet::processor()],
        )
    }
}

/// T0's three-phase creator: `[Processor(S), Processor|Accelerator(S), Processor(0)]`.
/// The trailing zero-cost Processor-only phase lets a terminal GPC observe
/// termination without violating the rule that an AXC may never be the
/// actor that increments `current` to `len(phases)` (`spec.md` §4.6 step 4).
fn t0_make_req() -> impl Fn(f64, f64) -> MultiPhaseReq {
    move |now, service_time| {
        MultiPhaseReq::new(vec![
            Phase {
                init_time: now,
                service_time,
                devices: DeviceSet::processor(),
            },
            Phase {
                init_time: DEFERRED_INIT_TIME,
                service_time,
                devices: DeviceSet::both(),
            },
            Phase {
                init_time: DEFERRED_INIT_TIME,
                service_time: 0.0,
                devices: DeviceSet::processor(),
            },
        ])
    }
}

/// T0: chained deterministic 2-phase GPC -> AXC, plus a terminal drain GPC.
pub fn build_t0(cfg: &TopologyConfig) -> Result<Topology, SimError> {
    let mut b = TopologyBuilder::new();
    let arrival_q = b.add_queue();
    let ax_q = b.add_queue();
    let post_q = b.add_queue();

    b.add_generator(GenDist::from_gen_type(gen_type(cfg)), cfg.seed, arrival_q, t0_make_req());

    b.add_gpc(GpcConfig {
        in_queues: vec![arrival_q],
        out_queues: vec![ax_q],
        queue_choose: gpc_choose_policy(cfg),
        forward: GpcForwardPolicy::TryAxcoreThenFallback,
        outbound_max: cfg.buffersize,
        offload_cost: cfg.offload_cost,
        sink: b.sink.clone(),
        gpc_idx: GpcId(0),
    });

    b.add_axc(AxcConfig {
        in_queue: ax_q,
        out_queues: vec![post_q],
        forward: AxcForwardPolicy::ToCentralizedPost,
        speedup: cfg.speedup,
    });

    b.add_gpc(GpcConfig {
        in_queues: vec![post_q],
        out_queues: vec![],
        queue_choose: QueueChoosePolicy::FirstNonEmpty,
        forward: GpcForwardPolicy::TryAxcoreThenFallback,
        outbound_max: 0,
        offload_cost: 0.0,
        sink: b.sink.clone(),
        gpc_idx: GpcId(1),
    });

    Ok(b.finish())
}

/// T1: single GPC + single AXC, 3-phase, with return-to-sender.
pub fn build_t1(cfg: &TopologyConfig) -> Result<Topology, SimError> {
    let mut b = TopologyBuilder::new();
    let arrival_q = b.add_queue();
    let post_q = b.add_queue();
    let ax_q = b.add_queue();

    b.add_generator(
        GenDist::from_gen_type(gen_type(cfg)),
        cfg.seed,
        arrival_q,
        three_phase_make_req(cfg),
    );

    let gpc = b.add_gpc(GpcConfig {
        in_queues: vec![post_q, arrival_q],
        out_queues: vec![ax_q],
        queue_choose: gpc_choose_policy(cfg),
        forward: gpc_forward_policy(cfg),
        outbound_max: cfg.buffersize,
        offload_cost: cfg.offload_cost,
        sink: b.sink.clone(),
        gpc_idx: GpcId(0),
    });
    let _ = gpc;

    b.add_axc(AxcConfig {
        in_queue: ax_q,
        out_queues: vec![post_q],
        forward: AxcForwardPolicy::ToOffloader,
        speedup: cfg.speedup,
    });

    Ok(b.finish())
}

/// T2: clustered. `num_accelerators` clusters, each with
/// `num_cores / num_accelerators` GPCs; one arrival queue shared globally
/// across every GPC in every cluster (confirmed against the original
/// source's `fallback_multi_gpcore_axcore_three_phase`, which calls
/// `AddOutQueue` on the arrival queue once, outside the cluster loop);
/// one `ax_q` per cluster; one post-queue per GPC.
pub fn build_t2(cfg: &TopologyConfig) -> Result<Topology, SimError> {
    if cfg.num_accelerators == 0 || cfg.num_cores % cfg.num_accelerators != 0 {
        return Err(SimError::new(SimErrorKind::TopologyMalformed {
            reason: "num_cores must be divisible by num_accelerators".to_string(),
        }));
    }
    let gpcs_per_cluster = cfg.num_cores / cfg.num_accelerators;

    let mut b = TopologyBuilder::new();
    let arrival_q = b.add_queue();

    b.add_generator(
        GenDist::from_gen_type(gen_type(cfg)),
        cfg.seed,
        arrival_q,
        three_phase_make_req(cfg),
    );

    // Every GPC across every cluster, in registration order, so ids are
    // contiguous 0..num_cores and can be used directly as an AXC
    // out-queue index (`to-offloader`).
    let mut post_qs: Vec<QueueId> = Vec::with_capacity(cfg.num_cores);
    let mut ax_qs: Vec<QueueId> = Vec::with_capacity(cfg.num_accelerators);
    for _ in 0..cfg.num_accelerators {
        ax_qs.push(b.add_queue());
    }
    let mut next_gpc_idx: u32 = 0;
    for cluster in 0..cfg.num_accelerators {
        let ax_q = ax_qs[cluster];
        for _ in 0..gpcs_per_cluster {
            let post_q = b.add_queue();
            post_qs.push(post_q);
            b.add_gpc(GpcConfig {
                in_queues: vec![post_q, arrival_q],
                out_queues: vec![ax_q],
                queue_choose: gpc_choose_policy(cfg),
                forward: gpc_forward_policy(cfg),
                outbound_max: cfg.buffersize,
                offload_cost: cfg.offload_cost,
                sink: b.sink.clone(),
                gpc_idx: GpcId(next_gpc_idx),
            });
            next_gpc_idx += 1;
        }
    }

    // Each AXC's out_queues is sized to cover every GPC id globally so
    // `to-offloader`'s `last_gpc_idx` can be used as a direct index; slots
    // outside this AXC's own cluster are never indexed (return-to-sender
    // only ever names a GPC that fed this AXC's `ax_q`) but must still be
    // populated with a valid `QueueId` to keep the vec well-formed.
    for cluster in 0..cfg.num_accelerators {
        let ax_q = ax_qs[cluster];
        let cluster_start = cluster * gpcs_per_cluster;
        let cluster_end = cluster_start + gpcs_per_cluster;
        let out_queues: Vec<QueueId> = (0..cfg.num_cores)
            .map(|g| {
                if g >= cluster_start && g < cluster_end {
                    post_qs[g]
                } else {
                    post_qs[cluster_start]
                }
            })
            .collect();
        b.add_axc(AxcConfig {
            in_queue: ax_q,
            out_queues,
            forward: AxcForwardPolicy::ToOffloader,
            speedup: cfg.speedup,
        });
    }

    Ok(b.finish())
}

/// T3: centralized post-processing. All AXCs share one `ax_q`; all AXCs
/// forward `to-centralized-post` into one shared `post_q` read by every GPC.
pub fn build_t3(cfg: &TopologyConfig) -> Result<Topology, SimError> {
    let mut b = TopologyBuilder::new();
    let arrival_q = b.add_queue();
    let ax_q = b.add_queue();
    let post_q = b.add_queue();

    b.add_generator(
        GenDist::from_gen_type(gen_type(cfg)),
        cfg.seed,
        arrival_q,
        three_phase_make_req(cfg),
    );

    for g in 0..cfg.num_cores {
        b.add_gpc(GpcConfig {
            in_queues: vec![post_q, arrival_q],
            out_queues: vec![ax_q],
            queue_choose: gpc_choose_policy(cfg),
            forward: gpc_forward_policy(cfg),
            outbound_max: cfg.buffersize,
            offload_cost: cfg.offload_cost,
            sink: b.sink.clone(),
            gpc_idx: GpcId(g as u32),
        });
    }
    for _ in 0..cfg.num_accelerators {
        b.add_axc(AxcConfig {
            in_queue: ax_q,
            out_queues: vec![post_q],
            forward: AxcForwardPolicy::ToCentralizedPost,
            speedup: cfg.speedup,
        });
    }

    Ok(b.finish())
}

/// T4: per-GPC post-queues (return-to-sender target) but a single
/// centralized AXC input queue shared by every GPC's offload traffic.
pub fn build_t4(cfg: &TopologyConfig) -> Result<Topology, SimError> {
    let mut b = TopologyBuilder::new();
    let arrival_q = b.add_queue();
    let ax_q = b.add_queue();

    b.add_generator(
        GenDist::from_gen_type(gen_type(cfg)),
        cfg.seed,
        arrival_q,
        three_phase_make_req(cfg),
    );

    let mut post_qs: Vec<QueueId> = Vec::with_capacity(cfg.num_cores);
    for g in 0..cfg.num_cores {
        let post_q = b.add_queue();
        post_qs.push(post_q);
        b.add_gpc(GpcConfig {
            in_queues: vec![post_q, arrival_q],
            out_queues: vec![ax_q],
            queue_choose: gpc_choose_policy(cfg),
            forward: gpc_forward_policy(cfg),
            outbound_max: cfg.buffersize,
            offload_cost: cfg.offload_cost,
            sink: b.sink.clone(),
            gpc_idx: GpcId(g as u32),
        });
    }
    for _ in 0..cfg.num_accelerators {
        b.add_axc(AxcConfig {
            in_queue: ax_q,
            out_queues: post_qs.clone(),
            forward: AxcForwardPolicy::ToOffloader,
            speedup: cfg.speedup,
        });
    }

    Ok(b.finish())
}

/// T5: fully parameterized three-phase network. GPC inputs
/// `[own_post_q, centralized_post_q, arrival_q]`; AXC outputs
/// `[centralized_post_q, arrival_q, gpc_0_post_q, gpc_1_post_q, ...]`, using
/// `to-offloader-three-phase`'s `last_gpc_idx + 2` offset. Each GPC
/// round-robins its offload traffic across every AXC's input queue.
pub fn build_t5(cfg: &TopologyConfig) -> Result<Topology, SimError> {
    let mut b = TopologyBuilder::new();
    let arrival_q = b.add_queue();
    let centralized_post_q = b.add_queue();

    b.add_generator(
        GenDist::from_gen_type(gen_type(cfg)),
        cfg.seed,
        arrival_q,
        three_phase_make_req(cfg),
    );

    let ax_qs: Vec<QueueId> = (0..cfg.num_accelerators).map(|_| b.add_queue()).collect();

    let mut post_qs: Vec<QueueId> = Vec::with_capacity(cfg.num_cores);
    for g in 0..cfg.num_cores {
        let post_q = b.add_queue();
        post_qs.push(post_q);
        b.add_gpc(GpcConfig {
            in_queues: vec![post_q, centralized_post_q, arrival_q],
            out_queues: ax_qs.clone(),
            queue_choose: gpc_choose_policy(cfg),
            forward: GpcForwardPolicy::RoundRobinWithFallback,
            outbound_max: cfg.buffersize,
            offload_cost: cfg.offload_cost,
            sink: b.sink.clone(),
            gpc_idx: GpcId(g as u32),
        });
    }

    for &ax_q in &ax_qs {
        let mut out_queues = vec![centralized_post_q, arrival_q];
        out_queues.extend(post_qs.iter().copied());
        b.add_axc(AxcConfig {
            in_queue: ax_q,
            out_queues,
            forward: axc_forward_policy(cfg),
            speedup: cfg.speedup,
        });
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cfg() -> TopologyConfig {
        TopologyConfig {
            lambda: 0.1,
            mu: 0.1,
            gen_type: 0,
            buffersize: 4,
            num_cores: 4,
            num_accelerators: 2,
            phase_one_ratio: 0.25,
            phase_two_ratio: 0.5,
            phase_three_ratio: 0.25,
            speedup: 2.0,
            gpcore_offload_style: 0,
            axcore_notify_recipient: 2,
            gpcore_input_queue_selector: 0,
            offload_cost: 0.0,
            seed: 1,
            deterministic: None,
        }
    }

    /// §8 scenario 1: single GPC, 2-phase, deterministic, no AXC.
    /// Built directly with `TopologyBuilder` rather than a named topology,
    /// since "no AXC" isn't one of T0-T5's shapes.
    #[test]
    fn scenario_1_single_gpc_two_phase_no_axc() {
        let mut b = TopologyBuilder::new();
        let q = b.add_queue();
        let dist = GenDist::from_gen_type(GenType::Dd {
            interarrival: 10.0,
            service: 10.0,
        });
        b.add_generator(dist, 1, q, |now, service_time| {
            crate::request::two_phase_req(now, service_time, [DeviceSet::processor(), DeviceSet::processor()])
        });
        b.add_gpc(GpcConfig {
            in_queues: vec![q],
            out_queues: vec![],
            queue_choose: QueueChoosePolicy::FirstNonEmpty,
            forward: GpcForwardPolicy::TryAxcoreThenFallback,
            outbound_max: 0,
            offload_cost: 0.0,
            sink: b.sink.clone(),
            gpc_idx: GpcId(0),
        });

        let mut topo = b.finish();
        topo.run(110.0);

        let sink = topo.sink.borrow();
        // First arrival lands at t=10 (the generator waits before its first
        // push, per the §4.4 loop order); the single GPC then saturates
        // immediately (20 units of service per 10-unit arrival gap) and
        // processes requests back-to-back at t=10+20k for k=1,2,...,
        // giving a growing queueing delay of 10+10k per request.
        assert_eq!(sink.count(), 5);
        assert_eq!(sink.min(), 20.0);
        assert_eq!(sink.max(), 60.0);
        assert_eq!(sink.last_finished_at(), 110.0);
    }

    #[test]
    fn t2_rejects_indivisible_core_count() {
        let mut cfg = base_cfg();
        cfg.num_cores = 5;
        cfg.num_accelerators = 2;
        let err = build_t2(&cfg).unwrap_err();
        assert!(matches!(err.kind, SimErrorKind::TopologyMalformed { .. }));
    }

    #[test]
    fn t0_builds_and_runs() {
        let cfg = base_cfg();
        let mut topo = build_t0(&cfg).unwrap();
        topo.run(50.0);
    }

    #[test]
    fn t5_builds_and_runs() {
        let cfg = base_cfg();
        let mut topo = build_t5(&cfg).unwrap();
        topo.run(50.0);
    }
}
