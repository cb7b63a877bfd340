//! The work unit: `Phase` and `MultiPhaseReq` (`spec.md` §3).

use xmp_common::{DeviceSet, GpcId};

/// Sentinel `init_time` meaning "not yet stamped" — only phase 0 ever carries
/// a real creation time; later phases are stamped `-1` until reached.
pub const DEFERRED_INIT_TIME: f64 = -1.0;

#[derive(Debug, Clone, Copy)]
pub struct Phase {
    pub init_time: f64,
    pub service_time: f64,
    pub devices: DeviceSet,
}

/// An ordered, non-empty sequence of phases plus a cursor.
#[derive(Debug, Clone)]
pub struct MultiPhaseReq {
    pub phases: Vec<Phase>,
    pub current: usize,
    /// Last GPC to service a Processor phase; `None` until the first GPC
    /// touches the request. Used by return-to-sender AXC forwarding.
    pub last_gpc_idx: Option<GpcId>,
}

impl MultiPhaseReq {
    pub fn new(phases: Vec<Phase>) -> Self {
        assert!(!phases.is_empty(), "a request must have at least one phase");
        MultiPhaseReq {
            phases,
            current: 0,
            last_gpc_idx: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.current == self.phases.len()
    }

    pub fn current_phase(&self) -> &Phase {
        &self.phases[self.current]
    }

    /// End-to-end delay as of `now`, measured from phase 0's creation time
    /// exclusively (`spec.md` §9's resolved open question: later phases'
    /// `-1` placeholder is never used as a delay reference).
    pub fn delay(&self, now: f64) -> f64 {
        now - self.phases[0].init_time
    }
}

/// `SimpleReq`: a single Processor-only phase.
pub fn simple_req(now: f64, service_time: f64, devices: DeviceSet) -> MultiPhaseReq {
    MultiPhaseReq::new(vec![Phase {
        init_time: now,
        service_time,
        devices,
    }])
}

/// `MultiPhaseReq` creator (two phases). Unlike the three-phase creator, the
/// sampled service time is NOT split across phases -- each phase costs the
/// full sampled value (`spec.md` §8 scenario 1: two 10-unit phases from one
/// 10-unit sample).
pub fn two_phase_req(now: f64, service_time: f64, devices: [DeviceSet; 2]) -> MultiPhaseReq {
    MultiPhaseReq::new(vec![
        Phase {
            init_time: now,
            service_time,
            devices: devices[0],
        },
        Phase {
            init_time: DEFERRED_INIT_TIME,
            service_time,
            devices: devices[1],
        },
    ])
}

/// `ThreePhaseReq{r1,r2,r3}`: the sampled service time is split across three
/// phases by ratios that must sum to 1.
pub fn three_phase_req(
    now: f64,
    service_time: f64,
    ratios: (f64, f64, f64),
    devices: [DeviceSet; 3],
) -> MultiPhaseReq {
    let (r1, r2, r3) = ratios;
    debug_assert!(
        (r1 + r2 + r3 - 1.0).abs() < 1e-9,
        "phase ratios must sum to 1"
    );
    MultiPhaseReq::new(vec![
        Phase {
            init_time: now,
            service_time: service_time * r1,
            devices: devices[0],
        },
        Phase {
            init_time: DEFERRED_INIT_TIME,
            service_time: service_time * r2,
            devices: devices[1],
        },
        Phase {
            init_time: DEFERRED_INIT_TIME,
            service_time: service_time * r3,
            devices: devices[2],
        },
    ])
}
