//! Sampling contract for generator distributions (`spec.md` §4.4, §4.8).
//!
//! Only the sampling contract is in scope -- the distributions themselves
//! are thin wrappers over `rand_distr`, adopted from the `amenti-labs-openentropy`
//! pack repo's dependency stack since the teacher workspace has no
//! statistical-sampling crate of its own.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};

/// Something that can be sampled to produce a non-negative virtual-time
/// duration (an interarrival gap or a service time).
pub trait Dist {
    fn sample(&self, rng: &mut StdRng) -> f64;
}

/// `DD`: always the same value.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicDist {
    pub value: f64,
}

impl Dist for DeterministicDist {
    fn sample(&self, _rng: &mut StdRng) -> f64 {
        self.value
    }
}

/// Poisson-process interarrival / exponential service, parameterized by
/// rate (`lambda` or `mu`).
pub struct ExponentialDist {
    exp: Exp<f64>,
}

impl ExponentialDist {
    pub fn new(rate: f64) -> Self {
        ExponentialDist {
            exp: Exp::new(rate).expect("exponential rate must be positive"),
        }
    }
}

impl Dist for ExponentialDist {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        self.exp.sample(rng)
    }
}

/// Two-value service time distribution: `short` with probability `p_short`,
/// else `long`.
#[derive(Debug, Clone, Copy)]
pub struct BimodalDist {
    pub short: f64,
    pub long: f64,
    pub p_short: f64,
}

impl Dist for BimodalDist {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        use rand::Rng;
        if rng.random_bool(self.p_short) {
            self.short
        } else {
            self.long
        }
    }
}

/// Which `--genType` flavor (`spec.md` §6) and its service-time distribution.
pub enum GenType {
    /// 0: M/M -- exponential interarrival + exponential service.
    Mm { lambda: f64, mu: f64 },
    /// 1: M/D -- exponential interarrival + deterministic service (`1/mu`).
    Md { lambda: f64, mu: f64 },
    /// 2: M/Bimodal, short=1, long=10*(1/mu - 0.9), p=0.9.
    MbA { lambda: f64, mu: f64 },
    /// 3: M/Bimodal, short=1, long=1000*(1/mu - 0.999), p=0.999.
    MbB { lambda: f64, mu: f64 },
    /// deterministic interarrival + deterministic service, used by the
    /// concrete scenarios in `spec.md` §8.
    Dd { interarrival: f64, service: f64 },
}

/// The paired (interarrival, service) distributions a generator samples
/// from each loop iteration (`spec.md` §4.4).
pub struct GenDist {
    pub interarrival: Box<dyn Dist>,
    pub service: Box<dyn Dist>,
}

impl GenDist {
    pub fn from_gen_type(gt: GenType) -> Self {
        match gt {
            GenType::Mm { lambda, mu } => GenDist {
                interarrival: Box::new(ExponentialDist::new(lambda)),
                service: Box::new(ExponentialDist::new(mu)),
            },
            GenType::Md { lambda, mu } => GenDist {
                interarrival: Box::new(ExponentialDist::new(lambda)),
                service: Box::new(DeterministicDist { value: 1.0 / mu }),
            },
            GenType::MbA { lambda, mu } => GenDist {
                interarrival: Box::new(ExponentialDist::new(lambda)),
                service: Box::new(BimodalDist {
                    short: 1.0,
                    long: 10.0 * (1.0 / mu - 0.9),
                    p_short: 0.9,
                }),
            },
            GenType::MbB { lambda, mu } => GenDist {
                interarrival: Box::new(ExponentialDist::new(lambda)),
                service: Box::new(BimodalDist {
                    short: 1.0,
                    long: 1000.0 * (1.0 / mu - 0.999),
                    p_short: 0.999,
                }),
            },
            GenType::Dd {
                interarrival,
                service,
            } => GenDist {
                interarrival: Box::new(DeterministicDist { value: interarrival }),
                service: Box::new(DeterministicDist { value: service }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn deterministic_always_returns_value() {
        let d = DeterministicDist { value: 42.0 };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(d.sample(&mut rng), 42.0);
        assert_eq!(d.sample(&mut rng), 42.0);
    }

    #[test]
    fn bimodal_only_ever_returns_the_two_configured_values() {
        let d = BimodalDist {
            short: 1.0,
            long: 9.0,
            p_short: 0.5,
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let v = d.sample(&mut rng);
            assert!(v == 1.0 || v == 9.0);
        }
    }

    #[test]
    fn exponential_samples_are_non_negative() {
        let d = ExponentialDist::new(2.0);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert!(d.sample(&mut rng) >= 0.0);
        }
    }
}
