//! The `xmpsim` command: run one discrete-event simulation from a flat set
//! of CLI flags and print a one-line summary (`spec.md` §6).
//!
//! A single flat `#[derive(Parser)]` struct, not subcommands -- unlike
//! `snowc`/`meshc`'s multi-verb CLIs, `xmpsim` exposes exactly one action.

use std::process;

use clap::Parser;

use xmp_sim::topology::{build_t0, build_t1, build_t2, build_t3, build_t4, build_t5, TopologyConfig};

/// Run a discrete-event simulation of multi-phase request scheduling across
/// GPC/AXC cores.
#[derive(Parser, Debug)]
#[command(name = "xmpsim", version, about)]
struct Cli {
    /// Topology selector (0-5).
    #[arg(long = "topo")]
    topo: u32,

    /// Arrival rate for Poisson-process generators.
    #[arg(long = "lambda", default_value_t = 1.0)]
    lambda: f64,

    /// Service rate for Poisson-process generators.
    #[arg(long = "mu", default_value_t = 1.0)]
    mu: f64,

    /// 0:MM, 1:MD, 2:MB(short=1,long=10*(1/mu-0.9),p=0.9), 3:MB(short=1,long=1000*(1/mu-0.999),p=0.999).
    #[arg(long = "genType", default_value_t = 0)]
    gen_type: u32,

    /// Virtual-time horizon to run the simulation for.
    #[arg(long = "duration", default_value_t = 1000.0)]
    duration: f64,

    /// `outbound_max` for GPCs.
    #[arg(long = "buffersize", default_value_t = 8)]
    buffersize: usize,

    #[arg(long = "num_cores", default_value_t = 1)]
    num_cores: usize,

    #[arg(long = "num_accelerators", default_value_t = 1)]
    num_accelerators: usize,

    #[arg(long = "phase_one_ratio", default_value_t = 1.0 / 3.0)]
    phase_one_ratio: f64,

    #[arg(long = "phase_two_ratio", default_value_t = 1.0 / 3.0)]
    phase_two_ratio: f64,

    #[arg(long = "phase_three_ratio", default_value_t = 1.0 / 3.0)]
    phase_three_ratio: f64,

    /// AXC speedup relative to a GPC's nominal service time.
    #[arg(long = "speedup", default_value_t = 1.0)]
    speedup: f64,

    /// 0:try-axcore-then-fallback, 1:block-until-accepts, 2:round-robin-with-fallback.
    #[arg(long = "gpcore_offload_style", default_value_t = 0)]
    gpcore_offload_style: u32,

    /// 0:centralized-post, 1:centralized-pre, 2:to-offloader-three-phase.
    #[arg(long = "axcore_notify_recipient", default_value_t = 2)]
    axcore_notify_recipient: u32,

    /// 0:first-non-empty (only selector currently recognized).
    #[arg(long = "gpcore_input_queue_selector", default_value_t = 0)]
    gpcore_input_queue_selector: u32,

    /// Virtual-time cost an offloading GPC pays before a `WriteOutQueueI`.
    #[arg(long = "offload_cost", default_value_t = 0.0)]
    offload_cost: f64,

    /// RNG seed for reproducible runs.
    #[arg(long = "seed", default_value_t = 1)]
    seed: u64,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let ratio_sum = cli.phase_one_ratio + cli.phase_two_ratio + cli.phase_three_ratio;
    if (ratio_sum - 1.0).abs() > 1e-6 {
        return Err(format!(
            "phase_one_ratio + phase_two_ratio + phase_three_ratio must sum to 1 (got {ratio_sum})"
        ));
    }

    let cfg = TopologyConfig {
        lambda: cli.lambda,
        mu: cli.mu,
        gen_type: cli.gen_type,
        buffersize: cli.buffersize,
        num_cores: cli.num_cores,
        num_accelerators: cli.num_accelerators,
        phase_one_ratio: cli.phase_one_ratio,
        phase_two_ratio: cli.phase_two_ratio,
        phase_three_ratio: cli.phase_three_ratio,
        speedup: cli.speedup,
        gpcore_offload_style: cli.gpcore_offload_style,
        axcore_notify_recipient: cli.axcore_notify_recipient,
        gpcore_input_queue_selector: cli.gpcore_input_queue_selector,
        offload_cost: cli.offload_cost,
        seed: cli.seed,
        deterministic: None,
    };

    let mut topology = match cli.topo {
        0 => build_t0(&cfg),
        1 => build_t1(&cfg),
        2 => build_t2(&cfg),
        3 => build_t3(&cfg),
        4 => build_t4(&cfg),
        5 => build_t5(&cfg),
        other => return Err(format!("unknown topology {other}, expected 0-5")),
    }
    .map_err(|e| e.to_string())?;

    topology.run(cli.duration);

    let sink = topology.sink.borrow();
    println!(
        "topo={} num_cores={} num_accelerators={} duration={} terminated={} mean_delay={:.4} min_delay={:.4} max_delay={:.4}",
        cli.topo,
        cli.num_cores,
        cli.num_accelerators,
        cli.duration,
        sink.count(),
        sink.mean(),
        sink.min(),
        sink.max(),
    );

    Ok(())
}
