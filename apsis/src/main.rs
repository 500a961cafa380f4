use apsis::{
    AutomaticGuidance, DragForce, Force, GravityForce, Guidance, IntegrationMethod,
    PropagationOutput, SimulationConfig, SolarPressureForce, TerminationReason, ThirdBody,
    ThirdBodyForce, Torque, TorqueLaw, TorqueScenario,
};
use apsis_diffeq::AdaptiveStepControl;
use atmosphere::{Atmosphere, HarrisPriester};
use celestial::CelestialBodies;
use clap::{Parser, ValueEnum};
use colored::*;
use gravity::{EARTH_J2, Gravity, NewtonianGravity, ZonalGravity};
use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::Vector3;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Coupled orbit and attitude propagation for a small satellite", long_about = None)]
struct Cli {
    /// Run length in seconds
    #[arg(long, default_value_t = 3600.0)]
    duration: f64,

    /// Fixed step size in seconds (rk4 only)
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    /// Integration method
    #[arg(long, value_enum, default_value = "rk4")]
    method: Method,

    /// Use the J2 zonal field instead of point-mass gravity
    #[arg(long)]
    j2: bool,

    /// Enable Harris-Priester atmospheric drag
    #[arg(long)]
    drag: bool,

    /// Enable solar radiation pressure
    #[arg(long)]
    srp: bool,

    /// Enable solar third-body gravity
    #[arg(long)]
    sun: bool,

    /// Enable lunar third-body gravity
    #[arg(long)]
    moon: bool,

    /// Start tumbling and fly the detumble-then-point law under nadir guidance
    #[arg(long)]
    pointing: bool,

    /// Apply the scripted torque profile
    #[arg(long)]
    scenario: bool,

    /// Write the sampled ephemeris to this CSV path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Ephemeris sampling interval in seconds
    #[arg(long, default_value_t = 1.0)]
    cadence: f64,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    /// Fixed-step classical Runge-Kutta
    Rk4,
    /// Adaptive Dormand-Prince 4(5)
    Dp45,
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("{} {}", "error:".red().bold(), error);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let method = match cli.method {
        Method::Rk4 => IntegrationMethod::Rk4 { dt: cli.dt },
        Method::Dp45 => IntegrationMethod::DormandPrince45 {
            control: AdaptiveStepControl::default(),
        },
    };

    let mut config = SimulationConfig::default()
        .with_duration(cli.duration)
        .with_method(method)
        .with_cadence(cli.cadence);

    if cli.j2 {
        config = config.with_forces(vec![Force::Gravity(GravityForce::new(Gravity::Zonal(
            ZonalGravity::new(
                CelestialBodies::Earth.mu(),
                CelestialBodies::Earth.radius(),
                EARTH_J2,
            ),
        )))]);
    } else {
        config = config.with_forces(vec![Force::Gravity(GravityForce::new(Gravity::Newtonian(
            NewtonianGravity::new(CelestialBodies::Earth.mu()),
        )))]);
    }
    if cli.drag {
        config = config.with_force(Force::Drag(DragForce::new(Atmosphere::HarrisPriester(
            HarrisPriester::new(CelestialBodies::Earth.radius()),
        ))));
    }
    if cli.srp {
        config = config.with_force(Force::SolarPressure(SolarPressureForce::new()));
    }
    if cli.sun {
        config = config.with_force(Force::ThirdBody(ThirdBodyForce::new(ThirdBody::Sun)));
    }
    if cli.moon {
        config = config.with_force(Force::ThirdBody(ThirdBodyForce::new(ThirdBody::Moon)));
    }
    if cli.pointing {
        config = config
            .with_spin(Vector3::new(0.05, -0.03, 0.04))
            .with_guidance(Guidance::Automatic(AutomaticGuidance::Nadir))
            .with_torque(Torque::Law(TorqueLaw::detumble_and_point()));
    }
    if cli.scenario {
        config = config.with_torque(Torque::Scenario(TorqueScenario::demo()));
    }

    let mut simulation = config.build()?;

    let progress = if cli.quiet {
        None
    } else {
        let bar = ProgressBar::new(cli.duration.ceil() as u64);
        bar.set_style(
            ProgressStyle::with_template("{elapsed_precise} {bar:40.cyan/blue} {pos}/{len} s")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        Some(bar)
    };
    if let Some(bar) = &progress {
        simulation.dynamics = simulation.dynamics.with_progress(bar.clone());
    }

    let output = simulation.run()?;

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    print_summary(&output);

    if let Some(path) = &cli.output {
        output.ephemeris.write_csv_sampled(path, cli.cadence)?;
        println!("{} {}", "ephemeris:".bold(), path.display());
    }

    Ok(())
}

fn print_summary(output: &PropagationOutput) {
    let summary = &output.summary;
    let text = format!("{}", summary.termination);
    let status = match &summary.termination {
        TerminationReason::Completed => text.as_str().green(),
        TerminationReason::Cancelled { .. } => text.as_str().yellow(),
        _ => text.as_str().red(),
    };
    let elapsed = (summary.finished - summary.started).num_milliseconds() as f64 / 1e3;

    println!("{} {}", "status:".bold(), status);
    println!(
        "{} {:.1} of {:.1} s in {:.3} s wall",
        "reached:".bold(),
        summary.t_end_reached,
        summary.t_end_requested,
        elapsed
    );
    println!(
        "{} {} accepted, {} rejected",
        "steps:".bold(),
        summary.steps_accepted,
        summary.steps_rejected
    );

    if let Some(state) = output.ephemeris.last() {
        println!("{} {}", "epoch:".bold(), state.epoch);
        println!(
            "{} [{:.1}, {:.1}, {:.1}] m",
            "position:".bold(),
            state.position.x,
            state.position.y,
            state.position.z
        );
        println!(
            "{} [{:.3}, {:.3}, {:.3}] m/s",
            "velocity:".bold(),
            state.velocity.x,
            state.velocity.y,
            state.velocity.z
        );
        println!(
            "{} [{:.5}, {:.5}, {:.5}] rad/s",
            "spin:".bold(),
            state.spin.x,
            state.spin.y,
            state.spin.z
        );
    }
}
