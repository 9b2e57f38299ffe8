// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

use clap::Parser;
use nalgebra::{DMatrix, DVector};
use tracing_subscriber::EnvFilter;

use displacement::{
    CartesianDisplacement, DisplacementConfig, DisplacementException, DisplacementResult,
    Finishable, ManualClock, SingularityHandling, SyntheticRobot, Vector6,
};

/// An example showing how to move the end effector of a simulated seven joint arm by a
/// Cartesian displacement.
///
/// Set RUST_LOG=debug or RUST_LOG=trace to see what the generator does.
#[derive(Parser, Debug)]
#[command(author, version, name = "displace_synthetic_arm")]
struct CommandLineArguments {
    /// Displacement x,y,z,rx,ry,rz in the end effector frame, [m] and [rad]
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        default_value = "0.05,-0.02,0.03,0.1,0,0.3"
    )]
    pub displacement: Vec<f64>,
    /// Time budget in [s]
    #[arg(long, default_value_t = 2.0)]
    pub duration: f64,
    /// Period of the control loop in [s]
    #[arg(long, default_value_t = 0.001)]
    pub dt: f64,
    /// Chain to move, LArm or RArm
    #[arg(long, default_value = "LArm")]
    pub chain: String,
    /// Use damped least squares with this damping instead of failing in singularities
    #[arg(long)]
    pub damping: Option<f64>,
}

fn main() -> DisplacementResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = CommandLineArguments::parse();
    if args.displacement.len() != 6 {
        return Err(DisplacementException::InvalidArgument {
            message: format!(
                "expected 6 displacement values, got {}",
                args.displacement.len()
            ),
        });
    }
    let displacement = Vector6::from_column_slice(&args.displacement);

    let mut robot = SyntheticRobot::with_arms()?;
    robot
        .chain_mut(&args.chain)?
        .set_joint_positions(DVector::from_vec(vec![0.1, 0.4, -0.2, -1.2, 0.3, 0.5, -0.1]))?;
    let start = robot.chain(&args.chain)?.pose();

    let config = match args.damping {
        Some(damping) => DisplacementConfig {
            singularity_handling: SingularityHandling::Damped { damping },
            ..Default::default()
        },
        None => DisplacementConfig::default(),
    };
    let clock = ManualClock::new();
    let mut generator = CartesianDisplacement::with_clock(config, &clock);
    let adjoint = DMatrix::identity(6, 6);

    let mut ticks = 0;
    loop {
        let command = generator.compute_velocity(
            &robot,
            &displacement,
            args.duration,
            &args.chain,
            &adjoint,
        )?;
        if command.is_finished() {
            break;
        }
        if ticks == 0 {
            println!(
                "Twist: {:?}",
                generator.twist().map(|twist| twist.as_slice().to_vec())
            );
            println!("Joints: {:?}", generator.joint_names());
        }
        robot
            .chain_mut(&args.chain)?
            .integrate(&command.dq, args.dt)?;
        clock.advance_secs(args.dt);
        ticks += 1;
    }

    let reached = start.inverse() * robot.chain(&args.chain)?.pose();
    println!("Finished after {} ticks.", ticks);
    println!("Reached translation: {}", reached.translation.vector.transpose());
    println!(
        "Reached rotation (axis angle): {}",
        reached.rotation.scaled_axis().transpose()
    );
    println!(
        "Final joint positions: {}",
        robot.chain(&args.chain)?.joint_positions().transpose()
    );
    Ok(())
}
