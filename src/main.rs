//! Command line driver: builds a robot from link lengths or a YAML file and prints
//! kinematics, Jacobian, workspace and trajectory results as text.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use planar_arm_kinematics::kinematic_traits::{IkMethod, Kinematics, Position};
use planar_arm_kinematics::kinematics_impl::PlanarKinematics;
use planar_arm_kinematics::parameters::planar_kinematics::Parameters;
use planar_arm_kinematics::path_planner::{PathPlanner, Playback, Synchronization, Trajectory};
use planar_arm_kinematics::utils::{dump_joints, dump_pose, dump_solutions, format_joints};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Planar arm kinematics and trajectory planning.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// YAML file with the robot parameters.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Link lengths, comma separated. Ignored if --config is given.
    #[arg(short, long, global = true, value_delimiter = ',', default_value = "1.0,1.0,0.5")]
    links: Vec<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward kinematics.
    Fk {
        /// Joint angles in radians, comma separated.
        #[arg(value_delimiter = ',', allow_hyphen_values = true)]
        joints: Vec<f64>,
    },

    /// Inverse kinematics for the target x, y.
    Ik {
        #[arg(allow_hyphen_values = true)]
        x: f64,
        #[arg(allow_hyphen_values = true)]
        y: f64,

        #[arg(short, long, value_enum, default_value_t = Method::Analytical)]
        method: Method,

        /// Initial guess (or preferred branch for the analytical method), comma separated.
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        seed: Option<Vec<f64>>,
    },

    /// Jacobian and singularity check at the given joint angles.
    Jacobian {
        #[arg(value_delimiter = ',', allow_hyphen_values = true)]
        joints: Vec<f64>,
    },

    /// Sample the workspace on a joint grid and print its extent.
    Workspace {
        #[arg(short = 'n', long, default_value_t = 50)]
        samples: usize,

        /// Print every sampled point as "x y".
        #[arg(long)]
        points: bool,
    },

    /// Joint space trajectory through waypoints given as "q1,q2,q3;q1,q2,q3;...".
    PlanJoint {
        #[arg(allow_hyphen_values = true)]
        waypoints: String,

        #[command(flatten)]
        limits: Limits,

        /// All joints of a segment start and stop together.
        #[arg(long)]
        synchronized: bool,
    },

    /// Operational space trajectory through Cartesian waypoints given as "x,y;x,y;...".
    PlanCartesian {
        #[arg(allow_hyphen_values = true)]
        waypoints: String,

        #[command(flatten)]
        limits: Limits,

        #[arg(short, long, value_enum, default_value_t = Method::Numerical)]
        method: Method,
    },

    /// Solve random reachable targets with every method and report the errors.
    Random {
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,

        /// Random seed for repeatable runs.
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

#[derive(clap::Args)]
struct Limits {
    /// Total number of samples.
    #[arg(short = 'n', long, default_value_t = 20)]
    samples: usize,

    #[arg(long, default_value_t = 1.0)]
    vmax: f64,

    #[arg(long, default_value_t = 1.0)]
    amax: f64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Analytical,
    Numerical,
    Jacobian,
}

impl From<Method> for IkMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Analytical => IkMethod::Analytical,
            Method::Numerical => IkMethod::Numerical,
            Method::Jacobian => IkMethod::Jacobian,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let parameters = match &cli.config {
        Some(path) => Parameters::from_yaml_file(path)
            .with_context(|| format!("Failed to load parameters from {}", path.display()))?,
        None => Parameters::new(cli.links.clone()).context("Invalid link lengths")?,
    };
    tracing::debug!("Robot:\n{}", parameters.to_yaml());
    let robot = PlanarKinematics::new(parameters);

    match cli.command {
        Commands::Fk { joints } => {
            check_joints(&robot, &joints)?;
            dump_pose(&robot.forward(&joints));
            for (i, p) in robot.forward_with_joint_positions(&joints).iter().enumerate() {
                println!("  point {}: ({:.5}, {:.5})", i, p.x, p.y);
            }
        }
        Commands::Ik { x, y, method, seed } => {
            let target = Position::new(x, y);
            if let Some(seed) = &seed {
                check_joints(&robot, seed)?;
            }
            let method = IkMethod::from(method);
            if method == IkMethod::Analytical && seed.is_none() {
                println!("All analytical solutions (degrees):");
                dump_solutions(&robot.inverse(&target));
            } else {
                match robot.solve(&target, method, seed.as_deref()) {
                    Some(joints) => {
                        dump_joints(&joints);
                        let error = (robot.end_effector_position(&joints) - target).norm();
                        println!("Position error: {:.3e}", error);
                    }
                    None => println!("No solution"),
                }
            }
        }
        Commands::Jacobian { joints } => {
            check_joints(&robot, &joints)?;
            let jacobian = robot.jacobian(&joints);
            println!("Jacobian:{}", jacobian.matrix());
            match jacobian.position_determinant() {
                Some(det) => println!("Determinant of the 2x2 position block: {:.6e}", det),
                None => println!("Single joint, no 2x2 position block"),
            }
            println!("Singular: {}", jacobian.is_singular());
        }
        Commands::Workspace { samples, points } => {
            let (xs, ys) = robot.workspace_boundary(samples);
            if points {
                for (x, y) in xs.iter().zip(ys.iter()) {
                    println!("{:.5} {:.5}", x, y);
                }
            }
            let radii: Vec<f64> = xs.iter().zip(ys.iter()).map(|(x, y)| x.hypot(*y)).collect();
            println!(
                "{} points, radius {:.4} to {:.4} (reach {:.4} to {:.4})",
                radii.len(),
                radii.iter().cloned().fold(f64::INFINITY, f64::min),
                radii.iter().cloned().fold(0.0, f64::max),
                robot.parameters().min_reach(),
                robot.parameters().max_reach(),
            );
        }
        Commands::PlanJoint { waypoints, limits, synchronized } => {
            let waypoints = parse_rows(&waypoints)?;
            let synchronization = if synchronized {
                Synchronization::Synchronized
            } else {
                Synchronization::Independent
            };
            let trajectory = PathPlanner::new(&robot)
                .with_limits(limits.vmax, limits.amax)
                .with_synchronization(synchronization)
                .interpolate_joint_space(&waypoints, limits.samples)?;
            print_trajectory(&robot, &trajectory);
        }
        Commands::PlanCartesian { waypoints, limits, method } => {
            let waypoints = parse_rows(&waypoints)?
                .into_iter()
                .map(|row| match row[..] {
                    [x, y] => Ok(Position::new(x, y)),
                    _ => Err(anyhow!("Cartesian waypoints need two coordinates, got {:?}", row)),
                })
                .collect::<Result<Vec<_>>>()?;
            let first = waypoints.first().ok_or_else(|| anyhow!("No waypoints"))?;
            let initial = robot.inverse(first).into_iter().next();
            let planner = PathPlanner::new(&robot)
                .with_limits(limits.vmax, limits.amax)
                .with_ik_method(method.into());
            match planner.interpolate_operational_space_or_waypoints(&waypoints, limits.samples, initial.as_deref())? {
                Playback::Joints(trajectory) => print_trajectory(&robot, &trajectory),
                Playback::Waypoints(raw) => {
                    println!("IK failed along the path, raw waypoints:");
                    for p in raw {
                        println!("  ({:.4}, {:.4})", p.x, p.y);
                    }
                }
            }
        }
        Commands::Random { count, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let inner = robot.parameters().min_reach() + 0.05;
            let outer = robot.parameters().max_reach() - 0.05;
            if inner >= outer {
                bail!("Workspace too thin for random targets");
            }
            for _ in 0..count {
                let radius = rng.gen_range(inner..outer);
                let angle = rng.gen_range(-PI..PI);
                let target = Position::new(radius * angle.cos(), radius * angle.sin());
                println!("Target ({:.4}, {:.4}):", target.x, target.y);
                for method in [IkMethod::Analytical, IkMethod::Numerical, IkMethod::Jacobian] {
                    match robot.solve(&target, method, None) {
                        Some(joints) => println!(
                            "  {:<10} [{}] error {:.2e}",
                            format!("{:?}", method),
                            format_joints(&joints),
                            (robot.end_effector_position(&joints) - target).norm()
                        ),
                        None => println!("  {:<10} no solution", format!("{:?}", method)),
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_joints(robot: &PlanarKinematics, joints: &[f64]) -> Result<()> {
    if joints.len() != robot.dof() {
        bail!("Expected {} joint values, got {}", robot.dof(), joints.len());
    }
    Ok(())
}

/// Parses "a,b;c,d" into rows of numbers.
fn parse_rows(text: &str) -> Result<Vec<Vec<f64>>> {
    text.split(';')
        .filter(|row| !row.trim().is_empty())
        .map(|row| {
            row.split(',')
                .map(|v| v.trim().parse::<f64>().with_context(|| format!("Not a number: '{}'", v)))
                .collect::<Result<Vec<f64>>>()
        })
        .collect()
}

fn print_trajectory(robot: &PlanarKinematics, trajectory: &Trajectory) {
    println!("{} steps, {:.3} s", trajectory.len(), trajectory.duration());
    for step in trajectory.iter() {
        let p = robot.end_effector_position(&step.joints);
        println!("{:?} -> ({:.4}, {:.4})", step, p.x, p.y);
    }
}
