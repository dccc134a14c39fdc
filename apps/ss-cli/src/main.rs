mod error;
mod input;

use clap::{Parser, Subcommand};
use error::{CliError, CliResult};
use ss_controls::{SampleConfig, StateSpaceController, TraceWriter};
use ss_core::Vector;
use ss_core::timing::{self, Timer};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ss-cli")]
#[command(about = "Discrete-time state-space controller tool", long_about = None)]
struct Cli {
    /// Print wall-clock timings to stderr (same as setting SS_TIMING)
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a model file
    Validate {
        /// Path to the model (.dat, .yaml or .json)
        model_path: PathBuf,
    },
    /// Print the state-space matrices of a model
    Show {
        /// Path to the model (.dat, .yaml or .json)
        model_path: PathBuf,
        /// Print the model as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Step a controller and write a CSV trace
    Run(RunArgs),
    /// Convert a model between file formats
    Convert {
        /// Source model file
        input: PathBuf,
        /// Destination file; its extension selects the format
        output: PathBuf,
    },
    /// Describe the .dat model layout
    Format,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to the model (.dat, .yaml or .json)
    model_path: PathBuf,
    /// Number of steps (defaults to the number of rows of an input file)
    #[arg(short = 'n', long)]
    steps: Option<usize>,
    /// Constant input vector, comma separated
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["input_file", "reference"])]
    input: Option<String>,
    /// CSV file with one input vector per line
    #[arg(long, conflicts_with = "reference")]
    input_file: Option<PathBuf>,
    /// Constant reference vector, comma separated; steps on reference - measurement
    #[arg(long, allow_hyphen_values = true, requires = "measurement_file")]
    reference: Option<String>,
    /// CSV file with one measurement vector per line
    #[arg(long, requires = "reference")]
    measurement_file: Option<PathBuf>,
    /// Lower input bound applied to every channel
    #[arg(long, allow_hyphen_values = true, requires = "u_max")]
    u_min: Option<f64>,
    /// Upper input bound applied to every channel
    #[arg(long, allow_hyphen_values = true, requires = "u_min")]
    u_max: Option<f64>,
    /// Override the model time step with a sample rate in Hz
    #[arg(long)]
    rate: Option<f64>,
    /// Output CSV file path (optional, defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if cli.timing {
        timing::enable_timing();
    }

    match cli.command {
        Commands::Validate { model_path } => cmd_validate(&model_path),
        Commands::Show { model_path, json } => cmd_show(&model_path, json),
        Commands::Run(args) => cmd_run(&args),
        Commands::Convert { input, output } => cmd_convert(&input, &output),
        Commands::Format => {
            print!("{}", ss_project::FORMAT_HELP);
            Ok(())
        }
    }
}

fn cmd_validate(model_path: &Path) -> CliResult<()> {
    let model = ss_project::load_model(model_path)?;
    ss_project::validate_model(&model).map_err(ss_project::ProjectError::from)?;
    let (nx, ne, nu) = model.dims();
    println!("✓ Model is valid");
    println!("  States: {nx}");
    println!("  Inputs: {ne}");
    println!("  Outputs: {nu}");
    println!("  Time step: {} s", model.time_step);
    Ok(())
}

fn cmd_show(model_path: &Path, json: bool) -> CliResult<()> {
    let model = ss_project::load_model(model_path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&model)?);
        return Ok(());
    }
    let controller: StateSpaceController<f64> = ss_project::build_controller(&model)?;
    if let Some(name) = &model.name {
        println!("Model: {name}");
    }
    print!("{controller}");
    if let Some(saturation) = controller.saturation() {
        println!("Saturation: {saturation:?}");
    }
    Ok(())
}

/// Where the inputs of each step come from.
enum Drive {
    Constant(Vector<f64>),
    Rows(Vec<Vector<f64>>),
    Tracking {
        reference: Vector<f64>,
        measurements: Vec<Vector<f64>>,
    },
}

impl Drive {
    fn from_args(args: &RunArgs, input_dim: usize) -> CliResult<Self> {
        if let Some(text) = &args.input {
            return Ok(Drive::Constant(input::parse_list(text).map_err(CliError::Usage)?));
        }
        if let Some(path) = &args.input_file {
            return Ok(Drive::Rows(input::read_rows(path)?));
        }
        if let (Some(text), Some(path)) = (&args.reference, &args.measurement_file) {
            return Ok(Drive::Tracking {
                reference: input::parse_list(text).map_err(CliError::Usage)?,
                measurements: input::read_rows(path)?,
            });
        }
        Ok(Drive::Constant(Vector::zeros(input_dim)))
    }

    /// Rows available in the data files, if any.
    fn available(&self) -> Option<usize> {
        match self {
            Drive::Constant(_) => None,
            Drive::Rows(rows) => Some(rows.len()),
            Drive::Tracking { measurements, .. } => Some(measurements.len()),
        }
    }

    fn step(&self, controller: &mut StateSpaceController<f64>, k: usize) -> CliResult<()> {
        match self {
            Drive::Constant(u) => controller.step(u)?,
            Drive::Rows(rows) => controller.step(&rows[k])?,
            Drive::Tracking {
                reference,
                measurements,
            } => controller.step_tracking(reference, &measurements[k])?,
        };
        Ok(())
    }
}

fn cmd_run(args: &RunArgs) -> CliResult<()> {
    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let trace = run_trace(args, BufWriter::new(out))?;

    if let Some(path) = &args.output {
        println!("✓ Wrote {} steps to {}", trace.rows(), path.display());
    }
    Ok(())
}

/// Load the model, step it as `args` describe and write the CSV trace to `out`.
fn run_trace<W: Write>(args: &RunArgs, out: W) -> CliResult<TraceWriter<W>> {
    let load_timer = Timer::start("load");
    let model = ss_project::load_model(&args.model_path)?;
    let mut controller: StateSpaceController<f64> = ss_project::build_controller(&model)?;
    if let (Some(lo), Some(hi)) = (args.u_min, args.u_max) {
        controller.set_uniform_saturation(lo, hi)?;
    }
    if let Some(hz) = args.rate {
        controller.set_time_step(SampleConfig::from_frequency(hz)?.dt())?;
    }
    load_timer.stop_and_print();

    let drive = Drive::from_args(args, controller.input_dim())?;
    let steps = match (args.steps, drive.available()) {
        (Some(n), Some(rows)) if n > rows => {
            return Err(CliError::Usage(format!(
                "{n} steps requested but the input file has {rows} rows"
            )));
        }
        (Some(n), _) => n,
        (None, Some(rows)) => rows,
        (None, None) => {
            return Err(CliError::Usage(
                "--steps is required with a constant input".to_string(),
            ));
        }
    };

    let mut trace = TraceWriter::new(out);
    let run_timer = Timer::start("run");
    for k in 0..steps {
        drive.step(&mut controller, k)?;
        if let Some(record) = controller.last_step() {
            trace.write(record)?;
        }
    }
    trace.flush()?;
    run_timer.stop_and_print();
    Ok(trace)
}

fn cmd_convert(input: &Path, output: &Path) -> CliResult<()> {
    let model = ss_project::load_model(input)?;
    ss_project::save_model(output, &model)?;
    println!("✓ Converted {} -> {}", input.display(), output.display());
    Ok(())
}
