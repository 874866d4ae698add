use std::io;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rbmstack::array_io::{ArrayFormat, load_vectors, write_array, write_array_file};
use rbmstack::rbm::{
    DEFAULT_WEIGHT_STDDEV, ProgressBarMonitor, ProgressMonitor, StackedRbm, TrainingOptions,
    entry_point,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Train stacked Restricted Boltzmann Machines on bipolar vectors and sample from them"
)]
struct Cli {
    #[command(subcommand)]
    action: Action,

    /// Hidden layer widths from bottom to top, comma separated, bias excluded
    #[arg(long, global = true, value_delimiter = ',', default_value = "2")]
    hidden: Vec<usize>,

    /// Visible width, bias excluded (defaults to the width of the input vectors)
    #[arg(long, global = true)]
    visible: Option<usize>,

    /// Training rounds per layer
    #[arg(long, global = true, default_value_t = 1024)]
    rounds: usize,

    /// Learning rate
    #[arg(long, global = true, default_value_t = 0.001)]
    rate: f64,

    /// Weight decay applied every 16 rounds (0 disables it)
    #[arg(long, global = true, default_value_t = 0.0)]
    decay: f64,

    /// Random seed
    #[arg(long, global = true, default_value_t = 1)]
    seed: u64,

    /// Standard deviation of the initial weights
    #[arg(long, global = true, default_value_t = DEFAULT_WEIGHT_STDDEV)]
    stddev: f64,

    /// Samples drawn per input vector or hidden unit (sampleup, sampledown)
    #[arg(long, global = true, default_value_t = 16)]
    samples: usize,

    /// Gibbs cycles run on the top layer per sample (sampleup, sampledown)
    #[arg(long, global = true, default_value_t = 1)]
    cycles: usize,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Train a stack on <visibles> and write its weights (stdout when no path is given)
    Train { visibles: String, weights: Option<String> },
    /// Report the reconstruction error of every vector in <visibles>
    Error { visibles: String, weights: String },
    /// Sample the top hidden layer for every vector in <visibles>
    Sampleup {
        weights: String,
        visibles: String,
        hiddens: Option<String>,
    },
    /// Sample visible vectors from each top hidden unit switched on alone
    Sampledown { weights: String, visibles: Option<String> },
    /// Reconstruct every vector in <visibles> through the whole stack
    Reconstruct {
        weights: String,
        visibles: String,
        output: Option<String>,
    },
}

fn is_json(path: &str) -> bool {
    path.ends_with(".json")
}

fn load_stack(path: &str, visible_width: usize) -> Result<StackedRbm> {
    let stack = if is_json(path) {
        StackedRbm::load_from_path(path)
            .with_context(|| format!("failed to load model snapshot \"{}\"", path))?
    } else {
        StackedRbm::load_file(visible_width, path)
            .with_context(|| format!("failed to load weights \"{}\"", path))?
    };

    if stack.visible_width() != visible_width {
        bail!(
            "weights \"{}\" expect {} visible units, but the vectors have {}",
            path,
            stack.visible_width(),
            visible_width
        );
    }
    info!("Loaded stack from \"{}\":\n{}", path, stack);
    Ok(stack)
}

fn emit(rows: &[Vec<f64>], path: Option<&str>) -> Result<()> {
    match path {
        Some(path) => {
            info!("Writing {} rows to \"{}\"", rows.len(), path);
            write_array_file(path, rows)
                .with_context(|| format!("failed to write \"{}\"", path))?;
        }
        None => {
            info!("No output file specified, printing to stdout");
            write_array(io::stdout().lock(), ArrayFormat::TextFloat, rows)?;
        }
    }
    Ok(())
}

fn train(cli: &Cli, visibles: &str, weights: Option<&str>) -> Result<()> {
    let (vectors, width) = load_vectors(visibles, cli.visible).with_context(|| {
        format!("invalid or non-existent training vectors in \"{}\"", visibles)
    })?;
    let options = TrainingOptions::new(cli.rate, cli.decay, cli.rounds)?;
    let mut rng = StdRng::seed_from_u64(cli.seed);

    info!(
        "Training {} layers on {} vectors of width {}",
        cli.hidden.len(),
        vectors.len(),
        width
    );

    let mut monitor = ProgressBarMonitor::new();
    let outcome = entry_point::train(
        width,
        &cli.hidden,
        cli.stddev,
        &vectors,
        &options,
        &mut rng,
        Some(&mut monitor as &mut dyn ProgressMonitor),
    )?;

    match weights {
        Some(path) if is_json(path) => {
            info!("Writing model snapshot to \"{}\"", path);
            StackedRbm::from_weights(width, outcome.weights)?
                .save_to_path(path)
                .with_context(|| format!("failed to write \"{}\"", path))?;
        }
        _ => emit(&outcome.weights, weights)?,
    }
    Ok(())
}

fn error(cli: &Cli, visibles: &str, weights: &str) -> Result<()> {
    let (vectors, width) = load_vectors(visibles, cli.visible)
        .with_context(|| format!("invalid or non-existent vectors in \"{}\"", visibles))?;
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let mut stack = load_stack(weights, width)?;
    let errors = stack.errors(&vectors, &mut rng)?;
    for (i, error) in errors.iter().enumerate() {
        println!("Average error of example {}: {:.6}", i, error);
    }
    println!(
        "Average error over {} examples: {:.6}",
        errors.len(),
        errors.iter().sum::<f64>() / errors.len() as f64
    );
    Ok(())
}

fn sample_up(cli: &Cli, weights: &str, visibles: &str, hiddens: Option<&str>) -> Result<()> {
    let (vectors, width) = load_vectors(visibles, cli.visible)
        .with_context(|| format!("invalid or non-existent vectors in \"{}\"", visibles))?;
    let mut stack = load_stack(weights, width)?;
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let mut rows = Vec::with_capacity(vectors.len() * cli.samples);
    for (i, vector) in vectors.iter().enumerate() {
        info!("Hidden samples from vector {}", i);
        for _ in 0..cli.samples {
            rows.push(stack.sample_up(vector, cli.cycles, &mut rng)?.to_vec());
        }
    }
    emit(&rows, hiddens)
}

fn sample_down(cli: &Cli, weights: &str, visibles: Option<&str>) -> Result<()> {
    let width = match (cli.visible, is_json(weights)) {
        (Some(width), _) => width,
        (None, true) => StackedRbm::load_from_path(weights)
            .with_context(|| format!("failed to load model snapshot \"{}\"", weights))?
            .visible_width(),
        (None, false) => bail!("--visible is required to interpret the weight matrices"),
    };
    let mut stack = load_stack(weights, width)?;
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let top_width = stack.hidden_widths().last().copied().unwrap_or(0);
    let mut rows = Vec::with_capacity(top_width * cli.samples);
    for unit in 0..top_width {
        info!("Samples via hidden unit {}", unit);
        let pattern = stack.unit_pattern(unit)?;
        for _ in 0..cli.samples {
            rows.push(stack.sample_down(&pattern, cli.cycles, &mut rng)?.to_vec());
        }
    }
    emit(&rows, visibles)
}

fn reconstruct(cli: &Cli, weights: &str, visibles: &str, output: Option<&str>) -> Result<()> {
    let (vectors, width) = load_vectors(visibles, cli.visible)
        .with_context(|| format!("invalid or non-existent vectors in \"{}\"", visibles))?;
    let mut stack = load_stack(weights, width)?;
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let mut rows = Vec::with_capacity(vectors.len());
    for vector in &vectors {
        rows.push(stack.reconstruct(vector, &mut rng)?.to_vec());
    }
    emit(&rows, output)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match &cli.action {
        Action::Train { visibles, weights } => train(&cli, visibles, weights.as_deref()),
        Action::Error { visibles, weights } => error(&cli, visibles, weights),
        Action::Sampleup {
            weights,
            visibles,
            hiddens,
        } => sample_up(&cli, weights, visibles, hiddens.as_deref()),
        Action::Sampledown { weights, visibles } => sample_down(&cli, weights, visibles.as_deref()),
        Action::Reconstruct {
            weights,
            visibles,
            output,
        } => reconstruct(&cli, weights, visibles, output.as_deref()),
    }
}
