use clap::{Parser, Subcommand};
use ls_loopshaping::{LoopshapingDefinition, LoopshapingResult, load_json, load_yaml};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "ls-cli")]
#[command(about = "Loopshape CLI - inspect loop-shaping filter configurations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a loopshaping config and print its filter
    Validate {
        /// Path to the config file (YAML, or JSON with a .json extension)
        config_path: PathBuf,
    },
    /// Print augmented dimensions for a system of the given size
    Dims {
        /// Path to the config file (YAML, or JSON with a .json extension)
        config_path: PathBuf,
        /// Number of states of the wrapped system
        #[arg(long)]
        system_states: usize,
        /// Number of inputs of the wrapped system
        #[arg(long)]
        system_inputs: usize,
    },
}

fn main() -> LoopshapingResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Dims {
            config_path,
            system_states,
            system_inputs,
        } => cmd_dims(&config_path, system_states, system_inputs),
    }
}

fn load(path: &Path) -> LoopshapingResult<LoopshapingDefinition> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}

fn cmd_validate(path: &Path) -> LoopshapingResult<()> {
    let definition = load(path)?;
    let filter = definition.filter();
    info!(path = %path.display(), "config is valid");

    println!("Pattern: {}", definition.pattern());
    println!(
        "Filter: {} states, {} inputs, {} outputs",
        filter.num_states(),
        filter.num_inputs(),
        filter.num_outputs()
    );
    if !definition.eliminated_inputs().is_empty() {
        println!("Eliminated inputs: {:?}", definition.eliminated_inputs());
    }
    println!("A = {}", filter.a());
    println!("B = {}", filter.b());
    if filter.num_outputs() > 0 {
        println!("C = {}", filter.c());
        println!("D = {}", filter.d());
    }
    Ok(())
}

fn cmd_dims(path: &Path, system_states: usize, system_inputs: usize) -> LoopshapingResult<()> {
    let definition = load(path)?;
    definition.validate_against(system_inputs)?;

    println!("System: {} states, {} inputs", system_states, system_inputs);
    println!(
        "Augmented: {} states, {} inputs",
        definition.augmented_state_dim(system_states),
        definition.augmented_input_dim(system_inputs)
    );
    if !definition.eliminated_inputs().is_empty() {
        println!(
            "Direct system inputs: {:?}",
            definition.direct_inputs(system_inputs)
        );
    }
    Ok(())
}
