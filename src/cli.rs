use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Nutrition analysis for packaged food", long_about = None)]
pub struct Cli {
    /// Classifier artifact, overrides MODEL_PATH
    #[arg(short, long, global = true)]
    pub model: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a raw product payload (Open Food Facts JSON)
    Analyze {
        /// Path to the product payload
        #[arg(short, long)]
        payload: PathBuf,
        /// Also recommend healthier alternatives
        #[arg(short = 'a', long)]
        with_alternatives: bool,
    },
    /// Recommend alternatives for an already classified product
    Recommend {
        /// Path to a recommendation request JSON file
        #[arg(short, long)]
        request: PathBuf,
    },
    /// Analyze a whole food from the built-in nutrition table
    Lookup {
        /// Food name, e.g. "banana"
        #[arg(short, long)]
        food: String,
    },
    /// Analyze every *.json payload in a directory
    Batch {
        #[arg(short, long)]
        dir: PathBuf,
    },
    /// Show whether the model and AI credentials are available
    Status,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
