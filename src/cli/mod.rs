pub mod completions;
pub mod convert;
pub mod inspect;

use clap::{Parser, Subcommand};

/// atx2img - Rebuild sprite images from .atx texture atlases
#[derive(Parser, Debug)]
#[command(name = "atx2img")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub convert: convert::ConvertArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the blocks and textures of an archive without writing anything
    Inspect(inspect::InspectArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
