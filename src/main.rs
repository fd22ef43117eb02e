use clap::Parser;
use miette::Result;
use atx2img::cli::{Cli, Commands};
use atx2img::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Inspect(args)) => atx2img::cli::inspect::run(args, &Printer::new())?,
        Some(Commands::Completions(args)) => atx2img::cli::completions::run(args)?,
        None => {
            let printer = Printer::new().with_verbosity(cli.convert.verbosity());
            atx2img::cli::convert::run(cli.convert, &printer)?;
        }
    }

    Ok(())
}
