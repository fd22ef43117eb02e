//! Convert command implementation.
//!
//! Turns one .atx archive into a directory of PNG sprites.

use std::path::PathBuf;

use clap::Args;

use crate::config::ConvertConfig;
use crate::error::{AtxError, Result};
use crate::output::{display_path, plural, Printer, Verbosity};
use crate::pipeline::{self, Summary};

/// Convert an .atx archive into PNG images
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input .atx archive
    pub input: Option<PathBuf>,

    /// Output directory (created if missing)
    pub output: Option<PathBuf>,

    /// Conversion config file (default: ./atx2img.yaml when present)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Show per-block detail
    #[arg(long, short, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(long, short)]
    pub quiet: bool,
}

impl ConvertArgs {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

pub fn run(args: ConvertArgs, printer: &Printer) -> Result<Summary> {
    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        return Err(AtxError::Usage {
            message: "expected an input archive and an output directory".to_string(),
            help: Some("Usage: atx2img <INPUT> <OUTPUT>".to_string()),
        });
    };

    let config = ConvertConfig::discover(args.config.as_deref(), &std::env::current_dir()?)?;

    printer.status(
        "Converting",
        &format!("{} -> {}", display_path(input), display_path(output)),
    );

    let summary = pipeline::run(input, output, &config, printer)?;
    print_summary(&summary, printer);

    Ok(summary)
}

fn print_summary(summary: &Summary, printer: &Printer) {
    let mut parts = vec![format!("{} saved", summary.saved)];
    if summary.skipped > 0 {
        parts.push(format!("{} skipped", summary.skipped));
    }
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed));
    }

    let warnings = summary.diagnostics.warning_count();
    let errors = summary.diagnostics.error_count();
    if warnings > 0 {
        parts.push(plural(warnings, "warning", "warnings"));
    }
    if errors > 0 {
        parts.push(plural(errors, "error", "errors"));
    }

    printer.status(
        "Finished",
        &format!(
            "conversion of {} ({})",
            plural(summary.blocks_total, "block", "blocks"),
            parts.join(", ")
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(input: Option<PathBuf>, output: Option<PathBuf>) -> ConvertArgs {
        ConvertArgs {
            input,
            output,
            config: None,
            verbose: false,
            quiet: true,
        }
    }

    #[test]
    fn test_missing_arguments_is_usage_error() {
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);

        let err = run(args(None, None), &printer).unwrap_err();
        assert!(matches!(err, AtxError::Usage { .. }));

        let err = run(args(Some("in.atx".into()), None), &printer).unwrap_err();
        assert!(matches!(err, AtxError::Usage { .. }));
    }

    #[test]
    fn test_missing_input_file_is_archive_error() {
        let dir = tempdir().unwrap();
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);

        let err = run(
            args(Some(dir.path().join("missing.atx")), Some(dir.path().join("out"))),
            &printer,
        )
        .unwrap_err();

        assert!(matches!(err, AtxError::Archive { .. }));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_verbosity_flags() {
        let mut a = args(None, None);
        assert_eq!(a.verbosity(), Verbosity::Quiet);

        a.quiet = false;
        assert_eq!(a.verbosity(), Verbosity::Normal);

        a.verbose = true;
        assert_eq!(a.verbosity(), Verbosity::Verbose);
    }
}
