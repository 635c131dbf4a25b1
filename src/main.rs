//! img-from-target-files - target files to flashable image archive
//!
//! Entry point for the command-line application.

use clap::error::ErrorKind;
use clap::Parser;

use img_from_target_files::cli::output::{display_error, init_tracing};
use img_from_target_files::cli::{load_global_config, Cli};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Usage errors exit with 1 like every other failure
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let result = load_global_config().and_then(|global| {
        init_tracing(&cli.output_config(&global));
        tracing::debug!(
            "img-from-target-files {} ({})",
            env!("CARGO_PKG_VERSION"),
            option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
        );
        cli.run(&global)
    });

    if let Err(e) = result {
        display_error(&e);
        std::process::exit(1);
    }
}
