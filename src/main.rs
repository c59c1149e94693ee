use clap::Parser;
use fileproc::cli::{self, Cli, Commands, Context};
use fileproc::discovery::{load_manifest, LoadedManifest};
use fileproc::output::Printer;
use fileproc::{logging, FpError, Manifest};
use miette::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().map_err(FpError::IoError)?;

    // `init` must work even when the existing config is broken.
    let loaded = match (&cli.command, load_manifest(cli.config.as_deref(), &cwd)) {
        (Commands::Init(_), Err(_)) => LoadedManifest {
            manifest: Manifest::default(),
            source: None,
        },
        (_, loaded) => loaded?,
    };
    logging::init(&loaded.manifest.log_file, cli.verbose);
    if let Some(source) = &loaded.source {
        tracing::debug!(config = %source.display(), "Loaded config");
    }

    let ctx = Context {
        manifest: loaded.manifest,
        printer: Printer::new(),
        cwd,
    };

    let outcome = match cli.command {
        Commands::Merge(args) => Some(cli::merge::run(args, &ctx)?),
        Commands::Watermark(args) => Some(cli::watermark::run(args, &ctx)?),
        Commands::Metadata(args) => Some(cli::metadata::run(args, &ctx)?),
        Commands::Last(args) => Some(cli::last::run(args, &ctx)?),
        Commands::Log(args) => {
            cli::log::run(args, &ctx)?;
            None
        }
        Commands::Init(args) => {
            cli::init::run(args, &ctx.printer)?;
            None
        }
        Commands::Completions(args) => {
            cli::completions::run(args)?;
            None
        }
    };

    if let Some(code) = outcome.map(cli::exit_code).filter(|&code| code != 0) {
        std::process::exit(code);
    }

    Ok(())
}
