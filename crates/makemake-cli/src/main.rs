use clap::{Parser, Subcommand};
use makemake_build::{build_makefile, Config, CONFIG_FILE};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "makemake")]
#[command(author, version, about = "Generate a Makefile for a module-structured C++ library")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the Makefile and create the working directories
    Generate {
        /// Configuration file (default: makemake.toml in the root, if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Project root the layout is relative to
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Output file, overriding the configuration
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate the configuration without writing anything
    Check {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Project root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// Print the generated Makefile to stdout
    Print {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Project root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// Write the built-in configuration as a starting point
    Init {
        /// Where to write it
        #[arg(short, long, default_value = CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Logs go to stderr so `makemake print` output can be redirected.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "makemake=info,makemake_build=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(config: Option<&Path>, root: &Path) -> Result<Config> {
    let config = match config {
        Some(path) => Config::from_file(path)?,
        None => Config::discover(root)?,
    };
    Ok(config)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            root,
            output,
        } => {
            let mut config = load_config(config.as_deref(), &root)?;
            if let Some(output) = output {
                config.output = output;
            }
            let path = makemake_build::write(&config, &root)?;
            println!("Wrote {}", path.display());
        }

        Commands::Check { config, root } => {
            let config = load_config(config.as_deref(), &root)?;
            let makefile = build_makefile(&config)?;
            println!(
                "OK: {} modules, {} areas, {} rules",
                config.layout.modules.len(),
                config.layout.areas.len(),
                makefile.rules.len()
            );
        }

        Commands::Print { config, root } => {
            let config = load_config(config.as_deref(), &root)?;
            print!("{}", makemake_build::generate(&config)?);
        }

        Commands::Init { path, force } => {
            if path.exists() && !force {
                return Err(miette::miette!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
            }
            let text = Config::default().to_toml()?;
            std::fs::write(&path, text)
                .into_diagnostic()
                .map_err(|e| e.wrap_err(format!("Failed to write {}", path.display())))?;
            tracing::info!("wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
