use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, Subcommand};
use ddecprep::config::{Config, Selection};
use log::info;

/// Prepare DDEC6 analyses of molecules taken from crystal structures
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file. Defaults to ddecprep.toml when it exists; otherwise
    /// every option takes its default value.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serialize the resolved configuration to JSON and exit.
    #[arg(long, default_value_t = false, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Paths overriding the input and output of a stage
#[derive(clap::Args, Debug)]
struct Io {
    /// The file to read instead of the configured one
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// The file to write instead of the configured one
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract one molecule from a periodic structure into an XYZ file
    Extract {
        #[command(flatten)]
        io: Io,

        /// Select the molecule bonded to this atom
        #[arg(long, conflicts_with_all = ["center", "fragment"])]
        seed: Option<usize>,

        /// Select every atom within --radius Å of this atom
        #[arg(long, requires = "radius", conflicts_with = "fragment")]
        center: Option<usize>,

        #[arg(long, requires = "center")]
        radius: Option<f64>,

        /// Select a fragment by its position in the `fragments` listing
        #[arg(long)]
        fragment: Option<usize>,

        /// The number of atoms the molecule should have
        #[arg(long)]
        expect: Option<usize>,
    },

    /// List the connected fragments of a periodic structure
    Fragments {
        /// The periodic structure to read instead of the configured one
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Write the Gaussian geometry optimization input
    OptInput {
        #[command(flatten)]
        io: Io,
    },

    /// Extract the optimized geometry from a Gaussian log
    Geom {
        #[command(flatten)]
        io: Io,
    },

    /// Write the Gaussian single-point input that produces the .wfx file
    WfnInput {
        #[command(flatten)]
        io: Io,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => {
            let default = Path::new("ddecprep.toml");
            if default.exists() {
                Config::load(default)
            } else {
                info!("no ddecprep.toml found, using default options");
                Ok(Config::default())
            }
        }
    }
}

/// replace `input` and `output` with the overrides in `io`, if any
fn apply(io: Io, input: &mut PathBuf, output: &mut PathBuf) {
    if let Some(i) = io.input {
        *input = i;
    }
    if let Some(o) = io.output {
        *output = o;
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    )
    .init();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    if args.json {
        println!("{}", serde_json::to_string(&config)?);
        return Ok(());
    }

    let Some(command) = args.command else {
        bail!("no stage given. see --help for the available subcommands");
    };

    match command {
        Command::Extract {
            io,
            seed,
            center,
            radius,
            fragment,
            expect,
        } => {
            let ex = &mut config.extract;
            if let Some(i) = io.input {
                ex.structure = Some(i);
            }
            if let Some(o) = io.output {
                ex.output = o;
            }
            if let Some(seed) = seed {
                ex.selection = Selection::Seed(seed);
            }
            if let (Some(center), Some(radius)) = (center, radius) {
                ex.selection = Selection::Radius { center, radius };
            }
            if let Some(i) = fragment {
                ex.selection = Selection::Fragment(i);
            }
            if expect.is_some() {
                ex.expected_atoms = expect;
            }
            info!("{config}");
            ddecprep::extract(&config)?;
        }
        Command::Fragments { input } => {
            if input.is_some() {
                config.extract.structure = input;
            }
            ddecprep::fragments(&config, &mut std::io::stdout())?;
        }
        Command::OptInput { io } => {
            apply(io, &mut config.opt.input, &mut config.opt.output);
            info!("{config}");
            ddecprep::opt_input(&config)?;
        }
        Command::Geom { io } => {
            apply(io, &mut config.geom.log, &mut config.geom.output);
            info!("{config}");
            ddecprep::geom(&config)?;
        }
        Command::WfnInput { io } => {
            apply(io, &mut config.wfn.input, &mut config.wfn.output);
            info!("{config}");
            ddecprep::wfn_input(&config)?;
        }
    }

    Ok(())
}
