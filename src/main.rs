use anyhow::Context;
use clap::{Parser, Subcommand};
use filtergraph::{Catalog, GraphScript, Session, catalog};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "filtergraph")]
#[command(about = "Compile graph scripts into ffmpeg filtergraph text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a graph script (validates pipes while building).
    Compile {
        #[arg(long)]
        script: String,

        /// catalog.json produced by the `catalog` command.
        #[arg(long, conflicts_with = "filters")]
        catalog: Option<String>,

        /// Raw `ffmpeg -filters` output, parsed on the fly.
        #[arg(long)]
        filters: Option<String>,

        /// Write the graph here instead of stdout.
        #[arg(short = 'o', long)]
        out: Option<String>,
    },
    /// Convert `ffmpeg -filters` output into catalog.json.
    Catalog {
        #[arg(long)]
        filters: String,

        #[arg(short = 'o', long)]
        out: String,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the compiled graph.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Compile {
            script,
            catalog,
            filters,
            out,
        } => {
            // 1) Catalog: builtin helpers plus whatever the caller supplied.
            let catalog = match (catalog, filters) {
                (Some(path), _) => Catalog::load(&path)?,
                (None, Some(path)) => {
                    let mut c = Catalog::builtin();
                    c.extend(catalog::parse_filters_file(&path)?);
                    c
                }
                (None, None) => Catalog::builtin(),
            };
            tracing::debug!(?catalog, "catalog ready");

            // 2) Build + validate.
            let script = GraphScript::load(&script)?;
            let mut session = Session::with_catalog(catalog);
            let exports = script
                .build(&mut session)
                .context("build graph script")?;
            session.complete(exports).context("complete graph")?;

            // 3) Emit.
            let graph = session.render();
            match out {
                Some(path) => {
                    std::fs::write(&path, graph)?;
                    println!("Wrote {}", path);
                }
                None => println!("{}", graph),
            }
        }
        Commands::Catalog { filters, out } => {
            let specs = catalog::parse_filters_file(&filters)?;
            let mut c = Catalog::new();
            c.extend(specs);
            let json = serde_json::to_string_pretty(&c.to_file())?;
            std::fs::write(&out, json)?;
            println!("Wrote {}", out);
        }
    }

    Ok(())
}
