//! Centralise CLI - clean retail tables and load them into the warehouse
//!
//! # Commands
//!
//! ```bash
//! centralise run                               # Extract, clean and load every configured source
//! centralise clean users legacy_users.csv     # Clean one exported table
//! centralise serve                             # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! centralise parse orders_table.csv           # Parse a CSV/JSON source to JSON records
//! centralise destinations                      # Show the loader mapping
//! ```

use clap::{Parser, Subcommand};
use centralise::load::{write_table, DESTINATIONS, FALLBACK_DESTINATION};
use centralise::pipeline::clean_file;
use centralise::{read_table_file, run_pipeline, Entity, OutputFormat, PipelineConfig};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "centralise")]
#[command(about = "Clean retail business tables and load them into the warehouse", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean one table with its entity's rules
    Clean {
        /// Entity the table holds
        #[arg(value_enum)]
        entity: Entity,

        /// Input CSV or JSON file
        input: PathBuf,

        /// Output file (default: stdout as JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format when writing to a file
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Extract, clean and load every configured source
    Run {
        /// Loader destination directory (overrides OUTPUT_DIR)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Loader file format (overrides OUTPUT_FORMAT)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Parse a CSV or JSON source and output JSON records
    Parse {
        /// Input CSV or JSON file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show where each cleaned table is loaded
    Destinations,

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean {
            entity,
            input,
            output,
            format,
        } => cmd_clean(entity, &input, output.as_deref(), format),

        Commands::Run { output_dir, format } => cmd_run(output_dir, format).await,

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Destinations => cmd_destinations(),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_clean(
    entity: Entity,
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🧹 Cleaning {} from {}", entity, input.display());

    let result = clean_file(entity, input)?;

    eprintln!("   Rows in:  {}", result.rows_in);
    eprintln!("   Rows out: {}", result.rows_out());
    eprintln!("   Columns:  {}", result.table.columns().join(", "));

    match output {
        Some(path) => {
            write_table(path, &result.table, format)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&result.table.to_records())?;
            println!("{}", json);
        }
    }

    eprintln!("✅ Done");
    Ok(())
}

async fn cmd_run(
    output_dir: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(format) = format {
        config.output_format = format;
    }

    eprintln!(
        "🚚 Loading into {} ({})",
        config.output_dir.display(),
        config.output_format
    );

    let summary = run_pipeline(&config).await?;

    eprintln!("\n📊 Run {}", summary.run_id);
    for entity in &summary.entities {
        eprintln!(
            "   {:<11} {:>7} -> {:<7} {}{}",
            entity.entity.to_string(),
            entity.rows_in,
            entity.rows_out,
            entity.destination,
            if entity.fallback { " (fallback)" } else { "" }
        );
    }
    for entity in &summary.skipped {
        eprintln!("   {:<11} skipped (no source)", entity.to_string());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let table = read_table_file(input)?;
    eprintln!("   Columns: {}", table.columns().join(", "));
    eprintln!("✅ Parsed {} records", table.len());

    let json = serde_json::to_string_pretty(&table.to_records())?;
    match output {
        Some(p) => {
            fs::write(p, json)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_destinations() -> Result<(), Box<dyn std::error::Error>> {
    for entity in Entity::ALL {
        let name = entity.clean_table_name();
        let table = DESTINATIONS
            .iter()
            .find(|(logical, _)| *logical == name)
            .map(|(_, table)| *table)
            .unwrap_or(FALLBACK_DESTINATION);
        println!("{:<11} {:<19} -> {}", entity.to_string(), name, table);
    }
    println!("{:<11} {:<19} -> {}", "", "(unmapped)", FALLBACK_DESTINATION);
    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    centralise::server::start_server(port).await?;
    Ok(())
}
