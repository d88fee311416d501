use clap::{Parser, ValueEnum};
use flowbridge::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlatformCli {
    Dify,
    Coze,
    Bailian,
}

impl From<PlatformCli> for Platform {
    fn from(platform: PlatformCli) -> Self {
        match platform {
            PlatformCli::Dify => Platform::Dify,
            PlatformCli::Coze => Platform::Coze,
            PlatformCli::Bailian => Platform::Bailian,
        }
    }
}

/// Converts an exported agent workflow into the unified graph representation
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the exported workflow JSON file
    document_path: String,

    /// The platform the workflow was exported from
    #[arg(short, long, value_enum)]
    from: PlatformCli,

    /// Write the converted graph here instead of printing it
    #[arg(short, long)]
    output: Option<String>,

    /// Write a binary graph artifact instead of JSON (requires --output)
    #[arg(short, long, requires = "output")]
    binary: bool,

    /// Print the conversion report
    #[arg(short, long)]
    report: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FLOWBRIDGE_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("flowbridge=info,warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli);
}

fn run(cli: Cli) {
    let start = Instant::now();
    let platform = Platform::from(cli.from);

    // --- 1. File Loading ---
    let json = fs::read_to_string(&cli.document_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read workflow file '{}': {}",
            &cli.document_path, e
        ))
    });

    // --- 2. Conversion ---
    let conversion = Converter::new(platform)
        .convert_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Conversion failed: {}", e)));
    let duration = start.elapsed();

    // --- 3. Output ---
    match (&cli.output, cli.binary) {
        (Some(path), true) => {
            conversion
                .to_artifact()
                .save(path)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to save artifact: {}", e)));
            eprintln!("Graph artifact written to '{}'", path);
        }
        (Some(path), false) => {
            let json = to_json(&conversion.graph);
            fs::write(path, json).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to write '{}': {}", path, e))
            });
            eprintln!("Graph written to '{}'", path);
        }
        (None, _) => println!("{}", to_json(&conversion.graph)),
    }

    // --- 4. Summary ---
    if cli.report {
        eprintln!("\n--- Conversion Report ({} -> unified) ---", platform);
        eprint!("{}", conversion.report);
        eprintln!("Total Conversion:     {:?}", duration);
    }
}

fn to_json(graph: &Graph) -> String {
    serde_json::to_string_pretty(graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize graph: {}", e)))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
