use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use qtic::{CompileOptions, CompileOutcome, compile_item_json};

#[derive(Parser)]
#[command(name = "qtic", version, about = "qtic - assessment content to QTI 3.0 XML compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source item (JSON) to QTI XML
    Compile {
        /// Input JSON file with the source item
        input: PathBuf,

        /// Output XML file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the item title
        #[arg(long)]
        title: Option<String>,

        /// Omit the XML declaration
        #[arg(long)]
        no_declaration: bool,
    },
    /// Print version info
    Version,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            title,
            no_declaration,
        } => {
            let json = match fs::read_to_string(&input) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error reading {}: {}", input.display(), e);
                    return ExitCode::from(2);
                }
            };

            let options = CompileOptions {
                title,
                xml_declaration: !no_declaration,
                ..CompileOptions::default()
            };

            match compile_item_json(&json, &options) {
                Ok(CompileOutcome::Compiled(item)) => match output {
                    Some(path) => {
                        if let Err(e) = fs::write(&path, &item.xml) {
                            eprintln!("Error writing {}: {}", path.display(), e);
                            return ExitCode::from(2);
                        }
                        eprintln!(
                            "Wrote {} ({})",
                            path.display(),
                            item.metadata.item_identifier
                        );
                        ExitCode::SUCCESS
                    }
                    None => {
                        println!("{}", item.xml);
                        ExitCode::SUCCESS
                    }
                },
                Ok(CompileOutcome::CannotMigrate { slot, reason }) => {
                    eprintln!("Cannot migrate: {slot}: {reason}");
                    ExitCode::from(1)
                }
                Err(e) => {
                    eprintln!("Compile error: {e}");
                    ExitCode::from(2)
                }
            }
        }
        Commands::Version => {
            println!("qtic {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
    }
}
