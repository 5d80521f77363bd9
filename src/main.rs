//! Command-line interface for sdata-schema

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use sdata::exports::SchemaDump;
#[cfg(feature = "cli")]
use sdata::limits::Limits;
#[cfg(feature = "cli")]
use sdata::schema::{compile_files, CompilerOptions};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "sdata")]
#[command(author, version, about = "SData schema compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile schema files and report diagnostics
    Compile {
        /// Schema parse-tree files in JSON form
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Print the compiled symbol graph as JSON
        #[arg(short, long)]
        json: bool,

        /// Write the symbol graph to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Limits preset: default, strict or permissive
        #[arg(short, long, default_value = "default")]
        limits: String,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            files,
            json,
            output,
            limits,
        } => cmd_compile(files, json, output, limits),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_compile(
    files: Vec<PathBuf>,
    json: bool,
    output: Option<PathBuf>,
    limits: String,
) -> Result<bool, Box<dyn std::error::Error>> {
    let limits = match limits.to_lowercase().as_str() {
        "default" => Limits::default(),
        "strict" => Limits::strict(),
        "permissive" => Limits::permissive(),
        _ => {
            return Err(format!(
                "unknown limits preset: {}. Use: default, strict, permissive",
                limits
            )
            .into())
        }
    };

    let result = compile_files(&files, &CompilerOptions { limits });

    for diagnostic in &result.diagnostics {
        eprintln!("{}", diagnostic);
    }

    let Some(schema) = result.schema.as_ref().filter(|_| result.is_valid) else {
        eprintln!("✗ {} error(s)", result.errors().count());
        return Ok(false);
    };

    if json || output.is_some() {
        let dump = SchemaDump::from_schema(schema);
        match output {
            Some(path) => dump.write_to(&path, true)?,
            None => println!("{}", dump.to_json(true)?),
        }
    } else {
        let dump = SchemaDump::from_schema(schema);
        for namespace in &dump.namespaces {
            println!("{} ({} members)", namespace.uri, namespace.members.len());
        }
        println!("✓ Schema is valid");
    }
    Ok(true)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
