//! Command-line interface for stanzaschema

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use stanzaschema::codegen::{generate, RustSink};
#[cfg(feature = "cli")]
use stanzaschema::schema::{load_schema, schema_to_string, Schema, ScopeId};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "stanzaschema")]
#[command(author, version, about = "Schema compiler for the stanza text format", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a schema file and report its structure
    Check {
        /// Path to the schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,
    },

    /// Print the canonical serialization of a schema
    Format {
        /// Path to the schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate Rust bindings for a schema
    Generate {
        /// Path to the schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Crate path the generated code uses to reach this library
        #[arg(long, default_value = "stanzaschema")]
        crate_path: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { schema } => cmd_check(schema),
        Commands::Format { schema, output } => cmd_format(schema, output),
        Commands::Generate {
            schema,
            crate_path,
            output,
        } => cmd_generate(schema, crate_path, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn load_schema_file(path: &PathBuf) -> Result<Schema, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(load_schema(&text)?)
}

#[cfg(feature = "cli")]
fn cmd_check(schema_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let schema = load_schema_file(&schema_path)?;

    let mut counts = Counts::default();
    tally(&schema, schema.root_scope(), &mut counts);

    let root = schema.resolve_root_element()?;

    println!("stanzaschema v{}", stanzaschema::VERSION);
    println!();
    println!("Schema Information:");
    println!("  Root Element: {}", schema.element(root).name());
    println!(
        "  Top-Level Elements: {}",
        schema.top_level_element_count()
    );
    println!();
    println!("Statistics:");
    println!("  Enum Types: {}", counts.value_types);
    println!("  Structs: {}", counts.structs);
    println!("  Attributes: {}", counts.attributes);
    println!("  Elements: {}", counts.elements);

    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Default)]
struct Counts {
    value_types: usize,
    structs: usize,
    attributes: usize,
    elements: usize,
}

#[cfg(feature = "cli")]
fn tally(schema: &Schema, scope: ScopeId, counts: &mut Counts) {
    let defs = schema.definitions(scope);
    counts.value_types += defs.value_types().len();
    counts.structs += defs.structs().len();
    counts.attributes += defs.attributes().len();
    counts.elements += defs.elements().len();
    for (_, id) in defs.elements().iter() {
        tally(schema, schema.element(id).scope(), counts);
    }
}

#[cfg(feature = "cli")]
fn cmd_format(
    schema_path: PathBuf,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = load_schema_file(&schema_path)?;
    let text = schema_to_string(&schema)?;

    if let Some(output_path) = output {
        fs::write(output_path, &text)?;
    } else {
        print!("{}", text);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_generate(
    schema_path: PathBuf,
    crate_path: String,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = load_schema_file(&schema_path)?;

    let mut sink = RustSink::with_crate_path(crate_path);
    generate(&schema, &mut sink)?;
    let source = sink.source()?;

    if let Some(output_path) = output {
        fs::write(output_path, &source)?;
    } else {
        print!("{}", source);
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
