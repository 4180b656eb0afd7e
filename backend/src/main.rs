//! Tabcheck CLI - Validate delimited files against column schemas
//!
//! # Main Commands
//!
//! ```bash
//! tabcheck serve                          # Start HTTP server (port 3000)
//! tabcheck validate input.csv -s schema.json   # Validate a file
//! tabcheck schema list                    # Manage stored schemas
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! tabcheck inspect input.csv              # Show encoding/delimiter/headers
//! tabcheck example-schema                 # Show an example schema definition
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tabcheck::{
    content_lines, decode_content, detect_delimiter, detect_encoding, split_line,
    SchemaDefinition, SchemaRegistry, Validator,
};

#[derive(Parser)]
#[command(name = "tabcheck")]
#[command(about = "Validate delimited files against column schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a delimited file against a schema definition
    Validate {
        /// Input file (CSV or other delimited format)
        input: PathBuf,

        /// Schema definition JSON file
        #[arg(short, long)]
        schema: PathBuf,

        /// Output file for the validation report (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Accept files where only some rows validate
        #[arg(long)]
        partial: bool,

        /// Reject files with more than this many data rows
        #[arg(long)]
        max_rows: Option<usize>,

        /// Field delimiter (overrides the schema's delimiter)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Show encoding, delimiter, headers and row count of a file
    Inspect {
        /// Input file
        input: PathBuf,
    },

    /// Show an example schema definition
    ExampleSchema,

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Directory for uploads and stored schemas (default: .tabcheck)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Manage stored schema definitions
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },
}

#[derive(Subcommand)]
enum SchemaAction {
    /// List all stored schemas
    List,

    /// Import a schema definition JSON file
    Import {
        /// Schema definition JSON file to import
        file: PathBuf,
        /// Name for the schema
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show details of a stored schema
    Show {
        /// Schema ID
        id: String,
    },

    /// Delete a stored schema
    Delete {
        /// Schema ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            input,
            schema,
            output,
            partial,
            max_rows,
            delimiter,
        } => cmd_validate(
            &input,
            &schema,
            output.as_deref(),
            partial,
            max_rows,
            delimiter,
        ),

        Commands::Inspect { input } => cmd_inspect(&input),

        Commands::ExampleSchema => cmd_example_schema(),

        Commands::Serve { port, data_dir } => cmd_serve(port, data_dir).await,

        Commands::Schema { action } => cmd_schema(action),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_validate(
    input: &Path,
    schema: &Path,
    output: Option<&Path>,
    partial: bool,
    max_rows: Option<usize>,
    delimiter: Option<char>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Validating: {}", input.display());

    let bytes = fs::read(input)?;
    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding);

    let schema_json = fs::read_to_string(schema)?;
    let mut definition = SchemaDefinition::from_json(&schema_json)
        .map_err(|errors| format!("Invalid schema definition: {}", errors.join("; ")))?;

    if partial {
        definition.config.allow_partial_upload = true;
    }
    if let Some(limit) = max_rows {
        definition.config.max_rows = Some(limit);
    }
    if let Some(d) = delimiter {
        definition.config.delimiter = d;
    }

    eprintln!("   Encoding: {}", encoding);
    eprintln!(
        "   Delimiter: '{}'",
        format_delimiter(definition.config.delimiter)
    );
    eprintln!("   Schema: {} ({} columns)", definition.name, definition.columns.len());

    let validator = Validator::new(definition.config, definition.columns)?;
    let result = validator.validate_content(&content);

    eprintln!("\n✔️  Validation:");
    if result.errors.is_empty() {
        eprintln!("   ✅ All {} rows valid!", result.valid_rows);
    } else {
        eprintln!("   ✅ Valid rows: {}", result.valid_rows);
        eprintln!("   ❌ Findings: {}", result.errors.len());
        for err in result.errors.iter().take(5) {
            eprintln!("     - {}", err);
        }
        if result.errors.len() > 5 {
            eprintln!("     ... and {} more", result.errors.len() - 5);
        }
    }

    let json = serde_json::to_string_pretty(&result)?;
    write_output(&json, output)?;

    if !result.is_valid {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", input.display());

    let bytes = fs::read(input)?;
    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding);

    let lines = content_lines(&content);
    if lines.is_empty() {
        return Err("File has no content lines".into());
    }

    let delimiter = detect_delimiter(&content);
    let headers = split_line(lines[0], delimiter)?;

    eprintln!("   Encoding: {}", encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(delimiter));
    eprintln!("   Columns: {}", headers.join(", "));
    eprintln!("✅ Found {} data rows", lines.len() - 1);

    let registry = SchemaRegistry::new();
    let matches = registry.find_compatible(&headers);
    if !matches.is_empty() {
        eprintln!("\n📋 Compatible stored schemas:");
        for (schema, score) in matches {
            eprintln!(
                "   📄 {} ({}) - {:.0}% column match",
                schema.definition.name,
                schema.id,
                score * 100.0
            );
        }
    }

    Ok(())
}

fn cmd_example_schema() -> Result<(), Box<dyn std::error::Error>> {
    let definition = tabcheck::example_definition();
    println!("{}", definition.to_json()?);
    Ok(())
}

async fn cmd_serve(port: u16, data_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let dir = data_dir
        .or_else(|| std::env::var("TABCHECK_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".tabcheck"));
    tabcheck::server::start_server(port, dir).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

fn cmd_schema(action: SchemaAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = SchemaRegistry::new();

    match action {
        SchemaAction::List => {
            let mut schemas = registry.list();
            if schemas.is_empty() {
                eprintln!("📋 No schemas stored yet.");
                eprintln!("   Use 'tabcheck schema import <file>' to add one.");
                return Ok(());
            }
            schemas.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            eprintln!("📋 Stored schemas ({}):\n", schemas.len());
            for s in schemas {
                println!("  📄 {} ({})", s.definition.name, s.id);
                println!(
                    "     Columns: {}",
                    s.definition
                        .columns
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                println!("     Success rate: {:.0}%", s.success_rate * 100.0);
                println!("     Uses: {}", s.use_count);
                if let Some(ref last) = s.last_used {
                    println!("     Last used: {}", last);
                }
                println!();
            }
        }

        SchemaAction::Import { file, name } => {
            let schema_name = name.as_deref().unwrap_or_else(|| {
                file.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("imported")
            });

            eprintln!("📥 Importing schema from: {}", file.display());
            let id = registry.import(&file, Some(schema_name))?;
            eprintln!("✅ Schema saved with ID: {}", id);
        }

        SchemaAction::Show { id } => {
            match registry.get(&id) {
                Some(s) => {
                    println!("📄 Schema: {} ({})\n", s.definition.name, s.id);
                    println!(
                        "Columns: {}",
                        s.definition
                            .columns
                            .iter()
                            .map(|c| c.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    println!("Created: {}", s.created_at);
                    println!("Success rate: {:.0}%", s.success_rate * 100.0);
                    println!("Uses: {}", s.use_count);
                    println!("\nDefinition:");
                    println!("{}", s.definition.to_json()?);
                }
                None => {
                    return Err(format!("Schema not found: {}", id).into());
                }
            }
        }

        SchemaAction::Delete { id } => {
            registry.delete(&id)?;
            eprintln!("🗑️  Schema deleted: {}", id);
        }
    }

    Ok(())
}
