use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crossnav::project::Project;
use crossnav::query::FollowQuery;
use crossnav::types::Location;

/// Follow-symbol navigation over a pre-built cross-reference index.
#[derive(Parser)]
#[command(name = "crossnav", about = "Follow-symbol navigation over a cross-reference index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new crossnav project
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
    },
    /// Load an index snapshot (JSON) into the project database
    Load {
        /// Path to the snapshot file
        snapshot: String,
        /// Project path (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
        /// Clear existing data first instead of skipping unchanged files
        #[arg(short, long)]
        force: bool,
    },
    /// Follow the symbol at a location, printed as the destination location
    Follow {
        /// Source location as <file-path>:<byte-offset>
        location: String,
        /// Project path (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
        /// Prefer the matching declaration over a definition
        #[arg(short, long)]
        declaration_only: bool,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Show index statistics
    Status {
        /// Project path (default: current directory)
        path: Option<String>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// List the indexed occurrences of a file
    Dump {
        /// File path as recorded in the index
        file: String,
        /// Project path (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> crossnav::errors::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            let project_path = resolve_path(path);
            Project::init(&project_path)?;
            println!("Initialized crossnav at {}", project_path.display());
        }
        Commands::Load {
            snapshot,
            path,
            force,
        } => {
            let project_path = resolve_path(path);
            let project = Project::open(&project_path)?;
            if force {
                project.clear_index()?;
            }
            let json = std::fs::read_to_string(&snapshot)?;
            let result = project.load_snapshot_json(&json)?;
            println!(
                "Loaded {} files ({} unchanged, {} removed), {} occurrences in {}ms",
                result.file_count,
                result.files_unchanged,
                result.files_removed,
                result.occurrence_count,
                result.duration_ms
            );
        }
        Commands::Follow {
            location,
            path,
            declaration_only,
            json,
        } => {
            let project_path = resolve_path(path);
            let project = Project::open(&project_path)?;
            let source = parse_location(&location, &project)?;
            let query = FollowQuery::new(source)
                .declaration_only(declaration_only || project.config().declaration_only);

            match project.follow(&query) {
                Some(dest) => {
                    let dest_path = project.files().path(dest.file_id).unwrap_or("?");
                    if json {
                        println!(
                            "{}",
                            serde_json::json!({
                                "path": dest_path,
                                "offset": dest.offset,
                            })
                        );
                    } else {
                        println!("{}:{}", dest_path, dest.offset);
                    }
                }
                None => {
                    // No navigation target is a normal outcome.
                    if json {
                        println!("null");
                    }
                }
            }
        }
        Commands::Status { path, json } => {
            let project_path = resolve_path(path);
            let project = Project::open(&project_path)?;
            let stats = project.stats()?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&stats).unwrap_or_default()
                );
            } else {
                println!("crossnav status");
                println!("  Files:        {}", stats.file_count);
                println!("  Occurrences:  {}", stats.occurrence_count);
                println!("  Targets:      {}", stats.target_count);
                println!("  Error files:  {}", stats.error_file_count);
                println!("  DB size:      {} bytes", stats.db_size_bytes);
            }
        }
        Commands::Dump { file, path } => {
            let project_path = resolve_path(path);
            let project = Project::open(&project_path)?;
            let file_id = match project.files().file_id(&file) {
                Some(id) => id,
                None => {
                    println!("File '{}' is not in the index", file);
                    return Ok(());
                }
            };
            for (loc, occurrence, from_error_parse) in project.file_occurrences(file_id) {
                println!(
                    "{}:{} {} ({}){}{}{}",
                    file,
                    loc.offset,
                    occurrence.name,
                    occurrence.kind.as_str(),
                    if occurrence.is_definition {
                        " def"
                    } else {
                        ""
                    },
                    if occurrence.targets.is_empty() {
                        String::new()
                    } else {
                        format!(" -> {} target(s)", occurrence.targets.len())
                    },
                    if from_error_parse { " [error-parse]" } else { "" },
                );
            }
        }
    }
    Ok(())
}

/// Parses `<file-path>:<byte-offset>` into a `Location` using the project's
/// file table. The path may itself contain colons; the offset is everything
/// after the last one.
fn parse_location(raw: &str, project: &Project) -> crossnav::errors::Result<Location> {
    let err = |message: String| crossnav::errors::CrossNavError::Query { message };

    let (path, offset_str) = raw
        .rsplit_once(':')
        .ok_or_else(|| err(format!("invalid location '{}', expected <path>:<offset>", raw)))?;

    let offset: u32 = offset_str
        .parse()
        .map_err(|_| err(format!("invalid offset '{}' in location '{}'", offset_str, raw)))?;

    let file_id = project
        .files()
        .file_id(path)
        .ok_or_else(|| err(format!("file '{}' is not in the index", path)))?;

    Ok(Location::new(file_id, offset))
}

/// Resolves an optional path argument to an absolute `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
