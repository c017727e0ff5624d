//! scorepad CLI - check, format, schedule and lay out notation text files.

use clap::{Parser, Subcommand};
use scorepad::{compile_with_config, parse, serialize, Config, ParseOutput, Severity, Tempo};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "scorepad")]
#[command(author, version, about = "Compile line-oriented music notation text", long_about = None)]
struct Cli {
    /// YAML config file (title, tempo, layout constants)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Document title (overrides the config)
    #[arg(long, global = true)]
    title: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and print its diagnostics
    Check { file: PathBuf },

    /// Rewrite a file in canonical form
    Format {
        file: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the canonical text even if invalid input would be dropped
        #[arg(long)]
        force: bool,
    },

    /// Print the playback schedule as JSON
    Schedule {
        file: PathBuf,

        /// Tempo in quarter-note BPM (overrides the config)
        #[arg(long)]
        tempo: Option<f64>,
    },

    /// Print the staff geometry and note list as JSON
    Layout {
        file: PathBuf,

        /// Container width in pixels
        #[arg(long, default_value_t = 0.0)]
        width: f64,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(message) = run(cli) {
        eprintln!("Error: {}", message);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    if let Some(title) = cli.title {
        config.title = title;
    }

    match cli.command {
        Commands::Check { file } => {
            let source = read_source(&file)?;
            let output = parse(&source, &config.parse_options());
            print_diagnostics(&file, &output);
            match output.document {
                Some(doc) => {
                    println!(
                        "{}: {} measures, {} notes, {} errors, {} warnings",
                        file.display(),
                        doc.measures.len(),
                        doc.note_count(),
                        output.diagnostics.len(),
                        output.warnings.len()
                    );
                    Ok(())
                }
                None => Err(format!("{}: no valid notes", file.display())),
            }
        }
        Commands::Format {
            file,
            output,
            force,
        } => {
            let source = read_source(&file)?;
            let parsed = parse(&source, &config.parse_options());
            print_diagnostics(&file, &parsed);
            let text = canonical_text(&parsed, force)
                .map_err(|message| format!("{}: {}", file.display(), message))?;
            match output {
                Some(path) => {
                    fs::write(&path, format!("{}\n", text))
                        .map_err(|e| format!("Error writing to '{}': {}", path.display(), e))?;
                    eprintln!("Wrote {}", path.display());
                }
                None => println!("{}", text),
            }
            Ok(())
        }
        Commands::Schedule { file, tempo } => {
            if let Some(bpm) = tempo {
                Tempo::new(bpm).map_err(|e| e.to_string())?;
                config.tempo = bpm;
            }
            let source = read_source(&file)?;
            let compiled =
                compile_with_config(&source, &config, 0.0).map_err(|e| e.to_string())?;
            if compiled.document.is_empty() {
                return Err(scorepad::ScoreError::EmptyDocument.to_string());
            }
            print_json(&compiled.schedule)
        }
        Commands::Layout { file, width } => {
            let source = read_source(&file)?;
            let compiled =
                compile_with_config(&source, &config, width).map_err(|e| e.to_string())?;
            print_json(&serde_json::json!({
                "geometry": compiled.layout,
                "notes": compiled.notes,
            }))
        }
    }
}

fn print_diagnostics(file: &Path, output: &ParseOutput) {
    for d in output.all_messages() {
        let label = match d.severity() {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        eprintln!("{}: {}: {}", file.display(), label, d);
    }
}

/// Canonical text for a parse. Formatting would silently drop every pair that
/// produced a diagnostic, so that needs `force`.
fn canonical_text(output: &ParseOutput, force: bool) -> Result<String, String> {
    if output.has_errors() && !force {
        return Err(format!(
            "{} invalid entries would be dropped (use --force to format anyway)",
            output.diagnostics.len()
        ));
    }
    let doc = output.document.as_ref().ok_or("no valid notes")?;
    Ok(serialize(doc))
}

fn read_source(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Error reading file '{}': {}", path.display(), e))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorepad::ParseOptions;

    fn parsed(text: &str) -> ParseOutput {
        parse(text, &ParseOptions::default())
    }

    #[test]
    fn test_format_refuses_to_drop_input() {
        let err = canonical_text(&parsed("C4 q Z9 q"), false).unwrap_err();
        assert!(err.contains("--force"), "{}", err);
        assert_eq!(canonical_text(&parsed("C4 q Z9 q"), true).unwrap(), "C4 q");
    }

    #[test]
    fn test_format_ignores_capacity_warnings() {
        assert_eq!(canonical_text(&parsed("c4 q d4 q"), false).unwrap(), "C4 q D4 q");
    }

    #[test]
    fn test_format_without_valid_notes() {
        assert_eq!(canonical_text(&parsed("ZZZ 99"), true), Err("no valid notes".to_string()));
    }
}
