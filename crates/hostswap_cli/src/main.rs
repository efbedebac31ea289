use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use hostswap_core::core_api::{
    BACKUP_SUFFIX, CoreError, CoreErrorCode, Engine, SaveFolder, SaveTexts, backup_path,
};
use hostswap_core::markup::{self, Element};
use hostswap_core::repair::NilFieldRepair;
use hostswap_render::{
    document_to_json, element_to_json, render_report_json, render_report_text,
    render_roster_json, render_roster_text,
};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the host and the farmhands that could take over.
    List {
        /// Save directory or main save file.
        #[arg(value_name = "SAVE")]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Make a farmhand the host and rewrite both save files.
    Migrate {
        /// Save directory or main save file.
        #[arg(value_name = "SAVE")]
        path: PathBuf,
        /// Slot of the farmhand to promote, as shown by `list`.
        #[arg(long, value_name = "INDEX")]
        farmhand: usize,
        /// Run the migration without writing anything.
        #[arg(long = "dry-run")]
        dry_run: bool,
        #[arg(long)]
        json: bool,
    },
    /// Re-serialize a document and restore its nil markers.
    Repair {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// Write here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a document, or one element of it, as flattened JSON.
    Dump {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// Child tags below the root, separated by '/'.
        #[arg(long = "path", value_name = "A/B/C")]
        element_path: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::List { path, json } => run_list(&path, json),
        Command::Migrate {
            path,
            farmhand,
            dry_run,
            json,
        } => run_migrate(&path, farmhand, dry_run, json),
        Command::Repair { path, output } => run_repair(&path, output.as_deref()),
        Command::Dump { path, element_path } => run_dump(&path, element_path.as_deref()),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_list(path: &Path, json: bool) {
    let (_, texts) = read_save_folder(path);
    let session = Engine::new().open(&texts.main, None).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", path.display());
        eprintln!("  {e}");
        process::exit(1);
    });
    let roster = session.roster().unwrap_or_else(|e| {
        eprintln!("Error listing players: {e}");
        process::exit(1);
    });

    if json {
        print_json(&render_roster_json(&roster));
        return;
    }
    print!("{}", render_roster_text(&roster));
}

fn run_migrate(path: &Path, farmhand: usize, dry_run: bool, json: bool) {
    let (folder, texts) = read_save_folder(path);
    if folder.companion.is_none() {
        warn!(
            main = %folder.main.display(),
            "no SaveGameInfo next to the save; only the main file will be updated"
        );
    }

    let mut session = Engine::new().open_texts(&texts).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", path.display());
        eprintln!("  {e}");
        process::exit(1);
    });
    let report = session.migrate_host(farmhand).unwrap_or_else(|e| {
        eprintln!("Error migrating host: {e}");
        process::exit(1);
    });

    let save_text = session.render_save();
    let companion_text = session.render_companion();

    if dry_run {
        info!("dry run; nothing written");
    } else {
        persist(&folder, &texts, &save_text, companion_text.as_deref()).unwrap_or_else(|e| {
            eprintln!("Error writing save files: {e}");
            process::exit(1);
        });
    }

    if json {
        print_json(&render_report_json(&report));
        return;
    }
    print!("{}", render_report_text(&report));
    if dry_run {
        println!("Dry run: no files were written.");
    } else {
        println!(
            "Wrote {} (backup: {}{BACKUP_SUFFIX})",
            folder.main.display(),
            folder.main.display()
        );
        if let Some(companion) = &folder.companion {
            println!(
                "Wrote {} (backup: {}{BACKUP_SUFFIX})",
                companion.display(),
                companion.display()
            );
        }
    }
}

fn run_repair(path: &Path, output: Option<&Path>) {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    let document = markup::parse(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing {}: {e}", path.display());
        process::exit(1);
    });

    let (repaired, count) = NilFieldRepair::default().repair_counted(&markup::serialize(&document));
    info!(count, file = %path.display(), "nil markers restored");

    match output {
        Some(out_path) => {
            fs::write(out_path, repaired).unwrap_or_else(|e| {
                eprintln!("Error writing {}: {e}", out_path.display());
                process::exit(1);
            });
            println!(
                "Wrote repaired document to {} ({count} fields marked nil)",
                out_path.display()
            );
        }
        None => println!("{repaired}"),
    }
}

fn run_dump(path: &Path, element_path: Option<&str>) {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    let document = markup::parse(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing {}: {e}", path.display());
        process::exit(1);
    });

    let value = match element_path {
        Some(tags) => {
            let element = select_element(&document.root, tags).unwrap_or_else(|| {
                eprintln!("Error: no element at {tags} below <{}>", document.root.tag);
                process::exit(1);
            });
            element_to_json(element)
        }
        None => document_to_json(&document),
    };
    print_json(&value);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_save_folder(path: &Path) -> (SaveFolder, SaveTexts) {
    let folder = SaveFolder::locate(path).unwrap_or_else(|e| {
        eprintln!("Error locating save: {e}");
        process::exit(1);
    });
    debug!(
        main = %folder.main.display(),
        companion = ?folder.companion,
        "save folder resolved"
    );
    let texts = folder.read().unwrap_or_else(|e| {
        eprintln!("Error reading save: {e}");
        process::exit(1);
    });
    (folder, texts)
}

/// Backs up both documents, then overwrites them. A failure before the main
/// file is touched leaves everything as it was; a failure on the companion
/// puts the main file back from its backup.
fn persist(
    folder: &SaveFolder,
    originals: &SaveTexts,
    save_text: &str,
    companion_text: Option<&str>,
) -> Result<(), CoreError> {
    let companion = folder.companion.as_deref().zip(companion_text);

    copy_file(&folder.main, &backup_path(&folder.main))?;
    if let Some((companion_path, _)) = companion {
        copy_file(companion_path, &backup_path(companion_path))?;
    }

    write_file(&folder.main, save_text)?;
    if let Some((companion_path, text)) = companion {
        if let Err(e) = write_file(companion_path, text) {
            match write_file(&folder.main, &originals.main) {
                Ok(()) => warn!(
                    main = %folder.main.display(),
                    "restored main save after failed write"
                ),
                Err(restore) => {
                    warn!(error = %restore, "could not restore main save; use its backup")
                }
            }
            return Err(e);
        }
    }

    info!(main = %folder.main.display(), "save files written");
    Ok(())
}

fn copy_file(from: &Path, to: &Path) -> Result<(), CoreError> {
    fs::copy(from, to).map(|_| ()).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to back up {} to {}: {e}", from.display(), to.display()),
        )
    })
}

fn write_file(path: &Path, text: &str) -> Result<(), CoreError> {
    fs::write(path, text).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to write {}: {e}", path.display()),
        )
    })
}

fn select_element<'a>(root: &'a Element, tags: &str) -> Option<&'a Element> {
    let segments: Vec<&str> = tags
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    root.descend(&segments)
}

fn print_json(value: &JsonValue) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    });
    println!("{rendered}");
}
