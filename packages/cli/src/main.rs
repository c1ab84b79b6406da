//! `kbsync`: knowledge-base entity reconciliation from the command line.
//!
//! Provides four subcommands:
//!
//! - **`validate`**: check a snapshot (and optionally a delta) for shape errors.
//! - **`plan`**: print the reconciled write plan as human-readable text.
//! - **`payload`**: print the JSON edit payload the plan would send.
//! - **`submit`**: fetch an entity, reconcile a delta against it and write it.
//!
//! Snapshots and deltas are JSON, read from a file path or from stdin (`-`).

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use kbsync::render::render_plan;
use kbsync::{validate_delta, validate_document, EditPlan, EntityDelta, EntityDocument};
use kbsync_client::{ClientConfig, EditOptions, EditOutcome, EditSubmitter};
use serde::de::DeserializeOwned;
use tracing::info;

/// kbsync: reconcile knowledge-base entity edits
///
/// Compute the smallest write that brings an entity to the desired state.
#[derive(Parser)]
#[command(name = "kbsync", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an entity snapshot, and optionally a delta against it.
    ///
    /// Exits 0 if everything is valid, 1 otherwise.
    ///
    /// Pass `-` as SNAPSHOT to read from stdin.
    Validate {
        /// Path to the snapshot JSON, or `-` for stdin.
        snapshot: PathBuf,

        /// Path to a delta JSON to validate against the snapshot.
        #[arg(short = 'd', long, value_name = "FILE")]
        delta: Option<PathBuf>,
    },

    /// Reconcile a delta against a snapshot and print the write plan.
    ///
    /// Dirty entries are marked `*`, unchanged ones `=`, and statements the
    /// write removes are listed under `remove:`.
    Plan {
        /// Path to the snapshot JSON, or `-` for stdin.
        snapshot: PathBuf,

        /// Path to the delta JSON, or `-` for stdin.
        delta: PathBuf,
    },

    /// Reconcile a delta against a snapshot and print the edit payload.
    ///
    /// Prints nothing (and says so on stderr) when the delta changes nothing.
    Payload {
        /// Path to the snapshot JSON, or `-` for stdin.
        snapshot: PathBuf,

        /// Path to the delta JSON, or `-` for stdin.
        delta: PathBuf,
    },

    /// Fetch an entity, reconcile a delta against it and submit the edit.
    ///
    /// Prints the entity as stored afterwards. Connection settings come from
    /// the KBSYNC_* environment variables; the flags below override them.
    ///
    /// Examples:
    ///   kbsync submit Q42 delta.json --summary "add occupation"
    ///   KBSYNC_API=https://kb.example.org/w/api.php kbsync submit Q42 - --simulate
    Submit {
        /// Id of the entity to edit, e.g. `Q42`.
        id: String,

        /// Path to the delta JSON, or `-` for stdin.
        delta: PathBuf,

        /// Edit summary.
        #[arg(short = 's', long, value_name = "TEXT")]
        summary: Option<String>,

        /// Action API endpoint.
        #[arg(long, env = "KBSYNC_API", value_name = "URL")]
        api: Option<String>,

        /// Flag the edit as a bot edit.
        #[arg(long)]
        bot: bool,

        /// Log the payload instead of sending it.
        #[arg(long)]
        simulate: bool,

        /// Maximum number of edits to perform.
        #[arg(long, env = "KBSYNC_MAX_EDITS", value_name = "N")]
        max_edits: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kbsync=info,kbsync_client=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { snapshot, delta } => {
            let doc: EntityDocument = parse(&read_input(&snapshot), "snapshot");
            let mut errors = Vec::new();
            if let Err(e) = validate_document(&doc) {
                errors.push(format!("snapshot: {e}"));
            }
            if let Some(path) = delta {
                let delta: EntityDelta = parse(&read_input(&path), "delta");
                if let Err(e) = validate_delta(&delta, &doc.id) {
                    errors.push(format!("delta: {e}"));
                }
            }
            if errors.is_empty() {
                println!("valid");
            } else {
                for e in errors {
                    eprintln!("error in {e}");
                }
                process::exit(1);
            }
        }

        Command::Plan { snapshot, delta } => {
            let (doc, delta) = load_checked(&snapshot, &delta);
            print!("{}", render_plan(&EditPlan::reconcile(&doc, &delta)));
        }

        Command::Payload { snapshot, delta } => {
            let (doc, delta) = load_checked(&snapshot, &delta);
            match EditPlan::reconcile(&doc, &delta).payload() {
                None => eprintln!("kbsync: no changes"),
                Some(payload) => match serde_json::to_string_pretty(&payload) {
                    Ok(json) => println!("{json}"),
                    Err(e) => fatal(&format!("failed to encode payload: {e}")),
                },
            }
        }

        Command::Submit {
            id,
            delta,
            summary,
            api,
            bot,
            simulate,
            max_edits,
        } => {
            let delta: EntityDelta = parse(&read_input(&delta), "delta");
            if let Err(e) = validate_delta(&delta, &id) {
                eprintln!("error in delta: {e}");
                process::exit(1);
            }

            let mut config = ClientConfig::from_env().unwrap_or_else(|e| fatal(&e.to_string()));
            if let Some(api) = api {
                config.api = api;
            }
            if max_edits.is_some() {
                config.max_edits = max_edits;
            }
            config.simulate |= simulate;

            let submitter =
                EditSubmitter::new(config).unwrap_or_else(|e| fatal(&e.to_string()));
            let snapshot = submitter
                .fetch_entity(&id)
                .await
                .unwrap_or_else(|e| fatal(&format!("failed to fetch {id}: {e}")));
            info!("kbsync: fetched {} at revision {}", id, snapshot.revision_id);

            let options = EditOptions { summary, bot };
            let outcome = submitter
                .submit(&snapshot, &delta, &options)
                .await
                .unwrap_or_else(|e| fatal(&format!("failed to edit {id}: {e}")));

            match &outcome {
                EditOutcome::NoOp(_) => eprintln!("kbsync: {id} already up to date"),
                EditOutcome::Simulated { payload, .. } => match serde_json::to_string_pretty(payload) {
                    Ok(json) => eprintln!("kbsync: simulated payload:\n{json}"),
                    Err(e) => fatal(&format!("failed to encode payload: {e}")),
                },
                EditOutcome::Submitted(entity) => {
                    eprintln!("kbsync: {id} now at revision {}", entity.revision_id)
                }
            }
            match serde_json::to_string_pretty(outcome.entity()) {
                Ok(json) => println!("{json}"),
                Err(e) => fatal(&format!("failed to encode entity: {e}")),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read the full contents of `path`, or stdin if `path` is `-`.
fn read_input(path: &PathBuf) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            fatal(&format!("failed to read {}: {}", path.display(), e))
        })
    }
}

fn parse<T: DeserializeOwned>(json: &str, what: &str) -> T {
    serde_json::from_str(json)
        .unwrap_or_else(|e| fatal(&format!("failed to parse input as a {}: {}", what, e)))
}

/// Load a snapshot and a delta and validate both. Exits 1 on a validation
/// failure.
fn load_checked(snapshot: &PathBuf, delta: &PathBuf) -> (EntityDocument, EntityDelta) {
    if snapshot.to_str() == Some("-") && delta.to_str() == Some("-") {
        fatal("snapshot and delta cannot both be read from stdin");
    }
    let doc: EntityDocument = parse(&read_input(snapshot), "snapshot");
    let delta: EntityDelta = parse(&read_input(delta), "delta");

    let checked = validate_document(&doc)
        .map_err(|e| format!("snapshot: {e}"))
        .and_then(|()| validate_delta(&delta, &doc.id).map_err(|e| format!("delta: {e}")));
    if let Err(e) = checked {
        eprintln!("error in {e}");
        process::exit(1);
    }
    (doc, delta)
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("kbsync: {}", msg);
    process::exit(2);
}
