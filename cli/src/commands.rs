//! Command implementations for the opsdesk CLI

use crate::cli::{Commands, CreatorCommand, SubmissionCommand};
use crate::output::{JsonFormatter, PrettyPrinter};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use opsdesk_core::config::{self, Config};
use opsdesk_core::ingest::{self, IngestResult};
use opsdesk_core::registry::{self, CreatorFilter, NewCreator};
use opsdesk_core::schema::IngestMode;
use opsdesk_core::snapshot::{EditTarget, Snapshot, SnapshotFilter};
use opsdesk_core::submission::{self, NewSubmission};
use opsdesk_core::{Session, Store};
use std::fs;
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands, workspace_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Init => init_command(workspace_path),
        Commands::Modes => modes_command(),
        Commands::Targets => targets_command(),
        Commands::Ingest {
            file,
            mode,
            append,
            json,
        } => ingest_command(workspace_path, &file, &mode, append, json),
        Commands::Creator { command } => match command {
            CreatorCommand::Add {
                agency,
                tiktok_id,
                followers,
                full_name,
                domicile,
                uid,
                phone,
                notes,
            } => creator_add_command(
                workspace_path,
                NewCreator {
                    agency_name: agency,
                    tiktok_id,
                    followers,
                    full_name,
                    domicile,
                    uid,
                    phone,
                    notes,
                },
            ),
            CreatorCommand::List {
                tiktok_id,
                start,
                end,
                json,
            } => creator_list_command(workspace_path, tiktok_id, start, end, json),
        },
        Commands::Submission { command } => match command {
            SubmissionCommand::Add {
                tiktok_id,
                category,
                post_type,
                link,
                posting_date,
            } => submission_add_command(
                workspace_path,
                tiktok_id,
                category,
                post_type,
                link,
                posting_date,
            ),
        },
        Commands::Export {
            target,
            start,
            end,
            id_like,
            json,
        } => export_command(workspace_path, &target, start, end, id_like, json),
        Commands::Diff { json } => diff_command(workspace_path, json),
        Commands::Apply { json } => apply_command(workspace_path, json),
    }
}

fn workspace_root(workspace_path: Option<&Path>) -> Result<PathBuf> {
    match workspace_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}

fn open_session(root: &Path, config: &Config) -> Result<Session> {
    let store = Store::open(&config.database_path(root))?;
    Ok(Session::new(store)?)
}

/// Initialize the workspace directory and operational tables
fn init_command(workspace_path: Option<&Path>) -> Result<()> {
    let root = workspace_root(workspace_path)?;
    let config = config::get_config(&root)?;

    let database_path = config.database_path(&root);
    open_session(&root, &config)?;

    println!("✅ Initialized opsdesk workspace at: {}", root.display());
    println!("📁 Database: {}", database_path.display());
    Ok(())
}

fn modes_command() -> Result<()> {
    println!("📥 Ingestion modes:");
    for mode in IngestMode::builtin() {
        println!("├─ {} → {}", mode.name, mode.qualified_table());
        println!("│  └─ columns: {}", mode.required_columns().join(", "));
    }
    Ok(())
}

fn targets_command() -> Result<()> {
    println!("✏️  Edit targets:");
    for target in EditTarget::builtin() {
        let tracked: Vec<&str> = target.tracked.iter().map(|f| f.column()).collect();
        println!("├─ {} → {}", target.name, target.table);
        println!("│  └─ editable: {}", tracked.join(", "));
    }
    Ok(())
}

fn ingest_command(
    workspace_path: Option<&Path>,
    file: &Path,
    mode_name: &str,
    append: bool,
    json: bool,
) -> Result<()> {
    let root = workspace_root(workspace_path)?;
    let config = config::get_config(&root)?;
    let mut session = open_session(&root, &config)?;

    let mode = IngestMode::find(mode_name)?;
    let (columns, records) = ingest::read_upload(session.store(), file)?;
    let result: IngestResult =
        ingest::ingest(session.store_mut(), &mode, &columns, &records, !append)?;

    if json {
        println!("{}", JsonFormatter::format_ingest_result(&result)?);
    } else {
        PrettyPrinter::print_ingest_result(&mode, &result, !append);
    }
    Ok(())
}

fn creator_add_command(workspace_path: Option<&Path>, creator: NewCreator) -> Result<()> {
    let root = workspace_root(workspace_path)?;
    let config = config::get_config(&root)?;
    let session = open_session(&root, &config)?;

    let id = registry::insert_creator(session.store(), &creator)?;
    println!("✅ Creator saved with id {id}");
    println!("🔗 https://www.tiktok.com/@{}", creator.tiktok_id.trim());
    Ok(())
}

fn creator_list_command(
    workspace_path: Option<&Path>,
    tiktok_id: Option<String>,
    start: Option<String>,
    end: Option<String>,
    json: bool,
) -> Result<()> {
    let root = workspace_root(workspace_path)?;
    let config = config::get_config(&root)?;
    let session = open_session(&root, &config)?;

    let filter = CreatorFilter {
        tiktok_id,
        start_date: start.as_deref().map(parse_date).transpose()?,
        end_date: end.as_deref().map(parse_date).transpose()?,
    };
    let rows = registry::fetch_creators(session.store(), &filter)?;
    if json {
        println!("{}", JsonFormatter::format_rows(&rows)?);
    } else if rows.is_empty() {
        println!("No creator data available.");
    } else {
        PrettyPrinter::print_creator_table(&rows);
    }
    Ok(())
}

fn submission_add_command(
    workspace_path: Option<&Path>,
    tiktok_id: String,
    category: String,
    post_type: String,
    link: String,
    posting_date: Option<String>,
) -> Result<()> {
    let root = workspace_root(workspace_path)?;
    let config = config::get_config(&root)?;
    let session = open_session(&root, &config)?;

    let submission = NewSubmission {
        tiktok_id,
        category_name: category,
        post_type,
        link_post: link,
        posting_date: posting_date.as_deref().map(parse_date).transpose()?,
    };
    let id = submission::insert_submission(session.store(), &submission)?;
    println!("✅ Submission saved with id {id}");
    Ok(())
}

fn export_command(
    workspace_path: Option<&Path>,
    target: &str,
    start: Option<String>,
    end: Option<String>,
    id_like: Option<String>,
    json: bool,
) -> Result<()> {
    let root = workspace_root(workspace_path)?;
    let config = config::get_config(&root)?;
    let mut session = open_session(&root, &config)?;

    let filter = SnapshotFilter {
        start_date: start.as_deref().map(parse_date).transpose()?,
        end_date: end.as_deref().map(parse_date).transpose()?,
        id_like,
    };
    let snapshot = session.export(target, &filter)?;
    let path = config.snapshot_path(&root);
    save_snapshot(&path, snapshot)?;

    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    } else {
        PrettyPrinter::print_snapshot_summary(snapshot, &path);
        println!();
        println!("Edit the \"working\" rows in that file, then run:");
        println!("  opsdesk diff");
        println!("  opsdesk apply");
    }
    Ok(())
}

fn diff_command(workspace_path: Option<&Path>, json: bool) -> Result<()> {
    let root = workspace_root(workspace_path)?;
    let config = config::get_config(&root)?;
    let mut session = open_session(&root, &config)?;

    let snapshot = load_snapshot(&config.snapshot_path(&root))?;
    session.restore(snapshot)?;
    let batch = session.diff()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        PrettyPrinter::print_change_batch(&batch);
    }
    Ok(())
}

fn apply_command(workspace_path: Option<&Path>, json: bool) -> Result<()> {
    let root = workspace_root(workspace_path)?;
    let config = config::get_config(&root)?;
    let mut session = open_session(&root, &config)?;

    let path = config.snapshot_path(&root);
    let snapshot = load_snapshot(&path)?;
    session.restore(snapshot)?;

    let batch = session.diff()?;
    let result = session.apply()?;

    // Persist the promoted snapshot so a repeated apply is a no-op
    if let Some(snapshot) = session.snapshot() {
        save_snapshot(&path, snapshot)?;
    }

    if json {
        println!("{}", JsonFormatter::format_apply_result(&result)?);
    } else {
        PrettyPrinter::print_apply_result(&result, &batch);
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(snapshot)?)?;
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    if !path.is_file() {
        anyhow::bail!("no snapshot is open; run `opsdesk export <target>` first");
    }
    let content = fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&content)
        .with_context(|| format!("snapshot file {} is not valid", path.display()))?;
    Ok(snapshot)
}
