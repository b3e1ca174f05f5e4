//! CLI entry point for persisted tag trees.
//!
//! # Responsibility
//! - Verify `powersearch_core` linkage and print the crate version.
//! - Optionally open a snapshot database and print one tree's outline.
//! - Log to a `logs` directory beside the database when one is given.
//!
//! Usage: `powersearch_cli [DB_PATH] [TREE_KEY]`

use log::{error, info};
use powersearch_core::config::DEFAULT_TREE_KEY;
use powersearch_core::db::open_db;
use powersearch_core::{
    InMemoryTreeStore, NodeId, RecordingSurface, SqliteTreeStore, TagTreeService, TreeNode,
    TreeSettings, TreeStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const LOG_DIR_NAME: &str = "logs";

fn main() -> ExitCode {
    println!("powersearch_core version={}", powersearch_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(db_path) = args.next() else {
        return ExitCode::SUCCESS;
    };
    let tree_key = args.next().unwrap_or_else(|| DEFAULT_TREE_KEY.to_string());
    start_logging(&db_path);

    match print_tree(&db_path, &tree_key) {
        Ok(()) => {
            info!("event=cli_outline module=cli status=ok tree_key={tree_key}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!("event=cli_outline module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging(db_path: &str) {
    let Some(log_dir) = std::env::current_dir()
        .ok()
        .map(|cwd| log_dir_for(&cwd, Path::new(db_path)))
    else {
        eprintln!("warning: logging disabled: working directory is unavailable");
        return;
    };
    let log_dir = log_dir.to_string_lossy();
    if let Err(err) = powersearch_core::init_logging(powersearch_core::default_log_level(), &log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }
}

/// `logs` directory next to the database file, made absolute against `cwd`.
fn log_dir_for(cwd: &Path, db_path: &Path) -> PathBuf {
    let db_path = cwd.join(db_path);
    db_path
        .parent()
        .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf)
        .join(LOG_DIR_NAME)
}

fn print_tree(db_path: &str, tree_key: &str) -> Result<(), String> {
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let store = SqliteTreeStore::try_new(&conn, tree_key).map_err(|err| err.to_string())?;
    let records = store.load_top_level_nodes().map_err(|err| err.to_string())?;

    // Rebuild from a volatile copy so printing never writes back.
    let service = TagTreeService::load(
        InMemoryTreeStore::with_records(records),
        RecordingSurface::new(),
        TreeSettings::for_tree(tree_key),
    )
    .map_err(|err| err.to_string())?;

    println!("tree={tree_key} nodes={}", service.forest().len());
    for id in service.top_level() {
        print_node(&service, *id, 0);
    }
    Ok(())
}

fn print_node(service: &TagTreeService<InMemoryTreeStore, RecordingSurface>, id: NodeId, depth: usize) {
    let indent = "  ".repeat(depth);
    match service.node(id) {
        Some(TreeNode::Container(container)) => {
            let color = container.color().unwrap_or("-");
            let hidden = if container.is_hidden() { " hidden" } else { "" };
            println!("{indent}[{}] color={color}{hidden}", container.name());
            for child in container.children() {
                print_node(service, *child, depth + 1);
            }
        }
        Some(TreeNode::Reference(reference)) => {
            println!("{indent}- {}", reference.location());
        }
        None => {}
    }
}
