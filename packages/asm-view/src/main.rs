use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use asm_view::backend::FileBackend;
use asm_view::logging::{init_logging, is_debug};
use asm_view::metadata::MetadataCache;
use asm_view::model::Instruction;
use asm_view::row::render_row;
use asm_view::serve::{self, ServeArgs};
use asm_view::snapshot::SnapshotStore;
use asm_view::storage::{FileStorage, MemoryStorage, Storage};
use asm_view::utils::resolve_store_dir;

#[derive(Parser, Debug)]
#[command(name = "asm-view", version, about = "Disassembly view helper")]
struct Cli {
    /// Directory (or file:// URI) for persisted state; in-memory if omitted
    #[arg(short = 's', long = "store", global = true)]
    store: Option<String>,

    /// Enable debug output
    #[arg(short = 'd', long = "debug", default_value_t = false, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the stdio helper for the UI process
    Serve(ServeArgs),
    /// Print a snapshot as a text listing
    Render(RenderArgs),
    /// Wipe the persisted snapshot
    Clear,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Snapshot JSON (an `asm-update` payload); defaults to the persisted snapshot
    snapshot: Option<PathBuf>,

    /// JSON file with the backend's instruction table
    #[arg(short = 'i', long = "instructions")]
    instructions: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug)?;
    if is_debug() {
        log::debug!("{:?}", cli);
    }

    let storage: Arc<dyn Storage> = match &cli.store {
        Some(dir) => Arc::new(FileStorage::open(resolve_store_dir(dir))?),
        None => Arc::new(MemoryStorage::new()),
    };

    match cli.command {
        Command::Serve(args) => serve::run(args, storage).await,
        Command::Render(args) => render(args, storage).await,
        Command::Clear => {
            SnapshotStore::open(storage).clear()?;
            Ok(())
        }
    }
}

async fn render(args: RenderArgs, storage: Arc<dyn Storage>) -> Result<()> {
    let instructions: Vec<Instruction> = match &args.snapshot {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_slice(&bytes).context("parsing snapshot")?
        }
        None => SnapshotStore::open(storage.clone())
            .snapshot()
            .map(|s| s.to_vec())
            .unwrap_or_default(),
    };
    if instructions.is_empty() {
        log::info!("nothing to render");
        return Ok(());
    }

    let cache = MetadataCache::new(FileBackend::new(args.instructions, None), storage);
    for instr in &instructions {
        let raw = cache
            .get(instr.opcode_id)
            .await
            .with_context(|| format!("instruction at 0x{:x}", instr.address))?;
        println!("{}", render_row(instr, &raw).format_line());
    }
    Ok(())
}
