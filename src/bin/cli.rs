//! filekv CLI
//!
//! Command-line interface for a filekv log file.

use std::path::Path;

use clap::{Parser, Subcommand};
use filekv::log::LogReplay;
use filekv::{Config, DeleteMode, DiskStore, RecoveryMode, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// filekv CLI
#[derive(Parser, Debug)]
#[command(name = "filekv")]
#[command(about = "CLI for the filekv log-structured key-value store")]
#[command(version)]
struct Args {
    /// Log file path
    #[arg(short, long, default_value = "./filekv.db")]
    db: String,

    /// Persist deletes as tombstone records
    #[arg(long)]
    tombstones: bool,

    /// Truncate a damaged log tail instead of refusing to open
    #[arg(long)]
    truncate_tail: bool,

    /// Sync every N writes instead of after each one
    #[arg(long)]
    sync_every: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommand),

    /// Scan the log file without opening the store
    Verify,
}

/// Commands that run against an open store
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Set a key that already exists
    Update {
        /// The key to update
        key: String,

        /// The new value
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List live keys
    List,

    /// Show space usage
    Stats,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,filekv=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> filekv::Result<()> {
    let config = Config::builder()
        .path(&args.db)
        .delete_mode(if args.tombstones {
            DeleteMode::Tombstone
        } else {
            DeleteMode::Unpersisted
        })
        .recovery_mode(if args.truncate_tail {
            RecoveryMode::TruncateTail
        } else {
            RecoveryMode::Strict
        })
        .sync_strategy(match args.sync_every {
            Some(count) => SyncStrategy::EveryNEntries { count },
            None => SyncStrategy::EveryWrite,
        })
        .build();

    match args.command {
        Commands::Verify => verify(&config.path),
        Commands::Store(command) => execute(config, command),
    }
}

/// Open the store, run one command, close it
fn execute(config: Config, command: StoreCommand) -> filekv::Result<()> {
    let mut store = DiskStore::open(config)?;

    match command {
        StoreCommand::Get { key } => {
            let value = store.get(key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        StoreCommand::Set { key, value } => store.set(key.as_bytes(), value.as_bytes())?,
        StoreCommand::Update { key, value } => store.update(key.as_bytes(), value.as_bytes())?,
        StoreCommand::Del { key } => store.delete(key.as_bytes())?,
        StoreCommand::List => {
            for key in store.list()? {
                println!("{}", String::from_utf8_lossy(&key));
            }
        }
        StoreCommand::Stats => {
            let stats = store.stats()?;
            println!("live keys:  {}", stats.live_keys);
            println!("log bytes:  {}", stats.log_bytes);
            println!("live bytes: {}", stats.live_bytes);
            println!("dead bytes: {}", stats.dead_bytes);
        }
    }

    store.close()
}

fn verify(path: &Path) -> filekv::Result<()> {
    let result = LogReplay::verify(path)?;
    println!("records:       {}", result.records_replayed);
    println!("tombstones:    {}", result.tombstones_replayed);
    println!("live keys:     {}", result.live_keys);
    println!("valid bytes:   {}", result.valid_len);
    println!("damaged bytes: {}", result.damaged_bytes);
    Ok(())
}
