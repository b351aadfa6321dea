pub mod binding;
pub mod config;
pub mod crypto;
pub mod diagnostics;
pub mod error;
pub mod issue;
pub mod secret;
pub mod storage;
pub mod system;

pub use error::{Error, Result};
pub use issue::{IssuanceService, IssueRequest, IssueResponse};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use config::{Command, Config, ENTRIES_DIR, LOCK_FILE, SEAL_KEY_FILE};

pub async fn wipe(cfg: Config) -> anyhow::Result<()> {
    let data_dir = cfg.data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let mut lock = open_store_lock(&data_dir)?;
    let _guard = lock.try_write().map_err(|_| store_busy(&data_dir))?;

    let entries_dir = data_dir.join(ENTRIES_DIR);
    let count = storage::disk::wipe(&entries_dir)?;
    println!("Deleted {count} stored entries from {}", entries_dir.display());
    Ok(())
}

pub async fn run(cfg: Config) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    let level = match cfg.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();

    if matches!(cfg.command, Command::Wipe) {
        return wipe(cfg).await;
    }

    let data_dir = cfg.data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    // Preflight checks
    diagnostics::check(&data_dir)?;

    // One command at a time per data dir
    let mut lock = open_store_lock(&data_dir)?;
    let _guard = lock.try_write().map_err(|_| store_busy(&data_dir))?;

    let seal_key = load_or_create_seal_key(&data_dir.join(SEAL_KEY_FILE))?;
    let storage = Arc::new(storage::DiskStorage::new(
        seal_key,
        data_dir.join(ENTRIES_DIR),
    )?);
    let system = Arc::new(system::StaticSystemView::new(Duration::from_secs(
        cfg.max_lease_ttl,
    )));
    let service = IssuanceService::open(storage, system)?;
    tracing::info!(data_dir = %data_dir.display(), "Store opened");

    let output = match cfg.command {
        Command::Issue(args) => {
            serde_json::to_value(service.issue_generated(&args.into()).await?)?
        }
        Command::IssueCustom { secret_id, args } => {
            serde_json::to_value(service.issue_custom(&args.into(), &secret_id).await?)?
        }
        Command::Lookup { selector_id } => match service.lookup(&selector_id).await? {
            Some(summary) => serde_json::to_value(summary)?,
            None => anyhow::bail!("no binding for selector_id {selector_id}"),
        },
        Command::Login {
            selector_id,
            secret_id,
        } => {
            let remaining = service.consume(&selector_id, &secret_id).await?;
            serde_json::json!({ "selector_id": selector_id, "remaining_uses": remaining })
        }
        Command::Revoke { secret_id } => {
            serde_json::json!({ "revoked": service.revoke(&secret_id).await? })
        }
        Command::Wipe => anyhow::bail!("wipe does not run against an open store"),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn open_store_lock(data_dir: &Path) -> anyhow::Result<fd_lock::RwLock<std::fs::File>> {
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(data_dir.join(LOCK_FILE))?;
    Ok(fd_lock::RwLock::new(lock_file))
}

fn store_busy(data_dir: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "another secretbind command holds the store (lock: {})",
        data_dir.join(LOCK_FILE).display()
    )
}

fn load_or_create_seal_key(path: &Path) -> anyhow::Result<[u8; 32]> {
    if path.exists() {
        let blob = std::fs::read(path)?;
        let key: [u8; 32] = blob
            .as_slice()
            .try_into()
            .map_err(|_| anyhow::anyhow!("{} is truncated", path.display()))?;
        return Ok(key);
    }

    let key = crypto::id::random_key()?;
    std::fs::write(path, key)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    tracing::info!(path = %path.display(), "Generated new seal key");
    Ok(key)
}
