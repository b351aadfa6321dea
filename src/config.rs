use std::path::PathBuf;

use crate::issue::IssueRequest;

/// 32 days.
pub const DEFAULT_MAX_LEASE_TTL_SECS: u64 = 32 * 24 * 60 * 60;
pub const SECRET_LOCK_SHARDS: usize = 256;
pub const SEAL_KEY_FILE: &str = "seal_key.bin";
pub const ENTRIES_DIR: &str = "entries";
pub const LOCK_FILE: &str = "secretbind.lock";

#[derive(clap::Parser, Debug, Clone)]
#[command(name = "secretbind", version)]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Defaults to the platform data directory.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// System-wide maximum lease TTL in seconds.
    #[arg(long, default_value_t = DEFAULT_MAX_LEASE_TTL_SECS, global = true)]
    pub max_lease_ttl: u64,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a secret ID bound to the given apps and groups.
    Issue(IssueArgs),
    /// Bind a caller-chosen secret ID to the given apps and groups.
    IssueCustom {
        #[arg(long, default_value = "")]
        secret_id: String,
        #[command(flatten)]
        args: IssueArgs,
    },
    /// Show what a selector ID grants.
    Lookup {
        #[arg(long)]
        selector_id: String,
    },
    /// Spend one use of a secret ID.
    Login {
        #[arg(long)]
        selector_id: String,
        #[arg(long)]
        secret_id: String,
    },
    /// Delete the binding and records of a secret ID.
    Revoke {
        #[arg(long)]
        secret_id: String,
    },
    /// Delete all stored entries, then exit.
    Wipe,
}

#[derive(clap::Args, Debug, Clone)]
pub struct IssueArgs {
    /// Comma separated list of groups.
    #[arg(long, default_value = "")]
    pub groups: String,
    /// Comma separated list of apps.
    #[arg(long, default_value = "")]
    pub apps: String,
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub bind_secret_id: bool,
    #[arg(long, default_value = "")]
    pub additional_policies: String,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub secret_id_num_uses: i64,
    #[arg(long, default_value_t = 0)]
    pub secret_id_ttl: u64,
    #[arg(long, default_value_t = 0)]
    pub token_ttl: u64,
    #[arg(long, default_value_t = 0)]
    pub token_max_ttl: u64,
}

impl From<IssueArgs> for IssueRequest {
    fn from(args: IssueArgs) -> Self {
        Self {
            groups: args.groups,
            apps: args.apps,
            bind_secret_id: args.bind_secret_id,
            additional_policies: args.additional_policies,
            secret_id_num_uses: args.secret_id_num_uses,
            secret_id_ttl: args.secret_id_ttl,
            token_ttl: args.token_ttl,
            token_max_ttl: args.token_max_ttl,
        }
    }
}

impl Config {
    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        Ok(directories::ProjectDirs::from("", "", "secretbind")
            .ok_or_else(|| anyhow::anyhow!("cannot determine XDG data dir"))?
            .data_dir()
            .to_path_buf())
    }
}
