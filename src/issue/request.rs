use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::parse::{parse_policies, parse_strings};
use crate::binding::CompositeBindingRecord;
use crate::error::{Error, Result};

pub const TOKEN_MAX_TTL_WARNING: &str = "token_max_ttl is greater than the backend mount's \
     maximum TTL value; issued tokens' max TTL value will be truncated";

/// Fields accepted when issuing a secret ID. TTLs are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IssueRequest {
    /// Comma-separated group names.
    pub groups: String,
    /// Comma-separated app names.
    pub apps: String,
    pub bind_secret_id: bool,
    pub additional_policies: String,
    pub secret_id_num_uses: i64,
    pub secret_id_ttl: u64,
    pub token_ttl: u64,
    pub token_max_ttl: u64,
}

impl Default for IssueRequest {
    fn default() -> Self {
        Self {
            groups: String::new(),
            apps: String::new(),
            bind_secret_id: true,
            additional_policies: String::new(),
            secret_id_num_uses: 0,
            secret_id_ttl: 0,
            token_ttl: 0,
            token_max_ttl: 0,
        }
    }
}

impl IssueRequest {
    /// Parse and validate the request into the record that will be stored.
    pub fn to_record(&self, selector_id: String, hmac_key: String) -> Result<CompositeBindingRecord> {
        let groups = parse_strings(&self.groups);
        let apps = parse_strings(&self.apps);
        if groups.is_empty() && apps.is_empty() {
            return Err(Error::MissingBindingTarget);
        }

        let secret_id_num_uses =
            u64::try_from(self.secret_id_num_uses).map_err(|_| Error::NegativeUsesCount)?;

        if self.token_max_ttl > 0 && self.token_ttl > self.token_max_ttl {
            return Err(Error::TtlOrdering);
        }

        if !self.bind_secret_id {
            return Err(Error::UnsupportedBindingMode);
        }

        Ok(CompositeBindingRecord {
            selector_id,
            hmac_key,
            groups,
            apps,
            secret_id_num_uses,
            secret_id_ttl: Duration::from_secs(self.secret_id_ttl),
            token_ttl: Duration::from_secs(self.token_ttl),
            token_max_ttl: Duration::from_secs(self.token_max_ttl),
            bind_secret_id: self.bind_secret_id,
            additional_policies: parse_policies(&self.additional_policies),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueResponse {
    pub secret_id: String,
    pub selector_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
