use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Usage limits copied from the binding at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretIdPolicy {
    pub num_uses: u64,
    pub ttl: Duration,
}

impl From<&crate::binding::CompositeBindingRecord> for SecretIdPolicy {
    fn from(record: &crate::binding::CompositeBindingRecord) -> Self {
        Self {
            num_uses: record.secret_id_num_uses,
            ttl: record.secret_id_ttl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretCredentialRecord {
    /// Remaining uses; 0 = unlimited.
    pub secret_id_num_uses: u64,
    pub secret_id_ttl: Duration,
    pub creation_time: u64, // Unix timestamp
    pub expiration_time: Option<u64>,
    pub last_updated_time: u64,
}

impl SecretCredentialRecord {
    pub fn new(policy: &SecretIdPolicy, now: u64) -> Self {
        let expiration_time = (!policy.ttl.is_zero())
            .then(|| now.saturating_add(policy.ttl.as_secs()));
        Self {
            secret_id_num_uses: policy.num_uses,
            secret_id_ttl: policy.ttl,
            creation_time: now,
            expiration_time,
            last_updated_time: now,
        }
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expiration_time.is_some_and(|exp| now > exp)
    }
}

/// Uses left after a successful consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainingUses {
    Unlimited,
    Limited(u64),
}

pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
