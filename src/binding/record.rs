use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Options captured when a secret ID is issued against an ad-hoc set of apps
/// and groups. Stored under the salted hash of the secret ID.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeBindingRecord {
    pub selector_id: String,
    /// Keys the HMAC of every secret ID issued against this binding.
    pub hmac_key: String,
    pub groups: BTreeSet<String>,
    pub apps: BTreeSet<String>,
    /// 0 = unlimited.
    pub secret_id_num_uses: u64,
    /// 0 = inherit.
    pub secret_id_ttl: Duration,
    pub token_ttl: Duration,
    pub token_max_ttl: Duration,
    pub bind_secret_id: bool,
    pub additional_policies: BTreeSet<String>,
}

impl std::fmt::Debug for CompositeBindingRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeBindingRecord")
            .field("selector_id", &self.selector_id)
            .field("hmac_key", &"<redacted>")
            .field("groups", &self.groups)
            .field("apps", &self.apps)
            .field("secret_id_num_uses", &self.secret_id_num_uses)
            .field("secret_id_ttl", &self.secret_id_ttl)
            .field("token_ttl", &self.token_ttl)
            .field("token_max_ttl", &self.token_max_ttl)
            .field("bind_secret_id", &self.bind_secret_id)
            .field("additional_policies", &self.additional_policies)
            .finish()
    }
}

/// What a binding grants, minus its HMAC key. Safe to hand back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingSummary {
    pub selector_id: String,
    pub groups: BTreeSet<String>,
    pub apps: BTreeSet<String>,
    pub secret_id_num_uses: u64,
    pub secret_id_ttl: u64,
    pub token_ttl: u64,
    pub token_max_ttl: u64,
    pub bind_secret_id: bool,
    pub additional_policies: BTreeSet<String>,
}

impl CompositeBindingRecord {
    pub fn summary(&self) -> BindingSummary {
        BindingSummary {
            selector_id: self.selector_id.clone(),
            groups: self.groups.clone(),
            apps: self.apps.clone(),
            secret_id_num_uses: self.secret_id_num_uses,
            secret_id_ttl: self.secret_id_ttl.as_secs(),
            token_ttl: self.token_ttl.as_secs(),
            token_max_ttl: self.token_max_ttl.as_secs(),
            bind_secret_id: self.bind_secret_id,
            additional_policies: self.additional_policies.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_hmac_key() {
        let record = CompositeBindingRecord {
            selector_id: "sel".into(),
            hmac_key: "super-secret-key".into(),
            groups: ["g1".to_string()].into(),
            apps: BTreeSet::new(),
            secret_id_num_uses: 0,
            secret_id_ttl: Duration::ZERO,
            token_ttl: Duration::ZERO,
            token_max_ttl: Duration::ZERO,
            bind_secret_id: true,
            additional_policies: ["default".to_string()].into(),
        };
        let dbg = format!("{record:?}");
        assert!(!dbg.contains("super-secret-key"));
        assert!(dbg.contains("<redacted>"));

        let json = serde_json::to_string(&record.summary()).unwrap();
        assert!(!json.contains("super-secret-key"));
    }
}
