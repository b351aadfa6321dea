use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use super::{IssueRequest, IssueResponse, TOKEN_MAX_TTL_WARNING};
use crate::binding::{BindingStore, BindingSummary, CompositeBindingRecord, SelectorEntry};
use crate::crypto::{IdSource, OsIdSource, Salt};
use crate::error::{Error, Result};
use crate::secret::{RemainingUses, SecretIdPolicy, SecretStore};
use crate::storage::{Storage, blocking};
use crate::system::SystemView;

/// Issues secret IDs against ad-hoc unions of apps and groups.
///
/// Issuance is two independent writes: the binding (with its selector entry)
/// and then the secret ID record. A failure between them leaves a binding
/// with no usable secret ID; nothing is rolled back.
pub struct IssuanceService {
    ids: Arc<dyn IdSource>,
    system: Arc<dyn SystemView>,
    salt: Salt,
    bindings: BindingStore,
    secrets: Arc<SecretStore>,
}

impl IssuanceService {
    pub fn new(
        storage: Arc<dyn Storage>,
        salt: Salt,
        ids: Arc<dyn IdSource>,
        system: Arc<dyn SystemView>,
        binding_lock: Arc<RwLock<()>>,
    ) -> Self {
        Self {
            ids,
            system,
            salt,
            bindings: BindingStore::new(storage.clone(), binding_lock),
            secrets: Arc::new(SecretStore::new(storage)),
        }
    }

    /// Load (or create) the salt from `storage` and use OS randomness for identifiers.
    pub fn open(storage: Arc<dyn Storage>, system: Arc<dyn SystemView>) -> Result<Self> {
        let salt = Salt::load_or_create(&*storage)?;
        Ok(Self::new(
            storage,
            salt,
            Arc::new(OsIdSource),
            system,
            Arc::new(RwLock::new(())),
        ))
    }

    pub fn bindings(&self) -> &BindingStore {
        &self.bindings
    }

    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    /// Storage name of the binding created for `secret_id`.
    pub fn binding_name(&self, secret_id: &str) -> Result<String> {
        self.salt.salt_id(secret_id)
    }

    pub async fn issue_generated(&self, req: &IssueRequest) -> Result<IssueResponse> {
        let secret_id = self.generate("secret_id")?;
        self.issue(req, secret_id).await
    }

    pub async fn issue_custom(&self, req: &IssueRequest, secret_id: &str) -> Result<IssueResponse> {
        if secret_id.is_empty() {
            return Err(Error::MissingCredential);
        }
        self.issue(req, secret_id.to_string()).await
    }

    async fn issue(&self, req: &IssueRequest, secret_id: String) -> Result<IssueResponse> {
        let selector_id = self.generate("selector_id")?;
        let hmac_key = self.generate("hmac_key")?;

        let record = req.to_record(selector_id, hmac_key)?;

        let mut warnings = Vec::new();
        let max_lease_ttl = self.system.max_lease_ttl();
        if record.token_max_ttl > max_lease_ttl {
            tracing::warn!(
                token_max_ttl = record.token_max_ttl.as_secs(),
                max_lease_ttl = max_lease_ttl.as_secs(),
                "token_max_ttl exceeds system maximum"
            );
            warnings.push(TOKEN_MAX_TTL_WARNING.to_string());
        }

        // There is no pre-registered name for an ad-hoc binding, so it is
        // stored under the salted secret ID and found again from it.
        let name = self.salt.salt_id(&secret_id)?;
        self.bindings.set(&name, &record).await?;

        let policy = secret_id_policy(&record, max_lease_ttl);
        let registered = {
            let secrets = self.secrets.clone();
            let (selector_id, secret_id, hmac_key) = (
                record.selector_id.clone(),
                secret_id.clone(),
                record.hmac_key.clone(),
            );
            blocking(move || secrets.register(&selector_id, &secret_id, &hmac_key, &policy)).await
        };
        if let Err(e) = registered {
            tracing::error!(
                binding = %name,
                selector_id = %record.selector_id,
                error = %e,
                "Secret ID registration failed after binding write"
            );
            return Err(e);
        }

        tracing::info!(
            selector_id = %record.selector_id,
            groups = record.groups.len(),
            apps = record.apps.len(),
            num_uses = record.secret_id_num_uses,
            "Secret ID issued"
        );
        Ok(IssueResponse {
            secret_id,
            selector_id: record.selector_id,
            warnings,
        })
    }

    /// What the binding behind `selector_id` grants, if it exists.
    pub async fn lookup(&self, selector_id: &str) -> Result<Option<BindingSummary>> {
        let Some(entry) = self.resolve(selector_id).await? else {
            return Ok(None);
        };
        Ok(self
            .owned_binding(&entry, selector_id)
            .await?
            .map(|record| record.summary()))
    }

    /// Check `secret_id` against the binding behind `selector_id` and spend
    /// one of its uses.
    pub async fn consume(&self, selector_id: &str, secret_id: &str) -> Result<RemainingUses> {
        if secret_id.is_empty() {
            return Err(Error::MissingCredential);
        }
        let entry = self.resolve(selector_id).await?.ok_or(Error::NotFound)?;

        let expected = self.salt.salt_id(secret_id)?;
        if !bool::from(expected.as_bytes().ct_eq(entry.binding_name.as_bytes())) {
            return Err(Error::NotFound);
        }

        let record = self
            .owned_binding(&entry, selector_id)
            .await?
            .ok_or(Error::NotFound)?;

        let secrets = self.secrets.clone();
        let (sel, secret) = (selector_id.to_string(), secret_id.to_string());
        let remaining =
            blocking(move || secrets.consume_if_valid(&sel, &secret, &record.hmac_key)).await?;
        tracing::info!(selector_id, ?remaining, "Secret ID consumed");
        Ok(remaining)
    }

    /// Remove everything issued for `secret_id`. Returns false if no
    /// binding exists for it.
    pub async fn revoke(&self, secret_id: &str) -> Result<bool> {
        if secret_id.is_empty() {
            return Err(Error::MissingCredential);
        }
        let name = self.salt.salt_id(secret_id)?;
        let Some(record) = self.bindings.get(&name).await? else {
            return Ok(false);
        };

        let selector_id = record.selector_id.clone();
        let secrets = self.secrets.clone();
        let selectors = self.bindings.selectors().clone();
        let secret = secret_id.to_string();
        // Secret ID record first so a partial revoke never leaves it usable.
        blocking(move || {
            secrets.delete(&record.selector_id, &secret, &record.hmac_key)?;
            selectors.delete(&record.selector_id)
        })
        .await?;
        self.bindings.delete(&name).await?;
        tracing::info!(%selector_id, "Secret ID revoked");
        Ok(true)
    }

    async fn resolve(&self, selector_id: &str) -> Result<Option<SelectorEntry>> {
        let selectors = self.bindings.selectors().clone();
        let selector_id = selector_id.to_string();
        blocking(move || selectors.resolve(&selector_id)).await
    }

    /// The binding `entry` points at, if it still belongs to `selector_id`.
    /// A reused custom secret ID overwrites the binding, leaving older
    /// selectors pointing at a record they no longer own.
    async fn owned_binding(
        &self,
        entry: &SelectorEntry,
        selector_id: &str,
    ) -> Result<Option<CompositeBindingRecord>> {
        Ok(self
            .bindings
            .get(&entry.binding_name)
            .await?
            .filter(|record| record.selector_id == selector_id))
    }

    fn generate(&self, what: &'static str) -> Result<String> {
        self.ids
            .generate()
            .map_err(|source| Error::IdentifierGeneration { what, source })
    }
}

/// Usage policy for a new secret ID. A zero TTL inherits the system maximum
/// lease TTL, and no TTL may exceed it.
fn secret_id_policy(record: &CompositeBindingRecord, max_lease_ttl: Duration) -> SecretIdPolicy {
    let mut policy = SecretIdPolicy::from(record);
    if policy.ttl.is_zero() || policy.ttl > max_lease_ttl {
        policy.ttl = max_lease_ttl;
    }
    policy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueRequest;
    use crate::secret::record::unix_now;
    use crate::storage::MemoryStorage;
    use crate::system::StaticSystemView;

    fn service_with_max(max_lease_ttl: Duration) -> IssuanceService {
        IssuanceService::open(
            Arc::new(MemoryStorage::new()),
            Arc::new(StaticSystemView::new(max_lease_ttl)),
        )
        .unwrap()
    }

    async fn issue_with_ttl(service: &IssuanceService, secret_id_ttl: u64) -> (String, String, String) {
        let req = IssueRequest {
            groups: "g".into(),
            secret_id_ttl,
            ..IssueRequest::default()
        };
        let resp = service.issue_generated(&req).await.unwrap();
        let name = service.binding_name(&resp.secret_id).unwrap();
        let record = service.bindings().get(&name).await.unwrap().unwrap();
        (resp.selector_id, resp.secret_id, record.hmac_key)
    }

    #[tokio::test]
    async fn test_zero_secret_id_ttl_inherits_max_lease_ttl() {
        let service = service_with_max(Duration::from_secs(600));
        let (sel, secret, key) = issue_with_ttl(&service, 0).await;

        let cred = service.secrets().lookup(&sel, &secret, &key).unwrap().unwrap();
        assert_eq!(cred.secret_id_ttl, Duration::from_secs(600));
        assert_eq!(cred.expiration_time, Some(cred.creation_time + 600));

        assert!(matches!(
            service.secrets().consume_at(&sel, &secret, &key, unix_now() + 1_000_000),
            Err(Error::Expired)
        ));
    }

    #[tokio::test]
    async fn test_secret_id_ttl_capped_at_max_lease_ttl() {
        let service = service_with_max(Duration::from_secs(600));
        let (sel, secret, key) = issue_with_ttl(&service, 3_600).await;

        let cred = service.secrets().lookup(&sel, &secret, &key).unwrap().unwrap();
        assert_eq!(cred.secret_id_ttl, Duration::from_secs(600));

        // The binding keeps the requested value
        let name = service.binding_name(&secret).unwrap();
        let record = service.bindings().get(&name).await.unwrap().unwrap();
        assert_eq!(record.secret_id_ttl, Duration::from_secs(3_600));
    }

    #[tokio::test]
    async fn test_secret_id_ttl_below_max_kept() {
        let service = service_with_max(Duration::from_secs(600));
        let (sel, secret, key) = issue_with_ttl(&service, 60).await;
        let cred = service.secrets().lookup(&sel, &secret, &key).unwrap().unwrap();
        assert_eq!(cred.secret_id_ttl, Duration::from_secs(60));
    }
}
