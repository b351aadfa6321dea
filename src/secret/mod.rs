pub mod record;
pub mod store;

pub use record::{RemainingUses, SecretCredentialRecord, SecretIdPolicy};
pub use store::SecretStore;
