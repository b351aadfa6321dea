pub mod record;
pub mod selector;
pub mod store;

pub use record::{BindingSummary, CompositeBindingRecord};
pub use selector::{BindingType, SelectorEntry, SelectorRegistry};
pub use store::BindingStore;
