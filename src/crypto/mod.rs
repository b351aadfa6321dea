pub mod id;
pub mod keyed;
pub mod salt;

pub use id::{IdError, IdSource, OsIdSource};
pub use keyed::keyed_hash;
pub use salt::Salt;
