mod store;
mod types;

pub use store::TokenCache;
pub use types::{now, ClientSecrets, StoredToken};
