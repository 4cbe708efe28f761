pub mod middleware;
pub mod provider;

pub use middleware::{IdentityAuthLayer, get_identity_auth_layer};
pub use provider::{HttpIdentityProvider, Identity, IdentityProvider, StaticIdentityProvider};
