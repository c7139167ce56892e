//! Viewer authentication.
//!
//! Token *issuance* (SMS login) happens in an external service; this crate
//! only validates bearer tokens so the match API and the table gateway can
//! identify a viewer.

mod claims;
mod crypto;
mod middleware;

pub use claims::*;
pub use crypto::*;
pub use middleware::*;
