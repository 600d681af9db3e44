#![warn(clippy::pedantic)]
// Noisy doc/signature lints that would require annotating every pub function
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Style preference: keeping format!("{}", x) over format!("{x}") for readability with complex exprs
#![allow(clippy::uninlined_format_args)]
// Module structure: store::SessionStore, client::StoreClient and friends
#![allow(clippy::module_name_repetitions)]

//! Server-side sessions: the cookie carries a signed (optionally encrypted)
//! session id, values live in a [`client::StoreClient`], and a background
//! [`sweeper`] deletes expired records.

pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod record;
pub mod session;
pub mod store;
pub mod sweeper;

pub use errors::{SessionError, StoreError};
pub use session::{Options, SameSite, Session};
pub use sessionstore_codec::{CodecError, KeyPair};
pub use store::{Registry, SessionBackend, SessionStore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
