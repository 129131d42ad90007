//! DBN Core - Core abstractions shared by the database interface crates
//!
//! This crate provides the fundamental types that the scheduling and content
//! crates depend on. It defines:
//!
//! - `DbnError` - Error taxonomy for database interface operations
//! - `ConnectionContext` - What the scheduling layer needs to know about a connection
//! - `StatusHolder` - Monotonic, history-keeping status cell
//! - `ThreadKind` - Classification of the calling thread
//! - `Platform` - Host services for running work on worker threads

mod connection;
mod error;
pub mod logging;
mod platform;
mod settings;
mod status;
mod thread;
mod types;

pub use connection::*;
pub use error::*;
pub use platform::*;
pub use settings::*;
pub use status::*;
pub use thread::*;
pub use types::*;
