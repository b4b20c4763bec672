//! dailyread site node.
//!
//! The node is the single place where components are constructed:
//! - Opens LMDB and runs the startup checks
//! - Builds the secret store, credential cipher, verification ledger and
//!   challenge gate
//! - Seeds the default content source and builds the daily content service
//! - Serves the HTTP API and runs the periodic sweep until shutdown

pub mod config;
pub mod error;
pub mod node;
pub mod shutdown;
pub mod sweeper;

pub use config::SiteConfig;
pub use error::NodeError;
pub use node::{seed_default_source, SiteNode};
pub use shutdown::ShutdownController;
pub use sweeper::{spawn_sweeper, sweep_once, SweepReport};
