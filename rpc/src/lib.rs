//! HTTP API for the dailyread site.
//!
//! Provides endpoints for:
//! - Image challenges (`/api/captcha`)
//! - Login, registration, password reset and email change (`/api/auth/*`)
//! - The daily article (`/api/daily`)
//! - Health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;
pub mod sessions;
pub mod state;

pub use error::RpcError;
pub use metrics::SiteMetrics;
pub use server::{build_router, RpcServer};
pub use sessions::{Session, SessionRegistry, SessionState, SESSION_HEADER};
pub use state::AppState;
