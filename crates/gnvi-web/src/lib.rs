//! gnvi-web: Browser front end for the Neural WWW Discovery tool.
//! Provides:
//!   - the discovery page (topic input, result table, activity log)
//!   - per-browser sessions keyed by cookie
//!   - a small JSON surface for the activity log

pub mod handlers;
pub mod render;
pub mod router;
pub mod sessions;
pub mod state;
