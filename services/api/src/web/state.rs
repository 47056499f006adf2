//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use insighthub_core::Assistant;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub config: Arc<Config>,
}
