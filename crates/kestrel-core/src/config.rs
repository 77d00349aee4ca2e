//! Process-level configuration for applications embedding Kestrel.

use crate::logging;
use crate::profiling::{self, ProfilingBackend};

/// Top-level configuration applied once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub profiling: ProfilingMode,
    /// `tracing` filter directives. `None` reads `RUST_LOG`.
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            profiling: ProfilingMode::Off,
            log_filter: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingMode {
    /// Profiling is disabled
    Off,
    /// Scopes are collected in-process
    On,
    /// Scopes are collected and served to 'puffin_viewer'
    WithWebServer,
}

impl Config {
    /// Install logging and profiling according to this configuration.
    pub fn apply(&self) {
        match &self.log_filter {
            Some(filter) => logging::init_with_filter(filter),
            None => logging::init(),
        }

        match self.profiling {
            ProfilingMode::Off => {}
            ProfilingMode::On => profiling::init_profiling(ProfilingBackend::InProcess),
            ProfilingMode::WithWebServer => profiling::init_profiling(ProfilingBackend::PuffinHttp),
        }
    }
}
