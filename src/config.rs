//! Centralized configuration for the master-file reader.
//!
//! - `ReaderConfig::from_env()` reads MST_* env vars.
//! - Fluent `with_*` setters override single fields.
//! - `ReaderBuilder` collects config + inspector + cancel token and opens a reader.
//!
//! Defaults:
//! - workers = None (available hardware parallelism)
//! - shared_lock = true (fs2 shared advisory lock while the file is mapped)
//! - verify_control = false

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::consts::{ENV_SHARED_LOCK, ENV_VERIFY_CONTROL, ENV_WORKERS};
use crate::plan::default_workers;
use crate::reader::MstReader;
use crate::worker::{CancelToken, RecordInspector};

#[derive(Clone, Debug)]
pub struct ReaderConfig {
    /// Upper bound on parallel workers; None = available parallelism.
    /// Env: MST_WORKERS (positive integer)
    pub workers: Option<usize>,

    /// Hold a shared advisory lock on the file for the duration of a read.
    /// Env: MST_SHARED_LOCK = 0|1|true|false (default true)
    pub shared_lock: bool,

    /// Require control.record_count == leader record count.
    /// Env: MST_VERIFY_CONTROL = 0|1|true|false (default false)
    pub verify_control: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            workers: None,
            shared_lock: true,
            verify_control: false,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        let s = v.trim().to_ascii_lowercase();
        s == "1" || s == "true" || s == "yes" || s == "on"
    })
}

impl ReaderConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var(ENV_WORKERS) {
            if let Ok(n) = v.trim().parse::<usize>() {
                if n > 0 {
                    cfg.workers = Some(n);
                }
            }
        }
        if let Some(on) = env_flag(ENV_SHARED_LOCK) {
            cfg.shared_lock = on;
        }
        if let Some(on) = env_flag(ENV_VERIFY_CONTROL) {
            cfg.verify_control = on;
        }

        cfg
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_shared_lock(mut self, on: bool) -> Self {
        self.shared_lock = on;
        self
    }

    pub fn with_verify_control(mut self, on: bool) -> Self {
        self.verify_control = on;
        self
    }

    /// Worker count actually used for planning.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(default_workers)
    }
}

impl fmt::Display for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReaderConfig {{ workers: {}, shared_lock: {}, verify_control: {} }}",
            self.workers
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("default({})", default_workers())),
            self.shared_lock,
            self.verify_control,
        )
    }
}

/// Builder producing a configured [`MstReader`].
#[derive(Clone)]
pub struct ReaderBuilder {
    cfg: ReaderConfig,
    inspector: Option<Arc<dyn RecordInspector>>,
    cancel: Option<CancelToken>,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: ReaderConfig::from_env(),
            inspector: None,
            cancel: None,
        }
    }
}

impl ReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: ReaderConfig::default(),
            inspector: None,
            cancel: None,
        }
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.cfg.workers = Some(n);
        self
    }

    pub fn shared_lock(mut self, on: bool) -> Self {
        self.cfg.shared_lock = on;
        self
    }

    pub fn verify_control(mut self, on: bool) -> Self {
        self.cfg.verify_control = on;
        self
    }

    pub fn inspector(mut self, inspector: Arc<dyn RecordInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.cfg
    }

    pub fn open<P: AsRef<Path>>(self, path: P) -> MstReader {
        let mut r = MstReader::with_config(path, self.cfg);
        if let Some(i) = self.inspector {
            r = r.with_inspector(i);
        }
        if let Some(t) = self.cancel {
            r = r.with_cancel_token(t);
        }
        r
    }
}
