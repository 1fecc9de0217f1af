//! Cooperative cancellation shared by all workers of one read.
//!
//! Каждое чтение работает со своим дочерним токеном: отказ внутри чтения
//! поднимает только его, а токен вызывающего (родитель) остаётся нетронутым.
//! Дочерний токен считается отменённым, если отменён он сам или родитель.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable flag; workers poll it between records.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Box<CancelToken>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh token that also observes `self`. Cancelling the child does not
    /// touch `self`.
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Box::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
            || self.parent.as_ref().map_or(false, |p| p.is_cancelled())
    }
}
