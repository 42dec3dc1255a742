//! 时间源抽象：生产使用系统时间，测试使用可拨动的手动时钟。

use quill_storage::now_epoch_seconds;
use std::sync::atomic::{AtomicU64, Ordering};

/// 以 Unix 秒为单位的时间源。
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// 系统时钟。
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        now_epoch_seconds()
    }
}

/// 手动时钟，只在显式推进时变化。
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// 从当前系统时间开始的手动时钟。
    pub fn starting_now() -> Self {
        Self::new(now_epoch_seconds())
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

