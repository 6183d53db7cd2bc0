//! Paint pause before a calculation
//!
//! The engine runs on the same thread as the page, so the controller hands
//! control back for a short fixed delay before starting CPU-bound work.
//! This lets the busy overlay appear first.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Source of the paint pause
#[async_trait(?Send)]
pub trait Scheduler {
    /// Suspends for roughly `delay`, yielding at least once
    async fn yield_to_renderer(&self, delay: Duration);
}

/// Yields once and ignores the delay. For tests and headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

#[async_trait(?Send)]
impl Scheduler for ImmediateScheduler {
    async fn yield_to_renderer(&self, _delay: Duration) {
        yield_now().await;
    }
}

/// Sleeps on the tokio timer
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "native")]
#[async_trait(?Send)]
impl Scheduler for TokioScheduler {
    async fn yield_to_renderer(&self, delay: Duration) {
        tokio::task::yield_now().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Returns `Pending` once, then completes
#[derive(Debug, Default)]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Executor-agnostic single yield
pub fn yield_now() -> YieldNow {
    YieldNow::default()
}
