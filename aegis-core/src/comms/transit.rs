//! Simulated network transit
//!
//! Delivery and response latency are modelled explicitly:
//! - [`TransitDelay`] decides how long each hop takes
//! - [`DelayedQueue`] holds scheduled items on a single timer task and
//!   hands each one to a handler when its delay expires
//!
//! With `FixedDelay` and tokio's paused test clock, transit is fully
//! deterministic.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tokio_util::time::DelayQueue;
use tracing::{debug, trace};

use crate::config::TransitConfig;

/// Source of transit delays
pub trait TransitDelay: Send + Sync {
    /// Time from `send` until the message is delivered
    fn delivery_delay(&self) -> Duration;

    /// Time from a request's delivery until the synthesized response is sent
    fn response_delay(&self) -> Duration;
}

/// Uniformly random delays within configured windows
#[derive(Debug, Clone)]
pub struct JitteredDelay {
    config: TransitConfig,
}

impl JitteredDelay {
    pub fn new(config: TransitConfig) -> Self {
        Self { config }
    }
}

impl Default for JitteredDelay {
    fn default() -> Self {
        Self::new(TransitConfig::default())
    }
}

fn sample(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let min_ms = min.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}

impl TransitDelay for JitteredDelay {
    fn delivery_delay(&self) -> Duration {
        sample(self.config.delivery_min, self.config.delivery_max)
    }

    fn response_delay(&self) -> Duration {
        sample(self.config.response_min, self.config.response_max)
    }
}

/// Constant delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    pub delivery: Duration,
    pub response: Duration,
}

impl FixedDelay {
    pub fn new(delivery: Duration, response: Duration) -> Self {
        Self { delivery, response }
    }

    /// Zero-latency transit
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl TransitDelay for FixedDelay {
    fn delivery_delay(&self) -> Duration {
        self.delivery
    }

    fn response_delay(&self) -> Duration {
        self.response
    }
}

/// Async callback invoked for every expired item
pub type ExpiryHandler<T> =
    Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Delayed-task queue backed by a single timer task
///
/// Items are handed to the handler one at a time, in expiry order. The
/// timer task exits when `shutdown` is cancelled, or once every
/// `DelayedQueue` handle is dropped and the pending items have drained.
pub struct DelayedQueue<T> {
    tx: mpsc::UnboundedSender<(T, Duration)>,
}

impl<T: Send + 'static> DelayedQueue<T> {
    /// Spawn the timer task; must be called within a tokio runtime
    pub fn spawn(handler: ExpiryHandler<T>, shutdown: CancellationToken) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(T, Duration)>();

        tokio::spawn(async move {
            let mut queue: DelayQueue<T> = DelayQueue::new();
            let mut accepting = true;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!(dropped = queue.len(), "Transit queue shut down");
                        break;
                    }
                    scheduled = rx.recv(), if accepting => match scheduled {
                        Some((item, delay)) => {
                            trace!(?delay, "Transit scheduled");
                            queue.insert(item, delay);
                        }
                        None => accepting = false,
                    },
                    Some(expired) = queue.next(), if !queue.is_empty() => {
                        handler(expired.into_inner()).await;
                    }
                    else => break,
                }
            }
        });

        Self { tx }
    }

    /// Schedule `item` to expire after `delay`
    ///
    /// Gives the item back if the timer task is gone.
    pub fn schedule(&self, item: T, delay: Duration) -> Result<(), T> {
        self.tx.send((item, delay)).map_err(|e| e.0.0)
    }
}
