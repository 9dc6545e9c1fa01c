//! Latest-wins stream throttling

use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Inner items taken per poll before yielding to the interval.
const MAX_DRAIN_PER_POLL: usize = 32;

/// Extension trait to add throttling to any Stream
pub trait ThrottleExt: Stream {
    /// Emit at most one item per `period`.
    ///
    /// Items arriving within one period replace each other; only the latest is
    /// emitted when the period elapses. The final pending item is flushed when
    /// the inner stream ends.
    fn throttle(self, period: Duration) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, period)
    }
}

impl<T: Stream> ThrottleExt for T {}

pin_project! {
    /// Stream returned by [`ThrottleExt::throttle`].
    pub struct Throttle<S: Stream> {
        #[pin]
        stream: S,
        interval: Interval,
        pending: Option<S::Item>,
        done: bool,
    }
}

impl<S: Stream> Throttle<S> {
    pub fn new(stream: S, period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { stream, interval, pending: None, done: false }
    }
}

impl<S: Stream> Stream for Throttle<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        for _ in 0..MAX_DRAIN_PER_POLL {
            if *this.done {
                break;
            }
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.pending = Some(item),
                Poll::Ready(None) => *this.done = true,
                Poll::Pending => break,
            }
        }

        if *this.done {
            return Poll::Ready(this.pending.take());
        }
        if this.pending.is_none() {
            return Poll::Pending;
        }

        match this.interval.poll_tick(cx) {
            Poll::Ready(_) => Poll::Ready(this.pending.take()),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    #[tokio::test(start_paused = true)]
    async fn keeps_latest_item_per_period() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut throttled = UnboundedReceiverStream::new(rx).throttle(Duration::from_millis(100));

        // First tick is immediate.
        tx.send(1).unwrap();
        assert_eq!(throttled.next().await, Some(1));

        tx.send(2).unwrap();
        tx.send(3).unwrap();
        assert_eq!(throttled.next().await, Some(3));

        tx.send(4).unwrap();
        drop(tx);
        assert_eq!(throttled.next().await, Some(4));
        assert_eq!(throttled.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_pending_item_on_end() {
        let items = futures::stream::iter(vec![1, 2, 3]);
        let collected: Vec<_> = items.throttle(Duration::from_secs(1)).collect().await;
        assert_eq!(collected, vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn always_ready_source_still_yields() {
        let throttled = futures::stream::iter(0u64..).throttle(Duration::from_millis(100));
        let seen: Vec<_> = throttled.take(3).collect().await;
        assert_eq!(seen.len(), 3);
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
