use crate::error::Error;
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

/// Configures a [`TokenBucket`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct TokenBucketSettings {
    /// Tokens added per second. Must be finite and positive.
    pub rate: f64,
    /// Bucket capacity, which is also the largest burst admitted at once.
    pub burst: u32,
}

#[derive(Debug)]
struct BucketState {
    /// Goes negative while callers are waiting on reservations.
    tokens: f64,
    last: Instant,
}

/// A token bucket shared by every caller in the process.
///
/// [`acquire`](TokenBucket::acquire) reserves a token up front and then
/// sleeps until the reservation matures, so waiters are served in the order
/// they arrived.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Creates a full bucket.
    pub fn new(settings: TokenBucketSettings) -> Result<Self, Error> {
        if !settings.rate.is_finite() || settings.rate <= 0.0 || settings.burst == 0 {
            return Err(Error::InvalidSettings {
                rate: settings.rate,
                burst: settings.burst,
            });
        }

        let burst = f64::from(settings.burst);
        Ok(Self {
            rate: settings.rate,
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                last: Instant::now(),
            }),
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn burst(&self) -> u32 {
        self.burst as u32
    }

    /// Waits for a token, or fails with [`Error::Cancelled`] once `cancel`
    /// resolves. A cancelled (or dropped) wait hands its reservation back.
    pub async fn acquire<F>(&self, cancel: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let wait = {
            let mut state = self.state.lock();
            self.refill(&mut state, Instant::now());
            state.tokens -= 1.0;
            if state.tokens >= 0.0 {
                trace!(tokens = state.tokens, "Token granted immediately");
                return Ok(());
            }
            refill_time(-state.tokens, self.rate)
        };

        trace!(?wait, "Waiting for token");
        let reservation = Reservation::new(self);

        tokio::select! {
            biased;
            _ = tokio::time::sleep(wait) => {
                reservation.commit();
                Ok(())
            }
            _ = cancel => {
                debug!(?wait, "Admission cancelled, returning reserved token");
                drop(reservation);
                Err(Error::Cancelled)
            }
        }
    }

    /// Takes a token only if one is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state, Instant::now());
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently in the bucket. Negative while reservations are
    /// outstanding.
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock();
        self.refill(&mut state, Instant::now());
        state.tokens
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
        state.last = now;
    }

    fn release(&self) {
        let mut state = self.state.lock();
        self.refill(&mut state, Instant::now());
        state.tokens = (state.tokens + 1.0).min(self.burst);
    }
}

/// Time for `deficit` tokens to accrue. Saturates at `Duration::MAX` when
/// the rate is too small to express the wait, which tokio treats as never.
fn refill_time(deficit: f64, rate: f64) -> Duration {
    Duration::try_from_secs_f64(deficit / rate).unwrap_or(Duration::MAX)
}

/// Returns the reserved token unless committed.
struct Reservation<'a> {
    bucket: &'a TokenBucket,
    committed: bool,
}

impl<'a> Reservation<'a> {
    fn new(bucket: &'a TokenBucket) -> Self {
        Self {
            bucket,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.bucket.release();
        }
    }
}
