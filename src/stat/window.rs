//! Time-bucketed ring shared by the rolling counter and gauge.
//!
//! # Responsibilities
//! - Hold `size` fixed-duration buckets
//! - Rotate lazily, zeroing every bucket whose time slot has passed
//! - Expose the live buckets to summary closures

use std::time::{Duration, Instant};
use parking_lot::Mutex;

/// Window shape: `size` buckets of `bucket_duration` each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingOpts {
    /// Number of buckets in the ring.
    pub size: usize,
    /// Time slot covered by one bucket.
    pub bucket_duration: Duration,
}

impl RollingOpts {
    /// Total time covered by the window.
    pub fn span(&self) -> Duration {
        self.bucket_duration
            .checked_mul(self.size as u32)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RollingOpts {
    fn default() -> Self {
        Self {
            size: 10,
            bucket_duration: Duration::from_millis(100),
        }
    }
}

/// Values recorded during one time slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    /// Recorded values. Counters keep a single running point.
    pub points: Vec<f64>,
    /// Number of additions made to this bucket.
    pub count: i64,
}

impl Bucket {
    /// Keep `value` as its own point.
    pub fn append(&mut self, value: f64) {
        self.points.push(value);
        self.count += 1;
    }

    /// Fold `value` into the first point.
    pub fn accumulate(&mut self, value: f64) {
        match self.points.first_mut() {
            Some(point) => *point += value,
            None => self.points.push(value),
        }
        self.count += 1;
    }

    fn reset(&mut self) {
        self.points.clear();
        self.count = 0;
    }
}

/// Iterator over live buckets, oldest first.
pub struct Buckets<'a> {
    ring: &'a [Bucket],
    next: usize,
    remaining: usize,
}

impl<'a> Iterator for Buckets<'a> {
    type Item = &'a Bucket;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let bucket = &self.ring[self.next];
        self.next = (self.next + 1) % self.ring.len();
        self.remaining -= 1;
        Some(bucket)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[derive(Debug)]
struct Ring {
    buckets: Vec<Bucket>,
    /// Index of the bucket receiving new values.
    cursor: usize,
    /// Start of the current bucket's time slot.
    slot_start: Instant,
}

impl Ring {
    fn rotate(&mut self, now: Instant, bucket_duration: Duration) {
        let elapsed = now.saturating_duration_since(self.slot_start);
        let bucket_nanos = bucket_duration.as_nanos().max(1);
        let span = elapsed.as_nanos() / bucket_nanos;
        if span == 0 {
            return;
        }

        let size = self.buckets.len();
        let steps = span.min(size as u128) as usize;
        for _ in 0..steps {
            self.cursor = (self.cursor + 1) % size;
            self.buckets[self.cursor].reset();
        }

        // Keep slot boundaries aligned to the original start.
        let into_slot = (elapsed.as_nanos() % bucket_nanos) as u64;
        self.slot_start = now
            .checked_sub(Duration::from_nanos(into_slot))
            .unwrap_or(now);
    }

    fn live(&self) -> Buckets<'_> {
        let size = self.buckets.len();
        Buckets {
            ring: &self.buckets,
            next: (self.cursor + 1) % size,
            remaining: size,
        }
    }
}

/// A fixed ring of time buckets guarded by a single lock.
#[derive(Debug)]
pub struct RollingWindow {
    opts: RollingOpts,
    ring: Mutex<Ring>,
}

impl RollingWindow {
    /// Create a window starting now. A zero `size` is treated as one bucket.
    pub fn new(opts: RollingOpts) -> Self {
        Self::starting_at(opts, Instant::now())
    }

    /// Create a window whose first slot begins at `start`.
    pub fn starting_at(opts: RollingOpts, start: Instant) -> Self {
        let opts = RollingOpts {
            size: opts.size.max(1),
            bucket_duration: opts.bucket_duration,
        };
        Self {
            ring: Mutex::new(Ring {
                buckets: vec![Bucket::default(); opts.size],
                cursor: 0,
                slot_start: start,
            }),
            opts,
        }
    }

    /// Window shape.
    pub fn opts(&self) -> RollingOpts {
        self.opts
    }

    /// Rotate to `now` and apply `f` to the current bucket.
    pub fn record_at<F>(&self, now: Instant, f: F)
    where
        F: FnOnce(&mut Bucket),
    {
        let mut ring = self.ring.lock();
        ring.rotate(now, self.opts.bucket_duration);
        let cursor = ring.cursor;
        f(&mut ring.buckets[cursor]);
    }

    /// Rotate to `now` and summarise the live buckets.
    pub fn reduce_at<F, R>(&self, now: Instant, f: F) -> R
    where
        F: FnOnce(Buckets<'_>) -> R,
    {
        let mut ring = self.ring.lock();
        ring.rotate(now, self.opts.bucket_duration);
        f(ring.live())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> RollingOpts {
        RollingOpts {
            size: 3,
            bucket_duration: Duration::from_millis(100),
        }
    }

    fn counts(window: &RollingWindow, now: Instant) -> Vec<i64> {
        window.reduce_at(now, |buckets| buckets.map(|b| b.count).collect())
    }

    #[test]
    fn test_values_land_in_current_bucket() {
        let start = Instant::now();
        let window = RollingWindow::starting_at(opts(), start);

        window.record_at(start, |b| b.append(1.0));
        window.record_at(start + Duration::from_millis(50), |b| b.append(2.0));

        // Newest bucket is last.
        assert_eq!(counts(&window, start + Duration::from_millis(60)), vec![0, 0, 2]);
    }

    #[test]
    fn test_rotation_shifts_and_expires() {
        let start = Instant::now();
        let window = RollingWindow::starting_at(opts(), start);

        window.record_at(start, |b| b.append(1.0));
        window.record_at(start + Duration::from_millis(150), |b| b.append(1.0));
        assert_eq!(counts(&window, start + Duration::from_millis(150)), vec![0, 1, 1]);

        // Two more slots later the first value is gone.
        assert_eq!(counts(&window, start + Duration::from_millis(320)), vec![1, 0, 0]);
    }

    #[test]
    fn test_idle_period_clears_everything() {
        let start = Instant::now();
        let window = RollingWindow::starting_at(opts(), start);
        for _ in 0..5 {
            window.record_at(start, |b| b.append(1.0));
        }

        let later = start + Duration::from_secs(60);
        assert_eq!(counts(&window, later), vec![0, 0, 0]);

        window.record_at(later, |b| b.append(1.0));
        assert_eq!(counts(&window, later), vec![0, 0, 1]);
    }

    #[test]
    fn test_slot_alignment_survives_rotation() {
        let start = Instant::now();
        let window = RollingWindow::starting_at(opts(), start);

        // Rotate at 130ms; the slot must still end at 200ms, not 230ms.
        window.record_at(start + Duration::from_millis(130), |b| b.append(1.0));
        window.record_at(start + Duration::from_millis(210), |b| b.append(1.0));
        assert_eq!(counts(&window, start + Duration::from_millis(210)), vec![0, 1, 1]);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let window = RollingWindow::new(RollingOpts {
            size: 0,
            bucket_duration: Duration::from_millis(10),
        });
        assert_eq!(window.opts().size, 1);
        window.record_at(Instant::now(), |b| b.accumulate(3.0));
        let total: f64 = window.reduce_at(Instant::now(), |buckets| buckets.flat_map(|b| b.points.iter()).sum());
        assert_eq!(total, 3.0);
    }

    #[test]
    fn test_accumulate_keeps_single_point() {
        let mut bucket = Bucket::default();
        bucket.accumulate(1.0);
        bucket.accumulate(0.0);
        bucket.accumulate(1.0);
        assert_eq!(bucket.points, vec![2.0]);
        assert_eq!(bucket.count, 3);
    }

    #[test]
    fn test_span() {
        assert_eq!(RollingOpts::default().span(), Duration::from_secs(1));
    }
}
