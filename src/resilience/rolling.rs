//! Bucketed rolling statistics window.
//!
//! # Responsibilities
//! - Count successes, failures, timeouts and rejections per time bucket
//! - Expire buckets that fall out of the trailing window
//! - Sum live buckets into a single `WindowCounts`
//!
//! # Design Decisions
//! - Fixed ring of `bucket_count` buckets, each tagged with the absolute
//!   bucket index it was last written for; a stale tag means the slot is
//!   reset before reuse
//! - Time is measured from a per-window origin with `tokio::time::Instant`
//!   so paused-clock tests drive expiry deterministically
//! - Not synchronized; the owning breaker guards it with its mutex

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Kind of sample folded into the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Success,
    Failure,
    Timeout,
    Rejection,
}

/// Aggregated counters over the live part of the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowCounts {
    pub successes: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub rejections: u64,
}

impl WindowCounts {
    /// Samples that count toward the error ratio (rejections excluded).
    pub fn volume(&self) -> u64 {
        self.successes + self.failures + self.timeouts
    }

    /// Failure-or-timeout share of `volume`, in percent.
    pub fn error_percentage(&self) -> f64 {
        let volume = self.volume();
        if volume == 0 {
            return 0.0;
        }
        (self.failures + self.timeouts) as f64 * 100.0 / volume as f64
    }

    fn add(&mut self, sample: Sample) {
        match sample {
            Sample::Success => self.successes += 1,
            Sample::Failure => self.failures += 1,
            Sample::Timeout => self.timeouts += 1,
            Sample::Rejection => self.rejections += 1,
        }
    }

    fn merge(&mut self, other: &WindowCounts) {
        self.successes += other.successes;
        self.failures += other.failures;
        self.timeouts += other.timeouts;
        self.rejections += other.rejections;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    index: u64,
    counts: WindowCounts,
}

/// Ring buffer of time buckets covering a fixed trailing duration.
#[derive(Debug)]
pub struct RollingWindow {
    origin: Instant,
    bucket_width: Duration,
    buckets: Vec<Bucket>,
}

impl RollingWindow {
    /// Create a window of `duration` split into `bucket_count` buckets.
    ///
    /// A zero `bucket_count` is treated as one bucket.
    pub fn new(duration: Duration, bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        let width = duration / bucket_count as u32;
        Self {
            origin: Instant::now(),
            bucket_width: width.max(Duration::from_millis(1)),
            buckets: vec![Bucket::default(); bucket_count],
        }
    }

    /// Fold one sample into the bucket covering `now`.
    pub fn record(&mut self, sample: Sample, now: Instant) {
        let index = self.bucket_index(now);
        let len = self.buckets.len() as u64;
        let bucket = &mut self.buckets[(index % len) as usize];
        if bucket.index != index {
            *bucket = Bucket {
                index,
                counts: WindowCounts::default(),
            };
        }
        bucket.counts.add(sample);
    }

    /// Sum of all buckets still inside the window at `now`.
    pub fn totals(&self, now: Instant) -> WindowCounts {
        let current = self.bucket_index(now);
        let len = self.buckets.len() as u64;
        let mut totals = WindowCounts::default();
        for bucket in &self.buckets {
            if bucket.index <= current && current - bucket.index < len {
                totals.merge(&bucket.counts);
            }
        }
        totals
    }

    /// Drop every sample.
    pub fn reset(&mut self) {
        for bucket in &mut self.buckets {
            *bucket = Bucket::default();
        }
    }

    fn bucket_index(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.origin);
        (elapsed.as_nanos() / self.bucket_width.as_nanos()) as u64
    }
}
