//! Client-side counters
//!
//! Plain atomics updated from the session task, plus a rolling frame time
//! history for percentiles. A summary line is logged periodically by the
//! session loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

const FRAME_HISTORY: usize = 600;

#[derive(Debug)]
pub struct ClientMetrics {
    // Frames
    pub frames_rendered: AtomicU64,
    pub frame_time_us: AtomicU64,
    pub frame_time_p95_us: AtomicU64,
    pub frame_time_p99_us: AtomicU64,
    pub frame_time_max_us: AtomicU64,

    // Network
    pub messages_received: AtomicU64,
    pub messages_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub undecodable_frames: AtomicU64,

    // Degraded paths
    pub dropped_intents: AtomicU64,
    pub ignored_updates: AtomicU64,
    pub registry_misses: AtomicU64,

    start_time: Instant,

    frame_history: RwLock<VecDeque<u64>>,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self {
            frames_rendered: AtomicU64::new(0),
            frame_time_us: AtomicU64::new(0),
            frame_time_p95_us: AtomicU64::new(0),
            frame_time_p99_us: AtomicU64::new(0),
            frame_time_max_us: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            undecodable_frames: AtomicU64::new(0),
            dropped_intents: AtomicU64::new(0),
            ignored_updates: AtomicU64::new(0),
            registry_misses: AtomicU64::new(0),
            start_time: Instant::now(),
            frame_history: RwLock::new(VecDeque::with_capacity(FRAME_HISTORY)),
        }
    }

    /// Record a frame time and update percentiles
    pub fn record_frame_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.frame_time_us.store(us, Ordering::Relaxed);
        self.frames_rendered.fetch_add(1, Ordering::Relaxed);

        let mut history = self.frame_history.write();
        history.push_back(us);
        while history.len() > FRAME_HISTORY {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();

            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            let p99_idx = (sorted.len() as f32 * 0.99) as usize;

            self.frame_time_p95_us
                .store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.frame_time_p99_us
                .store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.frame_time_max_us
                .store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_received(&self, bytes: usize) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sent(&self, bytes: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(counter: &AtomicU64, n: u64) {
        if n > 0 {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// One-line summary for the periodic stats log
    pub fn summary(&self) -> String {
        format!(
            "frames={} p95={}us p99={}us max={}us | rx={} ({} B) tx={} ({} B) | dropped={} ignored={} misses={} bad_frames={}",
            self.frames_rendered.load(Ordering::Relaxed),
            self.frame_time_p95_us.load(Ordering::Relaxed),
            self.frame_time_p99_us.load(Ordering::Relaxed),
            self.frame_time_max_us.load(Ordering::Relaxed),
            self.messages_received.load(Ordering::Relaxed),
            self.bytes_received.load(Ordering::Relaxed),
            self.messages_sent.load(Ordering::Relaxed),
            self.bytes_sent.load(Ordering::Relaxed),
            self.dropped_intents.load(Ordering::Relaxed),
            self.ignored_updates.load(Ordering::Relaxed),
            self.registry_misses.load(Ordering::Relaxed),
            self.undecodable_frames.load(Ordering::Relaxed),
        )
    }

    /// JSON snapshot of the counters
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "frames": {
                "rendered": self.frames_rendered.load(Ordering::Relaxed),
                "time_us": self.frame_time_us.load(Ordering::Relaxed),
                "p95_us": self.frame_time_p95_us.load(Ordering::Relaxed),
                "p99_us": self.frame_time_p99_us.load(Ordering::Relaxed),
                "max_us": self.frame_time_max_us.load(Ordering::Relaxed),
            },
            "network": {
                "messages_received": self.messages_received.load(Ordering::Relaxed),
                "messages_sent": self.messages_sent.load(Ordering::Relaxed),
                "bytes_received": self.bytes_received.load(Ordering::Relaxed),
                "bytes_sent": self.bytes_sent.load(Ordering::Relaxed),
                "undecodable_frames": self.undecodable_frames.load(Ordering::Relaxed),
            },
            "degraded": {
                "dropped_intents": self.dropped_intents.load(Ordering::Relaxed),
                "ignored_updates": self.ignored_updates.load(Ordering::Relaxed),
                "registry_misses": self.registry_misses.load(Ordering::Relaxed),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = ClientMetrics::new();
        assert_eq!(metrics.frames_rendered.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.dropped_intents.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_frame_time() {
        let metrics = ClientMetrics::new();
        for i in 0..100 {
            metrics.record_frame_time(Duration::from_micros(1_000 + i * 10));
        }
        assert_eq!(metrics.frames_rendered.load(Ordering::Relaxed), 100);
        assert!(metrics.frame_time_p95_us.load(Ordering::Relaxed) >= 1_900);
        assert_eq!(metrics.frame_time_max_us.load(Ordering::Relaxed), 1_990);
    }

    #[test]
    fn test_history_bounded() {
        let metrics = ClientMetrics::new();
        for _ in 0..(FRAME_HISTORY + 50) {
            metrics.record_frame_time(Duration::from_micros(500));
        }
        assert_eq!(metrics.frame_history.read().len(), FRAME_HISTORY);
    }

    #[test]
    fn test_traffic_counters() {
        let metrics = ClientMetrics::new();
        metrics.record_received(120);
        metrics.record_received(80);
        metrics.record_sent(16);
        ClientMetrics::add(&metrics.registry_misses, 3);

        assert_eq!(metrics.messages_received.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.bytes_received.load(Ordering::Relaxed), 200);
        assert_eq!(metrics.bytes_sent.load(Ordering::Relaxed), 16);

        let summary = metrics.summary();
        assert!(summary.contains("rx=2 (200 B)"));
        assert!(summary.contains("misses=3"));
    }

    #[test]
    fn test_json_format() {
        let metrics = ClientMetrics::new();
        metrics.dropped_intents.store(7, Ordering::Relaxed);
        let json = metrics.to_json();
        assert_eq!(json["degraded"]["dropped_intents"], 7);
        assert!(json["frames"].is_object());
    }
}
