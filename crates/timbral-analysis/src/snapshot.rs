//! Publish-latest hand-off between the capture thread and its readers.
//!
//! The capture thread builds a complete [`SpectrumSnapshot`] and swaps it in
//! with one atomic pointer store. Readers load whatever snapshot is current
//! without waiting; they may see a stale frame, never a half-written one.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Longest bar drawn by [`SpectrumSnapshot::bar_graph`].
pub const MAX_BAR_WIDTH: usize = 60;

/// One analyzed frame, immutable once published.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSnapshot {
    /// Frames analyzed before and including this one; 0 for the empty
    /// snapshot published before the first frame.
    pub frame_index: u64,
    /// Sample rate of the analyzed signal.
    pub sample_rate: f32,
    /// Frame length N.
    pub fft_size: usize,
    /// Time-domain frame, N samples.
    pub samples: Vec<f32>,
    /// Raw magnitudes, N/2 bins.
    pub magnitudes: Vec<f64>,
    /// Exponentially smoothed magnitudes, N/2 bins.
    pub smoothed: Vec<f64>,
    /// Strongest bin, excluding DC and bin 1.
    pub peak_bin: usize,
    /// Magnitude at the peak bin.
    pub peak_magnitude: f64,
    /// `peak_bin · sample_rate / N`, in Hz.
    pub dominant_frequency: f32,
}

impl SpectrumSnapshot {
    /// Silent snapshot used before the first frame.
    pub fn empty(fft_size: usize, sample_rate: f32) -> Self {
        Self {
            frame_index: 0,
            sample_rate,
            fft_size,
            samples: vec![0.0; fft_size],
            magnitudes: vec![0.0; fft_size / 2],
            smoothed: vec![0.0; fft_size / 2],
            peak_bin: 0,
            peak_magnitude: 0.0,
            dominant_frequency: 0.0,
        }
    }

    /// Text bar proportional to the peak magnitude, `mag · 50` cells wide
    /// up to [`MAX_BAR_WIDTH`].
    pub fn bar_graph(&self) -> String {
        let width = (self.peak_magnitude * 50.0).clamp(0.0, MAX_BAR_WIDTH as f64) as usize;
        "█".repeat(width)
    }

    /// Whether this is the placeholder published before any frame.
    pub fn is_empty(&self) -> bool {
        self.frame_index == 0
    }
}

/// Writer side of the snapshot hand-off.
#[derive(Debug)]
pub struct SnapshotPublisher {
    current: Arc<ArcSwap<SpectrumSnapshot>>,
}

impl SnapshotPublisher {
    /// Create a publisher holding an empty snapshot.
    pub fn new(fft_size: usize, sample_rate: f32) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(SpectrumSnapshot::empty(
                fft_size,
                sample_rate,
            ))),
        }
    }

    /// Replace the current snapshot.
    pub fn publish(&self, snapshot: SpectrumSnapshot) {
        self.current.store(Arc::new(snapshot));
    }

    /// Create a reader. Readers can be cloned and sent to other threads.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            current: Arc::clone(&self.current),
        }
    }
}

/// Reader side of the snapshot hand-off.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    current: Arc<ArcSwap<SpectrumSnapshot>>,
}

impl SnapshotReader {
    /// The most recently published snapshot. Never blocks.
    pub fn latest(&self) -> Arc<SpectrumSnapshot> {
        self.current.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_reader_sees_empty_then_published() {
        let publisher = SnapshotPublisher::new(16, 48000.0);
        let reader = publisher.reader();
        assert!(reader.latest().is_empty());

        let mut snapshot = SpectrumSnapshot::empty(16, 48000.0);
        snapshot.frame_index = 3;
        snapshot.peak_bin = 4;
        publisher.publish(snapshot);

        let latest = reader.latest();
        assert_eq!(latest.frame_index, 3);
        assert_eq!(latest.peak_bin, 4);
    }

    #[test]
    fn test_held_snapshot_survives_republish() {
        let publisher = SnapshotPublisher::new(8, 48000.0);
        let reader = publisher.reader();
        let held = reader.latest();

        let mut next = SpectrumSnapshot::empty(8, 48000.0);
        next.frame_index = 1;
        publisher.publish(next);

        assert_eq!(held.frame_index, 0, "held snapshot is immutable");
        assert_eq!(reader.latest().frame_index, 1);
    }

    #[test]
    fn test_readers_never_see_torn_snapshots() {
        let publisher = SnapshotPublisher::new(64, 48000.0);
        let reader = publisher.reader();

        let writer = thread::spawn(move || {
            for frame in 1..=500u64 {
                let mut s = SpectrumSnapshot::empty(64, 48000.0);
                s.frame_index = frame;
                s.magnitudes.fill(frame as f64);
                s.peak_magnitude = frame as f64;
                publisher.publish(s);
            }
        });

        let mut last = 0;
        for _ in 0..2000 {
            let snap = reader.latest();
            assert!(snap.frame_index >= last, "snapshots went backwards");
            let expected = snap.frame_index as f64;
            assert!(snap.magnitudes.iter().all(|m| *m == expected));
            assert_eq!(snap.peak_magnitude, expected);
            last = snap.frame_index;
        }
        writer.join().unwrap();
        assert_eq!(reader.latest().frame_index, 500);
    }

    #[test]
    fn test_bar_graph_width() {
        let mut s = SpectrumSnapshot::empty(8, 48000.0);
        s.peak_magnitude = 0.1;
        assert_eq!(s.bar_graph().chars().count(), 5);
        s.peak_magnitude = 100.0;
        assert_eq!(s.bar_graph().chars().count(), MAX_BAR_WIDTH);
        s.peak_magnitude = 0.0;
        assert!(s.bar_graph().is_empty());
    }
}
