//! Hand-state snapshots and the sources that produce them.
//!
//! Trackers run on their own thread and publish whole [`HandState`] values
//! over a channel. The render loop reads the newest one at the start of each
//! frame through [`HandFeed::latest`]; if nothing new arrived the previous
//! snapshot stays in effect.
//!
//! Sources shipped here stand in for a camera tracker:
//!
//! * [`OrbitHands`] - scripted hands for demos and soak runs.
//! * [`ReplayHands`] - replays recorded snapshots, one JSON object per line.
//!
//! Pointer-driven hands live in [`crate::input`] because they are fed by
//! window events on the render thread.

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Thumb-to-index tip distance (normalized image units) treated as fully open.
pub const PINCH_OPEN_DISTANCE: f32 = 0.15;
/// Span between fully open and fully closed.
pub const PINCH_RANGE: f32 = 0.13;

/// One hand's reading for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandInfo {
    /// Horizontal position, 0 to 1, already mirrored for display.
    pub x: f32,
    /// Vertical position, 0 (top) to 1 (bottom).
    pub y: f32,
    /// 0 = open hand, 1 = thumb touching index finger.
    pub pinch: f32,
    /// `false` means no valid reading; the other fields are meaningless.
    pub detected: bool,
}

impl HandInfo {
    /// A detected hand.
    pub fn new(x: f32, y: f32, pinch: f32) -> Self {
        Self {
            x,
            y,
            pinch,
            detected: true,
        }
    }
}

/// Both hands for one tracked frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandState {
    #[serde(default)]
    pub left: Option<HandInfo>,
    #[serde(default)]
    pub right: Option<HandInfo>,
}

impl HandState {
    /// No hands in view.
    pub const NONE: HandState = HandState {
        left: None,
        right: None,
    };

    /// Hands that are present and detected, left first.
    pub fn detected(&self) -> impl Iterator<Item = &HandInfo> {
        self.left
            .iter()
            .chain(self.right.iter())
            .filter(|h| h.detected)
    }

    /// Number of detected hands, 0 to 2.
    pub fn detected_count(&self) -> usize {
        self.detected().count()
    }
}

/// Pinch amount from the normalized distance between thumb tip and index tip.
///
/// About 0.02 apart reads as closed (1.0), 0.15 or more as open (0.0).
pub fn pinch_from_tip_distance(distance: f32) -> f32 {
    ((PINCH_OPEN_DISTANCE - distance) / PINCH_RANGE).clamp(0.0, 1.0)
}

// ============================================================================
// Sources
// ============================================================================

/// Anything that can publish [`HandState`] snapshots over a channel.
pub trait HandSource: Send + 'static {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Publish snapshots until the receiver hangs up.
    fn run(self: Box<Self>, tx: Sender<HandState>);
}

/// Spawn a hand source on its own thread and return the reading end.
pub fn spawn_hand_source<S: HandSource>(source: S) -> HandFeed {
    let (tx, rx) = mpsc::channel();
    let name = source.name();
    info!(source = name, "Starting hand source");
    let spawned = thread::Builder::new()
        .name(format!("hands-{name}"))
        .spawn(move || Box::new(source).run(tx));

    match spawned {
        Ok(_) => HandFeed {
            rx: Some(rx),
            current: HandState::NONE,
        },
        Err(e) => {
            error!(source = name, error = %e, "Failed to start hand source; running without hands");
            HandFeed::idle()
        }
    }
}

/// Render-side end of a hand source.
#[derive(Debug)]
pub struct HandFeed {
    rx: Option<Receiver<HandState>>,
    current: HandState,
}

impl HandFeed {
    /// A feed with no source; always reports no hands.
    pub fn idle() -> Self {
        Self {
            rx: None,
            current: HandState::NONE,
        }
    }

    /// Drain pending snapshots and return the newest one seen so far.
    pub fn latest(&mut self) -> HandState {
        let Some(rx) = &self.rx else {
            return self.current;
        };
        loop {
            match rx.try_recv() {
                Ok(state) => self.current = state,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Hand source finished; keeping last snapshot");
                    self.rx = None;
                    break;
                }
            }
        }
        self.current
    }

    /// Disconnect from the source. Its thread exits on its next send.
    pub fn stop(&mut self) {
        if self.rx.take().is_some() {
            info!("Stopping hand source");
        }
        self.current = HandState::NONE;
    }
}

/// Scripted hands: the right hand circles and pinches on a slow cycle, and a
/// left hand joins periodically so the two-hand scale kicks in.
#[derive(Debug, Clone)]
pub struct OrbitHands {
    /// Snapshots per second.
    pub rate_hz: f32,
    /// Seconds per full orbit.
    pub period: f32,
}

impl Default for OrbitHands {
    fn default() -> Self {
        Self {
            rate_hz: 30.0,
            period: 8.0,
        }
    }
}

impl OrbitHands {
    /// Snapshot at `t` seconds into the script.
    pub fn sample(&self, t: f32) -> HandState {
        let phase = (t / self.period) * TAU;
        let right = HandInfo::new(
            0.5 + 0.3 * phase.cos(),
            0.5 + 0.25 * phase.sin(),
            (0.5 + 0.5 * (phase * 2.0).sin()).clamp(0.0, 1.0),
        );
        // Left hand is visible for the second half of every orbit.
        let left = (phase.sin() < 0.0).then(|| {
            let spread = 0.15 + 0.2 * (phase * 0.5).sin().abs();
            HandInfo::new(0.5 - spread, 0.5, 0.0)
        });
        HandState {
            left,
            right: Some(right),
        }
    }
}

impl HandSource for OrbitHands {
    fn name(&self) -> &'static str {
        "orbit"
    }

    fn run(self: Box<Self>, tx: Sender<HandState>) {
        let start = Instant::now();
        let interval = Duration::from_secs_f32(1.0 / self.rate_hz.max(1.0));
        loop {
            let state = self.sample(start.elapsed().as_secs_f32());
            if tx.send(state).is_err() {
                return;
            }
            thread::sleep(interval);
        }
    }
}

/// Replays recorded snapshots from a JSON-lines file, looping at the end.
#[derive(Debug, Clone)]
pub struct ReplayHands {
    pub path: PathBuf,
    /// Snapshots per second.
    pub rate_hz: f32,
}

impl ReplayHands {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rate_hz: 30.0,
        }
    }

    /// Read every parseable snapshot; malformed lines are skipped.
    pub fn load(&self) -> std::io::Result<Vec<HandState>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut frames = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HandState>(&line) {
                Ok(state) => frames.push(state),
                Err(e) => warn!(line = n + 1, error = %e, "Skipping malformed hand snapshot"),
            }
        }
        Ok(frames)
    }
}

impl HandSource for ReplayHands {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn run(self: Box<Self>, tx: Sender<HandState>) {
        let frames = match self.load() {
            Ok(frames) if !frames.is_empty() => frames,
            Ok(_) => {
                warn!(path = %self.path.display(), "Hand recording is empty");
                return;
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to open hand recording");
                return;
            }
        };
        info!(frames = frames.len(), "Replaying hand recording");

        let interval = Duration::from_secs_f32(1.0 / self.rate_hz.max(1.0));
        for state in frames.iter().cycle() {
            if tx.send(*state).is_err() {
                return;
            }
            thread::sleep(interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<HandState>);

    impl HandSource for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn run(self: Box<Self>, tx: Sender<HandState>) {
            for s in self.0 {
                let _ = tx.send(s);
            }
        }
    }

    #[test]
    fn test_pinch_from_tip_distance() {
        assert_eq!(pinch_from_tip_distance(0.2), 0.0);
        assert_eq!(pinch_from_tip_distance(0.15), 0.0);
        assert!((pinch_from_tip_distance(0.02) - 1.0).abs() < 1e-6);
        assert_eq!(pinch_from_tip_distance(0.0), 1.0);
        assert!((pinch_from_tip_distance(0.085) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_detected_filters_undetected() {
        let state = HandState {
            left: Some(HandInfo {
                detected: false,
                ..HandInfo::new(0.5, 0.5, 1.0)
            }),
            right: Some(HandInfo::new(0.2, 0.2, 0.0)),
        };
        assert_eq!(state.detected_count(), 1);
        assert_eq!(HandState::NONE.detected_count(), 0);
    }

    #[test]
    fn test_feed_keeps_newest_snapshot() {
        let a = HandState {
            left: None,
            right: Some(HandInfo::new(0.1, 0.1, 0.0)),
        };
        let b = HandState {
            left: Some(HandInfo::new(0.9, 0.9, 1.0)),
            right: None,
        };
        let (tx, rx) = mpsc::channel();
        tx.send(a).unwrap();
        tx.send(b).unwrap();
        let mut feed = HandFeed {
            rx: Some(rx),
            current: HandState::NONE,
        };
        assert_eq!(feed.latest(), b);
        // Nothing new: previous snapshot stays in effect.
        assert_eq!(feed.latest(), b);
        drop(tx);
        assert_eq!(feed.latest(), b);
        assert!(feed.rx.is_none());
    }

    #[test]
    fn test_spawned_source_delivers() {
        let state = HandState {
            left: None,
            right: Some(HandInfo::new(0.3, 0.7, 0.2)),
        };
        let mut feed = spawn_hand_source(Fixed(vec![state]));
        let deadline = Instant::now() + Duration::from_secs(2);
        while feed.latest() != state && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(feed.latest(), state);
        feed.stop();
        assert_eq!(feed.latest(), HandState::NONE);
    }

    #[test]
    fn test_orbit_hands_in_range() {
        let script = OrbitHands::default();
        for step in 0..200 {
            let state = script.sample(step as f32 * 0.05);
            for hand in state.detected() {
                assert!((0.0..=1.0).contains(&hand.x));
                assert!((0.0..=1.0).contains(&hand.y));
                assert!((0.0..=1.0).contains(&hand.pinch));
            }
            assert!(state.right.is_some());
        }
    }

    #[test]
    fn test_snapshot_json() {
        let json = r#"{"right":{"x":0.5,"y":0.25,"pinch":1.0,"detected":true}}"#;
        let state: HandState = serde_json::from_str(json).unwrap();
        assert!(state.left.is_none());
        assert_eq!(state.right, Some(HandInfo::new(0.5, 0.25, 1.0)));
    }
}
