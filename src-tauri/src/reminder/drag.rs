//! Detects the end of a window drag.
//!
//! The window system reports a stream of move events while the user drags
//! and nothing when they let go. A drag counts as finished once no further
//! move arrives within the settle window; only then is the origin persisted.
//!
//! Moves the app makes itself (initial placement, fitting to content) are
//! announced with [`DragSettler::expect_move`] and never count as a drag.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::geometry::Point;

/// Quiet period after the last move before the drag counts as finished
pub const SETTLE_DELAY: Duration = Duration::from_millis(400);

/// Logical pixels of rounding allowed between a requested and a reported origin
const ORIGIN_TOLERANCE: f64 = 1.0;

#[derive(Clone)]
pub struct DragSettler {
    delay: Duration,
    generation: Arc<AtomicU64>,
    latest: Arc<Mutex<Option<Point>>>,
    expected: Arc<Mutex<Option<Point>>>,
}

impl Default for DragSettler {
    fn default() -> Self {
        Self::new(SETTLE_DELAY)
    }
}

impl DragSettler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            latest: Arc::new(Mutex::new(None)),
            expected: Arc::new(Mutex::new(None)),
        }
    }

    /// The app is about to move the window to `origin` itself. Move reports
    /// at that origin are skipped until one arrives somewhere else.
    pub fn expect_move(&self, origin: Point) {
        if let Ok(mut expected) = self.expected.lock() {
            *expected = Some(origin);
        }
    }

    fn is_expected(&self, origin: Point) -> bool {
        let Ok(mut expected) = self.expected.lock() else {
            return false;
        };
        let target = *expected;
        match target {
            Some(target)
                if (target.x - origin.x).abs() <= ORIGIN_TOLERANCE
                    && (target.y - origin.y).abs() <= ORIGIN_TOLERANCE =>
            {
                true
            }
            Some(_) => {
                *expected = None;
                false
            }
            None => false,
        }
    }

    /// Record a move. `on_settled` runs with the final origin once the window
    /// has been still for the settle delay; superseded moves never call it.
    pub fn moved<F>(&self, origin: Point, on_settled: F)
    where
        F: FnOnce(Point) + Send + 'static,
    {
        if self.is_expected(origin) {
            tracing::trace!(x = origin.x, y = origin.y, "Ignoring programmatic move");
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(origin);
        }

        let delay = self.delay;
        let current = Arc::clone(&self.generation);
        let latest = Arc::clone(&self.latest);
        spawn_detached(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            let settled = latest.lock().ok().and_then(|mut l| l.take());
            if let Some(origin) = settled {
                on_settled(origin);
            }
        });
    }
}

/// Spawn on the ambient tokio runtime when there is one (tests, async
/// commands), otherwise on Tauri's shared runtime (window event callbacks)
pub(crate) fn spawn_detached<F>(future: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(_) => {
            tauri::async_runtime::spawn(future);
        }
    }
}
