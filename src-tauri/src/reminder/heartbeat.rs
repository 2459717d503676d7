//! Heartbeat scheduling for the floating reminder.
//!
//! A heartbeat is a short burst of pulses. The first one fires shortly after
//! the reminder appears, then one fires every `interval`. The front-end owns
//! the look of a pulse; this module only decides when pulses happen.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{sleep, sleep_until, Instant};

/// Event emitted to the reminder window for every pulse
pub const EVENT_PULSE: &str = "reminder:pulse";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatSchedule {
    /// Delay before the first heartbeat
    pub initial_delay: Duration,
    /// Time between the starts of consecutive heartbeats
    pub interval: Duration,
    pub pulses_per_beat: u32,
    pub pulse_spacing: Duration,
    /// Rings drawn per pulse, staggered by `ring_stagger`
    pub rings_per_pulse: u32,
    pub ring_stagger: Duration,
}

impl Default for HeartbeatSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            interval: Duration::from_secs(30 * 60),
            pulses_per_beat: 3,
            pulse_spacing: Duration::from_secs(2),
            rings_per_pulse: 3,
            ring_stagger: Duration::from_millis(250),
        }
    }
}

impl HeartbeatSchedule {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Offsets of each pulse from the start of its heartbeat
    pub fn pulse_offsets(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.pulses_per_beat).map(move |i| self.pulse_spacing * i)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pulse {
    /// Heartbeat number, starting at 0
    pub beat: u64,
    /// Pulse number within the heartbeat
    pub pulse: u32,
    pub rings: u32,
    pub ring_stagger_ms: u64,
}

/// Receiver of pulses (the reminder window in the app, a recorder in tests)
pub trait PulseSink: Send + Sync + 'static {
    fn pulse(&self, pulse: Pulse);
}

/// Run the heartbeat forever. Stop it by dropping or aborting the task.
pub async fn run_heartbeat<S: PulseSink>(schedule: HeartbeatSchedule, sink: S) {
    let mut beat_start = Instant::now() + schedule.initial_delay;
    let mut beat: u64 = 0;

    loop {
        sleep_until(beat_start).await;

        let mut previous = Duration::ZERO;
        for (index, offset) in schedule.pulse_offsets().enumerate() {
            if offset > previous {
                sleep(offset - previous).await;
                previous = offset;
            }
            tracing::trace!(beat, pulse = index, "Heartbeat pulse");
            sink.pulse(Pulse {
                beat,
                pulse: index as u32,
                rings: schedule.rings_per_pulse,
                ring_stagger_ms: schedule.ring_stagger.as_millis() as u64,
            });
        }

        beat += 1;
        beat_start += schedule.interval;
    }
}
