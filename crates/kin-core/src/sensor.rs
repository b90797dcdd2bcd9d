//! Sensor lifecycle state machine.
//!
//! The activation bookkeeping every concrete sensor kind delegates to.
//! `SensorCore` owns state, reading freshness and the event target;
//! the adapters own the readings themselves and decide when to call in.

use tracing::debug;

use crate::event_target::EventTarget;

/// Activation lifecycle of a sensor.
///
/// `Error` is transient: it exists only while the `error` event is being
/// delivered, after which the sensor returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Idle,
    Activating,
    Active,
    Error,
}

/// Requested frequencies at or below this are ignored and the sensor
/// follows the native event cadence instead.
pub const FREQUENCY_FLOOR_HZ: f64 = 60.0;

/// Reference frame for orientation readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoordinateSystem {
    #[default]
    World,
    Screen,
}

/// Options accepted at sensor construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorOptions {
    /// Requested sampling hint in Hz; kept only above [`FREQUENCY_FLOOR_HZ`].
    pub frequency: Option<f64>,
    pub coordinate_system: CoordinateSystem,
}

/// Lifecycle state shared by every sensor kind.
#[derive(Debug)]
pub struct SensorCore {
    state: SensorState,
    activated: bool,
    has_reading: bool,
    timestamp: Option<f64>,
    frequency: Option<f64>,
    target: EventTarget,
}

impl SensorCore {
    pub fn new(options: &SensorOptions) -> Self {
        Self {
            state: SensorState::Idle,
            activated: false,
            has_reading: false,
            timestamp: None,
            frequency: options.frequency.filter(|hz| *hz > FREQUENCY_FLOOR_HZ),
            target: EventTarget::new(),
        }
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    /// True once the sensor has delivered its first reading, until it
    /// stops or errors out.
    pub fn activated(&self) -> bool {
        self.activated
    }

    pub fn has_reading(&self) -> bool {
        self.has_reading
    }

    /// Timestamp of the latest reading, in monotonic milliseconds.
    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    /// The honoured frequency hint, if any survived validation.
    pub fn frequency(&self) -> Option<f64> {
        self.frequency
    }

    pub fn target(&self) -> &EventTarget {
        &self.target
    }

    /// `start()` admission: moves `Idle` to `Activating` and reports
    /// whether the caller should proceed. Any other state is a no-op.
    pub fn begin_activation(&mut self) -> bool {
        match self.state {
            SensorState::Idle => {
                self.state = SensorState::Activating;
                debug!("sensor activating");
                true
            }
            _ => false,
        }
    }

    /// Accepts a fresh reading; returns true when this was the first one
    /// and the `activate` notification is owed before `reading`.
    pub fn record_reading(&mut self, timestamp: f64) -> bool {
        let first = self.state == SensorState::Activating;
        if first {
            self.state = SensorState::Active;
            self.activated = true;
            debug!("sensor active");
        }
        self.has_reading = true;
        self.timestamp = Some(timestamp);
        first
    }

    /// Marks the transient error state entered while the `error` event
    /// is delivered.
    pub fn enter_error(&mut self) {
        debug!("sensor error, will return to idle");
        self.state = SensorState::Error;
    }

    /// Returns to `Idle`, dropping activation flags and any exposed
    /// reading. Used by `stop()` and by the automatic post-error reset.
    pub fn reset(&mut self) {
        self.state = SensorState::Idle;
        self.activated = false;
        self.has_reading = false;
        self.timestamp = None;
    }

    /// True while legacy events should be ingested.
    pub fn accepts_readings(&self) -> bool {
        matches!(self.state, SensorState::Activating | SensorState::Active)
    }
}
