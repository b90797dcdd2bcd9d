//! Sensor event objects.

use crate::error::SensorError;

/// Event names a sensor can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorEventType {
    Activate,
    Reading,
    Error,
}

impl SensorEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Reading => "reading",
            Self::Error => "error",
        }
    }
}

/// Identifies an event target while an event is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub(crate) u64);

/// An event delivered through an [`crate::event_target::EventTarget`].
///
/// `target` and `current_target` are populated only for the duration of
/// a dispatch; once delivery completes both revert to `None`.
#[derive(Debug, Clone)]
pub struct SensorEvent {
    event_type: SensorEventType,
    timestamp: f64,
    bubbles: bool,
    error: Option<SensorError>,
    target: Option<TargetId>,
    current_target: Option<TargetId>,
}

impl SensorEvent {
    /// A non-bubbling event, the default for sensor notifications.
    pub fn new(event_type: SensorEventType, timestamp: f64) -> Self {
        Self {
            event_type,
            timestamp,
            bubbles: false,
            error: None,
            target: None,
            current_target: None,
        }
    }

    /// Same as [`SensorEvent::new`] but propagating to parent targets.
    pub fn bubbling(event_type: SensorEventType, timestamp: f64) -> Self {
        Self {
            bubbles: true,
            ..Self::new(event_type, timestamp)
        }
    }

    /// An `error` event carrying the failure payload.
    pub fn error(error: SensorError, timestamp: f64) -> Self {
        Self {
            error: Some(error),
            ..Self::new(SensorEventType::Error, timestamp)
        }
    }

    pub fn event_type(&self) -> SensorEventType {
        self.event_type
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn error_payload(&self) -> Option<&SensorError> {
        self.error.as_ref()
    }

    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    pub fn current_target(&self) -> Option<TargetId> {
        self.current_target
    }

    pub(crate) fn set_target(&mut self, id: TargetId) {
        self.target = Some(id);
    }

    pub(crate) fn set_current_target(&mut self, id: TargetId) {
        self.current_target = Some(id);
    }

    pub(crate) fn clear_dispatch_state(&mut self) {
        self.target = None;
        self.current_target = None;
    }
}
