//! Capability detection and backend resolution.
//!
//! Detection runs once when the platform is constructed. Afterwards a
//! sensor kind's backend is fixed for the platform's lifetime and
//! nothing re-probes the host on the reading path.

use std::collections::HashMap;

use tracing::debug;

use crate::device::LegacyEventKind;

/// Sensor kinds the engine can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Accelerometer,
    LinearAcceleration,
    Gravity,
    Gyroscope,
    AbsoluteOrientation,
    RelativeOrientation,
    AmbientLight,
}

impl SensorKind {
    pub const ALL: [SensorKind; 7] = [
        SensorKind::Accelerometer,
        SensorKind::LinearAcceleration,
        SensorKind::Gravity,
        SensorKind::Gyroscope,
        SensorKind::AbsoluteOrientation,
        SensorKind::RelativeOrientation,
        SensorKind::AmbientLight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accelerometer => "accelerometer",
            Self::LinearAcceleration => "linear-acceleration",
            Self::Gravity => "gravity",
            Self::Gyroscope => "gyroscope",
            Self::AbsoluteOrientation => "absolute-orientation",
            Self::RelativeOrientation => "relative-orientation",
            Self::AmbientLight => "ambient-light",
        }
    }
}

/// What the host platform can deliver.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub device_motion: bool,
    pub device_orientation: bool,
    pub device_orientation_absolute: bool,
    /// Kinds the host serves directly, bypassing the legacy streams.
    pub native: Vec<SensorKind>,
}

impl Capabilities {
    /// Every legacy stream available, nothing native: the profile of a
    /// capable mobile browser.
    pub fn full_legacy() -> Self {
        Self {
            device_motion: true,
            device_orientation: true,
            device_orientation_absolute: true,
            native: Vec::new(),
        }
    }

    /// Nothing available at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_native(mut self, kind: SensorKind) -> Self {
        if !self.native.contains(&kind) {
            self.native.push(kind);
        }
        self
    }
}

/// Resolved implementation behind one sensor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The host injects readings for this kind directly.
    Native,
    /// Readings are adapted from a legacy event stream.
    Polyfill(LegacyEventKind),
    /// Nothing can serve this kind; starting it surfaces `NotReadable`.
    Unavailable,
}

/// Kind-to-backend table, resolved once per platform.
#[derive(Debug, Clone)]
pub struct SensorRegistry {
    backends: HashMap<SensorKind, Backend>,
}

impl SensorRegistry {
    pub fn resolve(capabilities: &Capabilities) -> Self {
        let mut backends = HashMap::new();
        for kind in SensorKind::ALL {
            let backend = Self::resolve_kind(capabilities, kind);
            debug!("sensor backend for {}: {:?}", kind.as_str(), backend);
            backends.insert(kind, backend);
        }
        Self { backends }
    }

    fn resolve_kind(capabilities: &Capabilities, kind: SensorKind) -> Backend {
        if capabilities.native.contains(&kind) {
            return Backend::Native;
        }
        match kind {
            SensorKind::Accelerometer
            | SensorKind::LinearAcceleration
            | SensorKind::Gravity
            | SensorKind::Gyroscope => {
                if capabilities.device_motion {
                    Backend::Polyfill(LegacyEventKind::DeviceMotion)
                } else {
                    Backend::Unavailable
                }
            }
            SensorKind::RelativeOrientation => {
                if capabilities.device_orientation {
                    Backend::Polyfill(LegacyEventKind::DeviceOrientation)
                } else {
                    Backend::Unavailable
                }
            }
            SensorKind::AbsoluteOrientation => {
                // Fall back to the relative stream: some hosts only tag
                // absoluteness through the compass heading there.
                if capabilities.device_orientation_absolute {
                    Backend::Polyfill(LegacyEventKind::DeviceOrientationAbsolute)
                } else if capabilities.device_orientation {
                    Backend::Polyfill(LegacyEventKind::DeviceOrientation)
                } else {
                    Backend::Unavailable
                }
            }
            // Light has no legacy stream to adapt.
            SensorKind::AmbientLight => Backend::Unavailable,
        }
    }

    pub fn backend(&self, kind: SensorKind) -> Backend {
        self.backends
            .get(&kind)
            .copied()
            .unwrap_or(Backend::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_legacy_resolves_motion_kinds_to_devicemotion() {
        let registry = SensorRegistry::resolve(&Capabilities::full_legacy());
        for kind in [
            SensorKind::Accelerometer,
            SensorKind::LinearAcceleration,
            SensorKind::Gravity,
            SensorKind::Gyroscope,
        ] {
            assert_eq!(
                registry.backend(kind),
                Backend::Polyfill(LegacyEventKind::DeviceMotion)
            );
        }
    }

    #[test]
    fn absolute_orientation_prefers_the_absolute_stream() {
        let registry = SensorRegistry::resolve(&Capabilities::full_legacy());
        assert_eq!(
            registry.backend(SensorKind::AbsoluteOrientation),
            Backend::Polyfill(LegacyEventKind::DeviceOrientationAbsolute)
        );
    }

    #[test]
    fn absolute_orientation_falls_back_to_relative_stream() {
        let capabilities = Capabilities {
            device_orientation: true,
            ..Capabilities::none()
        };
        let registry = SensorRegistry::resolve(&capabilities);
        assert_eq!(
            registry.backend(SensorKind::AbsoluteOrientation),
            Backend::Polyfill(LegacyEventKind::DeviceOrientation)
        );
    }

    #[test]
    fn missing_streams_resolve_to_unavailable() {
        let registry = SensorRegistry::resolve(&Capabilities::none());
        for kind in SensorKind::ALL {
            assert_eq!(registry.backend(kind), Backend::Unavailable);
        }
    }

    #[test]
    fn native_kinds_win_over_polyfill() {
        let capabilities = Capabilities::full_legacy().with_native(SensorKind::Accelerometer);
        let registry = SensorRegistry::resolve(&capabilities);
        assert_eq!(registry.backend(SensorKind::Accelerometer), Backend::Native);
        assert_eq!(
            registry.backend(SensorKind::Gyroscope),
            Backend::Polyfill(LegacyEventKind::DeviceMotion)
        );
    }

    #[test]
    fn ambient_light_is_native_only() {
        let registry = SensorRegistry::resolve(&Capabilities::full_legacy());
        assert_eq!(registry.backend(SensorKind::AmbientLight), Backend::Unavailable);

        let with_native =
            SensorRegistry::resolve(&Capabilities::none().with_native(SensorKind::AmbientLight));
        assert_eq!(with_native.backend(SensorKind::AmbientLight), Backend::Native);
    }
}
