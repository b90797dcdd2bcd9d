//! Sensor permissions.
//!
//! Per-kind grant table consulted when a sensor starts. Clones share
//! the same table, so the host can hold one handle and flip state while
//! sensors hold another.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::registry::SensorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
        }
    }
}

/// Shared per-kind permission table.
#[derive(Debug, Clone, Default)]
pub struct Permissions {
    states: Rc<RefCell<HashMap<SensorKind, PermissionState>>>,
}

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state without side effects; unset kinds report `Prompt`.
    pub fn query(&self, kind: SensorKind) -> PermissionState {
        self.states
            .borrow()
            .get(&kind)
            .copied()
            .unwrap_or(PermissionState::Prompt)
    }

    pub fn grant(&self, kind: SensorKind) {
        self.states
            .borrow_mut()
            .insert(kind, PermissionState::Granted);
    }

    pub fn deny(&self, kind: SensorKind) {
        self.states
            .borrow_mut()
            .insert(kind, PermissionState::Denied);
    }

    pub fn reset(&self, kind: SensorKind) {
        self.states.borrow_mut().remove(&kind);
    }

    /// Resolves a start-time request. `Prompt` auto-grants, since an
    /// embedder without prompt UI would otherwise deadlock activation;
    /// an explicit `Denied` stays denied.
    pub fn request(&self, kind: SensorKind) -> PermissionState {
        let state = self.query(kind);
        match state {
            PermissionState::Denied | PermissionState::Granted => state,
            PermissionState::Prompt => {
                debug!("auto-granting {} permission", kind.as_str());
                self.grant(kind);
                PermissionState::Granted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_kind_reports_prompt() {
        let permissions = Permissions::new();
        assert_eq!(
            permissions.query(SensorKind::Gyroscope),
            PermissionState::Prompt
        );
    }

    #[test]
    fn request_auto_grants_prompt() {
        let permissions = Permissions::new();
        assert_eq!(
            permissions.request(SensorKind::Accelerometer),
            PermissionState::Granted
        );
        assert_eq!(
            permissions.query(SensorKind::Accelerometer),
            PermissionState::Granted
        );
    }

    #[test]
    fn denied_stays_denied() {
        let permissions = Permissions::new();
        permissions.deny(SensorKind::AmbientLight);
        assert_eq!(
            permissions.request(SensorKind::AmbientLight),
            PermissionState::Denied
        );
    }

    #[test]
    fn clones_share_the_table() {
        let permissions = Permissions::new();
        let handle = permissions.clone();
        handle.deny(SensorKind::Gravity);
        assert_eq!(permissions.query(SensorKind::Gravity), PermissionState::Denied);
        handle.reset(SensorKind::Gravity);
        assert_eq!(permissions.query(SensorKind::Gravity), PermissionState::Prompt);
    }
}
