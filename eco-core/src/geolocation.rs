//! Best-known-position lookup.

use std::fmt;
use std::sync::Arc;

use crate::model::{Coordinate, LocationFix};
use crate::ports::LocationPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Why no position could be produced.
pub enum LocationIssue {
    /// The GPS source is switched off.
    GpsDisabled,
    /// The location permission was not granted.
    PermissionMissing,
    /// Both preconditions hold but no source has a fix yet.
    NoFix,
}

impl fmt::Display for LocationIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LocationIssue::GpsDisabled => "GPS disabled",
            LocationIssue::PermissionMissing => "location permission missing",
            LocationIssue::NoFix => "no last known fix",
        };
        write!(formatter, "{text}")
    }
}

/// Answers "where is the user" from the platform's last-known fixes.
///
/// No fresh fix is requested, so the result can be stale or absent even when
/// every precondition holds.
pub struct GeolocationProvider {
    platform: Arc<dyn LocationPort>,
}

impl GeolocationProvider {
    /// Wrap a platform location port.
    #[must_use]
    pub fn new(platform: Arc<dyn LocationPort>) -> Self {
        Self { platform }
    }

    /// Whether the location permission is granted.
    #[must_use]
    pub fn has_permission(&self) -> bool {
        self.platform.has_permission()
    }

    /// Whether the GPS source is on.
    #[must_use]
    pub fn is_location_enabled(&self) -> bool {
        self.platform.is_location_enabled()
    }

    /// Most accurate last-known position, if permission and GPS are both available.
    #[must_use]
    pub fn current_position(&self) -> Option<Coordinate> {
        if !(self.has_permission() && self.is_location_enabled()) {
            return None;
        }
        best_fix(self.platform.last_known_fixes()).map(|fix| fix.coordinate)
    }

    /// First failing precondition, GPS checked before permission.
    #[must_use]
    pub fn precondition(&self) -> Option<LocationIssue> {
        if !self.is_location_enabled() {
            Some(LocationIssue::GpsDisabled)
        } else if !self.has_permission() {
            Some(LocationIssue::PermissionMissing)
        } else {
            None
        }
    }

    /// Position, or the reason there is none.
    ///
    /// # Errors
    ///
    /// Returns the [`LocationIssue`] that prevented a lookup.
    pub fn locate(&self) -> Result<Coordinate, LocationIssue> {
        if let Some(issue) = self.precondition() {
            return Err(issue);
        }
        self.current_position().ok_or(LocationIssue::NoFix)
    }
}

// Only a strictly lower accuracy replaces the current best: ties keep the earliest
// source and an unordered (NaN) accuracy never wins.
fn best_fix(fixes: Vec<LocationFix>) -> Option<LocationFix> {
    fixes.into_iter().fold(None, |best, fix| match best {
        Some(current) if fix.accuracy < current.accuracy => Some(fix),
        Some(current) => Some(current),
        None => Some(fix),
    })
}
