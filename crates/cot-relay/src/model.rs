/// Position reports as they arrive from clients, before encoding.
///
/// A [`PositionReport`] is built from one item of an incoming [`PositionBatch`], consumed once
/// by the CoT encoder and then dropped.
use serde::{Deserialize, Serialize};

use crate::{coord::Point3d, Error, RelayResult};

/// Window after which consumers should treat a report as outdated, when the request omits one.
pub const DEFAULT_STALE_MINUTES: u32 = 5;

/// Prefix for uids derived from a display name.
pub const DERIVED_UID_PREFIX: &str = "REST_";

//  _____
// |_   _|   _ _ __   ___  ___
//   | || | | | '_ \ / _ \/ __|
//   | || |_| | |_) |  __/\__ \
//   |_| \__, | .__/ \___||___/
//       |___/|_|

/// Reportable entity classes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Person,
    Car,
    Helicopter,
    Drone,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::Person,
        ObjectKind::Car,
        ObjectKind::Helicopter,
        ObjectKind::Drone,
    ];

    /// Friendly-force CoT type code (MIL-STD-2525 derived) for this kind.
    pub fn cot_type(self) -> &'static str {
        match self {
            ObjectKind::Person => "a-f-G-U",
            ObjectKind::Car => "a-f-G-E-V-C-U-L",
            ObjectKind::Helicopter => "a-f-A-C-H",
            ObjectKind::Drone => "a-f-A-C-H",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    #[serde(default)]
    pub uid: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub hae: f64,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl PositionReport {
    pub fn new(name: &str, kind: ObjectKind, lat: f64, lon: f64) -> Self {
        Self {
            uid: None,
            name: name.to_string(),
            kind,
            lat,
            lon,
            hae: 0.0,
            remarks: None,
        }
    }

    pub fn with_uid(mut self, uid: &str) -> Self {
        self.uid = Some(uid.to_string());
        self
    }

    pub fn with_hae(mut self, hae: f64) -> Self {
        self.hae = hae;
        self
    }

    pub fn with_remarks(mut self, remarks: &str) -> Self {
        self.remarks = Some(remarks.to_string());
        self
    }

    pub fn position(&self) -> Point3d {
        Point3d(self.lat, self.lon, self.hae)
    }

    pub fn validate(&self) -> RelayResult<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidReport("name must not be empty".to_string()));
        }
        self.position().validate()
    }

    /// The supplied uid verbatim, or one derived from the display name.
    ///
    /// An empty supplied uid counts as absent.
    pub fn event_uid(&self) -> String {
        match self.uid.as_deref() {
            Some(uid) if !uid.is_empty() => uid.to_string(),
            _ => format!("{DERIVED_UID_PREFIX}{}", sanitize_uid(&self.name)),
        }
    }

    /// Remarks text, if there is any worth emitting.
    pub fn remarks_text(&self) -> Option<&str> {
        self.remarks.as_deref().filter(|r| !r.is_empty())
    }
}

/// Trim surrounding whitespace, then replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_uid(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Request body for a batch of position reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionBatch {
    pub api_key: String,
    pub objects: Vec<PositionReport>,
    #[serde(default)]
    pub stale_minutes: Option<u32>,
}

impl PositionBatch {
    pub fn stale_minutes(&self) -> u32 {
        self.stale_minutes.unwrap_or(DEFAULT_STALE_MINUTES)
    }

    /// Check every report, failing on the first invalid one.
    pub fn validate(&self) -> RelayResult<()> {
        for (i, report) in self.objects.iter().enumerate() {
            report.validate().map_err(|e| {
                Error::InvalidReport(format!("objects[{i}] ({:?}): {e}", report.name))
            })?;
        }
        Ok(())
    }
}
