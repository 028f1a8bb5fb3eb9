use chrono::{DateTime, Datelike, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{coord::serialize_decimal, model::PositionReport, Error, RelayResult};

pub const COT_VERSION: &str = "2.0";

/// Machine generated, GPS derived.
pub const HOW_MACHINE_GPS: &str = "m-g";

/// Circular and linear error estimate, meters.
pub const ERROR_ESTIMATE_M: u32 = 10;

/// Last year with a plain four digit `xs:dateTime` form; chrono signs years past it.
pub const MAX_COT_YEAR: i32 = 9999;

/// Friendly-force position event.
///
/// Built fresh for every report and serialized immediately; see [`CotEvent::from_report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "event")]
pub struct CotEvent {
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "@uid")]
    pub uid: String,
    #[serde(rename = "@type")]
    pub cot_type: String,
    #[serde(rename = "@how")]
    pub how: String,
    #[serde(rename = "@time", with = "cot_time")]
    pub time: DateTime<Utc>,
    #[serde(rename = "@start", with = "cot_time")]
    pub start: DateTime<Utc>,
    #[serde(rename = "@stale", with = "cot_time")]
    pub stale: DateTime<Utc>,
    pub point: Point,
    pub detail: Detail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "@lat", serialize_with = "serialize_decimal")]
    pub lat: f64,
    #[serde(rename = "@lon", serialize_with = "serialize_decimal")]
    pub lon: f64,
    #[serde(rename = "@hae", serialize_with = "serialize_decimal")]
    pub hae: f64,
    #[serde(rename = "@ce")]
    pub ce: u32,
    #[serde(rename = "@le")]
    pub le: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    pub contact: Contact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "@callsign")]
    pub callsign: String,
}

impl CotEvent {
    /// Build the event for `report` as of `now`, truncated to whole seconds.
    pub fn from_report(
        report: &PositionReport,
        stale_minutes: u32,
        now: DateTime<Utc>,
    ) -> RelayResult<Self> {
        let time = now.trunc_subsecs(0);
        let out_of_range = || Error::StaleOutOfRange {
            time: time.to_rfc3339(),
            stale_minutes,
        };
        let stale = time
            .checked_add_signed(TimeDelta::minutes(i64::from(stale_minutes)))
            .filter(|stale| stale.year() <= MAX_COT_YEAR)
            .ok_or_else(out_of_range)?;

        Ok(Self {
            version: COT_VERSION.to_string(),
            uid: report.event_uid(),
            cot_type: report.kind.cot_type().to_string(),
            how: HOW_MACHINE_GPS.to_string(),
            time,
            start: time,
            stale,
            point: Point {
                lat: report.lat,
                lon: report.lon,
                hae: report.hae,
                ce: ERROR_ESTIMATE_M,
                le: ERROR_ESTIMATE_M,
            },
            detail: Detail {
                contact: Contact {
                    callsign: report.name.clone(),
                },
                remarks: report.remarks_text().map(str::to_string),
            },
        })
    }

    pub fn to_bytes(&self) -> RelayResult<Vec<u8>> {
        quick_xml::se::to_string(self)
            .map(String::into_bytes)
            .map_err(|e| Error::Encode(e.to_string()))
    }
}

/// Encode one report as a CoT XML document (no XML declaration).
///
/// Pure function of its inputs: the caller supplies `now`.
pub fn encode(
    report: &PositionReport,
    stale_minutes: u32,
    now: DateTime<Utc>,
) -> RelayResult<Vec<u8>> {
    let event = CotEvent::from_report(report, stale_minutes, now)?;
    let bytes = event.to_bytes()?;
    debug!(uid = %event.uid, cot_type = %event.cot_type, len = bytes.len(), "encoded cot event");
    Ok(bytes)
}

/// CoT timestamps: UTC, whole seconds, `Z` suffix.
mod cot_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
