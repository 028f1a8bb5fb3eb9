/// Coordinate validation and formatting.
use serde::Serializer;

use crate::{Error, RelayResult};

//  _____
// |_   _|   _ _ __   ___  ___
//   | || | | | '_ \ / _ \/ __|
//   | || |_| | |_) |  __/\__ \
//   |_| \__, | .__/ \___||___/
//       |___/|_|

/// Position in WGS 84: latitude, longitude (degrees) and height above ellipsoid (meters).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Point3d(pub f64, pub f64, pub f64);

impl Point3d {
    pub fn validate(&self) -> RelayResult<()> {
        validate_lat(self.0)?;
        validate_lon(self.1)?;
        validate_hae(self.2)?;
        Ok(())
    }
}

pub fn validate_lat(lat: f64) -> RelayResult<()> {
    // NaN fails the range check too
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InvalidCoord(format!("latitude {lat}")));
    }
    Ok(())
}

pub fn validate_lon(lon: f64) -> RelayResult<()> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(Error::InvalidCoord(format!("longitude {lon}")));
    }
    Ok(())
}

pub fn validate_hae(hae: f64) -> RelayResult<()> {
    if !hae.is_finite() {
        return Err(Error::InvalidCoord(format!("height above ellipsoid {hae}")));
    }
    Ok(())
}

//  _____                          _
// |  ___|__  _ __ _ __ ___   __ _| |_
// | |_ / _ \| '__| '_ ` _ \ / _` | __|
// |  _| (_) | |  | | | | | | (_| | |_
// |_|  \___/|_|  |_| |_| |_|\__,_|\__|

/// Canonical decimal form of a coordinate value.
///
/// Rust's `Display` for `f64` already prints the shortest string that parses back to the same
/// value and never switches to scientific notation. Whole numbers come out without a fractional
/// part (`10`), so one is appended to keep `10.0` recognizable as a decimal.
pub fn format_decimal(value: f64) -> String {
    let mut s = value.to_string();
    if value.is_finite() && !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// Serde `serialize_with` adapter for [`format_decimal`].
pub fn serialize_decimal<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_decimal(*value))
}
