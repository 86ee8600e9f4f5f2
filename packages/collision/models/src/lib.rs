#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collision record types and decoded categorical code tables.
//!
//! Raw collision rows carry numeric codes for severity, day of week,
//! weather and light conditions. This crate defines the closed lookup
//! tables those codes decode into. Every table has an explicit fallback
//! variant, so an unrecognized or missing code decodes to a label instead
//! of failing.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Severity of a collision.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollisionSeverity {
    /// Code 1: at least one person killed
    Fatal,
    /// Code 2: at least one serious injury
    Serious,
    /// Code 3: slight injuries only
    Slight,
    /// Any code outside the table
    Unknown,
}

impl CollisionSeverity {
    /// Decodes a numeric severity code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Fatal,
            2 => Self::Serious,
            3 => Self::Slight,
            _ => Self::Unknown,
        }
    }

    /// Returns the numeric code, or `None` for [`Self::Unknown`].
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        match self {
            Self::Fatal => Some(1),
            Self::Serious => Some(2),
            Self::Slight => Some(3),
            Self::Unknown => None,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.into()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Fatal, Self::Serious, Self::Slight, Self::Unknown]
    }
}

/// Day of the week a collision happened on.
///
/// Source data numbers days from Sunday (1) to Saturday (7).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Unknown,
}

impl DayOfWeek {
    /// Decodes a numeric day code (1 = Sunday).
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Sunday,
            2 => Self::Monday,
            3 => Self::Tuesday,
            4 => Self::Wednesday,
            5 => Self::Thursday,
            6 => Self::Friday,
            7 => Self::Saturday,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.into()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Sunday,
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Unknown,
        ]
    }
}

/// Weather at the time of a collision.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherCondition {
    #[strum(serialize = "Fine no high winds")]
    FineNoHighWinds,
    #[strum(serialize = "Raining no high winds")]
    RainingNoHighWinds,
    #[strum(serialize = "Snowing no high winds")]
    SnowingNoHighWinds,
    #[strum(serialize = "Fine + high winds")]
    FineHighWinds,
    #[strum(serialize = "Raining + high winds")]
    RainingHighWinds,
    #[strum(serialize = "Snowing + high winds")]
    SnowingHighWinds,
    #[strum(serialize = "Fog or mist")]
    FogOrMist,
    Other,
    /// Code 9, and any code outside the table
    Unknown,
    /// Code -1
    #[strum(serialize = "Data missing")]
    DataMissing,
}

impl WeatherCondition {
    /// Decodes a numeric weather code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::FineNoHighWinds,
            2 => Self::RainingNoHighWinds,
            3 => Self::SnowingNoHighWinds,
            4 => Self::FineHighWinds,
            5 => Self::RainingHighWinds,
            6 => Self::SnowingHighWinds,
            7 => Self::FogOrMist,
            8 => Self::Other,
            -1 => Self::DataMissing,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.into()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::FineNoHighWinds,
            Self::RainingNoHighWinds,
            Self::SnowingNoHighWinds,
            Self::FineHighWinds,
            Self::RainingHighWinds,
            Self::SnowingHighWinds,
            Self::FogOrMist,
            Self::Other,
            Self::Unknown,
            Self::DataMissing,
        ]
    }
}

/// Lighting at the time of a collision.
///
/// Codes 2 and 3 are not used by the source data and decode to
/// [`Self::Unknown`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LightCondition {
    Daylight,
    #[strum(serialize = "Darkness - lights lit")]
    DarknessLightsLit,
    #[strum(serialize = "Darkness - lights unlit")]
    DarknessLightsUnlit,
    #[strum(serialize = "Darkness - no lighting")]
    DarknessNoLighting,
    #[strum(serialize = "Darkness - lighting unknown")]
    DarknessLightingUnknown,
    /// Code -1
    #[strum(serialize = "Data missing")]
    DataMissing,
    Unknown,
}

impl LightCondition {
    /// Decodes a numeric light-conditions code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Daylight,
            4 => Self::DarknessLightsLit,
            5 => Self::DarknessLightsUnlit,
            6 => Self::DarknessNoLighting,
            7 => Self::DarknessLightingUnknown,
            -1 => Self::DataMissing,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.into()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Daylight,
            Self::DarknessLightsLit,
            Self::DarknessLightsUnlit,
            Self::DarknessNoLighting,
            Self::DarknessLightingUnknown,
            Self::DataMissing,
            Self::Unknown,
        ]
    }
}

/// A single collision row as loaded from the source data.
///
/// Categorical fields keep their raw numeric codes; decoding happens when
/// a collision is matched to a road corridor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionRecord {
    /// Unique collision identifier (`collision_index` in DfT data).
    pub id: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Date as written in the source (`dd/mm/YYYY`).
    pub date: String,
    /// Local time as written in the source (`HH:MM`).
    pub time: String,
    /// Severity code (1 = Fatal, 2 = Serious, 3 = Slight).
    pub severity: i32,
    /// Day-of-week code (1 = Sunday).
    pub day_of_week: i32,
    /// Weather code.
    pub weather: i32,
    /// Light-conditions code.
    pub light_conditions: i32,
    pub number_of_vehicles: u32,
    pub number_of_casualties: u32,
    /// Posted speed limit in mph, if recorded.
    pub speed_limit: Option<i32>,
}

/// A collision found inside a road corridor, with its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedCollision {
    /// The untouched source record.
    pub record: CollisionRecord,
    /// Distance from the collision to the road centerline, in meters.
    pub distance_to_road_m: f64,
    /// Ordinal of the closest sample point.
    pub nearest_sample_index: usize,
    /// Distance to the closest sample point, in meters.
    pub nearest_sample_distance_m: f64,
    pub severity: CollisionSeverity,
    pub day_of_week: DayOfWeek,
    pub weather: WeatherCondition,
    pub light: LightCondition,
    /// Hour of day (0-23) taken from the time field.
    pub hour: u8,
}

/// Parses the leading hour component of a time field such as `"17:45"`.
///
/// # Errors
///
/// Returns [`InvalidTimeError`] if the hour component is missing, is not
/// an integer, or is outside 0-23.
pub fn parse_hour(time: &str) -> Result<u8, InvalidTimeError> {
    let invalid = || InvalidTimeError {
        value: time.to_string(),
    };

    let hour_str = time.split(':').next().map(str::trim).ok_or_else(invalid)?;
    let hour = hour_str.parse::<u8>().map_err(|_| invalid())?;

    if hour > 23 {
        return Err(invalid());
    }

    Ok(hour)
}

/// Error returned when a time field has no parsable hour component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTimeError {
    /// The time string that was rejected.
    pub value: String,
}

impl std::fmt::Display for InvalidTimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid time '{}': expected HH:MM", self.value)
    }
}

impl std::error::Error for InvalidTimeError {}
