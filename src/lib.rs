//! Sidereal (Vedic) birth chart computation.
//!
//! A chart is produced by a three stage pipeline: the [`time`] module turns a
//! local birth moment into a Julian Day (UT), the [`ephemeris`] adapter asks an
//! [`EphemerisOracle`] for raw tropical longitudes, and the [`chart`] builder
//! applies the ayanamsa, classifies the ascendant and assigns equal houses.
//!
//! Two oracles ship with the crate. [`AnalyticEphemeris`] is the default: a
//! low precision pure Rust theory (arcminutes for the planets, a few tenths
//! of a degree for the Moon). Charts from it can differ from Swiss Ephemeris
//! output for bodies or ascendants within a fraction of a degree of a sign or
//! house cusp. Build with the `swisseph` feature and use `SwissEph` when that
//! matters.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod analytic;
pub mod chart;
pub mod ephemeris;
pub mod pipeline;
pub mod settings;
#[cfg(feature = "swisseph")]
pub mod swisseph;
pub mod time;

pub use analytic::AnalyticEphemeris;
pub use chart::{
    build_chart, house_of, normalize_degrees, ChartResult, Placement, SiderealLongitude,
    TropicalLongitude,
};
pub use ephemeris::{
    CalculationFlags, EphemerisAdapter, EphemerisOracle, EphemerisSource, HouseSystem,
    OracleReply, OracleRequest, SiderealMode, TropicalPositions,
};
pub use pipeline::{calculate_chart, ChartCalculator};
pub use settings::{AyanamsaSource, ChartSettings, DEFAULT_FIXED_AYANAMSA};
#[cfg(feature = "swisseph")]
pub use swisseph::SwissEph;
pub use time::{julian_day, AstronomicalTime, BirthMoment};

// ---------------------------
// ## Enumerations
// ---------------------------

/// The nine grahas of the chart, in the order they are reported.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CelestialBody {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    /// Mean ascending lunar node.
    Rahu,
    /// Descending node, always opposite Rahu.
    Ketu,
}

impl CelestialBody {
    pub const ALL: [CelestialBody; 9] = [
        CelestialBody::Sun,
        CelestialBody::Moon,
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Mars,
        CelestialBody::Jupiter,
        CelestialBody::Saturn,
        CelestialBody::Rahu,
        CelestialBody::Ketu,
    ];

    pub fn iter() -> impl Iterator<Item = CelestialBody> {
        Self::ALL.iter().copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            CelestialBody::Sun => "Sun",
            CelestialBody::Moon => "Moon",
            CelestialBody::Mercury => "Mercury",
            CelestialBody::Venus => "Venus",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Jupiter",
            CelestialBody::Saturn => "Saturn",
            CelestialBody::Rahu => "Rahu",
            CelestialBody::Ketu => "Ketu",
        }
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CelestialBody::Rahu => write!(f, "Rahu (North Node)"),
            CelestialBody::Ketu => write!(f, "Ketu (South Node)"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// An equal house, numbered from the ascendant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum House {
    First = 1,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Eighth,
    Ninth,
    Tenth,
    Eleventh,
    Twelfth,
}

impl House {
    const ALL: [House; 12] = [
        House::First,
        House::Second,
        House::Third,
        House::Fourth,
        House::Fifth,
        House::Sixth,
        House::Seventh,
        House::Eighth,
        House::Ninth,
        House::Tenth,
        House::Eleventh,
        House::Twelfth,
    ];

    /// House for a 1-based index.
    pub fn from_index(index: usize) -> Option<House> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn all() -> impl Iterator<Item = House> {
        Self::ALL.iter().copied()
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "House {}", self.number())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries = 0,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

/// Signs in zodiacal order; sign `i` spans `[30 i, 30 (i + 1))` degrees.
pub const ZODIAC_SIGNS: [ZodiacSign; 12] = [
    ZodiacSign::Aries,
    ZodiacSign::Taurus,
    ZodiacSign::Gemini,
    ZodiacSign::Cancer,
    ZodiacSign::Leo,
    ZodiacSign::Virgo,
    ZodiacSign::Libra,
    ZodiacSign::Scorpio,
    ZodiacSign::Sagittarius,
    ZodiacSign::Capricorn,
    ZodiacSign::Aquarius,
    ZodiacSign::Pisces,
];

impl ZodiacSign {
    /// Sign occupied by a sidereal longitude.
    pub fn from_sidereal(longitude: SiderealLongitude) -> Self {
        // degrees() is in [0, 360), so the index is always 0..=11
        let sign_index = (longitude.degrees() / 30.0).floor() as usize;
        ZODIAC_SIGNS[sign_index.min(11)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------
// ## Structures
// ---------------------------

/// Observer position in degrees, north and east positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoLocation {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ---------------------------
// ## Error Handling
// ---------------------------

/// A birth moment could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("invalid date {input:?}: expected YYYY-MM-DD")]
    InvalidDate { input: String },
    #[error("invalid time {input:?}: expected HH:MM")]
    InvalidTime { input: String },
    #[error("unknown timezone {input:?}")]
    UnknownTimezone { input: String },
    #[error("local time {local} does not exist in {timezone}")]
    NonexistentLocalTime { local: String, timezone: String },
}

/// The oracle could not resolve a position or house cusp.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EphemerisError {
    #[error("ephemeris error {code} at JD {julian_day}: {message}")]
    Calculation {
        code: i32,
        julian_day: f64,
        message: String,
    },
    #[error("JD {julian_day} is outside the supported range {min}..{max}")]
    OutOfRange { julian_day: f64, min: f64, max: f64 },
    #[error("invalid location: latitude {latitude}, longitude {longitude}")]
    InvalidLocation { latitude: f64, longitude: f64 },
    #[error("ephemeris reply has no position for {body}")]
    MissingBody { body: CelestialBody },
    #[error("ephemeris returned a non-finite {quantity} ({value}) at JD {julian_day}")]
    NonFinite {
        quantity: String,
        value: f64,
        julian_day: f64,
    },
}

/// Rejected settings.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unsupported house system {code:?}: only equal houses ('A' or 'E') are supported")]
    UnsupportedHouseSystem { code: char },
    #[error("unsupported sidereal mode {name:?}: only \"lahiri\" is supported")]
    UnsupportedSiderealMode { name: String },
    #[error("invalid fixed ayanamsa {degrees}: must be finite and within [0, 360)")]
    InvalidAyanamsa { degrees: f64 },
    #[error("ephemeris path {path:?} contains a NUL byte")]
    InvalidEphemerisPath { path: String },
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Any failure of the chart pipeline. Each stage fails fast and its error is
/// surfaced unchanged.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn house_from_index_bounds() {
        assert_eq!(House::from_index(0), None);
        assert_eq!(House::from_index(1), Some(House::First));
        assert_eq!(House::from_index(12), Some(House::Twelfth));
        assert_eq!(House::from_index(13), None);
        let numbers: Vec<u8> = House::all().map(House::number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<u8>>());
    }

    #[test]
    fn sign_table_is_in_zodiac_order() {
        for (i, sign) in ZODIAC_SIGNS.iter().enumerate() {
            assert_eq!(sign.index(), i);
        }
        assert_eq!(ZodiacSign::Pisces.to_string(), "Pisces");
    }

    #[test]
    fn sign_from_sidereal_edges() {
        let at = |deg: f64| ZodiacSign::from_sidereal(SiderealLongitude::new(deg));
        assert_eq!(at(0.0), ZodiacSign::Aries);
        assert_eq!(at(29.999), ZodiacSign::Aries);
        assert_eq!(at(30.0), ZodiacSign::Taurus);
        assert_eq!(at(359.999), ZodiacSign::Pisces);
        assert_eq!(at(-0.5), ZodiacSign::Pisces);
    }

    #[test]
    fn node_display_names() {
        assert_eq!(CelestialBody::Rahu.to_string(), "Rahu (North Node)");
        assert_eq!(CelestialBody::Ketu.to_string(), "Ketu (South Node)");
        assert_eq!(CelestialBody::Mars.to_string(), "Mars");
        assert_eq!(CelestialBody::iter().count(), 9);
    }

    #[test]
    fn location_ranges() {
        assert!(GeoLocation::new(29.4739, 77.7041).is_valid());
        assert!(GeoLocation::new(-90.0, 180.0).is_valid());
        assert!(!GeoLocation::new(91.0, 0.0).is_valid());
        assert!(!GeoLocation::new(0.0, -180.5).is_valid());
        assert!(!GeoLocation::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn chart_error_keeps_message() {
        let err: ChartError = ParseError::InvalidDate {
            input: "1996/03/20".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid date \"1996/03/20\": expected YYYY-MM-DD"
        );
    }
}
