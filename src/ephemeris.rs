//! Oracle interface and the adapter that turns one oracle reply into the
//! ascendant and nine tropical positions.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chart::{normalize_degrees, TropicalLongitude};
use crate::time::AstronomicalTime;
use crate::{CelestialBody, ConfigurationError, EphemerisError, GeoLocation};

// ---------------------------
// ## Oracle identifiers and flags
// ---------------------------

/// Body identifiers in Swiss Ephemeris numbering. Ketu has no entry: it is
/// always derived from Rahu.
pub const BODY_IDENTIFIERS: [(CelestialBody, i32); 8] = [
    (CelestialBody::Sun, 0),
    (CelestialBody::Moon, 1),
    (CelestialBody::Mercury, 2),
    (CelestialBody::Venus, 3),
    (CelestialBody::Mars, 4),
    (CelestialBody::Jupiter, 5),
    (CelestialBody::Saturn, 6),
    // SE_MEAN_NODE
    (CelestialBody::Rahu, 10),
];

pub fn oracle_identifier(body: CelestialBody) -> Option<i32> {
    BODY_IDENTIFIERS
        .iter()
        .find(|(b, _)| *b == body)
        .map(|(_, id)| *id)
}

/// House division requested from the oracle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HouseSystem {
    /// Twelve 30° houses starting at the ascendant.
    Equal,
}

impl HouseSystem {
    /// Maps a Swiss Ephemeris house-system letter.
    pub fn from_code(code: char) -> Result<Self, ConfigurationError> {
        match code {
            'A' | 'E' => Ok(HouseSystem::Equal),
            other => Err(ConfigurationError::UnsupportedHouseSystem { code: other }),
        }
    }

    pub fn code(self) -> char {
        match self {
            HouseSystem::Equal => 'A',
        }
    }
}

/// Ayanamsa model the oracle reports with its positions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiderealMode {
    Lahiri,
}

impl SiderealMode {
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lahiri" | "chitrapaksha" => Ok(SiderealMode::Lahiri),
            _ => Err(ConfigurationError::UnsupportedSiderealMode {
                name: name.to_string(),
            }),
        }
    }

    /// SE_SIDM_* constant.
    pub fn code(self) -> i32 {
        match self {
            SiderealMode::Lahiri => 1,
        }
    }
}

/// Which numerical theory the oracle should use when it offers a choice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EphemerisSource {
    /// Swiss Ephemeris data files.
    Swiss,
    /// Built-in semi-analytical theory, no data files needed.
    Moshier,
}

impl EphemerisSource {
    /// SEFLG_SWIEPH / SEFLG_MOSEPH.
    pub fn flag(self) -> i32 {
        match self {
            EphemerisSource::Swiss => 2,
            EphemerisSource::Moshier => 4,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationFlags {
    pub source: EphemerisSource,
    pub sidereal_mode: SiderealMode,
}

impl Default for CalculationFlags {
    fn default() -> Self {
        CalculationFlags {
            source: EphemerisSource::Swiss,
            sidereal_mode: SiderealMode::Lahiri,
        }
    }
}

// ---------------------------
// ## Oracle interface
// ---------------------------

/// One round trip to the oracle. Positions are always asked for in the
/// tropical frame; the sidereal mode only selects which ayanamsa is reported.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest<'a> {
    pub time: AstronomicalTime,
    pub location: GeoLocation,
    pub house_system: HouseSystem,
    pub flags: CalculationFlags,
    pub bodies: &'a [i32],
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleReply {
    /// Tropical longitude of the first house cusp.
    pub ascendant: f64,
    /// Tropical longitude per requested identifier.
    pub bodies: Vec<(i32, f64)>,
    /// Ayanamsa of the requested sidereal mode at the requested time.
    pub ayanamsa: f64,
}

impl OracleReply {
    pub fn longitude_of(&self, identifier: i32) -> Option<f64> {
        self.bodies
            .iter()
            .find(|(id, _)| *id == identifier)
            .map(|(_, lon)| *lon)
    }
}

/// Source of raw tropical positions, house cusps and ayanamsa.
pub trait EphemerisOracle {
    fn resolve_bodies_and_houses(
        &self,
        request: &OracleRequest<'_>,
    ) -> Result<OracleReply, EphemerisError>;
}

impl<O: EphemerisOracle + ?Sized> EphemerisOracle for &O {
    fn resolve_bodies_and_houses(
        &self,
        request: &OracleRequest<'_>,
    ) -> Result<OracleReply, EphemerisError> {
        (**self).resolve_bodies_and_houses(request)
    }
}

impl<O: EphemerisOracle + ?Sized> EphemerisOracle for Box<O> {
    fn resolve_bodies_and_houses(
        &self,
        request: &OracleRequest<'_>,
    ) -> Result<OracleReply, EphemerisError> {
        (**self).resolve_bodies_and_houses(request)
    }
}

// ---------------------------
// ## Adapter
// ---------------------------

/// Raw oracle output for one chart, in roster order.
#[derive(Debug, Clone, PartialEq)]
pub struct TropicalPositions {
    pub ascendant: TropicalLongitude,
    pub bodies: Vec<(CelestialBody, TropicalLongitude)>,
    pub ayanamsa: f64,
}

impl TropicalPositions {
    pub fn longitude_of(&self, body: CelestialBody) -> Option<TropicalLongitude> {
        self.bodies
            .iter()
            .find(|(b, _)| *b == body)
            .map(|(_, lon)| *lon)
    }
}

pub struct EphemerisAdapter<O> {
    oracle: O,
    house_system: HouseSystem,
    flags: CalculationFlags,
}

impl<O: EphemerisOracle> EphemerisAdapter<O> {
    pub fn new(oracle: O, house_system: HouseSystem, flags: CalculationFlags) -> Self {
        EphemerisAdapter {
            oracle,
            house_system,
            flags,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Queries the ascendant cusp and all nine bodies for one instant.
    pub fn tropical_positions(
        &self,
        time: AstronomicalTime,
        location: GeoLocation,
    ) -> Result<TropicalPositions, EphemerisError> {
        if !location.is_valid() {
            return Err(EphemerisError::InvalidLocation {
                latitude: location.latitude,
                longitude: location.longitude,
            });
        }

        let identifiers: Vec<i32> = BODY_IDENTIFIERS.iter().map(|(_, id)| *id).collect();
        let request = OracleRequest {
            time,
            location,
            house_system: self.house_system,
            flags: self.flags,
            bodies: &identifiers,
        };
        debug!(
            "querying {} bodies at {} for {:.4}, {:.4} (house system {:?})",
            identifiers.len(),
            time,
            location.latitude,
            location.longitude,
            self.house_system.code()
        );
        let reply = self.oracle.resolve_bodies_and_houses(&request)?;
        let jd = time.julian_day();
        let ascendant = finite("ascendant", reply.ascendant, jd)?;
        let ayanamsa = finite("ayanamsa", reply.ayanamsa, jd)?;

        let mut bodies = Vec::with_capacity(CelestialBody::ALL.len());
        for (body, identifier) in BODY_IDENTIFIERS {
            let longitude = reply
                .longitude_of(identifier)
                .ok_or(EphemerisError::MissingBody { body })?;
            bodies.push((body, TropicalLongitude::new(finite(body, longitude, jd)?)));
        }
        let rahu = bodies
            .iter()
            .find(|(b, _)| *b == CelestialBody::Rahu)
            .map(|(_, lon)| lon.degrees())
            .ok_or(EphemerisError::MissingBody {
                body: CelestialBody::Rahu,
            })?;
        bodies.push((
            CelestialBody::Ketu,
            TropicalLongitude::new(normalize_degrees(rahu + 180.0)),
        ));

        Ok(TropicalPositions {
            ascendant: TropicalLongitude::new(ascendant),
            bodies,
            ayanamsa,
        })
    }
}

/// Passes `value` through unless the oracle produced NaN or an infinity.
fn finite(
    quantity: impl fmt::Display,
    value: f64,
    julian_day: f64,
) -> Result<f64, EphemerisError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EphemerisError::NonFinite {
            quantity: quantity.to_string(),
            value,
            julian_day,
        })
    }
}
