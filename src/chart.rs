//! Tropical positions to a sidereal chart with equal houses.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::ephemeris::TropicalPositions;
use crate::time::AstronomicalTime;
use crate::{CelestialBody, House, ZodiacSign};

/// `degrees mod 360`, in `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Raw ecliptic longitude from the oracle, not normalized.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TropicalLongitude(f64);

impl TropicalLongitude {
    pub fn new(degrees: f64) -> Self {
        TropicalLongitude(degrees)
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    pub fn to_sidereal(self, ayanamsa: f64) -> SiderealLongitude {
        SiderealLongitude::from_tropical(self, ayanamsa)
    }
}

/// Longitude in the fixed-star zodiac, always in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SiderealLongitude(f64);

impl SiderealLongitude {
    pub fn new(degrees: f64) -> Self {
        SiderealLongitude(normalize_degrees(degrees))
    }

    pub fn from_tropical(tropical: TropicalLongitude, ayanamsa: f64) -> Self {
        SiderealLongitude::new(tropical.degrees() - ayanamsa)
    }

    /// Normalized tropical longitude this value was derived from.
    pub fn to_tropical(self, ayanamsa: f64) -> TropicalLongitude {
        TropicalLongitude::new(normalize_degrees(self.0 + ayanamsa))
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    pub fn sign(self) -> ZodiacSign {
        ZodiacSign::from_sidereal(self)
    }

    /// Position within the occupied sign, `[0, 30)`. Display only.
    pub fn degree_in_sign(self) -> f64 {
        self.0 % 30.0
    }

    /// Degrees ahead of `origin` along the ecliptic, `[0, 360)`.
    pub fn offset_from(self, origin: SiderealLongitude) -> f64 {
        normalize_degrees(self.0 - origin.0)
    }
}

impl Serialize for SiderealLongitude {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

/// Equal house of `body`: house 1 is the half-open arc `[asc, asc + 30)`.
pub fn house_of(body: SiderealLongitude, ascendant: SiderealLongitude) -> House {
    let index = (body.offset_from(ascendant) / 30.0).floor() as usize + 1;
    // offset_from is below 360, so the index stays within 1..=12
    House::from_index(index).unwrap_or(House::Twelfth)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub body: CelestialBody,
    pub longitude: SiderealLongitude,
    pub sign: ZodiacSign,
    pub house: House,
}

/// A complete chart. Only ever built fully populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartResult {
    pub julian_day: AstronomicalTime,
    pub ayanamsa: f64,
    pub ascendant_sign: ZodiacSign,
    pub ascendant: SiderealLongitude,
    pub placements: Vec<Placement>,
}

impl ChartResult {
    pub fn placement(&self, body: CelestialBody) -> Option<&Placement> {
        self.placements.iter().find(|p| p.body == body)
    }
}

impl fmt::Display for ChartResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Ascendant: {} ({:.2}°)",
            self.ascendant_sign,
            self.ascendant.degree_in_sign()
        )?;
        for placement in &self.placements {
            writeln!(
                f,
                "{}: {:.2}° (House {})",
                placement.body,
                placement.longitude.degree_in_sign(),
                placement.house.number()
            )?;
        }
        Ok(())
    }
}

/// Applies `ayanamsa` to every tropical position and assigns equal houses.
pub fn build_chart(
    positions: &TropicalPositions,
    ayanamsa: f64,
    julian_day: AstronomicalTime,
) -> ChartResult {
    let ascendant = positions.ascendant.to_sidereal(ayanamsa);
    let placements = positions
        .bodies
        .iter()
        .map(|(body, tropical)| {
            let longitude = tropical.to_sidereal(ayanamsa);
            Placement {
                body: *body,
                longitude,
                sign: longitude.sign(),
                house: house_of(longitude, ascendant),
            }
        })
        .collect();

    ChartResult {
        julian_day,
        ayanamsa,
        ascendant_sign: ascendant.sign(),
        ascendant,
        placements,
    }
}
