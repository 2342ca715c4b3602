//! Built-in low precision ephemeris.
//!
//! Positions come from osculating orbital elements referred to the mean
//! equinox of date, with the largest lunar and Jupiter/Saturn perturbations
//! added. Between 1800 and 2100 the planets are good to a few arcminutes and
//! the Moon to a few tenths of a degree, which is enough to place bodies in
//! signs and houses away from cusps. Build with the `swisseph` feature when
//! precision matters.
//!
//! The ascendant uses Greenwich mean sidereal time (Meeus 12.4) and the mean
//! obliquity; the mean node uses the Meeus polynomial; the Lahiri ayanamsa is
//! the J2000 reference value carried forward by IAU 2006 general precession.

use crate::ephemeris::{
    oracle_identifier, EphemerisOracle, OracleReply, OracleRequest, SiderealMode,
};
use crate::chart::normalize_degrees;
use crate::time::AstronomicalTime;
use crate::{CelestialBody, EphemerisError, GeoLocation};

/// 1000-01-01T00:00Z.
pub const MIN_JULIAN_DAY: f64 = 2_086_302.5;
/// 3000-01-01T00:00Z.
pub const MAX_JULIAN_DAY: f64 = 2_816_787.5;

/// Day count origin of the element series, 1999-12-31T00:00Z.
const ELEMENT_EPOCH_JD: f64 = 2_451_543.5;

const LAHIRI_J2000_DEG: f64 = 23.853;

#[derive(Debug, Clone, Copy)]
struct OrbitalElements {
    /// Longitude of the ascending node.
    node: f64,
    inclination: f64,
    /// Argument of perihelion.
    perihelion: f64,
    /// Semi-major axis, AU (Earth radii for the Moon).
    axis: f64,
    eccentricity: f64,
    mean_anomaly: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vector {
    x: f64,
    y: f64,
    z: f64,
}

impl Vector {
    fn longitude(&self) -> f64 {
        normalize_degrees(self.y.atan2(self.x).to_degrees())
    }

    fn latitude(&self) -> f64 {
        self.z.atan2(self.x.hypot(self.y)).to_degrees()
    }

    fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn from_spherical(longitude: f64, latitude: f64, distance: f64) -> Self {
        let (lon, lat) = (longitude.to_radians(), latitude.to_radians());
        Vector {
            x: distance * lon.cos() * lat.cos(),
            y: distance * lon.sin() * lat.cos(),
            z: distance * lat.sin(),
        }
    }

    fn add(&self, other: &Vector) -> Vector {
        Vector {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orbit {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
}

impl Orbit {
    /// Elements at `d` days after [`ELEMENT_EPOCH_JD`].
    fn elements(self, d: f64) -> OrbitalElements {
        let (node, inclination, perihelion, axis, eccentricity, mean_anomaly) = match self {
            Orbit::Sun => (
                0.0,
                0.0,
                282.9404 + 4.70935e-5 * d,
                1.0,
                0.016709 - 1.151e-9 * d,
                356.0470 + 0.9856002585 * d,
            ),
            Orbit::Moon => (
                125.1228 - 0.0529538083 * d,
                5.1454,
                318.0634 + 0.1643573223 * d,
                60.2666,
                0.054900,
                115.3654 + 13.0649929509 * d,
            ),
            Orbit::Mercury => (
                48.3313 + 3.24587e-5 * d,
                7.0047 + 5.00e-8 * d,
                29.1241 + 1.01444e-5 * d,
                0.387098,
                0.205635 + 5.59e-10 * d,
                168.6562 + 4.0923344368 * d,
            ),
            Orbit::Venus => (
                76.6799 + 2.46590e-5 * d,
                3.3946 + 2.75e-8 * d,
                54.8910 + 1.38374e-5 * d,
                0.723330,
                0.006773 - 1.302e-9 * d,
                48.0052 + 1.6021302244 * d,
            ),
            Orbit::Mars => (
                49.5574 + 2.11081e-5 * d,
                1.8497 - 1.78e-8 * d,
                286.5016 + 2.92961e-5 * d,
                1.523688,
                0.093405 + 2.516e-9 * d,
                18.6021 + 0.5240207766 * d,
            ),
            Orbit::Jupiter => (
                100.4542 + 2.76854e-5 * d,
                1.3030 - 1.557e-7 * d,
                273.8777 + 1.64505e-5 * d,
                5.20256,
                0.048498 + 4.469e-9 * d,
                19.8950 + 0.0830853001 * d,
            ),
            Orbit::Saturn => (
                113.6634 + 2.38980e-5 * d,
                2.4886 - 1.081e-7 * d,
                339.3939 + 2.97661e-5 * d,
                9.55475,
                0.055546 - 9.499e-9 * d,
                316.9670 + 0.0334442282 * d,
            ),
        };
        OrbitalElements {
            node,
            inclination,
            perihelion,
            axis,
            eccentricity,
            mean_anomaly,
        }
    }

    fn from_identifier(identifier: i32) -> Option<Self> {
        match identifier {
            0 => Some(Orbit::Sun),
            1 => Some(Orbit::Moon),
            2 => Some(Orbit::Mercury),
            3 => Some(Orbit::Venus),
            4 => Some(Orbit::Mars),
            5 => Some(Orbit::Jupiter),
            6 => Some(Orbit::Saturn),
            _ => None,
        }
    }
}

/// Solves Kepler's equation; mean anomaly in degrees, result in radians.
fn eccentric_anomaly(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let m = mean_anomaly.to_radians();
    let e = eccentricity;
    let mut ea = m + e * m.sin() * (1.0 + e * m.cos());
    for _ in 0..30 {
        let delta = (ea - e * ea.sin() - m) / (1.0 - e * ea.cos());
        ea -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    ea
}

/// Position in the ecliptic frame of date, centred on the orbit's focus.
fn orbital_position(el: &OrbitalElements) -> Vector {
    let ea = eccentric_anomaly(el.mean_anomaly, el.eccentricity);
    let xv = el.axis * (ea.cos() - el.eccentricity);
    let yv = el.axis * (1.0 - el.eccentricity * el.eccentricity).sqrt() * ea.sin();
    let true_anomaly = yv.atan2(xv);
    let r = xv.hypot(yv);

    let node = el.node.to_radians();
    let incl = el.inclination.to_radians();
    let u = true_anomaly + el.perihelion.to_radians();
    Vector {
        x: r * (node.cos() * u.cos() - node.sin() * u.sin() * incl.cos()),
        y: r * (node.sin() * u.cos() + node.cos() * u.sin() * incl.cos()),
        z: r * u.sin() * incl.sin(),
    }
}

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn cos_deg(x: f64) -> f64 {
    x.to_radians().cos()
}

/// Largest periodic terms of the lunar longitude, degrees.
fn moon_perturbation(d: f64) -> f64 {
    let sun = Orbit::Sun.elements(d);
    let moon = Orbit::Moon.elements(d);
    let ms = sun.mean_anomaly;
    let mm = moon.mean_anomaly;
    let sun_mean_longitude = ms + sun.perihelion;
    let moon_mean_longitude = mm + moon.perihelion + moon.node;
    let elongation = moon_mean_longitude - sun_mean_longitude;
    let latitude_argument = moon_mean_longitude - moon.node;

    -1.274 * sin_deg(mm - 2.0 * elongation) // evection
        + 0.658 * sin_deg(2.0 * elongation) // variation
        - 0.186 * sin_deg(ms) // yearly equation
        - 0.059 * sin_deg(2.0 * mm - 2.0 * elongation)
        - 0.057 * sin_deg(mm - 2.0 * elongation + ms)
        + 0.053 * sin_deg(mm + 2.0 * elongation)
        + 0.046 * sin_deg(2.0 * elongation - ms)
        + 0.041 * sin_deg(mm - ms)
        - 0.035 * sin_deg(elongation)
        - 0.031 * sin_deg(mm + ms)
        - 0.015 * sin_deg(2.0 * latitude_argument - 2.0 * elongation)
        + 0.011 * sin_deg(mm - 4.0 * elongation)
}

/// Mutual Jupiter/Saturn terms in heliocentric longitude, degrees.
fn great_inequality(orbit: Orbit, d: f64) -> f64 {
    let mj = Orbit::Jupiter.elements(d).mean_anomaly;
    let ms = Orbit::Saturn.elements(d).mean_anomaly;
    match orbit {
        Orbit::Jupiter => {
            -0.332 * sin_deg(2.0 * mj - 5.0 * ms - 67.6)
                - 0.056 * sin_deg(2.0 * mj - 2.0 * ms + 21.0)
                + 0.042 * sin_deg(3.0 * mj - 5.0 * ms + 21.0)
                - 0.036 * sin_deg(mj - 2.0 * ms)
                + 0.022 * cos_deg(mj - ms)
                + 0.023 * sin_deg(2.0 * mj - 3.0 * ms + 52.0)
                - 0.016 * sin_deg(mj - 5.0 * ms - 69.0)
        }
        Orbit::Saturn => {
            0.812 * sin_deg(2.0 * mj - 5.0 * ms - 67.6)
                - 0.229 * cos_deg(2.0 * mj - 4.0 * ms - 2.0)
                + 0.119 * sin_deg(mj - 2.0 * ms - 3.0)
                + 0.046 * sin_deg(2.0 * mj - 6.0 * ms - 69.0)
                + 0.014 * sin_deg(mj - 3.0 * ms + 32.0)
        }
        _ => 0.0,
    }
}

/// Geocentric tropical longitude of `orbit`, degrees in `[0, 360)`.
fn geocentric_longitude(orbit: Orbit, d: f64) -> f64 {
    let sun = orbital_position(&Orbit::Sun.elements(d));
    match orbit {
        Orbit::Sun => sun.longitude(),
        Orbit::Moon => {
            let moon = orbital_position(&Orbit::Moon.elements(d));
            normalize_degrees(moon.longitude() + moon_perturbation(d))
        }
        planet => {
            let mut heliocentric = orbital_position(&planet.elements(d));
            let correction = great_inequality(planet, d);
            if correction != 0.0 {
                heliocentric = Vector::from_spherical(
                    heliocentric.longitude() + correction,
                    heliocentric.latitude(),
                    heliocentric.length(),
                );
            }
            heliocentric.add(&sun).longitude()
        }
    }
}

/// Mean longitude of the Moon's ascending node, degrees.
pub fn mean_node_longitude(time: AstronomicalTime) -> f64 {
    let t = time.centuries_since_j2000();
    normalize_degrees(
        125.04452 - 1934.136261 * t + 0.0020708 * t * t + t * t * t / 450_000.0,
    )
}

/// Mean obliquity of the ecliptic, degrees.
pub fn mean_obliquity(time: AstronomicalTime) -> f64 {
    let t = time.centuries_since_j2000();
    23.439_291_111 - 0.013_004_167 * t - 1.639e-7 * t * t + 5.036e-7 * t * t * t
}

/// Greenwich mean sidereal time, degrees in `[0, 360)`.
pub fn greenwich_sidereal_time(time: AstronomicalTime) -> f64 {
    let t = time.centuries_since_j2000();
    normalize_degrees(
        280.460_618_37 + 360.985_647_366_29 * (time.julian_day() - 2_451_545.0)
            + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Tropical longitude of the ecliptic point rising in the east.
pub fn ascendant_longitude(
    time: AstronomicalTime,
    location: GeoLocation,
) -> Result<f64, EphemerisError> {
    if location.latitude.abs() >= 90.0 {
        return Err(EphemerisError::Calculation {
            code: -1,
            julian_day: time.julian_day(),
            message: format!(
                "ascendant is undefined at latitude {}",
                location.latitude
            ),
        });
    }
    let lst = (greenwich_sidereal_time(time) + location.longitude).to_radians();
    let eps = mean_obliquity(time).to_radians();
    let phi = location.latitude.to_radians();
    let asc = lst
        .cos()
        .atan2(-(lst.sin() * eps.cos() + phi.tan() * eps.sin()));
    Ok(normalize_degrees(asc.to_degrees()))
}

/// Ayanamsa of `mode` at `time`, degrees.
pub fn ayanamsa(mode: SiderealMode, time: AstronomicalTime) -> f64 {
    let t = time.centuries_since_j2000();
    let precession_arcsec = 5028.796195 * t + 1.1054348 * t * t + 0.00007964 * t * t * t;
    match mode {
        SiderealMode::Lahiri => LAHIRI_J2000_DEG + precession_arcsec / 3600.0,
    }
}

/// Pure Rust oracle. Stateless, so it can be shared freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticEphemeris;

impl AnalyticEphemeris {
    pub fn new() -> Self {
        AnalyticEphemeris
    }

    /// Geocentric tropical longitude for one oracle identifier.
    pub fn body_longitude(
        &self,
        identifier: i32,
        time: AstronomicalTime,
    ) -> Result<f64, EphemerisError> {
        check_range(time)?;
        if Some(identifier) == oracle_identifier(CelestialBody::Rahu) {
            return Ok(mean_node_longitude(time));
        }
        let orbit = Orbit::from_identifier(identifier).ok_or_else(|| {
            EphemerisError::Calculation {
                code: -1,
                julian_day: time.julian_day(),
                message: format!("illegal planet number {identifier}"),
            }
        })?;
        Ok(geocentric_longitude(
            orbit,
            time.julian_day() - ELEMENT_EPOCH_JD,
        ))
    }
}

fn check_range(time: AstronomicalTime) -> Result<(), EphemerisError> {
    let jd = time.julian_day();
    if (MIN_JULIAN_DAY..=MAX_JULIAN_DAY).contains(&jd) {
        Ok(())
    } else {
        Err(EphemerisError::OutOfRange {
            julian_day: jd,
            min: MIN_JULIAN_DAY,
            max: MAX_JULIAN_DAY,
        })
    }
}

impl EphemerisOracle for AnalyticEphemeris {
    fn resolve_bodies_and_houses(
        &self,
        request: &OracleRequest<'_>,
    ) -> Result<OracleReply, EphemerisError> {
        check_range(request.time)?;
        // every supported house system is equal division, so only the
        // ascendant is needed
        let ascendant = ascendant_longitude(request.time, request.location)?;
        let bodies = request
            .bodies
            .iter()
            .map(|id| Ok((*id, self.body_longitude(*id, request.time)?)))
            .collect::<Result<Vec<_>, EphemerisError>>()?;
        Ok(OracleReply {
            ascendant,
            bodies,
            ayanamsa: ayanamsa(request.flags.sidereal_mode, request.time),
        })
    }
}
