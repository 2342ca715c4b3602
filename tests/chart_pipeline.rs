use std::cell::RefCell;

use approx::assert_abs_diff_eq;
use sidereal_chart::{
    calculate_chart, normalize_degrees, AnalyticEphemeris, BirthMoment, CelestialBody,
    ChartCalculator, ChartError, ChartSettings, EphemerisError, EphemerisOracle, GeoLocation,
    House, OracleReply, OracleRequest, ParseError, ZodiacSign,
};

const LATITUDE: f64 = 29.4739;
const LONGITUDE: f64 = 77.7041;

/// Replays a fixed reply and remembers the Julian Days it was asked about.
struct ScriptedOracle {
    ascendant: f64,
    longitudes: Vec<(i32, f64)>,
    ayanamsa: f64,
    seen: RefCell<Vec<f64>>,
}

impl ScriptedOracle {
    fn new() -> Self {
        ScriptedOracle {
            ascendant: 73.0,
            longitudes: vec![
                (0, 359.87),
                (1, 9.59),
                (2, 352.12),
                (3, 45.37),
                (4, 356.55),
                (5, 284.60),
                (6, 357.77),
                (10, 198.24),
            ],
            ayanamsa: 23.8,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl EphemerisOracle for ScriptedOracle {
    fn resolve_bodies_and_houses(
        &self,
        request: &OracleRequest<'_>,
    ) -> Result<OracleReply, EphemerisError> {
        self.seen.borrow_mut().push(request.time.julian_day());
        Ok(OracleReply {
            ascendant: self.ascendant,
            bodies: self
                .longitudes
                .iter()
                .filter(|(id, _)| request.bodies.contains(id))
                .copied()
                .collect(),
            ayanamsa: self.ayanamsa,
        })
    }
}

struct BrokenOracle;

impl EphemerisOracle for BrokenOracle {
    fn resolve_bodies_and_houses(
        &self,
        request: &OracleRequest<'_>,
    ) -> Result<OracleReply, EphemerisError> {
        Err(EphemerisError::Calculation {
            code: -1,
            julian_day: request.time.julian_day(),
            message: "SwissEph file 'sepl_18.se1' not found".to_string(),
        })
    }
}

fn kolkata(
    calc: &ChartCalculator<impl EphemerisOracle>,
) -> Result<sidereal_chart::ChartResult, ChartError> {
    calc.compute_from_strings("1996-03-20", "10:20", "Asia/Kolkata", LATITUDE, LONGITUDE)
}

#[test]
fn scripted_chart_end_to_end() {
    let calc = ChartCalculator::new(ScriptedOracle::new(), ChartSettings::default()).unwrap();
    let chart = kolkata(&calc).unwrap();

    assert_eq!(calc.oracle().seen.borrow().len(), 1);
    assert_abs_diff_eq!(calc.oracle().seen.borrow()[0], 2_450_162.70139, epsilon = 1e-5);

    // 73.0 - 23.8 = 49.2
    assert_eq!(chart.ascendant_sign, ZodiacSign::Taurus);
    assert_abs_diff_eq!(chart.ascendant.degrees(), 49.2, epsilon = 1e-9);

    let expected = [
        (CelestialBody::Sun, ZodiacSign::Pisces, House::Tenth),
        (CelestialBody::Moon, ZodiacSign::Pisces, House::Tenth),
        (CelestialBody::Mercury, ZodiacSign::Aquarius, House::Tenth),
        (CelestialBody::Venus, ZodiacSign::Aries, House::Twelfth),
        (CelestialBody::Mars, ZodiacSign::Pisces, House::Tenth),
        (CelestialBody::Jupiter, ZodiacSign::Sagittarius, House::Eighth),
        (CelestialBody::Saturn, ZodiacSign::Pisces, House::Tenth),
        (CelestialBody::Rahu, ZodiacSign::Virgo, House::Fifth),
        (CelestialBody::Ketu, ZodiacSign::Pisces, House::Eleventh),
    ];
    let got: Vec<_> = chart
        .placements
        .iter()
        .map(|p| (p.body, p.sign, p.house))
        .collect();
    assert_eq!(got, expected);
}

#[test]
fn ketu_opposes_rahu_in_the_sidereal_frame() {
    let calc = ChartCalculator::new(ScriptedOracle::new(), ChartSettings::default()).unwrap();
    let chart = kolkata(&calc).unwrap();
    let rahu = chart.placement(CelestialBody::Rahu).unwrap().longitude.degrees();
    let ketu = chart.placement(CelestialBody::Ketu).unwrap().longitude.degrees();
    assert_abs_diff_eq!(ketu, normalize_degrees(rahu + 180.0), epsilon = 1e-9);
}

#[test]
fn houses_do_not_depend_on_the_ayanamsa() {
    let oracle_chart =
        kolkata(&ChartCalculator::new(ScriptedOracle::new(), ChartSettings::default()).unwrap())
            .unwrap();
    let fixed_chart = kolkata(
        &ChartCalculator::new(
            ScriptedOracle::new(),
            ChartSettings::default().with_fixed_ayanamsa(24.0),
        )
        .unwrap(),
    )
    .unwrap();

    assert_abs_diff_eq!(fixed_chart.ayanamsa, 24.0);
    assert_abs_diff_eq!(
        oracle_chart.ascendant.degrees() - fixed_chart.ascendant.degrees(),
        0.2,
        epsilon = 1e-9
    );
    for (a, b) in oracle_chart.placements.iter().zip(&fixed_chart.placements) {
        assert_eq!(a.house, b.house, "{}", a.body);
    }
}

#[test]
fn oracle_failure_surfaces_unchanged() {
    let calc = ChartCalculator::new(BrokenOracle, ChartSettings::default()).unwrap();
    match kolkata(&calc) {
        Err(ChartError::Ephemeris(EphemerisError::Calculation { code, message, .. })) => {
            assert_eq!(code, -1);
            assert_eq!(message, "SwissEph file 'sepl_18.se1' not found");
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn slashed_date_is_a_parse_error() {
    let err = calculate_chart("1996/03/20", "10:20", "Asia/Kolkata", LATITUDE, LONGITUDE)
        .unwrap_err();
    assert!(matches!(err, ChartError::Parse(ParseError::InvalidDate { .. })));
}

#[test]
fn impossible_location_is_rejected() {
    let err = calculate_chart("1996-03-20", "10:20", "Asia/Kolkata", 95.0, LONGITUDE).unwrap_err();
    assert!(matches!(
        err,
        ChartError::Ephemeris(EphemerisError::InvalidLocation { .. })
    ));
}

#[test]
fn builtin_ephemeris_scenario_is_reproducible() {
    let first = calculate_chart("1996-03-20", "10:20", "Asia/Kolkata", LATITUDE, LONGITUDE).unwrap();
    let second = calculate_chart("1996-03-20", "10:20", "Asia/Kolkata", LATITUDE, LONGITUDE).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());

    assert_abs_diff_eq!(first.julian_day.julian_day(), 2_450_162.70139, epsilon = 1e-5);
    assert_eq!(first.ascendant_sign, ZodiacSign::Taurus);
    assert_eq!(first.placements.len(), 9);
    for placement in &first.placements {
        assert!((1..=12).contains(&placement.house.number()));
        assert!(placement.sign.index() <= 11);
        assert!((0.0..360.0).contains(&placement.longitude.degrees()));
    }

    let house = |body| first.placement(body).unwrap().house;
    assert_eq!(house(CelestialBody::Sun), House::Tenth);
    assert_eq!(house(CelestialBody::Jupiter), House::Eighth);
    assert_eq!(house(CelestialBody::Rahu), House::Fifth);
    assert_eq!(house(CelestialBody::Ketu), House::Eleventh);
}

#[test]
fn same_instant_from_another_zone_gives_same_chart() {
    let calc = ChartCalculator::new(AnalyticEphemeris::new(), ChartSettings::default()).unwrap();
    let location = GeoLocation::new(LATITUDE, LONGITUDE);
    let kolkata = BirthMoment::parse("1996-03-20", "10:20", "Asia/Kolkata").unwrap();
    let utc = BirthMoment::parse("1996-03-20", "04:50", "Etc/UTC").unwrap();
    assert_eq!(
        calc.compute(&kolkata, location).unwrap(),
        calc.compute(&utc, location).unwrap()
    );
}

#[test]
fn settings_file_drives_the_calculator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"house_system": "E", "ayanamsa": {"source": "fixed", "degrees": 23.0}}"#,
    )
    .unwrap();
    let settings = ChartSettings::from_json_file(&path).unwrap();
    let calc = ChartCalculator::new(ScriptedOracle::new(), settings).unwrap();
    let chart = kolkata(&calc).unwrap();
    assert_abs_diff_eq!(chart.ayanamsa, 23.0);
    assert_abs_diff_eq!(chart.ascendant.degrees(), 50.0, epsilon = 1e-9);
}
