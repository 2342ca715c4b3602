//! The three stages composed into one call.

use log::debug;

use crate::analytic::AnalyticEphemeris;
use crate::chart::{build_chart, ChartResult};
use crate::ephemeris::{EphemerisAdapter, EphemerisOracle};
use crate::settings::{AyanamsaSource, ChartSettings};
use crate::time::BirthMoment;
use crate::{ChartError, ConfigurationError, GeoLocation};

/// Time resolver, ephemeris adapter and chart builder wired together.
pub struct ChartCalculator<O> {
    adapter: EphemerisAdapter<O>,
    settings: ChartSettings,
}

impl<O: EphemerisOracle> ChartCalculator<O> {
    pub fn new(oracle: O, settings: ChartSettings) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        let adapter = EphemerisAdapter::new(
            oracle,
            settings.house_system()?,
            settings.calculation_flags()?,
        );
        Ok(ChartCalculator { adapter, settings })
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    pub fn oracle(&self) -> &O {
        self.adapter.oracle()
    }

    pub fn compute(
        &self,
        moment: &BirthMoment,
        location: GeoLocation,
    ) -> Result<ChartResult, ChartError> {
        let time = moment.astronomical_time()?;
        let positions = self.adapter.tropical_positions(time, location)?;

        let ayanamsa = self.settings.ayanamsa.resolve(positions.ayanamsa);
        match self.settings.ayanamsa {
            AyanamsaSource::Oracle => debug!("oracle ayanamsa {ayanamsa:.6}"),
            AyanamsaSource::Fixed { .. } => debug!(
                "fixed ayanamsa {ayanamsa:.6} (oracle reported {:.6})",
                positions.ayanamsa
            ),
        }

        Ok(build_chart(&positions, ayanamsa, time))
    }

    pub fn compute_from_strings(
        &self,
        date: &str,
        time: &str,
        timezone: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<ChartResult, ChartError> {
        let moment = BirthMoment::parse(date, time, timezone)?;
        self.compute(&moment, GeoLocation::new(latitude, longitude))
    }
}

/// One-shot chart with the built-in ephemeris and default settings.
pub fn calculate_chart(
    date: &str,
    time: &str,
    timezone: &str,
    latitude: f64,
    longitude: f64,
) -> Result<ChartResult, ChartError> {
    ChartCalculator::new(AnalyticEphemeris::new(), ChartSettings::default())?
        .compute_from_strings(date, time, timezone, latitude, longitude)
}
