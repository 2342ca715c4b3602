//! Oracle backed by the Swiss Ephemeris C library (`libswe`).
//!
//! Built only with the `swisseph` feature. The library keeps its ephemeris
//! path and sidereal mode in process globals, so the path is set once and
//! every query holds [`SWE_LOCK`].

use log::{debug, info, warn};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_int};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::ephemeris::{EphemerisOracle, OracleReply, OracleRequest};
use crate::{ConfigurationError, EphemerisError};

mod bindings {
    use super::*;

    extern "C" {
        pub fn swe_set_ephe_path(path: *const c_char);
        pub fn swe_set_sid_mode(sid_mode: c_int, t0: c_double, ayan_t0: c_double);
        pub fn swe_calc_ut(
            tjd_ut: c_double,
            ipl: c_int,
            iflag: c_int,
            xx: *mut c_double,
            serr: *mut c_char,
        ) -> c_int;
        pub fn swe_houses_ex(
            tjd_ut: c_double,
            iflag: c_int,
            geolat: c_double,
            geolon: c_double,
            hsys: c_int,
            cusps: *mut c_double,
            ascmc: *mut c_double,
        ) -> c_int;
        pub fn swe_get_ayanamsa_ut(tjd_ut: c_double) -> c_double;
    }
}

use bindings::*;

const SE_ASCMC_ASC: usize = 0;
const SE_ERR: c_int = -1;

/// Path handed to `swe_set_ephe_path`, fixed by the first `SwissEph::new`.
static EPHE_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();
static SWE_LOCK: Mutex<()> = Mutex::new(());

/// Handle to the process-wide Swiss Ephemeris state.
#[derive(Debug, Clone, Copy)]
pub struct SwissEph {
    _private: (),
}

impl SwissEph {
    /// Points the library at `ephemeris_path` on first use. Without a path
    /// the library looks in its compiled-in default directory and falls back
    /// to the Moshier theory when no data files are found.
    pub fn new(ephemeris_path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let c_path = ephemeris_path.map(to_c_path).transpose()?;

        let active = EPHE_PATH.get_or_init(|| {
            let _guard = lock();
            let ptr = c_path.as_ref().map_or(std::ptr::null(), |p| p.as_ptr());
            unsafe {
                swe_set_ephe_path(ptr);
            }
            match ephemeris_path {
                Some(path) => info!("Ephemeris file path set to: {}", path.display()),
                None => info!("Ephemeris file path left at the library default"),
            }
            ephemeris_path.map(Path::to_path_buf)
        });
        if active.as_deref() != ephemeris_path {
            warn!(
                "ignoring ephemeris path {:?}: already set to {:?} for this process",
                ephemeris_path, active
            );
        }

        Ok(SwissEph { _private: () })
    }
}

fn to_c_path(path: &Path) -> Result<CString, ConfigurationError> {
    CString::new(path.to_string_lossy().as_bytes()).map_err(|_| {
        ConfigurationError::InvalidEphemerisPath {
            path: path.display().to_string(),
        }
    })
}

fn lock() -> std::sync::MutexGuard<'static, ()> {
    // the guarded state lives in C; a panic elsewhere cannot corrupt it
    SWE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn error_message(serr: &[c_char; 256]) -> String {
    unsafe { CStr::from_ptr(serr.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

impl EphemerisOracle for SwissEph {
    fn resolve_bodies_and_houses(
        &self,
        request: &OracleRequest<'_>,
    ) -> Result<OracleReply, EphemerisError> {
        let julian_day = request.time.julian_day();
        let iflag = request.flags.source.flag();
        let _guard = lock();

        unsafe {
            swe_set_sid_mode(request.flags.sidereal_mode.code(), 0.0, 0.0);
        }

        let mut cusps: [c_double; 13] = [0.0; 13];
        let mut ascmc: [c_double; 10] = [0.0; 10];
        let houses_result = unsafe {
            swe_houses_ex(
                julian_day,
                iflag,
                request.location.latitude,
                request.location.longitude,
                request.house_system.code() as c_int,
                cusps.as_mut_ptr(),
                ascmc.as_mut_ptr(),
            )
        };
        if houses_result == SE_ERR {
            return Err(EphemerisError::Calculation {
                code: houses_result,
                julian_day,
                message: "Error calculating houses".to_string(),
            });
        }

        let mut bodies = Vec::with_capacity(request.bodies.len());
        for &identifier in request.bodies {
            let mut results: [c_double; 6] = [0.0; 6];
            let mut serr: [c_char; 256] = [0; 256];
            let calc_result = unsafe {
                swe_calc_ut(
                    julian_day,
                    identifier,
                    iflag,
                    results.as_mut_ptr(),
                    serr.as_mut_ptr(),
                )
            };
            if calc_result < 0 {
                return Err(EphemerisError::Calculation {
                    code: calc_result,
                    julian_day,
                    message: error_message(&serr),
                });
            }
            if (calc_result & iflag) == 0 {
                debug!(
                    "body {identifier} computed with fallback flags {calc_result:#x}: {}",
                    error_message(&serr)
                );
            }
            bodies.push((identifier, results[0]));
        }

        let ayanamsa = unsafe { swe_get_ayanamsa_ut(julian_day) };

        Ok(OracleReply {
            ascendant: ascmc[SE_ASCMC_ASC],
            bodies,
            ayanamsa,
        })
    }
}
