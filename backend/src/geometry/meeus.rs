//! Low-precision analytic ephemeris after Meeus, "Astronomical Algorithms".
//!
//! - Sun: Ch. 25 low-accuracy series (~0.01°).
//! - Moon: Ch. 47 with the leading periodic terms of Tables 47.A/47.B
//!   (a few arcminutes), plus topocentric parallax (Ch. 40).
//! - Fixed targets: ICRS to observed through SOFA `atco13` (precession,
//!   nutation, aberration and Earth rotation).
//! - Sidereal time: SOFA `gst06a` (IAU 2006/2000A).
//!
//! Altitudes are geometric: no atmospheric refraction is applied. UTC is used
//! as UT1. The sun and moon series take TT = UTC + ΔT with a constant ΔT;
//! `atco13` derives TT from its own leap-second table.

use chrono::Datelike;
use sofars::astro::atco13;
use sofars::erst::gst06a;

use super::{normalize_degrees, AltAz, EquatorialCoord, GeometryProvider};
use crate::error::{GeometryError, GeometryResult};
use crate::models::{Instant, Site};

const J2000_JD: f64 = 2_451_545.0;
const MJD_ZERO: f64 = 2_400_000.5;
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// TT - UT1 near the 2020s.
pub const DEFAULT_DELTA_T_SECONDS: f64 = 69.2;

const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6_378.14;
const EARTH_FLATTENING_RATIO: f64 = 0.996_647_19;

/// Effective wavelength handed to `atco13`, micrometres. Unused without refraction.
const WAVELENGTH_UM: f64 = 0.55;

const MIN_YEAR: i32 = 1800;
const MAX_YEAR: i32 = 2200;

// Periodic terms for lunar longitude and distance (Table 47.A).
// (D, M, M', F, Σl coefficient [1e-6 deg], Σr coefficient [1e-3 km])
const TERMS_LR: [(f64, f64, f64, f64, f64, f64); 30] = [
    (0.0, 0.0, 1.0, 0.0, 6_288_774.0, -20_905_355.0),
    (2.0, 0.0, -1.0, 0.0, 1_274_027.0, -3_699_111.0),
    (2.0, 0.0, 0.0, 0.0, 658_314.0, -2_955_968.0),
    (0.0, 0.0, 2.0, 0.0, 213_618.0, -569_925.0),
    (0.0, 1.0, 0.0, 0.0, -185_116.0, 48_888.0),
    (0.0, 0.0, 0.0, 2.0, -114_332.0, -3_149.0),
    (2.0, 0.0, -2.0, 0.0, 58_793.0, 246_158.0),
    (2.0, -1.0, -1.0, 0.0, 57_066.0, -152_138.0),
    (2.0, 0.0, 1.0, 0.0, 53_322.0, -170_733.0),
    (2.0, -1.0, 0.0, 0.0, 45_758.0, -204_586.0),
    (0.0, 1.0, -1.0, 0.0, -40_923.0, -129_620.0),
    (1.0, 0.0, 0.0, 0.0, -34_720.0, 108_743.0),
    (0.0, 1.0, 1.0, 0.0, -30_383.0, 104_755.0),
    (2.0, 0.0, 0.0, -2.0, 15_327.0, 10_321.0),
    (0.0, 0.0, 1.0, 2.0, -12_528.0, 0.0),
    (0.0, 0.0, 1.0, -2.0, 10_980.0, 79_661.0),
    (4.0, 0.0, -1.0, 0.0, 10_675.0, -34_782.0),
    (0.0, 0.0, 3.0, 0.0, 10_034.0, -23_210.0),
    (4.0, 0.0, -2.0, 0.0, 8_548.0, -21_636.0),
    (2.0, 1.0, -1.0, 0.0, -7_888.0, 24_208.0),
    (2.0, 1.0, 0.0, 0.0, -6_766.0, 30_824.0),
    (1.0, 0.0, -1.0, 0.0, -5_163.0, -8_379.0),
    (1.0, 1.0, 0.0, 0.0, 4_987.0, -16_675.0),
    (2.0, -1.0, 1.0, 0.0, 4_036.0, -12_831.0),
    (2.0, 0.0, 2.0, 0.0, 3_994.0, -10_445.0),
    (4.0, 0.0, 0.0, 0.0, 3_861.0, -11_650.0),
    (2.0, 0.0, -3.0, 0.0, 3_665.0, 14_403.0),
    (0.0, 1.0, -2.0, 0.0, -2_689.0, -7_003.0),
    (2.0, 0.0, -1.0, 2.0, -2_602.0, 0.0),
    (2.0, -1.0, -2.0, 0.0, 2_390.0, 10_056.0),
];

// Periodic terms for lunar latitude (Table 47.B).
// (D, M, M', F, Σb coefficient [1e-6 deg])
const TERMS_B: [(f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 0.0, 1.0, 5_128_122.0),
    (0.0, 0.0, 1.0, 1.0, 280_602.0),
    (0.0, 0.0, 1.0, -1.0, 277_693.0),
    (2.0, 0.0, 0.0, -1.0, 173_237.0),
    (2.0, 0.0, -1.0, 1.0, 55_413.0),
    (2.0, 0.0, -1.0, -1.0, 46_271.0),
    (2.0, 0.0, 0.0, 1.0, 32_573.0),
    (0.0, 0.0, 2.0, 1.0, 17_198.0),
    (2.0, 0.0, 1.0, -1.0, 9_266.0),
    (0.0, 0.0, 2.0, -1.0, 8_822.0),
    (2.0, -1.0, 0.0, -1.0, 8_216.0),
    (2.0, 0.0, -2.0, -1.0, 4_324.0),
    (2.0, 0.0, 1.0, 1.0, 4_200.0),
    (2.0, 1.0, 0.0, -1.0, -3_359.0),
    (2.0, -1.0, -1.0, 1.0, 2_463.0),
    (2.0, -1.0, 0.0, 1.0, 2_211.0),
    (2.0, -1.0, -1.0, -1.0, 2_065.0),
    (0.0, 1.0, -1.0, -1.0, -1_870.0),
    (4.0, 0.0, -1.0, -1.0, 1_828.0),
    (0.0, 1.0, 0.0, 1.0, -1_794.0),
];

/// Analytic sun/moon ephemeris and fixed-target transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeeusGeometry {
    delta_t_seconds: f64,
}

impl Default for MeeusGeometry {
    fn default() -> Self {
        Self {
            delta_t_seconds: DEFAULT_DELTA_T_SECONDS,
        }
    }
}

/// Time arguments shared by every quantity computed for one instant.
#[derive(Debug, Clone, Copy)]
struct Epoch {
    /// Modified Julian Date, UTC.
    mjd_utc: f64,
    /// Modified Julian Date, TT.
    mjd_tt: f64,
    /// Julian centuries of TT since J2000.0.
    t: f64,
}

impl MeeusGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific TT - UT offset (seconds). Zero makes input instants TT.
    pub fn with_delta_t(delta_t_seconds: f64) -> Self {
        Self { delta_t_seconds }
    }

    fn epoch(&self, instant: Instant) -> GeometryResult<Epoch> {
        let year = instant.datetime().year();
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(GeometryError::OutOfRange {
                instant: instant.isoformat(),
                min_year: MIN_YEAR,
                max_year: MAX_YEAR,
            });
        }
        let mjd_utc = instant.modified_julian_date();
        let mjd_tt = mjd_utc + self.delta_t_seconds / 86_400.0;
        Ok(Epoch {
            mjd_utc,
            mjd_tt,
            t: (mjd_tt + MJD_ZERO - J2000_JD) / DAYS_PER_CENTURY,
        })
    }

    fn local_apparent_sidereal_deg(epoch: &Epoch, site: &Site) -> f64 {
        normalize_degrees(apparent_sidereal_time_deg(epoch) + site.longitude_deg())
    }
}

impl GeometryProvider for MeeusGeometry {
    fn sun_altaz(&self, instant: Instant, site: &Site) -> GeometryResult<AltAz> {
        let epoch = self.epoch(instant)?;
        let (ra, dec) = sun_apparent_radec(epoch.t);
        let ha = Self::local_apparent_sidereal_deg(&epoch, site) - ra;
        checked(horizontal(ha, dec, site.latitude_deg()), "sun altitude", instant)
    }

    fn moon_altaz(&self, instant: Instant, site: &Site) -> GeometryResult<AltAz> {
        let epoch = self.epoch(instant)?;
        let (ra, dec, distance_km) = moon_apparent_radec(epoch.t);
        let ha = Self::local_apparent_sidereal_deg(&epoch, site) - ra;
        let (ha_topo, dec_topo) = topocentric(ha, dec, distance_km, site);
        checked(horizontal(ha_topo, dec_topo, site.latitude_deg()), "moon altitude", instant)
    }

    fn target_altaz(
        &self,
        ra_deg: f64,
        dec_deg: f64,
        instant: Instant,
        site: &Site,
    ) -> GeometryResult<AltAz> {
        let epoch = self.epoch(instant)?;
        // No proper motion, parallax or radial velocity; zero pressure disables refraction.
        let (aob, zob, _hob, _dob, _rob, _eo) = atco13(
            ra_deg.to_radians(),
            dec_deg.to_radians(),
            0.0,
            0.0,
            0.0,
            0.0,
            MJD_ZERO,
            epoch.mjd_utc,
            0.0,
            site.longitude_deg().to_radians(),
            site.latitude_deg().to_radians(),
            site.elevation_m(),
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            WAVELENGTH_UM,
        )
        .map_err(|status| GeometryError::Transform {
            routine: "atco13",
            instant: instant.isoformat(),
            status: format!("{status:?}"),
        })?;

        let altaz = AltAz::new(
            90.0 - zob.to_degrees(),
            normalize_degrees(aob.to_degrees()),
        );
        checked(altaz, "target altitude", instant)
    }

    fn sun_radec(&self, instant: Instant) -> GeometryResult<EquatorialCoord> {
        let epoch = self.epoch(instant)?;
        let (ra_deg, dec_deg) = sun_apparent_radec(epoch.t);
        checked_radec(EquatorialCoord { ra_deg, dec_deg }, "sun position", instant)
    }

    fn moon_radec(&self, instant: Instant) -> GeometryResult<EquatorialCoord> {
        let epoch = self.epoch(instant)?;
        let (ra_deg, dec_deg, _) = moon_apparent_radec(epoch.t);
        checked_radec(EquatorialCoord { ra_deg, dec_deg }, "moon position", instant)
    }
}

fn checked(altaz: AltAz, quantity: &'static str, instant: Instant) -> GeometryResult<AltAz> {
    if altaz.alt_deg.is_finite() && altaz.az_deg.is_finite() {
        Ok(altaz)
    } else {
        Err(GeometryError::NonFinite {
            quantity,
            instant: instant.isoformat(),
        })
    }
}

fn checked_radec(
    coord: EquatorialCoord,
    quantity: &'static str,
    instant: Instant,
) -> GeometryResult<EquatorialCoord> {
    if coord.ra_deg.is_finite() && coord.dec_deg.is_finite() {
        Ok(coord)
    } else {
        Err(GeometryError::NonFinite {
            quantity,
            instant: instant.isoformat(),
        })
    }
}

// ----------------------------------------------------------------------------
// Sun
// ----------------------------------------------------------------------------

fn sun_mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36_000.769_83 + t * 0.000_303_2))
}

fn sun_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(357.52911 + t * (35_999.050_29 - t * 0.000_153_7))
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = sun_mean_anomaly(t).to_radians();
    m.sin() * (1.914_602 - t * (0.004_817 + t * 0.000_014))
        + (2.0 * m).sin() * (0.019_993 - t * 0.000_101)
        + (3.0 * m).sin() * 0.000_289
}

/// Longitude of the lunar ascending node, degrees.
fn ascending_node(t: f64) -> f64 {
    125.04 - 1_934.136 * t
}

fn sun_apparent_longitude(t: f64) -> f64 {
    let true_longitude = sun_mean_longitude(t) + sun_equation_of_center(t);
    true_longitude - 0.005_69 - 0.004_78 * ascending_node(t).to_radians().sin()
}

fn mean_obliquity_deg(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.000_59 - t * 0.001_813))) / 60.0) / 60.0
}

fn true_obliquity_deg(t: f64) -> f64 {
    mean_obliquity_deg(t) + 0.002_56 * ascending_node(t).to_radians().cos()
}

/// Leading term of the nutation in longitude, degrees.
fn nutation_in_longitude_deg(t: f64) -> f64 {
    -0.004_78 * ascending_node(t).to_radians().sin()
}

fn sun_apparent_radec(t: f64) -> (f64, f64) {
    ecliptic_to_equatorial(sun_apparent_longitude(t), 0.0, true_obliquity_deg(t))
}

// ----------------------------------------------------------------------------
// Moon
// ----------------------------------------------------------------------------

/// Geocentric ecliptic longitude, latitude (degrees, mean equinox of date)
/// and distance (km) of the moon.
fn moon_ecliptic(t: f64) -> (f64, f64, f64) {
    let lp = normalize_degrees(
        218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t * t + t.powi(3) / 538_841.0
            - t.powi(4) / 65_194_000.0,
    );
    let d = normalize_degrees(
        297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t * t + t.powi(3) / 545_868.0
            - t.powi(4) / 113_065_000.0,
    );
    let m = normalize_degrees(
        357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t * t + t.powi(3) / 24_490_000.0,
    );
    let mp = normalize_degrees(
        134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t * t + t.powi(3) / 69_699.0
            - t.powi(4) / 14_712_000.0,
    );
    let f = normalize_degrees(
        93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t * t - t.powi(3) / 3_526_000.0
            + t.powi(4) / 863_310_000.0,
    );

    // Earth orbit eccentricity factor for terms involving M.
    let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t * t;
    let e_factor = |m_mult: f64| match m_mult.abs() as i32 {
        1 => e,
        2 => e * e,
        _ => 1.0,
    };

    let (mut sum_l, mut sum_r) = (0.0_f64, 0.0_f64);
    for &(cd, cm, cmp, cf, coeff_l, coeff_r) in TERMS_LR.iter() {
        let arg = (cd * d + cm * m + cmp * mp + cf * f).to_radians();
        sum_l += coeff_l * e_factor(cm) * arg.sin();
        sum_r += coeff_r * e_factor(cm) * arg.cos();
    }

    let mut sum_b = 0.0_f64;
    for &(cd, cm, cmp, cf, coeff_b) in TERMS_B.iter() {
        let arg = (cd * d + cm * m + cmp * mp + cf * f).to_radians();
        sum_b += coeff_b * e_factor(cm) * arg.sin();
    }

    let a1 = (119.75 + 131.849 * t).to_radians();
    let a2 = (53.09 + 479_264.290 * t).to_radians();
    let a3 = (313.45 + 481_266.484 * t).to_radians();
    let lp_r = lp.to_radians();
    let mp_r = mp.to_radians();
    let f_r = f.to_radians();

    sum_l += 3_958.0 * a1.sin() + 1_962.0 * (lp_r - f_r).sin() + 318.0 * a2.sin();
    sum_b += -2_235.0 * lp_r.sin()
        + 382.0 * a3.sin()
        + 175.0 * (a1 - f_r).sin()
        + 175.0 * (a1 + f_r).sin()
        + 127.0 * (lp_r - mp_r).sin()
        - 115.0 * (lp_r + mp_r).sin();

    (
        normalize_degrees(lp + sum_l / 1e6),
        sum_b / 1e6,
        385_000.56 + sum_r / 1e3,
    )
}

fn moon_apparent_radec(t: f64) -> (f64, f64, f64) {
    let (lon, lat, distance_km) = moon_ecliptic(t);
    let (ra, dec) = ecliptic_to_equatorial(
        lon + nutation_in_longitude_deg(t),
        lat,
        true_obliquity_deg(t),
    );
    (ra, dec, distance_km)
}

/// Shift a geocentric (hour angle, declination) to the observer's position.
fn topocentric(ha_deg: f64, dec_deg: f64, distance_km: f64, site: &Site) -> (f64, f64) {
    let sin_parallax = EARTH_EQUATORIAL_RADIUS_KM / distance_km;
    let phi = site.latitude_deg().to_radians();
    let height_ratio = site.elevation_m() / (EARTH_EQUATORIAL_RADIUS_KM * 1_000.0);

    let u = (EARTH_FLATTENING_RATIO * phi.tan()).atan();
    let rho_sin_phi = EARTH_FLATTENING_RATIO * u.sin() + height_ratio * phi.sin();
    let rho_cos_phi = u.cos() + height_ratio * phi.cos();

    let (sin_h, cos_h) = ha_deg.to_radians().sin_cos();
    let (sin_d, cos_d) = dec_deg.to_radians().sin_cos();

    let denominator = cos_d - rho_cos_phi * sin_parallax * cos_h;
    let delta_ra = (-rho_cos_phi * sin_parallax * sin_h).atan2(denominator);
    let dec_topo = ((sin_d - rho_sin_phi * sin_parallax) * delta_ra.cos()).atan2(denominator);

    (ha_deg - delta_ra.to_degrees(), dec_topo.to_degrees())
}

// ----------------------------------------------------------------------------
// Frames and time
// ----------------------------------------------------------------------------

/// Greenwich apparent sidereal time in degrees.
fn apparent_sidereal_time_deg(epoch: &Epoch) -> f64 {
    normalize_degrees(gst06a(MJD_ZERO, epoch.mjd_utc, MJD_ZERO, epoch.mjd_tt).to_degrees())
}

/// Returns (right ascension, declination) in degrees.
fn ecliptic_to_equatorial(lon_deg: f64, lat_deg: f64, obliquity_deg: f64) -> (f64, f64) {
    let (sin_l, cos_l) = lon_deg.to_radians().sin_cos();
    let (sin_b, cos_b) = lat_deg.to_radians().sin_cos();
    let (sin_e, cos_e) = obliquity_deg.to_radians().sin_cos();

    let ra = (sin_l * cos_e - (sin_b / cos_b) * sin_e).atan2(cos_l);
    let dec = (sin_b * cos_e + cos_b * sin_e * sin_l).clamp(-1.0, 1.0).asin();
    (normalize_degrees(ra.to_degrees()), dec.to_degrees())
}

/// Hour angle/declination to altitude/azimuth (azimuth from north through east).
fn horizontal(ha_deg: f64, dec_deg: f64, lat_deg: f64) -> AltAz {
    let (sin_h, cos_h) = ha_deg.to_radians().sin_cos();
    let (sin_d, cos_d) = dec_deg.to_radians().sin_cos();
    let (sin_p, cos_p) = lat_deg.to_radians().sin_cos();

    let alt = (sin_p * sin_d + cos_p * cos_d * cos_h).clamp(-1.0, 1.0).asin();
    let az = (-sin_h * cos_d).atan2(sin_d * cos_p - cos_d * cos_h * sin_p);

    AltAz::new(alt.to_degrees(), normalize_degrees(az.to_degrees()))
}
