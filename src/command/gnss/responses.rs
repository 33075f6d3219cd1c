//! Responses for GNSS Commands
use embassy_time::Instant;
use heapless::{String, Vec};

use crate::response::RawResponse;

/// Fix modes below this are not a position: `2` is a 2D fix, `3` a 3D fix.
const MIN_FIX: u8 = 2;
const MIN_FIELDS: usize = 6;
const MAX_FIELDS: usize = 12;

/// Position report +QGPSLOC
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsFix {
    /// UTC time as `hhmmss.sss`
    pub utc: String<16>,
    /// Decimal degrees, negative in the southern hemisphere
    pub latitude: f64,
    pub lat_hemisphere: char,
    /// Decimal degrees, negative west of Greenwich
    pub longitude: f64,
    pub lng_hemisphere: char,
    pub hdop: f32,
    pub altitude: f32,
    pub fix: u8,
    /// Course over ground, degrees
    pub course: f32,
    pub speed_kmh: f32,
    pub speed_knots: f32,
    /// UTC date as `ddmmyy`
    pub date: String<8>,
    pub satellites: u8,
    pub captured_at: Instant,
}

/// `+QGPS: 1` when the GNSS engine is running.
pub fn parse_gps_power(resp: &RawResponse) -> bool {
    resp.contains("+QGPS: 1")
}

/// Convert NMEA style `dddmm.mmmm` into decimal degrees.
pub fn decimal_degrees(value: f64) -> f64 {
    (value / 100.0) as u32 as f64 + (value % 100.0) / 60.0
}

/// Parse a `+QGPSLOC:` position report.
///
/// A modem that is still acquiring satellites answers either `+CME ERROR:` or
/// a record with empty fields and fix mode `1`; both give `None`.
pub fn parse_gps_fix(resp: &RawResponse, captured_at: Instant) -> Option<GpsFix> {
    if resp.len() < 9 {
        warn!("Getting GPS failure - unexpected response: {}", resp.as_str());
        return None;
    }

    let Some(payload) = resp.payload_after("+QGPSLOC:") else {
        if resp.contains("+CME ERROR:") {
            info!("No satellite fix, please retry");
        } else {
            error!("Unexpected GPS response: {}", resp.as_str());
        }
        return None;
    };

    let fields: Vec<&str, MAX_FIELDS> = payload.split(',').map(str::trim).take(MAX_FIELDS).collect();
    if fields.len() < MIN_FIELDS {
        warn!("Getting GPS failure - unexpected response: {}", payload);
        return None;
    }
    let field = |i: usize| fields.get(i).copied().unwrap_or_default();

    let fix = field(5).parse().unwrap_or(0);
    if fix < MIN_FIX {
        info!("No GPS signal, maybe warming up");
        return None;
    }

    let (latitude, lat_hemisphere) = coordinate(field(1), 'S');
    let (longitude, lng_hemisphere) = coordinate(field(2), 'W');

    let gps_fix = GpsFix {
        utc: truncated(field(0)),
        latitude,
        lat_hemisphere,
        longitude,
        lng_hemisphere,
        hdop: field(3).parse().unwrap_or_default(),
        altitude: field(4).parse().unwrap_or_default(),
        fix,
        course: field(6).parse().unwrap_or_default(),
        speed_kmh: field(7).parse().unwrap_or_default(),
        speed_knots: field(8).parse().unwrap_or_default(),
        date: truncated(field(9)),
        satellites: field(10).parse().unwrap_or_default(),
        captured_at,
    };
    info!("Good GPS signal: lat={}, lng={}", field(1), field(2));
    Some(gps_fix)
}

/// Split `3745.8152N` into decimal degrees and hemisphere, negating the
/// value for the `negative` hemisphere.
fn coordinate(field: &str, negative: char) -> (f64, char) {
    let Some(hemisphere) = field.chars().last().filter(char::is_ascii_alphabetic) else {
        return (decimal_degrees(field.parse().unwrap_or_default()), ' ');
    };
    let value = field[..field.len() - hemisphere.len_utf8()]
        .parse()
        .map(decimal_degrees)
        .unwrap_or_default();
    if hemisphere == negative {
        (-value, hemisphere)
    } else {
        (value, hemisphere)
    }
}

fn truncated<const N: usize>(field: &str) -> String<N> {
    let mut out = String::new();
    for c in field.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
