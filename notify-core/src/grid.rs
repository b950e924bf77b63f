//! Projection of geographic coordinates onto the forecast service's grid.
//!
//! Lambert conformal conic projection with the fixed parameters the service
//! publishes for its 5 km mesh. The function is total: it never fails, and
//! NaN inputs propagate into the output (callers validate coordinates before
//! projecting).

use std::f64::consts::PI;

use crate::model::GridPoint;

/// Earth radius in km.
const RE: f64 = 6371.00877;
/// Grid spacing in km.
const GRID: f64 = 5.0;
/// First standard parallel, degrees.
const SLAT1: f64 = 30.0;
/// Second standard parallel, degrees.
const SLAT2: f64 = 60.0;
/// Origin longitude, degrees.
const OLON: f64 = 126.0;
/// Origin latitude, degrees.
const OLAT: f64 = 38.0;
/// Grid x offset of the origin.
const XO: f64 = 43.0;
/// Grid y offset of the origin.
const YO: f64 = 136.0;

const DEGRAD: f64 = PI / 180.0;

/// Convert (latitude, longitude) in degrees to the provider's grid cell.
///
/// Deterministic: identical inputs always produce identical cells. Rounding
/// is `floor(x + 0.5)`, which the reference points in the tests pin down.
pub fn to_grid(latitude: f64, longitude: f64) -> GridPoint {
    let re = RE / GRID;
    let slat1 = SLAT1 * DEGRAD;
    let slat2 = SLAT2 * DEGRAD;
    let olon = OLON * DEGRAD;
    let olat = OLAT * DEGRAD;

    let sn = (slat1.cos() / slat2.cos()).ln()
        / ((PI * 0.25 + slat2 * 0.5).tan() / (PI * 0.25 + slat1 * 0.5).tan()).ln();
    let sf = (PI * 0.25 + slat1 * 0.5).tan().powf(sn) * slat1.cos() / sn;
    let ro = re * sf / (PI * 0.25 + olat * 0.5).tan().powf(sn);

    let ra = re * sf / (PI * 0.25 + latitude * DEGRAD * 0.5).tan().powf(sn);
    let mut theta = longitude * DEGRAD - olon;
    if theta > PI {
        theta -= 2.0 * PI;
    }
    if theta < -PI {
        theta += 2.0 * PI;
    }
    theta *= sn;

    let nx = (ra * theta.sin() + XO + 0.5).floor() as i64;
    let ny = (ro - ra * theta.cos() + YO + 0.5).floor() as i64;

    GridPoint { nx, ny }
}
