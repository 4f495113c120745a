//! Tank fill metrics derived from a distance reading and tank geometry.

use crate::config::TankConfig;
use crate::error::MetricError;

/// Fill depth in centimetres: `tank_depth - distance - offset`.
///
/// Signed on purpose. If the sensor reports a distance beyond the tank
/// depth (misconfiguration, echo off the inlet pipe) the negative value is
/// propagated as-is rather than clamped, so the page shows the anomaly.
pub fn fill_depth_cm(config: &TankConfig, distance_cm: u32) -> i64 {
    i64::from(config.tank_depth_cm) - i64::from(distance_cm) - i64::from(config.offset_cm)
}

/// Fill level as a percentage of total depth, rounded half away from zero.
///
/// Fails with [`MetricError::DivideByZero`] for a zero tank depth; the
/// settings-apply boundary rejects that value, so stored configs reaching
/// here are always non-zero.
pub fn fill_percent(config: &TankConfig, distance_cm: u32) -> Result<i32, MetricError> {
    if config.tank_depth_cm == 0 {
        return Err(MetricError::DivideByZero);
    }
    let depth = fill_depth_cm(config, distance_cm) as f64;
    let percent = depth / f64::from(config.tank_depth_cm) * 100.0;
    Ok(percent.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(depth: u32, offset: u32) -> TankConfig {
        TankConfig {
            tank_depth_cm: depth,
            offset_cm: offset,
            ..Default::default()
        }
    }

    #[test]
    fn reference_geometry() {
        let c = config(200, 0);
        assert_eq!(fill_depth_cm(&c, 120), 80);
        assert_eq!(fill_percent(&c, 120).unwrap(), 40);
    }

    #[test]
    fn offset_subtracts() {
        let c = config(200, 20);
        assert_eq!(fill_depth_cm(&c, 120), 60);
        assert_eq!(fill_percent(&c, 120).unwrap(), 30);
    }

    #[test]
    fn overshoot_goes_negative_unclamped() {
        let c = config(200, 0);
        assert_eq!(fill_depth_cm(&c, 250), -50);
        assert_eq!(fill_percent(&c, 250).unwrap(), -25);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // 101/200 = 50.5% → 51
        let c = config(200, 0);
        assert_eq!(fill_percent(&c, 99).unwrap(), 51);
        // -1/200 = -0.5% → -1
        assert_eq!(fill_percent(&c, 201).unwrap(), -1);
    }

    #[test]
    fn full_and_empty() {
        let c = config(200, 0);
        assert_eq!(fill_percent(&c, 0).unwrap(), 100);
        assert_eq!(fill_percent(&c, 200).unwrap(), 0);
    }

    #[test]
    fn zero_depth_fails() {
        let c = config(0, 0);
        assert_eq!(fill_percent(&c, 10), Err(MetricError::DivideByZero));
    }
}
