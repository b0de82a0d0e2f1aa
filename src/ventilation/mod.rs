use crate::status::ResolvedReading;

/// Stress ratio below which the fans stay off
pub const STRESS_FLOOR: f64 = 0.5;

/// Percent of fan power gained per unit of stress above the floor
pub const RAMP_GAIN: f64 = 200.0;

/// Ratio of a reading to its danger threshold
pub fn stress(value: f64, danger: f64) -> f64 {
    value / danger
}

/// Fan power (0–100 %) for the single most stressed reading.
///
/// Zero up to half the danger threshold, linear ramp above it, saturated
/// once any reading reaches its danger threshold. Non-finite stresses
/// are ignored; no readings means the fans are off.
pub fn fan_speed(max_stress: Option<f64>) -> u8 {
    let Some(stress) = max_stress else {
        return 0;
    };
    if stress <= STRESS_FLOOR {
        return 0;
    }
    let output = ((stress - STRESS_FLOOR) * RAMP_GAIN).min(100.0);
    output.floor().clamp(0.0, 100.0) as u8
}

/// Highest finite stress over a set of resolved readings
pub fn max_stress<'a, I>(readings: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a ResolvedReading>,
{
    readings
        .into_iter()
        .map(|r| stress(r.value, r.threshold.danger))
        .filter(|s| s.is_finite())
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |m| m.max(s))))
}

/// Control law applied to every current reading on the vessel
pub fn fan_speed_for<'a, I>(readings: I) -> u8
where
    I: IntoIterator<Item = &'a ResolvedReading>,
{
    fan_speed(max_stress(readings))
}
