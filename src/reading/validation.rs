use super::{AcceptedReading, PollutantKind, PollutantReading, ReadingBundle, ZoneId};
use chrono::{DateTime, Utc};
use std::fmt;

/// Validation errors for incoming reading bundles
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingError {
    MissingZone,
    UnknownPollutant(String),
    NonFiniteValue(f64),
    InvalidInlineThreshold(f64),
}

impl fmt::Display for ReadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingError::MissingZone => write!(f, "zone is required"),
            ReadingError::UnknownPollutant(label) => {
                write!(f, "unknown pollutant '{}'", label)
            }
            ReadingError::NonFiniteValue(v) => write!(f, "value must be finite, got {}", v),
            ReadingError::InvalidInlineThreshold(v) => {
                write!(f, "inline threshold must be finite and positive, got {}", v)
            }
        }
    }
}

impl std::error::Error for ReadingError {}

/// Validates a bundle and turns it into an accepted reading.
///
/// Rules:
/// - zone must be non-empty after trimming
/// - pollutant label must resolve to a known kind
/// - value must be finite (NaN/inf are never coerced to zero)
/// - inline threshold, when present, must be finite and > 0
/// - missing unit falls back to the pollutant's unit
/// - missing capture time falls back to `now`
pub fn validate_bundle(
    bundle: &ReadingBundle,
    now: DateTime<Utc>,
) -> Result<AcceptedReading, ReadingError> {
    let zone = bundle.zone.trim();
    if zone.is_empty() {
        return Err(ReadingError::MissingZone);
    }

    let pollutant = PollutantKind::from_label(&bundle.pollutant)
        .ok_or_else(|| ReadingError::UnknownPollutant(bundle.pollutant.clone()))?;

    if !bundle.value.is_finite() {
        return Err(ReadingError::NonFiniteValue(bundle.value));
    }

    if let Some(danger) = bundle.threshold {
        if !danger.is_finite() || danger <= 0.0 {
            return Err(ReadingError::InvalidInlineThreshold(danger));
        }
    }

    let unit = bundle
        .unit
        .clone()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| pollutant.unit().to_string());

    Ok(AcceptedReading {
        reading: PollutantReading {
            zone: ZoneId::new(zone),
            pollutant,
            value: bundle.value,
            unit,
            captured_at: bundle.captured_at.unwrap_or(now),
        },
        inline_danger: bundle.threshold,
    })
}
