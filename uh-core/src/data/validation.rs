//! Input validation for calibration data
//!
//! Calibration points arrive as free-form strings typed into a multi-value
//! form field. Everything here is pure: the same input always yields the
//! same result and nothing is cached between calls.

use tracing::debug;

use crate::constants::calibration;
use crate::data::types::{CalibrationPoint, CalibrationSet};
use crate::error::{Result, UpsHatError};

/// Parse a single `"measured,true"` data point
///
/// The string is split on the first separator only, so `"1,2,3"` is
/// rejected because `"2,3"` is not a number. The left side must be
/// non-empty. Whitespace around either number is ignored; digit-group
/// underscores are not.
pub fn parse_calibration_point(raw: &str) -> Result<CalibrationPoint> {
    let (measured, true_value) = match raw.split_once(calibration::POINT_SEPARATOR) {
        Some((left, right)) if !left.is_empty() => (left, right),
        _ => return Err(UpsHatError::malformed_point(raw)),
    };

    let measured = parse_float(measured).ok_or_else(|| UpsHatError::malformed_point(raw))?;
    let true_value = parse_float(true_value).ok_or_else(|| UpsHatError::malformed_point(raw))?;

    Ok(CalibrationPoint::new(measured, true_value))
}

fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Validate raw data points against the requested polynomial degree
///
/// Fails with `MalformedPoint` when the input is empty or any point does
/// not parse, and with `InsufficientDataPoints` when there are not more
/// points than the degree. No partial result is ever returned.
///
/// `degree` is bounded to `0..=7` by the caller's form schema.
pub fn validate_calibration<S: AsRef<str>>(raw_points: &[S], degree: u8) -> Result<CalibrationSet> {
    debug_assert!(
        degree <= calibration::MAX_DEGREE,
        "degree {} exceeds schema maximum",
        degree
    );

    if raw_points.is_empty() {
        return Err(UpsHatError::malformed_point(""));
    }

    let points = raw_points
        .iter()
        .map(|raw| parse_calibration_point(raw.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    if points.len() <= usize::from(degree) {
        debug!(
            "rejecting {} calibration points for degree {}",
            points.len(),
            degree
        );
        return Err(UpsHatError::InsufficientDataPoints {
            count: points.len(),
            degree,
        });
    }

    Ok(CalibrationSet::new_unchecked(points, degree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn kind_of(raw: &[&str], degree: u8) -> ErrorKind {
        validate_calibration(raw, degree).unwrap_err().kind()
    }

    #[test]
    fn test_parse_calibration_point() {
        assert_eq!(parse_calibration_point("1,2").unwrap(), CalibrationPoint::new(1.0, 2.0));
        assert_eq!(
            parse_calibration_point(" -1.5 , 2e3 ").unwrap(),
            CalibrationPoint::new(-1.5, 2000.0)
        );
        assert!(parse_calibration_point("1-2").is_err());
        assert!(parse_calibration_point(",2").is_err());
        assert!(parse_calibration_point("1,").is_err());
        assert!(parse_calibration_point("1,2,3").is_err());
        assert!(parse_calibration_point("a,2").is_err());
        assert!(parse_calibration_point("").is_err());
        assert!(parse_calibration_point("1_000,2").is_err());
        assert!(parse_calibration_point("1,2_5").is_err());
    }

    #[test]
    fn test_point_from_str() {
        let p: CalibrationPoint = "0.5,10".parse().unwrap();
        assert_eq!(p, CalibrationPoint::new(0.5, 10.0));
    }

    #[test]
    fn test_validate_examples() {
        let set = validate_calibration(&["1,2", "3,4", "5,6"], 2).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.degree(), 2);
        assert_eq!(set.points()[2], CalibrationPoint::new(5.0, 6.0));

        assert_eq!(kind_of(&["1,2", "3,4"], 2), ErrorKind::InsufficientDataPoints);
        assert_eq!(kind_of(&["1-2"], 0), ErrorKind::MalformedPoint);
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let empty: [&str; 0] = [];
        assert_eq!(kind_of(&empty, 0), ErrorKind::MalformedPoint);
    }

    #[test]
    fn test_malformed_wins_over_count() {
        // a single bad point fails the whole set even with plenty of points
        assert_eq!(kind_of(&["1,2", "3,4", "x", "7,8"], 1), ErrorKind::MalformedPoint);
        assert_eq!(kind_of(&["1,2", "3;4"], 5), ErrorKind::MalformedPoint);
    }

    #[test]
    fn test_count_must_exceed_degree() {
        let points: Vec<String> = (0..8).map(|i| format!("{},{}", i, i * 2)).collect();
        for degree in 0..=7u8 {
            let enough = &points[..usize::from(degree) + 1];
            assert!(validate_calibration(enough, degree).is_ok(), "degree {}", degree);

            let short = &points[..usize::from(degree)];
            let err = validate_calibration(short, degree).unwrap_err();
            let expected = if short.is_empty() {
                ErrorKind::MalformedPoint
            } else {
                ErrorKind::InsufficientDataPoints
            };
            assert_eq!(err.kind(), expected, "degree {}", degree);
        }
    }

    #[test]
    fn test_validation_is_idempotent() {
        let raw = ["1,2", "2,4.5", "3,5"];
        assert_eq!(validate_calibration(&raw, 1).unwrap(), validate_calibration(&raw, 1).unwrap());

        let bad = ["1,2"];
        assert_eq!(
            validate_calibration(&bad, 3).unwrap_err().to_string(),
            validate_calibration(&bad, 3).unwrap_err().to_string()
        );
    }

    #[test]
    fn test_accepts_owned_strings() {
        let raw = vec!["10,11".to_string(), "20,19".to_string()];
        assert_eq!(validate_calibration(&raw, 0).unwrap().len(), 2);
    }
}
