//! Compensation setup
//!
//! Two steps: pick a name and source entity, then enter calibration
//! options. The options step is also reused when the user edits an
//! existing entry.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::calibration;
use crate::data::{validate_calibration, CalibrationSet, CompensationSettings};
use crate::error::{Result, UpsHatError};

/// Raw input from the first step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// Validated first step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationSetup {
    pub name: String,
    pub entity_id: String,
}

/// Raw input from the options step
///
/// Number inputs deliver floats, so `precision` and `degree` are truncated
/// to integers during validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsInput {
    pub data_points: Vec<String>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub upper_limit: bool,
    #[serde(default)]
    pub lower_limit: bool,
    #[serde(default = "default_precision")]
    pub precision: f64,
    #[serde(default = "default_degree")]
    pub degree: f64,
    #[serde(default)]
    pub unit_of_measurement: Option<String>,
}

fn default_precision() -> f64 {
    f64::from(calibration::DEFAULT_PRECISION)
}

fn default_degree() -> f64 {
    f64::from(calibration::DEFAULT_DEGREE)
}

impl OptionsInput {
    /// Options with defaults for everything but the data points
    pub fn new<S: Into<String>>(data_points: impl IntoIterator<Item = S>) -> Self {
        Self {
            data_points: data_points.into_iter().map(Into::into).collect(),
            attribute: None,
            upper_limit: false,
            lower_limit: false,
            precision: default_precision(),
            degree: default_degree(),
            unit_of_measurement: None,
        }
    }
}

/// Validated options step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompensationOptions {
    pub calibration: CalibrationSet,
    pub attribute: Option<String>,
    pub upper_limit: bool,
    pub lower_limit: bool,
    pub precision: u32,
    pub unit_of_measurement: Option<String>,
}

impl CompensationOptions {
    pub fn degree(&self) -> u8 {
        self.calibration.degree()
    }

    /// Settings for [`crate::data::Compensation::new`]
    pub fn settings(&self) -> CompensationSettings {
        CompensationSettings {
            precision: self.precision,
            lower_limit: self.lower_limit,
            upper_limit: self.upper_limit,
        }
    }
}

/// Validate the name and source entity
pub fn validate_setup(input: &SetupInput) -> Result<CompensationSetup> {
    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(calibration::DEFAULT_NAME)
        .to_string();

    let entity_id = input
        .entity_id
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| UpsHatError::MissingConfig("entity_id".into()))?
        .to_string();

    Ok(CompensationSetup { name, entity_id })
}

/// Validate the calibration options
///
/// Schema bounds (degree 0-7, precision >= 0) are checked first, then the
/// data points themselves.
pub fn validate_options(input: &OptionsInput) -> Result<CompensationOptions> {
    let precision = truncate_in_range(
        "precision",
        input.precision,
        0.0,
        f64::from(calibration::MAX_PRECISION),
    )?;
    let degree = truncate_in_range(
        "degree",
        input.degree,
        0.0,
        f64::from(calibration::MAX_DEGREE),
    )?;

    // both values were range-checked above
    let precision = precision as u32;
    let degree = degree as u8;

    let calibration = validate_calibration(&input.data_points, degree)?;
    debug!(
        "accepted {} calibration points at degree {}",
        calibration.len(),
        degree
    );

    Ok(CompensationOptions {
        calibration,
        attribute: non_empty(&input.attribute),
        upper_limit: input.upper_limit,
        lower_limit: input.lower_limit,
        precision,
        unit_of_measurement: non_empty(&input.unit_of_measurement),
    })
}

/// Title of the entry created from a setup
pub fn entry_title(setup: &CompensationSetup) -> &str {
    &setup.name
}

fn truncate_in_range(field: &str, value: f64, min: f64, max: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(UpsHatError::invalid_config(field, "must be a number"));
    }
    let truncated = value.trunc();
    if truncated < min || truncated > max {
        return Err(UpsHatError::invalid_config(
            field,
            format!("{} is outside {}..={}", truncated, min, max),
        ));
    }
    Ok(truncated)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::line_points;

    #[test]
    fn test_setup_defaults_name() {
        let setup = validate_setup(&SetupInput {
            name: None,
            entity_id: Some("sensor.outdoor_temp".into()),
        })
        .unwrap();
        assert_eq!(setup.name, "Compensation");
        assert_eq!(entry_title(&setup), "Compensation");

        let setup = validate_setup(&SetupInput {
            name: Some(" Porch ".into()),
            entity_id: Some("sensor.porch".into()),
        })
        .unwrap();
        assert_eq!(setup.name, "Porch");
    }

    #[test]
    fn test_setup_requires_entity() {
        let err = validate_setup(&SetupInput::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_options_defaults() {
        let options = validate_options(&OptionsInput::new(line_points(2))).unwrap();
        assert_eq!(options.degree(), 1);
        assert_eq!(options.precision, 2);
        assert!(!options.upper_limit);
        assert_eq!(options.calibration.len(), 2);
    }

    #[test]
    fn test_options_truncate_numbers() {
        let mut input = OptionsInput::new(line_points(4));
        input.degree = 2.9;
        input.precision = 3.7;
        let options = validate_options(&input).unwrap();
        assert_eq!(options.degree(), 2);
        assert_eq!(options.precision, 3);
    }

    #[test]
    fn test_options_form_errors() {
        let input = OptionsInput::new(["1,2", "oops"]);
        assert_eq!(
            validate_options(&input).unwrap_err().kind().message_key(),
            "incorrect_datapoints"
        );

        let mut input = OptionsInput::new(line_points(3));
        input.degree = 3.0;
        assert_eq!(
            validate_options(&input).unwrap_err().kind().message_key(),
            "not_enough_datapoints"
        );
    }

    #[test]
    fn test_options_schema_bounds() {
        let mut input = OptionsInput::new(line_points(10));
        input.degree = 8.0;
        assert_eq!(validate_options(&input).unwrap_err().kind(), ErrorKind::InvalidConfig);

        input.degree = 1.0;
        input.precision = -1.0;
        assert_eq!(validate_options(&input).unwrap_err().kind(), ErrorKind::InvalidConfig);

        input.precision = f64::NAN;
        assert_eq!(validate_options(&input).unwrap_err().kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_options_drop_blank_text() {
        let mut input = OptionsInput::new(line_points(2));
        input.attribute = Some("  ".into());
        input.unit_of_measurement = Some("°C".into());
        let options = validate_options(&input).unwrap();
        assert_eq!(options.attribute, None);
        assert_eq!(options.unit_of_measurement.as_deref(), Some("°C"));
    }

    #[test]
    fn test_options_deserialize_from_form_json() {
        let json = r#"{"data_points":["1,2","3,4","5,6"],"degree":2.0,"upper_limit":true}"#;
        let input: OptionsInput = serde_json::from_str(json).unwrap();
        let options = validate_options(&input).unwrap();
        assert_eq!(options.degree(), 2);
        assert!(options.settings().upper_limit);
        assert_eq!(options.settings().precision, 2);
    }
}
