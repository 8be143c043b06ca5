use serde::{Deserialize, Serialize};

use crate::errors::IntegralError;

/// A bound as sent by the client: a JSON number or a string such as `"pi/2"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundInput {
    Number(f64),
    Text(String),
}

impl BoundInput {
    /// false for a blank string
    pub fn is_present(&self) -> bool {
        match self {
            BoundInput::Number(_) => true,
            BoundInput::Text(text) => !text.trim().is_empty(),
        }
    }
}

impl From<&str> for BoundInput {
    fn from(text: &str) -> Self {
        BoundInput::Text(text.to_string())
    }
}

impl From<f64> for BoundInput {
    fn from(value: f64) -> Self {
        BoundInput::Number(value)
    }
}

/// Body of `POST /calculate`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntegrationRequest {
    #[serde(default)]
    pub function: String,
    /// blank means `x`
    #[serde(default)]
    pub variable: String,
    #[serde(default)]
    pub lower_limit: Option<BoundInput>,
    #[serde(default)]
    pub upper_limit: Option<BoundInput>,
}

impl IntegrationRequest {
    pub fn new(function: &str, variable: &str, lower: Option<&str>, upper: Option<&str>) -> Self {
        IntegrationRequest {
            function: function.to_string(),
            variable: variable.to_string(),
            lower_limit: lower.map(BoundInput::from),
            upper_limit: upper.map(BoundInput::from),
        }
    }

    /// Both bounds when both are present and non-blank. A single bound means an
    /// indefinite integral only.
    pub fn bounds(&self) -> Option<(&BoundInput, &BoundInput)> {
        match (&self.lower_limit, &self.upper_limit) {
            (Some(lower), Some(upper)) if lower.is_present() && upper.is_present() => {
                Some((lower, upper))
            }
            _ => None,
        }
    }
}

/// x ascending, x and y of equal length, every value finite
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PointSeries {
    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Response of `POST /calculate`. Absent fields are left out of the JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntegrationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integral_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integral_latex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definite_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_points: Option<PointSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integral_points: Option<PointSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_points: Option<PointSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl IntegrationResult {
    pub fn failure(err: &IntegralError) -> Self {
        IntegrationResult {
            success: false,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
            ..Default::default()
        }
    }

    /// the calculation did not finish within `timeout_ms`
    pub fn timeout(timeout_ms: u64) -> Self {
        IntegrationResult {
            success: false,
            error: Some(format!(
                "Timeout: the calculation did not finish within {} ms",
                timeout_ms
            )),
            error_kind: Some("Timeout".to_string()),
            ..Default::default()
        }
    }

    /// the worker running the calculation failed
    pub fn internal(message: &str) -> Self {
        IntegrationResult {
            success: false,
            error: Some(format!("InternalError: {}", message)),
            error_kind: Some("InternalError".to_string()),
            ..Default::default()
        }
    }
}
