//! Fitted feature scalers
//!
//! Scaling parameters are fitted offline on the selected training genes and
//! stored as JSON. Columns are in feature-index-list order.

use super::Scaler;
use ndarray::{Array1, Array2, ArrayView2};
use serde::Deserialize;

/// JSON scaler artifact, tagged by transform kind
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScalerArtifact {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

impl ScalerArtifact {
    pub fn into_scaler(self) -> Box<dyn Scaler> {
        match self {
            ScalerArtifact::Standard(scaler) => Box::new(scaler),
            ScalerArtifact::MinMax(scaler) => Box::new(scaler),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct StandardParams {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Standardization: `(x - mean) / scale`
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "StandardParams")]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl TryFrom<StandardParams> for StandardScaler {
    type Error = String;

    fn try_from(params: StandardParams) -> Result<Self, Self::Error> {
        Self::new(params.mean, params.scale)
    }
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        if mean.len() != scale.len() {
            return Err(format!(
                "scaler mean has {} values but scale has {}",
                mean.len(),
                scale.len()
            ));
        }
        // Constant training columns carry zero scale; leave them unscaled
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect::<Array1<f64>>();
        Ok(Self {
            mean: Array1::from(mean),
            scale,
        })
    }

    /// Scaler that leaves `width` columns unchanged
    pub fn identity(width: usize) -> Self {
        Self {
            mean: Array1::zeros(width),
            scale: Array1::ones(width),
        }
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        (&x - &self.mean) / &self.scale
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MinMaxParams {
    min: Vec<f64>,
    scale: Vec<f64>,
}

/// Range scaling: `x * scale + min`
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "MinMaxParams")]
pub struct MinMaxScaler {
    min: Array1<f64>,
    scale: Array1<f64>,
}

impl TryFrom<MinMaxParams> for MinMaxScaler {
    type Error = String;

    fn try_from(params: MinMaxParams) -> Result<Self, Self::Error> {
        Self::new(params.min, params.scale)
    }
}

impl MinMaxScaler {
    pub fn new(min: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        if min.len() != scale.len() {
            return Err(format!(
                "scaler min has {} values but scale has {}",
                min.len(),
                scale.len()
            ));
        }
        Ok(Self {
            min: Array1::from(min),
            scale: Array1::from(scale),
        })
    }
}

impl Scaler for MinMaxScaler {
    fn n_features(&self) -> usize {
        self.min.len()
    }

    fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        &x * &self.scale + &self.min
    }
}
