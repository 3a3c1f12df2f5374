use serde::{Deserialize, Serialize};

/// Accepted deviation of a stored vector's L2 norm from 1.0.
pub const NORM_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub enum VectorError {
    Empty,
    NonFinite,
    ZeroNorm,
    NotNormalized(f32),
}

impl std::fmt::Display for VectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorError::Empty => write!(f, "Vector has no components"),
            VectorError::NonFinite => write!(f, "Vector contains NaN or infinite components"),
            VectorError::ZeroNorm => write!(f, "Vector has zero norm and cannot be normalized"),
            VectorError::NotNormalized(norm) => {
                write!(f, "Vector norm {} is outside the unit tolerance", norm)
            }
        }
    }
}

impl std::error::Error for VectorError {}

/// An L2-normalized embedding. Cosine similarity between two of these is
/// their dot product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct NormalizedVector(Vec<f32>);

impl NormalizedVector {
    /// Scales `values` to unit length.
    pub fn normalize(mut values: Vec<f32>) -> Result<Self, VectorError> {
        if values.is_empty() {
            return Err(VectorError::Empty);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(VectorError::NonFinite);
        }

        let norm = l2_norm(&values);
        if norm == 0.0 || !norm.is_finite() {
            return Err(VectorError::ZeroNorm);
        }

        for value in values.iter_mut() {
            *value /= norm;
        }

        Ok(Self(values))
    }

    /// Accepts an already-normalized vector, e.g. one read back from storage.
    pub fn from_normalized(values: Vec<f32>) -> Result<Self, VectorError> {
        if values.is_empty() {
            return Err(VectorError::Empty);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(VectorError::NonFinite);
        }

        let norm = l2_norm(&values);
        if (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(VectorError::NotNormalized(norm));
        }

        Ok(Self(values))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    pub fn norm(&self) -> f32 {
        l2_norm(&self.0)
    }

    /// Cosine similarity, computed in f64 so repeated calls agree bit for bit.
    pub fn dot(&self, other: &NormalizedVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| f64::from(*a) * f64::from(*b))
            .sum()
    }
}

impl TryFrom<Vec<f32>> for NormalizedVector {
    type Error = VectorError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::from_normalized(values)
    }
}

impl From<NormalizedVector> for Vec<f32> {
    fn from(vector: NormalizedVector) -> Self {
        vector.0
    }
}

fn l2_norm(values: &[f32]) -> f32 {
    values
        .iter()
        .map(|v| f64::from(*v) * f64::from(*v))
        .sum::<f64>()
        .sqrt() as f32
}
