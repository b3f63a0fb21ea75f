use indexmap::IndexMap;
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::errors::LirError;
use crate::geometry::predicates::Point3;

/// Coefficients carried per variable, in channel order.
pub const COEFFICIENT_NAMES: [&str; NUM_COEFFICIENTS] = ["C_alpha", "C_S", "C_T", "C_A", "C_B", "C_C"];
pub const NUM_COEFFICIENTS: usize = 6;

///
/// Pre-trained coefficient grid for one variable, as delivered by the grid data provider.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridRecord
{
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub d2d: Vec<f64>,
    #[serde(rename = "C_alpha")]
    pub c_alpha: Vec<f64>,
    #[serde(rename = "C_S")]
    pub c_s: Vec<f64>,
    #[serde(rename = "C_T")]
    pub c_t: Vec<f64>,
    #[serde(rename = "C_A")]
    pub c_a: Vec<f64>,
    #[serde(rename = "C_B")]
    pub c_b: Vec<f64>,
    #[serde(rename = "C_C")]
    pub c_c: Vec<f64>,
}

impl GridRecord
{
    pub fn len(&self) -> usize
    {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.lon.is_empty()
    }

    /// Coefficient columns in channel order.
    pub fn coefficients(&self) -> [&[f64]; NUM_COEFFICIENTS]
    {
        [&self.c_alpha, &self.c_s, &self.c_t, &self.c_a, &self.c_b, &self.c_c]
    }

    fn check_lengths(&self, variable: &str) -> Result<(), LirError>
    {
        let expected = self.len();
        let fields = [("lat", self.lat.len()), ("d2d", self.d2d.len())].into_iter()
            .chain(COEFFICIENT_NAMES.iter().zip(self.coefficients()).map(|(&name, c)| (name, c.len())));
        for (field, actual) in fields
        {
            if actual != expected
            {
                return Err(LirError::MalformedGrid { variable: variable.to_owned(), field, expected, actual });
            }
        }
        Ok(())
    }
}

///
/// Per-vertex coefficients of every variable, shape `(vertices, variables, 6)`.
///
#[derive(Clone, Debug, PartialEq)]
pub struct CoefficientTensor
{
    pub variables: Vec<String>,
    pub values: Array3<f64>,
}

impl CoefficientTensor
{
    pub fn num_vertices(&self) -> usize
    {
        self.values.shape()[0]
    }

    pub fn num_variables(&self) -> usize
    {
        self.variables.len()
    }
}

///
/// Training vertices shared by every variable plus the stacked coefficient tensor.
///
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingGrid
{
    points: Vec<Point3>,
    tensor: CoefficientTensor,
}

impl TrainingGrid
{
    pub fn new(points: Vec<Point3>, tensor: CoefficientTensor) -> Result<Self, LirError>
    {
        if tensor.num_vertices() != points.len() || tensor.values.shape()[2] != NUM_COEFFICIENTS
        {
            return Err(LirError::TensorShapeMismatch { vertices: points.len(), rows: tensor.num_vertices(), channels: tensor.values.shape()[2] });
        }
        Ok(Self { points, tensor })
    }

    ///
    /// Assemble a grid from per-variable records. Coordinates come from the first record and
    /// every other record must repeat them exactly.
    ///
    pub fn from_records(records: &IndexMap<String, GridRecord>) -> Result<Self, LirError>
    {
        let Some((first_name, first)) = records.first() else
        {
            return Err(LirError::InsufficientTrainingData { points: 0, reason: "no variables requested" });
        };
        for (name, record) in records
        {
            record.check_lengths(name)?;
        }
        if first.is_empty()
        {
            return Err(LirError::InsufficientTrainingData { points: 0, reason: "training grid has no vertices" });
        }
        let n = first.len();
        for (name, record) in records.iter().skip(1)
        {
            if record.len() != n
            {
                return Err(LirError::MalformedGrid { variable: name.clone(), field: "lon", expected: n, actual: record.len() });
            }
            let differs = |i: &usize| [(&record.lon, &first.lon), (&record.lat, &first.lat), (&record.d2d, &first.d2d)]
                .iter()
                .any(|(a, b)| a[*i].to_bits() != b[*i].to_bits());
            if let Some(index) = (0..n).find(differs)
            {
                return Err(LirError::MismatchedGridCoordinates { variable: name.clone(), index });
            }
        }
        tracing::debug!(variables = records.len(), vertices = n, reference = %first_name, "assembled training grid");

        let points = (0..n).map(|i| [first.lon[i], first.lat[i], first.d2d[i]]).collect();
        let values = Array3::from_shape_fn((n, records.len(), NUM_COEFFICIENTS), |(i, d, k)|
        {
            records[d].coefficients()[k][i]
        });
        let variables = records.keys().cloned().collect();
        Self::new(points, CoefficientTensor { variables, values })
    }

    pub fn points(&self) -> &[Point3]
    {
        &self.points
    }

    pub fn tensor(&self) -> &CoefficientTensor
    {
        &self.tensor
    }

    pub fn into_tensor(self) -> CoefficientTensor
    {
        self.tensor
    }

    pub fn variables(&self) -> &[String]
    {
        &self.tensor.variables
    }

    pub fn len(&self) -> usize
    {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.points.is_empty()
    }
}
