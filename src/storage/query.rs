use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::LirError;
use crate::geometry::predicates::Point3;

///
/// Query locations for one region, in the provider's field naming.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord
{
    #[serde(rename = "Longitude")]
    pub longitude: Vec<f64>,
    #[serde(rename = "Latitude")]
    pub latitude: Vec<f64>,
    pub d2d: Vec<f64>,
}

impl QueryRecord
{
    fn check_lengths(&self, name: &str) -> Result<usize, LirError>
    {
        let m = self.longitude.len();
        if self.latitude.len() != m || self.d2d.len() != m
        {
            return Err(LirError::MalformedQuery
            {
                record: name.to_owned(),
                reason: format!("field lengths differ (Longitude {m}, Latitude {}, d2d {})", self.latitude.len(), self.d2d.len()),
            });
        }
        Ok(m)
    }
}

///
/// Validated query points `[lon, lat, d2d]`.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySet
{
    points: Vec<Point3>,
}

impl QuerySet
{
    pub fn new(points: Vec<Point3>) -> Self
    {
        Self { points }
    }

    pub fn from_record(name: &str, record: &QueryRecord) -> Result<Self, LirError>
    {
        let m = record.check_lengths(name)?;
        Ok(Self::new((0..m).map(|i| [record.longitude[i], record.latitude[i], record.d2d[i]]).collect()))
    }

    ///
    /// Points of a whole query mapping. Every record is checked; the first one supplies the
    /// coordinates.
    ///
    pub fn from_records(records: &IndexMap<String, QueryRecord>) -> Result<Self, LirError>
    {
        let Some((name, first)) = records.first() else
        {
            return Err(LirError::MalformedQuery { record: String::new(), reason: "no query records supplied".to_owned() });
        };
        for (other, record) in records.iter().skip(1)
        {
            record.check_lengths(other)?;
        }
        Self::from_record(name, first)
    }

    pub fn points(&self) -> &[Point3]
    {
        &self.points
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

impl From<Vec<Point3>> for QuerySet
{
    fn from(points: Vec<Point3>) -> Self
    {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn record(lon: &[f64], lat: &[f64], d2d: &[f64]) -> QueryRecord
    {
        QueryRecord { longitude: lon.to_vec(), latitude: lat.to_vec(), d2d: d2d.to_vec() }
    }

    #[test]
    fn first_record_supplies_points()
    {
        let mut records = IndexMap::new();
        records.insert("TA".to_owned(), record(&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]));
        records.insert("DIC".to_owned(), record(&[9.0], &[9.0], &[9.0]));
        let queries = QuerySet::from_records(&records).unwrap();
        assert_eq!(queries.points(), [[1.0, 3.0, 5.0], [2.0, 4.0, 6.0]]);
    }

    #[test]
    fn every_record_is_checked()
    {
        let mut records = IndexMap::new();
        records.insert("TA".to_owned(), record(&[1.0], &[3.0], &[5.0]));
        records.insert("DIC".to_owned(), record(&[1.0, 2.0], &[3.0], &[5.0]));
        match QuerySet::from_records(&records)
        {
            Err(LirError::MalformedQuery { record, .. }) => assert_eq!(record, "DIC"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_mapping_is_malformed()
    {
        assert!(matches!(QuerySet::from_records(&IndexMap::new()), Err(LirError::MalformedQuery { .. })));
    }

    #[test]
    fn zero_points_is_valid()
    {
        let queries = QuerySet::from_record("TA", &QueryRecord::default()).unwrap();
        assert!(queries.is_empty());
    }
}
