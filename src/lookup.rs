use crate::types::Dataset;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;

// Wrapper for RTree indexing
struct AreaIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for AreaIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Record under a map coordinate, as a table row index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedArea {
    pub index: usize,
    pub id: Option<String>,
}

pub struct AreaLookup<'a> {
    dataset: &'a Dataset,
    tree: RTree<AreaIndex>,
}

impl<'a> AreaLookup<'a> {
    pub fn build(dataset: &'a Dataset) -> Self {
        let items: Vec<AreaIndex> = dataset
            .records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let rect = record.geometry.as_ref()?.bounding_rect()?;
                Some(AreaIndex {
                    index,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        AreaLookup {
            dataset,
            tree: RTree::bulk_load(items),
        }
    }

    /// Lowest-index record whose polygon contains the point.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<LocatedArea> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|candidate| {
                self.dataset.records[candidate.index]
                    .geometry
                    .as_ref()
                    .is_some_and(|geometry| geometry.contains(&point))
            })
            .map(|candidate| candidate.index)
            .min()
            .map(|index| LocatedArea {
                index,
                id: self.dataset.records[index].id.clone(),
            })
    }
}
