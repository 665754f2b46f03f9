//! Caller-supplied ward/district skeleton
//!
//! The skeleton carries names and identifiers only; generation attaches
//! geometry to it. District IDs belong to the caller and come back unchanged.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MapGenError, Result};

/// Opaque district identifier assigned by the caller
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistrictId(pub u32);

impl std::fmt::Display for DistrictId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DistrictId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A district before generation
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictSkeleton {
    pub id: DistrictId,
    pub name: String,
}

/// A ward before generation: an ordered list of districts
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardSkeleton {
    pub id: String,
    pub name: String,
    pub districts: Vec<DistrictSkeleton>,
}

impl WardSkeleton {
    /// Create a ward without districts
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            districts: Vec::new(),
        }
    }

    /// Append a district
    pub fn with_district(mut self, id: u32, name: impl Into<String>) -> Self {
        self.districts.push(DistrictSkeleton {
            id: DistrictId(id),
            name: name.into(),
        });
        self
    }
}

/// What the full pipeline should carve the land into
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WardLayout {
    /// Caller-owned wards; every ward receives exactly its own districts
    Skeleton(Vec<WardSkeleton>),
    /// Bare counts; wards are `ward-<i>` and districts are numbered from 0,
    /// grouped into wards by proximity alone
    Counts {
        num_wards: usize,
        num_districts: usize,
    },
}

impl WardLayout {
    /// `num_wards` wards of `districts_per_ward` districts, IDs counting from 1
    ///
    /// # Example
    ///
    /// ```
    /// use voronoi_city::{DistrictId, WardLayout};
    ///
    /// let layout = WardLayout::uniform(3, 2);
    /// assert_eq!(layout.ward_count(), 3);
    /// assert_eq!(layout.district_count(), 6);
    /// if let WardLayout::Skeleton(wards) = &layout {
    ///     assert_eq!(wards[2].districts[1].id, DistrictId(6));
    /// }
    /// ```
    pub fn uniform(num_wards: usize, districts_per_ward: usize) -> Self {
        let mut next = 1u32;
        let wards = (0..num_wards)
            .map(|w| {
                let mut ward = WardSkeleton::new(format!("ward-{}", w), format!("Ward {}", w + 1));
                for _ in 0..districts_per_ward {
                    ward = ward.with_district(next, format!("District {}", next));
                    next += 1;
                }
                ward
            })
            .collect();
        WardLayout::Skeleton(wards)
    }

    /// Number of wards requested
    pub fn ward_count(&self) -> usize {
        match self {
            WardLayout::Skeleton(wards) => wards.len(),
            WardLayout::Counts { num_wards, .. } => *num_wards,
        }
    }

    /// Number of districts requested across all wards
    pub fn district_count(&self) -> usize {
        match self {
            WardLayout::Skeleton(wards) => wards.iter().map(|w| w.districts.len()).sum(),
            WardLayout::Counts { num_districts, .. } => *num_districts,
        }
    }

    /// Reject layouts that cannot produce a map
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for zero wards, a ward without districts,
    /// duplicate ward or district IDs, or fewer districts than wards.
    pub fn validate(&self) -> Result<()> {
        match self {
            WardLayout::Skeleton(wards) => validate_wards(wards),
            WardLayout::Counts {
                num_wards,
                num_districts,
            } => {
                if *num_wards == 0 {
                    return Err(MapGenError::InvalidInput("no wards requested".to_string()));
                }
                if num_districts < num_wards {
                    return Err(MapGenError::InvalidInput(format!(
                        "{} districts cannot fill {} wards",
                        num_districts, num_wards
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Check a caller skeleton: at least one ward, no empty ward, unique IDs
pub(crate) fn validate_wards(wards: &[WardSkeleton]) -> Result<()> {
    if wards.is_empty() {
        return Err(MapGenError::InvalidInput("no wards requested".to_string()));
    }

    let mut ward_ids = HashSet::new();
    let mut district_ids = HashSet::new();
    for ward in wards {
        if !ward_ids.insert(ward.id.as_str()) {
            return Err(MapGenError::InvalidInput(format!(
                "duplicate ward id '{}'",
                ward.id
            )));
        }
        if ward.districts.is_empty() {
            return Err(MapGenError::InvalidInput(format!(
                "ward '{}' has no districts",
                ward.id
            )));
        }
        for district in &ward.districts {
            if !district_ids.insert(district.id) {
                return Err(MapGenError::InvalidInput(format!(
                    "duplicate district id {}",
                    district.id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        let layout = WardLayout::uniform(3, 2);
        assert!(layout.validate().is_ok());

        let WardLayout::Skeleton(wards) = layout else {
            panic!("uniform layout is a skeleton");
        };
        let ids: Vec<u32> = wards
            .iter()
            .flat_map(|w| w.districts.iter().map(|d| d.id.0))
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(wards[0].id, "ward-0");
    }

    #[test]
    fn test_validation_errors() {
        assert!(WardLayout::Skeleton(vec![]).validate().is_err());

        let empty_ward = WardLayout::Skeleton(vec![WardSkeleton::new("a", "A")]);
        assert!(empty_ward.validate().is_err());

        let duplicate_district = WardLayout::Skeleton(vec![
            WardSkeleton::new("a", "A").with_district(1, "One"),
            WardSkeleton::new("b", "B").with_district(1, "Also one"),
        ]);
        assert!(duplicate_district.validate().is_err());

        let duplicate_ward = WardLayout::Skeleton(vec![
            WardSkeleton::new("a", "A").with_district(1, "One"),
            WardSkeleton::new("a", "B").with_district(2, "Two"),
        ]);
        assert!(duplicate_ward.validate().is_err());

        let counts = WardLayout::Counts {
            num_wards: 4,
            num_districts: 3,
        };
        assert!(matches!(counts.validate(), Err(MapGenError::InvalidInput(_))));
        assert!(WardLayout::Counts {
            num_wards: 0,
            num_districts: 3
        }
        .validate()
        .is_err());
        assert!(WardLayout::Counts {
            num_wards: 2,
            num_districts: 8
        }
        .validate()
        .is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_skeleton_serialization() {
        let layout = WardLayout::uniform(2, 2);
        let json = serde_json::to_string(&layout).unwrap();
        let restored: WardLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(layout, restored);
        assert!(json.contains("\"id\":3"));
    }
}
