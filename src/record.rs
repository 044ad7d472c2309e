//! Province record storage
//!
//! A [`Province`] is one classified geographic entity: identity, display-name
//! key, classification keys, economic scalars and map-rendering anchors.
//! Identity is immutable after construction; classification keys are only
//! changed through the store's mutation API so the hierarchy index stays
//! consistent. Everything else is plain data the owning editor mutates
//! directly.

use crate::{Area, Climate, Continent, Region, Terrain};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique province identifier, assigned at parse time or by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProvinceId(pub u32);

impl fmt::Display for ProvinceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixel coordinates of a map-rendering anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapPoint {
    pub x: i32,
    pub y: i32,
}

impl MapPoint {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are at the file format's default of 0.
    #[inline]
    pub fn is_default(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// A single province record.
///
/// Classification fields are read through accessors; the store's
/// `modify_area`/`modify_region`/`modify_continent` operations are the only
/// way to change them on a stored record. Climate and terrain are fixed at
/// construction (the editor replaces the record to change them).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Province {
    id: ProvinceId,
    /// Raw localization key, not the resolved display string.
    pub name: String,

    pub(crate) area: Area,
    pub(crate) region: Region,
    pub(crate) continent: Continent,
    pub(crate) climate: Climate,
    pub(crate) terrain: Terrain,

    pub infrastructure: f64,
    pub ic: f64,
    pub manpower: f64,
    pub oil: f64,
    pub metal: f64,
    pub energy: f64,
    pub rare_materials: f64,

    pub beaches: bool,
    pub port_allowed: bool,
    pub port_sea_zone: i32,

    pub city: MapPoint,
    pub army: MapPoint,
    pub port: MapPoint,
    pub beach: MapPoint,
    pub beach_icon: i32,
    pub fort: MapPoint,
    pub anti_air: MapPoint,
    pub counter: MapPoint,

    /// Fill polygon anchors. The file format carries no Y coordinate for the
    /// sixth point, so `fill[5].y` is always 0 and never written.
    pub fill: [MapPoint; 6],
}

impl Province {
    /// Create an empty record: sentinel classifications, zeroed scalars.
    pub fn new(id: ProvinceId) -> Self {
        Self {
            id,
            name: String::new(),
            area: Area::Unknown,
            region: Region::Unknown,
            continent: Continent::Unknown,
            climate: Climate::Unknown,
            terrain: Terrain::Unknown,
            infrastructure: 0.0,
            ic: 0.0,
            manpower: 0.0,
            oil: 0.0,
            metal: 0.0,
            energy: 0.0,
            rare_materials: 0.0,
            beaches: false,
            port_allowed: false,
            port_sea_zone: 0,
            city: MapPoint::default(),
            army: MapPoint::default(),
            port: MapPoint::default(),
            beach: MapPoint::default(),
            beach_icon: 0,
            fort: MapPoint::default(),
            anti_air: MapPoint::default(),
            counter: MapPoint::default(),
            fill: [MapPoint::default(); 6],
        }
    }

    /// Create a record with its classification keys set up front.
    pub fn classified(
        id: ProvinceId,
        area: Area,
        region: Region,
        continent: Continent,
        climate: Climate,
        terrain: Terrain,
    ) -> Self {
        let mut province = Self::new(id);
        province.area = area;
        province.region = region;
        province.continent = continent;
        province.climate = climate;
        province.terrain = terrain;
        province
    }

    #[inline]
    pub fn id(&self) -> ProvinceId {
        self.id
    }

    #[inline]
    pub fn area(&self) -> Area {
        self.area
    }

    #[inline]
    pub fn region(&self) -> Region {
        self.region
    }

    #[inline]
    pub fn continent(&self) -> Continent {
        self.continent
    }

    #[inline]
    pub fn climate(&self) -> Climate {
        self.climate
    }

    #[inline]
    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    /// True for sea-zone tiles.
    #[inline]
    pub fn is_ocean(&self) -> bool {
        self.terrain == Terrain::Ocean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let province = Province::new(ProvinceId(42));
        assert_eq!(province.id(), ProvinceId(42));
        assert_eq!(province.area(), Area::Unknown);
        assert_eq!(province.terrain(), Terrain::Unknown);
        assert_eq!(province.infrastructure, 0.0);
        assert!(!province.beaches);
        assert!(province.city.is_default());
        assert!(!province.is_ocean());
    }

    #[test]
    fn test_classified_constructor() {
        let province = Province::classified(
            ProvinceId(7),
            Area::NorthSea,
            Region::NorthAtlantic,
            Continent::Europe,
            Climate::Temperate,
            Terrain::Ocean,
        );
        assert_eq!(province.area(), Area::NorthSea);
        assert!(province.is_ocean());
    }

    #[test]
    fn test_map_point_default() {
        assert!(MapPoint::default().is_default());
        assert!(!MapPoint::new(3, 0).is_default());
    }
}
