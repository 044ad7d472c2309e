//! ProvinceStore - ordered flat collection plus the hierarchy index
//!
//! This module provides the high-level API for holding province records,
//! mutating them through index-aware operations, and querying the derived
//! classification hierarchy.
//!
//! The store is single-writer: the owning editor mutates it from one thread
//! and the loader installs a freshly parsed collection under a write lock.
//! Mutations must not run while a load is in flight; that is a documented
//! precondition of the surrounding database object, not a lock enforced here.

use crate::index::{HierarchyIndex, sea_zone_eligible};
use crate::{
    Area, Continent, MultiMap, NameResolver, Province, ProvinceId, Region, Result, StoreError,
};
use std::collections::HashSet;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Summary counts over the store and its index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoreInfo {
    /// Number of records in the flat collection.
    pub province_count: usize,
    /// Number of ocean records with a resolvable display name.
    pub sea_zone_count: usize,
    /// Continents with at least one record.
    pub continent_count: usize,
    /// Regions with at least one record.
    pub region_count: usize,
    /// Areas with at least one record.
    pub area_count: usize,
    /// Whether there are unsaved changes.
    pub dirty: bool,
}

/// Ordered collection of province records with a live hierarchy index.
pub struct ProvinceStore {
    provinces: Vec<Province>,
    index: HierarchyIndex,
    resolver: Arc<dyn NameResolver>,
    dirty: bool,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ProvinceStore {
    /// Create an empty store. The resolver decides sea-zone membership for
    /// ocean records.
    pub fn new(resolver: Arc<dyn NameResolver>) -> Self {
        Self {
            provinces: Vec::new(),
            index: HierarchyIndex::new(),
            resolver,
            dirty: false,
        }
    }

    /// All records in flat-collection order.
    #[inline]
    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.provinces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: ProvinceId) -> Option<&Province> {
        self.position(id).map(|pos| &self.provinces[pos])
    }

    /// Append a record to the flat collection and index it.
    pub fn add(&mut self, province: Province) -> Result<()> {
        self.insert_at(self.provinces.len(), province)
    }

    /// Insert a record immediately after `anchor` and index it.
    pub fn insert_after(&mut self, anchor: ProvinceId, province: Province) -> Result<()> {
        let anchor_pos = self
            .position(anchor)
            .ok_or(StoreError::UnknownId(anchor))?;
        self.insert_at(anchor_pos + 1, province)
    }

    /// Remove a record, de-indexing it on every level.
    pub fn remove(&mut self, id: ProvinceId) -> Result<Province> {
        let pos = self.position(id).ok_or(StoreError::UnknownId(id))?;
        let province = self.provinces.remove(pos);
        self.index.unlink(
            province.continent(),
            province.region(),
            province.area(),
            id,
        );
        self.index.detach_sea_zone(id);
        self.dirty = true;
        tracing::debug!("removed province {} ({})", id, province.name);
        Ok(province)
    }

    /// Reposition a record immediately after `anchor` in the flat collection.
    /// Position is not a classification key, so the index is untouched.
    pub fn move_after(&mut self, id: ProvinceId, anchor: ProvinceId) -> Result<()> {
        if id == anchor {
            return Ok(());
        }
        let pos = self.position(id).ok_or(StoreError::UnknownId(id))?;
        let anchor_pos = self
            .position(anchor)
            .ok_or(StoreError::UnknownId(anchor))?;
        let province = self.provinces.remove(pos);
        // The removal shifts the anchor left when it sat past the source.
        let target = if pos < anchor_pos {
            anchor_pos
        } else {
            anchor_pos + 1
        };
        self.provinces.insert(target, province);
        self.dirty = true;
        Ok(())
    }

    /// Reclassify a record into another area.
    pub fn modify_area(&mut self, id: ProvinceId, area: Area) -> Result<()> {
        let pos = self.position(id).ok_or(StoreError::UnknownId(id))?;
        let (region, old_area) = {
            let province = &self.provinces[pos];
            (province.region(), province.area())
        };
        if old_area == area {
            return Ok(());
        }
        // Detach under the old key before overwriting it.
        self.index.relink_area(id, region, old_area, area);
        self.provinces[pos].area = area;
        self.dirty = true;
        Ok(())
    }

    /// Reclassify a record into another region.
    pub fn modify_region(&mut self, id: ProvinceId, region: Region) -> Result<()> {
        let pos = self.position(id).ok_or(StoreError::UnknownId(id))?;
        let (continent, old_region, area) = {
            let province = &self.provinces[pos];
            (province.continent(), province.region(), province.area())
        };
        if old_region == region {
            return Ok(());
        }
        self.index.relink_region(continent, area, old_region, region);
        self.provinces[pos].region = region;
        self.dirty = true;
        Ok(())
    }

    /// Reclassify a record into another continent.
    pub fn modify_continent(&mut self, id: ProvinceId, continent: Continent) -> Result<()> {
        let pos = self.position(id).ok_or(StoreError::UnknownId(id))?;
        let (old_continent, region) = {
            let province = &self.provinces[pos];
            (province.continent(), province.region())
        };
        if old_continent == continent {
            return Ok(());
        }
        self.index.relink_continent(region, old_continent, continent);
        self.provinces[pos].continent = continent;
        self.dirty = true;
        Ok(())
    }

    /// Rebuild the whole index from the flat collection. Equivalent to
    /// replaying every historical mutation, but one pass of attaches.
    pub fn rebuild_index(&mut self) {
        #[cfg(feature = "profiling")]
        profiling::scope!("store::rebuild_index");
        self.index = HierarchyIndex::build(&self.provinces, self.resolver.as_ref());
    }

    /// Replace the whole collection with freshly loaded records and rebuild
    /// the index. Clears the dirty flag: the new content matches the file.
    pub(crate) fn install(&mut self, provinces: Vec<Province>) {
        self.provinces = provinces;
        self.rebuild_index();
        self.dirty = false;
    }

    /// Drop every record and the whole index.
    pub fn clear(&mut self) {
        self.provinces.clear();
        self.index.clear();
        self.dirty = false;
    }

    /// Regions with at least one record on the given continent.
    #[inline]
    pub fn regions_of(&self, continent: Continent) -> Option<&HashSet<Region>> {
        self.index.regions_by_continent().get(continent)
    }

    /// Areas with at least one record in the given region.
    #[inline]
    pub fn areas_of(&self, region: Region) -> Option<&HashSet<Area>> {
        self.index.areas_by_region().get(region)
    }

    /// Records classified into the given area.
    #[inline]
    pub fn provinces_of(&self, area: Area) -> Option<&HashSet<ProvinceId>> {
        self.index.provinces_by_area().get(area)
    }

    /// Continents that currently have records.
    pub fn continents(&self) -> impl Iterator<Item = Continent> {
        self.index.regions_by_continent().keys()
    }

    /// Ocean records with a resolvable display name, in attach order.
    #[inline]
    pub fn sea_zones(&self) -> &[ProvinceId] {
        self.index.sea_zones()
    }

    /// Summary counts; all O(1) over the maintained index.
    pub fn info(&self) -> StoreInfo {
        StoreInfo {
            province_count: self.provinces.len(),
            sea_zone_count: self.index.sea_zones().len(),
            continent_count: self.index.regions_by_continent().len(),
            region_count: self.index.areas_by_region().len(),
            area_count: self.index.provinces_by_area().len(),
            dirty: self.dirty,
        }
    }

    /// Whether there are unsaved changes.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag unsaved changes. Field edits made directly on records go through
    /// here; classification mutations flag it themselves.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[cfg(test)]
    pub(crate) fn index(&self) -> &HierarchyIndex {
        &self.index
    }

    #[cfg(test)]
    pub(crate) fn resolver(&self) -> &Arc<dyn NameResolver> {
        &self.resolver
    }

    fn position(&self, id: ProvinceId) -> Option<usize> {
        self.provinces.iter().position(|p| p.id() == id)
    }

    fn insert_at(&mut self, pos: usize, province: Province) -> Result<()> {
        let id = province.id();
        if self.position(id).is_some() {
            return Err(StoreError::DuplicateId(id));
        }
        self.index.link(
            province.continent(),
            province.region(),
            province.area(),
            id,
        );
        if sea_zone_eligible(self.resolver.as_ref(), &province) {
            self.index.attach_sea_zone(id);
        }
        self.provinces.insert(pos, province);
        self.dirty = true;
        Ok(())
    }
}

/// Multi-map views over the index, exposed for read-only enumeration.
impl ProvinceStore {
    /// The continent-to-regions map.
    #[inline]
    pub fn continent_map(&self) -> &MultiMap<Continent, Region> {
        self.index.regions_by_continent()
    }

    /// The region-to-areas map.
    #[inline]
    pub fn region_map(&self) -> &MultiMap<Region, Area> {
        self.index.areas_by_region()
    }

    /// The area-to-provinces map.
    #[inline]
    pub fn area_map(&self) -> &MultiMap<Area, ProvinceId> {
        self.index.provinces_by_area()
    }
}
