//! Hierarchy index over the flat province collection
//!
//! Three derived multi-maps (continent to regions, region to areas, area to
//! provinces) plus the sea-zone list. The index is a cache: at every
//! quiescent point it equals what [`HierarchyIndex::build`] would produce
//! from the flat collection. Mutations keep it consistent incrementally; a
//! full rebuild only happens after a fresh load.
//!
//! The two upper levels aggregate per-record assignments, so a link like
//! `region -> area` exists as long as at least one record carries that
//! (region, area) pair. Links are reference-counted per pair to keep every
//! operation O(1) amortized: the map-level detach fires only when the last
//! contributing record goes away. Nothing forces the result to be a strict
//! tree; records that disagree simply put one region under two continents,
//! mirroring source data that is not always internally consistent.

use crate::{Area, Continent, MultiMap, NameResolver, Province, ProvinceId, Region};
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Default)]
pub(crate) struct HierarchyIndex {
    regions_by_continent: MultiMap<Continent, Region>,
    areas_by_region: MultiMap<Region, Area>,
    provinces_by_area: MultiMap<Area, ProvinceId>,
    /// Records carrying each (region, area) pair; backs `areas_by_region`.
    region_links: HashMap<(Region, Area), usize>,
    /// Records carrying each (continent, region) pair; backs `regions_by_continent`.
    continent_links: HashMap<(Continent, Region), usize>,
    /// Ocean provinces whose name key resolves to non-empty display text,
    /// in attach order.
    sea_zones: Vec<ProvinceId>,
}

impl HierarchyIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Build the index from scratch: one pass of attaches over the flat
    /// collection. Used after a load, and by tests as the equivalence oracle.
    pub(crate) fn build(provinces: &[Province], resolver: &dyn NameResolver) -> Self {
        let mut index = Self::new();
        for province in provinces {
            index.link(
                province.continent(),
                province.region(),
                province.area(),
                province.id(),
            );
            if sea_zone_eligible(resolver, province) {
                index.attach_sea_zone(province.id());
            }
        }
        index
    }

    pub(crate) fn clear(&mut self) {
        self.regions_by_continent.clear();
        self.areas_by_region.clear();
        self.provinces_by_area.clear();
        self.region_links.clear();
        self.continent_links.clear();
        self.sea_zones.clear();
    }

    /// Register one record's classification keys on all three levels.
    pub(crate) fn link(
        &mut self,
        continent: Continent,
        region: Region,
        area: Area,
        id: ProvinceId,
    ) {
        self.provinces_by_area.attach(area, id);
        acquire(
            &mut self.region_links,
            &mut self.areas_by_region,
            region,
            area,
        );
        acquire(
            &mut self.continent_links,
            &mut self.regions_by_continent,
            continent,
            region,
        );
    }

    /// Remove one record's classification keys from all three levels.
    pub(crate) fn unlink(
        &mut self,
        continent: Continent,
        region: Region,
        area: Area,
        id: ProvinceId,
    ) {
        self.provinces_by_area.detach(area, id);
        release(
            &mut self.region_links,
            &mut self.areas_by_region,
            region,
            area,
        );
        release(
            &mut self.continent_links,
            &mut self.regions_by_continent,
            continent,
            region,
        );
    }

    /// Move a record between areas. Detaches the old pair before the caller
    /// overwrites the record's key.
    pub(crate) fn relink_area(
        &mut self,
        id: ProvinceId,
        region: Region,
        old_area: Area,
        new_area: Area,
    ) {
        self.provinces_by_area.detach(old_area, id);
        release(
            &mut self.region_links,
            &mut self.areas_by_region,
            region,
            old_area,
        );
        self.provinces_by_area.attach(new_area, id);
        acquire(
            &mut self.region_links,
            &mut self.areas_by_region,
            region,
            new_area,
        );
    }

    /// Move a record between regions, one level up from [`Self::relink_area`].
    pub(crate) fn relink_region(
        &mut self,
        continent: Continent,
        area: Area,
        old_region: Region,
        new_region: Region,
    ) {
        release(
            &mut self.region_links,
            &mut self.areas_by_region,
            old_region,
            area,
        );
        release(
            &mut self.continent_links,
            &mut self.regions_by_continent,
            continent,
            old_region,
        );
        acquire(
            &mut self.region_links,
            &mut self.areas_by_region,
            new_region,
            area,
        );
        acquire(
            &mut self.continent_links,
            &mut self.regions_by_continent,
            continent,
            new_region,
        );
    }

    /// Move a record between continents.
    pub(crate) fn relink_continent(
        &mut self,
        region: Region,
        old_continent: Continent,
        new_continent: Continent,
    ) {
        release(
            &mut self.continent_links,
            &mut self.regions_by_continent,
            old_continent,
            region,
        );
        acquire(
            &mut self.continent_links,
            &mut self.regions_by_continent,
            new_continent,
            region,
        );
    }

    pub(crate) fn attach_sea_zone(&mut self, id: ProvinceId) {
        if !self.sea_zones.contains(&id) {
            self.sea_zones.push(id);
        }
    }

    pub(crate) fn detach_sea_zone(&mut self, id: ProvinceId) {
        self.sea_zones.retain(|entry| *entry != id);
    }

    #[inline]
    pub(crate) fn regions_by_continent(&self) -> &MultiMap<Continent, Region> {
        &self.regions_by_continent
    }

    #[inline]
    pub(crate) fn areas_by_region(&self) -> &MultiMap<Region, Area> {
        &self.areas_by_region
    }

    #[inline]
    pub(crate) fn provinces_by_area(&self) -> &MultiMap<Area, ProvinceId> {
        &self.provinces_by_area
    }

    #[inline]
    pub(crate) fn sea_zones(&self) -> &[ProvinceId] {
        &self.sea_zones
    }

    /// Structural equality against another index. The sea-zone list is
    /// compared as a set: incremental maintenance appends, a rebuild follows
    /// flat-collection order, and only membership is meaningful.
    pub(crate) fn equivalent(&self, other: &Self) -> bool {
        use std::collections::HashSet;
        let sea: HashSet<ProvinceId> = self.sea_zones.iter().copied().collect();
        let other_sea: HashSet<ProvinceId> = other.sea_zones.iter().copied().collect();
        self.regions_by_continent == other.regions_by_continent
            && self.areas_by_region == other.areas_by_region
            && self.provinces_by_area == other.provinces_by_area
            && sea == other_sea
    }
}

/// Sea-zone membership rule: ocean terrain and a name key that resolves to
/// non-empty display text.
pub(crate) fn sea_zone_eligible(resolver: &dyn NameResolver, province: &Province) -> bool {
    province.is_ocean()
        && resolver
            .resolve(&province.name)
            .is_some_and(|text| !text.is_empty())
}

/// Count one more record carrying the (key, value) pair; attach the map link
/// when the pair first appears.
fn acquire<K, V>(counts: &mut HashMap<(K, V), usize>, map: &mut MultiMap<K, V>, key: K, value: V)
where
    K: Copy + Eq + Hash,
    V: Copy + Eq + Hash,
{
    let count = counts.entry((key, value)).or_insert(0);
    *count += 1;
    if *count == 1 {
        map.attach(key, value);
    }
}

/// Count one fewer record carrying the (key, value) pair; detach the map
/// link when the last one goes away.
fn release<K, V>(counts: &mut HashMap<(K, V), usize>, map: &mut MultiMap<K, V>, key: K, value: V)
where
    K: Copy + Eq + Hash,
    V: Copy + Eq + Hash,
{
    match counts.get_mut(&(key, value)) {
        Some(count) if *count > 1 => *count -= 1,
        Some(_) => {
            counts.remove(&(key, value));
            map.detach(key, value);
        }
        None => debug_assert!(false, "released a hierarchy link that was never acquired"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Climate, Terrain};
    use crate::text::StaticResolver;

    fn land(id: u32, area: Area, region: Region, continent: Continent) -> Province {
        Province::classified(
            ProvinceId(id),
            area,
            region,
            continent,
            Climate::Temperate,
            Terrain::Plains,
        )
    }

    #[test]
    fn test_link_and_unlink_roundtrip() {
        let mut index = HierarchyIndex::new();
        index.link(
            Continent::Europe,
            Region::WesternEurope,
            Area::NorthernFrance,
            ProvinceId(1),
        );
        assert!(
            index
                .provinces_by_area()
                .contains(Area::NorthernFrance, ProvinceId(1))
        );
        assert!(
            index
                .areas_by_region()
                .contains(Region::WesternEurope, Area::NorthernFrance)
        );
        assert!(
            index
                .regions_by_continent()
                .contains(Continent::Europe, Region::WesternEurope)
        );

        index.unlink(
            Continent::Europe,
            Region::WesternEurope,
            Area::NorthernFrance,
            ProvinceId(1),
        );
        assert!(index.provinces_by_area().is_empty());
        assert!(index.areas_by_region().is_empty());
        assert!(index.regions_by_continent().is_empty());
    }

    #[test]
    fn test_shared_link_survives_one_departure() {
        // Two records share (Western Europe, Northern France); moving one
        // away must not drop the link the other still contributes.
        let mut index = HierarchyIndex::new();
        index.link(
            Continent::Europe,
            Region::WesternEurope,
            Area::NorthernFrance,
            ProvinceId(1),
        );
        index.link(
            Continent::Europe,
            Region::WesternEurope,
            Area::NorthernFrance,
            ProvinceId(2),
        );

        index.relink_area(
            ProvinceId(1),
            Region::WesternEurope,
            Area::NorthernFrance,
            Area::SouthernFrance,
        );

        assert!(
            index
                .areas_by_region()
                .contains(Region::WesternEurope, Area::NorthernFrance)
        );
        assert!(
            index
                .areas_by_region()
                .contains(Region::WesternEurope, Area::SouthernFrance)
        );
        assert!(
            index
                .provinces_by_area()
                .contains(Area::SouthernFrance, ProvinceId(1))
        );
        assert!(
            index
                .provinces_by_area()
                .contains(Area::NorthernFrance, ProvinceId(2))
        );
    }

    #[test]
    fn test_disagreeing_records_are_aggregated_not_canonicalized() {
        // One region under two continents at once; the index keeps both.
        let mut index = HierarchyIndex::new();
        index.link(
            Continent::Europe,
            Region::MiddleEast,
            Area::Anatolia,
            ProvinceId(1),
        );
        index.link(
            Continent::Asia,
            Region::MiddleEast,
            Area::Levant,
            ProvinceId(2),
        );
        assert!(
            index
                .regions_by_continent()
                .contains(Continent::Europe, Region::MiddleEast)
        );
        assert!(
            index
                .regions_by_continent()
                .contains(Continent::Asia, Region::MiddleEast)
        );
    }

    #[test]
    fn test_build_matches_manual_links() {
        let provinces = vec![
            land(1, Area::Poland, Region::EasternEurope, Continent::Europe),
            land(2, Area::Poland, Region::EasternEurope, Continent::Europe),
            land(3, Area::Bohemia, Region::CentralEurope, Continent::Europe),
        ];
        let resolver = StaticResolver::new();
        let built = HierarchyIndex::build(&provinces, &resolver);

        let mut manual = HierarchyIndex::new();
        for province in &provinces {
            manual.link(
                province.continent(),
                province.region(),
                province.area(),
                province.id(),
            );
        }
        assert!(built.equivalent(&manual));
    }

    #[test]
    fn test_sea_zone_membership_requires_resolvable_name() {
        let resolver = StaticResolver::with_entries([("SEA_NORTH", "North Sea"), ("SEA_MUTE", "")]);

        let mut named = Province::classified(
            ProvinceId(10),
            Area::NorthSea,
            Region::NorthAtlantic,
            Continent::Europe,
            Climate::Temperate,
            Terrain::Ocean,
        );
        named.name = "SEA_NORTH".to_string();
        assert!(sea_zone_eligible(&resolver, &named));

        let mut muted = named.clone();
        muted.name = "SEA_MUTE".to_string();
        assert!(!sea_zone_eligible(&resolver, &muted));

        let mut unmapped = named.clone();
        unmapped.name = "SEA_UNKNOWN".to_string();
        assert!(!sea_zone_eligible(&resolver, &unmapped));

        let mut land = named.clone();
        land.terrain = Terrain::Plains;
        assert!(!sea_zone_eligible(&resolver, &land));
    }

    #[test]
    fn test_sea_zone_attach_is_idempotent() {
        let mut index = HierarchyIndex::new();
        index.attach_sea_zone(ProvinceId(5));
        index.attach_sea_zone(ProvinceId(5));
        assert_eq!(index.sea_zones(), &[ProvinceId(5)]);
        index.detach_sea_zone(ProvinceId(5));
        assert!(index.sea_zones().is_empty());
    }
}
