//! Classification catalogs for province records
//!
//! Five closed enumerations classify every province: continent, region, area,
//! climate and terrain. Each has an `Unknown` sentinel that unresolved source
//! tokens degrade to. The area and region sets exist in two variants (the
//! legacy game and its extended successor) selected by the active [`Ruleset`];
//! the other three sets are identical in both.
//!
//! Catalogs are built once, before any file is loaded, and expose a pure
//! case-insensitive name-to-id lookup.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Target game version. Selects the active area/region catalog variant and
/// the province file layout written by the saver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Ruleset {
    /// The original game: smaller area/region sets, truncating file layout.
    #[default]
    Legacy,
    /// The extended successor: additional areas/regions, full-width file layout.
    Extended,
}

/// Continent of a province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Continent {
    #[default]
    Unknown,
    Europe,
    NorthAmerica,
    SouthAmerica,
    Asia,
    Africa,
    Oceania,
}

impl Continent {
    /// Every continent, in file order. Excludes the sentinel.
    pub const ALL: [Continent; 6] = [
        Continent::Europe,
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Asia,
        Continent::Africa,
        Continent::Oceania,
    ];

    /// Canonical spelling used in province files and localization keys.
    /// The sentinel serializes as an empty field.
    pub fn key(self) -> &'static str {
        match self {
            Continent::Unknown => "",
            Continent::Europe => "Europe",
            Continent::NorthAmerica => "North America",
            Continent::SouthAmerica => "South America",
            Continent::Asia => "Asia",
            Continent::Africa => "Africa",
            Continent::Oceania => "Oceania",
        }
    }
}

/// Climate of a province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Climate {
    #[default]
    Unknown,
    Arctic,
    Subarctic,
    Temperate,
    Muddy,
    Mediterranean,
    Subtropical,
    Tropical,
    Arid,
}

impl Climate {
    /// Every climate, in file order. Excludes the sentinel.
    pub const ALL: [Climate; 8] = [
        Climate::Arctic,
        Climate::Subarctic,
        Climate::Temperate,
        Climate::Muddy,
        Climate::Mediterranean,
        Climate::Subtropical,
        Climate::Tropical,
        Climate::Arid,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Climate::Unknown => "",
            Climate::Arctic => "Arctic",
            Climate::Subarctic => "Subarctic",
            Climate::Temperate => "Temperate",
            Climate::Muddy => "Muddy",
            Climate::Mediterranean => "Mediterranean",
            Climate::Subtropical => "Subtropical",
            Climate::Tropical => "Tropical",
            Climate::Arid => "Arid",
        }
    }
}

/// Terrain of a province. `Ocean` marks sea-zone tiles, which suppress
/// land-only fields in the legacy file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Terrain {
    #[default]
    Unknown,
    Plains,
    Forest,
    Hills,
    Mountain,
    Desert,
    Marsh,
    Jungle,
    Urban,
    River,
    Ocean,
}

impl Terrain {
    /// Every terrain, in file order. Excludes the sentinel.
    pub const ALL: [Terrain; 10] = [
        Terrain::Plains,
        Terrain::Forest,
        Terrain::Hills,
        Terrain::Mountain,
        Terrain::Desert,
        Terrain::Marsh,
        Terrain::Jungle,
        Terrain::Urban,
        Terrain::River,
        Terrain::Ocean,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Terrain::Unknown => "",
            Terrain::Plains => "Plains",
            Terrain::Forest => "Forest",
            Terrain::Hills => "Hills",
            Terrain::Mountain => "Mountain",
            Terrain::Desert => "Desert",
            Terrain::Marsh => "Marsh",
            Terrain::Jungle => "Jungle",
            Terrain::Urban => "Urban",
            Terrain::River => "River",
            Terrain::Ocean => "Ocean",
        }
    }
}

/// Mid-level classification between continent and area.
///
/// The enum is the union of both ruleset variants; [`Region::members`] yields
/// the set that is actually valid under a given ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Region {
    #[default]
    Unknown,
    BritishIsles,
    WesternEurope,
    CentralEurope,
    EasternEurope,
    Scandinavia,
    Iberia,
    Italy,
    Balkans,
    NorthAfrica,
    WestAfrica,
    EastAfrica,
    SouthernAfrica,
    MiddleEast,
    CentralAsia,
    SouthAsia,
    EastAsia,
    SoutheastAsia,
    EasternSeaboard,
    WesternSeaboard,
    Caribbean,
    Amazonia,
    SouthernCone,
    Australasia,
    NorthAtlantic,
    SouthAtlantic,
    IndianOcean,
    WesternPacific,
    EasternPacific,
    // Extended ruleset only.
    ArcticOcean,
    Siberia,
    CentralAmerica,
    Micronesia,
}

impl Region {
    /// Regions present in both ruleset variants, in file order.
    pub const LEGACY: &'static [Region] = &[
        Region::BritishIsles,
        Region::WesternEurope,
        Region::CentralEurope,
        Region::EasternEurope,
        Region::Scandinavia,
        Region::Iberia,
        Region::Italy,
        Region::Balkans,
        Region::NorthAfrica,
        Region::WestAfrica,
        Region::EastAfrica,
        Region::SouthernAfrica,
        Region::MiddleEast,
        Region::CentralAsia,
        Region::SouthAsia,
        Region::EastAsia,
        Region::SoutheastAsia,
        Region::EasternSeaboard,
        Region::WesternSeaboard,
        Region::Caribbean,
        Region::Amazonia,
        Region::SouthernCone,
        Region::Australasia,
        Region::NorthAtlantic,
        Region::SouthAtlantic,
        Region::IndianOcean,
        Region::WesternPacific,
        Region::EasternPacific,
    ];

    /// Regions introduced by the extended ruleset.
    pub const EXTENDED_ONLY: &'static [Region] = &[
        Region::ArcticOcean,
        Region::Siberia,
        Region::CentralAmerica,
        Region::Micronesia,
    ];

    /// Regions valid under the given ruleset.
    pub fn members(ruleset: Ruleset) -> impl Iterator<Item = Region> {
        let extra: &[Region] = match ruleset {
            Ruleset::Legacy => &[],
            Ruleset::Extended => Region::EXTENDED_ONLY,
        };
        Region::LEGACY.iter().chain(extra.iter()).copied()
    }

    pub fn key(self) -> &'static str {
        match self {
            Region::Unknown => "",
            Region::BritishIsles => "British Isles",
            Region::WesternEurope => "Western Europe",
            Region::CentralEurope => "Central Europe",
            Region::EasternEurope => "Eastern Europe",
            Region::Scandinavia => "Scandinavia",
            Region::Iberia => "Iberia",
            Region::Italy => "Italy",
            Region::Balkans => "Balkans",
            Region::NorthAfrica => "North Africa",
            Region::WestAfrica => "West Africa",
            Region::EastAfrica => "East Africa",
            Region::SouthernAfrica => "Southern Africa",
            Region::MiddleEast => "Middle East",
            Region::CentralAsia => "Central Asia",
            Region::SouthAsia => "South Asia",
            Region::EastAsia => "East Asia",
            Region::SoutheastAsia => "Southeast Asia",
            Region::EasternSeaboard => "Eastern Seaboard",
            Region::WesternSeaboard => "Western Seaboard",
            Region::Caribbean => "Caribbean",
            Region::Amazonia => "Amazonia",
            Region::SouthernCone => "Southern Cone",
            Region::Australasia => "Australasia",
            Region::NorthAtlantic => "North Atlantic",
            Region::SouthAtlantic => "South Atlantic",
            Region::IndianOcean => "Indian Ocean",
            Region::WesternPacific => "Western Pacific",
            Region::EasternPacific => "Eastern Pacific",
            Region::ArcticOcean => "Arctic Ocean",
            Region::Siberia => "Siberia",
            Region::CentralAmerica => "Central America",
            Region::Micronesia => "Micronesia",
        }
    }
}

/// Finest classification level; provinces group directly under areas.
///
/// Like [`Region`], the enum is the union of both ruleset variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Area {
    #[default]
    Unknown,
    SouthernEngland,
    NorthernEngland,
    Scotland,
    Ireland,
    NorthernFrance,
    SouthernFrance,
    LowCountries,
    Rhineland,
    NorthernGermany,
    SouthernGermany,
    Bohemia,
    Poland,
    BalticStates,
    Ukraine,
    CentralRussia,
    NorthernItaly,
    SouthernItaly,
    NorthernSpain,
    SouthernSpain,
    Portugal,
    Norway,
    Sweden,
    Finland,
    Denmark,
    Hungary,
    Romania,
    Bulgaria,
    Greece,
    Anatolia,
    Morocco,
    Algeria,
    Libya,
    Egypt,
    Levant,
    Mesopotamia,
    Persia,
    Arabia,
    GoldCoast,
    HornOfAfrica,
    SouthAfrica,
    Turkestan,
    Afghanistan,
    NorthernIndia,
    SouthernIndia,
    Burma,
    Indochina,
    Malaya,
    NorthChina,
    SouthChina,
    Manchuria,
    Korea,
    Japan,
    NewEngland,
    GreatLakes,
    California,
    Mexico,
    Brazil,
    RioDeLaPlata,
    EasternAustralia,
    NewZealand,
    NorthSea,
    EnglishChannel,
    BayOfBiscay,
    WesternMediterranean,
    EasternMediterranean,
    BalticSea,
    NorwegianSea,
    CentralAtlantic,
    ArabianSea,
    SouthChinaSea,
    // Extended ruleset only.
    Svalbard,
    Transjordan,
    Sinkiang,
    Mongolia,
    PacificIslands,
    Patagonia,
}

impl Area {
    /// Areas present in both ruleset variants, in file order.
    pub const LEGACY: &'static [Area] = &[
        Area::SouthernEngland,
        Area::NorthernEngland,
        Area::Scotland,
        Area::Ireland,
        Area::NorthernFrance,
        Area::SouthernFrance,
        Area::LowCountries,
        Area::Rhineland,
        Area::NorthernGermany,
        Area::SouthernGermany,
        Area::Bohemia,
        Area::Poland,
        Area::BalticStates,
        Area::Ukraine,
        Area::CentralRussia,
        Area::NorthernItaly,
        Area::SouthernItaly,
        Area::NorthernSpain,
        Area::SouthernSpain,
        Area::Portugal,
        Area::Norway,
        Area::Sweden,
        Area::Finland,
        Area::Denmark,
        Area::Hungary,
        Area::Romania,
        Area::Bulgaria,
        Area::Greece,
        Area::Anatolia,
        Area::Morocco,
        Area::Algeria,
        Area::Libya,
        Area::Egypt,
        Area::Levant,
        Area::Mesopotamia,
        Area::Persia,
        Area::Arabia,
        Area::GoldCoast,
        Area::HornOfAfrica,
        Area::SouthAfrica,
        Area::Turkestan,
        Area::Afghanistan,
        Area::NorthernIndia,
        Area::SouthernIndia,
        Area::Burma,
        Area::Indochina,
        Area::Malaya,
        Area::NorthChina,
        Area::SouthChina,
        Area::Manchuria,
        Area::Korea,
        Area::Japan,
        Area::NewEngland,
        Area::GreatLakes,
        Area::California,
        Area::Mexico,
        Area::Brazil,
        Area::RioDeLaPlata,
        Area::EasternAustralia,
        Area::NewZealand,
        Area::NorthSea,
        Area::EnglishChannel,
        Area::BayOfBiscay,
        Area::WesternMediterranean,
        Area::EasternMediterranean,
        Area::BalticSea,
        Area::NorwegianSea,
        Area::CentralAtlantic,
        Area::ArabianSea,
        Area::SouthChinaSea,
    ];

    /// Areas introduced by the extended ruleset.
    pub const EXTENDED_ONLY: &'static [Area] = &[
        Area::Svalbard,
        Area::Transjordan,
        Area::Sinkiang,
        Area::Mongolia,
        Area::PacificIslands,
        Area::Patagonia,
    ];

    /// Areas valid under the given ruleset.
    pub fn members(ruleset: Ruleset) -> impl Iterator<Item = Area> {
        let extra: &[Area] = match ruleset {
            Ruleset::Legacy => &[],
            Ruleset::Extended => Area::EXTENDED_ONLY,
        };
        Area::LEGACY.iter().chain(extra.iter()).copied()
    }

    pub fn key(self) -> &'static str {
        match self {
            Area::Unknown => "",
            Area::SouthernEngland => "Southern England",
            Area::NorthernEngland => "Northern England",
            Area::Scotland => "Scotland",
            Area::Ireland => "Ireland",
            Area::NorthernFrance => "Northern France",
            Area::SouthernFrance => "Southern France",
            Area::LowCountries => "Low Countries",
            Area::Rhineland => "Rhineland",
            Area::NorthernGermany => "Northern Germany",
            Area::SouthernGermany => "Southern Germany",
            Area::Bohemia => "Bohemia",
            Area::Poland => "Poland",
            Area::BalticStates => "Baltic States",
            Area::Ukraine => "Ukraine",
            Area::CentralRussia => "Central Russia",
            Area::NorthernItaly => "Northern Italy",
            Area::SouthernItaly => "Southern Italy",
            Area::NorthernSpain => "Northern Spain",
            Area::SouthernSpain => "Southern Spain",
            Area::Portugal => "Portugal",
            Area::Norway => "Norway",
            Area::Sweden => "Sweden",
            Area::Finland => "Finland",
            Area::Denmark => "Denmark",
            Area::Hungary => "Hungary",
            Area::Romania => "Romania",
            Area::Bulgaria => "Bulgaria",
            Area::Greece => "Greece",
            Area::Anatolia => "Anatolia",
            Area::Morocco => "Morocco",
            Area::Algeria => "Algeria",
            Area::Libya => "Libya",
            Area::Egypt => "Egypt",
            Area::Levant => "Levant",
            Area::Mesopotamia => "Mesopotamia",
            Area::Persia => "Persia",
            Area::Arabia => "Arabia",
            Area::GoldCoast => "Gold Coast",
            Area::HornOfAfrica => "Horn of Africa",
            Area::SouthAfrica => "South Africa",
            Area::Turkestan => "Turkestan",
            Area::Afghanistan => "Afghanistan",
            Area::NorthernIndia => "Northern India",
            Area::SouthernIndia => "Southern India",
            Area::Burma => "Burma",
            Area::Indochina => "Indochina",
            Area::Malaya => "Malaya",
            Area::NorthChina => "North China",
            Area::SouthChina => "South China",
            Area::Manchuria => "Manchuria",
            Area::Korea => "Korea",
            Area::Japan => "Japan",
            Area::NewEngland => "New England",
            Area::GreatLakes => "Great Lakes",
            Area::California => "California",
            Area::Mexico => "Mexico",
            Area::Brazil => "Brazil",
            Area::RioDeLaPlata => "Rio de la Plata",
            Area::EasternAustralia => "Eastern Australia",
            Area::NewZealand => "New Zealand",
            Area::NorthSea => "North Sea",
            Area::EnglishChannel => "English Channel",
            Area::BayOfBiscay => "Bay of Biscay",
            Area::WesternMediterranean => "Western Mediterranean",
            Area::EasternMediterranean => "Eastern Mediterranean",
            Area::BalticSea => "Baltic Sea",
            Area::NorwegianSea => "Norwegian Sea",
            Area::CentralAtlantic => "Central Atlantic",
            Area::ArabianSea => "Arabian Sea",
            Area::SouthChinaSea => "South China Sea",
            Area::Svalbard => "Svalbard",
            Area::Transjordan => "Transjordan",
            Area::Sinkiang => "Sinkiang",
            Area::Mongolia => "Mongolia",
            Area::PacificIslands => "Pacific Islands",
            Area::Patagonia => "Patagonia",
        }
    }
}

/// Case-insensitive name-to-id lookup table for one classification set.
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    by_name: HashMap<String, T>,
}

impl<T: Copy> Catalog<T> {
    fn from_members<I>(members: I, key: fn(T) -> &'static str) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let by_name = members
            .into_iter()
            .map(|id| (normalize(key(id)), id))
            .collect();
        Self { by_name }
    }

    /// Look up an id by display string. Pure function: trims and
    /// case-folds the input, returns `None` for anything outside the set.
    pub fn resolve(&self, name: &str) -> Option<T> {
        self.by_name.get(&normalize(name)).copied()
    }

    /// Number of entries in the catalog.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// All five catalogs for one ruleset, built once before any load.
#[derive(Debug, Clone)]
pub struct Catalogs {
    ruleset: Ruleset,
    pub continent: Catalog<Continent>,
    pub region: Catalog<Region>,
    pub area: Catalog<Area>,
    pub climate: Catalog<Climate>,
    pub terrain: Catalog<Terrain>,
}

impl Catalogs {
    /// Build the catalogs for the given ruleset.
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            ruleset,
            continent: Catalog::from_members(Continent::ALL, Continent::key),
            region: Catalog::from_members(Region::members(ruleset), Region::key),
            area: Catalog::from_members(Area::members(ruleset), Area::key),
            climate: Catalog::from_members(Climate::ALL, Climate::key),
            terrain: Catalog::from_members(Terrain::ALL, Terrain::key),
        }
    }

    /// Ruleset these catalogs were built for.
    #[inline]
    pub fn ruleset(&self) -> Ruleset {
        self.ruleset
    }
}
