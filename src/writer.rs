//! Province file writer
//!
//! Serializes the ordered flat collection back to the semicolon-delimited
//! text format. Two layouts exist, selected by the target ruleset:
//!
//! - **Legacy**: ocean records blank every land-only field, and the optional
//!   trailing coordinate columns are truncated after the last non-default
//!   value (defaults before it are written as literal `0`). This matches the
//!   original game's reader byte for byte and is a compatibility requirement,
//!   not a quirk to clean up.
//! - **Extended**: every column is always written, no blanking, no
//!   truncation.
//!
//! Reals use fixed 3-decimal formatting, integers plain decimal, flags `1`/`0`.

use crate::parser::col;
use crate::{COLUMN_COUNT, Province, Result, Ruleset};
use std::fs;
use std::path::Path;

/// Fixed header line, identical in both layouts.
pub const FILE_HEADER: &str = "Id;Name;Area;Region;Continent;Climate;Terrain;Size Modifier;Air Capacity;Infrastructure;City;Beaches;Port Allowed;Port Seazone;IC;Manpower;Oil;Metal;Energy;Rare Materials;City XPos;City YPos;Army XPos;Army YPos;Port XPos;Port YPos;Beach XPos;Beach YPos;Beach Icon;Fort XPos;Fort YPos;AA XPos;AA YPos;Counter XPos;Counter YPos;Sprite Variant;Sprite XPos;Sprite YPos;Sprite Variant;Sprite XPos;Sprite YPos;Sprite Variant;Sprite XPos;Sprite YPos;Sprite Variant;Sprite XPos;Fill XPos 1;Fill YPos 1;Fill XPos 2;Fill YPos 2;Fill XPos 3;Fill YPos 3;Fill XPos 4;Fill YPos 4;Fill XPos 5;Fill YPos 5;Fill XPos 6";

/// Output layout of the province file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLayout {
    /// Truncating layout with ocean blanking.
    Legacy,
    /// Full-width layout.
    Extended,
}

impl From<Ruleset> for FileLayout {
    fn from(ruleset: Ruleset) -> Self {
        match ruleset {
            Ruleset::Legacy => FileLayout::Legacy,
            Ruleset::Extended => FileLayout::Extended,
        }
    }
}

/// First of the optional trailing coordinate columns.
const TRAILING_OPTIONAL_START: usize = col::FILL_Y2;

/// Columns blanked for ocean records in the legacy layout: economic scalars,
/// port and beach fields, and land-defense anchors. Army and counter anchors
/// and the fill polygon stay, water tiles still render units and polygons.
const OCEAN_BLANKED: &[usize] = &[
    col::INFRASTRUCTURE,
    col::BEACHES,
    col::PORT_ALLOWED,
    col::PORT_SEA_ZONE,
    col::IC,
    col::MANPOWER,
    col::OIL,
    col::METAL,
    col::ENERGY,
    col::RARE_MATERIALS,
    col::CITY_X,
    col::CITY_Y,
    col::PORT_X,
    col::PORT_Y,
    col::BEACH_X,
    col::BEACH_Y,
    col::BEACH_ICON,
    col::FORT_X,
    col::FORT_Y,
    col::AA_X,
    col::AA_Y,
];

/// Serialize the whole collection, header included.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn render_provinces(provinces: &[Province], layout: FileLayout) -> String {
    let mut out = String::with_capacity(FILE_HEADER.len() + 1 + provinces.len() * 128);
    out.push_str(FILE_HEADER);
    out.push('\n');
    for province in provinces {
        out.push_str(&render_row(province, layout));
        out.push('\n');
    }
    out
}

/// Serialize the collection to `path`, creating the parent directory if it
/// is missing. On failure nothing is recorded as saved; the caller keeps its
/// dirty flag and can retry.
pub fn write_provinces(path: &Path, provinces: &[Province], layout: FileLayout) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_provinces(provinces, layout))?;
    tracing::info!("wrote {} provinces to {}", provinces.len(), path.display());
    Ok(())
}

fn render_row(province: &Province, layout: FileLayout) -> String {
    let mut cols = column_values(province);
    if layout == FileLayout::Legacy {
        if province.is_ocean() {
            for &index in OCEAN_BLANKED {
                cols[index].clear();
            }
        }
        // Drop trailing default columns; defaults before the last non-default
        // value stay as literal 0.
        let mut end = cols.len();
        while end > TRAILING_OPTIONAL_START && cols[end - 1] == "0" {
            end -= 1;
        }
        cols.truncate(end);
    }
    cols.join(";")
}

/// Canonical string for every column, before layout-specific rules.
fn column_values(province: &Province) -> Vec<String> {
    let mut cols = vec![String::new(); COLUMN_COUNT];
    cols[col::ID] = province.id().to_string();
    cols[col::NAME] = province.name.clone();
    cols[col::AREA] = province.area().key().to_string();
    cols[col::REGION] = province.region().key().to_string();
    cols[col::CONTINENT] = province.continent().key().to_string();
    cols[col::CLIMATE] = province.climate().key().to_string();
    cols[col::TERRAIN] = province.terrain().key().to_string();
    cols[col::INFRASTRUCTURE] = real(province.infrastructure);
    cols[col::BEACHES] = flag(province.beaches);
    cols[col::PORT_ALLOWED] = flag(province.port_allowed);
    cols[col::PORT_SEA_ZONE] = province.port_sea_zone.to_string();
    cols[col::IC] = real(province.ic);
    cols[col::MANPOWER] = real(province.manpower);
    cols[col::OIL] = real(province.oil);
    cols[col::METAL] = real(province.metal);
    cols[col::ENERGY] = real(province.energy);
    cols[col::RARE_MATERIALS] = real(province.rare_materials);
    cols[col::CITY_X] = province.city.x.to_string();
    cols[col::CITY_Y] = province.city.y.to_string();
    cols[col::ARMY_X] = province.army.x.to_string();
    cols[col::ARMY_Y] = province.army.y.to_string();
    cols[col::PORT_X] = province.port.x.to_string();
    cols[col::PORT_Y] = province.port.y.to_string();
    cols[col::BEACH_X] = province.beach.x.to_string();
    cols[col::BEACH_Y] = province.beach.y.to_string();
    cols[col::BEACH_ICON] = province.beach_icon.to_string();
    cols[col::FORT_X] = province.fort.x.to_string();
    cols[col::FORT_Y] = province.fort.y.to_string();
    cols[col::AA_X] = province.anti_air.x.to_string();
    cols[col::AA_Y] = province.anti_air.y.to_string();
    cols[col::COUNTER_X] = province.counter.x.to_string();
    cols[col::COUNTER_Y] = province.counter.y.to_string();
    cols[col::FILL_X1] = province.fill[0].x.to_string();
    cols[col::FILL_Y1] = province.fill[0].y.to_string();
    cols[col::FILL_X2] = province.fill[1].x.to_string();
    cols[col::FILL_Y2] = province.fill[1].y.to_string();
    cols[col::FILL_X3] = province.fill[2].x.to_string();
    cols[col::FILL_Y3] = province.fill[2].y.to_string();
    cols[col::FILL_X4] = province.fill[3].x.to_string();
    cols[col::FILL_Y4] = province.fill[3].y.to_string();
    cols[col::FILL_X5] = province.fill[4].x.to_string();
    cols[col::FILL_Y5] = province.fill[4].y.to_string();
    // The sixth fill point has no Y column in the format.
    cols[col::FILL_X6] = province.fill[5].x.to_string();
    cols
}

fn real(value: f64) -> String {
    format!("{:.3}", value)
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}
