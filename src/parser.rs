//! Tolerant parser for the semicolon-delimited province file
//!
//! One header line, then one row per record, fields separated by `;`. The
//! parser survives partial corruption row by row: a bad field degrades to its
//! sentinel or zero with a logged warning, and only a missing id or a
//! too-short row discards the whole row. The file is always consumed to the
//! end.
//!
//! Rows are parsed in parallel and folded back in file order; id
//! de-duplication is a sequential pass afterwards.

use crate::{Catalog, Catalogs, MapPoint, Province, ProvinceId};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashSet;

/// Total columns in the full schema.
pub const COLUMN_COUNT: usize = 57;

/// Fewest tokens a row may have and still be accepted. Columns past this are
/// optional trailing coordinates that older format revisions omit.
pub const MIN_ROW_TOKENS: usize = 49;

/// Column positions in the row schema. Columns not listed are reserved and
/// ignored on read.
pub(crate) mod col {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const AREA: usize = 2;
    pub const REGION: usize = 3;
    pub const CONTINENT: usize = 4;
    pub const CLIMATE: usize = 5;
    pub const TERRAIN: usize = 6;
    pub const INFRASTRUCTURE: usize = 9;
    pub const BEACHES: usize = 11;
    pub const PORT_ALLOWED: usize = 12;
    pub const PORT_SEA_ZONE: usize = 13;
    pub const IC: usize = 14;
    pub const MANPOWER: usize = 15;
    pub const OIL: usize = 16;
    pub const METAL: usize = 17;
    pub const ENERGY: usize = 18;
    pub const RARE_MATERIALS: usize = 19;
    pub const CITY_X: usize = 20;
    pub const CITY_Y: usize = 21;
    pub const ARMY_X: usize = 22;
    pub const ARMY_Y: usize = 23;
    pub const PORT_X: usize = 24;
    pub const PORT_Y: usize = 25;
    pub const BEACH_X: usize = 26;
    pub const BEACH_Y: usize = 27;
    pub const BEACH_ICON: usize = 28;
    pub const FORT_X: usize = 29;
    pub const FORT_Y: usize = 30;
    pub const AA_X: usize = 31;
    pub const AA_Y: usize = 32;
    pub const COUNTER_X: usize = 33;
    pub const COUNTER_Y: usize = 34;
    pub const FILL_X1: usize = 46;
    pub const FILL_Y1: usize = 47;
    pub const FILL_X2: usize = 48;
    pub const FILL_Y2: usize = 49;
    pub const FILL_X3: usize = 50;
    pub const FILL_Y3: usize = 51;
    pub const FILL_X4: usize = 52;
    pub const FILL_Y4: usize = 53;
    pub const FILL_X5: usize = 54;
    pub const FILL_Y5: usize = 55;
    pub const FILL_X6: usize = 56;
}

/// One recovered-from problem in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number, counting the header line.
    pub line: usize,
    /// Record the problem belongs to, when the id was readable.
    pub province: Option<ProvinceId>,
    pub message: String,
}

/// Everything a parse pass produced.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    /// Accepted records, in file order.
    pub provinces: Vec<Province>,
    /// Recovered-from problems, in file order.
    pub warnings: Vec<ParseWarning>,
    /// Rows discarded entirely (missing id, too short, duplicate id).
    pub skipped_rows: usize,
}

impl ParseReport {
    /// True when every row was accepted without degradation.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.skipped_rows == 0
    }
}

struct RowOutcome {
    line: usize,
    province: Option<Province>,
    warnings: Vec<ParseWarning>,
}

/// Parse a whole province file. The first line is always skipped as the
/// header; a header-only or empty file is a valid empty dataset. Blank lines
/// are ignored. `source` is the file name used in diagnostics.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn parse_text(text: &str, catalogs: &Catalogs, source: &str) -> ParseReport {
    let rows: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let outcomes: Vec<RowOutcome> = rows
        .into_par_iter()
        .map(|(index, raw)| parse_row(index + 1, raw, catalogs, source))
        .collect();

    let mut report = ParseReport::default();
    report.provinces.reserve(outcomes.len());
    let mut seen: HashSet<ProvinceId> = HashSet::with_capacity(outcomes.len());
    for outcome in outcomes {
        report.warnings.extend(outcome.warnings);
        match outcome.province {
            Some(province) if seen.insert(province.id()) => report.provinces.push(province),
            Some(province) => {
                let message = format!("row skipped: duplicate id {}", province.id());
                tracing::warn!("{}:{}: {}", source, outcome.line, message);
                report.warnings.push(ParseWarning {
                    line: outcome.line,
                    province: Some(province.id()),
                    message,
                });
                report.skipped_rows += 1;
            }
            None => report.skipped_rows += 1,
        }
    }
    report
}

/// Warning sink for one row, carrying the diagnostic context.
struct Diag<'a> {
    source: &'a str,
    line: usize,
    id: ProvinceId,
    name: &'a str,
    warnings: Vec<ParseWarning>,
}

impl Diag<'_> {
    fn warn(&mut self, message: String) {
        tracing::warn!(
            "{}:{}: province {} ({:?}): {}",
            self.source,
            self.line,
            self.id,
            self.name,
            message
        );
        self.warnings.push(ParseWarning {
            line: self.line,
            province: Some(self.id),
            message,
        });
    }
}

fn parse_row(line: usize, raw: &str, catalogs: &Catalogs, source: &str) -> RowOutcome {
    // Trimming also strips the carriage return of CRLF files.
    let tokens: SmallVec<[&str; 64]> = raw.split(';').map(str::trim).collect();

    let id_token = tokens.first().copied().unwrap_or("");
    let Ok(raw_id) = id_token.parse::<u32>() else {
        let message = format!("row skipped: missing or invalid id {:?}", id_token);
        tracing::warn!("{}:{}: {}", source, line, message);
        return RowOutcome {
            line,
            province: None,
            warnings: vec![ParseWarning {
                line,
                province: None,
                message,
            }],
        };
    };
    let id = ProvinceId(raw_id);

    if tokens.len() < MIN_ROW_TOKENS {
        let message = format!(
            "row skipped: {} fields, at least {} required",
            tokens.len(),
            MIN_ROW_TOKENS
        );
        tracing::warn!("{}:{}: province {}: {}", source, line, id, message);
        return RowOutcome {
            line,
            province: None,
            warnings: vec![ParseWarning {
                line,
                province: Some(id),
                message,
            }],
        };
    }

    let name = tokens[col::NAME];
    let mut diag = Diag {
        source,
        line,
        id,
        name,
        warnings: Vec::new(),
    };
    // Every token past the accepted minimum is read defensively: older
    // format revisions simply end the row early.
    let token = |idx: usize| tokens.get(idx).copied().unwrap_or("");

    let mut province = Province::new(id);
    province.name = name.to_string();

    province.area = class_field(&mut diag, token(col::AREA), "area", &catalogs.area);
    province.region = class_field(&mut diag, token(col::REGION), "region", &catalogs.region);
    province.continent = class_field(
        &mut diag,
        token(col::CONTINENT),
        "continent",
        &catalogs.continent,
    );
    province.climate = class_field(&mut diag, token(col::CLIMATE), "climate", &catalogs.climate);
    province.terrain = class_field(&mut diag, token(col::TERRAIN), "terrain", &catalogs.terrain);

    province.infrastructure = real_field(&mut diag, token(col::INFRASTRUCTURE), "infrastructure");
    province.beaches = flag_field(&mut diag, token(col::BEACHES), "beaches");
    province.port_allowed = flag_field(&mut diag, token(col::PORT_ALLOWED), "port allowed");
    province.port_sea_zone = integer_field(&mut diag, token(col::PORT_SEA_ZONE), "port sea zone");
    province.ic = real_field(&mut diag, token(col::IC), "IC");
    province.manpower = real_field(&mut diag, token(col::MANPOWER), "manpower");
    province.oil = real_field(&mut diag, token(col::OIL), "oil");
    province.metal = real_field(&mut diag, token(col::METAL), "metal");
    province.energy = real_field(&mut diag, token(col::ENERGY), "energy");
    province.rare_materials = real_field(&mut diag, token(col::RARE_MATERIALS), "rare materials");

    province.city = point_field(&mut diag, token(col::CITY_X), token(col::CITY_Y), "city");
    province.army = point_field(&mut diag, token(col::ARMY_X), token(col::ARMY_Y), "army");
    province.port = point_field(&mut diag, token(col::PORT_X), token(col::PORT_Y), "port");
    province.beach = point_field(&mut diag, token(col::BEACH_X), token(col::BEACH_Y), "beach");
    province.beach_icon = integer_field(&mut diag, token(col::BEACH_ICON), "beach icon");
    province.fort = point_field(&mut diag, token(col::FORT_X), token(col::FORT_Y), "fort");
    province.anti_air = point_field(&mut diag, token(col::AA_X), token(col::AA_Y), "anti-air");
    province.counter = point_field(
        &mut diag,
        token(col::COUNTER_X),
        token(col::COUNTER_Y),
        "counter",
    );

    province.fill[0] = point_field(&mut diag, token(col::FILL_X1), token(col::FILL_Y1), "fill 1");
    province.fill[1] = point_field(&mut diag, token(col::FILL_X2), token(col::FILL_Y2), "fill 2");
    province.fill[2] = point_field(&mut diag, token(col::FILL_X3), token(col::FILL_Y3), "fill 3");
    province.fill[3] = point_field(&mut diag, token(col::FILL_X4), token(col::FILL_Y4), "fill 4");
    province.fill[4] = point_field(&mut diag, token(col::FILL_X5), token(col::FILL_Y5), "fill 5");
    // The format carries no Y column for the sixth fill point.
    province.fill[5] = MapPoint::new(integer_field(&mut diag, token(col::FILL_X6), "fill 6"), 0);

    RowOutcome {
        line,
        province: Some(province),
        warnings: diag.warnings,
    }
}

/// Enumerated field: empty means unset, an out-of-catalog token degrades to
/// the sentinel with a warning.
fn class_field<T: Copy + Default>(
    diag: &mut Diag<'_>,
    token: &str,
    label: &str,
    catalog: &Catalog<T>,
) -> T {
    if token.is_empty() {
        return T::default();
    }
    match catalog.resolve(token) {
        Some(id) => id,
        None => {
            diag.warn(format!("unknown {} {:?}, using none", label, token));
            T::default()
        }
    }
}

/// Real-valued field: empty is the normal unset representation, anything
/// unparsable or negative degrades to 0 with a warning.
fn real_field(diag: &mut Diag<'_>, token: &str, label: &str) -> f64 {
    if token.is_empty() {
        return 0.0;
    }
    match token.parse::<f64>() {
        Ok(value) if value >= 0.0 => value,
        Ok(value) => {
            diag.warn(format!("negative {} value {}, using 0", label, value));
            0.0
        }
        Err(_) => {
            diag.warn(format!("invalid {} value {:?}, using 0", label, token));
            0.0
        }
    }
}

fn integer_field(diag: &mut Diag<'_>, token: &str, label: &str) -> i32 {
    if token.is_empty() {
        return 0;
    }
    match token.parse::<i32>() {
        Ok(value) => value,
        Err(_) => {
            diag.warn(format!("invalid {} value {:?}, using 0", label, token));
            0
        }
    }
}

fn point_field(diag: &mut Diag<'_>, x_token: &str, y_token: &str, label: &str) -> MapPoint {
    MapPoint::new(
        integer_field(diag, x_token, label),
        integer_field(diag, y_token, label),
    )
}

/// Boolean flag stored as `1`/`0`; empty means unset.
fn flag_field(diag: &mut Diag<'_>, token: &str, label: &str) -> bool {
    match token {
        "" | "0" => false,
        "1" => true,
        other => {
            diag.warn(format!("invalid {} flag {:?}, using 0", label, other));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Area, Climate, Continent, Region, Ruleset, Terrain};

    fn catalogs() -> Catalogs {
        Catalogs::new(Ruleset::Legacy)
    }

    /// Full-width row with sensible land defaults; callers override columns.
    fn row_tokens(id: u32, name: &str) -> Vec<String> {
        let mut tokens = vec![String::new(); COLUMN_COUNT];
        tokens[col::ID] = id.to_string();
        tokens[col::NAME] = name.to_string();
        tokens[col::AREA] = "Poland".to_string();
        tokens[col::REGION] = "Eastern Europe".to_string();
        tokens[col::CONTINENT] = "Europe".to_string();
        tokens[col::CLIMATE] = "Temperate".to_string();
        tokens[col::TERRAIN] = "Plains".to_string();
        tokens[col::INFRASTRUCTURE] = "80.000".to_string();
        tokens[col::IC] = "4.000".to_string();
        tokens[col::MANPOWER] = "2.500".to_string();
        tokens
    }

    fn file_from_rows(rows: &[Vec<String>]) -> String {
        let mut text = String::from("Id;Name;Area;Region;Continent;Climate;Terrain\n");
        for row in rows {
            text.push_str(&row.join(";"));
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_empty_and_header_only_files() {
        let report = parse_text("", &catalogs(), "provinces.csv");
        assert!(report.provinces.is_empty());
        assert!(report.is_clean());

        let report = parse_text("Id;Name;Area\n", &catalogs(), "provinces.csv");
        assert!(report.provinces.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_clean_rows_parse_fully() {
        let rows = vec![row_tokens(1, "PROV_WARSAW"), row_tokens(2, "PROV_KRAKOW")];
        let report = parse_text(&file_from_rows(&rows), &catalogs(), "provinces.csv");

        assert!(report.is_clean());
        assert_eq!(report.provinces.len(), 2);
        let province = &report.provinces[0];
        assert_eq!(province.id(), ProvinceId(1));
        assert_eq!(province.name, "PROV_WARSAW");
        assert_eq!(province.area(), Area::Poland);
        assert_eq!(province.region(), Region::EasternEurope);
        assert_eq!(province.continent(), Continent::Europe);
        assert_eq!(province.climate(), Climate::Temperate);
        assert_eq!(province.terrain(), Terrain::Plains);
        assert_eq!(province.infrastructure, 80.0);
        assert_eq!(province.ic, 4.0);
        assert_eq!(province.manpower, 2.5);
    }

    #[test]
    fn test_bad_fields_degrade_without_dropping_rows() {
        let mut rows: Vec<Vec<String>> = (1..=10).map(|id| row_tokens(id, "PROV")).collect();
        rows[4][col::AREA] = "Atlantis".to_string();
        rows[8][col::INFRASTRUCTURE] = "lots".to_string();

        let report = parse_text(&file_from_rows(&rows), &catalogs(), "provinces.csv");

        assert_eq!(report.provinces.len(), 10);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.provinces[4].area(), Area::Unknown);
        assert_eq!(report.provinces[8].infrastructure, 0.0);
        // Line numbers are 1-based and count the header.
        assert_eq!(report.warnings[0].line, 6);
        assert_eq!(report.warnings[0].province, Some(ProvinceId(5)));
        assert_eq!(report.warnings[1].line, 10);
    }

    #[test]
    fn test_missing_id_and_short_rows_are_skipped() {
        let mut rows: Vec<Vec<String>> = (1..=5).map(|id| row_tokens(id, "PROV")).collect();
        rows[1][col::ID] = String::new();
        rows[3].truncate(10);

        let report = parse_text(&file_from_rows(&rows), &catalogs(), "provinces.csv");

        assert_eq!(report.provinces.len(), 3);
        assert_eq!(report.skipped_rows, 2);
        let ids: Vec<u32> = report.provinces.iter().map(|p| p.id().0).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_duplicate_id_keeps_first_row() {
        let mut rows = vec![row_tokens(1, "FIRST"), row_tokens(1, "SECOND")];
        rows[1][col::AREA] = "Bohemia".to_string();

        let report = parse_text(&file_from_rows(&rows), &catalogs(), "provinces.csv");

        assert_eq!(report.provinces.len(), 1);
        assert_eq!(report.provinces[0].name, "FIRST");
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_short_row_reads_trailing_fields_defensively() {
        let mut row = row_tokens(1, "PROV");
        row[col::FILL_X1] = "120".to_string();
        row[col::FILL_Y1] = "44".to_string();
        row[col::FILL_X2] = "7".to_string();
        row.truncate(MIN_ROW_TOKENS);

        let report = parse_text(&file_from_rows(&[row]), &catalogs(), "provinces.csv");

        assert!(report.is_clean());
        let province = &report.provinces[0];
        assert_eq!(province.fill[0], MapPoint::new(120, 44));
        assert_eq!(province.fill[1], MapPoint::new(7, 0));
        assert!(province.fill[2].is_default());
    }

    #[test]
    fn test_full_width_row_reads_all_fill_points() {
        let mut row = row_tokens(1, "PROV");
        row[col::FILL_X3] = "30".to_string();
        row[col::FILL_Y3] = "31".to_string();
        row[col::FILL_X6] = "60".to_string();

        let report = parse_text(&file_from_rows(&[row]), &catalogs(), "provinces.csv");

        assert!(report.is_clean());
        let province = &report.provinces[0];
        assert_eq!(province.fill[2], MapPoint::new(30, 31));
        assert_eq!(province.fill[5], MapPoint::new(60, 0));
    }

    #[test]
    fn test_flags_and_ports() {
        let mut row = row_tokens(1, "PROV");
        row[col::BEACHES] = "1".to_string();
        row[col::PORT_ALLOWED] = "maybe".to_string();
        row[col::PORT_SEA_ZONE] = "305".to_string();

        let report = parse_text(&file_from_rows(&[row]), &catalogs(), "provinces.csv");

        let province = &report.provinces[0];
        assert!(province.beaches);
        assert!(!province.port_allowed);
        assert_eq!(province.port_sea_zone, 305);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_negative_economic_value_degrades_to_zero() {
        let mut row = row_tokens(1, "PROV");
        row[col::OIL] = "-3.000".to_string();

        let report = parse_text(&file_from_rows(&[row]), &catalogs(), "provinces.csv");

        assert_eq!(report.provinces[0].oil, 0.0);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_enum_lookup_is_case_insensitive() {
        let mut row = row_tokens(1, "PROV");
        row[col::TERRAIN] = "OCEAN".to_string();

        let report = parse_text(&file_from_rows(&[row]), &catalogs(), "provinces.csv");

        assert!(report.is_clean());
        assert_eq!(report.provinces[0].terrain(), Terrain::Ocean);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let rows = vec![row_tokens(1, "PROV")];
        let mut text = file_from_rows(&rows);
        text.push_str("\n   \n");

        let report = parse_text(&text, &catalogs(), "provinces.csv");
        assert!(report.is_clean());
        assert_eq!(report.provinces.len(), 1);
    }

    #[test]
    fn test_crlf_rows_parse() {
        let rows = vec![row_tokens(1, "PROV")];
        let text = file_from_rows(&rows).replace('\n', "\r\n");

        let report = parse_text(&text, &catalogs(), "provinces.csv");
        assert!(report.is_clean());
        assert_eq!(report.provinces.len(), 1);
        assert_eq!(report.provinces[0].name, "PROV");
    }

    #[test]
    fn test_extended_catalog_resolves_extended_area() {
        let extended = Catalogs::new(Ruleset::Extended);
        let mut row = row_tokens(1, "PROV");
        row[col::AREA] = "Transjordan".to_string();

        let legacy_report = parse_text(&file_from_rows(&[row.clone()]), &catalogs(), "p.csv");
        assert_eq!(legacy_report.provinces[0].area(), Area::Unknown);
        assert_eq!(legacy_report.warnings.len(), 1);

        let extended_report = parse_text(&file_from_rows(&[row]), &extended, "p.csv");
        assert_eq!(extended_report.provinces[0].area(), Area::Transjordan);
        assert!(extended_report.is_clean());
    }
}
