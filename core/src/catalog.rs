//! Filtering, deadline ordering and facet listing over an in-memory catalog.

use crate::record::{city_segment, UniversityRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::{Date, Duration};

/// Cities matched by plain containment before the location is split on commas.
pub const PRIORITY_CITIES: [&str; 5] = ["islamabad", "karachi", "lahore", "peshawar", "quetta"];

/// Federal capital. Records located here are never counted as part of Punjab.
const CAPITAL: &str = "islamabad";
const CAPITAL_EXCLUDED_PROVINCE: &str = "punjab";

const PUBLIC_SYNONYMS: [&str; 3] = ["public", "government", "govt"];

/// Widest look-ahead accepted by [`deadline_soon`]; beyond the range of `Date` anyway.
pub const MAX_LOOKAHEAD_DAYS: i64 = 3_660_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub program_type: Vec<String>,
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub sector: Vec<String>,
    #[serde(default)]
    pub province: Vec<String>,
    #[serde(default)]
    pub admission_open: bool,
    #[serde(default)]
    pub search_query: String,
}

impl FilterSpec {
    /// True when no facet narrows anything.
    pub fn is_empty(&self) -> bool {
        normalize_values(&self.program_type).is_empty()
            && normalize_values(&self.location).is_empty()
            && normalize_values(&self.sector).is_empty()
            && normalize_values(&self.province).is_empty()
            && !self.admission_open
            && self.search_query.trim().is_empty()
    }
}

fn normalize_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Sector,
    Location,
    Province,
    ProgramType,
    AdmissionOpen,
    Text,
}

/// Survivor counts per applied pass, in application order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FilterStats {
    pub total: usize,
    pub passes: Vec<(Facet, usize)>,
}

/// Filter `records` by `query` and `spec`. See [`filter_with_stats`].
pub fn filter_records(records: &[UniversityRecord], query: &str, spec: &FilterSpec, today: Date) -> Vec<UniversityRecord> {
    let (results, stats) = filter_with_stats(records, query, spec, today);
    for (facet, survivors) in &stats.passes {
        tracing::debug!(?facet, survivors, "facet applied");
    }
    tracing::debug!(before = stats.total, after = results.len(), "filtering complete");
    results
}

/// Apply every non-empty facet as a narrowing pass: AND across facets, OR
/// within one. With no query and no facet the input comes back untouched.
pub fn filter_with_stats(
    records: &[UniversityRecord],
    query: &str,
    spec: &FilterSpec,
    today: Date,
) -> (Vec<UniversityRecord>, FilterStats) {
    let mut stats = FilterStats { total: records.len(), passes: Vec::new() };
    let query = match query.trim() {
        "" => spec.search_query.trim(),
        q => q,
    };
    if query.is_empty() && spec.is_empty() {
        return (records.to_vec(), stats);
    }

    let mut results: Vec<&UniversityRecord> = records.iter().collect();

    let sectors = normalize_values(&spec.sector);
    if !sectors.is_empty() {
        narrow(&mut results, &mut stats, Facet::Sector, |r| matches_sector(r, &sectors));
    }
    let cities = normalize_values(&spec.location);
    if !cities.is_empty() {
        narrow(&mut results, &mut stats, Facet::Location, |r| matches_city(r, &cities));
    }
    let provinces = normalize_values(&spec.province);
    if !provinces.is_empty() {
        narrow(&mut results, &mut stats, Facet::Province, |r| matches_province(r, &provinces));
    }
    let program_types = normalize_values(&spec.program_type);
    if !program_types.is_empty() {
        narrow(&mut results, &mut stats, Facet::ProgramType, |r| matches_program_type(r, &program_types));
    }
    if spec.admission_open {
        narrow(&mut results, &mut stats, Facet::AdmissionOpen, |r| r.effective_open(today));
    }
    if !query.is_empty() {
        let needle = query.to_lowercase();
        narrow(&mut results, &mut stats, Facet::Text, |r| matches_text(r, &needle));
    }

    (results.into_iter().cloned().collect(), stats)
}

fn narrow(
    results: &mut Vec<&UniversityRecord>,
    stats: &mut FilterStats,
    facet: Facet,
    keep: impl Fn(&UniversityRecord) -> bool,
) {
    results.retain(|r| keep(r));
    stats.passes.push((facet, results.len()));
}

pub fn matches_sector(record: &UniversityRecord, sectors: &[String]) -> bool {
    let sector = record.sector.as_deref().unwrap_or_default().to_lowercase();
    if sectors.iter().any(|s| *s == sector) {
        return true;
    }
    sectors.iter().any(|requested| {
        if requested == "public" {
            PUBLIC_SYNONYMS.iter().any(|syn| sector.contains(syn)) || sector == "state"
        } else {
            sector.contains(requested.as_str())
        }
    })
}

pub fn matches_city(record: &UniversityRecord, cities: &[String]) -> bool {
    let location = record.location.as_deref().unwrap_or_default().to_lowercase();
    for city in PRIORITY_CITIES {
        if location.contains(city) && cities.iter().any(|c| c == city) {
            return true;
        }
    }
    let city = city_segment(&location);
    if city.is_empty() {
        return false;
    }
    cities.iter().any(|c| city.contains(c.as_str()) || c.contains(city))
}

pub fn matches_province(record: &UniversityRecord, provinces: &[String]) -> bool {
    let location = record.location.as_deref().unwrap_or_default().to_lowercase();
    if location.contains(CAPITAL) {
        if provinces.iter().any(|p| p == CAPITAL) {
            return true;
        }
        if provinces.iter().any(|p| p == CAPITAL_EXCLUDED_PROVINCE) {
            return false;
        }
    }
    let province = match location.split(',').nth(1) {
        Some(segment) => segment.trim(),
        None => location.as_str(),
    };
    provinces.iter().any(|p| province.contains(p.as_str()))
}

pub fn matches_program_type(record: &UniversityRecord, program_types: &[String]) -> bool {
    record.programs.categories().iter().any(|category| {
        let category = category.to_lowercase();
        program_types.iter().any(|t| category.contains(t.as_str()))
    })
}

fn matches_text(record: &UniversityRecord, needle: &str) -> bool {
    record.name.to_lowercase().contains(needle)
        || record.description.as_deref().map_or(false, |d| d.to_lowercase().contains(needle))
}

/// Order for list views: effectively open first; then earlier deadlines, with
/// dated records ahead of undated ones; undated ties by name. Stable.
pub fn sort_by_deadline(mut records: Vec<UniversityRecord>, today: Date) -> Vec<UniversityRecord> {
    records.sort_by_cached_key(|r| {
        let name_key = match r.deadline_date {
            Some(_) => None,
            None => Some((r.name.to_lowercase(), r.name.clone())),
        };
        (!r.effective_open(today), r.deadline_date.is_none(), r.deadline_date, name_key)
    });
    records
}

/// Records due within `days` of `today` (inclusive), soonest first.
/// `days` is clamped to [`MAX_LOOKAHEAD_DAYS`] either way.
pub fn deadline_soon(records: &[UniversityRecord], today: Date, days: i64) -> Vec<UniversityRecord> {
    let days = days.clamp(-MAX_LOOKAHEAD_DAYS, MAX_LOOKAHEAD_DAYS);
    let horizon = today.saturating_add(Duration::days(days));
    let mut due: Vec<UniversityRecord> = records
        .iter()
        .filter(|r| r.deadline_date.map_or(false, |d| d >= today && d <= horizon))
        .cloned()
        .collect();
    due.sort_by_key(|r| r.deadline_date);
    due
}

/// Filters of the open-admissions table. Empty strings mean "any".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdmissionsQuery {
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub show_past: bool,
}

pub fn filter_admissions(records: &[UniversityRecord], query: &AdmissionsQuery, today: Date) -> Vec<UniversityRecord> {
    let program = query.program.trim().to_lowercase();
    let sector = query.sector.trim().to_lowercase();
    let province = query.province.trim().to_lowercase();
    let equals = |field: &Option<String>, wanted: &str| {
        field.as_deref().map_or(false, |v| v.to_lowercase() == wanted)
    };
    records
        .iter()
        .filter(|r| program.is_empty() || r.programs.names().iter().any(|n| n.to_lowercase().contains(&program)))
        .filter(|r| sector.is_empty() || equals(&r.sector, &sector))
        .filter(|r| province.is_empty() || equals(&r.province, &province))
        .filter(|r| query.show_past || !r.deadline_passed(today))
        .cloned()
        .collect()
}

/// Distinct facet values present in a collection, sorted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FacetOptions {
    pub sectors: BTreeSet<String>,
    pub provinces: BTreeSet<String>,
    pub cities: BTreeSet<String>,
    pub program_categories: BTreeSet<String>,
    pub program_names: BTreeSet<String>,
}

impl FacetOptions {
    pub fn collect(records: &[UniversityRecord]) -> Self {
        let mut options = Self::default();
        for r in records {
            options.sectors.extend(r.sector.clone());
            options.provinces.extend(r.province.clone());
            options.cities.extend(r.city.clone());
            options.program_categories.extend(r.programs.categories().into_iter().map(str::to_string));
            options.program_names.extend(r.programs.names().into_iter().map(str::to_string));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawUniversity;
    use serde_json::json;
    use time::Month;

    fn today() -> Date {
        Date::from_calendar_date(2025, Month::March, 1).unwrap()
    }

    fn rec(v: serde_json::Value) -> UniversityRecord {
        let raw: RawUniversity = serde_json::from_value(v).unwrap();
        UniversityRecord::from_raw(raw, 0)
    }

    fn names(records: &[UniversityRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    fn spec() -> FilterSpec {
        FilterSpec::default()
    }

    #[test]
    fn sector_exact_contains_and_public_synonyms() {
        let records = vec![
            rec(json!({"name": "Gov", "sector": "Government"})),
            rec(json!({"name": "Semi", "sector": "Semi Government"})),
            rec(json!({"name": "State", "sector": "State"})),
            rec(json!({"name": "Priv", "sector": "Private"})),
            rec(json!({"name": "None"})),
        ];
        let public = filter_records(&records, "", &FilterSpec { sector: vec!["Public".into()], ..spec() }, today());
        assert_eq!(names(&public), vec!["Gov", "Semi", "State"]);
        let private = filter_records(&records, "", &FilterSpec { sector: vec!["private".into()], ..spec() }, today());
        assert_eq!(names(&private), vec!["Priv"]);
    }

    #[test]
    fn priority_city_matches_outside_first_segment() {
        let records = vec![
            rec(json!({"name": "Sub", "location": "H-12 Sector, Islamabad"})),
            rec(json!({"name": "Lhr", "location": "Lahore,Punjab"})),
            rec(json!({"name": "Hyd", "location": "Hyderabad,Sindh"})),
            rec(json!({"name": "Nowhere"})),
        ];
        let isb = filter_records(&records, "", &FilterSpec { location: vec!["Islamabad".into()], ..spec() }, today());
        assert_eq!(names(&isb), vec!["Sub"]);
        let hyd = filter_records(&records, "", &FilterSpec { location: vec!["hyderabad".into(), "lahore".into()], ..spec() }, today());
        assert_eq!(names(&hyd), vec!["Lhr", "Hyd"]);
    }

    #[test]
    fn province_uses_second_segment() {
        let records = vec![
            rec(json!({"name": "Hyd", "location": "Hyderabad, Sindh"})),
            rec(json!({"name": "Isb", "location": "Islamabad"})),
            rec(json!({"name": "Kpk", "location": "KPK"})),
        ];
        let sindh = filter_records(&records, "", &FilterSpec { province: vec!["sindh".into()], ..spec() }, today());
        assert_eq!(names(&sindh), vec!["Hyd"]);
        let capital = filter_records(&records, "", &FilterSpec { province: vec!["islamabad".into()], ..spec() }, today());
        assert_eq!(names(&capital), vec!["Isb"]);
        let kpk = filter_records(&records, "", &FilterSpec { province: vec!["kpk".into()], ..spec() }, today());
        assert_eq!(names(&kpk), vec!["Kpk"]);
    }

    #[test]
    fn program_type_checks_categories() {
        let records = vec![
            rec(json!({"name": "G", "programs": {"BSPrograms": ["CS"], "PhDPrograms": ["Math"]}})),
            rec(json!({"name": "L", "programs": [{"name": "MS Data Science", "level": "MS"}]})),
            rec(json!({"name": "N"})),
        ];
        let bs = filter_records(&records, "", &FilterSpec { program_type: vec!["BS".into()], ..spec() }, today());
        assert_eq!(names(&bs), vec!["G"]);
        // Every "...Programs" label ends in "ms", so grouped records always match "ms".
        let ms = filter_records(&records, "", &FilterSpec { program_type: vec!["MS".into()], ..spec() }, today());
        assert_eq!(names(&ms), vec!["G", "L"]);
        let phd = filter_records(&records, "", &FilterSpec { program_type: vec!["phd".into()], ..spec() }, today());
        assert_eq!(names(&phd), vec!["G"]);
    }

    #[test]
    fn text_query_and_search_query_field() {
        let records = vec![
            rec(json!({"name": "Alpha Institute", "description": "engineering"})),
            rec(json!({"name": "Beta College", "description": "Medical ENGINEERING"})),
            rec(json!({"name": "Gamma"})),
        ];
        let q = filter_records(&records, "engineering", &spec(), today());
        assert_eq!(names(&q), vec!["Alpha Institute", "Beta College"]);
        let via_spec = filter_records(&records, "  ", &FilterSpec { search_query: "beta".into(), ..spec() }, today());
        assert_eq!(names(&via_spec), vec!["Beta College"]);
    }

    #[test]
    fn admission_open_facet_uses_effective_status() {
        let records = vec![
            rec(json!({"name": "Open", "admissionOpen": true, "deadline": "2025-03-10"})),
            rec(json!({"name": "Lapsed", "admissionOpen": true, "deadline": "2025-02-10"})),
            rec(json!({"name": "Closed", "admissionOpen": false})),
            rec(json!({"name": "NoDate", "admissionOpen": true})),
        ];
        let open = filter_records(&records, "", &FilterSpec { admission_open: true, ..spec() }, today());
        assert_eq!(names(&open), vec!["Open", "NoDate"]);
    }

    #[test]
    fn stats_record_each_pass() {
        let records = vec![
            rec(json!({"name": "A", "sector": "Public", "location": "Lahore,Punjab"})),
            rec(json!({"name": "B", "sector": "Public", "location": "Karachi,Sindh"})),
            rec(json!({"name": "C", "sector": "Private", "location": "Lahore,Punjab"})),
        ];
        let s = FilterSpec { sector: vec!["public".into()], province: vec!["punjab".into()], ..spec() };
        let (out, stats) = filter_with_stats(&records, "", &s, today());
        assert_eq!(names(&out), vec!["A"]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.passes, vec![(Facet::Sector, 2), (Facet::Province, 1)]);
    }

    #[test]
    fn blank_facet_values_are_ignored() {
        let records = vec![rec(json!({"name": "A"})), rec(json!({"name": "B"}))];
        let s = FilterSpec { sector: vec!["  ".into()], ..spec() };
        assert!(s.is_empty());
        assert_eq!(filter_records(&records, "", &s, today()), records);
    }

    #[test]
    fn undated_records_sort_by_name() {
        let records = vec![
            rec(json!({"name": "beta"})),
            rec(json!({"name": "Alpha"})),
            rec(json!({"name": "Gamma", "deadline": "2025-06-01"})),
        ];
        let sorted = sort_by_deadline(records, today());
        assert_eq!(names(&sorted), vec!["Gamma", "Alpha", "beta"]);
    }

    #[test]
    fn equal_deadlines_keep_input_order() {
        let records = vec![
            rec(json!({"name": "Zed", "deadline": "2025-06-01"})),
            rec(json!({"name": "Abe", "deadline": "1 Jun 2025"})),
        ];
        let sorted = sort_by_deadline(records, today());
        assert_eq!(names(&sorted), vec!["Zed", "Abe"]);
    }

    #[test]
    fn deadline_soon_window() {
        let records = vec![
            rec(json!({"name": "Late", "deadline": "2025-04-29"})),
            rec(json!({"name": "Past", "deadline": "2025-02-27"})),
            rec(json!({"name": "Soon", "deadline": "2025-03-01"})),
            rec(json!({"name": "Far", "deadline": "2025-06-01"})),
            rec(json!({"name": "None"})),
        ];
        let due = deadline_soon(&records, today(), 60);
        assert_eq!(names(&due), vec!["Soon", "Late"]);
    }

    #[test]
    fn deadline_soon_extreme_horizons() {
        let records = vec![
            rec(json!({"name": "Far", "deadline": "2099-01-01"})),
            rec(json!({"name": "Past", "deadline": "2025-02-27"})),
            rec(json!({"name": "Soon", "deadline": "2025-03-02"})),
        ];
        assert_eq!(names(&deadline_soon(&records, today(), i64::MAX)), vec!["Soon", "Far"]);
        assert!(deadline_soon(&records, today(), i64::MIN).is_empty());
        assert!(deadline_soon(&[], today(), i64::MAX).is_empty());
    }

    #[test]
    fn admissions_table_filters() {
        let records = vec![
            rec(json!({"name": "A", "sector": "Public", "province": "Sindh", "programs": ["BS Computer Science"], "deadline": "2025-04-01"})),
            rec(json!({"name": "B", "sector": "Private", "programs": {"BSPrograms": ["Computer Engineering"]}, "deadline": "2025-01-01"})),
        ];
        let q = AdmissionsQuery { program: "computer".into(), ..Default::default() };
        assert_eq!(names(&filter_admissions(&records, &q, today())), vec!["A"]);
        let q = AdmissionsQuery { program: "computer".into(), show_past: true, ..Default::default() };
        assert_eq!(names(&filter_admissions(&records, &q, today())), vec!["A", "B"]);
        let q = AdmissionsQuery { sector: "public".into(), province: "sindh".into(), ..Default::default() };
        assert_eq!(names(&filter_admissions(&records, &q, today())), vec!["A"]);
    }

    #[test]
    fn facet_options_are_distinct_and_sorted() {
        let records = vec![
            rec(json!({"sector": "Public", "location": "Lahore,Punjab", "programs": {"BSPrograms": ["CS"]}})),
            rec(json!({"sector": "Private", "location": "Karachi,Sindh", "programs": {"BSPrograms": ["CS", "EE"]}})),
            rec(json!({"sector": "Public", "location": "Lahore,Punjab"})),
        ];
        let opts = FacetOptions::collect(&records);
        assert_eq!(opts.sectors.iter().collect::<Vec<_>>(), vec!["Private", "Public"]);
        assert_eq!(opts.provinces.iter().collect::<Vec<_>>(), vec!["Punjab", "Sindh"]);
        assert_eq!(opts.cities.iter().collect::<Vec<_>>(), vec!["Karachi", "Lahore"]);
        assert_eq!(opts.program_categories.len(), 1);
        assert_eq!(opts.program_names.iter().collect::<Vec<_>>(), vec!["CS", "EE"]);
    }
}
