use crate::deadline::parse_deadline;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use time::Date;

/// A university record as it arrives from the document store or a JSON dump.
///
/// Every field is optional and several of them exist twice: once at the top
/// level and once inside the free-form `basic_info` bag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUniversity {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<RawLocation>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub sector: Option<String>,
    pub deadline: Option<String>,
    #[serde(rename = "admissionOpen")]
    pub admission_open: Option<bool>,
    pub programs: Option<RawPrograms>,
    pub basic_info: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLocation {
    Text(String),
    Parts {
        city: Option<String>,
        province: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPrograms {
    Listed(Vec<RawProgram>),
    Grouped(BTreeMap<String, Vec<RawProgram>>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawProgram {
    Name(String),
    Detailed {
        name: String,
        level: Option<String>,
        duration: Option<String>,
    },
}

impl RawProgram {
    fn into_name(self) -> String {
        match self {
            RawProgram::Name(name) => name,
            RawProgram::Detailed { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub level: Option<String>,
    pub duration: Option<String>,
}

/// Programs in either of the two shapes found in the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Programs {
    /// A flat list, e.g. `[{"name": "BS Computer Science", "level": "BS"}]`.
    Listed(Vec<Program>),
    /// Program names keyed by category label, e.g. `{"BSPrograms": [...]}`.
    Grouped(BTreeMap<String, Vec<String>>),
}

impl Default for Programs {
    fn default() -> Self {
        Programs::Listed(Vec::new())
    }
}

impl Programs {
    /// Category labels: the map keys of the grouped shape, the levels of the listed one.
    pub fn categories(&self) -> Vec<&str> {
        match self {
            Programs::Grouped(map) => map.keys().map(String::as_str).collect(),
            Programs::Listed(list) => list.iter().filter_map(|p| p.level.as_deref()).collect(),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            Programs::Grouped(map) => map.values().flatten().map(String::as_str).collect(),
            Programs::Listed(list) => list.iter().map(|p| p.name.as_str()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Programs::Grouped(map) => map.is_empty(),
            Programs::Listed(list) => list.is_empty(),
        }
    }
}

impl From<RawPrograms> for Programs {
    fn from(raw: RawPrograms) -> Self {
        match raw {
            RawPrograms::Listed(list) => Programs::Listed(
                list.into_iter()
                    .map(|p| match p {
                        RawProgram::Name(name) => Program { name, level: None, duration: None },
                        RawProgram::Detailed { name, level, duration } => Program { name, level, duration },
                    })
                    .collect(),
            ),
            RawPrograms::Grouped(map) => Programs::Grouped(
                map.into_iter()
                    .map(|(label, list)| (label, list.into_iter().map(RawProgram::into_name).collect()))
                    .collect(),
            ),
        }
    }
}

/// Normalized record consumed by the catalog engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversityRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub sector: Option<String>,
    pub deadline: Option<String>,
    pub deadline_date: Option<Date>,
    pub admission_open: bool,
    pub programs: Programs,
}

impl UniversityRecord {
    /// Resolve every `direct field -> basic_info.* -> default` chain once.
    /// `ordinal` names records that carry no id of their own.
    pub fn from_raw(raw: RawUniversity, ordinal: usize) -> Self {
        let info = raw.basic_info.unwrap_or_default();
        let info_str = |key: &str| -> Option<String> {
            info.get(key).and_then(Value::as_str).and_then(non_blank)
        };

        let (direct_location, location_city, location_province) = match raw.location {
            Some(RawLocation::Text(text)) => (non_blank(&text), None, None),
            Some(RawLocation::Parts { city, province }) => (None, city, province),
            None => (None, None, None),
        };
        let city_field = raw.city.as_deref().and_then(non_blank)
            .or_else(|| location_city.as_deref().and_then(non_blank))
            .or_else(|| info_str("City"));
        let province_field = raw.province.as_deref().and_then(non_blank)
            .or_else(|| location_province.as_deref().and_then(non_blank))
            .or_else(|| info_str("Province"));

        let location = direct_location
            .or_else(|| info_str("Location"))
            .or_else(|| match (&city_field, &province_field) {
                (Some(c), Some(p)) => Some(format!("{c},{p}")),
                (Some(c), None) => Some(c.clone()),
                (None, Some(p)) => Some(p.clone()),
                (None, None) => None,
            });

        let city = city_field.or_else(|| location.as_deref().and_then(|l| non_blank(city_segment(l))));
        let province = province_field.or_else(|| {
            location.as_deref().and_then(|l| l.split(',').nth(1)).and_then(non_blank)
        });

        let deadline = raw.deadline.as_deref().and_then(non_blank).or_else(|| info_str("Deadline to Apply"));
        let deadline_date = deadline.as_deref().and_then(parse_deadline);
        if deadline.is_some() && deadline_date.is_none() {
            tracing::debug!(ordinal, deadline = ?deadline, "unparseable deadline");
        }

        UniversityRecord {
            id: raw.id.as_deref().and_then(non_blank).unwrap_or_else(|| format!("uni-{ordinal}")),
            name: raw.name.unwrap_or_default().trim().to_string(),
            description: raw.description.as_deref().and_then(non_blank).or_else(|| info_str("Description")),
            location,
            city,
            province,
            sector: raw.sector.as_deref().and_then(non_blank).or_else(|| info_str("Sector")),
            deadline,
            deadline_date,
            admission_open: raw.admission_open.unwrap_or(false),
            programs: raw.programs.map(Programs::from).unwrap_or_default(),
        }
    }

    /// True when the deadline is known and lies before `today`.
    pub fn deadline_passed(&self, today: Date) -> bool {
        self.deadline_date.map_or(false, |d| d < today)
    }

    pub fn effective_open(&self, today: Date) -> bool {
        self.admission_open && !self.deadline_passed(today)
    }
}

/// Text before the first comma, trimmed; the whole string when there is no comma.
pub(crate) fn city_segment(location: &str) -> &str {
    location.split(',').next().unwrap_or(location).trim()
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}
