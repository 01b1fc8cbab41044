use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime};

const MONTH_ABBREVIATIONS: [(&str, Month); 12] = [
    ("Jan", Month::January),
    ("Feb", Month::February),
    ("Mar", Month::March),
    ("Apr", Month::April),
    ("May", Month::May),
    ("Jun", Month::June),
    ("Jul", Month::July),
    ("Aug", Month::August),
    ("Sep", Month::September),
    ("Oct", Month::October),
    ("Nov", Month::November),
    ("Dec", Month::December),
];

/// Parse an admission deadline.
///
/// The scraped data mostly uses `"14 May 2025"`; anything else goes through
/// [`parse_generic`]. Unparseable input yields `None`.
pub fn parse_deadline(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split(' ').collect();
    if parts.len() == 3 {
        if let Some(date) = parse_day_mon_year(parts[0], parts[1], parts[2]) {
            return Some(date);
        }
    }
    parse_generic(raw)
}

fn parse_day_mon_year(day: &str, month: &str, year: &str) -> Option<Date> {
    let month = MONTH_ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == month).map(|(_, m)| *m)?;
    let day: u8 = day.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// ISO dates, RFC 3339 timestamps, `"D Month YYYY"` and `"Month D, YYYY"`.
pub fn parse_generic(raw: &str) -> Option<Date> {
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt.date());
    }
    if let Some(prefix) = raw.get(..10) {
        let rest = &raw[10..];
        if rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ') {
            if let Ok(date) = Date::parse(prefix, format_description!("[year]-[month]-[day]")) {
                return Some(date);
            }
        }
    }
    let cleaned = raw.replace(',', " ");
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() != 3 {
        return None;
    }
    let year: i32 = words[2].parse().ok()?;
    let (day, month) = match (words[0].parse::<u8>(), words[1].parse::<u8>()) {
        (Ok(day), Err(_)) => (day, month_by_name(words[1])?),
        (Err(_), Ok(day)) => (day, month_by_name(words[0])?),
        _ => return None,
    };
    Date::from_calendar_date(year, month, day).ok()
}

fn month_by_name(word: &str) -> Option<Month> {
    let lower = word.trim_end_matches('.').to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTH_ABBREVIATIONS.iter().find_map(|(abbr, month)| {
        let full = month.to_string().to_lowercase();
        (full.starts_with(&lower) && lower.starts_with(&abbr.to_lowercase())).then_some(*month)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: Month, d: u8) -> Date {
        Date::from_calendar_date(y, m, d).unwrap()
    }

    #[test]
    fn day_mon_year() {
        assert_eq!(parse_deadline("14 May 2025"), Some(ymd(2025, Month::May, 14)));
        assert_eq!(parse_deadline("1 Dec 2024"), Some(ymd(2024, Month::December, 1)));
    }

    #[test]
    fn generic_shapes() {
        assert_eq!(parse_deadline("2025-07-15"), Some(ymd(2025, Month::July, 15)));
        assert_eq!(parse_deadline("2025-07-15T10:00:00Z"), Some(ymd(2025, Month::July, 15)));
        assert_eq!(parse_deadline("2025-07-15T10:00:00"), Some(ymd(2025, Month::July, 15)));
        assert_eq!(parse_deadline("14 January 2025"), Some(ymd(2025, Month::January, 14)));
        assert_eq!(parse_deadline("July 15, 2023"), Some(ymd(2023, Month::July, 15)));
        assert_eq!(parse_deadline("Sept 3, 2023"), Some(ymd(2023, Month::September, 3)));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_deadline("not-a-date"), None);
        assert_eq!(parse_deadline(""), None);
        assert_eq!(parse_deadline("31 Feb 2025"), None);
        assert_eq!(parse_deadline("14 Foo 2025"), None);
        assert_eq!(parse_deadline("July 15, a2023"), None);
    }
}
