use crate::config::Config;
use crate::forvo::types::PronunciationRecord;

/// Sort position of a record. Preferred usernames come first, then preferred
/// countries, then everything else in a single bucket.
pub fn priority(record: &PronunciationRecord, config: &Config) -> usize {
    let usernames = &config.preferred_usernames;
    let countries = &config.preferred_countries;

    if let Some(idx) = usernames.iter().position(|u| *u == record.username) {
        return idx;
    }

    let country = record
        .country
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_else(|| "unknown".to_string());

    if let Some(idx) = countries.iter().position(|c| *c == country) {
        return idx + usernames.len();
    }

    usernames.len() + countries.len()
}

/// Stable, so equal priorities keep page order.
pub fn rank(mut records: Vec<PronunciationRecord>, config: &Config) -> Vec<PronunciationRecord> {
    if config.preferred_usernames.is_empty() && config.preferred_countries.is_empty() {
        return records;
    }

    records.sort_by_key(|record| priority(record, config));
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, country: Option<&str>) -> PronunciationRecord {
        PronunciationRecord {
            username: username.to_string(),
            url: format!("https://audio.example/{username}.mp3"),
            gender: None,
            country: country.map(str::to_string),
        }
    }

    fn usernames(records: &[PronunciationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.username.as_str()).collect()
    }

    fn config(usernames: &[&str], countries: &[&str]) -> Config {
        Config {
            preferred_usernames: usernames.iter().map(|s| s.to_string()).collect(),
            preferred_countries: countries.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_preferred_usernames_first() {
        let records = vec![record("bob", None), record("carol", None), record("alice", None)];

        let ranked = rank(records, &config(&["alice", "bob"], &[]));

        assert_eq!(usernames(&ranked), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_unranked_keep_scrape_order() {
        let records = vec![
            record("zed", None),
            record("alice", None),
            record("amy", None),
        ];

        let ranked = rank(records, &config(&["alice"], &[]));

        assert_eq!(usernames(&ranked), vec!["alice", "zed", "amy"]);
    }

    #[test]
    fn test_countries_after_usernames() {
        let records = vec![
            record("us1", Some("United States")),
            record("jp1", Some("Japan")),
            record("fav", Some("United States")),
            record("jp2", Some("Japan")),
        ];

        let ranked = rank(records, &config(&["fav"], &["japan"]));

        assert_eq!(usernames(&ranked), vec!["fav", "jp1", "jp2", "us1"]);
    }

    #[test]
    fn test_missing_country_matches_unknown() {
        let records = vec![record("a", Some("Japan")), record("b", None)];

        let ranked = rank(records, &config(&[], &["unknown", "japan"]));

        assert_eq!(usernames(&ranked), vec!["b", "a"]);
    }

    #[test]
    fn test_no_preferences_is_noop() {
        let records = vec![record("c", None), record("a", None), record("b", None)];

        let ranked = rank(records.clone(), &Config::default());

        assert_eq!(ranked, records);
    }
}
