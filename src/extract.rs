use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::csv_writer::{OutputFormat, RenderContext};
use crate::error::ExtractError;
use crate::models::{Listing, ListingRecord};
use crate::storage::{KeyValueStore, DEFAULT_STORAGE_KEY};

/// Everything one run needs besides the store.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub storage_key: String,
    pub format: OutputFormat,
    pub render: RenderContext,
}

impl ExtractOptions {
    pub fn new(format: OutputFormat, render: RenderContext) -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            format,
            render,
        }
    }
}

/// Result of the synchronous part of a run.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Length of the stored list, duplicates included
    pub total_records: usize,
    /// Entries that could not be read as a listing
    pub skipped_records: usize,
    pub listings: Vec<Listing>,
    pub csv: String,
}

/// Locates `poi_section.list` in the parsed blob.
fn listing_section(data: &Value) -> Option<&Vec<Value>> {
    data.get("poi_section")?.get("list")?.as_array()
}

/// Reads the stored blob, deduplicates its listings and renders them.
pub fn extract(store: &dyn KeyValueStore, options: &ExtractOptions) -> Result<Extraction, ExtractError> {
    info!("Reading stored data under key '{}'...", options.storage_key);
    let raw = store
        .get(&options.storage_key)
        .ok_or_else(|| ExtractError::MissingSourceData {
            key: options.storage_key.clone(),
        })?;

    let data: Value = serde_json::from_str(&raw)?;
    let entries = listing_section(&data).ok_or(ExtractError::MissingListingSection)?;
    info!("Found {} listing records.", entries.len());

    let (listings, skipped_records) = dedup_listings(entries);
    info!(
        "{} unique listings after deduplication ({} skipped).",
        listings.len(),
        skipped_records
    );

    let csv = options.format.render(&listings, &options.render);
    Ok(Extraction {
        total_records: entries.len(),
        skipped_records,
        listings,
        csv,
    })
}

/// Keeps the first listing for each name/address key, in input order.
/// Returns the unique listings and the number of unreadable entries.
pub fn dedup_listings(entries: &[Value]) -> (Vec<Listing>, usize) {
    let mut seen = HashSet::new();
    let mut listings = Vec::new();
    let mut skipped = 0;

    for (idx, entry) in entries.iter().enumerate() {
        let record = match ListingRecord::deserialize(entry) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping listing #{}: {}", idx + 1, e);
                skipped += 1;
                continue;
            }
        };

        let listing = Listing::from_record(record);
        let key = listing.dedup_key();
        if seen.insert(key) {
            listings.push(listing);
        } else {
            debug!(
                "Dropping duplicate listing '{}' at {}",
                listing.display_name, listing.address
            );
        }
    }

    (listings, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use serde_json::json;

    fn options(format: OutputFormat) -> ExtractOptions {
        ExtractOptions::new(
            format,
            RenderContext::new(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()),
        )
    }

    fn store_with(list: Value) -> MemoryStore {
        let blob = json!({"poi_section": {"list": list}}).to_string();
        MemoryStore::new().with_entry(DEFAULT_STORAGE_KEY, blob)
    }

    #[test]
    fn missing_key_is_missing_source_data() {
        let err = extract(&MemoryStore::new(), &options(OutputFormat::Legacy)).unwrap_err();
        assert!(matches!(err, ExtractError::MissingSourceData { ref key } if key == "listData"));
    }

    #[test]
    fn broken_json_is_malformed() {
        let store = MemoryStore::new().with_entry(DEFAULT_STORAGE_KEY, "{poi_section:");
        let err = extract(&store, &options(OutputFormat::Legacy)).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedSourceJson(_)));
    }

    #[test]
    fn missing_section_is_reported() {
        for blob in [r#"{}"#, r#"{"poi_section": {}}"#, r#"{"poi_section": {"list": 3}}"#, "null"] {
            let store = MemoryStore::new().with_entry(DEFAULT_STORAGE_KEY, blob);
            let err = extract(&store, &options(OutputFormat::Legacy)).unwrap_err();
            assert!(matches!(err, ExtractError::MissingListingSection), "blob {}", blob);
        }
    }

    #[test]
    fn empty_list_is_valid() {
        let extraction = extract(&store_with(json!([])), &options(OutputFormat::Legacy)).unwrap();
        assert_eq!(extraction.total_records, 0);
        assert!(extraction.listings.is_empty());
        assert_eq!(extraction.csv, "");
    }

    #[test]
    fn duplicate_by_road_address_is_dropped() {
        let store = store_with(json!([
            {"nm": "Kim's", "branch": "", "road_addr": "1 Main St", "lat": 37.1, "lng": 127.1,
             "area": ["Gangnam"], "user_score": 4.5, "review_cnt": 10},
            {"nm": "Kim's", "branch": "", "addr": "1 Main St", "lat": 37.1, "lng": 127.1}
        ]));
        let extraction = extract(&store, &options(OutputFormat::Legacy)).unwrap();
        assert_eq!(extraction.total_records, 2);
        assert_eq!(extraction.listings.len(), 1);
        assert_eq!(extraction.csv.lines().count(), 1);
        assert_eq!(extraction.listings[0].record.review_cnt(), "10");
    }

    #[test]
    fn first_occurrence_order_is_preserved() {
        let store = store_with(json!([
            {"nm": "B", "addr": "2"},
            {"nm": "A", "addr": "1"},
            {"nm": "B", "addr": "2", "user_score": 1},
            {"nm": "B", "addr": "3"},
            {"nm": "A", "branch": "East", "addr": "1"}
        ]));
        let extraction = extract(&store, &options(OutputFormat::Headered)).unwrap();
        let names: Vec<&str> = extraction
            .listings
            .iter()
            .map(|l| l.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "A", "B", "A East"]);
        // header plus four rows, numbered over unique listings
        let lines: Vec<&str> = extraction.csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[4].starts_with("4,"));
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let store = store_with(json!([{"branch": "no name"}, {"nm": "A"}, 7]));
        let extraction = extract(&store, &options(OutputFormat::Legacy)).unwrap();
        assert_eq!(extraction.skipped_records, 2);
        assert_eq!(extraction.listings.len(), 1);
    }

    #[test]
    fn oddly_typed_fields_still_produce_rows() {
        let store = store_with(json!([
            {"nm": "A", "road_addr": "1", "area": "Gangnam"},
            {"nm": "B", "road_addr": "2", "area": {"x": 1}},
            {"nm": 7, "road_addr": "3", "area": ["Mapo"]}
        ]));
        let extraction = extract(&store, &options(OutputFormat::Headered)).unwrap();
        assert_eq!(extraction.skipped_records, 0);
        assert_eq!(extraction.listings.len(), 3);
        let lines: Vec<&str> = extraction.csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains(r#""A","",,"1""#));
        assert!(lines[2].contains(r#""B","",,"2""#));
        assert!(lines[3].contains(r#""7","",,"3""#));
        assert!(lines[3].ends_with(",Mapo,,"));
    }

    #[test]
    fn rerun_is_byte_identical() {
        let store = store_with(json!([
            {"nm": "A", "road_addr": "1", "lat": 1.5},
            {"nm": "B", "addr": "2", "area": ["X"]}
        ]));
        let opts = options(OutputFormat::Headered);
        let first = extract(&store, &opts).unwrap();
        let second = extract(&store, &opts).unwrap();
        assert_eq!(first.csv, second.csv);
    }

    #[test]
    fn custom_storage_key_is_read() {
        let store = MemoryStore::new().with_entry("savedList", r#"{"poi_section":{"list":[{"nm":"A"}]}}"#);
        let mut opts = options(OutputFormat::Legacy);
        opts.storage_key = "savedList".to_string();
        assert_eq!(extract(&store, &opts).unwrap().listings.len(), 1);
    }
}
