use std::collections::HashMap;
use std::io::{self, Write};

use crate::error::ExtractError;
use crate::extract::Extraction;
use crate::models::Listing;

pub const DEFAULT_SAMPLE_SIZE: usize = 5;
pub const DEFAULT_TOP_AREAS: usize = 10;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleListing {
    pub name: String,
    pub areas: String, // tags joined by ", "
    pub address: String,
    pub user_score: String,
    pub review_cnt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaCount {
    pub area: String,
    pub count: usize,
}

/// What the success diagnostic shows about one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_records: usize,
    pub unique_records: usize,
    pub skipped_records: usize,
    pub samples: Vec<SampleListing>,
    pub top_areas: Vec<AreaCount>,
}

impl Summary {
    pub fn from_extraction(extraction: &Extraction, sample_size: usize, top_n: usize) -> Self {
        let samples = extraction
            .listings
            .iter()
            .take(sample_size)
            .map(|l| SampleListing {
                name: l.display_name.clone(),
                areas: l.record.area_tags().join(", "),
                address: l.address.clone(),
                user_score: l.record.user_score(),
                review_cnt: l.record.review_cnt(),
            })
            .collect();

        Summary {
            total_records: extraction.total_records,
            unique_records: extraction.listings.len(),
            skipped_records: extraction.skipped_records,
            samples,
            top_areas: area_breakdown(&extraction.listings, top_n),
        }
    }
}

/// Counts area tags over unique listings and returns the `top_n` most
/// frequent. Tags are counted in first-seen order and the sort is stable,
/// so equal counts keep that order.
pub fn area_breakdown(listings: &[Listing], top_n: usize) -> Vec<AreaCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<AreaCount> = Vec::new();

    for listing in listings {
        for tag in listing.record.area_tags() {
            match index.get(&tag).copied() {
                Some(i) => counts[i].count += 1,
                None => {
                    index.insert(tag.clone(), counts.len());
                    counts.push(AreaCount { area: tag, count: 1 });
                }
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top_n);
    counts
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Success diagnostic: counts, sample listings and the area breakdown.
pub fn write_summary<W: Write>(out: &mut W, summary: &Summary) -> io::Result<()> {
    writeln!(out, "\n✅ CSV data delivered ({} of {} listings unique).", summary.unique_records, summary.total_records)?;
    if summary.skipped_records > 0 {
        writeln!(out, "⚠️  {} unreadable listings skipped.", summary.skipped_records)?;
    }

    if !summary.samples.is_empty() {
        writeln!(out, "\n🍽️  Sample listings (first {}):", summary.samples.len())?;
        for (i, sample) in summary.samples.iter().enumerate() {
            writeln!(out, "{}. {} ({})", i + 1, sample.name, sample.areas)?;
            writeln!(out, "   Address: {}", sample.address)?;
            writeln!(out, "   Rating: {} ({} reviews)", sample.user_score, sample.review_cnt)?;
        }
    }

    if !summary.top_areas.is_empty() {
        writeln!(out, "\n📍 Listings by area:")?;
        for area in &summary.top_areas {
            writeln!(out, "  - {}: {}", area.area, area.count)?;
        }
    }
    Ok(())
}

/// Failure diagnostic: the error, then the whole text so it can be copied by hand.
pub fn write_fallback<W: Write>(out: &mut W, error: &ExtractError, csv: &str) -> io::Result<()> {
    writeln!(out, "❌ {}", error)?;
    writeln!(out, "\n💡 Copy the data below manually:")?;
    writeln!(out, "{}", rule())?;
    writeln!(out, "{}", csv)?;
    writeln!(out, "{}", rule())?;
    Ok(())
}
