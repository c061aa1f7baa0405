use serde::Deserialize;
use serde_json::Value;

/// Separator between display name and address in the dedup key.
pub const DEDUP_KEY_SEPARATOR: char = '|';

// One entry of poi_section.list. Only `nm` is required; the page stores
// everything loosely typed, so fields stay raw JSON values until rendered.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingRecord {
    pub nm: Value,
    #[serde(default)]
    pub branch: Option<Value>,
    #[serde(default)]
    pub road_addr: Option<Value>, // preferred address
    #[serde(default)]
    pub addr: Option<Value>, // fallback address
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
    #[serde(default)]
    pub area: Option<Value>, // list of tags
    #[serde(default)]
    pub user_score: Option<Value>,
    #[serde(default)]
    pub review_cnt: Option<Value>,
}

/// Renders a loosely typed field the way it should appear in a CSV cell.
/// Missing and null become the empty string.
pub fn render_scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Whether the page would treat the value as set: null, `""`, `0` and
/// `false` all count as absent.
fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

impl ListingRecord {
    pub fn name(&self) -> String {
        render_scalar(Some(&self.nm))
    }

    /// Name, plus the branch qualifier when there is one.
    pub fn display_name(&self) -> String {
        if is_set(self.branch.as_ref()) {
            format!("{} {}", self.name(), render_scalar(self.branch.as_ref()))
        } else {
            self.name()
        }
    }

    pub fn address(&self) -> String {
        if is_set(self.road_addr.as_ref()) {
            return render_scalar(self.road_addr.as_ref());
        }
        render_scalar(self.addr.as_ref())
    }

    pub fn category(&self) -> String {
        render_scalar(self.category.as_ref())
    }

    pub fn lat(&self) -> String {
        render_scalar(self.lat.as_ref())
    }

    pub fn lng(&self) -> String {
        render_scalar(self.lng.as_ref())
    }

    pub fn user_score(&self) -> String {
        render_scalar(self.user_score.as_ref())
    }

    pub fn review_cnt(&self) -> String {
        render_scalar(self.review_cnt.as_ref())
    }

    /// Area tags; anything other than a list yields none.
    pub fn area_tags(&self) -> Vec<String> {
        match &self.area {
            Some(Value::Array(tags)) => tags.iter().map(|tag| render_scalar(Some(tag))).collect(),
            _ => Vec::new(),
        }
    }
}

/// A record that survived deduplication, with its derived fields.
#[derive(Debug, Clone)]
pub struct Listing {
    pub display_name: String,
    pub address: String,
    pub record: ListingRecord,
}

impl Listing {
    pub fn from_record(record: ListingRecord) -> Self {
        Self {
            display_name: record.display_name(),
            address: record.address(),
            record,
        }
    }

    pub fn dedup_key(&self) -> String {
        format!("{}{}{}", self.display_name, DEDUP_KEY_SEPARATOR, self.address)
    }
}
