//! Filter normalization.
//!
//! Saved presets and ad-hoc UI state describe ID criteria in three shapes:
//!
//! ```text
//! ["1", 2, {"id": "3"}]                                  bare ID list
//! {"value": ["1", 2], "modifier": "INCLUDES_ALL"}         wrapped list
//! {"value": {"items": [{"id": "5", "label": "x"}]}}       selection widget
//! ```
//!
//! [`normalize_criterion`] folds all three into a [`MultiCriterion`]. It is
//! total: malformed input yields `None` (field omitted), never an error and
//! never a zero ID.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Comparison modifier of a criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionModifier {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    IsNull,
    NotNull,
    IncludesAll,
    #[default]
    Includes,
    Excludes,
    MatchesRegex,
    NotMatchesRegex,
    Between,
    NotBetween,
}

/// Canonical ID criterion: `{value: number[], modifier}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiCriterion {
    pub value: Vec<i64>,
    pub modifier: CriterionModifier,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<i32>,
}

impl MultiCriterion {
    /// `INCLUDES` criterion over `ids`, or `None` when `ids` is empty.
    pub fn includes(ids: impl IntoIterator<Item = i64>) -> Option<Self> {
        let value: Vec<i64> = ids.into_iter().collect();
        if value.is_empty() {
            return None;
        }
        Some(Self {
            value,
            modifier: CriterionModifier::Includes,
            excludes: Vec::new(),
            depth: None,
        })
    }
}

/// Canonical filter shape.
///
/// Serializing a `FilterCriteria` produces the object filter sent to the
/// server; `query` travels in the find filter instead and `primary_tags` is
/// applied to fetched markers, so neither is serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<MultiCriterion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_tags: Option<MultiCriterion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_performers: Option<MultiCriterion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performers: Option<MultiCriterion>,
    #[serde(skip)]
    pub query: Option<String>,
    #[serde(skip)]
    pub primary_tags: Option<Vec<i64>>,
    /// Criteria this layer does not interpret, passed through verbatim.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl FilterCriteria {
    /// True if any real constraint is present.
    pub fn is_active(&self) -> bool {
        self.tags.is_some()
            || self.scene_tags.is_some()
            || self.scene_performers.is_some()
            || self.performers.is_some()
            || self.query().is_some()
            || self.primary_tags.as_ref().is_some_and(|t| !t.is_empty())
            || !self.other.is_empty()
    }

    /// Trimmed free-text query, `None` when blank.
    pub fn query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// Object filter for the GraphQL `*_filter` argument.
    pub fn to_object_filter(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<MultiCriterion>> {
        match key {
            "tags" => Some(&mut self.tags),
            "scene_tags" => Some(&mut self.scene_tags),
            "scene_performers" => Some(&mut self.scene_performers),
            "performers" => Some(&mut self.performers),
            _ => None,
        }
    }
}

/// The three accepted input shapes. Order matters for untagged matching:
/// a bare list first, then a list under `value`, then a selection payload.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCriterion {
    Ids(Vec<Value>),
    Wrapped {
        value: Vec<Value>,
        #[serde(default)]
        modifier: Option<Value>,
        #[serde(default)]
        excludes: Option<Value>,
        #[serde(default)]
        depth: Option<Value>,
    },
    Selection {
        value: SelectionPayload,
        #[serde(default)]
        modifier: Option<Value>,
    },
}

#[derive(Debug, Deserialize)]
struct SelectionPayload {
    items: Vec<Value>,
    #[serde(default)]
    excluded: Option<Value>,
    #[serde(default)]
    depth: Option<Value>,
}

/// Normalize one ID criterion. Returns `None` (omit the field) when the
/// input is unrecognized or yields no valid IDs.
pub fn normalize_criterion(raw: &Value) -> Option<MultiCriterion> {
    let parsed = match RawCriterion::deserialize(raw) {
        Ok(parsed) => parsed,
        Err(_) => {
            if !raw.is_null() {
                warn!(
                    subsystem = "core",
                    component = "filter",
                    "Unrecognized criterion shape, dropping field"
                );
            }
            return None;
        }
    };

    let (items, modifier, excluded, depth) = match parsed {
        RawCriterion::Ids(items) => (items, None, None, None),
        RawCriterion::Wrapped {
            value,
            modifier,
            excludes,
            depth,
        } => (value, modifier, excludes, depth),
        RawCriterion::Selection { value, modifier } => {
            (value.items, modifier, value.excluded, value.depth)
        }
    };

    let value = extract_ids(&items);
    if value.is_empty() {
        if !items.is_empty() {
            warn!(
                subsystem = "core",
                component = "filter",
                id_count = items.len(),
                "Criterion contained no valid IDs, dropping field"
            );
        }
        return None;
    }

    Some(MultiCriterion {
        value,
        modifier: parse_modifier(modifier.as_ref()),
        excludes: parse_excludes(excluded.as_ref()),
        depth: parse_depth(depth.as_ref()),
    })
}

/// `excludes` must be a list; any other shape is ignored.
fn parse_excludes(raw: Option<&Value>) -> Vec<i64> {
    match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => extract_ids(items),
        Some(other) => {
            warn!(
                subsystem = "core",
                component = "filter",
                excludes = %other,
                "Malformed excludes, ignoring"
            );
            Vec::new()
        }
    }
}

fn parse_depth(raw: Option<&Value>) -> Option<i32> {
    let value = raw.filter(|v| !v.is_null())?;
    let depth = parse_id(value).and_then(|d| i32::try_from(d).ok());
    if depth.is_none() {
        warn!(
            subsystem = "core",
            component = "filter",
            depth = %value,
            "Malformed depth, ignoring"
        );
    }
    depth
}

/// Normalize a whole object filter (e.g. from a saved filter). ID criteria
/// are normalized, `primary_tags` is parsed as an ID list and everything
/// else passes through.
pub fn normalize_object_filter(raw: &Value) -> FilterCriteria {
    let mut criteria = FilterCriteria::default();
    let Some(map) = raw.as_object() else {
        if !raw.is_null() {
            warn!(
                subsystem = "core",
                component = "filter",
                "Object filter is not a JSON object, ignoring"
            );
        }
        return criteria;
    };

    for (key, value) in map {
        if let Some(slot) = criteria.slot_mut(key) {
            *slot = normalize_criterion(value);
            continue;
        }
        match key.as_str() {
            "primary_tags" => {
                let ids = match value {
                    Value::Array(items) => extract_ids(items),
                    other => normalize_criterion(other)
                        .map(|c| c.value)
                        .unwrap_or_default(),
                };
                if !ids.is_empty() {
                    criteria.primary_tags = Some(ids);
                }
            }
            "query" | "q" => {
                criteria.query = value.as_str().map(str::to_string);
            }
            _ => {
                criteria.other.insert(key.clone(), value.clone());
            }
        }
    }

    criteria
}

fn extract_ids(items: &[Value]) -> Vec<i64> {
    items.iter().filter_map(extract_id).collect()
}

/// Object elements contribute `.id`, then `.value`; anything else is parsed
/// as-is.
fn extract_id(element: &Value) -> Option<i64> {
    let candidate = match element {
        Value::Object(map) => map
            .get("id")
            .filter(|v| !v.is_null())
            .or_else(|| map.get("value"))
            .unwrap_or(element),
        other => other,
    };
    parse_id(candidate)
}

/// Integers only: fractional numbers and strings such as `"5.7"` or
/// `"12abc"` are rejected, never truncated.
fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn parse_modifier(raw: Option<&Value>) -> CriterionModifier {
    match raw {
        None | Some(Value::Null) => CriterionModifier::Includes,
        Some(value) => CriterionModifier::deserialize(value).unwrap_or_else(|_| {
            warn!(
                subsystem = "core",
                component = "filter",
                modifier = %value,
                "Unknown criterion modifier, defaulting to INCLUDES"
            );
            CriterionModifier::Includes
        }),
    }
}
