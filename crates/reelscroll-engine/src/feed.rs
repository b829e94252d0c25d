//! Feed requests and filter resolution.

use serde::{Deserialize, Serialize};
use serde_json::json;

use reelscroll_core::{
    normalize_criterion, normalize_object_filter, FilterCriteria, FilterMode, FindFilter,
    SceneMarker,
};

use crate::queries::SavedFilterWire;

/// Parameters of one feed fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedQuery {
    /// Free-text query.
    #[serde(default)]
    pub query: Option<String>,
    /// Manually selected tags.
    #[serde(default)]
    pub tag_ids: Vec<String>,
    /// Manually selected performers.
    #[serde(default)]
    pub performer_ids: Vec<String>,
    /// Saved filter to apply instead of the manual selection.
    #[serde(default)]
    pub saved_filter_id: Option<String>,
    /// Explicit item offset; pins the page instead of drawing one.
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl FeedQuery {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_tags<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_performers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.performer_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_saved_filter(mut self, id: impl Into<String>) -> Self {
        self.saved_filter_id = Some(id.into());
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Saved filter ID, if one is named.
    pub fn saved_filter(&self) -> Option<&str> {
        self.saved_filter_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Criteria from the manual tag/performer/query selection.
    pub fn manual_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            tags: normalize_criterion(&json!(self.tag_ids)),
            performers: normalize_criterion(&json!(self.performer_ids)),
            query: self.query.clone(),
            ..Default::default()
        }
    }
}

/// Server-stored query preset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedFilter {
    pub id: String,
    pub name: String,
    pub mode: Option<FilterMode>,
    pub find_filter: FindFilter,
    pub object_filter: FilterCriteria,
}

impl SavedFilter {
    /// Criteria to run the preset with. The find filter's query wins over
    /// one embedded in the object filter.
    pub fn criteria(&self) -> FilterCriteria {
        let mut criteria = self.object_filter.clone();
        if let Some(q) = self.find_filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
            criteria.query = Some(q.to_string());
        }
        criteria
    }
}

impl From<SavedFilterWire> for SavedFilter {
    fn from(wire: SavedFilterWire) -> Self {
        let object_filter = wire
            .object_filter
            .as_ref()
            .map(normalize_object_filter)
            .unwrap_or_default();
        Self {
            id: wire.id,
            name: wire.name,
            mode: wire.mode,
            find_filter: wire.find_filter.unwrap_or_default(),
            object_filter,
        }
    }
}

/// Marker criteria rewritten for a scene query: scene-level tag and
/// performer criteria become the scene's own.
pub fn scene_criteria(criteria: &FilterCriteria) -> FilterCriteria {
    FilterCriteria {
        tags: criteria.tags.clone().or_else(|| criteria.scene_tags.clone()),
        performers: criteria
            .performers
            .clone()
            .or_else(|| criteria.scene_performers.clone()),
        scene_tags: None,
        scene_performers: None,
        query: criteria.query.clone(),
        primary_tags: None,
        other: criteria.other.clone(),
    }
}

/// Keep markers whose primary tag is in `primary_tags` (all of them when
/// no primary-tag constraint is set).
pub fn filter_primary_tags(markers: Vec<SceneMarker>, primary_tags: Option<&[i64]>) -> Vec<SceneMarker> {
    let Some(wanted) = primary_tags.filter(|ids| !ids.is_empty()) else {
        return markers;
    };
    markers
        .into_iter()
        .filter(|marker| {
            marker
                .primary_tag
                .as_ref()
                .and_then(|tag| tag.id.trim().parse::<i64>().ok())
                .is_some_and(|id| wanted.contains(&id))
        })
        .collect()
}
