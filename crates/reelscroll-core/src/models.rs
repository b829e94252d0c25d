//! Entity shapes exchanged with the media catalog.
//!
//! Field names follow the remote schema where compatibility matters
//! (`rating100`, `o_counter`, `sceneStreams`, ...).

use serde::{Deserialize, Serialize};

use crate::defaults::SYNTHETIC_MARKER_PREFIX;

/// Studio reference on a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Minimal tag reference (`{id, name}`), as used by autocomplete and chips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Full tag record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<TagRef>>,
}

impl From<&Tag> for TagRef {
    fn from(tag: &Tag) -> Self {
        TagRef {
            id: tag.id.clone(),
            name: tag.name.clone(),
        }
    }
}

/// Performer record (`{id, name, image_path}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Performer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// Media file attached to a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoFile {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Asset paths the server generates for a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenePaths {
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub webp: Option<String>,
    #[serde(default)]
    pub vtt: Option<String>,
}

/// One transcoded stream endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneStream {
    pub url: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Marker as embedded in a scene payload (no back-reference to the scene).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedMarker {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub seconds: f64,
    #[serde(default)]
    pub end_seconds: Option<f64>,
    #[serde(default)]
    pub primary_tag: Option<TagRef>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

/// Scene record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Wire rating, 0–100.
    #[serde(default)]
    pub rating100: Option<i32>,
    #[serde(default)]
    pub o_counter: Option<i32>,
    #[serde(default)]
    pub studio: Option<StudioRef>,
    #[serde(default)]
    pub performers: Vec<Performer>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    #[serde(default)]
    pub files: Vec<VideoFile>,
    #[serde(default)]
    pub paths: ScenePaths,
    #[serde(default, rename = "sceneStreams")]
    pub scene_streams: Vec<SceneStream>,
    #[serde(default)]
    pub scene_markers: Vec<EmbeddedMarker>,
}

impl Scene {
    /// Display title, falling back to the first file's basename.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return title.to_string();
        }
        self.files
            .first()
            .and_then(|f| f.path.as_deref())
            .and_then(|p| p.rsplit(['/', '\\']).next())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Scene {}", self.id))
    }
}

/// Scene reference carried by a marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerScene {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub files: Vec<VideoFile>,
    #[serde(default)]
    pub paths: ScenePaths,
    #[serde(default)]
    pub performers: Vec<Performer>,
}

/// Scene marker record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneMarker {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub seconds: f64,
    #[serde(default)]
    pub end_seconds: Option<f64>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub primary_tag: Option<TagRef>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    pub scene: MarkerScene,
}

/// A marker as shown in the feed: either held by the server or a
/// placeholder for a whole, unmarked scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneMarkerView {
    Real(SceneMarker),
    Synthetic(SyntheticMarker),
}

impl SceneMarkerView {
    pub fn id(&self) -> &str {
        match self {
            SceneMarkerView::Real(m) => &m.id,
            SceneMarkerView::Synthetic(m) => &m.id,
        }
    }

    pub fn scene_id(&self) -> &str {
        match self {
            SceneMarkerView::Real(m) => &m.scene.id,
            SceneMarkerView::Synthetic(m) => &m.scene.id,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, SceneMarkerView::Synthetic(_))
    }
}

/// Placeholder marker spanning a whole scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticMarker {
    pub id: String,
    pub title: String,
    pub seconds: f64,
    pub scene: Scene,
}

impl SyntheticMarker {
    /// Build the placeholder for `scene`. The ID is derived from the scene
    /// and never persisted.
    pub fn for_scene(scene: Scene) -> Self {
        Self {
            id: format!("{}{}", SYNTHETIC_MARKER_PREFIX, scene.id),
            title: scene.display_title(),
            seconds: 0.0,
            scene,
        }
    }
}

/// True if `id` names a synthetic marker.
pub fn is_synthetic_marker_id(id: &str) -> bool {
    id.starts_with(SYNTHETIC_MARKER_PREFIX)
}

/// Mode a saved filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterMode {
    Scenes,
    SceneMarkers,
    Tags,
    Performers,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Scenes => "SCENES",
            FilterMode::SceneMarkers => "SCENE_MARKERS",
            FilterMode::Tags => "TAGS",
            FilterMode::Performers => "PERFORMERS",
        }
    }
}

/// Sort direction of a find filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Paging/sorting half of a query (`FindFilterType`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
}

/// Summary row for saved filter pickers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFilterSummary {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_deserializes_scene_streams_rename() {
        let json = serde_json::json!({
            "id": "12",
            "title": "Beach",
            "rating100": 80,
            "sceneStreams": [{"url": "http://x/stream.mp4", "mime_type": "video/mp4"}],
            "paths": {"screenshot": "http://x/s.jpg"}
        });
        let scene: Scene = serde_json::from_value(json).unwrap();
        assert_eq!(scene.rating100, Some(80));
        assert_eq!(scene.scene_streams.len(), 1);
        assert_eq!(scene.paths.screenshot.as_deref(), Some("http://x/s.jpg"));
        assert!(scene.performers.is_empty());
    }

    #[test]
    fn test_display_title_falls_back_to_file_name() {
        let scene = Scene {
            id: "3".into(),
            title: Some("  ".into()),
            files: vec![VideoFile {
                path: Some("/media/clips/holiday.mp4".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(scene.display_title(), "holiday.mp4");

        let bare = Scene {
            id: "4".into(),
            ..Default::default()
        };
        assert_eq!(bare.display_title(), "Scene 4");
    }

    #[test]
    fn test_synthetic_marker_ids_are_prefixed() {
        let marker = SyntheticMarker::for_scene(Scene {
            id: "42".into(),
            title: Some("Intro".into()),
            ..Default::default()
        });
        assert_eq!(marker.id, "synthetic-42");
        assert_eq!(marker.title, "Intro");
        assert!(is_synthetic_marker_id(&marker.id));
        assert!(!is_synthetic_marker_id("42"));
    }

    #[test]
    fn test_marker_view_accessors() {
        let view = SceneMarkerView::Synthetic(SyntheticMarker::for_scene(Scene {
            id: "7".into(),
            ..Default::default()
        }));
        assert!(view.is_synthetic());
        assert_eq!(view.scene_id(), "7");
        assert_eq!(view.id(), "synthetic-7");
    }

    #[test]
    fn test_filter_mode_wire_names() {
        assert_eq!(
            serde_json::to_value(FilterMode::SceneMarkers).unwrap(),
            serde_json::json!("SCENE_MARKERS")
        );
        assert_eq!(FilterMode::Scenes.as_str(), "SCENES");
    }
}
