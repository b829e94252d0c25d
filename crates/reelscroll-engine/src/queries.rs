//! GraphQL documents and their response shapes.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use reelscroll_core::{
    FilterCriteria, FilterMode, FindFilter, GraphQLRequest, Performer, Result, Scene, SceneMarker,
    TagRef,
};

macro_rules! marker_fields {
    () => {
        "fragment MarkerFields on SceneMarker {
  id title seconds end_seconds stream preview screenshot
  primary_tag { id name }
  tags { id name }
  scene {
    id title
    files { path duration width height }
    paths { screenshot preview stream webp vtt }
    performers { id name image_path }
  }
}"
    };
}

macro_rules! scene_fields {
    () => {
        "fragment SceneFields on Scene {
  id title date details url rating100 o_counter
  studio { id name }
  performers { id name image_path }
  tags { id name }
  files { path duration width height }
  paths { screenshot preview stream webp vtt }
  sceneStreams { url mime_type label }
  scene_markers { id title seconds end_seconds primary_tag { id name } tags { id name } }
}"
    };
}

pub const FIND_SCENE_MARKERS: &str = concat!(
    "query FindSceneMarkers($filter: FindFilterType, $scene_marker_filter: SceneMarkerFilterType) {
  findSceneMarkers(filter: $filter, scene_marker_filter: $scene_marker_filter) {
    count
    scene_markers { ...MarkerFields }
  }
}
",
    marker_fields!()
);

pub const COUNT_SCENE_MARKERS: &str =
    "query CountSceneMarkers($filter: FindFilterType, $scene_marker_filter: SceneMarkerFilterType) {
  findSceneMarkers(filter: $filter, scene_marker_filter: $scene_marker_filter) { count }
}";

pub const FIND_MARKER: &str = concat!(
    "query FindSceneMarker($ids: [ID!]) {
  findSceneMarkers(ids: $ids) {
    count
    scene_markers { ...MarkerFields }
  }
}
",
    marker_fields!()
);

pub const FIND_SCENES: &str = concat!(
    "query FindScenes($filter: FindFilterType, $scene_filter: SceneFilterType) {
  findScenes(filter: $filter, scene_filter: $scene_filter) {
    count
    scenes { ...SceneFields }
  }
}
",
    scene_fields!()
);

pub const COUNT_SCENES: &str =
    "query CountScenes($filter: FindFilterType, $scene_filter: SceneFilterType) {
  findScenes(filter: $filter, scene_filter: $scene_filter) { count }
}";

pub const FIND_SCENE_TAGS: &str = "query FindSceneTags($id: ID!) {
  findScene(id: $id) { id tags { id name } }
}";

pub const FIND_TAGS: &str = "query FindTags($filter: FindFilterType) {
  findTags(filter: $filter) {
    count
    tags { id name }
  }
}";

pub const FIND_PERFORMERS: &str = "query FindPerformers($filter: FindFilterType) {
  findPerformers(filter: $filter) {
    count
    performers { id name image_path }
  }
}";

pub const FIND_SAVED_FILTER: &str = "query FindSavedFilter($id: ID!) {
  findSavedFilter(id: $id) {
    id name mode
    find_filter { q page per_page sort direction }
    object_filter
  }
}";

pub const FIND_SAVED_FILTERS: &str = "query FindSavedFilters($mode: FilterMode) {
  findSavedFilters(mode: $mode) { id name }
}";

pub const SCENE_MARKER_UPDATE: &str =
    "mutation SceneMarkerUpdate($input: SceneMarkerUpdateInput!) {
  sceneMarkerUpdate(input: $input) { id tags { id name } }
}";

pub const SCENE_MARKER_CREATE: &str =
    "mutation SceneMarkerCreate($input: SceneMarkerCreateInput!) {
  sceneMarkerCreate(input: $input) { id }
}";

pub const SCENE_UPDATE: &str = "mutation SceneUpdate($input: SceneUpdateInput!) {
  sceneUpdate(input: $input) { id rating100 tags { id name } }
}";

pub const SCENE_ADD_O: &str = "mutation SceneAddO($id: ID!) {
  sceneAddO(id: $id) { count }
}";

// =============================================================================
// REQUEST BUILDERS
// =============================================================================

pub fn find_scene_markers(find: &FindFilter, criteria: &FilterCriteria) -> GraphQLRequest {
    GraphQLRequest::new("FindSceneMarkers", FIND_SCENE_MARKERS).with_variables(json!({
        "filter": find,
        "scene_marker_filter": criteria.to_object_filter(),
    }))
}

pub fn count_scene_markers(criteria: &FilterCriteria) -> GraphQLRequest {
    GraphQLRequest::new("CountSceneMarkers", COUNT_SCENE_MARKERS).with_variables(json!({
        "filter": count_filter(criteria),
        "scene_marker_filter": criteria.to_object_filter(),
    }))
}

pub fn find_marker(marker_id: &str) -> GraphQLRequest {
    GraphQLRequest::new("FindSceneMarker", FIND_MARKER).with_variables(json!({ "ids": [marker_id] }))
}

pub fn find_scenes(find: &FindFilter, criteria: &FilterCriteria) -> GraphQLRequest {
    GraphQLRequest::new("FindScenes", FIND_SCENES).with_variables(json!({
        "filter": find,
        "scene_filter": criteria.to_object_filter(),
    }))
}

pub fn count_scenes(criteria: &FilterCriteria) -> GraphQLRequest {
    GraphQLRequest::new("CountScenes", COUNT_SCENES).with_variables(json!({
        "filter": count_filter(criteria),
        "scene_filter": criteria.to_object_filter(),
    }))
}

pub fn find_scene_tags(scene_id: &str) -> GraphQLRequest {
    GraphQLRequest::new("FindSceneTags", FIND_SCENE_TAGS).with_variables(json!({ "id": scene_id }))
}

pub fn find_tags(find: &FindFilter) -> GraphQLRequest {
    GraphQLRequest::new("FindTags", FIND_TAGS).with_variables(json!({ "filter": find }))
}

pub fn find_performers(find: &FindFilter) -> GraphQLRequest {
    GraphQLRequest::new("FindPerformers", FIND_PERFORMERS).with_variables(json!({ "filter": find }))
}

pub fn find_saved_filter(id: &str) -> GraphQLRequest {
    GraphQLRequest::new("FindSavedFilter", FIND_SAVED_FILTER).with_variables(json!({ "id": id }))
}

pub fn find_saved_filters(mode: FilterMode) -> GraphQLRequest {
    GraphQLRequest::new("FindSavedFilters", FIND_SAVED_FILTERS)
        .with_variables(json!({ "mode": mode.as_str() }))
}

pub fn scene_marker_update(input: JsonValue) -> GraphQLRequest {
    GraphQLRequest::new("SceneMarkerUpdate", SCENE_MARKER_UPDATE)
        .with_variables(json!({ "input": input }))
}

pub fn scene_marker_create(input: JsonValue) -> GraphQLRequest {
    GraphQLRequest::new("SceneMarkerCreate", SCENE_MARKER_CREATE)
        .with_variables(json!({ "input": input }))
}

pub fn scene_update(input: JsonValue) -> GraphQLRequest {
    GraphQLRequest::new("SceneUpdate", SCENE_UPDATE).with_variables(json!({ "input": input }))
}

pub fn scene_add_o(scene_id: &str) -> GraphQLRequest {
    GraphQLRequest::new("SceneAddO", SCENE_ADD_O).with_variables(json!({ "id": scene_id }))
}

fn count_filter(criteria: &FilterCriteria) -> FindFilter {
    FindFilter {
        q: criteria.query().map(str::to_string),
        per_page: Some(1),
        ..Default::default()
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Decode a `data` payload. Missing or null members decode to defaults, so
/// an empty (cancelled) payload yields an empty response.
pub fn decode<T: DeserializeOwned + Default>(data: JsonValue) -> Result<T> {
    if data.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(data)?)
}

#[derive(Debug, Default, Deserialize)]
pub struct FindSceneMarkersData {
    #[serde(rename = "findSceneMarkers", default)]
    pub result: Option<SceneMarkerPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SceneMarkerPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub scene_markers: Vec<SceneMarker>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindScenesData {
    #[serde(rename = "findScenes", default)]
    pub result: Option<ScenePage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScenePage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindSceneData {
    #[serde(rename = "findScene", default)]
    pub scene: Option<SceneTags>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SceneTags {
    pub id: String,
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindTagsData {
    #[serde(rename = "findTags", default)]
    pub result: Option<TagPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TagPage {
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindPerformersData {
    #[serde(rename = "findPerformers", default)]
    pub result: Option<PerformerPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PerformerPage {
    #[serde(default)]
    pub performers: Vec<Performer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindSavedFilterData {
    #[serde(rename = "findSavedFilter", default)]
    pub saved_filter: Option<SavedFilterWire>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SavedFilterWire {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: Option<FilterMode>,
    #[serde(default)]
    pub find_filter: Option<FindFilter>,
    #[serde(default)]
    pub object_filter: Option<JsonValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindSavedFiltersData {
    #[serde(rename = "findSavedFilters", default)]
    pub saved_filters: Option<Vec<SavedFilterRow>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SavedFilterRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SceneMarkerCreateData {
    #[serde(rename = "sceneMarkerCreate", default)]
    pub marker: Option<CreatedId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatedId {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SceneAddOData {
    #[serde(rename = "sceneAddO", default)]
    pub result: Option<OCount>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OCount {
    #[serde(default)]
    pub count: i32,
}
