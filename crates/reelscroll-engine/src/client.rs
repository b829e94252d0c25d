//! The feed client: one handle over transport, caches and feeds.
//!
//! Read operations never fail: transport and schema errors are logged and
//! come back as empty results, and cancellation yields the same empty
//! result silently. Write operations return `Result` and refuse synthetic
//! marker IDs before touching the network.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use reelscroll_core::{
    empty_payload, is_synthetic_marker_id, to_rating100, Error, FilterCriteria, FilterMode,
    FindFilter, GraphQLRequest, HostClient, Performer, RequestSignature, Result, Scene,
    SceneMarker, SceneMarkerView, SavedFilterSummary, SortDirection, TagRef, Transport,
};
use reelscroll_transport::{select_transport, TransportConfig};

use crate::cache::{spawn_sweeper, CacheStats, ResultCache};
use crate::config::EngineConfig;
use crate::dedup::Deduplicator;
use crate::existence::ExistenceChecker;
use crate::feed::{filter_primary_tags, scene_criteria, FeedQuery, SavedFilter};
use crate::pager::{fetch_random_page, random_sort_token};
use crate::queries::{
    self, decode, FindPerformersData, FindSavedFilterData, FindSavedFiltersData,
    FindSceneData, FindSceneMarkersData, FindTagsData, SceneAddOData, SceneMarkerCreateData,
};
use crate::shuffle::{expand_scenes, filter_by_marker_density};
use crate::sources::{MarkerCountProbe, MarkerLink, MarkerSource, SceneSource};

/// Input of [`FeedClient::create_marker`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMarker {
    pub scene_id: String,
    pub title: String,
    pub seconds: f64,
    #[serde(default)]
    pub end_seconds: Option<f64>,
    pub primary_tag_id: String,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

/// Data-access client for the feed.
pub struct FeedClient {
    transport: Arc<dyn Transport>,
    config: EngineConfig,
    search_cache: ResultCache<JsonValue>,
    in_flight: Deduplicator<JsonValue>,
    tag_markers: ExistenceChecker,
    performer_markers: ExistenceChecker,
    shutdown: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl FeedClient {
    /// Build a client over `transport` and start the cache sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(transport: Arc<dyn Transport>, config: EngineConfig) -> Self {
        let shutdown = CancellationToken::new();
        let search_cache = ResultCache::new(config.cache_ttl, config.cache_max_entries);
        let sweeper = spawn_sweeper(
            search_cache.clone(),
            config.sweep_interval,
            shutdown.clone(),
        );

        info!(
            subsystem = "engine",
            component = "client",
            backend = transport.name(),
            ttl_secs = config.cache_ttl.as_secs(),
            "Feed client created"
        );

        Self {
            tag_markers: ExistenceChecker::new(
                "tags_with_markers",
                config.membership_max,
                config.existence_batch_size,
                config.existence_max_concurrent_batches,
            ),
            performer_markers: ExistenceChecker::new(
                "performers_with_markers",
                config.membership_max,
                config.existence_batch_size,
                config.existence_max_concurrent_batches,
            ),
            transport,
            config,
            search_cache,
            in_flight: Deduplicator::new(),
            shutdown,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    /// Build a client from environment configuration, preferring `host`
    /// over raw HTTP when given.
    pub fn from_env(host: Option<Arc<dyn HostClient>>) -> Result<Self> {
        let transport = select_transport(host, TransportConfig::from_env())?;
        Ok(Self::create(transport, EngineConfig::from_env()))
    }

    /// Stop the sweeper and wait for it. In-flight reads resolve empty;
    /// later writes fail.
    pub async fn dispose(&self) {
        self.shutdown.cancel();
        let handle = self.sweeper.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(
                    subsystem = "engine",
                    component = "client",
                    error = %e,
                    "Cache sweeper ended abnormally"
                );
            }
        }
        info!(subsystem = "engine", component = "client", "Feed client disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name of the transport backend in use.
    pub fn backend(&self) -> &'static str {
        self.transport.name()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.search_cache.stats().await
    }

    // =========================================================================
    // SHARED READ PATH
    // =========================================================================

    /// Cache, then in-flight dedup, then transport.
    async fn read(
        &self,
        signature: RequestSignature,
        request: GraphQLRequest,
        cacheable: bool,
        cancel: &CancellationToken,
    ) -> Result<JsonValue> {
        if cancel.is_cancelled() {
            return Ok(empty_payload());
        }
        if cacheable {
            if let Some(hit) = self.search_cache.get(&signature).await {
                return Ok(hit);
            }
        }

        let transport = Arc::clone(&self.transport);
        let token = self.shutdown.child_token();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(
                    subsystem = "engine",
                    component = "client",
                    signature = %signature,
                    "Read cancelled"
                );
                return Ok(empty_payload());
            }
            outcome = self.in_flight.dedupe(&signature, move || async move {
                transport.execute(&request, &token).await
            }) => outcome,
        };

        let data = outcome?;
        if cacheable && !cancel.is_cancelled() && !self.shutdown.is_cancelled() {
            self.search_cache.set(signature, data.clone()).await;
        }
        Ok(data)
    }

    fn absorb<T: Default>(&self, op: &str, outcome: Result<T>) -> T {
        match outcome {
            Ok(value) => value,
            Err(e) => {
                error!(
                    subsystem = "engine",
                    component = "client",
                    op,
                    error = %e,
                    "Read failed, returning empty result"
                );
                T::default()
            }
        }
    }

    // =========================================================================
    // AUTOCOMPLETE
    // =========================================================================

    /// Tags matching `term`, as `{id, name}`. A blank term returns a random
    /// selection that is never cached.
    pub async fn search_tags(&self, term: &str, limit: u32, cancel: &CancellationToken) -> Vec<TagRef> {
        let (find, cacheable) = autocomplete_filter(term, limit);
        let signature = autocomplete_signature("FindTags", term, limit, &find);
        let outcome = self
            .read(signature, queries::find_tags(&find), cacheable, cancel)
            .await
            .and_then(decode::<FindTagsData>)
            .map(|data| data.result.map(|page| page.tags).unwrap_or_default());
        self.absorb("FindTags", outcome)
    }

    /// Performers matching `term`, as `{id, name, image_path}`.
    pub async fn search_performers(
        &self,
        term: &str,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Vec<Performer> {
        let (find, cacheable) = autocomplete_filter(term, limit);
        let signature = autocomplete_signature("FindPerformers", term, limit, &find);
        let outcome = self
            .read(signature, queries::find_performers(&find), cacheable, cancel)
            .await
            .and_then(decode::<FindPerformersData>)
            .map(|data| data.result.map(|page| page.performers).unwrap_or_default());
        self.absorb("FindPerformers", outcome)
    }

    /// Subset of tag `ids` that have at least one marker.
    pub async fn tags_with_markers(
        &self,
        ids: &HashSet<String>,
        cancel: &CancellationToken,
    ) -> HashSet<String> {
        let probe = MarkerCountProbe::new(Arc::clone(&self.transport), MarkerLink::Tag, cancel.clone());
        let found = self.tag_markers.check(ids, &probe).await;
        if cancel.is_cancelled() {
            return HashSet::new();
        }
        found
    }

    /// Subset of performer `ids` that have at least one marker.
    pub async fn performers_with_markers(
        &self,
        ids: &HashSet<String>,
        cancel: &CancellationToken,
    ) -> HashSet<String> {
        let probe = MarkerCountProbe::new(
            Arc::clone(&self.transport),
            MarkerLink::Performer,
            cancel.clone(),
        );
        let found = self.performer_markers.check(ids, &probe).await;
        if cancel.is_cancelled() {
            return HashSet::new();
        }
        found
    }

    // =========================================================================
    // SAVED FILTERS
    // =========================================================================

    /// Load one saved filter with its object filter normalized.
    pub async fn load_saved_filter(&self, id: &str, cancel: &CancellationToken) -> Option<SavedFilter> {
        let signature = RequestSignature::builder("FindSavedFilter")
            .param("id", id)
            .build();
        let outcome = self
            .read(signature, queries::find_saved_filter(id), false, cancel)
            .await
            .and_then(decode::<FindSavedFilterData>)
            .map(|data| data.saved_filter.map(SavedFilter::from));
        self.absorb("FindSavedFilter", outcome)
    }

    /// `{id, name}` of every saved filter for `mode`.
    pub async fn list_saved_filters(
        &self,
        mode: FilterMode,
        cancel: &CancellationToken,
    ) -> Vec<SavedFilterSummary> {
        let signature = RequestSignature::builder("FindSavedFilters")
            .param("mode", mode)
            .build();
        let outcome = self
            .read(signature, queries::find_saved_filters(mode), false, cancel)
            .await
            .and_then(decode::<FindSavedFiltersData>)
            .map(|data| {
                data.saved_filters
                    .unwrap_or_default()
                    .into_iter()
                    .map(|row| SavedFilterSummary {
                        id: row.id,
                        name: row.name,
                    })
                    .collect()
            });
        self.absorb("FindSavedFilters", outcome)
    }

    /// Criteria for `query`. A named saved filter replaces the manual
    /// selection entirely; if it cannot be loaded the manual selection is
    /// used.
    pub async fn resolve_criteria(&self, query: &FeedQuery, cancel: &CancellationToken) -> FilterCriteria {
        if let Some(id) = query.saved_filter() {
            if let Some(saved) = self.load_saved_filter(id, cancel).await {
                debug!(
                    subsystem = "engine",
                    component = "client",
                    saved_filter = %saved.id,
                    "Applying saved filter"
                );
                return saved.criteria();
            }
            if !cancel.is_cancelled() {
                warn!(
                    subsystem = "engine",
                    component = "client",
                    saved_filter = id,
                    "Saved filter unavailable, using manual filters"
                );
            }
        }
        query.manual_criteria()
    }

    // =========================================================================
    // FEEDS
    // =========================================================================

    fn page_size(&self, query: &FeedQuery) -> u32 {
        query
            .per_page
            .filter(|&n| n > 0)
            .unwrap_or(self.config.page_size)
    }

    /// One page of scene markers.
    pub async fn fetch_marker_feed(&self, query: &FeedQuery, cancel: &CancellationToken) -> Vec<SceneMarker> {
        let started = Instant::now();
        let criteria = self.resolve_criteria(query, cancel).await;
        let source = MarkerSource::new(Arc::clone(&self.transport));
        let outcome =
            fetch_random_page(&source, &criteria, self.page_size(query), query.offset, cancel).await;
        let markers = self.absorb("FindSceneMarkers", outcome);
        if cancel.is_cancelled() {
            return Vec::new();
        }

        let markers = filter_primary_tags(markers, criteria.primary_tags.as_deref());
        debug!(
            subsystem = "engine",
            component = "client",
            feed = "markers",
            result_count = markers.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Fetched marker feed"
        );
        markers
    }

    /// One page of scenes.
    pub async fn fetch_scene_feed(&self, query: &FeedQuery, cancel: &CancellationToken) -> Vec<Scene> {
        let started = Instant::now();
        let criteria = scene_criteria(&self.resolve_criteria(query, cancel).await);
        let source = SceneSource::new(Arc::clone(&self.transport));
        let outcome =
            fetch_random_page(&source, &criteria, self.page_size(query), query.offset, cancel).await;
        let scenes = self.absorb("FindScenes", outcome);
        if cancel.is_cancelled() {
            return Vec::new();
        }

        debug!(
            subsystem = "engine",
            component = "client",
            feed = "scenes",
            result_count = scenes.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Fetched scene feed"
        );
        scenes
    }

    /// Shuffle feed: a random page of scenes expanded into markers (real or
    /// synthetic), biased toward sparsely marked scenes.
    pub async fn fetch_shuffle_feed(
        &self,
        query: &FeedQuery,
        cancel: &CancellationToken,
    ) -> Vec<SceneMarkerView> {
        let scenes = self.fetch_scene_feed(query, cancel).await;
        let items = expand_scenes(scenes);
        let expanded = items.len();
        let kept = filter_by_marker_density(items, self.config.shuffle_max_markers_per_scene);
        debug!(
            subsystem = "engine",
            component = "client",
            feed = "shuffle",
            expanded,
            result_count = kept.len(),
            "Applied marker density filter"
        );
        kept
    }

    // =========================================================================
    // WRITE PATH
    // =========================================================================

    async fn write(&self, request: GraphQLRequest) -> Result<JsonValue> {
        if self.shutdown.is_cancelled() {
            return Err(Error::Internal("feed client disposed".into()));
        }
        let token = self.shutdown.child_token();
        self.transport
            .execute(&request, &token)
            .await
            .and_then(|data| {
                // A cancelled transport call hands back an empty payload; the
                // mutation outcome is unknown.
                if token.is_cancelled() {
                    Err(Error::Internal("feed client disposed".into()))
                } else {
                    Ok(data)
                }
            })
            .inspect_err(|e| {
                error!(
                    subsystem = "engine",
                    component = "client",
                    op = %request.operation_name,
                    error = %e,
                    "Write operation failed"
                );
            })
    }

    async fn fetch_marker(&self, marker_id: &str) -> Result<SceneMarker> {
        let data: FindSceneMarkersData = decode(self.write(queries::find_marker(marker_id)).await?)?;
        data.result
            .and_then(|page| page.scene_markers.into_iter().find(|m| m.id == marker_id))
            .ok_or_else(|| Error::InvalidInput(format!("Marker {} not found", marker_id)))
    }

    /// True if the marker carries `tag_id` as a tag or primary tag.
    /// Synthetic markers never do.
    #[instrument(skip(self), fields(subsystem = "engine", component = "client"))]
    pub async fn marker_has_tag(&self, marker_id: &str, tag_id: &str) -> Result<bool> {
        if is_synthetic_marker_id(marker_id) {
            return Ok(false);
        }
        let marker = self.fetch_marker(marker_id).await?;
        Ok(marker.tags.iter().any(|t| t.id == tag_id)
            || marker.primary_tag.as_ref().is_some_and(|t| t.id == tag_id))
    }

    /// Add `tag_id` to the marker's tags. No-op if already present.
    #[instrument(skip(self), fields(subsystem = "engine", component = "client"))]
    pub async fn add_tag_to_marker(&self, marker_id: &str, tag_id: &str) -> Result<()> {
        reject_synthetic(marker_id)?;
        let marker = self.fetch_marker(marker_id).await?;
        let mut tag_ids: Vec<String> = marker.tags.into_iter().map(|t| t.id).collect();
        if tag_ids.iter().any(|id| id == tag_id) {
            return Ok(());
        }
        tag_ids.push(tag_id.to_string());
        self.write(queries::scene_marker_update(json!({
            "id": marker_id,
            "tag_ids": tag_ids,
        })))
        .await?;
        info!(marker_id, tag_id, "Added tag to marker");
        Ok(())
    }

    /// Remove `tag_id` from the marker's tags. No-op if absent.
    #[instrument(skip(self), fields(subsystem = "engine", component = "client"))]
    pub async fn remove_tag_from_marker(&self, marker_id: &str, tag_id: &str) -> Result<()> {
        reject_synthetic(marker_id)?;
        let marker = self.fetch_marker(marker_id).await?;
        let before = marker.tags.len();
        let tag_ids: Vec<String> = marker
            .tags
            .into_iter()
            .map(|t| t.id)
            .filter(|id| id != tag_id)
            .collect();
        if tag_ids.len() == before {
            return Ok(());
        }
        self.write(queries::scene_marker_update(json!({
            "id": marker_id,
            "tag_ids": tag_ids,
        })))
        .await?;
        info!(marker_id, tag_id, "Removed tag from marker");
        Ok(())
    }

    /// Add `tag_id` to the scene's tags. No-op if already present.
    #[instrument(skip(self), fields(subsystem = "engine", component = "client"))]
    pub async fn add_tag_to_scene(&self, scene_id: &str, tag_id: &str) -> Result<()> {
        let data: FindSceneData = decode(self.write(queries::find_scene_tags(scene_id)).await?)?;
        let scene = data
            .scene
            .ok_or_else(|| Error::InvalidInput(format!("Scene {} not found", scene_id)))?;
        let mut tag_ids: Vec<String> = scene.tags.into_iter().map(|t| t.id).collect();
        if tag_ids.iter().any(|id| id == tag_id) {
            return Ok(());
        }
        tag_ids.push(tag_id.to_string());
        self.write(queries::scene_update(json!({
            "id": scene_id,
            "tag_ids": tag_ids,
        })))
        .await?;
        info!(scene_id, tag_id, "Added tag to scene");
        Ok(())
    }

    /// Create a marker and return its ID.
    #[instrument(skip(self, marker), fields(subsystem = "engine", component = "client", scene_id = %marker.scene_id))]
    pub async fn create_marker(&self, marker: &NewMarker) -> Result<String> {
        validate_new_marker(marker)?;
        let data: SceneMarkerCreateData = decode(
            self.write(queries::scene_marker_create(json!({
                "scene_id": marker.scene_id,
                "title": marker.title,
                "seconds": marker.seconds,
                "end_seconds": marker.end_seconds,
                "primary_tag_id": marker.primary_tag_id,
                "tag_ids": marker.tag_ids,
            })))
            .await?,
        )?;
        let id = data
            .marker
            .map(|m| m.id)
            .ok_or_else(|| Error::Internal("sceneMarkerCreate returned no marker".into()))?;
        info!(marker_id = %id, "Created marker");
        Ok(id)
    }

    /// Store a 0–10 rating; returns the stored 0–100 value.
    #[instrument(skip(self), fields(subsystem = "engine", component = "client"))]
    pub async fn set_scene_rating(&self, scene_id: &str, rating: f64) -> Result<i32> {
        let rating100 = to_rating100(rating);
        self.write(queries::scene_update(json!({
            "id": scene_id,
            "rating100": rating100,
        })))
        .await?;
        info!(scene_id, rating100, "Updated scene rating");
        Ok(rating100)
    }

    /// Increment the scene's O-counter; returns the new count.
    #[instrument(skip(self), fields(subsystem = "engine", component = "client"))]
    pub async fn increment_o_counter(&self, scene_id: &str) -> Result<i32> {
        let data: SceneAddOData = decode(self.write(queries::scene_add_o(scene_id)).await?)?;
        let count = data.result.map(|r| r.count).unwrap_or_default();
        info!(scene_id, count, "Incremented O-counter");
        Ok(count)
    }
}

impl Drop for FeedClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn reject_synthetic(marker_id: &str) -> Result<()> {
    if is_synthetic_marker_id(marker_id) {
        return Err(Error::InvalidInput(format!(
            "Synthetic marker {} cannot be modified",
            marker_id
        )));
    }
    Ok(())
}

fn validate_new_marker(marker: &NewMarker) -> Result<()> {
    if marker.scene_id.trim().is_empty() {
        return Err(Error::InvalidInput("scene_id is required".into()));
    }
    if marker.primary_tag_id.trim().is_empty() {
        return Err(Error::InvalidInput("primary_tag_id is required".into()));
    }
    if !marker.seconds.is_finite() || marker.seconds < 0.0 {
        return Err(Error::InvalidInput(format!(
            "Invalid marker start: {}",
            marker.seconds
        )));
    }
    if let Some(end) = marker.end_seconds {
        if !end.is_finite() || end <= marker.seconds {
            return Err(Error::InvalidInput(format!(
                "Marker end {} must be after start {}",
                end, marker.seconds
            )));
        }
    }
    Ok(())
}

/// Find filter for an autocomplete lookup, and whether its result may be
/// cached. Blank terms ask for a random selection.
fn autocomplete_filter(term: &str, limit: u32) -> (FindFilter, bool) {
    let per_page = Some(i32::try_from(limit.max(1)).unwrap_or(i32::MAX));
    let term = term.trim();
    if term.is_empty() {
        let sort = random_sort_token(&mut rand::thread_rng());
        return (
            FindFilter {
                per_page,
                sort: Some(sort),
                ..Default::default()
            },
            false,
        );
    }
    (
        FindFilter {
            q: Some(term.to_string()),
            per_page,
            sort: Some("name".to_string()),
            direction: Some(SortDirection::Asc),
            ..Default::default()
        },
        true,
    )
}

fn autocomplete_signature(op: &str, term: &str, limit: u32, find: &FindFilter) -> RequestSignature {
    RequestSignature::builder(op)
        .term("q", term)
        .param("limit", limit)
        .param("sort", &find.sort)
        .build()
}
