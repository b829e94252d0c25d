//! Transport-backed page sources and existence probes.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use reelscroll_core::{FilterCriteria, FindFilter, MultiCriterion, Result, Scene, SceneMarker, Transport};

use crate::existence::ExistenceProbe;
use crate::pager::{Page, PageRequest, PageSource};
use crate::queries::{self, decode, FindSceneMarkersData, FindScenesData};

fn page_filter(filter: &FilterCriteria, request: &PageRequest) -> FindFilter {
    FindFilter {
        q: filter.query().map(str::to_string),
        page: Some(request.page),
        per_page: Some(i32::try_from(request.per_page).unwrap_or(i32::MAX)),
        sort: Some(request.sort.clone()),
        direction: None,
    }
}

/// Scene markers collection.
pub struct MarkerSource {
    transport: Arc<dyn Transport>,
}

impl MarkerSource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl PageSource<SceneMarker> for MarkerSource {
    fn name(&self) -> &'static str {
        "scene_markers"
    }

    async fn count(&self, filter: &FilterCriteria, cancel: &CancellationToken) -> Result<u64> {
        let data = self
            .transport
            .execute(&queries::count_scene_markers(filter), cancel)
            .await?;
        let data: FindSceneMarkersData = decode(data)?;
        Ok(data.result.map(|r| r.count).unwrap_or(0))
    }

    async fn fetch(
        &self,
        filter: &FilterCriteria,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<SceneMarker>> {
        let find = page_filter(filter, request);
        let data = self
            .transport
            .execute(&queries::find_scene_markers(&find, filter), cancel)
            .await?;
        let data: FindSceneMarkersData = decode(data)?;
        Ok(data
            .result
            .map(|r| Page {
                count: r.count,
                items: r.scene_markers,
            })
            .unwrap_or_default())
    }
}

/// Scenes collection.
pub struct SceneSource {
    transport: Arc<dyn Transport>,
}

impl SceneSource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl PageSource<Scene> for SceneSource {
    fn name(&self) -> &'static str {
        "scenes"
    }

    async fn count(&self, filter: &FilterCriteria, cancel: &CancellationToken) -> Result<u64> {
        let data = self
            .transport
            .execute(&queries::count_scenes(filter), cancel)
            .await?;
        let data: FindScenesData = decode(data)?;
        Ok(data.result.map(|r| r.count).unwrap_or(0))
    }

    async fn fetch(
        &self,
        filter: &FilterCriteria,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<Scene>> {
        let find = page_filter(filter, request);
        let data = self
            .transport
            .execute(&queries::find_scenes(&find, filter), cancel)
            .await?;
        let data: FindScenesData = decode(data)?;
        Ok(data
            .result
            .map(|r| Page {
                count: r.count,
                items: r.scenes,
            })
            .unwrap_or_default())
    }
}

/// Which marker criterion an ID is probed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerLink {
    Tag,
    Performer,
}

/// "Has at least one marker" probe for tags or performers.
pub struct MarkerCountProbe {
    source: MarkerSource,
    link: MarkerLink,
    cancel: CancellationToken,
}

impl MarkerCountProbe {
    pub fn new(transport: Arc<dyn Transport>, link: MarkerLink, cancel: CancellationToken) -> Self {
        Self {
            source: MarkerSource::new(transport),
            link,
            cancel,
        }
    }

    fn criteria(&self, ids: Vec<i64>) -> Option<FilterCriteria> {
        let criterion = MultiCriterion::includes(ids)?;
        let mut criteria = FilterCriteria::default();
        match self.link {
            MarkerLink::Tag => criteria.tags = Some(criterion),
            MarkerLink::Performer => criteria.performers = Some(criterion),
        }
        Some(criteria)
    }
}

#[async_trait]
impl ExistenceProbe for MarkerCountProbe {
    async fn count_one(&self, id: &str) -> Result<u64> {
        let Ok(parsed) = id.trim().parse::<i64>() else {
            return Ok(0);
        };
        match self.criteria(vec![parsed]) {
            Some(criteria) => self.source.count(&criteria, &self.cancel).await,
            None => Ok(0),
        }
    }

    async fn count_any(&self, ids: &[String]) -> Option<Result<u64>> {
        let parsed: Vec<i64> = ids.iter().filter_map(|id| id.trim().parse().ok()).collect();
        match self.criteria(parsed) {
            Some(criteria) => Some(self.source.count(&criteria, &self.cancel).await),
            None => Some(Ok(0)),
        }
    }
}
