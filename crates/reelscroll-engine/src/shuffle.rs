//! Shuffle-mode post-processing.
//!
//! Shuffle draws a page of scenes, turns every scene into feed items (its
//! own markers, or one synthetic "whole scene" marker when it has none) and
//! then drops scenes that are densely marked within the page.

use std::collections::HashMap;

use reelscroll_core::{
    EmbeddedMarker, MarkerScene, Scene, SceneMarker, SceneMarkerView, SyntheticMarker,
};

/// Anything that belongs to a parent scene.
pub trait SceneScoped {
    fn parent_scene_id(&self) -> &str;
}

impl SceneScoped for SceneMarker {
    fn parent_scene_id(&self) -> &str {
        &self.scene.id
    }
}

impl SceneScoped for SceneMarkerView {
    fn parent_scene_id(&self) -> &str {
        self.scene_id()
    }
}

/// Keep only items whose scene has fewer than `max_markers_per_scene` items
/// in this page. Order is preserved.
pub fn filter_by_marker_density<T: SceneScoped>(items: Vec<T>, max_markers_per_scene: usize) -> Vec<T> {
    let mut per_scene: HashMap<String, usize> = HashMap::new();
    for item in &items {
        *per_scene.entry(item.parent_scene_id().to_string()).or_default() += 1;
    }
    items
        .into_iter()
        .filter(|item| {
            per_scene
                .get(item.parent_scene_id())
                .is_some_and(|&n| n < max_markers_per_scene)
        })
        .collect()
}

/// Feed items for a page of scenes.
pub fn expand_scenes(scenes: Vec<Scene>) -> Vec<SceneMarkerView> {
    let mut items = Vec::new();
    for scene in scenes {
        if scene.scene_markers.is_empty() {
            items.push(SceneMarkerView::Synthetic(SyntheticMarker::for_scene(scene)));
            continue;
        }
        let parent = marker_scene(&scene);
        items.extend(
            scene
                .scene_markers
                .into_iter()
                .map(|marker| SceneMarkerView::Real(attach_scene(marker, parent.clone()))),
        );
    }
    items
}

fn marker_scene(scene: &Scene) -> MarkerScene {
    MarkerScene {
        id: scene.id.clone(),
        title: scene.title.clone(),
        files: scene.files.clone(),
        paths: scene.paths.clone(),
        performers: scene.performers.clone(),
    }
}

fn attach_scene(marker: EmbeddedMarker, scene: MarkerScene) -> SceneMarker {
    SceneMarker {
        id: marker.id,
        title: marker.title,
        seconds: marker.seconds,
        end_seconds: marker.end_seconds,
        stream: None,
        preview: None,
        screenshot: None,
        primary_tag: marker.primary_tag,
        tags: marker.tags,
        scene,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, markers: usize) -> Scene {
        Scene {
            id: id.into(),
            title: Some(format!("Scene {}", id)),
            scene_markers: (0..markers)
                .map(|i| EmbeddedMarker {
                    id: format!("{}-{}", id, i),
                    seconds: i as f64 * 10.0,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unmarked_scene_becomes_synthetic_marker() {
        let items = expand_scenes(vec![scene("1", 0), scene("2", 2)]);
        assert_eq!(items.len(), 3);
        assert!(items[0].is_synthetic());
        assert_eq!(items[0].id(), "synthetic-1");
        assert_eq!(items[1].id(), "2-0");
        assert_eq!(items[2].scene_id(), "2");
    }

    #[test]
    fn test_density_threshold_is_exclusive() {
        let items = expand_scenes(vec![scene("1", 0), scene("2", 4), scene("3", 5)]);
        let kept = filter_by_marker_density(items, 5);
        assert_eq!(kept.len(), 5);
        assert!(kept.iter().all(|item| item.scene_id() != "3"));
    }

    #[test]
    fn test_density_filter_preserves_order() {
        let items = expand_scenes(vec![scene("a", 1), scene("b", 3), scene("c", 1)]);
        let kept = filter_by_marker_density(items, 2);
        let ids: Vec<&str> = kept.iter().map(|item| item.id()).collect();
        assert_eq!(ids, vec!["a-0", "c-0"]);
    }

    #[test]
    fn test_density_filter_on_real_markers() {
        let markers: Vec<SceneMarker> = (0..3)
            .map(|i| SceneMarker {
                id: i.to_string(),
                scene: MarkerScene {
                    id: if i < 2 { "x".into() } else { "y".into() },
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect();
        let kept = filter_by_marker_density(markers, 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].scene.id, "y");
    }
}
