//! Overlay controller
//!
//! Owns the drawing surface, the feature store and the options, loads
//! the layers and redraws the whole surface on demand or whenever the
//! surface's displayed size changes.
//!
//! The controller is single-threaded: it is `!Send`, shares its state
//! through `Rc`, and its size-change task runs on a tokio `LocalSet`.
//! No `RefCell` borrow is held across an `.await`.

use crate::feature::Feature;
use crate::geometry::GeometryRenderer;
use crate::options::RenderOptions;
use crate::store::{FeatureStore, LoadError};
use landmark_net::{ResourceFetcher, SourceFetcher};
use landmark_render::{Context2d, Size, Surface};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use thiserror::Error;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Size used when the surface reports no usable dimension
pub const FALLBACK_SIZE: Size = Size::new(640, 480);

/// Overlay errors
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("No drawing surface provided")]
    MissingSurface,

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Uninitialized,
    Loading,
    Ready,
}

struct OverlayInner<S> {
    surface: RefCell<Option<S>>,
    has_context: bool,
    store: FeatureStore,
    options: RenderOptions,
    renderer: GeometryRenderer,
    phase: Cell<OverlayPhase>,
    subscription: RefCell<Option<AbortHandle>>,
}

impl<S: Surface> OverlayInner<S> {
    fn render(&self) -> usize {
        if !self.has_context {
            return 0;
        }
        let Ok(mut guard) = self.surface.try_borrow_mut() else {
            warn!("Surface is busy, skipping render");
            return 0;
        };
        let Some(surface) = guard.as_mut() else {
            return 0;
        };

        let size = resolve_size(surface.client_size(), surface.size());
        if surface.size() != size {
            surface.set_size(size);
        }

        let features = self
            .store
            .active_features(self.options.secondary_layer_enabled);
        let frame = self.options.reference_frame;
        let Some(ctx) = surface.context_2d() else {
            return 0;
        };

        ctx.clear_rect(0.0, 0.0, size.width as f64, size.height as f64);
        let drawn = features
            .iter()
            .filter(|feature| self.renderer.draw(ctx, feature, size, &frame))
            .count();

        debug!("Rendered {}/{} features at {}", drawn, features.len(), size);
        drawn
    }

    fn cancel_subscription(&self) -> bool {
        match self.subscription.borrow_mut().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl<S> Drop for OverlayInner<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.subscription.get_mut().take() {
            handle.abort();
        }
    }
}

/// Client size per dimension, then the backing size, then the fallback
fn resolve_size(client: Size, backing: Size) -> Size {
    let pick = |client: u32, backing: u32, fallback: u32| {
        if client > 0 {
            client
        } else if backing > 0 {
            backing
        } else {
            fallback
        }
    };
    Size::new(
        pick(client.width, backing.width, FALLBACK_SIZE.width),
        pick(client.height, backing.height, FALLBACK_SIZE.height),
    )
}

/// Landmark overlay bound to one surface
pub struct OverlayController<S, F = SourceFetcher> {
    inner: Rc<OverlayInner<S>>,
    fetcher: Rc<F>,
}

impl<S, F> Clone for OverlayController<S, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            fetcher: Rc::clone(&self.fetcher),
        }
    }
}

impl<S: Surface> OverlayController<S, SourceFetcher> {
    /// Create a controller that fetches over HTTP(S) or from disk
    pub fn new(surface: Option<S>, options: RenderOptions) -> Self {
        Self::with_fetcher(surface, options, SourceFetcher::with_defaults())
    }
}

impl<S: Surface, F: ResourceFetcher> OverlayController<S, F> {
    pub fn with_fetcher(surface: Option<S>, options: RenderOptions, fetcher: F) -> Self {
        Self::with_renderer(surface, options, fetcher, GeometryRenderer::default())
    }

    pub fn with_renderer(
        mut surface: Option<S>,
        options: RenderOptions,
        fetcher: F,
        renderer: GeometryRenderer,
    ) -> Self {
        let has_context = match surface.as_mut() {
            Some(surface) => surface.context_2d().is_some(),
            None => false,
        };
        if surface.is_some() && !has_context {
            warn!("Surface has no 2D context, rendering is disabled");
        }

        Self {
            inner: Rc::new(OverlayInner {
                surface: RefCell::new(surface),
                has_context,
                store: FeatureStore::new(),
                options,
                renderer,
                phase: Cell::new(OverlayPhase::Uninitialized),
                subscription: RefCell::new(None),
            }),
            fetcher: Rc::new(fetcher),
        }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.inner.phase.get()
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == OverlayPhase::Ready
    }

    pub fn has_context(&self) -> bool {
        self.inner.has_context
    }

    pub fn options(&self) -> &RenderOptions {
        &self.inner.options
    }

    pub fn store(&self) -> &FeatureStore {
        &self.inner.store
    }

    /// Load both layers and draw the first frame.
    ///
    /// Fails when there is no surface or the primary layer cannot be
    /// loaded; the controller is then back in `Uninitialized`.
    pub async fn initialize(&self) -> Result<usize, OverlayError> {
        if self.inner.surface.borrow().is_none() {
            return Err(OverlayError::MissingSurface);
        }

        self.inner.phase.set(OverlayPhase::Loading);
        let options = &self.inner.options;

        if let Err(e) = self.load_geojson(options.primary_location().unwrap_or_default()).await {
            self.inner.phase.set(OverlayPhase::Uninitialized);
            return Err(e.into());
        }
        if let Some(location) = options.secondary_location() {
            self.load_agora_layer(location).await;
        }

        self.inner.phase.set(OverlayPhase::Ready);
        let drawn = self.render();
        info!(
            "Overlay ready: {} primary, {} secondary features",
            self.inner.store.primary_len(),
            self.inner.store.secondary_len()
        );
        Ok(drawn)
    }

    /// Replace the primary layer. An empty location does nothing.
    pub async fn load_geojson(&self, location: &str) -> Result<usize, LoadError> {
        if location.is_empty() {
            debug!("No primary source configured");
            return Ok(0);
        }
        self.inner.store.load_primary(&*self.fetcher, location).await
    }

    /// Replace the secondary layer; failures leave it empty
    pub async fn load_agora_layer(&self, location: &str) -> usize {
        self.inner.store.load_secondary(&*self.fetcher, location).await
    }

    /// Clear the surface and draw every active feature. Returns the
    /// number of features drawn.
    pub fn render(&self) -> usize {
        self.inner.render()
    }

    pub fn label_for_feature<'a>(&'a self, feature: &'a Feature) -> Cow<'a, str> {
        self.inner.renderer.labels().resolve(feature, false)
    }

    /// Cancel the size-change subscription, if any
    pub fn teardown(&self) {
        if self.inner.cancel_subscription() {
            debug!("Size-change subscription cancelled");
        }
    }

    /// Run `f` against the surface
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        self.inner.surface.borrow().as_ref().map(f)
    }
}

impl<S: Surface + 'static, F: ResourceFetcher> OverlayController<S, F> {
    /// Redraw on every displayed-size change.
    ///
    /// Must be called from within a `LocalSet`. Replaces any previous
    /// subscription. Returns `None` when there is no surface or the
    /// surface does not publish size changes.
    pub fn subscribe_size_changes(&self) -> Option<SizeSubscription> {
        let mut changes = self.inner.surface.borrow().as_ref()?.size_changes()?;
        changes.borrow_and_update();

        let weak: Weak<OverlayInner<S>> = Rc::downgrade(&self.inner);
        let task = tokio::task::spawn_local(async move {
            while changes.changed().await.is_ok() {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let size = *changes.borrow_and_update();
                debug!("Displayed size changed to {}, redrawing", size);
                inner.render();
            }
        });

        self.inner.cancel_subscription();
        *self.inner.subscription.borrow_mut() = Some(task.abort_handle());
        Some(SizeSubscription {
            handle: task.abort_handle(),
        })
    }
}

/// Handle on the size-change redraw task
#[derive(Debug)]
pub struct SizeSubscription {
    handle: AbortHandle,
}

impl SizeSubscription {
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landmark_net::{FetchError, MemoryFetcher};
    use landmark_render::{DrawCommand, OffscreenSurface, PathOp, RecordingContext};
    use tokio::task::LocalSet;

    type TestSurface = OffscreenSurface<RecordingContext>;

    const PLACES: &str = r#"{"features": [
        {"geometry": {"type": "Point", "coordinates": [23.7255, 37.9715]}, "properties": {"name": "Acropolis"}}
    ]}"#;

    const AGORA: &str = r#"{"features": [
        {"geometry": {"type": "Polygon", "coordinates": [[[23.720, 37.974], [23.724, 37.974], [23.724, 37.977], [23.720, 37.974]]]},
         "properties": {"name": "Agora"}}
    ]}"#;

    fn fetcher() -> MemoryFetcher {
        let mut fetcher = MemoryFetcher::new();
        fetcher
            .insert("places", PLACES)
            .insert("agora", AGORA)
            .insert_status("missing", 404);
        fetcher
    }

    fn overlay(
        surface: Option<TestSurface>,
        options: RenderOptions,
    ) -> OverlayController<TestSurface, MemoryFetcher> {
        OverlayController::with_fetcher(surface, options, fetcher())
    }

    fn surface(width: u32, height: u32) -> TestSurface {
        OffscreenSurface::new(Size::new(width, height), RecordingContext::new())
    }

    fn last_frame(overlay: &OverlayController<TestSurface, MemoryFetcher>) -> Vec<DrawCommand> {
        overlay
            .with_surface(|s| s.context().map(|c| c.last_frame().to_vec()))
            .flatten()
            .unwrap_or_default()
    }

    fn frame_count(overlay: &OverlayController<TestSurface, MemoryFetcher>) -> usize {
        overlay
            .with_surface(|s| s.context().map(|c| c.frame_count()))
            .flatten()
            .unwrap_or_default()
    }

    fn labels(frame: &[DrawCommand]) -> Vec<String> {
        frame
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_missing_surface_is_fatal() {
        let overlay = overlay(None, RenderOptions::new().with_primary_source("places"));
        let result = overlay.initialize().await;
        assert!(matches!(result, Err(OverlayError::MissingSurface)));
        assert_eq!(overlay.phase(), OverlayPhase::Uninitialized);
        assert_eq!(overlay.render(), 0);
    }

    #[tokio::test]
    async fn test_initialize_draws_acropolis() {
        let overlay = overlay(
            Some(surface(640, 480)),
            RenderOptions::new().with_primary_source("places"),
        );
        assert_eq!(overlay.initialize().await.unwrap(), 1);
        assert!(overlay.is_ready());

        let frame = last_frame(&overlay);
        assert!(matches!(
            &frame[0],
            DrawCommand::Clear { width, height, .. } if *width == 640.0 && *height == 480.0
        ));
        match &frame[1] {
            DrawCommand::Fill { path, .. } => match &path[..] {
                [PathOp::Arc { center, .. }] => {
                    assert!((center.x - 372.0).abs() < 1.0);
                    assert!((center.y - 222.0).abs() < 1e-6);
                }
                other => panic!("Expected a marker arc, got {:?}", other),
            },
            other => panic!("Expected Fill, got {:?}", other),
        }
        assert_eq!(labels(&frame), vec!["Acropolis"]);
    }

    #[tokio::test]
    async fn test_primary_failure_propagates() {
        let overlay = overlay(
            Some(surface(640, 480)),
            RenderOptions::new().with_primary_source("missing"),
        );
        let result = overlay.initialize().await;
        assert!(matches!(
            result,
            Err(OverlayError::Load(LoadError::Fetch(FetchError::Status { status: 404, .. })))
        ));
        assert_eq!(overlay.phase(), OverlayPhase::Uninitialized);
        assert_eq!(frame_count(&overlay), 0);
    }

    #[tokio::test]
    async fn test_secondary_failure_renders_primary_only() {
        let overlay = overlay(
            Some(surface(640, 480)),
            RenderOptions::new()
                .with_primary_source("places")
                .with_secondary_source("missing"),
        );
        assert_eq!(overlay.initialize().await.unwrap(), 1);
        assert_eq!(overlay.store().secondary_len(), 0);
        assert_eq!(labels(&last_frame(&overlay)), vec!["Acropolis"]);
    }

    #[tokio::test]
    async fn test_secondary_layer_drawn_after_primary() {
        let overlay = overlay(
            Some(surface(640, 480)),
            RenderOptions::new()
                .with_primary_source("places")
                .with_secondary_source("agora"),
        );
        assert_eq!(overlay.initialize().await.unwrap(), 2);
        assert_eq!(labels(&last_frame(&overlay)), vec!["Acropolis", "Agora"]);
    }

    #[tokio::test]
    async fn test_disabled_secondary_layer_not_loaded() {
        let overlay = overlay(
            Some(surface(640, 480)),
            RenderOptions::new()
                .with_primary_source("places")
                .with_secondary_source("agora")
                .with_secondary_layer(false),
        );
        overlay.initialize().await.unwrap();
        assert_eq!(overlay.store().secondary_len(), 0);

        // Explicitly loaded, but still not drawn while disabled
        assert_eq!(overlay.load_agora_layer("agora").await, 1);
        assert_eq!(overlay.render(), 1);
    }

    #[tokio::test]
    async fn test_empty_primary_location_is_noop() {
        let overlay = overlay(Some(surface(640, 480)), RenderOptions::new().with_primary_source(""));
        assert_eq!(overlay.initialize().await.unwrap(), 0);
        assert!(overlay.is_ready());
        assert_eq!(frame_count(&overlay), 1);
    }

    #[tokio::test]
    async fn test_render_is_idempotent() {
        let overlay = overlay(
            Some(surface(640, 480)),
            RenderOptions::new()
                .with_primary_source("places")
                .with_secondary_source("agora"),
        );
        overlay.initialize().await.unwrap();
        let first = last_frame(&overlay);
        overlay.render();
        assert_eq!(last_frame(&overlay), first);
        assert_eq!(frame_count(&overlay), 2);
    }

    #[tokio::test]
    async fn test_no_context_disables_rendering() {
        let overlay = overlay(
            Some(OffscreenSurface::without_context(Size::new(640, 480))),
            RenderOptions::new().with_primary_source("places"),
        );
        assert!(!overlay.has_context());
        assert_eq!(overlay.initialize().await.unwrap(), 0);
        assert!(overlay.is_ready());
        assert_eq!(overlay.store().primary_len(), 1);
    }

    #[tokio::test]
    async fn test_zero_client_size_falls_back() {
        let overlay = overlay(
            Some(surface(0, 300)),
            RenderOptions::new().with_primary_source("places"),
        );
        overlay.initialize().await.unwrap();
        assert_eq!(overlay.with_surface(|s| s.size()), Some(Size::new(640, 300)));
        assert!(matches!(
            &last_frame(&overlay)[0],
            DrawCommand::Clear { width, height, .. } if *width == 640.0 && *height == 300.0
        ));
    }

    #[test]
    fn test_resolve_size() {
        assert_eq!(resolve_size(Size::new(800, 600), Size::new(1, 1)), Size::new(800, 600));
        assert_eq!(resolve_size(Size::new(0, 0), Size::new(1024, 0)), Size::new(1024, 480));
        assert_eq!(resolve_size(Size::default(), Size::default()), FALLBACK_SIZE);
    }

    #[test]
    fn test_label_for_feature_ignores_line_overrides() {
        let overlay = overlay(None, RenderOptions::new());
        let wall = Feature::new(crate::feature::Geometry::LineString(Vec::new()))
            .with_name("Long Walls (Piraeus)");
        assert_eq!(overlay.label_for_feature(&wall), "Piraeus Long Wall");
    }

    #[tokio::test]
    async fn test_resize_triggers_render() {
        LocalSet::new()
            .run_until(async {
                let surface = surface(640, 480);
                let resizer = surface.resizer();
                let overlay = overlay(Some(surface), RenderOptions::new().with_primary_source("places"));

                let subscription = overlay.subscribe_size_changes().unwrap();
                overlay.initialize().await.unwrap();
                assert_eq!(frame_count(&overlay), 1);

                assert!(resizer.resize(Size::new(800, 600)));
                settle().await;
                assert_eq!(frame_count(&overlay), 2);
                assert_eq!(overlay.with_surface(|s| s.size()), Some(Size::new(800, 600)));
                assert!(subscription.is_active());

                // Same size again is not a change
                assert!(!resizer.resize(Size::new(800, 600)));
                settle().await;
                assert_eq!(frame_count(&overlay), 2);
            })
            .await;
    }

    #[tokio::test]
    async fn test_resize_before_initialize_renders_empty() {
        LocalSet::new()
            .run_until(async {
                let surface = surface(640, 480);
                let resizer = surface.resizer();
                let overlay = overlay(Some(surface), RenderOptions::new().with_primary_source("places"));
                overlay.subscribe_size_changes().unwrap();

                resizer.resize(Size::new(320, 240));
                settle().await;
                let frame = last_frame(&overlay);
                assert_eq!(frame.len(), 1);
                assert!(matches!(frame[0], DrawCommand::Clear { .. }));
                assert_eq!(overlay.phase(), OverlayPhase::Uninitialized);
            })
            .await;
    }

    #[tokio::test]
    async fn test_teardown_stops_redraws() {
        LocalSet::new()
            .run_until(async {
                let surface = surface(640, 480);
                let resizer = surface.resizer();
                let overlay = overlay(Some(surface), RenderOptions::new().with_primary_source("places"));
                let subscription = overlay.subscribe_size_changes().unwrap();
                overlay.initialize().await.unwrap();

                overlay.teardown();
                resizer.resize(Size::new(1024, 768));
                settle().await;

                assert_eq!(frame_count(&overlay), 1);
                assert!(!subscription.is_active());
            })
            .await;
    }

    #[tokio::test]
    async fn test_dropping_controller_ends_subscription() {
        LocalSet::new()
            .run_until(async {
                let surface = surface(640, 480);
                let resizer = surface.resizer();
                let overlay = overlay(Some(surface), RenderOptions::new());
                let subscription = overlay.subscribe_size_changes().unwrap();

                drop(overlay);
                resizer.resize(Size::new(1024, 768));
                settle().await;
                assert!(!subscription.is_active());
            })
            .await;
    }
}
