//! Overlay registry
//!
//! Hosts that manage several overlays keep them in an
//! [`OverlayRegistry`] they own and pass around explicitly. There is no
//! process-wide registry.

use crate::options::RenderOptions;
use crate::overlay::{OverlayController, SizeSubscription};
use landmark_net::{ResourceFetcher, SourceFetcher};
use landmark_render::Surface;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Name [`create_landmark_overlay`] registers under
pub const LANDMARK_OVERLAY: &str = "landmarks";

/// Named overlays owned by a host
pub struct OverlayRegistry<S, F = SourceFetcher> {
    overlays: BTreeMap<String, OverlayController<S, F>>,
}

impl<S: Surface, F: ResourceFetcher> OverlayRegistry<S, F> {
    pub fn new() -> Self {
        Self {
            overlays: BTreeMap::new(),
        }
    }

    /// Register an overlay; a previous one under the same name is torn
    /// down and returned.
    pub fn register(
        &mut self,
        name: &str,
        overlay: OverlayController<S, F>,
    ) -> Option<OverlayController<S, F>> {
        let previous = self.overlays.insert(name.to_string(), overlay);
        if let Some(previous) = &previous {
            previous.teardown();
            debug!("Replaced overlay {}", name);
        } else {
            info!("Registered overlay {}", name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&OverlayController<S, F>> {
        self.overlays.get(name)
    }

    /// Remove and tear down an overlay
    pub fn remove(&mut self, name: &str) -> Option<OverlayController<S, F>> {
        let overlay = self.overlays.remove(name)?;
        overlay.teardown();
        info!("Removed overlay {}", name);
        Some(overlay)
    }

    pub fn names(&self) -> Vec<&str> {
        self.overlays.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

impl<S: Surface, F: ResourceFetcher> Default for OverlayRegistry<S, F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a landmark overlay that redraws whenever the surface's
/// displayed size changes, optionally registering it under
/// [`LANDMARK_OVERLAY`].
///
/// Must be called from within a `LocalSet`. The subscription is `None`
/// when there is no surface or the surface does not publish size
/// changes; `teardown()` on the overlay cancels it.
pub fn create_landmark_overlay<S: Surface + 'static, F: ResourceFetcher>(
    surface: Option<S>,
    options: RenderOptions,
    fetcher: F,
    registry: Option<&mut OverlayRegistry<S, F>>,
) -> (OverlayController<S, F>, Option<SizeSubscription>) {
    let overlay = OverlayController::with_fetcher(surface, options, fetcher);
    let subscription = overlay.subscribe_size_changes();
    if subscription.is_none() {
        debug!("Surface publishes no size changes, redraws are manual");
    }
    if let Some(registry) = registry {
        registry.register(LANDMARK_OVERLAY, overlay.clone());
    }
    (overlay, subscription)
}
