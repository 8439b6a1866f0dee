//! Render Surface - Drawing target with observable size
//!
//! A surface has two sizes: the displayed (client) size chosen by
//! whoever hosts it, and the backing size the renderer draws into.
//! Displayed-size changes are published on a watch channel so that
//! observers can redraw.

use crate::context::Context2d;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

/// Surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A drawing surface that can hand out a 2D context
pub trait Surface {
    type Context: Context2d;

    /// Displayed size; zero when the host has not laid the surface out
    fn client_size(&self) -> Size;

    /// Size of the backing store
    fn size(&self) -> Size;

    fn set_size(&mut self, size: Size);

    /// The 2D context, if this surface supports one
    fn context_2d(&mut self) -> Option<&mut Self::Context>;

    /// Displayed-size change notifications, if the host provides them
    fn size_changes(&self) -> Option<watch::Receiver<Size>>;
}

/// Host-side handle that changes a surface's displayed size
#[derive(Debug)]
pub struct SurfaceResizer {
    tx: watch::Sender<Size>,
}

impl SurfaceResizer {
    /// Publish a new displayed size. Observers are only woken when the
    /// size actually changes.
    pub fn resize(&self, size: Size) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == size {
                return false;
            }
            *current = size;
            true
        });
        if changed {
            debug!("Surface displayed size changed to {}", size);
        }
        changed
    }

    pub fn current(&self) -> Size {
        *self.tx.borrow()
    }
}

/// In-memory surface backed by any [`Context2d`]
#[derive(Debug)]
pub struct OffscreenSurface<C> {
    context: Option<C>,
    client: watch::Receiver<Size>,
    resizer_tx: watch::Sender<Size>,
    size: Size,
}

impl<C: Context2d> OffscreenSurface<C> {
    /// Create a surface with the given displayed size and context
    pub fn new(client_size: Size, context: C) -> Self {
        Self::build(client_size, Some(context))
    }

    /// Create a surface that cannot provide a 2D context
    pub fn without_context(client_size: Size) -> Self {
        Self::build(client_size, None)
    }

    fn build(client_size: Size, context: Option<C>) -> Self {
        let (resizer_tx, client) = watch::channel(client_size);
        Self {
            context,
            client,
            resizer_tx,
            size: Size::default(),
        }
    }

    /// Handle for the host to change the displayed size
    pub fn resizer(&self) -> SurfaceResizer {
        SurfaceResizer {
            tx: self.resizer_tx.clone(),
        }
    }

    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }
}

impl<C: Context2d> Surface for OffscreenSurface<C> {
    type Context = C;

    fn client_size(&self) -> Size {
        *self.client.borrow()
    }

    fn size(&self) -> Size {
        self.size
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn context_2d(&mut self) -> Option<&mut C> {
        self.context.as_mut()
    }

    fn size_changes(&self) -> Option<watch::Receiver<Size>> {
        Some(self.client.clone())
    }
}
