use log::trace;

use crate::backend::{Backend, DrawEntry};
use crate::error::{Result, ViewerError};
use crate::surface::SurfaceId;

/// Arms a single callback for the next display refresh.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> Result<()>;
}

/// Self-scheduling redraw of one surface.
///
/// Each tick draws once and then re-arms itself, so a slow draw delays the
/// next frame instead of overlapping it.
#[derive(Debug, Clone)]
pub struct DrawLoop {
    surface: SurfaceId,
    entry: DrawEntry,
    frames: u64,
}

impl DrawLoop {
    pub fn new(surface: SurfaceId, entry: DrawEntry) -> Self {
        Self {
            surface,
            entry,
            frames: 0,
        }
    }

    /// Animation ticks drawn so far. Redraws requested by input are not
    /// ticks and do not count.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Draws the surface outside the frame cadence, without re-arming.
    pub fn draw<B: Backend + ?Sized>(&self, backend: &mut B) -> Result<()> {
        backend.draw(self.entry, &self.surface, None)
    }

    /// Body of one animation frame: draw, then schedule the next one.
    pub fn on_frame<B, S>(&mut self, backend: &mut B, scheduler: &mut S) -> Result<()>
    where
        B: Backend + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        self.draw(backend)?;
        self.frames += 1;
        trace!("{} frame {}", self.surface, self.frames);
        scheduler.request_frame()
    }
}

/// Scheduler for headless runs that hands out frames on demand.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: bool,
    requested: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Total number of frames ever requested.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Consumes the pending frame, if any.
    pub fn take_frame(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Result<()> {
        if self.pending {
            return Err(ViewerError::FramePending);
        }
        self.pending = true;
        self.requested += 1;
        Ok(())
    }
}
