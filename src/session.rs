//! Annotation session state.
//!
//! [`AnnotatorSession`] owns everything one canvas needs: the loaded image,
//! the view transform, the box store, the interaction state and the pan-mode
//! flag. Hosts feed it pointer events and controls one at a time and repaint
//! whenever an operation reports that the visible result changed.
//!
//! Every operation is atomic: fallible work (decode, crop, encode) completes
//! before any field is touched, so a failed action leaves the session as it was.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::config::UserPreferences;
use crate::error::{AnnotatorError, Result};
use crate::export::{self, ExportArchive};
use crate::geometry::{Size, ViewTransform, fit_to_canvas};
use crate::image_data::LoadedImage;
use crate::interaction::{self, Effect, InteractionState, PointerEvent, PointerMode};
use crate::model::BoxStore;
use crate::render::{self, Scene, Surface};

/// A user control. Each variant maps to one session operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ResetPan,
    ResetBoxes,
    Undo,
    Redo,
    TogglePanMode,
    Export,
    /// A pointer event on the canvas
    Pointer { event: PointerEvent },
}

/// What applying a [`Control`] produced.
#[derive(Debug, Clone)]
pub enum ControlOutcome {
    /// Nothing visible changed
    Unchanged,
    /// The canvas must be repainted
    Redraw,
    /// An archive is ready to download
    Exported(ExportArchive),
}

impl ControlOutcome {
    fn from_redraw(redraw: bool) -> Self {
        if redraw {
            ControlOutcome::Redraw
        } else {
            ControlOutcome::Unchanged
        }
    }

    pub fn needs_redraw(&self) -> bool {
        matches!(self, ControlOutcome::Redraw)
    }
}

/// All state of one annotation canvas.
#[derive(Debug, Clone)]
pub struct AnnotatorSession {
    preferences: UserPreferences,
    canvas: Size,
    image: Option<LoadedImage>,
    transform: ViewTransform,
    boxes: BoxStore,
    interaction: InteractionState,
    pan_mode: bool,
    generation: u64,
    last_error: Option<String>,
}

impl Default for AnnotatorSession {
    fn default() -> Self {
        Self::new(UserPreferences::default())
    }
}

impl AnnotatorSession {
    /// Create an empty session; nothing is interactive until an image loads.
    pub fn new(preferences: UserPreferences) -> Self {
        Self {
            preferences: preferences.sanitized(),
            canvas: Size::default(),
            image: None,
            transform: ViewTransform::identity(),
            boxes: BoxStore::new(),
            interaction: InteractionState::Idle,
            pan_mode: false,
            generation: 0,
            last_error: None,
        }
    }

    // ------------------------------------------------------------------------
    // Image loading
    // ------------------------------------------------------------------------

    /// Decode `bytes` and make it the current image, fitted to `canvas`.
    ///
    /// On failure the previous image, view and boxes are kept and the error
    /// is recorded in [`AnnotatorSession::last_error`].
    pub fn load_image(&mut self, bytes: &[u8], canvas: Size) -> Result<()> {
        let pixels = LoadedImage::decode(bytes).inspect_err(|e| self.record_error(e))?;
        self.load_pixels(pixels, canvas)
    }

    /// Make already-decoded pixels the current image, fitted to `canvas`.
    ///
    /// Fails with [`AnnotatorError::EmptyImage`] if either side is zero; the
    /// session is left untouched.
    pub fn load_pixels(&mut self, pixels: RgbaImage, canvas: Size) -> Result<()> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            let e = AnnotatorError::EmptyImage { width, height };
            self.record_error(&e);
            return Err(e);
        }

        let (image, fitted) = LoadedImage::fit(pixels, canvas);
        log::info!(
            "🖼️ Loaded {}x{} image, displayed at {:.0}x{:.0} in {:.0}x{:.0} canvas",
            image.original_width(),
            image.original_height(),
            fitted.display.width,
            fitted.display.height,
            canvas.width,
            canvas.height
        );

        self.reset_state();
        self.canvas = canvas;
        self.image = Some(image);
        self.transform = fitted.transform;
        self.generation += 1;
        Ok(())
    }

    /// Record a failed action so hosts can surface it. Only `last_error` changes.
    pub fn record_error(&mut self, error: &AnnotatorError) {
        log::error!("❌ {}", error);
        self.last_error = Some(error.to_string());
    }

    /// Clear boxes, gestures and pan mode ahead of a new image.
    fn reset_state(&mut self) {
        self.transform = ViewTransform::identity();
        self.boxes.reset();
        self.interaction = InteractionState::Idle;
        self.pan_mode = false;
        self.last_error = None;
    }

    // ------------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------------

    /// Feed one pointer event. Returns true if the canvas must be repainted.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        if self.image.is_none() {
            return false;
        }

        let step = interaction::transition(
            self.interaction,
            event,
            self.pointer_mode(),
            &self.transform,
            self.preferences.min_box_size,
        );
        self.interaction = step.next;

        match step.effect {
            Effect::None | Effect::Preview(_) | Effect::Cancelled => {}
            Effect::PanBy { dx, dy } => {
                self.transform = self.transform.pan_by(dx, dy);
            }
            Effect::Commit(bbox) => {
                self.boxes.add(bbox);
            }
            Effect::Rejected(bbox) => {
                log::warn!("⚠️ Discarded box below minimum size: {:?}", bbox);
            }
        }

        step.effect.needs_redraw()
    }

    // ------------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------------

    pub fn zoom_in(&mut self) -> bool {
        self.transform = self.transform.zoom_in(self.preferences.zoom_factor);
        log::debug!("🔍 Zoom in: {:.2}x", self.transform.scale);
        true
    }

    pub fn zoom_out(&mut self) -> bool {
        self.transform = self.transform.zoom_out(self.preferences.zoom_factor);
        log::debug!("🔍 Zoom out: {:.2}x", self.transform.scale);
        true
    }

    /// Scale back to 1; pan is kept.
    pub fn reset_zoom(&mut self) -> bool {
        self.transform = self.transform.reset_zoom();
        log::debug!("🔄 Zoom reset");
        true
    }

    /// Restore the fit-to-canvas view (scale 1, centered).
    pub fn reset_pan(&mut self) -> bool {
        self.transform = match &self.image {
            Some(image) => fit_to_canvas(image.original_size(), self.canvas).transform,
            None => ViewTransform::identity(),
        };
        log::debug!(
            "🔄 Pan reset to ({:.0}, {:.0})",
            self.transform.pan_x,
            self.transform.pan_y
        );
        true
    }

    /// Remove all boxes and the redo history.
    pub fn reset_boxes(&mut self) -> bool {
        self.boxes.reset();
        true
    }

    pub fn undo(&mut self) -> bool {
        self.boxes.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.boxes.redo()
    }

    /// Flip between draw and pan mode. Affects only the next pointer-down.
    pub fn toggle_pan_mode(&mut self) -> bool {
        self.pan_mode = !self.pan_mode;
        log::debug!("🖐️ Pointer mode: {:?}", self.pointer_mode());
        false
    }

    /// Crop every committed box out of the native image into one archive.
    ///
    /// Fails with [`AnnotatorError::NoImage`] before an image is loaded and
    /// with [`AnnotatorError::NothingToExport`] when there are no boxes.
    pub fn export(&mut self) -> Result<ExportArchive> {
        let result = match &self.image {
            None => Err(AnnotatorError::NoImage),
            Some(image) => export::export_all(
                image,
                self.boxes.boxes(),
                &self.preferences.export_options(),
                self.generation,
            ),
        };

        match result {
            Ok(archive) => {
                self.last_error = None;
                Ok(archive)
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// True if `archive` was built from the image that is currently loaded.
    pub fn is_current(&self, archive: &ExportArchive) -> bool {
        self.image.is_some() && archive.generation == self.generation
    }

    /// Apply one control.
    pub fn apply(&mut self, control: Control) -> Result<ControlOutcome> {
        let redraw = match control {
            Control::ZoomIn => self.zoom_in(),
            Control::ZoomOut => self.zoom_out(),
            Control::ResetZoom => self.reset_zoom(),
            Control::ResetPan => self.reset_pan(),
            Control::ResetBoxes => self.reset_boxes(),
            Control::Undo => self.undo(),
            Control::Redo => self.redo(),
            Control::TogglePanMode => self.toggle_pan_mode(),
            Control::Pointer { event } => self.handle_pointer(event),
            Control::Export => return self.export().map(ControlOutcome::Exported),
        };
        Ok(ControlOutcome::from_redraw(redraw))
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// The frame to paint for the current state.
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            image: self.image.as_ref(),
            transform: self.transform,
            boxes: self.boxes.boxes(),
            preview: self.interaction.preview_box(),
        }
    }

    /// Repaint `surface` from the current state.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        render::render(surface, &self.scene());
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn box_store(&self) -> &BoxStore {
        &self.boxes
    }

    pub fn interaction(&self) -> InteractionState {
        self.interaction
    }

    pub fn pan_mode(&self) -> bool {
        self.pan_mode
    }

    pub fn pointer_mode(&self) -> PointerMode {
        PointerMode::from_pan_enabled(self.pan_mode)
    }

    /// Image generation; increments on every successful load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Message of the most recent failed action, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
