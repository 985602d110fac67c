//! Browser bindings.
//!
//! [`WebAnnotator`] wraps an [`AnnotatorSession`] around an HTML canvas. The
//! page forwards pointer events (in canvas pixel coordinates) and button
//! clicks; every call that changes what is visible repaints the canvas.

use image::RgbaImage;
use wasm_bindgen::Clamped;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement,
    HtmlElement, ImageData, Url,
};

use crate::config::UserPreferences;
use crate::error::AnnotatorError;
use crate::export::ExportArchive;
use crate::geometry::{Point, Size, ViewTransform};
use crate::image_data::LoadedImage;
use crate::interaction::PointerEvent;
use crate::model::BoundingBox;
use crate::render::{StrokeStyle, Surface};
use crate::session::{AnnotatorSession, Control, ControlOutcome};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let level = UserPreferences::default().log_level.to_level();
    if let Err(e) = console_log::init_with_level(level) {
        web_sys::console::log_1(&format!("Logger init failed: {}", e).into());
    }
    log::info!("🚀 boxcrop WASM starting...");
}

fn host_error(e: JsValue) -> AnnotatorError {
    AnnotatorError::host(format!("{:?}", e))
}

fn to_js(e: AnnotatorError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, AnnotatorError> {
    canvas
        .get_context("2d")
        .map_err(host_error)?
        .ok_or_else(|| AnnotatorError::host("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| AnnotatorError::host("context is not a CanvasRenderingContext2d"))
}

// ============================================================================
// Canvas surface
// ============================================================================

/// [`Surface`] backed by a 2d canvas context.
struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    /// Offscreen canvas holding the native pixels of the loaded image
    source: Option<HtmlCanvasElement>,
}

impl CanvasSurface {
    fn new(canvas: HtmlCanvasElement) -> Result<Self, AnnotatorError> {
        let context = context_2d(&canvas)?;
        Ok(Self {
            canvas,
            context,
            source: None,
        })
    }

    /// Size of the parent element's layout box, or the current canvas size.
    fn parent_size(&self) -> Size {
        let parent = self
            .canvas
            .parent_element()
            .and_then(|p| p.dyn_into::<HtmlElement>().ok());
        match parent {
            Some(p) if p.offset_width() > 0 && p.offset_height() > 0 => {
                Size::from_pixels(p.offset_width() as u32, p.offset_height() as u32)
            }
            _ => self.size(),
        }
    }

    fn resize(&self, size: Size) {
        self.canvas.set_width(size.width as u32);
        self.canvas.set_height(size.height as u32);
    }
}

/// Upload native pixels into a new offscreen canvas.
fn source_canvas(pixels: &RgbaImage) -> Result<HtmlCanvasElement, AnnotatorError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| AnnotatorError::host("no document"))?;
    let source = document
        .create_element("canvas")
        .map_err(host_error)?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| AnnotatorError::host("created element is not a canvas"))?;
    source.set_width(pixels.width());
    source.set_height(pixels.height());

    let data = ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(pixels.as_raw().as_slice()),
        pixels.width(),
        pixels.height(),
    )
    .map_err(host_error)?;
    context_2d(&source)?
        .put_image_data(&data, 0.0, 0.0)
        .map_err(host_error)?;
    Ok(source)
}

impl Surface for CanvasSurface {
    fn size(&self) -> Size {
        Size::from_pixels(self.canvas.width(), self.canvas.height())
    }

    fn clear(&mut self) {
        if let Err(e) = self.context.reset_transform() {
            log::warn!("⚠️ resetTransform failed: {:?}", e);
        }
        let size = self.size();
        self.context
            .clear_rect(0.0, 0.0, f64::from(size.width), f64::from(size.height));
    }

    fn set_transform(&mut self, transform: &ViewTransform) {
        let [a, b, c, d, e, f] = transform.to_affine();
        if let Err(err) = self.context.set_transform(a, b, c, d, e, f) {
            log::warn!("⚠️ setTransform failed: {:?}", err);
        }
    }

    fn draw_image(&mut self, image: &LoadedImage) {
        let Some(source) = &self.source else {
            return;
        };
        let display = image.display_size();
        if let Err(e) = self.context.draw_image_with_html_canvas_element_and_dw_and_dh(
            source,
            0.0,
            0.0,
            f64::from(display.width),
            f64::from(display.height),
        ) {
            log::warn!("⚠️ drawImage failed: {:?}", e);
        }
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, style: &StrokeStyle) {
        self.context.set_stroke_style_str(&style.css_color());
        self.context.set_line_width(f64::from(style.line_width));
        self.context.stroke_rect(
            f64::from(rect.x),
            f64::from(rect.y),
            f64::from(rect.width),
            f64::from(rect.height),
        );
    }
}

// ============================================================================
// Page bindings
// ============================================================================

/// One annotation canvas on the page.
#[wasm_bindgen]
pub struct WebAnnotator {
    session: AnnotatorSession,
    surface: CanvasSurface,
}

#[wasm_bindgen]
impl WebAnnotator {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement) -> Result<WebAnnotator, JsValue> {
        let surface = CanvasSurface::new(canvas).map_err(to_js)?;
        Ok(Self {
            session: AnnotatorSession::new(UserPreferences::default()),
            surface,
        })
    }

    /// Decode uploaded file bytes and show them fitted to the canvas.
    ///
    /// The offscreen copy is built before the session switches images, so on
    /// any failure the previous image and boxes stay on screen.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        let canvas = self.surface.parent_size();
        let prepared = LoadedImage::decode(bytes)
            .and_then(|pixels| source_canvas(&pixels).map(|source| (pixels, source)));
        let (pixels, source) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                self.session.record_error(&e);
                return Err(to_js(e));
            }
        };

        self.session.load_pixels(pixels, canvas).map_err(to_js)?;
        self.surface.resize(canvas);
        self.surface.source = Some(source);
        self.redraw();
        Ok(())
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.pointer(PointerEvent::Down(Point::new(x, y)));
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.pointer(PointerEvent::Move(Point::new(x, y)));
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.pointer(PointerEvent::Up(Point::new(x, y)));
    }

    pub fn pointer_leave(&mut self) {
        self.pointer(PointerEvent::Leave);
    }

    pub fn zoom_in(&mut self) {
        self.control(Control::ZoomIn);
    }

    pub fn zoom_out(&mut self) {
        self.control(Control::ZoomOut);
    }

    pub fn reset_zoom(&mut self) {
        self.control(Control::ResetZoom);
    }

    pub fn reset_pan(&mut self) {
        self.control(Control::ResetPan);
    }

    pub fn reset_boxes(&mut self) {
        self.control(Control::ResetBoxes);
    }

    pub fn undo(&mut self) {
        self.control(Control::Undo);
    }

    pub fn redo(&mut self) {
        self.control(Control::Redo);
    }

    /// Flip pointer mode. Returns the label for the toggle button.
    pub fn toggle_pan_mode(&mut self) -> String {
        self.control(Control::TogglePanMode);
        self.session.pointer_mode().toggle_label().to_string()
    }

    /// Build the crop archive and start a browser download.
    pub fn export(&mut self) -> Result<(), JsValue> {
        let archive = self.session.export().map_err(to_js)?;
        for warning in &archive.warnings {
            log::warn!("⚠️ {}", warning);
        }
        download(&archive).map_err(to_js)
    }

    pub fn box_count(&self) -> usize {
        self.session.box_store().len()
    }

    pub fn has_image(&self) -> bool {
        self.session.has_image()
    }

    /// Message of the most recent failed action.
    pub fn last_error(&self) -> Option<String> {
        self.session.last_error().map(str::to_string)
    }
}

impl WebAnnotator {
    fn pointer(&mut self, event: PointerEvent) {
        if self.session.handle_pointer(event) {
            self.redraw();
        }
    }

    fn control(&mut self, control: Control) {
        match self.session.apply(control) {
            Ok(ControlOutcome::Redraw) => self.redraw(),
            Ok(_) => {}
            Err(e) => log::warn!("⚠️ {:?} failed: {}", control, e),
        }
    }

    fn redraw(&mut self) {
        self.session.render(&mut self.surface);
    }
}

/// Offer `archive` as a file download.
fn download(archive: &ExportArchive) -> Result<(), AnnotatorError> {
    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(archive.bytes.as_slice()));
    let options = BlobPropertyBag::new();
    options.set_type("application/zip");
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(host_error)?;
    let url = Url::create_object_url_with_blob(&blob).map_err(host_error)?;

    let anchor = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| AnnotatorError::host("no document"))?
        .create_element("a")
        .map_err(host_error)?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| AnnotatorError::host("created element is not an anchor"))?;
    anchor.set_href(&url);
    anchor.set_download(&archive.name);
    anchor.click();

    Url::revoke_object_url(&url).map_err(host_error)?;
    log::info!(
        "📦 Downloaded {} ({} crops, {} bytes)",
        archive.name,
        archive.entries.len(),
        archive.bytes.len()
    );
    Ok(())
}
