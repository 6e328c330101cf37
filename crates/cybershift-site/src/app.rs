use std::path::PathBuf;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use winit::event::WindowEvent;
use winit::window::WindowId;

use cybershift_engine::asset::{AssetStore, ImageData};
use cybershift_engine::compositor::Compositor;
use cybershift_engine::coords::{Rect, SurfaceMetrics, Viewport};
use cybershift_engine::core::{App, AppControl, FrameCtx};
use cybershift_engine::device::GpuInit;
use cybershift_engine::input::{InputFrame, InputState, Key, MouseButton};
use cybershift_engine::paint::Color;
use cybershift_engine::render::{Fill, FillRenderer, ImageDraw, ImageRenderer, RingRenderer};
use cybershift_engine::scene::{Light, PerspectiveCamera, SceneLayer};
use cybershift_engine::scroll::ScrollBinder;
use cybershift_engine::time::AdaptiveConfig;
use cybershift_engine::window::{CursorIcon, Runtime, RuntimeConfig};

use crate::fabric_lab::FabricLab;
use crate::hero_cloth::HeroCloth;
use crate::lookbook::{ImageSlot, Lookbook};
use crate::macro_weave::MacroWeave;
use crate::page::PageLayout;
use crate::smooth_scroll::{SmoothScroll, SmoothScrollConfig};

const FOOTER_BORDER: u32 = 0xe5e7eb;

// ── Site ──────────────────────────────────────────────────────────────────

/// The CyberShift page as a desktop application.
///
/// ```rust,ignore
/// Site::new()
///     .title("CyberShift")
///     .size(1440.0, 900.0)
///     .assets("public")
///     .run()?;
/// ```
pub struct Site {
    title: String,
    width: f64,
    height: f64,
    asset_root: PathBuf,
    scroll: SmoothScrollConfig,
    quality: AdaptiveConfig,
    gpu: GpuInit,
}

impl Site {
    pub fn new() -> Self {
        Self {
            title: "CyberShift // Virtual Runway".to_string(),
            width: 1280.0,
            height: 800.0,
            asset_root: PathBuf::from("assets"),
            scroll: SmoothScrollConfig::default(),
            quality: AdaptiveConfig::default(),
            gpu: GpuInit::default(),
        }
    }

    pub fn title(mut self, t: impl Into<String>) -> Self {
        self.title = t.into();
        self
    }

    /// Initial window size in logical pixels.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Directory that site URLs such as `/textures/...` resolve against.
    pub fn assets(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn smooth_scroll(mut self, config: SmoothScrollConfig) -> Self {
        self.scroll = config;
        self
    }

    pub fn quality(mut self, config: AdaptiveConfig) -> Self {
        self.quality = config;
        self
    }

    pub fn gpu(mut self, init: GpuInit) -> Self {
        self.gpu = init;
        self
    }

    /// Opens the window and runs until it is closed.
    pub fn run(self) -> anyhow::Result<()> {
        let config = RuntimeConfig::default().with_title(self.title.clone()).with_size(self.width, self.height);
        let gpu = self.gpu.clone();
        log::info!("assets from {}", self.asset_root.display());
        Runtime::run(config, gpu, SiteApp::new(self))
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::new()
    }
}

// ── SiteApp ───────────────────────────────────────────────────────────────

/// Everything mounted on the page. Dropped as a unit on teardown.
struct Sections {
    hero: HeroCloth,
    lab: FabricLab,
    weave: MacroWeave,
}

impl Sections {
    fn mount(compositor: &mut Compositor, binder: &ScrollBinder) -> Self {
        Self {
            hero: HeroCloth::mount(compositor),
            lab: FabricLab::mount(compositor, binder),
            weave: MacroWeave::mount(compositor, binder),
        }
    }

    fn unmount(self, compositor: &mut Compositor) {
        self.weave.unmount(compositor);
        self.lab.unmount(compositor);
        self.hero.unmount(compositor);
    }
}

/// Internal state implementing `cybershift_engine::core::App`.
struct SiteApp {
    compositor: Compositor,
    binder: ScrollBinder,
    sections: Option<Sections>,
    lookbook: Lookbook,
    scroll: SmoothScroll,
    layout: PageLayout,
    assets: AssetStore,
    cursor: CursorIcon,

    fill_renderer: FillRenderer,
    glare_renderer: FillRenderer,
    image_renderer: ImageRenderer,
    ring_renderer: RingRenderer,
}

/// The main scene: default camera and the page-wide lights.
fn main_scene() -> SceneLayer {
    let mut main = SceneLayer::new(PerspectiveCamera::default());
    main.add_light(Light::directional(Vec3::new(5.0, 10.0, 5.0), 1.5));
    main.add_light(Light::ambient(0.7));
    main
}

impl SiteApp {
    fn new(site: Site) -> Self {
        let mut compositor = Compositor::with_quality(main_scene(), site.quality);
        let binder = ScrollBinder::new();
        let sections = Sections::mount(&mut compositor, &binder);
        let viewport = Viewport::new(site.width as f32, site.height as f32);

        Self {
            layout: PageLayout::with_pins(viewport, &binder),
            compositor,
            binder,
            sections: Some(sections),
            lookbook: Lookbook::new(),
            scroll: SmoothScroll::new(site.scroll),
            assets: AssetStore::new(site.asset_root),
            cursor: CursorIcon::Default,
            fill_renderer: FillRenderer::new(),
            glare_renderer: FillRenderer::new(),
            image_renderer: ImageRenderer::new(),
            ring_renderer: RingRenderer::new(),
        }
    }

    fn teardown(&mut self) {
        if let Some(sections) = self.sections.take() {
            sections.unmount(&mut self.compositor);
            log::debug!("page torn down");
        }
    }

    // ── input ─────────────────────────────────────────────────────────────

    /// Routes this frame's input against the layout that was on screen.
    fn handle_input(&mut self, input: &InputState, frame: &InputFrame, metrics: &SurfaceMetrics, time: f32) {
        let viewport = metrics.logical;
        let pointer = input.pointer_pos;
        let pointer_doc = pointer.map(|p| p + metrics.scroll);
        let lookbook = self.layout.lookbook;
        let over_lookbook = pointer_doc.is_some_and(|p| lookbook.contains(p));

        // Orbit drags own the pointer until release.
        let orbiting = self.compositor.route_pointer(input, frame, metrics);

        if !orbiting && over_lookbook && frame.buttons_pressed.contains(&MouseButton::Left) {
            self.lookbook.begin_swipe();
        }
        if self.lookbook.is_swiping() {
            self.lookbook.swipe_by(frame.pointer_delta.x, lookbook.width());
            if !input.button_down(MouseButton::Left) {
                self.lookbook.end_swipe(lookbook.width());
            }
        }

        if let Some(sections) = self.sections.as_ref() {
            for &click in &frame.clicks {
                if sections.hero.click(&mut self.compositor, metrics, click, time) {
                    log::trace!("pulse at {click:?}");
                }
            }
        }

        // winit reports wheel-away as positive; the page wants positive = down/right.
        let line_height = self.scroll.config().line_height;
        let wheel = -frame.wheel_delta(line_height);
        if wheel != Vec2::ZERO {
            let horizontal = if frame.wheel_modifiers.shift {
                wheel.y
            } else if wheel.x.abs() > wheel.y.abs() {
                wheel.x
            } else {
                0.0
            };

            let zoomed = pointer.is_some_and(|p| self.compositor.route_wheel(metrics, p, -wheel.y / line_height));
            if over_lookbook && horizontal != 0.0 {
                self.lookbook.wheel(horizontal, lookbook.width());
            } else if !zoomed {
                self.scroll.wheel(wheel.y);
            }
        }

        if section_share(lookbook, metrics.scroll.y, viewport.height) >= 0.5 {
            if frame.keys_pressed.contains(&Key::ArrowRight) {
                self.lookbook.step(1);
            }
            if frame.keys_pressed.contains(&Key::ArrowLeft) {
                self.lookbook.step(-1);
            }
        }
        self.scroll.keys(&frame.keys_pressed, input.modifiers.shift, viewport.height);
    }

    fn update_cursor(&mut self, ctx: &FrameCtx<'_, '_>, pointer_doc: Option<Vec2>) {
        let over_lab = pointer_doc.is_some_and(|p| {
            self.sections
                .as_ref()
                .is_some_and(|s| s.lab.rings().iter().any(|r| r.center.distance(p) <= r.radius))
        });
        let cursor = if over_lab {
            CursorIcon::Crosshair
        } else if self.lookbook.is_swiping() {
            CursorIcon::Grabbing
        } else {
            CursorIcon::Default
        };
        if cursor != self.cursor {
            ctx.window.set_cursor(cursor);
            self.cursor = cursor;
        }
    }

    // ── paint ─────────────────────────────────────────────────────────────

    /// Page foreground fills: lookbook, then the footer over it.
    fn page_fills(&self) -> Vec<Fill> {
        let mut fills = self.lookbook.fills(self.layout.lookbook);
        let footer = self.layout.footer;
        fills.push(Fill::new(footer, Color::WHITE));
        fills.push(Fill::new(Rect::new(footer.min().x, footer.min().y, footer.width(), 1.0), Color::hex(FOOTER_BORDER)));
        fills
    }

    fn loaded_images(&mut self) -> Vec<(ImageSlot, Rc<ImageData>)> {
        self.lookbook
            .image_slots(self.layout.lookbook)
            .into_iter()
            .filter_map(|slot| self.assets.image(slot.url).map(|img| (slot, img)))
            .collect()
    }
}

/// Fraction of the window covered by `section` at `scroll`.
fn section_share(section: Rect, scroll: f32, viewport_height: f32) -> f32 {
    if viewport_height <= 0.0 {
        return 0.0;
    }
    let top = section.min().y.max(scroll);
    let bottom = section.max().y.min(scroll + viewport_height);
    ((bottom - top) / viewport_height).max(0.0)
}

impl App for SiteApp {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if matches!(event, WindowEvent::CloseRequested) {
            self.teardown();
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let viewport = ctx.window.logical_size();
        let dt = ctx.time.dt;

        // ── input ─────────────────────────────────────────────────────────
        let shown = ctx.surface_metrics(Vec2::new(0.0, self.scroll.position()));
        self.handle_input(ctx.input, ctx.input_frame, &shown, ctx.time.elapsed);

        // ── layout ────────────────────────────────────────────────────────
        self.layout = PageLayout::with_pins(viewport, &self.binder);
        self.scroll.set_limit(self.layout.max_scroll());
        let scroll = self.scroll.update(dt);
        let pointer_doc = ctx.input.pointer_pos.map(|p| p + Vec2::new(0.0, scroll));

        if let Some(sections) = self.sections.as_mut() {
            sections.hero.layout(&self.layout);
            sections.lab.update(&self.layout, scroll, pointer_doc, dt);
        }

        // ── animation ─────────────────────────────────────────────────────
        self.binder.tick(scroll, viewport.height, dt, &self.layout, &mut self.compositor);
        self.compositor.update(&ctx.time);
        self.lookbook.point(self.layout.lookbook, pointer_doc);
        self.lookbook.update(dt);
        self.update_cursor(ctx, pointer_doc);

        // ── render ────────────────────────────────────────────────────────
        let metrics = ctx.surface_metrics(Vec2::new(0.0, scroll));
        let fills = self.page_fills();
        let glares = self.lookbook.glares(self.layout.lookbook);
        let rings = self.sections.as_ref().map(|s| s.lab.rings()).unwrap_or_default();
        let images = self.loaded_images();
        let section = self.layout.lookbook;
        let draws: Vec<ImageDraw<'_>> = images
            .iter()
            .map(|(slot, image)| ImageDraw { key: slot.url, image, rect: slot.rect, clip: Some(section), opacity: 1.0 })
            .collect();

        let compositor = &mut self.compositor;
        let r_fill = &mut self.fill_renderer;
        let r_glare = &mut self.glare_renderer;
        let r_image = &mut self.image_renderer;
        let r_ring = &mut self.ring_renderer;

        ctx.render(Color::WHITE, |rctx, target| {
            compositor.render(rctx, target, metrics.scroll);
            r_fill.render(rctx, target, &metrics, &fills);
            r_image.render(rctx, target, &metrics, &draws);
            r_glare.render(rctx, target, &metrics, &glares);
            r_ring.render(rctx, target, &metrics, &rings);
        })
    }
}
