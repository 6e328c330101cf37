//! Lookbook: a horizontally swiping gallery in a full-height section.
//!
//! The gallery position is measured in slides. Wheel and drag move it freely, then it
//! snaps to the nearest slide; arrow keys step one slide. Whenever an outfit slide is
//! at least half visible, the section background eases to that outfit's color.
//! Hovering an outfit card lifts it slightly and lays a glare over it.

use glam::Vec2;

use cybershift_engine::anim::{damp, Ease, Tween};
use cybershift_engine::coords::Rect;
use cybershift_engine::paint::Color;
use cybershift_engine::render::Fill;

use crate::page::scale_about_center;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Slide {
    pub name: &'static str,
    /// Section color while this slide is showing; the intro keeps whatever was there.
    pub color: Option<u32>,
    pub image: Option<&'static str>,
}

pub const SLIDES: [Slide; 4] = [
    Slide { name: "Lookbook", color: None, image: None },
    Slide { name: "Urban Armor", color: Some(0xf0f0f0), image: Some("/textures/lookbook/urban_armor.png") },
    Slide { name: "Neon Nomad", color: Some(0xffffff), image: Some("/textures/lookbook/neon_nomad.png") },
    Slide { name: "Cyber Shift", color: Some(0xf5f5f5), image: Some("/textures/lookbook/cyber_shift.png") },
];

const BACKGROUND_SECONDS: f32 = 0.8;
/// Visible fraction at which a slide takes over the background.
const VISIBLE_THRESHOLD: f32 = 0.5;
/// Seconds without wheel input before snapping.
const WHEEL_IDLE: f32 = 0.15;
/// Fraction of the section width a swipe must travel to change slide.
const SWIPE_THRESHOLD: f32 = 0.2;
/// Decay rate of the gallery position toward its target, per second.
const FOLLOW_LAMBDA: f32 = 12.0;

const PLACEHOLDER: u32 = 0xf3f4f6;
const MAX_CONTENT_WIDTH: f32 = 896.0;
const SLIDE_PADDING: f32 = 32.0;
const COLUMN_GAP: f32 = 48.0;
const TWO_COLUMN_BREAKPOINT: f32 = 768.0;
/// Image boxes are 3:4 portrait.
const IMAGE_ASPECT: f32 = 3.0 / 4.0;
const MAX_IMAGE_HEIGHT: f32 = 0.8;

/// Card scale at full hover.
const HOVER_SCALE: f32 = 1.02;
const HOVER_SECONDS: f32 = 0.4;
/// Glare opacity with the pointer on the card's bottom edge.
const MAX_GLARE: f32 = 0.2;

#[derive(Debug, Copy, Clone, PartialEq)]
struct Swipe {
    origin: f32,
    travelled: f32,
}

/// Last card under the pointer and how far down it the pointer was, `0..=1`.
#[derive(Debug, Copy, Clone, PartialEq)]
struct CardHover {
    slide: usize,
    along: f32,
}

/// Where an outfit image goes this frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ImageSlot {
    pub url: &'static str,
    pub rect: Rect,
    /// White overlay opacity.
    pub glare: f32,
}

#[derive(Debug, Clone)]
pub struct Lookbook {
    position: f32,
    target: f32,
    swipe: Option<Swipe>,
    wheel_idle: Option<f32>,
    active: usize,
    background: Tween<Color>,
    card: Option<CardHover>,
    hover: Tween<f32>,
}

impl Default for Lookbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Lookbook {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            target: 0.0,
            swipe: None,
            wheel_idle: None,
            active: 0,
            background: Tween::settled(Color::WHITE),
            card: None,
            hover: Tween::settled(0.0),
        }
    }

    fn last(&self) -> f32 {
        (SLIDES.len() - 1) as f32
    }

    /// Gallery position in slides; `1.5` is half way between the first and second outfit.
    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn background(&self) -> Color {
        self.background.value()
    }

    pub fn is_swiping(&self) -> bool {
        self.swipe.is_some()
    }

    /// Fraction of slide `index` inside the section, `0..=1`.
    pub fn visibility(&self, index: usize) -> f32 {
        (1.0 - (self.position - index as f32).abs()).clamp(0.0, 1.0)
    }

    /// Horizontal wheel input in px. Snaps once the wheel goes quiet.
    pub fn wheel(&mut self, dx: f32, width: f32) {
        if !dx.is_finite() || width <= 0.0 || self.swipe.is_some() {
            return;
        }
        self.target = (self.target + dx / width).clamp(0.0, self.last());
        self.wheel_idle = Some(0.0);
    }

    pub fn begin_swipe(&mut self) {
        self.wheel_idle = None;
        self.swipe = Some(Swipe { origin: self.target.round(), travelled: 0.0 });
    }

    /// Pointer movement while swiping, in px. Content follows the finger.
    pub fn swipe_by(&mut self, dx: f32, width: f32) {
        let last = self.last();
        let Some(swipe) = self.swipe.as_mut() else { return };
        if !dx.is_finite() || width <= 0.0 {
            return;
        }
        swipe.travelled += dx;
        self.target = (swipe.origin - swipe.travelled / width).clamp(0.0, last);
        self.position = self.target;
    }

    /// Ends a swipe, moving one slide when it travelled far enough.
    pub fn end_swipe(&mut self, width: f32) {
        let Some(swipe) = self.swipe.take() else { return };
        let threshold = width.max(1.0) * SWIPE_THRESHOLD;
        let step = if swipe.travelled <= -threshold {
            1.0
        } else if swipe.travelled >= threshold {
            -1.0
        } else {
            0.0
        };
        self.target = (swipe.origin + step).clamp(0.0, self.last());
    }

    /// Moves `direction` slides from the current snap point.
    pub fn step(&mut self, direction: i32) {
        if self.swipe.is_some() {
            return;
        }
        self.wheel_idle = None;
        self.target = (self.target.round() + direction as f32).clamp(0.0, self.last());
    }

    /// Pointer in document space. Swiping and leaving every card release the hover.
    pub fn point(&mut self, section: Rect, pointer: Option<Vec2>) {
        let hit = pointer.filter(|_| self.swipe.is_none()).and_then(|p| {
            self.cards(section)
                .find(|(_, _, rect)| rect.contains(p))
                .map(|(slide, _, rect)| CardHover { slide, along: rect.normalize_point(p).y.clamp(0.0, 1.0) })
        });
        let goal = if hit.is_some() { 1.0 } else { 0.0 };
        if hit.is_some() {
            self.card = hit;
        }
        if self.hover.target() != goal {
            self.hover.retarget(goal, HOVER_SECONDS, Ease::POWER2_OUT);
        }
    }

    /// Advances snapping, the gallery position and the background tween.
    pub fn update(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if let Some(idle) = self.wheel_idle.as_mut() {
            *idle += dt;
            if *idle >= WHEEL_IDLE {
                self.target = self.target.round();
                self.wheel_idle = None;
            }
        }

        if self.swipe.is_none() {
            self.position = damp(self.position, self.target, FOLLOW_LAMBDA, dt);
            if (self.position - self.target).abs() < 1e-3 {
                self.position = self.target;
            }
        }

        let nearest = (self.position.round() as usize).min(SLIDES.len() - 1);
        if nearest != self.active && self.visibility(nearest) >= VISIBLE_THRESHOLD {
            self.active = nearest;
            if let Some(color) = SLIDES[nearest].color {
                log::debug!("lookbook showing `{}`", SLIDES[nearest].name);
                self.background.retarget(Color::hex(color), BACKGROUND_SECONDS, Ease::POWER2_OUT);
            }
        }
        self.background.advance(dt);
        if self.hover.advance(dt) == 0.0 {
            self.card = None;
        }
    }

    /// Slide `index` inside `section`, shifted by the gallery position.
    pub fn slide_rect(&self, section: Rect, index: usize) -> Rect {
        let dx = (index as f32 - self.position) * section.width();
        section.translated(glam::Vec2::new(dx, 0.0))
    }

    /// Section background plus an image placeholder per visible outfit slide.
    ///
    /// Everything is clipped to the section.
    pub fn fills(&self, section: Rect) -> Vec<Fill> {
        let mut fills = vec![Fill::new(section, self.background())];
        fills.extend(
            self.image_slots(section)
                .into_iter()
                .map(|slot| Fill::new(slot.rect, Color::hex(PLACEHOLDER)).clipped(section)),
        );
        fills
    }

    /// Glare overlays for hovered cards, clipped to the section.
    pub fn glares(&self, section: Rect) -> Vec<Fill> {
        self.image_slots(section)
            .into_iter()
            .filter(|slot| slot.glare > 0.0)
            .map(|slot| Fill::new(slot.rect, Color::WHITE.with_alpha(slot.glare)).clipped(section))
            .collect()
    }

    /// Image boxes of the outfit slides that overlap the section.
    pub fn image_slots(&self, section: Rect) -> Vec<ImageSlot> {
        self.cards(section)
            .map(|(slide, url, rect)| match self.card.filter(|c| c.slide == slide) {
                Some(card) => {
                    let lift = self.hover.value();
                    ImageSlot {
                        url,
                        rect: scale_about_center(rect, 1.0 + (HOVER_SCALE - 1.0) * lift),
                        glare: MAX_GLARE * lift * card.along,
                    }
                }
                None => ImageSlot { url, rect, glare: 0.0 },
            })
            .collect()
    }

    /// Unhovered card boxes of the visible outfit slides.
    fn cards(&self, section: Rect) -> impl Iterator<Item = (usize, &'static str, Rect)> + '_ {
        SLIDES.iter().enumerate().filter_map(move |(i, slide)| {
            let url = slide.image?;
            let slide_rect = self.slide_rect(section, i);
            slide_rect.intersect(section)?;
            Some((i, url, image_box(slide_rect)))
        })
    }
}

/// The 3:4 image box of an outfit slide: right column on wide screens, centred
/// otherwise, never taller than most of the slide.
fn image_box(slide: Rect) -> Rect {
    let content_w = (slide.width() - SLIDE_PADDING * 2.0).min(MAX_CONTENT_WIDTH).max(0.0);
    let content_x = slide.min().x + (slide.width() - content_w) * 0.5;
    let two_columns = slide.width() >= TWO_COLUMN_BREAKPOINT;

    let column_w = if two_columns { (content_w - COLUMN_GAP) * 0.5 } else { content_w };
    let max_h = slide.height() * MAX_IMAGE_HEIGHT;
    let mut w = column_w.max(0.0);
    let mut h = w / IMAGE_ASPECT;
    if h > max_h {
        h = max_h;
        w = h * IMAGE_ASPECT;
    }

    let column_x = if two_columns { content_x + column_w + COLUMN_GAP } else { content_x };
    let x = column_x + (column_w - w) * 0.5;
    let y = slide.min().y + (slide.height() - h) * 0.5;
    Rect::new(x, y, w, h)
}
