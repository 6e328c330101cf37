use std::fmt;
use std::str::FromStr;

use crate::coords::Rect;

/// A point along an element or the viewport, as a fraction of its height.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Anchor {
    Top,
    Center,
    Bottom,
    /// Fraction of the height, `0.0` = top.
    Fraction(f32),
}

impl Anchor {
    pub fn fraction(self) -> f32 {
        match self {
            Anchor::Top => 0.0,
            Anchor::Center => 0.5,
            Anchor::Bottom => 1.0,
            Anchor::Fraction(f) => f,
        }
    }
}

/// Anchor plus a pixel offset, e.g. `top+=100`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Edge {
    pub anchor: Anchor,
    pub offset: f32,
}

impl Edge {
    pub const fn new(anchor: Anchor) -> Self {
        Self { anchor, offset: 0.0 }
    }
}

/// Scroll offset at which a timeline starts or ends.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ScrollPosition {
    /// Document scroll offset in logical px.
    Absolute(f32),
    /// When `element` edge of the trigger region meets `viewport` edge of the window
    /// (`"top bottom"`: the region's top reaches the bottom of the viewport).
    Relative { element: Edge, viewport: Edge },
    /// Offset from the resolved start (`"+=500"`); only meaningful as an end.
    FromStart(f32),
}

impl ScrollPosition {
    pub const fn relative(element: Anchor, viewport: Anchor) -> Self {
        ScrollPosition::Relative { element: Edge::new(element), viewport: Edge::new(viewport) }
    }

    /// Resolves against the region's current document rect.
    ///
    /// `start` is the already resolved start for `FromStart` ends; as a start position
    /// `FromStart` counts from 0.
    pub fn resolve(&self, region: Rect, viewport_height: f32, start: Option<f32>) -> f32 {
        match *self {
            ScrollPosition::Absolute(px) => px,
            ScrollPosition::Relative { element, viewport } => {
                let element_y = region.min().y + region.height() * element.anchor.fraction() + element.offset;
                let viewport_y = viewport_height * viewport.anchor.fraction() + viewport.offset;
                element_y - viewport_y
            }
            ScrollPosition::FromStart(px) => start.unwrap_or(0.0) + px,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPositionParseError {
    input: String,
    reason: &'static str,
}

impl fmt::Display for ScrollPositionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scroll position `{}`: {}", self.input, self.reason)
    }
}

impl std::error::Error for ScrollPositionParseError {}

impl FromStr for ScrollPosition {
    type Err = ScrollPositionParseError;

    /// Accepts `"500"`, `"+=500"`, and `"<element> <viewport>"` pairs where each side is
    /// `top`, `center`, `bottom` or a percentage, optionally followed by `+=px`/`-=px`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ScrollPositionParseError { input: s.to_string(), reason };
        let trimmed = s.trim();

        if let Some(rest) = trimmed.strip_prefix("+=") {
            return parse_px(rest).map(ScrollPosition::FromStart).ok_or_else(|| err("bad offset"));
        }
        if let Some(px) = parse_px(trimmed) {
            return Ok(ScrollPosition::Absolute(px));
        }

        let mut parts = trimmed.split_whitespace();
        let (Some(element), Some(viewport), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(err("expected `<element> <viewport>`"));
        };

        Ok(ScrollPosition::Relative {
            element: parse_edge(element).ok_or_else(|| err("bad element edge"))?,
            viewport: parse_edge(viewport).ok_or_else(|| err("bad viewport edge"))?,
        })
    }
}

fn parse_px(s: &str) -> Option<f32> {
    let v: f32 = s.trim().trim_end_matches("px").parse().ok()?;
    v.is_finite().then_some(v)
}

fn parse_edge(token: &str) -> Option<Edge> {
    let (name, offset) = if let Some(i) = token.find("+=") {
        (&token[..i], parse_px(&token[i + 2..])?)
    } else if let Some(i) = token.find("-=") {
        (&token[..i], -parse_px(&token[i + 2..])?)
    } else {
        (token, 0.0)
    };

    let anchor = match name {
        "top" => Anchor::Top,
        "center" => Anchor::Center,
        "bottom" => Anchor::Bottom,
        pct => {
            let f: f32 = pct.strip_suffix('%')?.parse().ok()?;
            if !f.is_finite() {
                return None;
            }
            Anchor::Fraction(f / 100.0)
        }
    };
    Some(Edge { anchor, offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Rect {
        Rect::new(0.0, 1000.0, 800.0, 600.0)
    }

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn parses_keyword_pairs() {
        assert_eq!(
            "top bottom".parse::<ScrollPosition>().unwrap(),
            ScrollPosition::relative(Anchor::Top, Anchor::Bottom)
        );
    }

    #[test]
    fn parses_offsets_and_percentages() {
        let p: ScrollPosition = "top+=100 50%".parse().unwrap();
        assert_eq!(
            p,
            ScrollPosition::Relative {
                element: Edge { anchor: Anchor::Top, offset: 100.0 },
                viewport: Edge { anchor: Anchor::Fraction(0.5), offset: 0.0 },
            }
        );
        assert_eq!("bottom-=20px top".parse::<ScrollPosition>().unwrap().resolve(region(), 800.0, None), 1580.0);
    }

    #[test]
    fn parses_absolute_and_from_start() {
        assert_eq!("750".parse::<ScrollPosition>().unwrap(), ScrollPosition::Absolute(750.0));
        assert_eq!("+=300".parse::<ScrollPosition>().unwrap(), ScrollPosition::FromStart(300.0));
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "top", "top middle", "left top", "top bottom extra", "+=abc"] {
            assert!(bad.parse::<ScrollPosition>().is_err(), "{bad}");
        }
    }

    // ── resolution ────────────────────────────────────────────────────────

    #[test]
    fn resolves_against_region_and_viewport() {
        let vh = 800.0;
        let top_bottom = ScrollPosition::relative(Anchor::Top, Anchor::Bottom);
        let top_top = ScrollPosition::relative(Anchor::Top, Anchor::Top);
        let bottom_top = ScrollPosition::relative(Anchor::Bottom, Anchor::Top);
        assert_eq!(top_bottom.resolve(region(), vh, None), 200.0);
        assert_eq!(top_top.resolve(region(), vh, None), 1000.0);
        assert_eq!(bottom_top.resolve(region(), vh, None), 1600.0);
    }

    #[test]
    fn from_start_counts_from_resolved_start() {
        assert_eq!(ScrollPosition::FromStart(250.0).resolve(region(), 800.0, Some(1000.0)), 1250.0);
    }
}
