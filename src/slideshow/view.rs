//! Serializable description of what a slideshow currently presents.

use serde::Serialize;

use crate::models::{MediaType, Rgb};

/// Fallback overlay when no palette is known.
pub const DEFAULT_OVERLAY: &str = "linear-gradient(to top, rgba(0, 0, 0, 0.7), rgba(0, 0, 0, 0))";

/// Rendering area in CSS pixels.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Call-to-action button. Only rendered when both text and link are set.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallToAction {
    pub text: String,
    pub link: String,
}

/// The active slide.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlideView {
    pub index: usize,
    pub total: usize,
    pub banner_id: String,
    pub media_type: MediaType,
    pub media_url: String,
    /// Placeholder shown while a video has never decoded a frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    pub loading: bool,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<CallToAction>,
    pub overlay_gradient: String,
    pub palette: Vec<Rgb>,
    pub playing: bool,
    pub transitioning: bool,
    pub hovering: bool,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SlideshowView {
    Empty { viewport: Viewport },
    Slide(SlideView),
}

impl SlideshowView {
    pub fn slide(&self) -> Option<&SlideView> {
        match self {
            SlideshowView::Slide(slide) => Some(slide),
            SlideshowView::Empty { .. } => None,
        }
    }
}

/// Bottom-up gradient from the leading palette colours.
pub fn overlay_gradient(palette: &[Rgb]) -> String {
    match palette {
        [] => DEFAULT_OVERLAY.to_string(),
        [only] => format!(
            "linear-gradient(to top, {}, {})",
            only.css_rgba(0.8),
            only.css_rgba(0.0)
        ),
        [first, second] => format!(
            "linear-gradient(to top, {}, {}, rgba(0, 0, 0, 0))",
            first.css_rgba(0.8),
            second.css_rgba(0.4)
        ),
        [first, second, third, ..] => format!(
            "linear-gradient(to top, {}, {}, {})",
            first.css_rgba(0.8),
            second.css_rgba(0.5),
            third.css_rgba(0.0)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_palette_uses_default_overlay() {
        assert_eq!(overlay_gradient(&[]), DEFAULT_OVERLAY);
    }

    #[test]
    fn test_gradient_uses_at_most_three_colours() {
        let palette = [
            Rgb::new(200, 10, 10),
            Rgb::new(10, 200, 10),
            Rgb::new(10, 10, 200),
            Rgb::new(99, 99, 99),
        ];
        let gradient = overlay_gradient(&palette);
        assert!(gradient.starts_with("linear-gradient(to top, rgba(200, 10, 10, 0.8)"));
        assert!(gradient.contains("rgba(10, 10, 200, 0)"));
        assert!(!gradient.contains("99"));
    }

    #[test]
    fn test_single_colour_fades_to_transparent() {
        let gradient = overlay_gradient(&[Rgb::new(1, 2, 3)]);
        assert_eq!(
            gradient,
            "linear-gradient(to top, rgba(1, 2, 3, 0.8), rgba(1, 2, 3, 0))"
        );
    }

    #[test]
    fn test_view_is_tagged_by_state() {
        let view = SlideshowView::Empty {
            viewport: Viewport {
                width: 320,
                height: 180,
            },
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "empty");
        assert_eq!(json["viewport"]["width"], 320);
    }
}
