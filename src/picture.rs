//! Caption placement on a meme picture.
//!
//! Captions are stored in an 800x450 reference frame and scaled to whatever
//! width the picture is displayed at.

use crate::models::MemeText;

pub const REF_WIDTH: f64 = 800.0;
pub const REF_HEIGHT: f64 = 450.0;
pub const REF_FONT_SIZE: f64 = 36.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PictureLayout {
    pub height: f64,
    pub font_size: f64,
    pub texts: Vec<MemeText>,
}

/// Lays captions out for a picture `box_width` pixels wide.
///
/// Without a known width the captions keep their literal coordinates and the
/// picture has no height yet.
pub fn layout(texts: &[MemeText], box_width: Option<f64>) -> PictureLayout {
    let Some(width) = box_width.filter(|w| *w > 0.0) else {
        return PictureLayout {
            height: 0.0,
            font_size: 0.0,
            texts: texts.to_vec(),
        };
    };

    let scale = width / REF_WIDTH;
    PictureLayout {
        height: scale * REF_HEIGHT,
        font_size: scale * REF_FONT_SIZE,
        texts: texts
            .iter()
            .map(|t| MemeText {
                content: t.content.clone(),
                x: scale * t.x,
                y: scale * t.y,
            })
            .collect(),
    }
}

/// Converts a dragged on-screen position back into the reference frame,
/// clamping it inside the displayed picture first.
pub fn drag_to(container_width: f64, container_height: f64, x: f64, y: f64) -> (f64, f64) {
    if container_width <= 0.0 {
        return (0.0, 0.0);
    }
    let clamped_x = x.clamp(0.0, container_width);
    let clamped_y = y.clamp(0.0, container_height.max(0.0));
    let scale = REF_WIDTH / container_width;
    (clamped_x * scale, clamped_y * scale)
}
