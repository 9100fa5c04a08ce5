//! FFmpeg video filter definitions.

/// Thumbnail frame width.
pub const THUMBNAIL_WIDTH: u32 = 1280;
/// Thumbnail frame height.
pub const THUMBNAIL_HEIGHT: u32 = 720;

/// Title overlay appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleStyle {
    pub font_size: u32,
    pub font_color: String,
    pub border_width: u32,
    pub border_color: String,
    /// Explicit font file; FFmpeg's fontconfig default when absent
    pub font_file: Option<String>,
}

impl Default for TitleStyle {
    fn default() -> Self {
        Self {
            font_size: 88,
            font_color: "white".to_string(),
            border_width: 6,
            border_color: "black".to_string(),
            font_file: None,
        }
    }
}

/// Scale-and-crop a still to the thumbnail frame and draw the title read
/// from `text_file` centred on it. The title itself never enters the
/// filter string.
pub fn title_overlay(text_file: &str, style: &TitleStyle) -> String {
    let mut drawtext = format!(
        "drawtext=textfile={file}:fontsize={size}:fontcolor={color}:\
         borderw={bw}:bordercolor={bc}:x=(w-text_w)/2:y=(h-text_h)/2",
        file = text_file,
        size = style.font_size,
        color = style.font_color,
        bw = style.border_width,
        bc = style.border_color,
    );
    if let Some(font) = &style.font_file {
        drawtext.push_str(&format!(":fontfile={}", font));
    }

    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},{drawtext}",
        w = THUMBNAIL_WIDTH,
        h = THUMBNAIL_HEIGHT,
        drawtext = drawtext,
    )
}
