//! Title-card thumbnails composed through the media engine.

use tracing::debug;

use reel_media::filters::{title_overlay, TitleStyle};
use reel_media::{FfmpegCommand, MediaEngine};
use reel_models::{MediaKind, Scene};

use crate::error::{StudioError, StudioResult};
use crate::fetch::AssetFetcher;

pub const TITLE_TEXT_FILE: &str = "title.txt";
pub const THUMBNAIL_FILE: &str = "thumbnail.png";

/// Working file for the still behind the title. Videos without a poster
/// frame contribute their first frame.
fn source_file_name(scene: &Scene) -> &'static str {
    if scene.kind == MediaKind::Video && scene.thumbnail_url.is_none() {
        "thumbnail_source.mp4"
    } else {
        "thumbnail_source.png"
    }
}

/// The single-frame command drawing the title over the still.
pub fn thumbnail_command(source_file: &str, style: &TitleStyle) -> FfmpegCommand {
    FfmpegCommand::new(THUMBNAIL_FILE)
        .input(source_file)
        .video_filter(title_overlay(TITLE_TEXT_FILE, style))
        .single_frame()
}

/// Draw `title` over the scene's still and return PNG bytes.
///
/// The caller must hold exclusive use of the engine's working storage.
pub async fn compose_thumbnail(
    engine: &dyn MediaEngine,
    fetcher: &dyn AssetFetcher,
    scene: &Scene,
    title: &str,
    style: &TitleStyle,
) -> StudioResult<Vec<u8>> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StudioError::empty_input("A title is required for the thumbnail"));
    }

    let source_file = source_file_name(scene);
    let still = fetcher.fetch(scene.still_url()).await?;
    engine.write_file(source_file, &still).await?;
    engine.write_file(TITLE_TEXT_FILE, title.as_bytes()).await?;

    let command = thumbnail_command(source_file, style);
    engine.exec(&command, None).await?;

    let png = engine
        .read_file(THUMBNAIL_FILE)
        .await?
        .into_binary()
        .ok_or(StudioError::UnsupportedOutputType)?;
    debug!(bytes = png.len(), "Thumbnail composed");
    Ok(png)
}
