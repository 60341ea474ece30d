use std::path::Path;

use tracing::info;

use crate::error::AppError;
use crate::output::replace_file;
use crate::vision::{ThumbnailSpec, VisionApi};

/// Request a thumbnail for `image_url` and store the bytes verbatim at `path`.
/// Returns the number of bytes written.
pub async fn write_thumbnail<V>(
    vision: &V,
    image_url: &str,
    spec: ThumbnailSpec,
    path: &Path,
) -> Result<usize, AppError>
where
    V: VisionApi + ?Sized,
{
    let bytes = vision.thumbnail(image_url, spec).await?;
    replace_file(path, &bytes).await.map_err(|source| AppError::Write {
        path: path.display().to_string(),
        source,
    })?;
    info!(
        "thumbnail {}x{} saved to {}",
        spec.width,
        spec.height,
        path.display()
    );
    Ok(bytes.len())
}
