use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::warn;

use crate::error::AppError;
use crate::output::{replace_file, OutputPaths};
use crate::overlay::{render_overlay, OverlayStyle};
use crate::report::format_analysis;
use crate::thumbnail::write_thumbnail;
use crate::vision::{ThumbnailSpec, VisionApi};

pub const URL_PROMPT: &str = "Enter URL to your picture: ";
pub const CONTINUE_PROMPT: &str = "Hit Enter to continue or write 'exit' to Exit: ";

/// Interactive loop: one analysis + overlay + thumbnail per entered URL.
pub struct Session<'a, V: VisionApi + ?Sized> {
    vision: &'a V,
    style: OverlayStyle,
    paths: OutputPaths,
    thumbnail: ThumbnailSpec,
}

impl<'a, V> Session<'a, V>
where
    V: VisionApi + ?Sized,
{
    pub fn new(vision: &'a V, style: OverlayStyle, paths: OutputPaths, thumbnail: ThumbnailSpec) -> Self {
        Self {
            vision,
            style,
            paths,
            thumbnail,
        }
    }

    /// Run until the user types `exit` or input ends. Non-fatal errors are
    /// printed and the loop carries on; fatal ones are returned.
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        loop {
            let Some(url) = read_url(&mut lines, out).await? else {
                break;
            };

            if let Err(e) = self.process(&url, out).await {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!(url = %url, "iteration failed: {}", e);
                writeln!(out, "Error: {}", e)?;
            }

            prompt(out, CONTINUE_PROMPT)?;
            match lines.next_line().await? {
                Some(answer) if answer.trim().eq_ignore_ascii_case("exit") => break,
                Some(_) => {}
                None => break,
            }
        }
        Ok(())
    }

    /// One iteration: analysis, optional overlay, thumbnail.
    pub async fn process<W: Write>(&self, url: &str, out: &mut W) -> Result<(), AppError> {
        writeln!(out, "Analyzing {}", url)?;
        let analysis = self.vision.analyze(url).await?;
        for line in format_analysis(&analysis) {
            writeln!(out, "{}", line)?;
        }

        if !analysis.objects.is_empty() {
            let source = self.vision.fetch_image(url).await?;
            let annotated = render_overlay(&source, &analysis.objects, &self.style)?;
            let path = &self.paths.objects;
            replace_file(path, &annotated)
                .await
                .map_err(|source| AppError::Write {
                    path: path.display().to_string(),
                    source,
                })?;
            writeln!(out, "Results saved in {}", path.display())?;
        }

        writeln!(out, "Generating thumbnail")?;
        write_thumbnail(self.vision, url, self.thumbnail, &self.paths.thumbnail).await?;
        writeln!(out, "Thumbnail saved in {}\n", self.paths.thumbnail.display())?;
        Ok(())
    }
}

async fn read_url<R, W>(lines: &mut Lines<R>, out: &mut W) -> Result<Option<String>, AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        prompt(out, URL_PROMPT)?;
        match lines.next_line().await? {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => return Ok(Some(line.trim().to_string())),
            None => return Ok(None),
        }
    }
}

fn prompt<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    write!(out, "{}", text)?;
    out.flush()
}
