use std::path::Path;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::RequestBuilder;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::FetchError;

/// Stream the response of `request` into `dest`, replacing it if present.
///
/// Shows a progress bar on stderr when the server reports a length. Returns the byte count.
pub(crate) async fn download_to(
    request: RequestBuilder,
    dest: &Path,
    label: &str,
) -> Result<u64, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: response.url().to_string(),
            status,
        });
    }

    let progress = match response.content_length() {
        Some(total) => {
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "  {spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
            ) {
                bar.set_style(style.progress_chars("=> "));
            }
            bar
        }
        None => ProgressBar::new_spinner(),
    };
    progress.set_message(label.to_string());

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        progress.set_position(written);
    }
    file.flush().await?;
    progress.finish_and_clear();

    tracing::debug!(dest = %dest.display(), bytes = written, "download finished");
    Ok(written)
}
