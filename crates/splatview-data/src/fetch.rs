//! Scene transport: HTTP fetch and local file reads.

use crate::error::{DataResult, LoadError};

use futures_util::StreamExt;
use tracing::info;

/// Fetch scene bytes over HTTP.
///
/// The server must answer 200 with a Content-Length header. The body is
/// streamed into a buffer preallocated to exactly that size; a body that
/// ends early or runs past the advertised length fails the whole load.
pub async fn fetch_scene(url: &str) -> DataResult<Vec<u8>> {
    let client = reqwest::Client::new();
    let response = client.get(url).send().await?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(LoadError::Status(response.status()));
    }

    let expected = match response.content_length() {
        Some(n) => n as usize,
        None => return Err(LoadError::MissingContentLength),
    };

    let mut buffer = vec![0u8; expected];
    let mut received = 0usize;

    let mut stream = response.bytes_stream();
    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result?;
        if received + chunk.len() > expected {
            return Err(LoadError::Overrun { expected });
        }
        buffer[received..received + chunk.len()].copy_from_slice(&chunk);
        received += chunk.len();
    }

    if received != expected {
        return Err(LoadError::ShortRead { expected, received });
    }

    info!("fetched {received} scene bytes from {url}");
    Ok(buffer)
}

/// Read scene bytes from a local file.
pub fn read_scene_file(path: &str) -> DataResult<Vec<u8>> {
    let bytes = std::fs::read(path)?;
    info!("read {} scene bytes from {path}", bytes.len());
    Ok(bytes)
}

/// Load scene bytes from a URL or a local path.
pub async fn load_scene_bytes(source: &str) -> DataResult<Vec<u8>> {
    if is_remote(source) {
        fetch_scene(source).await
    } else {
        read_scene_file(source)
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
