//! Print the normalized chunk sizes of stdin.
use body_reader::{Config, ReadError};

#[tokio::main]
async fn main() -> Result<(), ReadError> {
    env_logger::init();

    let chunk_size = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(body_reader::DEFAULT_CHUNK_SIZE);

    let source = body_reader::IoSource::with_capacity(tokio::io::stdin(), 512);
    let mut reader = Config::new().chunk_size(chunk_size).build(source);

    let mut chunks = reader.chunks()?;
    while let Some(chunk) = chunks.next().await {
        println!("{}", chunk?.len());
    }

    Ok(())
}
