//! Split a multipart body read from stdin.
//!
//! ```text
//! printf -- '--xyz\r\nname: a\r\n\r\nfirst\r\n--xyz\r\nname: b\r\n\r\nsecond\r\n--xyz--\r\n' \
//!     | RUST_LOG=info cargo run -p example -- xyz
//! ```
use body_reader::{BufferedReader, ReadError};
use std::env;
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() -> Result<(), ReadError> {
    env_logger::init();

    let Some(boundary) = env::args().nth(1) else {
        eprintln!("usage: example <boundary>");
        std::process::exit(2);
    };

    let open = format!("--{boundary}");
    let separator = format!("\r\n--{boundary}");

    let mut reader = BufferedReader::from_async_read(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    reader.pipe_until(&open, &mut tokio::io::sink(), true).await?;

    let mut index = 0;

    loop {
        if reader.peek(2).await? == "--" {
            break;
        }

        reader.consume_delimiter(b"\r\n").await?;

        let mut part = reader.delimit(&separator)?;
        let headers = part.read_until(b"\r\n\r\n", None, true).await?;
        log::info!("part {index}: {} header bytes", headers.len());

        part.pipe(&mut stdout).await?;
        log::info!("part {index}: {} bytes total", part.tell());
        drop(part);

        stdout.write_all(b"\n").await?;

        reader.consume_delimiter(&separator).await?;
        index += 1;
    }

    reader.exhaust().await?;
    log::info!("{index} parts, {} bytes read", reader.tell());

    Ok(())
}
