use bytes::Bytes;
use futures_util::{StreamExt, stream};
use std::io;

use super::{IoSource, Limited};
use crate::BufferedReader;

fn source(chunks: &[&'static [u8]]) -> impl futures_core::Stream<Item = io::Result<Bytes>> + Unpin {
    let chunks: Vec<_> = chunks.iter().map(|c| Ok(Bytes::from_static(c))).collect();
    stream::iter(chunks)
}

#[tokio::test]
async fn test_limited() {
    let mut limited = Limited::new(source(&[b"abc", b"defg", b"hij"]), 5);

    assert_eq!(limited.next().await.unwrap().unwrap(), "abc");
    assert_eq!(limited.remaining(), 2);
    assert_eq!(limited.next().await.unwrap().unwrap(), "de");
    assert_eq!(limited.remaining(), 0);
    assert!(limited.next().await.is_none());

    // inner source is left untouched
    let mut inner = limited.into_inner();
    assert_eq!(inner.next().await.unwrap().unwrap(), "hij");
}

#[tokio::test]
async fn test_limited_short() {
    let mut reader = BufferedReader::new(Limited::new(source(&[b"abc"]), 10));
    assert_eq!(reader.read_all().await.unwrap(), "abc");
    assert!(reader.eof());

    let mut reader = BufferedReader::new(Limited::new(source(&[b"abc"]), 0));
    assert_eq!(reader.read_all().await.unwrap(), "");
}

#[tokio::test]
async fn test_limited_reader() {
    let body = Limited::new(source(&[b"name=value", b"&next=request"]), 10);
    let mut reader = BufferedReader::with_chunk_size(body, 4);

    assert_eq!(reader.read_until(b"=", None, true).await.unwrap(), "name");
    assert_eq!(reader.read(100).await.unwrap(), "value");
    assert!(reader.eof());
}

#[tokio::test]
async fn test_io_source() {
    let data: &[u8] = b"0123456789abcdef";
    let mut source = IoSource::with_capacity(data, 6);

    assert_eq!(source.next().await.unwrap().unwrap(), "012345");
    assert_eq!(*source.get_ref(), &b"6789abcdef"[..]);
    assert_eq!(source.next().await.unwrap().unwrap(), "6789ab");
    assert_eq!(source.next().await.unwrap().unwrap(), "cdef");
    assert!(source.next().await.is_none());
    assert!(source.next().await.is_none());
}

#[tokio::test]
async fn test_io_source_into_inner() {
    let data: &[u8] = b"head\r\nbody";
    let mut source = IoSource::with_capacity(data, 4);

    assert_eq!(source.next().await.unwrap().unwrap(), "head");

    // unread bytes stay in the reader
    let mut inner = source.into_inner();
    let mut rest = vec![];
    tokio::io::AsyncReadExt::read_to_end(&mut inner, &mut rest).await.unwrap();
    assert_eq!(rest, b"\r\nbody");
}

#[tokio::test]
async fn test_io_source_reader() {
    let (mut tx, rx) = tokio::io::duplex(4);

    let writer = async move {
        use tokio::io::AsyncWriteExt;
        tx.write_all(b"first\r\nsecond\r\nthird").await.unwrap();
    };

    let reader = async move {
        let mut reader = BufferedReader::from_async_read(rx);
        let first = reader.read_until(b"\r\n", None, true).await.unwrap();
        let second = reader.read_until(b"\r\n", None, true).await.unwrap();
        let third = reader.read_all().await.unwrap();
        (first, second, third)
    };

    let ((), (first, second, third)) = tokio::join!(writer, reader);

    assert_eq!(first, "first");
    assert_eq!(second, "second");
    assert_eq!(third, "third");
}
