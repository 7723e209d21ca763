//! Request body accumulation
//!
//! Buffers an inbound body frame by frame and only returns once the body
//! signals end of stream.

use crate::{Error, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use http_body_util::BodyExt;
use hyper::body::Body;
use tracing::{debug, trace};

/// Read a body to completion.
///
/// Data frames are appended in arrival order; trailer frames are ignored.
/// A stream error aborts the read and discards whatever was buffered.
pub async fn read_to_end<B>(body: B) -> Result<Bytes>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let mut buf = BytesMut::new();
    let mut chunks = 0usize;

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| Error::Body(e.to_string()))?;
        if let Ok(data) = frame.into_data() {
            chunks += 1;
            trace!(chunk = chunks, len = data.remaining(), "body chunk received");
            buf.put(data);
        }
    }

    debug!(chunks, total = buf.len(), "body complete");
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use http_body_util::{Empty, Full, StreamBody};
    use hyper::body::Frame;
    use std::convert::Infallible;

    fn chunked(
        chunks: Vec<&'static str>,
    ) -> StreamBody<impl futures_util::Stream<Item = std::result::Result<Frame<Bytes>, Infallible>>> {
        StreamBody::new(stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Frame::data(Bytes::from_static(c.as_bytes())))),
        ))
    }

    #[tokio::test]
    async fn test_empty_body() {
        let bytes = read_to_end(Empty::<Bytes>::new()).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_single_frame() {
        let bytes = read_to_end(Full::new(Bytes::from_static(b"username=alice")))
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"username=alice");
    }

    #[tokio::test]
    async fn test_chunks_concatenate_in_order() {
        let body = chunked(vec!["user", "name=al", "ice&pass", "word=secret"]);
        let bytes = read_to_end(body).await.unwrap();
        assert_eq!(&bytes[..], b"username=alice&password=secret");
    }

    #[tokio::test]
    async fn test_trailers_are_ignored() {
        let mut trailers = http::HeaderMap::new();
        trailers.insert("x-checksum", http::HeaderValue::from_static("abc"));

        let frames: Vec<std::result::Result<Frame<Bytes>, Infallible>> = vec![
            Ok(Frame::data(Bytes::from_static(b"a=1"))),
            Ok(Frame::trailers(trailers)),
        ];
        let bytes = read_to_end(StreamBody::new(stream::iter(frames))).await.unwrap();
        assert_eq!(&bytes[..], b"a=1");
    }

    #[tokio::test]
    async fn test_stream_error_aborts() {
        let frames: Vec<std::result::Result<Frame<Bytes>, std::io::Error>> = vec![
            Ok(Frame::data(Bytes::from_static(b"username="))),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer gone")),
        ];

        let err = read_to_end(StreamBody::new(stream::iter(frames)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Body(msg) if msg.contains("peer gone")));
    }
}
