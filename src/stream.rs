//! Streaming relay of origin bodies.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::Stream;
use http_body::{Body, Frame, SizeHint};
use pin_project::pin_project;

/// Response body relaying an origin byte stream to the client.
///
/// Implements [`Stream`], [`Body`], and [`IntoResponse`]. Dropping it (for
/// example when the client disconnects) drops the origin stream, which
/// cancels the upstream fetch.
#[pin_project]
pub struct RelayBody<S> {
    #[pin]
    inner: S,
    expected: Option<u64>,
    relayed: u64,
    done: bool,
}

impl<S> RelayBody<S> {
    /// `expected` is the origin's declared length, used as an exact size hint.
    pub fn new(inner: S, expected: Option<u64>) -> Self {
        RelayBody { inner, expected, relayed: 0, done: false }
    }

    pub fn relayed(&self) -> u64 {
        self.relayed
    }
}

impl RelayBody<Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>> {
    /// Relay the body of an origin response.
    pub fn from_response(response: reqwest::Response) -> Self {
        let expected = response.content_length();
        RelayBody::new(Box::pin(response.bytes_stream()), expected)
    }
}

impl<S, E> Stream for RelayBody<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<io::Result<Bytes>>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                *this.relayed += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                *this.done = true;
                tracing::warn!(relayed = *this.relayed, error = %e, "origin stream failed");
                Poll::Ready(Some(Err(io::Error::other(e))))
            }
            Poll::Ready(None) => {
                *this.done = true;
                tracing::debug!(relayed = *this.relayed, "origin stream complete");
                Poll::Ready(None)
            }
        }
    }
}

impl<S, E> Body for RelayBody<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Data = Bytes;
    type Error = io::Error;

    fn size_hint(&self) -> SizeHint {
        match self.expected {
            Some(expected) => SizeHint::with_exact(expected.saturating_sub(self.relayed)),
            None => SizeHint::default(),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.done
    }

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>)
        -> Poll<Option<io::Result<Frame<Bytes>>>>
    {
        self.poll_next(cx).map(|item| item.map(|result| result.map(Frame::data)))
    }
}

impl<S, E> IntoResponse for RelayBody<S>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_response(self) -> Response {
        Response::new(axum::body::Body::new(self))
    }
}
