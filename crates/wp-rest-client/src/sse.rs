//! Server-Sent Events (SSE) streaming support

use eventsource_client as es;
use eventsource_client::Client as _;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, trace};
use url::Url;
use wp_api_contract::WorkflowEvent;

use crate::auth::AuthConfig;
use crate::error::{RestClientError, RestClientResult};

const USER_AGENT: &str = concat!("wp/", env!("CARGO_PKG_VERSION"));

/// What the reader task does with one item from the event source
enum Frame {
    Event(RestClientResult<WorkflowEvent>),
    Skip,
    End,
}

fn translate(item: Result<es::SSE, es::Error>) -> Frame {
    match item {
        Ok(es::SSE::Event(event)) => {
            trace!("SSE event {}: {}", event.event_type, event.data);
            Frame::Event(
                WorkflowEvent::from_frame(&event.event_type, &event.data)
                    .map_err(RestClientError::from),
            )
        }
        // Comments and connection notices carry no workflow data
        Ok(_) => Frame::Skip,
        Err(es::Error::Eof) => Frame::End,
        Err(err @ es::Error::UnexpectedResponse(..)) => Frame::Event(Err(
            RestClientError::UnexpectedResponse(format!("{:?}", err)),
        )),
        Err(err) => Frame::Event(Err(RestClientError::Sse(format!("{:?}", err)))),
    }
}

fn setup_error(err: es::Error) -> RestClientError {
    RestClientError::Sse(format!("cannot open event stream: {:?}", err))
}

/// SSE event stream for a workflow run or resume
pub struct SseEventStream {
    receiver: mpsc::Receiver<RestClientResult<WorkflowEvent>>,
    handle: tokio::task::JoinHandle<()>,
}

impl SseEventStream {
    /// POST `body` to `url` and stream the workflow events it answers with
    ///
    /// The request is sent once. Reconnecting would replay the run, so a
    /// dropped connection ends the stream with an error instead.
    pub fn connect(url: &Url, body: String, auth: &AuthConfig) -> RestClientResult<Self> {
        let mut builder = es::ClientBuilder::for_url(url.as_str())
            .map_err(setup_error)?
            .method("POST".to_string())
            .body(body)
            .reconnect(es::ReconnectOptions::reconnect(false).build());

        for (name, value) in auth.headers()?.iter() {
            let value = value
                .to_str()
                .map_err(|e| RestClientError::Auth(format!("invalid header value: {}", e)))?;
            builder = builder.header(name.as_str(), value).map_err(setup_error)?;
        }
        let builder = builder
            .header("Content-Type", "application/json")
            .and_then(|b| b.header("Accept", "text/event-stream"))
            .and_then(|b| b.header("User-Agent", USER_AGENT))
            .map_err(setup_error)?;

        debug!("POST {} (event stream)", url);
        Ok(Self::from_source(builder.build().stream()))
    }

    /// Forward an event source into a workflow event stream
    ///
    /// Reading stops at the first error. A source that ends without a
    /// single event is reported as an error: rejected requests are answered
    /// with a JSON body that holds no events.
    pub fn from_source<S>(source: S) -> Self
    where
        S: Stream<Item = Result<es::SSE, es::Error>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(32);

        let handle = tokio::spawn(async move {
            let mut source = Box::pin(source);
            let mut delivered = 0usize;

            while let Some(item) = source.next().await {
                let event = match translate(item) {
                    Frame::Event(event) => event,
                    Frame::Skip => continue,
                    Frame::End => break,
                };
                let failed = event.is_err();
                if !failed {
                    delivered += 1;
                }
                if tx.send(event).await.is_err() || failed {
                    return;
                }
            }

            if delivered == 0 {
                let _ = tx
                    .send(Err(RestClientError::Sse(
                        "stream ended before any event was received".to_string(),
                    )))
                    .await;
            }
            debug!("SSE stream finished after {} events", delivered);
        });

        SseEventStream {
            receiver: rx,
            handle,
        }
    }
}

impl Stream for SseEventStream {
    type Item = RestClientResult<WorkflowEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for SseEventStream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_comments_are_skipped() {
        let frame = translate(Ok(es::SSE::Comment("keep-alive".to_string())));
        assert!(matches!(frame, Frame::Skip));
    }

    #[test]
    fn test_eof_ends_the_stream() {
        assert!(matches!(translate(Err(es::Error::Eof)), Frame::End));
    }

    #[test]
    fn test_transport_errors_become_sse_errors() {
        let frame = translate(Err(es::Error::TimedOut));
        assert!(matches!(frame, Frame::Event(Err(RestClientError::Sse(_)))));
    }

    #[tokio::test]
    async fn test_source_without_events_is_an_error() {
        let source = stream::iter(vec![
            Ok(es::SSE::Comment("ping".to_string())),
            Err(es::Error::Eof),
        ]);
        let items: Vec<_> = SseEventStream::from_source(source).collect().await;

        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(RestClientError::Sse(msg)) if msg.contains("before any event")));
    }

    #[tokio::test]
    async fn test_reading_stops_after_first_error() {
        let source = stream::iter(vec![
            Err(es::Error::TimedOut),
            Ok(es::SSE::Comment("late".to_string())),
            Err(es::Error::Eof),
        ]);
        let items: Vec<_> = SseEventStream::from_source(source).collect().await;

        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
