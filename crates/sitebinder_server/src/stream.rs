use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use sitebinder_engine::SessionStore;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// Streams a session artifact and reports back to the store when the body
/// has been fully read.
///
/// With `clean_on_complete`, the session is removed once the final chunk has
/// been consumed (the client-acknowledged cleanup path). An aborted or
/// failed stream only releases the reader registration; the directory stays
/// for the janitor or a retry.
pub struct SessionFileStream {
    inner: ReaderStream<File>,
    store: Arc<SessionStore>,
    id: Uuid,
    clean_on_complete: bool,
    finished: bool,
}

impl SessionFileStream {
    pub fn new(file: File, store: Arc<SessionStore>, id: Uuid, clean_on_complete: bool) -> Self {
        Self {
            inner: ReaderStream::new(file),
            store,
            id,
            clean_on_complete,
            finished: false,
        }
    }

    fn finish(&mut self, clean: bool) {
        if !self.finished {
            self.finished = true;
            self.store.finish_read(self.id, clean);
        }
    }
}

impl Stream for SessionFileStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(None) => {
                this.finish(this.clean_on_complete);
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(err))) => {
                this.finish(false);
                Poll::Ready(Some(Err(err)))
            }
            other => other,
        }
    }
}

impl Drop for SessionFileStream {
    fn drop(&mut self) {
        // Client went away mid-download: release the reader, keep the data.
        self.finish(false);
    }
}
