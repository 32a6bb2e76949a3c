//! Lists that refresh themselves when a row lands in their table.
//!
//! A [`LiveFeed`] fetches once, then re-runs the fetch on every realtime
//! INSERT for its table and publishes the fresh rows on a `watch` channel.
//! Every event triggers a full re-fetch; there is no debounce.

use std::future::Future;

use broto_common::AppResult;
use broto_db::{ChangeEvent, RealtimeClient};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

/// A self-refreshing value. The refresh task stops when the feed is dropped.
pub struct LiveFeed<T> {
    table: String,
    rows: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> LiveFeed<T>
where
    T: Send + Sync + 'static,
{
    /// Fetch the initial value and follow `table` on `realtime`.
    pub async fn start<F, Fut>(
        realtime: &RealtimeClient,
        table: impl Into<String>,
        fetch: F,
    ) -> AppResult<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<T>> + Send,
    {
        Self::follow(realtime.subscribe(), table, fetch).await
    }

    /// Like [`LiveFeed::start`], reading events from an existing receiver.
    pub async fn follow<F, Fut>(
        mut events: broadcast::Receiver<ChangeEvent>,
        table: impl Into<String>,
        fetch: F,
    ) -> AppResult<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<T>> + Send,
    {
        let table = table.into();
        let (tx, rows) = watch::channel(fetch().await?);

        let watched = table.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.table == watched => {}
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(table = %watched, skipped, "Live feed lagged; refreshing");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }

                match fetch().await {
                    Ok(fresh) => {
                        if tx.send(fresh).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(table = %watched, error = %e, "Live feed refresh failed"),
                }
            }
        });

        Ok(Self { table, rows, task })
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// A receiver that sees every refresh.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.rows.clone()
    }

    /// Wait for the next refresh. Fails once the refresh task has stopped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rows.changed().await
    }
}

impl<T: Clone> LiveFeed<T> {
    /// The latest rows.
    #[must_use]
    pub fn current(&self) -> T {
        self.rows.borrow().clone()
    }
}

impl<T> LiveFeed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// The current rows, then every refresh, as a stream.
    #[must_use]
    pub fn updates(&self) -> WatchStream<T> {
        WatchStream::new(self.rows.clone())
    }
}

impl<T> Drop for LiveFeed<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn insert(table: &str) -> ChangeEvent {
        ChangeEvent {
            table: table.to_string(),
            kind: "INSERT".to_string(),
            record: json!({}),
        }
    }

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
    ) -> impl Fn() -> std::future::Ready<AppResult<usize>> + Send + Sync + 'static {
        let calls = calls.clone();
        move || std::future::ready(Ok(calls.fetch_add(1, Ordering::SeqCst) + 1))
    }

    #[tokio::test]
    async fn test_refetches_on_insert_for_its_table() {
        let (tx, rx) = broadcast::channel(8);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut feed = LiveFeed::follow(rx, "notifications", counting_fetch(&calls))
            .await
            .unwrap();
        assert_eq!(feed.current(), 1);

        tx.send(insert("notifications")).unwrap();
        feed.changed().await.unwrap();
        assert_eq!(feed.current(), 2);
    }

    #[tokio::test]
    async fn test_ignores_other_tables() {
        let (tx, rx) = broadcast::channel(8);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut feed = LiveFeed::follow(rx, "complaint_messages", counting_fetch(&calls))
            .await
            .unwrap();

        tx.send(insert("notifications")).unwrap();
        tx.send(insert("complaint_messages")).unwrap();
        feed.changed().await.unwrap();

        // Only the matching event caused a second fetch.
        assert_eq!(feed.current(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_updates_stream_starts_with_current_rows() {
        use futures::StreamExt;

        let (tx, rx) = broadcast::channel(8);
        let calls = Arc::new(AtomicUsize::new(0));
        let feed = LiveFeed::follow(rx, "announcements", counting_fetch(&calls))
            .await
            .unwrap();

        let mut updates = feed.updates();
        assert_eq!(updates.next().await, Some(1));

        tx.send(insert("announcements")).unwrap();
        assert_eq!(updates.next().await, Some(2));
    }

    #[tokio::test]
    async fn test_initial_fetch_error_is_returned() {
        let (_tx, rx) = broadcast::channel::<ChangeEvent>(8);
        let result = LiveFeed::<usize>::follow(rx, "polls", || async {
            Err(broto_common::AppError::Backend("down".to_string()))
        })
        .await;
        assert!(result.is_err());
    }
}
