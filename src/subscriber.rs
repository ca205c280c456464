//! Event subscribers.

use std::{borrow::Cow, future::Future, sync::Arc};

use crate::Event;

/// Subscriber can be registered to a feed and process events.
#[async_trait::async_trait]
pub trait Subscriber: Send + Sync {
    /// subscriber name
    fn name(&self) -> Cow<'static, str>;
    /// callback will be executed for every event passing the feed filter
    async fn on_event(self: Arc<Self>, event: Arc<Event>);
}

#[async_trait::async_trait]
impl<F, Fut> Subscriber for F
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    fn name(&self) -> Cow<'static, str> {
        "Anonymous Fn Subscriber".into()
    }

    async fn on_event(self: Arc<Self>, event: Arc<Event>) {
        self(event).await
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn test_closure_subscriber() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let subscriber = {
            let seen = seen.clone();
            Arc::new(move |event: Arc<Event>| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(event.type_name());
                }
            })
        };

        assert_eq!(subscriber.name(), "Anonymous Fn Subscriber");

        subscriber.clone().on_event(Arc::new(Event::Connect)).await;
        subscriber.on_event(Arc::new(Event::Disconnect)).await;

        assert_eq!(*seen.lock().unwrap(), ["connect", "disconnect"]);
    }
}
