//! Channel-state-aware status polling

use super::status::Status;
use crate::service::StreamService;
use std::sync::Arc;

/// Wraps the stream service with channel-state awareness
pub struct Poller {
    service: Arc<dyn StreamService>,
}

impl Poller {
    pub fn new(service: Arc<dyn StreamService>) -> Self {
        Self { service }
    }

    /// Poll the live status of one channel.
    ///
    /// An in-flight inference job must not be preempted by a stale offline
    /// read, so `inference` is returned unchanged without querying the
    /// service. A lookup failure maps to `error`; because only `inference`
    /// short-circuits, the next poll queries the service again.
    pub async fn poll(&self, channel: &str, current: Status) -> Status {
        if current == Status::Inference {
            tracing::debug!(channel, "channel is inferencing; skipping presence check");
            return Status::Inference;
        }

        match self.service.presence(channel).await {
            Ok(true) => Status::Online,
            Ok(false) => Status::Offline,
            Err(e) => {
                tracing::error!(channel, "error checking channel status: {e}");
                Status::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;
    use async_trait::async_trait;

    struct FixedService {
        presence: Result<bool, ()>,
    }

    #[async_trait]
    impl StreamService for FixedService {
        async fn presence(&self, channel: &str) -> Result<bool, ServiceError> {
            self.presence
                .map_err(|_| ServiceError::Lookup(format!("unreachable for {channel}")))
        }

        async fn resolve(
            &self,
            _channel: &str,
            _quality: &str,
        ) -> Result<Option<String>, ServiceError> {
            Ok(None)
        }
    }

    struct PanickingService;

    #[async_trait]
    impl StreamService for PanickingService {
        async fn presence(&self, _channel: &str) -> Result<bool, ServiceError> {
            panic!("presence must not be queried for an inferencing channel");
        }

        async fn resolve(
            &self,
            _channel: &str,
            _quality: &str,
        ) -> Result<Option<String>, ServiceError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn maps_presence_to_status() {
        let poller = Poller::new(Arc::new(FixedService { presence: Ok(true) }));
        assert_eq!(poller.poll("alice", Status::Offline).await, Status::Online);

        let poller = Poller::new(Arc::new(FixedService { presence: Ok(false) }));
        assert_eq!(poller.poll("alice", Status::Online).await, Status::Offline);
    }

    #[tokio::test]
    async fn lookup_failure_is_transient_error() {
        let poller = Poller::new(Arc::new(FixedService { presence: Err(()) }));
        assert_eq!(poller.poll("alice", Status::Offline).await, Status::Error);
        // A channel in the error state is polled again, not stuck.
        assert_eq!(poller.poll("alice", Status::Error).await, Status::Error);
    }

    #[tokio::test]
    async fn inference_short_circuits_the_service() {
        let poller = Poller::new(Arc::new(PanickingService));
        assert_eq!(
            poller.poll("alice", Status::Inference).await,
            Status::Inference
        );
    }
}
