//! Remote sync client abstraction.

use crate::error::{SyncError, SyncOutcome};
use favsync_model::{PullResponse, PushRequest};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// The network side of favorites sync.
///
/// Each call is a single attempt: implementations do not retry, back off
/// or cache. Resilience belongs to the scheduler.
pub trait RemoteSyncClient: Send + Sync {
    /// Uploads a full snapshot. All-or-nothing at the HTTP level.
    fn push(&self, request: &PushRequest) -> SyncOutcome<()>;

    /// Downloads changes for `user_id` since `since` (`None` = never synced).
    fn pull(&self, user_id: &str, since: Option<&str>) -> SyncOutcome<PullResponse>;
}

impl<T: RemoteSyncClient + ?Sized> RemoteSyncClient for Arc<T> {
    fn push(&self, request: &PushRequest) -> SyncOutcome<()> {
        (**self).push(request)
    }

    fn pull(&self, user_id: &str, since: Option<&str>) -> SyncOutcome<PullResponse> {
        (**self).pull(user_id, since)
    }
}

/// A failure a [`MockRemote`] can be scripted to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Connection refused.
    Connection,
    /// Request timed out.
    Timeout,
    /// Non-2xx response with this status.
    Status(u16),
    /// 2xx response without a body.
    EmptyBody,
}

impl MockFailure {
    fn to_error(self) -> SyncError {
        match self {
            MockFailure::Connection => SyncError::connection("connection refused"),
            MockFailure::Timeout => SyncError::timeout("request timed out"),
            MockFailure::Status(code) => SyncError::server(code, "mock failure"),
            MockFailure::EmptyBody => SyncError::EmptyResponse,
        }
    }
}

/// A scripted remote for testing.
///
/// Queued outcomes are consumed first; once a queue is empty the default
/// outcome is returned. Every request is recorded.
#[derive(Debug)]
pub struct MockRemote {
    pull_queue: Mutex<VecDeque<Result<PullResponse, MockFailure>>>,
    pull_default: Mutex<Result<PullResponse, MockFailure>>,
    push_queue: Mutex<VecDeque<Result<(), MockFailure>>>,
    push_default: Mutex<Result<(), MockFailure>>,
    pushes: Mutex<Vec<PushRequest>>,
    pulls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockRemote {
    /// Creates a mock whose pulls return nothing and whose pushes succeed.
    pub fn new() -> Self {
        Self {
            pull_queue: Mutex::new(VecDeque::new()),
            pull_default: Mutex::new(Ok(PullResponse::default())),
            push_queue: Mutex::new(VecDeque::new()),
            push_default: Mutex::new(Ok(())),
            pushes: Mutex::new(Vec::new()),
            pulls: Mutex::new(Vec::new()),
        }
    }

    /// Sets the pull response returned once the queue is drained.
    pub fn set_pull_response(&self, response: PullResponse) {
        *self.pull_default.lock() = Ok(response);
    }

    /// Makes every pull fail once the queue is drained.
    pub fn fail_pulls(&self, failure: MockFailure) {
        *self.pull_default.lock() = Err(failure);
    }

    /// Queues a one-off pull outcome.
    pub fn queue_pull(&self, outcome: Result<PullResponse, MockFailure>) {
        self.pull_queue.lock().push_back(outcome);
    }

    /// Makes every push fail once the queue is drained.
    pub fn fail_pushes(&self, failure: MockFailure) {
        *self.push_default.lock() = Err(failure);
    }

    /// Makes pushes succeed once the queue is drained.
    pub fn succeed_pushes(&self) {
        *self.push_default.lock() = Ok(());
    }

    /// Queues a one-off push outcome.
    pub fn queue_push(&self, outcome: Result<(), MockFailure>) {
        self.push_queue.lock().push_back(outcome);
    }

    /// Returns every push request received so far.
    pub fn pushes(&self) -> Vec<PushRequest> {
        self.pushes.lock().clone()
    }

    /// Returns the `(user_id, since)` of every pull received so far.
    pub fn pulls(&self) -> Vec<(String, Option<String>)> {
        self.pulls.lock().clone()
    }
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSyncClient for MockRemote {
    fn push(&self, request: &PushRequest) -> SyncOutcome<()> {
        self.pushes.lock().push(request.clone());
        let outcome = self
            .push_queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| *self.push_default.lock());
        outcome.map_err(MockFailure::to_error)
    }

    fn pull(&self, user_id: &str, since: Option<&str>) -> SyncOutcome<PullResponse> {
        self.pulls
            .lock()
            .push((user_id.to_string(), since.map(str::to_string)));
        let outcome = self
            .pull_queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.pull_default.lock().clone());
        outcome.map_err(MockFailure::to_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_records_requests() {
        let remote = MockRemote::new();
        remote.push(&PushRequest::new("u1", Vec::new())).unwrap();
        remote.pull("u1", Some("2024-01-01T00:00:00Z")).unwrap();

        assert_eq!(remote.pushes().len(), 1);
        assert_eq!(
            remote.pulls(),
            vec![("u1".to_string(), Some("2024-01-01T00:00:00Z".to_string()))]
        );
    }

    #[test]
    fn mock_queue_before_default() {
        let remote = MockRemote::new();
        remote.queue_pull(Err(MockFailure::Timeout));

        let first = remote.pull("u1", None);
        assert!(matches!(first, Err(SyncError::Connection { timeout: true, .. })));
        assert!(remote.pull("u1", None).is_ok());
    }

    #[test]
    fn mock_status_failure() {
        let remote = MockRemote::new();
        remote.fail_pushes(MockFailure::Status(403));

        let err = remote.push(&PushRequest::new("u1", Vec::new())).unwrap_err();
        assert!(err.is_permission_denied());
    }
}
