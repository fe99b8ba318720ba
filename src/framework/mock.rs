//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver, then answer the
//! requests by hand with [`expect_create`], [`expect_get`], [`expect_action`] or
//! [`expect_query`]. [`MockClient`] offers the same with a queued expectation API.

use crate::framework::{ActorEntity, FrameworkError, ResourceClient, ResourceRequest, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected request and the canned answer for it.
enum Expectation<T: ActorEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T, FrameworkError>,
    },
    Update {
        id: T::Id,
        response: Result<T, FrameworkError>,
    },
    Delete {
        id: T::Id,
        response: Result<(), FrameworkError>,
    },
    Action {
        id: T::Id,
        response: Result<T::ActionResult, FrameworkError>,
    },
    Query {
        response: Result<T::QueryResult, FrameworkError>,
    },
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A mock client with expectation tracking for fluent testing.
///
/// Requests are matched against expectations in FIFO order. A request that does
/// not match the next expectation (wrong kind or wrong id) is recorded as a
/// mismatch and its response channel is dropped, so the caller sees
/// [`FrameworkError::ActorDropped`] and [`MockClient::verify`] panics.
///
/// # Example
/// ```ignore
/// let mut mock = MockClient::<MenuItem>::new();
/// mock.expect_get(burger.id).return_ok(Some(burger.clone()));
///
/// let client = mock.client();
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Queue<T>,
    mismatches: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let mismatches = Arc::new(Mutex::new(Vec::new()));
        let queue = expectations.clone();
        let misses = mismatches.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&queue).pop_front();
                if let Some(miss) = answer(request, expectation) {
                    lock(&misses).push(miss);
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            mismatches,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        self.builder(move |response| Expectation::Get { id, response })
    }

    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T> {
        self.builder(|response| Expectation::Create { response })
    }

    pub fn expect_update(&mut self, id: T::Id) -> ExpectationBuilder<T, T> {
        self.builder(move |response| Expectation::Update { id, response })
    }

    pub fn expect_delete(&mut self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(move |response| Expectation::Delete { id, response })
    }

    pub fn expect_action(&mut self, id: T::Id) -> ExpectationBuilder<T, T::ActionResult> {
        self.builder(move |response| Expectation::Action { id, response })
    }

    pub fn expect_query(&mut self) -> ExpectationBuilder<T, T::QueryResult> {
        self.builder(|response| Expectation::Query { response })
    }

    fn builder<R>(
        &self,
        make: impl FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send + 'static,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            make: Box::new(make),
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met and nothing unexpected arrived.
    pub fn verify(&self) {
        let misses = lock(&self.mismatches);
        if !misses.is_empty() {
            panic!("Unexpected requests: {:?}", *misses);
        }
        let exps = lock(&self.expectations);
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Answers `request` from `expectation`, or describes the mismatch.
fn answer<T: ActorEntity>(
    request: ResourceRequest<T>,
    expectation: Option<Expectation<T>>,
) -> Option<String> {
    match (request, expectation) {
        (ResourceRequest::Get { id, respond_to }, Some(Expectation::Get { id: want, response }))
            if id == want =>
        {
            let _ = respond_to.send(response);
            None
        }
        (ResourceRequest::Create { respond_to, .. }, Some(Expectation::Create { response })) => {
            let _ = respond_to.send(response);
            None
        }
        (
            ResourceRequest::Update { id, respond_to, .. },
            Some(Expectation::Update { id: want, response }),
        ) if id == want => {
            let _ = respond_to.send(response);
            None
        }
        (
            ResourceRequest::Delete { id, respond_to },
            Some(Expectation::Delete { id: want, response }),
        ) if id == want => {
            let _ = respond_to.send(response);
            None
        }
        (
            ResourceRequest::Action { id, respond_to, .. },
            Some(Expectation::Action { id: want, response }),
        ) if id == want => {
            let _ = respond_to.send(response);
            None
        }
        (ResourceRequest::Query { respond_to, .. }, Some(Expectation::Query { response })) => {
            let _ = respond_to.send(response);
            None
        }
        (request, _) => Some(format!("{request:?}")),
    }
}

/// Builder that queues one expectation with its canned response.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    make: Box<dyn FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send>,
    expectations: Queue<T>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        lock(&self.expectations).push_back((self.make)(Ok(value)));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        lock(&self.expectations).push_back((self.make)(Err(error)));
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// Creates a mock client and a receiver for asserting requests.
///
/// The test plays the actor: it pulls requests off `receiver`, checks them and
/// answers on the enclosed oneshot sender. This simulates success, failure or
/// delay deterministically.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Create, Response<T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Query request
pub async fn expect_query<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Query, Response<T::QueryResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Query { query, respond_to }) => Some((query, respond_to)),
        _ => None,
    }
}
