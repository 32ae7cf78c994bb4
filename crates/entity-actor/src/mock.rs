//! # Mock Framework & Testing Guide
//!
//! `MockClient<T>` hands out a real [`ResourceClient<T>`] whose requests are answered from a
//! queue of expectations instead of a running actor. Use it to test code that *uses* a client
//! (orchestration, domain clients) without spawning the entity it talks to.
//!
//! | Feature | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **State** | None (scripted answers) | Real entity state |
//! | **Determinism** | Fully scripted | Subject to scheduler |
//! | **Error Injection** | `return_err(...)` | Requires reaching the failing state |
//!
//! ## Patterns
//!
//! - **Pattern 0, client logic**: domain client over a `MockClient`.
//! - **Pattern 1, single actor**: spawn one `ResourceActor` and drive it directly.
//! - **Pattern 2, actor + mocks**: real actor, mocked dependencies in its context.
//! - **Pattern 3, full system**: everything real, see the crate's `tests/` directory.
//!
//! ```rust,ignore
//! let mut ledger = MockClient::<VendorAccount>::new();
//! ledger.expect_get(VendorId::from("vendor_1")).return_ok(None);
//! let client = LedgerClient::new(ledger.client());
//! assert_eq!(client.balance(&VendorId::from("vendor_1")).await?.available, Decimal::ZERO);
//! ledger.verify();
//! ```
//!
//! For step-by-step control use [`create_mock_client`] and inspect each request with
//! [`expect_create`], [`expect_get`] or [`expect_action`], answering through the returned
//! responder.

use crate::{ActorEntity, FrameworkError, ResourceClient, ResourceRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected request and the scripted answer.
enum Expectation<T: ActorEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T::Id, FrameworkError>,
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
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock client with expectation tracking.
///
/// Requests are matched against expectations in FIFO order. A request of the wrong kind, for the
/// wrong id, or with no expectation left is answered with `FrameworkError::ActorClosed` and
/// recorded; [`MockClient::verify`] then panics with the recorded problems.
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Queue<T>,
    failures: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let failures = Arc::new(Mutex::new(Vec::new()));
        let exps = expectations.clone();
        let fails = failures.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = exps.lock().unwrap().pop_front();
                let outcome = answer(request, expectation);
                if let Err((problem, request)) = outcome {
                    fails.lock().unwrap().push(problem);
                    request.reject(FrameworkError::ActorClosed);
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            failures,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects a `get` for `id`.
    pub fn expect_get(&mut self, id: T::Id) -> GetExpectationBuilder<T> {
        GetExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `create`.
    pub fn expect_create(&mut self) -> CreateExpectationBuilder<T> {
        CreateExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Expects an `update` for `id`.
    pub fn expect_update(&mut self, id: T::Id) -> UpdateExpectationBuilder<T> {
        UpdateExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `delete` for `id`.
    pub fn expect_delete(&mut self, id: T::Id) -> DeleteExpectationBuilder<T> {
        DeleteExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects an action on `id`.
    pub fn expect_action(&mut self, id: T::Id) -> ActionExpectationBuilder<T> {
        ActionExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Panics unless every expectation was consumed and no request was unexpected.
    pub fn verify(&self) {
        let failures = self.failures.lock().unwrap();
        if !failures.is_empty() {
            panic!("Unexpected requests: {:?}", *failures);
        }
        let exps = self.expectations.lock().unwrap();
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

type Unanswered<T> = (String, ResourceRequest<T>);

fn answer<T: ActorEntity>(
    request: ResourceRequest<T>,
    expectation: Option<Expectation<T>>,
) -> Result<(), Unanswered<T>> {
    match (request, expectation) {
        (ResourceRequest::Get { id, respond_to }, Some(Expectation::Get { id: want, response }))
            if id == want =>
        {
            let _ = respond_to.send(response);
        }
        (ResourceRequest::Create { respond_to, .. }, Some(Expectation::Create { response })) => {
            let _ = respond_to.send(response);
        }
        (
            ResourceRequest::Update { id, respond_to, .. },
            Some(Expectation::Update { id: want, response }),
        ) if id == want => {
            let _ = respond_to.send(response);
        }
        (
            ResourceRequest::Delete { id, respond_to },
            Some(Expectation::Delete { id: want, response }),
        ) if id == want => {
            let _ = respond_to.send(response);
        }
        (
            ResourceRequest::Action { id, respond_to, .. },
            Some(Expectation::Action { id: want, response }),
        ) if id == want => {
            let _ = respond_to.send(response);
        }
        (request, None) => {
            return Err((format!("no expectation left for {}", request.id()), request));
        }
        (request, Some(_)) => {
            return Err((format!("request for {} did not match", request.id()), request));
        }
    }
    Ok(())
}

macro_rules! builder {
    ($name:ident, $variant:ident, $ok:ty, id) => {
        pub struct $name<T: ActorEntity> {
            id: T::Id,
            expectations: Queue<T>,
        }

        impl<T: ActorEntity> $name<T> {
            /// Answer with a successful result.
            pub fn return_ok(self, value: $ok) {
                self.push(Ok(value));
            }

            /// Answer with an error.
            pub fn return_err(self, error: FrameworkError) {
                self.push(Err(error));
            }

            fn push(self, response: Result<$ok, FrameworkError>) {
                self.expectations
                    .lock()
                    .unwrap()
                    .push_back(Expectation::$variant {
                        id: self.id,
                        response,
                    });
            }
        }
    };
}

builder!(GetExpectationBuilder, Get, Option<T>, id);
builder!(UpdateExpectationBuilder, Update, T, id);
builder!(DeleteExpectationBuilder, Delete, (), id);
builder!(ActionExpectationBuilder, Action, T::ActionResult, id);

/// Builder for `create` expectations.
pub struct CreateExpectationBuilder<T: ActorEntity> {
    expectations: Queue<T>,
}

impl<T: ActorEntity> CreateExpectationBuilder<T> {
    /// Answer with the created id.
    pub fn return_ok(self, id: T::Id) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::Create { response: Ok(id) });
    }

    /// Answer with an error.
    pub fn return_err(self, error: FrameworkError) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::Create {
                response: Err(error),
            });
    }
}

// =============================================================================
// STEP-BY-STEP HELPERS
// =============================================================================

/// Creates a client whose requests arrive on the returned receiver.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Next message must be a Create request.
pub async fn expect_create<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Create, oneshot::Sender<Result<T::Id, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create {
            id,
            params,
            respond_to,
        }) => Some((id, params, respond_to)),
        _ => None,
    }
}

/// Next message must be a Get request.
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Next message must be an Action request.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Id,
    T::Action,
    oneshot::Sender<Result<T::ActionResult, FrameworkError>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}
