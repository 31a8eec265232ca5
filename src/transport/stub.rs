use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::endpoint::Endpoint;
use crate::error::{AppError, Result};

use super::{ResponseBody, Transport};

type Responder = Box<dyn Fn() -> Result<ResponseBody> + Send + Sync>;

/// In-memory transport for exercising clients without network I/O.
///
/// Every call gets a fresh response from the preset responder. The stub remembers the last
/// endpoint it was asked for so URL construction can be asserted.
pub struct StubTransport {
    responder: Responder,
    last_endpoint: Mutex<Option<Endpoint>>,
    calls: AtomicUsize,
}

impl StubTransport {
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn() -> Result<ResponseBody> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            last_endpoint: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_body<B: Into<Vec<u8>>>(body: B) -> Self {
        let body = body.into();
        Self::from_fn(move || Ok(ResponseBody::from_bytes(body.clone())))
    }

    pub fn with_error<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        Self::from_fn(move || Err(AppError::message(message.clone())))
    }

    pub fn last_endpoint(&self) -> Option<Endpoint> {
        self.last_endpoint
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn request(&self, endpoint: &Endpoint) -> Result<ResponseBody> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_endpoint.lock() {
            *guard = Some(endpoint.clone());
        }
        (self.responder)()
    }
}
