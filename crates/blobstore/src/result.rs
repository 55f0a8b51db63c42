//! The uniform outcome envelope returned by every store operation.

use serde::Serialize;

use crate::error::{ErrorKind, StoreError};

/// Success flag, human-readable messages, structured errors and an
/// optional payload.
///
/// `success` is true exactly when `errors` is empty. Fields are private so
/// that invariant can't be broken from outside: results are built with
/// [`ok`](Self::ok), [`failure`](Self::failure) or
/// [`from_outcome`](Self::from_outcome), and [`push_error`](Self::push_error)
/// clears the flag.
#[derive(Debug, Serialize)]
pub struct OperationResult<T> {
    success: bool,
    messages: Vec<String>,
    errors: Vec<StoreError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<T>,
}

impl<T> OperationResult<T> {
    pub fn ok(payload: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
            errors: Vec::new(),
            payload: Some(payload),
        }
    }

    pub fn failure(error: StoreError) -> Self {
        Self {
            success: false,
            messages: Vec::new(),
            errors: vec![error],
            payload: None,
        }
    }

    /// Wrap the outcome of an internal, `?`-style operation.
    pub fn from_outcome(
        outcome: Result<T, StoreError>,
        message: impl FnOnce(&T) -> String,
    ) -> Self {
        match outcome {
            Ok(payload) => {
                let message = message(&payload);
                Self::ok(payload, message)
            }
            Err(error) => Self::failure(error),
        }
    }

    /// Attach a payload without touching the success flag.
    ///
    /// `exists` uses this to report `false` alongside its not-found error.
    pub fn with_payload(mut self, payload: T) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn push_error(&mut self, error: StoreError) {
        self.errors.push(error);
        self.success = false;
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn errors(&self) -> &[StoreError] {
        &self.errors
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }

    pub fn has_error(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    pub fn is_cancelled(&self) -> bool {
        self.has_error(ErrorKind::Cancelled)
    }

    pub fn is_not_found(&self) -> bool {
        self.has_error(ErrorKind::NotFound)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        OperationResult {
            success: self.success,
            messages: self.messages,
            errors: self.errors,
            payload: self.payload.map(f),
        }
    }

    /// Collapse into a `Result`, yielding the first error on failure.
    pub fn into_result(self) -> Result<T, StoreError> {
        match (self.errors.into_iter().next(), self.payload) {
            (Some(error), _) => Err(error),
            (None, Some(payload)) => Ok(payload),
            (None, None) => Err(StoreError::InvalidInput(
                "result carries neither a payload nor an error".to_string(),
            )),
        }
    }
}
