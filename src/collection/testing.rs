//! Fake transports for collection tests.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::transport::{Transport, Variables};
use crate::error::{Error, Result};

/// Replays canned responses in order and records the variables of each call.
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value>>>,
    calls: Mutex<Vec<Variables>>,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<Result<Value>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Variables> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, _query: &str, variables: &Variables) -> Result<Value> {
        self.calls.lock().unwrap().push(variables.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::MalformedResponse("script exhausted".to_string())))
    }
}

/// Answers each call with a closure over the query text and variables.
pub(crate) struct FnTransport<F> {
    handler: F,
}

impl<F> FnTransport<F>
where
    F: Fn(&str, &Variables) -> Result<Value> + Send + Sync + 'static,
{
    pub(crate) fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&str, &Variables) -> Result<Value> + Send + Sync + 'static,
{
    fn execute(&self, query: &str, variables: &Variables) -> Result<Value> {
        (self.handler)(query, variables)
    }
}
