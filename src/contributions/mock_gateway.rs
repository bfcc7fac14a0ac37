//! Mock gateways serving canned pages by request path.

use std::collections::HashMap;

use serde_json::Value;

use crate::github::error::ForgeError;
use crate::github::gateway::MockForgeGateway;
use crate::github::pagination::{PageRequest, RawPage};

/// Page-1 records (or a failure) keyed by API path.
pub(crate) type Responses = HashMap<String, Result<Vec<Value>, ForgeError>>;

pub(crate) fn serve(path: &str, records: Vec<Value>) -> Responses {
    HashMap::from([(path.to_owned(), Ok(records))])
}

pub(crate) fn fail(path: &str, error: ForgeError) -> Responses {
    HashMap::from([(path.to_owned(), Err(error))])
}

/// Serves page 1 of each path from `responses`; unknown paths are empty.
pub(crate) fn gateway_serving(responses: Responses) -> MockForgeGateway {
    let mut gateway = MockForgeGateway::new();
    gateway
        .expect_get_page()
        .returning(move |request: &PageRequest| {
            if request.page > 1 {
                return Ok(RawPage::default());
            }
            match responses.get(&request.path) {
                Some(Ok(records)) => Ok(RawPage {
                    records: records.clone(),
                    rate_limit: None,
                }),
                Some(Err(error)) => Err(error.clone()),
                None => Ok(RawPage::default()),
            }
        });
    gateway
}
