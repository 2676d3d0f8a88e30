#![forbid(unsafe_code)]

//! Thin client over a pluggable execution backend.
//!
//! The crate only generates text; the [`Backend`] trait is the seam where a
//! transport (gRPC, HTTP, an in-memory fake) runs it. [`Client`] wires the
//! upsert planner to a backend and writes assigned uids back into entities.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DqlError, Result};
use crate::mutation::{parse_mutation, set_uids, Entity, Mutation, UpsertCase};
use crate::query::QueryNode;

pub mod config;

pub use config::{ClientConfig, ConfigError};

/// One request sent to a backend.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Query text run before the mutations, may be empty.
    pub query: String,
    /// Mutations guarded by the query.
    pub mutations: Vec<Mutation>,
    /// Commit in the same round trip.
    pub commit_now: bool,
}

/// Backend reply to a [`Request`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Uids assigned to blank nodes, keyed by blank-node name without `_:`.
    pub uids: HashMap<String, String>,
}

/// Executes generated text against a database.
pub trait Backend {
    /// Runs a query plus mutations.
    fn run(&self, request: &Request) -> Result<Response>;

    /// Runs a read-only query and returns the raw JSON reply.
    fn query(&self, text: &str) -> Result<Vec<u8>>;
}

/// Options for [`Client::mutate`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MutateOptions {
    /// Serialize nested entities too.
    pub deep: bool,
}

impl MutateOptions {
    /// Options with nested serialization turned on.
    pub fn deep() -> Self {
        Self { deep: true }
    }
}

/// Client bound to one backend.
#[derive(Debug)]
pub struct Client<B> {
    config: ClientConfig,
    backend: B,
}

impl<B: Backend> Client<B> {
    /// Validates `config` and wraps `backend`.
    pub fn new(config: ClientConfig, backend: B) -> Result<Self> {
        config.validate()?;
        info!(dns = %config.dns, namespace = config.namespace, "client ready");
        Ok(Self { config, backend })
    }

    /// Settings the client was created with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Upserts `entity` and writes the assigned uids back into it.
    ///
    /// For inserts a missing root key in the reply means the duplicate guard
    /// stopped the mutation, reported as
    /// [`DqlError::DuplicateConditionFailed`]. Updates assign no new uids, so
    /// the reply is not checked.
    pub fn mutate(&self, entity: &mut dyn Entity, options: MutateOptions) -> Result<()> {
        let plan = parse_mutation(entity, options.deep)?;
        let request = Request {
            query: plan.query,
            mutations: plan.mutations,
            commit_now: true,
        };
        let response = self.backend.run(&request)?;

        if plan.case != UpsertCase::ConditionalUpdate
            && !response.uids.contains_key(&plan.blank_node)
        {
            return Err(DqlError::DuplicateConditionFailed {
                blank_node: plan.blank_node,
            });
        }
        set_uids(entity, &response.uids)?;
        debug!(
            type_name = entity.dgraph_type(),
            case = ?plan.case,
            assigned = response.uids.len(),
            "mutation applied"
        );
        Ok(())
    }

    /// Runs `node` as a single-block query and decodes the first row of its
    /// block.
    pub fn first<T: DeserializeOwned>(&self, node: &QueryNode) -> Result<T> {
        let reply = self.backend.query(&node.query())?;
        first_row(&reply, node.key())
    }
}

/// Decodes the first element of the array stored under `block` in a JSON
/// reply. Other top-level keys are not inspected.
pub fn first_row<T: DeserializeOwned>(reply: &[u8], block: &str) -> Result<T> {
    let mut blocks: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(reply)?;
    let row = match blocks.remove(block) {
        Some(serde_json::Value::Array(rows)) => rows.into_iter().next(),
        Some(serde_json::Value::Null) | None => None,
        Some(_) => {
            return Err(DqlError::Shape {
                op: "first_row",
                expected: "an array of rows under the block key",
            })
        }
    };
    let row = row.ok_or_else(|| DqlError::EmptyResult {
            block: block.to_owned(),
        })?;
    Ok(serde_json::from_value(row)?)
}
