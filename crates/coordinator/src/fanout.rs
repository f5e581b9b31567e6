//! Concurrent per-shard dispatch with a single collector.
//!
//! Every call runs on its own task and never shares a lock with its
//! siblings. Results flow back through the `JoinSet`, and only the
//! collecting loop touches the results map.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use strata_core::ShardId;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::request_id::{current_request_id, with_request_id};

/// First failure observed during a fan-out.
#[derive(Debug)]
pub enum FanOutError<E> {
    /// A call returned an error.
    Call { shard_id: ShardId, error: E },
    /// A task panicked or was cancelled.
    Join {
        shard_id: Option<ShardId>,
        message: String,
    },
}

/// Run `call` once per job concurrently and collect results keyed by shard.
///
/// Waits for every call to finish, even after a failure, then returns the
/// first failure in completion order. Calls inherit the caller's span and
/// request id.
pub async fn fan_out<J, T, E, F, Fut>(
    jobs: Vec<(ShardId, J)>,
    call: F,
) -> Result<BTreeMap<ShardId, T>, FanOutError<E>>
where
    J: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(ShardId, J) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let request_id = current_request_id();
    let mut tasks = JoinSet::new();
    let mut shard_of_task = HashMap::with_capacity(jobs.len());

    for (shard_id, job) in jobs {
        let fut = with_request_id(request_id.clone(), call(shard_id, job)).in_current_span();
        let handle = tasks.spawn(async move { (shard_id, fut.await) });
        shard_of_task.insert(handle.id(), shard_id);
    }

    let mut results = BTreeMap::new();
    let mut first_error = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((shard_id, Ok(value))) => {
                results.insert(shard_id, value);
            }
            Ok((shard_id, Err(error))) => {
                first_error.get_or_insert(FanOutError::Call { shard_id, error });
            }
            Err(join_error) => {
                let shard_id = shard_of_task.get(&join_error.id()).copied();
                tracing::error!(shard_id = ?shard_id, error = %join_error, "Shard task failed");
                first_error.get_or_insert(FanOutError::Join {
                    shard_id,
                    message: join_error.to_string(),
                });
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(results),
    }
}
