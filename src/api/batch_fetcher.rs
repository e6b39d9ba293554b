use log::{info, warn};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::osu_client::ApiGateway;
use crate::domain::{Beatmap, BeatmapResponse, FetchProgress};
use crate::errors::GatewayError;

type FetchOutcome = (i64, Result<Option<Value>, GatewayError>);

/// Scatter/gather fetcher for per-id resources.
///
/// The semaphore is the long-lived worker pool: it lives as long as the
/// fetcher, so concurrent batches from different analyses share one bound.
/// A failed or absent id is left out of the result; callers detect missing
/// ids themselves.
pub struct BatchFetcher {
    gateway: Arc<ApiGateway>,
    workers: Arc<Semaphore>,
    chunk_size: usize,
}

impl BatchFetcher {
    pub fn new(gateway: Arc<ApiGateway>, workers: usize, chunk_size: usize) -> Self {
        Self {
            gateway,
            workers: Arc::new(Semaphore::new(workers.max(1))),
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn fetch_all<F>(
        &self,
        label: &str,
        ids: &[i64],
        endpoint_for: F,
        ttl: Duration,
    ) -> HashMap<i64, Value>
    where
        F: Fn(i64) -> String,
    {
        let unique = dedupe(ids);
        let mut progress = FetchProgress::new(label, unique.len());
        let (mut results, misses) = self.partition(&unique, &endpoint_for, ttl);
        progress.add_cached(results.len());

        for chunk in misses.chunks(self.chunk_size) {
            let mut tasks = self.spawn_chunk(chunk, &endpoint_for, ttl);

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((id, Ok(Some(value)))) => {
                        results.insert(id, value);
                        progress.increment_fetched();
                    }
                    Ok((id, Ok(None))) => {
                        progress.increment_missing();
                        warn!("{} {} does not exist", label, id);
                    }
                    Ok((id, Err(e))) => {
                        progress.increment_missing();
                        warn!("Failed to fetch {} {}: {}", label, id, e);
                    }
                    Err(e) => {
                        progress.increment_missing();
                        warn!("{} fetch task failed: {}", label, e);
                    }
                }
            }
        }

        if progress.missing() > 0 {
            info!("{} batch finished with {} missing", label, progress.missing());
        }
        results
    }

    /// Fetch and decode beatmap metadata for every id that resolves.
    pub async fn fetch_beatmaps(&self, ids: &[i64]) -> HashMap<i64, Beatmap> {
        let ttl = self.gateway.beatmap_ttl();
        let raw = self.fetch_all("beatmap", ids, beatmap_endpoint, ttl).await;

        raw.into_iter()
            .filter_map(|(id, value)| match serde_json::from_value::<BeatmapResponse>(value) {
                Ok(beatmap) => Some((id, Beatmap::from(beatmap))),
                Err(e) => {
                    warn!("Discarding malformed beatmap {}: {}", id, e);
                    None
                }
            })
            .collect()
    }

    fn partition<F>(
        &self,
        ids: &[i64],
        endpoint_for: &F,
        ttl: Duration,
    ) -> (HashMap<i64, Value>, Vec<i64>)
    where
        F: Fn(i64) -> String,
    {
        let mut hits = HashMap::new();
        let mut misses = Vec::new();

        for &id in ids {
            match self.gateway.cached(&endpoint_for(id), &[], ttl) {
                Some(value) => {
                    hits.insert(id, value);
                }
                None => misses.push(id),
            }
        }

        (hits, misses)
    }

    fn spawn_chunk<F>(&self, chunk: &[i64], endpoint_for: &F, ttl: Duration) -> JoinSet<FetchOutcome>
    where
        F: Fn(i64) -> String,
    {
        let mut tasks = JoinSet::new();

        for &id in chunk {
            let gateway = Arc::clone(&self.gateway);
            let workers = Arc::clone(&self.workers);
            let endpoint = endpoint_for(id);

            tasks.spawn(async move {
                // The semaphore is never closed, so acquisition only fails on shutdown.
                let Ok(_permit) = workers.acquire_owned().await else {
                    return (id, Err(GatewayError::Transient {
                        attempts: 0,
                        reason: "worker pool closed".to_string(),
                    }));
                };
                (id, gateway.fetch(&endpoint, &[], ttl).await)
            });
        }

        tasks
    }
}

pub fn beatmap_endpoint(id: i64) -> String {
    format!("beatmaps/{}", id)
}

fn dedupe(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
