//! Eager precomputation during user think time.
//!
//! A task's expensive inputs (embeddings, baselines, null samples) are
//! computed in the background the moment the task is created, so they are
//! ready by the time the user submits. Subtasks fan out concurrently; each
//! one writes only its own snapshot fields and a failure in one never fails
//! the task. Retrieval is bounded-wait: a timeout returns whatever is
//! present, and the background work keeps running for later callers.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::cache::{EmbeddingCache, VocabularyPool};
use crate::config::Config;
use crate::constants::{
    DEFAULT_PRECOMPUTE_CAPACITY, DEFAULT_PRECOMPUTE_TTL_SECS, DEFAULT_PRECOMPUTE_WAIT_SECS,
    PRECOMPUTE_MIN_VOCABULARY, PRECOMPUTE_NULL_CLUES, PRECOMPUTE_NULL_SAMPLES,
    PRECOMPUTE_VOCABULARY_DRAW,
};
use crate::lexical::LexicalUnionFinder;
use crate::precompute::types::{
    PrecomputeMode, PrecomputeSnapshot, PrecomputeStatus, SchedulerStats,
};
use crate::provider::{EmbeddingVector, GenerativeProvider, TaskStore};
use crate::scoring::cosine_similarity;

/// Words requested for each precomputed baseline.
const BASELINE_CLUES: usize = 5;

type Subtask = Pin<Box<dyn Future<Output = ()> + Send>>;

struct TaskSlot {
    snapshot: PrecomputeSnapshot,
    started: Instant,
    completed: Option<Instant>,
    status_rx: watch::Receiver<PrecomputeStatus>,
    handle: Option<JoinHandle<()>>,
}

struct SchedulerInner {
    tasks: Mutex<HashMap<String, TaskSlot>>,
    embeddings: Arc<EmbeddingCache>,
    pool: Arc<VocabularyPool>,
    union: Arc<LexicalUnionFinder>,
    generative: Arc<dyn GenerativeProvider>,
    ttl: Duration,
    capacity: usize,
    default_wait: Duration,
}

impl SchedulerInner {
    fn update(&self, task_id: &str, apply: impl FnOnce(&mut PrecomputeSnapshot)) {
        let mut tasks = self.tasks.lock();
        if let Some(slot) = tasks.get_mut(task_id) {
            apply(&mut slot.snapshot);
        }
    }
}

/// Tracks background precompute runs and their snapshots.
///
/// Cheap to clone; all clones share the same task map.
#[derive(Clone)]
pub struct PrecomputeScheduler {
    inner: Arc<SchedulerInner>,
}

impl PrecomputeScheduler {
    /// Creates a scheduler with default retention limits.
    pub fn new(
        embeddings: Arc<EmbeddingCache>,
        pool: Arc<VocabularyPool>,
        union: Arc<LexicalUnionFinder>,
        generative: Arc<dyn GenerativeProvider>,
    ) -> Self {
        Self::with_limits(
            embeddings,
            pool,
            union,
            generative,
            Duration::from_secs(DEFAULT_PRECOMPUTE_TTL_SECS),
            DEFAULT_PRECOMPUTE_CAPACITY,
            Duration::from_secs(DEFAULT_PRECOMPUTE_WAIT_SECS),
        )
    }

    /// Creates a scheduler with retention limits from config.
    pub fn from_config(
        embeddings: Arc<EmbeddingCache>,
        pool: Arc<VocabularyPool>,
        union: Arc<LexicalUnionFinder>,
        generative: Arc<dyn GenerativeProvider>,
        config: &Config,
    ) -> Self {
        Self::with_limits(
            embeddings,
            pool,
            union,
            generative,
            config.precompute_ttl,
            config.precompute_capacity,
            config.precompute_wait,
        )
    }

    /// Creates a scheduler with explicit retention limits.
    pub fn with_limits(
        embeddings: Arc<EmbeddingCache>,
        pool: Arc<VocabularyPool>,
        union: Arc<LexicalUnionFinder>,
        generative: Arc<dyn GenerativeProvider>,
        ttl: Duration,
        capacity: usize,
        default_wait: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                tasks: Mutex::new(HashMap::new()),
                embeddings,
                pool,
                union,
                generative,
                ttl,
                capacity,
                default_wait,
            }),
        }
    }

    /// Starts background precomputation for a task.
    ///
    /// Returns immediately; the subtasks run on their own. When a
    /// `task_store` is supplied, the completed baselines are persisted onto
    /// the task record. Restarting an already tracked task id replaces its
    /// record and aborts the old run.
    #[instrument(skip(self, task_store), fields(task_id = %task_id, anchor = %anchor))]
    pub fn start(
        &self,
        task_id: &str,
        anchor: &str,
        target: Option<&str>,
        mode: PrecomputeMode,
        task_store: Option<Arc<dyn TaskStore>>,
    ) {
        let (status_tx, status_rx) = watch::channel(PrecomputeStatus::InProgress);

        let snapshot = PrecomputeSnapshot {
            status: PrecomputeStatus::InProgress,
            started_at: Some(Utc::now()),
            ..PrecomputeSnapshot::default()
        };

        {
            let mut tasks = self.inner.tasks.lock();
            if let Some(previous) = tasks.insert(
                task_id.to_string(),
                TaskSlot {
                    snapshot,
                    started: Instant::now(),
                    completed: None,
                    status_rx,
                    handle: None,
                },
            ) {
                if let Some(handle) = previous.handle {
                    handle.abort();
                }
            }
            collect_garbage(&mut tasks, self.inner.ttl, self.inner.capacity);
        }

        let inner = self.inner.clone();
        let id = task_id.to_string();
        let anchor = anchor.to_string();
        let target = target.map(str::to_string);
        // The clone keeps the watch channel open through the failure path;
        // the sender inside run_task is dropped mid-unwind on a panic.
        let fault_tx = status_tx.clone();
        let handle = tokio::spawn(async move {
            let run = AssertUnwindSafe(run_task(
                inner.clone(),
                id.clone(),
                anchor,
                target,
                mode,
                task_store,
                status_tx,
            ))
            .catch_unwind();
            if let Err(panic) = run.await {
                mark_failed(&inner, &id, &panic_message(panic), &fault_tx);
            }
        });

        let mut tasks = self.inner.tasks.lock();
        match tasks.get_mut(task_id) {
            Some(slot) => slot.handle = Some(handle),
            // Evicted between insert and spawn (reset raced us).
            None => handle.abort(),
        }
    }

    /// Returns the current snapshot for a task, waiting up to `timeout` for
    /// it to reach a terminal status.
    ///
    /// `None` means the task was never started (or already evicted). A
    /// timeout never cancels the background run; the returned snapshot may
    /// still be in progress with some fields missing.
    pub async fn results(
        &self,
        task_id: &str,
        timeout: Option<Duration>,
    ) -> Option<PrecomputeSnapshot> {
        let mut status_rx = {
            let tasks = self.inner.tasks.lock();
            let slot = tasks.get(task_id)?;
            if slot.snapshot.status.is_terminal() {
                return Some(slot.snapshot.clone());
            }
            slot.status_rx.clone()
        };

        let wait = timeout.unwrap_or(self.inner.default_wait);
        if tokio::time::timeout(wait, status_rx.wait_for(|status| status.is_terminal()))
            .await
            .is_err()
        {
            debug!(task_id, "timed out waiting for precompute, returning partial");
        }

        let tasks = self.inner.tasks.lock();
        tasks.get(task_id).map(|slot| slot.snapshot.clone())
    }

    /// Status of a tracked task, if any.
    pub fn status(&self, task_id: &str) -> Option<PrecomputeStatus> {
        let tasks = self.inner.tasks.lock();
        tasks.get(task_id).map(|slot| slot.snapshot.status)
    }

    /// Counts of tracked tasks by status.
    pub fn stats(&self) -> SchedulerStats {
        let tasks = self.inner.tasks.lock();
        let mut stats = SchedulerStats {
            total_tracked: tasks.len(),
            ..SchedulerStats::default()
        };
        for slot in tasks.values() {
            match slot.snapshot.status {
                PrecomputeStatus::Pending => stats.pending += 1,
                PrecomputeStatus::InProgress => stats.in_progress += 1,
                PrecomputeStatus::Completed => stats.completed += 1,
                PrecomputeStatus::Failed => stats.failed += 1,
            }
            if slot
                .handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
            {
                stats.active_tasks += 1;
            }
        }
        stats
    }

    /// Drops every tracked task and aborts outstanding background runs.
    pub fn reset(&self) {
        let mut tasks = self.inner.tasks.lock();
        for (_, slot) in tasks.drain() {
            if let Some(handle) = slot.handle {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for PrecomputeScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("PrecomputeScheduler")
            .field("total_tracked", &stats.total_tracked)
            .field("active_tasks", &stats.active_tasks)
            .finish()
    }
}

async fn run_task(
    inner: Arc<SchedulerInner>,
    task_id: String,
    anchor: String,
    target: Option<String>,
    mode: PrecomputeMode,
    task_store: Option<Arc<dyn TaskStore>>,
    status_tx: watch::Sender<PrecomputeStatus>,
) {
    let started = Instant::now();
    // Null sampling needs only the anchor/target vectors, not the whole
    // batch; this channel sequences it behind the embedding subtask alone.
    let (prompt_tx, prompt_rx) = oneshot::channel::<(EmbeddingVector, Option<EmbeddingVector>)>();

    let mut subtasks: Vec<Subtask> = Vec::new();

    {
        let inner = inner.clone();
        let task_id = task_id.clone();
        let anchor = anchor.clone();
        let target = target.clone();
        subtasks.push(Box::pin(async move {
            let mut texts = vec![anchor];
            if let Some(word) = &target {
                texts.push(word.clone());
            }
            match inner.embeddings.get_batch(&texts).await {
                Ok(mut vectors) => {
                    let anchor_vector = vectors.remove(0);
                    let target_vector = vectors.pop();
                    inner.update(&task_id, |snapshot| {
                        snapshot.anchor_embedding = Some(anchor_vector.clone());
                        snapshot.target_embedding = target_vector.clone();
                    });
                    let _ = prompt_tx.send((anchor_vector, target_vector));
                }
                Err(err) => {
                    warn!(task_id = %task_id, error = %err, "prompt embedding subtask failed");
                }
            }
        }));
    }

    if mode.wants_generative_baseline() {
        if let Some(target_word) = target.clone() {
            let inner = inner.clone();
            let task_id = task_id.clone();
            let anchor = anchor.clone();
            subtasks.push(Box::pin(async move {
                let clues = match inner
                    .generative
                    .build_bridge(&anchor, &target_word, BASELINE_CLUES)
                    .await
                {
                    Ok(clues) => clues,
                    Err(err) => {
                        warn!(task_id = %task_id, error = %err, "generative baseline subtask failed");
                        return;
                    }
                };
                let embeddings = match inner.embeddings.get_batch(&clues).await {
                    Ok(embeddings) => Some(embeddings),
                    Err(err) => {
                        warn!(task_id = %task_id, error = %err, "baseline embedding failed");
                        None
                    }
                };
                inner.update(&task_id, |snapshot| {
                    snapshot.generated_clues = Some(clues);
                    snapshot.generated_embeddings = embeddings;
                });
            }));
        }
    }

    if let Some(target_word) = target.clone() {
        let inner = inner.clone();
        let task_id = task_id.clone();
        let anchor = anchor.clone();
        subtasks.push(Box::pin(async move {
            let words = match inner
                .union
                .find_jointly_relevant(&anchor, &target_word, BASELINE_CLUES)
                .await
            {
                Ok(words) => words,
                Err(err) => {
                    warn!(task_id = %task_id, error = %err, "lexical union subtask failed");
                    return;
                }
            };
            let embeddings = match inner.embeddings.get_batch(&words).await {
                Ok(embeddings) => Some(embeddings),
                Err(err) => {
                    warn!(task_id = %task_id, error = %err, "lexical embedding failed");
                    None
                }
            };
            inner.update(&task_id, |snapshot| {
                snapshot.lexical_bridge = Some(words);
                snapshot.lexical_embeddings = embeddings;
            });
        }));
    }

    {
        let inner = inner.clone();
        let task_id = task_id.clone();
        subtasks.push(Box::pin(async move {
            let (anchor_vector, target_vector) = match prompt_rx.await {
                Ok(vectors) => vectors,
                Err(_) => {
                    warn!(task_id = %task_id, "null sampling skipped, prompt embedding unavailable");
                    return;
                }
            };

            let draws = inner.pool.get_random_with_embeddings(PRECOMPUTE_VOCABULARY_DRAW);
            if draws.len() < PRECOMPUTE_MIN_VOCABULARY {
                warn!(
                    task_id = %task_id,
                    available = draws.len(),
                    "null sampling skipped, vocabulary too small"
                );
                return;
            }

            let samples = draw_null_samples(&draws, &anchor_vector, target_vector.as_deref());
            inner.update(&task_id, |snapshot| {
                snapshot.null_relevance_samples = Some(samples);
            });
        }));
    }

    join_all(subtasks).await;

    let persisted_fields = {
        let mut tasks = inner.tasks.lock();
        match tasks.get_mut(&task_id) {
            Some(slot) => {
                slot.snapshot.status = PrecomputeStatus::Completed;
                slot.snapshot.completed_at = Some(Utc::now());
                slot.completed = Some(Instant::now());
                let _ = status_tx.send(PrecomputeStatus::Completed);
                info!(
                    task_id = %task_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "precompute completed"
                );
                Some(persistable_fields(&slot.snapshot))
            }
            None => {
                warn!(task_id = %task_id, "task evicted before completion");
                None
            }
        }
    };

    if let (Some(fields), Some(store)) = (persisted_fields, task_store) {
        if let Err(err) = store.update_task_fields(&task_id, fields).await {
            warn!(task_id = %task_id, error = %err, "persisting precompute results failed");
        }
    }
}

/// Marks a task failed after its run exited abnormally, recording the error
/// and pushing the terminal status to waiters.
fn mark_failed(
    inner: &SchedulerInner,
    task_id: &str,
    message: &str,
    status_tx: &watch::Sender<PrecomputeStatus>,
) {
    warn!(task_id = %task_id, error = %message, "precompute run aborted abnormally");
    let mut tasks = inner.tasks.lock();
    if let Some(slot) = tasks.get_mut(task_id) {
        slot.snapshot.status = PrecomputeStatus::Failed;
        slot.snapshot.completed_at = Some(Utc::now());
        slot.snapshot.error = Some(message.to_string());
        slot.completed = Some(Instant::now());
        let _ = status_tx.send(PrecomputeStatus::Failed);
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "precompute task panicked".to_string()
    }
}

/// The snapshot fields worth persisting onto the task record. Embeddings and
/// null samples stay in memory; they are large and only this process reads
/// them.
fn persistable_fields(snapshot: &PrecomputeSnapshot) -> serde_json::Value {
    serde_json::json!({
        "precompute_status": snapshot.status,
        "precompute_completed_at": snapshot.completed_at,
        "generated_clues": snapshot.generated_clues,
        "lexical_bridge": snapshot.lexical_bridge,
    })
}

/// Relevance scores of random clue draws against the task's prompt, sorted.
fn draw_null_samples(
    draws: &[(String, EmbeddingVector)],
    anchor: &[f32],
    target: Option<&[f32]>,
) -> Vec<f32> {
    let mut rng = rand::rng();
    let mut samples = Vec::with_capacity(PRECOMPUTE_NULL_SAMPLES);

    for _ in 0..PRECOMPUTE_NULL_SAMPLES {
        let indices = rand::seq::index::sample(&mut rng, draws.len(), PRECOMPUTE_NULL_CLUES);

        let mut anchor_sum = 0.0f32;
        let mut target_sum = 0.0f32;
        for i in indices {
            let (_, vector) = &draws[i];
            anchor_sum += cosine_similarity(vector, anchor);
            if let Some(target) = target {
                target_sum += cosine_similarity(vector, target);
            }
        }

        let n = PRECOMPUTE_NULL_CLUES as f32;
        let relevance = match target {
            Some(_) => (anchor_sum / n + target_sum / n) / 2.0,
            None => anchor_sum / n,
        };
        samples.push(relevance);
    }

    samples.sort_by(f32::total_cmp);
    samples
}

/// Drops expired tasks, then enforces the capacity bound by evicting
/// oldest-started tasks.
///
/// A slot that never reached a terminal status ages against its start time,
/// so a stalled run cannot occupy the map past the TTL.
fn collect_garbage(tasks: &mut HashMap<String, TaskSlot>, ttl: Duration, capacity: usize) {
    let expired: Vec<String> = tasks
        .iter()
        .filter(|(_, slot)| match slot.completed {
            Some(at) => at.elapsed() > ttl,
            None => slot.started.elapsed() > ttl,
        })
        .map(|(id, _)| id.clone())
        .collect();
    for id in expired {
        if let Some(slot) = tasks.remove(&id) {
            if let Some(handle) = slot.handle {
                handle.abort();
            }
        }
    }

    while tasks.len() > capacity {
        let oldest = tasks
            .iter()
            .min_by_key(|(_, slot)| slot.started)
            .map(|(id, _)| id.clone());
        match oldest {
            Some(id) => {
                if let Some(slot) = tasks.remove(&id) {
                    if let Some(handle) = slot.handle {
                        handle.abort();
                    }
                }
            }
            None => break,
        }
    }
}
