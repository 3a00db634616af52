// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The job scheduler: persist-first enqueue, exponential-backoff retries,
//! and a once-per-process resume scan after restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hush_core::{HushError, JobId, JobStatus, JobStore};

use crate::context::JobContext;
use crate::job::{Job, JobKind, JobOutcome};
use crate::variants::NotifyPnServerJob;

/// Backoff exponent cap. With the 250 ms base this pins the delay at
/// 150 s from the tenth failure onward.
const MAX_BACKOFF_FACTOR: f64 = 600.0;
const BACKOFF_BASE_MS: f64 = 250.0;

/// Retry delay after `failure_count` failed attempts:
/// `round(250 * min(600, 2^failure_count))` milliseconds.
pub fn retry_interval(failure_count: u32) -> Duration {
    let factor = f64::min(MAX_BACKOFF_FACTOR, 2f64.powi(failure_count.min(1024) as i32));
    Duration::from_millis((BACKOFF_BASE_MS * factor).round() as u64)
}

/// Schedules persisted jobs: each enqueued or resumed job gets its own
/// driver task that runs attempts, persists failure counts, sleeps out
/// the backoff, and records exactly one terminal status.
pub struct JobQueue {
    driver: Driver,
    resumed: AtomicBool,
}

impl JobQueue {
    pub fn new(store: Arc<dyn JobStore>, context: JobContext) -> Self {
        Self {
            driver: Driver {
                store,
                context,
                shutdown: CancellationToken::new(),
                ids: Arc::new(IdGenerator::default()),
            },
            resumed: AtomicBool::new(false),
        }
    }

    /// Persists the job as pending and spawns its driver. The record hits
    /// the store before any execution, so a crash after enqueue never
    /// loses the job.
    pub async fn enqueue(&self, kind: JobKind) -> Result<JobId, HushError> {
        self.driver.enqueue(kind).await
    }

    /// Scans the store for pending jobs of every known type and restarts
    /// their drivers. Runs at most once per process; later calls are
    /// no-ops.
    ///
    /// Store errors are logged and the scan moves on to the next type
    /// key, so one failing scan cannot strand every other type's pending
    /// jobs behind the resume guard. Records whose payload no longer
    /// decodes are marked failed rather than retried forever.
    pub async fn resume_pending_jobs(&self) {
        if self.resumed.swap(true, Ordering::SeqCst) {
            warn!("resume requested more than once; ignoring");
            return;
        }
        for type_key in JobKind::ALL_TYPE_KEYS {
            let records = match self.driver.store.all_pending_of_type(type_key).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(type_key, error = %e, "couldn't scan pending jobs; skipping type");
                    continue;
                }
            };
            if !records.is_empty() {
                info!(type_key, count = records.len(), "resuming pending jobs");
            }
            for record in &records {
                match Job::from_record(record) {
                    Ok(job) => self.driver.spawn(job),
                    Err(e) => {
                        warn!(job_id = %record.id, error = %e, "dropping undecodable job record");
                        if let Err(e) = self.driver.store.mark_failed(&record.id).await {
                            warn!(job_id = %record.id, error = %e, "couldn't record job failure");
                        }
                    }
                }
            }
        }
    }

    /// Flags the job so its driver abandons it at the next retry
    /// boundary. A terminal job is unaffected.
    pub async fn cancel(&self, id: &JobId) -> Result<(), HushError> {
        self.driver.store.cancel(id).await
    }

    /// Asks every driver to stop at its next await point. Drivers mid
    /// backoff wake immediately and abandon their job without a terminal
    /// mark, leaving it pending for the next resume.
    pub fn shutdown(&self) {
        self.driver.shutdown.cancel();
    }
}

/// Everything one spawned driver task needs, cheap to clone per job.
#[derive(Clone)]
struct Driver {
    store: Arc<dyn JobStore>,
    context: JobContext,
    shutdown: CancellationToken,
    ids: Arc<IdGenerator>,
}

impl Driver {
    async fn enqueue(&self, kind: JobKind) -> Result<JobId, HushError> {
        let job = Job {
            id: self.ids.next(),
            failure_count: 0,
            kind,
        };
        self.store.persist(&job.to_record(JobStatus::Pending)?).await?;
        debug!(job_id = %job.id, type_key = job.kind.type_key(), "enqueued job");
        let id = job.id.clone();
        self.spawn(job);
        Ok(id)
    }

    fn spawn(&self, job: Job) {
        let driver = self.clone();
        tokio::spawn(async move { driver.drive(job).await });
    }

    async fn drive(&self, mut job: Job) {
        loop {
            let outcome = job.kind.run(&self.context).await;
            match outcome {
                JobOutcome::Success => {
                    if let Err(e) = self.store.mark_succeeded(&job.id).await {
                        warn!(job_id = %job.id, error = %e, "couldn't record job success");
                    }
                    debug!(job_id = %job.id, type_key = job.kind.type_key(), "job succeeded");
                    self.enqueue_follow_up(&job).await;
                    return;
                }
                JobOutcome::Permanent(e) => {
                    warn!(job_id = %job.id, error = %e, "job failed permanently");
                    job.failure_count += 1;
                    self.persist_pending(&job).await;
                    if let Err(e) = self.store.mark_failed(&job.id).await {
                        warn!(job_id = %job.id, error = %e, "couldn't record job failure");
                    }
                    return;
                }
                JobOutcome::Retry(e) => {
                    // Cancellation wins over the retry: an attempt that was
                    // in flight when the cancel landed must not reschedule.
                    match self.store.is_canceled(&job.id).await {
                        Ok(true) => {
                            debug!(job_id = %job.id, "job canceled; abandoning");
                            return;
                        }
                        Ok(false) => {}
                        Err(e) => {
                            warn!(job_id = %job.id, error = %e, "cancellation check failed; abandoning");
                            return;
                        }
                    }
                    job.failure_count += 1;
                    self.persist_pending(&job).await;
                    if job.failure_count >= job.kind.max_failure_count() {
                        warn!(
                            job_id = %job.id,
                            failure_count = job.failure_count,
                            error = %e,
                            "job exhausted its retry budget"
                        );
                        if let Err(e) = self.store.mark_failed(&job.id).await {
                            warn!(job_id = %job.id, error = %e, "couldn't record job failure");
                        }
                        return;
                    }
                    let delay = retry_interval(job.failure_count);
                    debug!(
                        job_id = %job.id,
                        failure_count = job.failure_count,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "job attempt failed; backing off"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.shutdown.cancelled() => {
                            debug!(job_id = %job.id, "shutdown during backoff; leaving job pending");
                            return;
                        }
                    }
                    // A cancel may also have landed while we slept.
                    if matches!(self.store.is_canceled(&job.id).await, Ok(true)) {
                        debug!(job_id = %job.id, "job canceled during backoff; abandoning");
                        return;
                    }
                }
            }
        }
    }

    /// A delivered message still needs the recipient's device woken; chain
    /// the push-relay notification as its own persisted job.
    async fn enqueue_follow_up(&self, job: &Job) {
        let JobKind::MessageSend(send) = &job.kind else {
            return;
        };
        let notify = JobKind::NotifyPnServer(NotifyPnServerJob {
            data: send.data.clone(),
            send_to: send.recipient.clone(),
        });
        if let Err(e) = self.enqueue(notify).await {
            warn!(job_id = %job.id, error = %e, "couldn't enqueue push notification job");
        }
    }

    async fn persist_pending(&self, job: &Job) {
        match job.to_record(JobStatus::Pending) {
            Ok(record) => {
                if let Err(e) = self.store.persist(&record).await {
                    warn!(job_id = %job.id, error = %e, "couldn't persist job progress");
                }
            }
            Err(e) => warn!(job_id = %job.id, error = %e, "couldn't encode job for persistence"),
        }
    }
}

/// Millisecond-timestamp ids, forced strictly increasing so ids double as
/// enqueue order.
#[derive(Default)]
struct IdGenerator {
    last_ms: AtomicI64,
}

impl IdGenerator {
    fn next(&self) -> JobId {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let mut last = self.last_ms.load(Ordering::SeqCst);
        loop {
            let candidate = now_ms.max(last + 1);
            match self.last_ms.compare_exchange(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return JobId(candidate.to_string()),
                Err(observed) => last = observed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Semaphore;

    use hush_core::{JobRecord, ServerTarget};
    use hush_test_utils::{
        MemoryAttachmentStore, MemoryJobStore, ProcessorMode, ScriptedDispatcher,
        ScriptedProcessor,
    };

    use super::*;
    use crate::variants::{MessageReceiveJob, MessageSendJob};

    fn context(dispatcher: Arc<ScriptedDispatcher>, mode: ProcessorMode) -> JobContext {
        JobContext {
            dispatcher,
            processor: Arc::new(ScriptedProcessor::new(mode)),
            attachments: Arc::new(MemoryAttachmentStore::new()),
            push_server: ServerTarget::new("https://push.example", "aa"),
            file_server: ServerTarget::new("https://files.example", "bb"),
        }
    }

    fn send_job() -> JobKind {
        JobKind::MessageSend(MessageSendJob {
            recipient: "05aa".into(),
            data: "Y2lwaGVy".into(),
            ttl_ms: 86_400_000,
            swarm: ServerTarget::new("https://swarm.example", "cc"),
        })
    }

    fn receive_job() -> JobKind {
        use base64::Engine;
        JobKind::MessageReceive(MessageReceiveJob {
            data: base64::engine::general_purpose::STANDARD.encode(b"envelope"),
        })
    }

    /// Polls (yielding virtual time) until the condition holds.
    async fn wait_until<F, Fut>(mut condition: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        for _ in 0..10_000 {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("condition never became true");
    }

    #[test]
    fn backoff_follows_the_capped_exponential() {
        assert_eq!(retry_interval(0), Duration::from_millis(250));
        assert_eq!(retry_interval(1), Duration::from_millis(500));
        assert_eq!(retry_interval(5), Duration::from_millis(8_000));
        assert_eq!(retry_interval(9), Duration::from_millis(128_000));
        // Capped at 250 * 600 from the tenth failure onward.
        assert_eq!(retry_interval(10), Duration::from_millis(150_000));
        assert_eq!(retry_interval(11), Duration::from_millis(150_000));
        assert_eq!(retry_interval(20), Duration::from_millis(150_000));
    }

    #[tokio::test(start_paused = true)]
    async fn successful_job_is_marked_succeeded() {
        let store = Arc::new(MemoryJobStore::new());
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let queue = JobQueue::new(store.clone(), context(dispatcher, ProcessorMode::Succeed));

        let id = queue.enqueue(receive_job()).await.unwrap();
        wait_until(|| {
            let store = store.clone();
            let id = id.clone();
            async move { store.status(&id).await == Some(JobStatus::Succeeded) }
        })
        .await;

        assert_eq!(store.failure_count(&id).await, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_under_the_same_id() {
        let store = Arc::new(MemoryJobStore::new());
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        dispatcher.push_transport_failures(2).await;
        let queue = JobQueue::new(
            store.clone(),
            context(dispatcher.clone(), ProcessorMode::Succeed),
        );

        let id = queue.enqueue(send_job()).await.unwrap();
        wait_until(|| {
            let store = store.clone();
            let id = id.clone();
            async move { store.status(&id).await == Some(JobStatus::Succeeded) }
        })
        .await;

        // Three attempts on the swarm, then the follow-up notification.
        let requests = dispatcher.requests().await;
        let endpoints: Vec<_> = requests.iter().map(|r| r.endpoint.as_str()).collect();
        assert_eq!(endpoints, ["/store", "/store", "/store", "/notify"]);

        // Every persist carried the same id with a climbing failure count.
        let log = store.persist_log().await;
        let for_job: Vec<u32> = log
            .iter()
            .filter(|(logged, _)| *logged == id.0)
            .map(|(_, n)| *n)
            .collect();
        assert_eq!(for_job, [0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn message_send_success_chains_a_push_notification_job() {
        let store = Arc::new(MemoryJobStore::new());
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let queue = JobQueue::new(
            store.clone(),
            context(dispatcher.clone(), ProcessorMode::Succeed),
        );

        queue.enqueue(send_job()).await.unwrap();
        wait_until(|| {
            let dispatcher = dispatcher.clone();
            async move { dispatcher.call_count().await == 2 }
        })
        .await;

        let requests = dispatcher.requests().await;
        assert_eq!(requests[0].endpoint, "/store");
        assert_eq!(requests[1].endpoint, "/notify");
        assert_eq!(requests[1].body["send_to"], "05aa");
        assert_eq!(requests[1].body["data"], "Y2lwaGVy");
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_marked_failed_after_one_attempt() {
        let store = Arc::new(MemoryJobStore::new());
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let queue = JobQueue::new(store.clone(), context(dispatcher, ProcessorMode::Malformed));

        let id = queue.enqueue(receive_job()).await.unwrap();
        wait_until(|| {
            let store = store.clone();
            let id = id.clone();
            async move { store.status(&id).await == Some(JobStatus::Failed) }
        })
        .await;

        assert_eq!(store.failure_count(&id).await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retry_budget_fails_the_job() {
        let store = Arc::new(MemoryJobStore::new());
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        // More scripted failures than the send budget allows.
        dispatcher.push_transport_failures(30).await;
        let queue = JobQueue::new(
            store.clone(),
            context(dispatcher.clone(), ProcessorMode::Succeed),
        );

        let id = queue.enqueue(send_job()).await.unwrap();
        wait_until(|| {
            let store = store.clone();
            let id = id.clone();
            async move { store.status(&id).await == Some(JobStatus::Failed) }
        })
        .await;

        assert_eq!(store.failure_count(&id).await, Some(10));
        assert_eq!(dispatcher.call_count().await, 10);

        // A terminal job is not picked up again by a resume scan.
        let queue2 = JobQueue::new(
            store.clone(),
            context(dispatcher.clone(), ProcessorMode::Succeed),
        );
        queue2.resume_pending_jobs().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(dispatcher.call_count().await, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_an_attempt_prevents_the_retry() {
        let store = Arc::new(MemoryJobStore::new());
        let gate = Arc::new(Semaphore::new(0));
        let dispatcher = Arc::new(ScriptedDispatcher::gated(gate.clone()));
        dispatcher.push_transport_failures(1).await;
        let queue = JobQueue::new(
            store.clone(),
            context(dispatcher.clone(), ProcessorMode::Succeed),
        );

        let id = queue.enqueue(send_job()).await.unwrap();
        // The attempt is parked on the gate; cancel lands first.
        queue.cancel(&id).await.unwrap();
        gate.add_permits(1);

        wait_until(|| {
            let dispatcher = dispatcher.clone();
            async move { dispatcher.call_count().await == 1 }
        })
        .await;
        // Give a would-be retry ample virtual time to show up.
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(dispatcher.call_count().await, 1);
        // Only the enqueue persist; the abandoned attempt wrote nothing.
        assert_eq!(store.persist_log().await, vec![(id.0.clone(), 0)]);
        assert_eq!(store.status(&id).await, Some(JobStatus::Pending));
    }

    #[tokio::test(start_paused = true)]
    async fn resume_runs_each_pending_job_exactly_once() {
        let store = Arc::new(MemoryJobStore::new());
        store
            .seed(JobRecord {
                id: JobId("100".into()),
                type_key: MessageSendJob::KEY.into(),
                payload: send_job().encode().unwrap(),
                failure_count: 3,
                status: JobStatus::Pending,
            })
            .await;
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let queue = JobQueue::new(
            store.clone(),
            context(dispatcher.clone(), ProcessorMode::Succeed),
        );

        queue.resume_pending_jobs().await;
        // Second call is a guarded no-op: no fresh scans, no re-execution.
        queue.resume_pending_jobs().await;
        assert_eq!(store.scan_count(), JobKind::ALL_TYPE_KEYS.len());

        let id = JobId("100".into());
        wait_until(|| {
            let store = store.clone();
            let id = id.clone();
            async move { store.status(&id).await == Some(JobStatus::Succeeded) }
        })
        .await;

        // One store attempt plus the chained notification.
        let endpoints: Vec<_> = dispatcher
            .requests()
            .await
            .iter()
            .map(|r| r.endpoint.clone())
            .collect();
        assert_eq!(endpoints, ["/store", "/notify"]);
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_record_is_failed_on_resume() {
        let store = Arc::new(MemoryJobStore::new());
        store
            .seed(JobRecord {
                id: JobId("7".into()),
                type_key: MessageSendJob::KEY.into(),
                payload: "not json".into(),
                failure_count: 0,
                status: JobStatus::Pending,
            })
            .await;
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let queue = JobQueue::new(
            store.clone(),
            context(dispatcher.clone(), ProcessorMode::Succeed),
        );

        queue.resume_pending_jobs().await;

        assert_eq!(store.status(&JobId("7".into())).await, Some(JobStatus::Failed));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(dispatcher.call_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_continues_past_a_failing_type_scan() {
        use base64::Engine;

        let store = Arc::new(MemoryJobStore::new());
        // The first type key's scan errors; a later type still has work.
        store.fail_scans_of(MessageSendJob::KEY).await;
        store
            .seed(JobRecord {
                id: JobId("100".into()),
                type_key: MessageReceiveJob::KEY.into(),
                payload: serde_json::to_string(&MessageReceiveJob {
                    data: base64::engine::general_purpose::STANDARD.encode(b"envelope"),
                })
                .unwrap(),
                failure_count: 0,
                status: JobStatus::Pending,
            })
            .await;
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let queue = JobQueue::new(
            store.clone(),
            context(dispatcher, ProcessorMode::Succeed),
        );

        queue.resume_pending_jobs().await;

        // Every type key was still scanned despite the first one failing,
        // and the seeded job behind the failing scan ran to completion.
        assert_eq!(store.scan_count(), JobKind::ALL_TYPE_KEYS.len());
        let id = JobId("100".into());
        wait_until(|| {
            let store = store.clone();
            let id = id.clone();
            async move { store.status(&id).await == Some(JobStatus::Succeeded) }
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_backoff_leaves_the_job_pending() {
        let store = Arc::new(MemoryJobStore::new());
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        dispatcher.push_transport_failures(5).await;
        let queue = JobQueue::new(
            store.clone(),
            context(dispatcher.clone(), ProcessorMode::Succeed),
        );

        let id = queue.enqueue(send_job()).await.unwrap();
        wait_until(|| {
            let dispatcher = dispatcher.clone();
            async move { dispatcher.call_count().await >= 1 }
        })
        .await;
        queue.shutdown();

        // The driver wakes from its backoff and stops without a terminal
        // mark; the job stays pending for the next resume.
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(store.status(&id).await, Some(JobStatus::Pending));
        assert!(dispatcher.call_count().await < 5);
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_issues_strictly_increasing_ids() {
        let store = Arc::new(MemoryJobStore::new());
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let queue = JobQueue::new(store.clone(), context(dispatcher, ProcessorMode::Succeed));

        let mut ids = Vec::new();
        for _ in 0..50 {
            ids.push(queue.enqueue(receive_job()).await.unwrap());
        }
        let numeric: Vec<i64> = ids.iter().map(|id| id.0.parse::<i64>().unwrap()).collect();
        for pair in numeric.windows(2) {
            assert!(pair[0] < pair[1], "ids must be strictly increasing");
        }
    }
}
