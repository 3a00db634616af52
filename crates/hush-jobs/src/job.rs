// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The closed set of job variants, their wire form, and per-attempt
//! outcomes.

use hush_core::{HushError, JobId, JobRecord, JobStatus};

use crate::context::JobContext;
use crate::variants::{
    AttachmentDownloadJob, AttachmentUploadJob, MessageReceiveJob, MessageSendJob,
    NotifyPnServerJob,
};

/// The result of running a job once.
#[derive(Debug)]
pub enum JobOutcome {
    /// The job did its work; mark it succeeded and never run it again.
    Success,
    /// The attempt failed in a way that may clear up; schedule a retry
    /// unless the failure budget is spent.
    Retry(HushError),
    /// The attempt failed in a way retries cannot fix; mark the job
    /// failed immediately.
    Permanent(HushError),
}

/// A tagged union over the known job variants.
///
/// Every variant pairs a stable type key with a JSON payload, so a record
/// persisted by one process revision can be decoded and resumed by the
/// next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    MessageSend(MessageSendJob),
    MessageReceive(MessageReceiveJob),
    AttachmentDownload(AttachmentDownloadJob),
    AttachmentUpload(AttachmentUploadJob),
    NotifyPnServer(NotifyPnServerJob),
}

impl JobKind {
    /// Every type key a resume scan must cover.
    pub const ALL_TYPE_KEYS: [&'static str; 5] = [
        MessageSendJob::KEY,
        MessageReceiveJob::KEY,
        AttachmentDownloadJob::KEY,
        AttachmentUploadJob::KEY,
        NotifyPnServerJob::KEY,
    ];

    /// The stable key identifying this variant in persisted records.
    pub fn type_key(&self) -> &'static str {
        match self {
            JobKind::MessageSend(_) => MessageSendJob::KEY,
            JobKind::MessageReceive(_) => MessageReceiveJob::KEY,
            JobKind::AttachmentDownload(_) => AttachmentDownloadJob::KEY,
            JobKind::AttachmentUpload(_) => AttachmentUploadJob::KEY,
            JobKind::NotifyPnServer(_) => NotifyPnServerJob::KEY,
        }
    }

    /// How many attempts this variant is allowed before the scheduler
    /// gives up on it.
    pub fn max_failure_count(&self) -> u32 {
        match self {
            JobKind::MessageSend(_) | JobKind::MessageReceive(_) => 10,
            JobKind::AttachmentDownload(_)
            | JobKind::AttachmentUpload(_)
            | JobKind::NotifyPnServer(_) => 20,
        }
    }

    /// Serializes the variant payload to its persisted JSON form.
    pub fn encode(&self) -> Result<String, HushError> {
        let encoded = match self {
            JobKind::MessageSend(job) => serde_json::to_string(job),
            JobKind::MessageReceive(job) => serde_json::to_string(job),
            JobKind::AttachmentDownload(job) => serde_json::to_string(job),
            JobKind::AttachmentUpload(job) => serde_json::to_string(job),
            JobKind::NotifyPnServer(job) => serde_json::to_string(job),
        };
        encoded.map_err(|e| HushError::Internal(format!("couldn't encode job payload: {e}")))
    }

    /// Rebuilds a variant from a persisted type key and JSON payload.
    pub fn decode(type_key: &str, payload: &str) -> Result<Self, HushError> {
        let decode_err = |e: serde_json::Error| HushError::Decode {
            type_key: type_key.to_owned(),
            message: e.to_string(),
        };
        match type_key {
            MessageSendJob::KEY => {
                serde_json::from_str(payload).map(JobKind::MessageSend).map_err(decode_err)
            }
            MessageReceiveJob::KEY => {
                serde_json::from_str(payload).map(JobKind::MessageReceive).map_err(decode_err)
            }
            AttachmentDownloadJob::KEY => serde_json::from_str(payload)
                .map(JobKind::AttachmentDownload)
                .map_err(decode_err),
            AttachmentUploadJob::KEY => serde_json::from_str(payload)
                .map(JobKind::AttachmentUpload)
                .map_err(decode_err),
            NotifyPnServerJob::KEY => serde_json::from_str(payload)
                .map(JobKind::NotifyPnServer)
                .map_err(decode_err),
            other => Err(HushError::Decode {
                type_key: other.to_owned(),
                message: "unknown job type".into(),
            }),
        }
    }

    pub(crate) async fn run(&self, ctx: &JobContext) -> JobOutcome {
        match self {
            JobKind::MessageSend(job) => job.run(ctx).await,
            JobKind::MessageReceive(job) => job.run(ctx).await,
            JobKind::AttachmentDownload(job) => job.run(ctx).await,
            JobKind::AttachmentUpload(job) => job.run(ctx).await,
            JobKind::NotifyPnServer(job) => job.run(ctx).await,
        }
    }
}

/// A job together with its scheduler-owned bookkeeping.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub failure_count: u32,
    pub kind: JobKind,
}

impl Job {
    pub fn to_record(&self, status: JobStatus) -> Result<JobRecord, HushError> {
        Ok(JobRecord {
            id: self.id.clone(),
            type_key: self.kind.type_key().to_owned(),
            payload: self.kind.encode()?,
            failure_count: self.failure_count,
            status,
        })
    }

    pub fn from_record(record: &JobRecord) -> Result<Self, HushError> {
        Ok(Job {
            id: record.id.clone(),
            failure_count: record.failure_count,
            kind: JobKind::decode(&record.type_key, &record.payload)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use hush_core::ServerTarget;

    use super::*;

    fn sample_send() -> JobKind {
        JobKind::MessageSend(MessageSendJob {
            recipient: "05aa".into(),
            data: "Y2lwaGVy".into(),
            ttl_ms: 86_400_000,
            swarm: ServerTarget::new("https://swarm.example", "cc"),
        })
    }

    #[test]
    fn encode_then_decode_preserves_the_variant() {
        let kind = sample_send();
        let payload = kind.encode().unwrap();
        let decoded = JobKind::decode(kind.type_key(), &payload).unwrap();
        assert_eq!(decoded, kind);
    }

    #[test]
    fn unknown_type_key_is_a_decode_error() {
        let err = JobKind::decode("SomeFutureJob", "{}").unwrap_err();
        assert!(matches!(err, HushError::Decode { type_key, .. } if type_key == "SomeFutureJob"));
    }

    #[test]
    fn garbage_payload_is_a_decode_error_carrying_the_type_key() {
        let err = JobKind::decode(MessageSendJob::KEY, "not json at all").unwrap_err();
        assert!(matches!(err, HushError::Decode { type_key, .. } if type_key == MessageSendJob::KEY));
    }

    #[test]
    fn failure_budgets_match_the_variant_class() {
        assert_eq!(sample_send().max_failure_count(), 10);
        let notify = JobKind::NotifyPnServer(NotifyPnServerJob {
            data: "x".into(),
            send_to: "05aa".into(),
        });
        assert_eq!(notify.max_failure_count(), 20);
    }

    #[test]
    fn all_type_keys_are_distinct_and_decodable_dispatch_targets() {
        let mut keys = JobKind::ALL_TYPE_KEYS.to_vec();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), JobKind::ALL_TYPE_KEYS.len());
    }

    #[test]
    fn record_round_trip_keeps_the_failure_count() {
        let job = Job {
            id: JobId("42".into()),
            failure_count: 3,
            kind: sample_send(),
        };
        let record = job.to_record(JobStatus::Pending).unwrap();
        assert_eq!(record.type_key, "MessageSendJob");
        assert_eq!(record.failure_count, 3);

        let restored = Job::from_record(&record).unwrap();
        assert_eq!(restored.id, job.id);
        assert_eq!(restored.failure_count, 3);
        assert_eq!(restored.kind, job.kind);
    }
}
