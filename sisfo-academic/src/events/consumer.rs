//! Student registration consumer
//!
//! Admission publishes `sisfo.events.admission.student.registered` once an
//! applicant is accepted. Each message becomes an active student whose
//! `nis` is the registration number.
//!
//! Delivery is at-least-once. Malformed or invalid payloads are acked and
//! dropped, an existing `(tenant, nis)` pair is acked as already handled, and
//! storage failures are negatively acked with exponential backoff until the
//! consumer's `max_deliver` is reached.

use crate::services::students::{StudentInput, StudentService};
use async_nats::jetstream::{self, consumer::PullConsumer, stream::Stream};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Deserialize;
use sisfo_common::{Error, Result, TenantId};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const STREAM_NAME: &str = "SISFO_EVENTS";
pub const STREAM_SUBJECTS: &str = "sisfo.events.>";
pub const STUDENT_REGISTERED_SUBJECT: &str = "sisfo.events.admission.student.registered";
pub const CONSUMER_NAME: &str = "academic-service-student-registration";

/// Deliveries before the server gives up on a message
pub const MAX_DELIVER: i64 = 8;

const BATCH_SIZE: usize = 16;
const BASE_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
pub struct StudentRegistered {
    pub tenant_id: String,
    #[serde(default)]
    pub application_id: String,
    pub registration_number: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl StudentRegistered {
    fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// What to tell the server about a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Nak(Duration),
}

/// Redelivery delay after `delivered` attempts
pub fn backoff(delivered: i64) -> Duration {
    let exponent = delivered.saturating_sub(1).clamp(0, 16) as u32;
    BASE_BACKOFF.saturating_mul(2u32.saturating_pow(exponent)).min(MAX_BACKOFF)
}

/// Handle one payload; `delivered` counts from 1
pub async fn process_registration(students: &StudentService, payload: &[u8], delivered: i64) -> Disposition {
    let event: StudentRegistered = match serde_json::from_slice(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!("Dropping malformed student registration: {}", e);
            return Disposition::Ack;
        }
    };

    let tenant = TenantId::new(event.tenant_id.trim());
    if tenant.is_empty() || event.registration_number.trim().is_empty() {
        warn!(
            application_id = %event.application_id,
            "Dropping student registration without tenant or registration number"
        );
        return Disposition::Ack;
    }

    match students.find_by_nis(&tenant, event.registration_number.trim()).await {
        Ok(Some(existing)) => {
            debug!(tenant = %tenant, student_id = %existing.id, "registration already processed");
            return Disposition::Ack;
        }
        Ok(None) => {}
        Err(e) => return retry(&event, e, delivered),
    }

    let input = StudentInput {
        nis: event.registration_number.clone(),
        name: event.full_name(),
        email: event.email.clone(),
        phone: event.phone_number.clone(),
        admission_date: Some(Utc::now().date_naive()),
        status: "active".to_string(),
        ..Default::default()
    };

    match students.create(&tenant, None, input).await {
        Ok(student) => {
            info!(
                tenant = %tenant,
                student_id = %student.id,
                application_id = %event.application_id,
                "student created from admission"
            );
            Disposition::Ack
        }
        Err(Error::Conflict(_)) => Disposition::Ack,
        Err(e @ (Error::Validation(_) | Error::InvalidInput(_))) => {
            warn!(application_id = %event.application_id, "Dropping invalid student registration: {}", e);
            Disposition::Ack
        }
        Err(e) => retry(&event, e, delivered),
    }
}

fn retry(event: &StudentRegistered, err: Error, delivered: i64) -> Disposition {
    let delay = backoff(delivered);
    error!(
        application_id = %event.application_id,
        delivered,
        retry_in = ?delay,
        "Failed to store student registration: {}",
        err
    );
    Disposition::Nak(delay)
}

/// Durable JetStream pull consumer for registrations
pub struct RegistrationConsumer {
    jetstream: jetstream::Context,
    students: StudentService,
}

impl RegistrationConsumer {
    pub async fn connect(nats_url: &str, students: StudentService) -> Result<Self> {
        let client = async_nats::connect(nats_url)
            .await
            .map_err(|e| Error::Internal(format!("Failed to connect to NATS: {e}")))?;
        info!("Connected to NATS at {}", nats_url);

        Ok(Self {
            jetstream: jetstream::new(client),
            students,
        })
    }

    /// Fetch and process batches until the task is dropped
    pub async fn run(&self) -> Result<()> {
        let stream = self.ensure_stream().await?;
        let consumer = self.ensure_consumer(&stream).await?;
        info!("Student registration consumer started");

        loop {
            match self.process_batch(&consumer).await {
                Ok(count) => {
                    if count > 0 {
                        debug!("Processed {} registrations", count);
                    }
                }
                Err(e) => {
                    error!("Error processing registration batch: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    async fn ensure_stream(&self) -> Result<Stream> {
        self.jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: STREAM_NAME.to_string(),
                subjects: vec![STREAM_SUBJECTS.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| Error::Internal(format!("Failed to create stream: {e}")))
    }

    async fn ensure_consumer(&self, stream: &Stream) -> Result<PullConsumer> {
        stream
            .get_or_create_consumer(
                CONSUMER_NAME,
                jetstream::consumer::pull::Config {
                    durable_name: Some(CONSUMER_NAME.to_string()),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    filter_subject: STUDENT_REGISTERED_SUBJECT.to_string(),
                    max_deliver: MAX_DELIVER,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Error::Internal(format!("Failed to create consumer: {e}")))
    }

    async fn process_batch(&self, consumer: &PullConsumer) -> Result<usize> {
        let mut messages = consumer
            .fetch()
            .max_messages(BATCH_SIZE)
            .expires(Duration::from_secs(5))
            .messages()
            .await
            .map_err(|e| Error::Internal(format!("Failed to fetch messages: {e}")))?;

        let mut count = 0;
        while let Some(msg_result) = messages.next().await {
            match msg_result {
                Ok(msg) => {
                    count += 1;
                    self.handle(msg).await;
                }
                Err(e) => warn!("Error receiving message: {}", e),
            }
        }
        Ok(count)
    }

    async fn handle(&self, msg: jetstream::Message) {
        let delivered = msg.info().map(|info| info.delivered).unwrap_or(1);

        let outcome = match process_registration(&self.students, &msg.payload, delivered).await {
            Disposition::Ack => msg.ack().await,
            Disposition::Nak(delay) => msg.ack_with(jetstream::AckKind::Nak(Some(delay))).await,
        };
        if let Err(e) = outcome {
            warn!("Failed to acknowledge registration message: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sisfo_common::db::init_memory_database;

    fn payload(tenant: &str, number: &str) -> Vec<u8> {
        serde_json::json!({
            "tenant_id": tenant,
            "application_id": "app-1",
            "registration_number": number,
            "first_name": "Dewi",
            "last_name": "Lestari",
            "email": "dewi@example.sch.id",
            "phone_number": "08123456789",
            "timestamp": "2025-07-01T08:00:00Z"
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_registration_creates_student() {
        let students = StudentService::new(init_memory_database().await.unwrap());
        let outcome = process_registration(&students, &payload("t1", "REG-001"), 1).await;
        assert_eq!(outcome, Disposition::Ack);

        let student = students
            .find_by_nis(&TenantId::new("t1"), "REG-001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(student.name, "Dewi Lestari");
        assert_eq!(student.status, "active");
        assert_eq!(student.phone, "08123456789");
        assert!(student.admission_date.is_some());
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let students = StudentService::new(init_memory_database().await.unwrap());
        let body = payload("t1", "REG-002");
        assert_eq!(process_registration(&students, &body, 1).await, Disposition::Ack);
        assert_eq!(process_registration(&students, &body, 2).await, Disposition::Ack);

        let page = students
            .list(&TenantId::new("t1"), sisfo_common::pagination::Pagination { limit: 10, offset: 0 })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_bad_payloads_are_dropped() {
        let students = StudentService::new(init_memory_database().await.unwrap());
        assert_eq!(process_registration(&students, b"not json", 1).await, Disposition::Ack);
        assert_eq!(process_registration(&students, &payload("", "REG-003"), 1).await, Disposition::Ack);
        assert_eq!(process_registration(&students, &payload("t1", " "), 1).await, Disposition::Ack);
    }

    #[tokio::test]
    async fn test_storage_failure_is_retried() {
        let pool = init_memory_database().await.unwrap();
        let students = StudentService::new(pool.clone());
        pool.close().await;

        match process_registration(&students, &payload("t1", "REG-004"), 3).await {
            Disposition::Nak(delay) => assert_eq!(delay, Duration::from_secs(4)),
            other => panic!("expected nak, got {:?}", other),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(4), Duration::from_secs(8));
        assert_eq!(backoff(20), MAX_BACKOFF);
        assert_eq!(backoff(0), Duration::from_secs(1));
    }
}
