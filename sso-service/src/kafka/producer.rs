use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};

use crate::kafka::{EventMessage, MessageSink, ProduceError};

/// Kafka producer used by the fan-out workers. Auto topic creation is off;
/// topics are provisioned alongside the clients they belong to.
#[derive(Clone)]
pub struct KafkaProducer {
    producer: FutureProducer,
}

impl KafkaProducer {
    pub fn new(address: &[String]) -> Result<Self, KafkaError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", address.join(","))
            .set("client.id", "sso-service")
            .set("allow.auto.create.topics", "false")
            .set("message.timeout.ms", "30000")
            .create::<FutureProducer>()?;

        Ok(Self { producer })
    }

    /// Flushes whatever is still in flight; losses past the timeout are
    /// accepted, delivery is best-effort.
    pub fn flush(&self) -> Result<(), KafkaError> {
        self.producer.flush(Duration::from_secs(5))
    }
}

#[async_trait]
impl MessageSink for KafkaProducer {
    async fn produce(&self, message: &EventMessage) -> Result<(), ProduceError> {
        let mut record =
            FutureRecord::<Vec<u8>, Vec<u8>>::to(&message.topic).payload(&message.value);
        if let Some(key) = &message.key {
            record = record.key(key);
        }

        self.producer
            .send(record, Duration::from_secs(30))
            .await
            .map_err(|(err, _)| -> ProduceError { err.into() })?;

        Ok(())
    }
}
