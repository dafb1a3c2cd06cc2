//! Topic-hashed fan-out in front of the producer.
//!
//! A single dispatcher task reads the input channel and forwards each message
//! to one of N worker channels picked by FNV-1a over the topic name, so all
//! messages of a topic drain serially through one worker and keep their
//! order. Closing the input drains the dispatcher, which closes the worker
//! channels and lets the workers finish.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

pub type ProduceError = Box<dyn std::error::Error + Send + Sync>;

/// A message bound for the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
}

/// Destination of fanned-out messages. Production uses the Kafka producer;
/// tests substitute an in-memory sink.
#[async_trait]
pub trait MessageSink: Send + Sync + 'static {
    async fn produce(&self, message: &EventMessage) -> Result<(), ProduceError>;
}

/// Running fan-out: the input handle plus the dispatcher and worker tasks.
pub struct EventFanOut {
    input: mpsc::Sender<EventMessage>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl EventFanOut {
    /// Spawns the dispatcher and `number_of_topics` workers. Returns the
    /// fan-out and the channel on which produce errors are notified; the
    /// caller decides what to do with them (the service logs and continues;
    /// delivery is best-effort).
    pub fn start<S: MessageSink>(
        sink: Arc<S>,
        number_of_topics: usize,
    ) -> (Self, mpsc::Receiver<ProduceError>) {
        assert!(number_of_topics > 0, "fan-out needs at least one worker");

        info!(workers = number_of_topics, "running kafka fan-out");

        let (input_tx, mut input_rx) = mpsc::channel::<EventMessage>(1);
        let (notify_tx, notify_rx) = mpsc::channel::<ProduceError>(16);

        let mut worker_txs = Vec::with_capacity(number_of_topics);
        let mut workers = Vec::with_capacity(number_of_topics);

        for _ in 0..number_of_topics {
            let (worker_tx, mut worker_rx) = mpsc::channel::<EventMessage>(1);
            worker_txs.push(worker_tx);

            let sink = sink.clone();
            let notify = notify_tx.clone();
            workers.push(tokio::spawn(async move {
                while let Some(message) = worker_rx.recv().await {
                    if let Err(err) = sink.produce(&message).await {
                        let _ = notify.send(err).await;
                    }
                }
            }));
        }

        let dispatcher = tokio::spawn(async move {
            while let Some(message) = input_rx.recv().await {
                let index = topic_index(&message.topic, number_of_topics);
                if worker_txs[index].send(message).await.is_err() {
                    break;
                }
            }
            // worker_txs drop here, closing the per-topic channels and
            // draining the workers
        });

        (Self { input: input_tx, dispatcher, workers }, notify_rx)
    }

    /// Handle for enqueueing messages. Senders may be cloned freely; the
    /// fan-out drains once every sender (this one included) is gone.
    pub fn input(&self) -> mpsc::Sender<EventMessage> {
        self.input.clone()
    }

    /// Closes the input and waits for the dispatcher and workers to drain.
    pub async fn stop(self) {
        info!("stopping kafka fan-out");

        drop(self.input);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Stable worker index for a topic: FNV-1a 32 over the topic name, mod N.
pub(crate) fn topic_index(topic: &str, number_of_topics: usize) -> usize {
    (fnv1a_32(topic.as_bytes()) as usize) % number_of_topics
}

fn fnv1a_32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
