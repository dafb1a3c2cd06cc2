//! Event publishing: an asynchronous Kafka producer behind an N-way
//! topic-hashed fan-out, plus the registration event itself.

mod events;
mod fanout;
mod producer;

pub use events::{topic_name, RegisteredUser, RegistrationEvents, REGISTER_EVENT};
pub use fanout::{EventFanOut, EventMessage, MessageSink, ProduceError};
pub use producer::KafkaProducer;
