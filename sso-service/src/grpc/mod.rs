//! gRPC facade: wire validation, proto↔domain mapping, error translation.

mod auth;
mod profile;

pub use auth::SsoService;
pub use profile::SsoProfileService;

use chrono::{DateTime, Utc};
use tonic::Status;

use crate::domain::Gender;

fn required(value: &str, message: &'static str) -> Result<(), Status> {
    if value.is_empty() {
        return Err(Status::invalid_argument(message));
    }
    Ok(())
}

fn gender_from_wire(value: i32) -> Result<Option<Gender>, Status> {
    if value == 0 {
        return Ok(None);
    }

    i16::try_from(value)
        .ok()
        .and_then(Gender::from_i16)
        .map(Some)
        .ok_or_else(|| Status::invalid_argument("gender is invalid"))
}

fn timestamp_from_wire(
    value: Option<prost_types::Timestamp>,
) -> Result<Option<DateTime<Utc>>, Status> {
    match value {
        None => Ok(None),
        Some(ts) => u32::try_from(ts.nanos)
            .ok()
            .and_then(|nanos| DateTime::from_timestamp(ts.seconds, nanos))
            .map(Some)
            .ok_or_else(|| Status::invalid_argument("date of birth is invalid")),
    }
}

fn timestamp_to_wire(value: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: value.timestamp(),
        nanos: value.timestamp_subsec_nanos() as i32,
    }
}
