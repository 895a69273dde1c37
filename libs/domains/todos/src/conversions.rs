//! Protobuf message conversions for the gRPC adapter

use chrono::{DateTime, Utc};
use prost_types::Timestamp;
use rpc::todos as pb;
use tonic::Status;

use crate::models::{Todo, TodoDraft};

pub fn to_timestamp(value: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: value.timestamp(),
        nanos: value.timestamp_subsec_nanos() as i32,
    }
}

pub fn from_timestamp(value: &Timestamp) -> Result<DateTime<Utc>, Status> {
    u32::try_from(value.nanos)
        .ok()
        .and_then(|nanos| DateTime::from_timestamp(value.seconds, nanos))
        .ok_or_else(|| Status::invalid_argument("deadline is out of range"))
}

impl From<Todo> for pb::Todo {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            name: todo.name,
            description: todo.description,
            deadline: Some(to_timestamp(todo.deadline)),
            completed: todo.completed,
        }
    }
}

impl TryFrom<pb::Todo> for TodoDraft {
    type Error = Status;

    fn try_from(message: pb::Todo) -> Result<Self, Self::Error> {
        let deadline = message
            .deadline
            .as_ref()
            .ok_or_else(|| Status::invalid_argument("deadline is required"))
            .and_then(from_timestamp)?;

        Ok(Self {
            name: message.name,
            description: message.description,
            deadline,
            completed: message.completed,
        })
    }
}
