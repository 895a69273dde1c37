//! Generated protobuf messages and tonic stubs for the todo service.

pub mod todos {
    tonic::include_proto!("todos");
}
