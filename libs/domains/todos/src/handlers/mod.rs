//! Protocol adapters. Each one holds its own handle to the Storage Port and
//! translates [`TodoError`](crate::TodoError) into its own status vocabulary.

pub mod graphql;
pub mod grpc;
pub mod rest;

use axum::Router;

use crate::repository::SharedRepository;

pub use graphql::{TodoSchema, schema};
pub use grpc::TodoGrpcService;
pub use rest::RestApiDoc;

/// REST and GraphQL routes served by the HTTP listener
pub fn http_router(repository: SharedRepository) -> Router {
    rest::router(SharedRepository::clone(&repository)).merge(graphql::router(repository))
}
