//! Todos Domain
//!
//! One Todo entity served over REST, GraphQL and gRPC from a single store.
//!
//! # Architecture
//!
//! ```text
//!   REST        GraphQL        gRPC         handlers (protocol adapters)
//!     │            │             │
//!     └────────────┼─────────────┘
//!                  ▼
//!           TodoRepository                  Storage Port (trait)
//!                  │
//!        ┌─────────┴──────────┐
//!        ▼                    ▼
//!  PgTodoRepository   InMemoryTodoRepository
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_todos::{PgTodoRepository, SharedRepository, handlers};
//! use sea_orm::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://...").await?;
//! let repository: SharedRepository = Arc::new(PgTodoRepository::new(db));
//!
//! let http = handlers::http_router(repository.clone());
//! let grpc = handlers::TodoGrpcService::new(repository).into_server();
//! # Ok(())
//! # }
//! ```

pub mod conversions;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use envelope::Envelope;
pub use error::{TodoError, TodoResult};
pub use memory::InMemoryTodoRepository;
pub use models::{Todo, TodoDraft};
pub use postgres::PgTodoRepository;
pub use repository::{SharedRepository, TodoRepository};
