use rpc::todos::{
    self as pb,
    todo_service_server::{TodoService, TodoServiceServer},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::codec::CompressionEncoding;
use tonic::{Request, Response, Status};
use tracing::{Instrument, debug, error, info_span, instrument, warn};

use crate::error::TodoError;
use crate::models::TodoDraft;
use crate::repository::SharedRepository;

const LIST_BUFFER: usize = 32;

impl From<TodoError> for Status {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound(_) => Status::not_found("todo not found"),
            other => {
                error!(error = %other, "grpc call failed");
                Status::internal("internal error")
            }
        }
    }
}

/// gRPC adapter over the Storage Port
pub struct TodoGrpcService {
    repository: SharedRepository,
}

impl TodoGrpcService {
    pub fn new(repository: SharedRepository) -> Self {
        Self { repository }
    }

    /// Wraps the service for `tonic::transport::Server::add_service`
    pub fn into_server(self) -> TodoServiceServer<Self> {
        TodoServiceServer::new(self)
            .accept_compressed(CompressionEncoding::Zstd)
            .send_compressed(CompressionEncoding::Zstd)
    }
}

#[tonic::async_trait]
impl TodoService for TodoGrpcService {
    #[instrument(skip_all)]
    async fn create(&self, request: Request<pb::Todo>) -> Result<Response<pb::Todo>, Status> {
        let draft = TodoDraft::try_from(request.into_inner())?;

        let id = self.repository.insert_todo(draft.clone()).await?;
        Ok(Response::new(draft.into_todo(id).into()))
    }

    #[instrument(skip_all, fields(todo_id = request.get_ref().id))]
    async fn get(&self, request: Request<pb::Id>) -> Result<Response<pb::Todo>, Status> {
        let todo = self.repository.select_todo(request.into_inner().id).await?;
        Ok(Response::new(todo.into()))
    }

    #[instrument(skip_all, fields(todo_id = request.get_ref().id))]
    async fn update(&self, request: Request<pb::Todo>) -> Result<Response<pb::Todo>, Status> {
        let message = request.into_inner();
        let id = message.id;
        let draft = TodoDraft::try_from(message)?;

        self.repository.update_todo(id, draft.clone()).await?;
        Ok(Response::new(draft.into_todo(id).into()))
    }

    #[instrument(skip_all, fields(todo_id = request.get_ref().id))]
    async fn delete(&self, request: Request<pb::Id>) -> Result<Response<pb::Todo>, Status> {
        let id = request.into_inner().id;

        let todo = self.repository.select_todo(id).await?;
        self.repository.delete_todo(id).await?;
        Ok(Response::new(todo.into()))
    }

    type ListStream = ReceiverStream<Result<pb::Todo, Status>>;

    async fn list(&self, _request: Request<()>) -> Result<Response<Self::ListStream>, Status> {
        let (tx, rx) = mpsc::channel(LIST_BUFFER);
        let repository = SharedRepository::clone(&self.repository);

        tokio::spawn(
            async move {
                // A disconnecting client closes the receiver; stop the query with it.
                let todos = tokio::select! {
                    result = repository.select_todos(None) => result,
                    () = tx.closed() => {
                        debug!("client disconnected before the listing was read");
                        return;
                    }
                };

                let todos = match todos {
                    Ok(todos) => todos,
                    Err(err) => {
                        let _ = tx.send(Err(err.into())).await;
                        return;
                    }
                };

                let total = todos.len();
                for (sent, todo) in todos.into_iter().enumerate() {
                    if tx.send(Ok(todo.into())).await.is_err() {
                        warn!(sent, total, "list stream aborted, client went away");
                        return;
                    }
                }
                debug!(total, "list stream finished");
            }
            .instrument(info_span!("grpc.list")),
        );

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
