use super::coordinator::{NodeCoordinator, Origin};
use crate::command::protocol::{
    CreateTableRequest, DatabaseRequest, DeleteRecordRequest, DeleteTableRequest, InsertRequest,
    Notification, SearchParams, SelectParams, StatusResponse, UpdateRequest,
};
use crate::command::types::{Command, CommandOutput};
use crate::error::StoreError;

use axum::{
    Extension, Json,
    extract::{Query, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Unwraps a JSON body; any extractor rejection is an `InvalidCommand`.
fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, StoreError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| StoreError::InvalidCommand(rejection.body_text()))
}

async fn respond(coordinator: &NodeCoordinator, command: Result<Command, StoreError>) -> Response {
    let command = match command {
        Ok(command) => command,
        Err(e) => return e.into_response(),
    };

    let action = command.action();
    match coordinator.apply(command, Origin::ClientRequest).await {
        Ok(CommandOutput::Ack(message)) => (StatusCode::OK, message).into_response(),
        Ok(CommandOutput::Rows(rows)) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            tracing::debug!("Client {} failed: {}", action, e);
            e.into_response()
        }
    }
}

pub async fn handle_create_database(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    body: Result<Json<DatabaseRequest>, JsonRejection>,
) -> Response {
    let command = payload(body).map(|req| Command::CreateDatabase {
        db_name: req.db_name,
    });
    respond(&coordinator, command).await
}

pub async fn handle_drop_database(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    body: Result<Json<DatabaseRequest>, JsonRejection>,
) -> Response {
    let command = payload(body).map(|req| Command::DropDatabase {
        db_name: req.db_name,
    });
    respond(&coordinator, command).await
}

pub async fn handle_create_table(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    body: Result<Json<CreateTableRequest>, JsonRejection>,
) -> Response {
    respond(&coordinator, payload(body).map(Command::from)).await
}

pub async fn handle_insert(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    body: Result<Json<InsertRequest>, JsonRejection>,
) -> Response {
    respond(&coordinator, payload(body).map(Command::from)).await
}

pub async fn handle_update(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Response {
    respond(&coordinator, payload(body).map(Command::from)).await
}

pub async fn handle_delete_record(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    body: Result<Json<DeleteRecordRequest>, JsonRejection>,
) -> Response {
    respond(&coordinator, payload(body).map(Command::from)).await
}

pub async fn handle_delete_table(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    body: Result<Json<DeleteTableRequest>, JsonRejection>,
) -> Response {
    respond(&coordinator, payload(body).map(Command::from)).await
}

pub async fn handle_select(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    Query(params): Query<SelectParams>,
) -> Response {
    respond(&coordinator, Command::try_from(params)).await
}

pub async fn handle_search(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    Query(params): Query<SearchParams>,
) -> Response {
    respond(&coordinator, Command::try_from(params)).await
}

/// Generic client entry point taking a tagged command.
pub async fn handle_execute(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    respond(&coordinator, payload(body).and_then(Command::from_json)).await
}

/// Replica-facing endpoint. Answers with a bare status only.
pub async fn handle_replicate(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> StatusCode {
    let command = match payload(body).and_then(Command::from_json) {
        Ok(command) => command,
        Err(e) => {
            tracing::error!("Rejected replicated command: {}", e);
            return e.status_code();
        }
    };

    let action = command.action();
    match coordinator
        .apply(command, Origin::ReplicationInbound)
        .await
    {
        Ok(_) => {
            tracing::debug!("Applied replicated {}", action);
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!("Failed to apply replicated {}: {}", action, e);
            e.status_code()
        }
    }
}

pub async fn handle_ping() -> (StatusCode, &'static str) {
    (StatusCode::OK, "pong")
}

pub async fn handle_status(
    Extension(coordinator): Extension<Arc<NodeCoordinator>>,
) -> Json<StatusResponse> {
    let state = coordinator.state();

    Json(StatusResponse {
        node_id: state.node_id.clone(),
        address: state.address.clone(),
        role: state.role().to_string(),
        primary_address: state.primary_address.clone(),
        peers: state.peers.clone(),
        tables: coordinator.table_names().await,
        databases: coordinator.database_names().await,
    })
}

pub async fn handle_notify(
    body: Result<Json<Notification>, JsonRejection>,
) -> Result<&'static str, StoreError> {
    let notification = payload(body)?;
    if notification.message.is_empty() {
        return Err(StoreError::InvalidCommand("empty notification".to_string()));
    }

    tracing::info!("Notification received: {}", notification.message);
    Ok("Notification received")
}
