//! Node Module Tests
//!
//! ## Test Scopes
//! - **Coordinator**: command routing, role permissions, write policy and the
//!   no-rebroadcast rule for replicated commands.
//! - **Concurrency**: parallel writes under the node lock.
//! - **HTTP surface**: handlers driven through the router with `oneshot`.
//!
//! *Note: multi-node replication and failover live in `tests/cluster.rs`.*

#[cfg(test)]
mod tests {
    use crate::command::types::{ColumnFilter, Command, CommandOutput};
    use crate::error::StoreError;
    use crate::membership::types::NodeRuntimeState;
    use crate::node::coordinator::{NodeCoordinator, Origin, WritePolicy};
    use crate::node::server::router;
    use crate::replication::broadcaster::ReplicationBroadcaster;
    use crate::storage::table::Row;
    use axum::{
        Json, Router,
        body::Body,
        http::{Request, StatusCode},
        routing::post,
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::ServiceExt;

    type Inbox = Arc<Mutex<Vec<Value>>>;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn coordinator(is_primary: bool, peers: Vec<String>, policy: WritePolicy) -> Arc<NodeCoordinator> {
        let state = Arc::new(NodeRuntimeState::new(
            if is_primary { "primary" } else { "replica" },
            "127.0.0.1:1",
            is_primary,
            peers,
            "127.0.0.1:1",
        ));
        NodeCoordinator::new(
            state,
            ReplicationBroadcaster::new(Duration::from_secs(1)),
            policy,
        )
    }

    fn primary() -> Arc<NodeCoordinator> {
        coordinator(true, vec![], WritePolicy::Permissive)
    }

    fn replica() -> Arc<NodeCoordinator> {
        coordinator(false, vec![], WritePolicy::Permissive)
    }

    fn create_users() -> Command {
        Command::CreateTable {
            table_name: "users".to_string(),
            columns: vec!["name".to_string(), "age".to_string()],
        }
    }

    fn insert_user(id: &str, name: &str, age: &str) -> Command {
        Command::Insert {
            table_name: "users".to_string(),
            row_id: id.to_string(),
            data: row(&[("name", name), ("age", age)]),
        }
    }

    fn select_users() -> Command {
        Command::Select {
            table_name: "users".to_string(),
            filter: None,
        }
    }

    async fn rows_of(node: &NodeCoordinator, command: Command) -> Vec<Row> {
        match node.apply(command, Origin::ClientRequest).await.unwrap() {
            CommandOutput::Rows(rows) => rows,
            other => panic!("Expected rows, got {:?}", other),
        }
    }

    /// Fake peer recording commands posted to `/replicate`.
    async fn spawn_recording_peer() -> (SocketAddr, Inbox) {
        let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
        let sink = inbox.clone();
        let app = Router::new().route(
            "/replicate",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    StatusCode::OK
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (addr, inbox)
    }

    async fn wait_for_len(inbox: &Inbox, len: usize) {
        for _ in 0..100 {
            if inbox.lock().unwrap().len() >= len {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    // ============================================================
    // COORDINATOR: ROUTING
    // ============================================================

    #[tokio::test]
    async fn test_users_example_through_coordinator() {
        let node = primary();

        node.apply(create_users(), Origin::ClientRequest).await.unwrap();
        node.apply(insert_user("1", "A", "30"), Origin::ClientRequest)
            .await
            .unwrap();

        assert_eq!(
            rows_of(&node, select_users()).await,
            vec![row(&[("name", "A"), ("age", "30")])]
        );

        let missing = node
            .apply(
                Command::Insert {
                    table_name: "users".to_string(),
                    row_id: "1".to_string(),
                    data: row(&[("name", "A")]),
                },
                Origin::ClientRequest,
            )
            .await;
        assert!(matches!(missing, Err(StoreError::MissingColumn { .. })));
    }

    #[tokio::test]
    async fn test_write_returns_acknowledgment() {
        let node = primary();

        let output = node.apply(create_users(), Origin::ClientRequest).await.unwrap();

        assert_eq!(
            output,
            CommandOutput::Ack("Table users created successfully".to_string())
        );
    }

    #[tokio::test]
    async fn test_search_filters_rows() {
        let node = primary();
        node.apply(create_users(), Origin::ClientRequest).await.unwrap();
        node.apply(insert_user("1", "A", "30"), Origin::ClientRequest)
            .await
            .unwrap();
        node.apply(insert_user("2", "B", "40"), Origin::ClientRequest)
            .await
            .unwrap();

        let rows = rows_of(
            &node,
            Command::Select {
                table_name: "users".to_string(),
                filter: Some(ColumnFilter {
                    column: "age".to_string(),
                    value: "40".to_string(),
                }),
            },
        )
        .await;

        assert_eq!(rows, vec![row(&[("name", "B"), ("age", "40")])]);
    }

    #[tokio::test]
    async fn test_failure_kinds_propagate_unchanged() {
        let node = primary();

        let select = node.apply(select_users(), Origin::ClientRequest).await;
        assert!(matches!(select, Err(StoreError::NotFound(_))));

        node.apply(create_users(), Origin::ClientRequest).await.unwrap();
        let again = node.apply(create_users(), Origin::ClientRequest).await;
        assert!(matches!(again, Err(StoreError::AlreadyExists(_))));

        let update = node
            .apply(
                Command::Update {
                    table_name: "users".to_string(),
                    row_id: "ghost".to_string(),
                    new_data: row(&[("age", "1")]),
                },
                Origin::ClientRequest,
            )
            .await;
        assert!(matches!(update, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_command_is_rejected_before_apply() {
        let node = primary();

        let result = node
            .apply(
                Command::CreateTable {
                    table_name: "t".to_string(),
                    columns: vec![],
                },
                Origin::ClientRequest,
            )
            .await;

        assert!(matches!(result, Err(StoreError::InvalidCommand(_))));
        assert!(node.table_names().await.is_empty());
    }

    // ============================================================
    // COORDINATOR: PERMISSIONS
    // ============================================================

    #[tokio::test]
    async fn test_replica_rejects_database_commands_from_clients() {
        let node = replica();

        let create = node
            .apply(
                Command::CreateDatabase {
                    db_name: "shop".to_string(),
                },
                Origin::ClientRequest,
            )
            .await;

        assert!(matches!(create, Err(StoreError::PermissionDenied(_))));
        assert!(node.database_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_replica_accepts_replicated_database_commands() {
        let node = replica();

        node.apply(
            Command::CreateDatabase {
                db_name: "shop".to_string(),
            },
            Origin::ReplicationInbound,
        )
        .await
        .unwrap();

        assert_eq!(node.database_names().await, vec!["shop".to_string()]);
    }

    #[tokio::test]
    async fn test_permissive_replica_accepts_table_writes() {
        let node = replica();

        node.apply(create_users(), Origin::ClientRequest).await.unwrap();
        node.apply(insert_user("1", "A", "30"), Origin::ClientRequest)
            .await
            .unwrap();

        assert_eq!(rows_of(&node, select_users()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_primary_only_policy_rejects_replica_writes_but_not_reads() {
        let node = coordinator(false, vec![], WritePolicy::PrimaryOnly);

        let write = node.apply(create_users(), Origin::ClientRequest).await;
        assert!(matches!(write, Err(StoreError::PermissionDenied(_))));

        // Replicated writes still land.
        node.apply(create_users(), Origin::ReplicationInbound)
            .await
            .unwrap();
        assert!(rows_of(&node, select_users()).await.is_empty());
    }

    #[tokio::test]
    async fn test_promoted_replica_accepts_database_commands() {
        let node = replica();
        node.state().promote();

        node.apply(
            Command::CreateDatabase {
                db_name: "shop".to_string(),
            },
            Origin::ClientRequest,
        )
        .await
        .unwrap();
    }

    // ============================================================
    // COORDINATOR: REPLICATION HAND-OFF
    // ============================================================

    #[tokio::test]
    async fn test_primary_replicates_client_writes_only() {
        let (peer, inbox) = spawn_recording_peer().await;
        let node = coordinator(true, vec![peer.to_string()], WritePolicy::Permissive);

        node.apply(create_users(), Origin::ClientRequest).await.unwrap();
        node.apply(select_users(), Origin::ClientRequest).await.unwrap();
        node.apply(insert_user("1", "A", "30"), Origin::ClientRequest)
            .await
            .unwrap();
        wait_for_len(&inbox, 2).await;
        // Give a stray select a chance to show up before asserting.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let received: Vec<Command> = inbox
            .lock()
            .unwrap()
            .iter()
            .map(|v| Command::from_json(v.clone()).unwrap())
            .collect();
        assert_eq!(received.len(), 2);
        assert!(received.contains(&create_users()));
        assert!(received.contains(&insert_user("1", "A", "30")));
    }

    #[tokio::test]
    async fn test_failed_local_apply_is_not_replicated() {
        let (peer, inbox) = spawn_recording_peer().await;
        let node = coordinator(true, vec![peer.to_string()], WritePolicy::Permissive);

        let result = node
            .apply(insert_user("1", "A", "30"), Origin::ClientRequest)
            .await;
        assert!(result.is_err());
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(inbox.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inbound_replication_is_not_rebroadcast() {
        let (peer, inbox) = spawn_recording_peer().await;
        let node = coordinator(true, vec![peer.to_string()], WritePolicy::Permissive);

        node.apply(create_users(), Origin::ReplicationInbound)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(inbox.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replica_does_not_replicate_client_writes() {
        let (peer, inbox) = spawn_recording_peer().await;
        let node = coordinator(false, vec![peer.to_string()], WritePolicy::Permissive);

        node.apply(create_users(), Origin::ClientRequest).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(inbox.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_client_response_does_not_wait_for_unreachable_peer() {
        // Non-routable address: the send would hang until its timeout.
        let node = coordinator(true, vec!["10.255.255.1:9".to_string()], WritePolicy::Permissive);

        let started = std::time::Instant::now();
        node.apply(create_users(), Origin::ClientRequest).await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(200));
    }

    // ============================================================
    // CONCURRENCY
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_are_not_lost() {
        let node = primary();
        node.apply(create_users(), Origin::ClientRequest).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..200 {
            let node = node.clone();
            handles.push(tokio::spawn(async move {
                node.apply(
                    insert_user(&i.to_string(), &format!("user-{}", i), "1"),
                    Origin::ClientRequest,
                )
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(rows_of(&node, select_users()).await.len(), 200);
    }

    // ============================================================
    // HTTP SURFACE
    // ============================================================

    #[tokio::test]
    async fn test_http_create_insert_select() {
        let app = router(primary());

        let (status, body) = send(
            app.clone(),
            post_json("/create_table", json!({"table_name": "users", "columns": ["name", "age"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Table users created successfully");

        let (status, _) = send(
            app.clone(),
            post_json(
                "/insert",
                json!({"table_name": "users", "row_id": "1", "data": {"name": "A", "age": "30"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app.clone(), get("/select?table=users")).await;
        assert_eq!(status, StatusCode::OK);
        let rows: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(rows, json!([{"name": "A", "age": "30"}]));

        let (status, body) = send(app, get("/search?table=users&column=name&value=Z")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_http_errors_carry_message_text() {
        let app = router(primary());

        let (status, body) = send(app.clone(), get("/select?table=ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("ghost"));

        let (status, body) = send(app.clone(), get("/search?table=users")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("missing parameters"));

        send(
            app.clone(),
            post_json("/create_table", json!({"table_name": "users", "columns": ["name", "age"]})),
        )
        .await;
        let (status, body) = send(
            app,
            post_json(
                "/insert",
                json!({"table_name": "users", "row_id": "1", "data": {"name": "A"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("age"));
    }

    #[tokio::test]
    async fn test_http_malformed_body_is_invalid_command() {
        let app = router(primary());
        send(
            app.clone(),
            post_json("/create_table", json!({"table_name": "users", "columns": ["name", "age"]})),
        )
        .await;

        let (status, body) = send(
            app.clone(),
            post_json(
                "/insert",
                json!({"table_name": "users", "data": {"name": "A", "age": "30"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("invalid command"));
        assert!(body.contains("row_id"));

        // Same shape through the generic route gives the same status.
        let (status, _) = send(
            app.clone(),
            post_json(
                "/execute",
                json!({"action": "insert", "table_name": "users", "data": {"name": "A", "age": "30"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // A schema violation keeps its own status.
        let (status, _) = send(
            app.clone(),
            post_json(
                "/insert",
                json!({"table_name": "users", "row_id": "1", "data": {"name": "A"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            app.clone(),
            post_json("/create_table", json!({"table_name": "t", "columns": "name"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let not_json = Request::builder()
            .method("POST")
            .uri("/delete_table")
            .header("content-type", "application/json")
            .body(Body::from("{table_name"))
            .unwrap();
        let (status, _) = send(app.clone(), not_json).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(app, post_json("/notify", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_http_replica_forbids_drop_database() {
        let app = router(replica());

        let (status, body) = send(app, post_json("/drop_database", json!({"db_name": "shop"}))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("permission denied"));
    }

    #[tokio::test]
    async fn test_http_execute_rejects_unknown_action() {
        let app = router(primary());

        let (status, _) = send(app, post_json("/execute", json!({"action": "explode"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_http_replicate_returns_bare_status() {
        let node = replica();
        let app = router(node.clone());

        let (status, body) = send(
            app.clone(),
            post_json(
                "/replicate",
                json!({"action": "create_table", "table_name": "users", "columns": ["name"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(node.table_names().await, vec!["users".to_string()]);

        let (status, body) = send(
            app,
            post_json("/replicate", json!({"action": "select", "table_name": "users"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty(), "Replica endpoint never returns a payload");
    }

    #[tokio::test]
    async fn test_http_ping_and_status() {
        let node = replica();
        let app = router(node.clone());

        let (status, _) = send(app.clone(), get("/ping")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app, get("/status")).await;
        assert_eq!(status, StatusCode::OK);
        let status_body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(status_body["role"], "replica");
        assert_eq!(status_body["node_id"], "replica");
    }

    #[tokio::test]
    async fn test_http_notify() {
        let app = router(replica());

        let (status, body) =
            send(app.clone(), post_json("/notify", json!({"message": "hello"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Notification received");

        let (status, _) = send(app, post_json("/notify", json!({"message": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
