use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::MessageModel,
    service::MessageService,
    types::{MessageCreateRequest, MessagesQuery},
};
use crate::shared::{identity_from_headers, AppError, AppState};

fn service(state: &AppState) -> MessageService {
    MessageService::new(
        Arc::clone(&state.message_repository),
        Arc::clone(&state.participant_repository),
        state.chat_config,
    )
}

/// HTTP handler for posting a message
///
/// POST /messages
/// The `user` header names the sender, who must be registered
#[instrument(name = "create_message", skip(state, headers, payload))]
pub async fn create_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<MessageCreateRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(request) = payload?;
    let sender = identity_from_headers(&headers);

    service(&state).post(sender.as_deref(), request).await?;

    Ok(StatusCode::CREATED)
}

/// HTTP handler for polling messages
///
/// GET /messages?limit=N
/// Returns the messages visible to the `user` header, oldest first
#[instrument(name = "list_messages", skip(state, headers, query))]
pub async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<Vec<MessageModel>>, AppError> {
    let Query(query) = query?;
    let viewer = identity_from_headers(&headers);

    let messages = service(&state)
        .list(viewer, query.limit.as_deref())
        .await?;

    info!(message_count = messages.len(), "Messages listed");

    Ok(Json(messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::models::{MessageType, BROADCAST_TARGET};
    use crate::participant::models::ParticipantModel;
    use crate::participant::repository::InMemoryParticipantRepository;
    use crate::shared::test_utils::{AppStateBuilder, UnavailableMessageRepository};
    use axum::{
        body::Body,
        http::{HeaderValue, Request},
        routing::get,
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/messages", get(list_messages).post(create_message))
            .with_state(state)
    }

    fn state_with_ana_and_bob() -> AppStateBuilder {
        let participants = Arc::new(InMemoryParticipantRepository::with_participants(vec![
            ParticipantModel::new("Ana".to_string()),
            ParticipantModel::new("Bob".to_string()),
        ]));
        AppStateBuilder::new().with_participant_repository(participants)
    }

    fn post_message(user: Option<&str>, body: String) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/messages")
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("user", user);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get_messages(user: Option<&str>, query: &str) -> Request<Body> {
        let mut builder = Request::builder().uri(format!("/messages{}", query));
        if let Some(user) = user {
            builder = builder.header("user", user);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn read_messages(response: axum::response::Response) -> Vec<MessageModel> {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_create_message_handler() {
        let app = app(state_with_ana_and_bob().build());

        let body = format!(
            r#"{{"to": "{}", "text": "oi", "type": "message"}}"#,
            BROADCAST_TARGET
        );
        let response = app
            .clone()
            .oneshot(post_message(Some("Ana"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(get_messages(Some("Bob"), "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let messages = read_messages(response).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "Ana");
        assert_eq!(messages[0].message_type, MessageType::Message);
    }

    #[tokio::test]
    async fn test_create_message_handler_rejections() {
        let cases = [
            (Some("Ana"), r#"{"to": "Todos", "text": "oi"}"#),
            (Some("Ana"), r#"{"to": "Todos", "text": "oi", "type": "status"}"#),
            (Some("Ana"), r#"{"to": "Todos", "text": "", "type": "message"}"#),
            (Some("Ana"), r#"{"to": "Todos", "text": "oi""#),
            (Some("ghost"), r#"{"to": "Todos", "text": "oi", "type": "message"}"#),
            (None, r#"{"to": "Todos", "text": "oi", "type": "message"}"#),
        ];

        for (user, body) in cases {
            let app = app(state_with_ana_and_bob().build());
            let response = app
                .oneshot(post_message(user, body.to_string()))
                .await
                .unwrap();
            assert_eq!(
                response.status(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "user {user:?} body {body} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_list_messages_handler_private_visibility() {
        let app = app(state_with_ana_and_bob().build());
        let body = r#"{"to": "Bob", "text": "psiu", "type": "private_message"}"#.to_string();
        app.clone()
            .oneshot(post_message(Some("Ana"), body))
            .await
            .unwrap();

        for (viewer, expected) in [(Some("Bob"), 1), (Some("Ana"), 1), (Some("Cid"), 0), (None, 0)] {
            let response = app
                .clone()
                .oneshot(get_messages(viewer, ""))
                .await
                .unwrap();
            assert_eq!(read_messages(response).await.len(), expected);
        }
    }

    #[tokio::test]
    async fn test_list_messages_handler_limit() {
        let app = app(state_with_ana_and_bob().build());
        for text in ["1", "2", "3"] {
            let body = format!(r#"{{"to": "Todos", "text": "{}", "type": "message"}}"#, text);
            app.clone()
                .oneshot(post_message(Some("Ana"), body))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(get_messages(Some("Ana"), "?limit=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_messages(response).await.len(), 2);

        let response = app.oneshot(get_messages(Some("Ana"), "")).await.unwrap();
        assert_eq!(read_messages(response).await.len(), 3);
    }

    #[tokio::test]
    async fn test_list_messages_handler_bad_limit() {
        for query in [
            "?limit=0",
            "?limit=-1",
            "?limit=abc",
            "?limit=",
            "?limit=1&limit=2",
        ] {
            let app = app(AppStateBuilder::new().build());
            let response = app.oneshot(get_messages(Some("Ana"), query)).await.unwrap();
            assert_eq!(
                response.status(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "query {query} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_messages_with_non_ascii_identity() {
        let participants = Arc::new(InMemoryParticipantRepository::with_participants(vec![
            ParticipantModel::new("João".to_string()),
        ]));
        let app = app(
            AppStateBuilder::new()
                .with_participant_repository(participants)
                .build(),
        );
        let joao = HeaderValue::from_bytes("João".as_bytes()).unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/messages")
            .header("content-type", "application/json")
            .header("user", joao.clone())
            .body(Body::from(
                r#"{"to": "Bob", "text": "psiu", "type": "private_message"}"#,
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = Request::builder()
            .uri("/messages")
            .header("user", joao)
            .body(Body::empty())
            .unwrap();
        let messages = read_messages(app.oneshot(request).await.unwrap()).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "João");
    }

    #[tokio::test]
    async fn test_list_messages_handler_storage_error() {
        let state = AppStateBuilder::new()
            .with_message_repository(Arc::new(UnavailableMessageRepository))
            .build();

        let response = app(state).oneshot(get_messages(None, "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
