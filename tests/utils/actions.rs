use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use std::time::Duration;
use tower::ServiceExt;

use batepapo::{participant, MessageModel, ParticipantModel};

use super::setup::TestSetup;

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

impl TestSetup {
    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn register(&self, name: &str) -> StatusCode {
        let request = Request::builder()
            .method("POST")
            .uri("/participants")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "name": name }).to_string()))
            .unwrap();
        self.send(request).await.status()
    }

    pub async fn list_participants(&self) -> Vec<ParticipantModel> {
        let request = Request::builder()
            .uri("/participants")
            .body(Body::empty())
            .unwrap();
        let response = self.send(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    pub async fn participant_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .list_participants()
            .await
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        names
    }

    pub async fn post_message(
        &self,
        user: &str,
        to: &str,
        text: &str,
        message_type: &str,
    ) -> StatusCode {
        let body = serde_json::json!({ "to": to, "text": text, "type": message_type });
        let request = Request::builder()
            .method("POST")
            .uri("/messages")
            .header("content-type", "application/json")
            .header("user", user)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await.status()
    }

    pub async fn ping(&self, user: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().method("POST").uri("/status");
        if let Some(user) = user {
            builder = builder.header("user", user);
        }
        self.send(builder.body(Body::empty()).unwrap()).await.status()
    }

    pub async fn poll_raw(&self, user: Option<&str>, limit: Option<&str>) -> Response {
        let uri = match limit {
            Some(limit) => format!("/messages?limit={}", limit),
            None => "/messages".to_string(),
        };
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header("user", user);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn poll(&self, user: Option<&str>, limit: Option<&str>) -> Vec<MessageModel> {
        let response = self.poll_raw(user, limit).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    pub async fn sweep(&self, inactivity_threshold: Duration) -> Vec<String> {
        participant::sweep_inactive_participants(
            &self.participants,
            &self.messages,
            inactivity_threshold,
        )
        .await
        .unwrap()
    }
}
