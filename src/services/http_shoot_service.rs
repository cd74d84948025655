//! [`ShootService`] backed by the live shoot REST API.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use validator::Validate;

use crate::{
    dto::{
        requests::{
            CreateShootRequest, CreateShootResponse, JoinShootRequest, LeaveShootRequest,
            ScoreSubmission, ShootResponse,
        },
        shoot::Shoot,
    },
    error::ServiceError,
    services::shoot_service::{ServiceResult, ShootService},
};

const SHOOTS: &str = "shoots";

/// HTTP client for the shoot service; cheap to clone.
#[derive(Clone)]
pub struct HttpShootService {
    client: Client,
    base_url: Arc<str>,
}

impl HttpShootService {
    /// Build a client for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> ServiceResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| ServiceError::Transport(format!("failed to build client: {err}")))?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(base_url.trim_end_matches('/')),
        })
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path))
    }

    async fn send<B, T>(&self, method: Method, path: String, body: Option<&B>) -> ServiceResult<Option<T>>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        let mut builder = self.request(method, &path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| ServiceError::Transport(format!("`{path}`: {err}")))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ServiceError::Transport(format!("`{path}`: {err}")))?;

        debug!(path = %path, status = status.as_u16(), "shoot service response");
        interpret(&path, status, &bytes)
    }

    /// Like [`Self::send`], but a missing shoot is an error.
    async fn send_existing<B, T>(&self, code: &str, path: String, body: &B) -> ServiceResult<T>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body))
            .await?
            .ok_or_else(|| ServiceError::NotFound(code.to_string()))
    }
}

fn shoot_path(code: &str) -> String {
    format!("{SHOOTS}/{code}")
}

fn action_path(code: &str, action: &str) -> String {
    format!("{SHOOTS}/{code}/{action}")
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Map a response to a decoded body. `404` yields `Ok(None)`, other client errors
/// become [`ServiceError::Rejected`] with the server's message when it sent one.
fn interpret<T>(path: &str, status: StatusCode, body: &[u8]) -> ServiceResult<Option<T>>
where
    T: DeserializeOwned,
{
    match status {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => {
            serde_json::from_slice(body)
                .map(Some)
                .map_err(|err| ServiceError::Decode {
                    path: path.to_string(),
                    message: err.to_string(),
                })
        }
        status if status.is_client_error() => {
            let message = serde_json::from_slice::<ErrorBody>(body)
                .ok()
                .and_then(|body| body.message.or(body.error))
                .unwrap_or_else(|| status.to_string());
            Err(ServiceError::Rejected(message))
        }
        other => Err(ServiceError::Status {
            path: path.to_string(),
            status: other.as_u16(),
        }),
    }
}

impl ShootService for HttpShootService {
    fn create_shoot(
        &self,
        creator_name: String,
        title: Option<String>,
    ) -> BoxFuture<'static, ServiceResult<CreateShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            let request = CreateShootRequest {
                creator_name,
                title,
            };
            request.validate()?;
            this.send(Method::POST, SHOOTS.to_string(), Some(&request))
                .await?
                .ok_or_else(|| ServiceError::Status {
                    path: SHOOTS.to_string(),
                    status: StatusCode::NOT_FOUND.as_u16(),
                })
        })
    }

    fn join_shoot(
        &self,
        code: String,
        archer_name: String,
        round_name: String,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            let request = JoinShootRequest {
                code,
                archer_name,
                round_name,
            };
            request.validate()?;
            this.send_existing(&request.code, action_path(&request.code, "join"), &request)
                .await
        })
    }

    fn get_shoot(&self, code: String) -> BoxFuture<'static, ServiceResult<Option<Shoot>>> {
        let this = self.clone();
        Box::pin(async move {
            this.send::<(), Shoot>(Method::GET, shoot_path(&code), None)
                .await
        })
    }

    fn leave_shoot(
        &self,
        code: String,
        archer_name: String,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            let request = LeaveShootRequest { archer_name };
            this.send_existing(&code, action_path(&code, "leave"), &request)
                .await
        })
    }

    fn update_score(
        &self,
        submission: ScoreSubmission,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            submission.validate()?;
            let code = submission.code.clone();
            this.send_existing(&code, action_path(&code, "score"), &submission)
                .await
        })
    }

    fn finish_shoot(
        &self,
        submission: ScoreSubmission,
    ) -> BoxFuture<'static, ServiceResult<ShootResponse>> {
        let this = self.clone();
        Box::pin(async move {
            submission.validate()?;
            let code = submission.code.clone();
            this.send_existing(&code, action_path(&code, "finish"), &submission)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let service = HttpShootService::new("http://localhost:8080/api/").unwrap();
        assert_eq!(service.base_url(), "http://localhost:8080/api");
        assert_eq!(
            service.url(&action_path("AB12", "join")),
            "http://localhost:8080/api/shoots/AB12/join"
        );
        assert_eq!(service.url(&shoot_path("AB12")), "http://localhost:8080/api/shoots/AB12");
    }

    #[test]
    fn success_bodies_are_decoded() {
        let body = br#"{"success":true,"shoot":{"code":"AB12","participants":[
            {"archerName":"Alice","totalScore":30,"roundName":"national","arrowsShot":6}
        ]}}"#;

        let response: ShootResponse = interpret("shoots/AB12/join", StatusCode::OK, body)
            .unwrap()
            .unwrap();

        let shoot = response.into_confirmed().unwrap();
        assert_eq!(shoot.participant("Alice").unwrap().total_score, 30);
    }

    #[test]
    fn not_found_is_none() {
        let decoded: Option<Shoot> = interpret("shoots/ZZ99", StatusCode::NOT_FOUND, b"").unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn client_errors_carry_the_server_message() {
        let err = interpret::<ShootResponse>(
            "shoots/AB12/join",
            StatusCode::CONFLICT,
            br#"{"message":"archer already joined"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(message) if message == "archer already joined"));
    }

    #[test]
    fn server_errors_keep_the_status() {
        let err = interpret::<Shoot>("shoots/AB12", StatusCode::BAD_GATEWAY, b"").unwrap_err();
        assert!(matches!(err, ServiceError::Status { status: 502, .. }));
    }

    #[test]
    fn malformed_bodies_are_decode_errors() {
        let err = interpret::<Shoot>("shoots/AB12", StatusCode::OK, b"{not json").unwrap_err();
        assert!(matches!(err, ServiceError::Decode { path, .. } if path == "shoots/AB12"));
    }
}
