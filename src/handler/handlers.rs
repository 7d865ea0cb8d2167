use std::time::Duration;

use actix_web::{
    HttpRequest, HttpResponse, Responder, ResponseError,
    web::{self, Redirect},
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::domain::{
    id::ID,
    models::SubmissionResponse,
    repository::{LinkRepository, RepoError},
};
use crate::handler::config::Config;
use crate::ratelimit::limiter::{Decision, RateLimiter};
use crate::validate::validator::{ValidationError, Validator};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Cannot parse JSON")]
    MalformedBody,
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Cannot shorten URLs on this domain")]
    SelfReferential,
    #[error("Rate limit exceeded")]
    RateLimited { reset_after: Duration },
    #[error("Invalid custom short code")]
    InvalidCustom,
    #[error("Custom short code already in use")]
    CustomIdTaken,
    #[error("URL not found")]
    NotFound,
    #[error("URL expired")]
    Expired,
    #[error("Storage error: {0}")]
    Storage(#[source] anyhow::Error),
}

impl From<ValidationError> for HandlerError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MalformedBody => HandlerError::MalformedBody,
            ValidationError::InvalidUrl => HandlerError::InvalidUrl,
            ValidationError::SelfReferential => HandlerError::SelfReferential,
        }
    }
}

impl From<RepoError> for HandlerError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::AlreadyExists => HandlerError::CustomIdTaken,
            RepoError::Other(e) => HandlerError::Storage(e),
        }
    }
}

impl ResponseError for HandlerError {
    fn error_response(&self) -> HttpResponse {
        let message = json!({"error": self.to_string()});
        match self {
            HandlerError::MalformedBody | HandlerError::InvalidUrl | HandlerError::InvalidCustom => {
                HttpResponse::BadRequest().json(message)
            }
            // Policy rejection, not a malformed request: the domain itself
            // cannot be shortened.
            HandlerError::SelfReferential => HttpResponse::ServiceUnavailable().json(message),
            HandlerError::RateLimited { reset_after } => HttpResponse::TooManyRequests().json(
                json!({"error": self.to_string(), "rate_limit_reset": reset_after.as_secs()}),
            ),
            HandlerError::CustomIdTaken => HttpResponse::Conflict().json(message),
            HandlerError::NotFound => HttpResponse::NotFound().json(message),
            HandlerError::Expired => HttpResponse::Gone().json(message),
            HandlerError::Storage(e) => {
                tracing::error!("Internal Server Error: {:?}", e);
                HttpResponse::InternalServerError().json(json!({"error": "Internal Server Error"}))
            }
        }
    }
}

pub struct Handler<T: LinkRepository, L: RateLimiter> {
    repo: T,
    limiter: L,
    validator: Validator,
    config: Config,
}

impl<T: LinkRepository, L: RateLimiter> Handler<T, L> {
    pub fn new(repo: T, limiter: L, validator: Validator, config: Config) -> Self {
        Handler {
            repo,
            limiter,
            validator,
            config,
        }
    }

    fn caller_key(req: &HttpRequest) -> String {
        req.connection_info()
            .realip_remote_addr()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub async fn livez(&self) -> impl Responder + use<T, L> {
        HttpResponse::Ok().body("Ok")
    }

    pub async fn readyz(&self) -> impl Responder + use<T, L> {
        HttpResponse::Ok().body("Ok")
    }

    pub async fn shorten(
        &self,
        req: HttpRequest,
        body: web::Bytes,
    ) -> Result<impl Responder + use<T, L>, HandlerError> {
        let caller = Self::caller_key(&req);
        let quota = match self.limiter.hit(&caller) {
            Decision::Allowed(quota) => quota,
            Decision::Limited { reset_after } => {
                tracing::info!(
                    event = "rate_limited",
                    caller = caller.as_str(),
                    reset_secs = reset_after.as_secs()
                );
                return Err(HandlerError::RateLimited { reset_after });
            }
        };

        let submission = self.validator.validate_body(&body)?;

        let expiry_secs = if submission.expiry == 0 {
            self.config.default_expiry_secs
        } else {
            submission.expiry
        };
        // An expiry past chrono's representable range never expires.
        let expires_at = chrono::Duration::try_seconds(expiry_secs.min(i64::MAX as u64) as i64)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));

        // Normalization guarantees an absolute URL here.
        let target = Url::parse(&submission.url).map_err(|_| HandlerError::InvalidUrl)?;
        let custom = match submission.custom.trim() {
            "" => None,
            alias if alias
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
            {
                Some(alias)
            }
            _ => return Err(HandlerError::InvalidCustom),
        };

        let link = self.repo.create(target, custom, expires_at).await?;

        tracing::info!(
            event = "link_created",
            id = link.id.as_str(),
            target = submission.url.as_str(),
            caller = caller.as_str(),
            expiry_secs = expiry_secs
        );

        Ok(web::Json(SubmissionResponse {
            url: submission.url,
            custom: format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                link.id.as_str()
            ),
            expiry: expiry_secs,
            rate_limit: quota.remaining,
            rate_limit_reset: quota.reset_after.as_secs(),
        }))
    }

    pub async fn redirect(
        &self,
        req: HttpRequest,
        path: web::Path<String>,
    ) -> Result<impl Responder + use<T, L>, HandlerError> {
        let id = ID::new(path.into_inner());
        let caller = Self::caller_key(&req);

        let link = self
            .repo
            .find_by_id(id.as_str())
            .await?
            .ok_or(HandlerError::NotFound)?;

        if let Some(expires_at) = link.expires_at {
            if expires_at <= Utc::now() {
                tracing::info!(
                    event = "link_access",
                    id = id.as_str(),
                    status_code = 410,
                    caller = caller.as_str()
                );
                return Err(HandlerError::Expired);
            }
        }

        tracing::info!(
            event = "link_access",
            id = id.as_str(),
            status_code = 308,
            caller = caller.as_str()
        );

        Ok(Redirect::to(link.target_url.to_string()).permanent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::db::DB;
    use crate::ratelimit::limiter::FixedWindowLimiter;
    use crate::validate::validator::{ReservedDomains, Scheme, StandardSyntax, Validator};
    use actix_web::http::StatusCode;
    use actix_web::http::header;
    use actix_web::{App, test};
    use std::sync::Arc;

    type TestHandler = Handler<Arc<DB>, FixedWindowLimiter>;

    fn handler_with_db(db: Arc<DB>, quota: u32, reserved: &[&str]) -> web::Data<TestHandler> {
        let validator = Validator::new(
            StandardSyntax,
            ReservedDomains::new(reserved.iter().copied()),
            Scheme::Http,
        );
        let config = Config {
            base_url: "http://localhost:8080".to_string(),
            port: 8080,
            default_expiry_secs: 86400,
        };
        web::Data::new(Handler::new(
            db,
            FixedWindowLimiter::new(quota, Duration::from_secs(60)),
            validator,
            config,
        ))
    }

    fn handler(quota: u32, reserved: &[&str]) -> web::Data<TestHandler> {
        handler_with_db(Arc::new(DB::new()), quota, reserved)
    }

    macro_rules! service {
        ($handler:expr) => {
            test::init_service(
                App::new()
                    .app_data($handler)
                    .route(
                        "/api/v1/shorten",
                        web::post().to(
                            |h: web::Data<TestHandler>, req: HttpRequest, body: web::Bytes| async move {
                                h.shorten(req, body).await
                            },
                        ),
                    )
                    .route(
                        "/{id}",
                        web::get().to(
                            |h: web::Data<TestHandler>,
                             req: HttpRequest,
                             path: web::Path<String>| async move {
                                h.redirect(req, path).await
                            },
                        ),
                    ),
            )
            .await
        };
    }

    fn shorten_request(body: &'static str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/v1/shorten")
            .set_payload(body)
    }

    #[actix_web::test]
    async fn shorten_normalizes_and_responds_with_quota() {
        let app = service!(handler(10, &[]));

        let resp: SubmissionResponse = test::call_and_read_body_json(
            &app,
            shorten_request(r#"{"url": "example.com/page"}"#).to_request(),
        )
        .await;

        assert_eq!(resp.url, "http://example.com/page");
        assert!(resp.custom.starts_with("http://localhost:8080/"));
        assert_eq!(resp.expiry, 86400);
        assert_eq!(resp.rate_limit, 9);
        assert!(resp.rate_limit_reset <= 60);
    }

    #[actix_web::test]
    async fn shorten_echoes_custom_alias_and_expiry() {
        let app = service!(handler(10, &[]));

        let resp: SubmissionResponse = test::call_and_read_body_json(
            &app,
            shorten_request(r#"{"url": "https://example.com", "custom": "mine", "expiry": 3600}"#).to_request(),
        )
        .await;

        assert_eq!(resp.custom, "http://localhost:8080/mine");
        assert_eq!(resp.expiry, 3600);
    }

    #[actix_web::test]
    async fn extreme_expiry_is_handled_gracefully() {
        let app = service!(handler(10, &[]));

        let resp: SubmissionResponse = test::call_and_read_body_json(
            &app,
            shorten_request(r#"{"url": "example.com", "expiry": 9223372036854775807}"#)
                .to_request(),
        )
        .await;

        assert_eq!(resp.url, "http://example.com");
        assert_eq!(resp.expiry, 9223372036854775807);
    }

    #[actix_web::test]
    async fn whitespace_alias_falls_back_to_generated_code() {
        let app = service!(handler(10, &[]));

        let resp: SubmissionResponse = test::call_and_read_body_json(
            &app,
            shorten_request(r#"{"url": "example.com", "custom": "   "}"#).to_request(),
        )
        .await;

        let code = resp.custom.rsplit('/').next().unwrap();
        assert!(!code.is_empty());
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[actix_web::test]
    async fn alias_with_path_separator_is_bad_request() {
        let app = service!(handler(10, &[]));

        for alias in [r#"{"url": "example.com", "custom": "a/b"}"#,
                      r#"{"url": "example.com", "custom": "a b"}"#] {
            let resp = test::call_service(&app, shorten_request(alias).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn alias_is_trimmed_before_storage() {
        let app = service!(handler(10, &[]));

        let resp: SubmissionResponse = test::call_and_read_body_json(
            &app,
            shorten_request(r#"{"url": "example.com/page", "custom": " padded "}"#).to_request(),
        )
        .await;
        assert_eq!(resp.custom, "http://localhost:8080/padded");

        let redirect =
            test::call_service(&app, test::TestRequest::get().uri("/padded").to_request()).await;
        assert_eq!(redirect.status(), StatusCode::PERMANENT_REDIRECT);
    }

    #[actix_web::test]
    async fn malformed_body_is_bad_request() {
        let app = service!(handler(10, &[]));

        let resp = test::call_service(&app, shorten_request(r#"{"url": "https://e"#).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn invalid_url_is_bad_request() {
        let app = service!(handler(10, &[]));

        let resp = test::call_service(&app, shorten_request(r#"{"url": "not a url"}"#).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn own_domain_is_service_unavailable() {
        let app = service!(handler(10, &["short.ly"]));

        let resp =
            test::call_service(&app, shorten_request(r#"{"url": "https://short.ly/abc"}"#).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn exhausted_quota_is_too_many_requests() {
        let app = service!(handler(1, &[]));

        let first = test::call_service(&app, shorten_request(r#"{"url": "example.com"}"#).to_request()).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = test::call_service(&app, shorten_request(r#"{"url": "example.com"}"#).to_request()).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[actix_web::test]
    async fn duplicate_custom_alias_is_conflict() {
        let app = service!(handler(10, &[]));

        let first = test::call_service(
            &app,
            shorten_request(r#"{"url": "example.com", "custom": "dup"}"#).to_request(),
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = test::call_service(
            &app,
            shorten_request(r#"{"url": "https://other.example", "custom": "dup"}"#).to_request(),
        )
        .await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn redirect_resolves_stored_link() {
        let app = service!(handler(10, &[]));

        let created = test::call_service(
            &app,
            shorten_request(r#"{"url": "example.com/page", "custom": "go"}"#).to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::OK);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/go").to_request()).await;
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "http://example.com/page"
        );
    }

    #[actix_web::test]
    async fn unknown_id_is_not_found() {
        let app = service!(handler(10, &[]));

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/missing").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn expired_link_is_gone() {
        let db = Arc::new(DB::new());
        let past = Utc::now() - chrono::Duration::seconds(5);
        db.create(
            Url::parse("http://example.com").unwrap(),
            Some("old"),
            Some(past),
        )
        .await
        .unwrap();

        let app = service!(handler_with_db(db, 10, &[]));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/old").to_request()).await;
        assert_eq!(resp.status(), StatusCode::GONE);
    }
}
