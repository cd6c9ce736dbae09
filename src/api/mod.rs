pub mod handlers;
pub mod types;

use crate::account::{CredentialService, PasswordHasherConfig, SessionKeys, UserDirectory};
use crate::config::{AppConfig, ServiceKind};
use crate::error::{ServiceError, INTERNAL_ERROR_MESSAGE};
use crate::resource::{Catalog, CollectionRecord, Order, ResourceService, Task};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Shared state for one deployment serving records of type `R`.
pub struct ApiState<R: CollectionRecord> {
    pub credentials: Arc<CredentialService>,
    pub records: Arc<ResourceService<R>>,
}

impl<R: CollectionRecord> Clone for ApiState<R> {
    fn clone(&self) -> Self {
        Self {
            credentials: self.credentials.clone(),
            records: self.records.clone(),
        }
    }
}

/// Build the full router: public account routes, the bearer-gated collection
/// routes, `/menu` when the record type has one, and the JSON fallback.
pub fn router<R: CollectionRecord>(state: ApiState<R>) -> Router {
    let protected = Router::new()
        .route(
            "/tareas",
            get(handlers::handle_list::<R>).post(handlers::handle_create::<R>),
        )
        .route(
            "/tareas/:id",
            put(handlers::handle_update::<R>).delete(handlers::handle_delete::<R>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<R>,
        ));

    let mut app = Router::new()
        .route("/register", post(handlers::handle_register::<R>))
        .route("/login", post(handlers::handle_login::<R>));

    if R::HAS_MENU {
        app = app.route("/menu", get(handlers::handle_menu::<R>));
    }

    app.merge(protected)
        .fallback(handlers::handle_not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(cors))
}

/// Bearer gate for protected routes. Attaches the decoded [`Claims`](crate::account::Claims)
/// to the request; they are not re-checked against the user directory.
async fn require_session<R: CollectionRecord>(
    State(state): State<ApiState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    // A header that is not valid UTF-8 counts as malformed, not missing
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or(""));

    let claims = state
        .credentials
        .keys()
        .authorize(header)
        .inspect_err(|e| tracing::warn!("Rejected {} {}: {}", req.method(), req.uri().path(), e))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Permissive CORS. Every OPTIONS request is answered here with 204.
async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    response
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(types::ErrorBody {
            error: INTERNAL_ERROR_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

/// Open both store files under `config.server.data_dir` and wire the router
/// for the configured service kind.
pub async fn build_app(config: &AppConfig) -> Result<Router, ServiceError> {
    let (keys, generated) = SessionKeys::from_config(
        config.auth.jwt_secret.as_deref(),
        config.auth.token_ttl_secs,
    );
    if generated {
        tracing::warn!(
            "⚠️  No signing secret configured (auth.jwt_secret / COMANDA_JWT_SECRET). \
             Using a random one; sessions will not survive a restart."
        );
    }

    let hasher = PasswordHasherConfig::new(config.auth.hash_cost);
    build_app_with(config, Arc::new(keys), hasher).await
}

/// [`build_app`] with explicit keys and hashing cost.
pub async fn build_app_with(
    config: &AppConfig,
    keys: Arc<SessionKeys>,
    hasher: PasswordHasherConfig,
) -> Result<Router, ServiceError> {
    let directory = UserDirectory::open(config.users_path(), hasher).await?;
    let credentials = Arc::new(CredentialService::new(directory, keys).await?);

    let app = match config.service.kind {
        ServiceKind::Tasks => {
            let records =
                ResourceService::<Task>::open(config.records_path(), Arc::new(Catalog::empty()))
                    .await?;
            router(ApiState {
                credentials,
                records: Arc::new(records),
            })
        }
        ServiceKind::Orders => {
            let records =
                ResourceService::<Order>::open(config.records_path(), Arc::new(Catalog::standard()))
                    .await?;
            router(ApiState {
                credentials,
                records: Arc::new(records),
            })
        }
    };
    Ok(app)
}

pub struct ApiServer {
    app: Router,
    bind_addr: String,
}

impl ApiServer {
    pub async fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            app: build_app(config).await?,
            bind_addr: config.bind_addr(),
        })
    }

    /// Serve until Ctrl-C.
    pub async fn start(self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.bind_addr).await?;
        tracing::info!("🌐 Server listening on {}", self.bind_addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down");
            })
            .await
    }
}
