use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{debug, info, warn};
use wardline_config::Config;
use wardline_contracts::{CallerClass, InboundRequest, Language, MetricsSnapshot};
use wardline_kernel::phone::mask_phone;
use wardline_kernel::render::{committed, Reply};
use wardline_kernel::replay::{evaluate, needs_caller, EngineContext, Outcome};
use wardline_kernel::tokens::{parse, TokenSequence};

mod commit;
mod error;
mod guard;
mod language;
mod listing;
mod metrics;
mod normalize;
mod store;

pub use error::{EngineError, StoreError, Throttle};
pub use normalize::Vendor;

use commit::CommitHandler;
use guard::AbuseGuard;
use language::LanguageStore;
use listing::{ListingCache, Listings};
use metrics::{Counter, Metrics};
use normalize::normalize;
use store::{SharedStore, StoreBackend};

pub async fn serve(cfg: Config) -> Result<(), String> {
    let addr: SocketAddr = cfg
        .server
        .listen_addr
        .parse()
        .map_err(|e| format!("invalid listen_addr: {e}"))?;

    let app = build_app(cfg).await?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind failed: {e}"))?;
    info!(%addr, "ussd gateway listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("serve failed: {e}"))
}

pub async fn build_app(cfg: Config) -> Result<Router, String> {
    let state = AppState::new(cfg)?;
    state.spawn_sweeper();
    Ok(Router::new()
        .route("/ussd", post(ussd))
        .route("/v1/ussd", post(ussd))
        .route("/v1/healthz", get(healthz))
        .route("/v1/metrics", get(metrics_view))
        .with_state(state))
}

#[derive(Clone)]
struct AppState {
    cfg: Arc<Config>,
    store: SharedStore,
    guard: Arc<AbuseGuard>,
    languages: Arc<LanguageStore>,
    listings: Arc<ListingCache>,
    metrics: Arc<Metrics>,
    commits: CommitHandler,
}

impl AppState {
    fn new(cfg: Config) -> Result<Self, String> {
        let backend = StoreBackend::open(&cfg.store.kind, cfg.store.sqlite_path.as_deref())
            .map_err(|e| e.to_string())?;
        let timeout = Duration::from_millis(cfg.store.timeout_ms);
        backend
            .set_busy_timeout(timeout * 2 / 3)
            .map_err(|e| e.to_string())?;
        let store = SharedStore::new(backend, timeout);
        let metrics = Arc::new(Metrics::default());
        Ok(Self {
            guard: Arc::new(AbuseGuard::new(&cfg.guard)),
            languages: Arc::new(LanguageStore::new(Duration::from_millis(
                cfg.language.ttl_ms,
            ))),
            listings: Arc::new(ListingCache::new(
                Duration::from_millis(cfg.menu.listing_ttl_ms),
                cfg.menu.listing_limit,
            )),
            commits: CommitHandler::new(store.clone(), metrics.clone(), &cfg.ward.locations),
            metrics,
            store,
            cfg: Arc::new(cfg),
        })
    }

    /// Periodic eviction of idle abuse counters and language contexts.
    fn spawn_sweeper(&self) {
        let guard = self.guard.clone();
        let languages = self.languages.clone();
        let period = Duration::from_millis(self.cfg.guard.sweep_interval_ms.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let counters = guard.sweep(now).await;
                let contexts = languages.sweep(now).await;
                if counters + contexts > 0 {
                    debug!(counters, contexts, "evicted idle entries");
                }
            }
        });
    }

    async fn handle(&self, content_type: Option<&str>, body: &[u8]) -> Reply {
        self.metrics.incr(Counter::Requests);
        let (vendor, request) =
            match normalize(content_type, body, &self.cfg.ward.default_country_code) {
                Ok(v) => v,
                Err(err) => {
                    self.metrics.incr(Counter::Malformed);
                    warn!(error = %err, "rejected gateway request");
                    return err.reply(Language::default());
                }
            };

        let tokens = parse(&request.raw_text);
        let now = Instant::now();
        debug!(
            vendor = vendor.as_str(),
            phone = %mask_phone(&request.phone_number),
            session_id = %request.session_id,
            depth = tokens.depth(),
            "ussd callback"
        );

        let requested = tokens.get(0).and_then(Language::from_selector);
        if let Err(throttle) = self
            .guard
            .check(&request.phone_number, &request.session_id, now)
            .await
        {
            self.metrics.incr(Counter::RateLimited);
            warn!(
                phone = %mask_phone(&request.phone_number),
                session_id = %request.session_id,
                limiter = ?throttle,
                "request throttled"
            );
            return EngineError::RateLimited(throttle).reply(requested.unwrap_or_default());
        }

        let stored = self.languages.resolve(&request.phone_number, now).await;
        let language = match requested {
            Some(language) => {
                self.languages
                    .set(&request.phone_number, language, now)
                    .await;
                language
            }
            None => stored.unwrap_or_default(),
        };

        debug!(language = language.code(), "language resolved");
        match self.respond(&request, &tokens, language, now).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(
                    phone = %mask_phone(&request.phone_number),
                    depth = tokens.depth(),
                    error = %err,
                    "ussd request ended with error"
                );
                err.reply(language)
            }
        }
    }

    async fn respond(
        &self,
        request: &InboundRequest,
        tokens: &TokenSequence,
        language: Language,
        now: Instant,
    ) -> Result<Reply, EngineError> {
        let listings = if tokens.depth() >= 2 {
            self.listings.snapshot(&self.store, now).await
        } else {
            Arc::new(Listings::default())
        };

        let menu = &self.cfg.menu;
        let mut ctx = EngineContext {
            language,
            caller: CallerClass::Unregistered,
            gate_unverified: menu.gate_unverified,
            ward_name: &self.cfg.ward.name,
            locations: &self.cfg.ward.locations,
            country_code: &self.cfg.ward.default_country_code,
            announcements: &listings.announcements,
            projects: &listings.projects,
            page_budget: menu.page_budget,
        };
        if needs_caller(tokens, &ctx) {
            let phone = request.phone_number.clone();
            let registration = self.store.call(move |s| s.find_by_phone(&phone)).await?;
            ctx.caller = CallerClass::from_status(registration.map(|r| r.status));
        }

        match evaluate(tokens, &ctx) {
            Outcome::Reply(reply) => Ok(reply),
            Outcome::Commit(commit) => {
                debug!(flow = commit.flow().as_str(), "flow completed");
                let result = self.commits.commit(&request.phone_number, commit).await?;
                Ok(committed(language, &result).fit(menu.page_budget))
            }
        }
    }
}

async fn ussd(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let reply = state.handle(content_type, &body).await;
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        reply.body(),
    )
}

async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn metrics_view(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
