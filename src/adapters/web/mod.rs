//! REST and push adapter.
//!
//! JSON API under `/api`, a `/health` check and the `/ws` price stream.

mod auth;
mod error;
mod handlers;
mod ws;

pub use auth::{AdminUser, CurrentUser};
pub use error::{WebError, status_from_error};

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::adapters::push_hub::PushHub;
use crate::domain::access::AccessGateway;
use crate::domain::admin::AdminService;
use crate::domain::goal_tracker::GoalTracker;
use crate::domain::instrument_cache::InstrumentCache;
use crate::domain::ledger::{Ledger, UserLocks};
use crate::domain::position_book::PositionBook;
use crate::domain::quotes::QuoteRouter;
use crate::ports::credential_port::CredentialPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::store_port::StorePort;
use crate::ports::token_port::TokenPort;

pub struct AppState {
    pub access: Arc<AccessGateway>,
    pub ledger: Arc<Ledger>,
    pub book: Arc<PositionBook>,
    pub goals: Arc<GoalTracker>,
    pub admin: Arc<AdminService>,
    pub instruments: Arc<InstrumentCache>,
    pub hub: Arc<PushHub>,
}

impl AppState {
    /// Wires every service over one store. The ledger and position book
    /// share a single lock table.
    pub fn new(
        store: Arc<dyn StorePort>,
        credentials: Arc<dyn CredentialPort>,
        tokens: Arc<dyn TokenPort>,
        notifier: Arc<dyn NotifyPort>,
        router: QuoteRouter,
        hub: Arc<PushHub>,
    ) -> Self {
        let locks = Arc::new(UserLocks::new());
        let ledger = Arc::new(Ledger::new(store.clone(), locks.clone()));
        let book = Arc::new(PositionBook::new(store.clone(), ledger.clone(), locks));
        AppState {
            access: Arc::new(AccessGateway::new(
                store.clone(),
                credentials,
                tokens,
                notifier,
            )),
            goals: Arc::new(GoalTracker::new(store.clone(), book.clone())),
            admin: Arc::new(AdminService::new(store.clone())),
            instruments: Arc::new(InstrumentCache::new(store, router)),
            ledger,
            book,
            hub,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let auth = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route(
            "/profile",
            get(handlers::profile).patch(handlers::update_profile),
        )
        .route("/topup", post(handlers::top_up))
        .route("/withdraw", post(handlers::withdraw));

    let portfolio = Router::new()
        .route("/", get(handlers::list_holdings).post(handlers::buy))
        .route("/summary", get(handlers::portfolio_summary))
        .route(
            "/{id}",
            patch(handlers::update_holding).delete(handlers::sell_all),
        )
        .route("/{id}/partial-sell", post(handlers::sell_partial));

    let stocks = Router::new()
        .route("/", get(handlers::list_stocks).post(handlers::upsert_stock))
        .route(
            "/{symbol}",
            get(handlers::lookup_stock).delete(handlers::delete_stock),
        )
        .route("/{symbol}/price", patch(handlers::refresh_stock_price));

    let goals = Router::new()
        .route("/", get(handlers::list_goals).post(handlers::create_goal))
        .route("/{id}", delete(handlers::delete_goal));

    let admin = Router::new()
        .route("/stats", get(handlers::admin_stats))
        .route("/users", get(handlers::admin_list_users))
        .route(
            "/users/{id}",
            get(handlers::admin_get_user)
                .put(handlers::admin_update_user)
                .delete(handlers::admin_disable_user),
        )
        .route(
            "/users/{id}/portfolios/{holding_id}",
            delete(handlers::admin_delete_holding),
        );

    let api = Router::new()
        .nest("/auth", auth)
        .nest("/portfolio", portfolio)
        .nest("/stocks", stocks)
        .nest("/goals", goals)
        .nest("/admin", admin);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws", get(ws::upgrade))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
