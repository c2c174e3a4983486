//! HTTP handlers for the two sales hosted by the node.

use alloy_primitives::{Address, U256};
use axum::Json;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use pass_mint::chain::{
    ChainId, Contract, LocalChain, ProviderError, Timestamp, ValueTransfer, ether, format_ether,
};
use pass_mint::mint::{MintError, MintReceipt, Owner};
use pass_mint::whitelist::Proof;
use pass_mint::{PublicSale, WhitelistSale};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Header carrying the identity a request acts as.
pub const CALLER_HEADER: &str = "x-caller";

/// The hosted chain and the two sales deployed on it.
pub struct Node {
    pub chain: LocalChain,
    pub public: PublicSale,
    pub whitelist: WhitelistSale,
}

/// Simple atomic counters for Prometheus metrics.
#[derive(Default)]
pub struct Metrics {
    public_mint_requests_total: AtomicU64,
    public_mint_errors_total: AtomicU64,
    whitelist_mint_requests_total: AtomicU64,
    whitelist_mint_errors_total: AtomicU64,
    admin_requests_total: AtomicU64,
}

/// Shared application state.
pub struct AppState {
    pub node: Mutex<Node>,
    pub chain_id: ChainId,
    pub dev_prefund: U256,
    pub metrics: Metrics,
}

impl AppState {
    fn node(&self) -> Result<MutexGuard<'_, Node>, ApiError> {
        self.node.lock().map_err(|_| ApiError::Poisoned)
    }
}

// ============================================================================
// Errors and extractors
// ============================================================================

/// A failed request, rendered as `{ "error": code, "message": reason }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Mint(#[from] MintError),
    #[error("{0}")]
    BadRequest(String),
    #[error("dev funding is disabled")]
    FundingDisabled,
    #[error("node state is unavailable")]
    Poisoned,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Mint(MintError::Unauthorized { .. }) => StatusCode::FORBIDDEN,
            ApiError::Mint(MintError::WindowClosed(_)) => StatusCode::FORBIDDEN,
            ApiError::Mint(MintError::AlreadyIssued(_)) => StatusCode::CONFLICT,
            ApiError::Mint(MintError::GateRejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Mint(MintError::TransferFailed(ProviderError::InsufficientBalance {
                ..
            })) => StatusCode::PAYMENT_REQUIRED,
            ApiError::Mint(MintError::TransferFailed(_)) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::FundingDisabled => StatusCode::NOT_FOUND,
            ApiError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Mint(e) => e.code(),
            ApiError::BadRequest(_) => "invalid_request",
            ApiError::FundingDisabled => "funding_disabled",
            ApiError::Poisoned => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({
                "error": self.code(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

/// The identity named by the `x-caller` header.
#[derive(Debug)]
pub struct Caller(pub Address);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or_else(|| ApiError::BadRequest(format!("missing {CALLER_HEADER} header")))?;
        let caller = value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<Address>().ok())
            .ok_or_else(|| ApiError::BadRequest(format!("invalid {CALLER_HEADER} header")))?;
        Ok(Caller(caller))
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidMintRequest {
    /// Value attached to the call, as a decimal ether string.
    #[serde(with = "ether")]
    pub value: U256,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub start_time: Timestamp,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRequest {
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

/// The boundary change a [`WindowRequest`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowUpdate {
    Start(Timestamp),
    End(Timestamp),
    Bounds(Timestamp, Timestamp),
}

impl WindowRequest {
    /// `None` when the request names neither boundary.
    pub fn update(&self) -> Option<WindowUpdate> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(WindowUpdate::Bounds(start, end)),
            (Some(start), None) => Some(WindowUpdate::Start(start)),
            (None, Some(end)) => Some(WindowUpdate::End(end)),
            (None, None) => None,
        }
    }
}

/// A whitelist proof, either ABI-encoded hex or as JSON fields.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProofSubmission {
    Encoded { proof: String },
    Typed(Proof),
}

impl ProofSubmission {
    /// The ABI encoding handed to the sale.
    ///
    /// Text that is not hex becomes an empty encoding, which the sale rejects
    /// as an invalid proof once the window check has passed.
    fn into_bytes(self) -> Vec<u8> {
        match self {
            ProofSubmission::Encoded { proof } => {
                let s = proof.strip_prefix("0x").unwrap_or(&proof);
                hex::decode(s).unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "Submitted proof is not hex");
                    Vec::new()
                })
            }
            ProofSubmission::Typed(proof) => proof.abi_encode(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FundRequest {
    pub address: Address,
}

/// Logs the events of committed calls and drops them from the chain.
fn publish_events(chain: &mut LocalChain) {
    for event in chain.drain_events() {
        tracing::info!(event = ?event, "Chain event");
    }
}

// ============================================================================
// Read-only handlers
// ============================================================================

pub async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "pass-mint-node",
        "version": env!("CARGO_PKG_VERSION"),
        "chainId": state.chain_id,
    }))
}

pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let node = state.node()?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "chainId": node.chain.chain_id(),
        "timestamp": node.chain.now(),
    })))
}

pub async fn public_info_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let node = state.node()?;
    let sale = &node.public;
    Ok(Json(serde_json::json!({
        "address": sale.address(),
        "name": sale.metadata().name,
        "symbol": sale.metadata().symbol,
        "tokenUri": sale.metadata().token_uri,
        "owner": sale.owner(),
        "price": format_ether(sale.price()),
        "startTime": sale.start_time(),
        "status": sale.status(node.chain.now()),
        "totalSupply": sale.total_supply(),
        "balance": format_ether(sale.balance(node.chain.state())),
    })))
}

pub async fn whitelist_info_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let node = state.node()?;
    let sale = &node.whitelist;
    Ok(Json(serde_json::json!({
        "address": sale.address(),
        "name": sale.metadata().name,
        "symbol": sale.metadata().symbol,
        "tokenUri": sale.metadata().token_uri,
        "owner": sale.owner(),
        "issuer": sale.issuer(),
        "startTime": sale.start_time(),
        "endTime": sale.end_time(),
        "status": sale.status(node.chain.now()),
        "totalSupply": sale.total_supply(),
    })))
}

pub async fn account_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let address: Address = address
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{address:?} is not an address")))?;
    let node = state.node()?;
    let host = node.chain.state();
    Ok(Json(serde_json::json!({
        "address": address,
        "balance": format_ether(host.balance_of(address)),
        "publicPasses": host.holdings(node.public.address(), address),
        "whitelistPasses": host.holdings(node.whitelist.address(), address),
    })))
}

// ============================================================================
// Mint handlers
// ============================================================================

pub async fn public_mint_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<PaidMintRequest>,
) -> Result<Json<MintReceipt>, ApiError> {
    let metrics = &state.metrics;
    metrics.public_mint_requests_total.fetch_add(1, Ordering::Relaxed);

    let result = {
        let mut node = state.node()?;
        let Node { chain, public, .. } = &mut *node;
        let result = chain.call(public, caller, body.value, |sale, ctx, host| sale.mint(ctx, host));
        publish_events(chain);
        result
    };
    result.map(Json).map_err(|e| {
        metrics.public_mint_errors_total.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(caller = %caller, code = e.code(), error = %e, "Public mint failed");
        ApiError::from(e)
    })
}

pub async fn whitelist_mint_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<ProofSubmission>,
) -> Result<Json<MintReceipt>, ApiError> {
    let metrics = &state.metrics;
    metrics.whitelist_mint_requests_total.fetch_add(1, Ordering::Relaxed);

    let encoded = body.into_bytes();
    let result = {
        let mut node = state.node()?;
        let Node {
            chain, whitelist, ..
        } = &mut *node;
        let result = chain.call(whitelist, caller, U256::ZERO, |sale, ctx, host| {
            sale.mint_encoded(ctx, &encoded, host)
        });
        publish_events(chain);
        result
    };
    result.map(Json).map_err(|e| {
        metrics.whitelist_mint_errors_total.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(caller = %caller, code = e.code(), error = %e, "Whitelist mint failed");
        ApiError::from(e)
    })
}

// ============================================================================
// Owner handlers
// ============================================================================

pub async fn public_start_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<StartRequest>,
) -> Result<StatusCode, ApiError> {
    state.metrics.admin_requests_total.fetch_add(1, Ordering::Relaxed);
    let mut node = state.node()?;
    let Node { chain, public, .. } = &mut *node;
    chain.call(public, caller, U256::ZERO, |sale, ctx, host| {
        sale.set_start(ctx, body.start_time, host)
    })?;
    publish_events(chain);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn public_withdraw_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<impl IntoResponse, ApiError> {
    state.metrics.admin_requests_total.fetch_add(1, Ordering::Relaxed);
    let mut node = state.node()?;
    let Node { chain, public, .. } = &mut *node;
    let amount = chain.call(public, caller, U256::ZERO, |sale, ctx, host| {
        sale.withdraw(ctx, host)
    })?;
    publish_events(chain);
    Ok(Json(serde_json::json!({
        "to": caller,
        "amount": format_ether(amount),
    })))
}

pub async fn whitelist_window_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<WindowRequest>,
) -> Result<StatusCode, ApiError> {
    state.metrics.admin_requests_total.fetch_add(1, Ordering::Relaxed);
    let mut node = state.node()?;
    let Node {
        chain, whitelist, ..
    } = &mut *node;
    let Some(update) = body.update() else {
        Owner::new(whitelist.owner()).ensure(caller)?;
        return Err(ApiError::BadRequest(
            "startTime or endTime is required".to_string(),
        ));
    };
    chain.call(whitelist, caller, U256::ZERO, |sale, ctx, host| match update {
        WindowUpdate::Start(start) => sale.set_start(ctx, start, host),
        WindowUpdate::End(end) => sale.set_end(ctx, end, host),
        WindowUpdate::Bounds(start, end) => sale.set_bounds(ctx, start, end, host),
    })?;
    publish_events(chain);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Development helpers
// ============================================================================

pub async fn dev_fund_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FundRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.dev_prefund.is_zero() {
        return Err(ApiError::FundingDisabled);
    }
    let mut node = state.node()?;
    node.chain
        .fund(body.address, state.dev_prefund)
        .map_err(MintError::from)?;
    tracing::info!(
        address = %body.address,
        amount = %format_ether(state.dev_prefund),
        "Account funded"
    );
    Ok(Json(serde_json::json!({
        "address": body.address,
        "balance": format_ether(node.chain.balance_of(body.address)),
    })))
}

/// Returns Prometheus-format metrics as plain text.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let m = &state.metrics;
    let counters = [
        (
            "public_mint_requests_total",
            "Total number of public mint requests received.",
            &m.public_mint_requests_total,
        ),
        (
            "public_mint_errors_total",
            "Total number of rejected public mints.",
            &m.public_mint_errors_total,
        ),
        (
            "whitelist_mint_requests_total",
            "Total number of whitelist mint requests received.",
            &m.whitelist_mint_requests_total,
        ),
        (
            "whitelist_mint_errors_total",
            "Total number of rejected whitelist mints.",
            &m.whitelist_mint_errors_total,
        ),
        (
            "admin_requests_total",
            "Total number of owner requests received.",
            &m.admin_requests_total,
        ),
    ];

    let mut body = String::new();
    for (name, help, counter) in counters {
        let value = counter.load(Ordering::Relaxed);
        body.push_str(&format!(
            "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
        ));
    }
    if let Ok(node) = state.node() {
        body.push_str(&format!(
            "# HELP passes_minted Passes minted per collection.\n\
             # TYPE passes_minted gauge\n\
             passes_minted{{collection=\"public\"}} {}\n\
             passes_minted{{collection=\"whitelist\"}} {}\n",
            node.public.total_supply(),
            node.whitelist.total_supply(),
        ));
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
