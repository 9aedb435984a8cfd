use {
  crate::{
    clock,
    node::{Node, Rejection},
  },
  axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json,
    Router,
  },
  crowdfund_ledger::PayoutError,
  crowdfund_primitives::{
    Address,
    AddressError,
    Amount,
    Campaign,
    CampaignId,
    CampaignStatus,
    Event,
    Timestamp,
    ToBase58String,
    Transaction,
  },
  parking_lot::Mutex,
  serde::Serialize,
  std::{net::SocketAddr, sync::Arc},
  thiserror::Error,
  tracing::info,
};

pub type SharedNode = Arc<Mutex<Node>>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid address: {0}")]
  Address(#[from] AddressError),

  #[error(transparent)]
  Rejected(#[from] Rejection),

  #[error("balance unavailable: {0}")]
  Balance(#[from] PayoutError),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match self {
      Error::Address(_) => StatusCode::BAD_REQUEST,
      Error::Rejected(Rejection::Unauthenticated(_)) => {
        StatusCode::UNAUTHORIZED
      }
      Error::Rejected(Rejection::Duplicate(_)) => StatusCode::CONFLICT,
      Error::Balance(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, self.to_string()).into_response()
  }
}

#[derive(Debug, Serialize)]
pub struct Submitted {
  pub hash: String,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
  pub status: CampaignStatus,
  pub at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct BlockSummary {
  pub height: u64,
  pub hash: String,
  pub parent: String,
  pub timestamp: Timestamp,
  pub transactions: Vec<String>,
  pub events: Vec<Event>,
}

pub fn router(node: SharedNode) -> Router {
  Router::new()
    .route("/transactions", post(submit_transaction))
    .route("/campaigns/:id", get(campaign))
    .route("/campaigns/:id/status", get(campaign_status))
    .route("/campaigns/:id/goal", get(goal_met))
    .route("/campaigns/:id/contributions/:address", get(contribution))
    .route("/balances/:address", get(balance))
    .route("/blocks/latest", get(latest_block))
    .with_state(node)
}

/// Serves the RPC interface on one address until the server fails.
pub async fn serve(addr: SocketAddr, node: SharedNode) -> anyhow::Result<()> {
  let server = axum::Server::try_bind(&addr)?;
  info!("rpc listening on {addr}");
  server.serve(router(node).into_make_service()).await?;
  Ok(())
}

async fn submit_transaction(
  State(node): State<SharedNode>,
  Json(tx): Json<Transaction>,
) -> Result<(StatusCode, Json<Submitted>), Error> {
  let hash = tx.hash().to_b58();
  node.lock().enqueue(tx)?;
  Ok((StatusCode::ACCEPTED, Json(Submitted { hash })))
}

async fn campaign(
  State(node): State<SharedNode>,
  Path(id): Path<CampaignId>,
) -> Json<Campaign> {
  Json(node.lock().ledger().campaign(id))
}

async fn campaign_status(
  State(node): State<SharedNode>,
  Path(id): Path<CampaignId>,
) -> Json<StatusReport> {
  let at = clock::now();
  let status = node.lock().ledger().status(id, at);
  Json(StatusReport { status, at })
}

async fn goal_met(
  State(node): State<SharedNode>,
  Path(id): Path<CampaignId>,
) -> Json<bool> {
  Json(node.lock().ledger().is_goal_met(id))
}

async fn contribution(
  State(node): State<SharedNode>,
  Path((id, address)): Path<(CampaignId, String)>,
) -> Result<Json<Amount>, Error> {
  let contributor: Address = address.parse()?;
  Ok(Json(node.lock().ledger().get_contribution(id, &contributor)))
}

async fn balance(
  State(node): State<SharedNode>,
  Path(address): Path<String>,
) -> Result<Json<Amount>, Error> {
  let address: Address = address.parse()?;
  Ok(Json(node.lock().balance_of(&address)?))
}

async fn latest_block(State(node): State<SharedNode>) -> Json<BlockSummary> {
  let node = node.lock();
  let head = node.head();
  Json(BlockSummary {
    height: head.height,
    hash: head.hash().to_b58(),
    parent: head.parent.to_b58(),
    timestamp: head.timestamp,
    transactions: head.transactions.iter().map(|t| t.hash().to_b58()).collect(),
    events: head.events.clone(),
  })
}
