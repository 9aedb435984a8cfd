use {
  crate::{node::Node, rpc::SharedNode, settings::SystemSettings},
  clap::Parser,
  parking_lot::Mutex,
  std::sync::Arc,
  tokio::time::{interval, MissedTickBehavior},
  tracing::{error, info, subscriber::set_global_default},
  tracing_subscriber::{EnvFilter, FmtSubscriber},
};

mod clock;
mod mempool;
mod node;
mod rpc;
mod settings;
mod storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // configure logging
  set_global_default(
    FmtSubscriber::builder()
      .with_env_filter(EnvFilter::from_default_env())
      .finish(),
  )?;

  // gather CLI parameters
  let settings = SystemSettings::parse();
  info!("startup settings: {settings:#?}");

  // get an instance of state store, it can be either
  // an in-memory ephemeral storage if no data directory
  // is provided by cli or persistent on-disk store otherwise.
  let (store, treasury) = settings.stores()?;
  let node: SharedNode = Arc::new(Mutex::new(Node::new(store, treasury)));

  for addr in settings.rpc_addrs() {
    let node = Arc::clone(&node);
    tokio::spawn(async move {
      if let Err(e) = rpc::serve(addr, node).await {
        error!("rpc server on {addr} failed: {e}");
      }
    });
  }

  let mut interval = interval(settings.block_time());
  interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

  loop {
    interval.tick().await;
    node.lock().produce(clock::now());
  }
}
