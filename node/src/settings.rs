use {
  crate::{
    node::{Store, Treasury},
    storage,
  },
  clap::Parser,
  crowdfund_ledger::{Balances, InMemoryStateStore},
  humantime::Duration,
  std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
  },
};

/// Crowdfunding Ledger Devnode
///
/// A single node instance of the crowdfunding escrow ledger for local
/// use in dev, CI and test scenarios. Transactions submitted over RPC
/// are executed in arrival order, one block at a time.
#[derive(Debug, Parser)]
pub struct SystemSettings {
  /// Directory of the persistent ledger database.
  ///
  /// When omitted all state lives in memory and is
  /// lost when the node exits.
  #[clap(long, short, value_name = "PATH")]
  data_dir: Option<PathBuf>,

  /// TCP port for accepting HTTP RPC requests
  #[clap(long, short, default_value = "8080", value_name = "PORT")]
  rpc_port: u16,

  /// IP addresses for accepting RPC connections
  #[clap(long, short,
    value_name = "ADDRESS",
    default_values_t = vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])]
  ip: Vec<IpAddr>,

  /// Block production interval
  #[clap(long, short = 't', value_name = "DURATION", default_value = "2s")]
  block_time: Duration,
}

impl SystemSettings {
  pub fn rpc_addrs(&self) -> Vec<SocketAddr> {
    self
      .ip
      .iter()
      .cloned()
      .map(|ip| SocketAddr::new(ip, self.rpc_port))
      .collect()
  }

  pub fn block_time(&self) -> std::time::Duration {
    self.block_time.into()
  }

  /// Campaign table store and payout balances, persistent on-disk
  /// if a data directory was given, ephemeral in-memory otherwise.
  pub fn stores(&self) -> Result<(Store, Box<dyn Treasury>), sled::Error> {
    let stores: (Store, Box<dyn Treasury>) = match self.data_dir {
      Some(ref path) => {
        let (campaigns, balances) = storage::open(storage::open_db(path)?)?;
        (Box::new(campaigns), Box::new(balances))
      }
      None => (
        Box::new(InMemoryStateStore::default()),
        Box::new(Balances::default()),
      ),
    };
    Ok(stores)
  }
}
