mod address;
mod b58;
mod block;
mod campaign;
mod event;
mod transaction;

pub use {
  address::{Address, Error as AddressError},
  b58::ToBase58String,
  block::Block,
  campaign::{Amount, Campaign, CampaignId, CampaignStatus, Timestamp},
  event::Event,
  transaction::{AuthError, Call, Envelope, Transaction},
};
