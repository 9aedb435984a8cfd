use {
  ed25519_dalek::PublicKey,
  serde::{Deserialize, Serialize},
  std::{
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
  },
  thiserror::Error,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("invalid base58 encoding: {0}")]
  Encoding(#[from] bs58::decode::Error),

  #[error("address must be 32 bytes long, got {0}")]
  Length(usize),
}

/// Identity of a party interacting with the ledger.
///
/// Campaign creators and contributors are both identified by an address.
/// The ledger never authenticates addresses itself, it trusts the caller
/// identity attached to a transaction envelope verbatim. Wallets usually
/// derive their address from an Ed25519 public key.
///
/// The all-zeroes address is the null identity. It is what a cleared
/// (cancelled) or never created campaign reports as its creator.
#[derive(
  Copy,
  Clone,
  Default,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct Address([u8; 32]);

impl Address {
  pub const NULL: Address = Address([0u8; 32]);

  pub const fn new(bytes: [u8; 32]) -> Self {
    Self(bytes)
  }

  pub fn is_null(&self) -> bool {
    *self == Self::NULL
  }
}

impl AsRef<[u8]> for Address {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl Deref for Address {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl Display for Address {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", bs58::encode(self.0).into_string())
  }
}

impl Debug for Address {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "address({})", bs58::encode(self.0).into_string())
  }
}

impl From<Address> for String {
  fn from(addr: Address) -> Self {
    bs58::encode(addr.0).into_string()
  }
}

impl FromStr for Address {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut bytes = [0u8; 32];
    let len = bs58::decode(s).into(&mut bytes)?;
    if len != bytes.len() {
      return Err(Error::Length(len));
    }
    Ok(Self(bytes))
  }
}

impl TryFrom<&str> for Address {
  type Error = Error;

  fn try_from(value: &str) -> Result<Self, Self::Error> {
    FromStr::from_str(value)
  }
}

impl TryFrom<String> for Address {
  type Error = Error;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    FromStr::from_str(&value)
  }
}

impl From<PublicKey> for Address {
  fn from(p: PublicKey) -> Self {
    Self(*p.as_bytes())
  }
}

impl From<&PublicKey> for Address {
  fn from(p: &PublicKey) -> Self {
    Self(*p.as_bytes())
  }
}
