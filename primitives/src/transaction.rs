use {
  crate::{b58::ToBase58String, Address, Amount, CampaignId, Timestamp},
  ed25519_dalek::{
    Keypair,
    PublicKey,
    Signature,
    SignatureError,
    Signer,
    Verifier,
  },
  multihash::{Hasher, Multihash, MultihashDigest, Sha3_256},
  once_cell::sync::OnceCell,
  serde::{Deserialize, Serialize},
  std::fmt::Debug,
  thiserror::Error,
};

#[derive(Debug, Error)]
pub enum AuthError {
  #[error("transaction is not signed")]
  Unsigned,

  #[error("signature does not match the caller: {0}")]
  Signature(#[from] SignatureError),
}

/// Operation requested by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
  /// Opens a new campaign owned by the caller.
  CreateCampaign { goal: Amount, deadline: Timestamp },

  /// Credits the attached value to a campaign on behalf of the caller.
  Contribute { campaign: CampaignId },

  /// Pays out everything raised by a successful campaign to its creator.
  WithdrawFunds { campaign: CampaignId },

  /// Erases a campaign that has not received any funds.
  CancelCampaign { campaign: CampaignId },
}

/// The invocation environment of a single call.
///
/// Everything the ledger knows about the outside world comes through
/// here: who is calling, how much value is attached and what time it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
  pub caller: Address,
  pub value: Amount,
  pub timestamp: Timestamp,
}

impl Envelope {
  pub fn new(caller: Address, value: Amount, timestamp: Timestamp) -> Self {
    Self {
      caller,
      value,
      timestamp,
    }
  }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Transaction {
  /// Authenticated identity of the party submitting the call.
  pub caller: Address,

  /// Value attached to the call. Only meaningful for contributions.
  #[serde(default)]
  pub value: Amount,

  /// Chosen by the caller to tell apart otherwise identical
  /// transactions, such as two equal contributions.
  #[serde(default)]
  pub nonce: u64,

  pub call: Call,

  /// Ed25519 signature of the caller over [`Transaction::hash`].
  #[serde(default, with = "b58_signature")]
  pub signature: Option<Signature>,

  #[serde(skip)]
  hash_cache: OnceCell<Multihash>,
}

impl Transaction {
  pub fn new(caller: Address, value: Amount, call: Call) -> Self {
    Self {
      caller,
      value,
      nonce: 0,
      call,
      signature: None,
      hash_cache: OnceCell::new(),
    }
  }

  pub fn with_nonce(mut self, nonce: u64) -> Self {
    self.nonce = nonce;
    self.hash_cache = OnceCell::new();
    self.signature = None;
    self
  }

  /// A transaction whose caller is the keypair's public key,
  /// signed by that keypair.
  pub fn signed(
    keypair: &Keypair,
    value: Amount,
    nonce: u64,
    call: Call,
  ) -> Self {
    let mut tx = Self::new(keypair.public.into(), value, call).with_nonce(nonce);
    tx.signature = Some(keypair.sign(&tx.hash().to_bytes()));
    tx
  }

  /// Checks that the transaction was signed by the private
  /// key of its caller.
  pub fn verify(&self) -> Result<(), AuthError> {
    let signature = self.signature.as_ref().ok_or(AuthError::Unsigned)?;
    let pubkey = PublicKey::from_bytes(&self.caller)?;
    pubkey.verify(&self.hash().to_bytes(), signature)?;
    Ok(())
  }

  /// Hash of the transaction contents that uniquely identifies it.
  pub fn hash(&self) -> &Multihash {
    self.hash_cache.get_or_init(|| {
      let mut hasher = Sha3_256::default();
      hasher.update(&self.caller);
      hasher.update(&self.value.to_le_bytes());
      hasher.update(&self.nonce.to_le_bytes());
      hasher.update(&rmp_serde::to_vec(&self.call).unwrap());
      multihash::Code::Sha3_256.wrap(hasher.finalize()).unwrap()
    })
  }

  /// Binds this transaction to the clock reading it executes at.
  pub fn envelope(&self, timestamp: Timestamp) -> Envelope {
    Envelope::new(self.caller, self.value, timestamp)
  }
}

impl Debug for Transaction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Transaction")
      .field("caller", &self.caller)
      .field("value", &self.value)
      .field("nonce", &self.nonce)
      .field("call", &self.call)
      .field("signed", &self.signature.is_some())
      .field("hash", &self.hash().to_b58())
      .finish()
  }
}

impl PartialEq for Transaction {
  fn eq(&self, other: &Self) -> bool {
    self.caller == other.caller
      && self.value == other.value
      && self.nonce == other.nonce
      && self.call == other.call
      && self.signature == other.signature
  }
}

impl Eq for Transaction {}

/// Signatures travel as base58 strings, like addresses.
mod b58_signature {
  use {
    ed25519_dalek::Signature,
    serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer},
  };

  pub fn serialize<S: Serializer>(
    signature: &Option<Signature>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    signature
      .map(|s| bs58::encode(s.to_bytes()).into_string())
      .serialize(serializer)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<Signature>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
      Some(text) => {
        let bytes = bs58::decode(text).into_vec().map_err(D::Error::custom)?;
        Signature::try_from(bytes.as_slice())
          .map(Some)
          .map_err(D::Error::custom)
      }
      None => Ok(None),
    }
  }
}

#[cfg(test)]
mod tests {
  use {
    super::{AuthError, Call, Transaction},
    crate::Address,
    ed25519_dalek::{Keypair, Signer},
    once_cell::sync::OnceCell,
  };

  #[test]
  fn hash_covers_all_fields() {
    let alice = Address::new([1; 32]);
    let bob = Address::new([2; 32]);

    let tx = Transaction::new(alice, 5, Call::Contribute { campaign: 1 });
    let same = Transaction::new(alice, 5, Call::Contribute { campaign: 1 });
    assert_eq!(tx.hash(), same.hash());

    let other_caller = Transaction::new(bob, 5, Call::Contribute { campaign: 1 });
    let other_value = Transaction::new(alice, 6, Call::Contribute { campaign: 1 });
    let other_call = Transaction::new(alice, 5, Call::Contribute { campaign: 2 });
    let other_nonce = same.with_nonce(1);
    assert_ne!(tx.hash(), other_caller.hash());
    assert_ne!(tx.hash(), other_value.hash());
    assert_ne!(tx.hash(), other_call.hash());
    assert_ne!(tx.hash(), other_nonce.hash());
  }

  #[test]
  fn signature_binds_caller_and_contents() {
    let keypair = Keypair::generate(&mut rand::thread_rng());
    let tx = Transaction::signed(&keypair, 5, 7, Call::Contribute {
      campaign: 1,
    });
    assert_eq!(tx.caller, Address::from(keypair.public));
    assert_eq!(tx.nonce, 7);
    assert!(tx.verify().is_ok());

    // changing anything covered by the hash invalidates the signature
    let mut tampered = tx.clone();
    tampered.value = 500;
    tampered.hash_cache = OnceCell::new();
    assert!(matches!(tampered.verify(), Err(AuthError::Signature(_))));

    // someone else's signature does not authenticate the caller
    let mallory = Keypair::generate(&mut rand::thread_rng());
    let mut forged = Transaction::new(tx.caller, 0, Call::WithdrawFunds {
      campaign: 1,
    });
    forged.signature = Some(mallory.sign(&forged.hash().to_bytes()));
    assert!(matches!(forged.verify(), Err(AuthError::Signature(_))));

    let unsigned = Transaction::new(tx.caller, 5, Call::Contribute {
      campaign: 1,
    });
    assert!(matches!(unsigned.verify(), Err(AuthError::Unsigned)));
  }

  #[test]
  fn signed_transaction_json_form() -> anyhow::Result<()> {
    let keypair = Keypair::generate(&mut rand::thread_rng());
    let tx = Transaction::signed(&keypair, 3, 1, Call::Contribute {
      campaign: 2,
    });

    let json = serde_json::to_value(&tx)?;
    assert_eq!(json["caller"], tx.caller.to_string());
    assert!(json["signature"].is_string());

    let decoded: Transaction = serde_json::from_value(json)?;
    assert_eq!(decoded, tx);
    assert!(decoded.verify().is_ok());
    Ok(())
  }

  #[test]
  fn serialized_form_drops_hash_cache() -> anyhow::Result<()> {
    let tx = Transaction::new(
      Address::new([7; 32]),
      0,
      Call::CreateCampaign {
        goal: 10,
        deadline: 3600,
      },
    );
    let hash = *tx.hash();

    let decoded: Transaction = rmp_serde::from_slice(&rmp_serde::to_vec(&tx)?)?;
    assert_eq!(decoded, tx);
    assert_eq!(*decoded.hash(), hash);

    let envelope = decoded.envelope(100);
    assert_eq!(envelope.caller, tx.caller);
    assert_eq!(envelope.timestamp, 100);
    Ok(())
  }
}
