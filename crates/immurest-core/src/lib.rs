//! immurest core
//!
//! The pure half of the safe-set gateway: everything that can be decided
//! without touching the network.
//!
//! - `codec` - strict decoding of `{"kv": {...}}` request bodies
//! - `merkle` - RFC 6962 hashing, inclusion and consistency proofs
//! - `proof` - safe-set proof verification against a trusted root
//! - `anchor` - the process-wide trust anchor with compare-and-swap updates
//!
//! # Example
//!
//! ```rust
//! use immurest_core::codec;
//!
//! let kv = codec::decode(br#"{"kv": {"key": "a2V5", "value": "dmFsdWU="}}"#).unwrap();
//! assert_eq!(kv.key, b"key");
//! assert_eq!(kv.value, b"value");
//! ```

pub mod anchor;
pub mod codec;
pub mod error;
pub mod merkle;
pub mod proof;
pub mod types;

pub use anchor::TrustAnchor;
pub use codec::decode;
pub use error::CodecError;
pub use merkle::Hash32;
pub use proof::{verify, verify_and_advance};
pub use types::{KeyValue, Proof, Root, SafeSetResult};
