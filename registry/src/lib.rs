// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # CREST Registry — Core Library
//!
//! CREST is a decentralized identity and asset registry: a singleton network
//! configuration, one identity record per owner key, and transferable asset
//! records, all living at deterministically derived addresses and guarded by
//! nothing but validation logic. There is no ambient trust anywhere in this
//! crate — every invariant is enforced at every transition, against inputs
//! we assume to be hostile.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of the
//! registry:
//!
//! - **crypto** — Ed25519 keys and BLAKE3 hashing. Don't roll your own.
//! - **address** — Deterministic, collision-resistant address derivation.
//!   The same inputs always land on the same address, in every process,
//!   forever.
//! - **record** — The three persisted record types (network, identity,
//!   asset) and their bounded, tag-prefixed wire encoding.
//! - **store** — The host-ledger stand-in: an address-keyed record map with
//!   a deterministic state root.
//! - **transition** — The signed transition envelope clients submit.
//! - **registry** — The state machine itself: authorization rules, the
//!   guardian-based recovery protocol, and per-authority asset numbering.
//!
//! ## Design Philosophy
//!
//! 1. Validate everything, then mutate. A rejected transition leaves every
//!    record byte-for-byte unchanged.
//! 2. Reject, never coerce. An oversized URI is an error, not a truncation.
//! 3. If it guards ownership, it has tests. Plural.

pub mod address;
pub mod crypto;
pub mod error;
pub mod record;
pub mod registry;
pub mod store;
pub mod transition;

pub use address::{Address, DomainTag};
pub use crypto::{Keypair, PublicKey, Signature};
pub use error::RegistryError;
pub use record::{Asset, Identity, NetworkConfig, Record, RecordKind};
pub use registry::{Receipt, Registry};
pub use store::RecordStore;
pub use transition::{SignedTransition, Transition};
