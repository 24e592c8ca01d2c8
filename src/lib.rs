//! # anydoc
//!
//! `anydoc` gives you cached, lazily-executed async handles over the documents of a
//! MongoDB-like document store, with a small set of atomic partial updates: assign a field,
//! increment it, decrement it only if there's enough, append to an array, pop from either end,
//! remove a field.
//!
//! It is best used when a program keeps a lot of small, independently mutated documents
//! (player profiles, counters, balances) and mostly wants to read one, poke a field or two,
//! and move on without writing filter/update documents by hand.
//!
//! Goals:
//!
//! * Every mutation is a single atomic update executed by the store. No read-modify-write.
//! * Conditional decrements never overdraw, however many run at the same time.
//! * Nothing touches the store until you await: every operation is a cold [`Task`](task::Task).
//! * The blocking driver never runs on your async threads; calls go through a bounded worker pool.
//! * Any store can be plugged in by implementing three methods of [`Store`](store::Store).
//!
//! Non-goals:
//!
//! * Queries over many documents, transactions, change streams.
//! * Keeping the cache in sync with writes made by anyone else.
//! * Retries. A failed task leaves the document in an unknown state until it's fetched again.
//!
//! # Quick example
//!
#![cfg_attr(not(feature = "memory"), doc = "```ignore")]
#![cfg_attr(feature = "memory", doc = "```")]
//! use anydoc::{store::StoreEx, stores::memory::MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let client = MemoryStore::new().client();
//! let wallet = client.database("bank").collection("wallets").document("alice");
//!
//! wallet.assign("balance", 50).await?;
//!
//! assert!(wallet.conditional_decrement("balance", 20).await?.applied());
//! assert!(!wallet.conditional_decrement("balance", 40).await?.applied());
//!
//! let snapshot = wallet.fetch().await?;
//! assert_eq!(snapshot.get("balance"), Some(&30.into()));
//! # Ok::<_, anyhow::Error>(())
//! # }).unwrap()
//! ```
//!
//! # Main concepts
//!
//! ## Handles
//!
//! A [`Client`](client::Client) hands out [`DatabaseHandle`](database::DatabaseHandle)s,
//! which hand out [`CollectionHandle`](collection::CollectionHandle)s, which hand out
//! [`DocumentHandle`](document::DocumentHandle)s. None of this does any I/O: databases,
//! collections and documents come into existence on first write.
//!
//! A document handle caches the last document it [fetched](document::DocumentHandle::fetch).
//! Mutations don't touch the cache; fetch again to see their effect.
//!
//! ## Updates
//!
//! The high-level mutations are [`UpdateOp`](update::UpdateOp)s. Each is translated into a native
//! [`Filter`](update::Filter) + [`Update`](update::Update) pair and sent to the store as one
//! `update_one` call. The native documents are available directly too, through
//! [`DocumentHandle::update`](document::DocumentHandle::update) and
//! [`DocumentHandle::update_where`](document::DocumentHandle::update_where).
//!
//! ## Stores
//!
//! - [`stores::memory::MemoryStore`]: in-process, for tests and prototyping
//!
//! Wrappers:
//! - [`wrappers::traced::TracedStore`]: logs every call with its duration
//!
pub mod store;

pub mod address;
pub mod client;
pub mod collection;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod stores;
pub mod task;
pub mod update;
pub mod util;
pub mod wrappers;

pub use client::Client;
pub use document::{DocumentHandle, Snapshot};
pub use error::Error;
pub use task::Task;
