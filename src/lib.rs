// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `rtps-core`: an OMG RTPS 2.x protocol engine.
//!
//! This crate implements the interoperable wire protocol and the
//! reliability, durability, and liveliness state machines required by the
//! DDS data model: a [`wire`] framer for messages and submessages, per-
//! endpoint [`writer`]/[`reader`] state machines, [`history`] caches with
//! QoS-driven eviction, [`qos`] policies and RxO compatibility matching,
//! SPDP/SEDP/WLP [`discovery`], a [`receiver`] that dispatches parsed
//! messages to the right endpoint, and a [`Participant`] that ties them
//! together behind a [`transport::Transport`] contract it never implements
//! itself.
//!
//! # Non-goals
//!
//! This crate does not open sockets, perform user-type (IDL) serialization
//! beyond an opaque, CDR-encapsulated byte payload, or ship a concrete
//! security or persistence backend — those are external collaborators
//! reached through [`transport`], [`security`], and [`persistence`] traits.

pub mod config;
pub mod discovery;
pub mod error;
pub mod fragment;
pub mod history;
pub mod logging;
pub mod participant;
pub mod persistence;
pub mod qos;
pub mod reader;
pub mod receiver;
pub mod scheduler;
pub mod security;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod wire;
pub mod writer;
pub mod wlp;

pub use error::{Error, Result};
pub use participant::{Participant, ParticipantConfig};
