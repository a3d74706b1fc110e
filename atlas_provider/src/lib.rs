//! Reconciliation core of the MongoDB Atlas provider.
//!
//! A [`reconciler::Reconciler`] drives one resource through its lifecycle
//! against a [`remote_api::RemoteApi`], and uses the [`poller`] to wait
//! until Atlas reports the resource converged.

pub mod cli;
pub mod config;
pub mod lookup;
pub mod manifest;
pub mod observer;
pub mod poller;
pub mod reconciler;
pub mod remote_api;
pub mod resources;
