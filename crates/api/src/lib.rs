//! HTTP surface for the grading service: the producer endpoint that
//! enqueues jobs and the status/dashboard queries.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;
