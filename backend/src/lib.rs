//! Clinic scheduling backend library.
//!
//! Hexagonal layout: [`domain`] holds the aggregates, the scheduling core,
//! and the ports; [`inbound`] adapts HTTP onto the domain services;
//! [`outbound`] adapts the domain ports onto PostgreSQL and the mail relay.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
