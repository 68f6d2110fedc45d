//! Top-level service wiring.
//!
//! [`GatewayService`] owns the transport connection, the avatar cache, the
//! session registry, and the contact directory, and runs the single
//! dispatch loop that routes decoded transport signals into them. The host
//! drives its lifecycle through `enable`/`disable`.

pub mod service;
pub mod telemetry;

pub use {service::GatewayService, telemetry::init_telemetry};

#[cfg(test)]
mod testing;
