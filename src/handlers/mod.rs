// handlers/mod.rs - HTTP handlers
//
// Public (no auth): service info and health.
// Authenticated (bearer JWT): product reads and admin-only product mutations.

pub mod public;
pub mod product;
