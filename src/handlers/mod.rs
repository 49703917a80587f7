// handlers/mod.rs - Three access tiers
//
// Public (no session) -> Protected (session, per-route role gates) ->
// Elevated (teacher only). The tiers map onto how routes are layered in
// `app.rs`, not onto URL prefixes.

pub mod elevated;
pub mod protected;
pub mod public;
pub mod session;
