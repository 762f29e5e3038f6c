mod auth;
mod handlers;
mod router;

pub use router::create_assets_router;
