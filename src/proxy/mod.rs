mod core;
mod dispatch;
mod fal;
mod router;
mod runpod;

pub use router::create_proxy_router;
