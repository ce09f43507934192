pub mod api;
mod body;
mod client;

pub use api::Response;
pub use body::{build_body, BodyPart, PartValue};
pub use client::Client;
