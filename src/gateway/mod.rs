pub mod client;
pub mod endpoints;
pub mod traits;

pub use client::ApiClient;
pub use endpoints::Endpoints;
pub use traits::{Gateway, MessageStream, ProgressSource};
