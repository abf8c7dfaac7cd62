//! HTTP Handlers

mod ping;
mod speaker;
mod synthesize;

pub use ping::*;
pub use speaker::*;
pub use synthesize::*;
