pub mod client;
pub mod types;

pub use client::{SlackApi, SlackClient, SlackMethod, TokenKind, UpstreamCall};
