//! The assistant chat: session state, the relay client and the stream
//! decoder.

pub mod client;
pub mod session;
pub mod stream;

pub use client::{ChatClient, FragmentStream};
pub use session::{ChatMessage, ChatRole, ChatSession, ERROR_REPLY, GREETING, QUICK_ACTIONS};
pub use stream::{FrameDecoder, decode_stream};
