//! Observer connection adapters

mod channel;

pub use channel::{ChannelConnection, DEFAULT_QUEUE_CAPACITY, DEFAULT_SEND_TIMEOUT};
