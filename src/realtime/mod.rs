pub mod local;
pub mod socket;

pub use chatcore::feed::{ChangeFeed, ChannelSpec, Subscription};
pub use local::LocalFeed;
pub use socket::WebSocketFeed;

// The size of each subscription's row buffer.
pub(crate) const CHANNEL_CAPACITY: usize = 100;
