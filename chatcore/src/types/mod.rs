pub mod call;
pub mod message;
pub mod user;

pub use call::CallKind;
pub use message::{Message, MessageBody, MessageRow, NewMessage, Payload, SenderRef};
pub use user::{Profile, UserId};
