pub mod contacts;

pub use contacts::Contacts;
