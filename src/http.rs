pub use chatcore::net::{HttpClient, HttpRequest, HttpResponse, error_message};
pub use ephemeral_chat_ureq_client::UreqHttpClient;
