pub mod backend;
pub mod session_store;

pub use backend::BackendClient;
pub use session_store::SessionStore;
