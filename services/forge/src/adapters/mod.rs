pub mod card_art;
pub mod clock;
pub mod history;
pub mod http;
pub mod random;

pub use card_art::FsCardArtStore;
pub use clock::SystemClock;
pub use history::InMemoryHistoryStore;
pub use http::ReqwestTransport;
pub use random::RngRandomSource;
