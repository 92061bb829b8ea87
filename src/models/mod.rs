pub mod enums;
pub mod history;
pub mod message;

pub use enums::MessageRole;
pub use history::HistoryEntry;
pub use message::ChatMessage;
