// Adapters layer: document stores and notification sinks implementing the domain ports.

pub mod json_file;
pub mod memory;
pub mod notifier;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;
pub use notifier::{ChannelNotifier, TracingNotifier};
