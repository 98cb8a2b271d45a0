mod conversations;
mod design_projects;
mod files;
mod memory_entries;
mod tasks;

pub use conversations::ConversationRepository;
pub use design_projects::DesignProjectRepository;
pub use files::FileRepository;
pub use memory_entries::MemoryEntryRepository;
pub use tasks::TaskRepository;
