pub mod error;
pub mod models;
pub mod notify;
pub mod query;
pub mod service;
pub mod storage;

pub use error::{Error, Result};
pub use models::{Note, NoteId};
pub use notify::Notifier;
pub use query::{NotePage, NoteQuery, PageRequest};
pub use service::{NoteService, ShareReceipt};
pub use storage::NoteRepository;
