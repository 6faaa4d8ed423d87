//! Lending Events - JSONL journal
//!
//! Every committed position change is appended to a JSONL journal before
//! it becomes visible in the in-memory ledger. The journal is the Source of
//! Truth: the ledger is rebuilt from it on start-up.

pub mod error;
pub mod event;
pub mod hash;
pub mod journal;
pub mod reader;
pub mod replay;
pub mod store;

pub use error::EventError;
pub use event::{JournalRecord, PositionEvent};
pub use journal::Journal;
pub use reader::EventReader;
pub use replay::{apply_event, replay};
pub use store::EventStore;
