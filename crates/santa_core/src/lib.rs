//! Santa Core - assignment generation and reveal tracking
//!
//! This crate provides the derangement generator, the per-user reveal state
//! machine, the storage boundary with its in-memory and SurrealDB backends,
//! and the [`Exchange`] service that ties them together.

pub mod db;
pub mod derangement;
pub mod error;
pub mod exchange;
pub mod id;
pub mod reveal;
pub mod store;
pub mod users;

pub use derangement::{DerangementGenerator, GeneratorConfig, Pairing};
pub use error::{CoreError, Result};
pub use exchange::{AssignmentEntry, Exchange, GenerationSummary, Reveal};
pub use id::{Id, IdType, UserId};
pub use reveal::{Assignment, MarkViewed, RevealState};
pub use store::{MemoryStore, SantaStore};
pub use users::{NewUser, User, UserStatus};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        Assignment, CoreError, DerangementGenerator, Exchange, GeneratorConfig, Id, IdType,
        MarkViewed, MemoryStore, NewUser, Pairing, Result, RevealState, SantaStore, User, UserId,
    };
}
