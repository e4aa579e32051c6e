//! # owbc-app - State Synchronization Engine
//!
//! The model/message/update core of the console (TEA pattern). The
//! rendering layer translates user gestures into [`message::Message`]
//! values, feeds them to [`handler::update`], and executes the returned
//! [`handler::Task`] through [`tasks::run`].
//!
//! Everything with non-trivial invariants lives here:
//! - [`table`]: per-scope sortable/filterable/selectable row state
//! - [`cascade`]: the version → target → subtarget → platform chain
//! - [`poller`]: visibility-gated periodic build refresh
//! - [`bulk`]: sequential multi-delete with partial-failure accounting
//! - [`templates`]: generation-stamped creation templates

pub mod bulk;
pub mod cascade;
pub mod handler;
pub mod input_key;
pub mod message;
pub mod poller;
pub mod state;
pub mod table;
pub mod tasks;
pub mod templates;

pub use handler::{update, Task, UpdateResult};
pub use input_key::InputKey;
pub use message::Message;
pub use state::{AnchorRect, AppState, EntryPurpose, Popover, PopoverKind, TextEntry, View};
pub use table::{EntityTable, SortDirection, SortField, SortState};
