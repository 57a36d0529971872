//! Change capture for entity-changelog
//!
//! Turns entity mutations into change logs.
//!
//! # Architecture
//!
//! - `ChangeCapture`: decides whether a mutation is logged (opt-in, enable
//!   flag, lazy update) and builds the `ChangeLog`.
//! - `compute_diff` / `diff_snapshots`: field-level diff between two
//!   snapshots of the same entity, stored as `raw_diff` on updates.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use entity_changelog::capture::{ChangeCapture, Mutation};
//! use entity_changelog::config::Config;
//!
//! let capture = ChangeCapture::new(Arc::new(Config::builder().compute_diff().build()));
//!
//! let prior = ChangeCapture::snapshot(&user)?;
//! user.name = "Bob".into();
//! if let Some(log) = capture.capture(Mutation::Update { prior: Some(&prior) }, &user)? {
//!     store.insert(&log)?;
//! }
//! ```

mod coordinator;
mod diff;

pub use coordinator::{ChangeCapture, Mutation};
pub use diff::{changed_fields, compute_diff, diff_snapshots};
