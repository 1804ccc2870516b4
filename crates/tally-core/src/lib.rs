//! # State cells, batches, and remembered state
//!
//! Tally is a small single‑threaded state layer for UI code. There are three
//! main pieces:
//!
//! - `StateCell<T>` — one value with batched, deferred updates.
//! - `batch` / `turn` — the boundary of one external trigger; requests made
//!   inside are committed together when it ends.
//! - `remember_cell` — a cell bound to a composition slot, created once and
//!   returned again on every later pass.
//!
//! ## Cells
//!
//! A `StateCell<T>` is a cloneable handle. Requests never change what
//! `read()` returns until the batch is committed:
//!
//! ```rust
//! use tally_core::*;
//!
//! let count = state_cell(0);
//! batch(|| {
//!     count.update(|n| n + 1);
//!     count.update(|n| n + 1);
//!     assert_eq!(count.read(), 0); // still the committed value
//! });
//! assert_eq!(count.read(), 2);
//! ```
//!
//! ## Literal vs. functional requests
//!
//! A literal request replaces whatever the batch produced so far. Literals
//! computed from a value read before the batch therefore collapse:
//!
//! ```rust
//! use tally_core::*;
//!
//! let count = state_cell(0);
//! batch(|| {
//!     let n = count.read();
//!     count.set(n + 1);
//!     count.set(n + 1);
//!     count.set(n + 1);
//! });
//! assert_eq!(count.read(), 1);
//! ```
//!
//! Functional requests see the value left by the previous request and
//! accumulate.
//!
//! ## Notification
//!
//! Observers added with `subscribe` run once per commit, after the value is
//! stored, and only if it changed under the cell's comparison. The default
//! comparison is shallow (`Rc`/`Arc` by pointer); call `.structural()` to
//! compare with `PartialEq`.
//!
//! ## Remembered cells
//!
//! ```rust
//! use tally_core::*;
//!
//! fn Counter() -> View {
//!     let count = remember_cell(|| 0i32);
//!     Column(vec![
//!         Text(format!("Count: {}", count.read())),
//!         Button("Increment", {
//!             let count = count.clone();
//!             move || count.update(|n| n + 1)
//!         }),
//!     ])
//! }
//!
//! let mut host = Host::new(Counter);
//! host.click("Increment").unwrap();
//! assert_eq!(host.view().texts(), vec!["Count: 1"]);
//! ```

pub mod cell;
pub mod composer;
pub mod config;
pub mod equality;
pub mod error;
pub mod host;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod tests;
pub mod update;
pub mod view;

pub use cell::*;
pub use composer::*;
pub use config::*;
pub use equality::*;
pub use error::*;
pub use host::*;
pub use runtime::*;
pub use scope::*;
pub use update::*;
pub use view::*;
