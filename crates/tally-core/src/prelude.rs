pub use crate::cell::{StateCell, SubId, create_state_cell, state_cell, state_cell_with};
pub use crate::composer::{remember, remember_cell, remember_cell_with_key, remember_with_key};
pub use crate::config::{RuntimeConfig, runtime_config, with_runtime_config};
pub use crate::equality::{Equality, ShallowEq};
pub use crate::error::StateError;
pub use crate::host::Host;
pub use crate::runtime::{FlushReport, batch, flush, turn};
pub use crate::scope::{Scope, current_scope, on_dispose, scoped_effect};
pub use crate::update::{Initial, Update};
pub use crate::view::{Button, Column, Text, View};
