//! Intent construction: typed mutation/fetch contracts and the pure
//! action factory that builds them with sensible side-effect defaults.

mod factory;
mod types;

pub use factory::{
    crud_create, crud_delete, crud_delete_many, crud_get_list, crud_get_many,
    crud_get_many_reference, crud_get_one, crud_update, crud_update_many,
};
pub use types::{
    IntentMeta, MutationIntent, MutationKind, NotificationEffect, QueryIntent, QueryKind,
    RedirectTo, SideEffects,
};
