//! Domain types shared across the workspace

mod crud;
mod list;
mod live;
mod meta;
mod notification;
mod pagination;

pub use crud::{ConditionalOperator, CrudFilter, CrudFilters, CrudOperator, CrudSort, CrudSorting, SortOrder};
pub use list::{BaseRecord, ListResult};
pub use live::{LiveEvent, LiveEventType, LiveMode};
pub use meta::Meta;
pub use notification::{CancelMutation, NotificationKind, OpenNotificationParams};
pub use pagination::{Pagination, PaginationInput, PaginationMode};
