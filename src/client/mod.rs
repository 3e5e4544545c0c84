//! Backend client handle and the notification-count widget built on it.

mod handle;
mod notifications;

pub use handle::{
    BackendClient, CallInterceptor, ChangeEvent, ChangeNotification, ClientHandle, QueryFilter,
    QueryResult, SubscriptionId, User,
};
pub use notifications::NotificationCounter;
