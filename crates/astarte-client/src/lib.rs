//! HTTP client for the Astarte AppEngine and Realm Management APIs.

pub mod appengine;
pub mod device_id;
pub mod error;
pub mod paginator;
pub mod realm_management;
pub mod types;

pub use appengine::AppEngineClient;
pub use error::ClientError;
pub use paginator::{DatastreamPaginator, ResultSetOrder};
pub use realm_management::RealmManagementClient;
pub use types::{
    AggregateDatastreamSnapshot, Aggregation, DatastreamValue, DeviceDetails, InterfaceDescription,
    InterfaceIntrospection, InterfaceType,
};
