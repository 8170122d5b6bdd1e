//! Domain layer: parcel lifecycle, fees, tracking identifiers, account
//! administration, and the ports that bound them.

pub mod config;
pub mod error;
pub mod fees;
pub mod parcel;
pub mod parcel_query_service;
pub mod parcel_service;
pub mod ports;
pub mod tracking;
pub mod transitions;
pub mod user;
pub mod user_service;

pub use config::ParcelServiceConfig;
pub use error::{Error, ErrorCode, ErrorValidationError};
pub use parcel::{Parcel, ParcelStatus, StatusLogEntry};
pub use parcel_query_service::ParcelQueryService;
pub use parcel_service::ParcelCommandService;
pub use tracking::TrackingCode;
pub use user::{Actor, Role, User, UserId};
pub use user_service::UserDirectoryService;
