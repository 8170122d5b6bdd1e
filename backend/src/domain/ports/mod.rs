//! Domain ports and supporting types for the hexagonal boundary.

mod parcel_command;
mod parcel_query;
mod parcel_repository;
mod user_directory;
mod user_repository;

#[cfg(test)]
pub use parcel_command::MockParcelCommand;
pub use parcel_command::{
    AssignReceiverRequest, CreateParcelRequest, FixtureParcelCommand, ParcelCommand,
    ParcelPayload, ParcelResponse, StatusLogPayload, TransitionRequest,
};
#[cfg(test)]
pub use parcel_query::MockParcelQuery;
pub use parcel_query::{
    FixtureParcelQuery, ListParcelsRequest, ListParcelsResponse, ParcelHistoryRequest,
    ParcelHistoryResponse, ParcelQuery, PublicParcelPayload, PublicStatusLogPayload,
    TrackParcelRequest, TrackParcelResponse,
};
#[cfg(test)]
pub use parcel_repository::MockParcelRepository;
pub use parcel_repository::{FixtureParcelRepository, ParcelRepository, ParcelRepositoryError};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{
    FixtureUserDirectory, ListUsersResponse, RegisterUserRequest, UserDirectory, UserPayload,
    UserResponse,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserRepository, UserRepositoryError};
