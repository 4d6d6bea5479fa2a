//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Every remote collaborator the core depends on is reached through one of
//! these traits. Each exposes a strongly typed error so adapters map their
//! failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod blood_request_api;
mod dictionary_source;
mod identity_api;

#[cfg(test)]
pub use blood_request_api::MockBloodRequestApi;
pub use blood_request_api::{
    BloodRequestApi, BloodRequestApiError, FixtureBloodRequestApi, RemoteAck,
};
#[cfg(test)]
pub use dictionary_source::MockDictionarySource;
pub use dictionary_source::{DictionarySource, FixtureDictionarySource};
#[cfg(test)]
pub use identity_api::MockIdentityApi;
pub use identity_api::{FixtureIdentityApi, IdentityApi, IdentityApiError};
