//! API models for request and response payloads

pub mod user;

pub use user::{
    NewUser, ProviderLink, User, UserId, UserIdentifier, UserLogin, UserPersonal, UserRegister,
};
