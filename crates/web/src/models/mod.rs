//! Domain models for Secret Santa Paws.

pub mod account;
pub mod exchange;
pub mod profile;
pub mod session;

pub use account::Account;
pub use exchange::{EntrySummary, Exchange, NewEntry};
pub use profile::{Age, Corgi, CorgiInput, MailingAddress, ProfileInput, User};
pub use session::{CurrentIdentity, keys as session_keys};
