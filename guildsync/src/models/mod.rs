//! Data model for the sync pipeline

pub mod command;
pub mod credentials;
pub mod member;
pub mod request;
pub mod row;

pub use command::{CommandData, CommandOption, CommandUser, InteractionMember, SyncCommand};
pub use credentials::Credentials;
pub use member::{is_valid_snowflake, RawMember, RawUser};
pub use request::{BackgroundAck, FollowUp, SyncOutcome, SyncRequest};
pub use row::{CanonicalRow, COLUMN_COUNT};
