//! Sync pipeline components

pub mod reconciler;
pub mod record_store;
pub mod roster_client;
pub mod sync_orchestrator;
pub mod token_issuer;
pub mod validation;

pub use record_store::{RecordStore, StoreConfig, StoreError};
pub use roster_client::{RosterClient, RosterClientConfig, RosterError};
pub use sync_orchestrator::{estimated_duration, SyncOrchestrator};
pub use token_issuer::{BearerToken, TokenError, TokenIssuer};
pub use validation::{SyncMode, ValidationError, ValidationStage};
