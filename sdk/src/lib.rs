//! This library contains the GA4 Measurement Protocol event tooling that is
//! shared between the CLI and anything else that needs to build, validate or
//! send events. The pure modules are always available; network access and
//! sharable links are behind features.

/// Error types for the fallible parts of the SDK.
mod error;
pub use error::*;

/// Shape of a single validation finding, shared by every validation source.
mod message;
pub use message::*;

/// Instance and client identifiers.
mod ids;
pub use ids::*;

/// String and number parameter rows and items.
mod parameter;
pub use parameter::*;

/// Catalog of recommended events and the editable state of one event.
pub mod event;
pub use event::{EventState, EventType};

/// Assembly of the JSON payload from the event inputs.
pub mod payload;
pub use payload::assemble_payload;

/// Structural validation against the base content JSON schema.
pub mod schema;

/// Business rules the schema cannot express.
pub mod format_check;
pub use format_check::format_check;

/// Rewriting of findings and documentation links.
pub mod response;
pub use response::{format_error_messages, format_validation_message};

/// HTTP access to the collect and debug collect endpoints.
#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub use client::{MpClient, MpClientBuilder};

/// Encoding and decoding of sharable event links.
#[cfg(feature = "link")]
pub mod link;
#[cfg(feature = "link")]
pub use link::{decode_sharable_link, encode_sharable_link};

/// The four state validation request of an event session.
#[cfg(feature = "lifecycle")]
pub mod lifecycle;
#[cfg(feature = "lifecycle")]
pub use lifecycle::{EventSession, RequestStatus, SessionOptions, ValidationView};
