//! Credentials and sessions: signing, issuing, liveness, and request authorization.
//! Keep the public surface thin and split implementation across sub-modules.

mod claims;
mod codec;
mod errors;
mod gate;
mod issuer;
mod request_context;
mod service;
mod session;

pub use claims::SessionClaims;
pub use codec::{CodecError, CredentialKeys};
pub use errors::AuthError;
pub use gate::AuthorizationGate;
pub use issuer::{CredentialIssuer, IssueError, IssuedCredential};
pub use request_context::RequestContext;
pub use service::{LoginCredentials, SessionService, TokenSettings};
pub use session::{MemorySessionStore, SessionRegistry, SessionStore, SessionStoreError};
