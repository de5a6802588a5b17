use uuid::Uuid;

use crate::users::UserView;

/// Authenticated identity attached to a request by the authorization gate.
/// Handlers behind the gate read it with `Extension<RequestContext>`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: UserView,
    pub access_session_id: Uuid,
}
