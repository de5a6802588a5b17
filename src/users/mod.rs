//! User accounts: the record store the auth core reads from, plus the
//! credential helpers registration and login need.

mod model;
mod store;
mod password;
mod validate;

pub use model::{NewUser, User, UserPatch, UserView};
pub use store::{MemoryUserStore, UserStore, UserStoreError};
pub use password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking};
pub use validate::{is_email, normalize_username, UsernameError};
