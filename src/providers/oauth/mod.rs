//! OAuth providers for the Google account.
//!
//! [`OAuthClient`] is the seam between the credential service and the
//! network; [`GoogleOAuthClient`] implements it against Google's endpoints.

mod google;
mod traits;

pub use google::GoogleOAuthClient;
pub use traits::{AuthError, AuthResult, OAuthClient};
