/// Authentication module
///
/// Token signing/verification, the refresh token registry, login-time
/// identity resolution and the gateway tying them together.

mod bearer;
mod claims;
mod codec;
mod gateway;
mod password;
mod refresh_token;

pub use bearer::bearer_token;
pub use claims::{Claims, Identity};
pub use codec::{TokenCodec, TokenKind};
pub use gateway::{AuthGateway, TokenPair};
pub use password::{
    hash_password, verify_password, Credentials, IdentityProvider, OpenIdentityProvider,
    PasswordIdentityProvider,
};
pub use refresh_token::RefreshTokenStore;
