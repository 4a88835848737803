//! Token response decoding, the trust-gated response handler, and the
//! caller-facing result types.

pub mod handler;
pub mod id_token;
pub mod result;
pub mod token_response;

pub use handler::ResponseHandler;
pub use id_token::{ClientInfo, IdToken, IdTokenClaims};
pub use result::{AccountInfo, AuthenticationResult};
pub use token_response::ServerTokenResponse;
