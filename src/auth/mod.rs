//! Authentication: signup, signin, password hashing, JWT.

mod handlers;
mod jwt;
mod service;

pub use handlers::{Signin, SigninRequest, SigninResponse, Signup, SignupRequest};
pub use jwt::{Claims, JwtSecret};
pub use service::Credentials;
