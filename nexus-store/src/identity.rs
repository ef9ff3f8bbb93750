// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interface to the external identity provider authenticating users.
use std::fmt;

use nexus_core::PrincipalId;
use thiserror::Error;

/// User as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    /// Stable id, used as foreign key for all ownership and membership fields.
    pub id: PrincipalId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// Third-party sign-in methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FederatedProvider {
    Google,
    GitHub,
}

impl fmt::Display for FederatedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FederatedProvider::Google => "google",
            FederatedProvider::GitHub => "github",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email address {0} is already in use")]
    EmailInUse(String),

    #[error("password needs at least {0} characters")]
    WeakPassword(usize),

    #[error("no account registered for {0}")]
    UnknownEmail(String),

    #[error("no user is signed in")]
    NotSignedIn,

    #[error("federated sign-in with {0} failed")]
    FederatedFailed(FederatedProvider),

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Authenticates users and keeps the current session.
///
/// Two variants of the trait are provided: one which is thread-safe (implementing `Sync`) and one
/// which is purely intended for single-threaded execution contexts.
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Register an account with email and password and sign it in.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError>;

    /// Sign in through a third-party provider, creating the account on first use.
    async fn federated_sign_in(
        &self,
        provider: FederatedProvider,
        token: &str,
    ) -> Result<AuthUser, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Currently signed in user, if any.
    async fn current(&self) -> Result<Option<AuthUser>, IdentityError>;

    /// Change the profile of the signed in user.
    async fn update_profile(
        &self,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<AuthUser, IdentityError>;

    /// Send a password reset message to the given address.
    async fn reset_password(&self, email: &str) -> Result<(), IdentityError>;
}
