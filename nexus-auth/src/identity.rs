// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolving the acting principal from the identity provider.
use nexus_core::{Principal, PrincipalPatch};
use nexus_store::{AuthUser, FederatedProvider, IdentityProvider, PrincipalStore};
use tracing::debug;

use crate::error::NexusError;

/// Maps users of the identity provider to principal records.
///
/// Principal records are created the first time a user is seen, with the student role and empty
/// membership sets.
#[derive(Clone, Debug)]
pub struct IdentityResolver<S, I> {
    store: S,
    identity: I,
}

impl<S, I> IdentityResolver<S, I>
where
    S: PrincipalStore,
    I: IdentityProvider,
{
    pub fn new(store: S, identity: I) -> Self {
        Self { store, identity }
    }

    /// The signed in principal, or [`NexusError::Unauthenticated`].
    pub async fn current(&self) -> Result<Principal, NexusError> {
        let user = self
            .identity
            .current()
            .await?
            .ok_or(NexusError::Unauthenticated)?;
        self.ensure_record(user).await
    }

    /// The signed in principal, `None` when nobody is signed in.
    pub async fn current_opt(&self) -> Result<Option<Principal>, NexusError> {
        match self.identity.current().await? {
            Some(user) => Ok(Some(self.ensure_record(user).await?)),
            None => Ok(None),
        }
    }

    async fn ensure_record(&self, user: AuthUser) -> Result<Principal, NexusError> {
        if let Some(principal) = self.store.get_principal(&user.id).await? {
            return Ok(principal);
        }

        let mut principal = Principal::new(user.id, user.display_name, user.email);
        principal.photo_url = user.photo_url;

        if self.store.insert_principal(principal.clone()).await? {
            debug!(id = %principal.id, "created principal record");
            return Ok(principal);
        }

        // Created concurrently by another request.
        self.store
            .get_principal(&principal.id)
            .await?
            .ok_or(NexusError::Unauthenticated)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Principal, NexusError> {
        let user = self.identity.sign_up(email, password, display_name).await?;
        self.ensure_record(user).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, NexusError> {
        let user = self.identity.sign_in(email, password).await?;
        self.ensure_record(user).await
    }

    pub async fn federated_sign_in(
        &self,
        provider: FederatedProvider,
        token: &str,
    ) -> Result<Principal, NexusError> {
        let user = self.identity.federated_sign_in(provider, token).await?;
        self.ensure_record(user).await
    }

    pub async fn sign_out(&self) -> Result<(), NexusError> {
        Ok(self.identity.sign_out().await?)
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), NexusError> {
        Ok(self.identity.reset_password(email).await?)
    }

    /// Update the signed in principal's profile, including their role.
    ///
    /// Display name and photo are also changed with the identity provider.
    pub async fn update_profile(&self, patch: &PrincipalPatch) -> Result<Principal, NexusError> {
        if patch.is_empty() {
            return Err(NexusError::Invalid("profile update without any changes".into()));
        }

        let principal = self.current().await?;

        if patch.display_name.is_some() || patch.photo_url.is_some() {
            self.identity
                .update_profile(patch.display_name.as_deref(), patch.photo_url.as_deref())
                .await?;
        }

        if !self.store.update_principal(&principal.id, patch).await? {
            return Err(NexusError::NotFound);
        }

        debug!(id = %principal.id, role = ?patch.role, "updated profile");
        self.store
            .get_principal(&principal.id)
            .await?
            .ok_or(NexusError::NotFound)
    }
}
