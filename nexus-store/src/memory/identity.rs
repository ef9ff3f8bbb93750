// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use nexus_core::PrincipalId;
use rand::RngCore;

use crate::identity::{AuthUser, FederatedProvider, IdentityError, IdentityProvider};

/// Minimum number of characters accepted for passwords.
pub const MIN_PASSWORD_LEN: usize = 6;

const SALT_LEN: usize = 16;

#[derive(Clone, Debug)]
struct Account {
    user: AuthUser,
    credentials: Option<Credentials>,
}

#[derive(Clone, Debug)]
struct Credentials {
    salt: [u8; SALT_LEN],
    hash: blake3::Hash,
}

impl Credentials {
    fn new(password: &str) -> Self {
        let mut salt = [0; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        Self {
            salt,
            hash: hash_password(&salt, password),
        }
    }

    fn verify(&self, password: &str) -> bool {
        // `blake3::Hash` compares in constant time.
        self.hash == hash_password(&self.salt, password)
    }
}

fn hash_password(salt: &[u8; SALT_LEN], password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Default)]
struct InnerIdentityProvider {
    accounts: BTreeMap<PrincipalId, Account>,
    emails: HashMap<String, PrincipalId>,
    federated: HashMap<(FederatedProvider, String), PrincipalId>,
    session: Option<PrincipalId>,
    password_resets: Vec<String>,
}

impl InnerIdentityProvider {
    fn create_account(&mut self, user: AuthUser, credentials: Option<Credentials>) -> AuthUser {
        if let Some(email) = &user.email {
            self.emails.insert(normalize_email(email), user.id.clone());
        }
        self.session = Some(user.id.clone());
        self.accounts.insert(
            user.id.clone(),
            Account {
                user: user.clone(),
                credentials,
            },
        );
        user
    }
}

/// In-memory identity provider with email/password accounts, federated accounts and a single
/// signed-in session.
///
/// Passwords are stored salted and hashed with BLAKE3. Password reset messages are not sent
/// anywhere, they are collected and can be inspected with [`Self::password_resets`].
#[derive(Clone, Debug, Default)]
pub struct MemoryIdentityProvider {
    inner: Arc<RwLock<InnerIdentityProvider>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses password reset messages were requested for, oldest first.
    pub fn password_resets(&self) -> Result<Vec<String>, IdentityError> {
        Ok(self.read()?.password_resets.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, InnerIdentityProvider>, IdentityError> {
        self.inner
            .read()
            .map_err(|_| IdentityError::Unavailable("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, InnerIdentityProvider>, IdentityError> {
        self.inner
            .write()
            .map_err(|_| IdentityError::Unavailable("lock poisoned".into()))
    }
}

fn random_principal_id() -> PrincipalId {
    let mut bytes = [0; 14];
    rand::rng().fill_bytes(&mut bytes);
    PrincipalId::new(hex::encode(bytes))
}

impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, IdentityError> {
        let normalized = normalize_email(email);
        if normalized.is_empty() || !normalized.contains('@') {
            return Err(IdentityError::InvalidCredentials);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword(MIN_PASSWORD_LEN));
        }

        let mut inner = self.write()?;
        if inner.emails.contains_key(&normalized) {
            return Err(IdentityError::EmailInUse(normalized));
        }

        let user = AuthUser {
            id: random_principal_id(),
            display_name: display_name.map(str::to_owned),
            email: Some(email.trim().to_owned()),
            photo_url: None,
        };
        Ok(inner.create_account(user, Some(Credentials::new(password))))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError> {
        let mut inner = self.write()?;
        let account = inner
            .emails
            .get(&normalize_email(email))
            .and_then(|id| inner.accounts.get(id))
            .ok_or(IdentityError::InvalidCredentials)?;

        let verified = account
            .credentials
            .as_ref()
            .is_some_and(|credentials| credentials.verify(password));
        if !verified {
            return Err(IdentityError::InvalidCredentials);
        }

        let user = account.user.clone();
        inner.session = Some(user.id.clone());
        Ok(user)
    }

    async fn federated_sign_in(
        &self,
        provider: FederatedProvider,
        token: &str,
    ) -> Result<AuthUser, IdentityError> {
        let subject = token.trim();
        if subject.is_empty() {
            return Err(IdentityError::FederatedFailed(provider));
        }

        let mut inner = self.write()?;
        let key = (provider, subject.to_owned());
        if let Some(user) = inner
            .federated
            .get(&key)
            .and_then(|id| inner.accounts.get(id))
            .map(|account| account.user.clone())
        {
            inner.session = Some(user.id.clone());
            return Ok(user);
        }

        let user = AuthUser {
            id: random_principal_id(),
            display_name: None,
            email: None,
            photo_url: None,
        };
        inner.federated.insert(key, user.id.clone());
        Ok(inner.create_account(user, None))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.write()?.session = None;
        Ok(())
    }

    async fn current(&self) -> Result<Option<AuthUser>, IdentityError> {
        let inner = self.read()?;
        Ok(inner
            .session
            .as_ref()
            .and_then(|id| inner.accounts.get(id))
            .map(|account| account.user.clone()))
    }

    async fn update_profile(
        &self,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<AuthUser, IdentityError> {
        let mut inner = self.write()?;
        let id = inner.session.clone().ok_or(IdentityError::NotSignedIn)?;
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or(IdentityError::NotSignedIn)?;

        if let Some(display_name) = display_name {
            account.user.display_name = Some(display_name.to_owned());
        }
        if let Some(photo_url) = photo_url {
            account.user.photo_url = Some(photo_url.to_owned());
        }

        Ok(account.user.clone())
    }

    async fn reset_password(&self, email: &str) -> Result<(), IdentityError> {
        let normalized = normalize_email(email);
        let mut inner = self.write()?;
        if !inner.emails.contains_key(&normalized) {
            return Err(IdentityError::UnknownEmail(normalized));
        }

        inner.password_resets.push(normalized);
        Ok(())
    }
}
