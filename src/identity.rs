use crate::credentials::CredentialStore;
use crate::error::FormError;
use crate::forms::required;
use serde::{Deserialize, Serialize};

/// How the user identifies themselves before any page is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdentityMode {
    /// Free-text profile id.
    #[default]
    ProfileId,
    /// Display name plus one shared password.
    SharedPassword,
    /// Username/password pairs from the credential store.
    Account,
}

pub const ALL_IDENTITY_MODES: [IdentityMode; 3] = [
    IdentityMode::ProfileId,
    IdentityMode::SharedPassword,
    IdentityMode::Account,
];

impl IdentityMode {
    pub fn label(self) -> &'static str {
        match self {
            IdentityMode::ProfileId => "Profile ID",
            IdentityMode::SharedPassword => "Shared password",
            IdentityMode::Account => "Account",
        }
    }
}

/// The signed-in user. Every user-scoped view filters by `user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub mode: IdentityMode,
}

/// Text typed into the sign-in gate.
#[derive(Debug, Clone, Default)]
pub struct SignInForm {
    pub profile_id: String,
    pub name: String,
    pub username: String,
    pub password: String,
}

/// Check the form for `mode` and open a session.
pub fn sign_in(
    mode: IdentityMode,
    form: &SignInForm,
    shared_password: Option<&str>,
    store: &CredentialStore,
) -> Result<Session, FormError> {
    let user = match mode {
        IdentityMode::ProfileId => required(&form.profile_id, "a profile ID")?,
        IdentityMode::SharedPassword => {
            let name = required(&form.name, "your name")?;
            if form.password.is_empty() {
                return Err(FormError::MissingField("the password"));
            }
            let expected = shared_password
                .filter(|p| !p.is_empty())
                .ok_or(FormError::NoSharedPassword)?;
            if form.password != expected {
                log::warn!("Rejected shared-password sign-in for {name}");
                return Err(FormError::InvalidCredentials);
            }
            name
        }
        IdentityMode::Account => {
            let username = required(&form.username, "a username")?;
            if form.password.is_empty() {
                return Err(FormError::MissingField("a password"));
            }
            if !store.verify(username, &form.password) {
                log::warn!("Rejected sign-in for {username}");
                return Err(FormError::InvalidCredentials);
            }
            username
        }
    };
    log::info!("Signed in as {user} ({})", mode.label());
    Ok(Session {
        user: user.to_string(),
        mode,
    })
}

/// Create an account from the form and sign straight in. The caller persists
/// the store.
pub fn register(form: &SignInForm, store: &mut CredentialStore) -> Result<Session, FormError> {
    store.register(&form.username, &form.password)?;
    sign_in(IdentityMode::Account, form, None, store)
}
