//! Credential and session state machine.
//!
//! # Responsibility
//! - Own the accounts collection and the current session.
//! - Drive `Unauthenticated -> Registering -> Authenticated` and back.
//!
//! # Invariants
//! - At most one session exists; it is persisted under `lms_current_session`.
//! - The session holds a copy of the account taken when it was created.
//! - A persisted session is trusted on hydrate without re-verification.
//! - Access codes are not unique; login takes the first match in creation order.
//! - Credentials (access codes, secrets, one-time codes) are never logged.

use crate::auth::{generate_secret, setup_uri, verify_code, DEFAULT_ACCOUNT_LABEL, ISSUER};
use crate::model::account::{Account, Session};
use crate::repo::collection::Collection;
use crate::store::{load_optional, save, KvStore, StoreError, StoreKey, StoreResult};
use chrono::Utc;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AuthResult<T> = Result<T, AuthError>;

/// Errors from registration, login and logout.
#[derive(Debug)]
pub enum AuthError {
    /// Access code or one-time code was empty.
    MissingInput(&'static str),
    /// `register` called without a pending enrollment.
    RegistrationNotStarted,
    /// Operation requires signing out first.
    AlreadyAuthenticated,
    /// No account has the given access code.
    AccountNotFound,
    /// One-time code failed the verification predicate.
    CredentialRejected,
    Store(StoreError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInput(field) => write!(f, "{field} must not be empty"),
            Self::RegistrationNotStarted => write!(f, "registration has not been started"),
            Self::AlreadyAuthenticated => write!(f, "a session is already active"),
            Self::AccountNotFound => write!(f, "invalid access code"),
            Self::CredentialRejected => write!(f, "invalid 2FA code"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Ephemeral enrollment material. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingRegistration {
    secret: String,
    setup_uri: String,
}

impl PendingRegistration {
    fn generate() -> Self {
        let secret = generate_secret();
        let setup_uri = setup_uri(ISSUER, DEFAULT_ACCOUNT_LABEL, &secret);
        Self { secret, setup_uri }
    }

    /// Base32 secret the user types into an authenticator if scanning fails.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// `otpauth://` URI to render as a scannable code.
    pub fn setup_uri(&self) -> &str {
        &self.setup_uri
    }
}

impl std::fmt::Debug for PendingRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRegistration").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Registering(PendingRegistration),
    Authenticated(Session),
}

impl AuthState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Registering(_) => "registering",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

/// Owner of accounts and the current session.
#[derive(Debug)]
pub struct SessionService {
    accounts: Collection<Account>,
    state: AuthState,
}

impl SessionService {
    /// Loads accounts and resumes a persisted session if one exists.
    pub fn hydrate<S: KvStore + ?Sized>(store: &S) -> StoreResult<Self> {
        let accounts = Collection::load(store, StoreKey::Accounts)?;
        let state = match load_optional::<Session, _>(store, StoreKey::CurrentSession)? {
            Some(session) => {
                info!(
                    "event=session_resume module=auth status=ok account_id={}",
                    session.account_id()
                );
                AuthState::Authenticated(session)
            }
            None => AuthState::Unauthenticated,
        };
        Ok(Self { accounts, state })
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn accounts(&self) -> &[Account] {
        self.accounts.items()
    }

    /// Enters `Registering` with a fresh secret, replacing any previous one.
    pub fn start_registration(&mut self) -> AuthResult<PendingRegistration> {
        if self.is_authenticated() {
            return Err(AuthError::AlreadyAuthenticated);
        }
        let pending = PendingRegistration::generate();
        self.state = AuthState::Registering(pending.clone());
        info!("event=auth_register module=auth status=start");
        Ok(pending)
    }

    /// Leaves `Registering` without creating an account.
    pub fn cancel_registration(&mut self) {
        if matches!(self.state, AuthState::Registering(_)) {
            self.state = AuthState::Unauthenticated;
            info!("event=auth_register module=auth status=cancelled");
        }
    }

    /// Creates an account bound to the pending secret and signs it in.
    ///
    /// On a rejected code the pending secret is kept so the user can retry.
    /// Duplicate access codes are accepted.
    pub fn register<S: KvStore + ?Sized>(
        &mut self,
        store: &S,
        access_code: &str,
        totp_code: &str,
    ) -> AuthResult<Session> {
        require_input(access_code, totp_code)?;
        let secret = match &self.state {
            AuthState::Registering(pending) => pending.secret.clone(),
            AuthState::Authenticated(_) => return Err(AuthError::AlreadyAuthenticated),
            AuthState::Unauthenticated => return Err(AuthError::RegistrationNotStarted),
        };

        if !verify_code(&secret, totp_code) {
            warn!("event=auth_register module=auth status=error error_code=credential_rejected");
            return Err(AuthError::CredentialRejected);
        }

        let account = Account::new(store.next_id()?, access_code, secret, Utc::now());
        let account = self.accounts.append(store, account)?.clone();
        let session = match self.persist_session(store, account) {
            Ok(session) => session,
            Err(err) => {
                self.rollback_account(store);
                return Err(err.into());
            }
        };
        info!(
            "event=auth_register module=auth status=ok account_id={} accounts_total={}",
            session.account_id(),
            self.accounts.len()
        );
        Ok(session)
    }

    /// Signs in the first account whose access code matches.
    pub fn login<S: KvStore + ?Sized>(
        &mut self,
        store: &S,
        access_code: &str,
        totp_code: &str,
    ) -> AuthResult<Session> {
        require_input(access_code, totp_code)?;
        if self.is_authenticated() {
            return Err(AuthError::AlreadyAuthenticated);
        }

        let account = match self
            .accounts
            .items()
            .iter()
            .find(|account| account.access_code == access_code)
        {
            Some(account) => account.clone(),
            None => {
                warn!("event=auth_login module=auth status=error error_code=account_not_found");
                return Err(AuthError::AccountNotFound);
            }
        };

        if !verify_code(&account.totp_secret, totp_code) {
            warn!(
                "event=auth_login module=auth status=error error_code=credential_rejected account_id={}",
                account.id
            );
            return Err(AuthError::CredentialRejected);
        }

        let session = self.persist_session(store, account)?;
        info!(
            "event=auth_login module=auth status=ok account_id={}",
            session.account_id()
        );
        Ok(session)
    }

    /// Ends the session and deletes its persisted copy. Accounts are kept.
    ///
    /// Idempotent: signing out while signed out only re-deletes the key.
    pub fn logout<S: KvStore + ?Sized>(&mut self, store: &S) -> StoreResult<()> {
        store.delete(StoreKey::CurrentSession.as_str())?;
        if let AuthState::Authenticated(session) = &self.state {
            info!(
                "event=auth_logout module=auth status=ok account_id={}",
                session.account_id()
            );
        }
        self.state = AuthState::Unauthenticated;
        Ok(())
    }

    /// Forgets accounts and session after the store was wiped.
    pub fn reset(&mut self) {
        self.accounts.reset();
        self.state = AuthState::Unauthenticated;
    }

    /// Drops the account appended by a registration whose session write failed.
    ///
    /// When the rollback itself fails the pending secret is discarded, so a
    /// retry has to enroll again instead of reusing it.
    fn rollback_account<S: KvStore + ?Sized>(&mut self, store: &S) {
        match self.accounts.remove_last(store) {
            Ok(_) => warn!(
                "event=auth_register module=auth status=error error_code=session_write_failed rollback=ok"
            ),
            Err(err) => {
                error!(
                    "event=auth_register module=auth status=error error_code=session_write_failed rollback=failed error={}",
                    err
                );
                self.state = AuthState::Unauthenticated;
            }
        }
    }

    fn persist_session<S: KvStore + ?Sized>(
        &mut self,
        store: &S,
        account: Account,
    ) -> StoreResult<Session> {
        let session = Session::new(account);
        save(store, StoreKey::CurrentSession, &session)?;
        self.state = AuthState::Authenticated(session.clone());
        Ok(session)
    }
}

fn require_input(access_code: &str, totp_code: &str) -> AuthResult<()> {
    if access_code.is_empty() {
        return Err(AuthError::MissingInput("access code"));
    }
    if totp_code.is_empty() {
        return Err(AuthError::MissingInput("2FA code"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AuthError, AuthState, SessionService};
    use crate::db::open_db_in_memory;
    use crate::store::{KvStore, SqliteKvStore, StoreKey};

    fn store() -> SqliteKvStore {
        SqliteKvStore::new(open_db_in_memory().expect("open db"))
    }

    #[test]
    fn register_without_start_is_rejected() {
        let store = store();
        let mut service = SessionService::hydrate(&store).expect("hydrate");
        let err = service
            .register(&store, "alice", "123456")
            .expect_err("must start registration first");
        assert!(matches!(err, AuthError::RegistrationNotStarted));
    }

    #[test]
    fn rejected_code_keeps_pending_secret() {
        let store = store();
        let mut service = SessionService::hydrate(&store).expect("hydrate");
        let secret = service
            .start_registration()
            .expect("start")
            .secret()
            .to_string();

        let err = service
            .register(&store, "alice", "12a456")
            .expect_err("non-digit code");
        assert!(matches!(err, AuthError::CredentialRejected));
        match service.state() {
            AuthState::Registering(pending) => assert_eq!(pending.secret(), secret),
            other => panic!("unexpected state: {}", other.label()),
        }
        assert!(service.accounts().is_empty());
    }

    #[test]
    fn register_binds_pending_secret_to_account() {
        let store = store();
        let mut service = SessionService::hydrate(&store).expect("hydrate");
        let secret = service
            .start_registration()
            .expect("start")
            .secret()
            .to_string();

        let session = service.register(&store, "alice", "123456").expect("register");
        assert_eq!(session.account().totp_secret, secret);
        assert_eq!(session.account().access_code, "alice");
        assert!(store
            .get(StoreKey::CurrentSession.as_str())
            .expect("get")
            .is_some());
    }

    #[test]
    fn empty_inputs_are_rejected_before_lookup() {
        let store = store();
        let mut service = SessionService::hydrate(&store).expect("hydrate");
        assert!(matches!(
            service.login(&store, "", "123456"),
            Err(AuthError::MissingInput(_))
        ));
        assert!(matches!(
            service.login(&store, "alice", ""),
            Err(AuthError::MissingInput(_))
        ));
    }

    #[test]
    fn cancel_registration_returns_to_unauthenticated() {
        let store = store();
        let mut service = SessionService::hydrate(&store).expect("hydrate");
        service.start_registration().expect("start");
        service.cancel_registration();
        assert_eq!(service.state(), &AuthState::Unauthenticated);
    }

    #[test]
    fn pending_registration_debug_hides_secret() {
        let store = store();
        let mut service = SessionService::hydrate(&store).expect("hydrate");
        let pending = service.start_registration().expect("start");
        assert!(!format!("{pending:?}").contains(pending.secret()));
    }
}
