use std::sync::Arc;

use thiserror::Error;

use crate::backend::api::{ApiError, BackendApi};
use crate::domain::Usuario;
use crate::storage::session::{Session, SessionError, SessionStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Login failed: {0}")]
    Api(#[from] ApiError),
    #[error("Session storage failed: {0}")]
    Session(#[from] SessionError),
    #[error("E-mail e senha são obrigatórios")]
    MissingCredentials,
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("Acesso restrito a administradores")]
    AccessDenied,
}

/// Logs users in against the backend and keeps the resulting session in
/// the injected store.
pub struct AuthService {
    api: Arc<dyn BackendApi>,
    store: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(api: Arc<dyn BackendApi>, store: Arc<dyn SessionStore>) -> Self {
        Self { api, store }
    }

    pub async fn login(&self, email: &str, senha: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || senha.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let response = self.api.login(email, senha).await?;
        let session = Session::new(response.token, response.usuario, response.expires_in);
        self.store.set(&session)?;

        tracing::info!("Session stored for {}", session.usuario.email);
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()?;
        tracing::info!("Session cleared");
        Ok(())
    }

    /// The stored session, if it has not expired.
    pub fn session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.store.get()?.filter(Session::is_valid))
    }

    pub fn token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.session()?.map(|s| s.token))
    }

    pub fn is_authenticated(&self) -> bool {
        match self.session() {
            Ok(session) => session.is_some(),
            Err(e) => {
                tracing::warn!("Could not read session: {}", e);
                false
            }
        }
    }

    pub fn current_user(&self) -> Result<Option<Usuario>, AuthError> {
        Ok(self.session()?.map(|s| s.usuario))
    }

    pub fn require_admin(&self) -> Result<Usuario, AuthError> {
        let usuario = self.current_user()?.ok_or(AuthError::NotAuthenticated)?;
        if usuario.is_admin() {
            Ok(usuario)
        } else {
            tracing::warn!("Admin access denied for {}", usuario.email);
            Err(AuthError::AccessDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::api::{LoginResponse, MockBackendApi};
    use crate::domain::Perfil;
    use crate::storage::session::MemorySessionStore;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn usuario(perfil: Perfil) -> Usuario {
        Usuario::new("Ana".to_string(), "ana@away.gov.br".to_string(), perfil)
    }

    fn service_with(api: MockBackendApi) -> (AuthService, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (AuthService::new(Arc::new(api), store.clone()), store)
    }

    fn logged_in(perfil: Perfil) -> AuthService {
        let (service, store) = service_with(MockBackendApi::new());
        store
            .set(&Session::new("tok".to_string(), usuario(perfil), Some(3600)))
            .unwrap();
        service
    }

    #[tokio::test]
    async fn login_stores_session() {
        let mut api = MockBackendApi::new();
        api.expect_login()
            .with(eq("ana@away.gov.br"), eq("s3nha"))
            .times(1)
            .returning(|_, _| {
                Ok(LoginResponse {
                    token: "jwt".to_string(),
                    usuario: usuario(Perfil::Admin),
                    expires_in: Some(3600),
                })
            });
        let (service, store) = service_with(api);

        let session = service.login(" ana@away.gov.br ", "s3nha").await.unwrap();

        assert_eq!(session.token, "jwt");
        assert_eq!(store.get().unwrap(), Some(session));
        assert!(service.is_authenticated());
        assert_eq!(service.token().unwrap(), Some("jwt".to_string()));
    }

    #[tokio::test]
    async fn login_survives_out_of_range_expiry() {
        let mut api = MockBackendApi::new();
        api.expect_login().returning(|_, _| {
            Ok(LoginResponse {
                token: "jwt".to_string(),
                usuario: usuario(Perfil::Agente),
                expires_in: Some(i64::MAX),
            })
        });
        let (service, _) = service_with(api);

        let session = service.login("ana@away.gov.br", "s3nha").await.unwrap();

        assert_eq!(session.expires_at, None);
        assert!(service.is_authenticated());
    }

    #[tokio::test]
    async fn login_rejects_blank_credentials_without_request() {
        let (service, _) = service_with(MockBackendApi::new());

        let result = service.login("  ", "x").await;

        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[tokio::test]
    async fn failed_login_leaves_store_empty() {
        let mut api = MockBackendApi::new();
        api.expect_login()
            .returning(|_, _| Err(ApiError::AuthenticationFailed));
        let (service, store) = service_with(api);

        let result = service.login("ana@away.gov.br", "errada").await;

        assert!(matches!(result, Err(AuthError::Api(ApiError::AuthenticationFailed))));
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn logout_clears_session() {
        let service = logged_in(Perfil::Agente);
        assert!(service.is_authenticated());

        service.logout().unwrap();

        assert!(!service.is_authenticated());
        assert_eq!(service.current_user().unwrap(), None);
    }

    #[test]
    fn expired_session_is_ignored() {
        let (service, store) = service_with(MockBackendApi::new());
        let mut session = Session::new("tok".to_string(), usuario(Perfil::Admin), None);
        session.expires_at = Some(Utc::now() - chrono::Duration::minutes(1));
        store.set(&session).unwrap();

        assert!(!service.is_authenticated());
        assert_eq!(service.token().unwrap(), None);
    }

    #[test]
    fn require_admin_accepts_admin() {
        let service = logged_in(Perfil::Admin);
        assert_eq!(service.require_admin().unwrap().perfil, Perfil::Admin);
    }

    #[test]
    fn require_admin_denies_other_profiles() {
        let service = logged_in(Perfil::Supervisor);
        assert!(matches!(service.require_admin(), Err(AuthError::AccessDenied)));
    }

    #[test]
    fn require_admin_without_session() {
        let (service, _) = service_with(MockBackendApi::new());
        assert!(matches!(service.require_admin(), Err(AuthError::NotAuthenticated)));
    }
}
