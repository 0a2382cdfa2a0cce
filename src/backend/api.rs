use std::time::{Duration, Instant};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::backend::mapper::{
    self, WireAssistido, WireComparecimento, WireLoginRequest, WireLoginResponse, WireUsuario,
};
use crate::domain::{Assistido, Comparecimento, ComparecimentoFiltro, Usuario, UsuarioFiltro};
use crate::storage::config::ApiConfig;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Access forbidden")]
    Forbidden,
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Assistido,
    Comparecimento,
    Usuario,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Assistido => "assistido",
            Self::Comparecimento => "comparecimento",
            Self::Usuario => "usuario",
        }
    }
}

const FIND_ALL: &str = "findAll";
const FIND_BY_ID: &str = "findById";
const SAVE: &str = "save";
const UPDATE: &str = "update";
const DELETE: &str = "delete";
const NUM_PROCESSO: &str = "numProcesso";
const AUTH_LOGIN: &str = "auth/login";

#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub usuario: Usuario,
    pub expires_in: Option<i64>,
}

/// `findAll` answers with either a bare array or a Spring-style page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Plain(Vec<T>),
    Paged { content: Vec<T> },
}

impl<T> ListPayload<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::Plain(items) | Self::Paged { content: items } => items,
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn login(&self, email: &str, senha: &str) -> Result<LoginResponse, ApiError>;

    async fn list_assistidos(&self) -> Result<Vec<Assistido>, ApiError>;
    async fn get_assistido(&self, id: i64) -> Result<Assistido, ApiError>;
    async fn find_assistidos_by_processo(&self, numero_processo: &str) -> Result<Vec<Assistido>, ApiError>;
    async fn create_assistido(&self, assistido: &Assistido) -> Result<Assistido, ApiError>;
    async fn update_assistido(&self, id: i64, assistido: &Assistido) -> Result<Assistido, ApiError>;
    async fn delete_assistido(&self, id: i64) -> Result<(), ApiError>;

    async fn list_comparecimentos(&self, filtro: &ComparecimentoFiltro) -> Result<Vec<Comparecimento>, ApiError>;
    async fn get_comparecimento(&self, id: i64) -> Result<Comparecimento, ApiError>;
    async fn create_comparecimento(&self, comparecimento: &Comparecimento) -> Result<Comparecimento, ApiError>;
    async fn update_comparecimento(
        &self,
        id: i64,
        comparecimento: &Comparecimento,
    ) -> Result<Comparecimento, ApiError>;
    async fn set_attendance(&self, id: i64, compareceu: bool) -> Result<(), ApiError>;
    async fn delete_comparecimento(&self, id: i64) -> Result<(), ApiError>;

    async fn list_usuarios(&self, filtro: &UsuarioFiltro) -> Result<Vec<Usuario>, ApiError>;
    async fn get_usuario(&self, id: i64) -> Result<Usuario, ApiError>;
    async fn create_usuario(&self, usuario: &Usuario) -> Result<Usuario, ApiError>;
    async fn update_usuario(&self, id: i64, usuario: &Usuario) -> Result<Usuario, ApiError>;
    async fn delete_usuario(&self, id: i64) -> Result<(), ApiError>;

    /// Round-trip time of any HTTP answer from the backend.
    async fn ping(&self) -> Result<Duration, ApiError>;
}

pub struct AppAwayClient {
    base_url: String,
    token_prefix: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl AppAwayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_prefix: "Bearer ".to_string(),
            token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_prefix: config.token_prefix.clone(),
            token: None,
            client,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, resource: Resource, action: &str) -> String {
        format!("{}/{}/{}", self.base_url, resource.path(), action)
    }

    fn url_with_id(&self, resource: Resource, action: &str, id: i64) -> String {
        format!("{}/{}", self.url(resource, action), id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header(
                reqwest::header::AUTHORIZATION,
                format!("{}{}", self.token_prefix, token),
            ),
            None => builder,
        }
    }

    async fn check(&self, response: Response, subject: &str) -> Result<Response, ApiError> {
        let status = response.status();
        tracing::debug!("{} response status: {}", subject, status);

        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::error!("Authentication failed for {}", subject);
                Err(ApiError::AuthenticationFailed)
            }
            StatusCode::FORBIDDEN => {
                tracing::error!("Access forbidden for {}", subject);
                Err(ApiError::Forbidden)
            }
            StatusCode::NOT_FOUND => {
                tracing::warn!("Not found: {}", subject);
                Err(ApiError::NotFound(subject.to_string()))
            }
            s if !s.is_success() => {
                let body = response.text().await?;
                tracing::error!("Request for {} failed. Status: {}, Body: {}", subject, s, body);
                Err(ApiError::RequestError(format!("Status {}: {}", s, body)))
            }
            _ => Ok(response),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);
        let response = self.request(Method::GET, url).query(query).send().await?;
        let response = self.check(response, subject).await?;
        Ok(response.json().await?)
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> Result<Vec<T>, ApiError> {
        let payload: ListPayload<T> = self.fetch(url, query, subject).await?;
        Ok(payload.into_items())
    }

    async fn send<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        subject: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!("{} {}", method, url);
        let response = self.request(method, url).json(body).send().await?;
        let response = self.check(response, subject).await?;
        Ok(response.json().await?)
    }

    async fn remove(&self, url: &str, subject: &str) -> Result<(), ApiError> {
        tracing::debug!("DELETE {}", url);
        let response = self.request(Method::DELETE, url).send().await?;
        self.check(response, subject).await?;
        tracing::info!("Deleted {}", subject);
        Ok(())
    }
}

fn map_comparecimentos(items: Vec<WireComparecimento>) -> Vec<Comparecimento> {
    items
        .into_iter()
        .filter_map(|wire| match mapper::comparecimento_from_wire(wire) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!("Skipping comparecimento from backend: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl BackendApi for AppAwayClient {
    async fn login(&self, email: &str, senha: &str) -> Result<LoginResponse, ApiError> {
        let url = format!("{}/{}", self.base_url, AUTH_LOGIN);
        tracing::info!("Logging in as {}", email);

        let body = WireLoginRequest { email, senha };
        let response: WireLoginResponse = self.send(Method::POST, &url, &body, "login").await?;

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::ParseError("Login response without token".to_string()))?;
        let usuario = mapper::usuario_from_wire(response.usuario.unwrap_or_default());

        tracing::info!("Logged in as {} ({})", usuario.nome, usuario.perfil.label());
        Ok(LoginResponse {
            token,
            usuario,
            expires_in: response.expires_in,
        })
    }

    async fn list_assistidos(&self) -> Result<Vec<Assistido>, ApiError> {
        let url = self.url(Resource::Assistido, FIND_ALL);
        let items: Vec<WireAssistido> = self.fetch_list(&url, &[], "assistidos").await?;
        tracing::info!("Fetched {} assistidos", items.len());
        Ok(items.into_iter().map(mapper::assistido_from_wire).collect())
    }

    async fn get_assistido(&self, id: i64) -> Result<Assistido, ApiError> {
        let url = self.url_with_id(Resource::Assistido, FIND_BY_ID, id);
        let wire: WireAssistido = self.fetch(&url, &[], &format!("assistido {}", id)).await?;
        Ok(mapper::assistido_from_wire(wire))
    }

    async fn find_assistidos_by_processo(&self, numero_processo: &str) -> Result<Vec<Assistido>, ApiError> {
        let url = self.url(Resource::Assistido, NUM_PROCESSO);
        let query = [("numProcesso", numero_processo.to_string())];
        let items: Vec<WireAssistido> = self
            .fetch_list(&url, &query, &format!("processo {}", numero_processo))
            .await?;
        Ok(items.into_iter().map(mapper::assistido_from_wire).collect())
    }

    async fn create_assistido(&self, assistido: &Assistido) -> Result<Assistido, ApiError> {
        let url = self.url(Resource::Assistido, SAVE);
        tracing::info!("Creating assistido {}", assistido.nome);
        let wire: WireAssistido = self
            .send(Method::POST, &url, &mapper::assistido_to_wire(assistido), "new assistido")
            .await?;
        Ok(mapper::assistido_from_wire(wire))
    }

    async fn update_assistido(&self, id: i64, assistido: &Assistido) -> Result<Assistido, ApiError> {
        let url = self.url_with_id(Resource::Assistido, UPDATE, id);
        tracing::info!("Updating assistido {}", id);
        let wire: WireAssistido = self
            .send(Method::PUT, &url, &mapper::assistido_to_wire(assistido), &format!("assistido {}", id))
            .await?;
        Ok(mapper::assistido_from_wire(wire))
    }

    async fn delete_assistido(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url_with_id(Resource::Assistido, DELETE, id);
        self.remove(&url, &format!("assistido {}", id)).await
    }

    async fn list_comparecimentos(&self, filtro: &ComparecimentoFiltro) -> Result<Vec<Comparecimento>, ApiError> {
        let url = self.url(Resource::Comparecimento, FIND_ALL);
        let items: Vec<WireComparecimento> = self
            .fetch_list(&url, &filtro.query_params(), "comparecimentos")
            .await?;
        let comparecimentos = map_comparecimentos(items);
        tracing::info!("Fetched {} comparecimentos", comparecimentos.len());
        Ok(comparecimentos)
    }

    async fn get_comparecimento(&self, id: i64) -> Result<Comparecimento, ApiError> {
        let url = self.url_with_id(Resource::Comparecimento, FIND_BY_ID, id);
        let wire: WireComparecimento = self.fetch(&url, &[], &format!("comparecimento {}", id)).await?;
        mapper::comparecimento_from_wire(wire).map_err(|e| ApiError::ParseError(e.to_string()))
    }

    async fn create_comparecimento(&self, comparecimento: &Comparecimento) -> Result<Comparecimento, ApiError> {
        let url = self.url(Resource::Comparecimento, SAVE);
        tracing::info!("Creating comparecimento on {}", comparecimento.data);
        let wire: WireComparecimento = self
            .send(
                Method::POST,
                &url,
                &mapper::comparecimento_to_wire(comparecimento),
                "new comparecimento",
            )
            .await?;
        mapper::comparecimento_from_wire(wire).map_err(|e| ApiError::ParseError(e.to_string()))
    }

    async fn update_comparecimento(
        &self,
        id: i64,
        comparecimento: &Comparecimento,
    ) -> Result<Comparecimento, ApiError> {
        let url = self.url_with_id(Resource::Comparecimento, UPDATE, id);
        tracing::info!("Updating comparecimento {}", id);
        let wire: WireComparecimento = self
            .send(
                Method::PUT,
                &url,
                &mapper::comparecimento_to_wire(comparecimento),
                &format!("comparecimento {}", id),
            )
            .await?;
        mapper::comparecimento_from_wire(wire).map_err(|e| ApiError::ParseError(e.to_string()))
    }

    async fn set_attendance(&self, id: i64, compareceu: bool) -> Result<(), ApiError> {
        let url = self.url_with_id(Resource::Comparecimento, UPDATE, id);
        let subject = format!("comparecimento {}", id);
        tracing::info!("Setting attendance of comparecimento {} to {}", id, compareceu);

        let response = self
            .request(Method::PATCH, &url)
            .json(&serde_json::json!({ "flagComparecimento": compareceu }))
            .send()
            .await?;
        self.check(response, &subject).await?;
        Ok(())
    }

    async fn delete_comparecimento(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url_with_id(Resource::Comparecimento, DELETE, id);
        self.remove(&url, &format!("comparecimento {}", id)).await
    }

    async fn list_usuarios(&self, filtro: &UsuarioFiltro) -> Result<Vec<Usuario>, ApiError> {
        let url = self.url(Resource::Usuario, FIND_ALL);
        let items: Vec<WireUsuario> = self
            .fetch_list(&url, &filtro.query_params(), "usuarios")
            .await?;
        tracing::info!("Fetched {} usuarios", items.len());
        Ok(items.into_iter().map(mapper::usuario_from_wire).collect())
    }

    async fn get_usuario(&self, id: i64) -> Result<Usuario, ApiError> {
        let url = self.url_with_id(Resource::Usuario, FIND_BY_ID, id);
        let wire: WireUsuario = self.fetch(&url, &[], &format!("usuario {}", id)).await?;
        Ok(mapper::usuario_from_wire(wire))
    }

    async fn create_usuario(&self, usuario: &Usuario) -> Result<Usuario, ApiError> {
        let url = self.url(Resource::Usuario, SAVE);
        tracing::info!("Creating usuario {}", usuario.email);
        let wire: WireUsuario = self
            .send(Method::POST, &url, &mapper::usuario_to_wire(usuario), "new usuario")
            .await?;
        Ok(mapper::usuario_from_wire(wire))
    }

    async fn update_usuario(&self, id: i64, usuario: &Usuario) -> Result<Usuario, ApiError> {
        let url = self.url_with_id(Resource::Usuario, UPDATE, id);
        tracing::info!("Updating usuario {}", id);
        let wire: WireUsuario = self
            .send(Method::PUT, &url, &mapper::usuario_to_wire(usuario), &format!("usuario {}", id))
            .await?;
        Ok(mapper::usuario_from_wire(wire))
    }

    async fn delete_usuario(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url_with_id(Resource::Usuario, DELETE, id);
        self.remove(&url, &format!("usuario {}", id)).await
    }

    async fn ping(&self) -> Result<Duration, ApiError> {
        let started = Instant::now();
        let response = self.request(Method::GET, &self.base_url).send().await?;
        let elapsed = started.elapsed();
        tracing::info!("Backend answered {} in {:?}", response.status(), elapsed);
        Ok(elapsed)
    }
}
