pub mod api;
pub mod auth;
pub mod mapper;
pub mod services;

pub use api::{ApiError, AppAwayClient, BackendApi, LoginResponse, Resource};
pub use auth::{AuthError, AuthService};
pub use mapper::MapError;
pub use services::{AssistidoService, ComparecimentoService, ServiceError, UsuarioService};
