use serde::{Deserialize, Serialize};

use super::assistido::{Audit, Pessoa};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Perfil {
    Admin,
    Supervisor,
    #[default]
    Agente,
    Funcionario,
}

impl Perfil {
    pub fn from_backend(value: &str) -> Option<Self> {
        match value {
            "ADMIN" | "ADMINISTRADOR" => Some(Self::Admin),
            "SUPERVISOR" => Some(Self::Supervisor),
            "AGENTE" => Some(Self::Agente),
            "FUNCIONARIO" => Some(Self::Funcionario),
            _ => None,
        }
    }

    pub fn as_backend(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Supervisor => "SUPERVISOR",
            Self::Agente => "AGENTE",
            Self::Funcionario => "FUNCIONARIO",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrador",
            Self::Supervisor => "Supervisor",
            Self::Agente => "Agente",
            Self::Funcionario => "Funcionário",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usuario {
    pub id: Option<i64>,
    pub nome: String,
    pub nome_user: String,
    pub email: String,
    /// Only ever sent on create/update; never persisted locally.
    #[serde(skip)]
    pub senha: Option<String>,
    pub perfil: Perfil,
    pub ativo: bool,
    pub tipo_acesso: Option<i64>,
    pub pessoa: Option<Pessoa>,
    pub audit: Audit,
}

impl Usuario {
    pub fn new(nome: String, email: String, perfil: Perfil) -> Self {
        Self {
            id: None,
            nome_user: email.split('@').next().unwrap_or_default().to_string(),
            nome,
            email,
            senha: None,
            perfil,
            ativo: true,
            tipo_acesso: None,
            pessoa: None,
            audit: Audit::default(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.perfil == Perfil::Admin
    }
}
