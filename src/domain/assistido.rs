use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::comparecimento::{Comparecimento, Situacao};

pub const NOME_INDISPONIVEL: &str = "Nome não disponível";
pub const ENDERECO_NAO_INFORMADO: &str = "Endereço não informado";
pub const CEP_PADRAO: &str = "00000-000";
pub const A_DEFINIR: &str = "A definir";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: Option<i64>,
    pub creation_date: Option<NaiveDateTime>,
    pub last_updated_by: Option<i64>,
    pub last_update_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusAssistido {
    #[default]
    Ativo,
    EmMonitoramento,
    Desligado,
}

impl StatusAssistido {
    pub fn from_backend(value: &str) -> Option<Self> {
        match value {
            "ATIVO" => Some(Self::Ativo),
            "EM_MONITORAMENTO" => Some(Self::EmMonitoramento),
            "DESLIGADO" => Some(Self::Desligado),
            _ => None,
        }
    }

    pub fn as_backend(&self) -> &'static str {
        match self {
            Self::Ativo => "ATIVO",
            Self::EmMonitoramento => "EM_MONITORAMENTO",
            Self::Desligado => "DESLIGADO",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ativo => "Ativo",
            Self::EmMonitoramento => "Em Monitoramento",
            Self::Desligado => "Desligado",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoPena {
    #[default]
    Alternativa,
    Prisional,
}

impl TipoPena {
    pub fn from_backend(value: &str) -> Option<Self> {
        match value {
            "ALTERNATIVA" => Some(Self::Alternativa),
            "PRISIONAL" => Some(Self::Prisional),
            _ => None,
        }
    }

    pub fn as_backend(&self) -> &'static str {
        match self {
            Self::Alternativa => "ALTERNATIVA",
            Self::Prisional => "PRISIONAL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Alternativa => "Pena Alternativa",
            Self::Prisional => "Prisional",
        }
    }
}

/// Postal address. Fields the backend leaves out are filled with
/// [`CEP_PADRAO`], [`A_DEFINIR`] or `"0"` by the mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endereco {
    pub id: Option<i64>,
    pub logradouro: String,
    pub numero: String,
    pub complemento: Option<String>,
    pub bairro: String,
    pub cidade: String,
    pub estado: String,
    pub cep: String,
}

impl Default for Endereco {
    fn default() -> Self {
        Self {
            id: None,
            logradouro: String::new(),
            numero: "0".to_string(),
            complemento: None,
            bairro: A_DEFINIR.to_string(),
            cidade: A_DEFINIR.to_string(),
            estado: A_DEFINIR.to_string(),
            cep: CEP_PADRAO.to_string(),
        }
    }
}

impl Endereco {
    pub fn summary(&self) -> String {
        let parts: Vec<&str> = [
            Some(self.logradouro.as_str()),
            Some(self.numero.as_str()),
            self.complemento.as_deref(),
            Some(self.bairro.as_str()),
            Some(self.cidade.as_str()),
            Some(self.estado.as_str()),
            Some(self.cep.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();

        if parts.is_empty() {
            ENDERECO_NAO_INFORMADO.to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pessoa {
    pub id: Option<i64>,
    pub nome: String,
    pub segundo_nome: String,
    pub cpf: String,
    pub data_nascimento: Option<NaiveDate>,
    pub telefone: String,
    pub email: Option<String>,
    pub endereco: Option<Endereco>,
    pub audit: Audit,
}

impl Pessoa {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nome, self.segundo_nome).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistido {
    pub id: Option<i64>,
    pub nome: String,
    pub cpf: String,
    pub numero_processo: String,
    pub tipo_pena: TipoPena,
    pub status: StatusAssistido,
    pub data_nascimento: Option<NaiveDate>,
    pub endereco: String,
    pub telefone: String,
    pub email: String,
    pub observacoes: String,
    pub status_comparecimento: Option<Situacao>,
    pub ultimo_comparecimento: Option<NaiveDateTime>,
    pub pessoa: Option<Pessoa>,
    pub comparecimentos: Vec<Comparecimento>,
    pub tipo_monitoramento: Option<String>,
    pub tipo_regime: Option<String>,
    pub tipo_situacao: Option<String>,
    pub vara_exec_penal: Option<String>,
    pub audit: Audit,
}

impl Assistido {
    pub fn new(pessoa: Pessoa, numero_processo: String) -> Self {
        Self {
            id: None,
            nome: pessoa.full_name(),
            cpf: pessoa.cpf.clone(),
            numero_processo,
            tipo_pena: TipoPena::default(),
            status: StatusAssistido::default(),
            data_nascimento: pessoa.data_nascimento,
            endereco: pessoa
                .endereco
                .as_ref()
                .map(Endereco::summary)
                .unwrap_or_else(|| ENDERECO_NAO_INFORMADO.to_string()),
            telefone: pessoa.telefone.clone(),
            email: pessoa.email.clone().unwrap_or_default(),
            observacoes: String::new(),
            status_comparecimento: None,
            ultimo_comparecimento: None,
            pessoa: Some(pessoa),
            comparecimentos: Vec::new(),
            tipo_monitoramento: None,
            tipo_regime: None,
            tipo_situacao: None,
            vara_exec_penal: None,
            audit: Audit::default(),
        }
    }

    /// The CPF of the linked person wins over the flat field when both exist.
    pub fn effective_cpf(&self) -> &str {
        match &self.pessoa {
            Some(pessoa) if !pessoa.cpf.is_empty() => &pessoa.cpf,
            _ => &self.cpf,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status != StatusAssistido::Desligado
    }
}
