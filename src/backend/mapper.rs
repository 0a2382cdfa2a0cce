//! Canonical records <-> backend JSON.
//!
//! The backend has served several spellings of the same fields over time
//! (`numeroProcesso`/`numProcesso`, `observacoes`/`observacao`,
//! `dataCadastro`/`creationDate`, flat vs. `pessoa`-nested person data).
//! Wire structs accept all of them; the `*_from_wire` functions pick one
//! value per canonical field and fill documented defaults for the rest.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::assistido::{A_DEFINIR, CEP_PADRAO, ENDERECO_NAO_INFORMADO, NOME_INDISPONIVEL};
use crate::domain::{
    Assistido, Audit, Comparecimento, Endereco, Perfil, Pessoa, Situacao, StatusAssistido, TipoPena,
    Usuario,
};

#[derive(Debug, Error)]
pub enum MapError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireEndereco {
    pub id_endereco: Option<i64>,
    pub logradouro: Option<String>,
    pub numero: Option<Value>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub cep: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WirePessoa {
    pub id: Option<i64>,
    pub nome: Option<String>,
    pub segundo_nome: Option<String>,
    pub cpf: Option<String>,
    pub data_nascimento: Option<Value>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub created_by: Option<Value>,
    pub creation_date: Option<Value>,
    pub last_updated_by: Option<Value>,
    pub last_update_date: Option<Value>,
    pub endereco: Option<WireEndereco>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireLookup {
    pub descricao: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireAssistido {
    pub id: Option<i64>,
    pub id_assistido: Option<i64>,
    pub nome: Option<String>,
    pub cpf: Option<String>,
    pub numero_processo: Option<String>,
    pub num_processo: Option<String>,
    pub tipo_pena: Option<String>,
    pub status: Option<String>,
    pub data_nascimento: Option<Value>,
    pub endereco: Option<Value>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub observacoes: Option<String>,
    pub observacao: Option<String>,
    pub data_cadastro: Option<Value>,
    pub data_ultima_atualizacao: Option<Value>,
    pub status_comparecimento: Option<String>,
    pub ultimo_comparecimento: Option<Value>,
    pub created_by: Option<Value>,
    pub creation_date: Option<Value>,
    pub last_updated_by: Option<Value>,
    pub last_update_date: Option<Value>,
    pub pessoa: Option<WirePessoa>,
    pub comparecimentos: Option<Vec<WireComparecimento>>,
    pub tipo_monitoramento: Option<WireLookup>,
    pub tipo_regime: Option<WireLookup>,
    pub tipo_situacao: Option<WireLookup>,
    pub vara_exec_penal: Option<WireLookup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireComparecimento {
    pub id_comparecimento: Option<i64>,
    pub data: Option<Value>,
    pub flag_comparecimento: Option<bool>,
    pub observacoes: Option<String>,
    pub created_by: Option<Value>,
    pub creation_date: Option<Value>,
    pub last_updated_by: Option<Value>,
    pub last_update_date: Option<Value>,
    pub assistido: Option<Box<WireAssistido>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireUsuario {
    pub id: Option<i64>,
    pub id_usuario: Option<i64>,
    pub nome: Option<String>,
    pub nome_user: Option<String>,
    pub email: Option<String>,
    pub senha: Option<String>,
    pub perfil: Option<String>,
    pub ativo: Option<bool>,
    pub tipo_acesso: Option<i64>,
    pub data_criacao: Option<Value>,
    pub data_ultima_atualizacao: Option<Value>,
    pub created_by: Option<Value>,
    pub creation_date: Option<Value>,
    pub last_updated_by: Option<Value>,
    pub last_update_date: Option<Value>,
    pub pessoa: Option<WirePessoa>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireLoginRequest<'a> {
    pub email: &'a str,
    pub senha: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireLoginResponse {
    pub token: Option<String>,
    pub usuario: Option<WireUsuario>,
    pub expires_in: Option<i64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn as_id(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_datetime_str(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Accepts ISO strings, Jackson-style `[y, m, d, h, min, s]` arrays and
/// epoch milliseconds.
pub fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_datetime_str(s),
        Value::Array(parts) => {
            let n: Vec<i64> = parts.iter().filter_map(Value::as_i64).collect();
            if n.len() < 3 || n.len() != parts.len() {
                return None;
            }
            let field = |i: usize| u32::try_from(n.get(i).copied().unwrap_or(0)).ok();
            NaiveDate::from_ymd_opt(i32::try_from(n[0]).ok()?, field(1)?, field(2)?)?
                .and_hms_opt(field(3)?, field(4)?, field(5)?)
        }
        Value::Number(ms) => DateTime::from_timestamp_millis(ms.as_i64()?)
            .map(|dt| dt.with_timezone(&Local).naive_local()),
        _ => None,
    }
}

pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    parse_datetime(value).map(|dt| dt.date())
}

fn opt_datetime(value: &Option<Value>) -> Option<NaiveDateTime> {
    value.as_ref().and_then(parse_datetime)
}

fn opt_date(value: &Option<Value>) -> Option<NaiveDate> {
    value.as_ref().and_then(parse_date)
}

fn date_to_wire(date: Option<NaiveDate>) -> Option<Value> {
    date.map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
}

fn datetime_to_wire(dt: Option<NaiveDateTime>) -> Option<Value> {
    dt.map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S").to_string()))
}

fn numero_to_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn audit_from_wire(
    created_by: &Option<Value>,
    creation_date: &Option<Value>,
    last_updated_by: &Option<Value>,
    last_update_date: &Option<Value>,
) -> Audit {
    Audit {
        created_by: as_id(created_by.as_ref()),
        creation_date: opt_datetime(creation_date),
        last_updated_by: as_id(last_updated_by.as_ref()),
        last_update_date: opt_datetime(last_update_date),
    }
}

pub fn endereco_from_wire(wire: WireEndereco) -> Endereco {
    Endereco {
        id: wire.id_endereco,
        logradouro: wire.logradouro.unwrap_or_default(),
        numero: numero_to_string(wire.numero).unwrap_or_else(|| "0".to_string()),
        complemento: non_empty(wire.complemento),
        bairro: non_empty(wire.bairro).unwrap_or_else(|| A_DEFINIR.to_string()),
        cidade: non_empty(wire.cidade).unwrap_or_else(|| A_DEFINIR.to_string()),
        estado: non_empty(wire.estado).unwrap_or_else(|| A_DEFINIR.to_string()),
        cep: non_empty(wire.cep).unwrap_or_else(|| CEP_PADRAO.to_string()),
    }
}

pub fn endereco_to_wire(endereco: &Endereco) -> WireEndereco {
    WireEndereco {
        id_endereco: endereco.id,
        logradouro: Some(endereco.logradouro.clone()),
        numero: Some(Value::String(endereco.numero.clone())),
        complemento: endereco.complemento.clone(),
        bairro: Some(endereco.bairro.clone()),
        cidade: Some(endereco.cidade.clone()),
        estado: Some(endereco.estado.clone()),
        cep: Some(endereco.cep.clone()),
    }
}

pub fn pessoa_from_wire(wire: WirePessoa) -> Pessoa {
    let audit = audit_from_wire(
        &wire.created_by,
        &wire.creation_date,
        &wire.last_updated_by,
        &wire.last_update_date,
    );
    Pessoa {
        id: wire.id,
        nome: wire.nome.unwrap_or_default(),
        segundo_nome: wire.segundo_nome.unwrap_or_default(),
        cpf: wire.cpf.unwrap_or_default(),
        data_nascimento: opt_date(&wire.data_nascimento),
        telefone: wire.telefone.unwrap_or_default(),
        email: non_empty(wire.email),
        endereco: wire.endereco.map(endereco_from_wire),
        audit,
    }
}

pub fn pessoa_to_wire(pessoa: &Pessoa) -> WirePessoa {
    WirePessoa {
        id: pessoa.id,
        nome: Some(pessoa.nome.clone()),
        segundo_nome: Some(pessoa.segundo_nome.clone()),
        cpf: Some(pessoa.cpf.clone()),
        data_nascimento: date_to_wire(pessoa.data_nascimento),
        telefone: Some(pessoa.telefone.clone()),
        email: pessoa.email.clone(),
        created_by: pessoa.audit.created_by.map(Value::from),
        creation_date: datetime_to_wire(pessoa.audit.creation_date),
        last_updated_by: pessoa.audit.last_updated_by.map(Value::from),
        last_update_date: datetime_to_wire(pessoa.audit.last_update_date),
        endereco: pessoa.endereco.as_ref().map(endereco_to_wire),
    }
}

fn endereco_summary(flat: Option<Value>, nested: Option<&Endereco>) -> String {
    match flat {
        Some(Value::String(s)) if !s.trim().is_empty() => return s,
        Some(value @ Value::Object(_)) => {
            if let Ok(wire) = serde_json::from_value::<WireEndereco>(value) {
                return endereco_from_wire(wire).summary();
            }
        }
        _ => {}
    }
    nested
        .map(Endereco::summary)
        .unwrap_or_else(|| ENDERECO_NAO_INFORMADO.to_string())
}

pub fn assistido_from_wire(wire: WireAssistido) -> Assistido {
    let pessoa = wire.pessoa.map(pessoa_from_wire);

    let nome = non_empty(wire.nome)
        .or_else(|| pessoa.as_ref().map(Pessoa::full_name).filter(|n| !n.is_empty()))
        .unwrap_or_else(|| NOME_INDISPONIVEL.to_string());
    let cpf = non_empty(wire.cpf)
        .or_else(|| pessoa.as_ref().map(|p| p.cpf.clone()))
        .unwrap_or_default();
    let telefone = non_empty(wire.telefone)
        .or_else(|| pessoa.as_ref().map(|p| p.telefone.clone()))
        .unwrap_or_default();
    let email = non_empty(wire.email)
        .or_else(|| pessoa.as_ref().and_then(|p| p.email.clone()))
        .unwrap_or_default();
    let data_nascimento = opt_date(&wire.data_nascimento)
        .or_else(|| pessoa.as_ref().and_then(|p| p.data_nascimento));
    let endereco = endereco_summary(
        wire.endereco,
        pessoa.as_ref().and_then(|p| p.endereco.as_ref()),
    );

    let audit = Audit {
        created_by: as_id(wire.created_by.as_ref()),
        creation_date: opt_datetime(&wire.creation_date).or_else(|| opt_datetime(&wire.data_cadastro)),
        last_updated_by: as_id(wire.last_updated_by.as_ref()),
        last_update_date: opt_datetime(&wire.last_update_date)
            .or_else(|| opt_datetime(&wire.data_ultima_atualizacao)),
    };

    let comparecimentos = wire
        .comparecimentos
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| match comparecimento_from_wire(c) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!("Dropping nested comparecimento: {}", e);
                None
            }
        })
        .collect();

    Assistido {
        id: wire.id.or(wire.id_assistido),
        nome,
        cpf,
        numero_processo: non_empty(wire.numero_processo)
            .or(non_empty(wire.num_processo))
            .unwrap_or_default(),
        tipo_pena: wire
            .tipo_pena
            .as_deref()
            .and_then(TipoPena::from_backend)
            .unwrap_or_default(),
        status: wire
            .status
            .as_deref()
            .and_then(StatusAssistido::from_backend)
            .unwrap_or_default(),
        data_nascimento,
        endereco,
        telefone,
        email,
        observacoes: non_empty(wire.observacoes)
            .or(non_empty(wire.observacao))
            .unwrap_or_default(),
        status_comparecimento: wire.status_comparecimento.as_deref().and_then(Situacao::from_backend),
        ultimo_comparecimento: opt_datetime(&wire.ultimo_comparecimento),
        pessoa,
        comparecimentos,
        tipo_monitoramento: wire.tipo_monitoramento.and_then(|l| l.descricao),
        tipo_regime: wire.tipo_regime.and_then(|l| l.descricao),
        tipo_situacao: wire.tipo_situacao.and_then(|l| l.descricao),
        vara_exec_penal: wire.vara_exec_penal.and_then(|l| l.descricao),
        audit,
    }
}

fn lookup(descricao: &Option<String>) -> Option<WireLookup> {
    descricao.as_ref().map(|d| WireLookup { descricao: Some(d.clone()) })
}

pub fn assistido_to_wire(assistido: &Assistido) -> WireAssistido {
    WireAssistido {
        id: assistido.id,
        id_assistido: assistido.id,
        nome: Some(assistido.nome.clone()),
        cpf: Some(assistido.cpf.clone()),
        numero_processo: Some(assistido.numero_processo.clone()),
        num_processo: Some(assistido.numero_processo.clone()),
        tipo_pena: Some(assistido.tipo_pena.as_backend().to_string()),
        status: Some(assistido.status.as_backend().to_string()),
        data_nascimento: date_to_wire(assistido.data_nascimento),
        endereco: Some(Value::String(assistido.endereco.clone())),
        telefone: Some(assistido.telefone.clone()),
        email: Some(assistido.email.clone()),
        observacoes: Some(assistido.observacoes.clone()),
        observacao: Some(assistido.observacoes.clone()),
        data_cadastro: datetime_to_wire(assistido.audit.creation_date),
        data_ultima_atualizacao: datetime_to_wire(assistido.audit.last_update_date),
        status_comparecimento: assistido.status_comparecimento.map(|s| s.as_backend().to_string()),
        ultimo_comparecimento: datetime_to_wire(assistido.ultimo_comparecimento),
        created_by: assistido.audit.created_by.map(Value::from),
        creation_date: datetime_to_wire(assistido.audit.creation_date),
        last_updated_by: assistido.audit.last_updated_by.map(Value::from),
        last_update_date: datetime_to_wire(assistido.audit.last_update_date),
        pessoa: assistido.pessoa.as_ref().map(pessoa_to_wire),
        comparecimentos: Some(assistido.comparecimentos.iter().map(comparecimento_to_wire).collect()),
        tipo_monitoramento: lookup(&assistido.tipo_monitoramento),
        tipo_regime: lookup(&assistido.tipo_regime),
        tipo_situacao: lookup(&assistido.tipo_situacao),
        vara_exec_penal: lookup(&assistido.vara_exec_penal),
    }
}

pub fn comparecimento_from_wire(wire: WireComparecimento) -> Result<Comparecimento, MapError> {
    let raw = wire.data.ok_or(MapError::MissingField("data"))?;
    let data = parse_datetime(&raw).ok_or_else(|| MapError::InvalidDate(raw.to_string()))?;

    let audit = audit_from_wire(
        &wire.created_by,
        &wire.creation_date,
        &wire.last_updated_by,
        &wire.last_update_date,
    );

    Ok(Comparecimento {
        id: wire.id_comparecimento,
        data,
        compareceu: wire.flag_comparecimento.unwrap_or(false),
        observacoes: wire.observacoes.unwrap_or_default(),
        assistido: wire.assistido.map(|a| Box::new(assistido_from_wire(*a))),
        audit,
    })
}

pub fn comparecimento_to_wire(comparecimento: &Comparecimento) -> WireComparecimento {
    WireComparecimento {
        id_comparecimento: comparecimento.id,
        data: datetime_to_wire(Some(comparecimento.data)),
        flag_comparecimento: Some(comparecimento.compareceu),
        observacoes: Some(comparecimento.observacoes.clone()),
        created_by: comparecimento.audit.created_by.map(Value::from),
        creation_date: datetime_to_wire(comparecimento.audit.creation_date),
        last_updated_by: comparecimento.audit.last_updated_by.map(Value::from),
        last_update_date: datetime_to_wire(comparecimento.audit.last_update_date),
        assistido: comparecimento
            .assistido
            .as_deref()
            .map(|a| Box::new(assistido_to_wire(a))),
    }
}

pub fn usuario_from_wire(wire: WireUsuario) -> Usuario {
    let pessoa = wire.pessoa.map(pessoa_from_wire);
    let nome_user = wire.nome_user.unwrap_or_default();

    let nome = non_empty(wire.nome)
        .or_else(|| pessoa.as_ref().map(Pessoa::full_name).filter(|n| !n.is_empty()))
        .or_else(|| non_empty(Some(nome_user.clone())))
        .unwrap_or_else(|| NOME_INDISPONIVEL.to_string());

    let audit = Audit {
        created_by: as_id(wire.created_by.as_ref()),
        creation_date: opt_datetime(&wire.creation_date).or_else(|| opt_datetime(&wire.data_criacao)),
        last_updated_by: as_id(wire.last_updated_by.as_ref()),
        last_update_date: opt_datetime(&wire.last_update_date)
            .or_else(|| opt_datetime(&wire.data_ultima_atualizacao)),
    };

    Usuario {
        id: wire.id.or(wire.id_usuario),
        nome,
        nome_user,
        email: wire.email.unwrap_or_default(),
        senha: wire.senha,
        perfil: wire.perfil.as_deref().and_then(Perfil::from_backend).unwrap_or_default(),
        ativo: wire.ativo.unwrap_or(true),
        tipo_acesso: wire.tipo_acesso,
        pessoa,
        audit,
    }
}

pub fn usuario_to_wire(usuario: &Usuario) -> WireUsuario {
    WireUsuario {
        id: usuario.id,
        id_usuario: usuario.id,
        nome: Some(usuario.nome.clone()),
        nome_user: Some(usuario.nome_user.clone()),
        email: Some(usuario.email.clone()),
        senha: usuario.senha.clone(),
        perfil: Some(usuario.perfil.as_backend().to_string()),
        ativo: Some(usuario.ativo),
        tipo_acesso: usuario.tipo_acesso,
        data_criacao: datetime_to_wire(usuario.audit.creation_date),
        data_ultima_atualizacao: datetime_to_wire(usuario.audit.last_update_date),
        created_by: usuario.audit.created_by.map(Value::from),
        creation_date: datetime_to_wire(usuario.audit.creation_date),
        last_updated_by: usuario.audit.last_updated_by.map(Value::from),
        last_update_date: datetime_to_wire(usuario.audit.last_update_date),
        pessoa: usuario.pessoa.as_ref().map(pessoa_to_wire),
    }
}
