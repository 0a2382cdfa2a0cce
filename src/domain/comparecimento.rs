use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::assistido::{Assistido, Audit, NOME_INDISPONIVEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Situacao {
    Pendente,
    Compareceu,
}

impl Situacao {
    pub fn from_backend(value: &str) -> Option<Self> {
        match value {
            "PENDENTE" => Some(Self::Pendente),
            "COMPARECEU" => Some(Self::Compareceu),
            _ => None,
        }
    }

    pub fn as_backend(&self) -> &'static str {
        match self {
            Self::Pendente => "PENDENTE",
            Self::Compareceu => "COMPARECEU",
        }
    }

    pub fn from_attended(attended: bool) -> Self {
        if attended { Self::Compareceu } else { Self::Pendente }
    }
}

/// Anything placed on a calendar day.
pub trait Scheduled {
    fn scheduled_at(&self) -> NaiveDateTime;

    fn scheduled_day(&self) -> NaiveDate {
        self.scheduled_at().date()
    }

    /// `None` when the item carries no attendance information.
    fn attended(&self) -> Option<bool> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparecimento {
    pub id: Option<i64>,
    pub data: NaiveDateTime,
    pub compareceu: bool,
    pub observacoes: String,
    pub assistido: Option<Box<Assistido>>,
    pub audit: Audit,
}

impl Comparecimento {
    pub fn new(data: NaiveDateTime, compareceu: bool) -> Self {
        Self {
            id: None,
            data,
            compareceu,
            observacoes: String::new(),
            assistido: None,
            audit: Audit::default(),
        }
    }

    pub fn with_assistido(mut self, assistido: Assistido) -> Self {
        self.assistido = Some(Box::new(assistido));
        self
    }

    pub fn with_observacoes(mut self, observacoes: impl Into<String>) -> Self {
        self.observacoes = observacoes.into();
        self
    }

    pub fn situacao(&self) -> Situacao {
        Situacao::from_attended(self.compareceu)
    }

    pub fn status_text(&self) -> &'static str {
        if self.compareceu { "Compareceu" } else { "Falta" }
    }

    pub fn assistido_nome(&self) -> String {
        self.assistido
            .as_deref()
            .map(|a| {
                if !a.nome.is_empty() {
                    a.nome.clone()
                } else {
                    a.pessoa.as_ref().map(|p| p.full_name()).unwrap_or_default()
                }
            })
            .filter(|nome| !nome.is_empty())
            .unwrap_or_else(|| NOME_INDISPONIVEL.to_string())
    }
}

impl Scheduled for Comparecimento {
    fn scheduled_at(&self) -> NaiveDateTime {
        self.data
    }

    fn attended(&self) -> Option<bool> {
        Some(self.compareceu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assistido::Pessoa;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn scheduled_day_drops_time_of_day() {
        let c = Comparecimento::new(at(2024, 2, 1, 23), true);
        assert_eq!(c.scheduled_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn status_text_follows_attendance_flag() {
        assert_eq!(Comparecimento::new(at(2024, 2, 1, 9), true).status_text(), "Compareceu");
        assert_eq!(Comparecimento::new(at(2024, 2, 1, 9), false).status_text(), "Falta");
    }

    #[test]
    fn situacao_maps_attendance() {
        assert_eq!(Comparecimento::new(at(2024, 2, 1, 9), true).situacao(), Situacao::Compareceu);
        assert_eq!(Comparecimento::new(at(2024, 2, 1, 9), false).situacao(), Situacao::Pendente);
    }

    #[test]
    fn assistido_name_falls_back_to_person_then_placeholder() {
        let c = Comparecimento::new(at(2024, 2, 1, 9), false);
        assert_eq!(c.assistido_nome(), NOME_INDISPONIVEL);

        let pessoa = Pessoa {
            nome: "João".to_string(),
            segundo_nome: "Souza".to_string(),
            ..Pessoa::default()
        };
        let mut assistido = Assistido::new(pessoa, String::new());
        assistido.nome = String::new();
        let c = c.with_assistido(assistido);
        assert_eq!(c.assistido_nome(), "João Souza");
    }
}
