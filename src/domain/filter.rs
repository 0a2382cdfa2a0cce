use chrono::NaiveDate;
use serde::Serialize;

use super::assistido::{Assistido, StatusAssistido, TipoPena};
use super::comparecimento::{Comparecimento, Situacao};
use super::cpf::strip_non_digits;
use super::usuario::{Perfil, Usuario};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistidoFiltro {
    pub nome: Option<String>,
    pub cpf: Option<String>,
    pub num_processo: Option<String>,
    pub status: Option<StatusAssistido>,
    pub tipo_pena: Option<TipoPena>,
    pub status_comparecimento: Option<Situacao>,
    pub page: usize,
    pub size: usize,
}

impl AssistidoFiltro {
    pub fn new() -> Self {
        Self { size: DEFAULT_PAGE_SIZE, ..Self::default() }
    }

    pub fn matches(&self, assistido: &Assistido) -> bool {
        if let Some(nome) = non_blank(&self.nome) {
            let full_name = assistido
                .pessoa
                .as_ref()
                .map(|p| p.full_name())
                .unwrap_or_default();
            if !contains_ignore_case(&assistido.nome, nome) && !contains_ignore_case(&full_name, nome) {
                return false;
            }
        }

        if let Some(cpf) = non_blank(&self.cpf) {
            let wanted = strip_non_digits(cpf);
            if !strip_non_digits(assistido.effective_cpf()).contains(&wanted) {
                return false;
            }
        }

        if let Some(processo) = non_blank(&self.num_processo)
            && !contains_ignore_case(&assistido.numero_processo, processo)
        {
            return false;
        }

        if self.status.is_some_and(|s| s != assistido.status) {
            return false;
        }

        if self.tipo_pena.is_some_and(|t| t != assistido.tipo_pena) {
            return false;
        }

        if let Some(situacao) = self.status_comparecimento
            && assistido.status_comparecimento != Some(situacao)
        {
            return false;
        }

        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparecimentoFiltro {
    pub assistido_id: Option<i64>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub status: Option<Situacao>,
    pub page: usize,
    pub size: usize,
}

impl ComparecimentoFiltro {
    pub fn new() -> Self {
        Self { size: DEFAULT_PAGE_SIZE, ..Self::default() }
    }

    pub fn for_range(range: DateRange) -> Self {
        Self {
            data_inicio: Some(range.start),
            data_fim: Some(range.end),
            ..Self::default()
        }
    }

    pub fn matches(&self, comparecimento: &Comparecimento) -> bool {
        let day = comparecimento.data.date();

        if self.data_inicio.is_some_and(|inicio| day < inicio) {
            return false;
        }

        if self.data_fim.is_some_and(|fim| day > fim) {
            return false;
        }

        if self.status.is_some_and(|s| s != comparecimento.situacao()) {
            return false;
        }

        if let Some(id) = self.assistido_id {
            let linked = comparecimento.assistido.as_ref().and_then(|a| a.id);
            if linked != Some(id) {
                return false;
            }
        }

        true
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(id) = self.assistido_id {
            params.push(("assistidoId", id.to_string()));
        }
        if let Some(inicio) = self.data_inicio {
            params.push(("dataInicio", inicio.format("%Y-%m-%d").to_string()));
        }
        if let Some(fim) = self.data_fim {
            params.push(("dataFim", fim.format("%Y-%m-%d").to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_backend().to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsuarioFiltro {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub perfil: Option<Perfil>,
    pub ativo: Option<bool>,
    pub page: usize,
    pub size: usize,
}

impl UsuarioFiltro {
    pub fn new() -> Self {
        Self { size: DEFAULT_PAGE_SIZE, ..Self::default() }
    }

    pub fn matches(&self, usuario: &Usuario) -> bool {
        if let Some(nome) = non_blank(&self.nome)
            && !contains_ignore_case(&usuario.nome, nome)
            && !contains_ignore_case(&usuario.nome_user, nome)
        {
            return false;
        }

        if let Some(email) = non_blank(&self.email)
            && !contains_ignore_case(&usuario.email, email)
        {
            return false;
        }

        if self.perfil.is_some_and(|p| p != usuario.perfil) {
            return false;
        }

        if self.ativo.is_some_and(|a| a != usuario.ativo) {
            return false;
        }

        true
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(nome) = non_blank(&self.nome) {
            params.push(("nome", nome.to_string()));
        }
        if let Some(email) = non_blank(&self.email) {
            params.push(("email", email.to_string()));
        }
        if let Some(perfil) = self.perfil {
            params.push(("perfil", perfil.as_backend().to_string()));
        }
        if let Some(ativo) = self.ativo {
            params.push(("ativo", ativo.to_string()));
        }
        // Paging stays local: `findAll` returns the whole list.
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub number: usize,
    pub size: usize,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    /// Slices an unpaged result set. `size == 0` puts everything on one page.
    pub fn paginate(items: Vec<T>, page: usize, size: usize) -> Self {
        let total_elements = items.len();

        if size == 0 {
            return Self {
                content: items,
                total_elements,
                total_pages: 1,
                number: 0,
                size: total_elements,
                first: true,
                last: true,
            };
        }

        let total_pages = total_elements.div_ceil(size);
        let content: Vec<T> = items
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .collect();

        Self {
            content,
            total_elements,
            total_pages,
            number: page,
            size,
            first: page == 0,
            last: page + 1 >= total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number: self.number,
            size: self.size,
            first: self.first,
            last: self.last,
        }
    }
}

/// Page numbers shown around `current`: two on each side, clamped.
pub fn page_window(current: usize, total_pages: usize) -> Vec<usize> {
    if total_pages == 0 {
        return Vec::new();
    }
    let last = total_pages - 1;
    let current = current.min(last);
    let start = current.saturating_sub(2);
    let end = current.saturating_add(2).min(last);
    (start..=end).collect()
}
