use std::sync::Arc;

use thiserror::Error;

use crate::backend::api::{ApiError, BackendApi};
use crate::domain::cpf::{self, CpfError, strip_non_digits};
use crate::domain::{
    Assistido, AssistidoFiltro, Comparecimento, ComparecimentoFiltro, Page, Usuario, UsuarioFiltro,
};
use crate::ui::month_grid::{DisplayedMonth, GridError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("CPF inválido: {0}")]
    InvalidCpf(#[from] CpfError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Calendar error: {0}")]
    Grid(#[from] GridError),
}

pub struct AssistidoService {
    api: Arc<dyn BackendApi>,
}

impl AssistidoService {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self { api }
    }

    /// Fetches every record and filters/pages locally; `findAll` is unpaged.
    pub async fn list(&self, filtro: &AssistidoFiltro) -> Result<Page<Assistido>, ServiceError> {
        let matching: Vec<Assistido> = self
            .api
            .list_assistidos()
            .await?
            .into_iter()
            .filter(|a| filtro.matches(a))
            .collect();
        tracing::debug!("{} assistidos match filter", matching.len());
        Ok(Page::paginate(matching, filtro.page, filtro.size))
    }

    pub async fn get(&self, id: i64) -> Result<Assistido, ServiceError> {
        Ok(self.api.get_assistido(id).await?)
    }

    pub async fn create(&self, assistido: &Assistido) -> Result<Assistido, ServiceError> {
        cpf::check(assistido.effective_cpf())?;
        Ok(self.api.create_assistido(assistido).await?)
    }

    pub async fn update(&self, id: i64, assistido: &Assistido) -> Result<Assistido, ServiceError> {
        cpf::check(assistido.effective_cpf())?;
        Ok(self.api.update_assistido(id, assistido).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.api.delete_assistido(id).await?)
    }

    pub async fn find_by_cpf(&self, raw: &str) -> Result<Option<Assistido>, ServiceError> {
        let wanted = strip_non_digits(raw);
        if wanted.is_empty() {
            return Ok(None);
        }

        let found = self
            .api
            .list_assistidos()
            .await?
            .into_iter()
            .find(|a| strip_non_digits(a.effective_cpf()) == wanted);
        Ok(found)
    }

    pub async fn find_by_numero_processo(&self, numero_processo: &str) -> Result<Assistido, ServiceError> {
        self.api
            .find_assistidos_by_processo(numero_processo)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("processo {}", numero_processo)))
    }
}

pub struct ComparecimentoService {
    api: Arc<dyn BackendApi>,
}

impl ComparecimentoService {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self { api }
    }

    pub async fn list(&self, filtro: &ComparecimentoFiltro) -> Result<Page<Comparecimento>, ServiceError> {
        let mut matching: Vec<Comparecimento> = self
            .api
            .list_comparecimentos(filtro)
            .await?
            .into_iter()
            .filter(|c| filtro.matches(c))
            .collect();
        matching.sort_by_key(|c| c.data);
        Ok(Page::paginate(matching, filtro.page, filtro.size))
    }

    /// Appointments falling inside the month, whatever the backend returned
    /// around the range edges.
    pub async fn for_month(&self, month: DisplayedMonth) -> Result<Vec<Comparecimento>, ServiceError> {
        let range = month.date_range()?;
        let filtro = ComparecimentoFiltro::for_range(range);

        let mut comparecimentos: Vec<Comparecimento> = self
            .api
            .list_comparecimentos(&filtro)
            .await?
            .into_iter()
            .filter(|c| range.contains(c.data.date()))
            .collect();
        comparecimentos.sort_by_key(|c| c.data);

        tracing::info!(
            "{} comparecimentos in {} {}",
            comparecimentos.len(),
            month.name(),
            month.year
        );
        Ok(comparecimentos)
    }

    pub async fn get(&self, id: i64) -> Result<Comparecimento, ServiceError> {
        Ok(self.api.get_comparecimento(id).await?)
    }

    pub async fn create(&self, comparecimento: &Comparecimento) -> Result<Comparecimento, ServiceError> {
        Ok(self.api.create_comparecimento(comparecimento).await?)
    }

    pub async fn update(&self, id: i64, comparecimento: &Comparecimento) -> Result<Comparecimento, ServiceError> {
        Ok(self.api.update_comparecimento(id, comparecimento).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.api.delete_comparecimento(id).await?)
    }

    pub async fn confirm(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.api.set_attendance(id, true).await?)
    }

    pub async fn register_absence(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.api.set_attendance(id, false).await?)
    }
}

pub struct UsuarioService {
    api: Arc<dyn BackendApi>,
}

impl UsuarioService {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self { api }
    }

    /// Same contract as the assistido listing: the backend answers with every
    /// matching user and the page is sliced here.
    pub async fn list(&self, filtro: &UsuarioFiltro) -> Result<Page<Usuario>, ServiceError> {
        let matching: Vec<Usuario> = self
            .api
            .list_usuarios(filtro)
            .await?
            .into_iter()
            .filter(|u| filtro.matches(u))
            .collect();
        Ok(Page::paginate(matching, filtro.page, filtro.size))
    }

    pub async fn get(&self, id: i64) -> Result<Usuario, ServiceError> {
        Ok(self.api.get_usuario(id).await?)
    }

    pub async fn create(&self, usuario: &Usuario) -> Result<Usuario, ServiceError> {
        Ok(self.api.create_usuario(usuario).await?)
    }

    pub async fn update(&self, id: i64, usuario: &Usuario) -> Result<Usuario, ServiceError> {
        Ok(self.api.update_usuario(id, usuario).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.api.delete_usuario(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::api::MockBackendApi;
    use crate::domain::{Perfil, Pessoa};
    use chrono::NaiveDate;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn assistido(id: i64, nome: &str, cpf: &str) -> Assistido {
        let pessoa = Pessoa {
            nome: nome.to_string(),
            cpf: cpf.to_string(),
            ..Pessoa::default()
        };
        let mut a = Assistido::new(pessoa, format!("000{}", id));
        a.id = Some(id);
        a
    }

    fn comparecimento(id: i64, day: NaiveDate, hour: u32) -> Comparecimento {
        let mut c = Comparecimento::new(day.and_hms_opt(hour, 0, 0).unwrap(), false);
        c.id = Some(id);
        c
    }

    #[tokio::test]
    async fn list_filters_and_pages_assistidos() {
        let mut api = MockBackendApi::new();
        api.expect_list_assistidos().returning(|| {
            Ok(vec![
                assistido(1, "Maria", "11144477735"),
                assistido(2, "Marcos", "52998224725"),
                assistido(3, "João", "10000000108"),
            ])
        });
        let service = AssistidoService::new(Arc::new(api));
        let filtro = AssistidoFiltro {
            nome: Some("mar".to_string()),
            size: 1,
            ..AssistidoFiltro::new()
        };

        let page = service.list(&filtro).await.unwrap();

        assert_eq!(page.total_elements, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].id, Some(1));
    }

    #[tokio::test]
    async fn create_rejects_invalid_cpf_before_request() {
        let mut api = MockBackendApi::new();
        api.expect_create_assistido().never();
        let service = AssistidoService::new(Arc::new(api));

        let result = service.create(&assistido(0, "Maria", "111.444.777-36")).await;

        assert!(matches!(result, Err(ServiceError::InvalidCpf(CpfError::CheckDigitMismatch { .. }))));
    }

    #[tokio::test]
    async fn create_sends_valid_assistido() {
        let mut api = MockBackendApi::new();
        api.expect_create_assistido()
            .times(1)
            .returning(|a| {
                let mut saved = a.clone();
                saved.id = Some(99);
                Ok(saved)
            });
        let service = AssistidoService::new(Arc::new(api));

        let saved = service.create(&assistido(0, "Maria", "111.444.777-35")).await.unwrap();

        assert_eq!(saved.id, Some(99));
    }

    #[tokio::test]
    async fn update_also_checks_cpf() {
        let mut api = MockBackendApi::new();
        api.expect_update_assistido().never();
        let service = AssistidoService::new(Arc::new(api));

        let result = service.update(1, &assistido(1, "Maria", "11111111111")).await;

        assert!(matches!(result, Err(ServiceError::InvalidCpf(CpfError::RepeatedDigits))));
    }

    #[tokio::test]
    async fn find_by_cpf_compares_digits_only() {
        let mut api = MockBackendApi::new();
        api.expect_list_assistidos().returning(|| {
            Ok(vec![
                assistido(1, "Maria", "111.444.777-35"),
                assistido(2, "Marcos", "52998224725"),
            ])
        });
        let service = AssistidoService::new(Arc::new(api));

        let found = service.find_by_cpf("529.982.247-25").await.unwrap();

        assert_eq!(found.map(|a| a.id), Some(Some(2)));
    }

    #[tokio::test]
    async fn find_by_blank_cpf_skips_request() {
        let mut api = MockBackendApi::new();
        api.expect_list_assistidos().never();
        let service = AssistidoService::new(Arc::new(api));

        assert_eq!(service.find_by_cpf("  ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_by_numero_processo_without_match_is_not_found() {
        let mut api = MockBackendApi::new();
        api.expect_find_assistidos_by_processo()
            .with(eq("0042"))
            .returning(|_| Ok(Vec::new()));
        let service = AssistidoService::new(Arc::new(api));

        let result = service.find_by_numero_processo("0042").await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn for_month_requests_month_range_and_drops_outsiders() {
        let mut api = MockBackendApi::new();
        api.expect_list_comparecimentos()
            .withf(|f| f.data_inicio == Some(date(2024, 2, 1)) && f.data_fim == Some(date(2024, 2, 29)))
            .returning(|_| {
                Ok(vec![
                    comparecimento(1, date(2024, 2, 20), 9),
                    comparecimento(2, date(2024, 1, 31), 9),
                    comparecimento(3, date(2024, 2, 1), 8),
                    comparecimento(4, date(2024, 3, 1), 0),
                ])
            });
        let service = ComparecimentoService::new(Arc::new(api));

        let month = DisplayedMonth::new(2024, 1).unwrap();
        let list = service.for_month(month).await.unwrap();

        let ids: Vec<Option<i64>> = list.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![Some(3), Some(1)]);
    }

    #[tokio::test]
    async fn consecutive_months_do_not_overlap() {
        let mut api = MockBackendApi::new();
        api.expect_list_comparecimentos().returning(|_| {
            Ok(vec![
                comparecimento(1, date(2024, 1, 31), 23),
                comparecimento(2, date(2024, 2, 1), 0),
            ])
        });
        let service = ComparecimentoService::new(Arc::new(api));

        let january = DisplayedMonth::new(2024, 0).unwrap();
        let jan = service.for_month(january).await.unwrap();
        let feb = service.for_month(january.next()).await.unwrap();

        assert_eq!(jan.len(), 1);
        assert_eq!(feb.len(), 1);
        assert_eq!(jan[0].id, Some(1));
        assert_eq!(feb[0].id, Some(2));
    }

    #[tokio::test]
    async fn list_comparecimentos_sorts_by_time() {
        let mut api = MockBackendApi::new();
        api.expect_list_comparecimentos().returning(|_| {
            Ok(vec![
                comparecimento(1, date(2024, 2, 2), 15),
                comparecimento(2, date(2024, 2, 2), 9),
            ])
        });
        let service = ComparecimentoService::new(Arc::new(api));

        let page = service.list(&ComparecimentoFiltro::new()).await.unwrap();

        assert_eq!(page.content[0].id, Some(2));
    }

    #[tokio::test]
    async fn confirm_and_absence_set_attendance_flag() {
        let mut api = MockBackendApi::new();
        api.expect_set_attendance()
            .with(eq(7), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_set_attendance()
            .with(eq(8), eq(false))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = ComparecimentoService::new(Arc::new(api));

        service.confirm(7).await.unwrap();
        service.register_absence(8).await.unwrap();
    }

    #[tokio::test]
    async fn api_errors_pass_through() {
        let mut api = MockBackendApi::new();
        api.expect_get_comparecimento()
            .returning(|id| Err(ApiError::NotFound(format!("comparecimento {}", id))));
        let service = ComparecimentoService::new(Arc::new(api));

        let result = service.get(5).await;

        assert!(matches!(result, Err(ServiceError::Api(ApiError::NotFound(_)))));
    }

    #[tokio::test]
    async fn usuario_list_applies_filter_locally() {
        let mut api = MockBackendApi::new();
        api.expect_list_usuarios().returning(|_| {
            Ok(vec![
                Usuario::new("Ana".to_string(), "ana@away.gov.br".to_string(), Perfil::Admin),
                Usuario::new("Bruno".to_string(), "bruno@away.gov.br".to_string(), Perfil::Agente),
            ])
        });
        let service = UsuarioService::new(Arc::new(api));
        let filtro = UsuarioFiltro {
            perfil: Some(Perfil::Agente),
            ..UsuarioFiltro::new()
        };

        let page = service.list(&filtro).await.unwrap();

        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].nome, "Bruno");
    }

    #[tokio::test]
    async fn usuario_second_page_is_sliced_once() {
        let mut api = MockBackendApi::new();
        api.expect_list_usuarios()
            .withf(|f| f.query_params().iter().all(|(key, _)| *key != "page" && *key != "size"))
            .times(1)
            .returning(|_| {
                Ok(["Ana", "Bruno", "Carla", "Davi"]
                    .iter()
                    .map(|nome| {
                        Usuario::new(nome.to_string(), format!("{}@away.gov.br", nome), Perfil::Agente)
                    })
                    .collect())
            });
        let service = UsuarioService::new(Arc::new(api));
        let filtro = UsuarioFiltro {
            page: 1,
            size: 2,
            ..UsuarioFiltro::new()
        };

        let page = service.list(&filtro).await.unwrap();

        let nomes: Vec<&str> = page.content.iter().map(|u| u.nome.as_str()).collect();
        assert_eq!(nomes, vec!["Carla", "Davi"]);
        assert_eq!(page.total_elements, 4);
        assert!(page.last);
    }

    #[tokio::test]
    async fn usuario_delete_forwards_id() {
        let mut api = MockBackendApi::new();
        api.expect_delete_usuario()
            .with(eq(3))
            .times(1)
            .returning(|_| Ok(()));
        let service = UsuarioService::new(Arc::new(api));

        service.delete(3).await.unwrap();
    }
}
