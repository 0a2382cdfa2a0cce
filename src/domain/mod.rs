pub mod assistido;
pub mod comparecimento;
pub mod cpf;
pub mod filter;
pub mod usuario;

pub use assistido::{Assistido, Audit, Endereco, Pessoa, StatusAssistido, TipoPena};
pub use comparecimento::{Comparecimento, Scheduled, Situacao};
pub use cpf::{Cpf, CpfError, CpfValidation, format_mask, validate_cpf};
pub use filter::{AssistidoFiltro, ComparecimentoFiltro, DateRange, Page, UsuarioFiltro, page_window};
pub use usuario::{Perfil, Usuario};
