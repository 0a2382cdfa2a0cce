pub mod backend;
pub mod domain;
pub mod storage;
pub mod ui;

pub use backend::{AppAwayClient, AuthService, BackendApi};
pub use domain::{Assistido, Comparecimento, Cpf, Usuario, format_mask, validate_cpf};
pub use ui::{DisplayedMonth, MonthGrid, build_month_grid};
