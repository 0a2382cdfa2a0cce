use std::{
    env,
    io::{self, BufRead, Write},
    process::{Command, Stdio},
    sync::Arc,
};

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate, NaiveDateTime};

use appaway::{
    backend::{AppAwayClient, AuthService, BackendApi, ComparecimentoService},
    domain::{Assistido, Comparecimento, ComparecimentoFiltro, cpf},
    storage::{Config, FileSessionStore, SessionStore},
    ui::{
        DashboardStats, DisplayedMonth, MonthGrid, month_grid::WEEKDAY_LABELS, recent_registrations,
        relative_time, upcoming,
    },
};

pub const USAGE: &str =
    "Usage: appaway [--calendar [YYYY/MM]] [--cpf VALUE] [--login EMAIL] [--logout] [--ping]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliMode {
    Dashboard,
    Calendar(DisplayedMonth),
    Cpf(String),
    Login(String),
    Logout,
    Ping,
    Help,
}

pub fn parse_cli_mode() -> Result<CliMode, String> {
    parse_args(env::args().skip(1), Local::now().date_naive())
}

pub fn parse_args<I>(args: I, today: NaiveDate) -> Result<CliMode, String>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Dashboard;
    let mut args = args.into_iter().peekable();

    while let Some(arg) = args.next() {
        mode = match arg.as_str() {
            "--calendar" => match args.next_if(|next| !next.starts_with("--")) {
                Some(value) => CliMode::Calendar(parse_month(&value)?),
                None => CliMode::Calendar(DisplayedMonth::current(today)),
            },
            "--cpf" => CliMode::Cpf(args.next().ok_or("--cpf needs a value")?),
            "--login" => CliMode::Login(args.next().ok_or("--login needs an e-mail")?),
            "--logout" => CliMode::Logout,
            "--ping" => CliMode::Ping,
            "--help" | "-h" => CliMode::Help,
            _ => return Err(format!("Unknown argument: {}", arg)),
        };
    }

    Ok(mode)
}

fn parse_month(value: &str) -> Result<DisplayedMonth, String> {
    let invalid = || format!("Invalid month '{}'. Use YYYY/MM.", value);
    let (year, month) = value.split_once('/').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if month == 0 {
        return Err(invalid());
    }
    DisplayedMonth::new(year, month - 1).map_err(|_| invalid())
}

pub async fn run(mode: CliMode) -> anyhow::Result<()> {
    match mode {
        CliMode::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliMode::Cpf(value) => {
            println!("{}", describe_cpf(&value));
            Ok(())
        }
        CliMode::Dashboard => run_dashboard(&load_config()?).await,
        CliMode::Calendar(month) => run_calendar(&load_config()?, month).await,
        CliMode::Login(email) => run_login(&load_config()?, &email).await,
        CliMode::Logout => {
            let config = load_config()?;
            FileSessionStore::new(config.session.path.clone()).clear()?;
            println!("Sessão encerrada.");
            Ok(())
        }
        CliMode::Ping => run_ping(&load_config()?).await,
    }
}

fn load_config() -> anyhow::Result<Config> {
    Config::load_or_create().context("Failed to load config")
}

fn describe_cpf(value: &str) -> String {
    let masked = cpf::format_mask(value);
    match cpf::check(value) {
        Ok(()) => format!("CPF {}: válido", masked),
        Err(e) => format!("CPF {}: inválido ({})", masked, e),
    }
}

fn session_store(config: &Config) -> Arc<dyn SessionStore> {
    Arc::new(FileSessionStore::new(config.session.path.clone()))
}

fn authenticated_api(config: &Config) -> anyhow::Result<Arc<dyn BackendApi>> {
    let auth = AuthService::new(Arc::new(AppAwayClient::from_config(&config.api)?), session_store(config));
    let Some(token) = auth.token()? else {
        bail!("Not logged in. Run `appaway --login EMAIL` first.");
    };
    Ok(Arc::new(AppAwayClient::from_config(&config.api)?.with_token(token)))
}

async fn run_login(config: &Config, email: &str) -> anyhow::Result<()> {
    let senha = match env::var("APPAWAY_SENHA") {
        Ok(senha) => senha,
        Err(_) => read_password()?,
    };

    let api = Arc::new(AppAwayClient::from_config(&config.api)?);
    let auth = AuthService::new(api, session_store(config));
    let session = auth.login(email, &senha).await?;

    println!(
        "Bem-vindo(a), {} ({}).",
        session.usuario.nome,
        session.usuario.perfil.label()
    );
    Ok(())
}

fn read_password() -> anyhow::Result<String> {
    print!("Senha: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn run_ping(config: &Config) -> anyhow::Result<()> {
    let client = AppAwayClient::from_config(&config.api)?;
    match client.ping().await {
        Ok(elapsed) => println!("{} online ({} ms)", config.api.base_url, elapsed.as_millis()),
        Err(e) => println!("{} offline: {}", config.api.base_url, e),
    }
    Ok(())
}

async fn run_calendar(config: &Config, month: DisplayedMonth) -> anyhow::Result<()> {
    let api = authenticated_api(config)?;
    let comparecimentos = ComparecimentoService::new(api).for_month(month).await?;
    let grid = month.grid(&comparecimentos)?;
    display_with_pager(&format_month_text(month, &grid))?;
    Ok(())
}

fn format_month_text(month: DisplayedMonth, grid: &MonthGrid<'_, Comparecimento>) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{} {}", month.name(), month.year));
    lines.push(String::new());
    lines.push(WEEKDAY_LABELS.iter().map(|l| format!("{:<5}", l)).collect());

    for week in grid.weeks() {
        let row: String = week
            .iter()
            .map(|cell| {
                if !cell.is_current_month {
                    return "     ".to_string();
                }
                let (open, close) = if cell.is_today { ('[', ']') } else { (' ', ' ') };
                let marker = if cell.has_events() { '*' } else { ' ' };
                format!("{}{:>2}{}{}", open, cell.numero, close, marker)
            })
            .collect();
        lines.push(row.trim_end().to_string());
    }

    lines.push(String::new());
    let events: Vec<&Comparecimento> = grid
        .cells
        .iter()
        .filter(|cell| cell.is_current_month)
        .flat_map(|cell| cell.events.iter().copied())
        .collect();

    if events.is_empty() {
        lines.push("Nenhum comparecimento agendado.".to_string());
    } else {
        for c in events {
            lines.push(format!(
                "- {}  {:<30} {}",
                c.data.format("%d/%m %H:%M"),
                c.assistido_nome(),
                c.status_text()
            ));
        }
    }

    let totals = grid.totals();
    lines.push(String::new());
    lines.push(format!(
        "Total: {} | Compareceram: {} | Faltas: {}",
        totals.total, totals.attended, totals.missed
    ));

    lines.join("\n")
}

async fn run_dashboard(config: &Config) -> anyhow::Result<()> {
    let api = authenticated_api(config)?;
    let assistidos = api.list_assistidos().await?;
    let comparecimentos = api.list_comparecimentos(&ComparecimentoFiltro::new()).await?;

    let text = format_dashboard_text(
        &assistidos,
        &comparecimentos,
        Local::now().naive_local(),
        config.ui.upcoming_days,
        config.ui.upcoming_limit,
    );
    display_with_pager(&text)?;
    Ok(())
}

fn format_dashboard_text(
    assistidos: &[Assistido],
    comparecimentos: &[Comparecimento],
    now: NaiveDateTime,
    upcoming_days: u64,
    upcoming_limit: usize,
) -> String {
    let stats = DashboardStats::compute(assistidos, comparecimentos, now.date());
    let mut lines = vec![
        format!("Painel – {}", now.format("%d/%m/%Y")),
        String::new(),
        format!("Assistidos:        {}", stats.total_assistidos),
        format!("Ativos:            {}", stats.assistidos_ativos),
        format!("Comparecimentos hoje: {}", stats.comparecimentos_hoje),
        format!("Pendentes:         {}", stats.comparecimentos_pendentes),
        String::new(),
        "Próximos comparecimentos".to_string(),
    ];

    let proximos = upcoming(comparecimentos, now, upcoming_days, upcoming_limit);
    if proximos.is_empty() {
        lines.push("  Nenhum agendamento.".to_string());
    }
    for p in proximos {
        lines.push(format!("  {} {}  {}", p.dia, p.horario, p.assistido));
    }

    lines.push(String::new());
    lines.push("Cadastros recentes".to_string());
    for r in recent_registrations(assistidos, upcoming_limit) {
        let when = r
            .registered_at
            .map(|at| relative_time(at, now))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!("  {}  ({})", r.assistido, when));
    }

    lines.join("\n")
}

fn display_with_pager(text: &str) -> Result<(), io::Error> {
    let pager_value = env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    let mut parts = pager_value.split_whitespace();
    let Some(cmd) = parts.next() else {
        println!("{text}");
        return Ok(());
    };
    let args: Vec<&str> = parts.collect();

    match Command::new(cmd).args(&args).stdin(Stdio::piped()).spawn() {
        Ok(mut child) => {
            if let Some(stdin) = child.stdin.as_mut() {
                stdin.write_all(text.as_bytes())?;
            }
            let _ = child.wait();
        }
        Err(e) => {
            tracing::debug!("Pager '{}' unavailable: {}", cmd, e);
            println!("{text}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use appaway::domain::{Pessoa, StatusAssistido};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn no_arguments_shows_dashboard() {
        assert_eq!(parse_args(args(&[]), date(2024, 2, 10)), Ok(CliMode::Dashboard));
    }

    #[test]
    fn calendar_defaults_to_current_month() {
        let mode = parse_args(args(&["--calendar"]), date(2024, 2, 10)).unwrap();
        assert_eq!(mode, CliMode::Calendar(DisplayedMonth::new(2024, 1).unwrap()));
    }

    #[test]
    fn calendar_accepts_one_based_month() {
        let mode = parse_args(args(&["--calendar", "2023/12"]), date(2024, 2, 10)).unwrap();
        assert_eq!(mode, CliMode::Calendar(DisplayedMonth::new(2023, 11).unwrap()));
    }

    #[test]
    fn calendar_rejects_bad_month() {
        assert!(parse_args(args(&["--calendar", "2023/13"]), date(2024, 2, 10)).is_err());
        assert!(parse_args(args(&["--calendar", "2023/0"]), date(2024, 2, 10)).is_err());
        assert!(parse_args(args(&["--calendar", "fevereiro"]), date(2024, 2, 10)).is_err());
    }

    #[test]
    fn calendar_followed_by_flag_uses_current_month() {
        let mode = parse_args(args(&["--ping", "--calendar"]), date(2024, 2, 10)).unwrap();
        assert_eq!(mode, CliMode::Calendar(DisplayedMonth::new(2024, 1).unwrap()));

        let mode = parse_args(args(&["--calendar", "--ping"]), date(2024, 2, 10)).unwrap();
        assert_eq!(mode, CliMode::Ping);
    }

    #[test]
    fn cpf_requires_value() {
        assert_eq!(
            parse_args(args(&["--cpf", "111.444.777-35"]), date(2024, 2, 10)),
            Ok(CliMode::Cpf("111.444.777-35".to_string()))
        );
        assert!(parse_args(args(&["--cpf"]), date(2024, 2, 10)).is_err());
    }

    #[test]
    fn unknown_argument_is_an_error() {
        assert!(parse_args(args(&["--agenda"]), date(2024, 2, 10)).is_err());
    }

    #[test]
    fn describe_cpf_masks_and_judges() {
        assert_eq!(describe_cpf("11144477735"), "CPF 111.444.777-35: válido");
        assert!(describe_cpf("11144477736").contains("inválido"));
    }

    #[test]
    fn month_text_marks_event_days() {
        let month = DisplayedMonth::new(2024, 1).unwrap();
        let events = vec![Comparecimento::new(date(2024, 2, 15).and_hms_opt(10, 0, 0).unwrap(), true)];
        let grid = appaway::ui::build_month_grid_on(2024, 1, &events, date(2024, 2, 1)).unwrap();

        let text = format_month_text(month, &grid);

        assert!(text.starts_with("Fevereiro 2024"));
        assert!(text.contains("15 *"));
        assert!(text.contains("[ 1]"));
        assert!(text.contains("Total: 1 | Compareceram: 1 | Faltas: 0"));
    }

    #[test]
    fn dashboard_text_lists_counts_and_upcoming() {
        let now = date(2024, 2, 10).and_hms_opt(8, 0, 0).unwrap();
        let mut desligado = Assistido::new(Pessoa::default(), "2".to_string());
        desligado.status = StatusAssistido::Desligado;
        let assistidos = vec![Assistido::new(Pessoa::default(), "1".to_string()), desligado];
        let comparecimentos = vec![Comparecimento::new(now + chrono::Duration::hours(2), false)];

        let text = format_dashboard_text(&assistidos, &comparecimentos, now, 7, 3);

        assert!(text.contains("Assistidos:        2"));
        assert!(text.contains("Ativos:            1"));
        assert!(text.contains("Hoje 10:00"));
    }
}
