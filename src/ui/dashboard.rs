use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::domain::{Assistido, Comparecimento};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_assistidos: usize,
    pub assistidos_ativos: usize,
    pub comparecimentos_hoje: usize,
    pub comparecimentos_pendentes: usize,
}

impl DashboardStats {
    pub fn compute(
        assistidos: &[Assistido],
        comparecimentos: &[Comparecimento],
        today: NaiveDate,
    ) -> Self {
        Self {
            total_assistidos: assistidos.len(),
            assistidos_ativos: assistidos.iter().filter(|a| a.is_active()).count(),
            comparecimentos_hoje: comparecimentos
                .iter()
                .filter(|c| c.data.date() == today)
                .count(),
            comparecimentos_pendentes: comparecimentos
                .iter()
                .filter(|c| c.data.date() >= today && !c.compareceu)
                .count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingComparecimento {
    pub id: Option<i64>,
    pub horario: String,
    pub dia: String,
    pub assistido: String,
    pub compareceu: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentRegistration {
    pub id: Option<i64>,
    pub assistido: String,
    pub registered_at: Option<NaiveDateTime>,
}

fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Hoje".to_string()
    } else if today.succ_opt() == Some(day) {
        "Amanhã".to_string()
    } else {
        day.format("%d/%m/%Y").to_string()
    }
}

/// Appointments from the start of today through `days` days ahead,
/// earliest first.
pub fn upcoming(
    comparecimentos: &[Comparecimento],
    now: NaiveDateTime,
    days: u64,
    limit: usize,
) -> Vec<UpcomingComparecimento> {
    let today = now.date();
    let horizon = today.checked_add_days(Days::new(days)).unwrap_or(today);

    let mut window: Vec<&Comparecimento> = comparecimentos
        .iter()
        .filter(|c| c.data.date() >= today && c.data.date() <= horizon)
        .collect();
    window.sort_by_key(|c| c.data);

    window
        .into_iter()
        .take(limit)
        .map(|c| UpcomingComparecimento {
            id: c.id,
            horario: c.data.format("%H:%M").to_string(),
            dia: day_label(c.data.date(), today),
            assistido: c.assistido_nome(),
            compareceu: c.compareceu,
        })
        .collect()
}

/// Newest registrations first; records without a creation date sort last.
pub fn recent_registrations(assistidos: &[Assistido], limit: usize) -> Vec<RecentRegistration> {
    let mut sorted: Vec<&Assistido> = assistidos.iter().collect();
    sorted.sort_by(|a, b| b.audit.creation_date.cmp(&a.audit.creation_date));

    sorted
        .into_iter()
        .take(limit)
        .map(|a| RecentRegistration {
            id: a.id,
            assistido: a.nome.clone(),
            registered_at: a.audit.creation_date,
        })
        .collect()
}

pub fn relative_time(then: NaiveDateTime, now: NaiveDateTime) -> String {
    let hours = (now - then).num_hours();
    let days = hours / 24;

    if days > 0 {
        if days == 1 { "Ontem".to_string() } else { format!("Há {} dias", days) }
    } else if hours > 0 {
        format!("Há {} hora{}", hours, if hours > 1 { "s" } else { "" })
    } else {
        "Agora mesmo".to_string()
    }
}
