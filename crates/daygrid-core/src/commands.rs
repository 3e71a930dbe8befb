use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::appointment::Appointment;
use crate::book::AppointmentBook;
use crate::cli::Command;
use crate::datetime::{parse_day_expr, parse_month_expr};
use crate::grid::month_grid;
use crate::input::{ArgsInput, InputPort};
use crate::render::Renderer;
use crate::storage::StoragePort;

#[instrument(skip(book, renderer, command))]
pub fn dispatch<S: StoragePort>(
    book: &mut AppointmentBook<S>,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    debug!(?command, "dispatching command");

    match command {
        Command::Show { month } => cmd_show(book, renderer, month.as_deref(), today),
        Command::Add {
            date,
            title,
            description,
        } => {
            let mut input = ArgsInput::new(title.join(" "), description);
            cmd_add(book, &mut input, &date, today)
        }
        Command::Remove { date, selector } => cmd_remove(book, &date, &selector, today),
        Command::Move {
            from,
            selector,
            to,
            at,
        } => cmd_move(book, &from, &selector, &to, at, today),
        Command::SeedDemo => cmd_seed_demo(book, today),
    }
}

#[instrument(skip(book, renderer, today))]
fn cmd_show<S: StoragePort>(
    book: &AppointmentBook<S>,
    renderer: &mut Renderer,
    month: Option<&str>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command show");

    let (year, month) = match month {
        Some(expr) => parse_month_expr(expr, today)?,
        None => (today.year(), today.month()),
    };

    let grid = month_grid(year, month as i32 - 1)?;
    let days: Vec<(NaiveDate, &[Appointment])> = grid
        .days
        .iter()
        .map(|day| (*day, book.appointments_on(*day)))
        .collect();

    renderer.print_month(&grid, &days, today)?;
    Ok(())
}

#[instrument(skip(book, input, today))]
fn cmd_add<S: StoragePort>(
    book: &mut AppointmentBook<S>,
    input: &mut dyn InputPort,
    date_expr: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command add");

    let day = parse_day_expr(date_expr, today)?;
    let Some(draft) = input.request(None)? else {
        println!("Cancelled; no appointment created.");
        return Ok(());
    };

    let appointment = book.add(day, draft)?;
    println!(
        "Added \"{}\" on {} ({}).",
        appointment.title,
        day.format("%Y-%m-%d"),
        appointment.id
    );
    Ok(())
}

#[instrument(skip(book, today))]
fn cmd_remove<S: StoragePort>(
    book: &mut AppointmentBook<S>,
    date_expr: &str,
    selector: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command remove");

    let day = parse_day_expr(date_expr, today)?;
    let Some(id) = resolve_selector(book, day, selector)? else {
        println!("No matching appointment on {}.", day.format("%Y-%m-%d"));
        return Ok(());
    };

    match book.remove(day, id)? {
        Some(removed) => println!(
            "Removed \"{}\" from {}.",
            removed.title,
            day.format("%Y-%m-%d")
        ),
        None => println!("No matching appointment on {}.", day.format("%Y-%m-%d")),
    }
    Ok(())
}

#[instrument(skip(book, today))]
fn cmd_move<S: StoragePort>(
    book: &mut AppointmentBook<S>,
    from_expr: &str,
    selector: &str,
    to_expr: &str,
    at: Option<usize>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command move");

    let from = parse_day_expr(from_expr, today)?;
    let to = parse_day_expr(to_expr, today)?;
    let Some(id) = resolve_selector(book, from, selector)? else {
        println!("No matching appointment on {}.", from.format("%Y-%m-%d"));
        return Ok(());
    };

    // 1-based position on the CLI; the book clamps to the list length, so
    // "no position" maps to end-of-list.
    let target_index = at.map(|position| position.saturating_sub(1)).unwrap_or(usize::MAX);

    match book.move_appointment(from, to, id, target_index)? {
        Some(moved) => println!(
            "Moved \"{}\" from {} to {}.",
            moved.title,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        ),
        None => println!("No matching appointment on {}.", from.format("%Y-%m-%d")),
    }
    Ok(())
}

#[instrument(skip(book, today))]
fn cmd_seed_demo<S: StoragePort>(
    book: &mut AppointmentBook<S>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command seed-demo");

    if book.seed_demo(today)? {
        println!("Seeded 4 demo appointments.");
    } else {
        println!("Demo appointments were already seeded.");
    }
    Ok(())
}

/// Resolves a CLI selector (1-based agenda position or appointment id) to
/// the id of an appointment on `day`. `None` means nothing matched.
fn resolve_selector<S: StoragePort>(
    book: &AppointmentBook<S>,
    day: NaiveDate,
    selector: &str,
) -> anyhow::Result<Option<Uuid>> {
    let entries = book.appointments_on(day);

    if let Ok(position) = selector.parse::<usize>() {
        if position == 0 || position > entries.len() {
            return Ok(None);
        }
        return Ok(Some(entries[position - 1].id));
    }

    let id = Uuid::parse_str(selector).with_context(|| {
        format!("selector must be a 1-based position or an appointment id: {selector}")
    })?;
    Ok(entries.iter().find(|entry| entry.id == id).map(|entry| entry.id))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{cmd_add, resolve_selector};
    use crate::appointment::AppointmentDraft;
    use crate::book::AppointmentBook;
    use crate::input::InputPort;
    use crate::storage::MemoryStorage;

    struct CancellingInput;

    impl InputPort for CancellingInput {
        fn request(
            &mut self,
            _initial: Option<AppointmentDraft>,
        ) -> anyhow::Result<Option<AppointmentDraft>> {
            Ok(None)
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn selector_resolves_position_and_id() {
        let mut storage = MemoryStorage::new();
        let mut book = AppointmentBook::open(&mut storage).expect("open");
        let target = day(2024, 2, 14);

        let first = book
            .add(target, AppointmentDraft::new("First", "").expect("draft"))
            .expect("add");
        let second = book
            .add(target, AppointmentDraft::new("Second", "").expect("draft"))
            .expect("add");

        assert_eq!(
            resolve_selector(&book, target, "2").expect("resolve"),
            Some(second.id)
        );
        assert_eq!(
            resolve_selector(&book, target, &first.id.to_string()).expect("resolve"),
            Some(first.id)
        );
        assert_eq!(resolve_selector(&book, target, "3").expect("resolve"), None);
        assert_eq!(resolve_selector(&book, target, "0").expect("resolve"), None);
        assert!(resolve_selector(&book, target, "not-a-selector").is_err());
    }

    #[test]
    fn cancelled_form_creates_nothing() {
        let mut storage = MemoryStorage::new();
        let mut book = AppointmentBook::open(&mut storage).expect("open");
        let today = day(2024, 2, 14);

        cmd_add(&mut book, &mut CancellingInput, "tomorrow", today).expect("add command");
        assert!(book.is_empty());
    }
}
