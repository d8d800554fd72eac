//! Text front end: turns raw input lines into commands and events into text.

use std::io::{self, Write};

use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::Amount;
use crate::engine::{EngineError, Event, Machine, State};
use crate::model::{Command, Listing, ProductId};

/// Parse one line of customer input for the given state.
///
/// `cancel` is accepted everywhere. Anything that is not a valid identifier or
/// amount is reported with the same error the machine would give.
pub fn parse_input(line: &str, state: State) -> Result<Command, EngineError> {
    let input = line.trim();
    if input.eq_ignore_ascii_case("cancel") {
        return Ok(Command::Cancel);
    }

    match state {
        State::SelectProduct => input
            .parse::<ProductId>()
            .map(Command::Select)
            .map_err(|_| EngineError::OutOfRange),
        State::ReceiveMoney { .. } => input
            .parse::<Amount>()
            .map(Command::Insert)
            .map_err(|_| EngineError::InvalidAmount),
        State::GiveProduct { .. } => Err(EngineError::WrongState {
            operation: "read input",
            state,
        }),
    }
}

/// Write the text for one event
pub fn render(event: &Event, out: &mut impl Write) -> io::Result<()> {
    match event {
        Event::ProductList(rows) => render_table(rows, out),
        Event::PromptForIdentifier => writeln!(out, "Enter the product's id you would like to buy:"),
        Event::Error(EngineError::OutOfRange) => writeln!(out, "Number is out of range"),
        Event::Error(EngineError::OutOfStock(_)) => writeln!(out, "The product is out of stock"),
        Event::Error(EngineError::InvalidAmount) => writeln!(out, "Wrong input"),
        Event::Error(e) => writeln!(out, "Error: {e}"),
        Event::PromptForAmount(due) => writeln!(out, "put ${due}"),
        Event::ProductDispensed { name, .. } => writeln!(out, "Here is your {name}"),
        Event::ChangeDispensed(change) => {
            writeln!(out, "Your change is:")?;
            for (denomination, count) in change.breakdown.iter().rev() {
                writeln!(out, "{count} coin(s) by ${denomination}")?;
            }
            Ok(())
        }
        Event::UndispensableRemainder(remainder) => writeln!(
            out,
            "Sorry, I don't have coins to give you ${remainder} change. You can use it to buy another product"
        ),
        Event::RetainedOnCancel(credit) => writeln!(out, "You have ${credit}"),
    }
}

/// Draw the product list as a bordered table
fn render_table(rows: &[Listing], out: &mut impl Write) -> io::Result<()> {
    let headers = ["id", "name", "stock", "price"];
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.id.to_string(),
                row.name.clone(),
                row.stock.to_string(),
                row.price.to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .chain(std::iter::once("+".to_string()))
        .collect();
    let line = |values: &[&str]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("| {value:<width$} "))
            .chain(std::iter::once("|".to_string()))
            .collect()
    };

    writeln!(out, "{border}")?;
    writeln!(out, "{}", line(&headers[..]))?;
    writeln!(out, "{border}")?;
    for row in &cells {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        writeln!(out, "{}", line(values.as_slice()))?;
    }
    writeln!(out, "{border}")?;
    match cells.len() {
        1 => writeln!(out, "1 row in set"),
        n => writeln!(out, "{n} rows in set"),
    }
}

fn render_all(events: &[Event], out: &mut impl Write) -> io::Result<()> {
    for event in events {
        render(event, out)?;
    }
    out.flush()
}

/// Drive the machine from raw input lines until the input ends.
///
/// Input ending in the middle of a purchase is treated as a cancel.
pub async fn session(
    machine: &mut Machine,
    mut lines: impl Stream<Item = String> + Unpin,
    out: &mut impl Write,
) -> io::Result<()> {
    render_all(&machine.start(), out)?;

    while let Some(line) = lines.next().await {
        let events = match parse_input(&line, machine.state()) {
            Ok(command) => machine.handle(command),
            Err(e) => {
                info!(input = %line.trim(), state = %machine.state(), reason = %e, "input rejected");
                machine.reject(e)
            }
        };
        render_all(&events, out)?;
    }

    if machine.state() != State::SelectProduct {
        render_all(&machine.cancel(), out)?;
    }
    Ok(())
}
