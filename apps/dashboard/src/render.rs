use std::fmt::Write as _;

use client_core::adapters::{BoardColumn, KitchenTicket, SearchHit};
use order_core::timer::{ElapsedLabel, Urgency};

fn elapsed(label: &ElapsedLabel) -> String {
    let marker = match label.urgency {
        Urgency::Normal => "",
        Urgency::Warning => " !",
        Urgency::Critical => " !!",
    };
    format!("{}{marker}", label.text)
}

pub fn board(columns: &[BoardColumn]) -> String {
    if columns.is_empty() {
        return "no active orders\n".to_string();
    }
    let mut out = String::new();
    for column in columns {
        let _ = writeln!(out, "== {} ({}) ==", column.status, column.rows.len());
        for row in &column.rows {
            let _ = write!(
                out,
                "  #{} {} [{}]",
                row.order_number,
                row.customer,
                elapsed(&row.elapsed)
            );
            if row.remaining > 0.0 {
                let _ = write!(out, " owes {:.2}", row.remaining);
            }
            out.push('\n');
        }
    }
    out
}

pub fn tickets(kitchen: &str, tickets: &[KitchenTicket]) -> String {
    if tickets.is_empty() {
        return format!("{kitchen}: nothing to prepare\n");
    }
    let mut out = format!("{kitchen}: {} ticket(s)\n", tickets.len());
    for ticket in tickets {
        let _ = writeln!(
            out,
            "  #{} {}/{} prepared [{}]",
            ticket.order_number,
            ticket.completion.prepared_qty,
            ticket.completion.total_qty,
            elapsed(&ticket.elapsed)
        );
        for line in &ticket.lines {
            let _ = writeln!(out, "    {} x{} (item {})", line.name, line.quantity, line.item_id);
        }
    }
    out
}

pub fn hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("no orders match {query:?}\n");
    }
    hits.iter().fold(String::new(), |mut out, hit| {
        let _ = writeln!(
            out,
            "#{} {} ({}) id={}",
            hit.order_number, hit.customer, hit.status, hit.order_id
        );
        out
    })
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
