use std::fmt::Write as _;

use anyhow::{Context, Result};

use crate::config::ResolvedConfig;
use crate::format::{status_label, CurrencyFormat};
use crate::market_data::HistoryPoint;
use crate::portfolio::PortfolioView;
use crate::refresh::RefreshController;

use super::types::{HistorySummary, ValueOutput, ValuedHoldingOutput};
use super::{build_aggregator, open_store};

/// Load holdings, refresh prices once and value the portfolio.
pub async fn value_portfolio(config: &ResolvedConfig) -> Result<ValueOutput> {
    let store = open_store(config);
    let holdings = store.load().await.context("Failed to load holdings")?;

    let mut controller = RefreshController::new(build_aggregator(config));
    controller.sync(&holdings).await;

    let view = controller.view(&holdings);
    let format = CurrencyFormat::from_display(&config.display);
    Ok(value_output(&view, &format, &config.reporting_currency))
}

pub fn value_output(view: &PortfolioView, format: &CurrencyFormat, currency: &str) -> ValueOutput {
    let holdings = view
        .holdings
        .iter()
        .map(|h| ValuedHoldingOutput {
            id: h.holding.id.to_string(),
            kind: h.holding.kind,
            name: h.holding.label().to_string(),
            quantity: format!("{} {}", h.holding.quantity, h.holding.kind.unit_label()),
            unit_price: format.format_priced(h.unit_price, h.status),
            total_value: format.format_priced(h.total_value, h.status),
            status: status_label(h.status),
        })
        .collect();

    let history = match (&view.featured_id, &view.history) {
        (Some(id), Some(points)) => Some(summarize_history(id, points)),
        _ => None,
    };

    ValueOutput {
        reporting_currency: currency.to_string(),
        holdings,
        total_value: format.format(view.total_value),
        history,
        error: view.error,
    }
}

fn summarize_history(id: &str, points: &[HistoryPoint]) -> HistorySummary {
    let first = points.first().copied();
    let last = points.last().copied();
    let change_percent = match (first, last) {
        (Some(first), Some(last)) if first.price > 0.0 => {
            Some((last.price - first.price) / first.price * 100.0)
        }
        _ => None,
    };
    HistorySummary {
        id: id.to_string(),
        points: points.len(),
        first,
        last,
        change_percent,
    }
}

/// Plain-text table of a valuation, for terminals.
pub fn render_value_table(output: &ValueOutput) -> String {
    const HEADERS: [&str; 5] = ["HOLDING", "KIND", "QUANTITY", "UNIT PRICE", "VALUE"];

    let rows: Vec<[String; 5]> = output
        .holdings
        .iter()
        .map(|h| {
            [
                h.name.clone(),
                h.kind.to_string(),
                h.quantity.clone(),
                h.unit_price.clone(),
                h.total_value.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: [&str; 5]| {
        let line = cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                if i >= 2 {
                    format!("{cell:>width$}")
                } else {
                    format!("{cell:<width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", line.trim_end());
    };

    push_row(HEADERS);
    for row in &rows {
        push_row([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
            row[4].as_str(),
        ]);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total ({}): {}", output.reporting_currency, output.total_value);
    if output.error {
        let _ = writeln!(out, "Prices: Error (last refresh failed)");
    }
    if let Some(history) = &output.history {
        let _ = write!(out, "History for {}: {} points", history.id, history.points);
        if let Some(change) = history.change_percent {
            let _ = write!(out, " ({change:+.2}%)");
        }
        let _ = writeln!(out);
    }
    out
}
