//! Transaction report

use anyhow::{Context, Result};

use hisobot_core::domain::currency::{format_money, BASE_CURRENCY};
use hisobot_core::{Lang, TxKind};

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;

    if ctx.config.owner_chat_id.is_empty() {
        anyhow::bail!("No owner configured. Set app.ownerChatId in settings.json");
    }
    let scope = ctx
        .family_service
        .scope_ids(&ctx.config.owner_chat_id)
        .context("Failed to resolve report scope")?;

    let dict = ctx.category_service.dict();
    let payload = ctx
        .report_service
        .report_payload(&scope, &dict, Lang::Ru)
        .context("Failed to build report")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if payload.transactions.is_empty() {
        output::info("No transactions yet.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Date", "Type", "Category", "Amount", "Comment"]);
    for tx in &payload.transactions {
        let kind = match tx.kind {
            TxKind::Income => "+",
            TxKind::Expense => "-",
        };
        table.add_row(vec![
            tx.timestamp.format("%d.%m.%Y %H:%M").to_string(),
            kind.to_string(),
            tx.category.clone(),
            format_money(tx.base_amount, BASE_CURRENCY),
            tx.comment.clone(),
        ]);
    }
    println!("{table}");

    let mut shares: Vec<_> = payload.categories.iter().collect();
    shares.sort_by(|a, b| b.1.amount.cmp(&a.1.amount));
    for (label, share) in shares {
        println!(
            "  {}: {} ({}%)",
            label,
            format_money(share.amount, BASE_CURRENCY),
            share.percentage
        );
    }

    output::success(&format!(
        "Income {} | Expense {} | Balance {}",
        format_money(payload.totals.income, BASE_CURRENCY),
        format_money(payload.totals.expense, BASE_CURRENCY),
        format_money(payload.totals.balance, BASE_CURRENCY),
    ));
    Ok(())
}
