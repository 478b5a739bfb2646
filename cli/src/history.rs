use charity_core::service::dto::{EntryKind, LedgerEntry, Statement};
use charity_core::Config;
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

fn entry_rows(entries: &[LedgerEntry], config: &Config) -> Vec<EntryRow> {
    let mut rows = Vec::new();
    let mut last_date = None;

    for entry in entries {
        // Date column only on the first row of each day
        let date = if last_date == Some(entry.date) {
            String::new()
        } else {
            format!("{} ({})", entry.date.format("%Y-%m-%d"), entry.date.format("%a"))
        };
        last_date = Some(entry.date);

        rows.push(EntryRow {
            date,
            id: entry.id.to_string()[..8].to_string(),
            kind: entry.kind.to_string(),
            item: entry.item_name.clone(),
            category: entry.category.clone().unwrap_or_else(|| "-".to_string()),
            amount: config.format_amount(entry.signed_amount()),
        });
    }
    rows
}

fn print_entries(entries: &[LedgerEntry], config: &Config) {
    let mut table = Table::new(entry_rows(entries, config));
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    println!("{}", table);
}

pub fn show_statement(statement: &Statement, config: &Config) {
    println!(
        "\n\x1b[1;36m{} to {}\x1b[0m",
        statement.range.start.format("%Y-%m-%d"),
        statement.range.end.format("%Y-%m-%d")
    );

    if statement.entries.is_empty() {
        println!("No sales or expenses in this range.");
    } else {
        print_entries(&statement.entries, config);
    }

    let sales = statement.entries.iter().filter(|e| e.kind == EntryKind::Sale).count();
    let expenses = statement.entries.len() - sales;
    println!("  Opening balance: {}", config.format_amount(statement.opening_balance));
    println!(
        "  Income:          {} ({} listed sales)",
        config.format_amount(statement.total_income),
        sales
    );
    println!(
        "  Expenses:        {} ({} listed expenses)",
        config.format_amount(statement.total_expenses),
        expenses
    );
    println!("  Closing balance: {}", config.format_amount(statement.closing_balance));
    println!("  Change:          {}", config.format_amount(statement.change()));
}

pub fn show_recent(entries: &[LedgerEntry], config: &Config) {
    if entries.is_empty() {
        println!("No sales or expenses recorded yet.");
        return;
    }
    print_entries(entries, config);
}
