// Interactive report runner.
//
// - Option [1] loads tenders, transactions, the payment calendar and the
//   budget/debt/goal extras, printing load diagnostics.
// - Options [2]-[5] build one report each; [6] builds all of them.
// - Every report is saved as JSON under the configured output directory and
//   previewed as a markdown table.
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use tender_reports::config::{self, Config};
use tender_reports::loader::{self, LoadReport};
use tender_reports::output::{self, CashFlowRow, MonthPatternRow, SpecialistRow, StageRow};
use tender_reports::reports;
use tender_reports::types::{FinanceExtras, PaymentCalendarItem, Tender, Transaction};
use tender_reports::util;
use tracing_subscriber::EnvFilter;

static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<LoadedData>,
}

#[derive(Clone)]
struct LoadedData {
    tenders: Vec<Tender>,
    transactions: Vec<Transaction>,
    calendar: Vec<PaymentCalendarItem>,
    extras: FinanceExtras,
}

/// Prints `label` and returns the trimmed reply, or `None` once stdin is closed.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read from stdin");
            None
        }
    }
}

fn print_load_line(what: &str, report: &LoadReport) {
    println!(
        "{}: {} rows loaded, {} skipped",
        what,
        util::format_int(report.loaded_rows),
        util::format_int(report.parse_errors)
    );
}

/// Sources that fail to load are reported and treated as empty, so the
/// remaining reports can still be produced.
fn handle_load(cfg: &Config) {
    let tenders = match loader::load_tenders(&cfg.data.tenders) {
        Ok((rows, report)) => {
            print_load_line("Tenders", &report);
            rows
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}", cfg.data.tenders.display(), e);
            Vec::new()
        }
    };
    let transactions = match loader::load_transactions(&cfg.data.transactions) {
        Ok((rows, report)) => {
            print_load_line("Transactions", &report);
            rows
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}", cfg.data.transactions.display(), e);
            Vec::new()
        }
    };
    let calendar = match loader::load_calendar(&cfg.data.payment_calendar) {
        Ok((rows, report)) => {
            print_load_line("Payment calendar", &report);
            rows
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}", cfg.data.payment_calendar.display(), e);
            Vec::new()
        }
    };
    let extras = match loader::load_finance_extras(&cfg.data.finance_extras) {
        Ok(extras) => extras,
        Err(e) => {
            eprintln!("Failed to load {}: {}", cfg.data.finance_extras.display(), e);
            FinanceExtras::default()
        }
    };
    println!(
        "Budgets: {}, debts: {}, goals: {}\n",
        extras.budgets.len(),
        extras.debts.len(),
        extras.goals.len()
    );

    let mut state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
    state.data = Some(LoadedData {
        tenders,
        transactions,
        calendar,
        extras,
    });
}

fn save_json<T: serde::Serialize>(cfg: &Config, file: &str, value: &T) {
    let path = cfg.output.dir.join(file);
    match output::write_json(&path, value) {
        Ok(()) => println!("(Full report exported to {})\n", path.display()),
        Err(e) => eprintln!("Write error: {}", e),
    }
}

fn department(cfg: &Config, data: &LoadedData) {
    let r = reports::generate_department_report(&cfg.scope(), &data.tenders);
    println!("Tender Department Report\n");
    println!(
        "Tenders: {}, active: {}, won: {}, lost: {}, win rate: {}%, avg processing: {} days\n",
        util::format_int(r.overview.total_tenders),
        util::format_int(r.overview.active_tenders),
        util::format_int(r.overview.won_tenders),
        util::format_int(r.overview.lost_tenders),
        util::format_number(r.overview.win_rate, 1),
        r.overview.avg_processing_days
    );
    let specialists: Vec<SpecialistRow> = r.specialists.iter().map(SpecialistRow::from).collect();
    output::preview_table_rows(&specialists, cfg.output.preview_rows);
    let stages: Vec<StageRow> = r.stages.iter().map(StageRow::from).collect();
    output::preview_table_rows(&stages, cfg.output.preview_rows);
    if r.unrecorded_loss_reasons > 0 {
        println!(
            "Note: {} lost tenders have no recorded loss reason.\n",
            r.unrecorded_loss_reasons
        );
    }
    save_json(cfg, "department_report.json", &r);
}

fn financial_health(cfg: &Config, data: &LoadedData) {
    let r = reports::generate_financial_health(&cfg.scope(), &data.transactions, &data.extras);
    println!("Financial Health\n");
    println!("Overall score: {} ({})\n", r.overall_score, r.grade.as_str());
    output::preview_table_rows(&output::health_rows(&r), 4);
    for line in &r.insights {
        println!("- {}", line);
    }
    for rec in &r.recommendations {
        println!("* [{:?}] {}: {}", rec.priority, rec.title, rec.description);
    }
    println!();
    save_json(cfg, "financial_health.json", &r);
}

fn seasonality(cfg: &Config, data: &LoadedData) {
    let r = reports::generate_seasonality(&cfg.scope(), &data.transactions);
    println!("Seasonality\n");
    let months: Vec<MonthPatternRow> = r.monthly_patterns.iter().map(MonthPatternRow::from).collect();
    output::preview_table_rows(&months, 12);
    for line in &r.insights {
        println!("- {}", line);
    }
    println!();
    save_json(cfg, "seasonality.json", &r);
}

fn payment_calendar(cfg: &Config, data: &LoadedData) {
    let as_of = cfg
        .report
        .as_of
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let r = reports::generate_payment_calendar(&cfg.scope(), &data.calendar, &data.tenders, as_of);
    println!("Payment Calendar (as of {})\n", as_of);
    let rows: Vec<CashFlowRow> = r.monthly.iter().map(CashFlowRow::from).collect();
    output::preview_table_rows(&rows, cfg.output.preview_rows);
    println!(
        "Events: {}, tender deadlines: {}, overdue: {}\n",
        util::format_int(r.totals.events),
        util::format_int(r.totals.tender_deadlines),
        util::format_int(r.totals.overdue_count)
    );
    let csv_path = cfg.output.dir.join("cash_flow.csv");
    if let Err(e) = output::write_csv(&csv_path, &rows) {
        eprintln!("Write error: {}", e);
    }
    save_json(cfg, "payment_calendar.json", &r);
}

fn handle_report(cfg: &Config, choice: &str) {
    let data = {
        let state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return;
    };
    match choice {
        "2" => department(cfg, &data),
        "3" => financial_health(cfg, &data),
        "4" => seasonality(cfg, &data),
        "5" => payment_calendar(cfg, &data),
        _ => {
            department(cfg, &data);
            financial_health(cfg, &data);
            seasonality(cfg, &data);
            payment_calendar(cfg, &data);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cfg = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(company = %cfg.report.company_id, "report runner started");

    loop {
        println!("Select Report:");
        println!("[1] Load data");
        println!("[2] Tender department report");
        println!("[3] Financial health");
        println!("[4] Seasonality");
        println!("[5] Payment calendar");
        println!("[6] All reports\n");
        let Some(choice) = prompt("Enter choice: ") else { break };
        match choice.as_str() {
            "1" => handle_load(&cfg),
            choice @ ("2" | "3" | "4" | "5" | "6") => {
                println!();
                handle_report(&cfg, choice);
                let stay = loop {
                    let Some(answer) = prompt("Back to Report Selection (Y/N): ") else { break false };
                    match answer.to_uppercase().as_str() {
                        "Y" => break true,
                        "N" => break false,
                        _ => println!("Invalid choice. Please enter Y or N."),
                    }
                };
                if !stay {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter a number from 1 to 6.\n"),
        }
    }
}
