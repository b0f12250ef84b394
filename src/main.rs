//! Terminal front-end for the loan assistant. Presentation glue only: every
//! decision lives in the library's controllers.

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use loan_assistant::chat::{display_lines, ChatSession};
use loan_assistant::config;
use loan_assistant::eligibility::EligibilityForm;
use loan_assistant::gateway::Gateway;
use loan_assistant::models::EmploymentType;
use loan_assistant::notify::ToastCenter;
use loan_assistant::session_store::FileSessionStore;

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let toasts = ToastCenter::new();
    let gateway = Gateway::new();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!();
        println!("{} — what would you like to do?", config::APP_NAME);
        println!("  1) Check loan eligibility");
        println!("  2) Chat about loan products");
        println!("  q) Quit");
        let Some(choice) = prompt(&mut input, "> ").await else {
            break;
        };
        match choice.trim() {
            "1" => run_eligibility_check(&gateway, &toasts, &mut input).await,
            "2" => run_chat(&gateway, &mut input).await,
            "q" | "quit" | "exit" => break,
            "" => {}
            other => println!("Unknown choice: {other}"),
        }
    }

    toasts.shutdown();
}

async fn prompt(input: &mut Input, label: &str) -> Option<String> {
    print!("{label}");
    let _ = std::io::stdout().flush();
    input.next_line().await.ok().flatten()
}

fn flush_toasts(toasts: &ToastCenter) {
    for toast in toasts.drain() {
        println!("[{:?}] {}", toast.severity, toast.message);
    }
}

// ═══════════════════════════════════════════════════════════
// Eligibility flow
// ═══════════════════════════════════════════════════════════

async fn run_eligibility_check(gateway: &Gateway, toasts: &ToastCenter, input: &mut Input) {
    let mut form = EligibilityForm::new(toasts.clone());
    let cancel = CancellationToken::new();

    println!("Loading loan types...");
    form.load_loan_types(gateway, &cancel).await;
    flush_toasts(toasts);
    if form.catalog_unavailable() {
        println!("{}", form.loan_type_placeholder());
        return;
    }

    println!("Available loan types:");
    for loan_type in form.loan_types() {
        println!("  {}) {}", loan_type.loan_type_id, loan_type.loan_type_name);
    }

    if let Some(raw) = prompt(input, "Loan type id: ").await {
        form.set_loan_type(&raw);
    }
    if let Some(required) = form.required_employment_type() {
        println!("This loan type is available for {required} applicants.");
    }
    if let Some(raw) = prompt(input, "Requested amount: ").await {
        form.set_requested_amount(&raw);
    }
    if let Some(raw) = prompt(input, "Tenure in months: ").await {
        form.set_tenure(&raw);
    }
    if let Some(raw) = prompt(input, "Date of birth (YYYY-MM-DD): ").await {
        form.set_date_of_birth(&raw);
    }
    if let Some(raw) = prompt(input, "Employment type (1 Salaried, 2 Self Employed): ").await {
        form.set_employment_type(match raw.trim() {
            "1" => Some(EmploymentType::Salaried),
            "2" => Some(EmploymentType::SelfEmployed),
            _ => None,
        });
    }
    if let Some(raw) = prompt(input, "Monthly income: ").await {
        form.set_monthly_income(&raw);
    }
    if let Some(raw) = prompt(input, "Existing EMI: ").await {
        form.set_existing_emi(&raw);
    }
    if let Some(raw) = prompt(input, "Credit score (0-900): ").await {
        form.set_credit_score(&raw);
    }

    if let Some(message) = form.employment_mismatch() {
        println!("{message}");
    }
    if !form.can_submit() {
        println!("The form is incomplete or invalid; eligibility was not checked.");
        return;
    }

    form.submit(gateway, &cancel).await;
    flush_toasts(toasts);

    if let Some(result) = form.result() {
        println!("{}", result.eligibility_status);
        println!("{}", result.remarks);
        if result.is_eligible {
            if let Some(emi) = result.calculated_emi {
                println!("Calculated EMI: INR {emi:.2}");
            }
            if let Some(pct) = result.emi_to_income_pct {
                println!("EMI / Income: {pct:.1}%");
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Chat flow
// ═══════════════════════════════════════════════════════════

async fn run_chat(gateway: &Gateway, input: &mut Input) {
    let mut session = ChatSession::new(Box::new(FileSessionStore::default_location()));
    println!("Chat started. /clear starts a new session, /back returns to the menu.");
    print_messages(&session, 0);

    loop {
        let Some(line) = prompt(input, "you> ").await else {
            break;
        };
        match line.trim() {
            "/back" | "/quit" => break,
            "/clear" => {
                session.clear(gateway).await;
                if let Some(error) = session.error() {
                    println!("{error}");
                } else {
                    print_messages(&session, 0);
                }
            }
            _ => {
                let seen = session.messages().len();
                session.set_input(&line);
                session.send_message(gateway).await;
                print_messages(&session, seen);
                if let Some(error) = session.error() {
                    println!("{error}");
                }
            }
        }
    }
}

fn print_messages(session: &ChatSession, from: usize) {
    for message in &session.messages()[from..] {
        let speaker = message.sender.as_str();
        for line in display_lines(message) {
            println!("{speaker}> {line}");
        }
    }
}
