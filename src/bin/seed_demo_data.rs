use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration};

use budget_tracker::{
    CategoryName, Clock, Kind, Money, NewBudget, NewCategory, NewTransaction, NewUser,
    PasswordHash, SystemClock, ValidatedPassword, create_budget, create_category,
    create_transaction, create_user, delete_user, get_user_by_username, initialize_db,
};

const DEMO_USERNAME: &str = "test";
const DEMO_PASSWORD: &str = "test123";

const INCOME_CATEGORIES: [&str; 4] = ["Salary", "Freelance", "Investment Returns", "Bonus"];
const EXPENSE_CATEGORIES: [&str; 8] = [
    "Groceries",
    "Transportation",
    "Entertainment",
    "Utilities",
    "Healthcare",
    "Shopping",
    "Dining Out",
    "Education",
];

/// Descriptions for the expense categories after groceries and transportation.
const EXPENSE_DESCRIPTIONS: [[&str; 4]; 6] = [
    ["Movie tickets", "Concert", "Streaming subscription", "Gaming"],
    ["Electricity bill", "Water bill", "Internet bill", "Phone bill"],
    ["Medical checkup", "Medicines", "Health insurance", "Gym membership"],
    ["Clothing", "Electronics", "Home items", "Accessories"],
    ["Restaurant", "Cafe", "Fast food", "Food delivery"],
    ["Online course", "Books", "Training", "Certification"],
];

/// A utility for filling a database with a demo user and six months of sample records.
///
/// Running it again replaces the demo user's records.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    match db_path.extension() {
        None => {
            eprintln!("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    let clock = SystemClock::new(&args.timezone)?;
    let now = clock.now();
    let today = clock.today();

    println!("Opening database at {db_path:#?}");
    let mut connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    let transaction = connection.transaction()?;

    if let Ok(existing_user) = get_user_by_username(DEMO_USERNAME, &transaction) {
        println!("Removing the existing demo user and their records...");
        delete_user(existing_user.id, &transaction)?;
    }

    println!("Creating demo user...");
    let user = create_user(
        NewUser {
            username: DEMO_USERNAME.to_owned(),
            password_hash: PasswordHash::new(
                ValidatedPassword::new_unchecked(DEMO_PASSWORD),
                PasswordHash::DEFAULT_COST,
            )?,
            email: "test@gmail.com".to_owned(),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
        },
        &transaction,
    )?;

    let mut income_category_ids = Vec::with_capacity(INCOME_CATEGORIES.len());
    for name in INCOME_CATEGORIES {
        let category = create_category(
            user.id,
            NewCategory {
                name: CategoryName::new(name)?,
                kind: Kind::Income,
            },
            now,
            &transaction,
        )?;
        income_category_ids.push(category.id);
    }

    let mut expense_category_ids = Vec::with_capacity(EXPENSE_CATEGORIES.len());
    for name in EXPENSE_CATEGORIES {
        let category = create_category(
            user.id,
            NewCategory {
                name: CategoryName::new(name)?,
                kind: Kind::Expense,
            },
            now,
            &transaction,
        )?;
        expense_category_ids.push(category.id);
    }

    println!("Created {} income categories", income_category_ids.len());
    println!("Created {} expense categories", expense_category_ids.len());

    let mut samples = Vec::new();

    for i in 0..6 {
        let month_date = today - Duration::days(30 * i);

        samples.push(NewTransaction {
            category_id: Some(income_category_ids[0]),
            kind: Kind::Income,
            amount: Money::from_cents(50_000_00),
            description: "Monthly salary credit".to_owned(),
            date: month_date.replace_day(1)?,
        });

        if i % 2 == 0 {
            samples.push(NewTransaction {
                category_id: Some(income_category_ids[1]),
                kind: Kind::Income,
                amount: Money::from_cents((5_000 + 2_500 * i) * 100),
                description: "Freelance project payment".to_owned(),
                date: month_date - Duration::days(3 * i + 1),
            });
        }
    }

    for i in 0..12 {
        let week_date = today - Duration::weeks(i);

        samples.push(NewTransaction {
            category_id: Some(expense_category_ids[0]),
            kind: Kind::Expense,
            amount: Money::from_cents((2_000 + i * 337 % 4_000) * 100),
            description: "Weekly grocery shopping".to_owned(),
            date: week_date,
        });

        if i % 3 != 2 {
            samples.push(NewTransaction {
                category_id: Some(expense_category_ids[1]),
                kind: Kind::Expense,
                amount: Money::from_cents((500 + i * 125) * 100),
                description: "Fuel and transportation".to_owned(),
                date: week_date - Duration::days(i % 7),
            });
        }
    }

    for i in 0..30 {
        let category_index = i % EXPENSE_DESCRIPTIONS.len();

        samples.push(NewTransaction {
            category_id: Some(expense_category_ids[2 + category_index]),
            kind: Kind::Expense,
            amount: Money::from_cents((500 + i as i64 * 151 % 4_500) * 100),
            description: EXPENSE_DESCRIPTIONS[category_index][i % 4].to_owned(),
            date: today - Duration::days(i as i64 * 6),
        });
    }

    let transaction_count = samples.len();
    for sample in samples {
        create_transaction(user.id, sample, now, &transaction)?;
    }
    println!("Created {transaction_count} transactions");

    let mut budget_count = 0;
    for i in -2..=2 {
        let target_date: Date = today + Duration::days(30 * i);

        let result = create_budget(
            user.id,
            NewBudget {
                month: target_date.month().into(),
                year: target_date.year(),
                amount: Money::from_cents(30_000_00),
            },
            now,
            &transaction,
        );

        match result {
            Ok(_) => budget_count += 1,
            Err(budget_tracker::Error::DuplicateBudget) => {}
            Err(error) => return Err(error.into()),
        }
    }
    println!("Created {budget_count} budgets");

    transaction.commit()?;

    println!();
    println!("Demo account credentials:");
    println!("Username: {DEMO_USERNAME}");
    println!("Password: {DEMO_PASSWORD}");

    Ok(())
}
