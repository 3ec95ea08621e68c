use std::{
    error::Error,
    io::{self},
    path::Path,
    process::exit,
};

use clap::Parser;
use rusqlite::Connection;

use budget_tracker::{NewUser, PasswordHash, ValidatedPassword, create_user, initialize_db};

/// A utility for registering a user that can log in to the API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The name the user logs in with.
    #[arg(long)]
    username: String,

    /// The user's email address.
    #[arg(long, default_value = "")]
    email: String,

    /// The user's first name.
    #[arg(long, default_value = "")]
    first_name: String,

    /// The user's last name.
    #[arg(long, default_value = "")]
    last_name: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    println!("Creating user {}", args.username);

    let user_inputs = [
        args.username.as_str(),
        args.email.as_str(),
        args.first_name.as_str(),
        args.last_name.as_str(),
    ];
    let Some(password_hash) = get_new_password_hash(&user_inputs) else {
        return Ok(());
    };

    let new_user = NewUser {
        username: args.username,
        password_hash,
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
    };

    match create_user(new_user, &connection) {
        Ok(user) => {
            println!("Created user {} with ID {}", user.username, user.id);
            Ok(())
        }
        Err(error) => {
            print_error(&error);
            exit(1);
        }
    }
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        None => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }
}

fn get_new_password_hash(user_inputs: &[&str]) -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter a password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        let validated_password = match ValidatedPassword::new(&first_password, user_inputs) {
            Ok(validated_password) => validated_password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
                continue;
            }
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
