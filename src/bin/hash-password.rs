//! Prints a bcrypt hash for the admin password.
//!
//! The output goes into `ADMIN_HASH_PASSWORD`, which takes precedence over
//! the plain `ADMIN_PASSWORD` at login.

use bcrypt::{hash, DEFAULT_COST};
use std::{env, process::ExitCode};

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(password) = args.next() else {
        eprintln!("Usage: hash-password <PASSWORD> [COST]");
        return ExitCode::FAILURE;
    };

    let cost = match args.next().map(|c| c.parse::<u32>()) {
        None => DEFAULT_COST,
        Some(Ok(cost)) if (4..=31).contains(&cost) => cost,
        Some(_) => {
            eprintln!("COST must be a number between 4 and 31");
            return ExitCode::FAILURE;
        }
    };

    match hash(&password, cost) {
        Ok(hashed) => {
            println!("\nCost : {}", cost);
            println!("Hash : {}\n", hashed);
            println!("# Paste this into your .env:");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            ExitCode::FAILURE
        }
    }
}
