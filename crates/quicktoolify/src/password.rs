use colored::Colorize;
use quicktoolify_core::password::{
    generate_passwords, password_strength, PasswordOptions, Strength, MAX_LENGTH, MIN_LENGTH,
};
use serde::Serialize;

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "password")]
#[command(about = "Generate a batch of passwords")]
pub struct App {
    /// Password length (4-32)
    #[arg(short, long, default_value_t = 8)]
    length: usize,

    /// Leave out lowercase letters
    #[arg(long)]
    no_lowercase: bool,

    /// Leave out uppercase letters
    #[arg(long)]
    no_uppercase: bool,

    /// Leave out digits
    #[arg(long)]
    no_numbers: bool,

    /// Leave out symbols
    #[arg(long)]
    no_symbols: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl App {
    fn options(&self) -> PasswordOptions {
        PasswordOptions {
            length: self.length,
            include_lowercase: !self.no_lowercase,
            include_uppercase: !self.no_uppercase,
            include_numbers: !self.no_numbers,
            include_symbols: !self.no_symbols,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PasswordOutput {
    pub password: String,
    pub strength: Strength,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let options = app.options();

    if global.verbose {
        println!("Options: {options:?}");
        println!("Length range: {MIN_LENGTH}-{MAX_LENGTH}");
        println!();
    }

    let passwords = password_data(&options, &mut rand::thread_rng())?;

    if app.json {
        println!("{}", serde_json::to_string_pretty(&passwords)?);
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "#".bold().cyan(),
        "Password".bold().cyan(),
        "Strength".bold().cyan()
    ]);
    for (i, entry) in passwords.iter().enumerate() {
        let label = match entry.strength {
            Strength::Weak => entry.strength.label().red(),
            Strength::Fair => entry.strength.label().yellow(),
            Strength::Strong => entry.strength.label().green(),
            Strength::VeryStrong => entry.strength.label().bright_green(),
        };
        table.add_row(prettytable::row![
            (i + 1).to_string().bright_black().to_string(),
            entry.password.bright_white().to_string(),
            label.to_string()
        ]);
    }
    table.printstd();

    Ok(())
}

pub fn password_data<R: rand::Rng>(
    options: &PasswordOptions,
    rng: &mut R,
) -> Result<Vec<PasswordOutput>> {
    Ok(generate_passwords(options, rng)?
        .into_iter()
        .map(|password| PasswordOutput {
            strength: password_strength(&password),
            password,
        })
        .collect())
}
