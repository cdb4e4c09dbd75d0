use chrono::NaiveDate;
use colored::Colorize;
use quicktoolify_core::store::Storage;
use quicktoolify_core::todo::{TodoCategory, TodoItem, TodoStore};
use serde::Serialize;

use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "todo")]
#[command(about = "Manage the to-do list")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Study,
    Other,
}

impl From<Category> for TodoCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Work => TodoCategory::Work,
            Category::Personal => TodoCategory::Personal,
            Category::Shopping => TodoCategory::Shopping,
            Category::Study => TodoCategory::Study,
            Category::Other => TodoCategory::Other,
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Add a task
    #[clap(name = "add")]
    Add {
        /// Task description
        text: String,

        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<NaiveDate>,

        /// Task category
        #[arg(short, long, value_enum)]
        category: Option<Category>,
    },

    /// List tasks
    #[clap(name = "list")]
    List {
        /// Only show tasks in this category
        #[arg(short, long, value_enum)]
        category: Option<Category>,

        /// Only show overdue, unfinished tasks
        #[arg(long)]
        overdue: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark a task done, or not done again
    #[clap(name = "toggle")]
    Toggle {
        /// Task id
        id: String,
    },

    /// Delete a task
    #[clap(name = "delete")]
    Delete {
        /// Task id
        id: String,
    },

    /// Delete every completed task
    #[clap(name = "clear-completed")]
    ClearCompleted,
}

#[derive(Debug, Serialize)]
pub struct TodoOutput {
    #[serde(flatten)]
    pub item: TodoItem,
    pub overdue: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let storage = crate::storage::open(&global)?;
    let mut store = TodoStore::load(storage);

    if let Some(e) = store.load_error() {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    let today = chrono::Local::now().date_naive();

    match app.command {
        Commands::Add {
            text,
            due,
            category,
        } => {
            let now = chrono::Utc::now().timestamp_millis();
            let item = store.add(&text, due, category.map(Into::into), now)?;
            println!("{} {} {}", "Added".green().bold(), item.id.bright_black(), item.text);
        }
        Commands::List {
            category,
            overdue,
            json,
        } => {
            let items = list_data(&store, category.map(Into::into), overdue, today);
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_items(&items);
            }
        }
        Commands::Toggle { id } => {
            let item = store.toggle(&id)?;
            let state = if item.completed {
                "Completed".green().bold()
            } else {
                "Reopened".yellow().bold()
            };
            println!("{state} {}", item.text);
        }
        Commands::Delete { id } => {
            let item = store.delete(&id)?;
            println!("{} {}", "Deleted".red().bold(), item.text);
        }
        Commands::ClearCompleted => {
            let removed = store.clear_completed();
            println!("Removed {removed} completed task(s)");
        }
    }

    Ok(())
}

/// Filtered list with overdue flags worked out against `today`.
pub fn list_data<S: Storage>(
    store: &TodoStore<S>,
    category: Option<TodoCategory>,
    overdue_only: bool,
    today: NaiveDate,
) -> Vec<TodoOutput> {
    store
        .list()
        .items()
        .iter()
        .filter(|item| category.is_none() || item.category == category)
        .map(|item| TodoOutput {
            overdue: !item.completed && item.is_overdue(today),
            item: item.clone(),
        })
        .filter(|out| !overdue_only || out.overdue)
        .collect()
}

fn print_items(items: &[TodoOutput]) {
    if items.is_empty() {
        println!("No tasks.");
        return;
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "ID".bold().cyan(),
        "".bold().cyan(),
        "Task".bold().cyan(),
        "Category".bold().cyan(),
        "Due".bold().cyan()
    ]);
    for out in items {
        let item = &out.item;
        let check = if item.completed { "[x]" } else { "[ ]" };
        let text = if item.completed {
            item.text.bright_black().strikethrough().to_string()
        } else {
            item.text.bright_white().to_string()
        };
        let due = item
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let due = if out.overdue {
            format!("{due} (overdue)").red().bold().to_string()
        } else {
            due
        };
        table.add_row(prettytable::row![
            item.id.bright_black().to_string(),
            check,
            text,
            item.category.map(|c| c.label()).unwrap_or(""),
            due
        ]);
    }
    table.printstd();
}
