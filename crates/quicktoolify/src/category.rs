use colored::Colorize;
use quicktoolify_core::catalog::{
    category_filter_entries, get_category_by_id, get_category_id_from_path,
    get_category_path_by_id, get_page_description, get_page_keywords, get_page_title,
    get_tools_by_category, require_tool, resolve_category, Category, Tool, ALL_CATEGORY,
};
use quicktoolify_core::store::{AppContext, Storage};
use serde::Serialize;

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "category")]
#[command(about = "Browse tool categories and the persisted category selection")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List every category, "all" first
    #[clap(name = "list")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tools in a category (defaults to the selected one)
    #[clap(name = "tools")]
    Tools {
        /// Category slug, numeric id or "all"
        category: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one tool by slug
    #[clap(name = "tool")]
    Tool {
        /// Tool slug, e.g. json-format
        slug: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Select a category and persist the choice
    #[clap(name = "select")]
    Select {
        /// Category slug, numeric id or "all"
        category: String,
    },

    /// Show the selected category
    #[clap(name = "current")]
    Current {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a `/category/{slug}` path to its category
    #[clap(name = "resolve")]
    Resolve {
        /// Path such as /category/json-formatter or a legacy /category/2
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Page title, description and keywords for a category
    #[clap(name = "meta")]
    Meta {
        /// Category slug, numeric id or "all" (defaults to the selected one)
        category: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct CategoryOutput {
    pub id: u32,
    pub name: String,
    pub slug: String,
    pub path: String,
    pub description: String,
    pub tool_count: usize,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct MetaOutput {
    pub title: String,
    pub description: String,
    pub keywords: String,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let storage = crate::storage::open(&global)?;
    let mut ctx = AppContext::new(storage);

    match app.command {
        Commands::List { json } => list(&ctx, json),
        Commands::Tools { category, json } => tools(&ctx, category.as_deref(), json),
        Commands::Tool { slug, json } => tool(&slug, json),
        Commands::Select { category } => select(&mut ctx, &category),
        Commands::Current { json } => current(&ctx, json),
        Commands::Resolve { path, json } => resolve(path, json),
        Commands::Meta { category, json } => meta(&ctx, category.as_deref(), json),
    }
}

fn category_output(category: &Category, selected: Option<u32>) -> CategoryOutput {
    let id = (category.id != 0).then_some(category.id);
    CategoryOutput {
        id: category.id,
        name: category.name.to_string(),
        slug: category.slug.to_string(),
        path: get_category_path_by_id(id),
        description: category.description.to_string(),
        tool_count: get_tools_by_category(id).len(),
        selected: id == selected,
    }
}

/// Category list with the selection marked.
pub fn list_data(selected: Option<u32>) -> Vec<CategoryOutput> {
    category_filter_entries()
        .into_iter()
        .map(|category| category_output(category, selected))
        .collect()
}

/// Resolve an optional argument, falling back to the persisted selection.
fn target_category<S: Storage>(ctx: &AppContext<S>, arg: Option<&str>) -> Result<Option<u32>> {
    match arg {
        Some(arg) => Ok(resolve_category(arg)?.map(|c| c.id)),
        None => Ok(ctx.selected_category.get()),
    }
}

fn list<S: Storage>(ctx: &AppContext<S>, json: bool) -> Result<()> {
    let categories = list_data(ctx.selected_category.get());

    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "".bold().cyan(),
        "ID".bold().cyan(),
        "Name".bold().cyan(),
        "Slug".bold().cyan(),
        "Tools".bold().cyan()
    ]);
    for category in &categories {
        let marker = if category.selected { "*" } else { "" };
        table.add_row(prettytable::row![
            marker.green().bold().to_string(),
            category.id.to_string().green().to_string(),
            category.name.bright_white().to_string(),
            category.slug.bright_blue().to_string(),
            category.tool_count.to_string().bright_yellow().to_string()
        ]);
    }
    table.printstd();

    Ok(())
}

fn print_tools(tools: &[&Tool]) {
    if tools.is_empty() {
        println!("No tools in this category yet.");
        return;
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Name".bold().cyan(),
        "Slug".bold().cyan(),
        "Description".bold().cyan(),
        "URL".bold().cyan()
    ]);
    for tool in tools {
        table.add_row(prettytable::row![
            tool.name.bright_white().to_string(),
            tool.slug.bright_blue().to_string(),
            tool.description.to_string(),
            tool.url.bright_black().to_string()
        ]);
    }
    table.printstd();
}

fn tools<S: Storage>(ctx: &AppContext<S>, arg: Option<&str>, json: bool) -> Result<()> {
    let id = target_category(ctx, arg)?;
    let tools = get_tools_by_category(id);

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    let name = get_category_by_id(id).map(|c| c.name).unwrap_or("Unknown");
    println!("{} {}", "Category:".bold(), name.bright_white());
    print_tools(&tools);

    Ok(())
}

fn tool(slug: &str, json: bool) -> Result<()> {
    let tool = require_tool(slug)?;

    if json {
        println!("{}", serde_json::to_string_pretty(tool)?);
        return Ok(());
    }

    let category = get_category_by_id(Some(tool.category_id))
        .map(|c| c.name)
        .unwrap_or("Unknown");
    println!("{}", tool.name.bright_white().bold());
    println!("{}", tool.description);
    println!("{} {}", "Category:".bold(), category);
    println!("{} {}", "URL:".bold(), tool.url.bright_blue());

    Ok(())
}

fn select<S: Storage>(ctx: &mut AppContext<S>, arg: &str) -> Result<()> {
    let id = resolve_category(arg)?.map(|c| c.id);
    let current_path = get_category_path_by_id(ctx.selected_category.get());

    match ctx.select_category(id, &current_path) {
        Some(path) => println!(
            "{} {} ({})",
            "Selected:".green().bold(),
            ctx.current_category_name(),
            path.bright_blue()
        ),
        None => println!(
            "{} {}",
            "Already selected:".yellow().bold(),
            ctx.current_category_name()
        ),
    }

    Ok(())
}

/// The selected category, or "all" when the stored id is gone.
pub fn current_data<S: Storage>(ctx: &AppContext<S>) -> CategoryOutput {
    let selected = ctx.selected_category.get();
    match get_category_by_id(selected) {
        Some(category) => category_output(category, selected),
        None => category_output(&ALL_CATEGORY, None),
    }
}

fn current<S: Storage>(ctx: &AppContext<S>, json: bool) -> Result<()> {
    let output = current_data(ctx);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {}", output.name.bright_white().bold(), output.path.bright_blue());
        println!("{}", output.description);
    }

    Ok(())
}

fn resolve(path: String, json: bool) -> Result<()> {
    let id = get_category_id_from_path(&path);
    let category = get_category_by_id(id).ok_or_eyre("Category lookup failed")?;
    let output = category_output(category, id);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} -> {} ({})", path, output.name.bright_white().bold(), output.slug);
    }

    Ok(())
}

/// Page metadata for a category id.
pub fn meta_data(id: Option<u32>) -> MetaOutput {
    MetaOutput {
        title: get_page_title(id),
        description: get_page_description(id),
        keywords: get_page_keywords(id),
    }
}

fn meta<S: Storage>(ctx: &AppContext<S>, arg: Option<&str>, json: bool) -> Result<()> {
    let output = meta_data(target_category(ctx, arg)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {}", "Title:".bold(), output.title);
        println!("{} {}", "Description:".bold(), output.description);
        println!("{} {}", "Keywords:".bold(), output.keywords);
    }

    Ok(())
}
