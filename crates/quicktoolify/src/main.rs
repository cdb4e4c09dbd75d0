use crate::prelude::*;
use clap::Parser;

mod api;
mod category;
mod error;
mod image;
mod json;
mod password;
mod prelude;
mod storage;
mod todo;
mod typing;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Handy everyday tools: image conversion and compression, JSON formatting, passwords, to-dos and typing practice"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Origin of the image conversion/compression API
    #[clap(
        long,
        env = "PUBLIC_API_ENDPOINT",
        global = true,
        default_value = "http://localhost:8080"
    )]
    api_endpoint: String,

    /// Directory holding persisted state (selected category, to-dos)
    #[clap(long, env = "QUICKTOOLIFY_DATA_DIR", global = true)]
    data_dir: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "QUICKTOOLIFY_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Browse tool categories and the persisted category selection
    Category(crate::category::App),

    /// Convert or compress images through the API
    Image(crate::image::App),

    /// Format or minify JSON
    Json(crate::json::App),

    /// Generate a batch of passwords
    Password(crate::password::App),

    /// Manage the to-do list
    Todo(crate::todo::App),

    /// Interactive typing practice
    Typing(crate::typing::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Category(sub_app) => crate::category::run(sub_app, app.global).await,
        SubCommands::Image(sub_app) => crate::image::run(sub_app, app.global).await,
        SubCommands::Json(sub_app) => crate::json::run(sub_app, app.global).await,
        SubCommands::Password(sub_app) => crate::password::run(sub_app, app.global).await,
        SubCommands::Todo(sub_app) => crate::todo::run(sub_app, app.global).await,
        SubCommands::Typing(sub_app) => crate::typing::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
