use std::io::Read;
use std::path::PathBuf;

use colored::Colorize;
use quicktoolify_core::json_format::{IndentStyle, JsonFormatter, DEFAULT_TAB_WIDTH, TAB_WIDTHS};

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "json")]
#[command(about = "Format or minify JSON")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Indent {
    Tab,
    Space2,
    Space4,
    Space6,
    Space8,
    Fullspace2,
    Underscore4,
    Noindent,
    Compact,
}

impl From<Indent> for IndentStyle {
    fn from(indent: Indent) -> Self {
        match indent {
            Indent::Tab => IndentStyle::Tab,
            Indent::Space2 => IndentStyle::Space2,
            Indent::Space4 => IndentStyle::Space4,
            Indent::Space6 => IndentStyle::Space6,
            Indent::Space8 => IndentStyle::Space8,
            Indent::Fullspace2 => IndentStyle::FullWidthSpace2,
            Indent::Underscore4 => IndentStyle::Underscore4,
            Indent::Noindent => IndentStyle::NoIndent,
            Indent::Compact => IndentStyle::Compact,
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Pretty-print JSON from a file or stdin
    #[clap(name = "format")]
    Format {
        /// Input file (reads stdin when omitted or "-")
        file: Option<PathBuf>,

        /// Indentation preset
        #[arg(short, long, value_enum, default_value = "space2")]
        indent: Indent,

        /// Display width of a tab (2, 4, 6 or 8); only affects terminal output
        #[arg(short, long, default_value_t = DEFAULT_TAB_WIDTH)]
        tab_width: usize,

        /// Print tabs as-is instead of expanding them
        #[arg(long)]
        raw: bool,
    },

    /// Strip all insignificant whitespace
    #[clap(name = "minify")]
    Minify {
        /// Input file (reads stdin when omitted or "-")
        file: Option<PathBuf>,
    },

    /// List the indentation presets
    #[clap(name = "styles")]
    Styles,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    match app.command {
        Commands::Format {
            file,
            indent,
            tab_width,
            raw,
        } => {
            let input = read_input(file.as_ref())?;
            let output = format_data(input, indent.into(), tab_width, raw)?;
            println!("{output}");
            Ok(())
        }
        Commands::Minify { file } => {
            let input = read_input(file.as_ref())?;
            let mut formatter = JsonFormatter::new();
            formatter.set_input(input);
            println!("{}", formatter.minify()?);
            Ok(())
        }
        Commands::Styles => {
            styles(global.verbose);
            Ok(())
        }
    }
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read {}: {e}", path.display())),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Format `input` and render it for the terminal.
pub fn format_data(input: String, style: IndentStyle, tab_width: usize, raw: bool) -> Result<String> {
    if !TAB_WIDTHS.contains(&tab_width) {
        return Err(eyre!(
            "Tab width must be one of {:?}, got {tab_width}",
            TAB_WIDTHS
        ));
    }

    let mut formatter = JsonFormatter::new();
    formatter.style = style;
    formatter.tab_width = tab_width;
    formatter.set_input(input);
    formatter.format()?;

    if raw {
        Ok(formatter.output().to_string())
    } else {
        Ok(formatter.display_output())
    }
}

fn styles(verbose: bool) {
    let mut table = new_table();
    table.add_row(prettytable::row!["ID".bold().cyan(), "Style".bold().cyan()]);
    for style in IndentStyle::ALL {
        table.add_row(prettytable::row![style.id().green().to_string(), style.label()]);
    }
    table.printstd();

    if verbose {
        println!("Tab widths: {TAB_WIDTHS:?} (default {DEFAULT_TAB_WIDTH})");
    }
}
