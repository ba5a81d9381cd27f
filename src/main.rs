use clap::{Parser, Subcommand};
use instruction_gen::generate::{self, DocumentRequest};
use instruction_gen::progress::ProgressRecord;
use instruction_gen::project::Project;
use instruction_gen::{config, output, site, source};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "instruction-gen")]
#[command(about = "Builds a user manual from markdown instruction parts")]
#[command(long_about = "\
Builds a user manual from markdown instruction parts

Each part is one markdown file. A part is published twice: as a page of an
MkDocs site and as a chapter of a single .docx document.

Project structure:

  project/
  ├── instruction.toml               # Project config (optional)
  ├── Части_инструкции/              # Parts
  │   ├── 01_Первые_шаги.md
  │   ├── 02_Вход.md
  │   └── 02_Вход_NEW.md             # Revision, preferred over 02_Вход.md
  ├── СКРИНШОТЫ/                     # Screenshots, searched recursively
  ├── scripts/
  │   ├── screenshot_mapping.json    # Screenshot name → file
  │   ├── anchor_mapping.json        # #anchor → site page
  │   └── progress.json              # Document progress (generated)
  ├── hyperlink_mapping.json         # #anchor → document heading
  └── docs/                          # Site output

The document is built incrementally: parts already in it are skipped, new
ones are appended. Use --force or --reset to start over.

Run 'instruction-gen gen-config' to generate a documented instruction.toml.")]
#[command(version)]
struct Cli {
    /// Project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Also show bookmarks, resolved links and resolved screenshots
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate or extend the .docx document
    Docx {
        /// Sections to render, by key (default: all)
        #[arg(long, num_args = 1..)]
        sections: Vec<String>,
        /// Start a new document instead of appending
        #[arg(long)]
        force: bool,
        /// Delete the progress file and the document, then start over
        #[arg(long)]
        reset: bool,
        /// List available sections and exit
        #[arg(long)]
        list: bool,
    },
    /// Convert every mapped part into a site page and copy screenshots
    Site,
    /// Show every part with its source file and document status
    List,
    /// Validate the config and mapping files without building
    Check,
    /// Print a stock instruction.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Docx {
            sections,
            force,
            reset,
            list,
        } => {
            let project = Project::load(&cli.root)?;
            if list {
                output::print_sections(&project.config);
                return Ok(());
            }
            let request = DocumentRequest {
                sections,
                force,
                reset,
                date: chrono::Local::now().format("%d.%m.%Y").to_string(),
            };
            let report = generate::generate_document(&project, &request)?;
            output::print_document_report(&report, cli.verbose);
        }
        Command::Site => {
            let project = Project::load(&cli.root)?;
            let report = site::build_site(&project)?;
            output::print_site_report(&report, cli.verbose);
        }
        Command::List => {
            let project = Project::load(&cli.root)?;
            let record = ProgressRecord::load(&project.paths.progress_file).unwrap_or_else(|s| {
                println!("note: {s}; the next docx run rebuilds the document");
                ProgressRecord::empty()
            });
            let parts_dir = &project.paths.parts_dir;
            output::print_status(&project.config, &record, |key| {
                source::locate(parts_dir, key)
            });
        }
        Command::Check => {
            println!("==> Checking {}", cli.root.display());
            let project = Project::load(&cli.root)?;
            output::print_sections(&project.config);
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
