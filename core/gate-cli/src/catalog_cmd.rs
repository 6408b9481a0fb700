//! Admin commands for categories and flash cards. Results print as JSON.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use gate_core::catalog::{CategoryUpdate, FlashCardUpdate, NewCategory, NewFlashCard};
use gate_core::{CatalogDb, GateError, Result, StorageConfig};
use serde::Serialize;

#[derive(Subcommand)]
pub enum CategoryCommand {
    /// List categories with their card counts
    List,
    /// Show one category
    Show { id: i64 },
    /// Create a category
    Add(CategoryFields),
    /// Change some fields of a category
    Update {
        id: i64,
        #[command(flatten)]
        fields: CategoryPatch,
    },
    /// Delete a category and all of its cards
    Remove { id: i64 },
}

#[derive(Args)]
pub struct CategoryFields {
    /// Unique slug, e.g. "animals"
    #[arg(long)]
    name: String,
    #[arg(long)]
    display_name: String,
    #[arg(long)]
    folder: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    icon: String,
    #[arg(long, default_value = "")]
    color: String,
}

#[derive(Args)]
pub struct CategoryPatch {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    display_name: Option<String>,
    #[arg(long)]
    folder: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    icon: Option<String>,
    #[arg(long)]
    color: Option<String>,
}

#[derive(Subcommand)]
pub enum CardCommand {
    /// List cards, optionally for one category
    List {
        #[arg(long)]
        category: Option<i64>,
    },
    /// Show one card
    Show { id: i64 },
    /// Create a card
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image_url: String,
        #[arg(long)]
        category: i64,
        /// Image file stored alongside the URL
        #[arg(long)]
        image_file: Option<PathBuf>,
    },
    /// Change some fields of a card
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        image_file: Option<PathBuf>,
    },
    /// Delete a card
    Remove { id: i64 },
}

fn open_db(storage: &StorageConfig) -> Result<CatalogDb> {
    CatalogDb::new(storage.catalog_db_file())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|source| GateError::Json {
        context: "rendering output".to_string(),
        source,
    })?;
    println!("{text}");
    Ok(())
}

fn read_image(path: Option<PathBuf>) -> Result<Option<Vec<u8>>> {
    path.map(|path| {
        fs_err::read(&path).map_err(|source| GateError::Io {
            context: "reading image file".to_string(),
            source,
        })
    })
    .transpose()
}

pub fn init_db(storage: &StorageConfig) -> Result<()> {
    let db = open_db(storage)?;
    println!("catalog ready at {}", db.path().display());
    Ok(())
}

pub fn run_category(storage: &StorageConfig, command: CategoryCommand) -> Result<()> {
    let db = open_db(storage)?;
    match command {
        CategoryCommand::List => print_json(&db.list_categories()?),
        CategoryCommand::Show { id } => {
            let category = db.get_category(id)?.ok_or(GateError::CategoryNotFound(id))?;
            print_json(&category)
        }
        CategoryCommand::Add(fields) => {
            let category = db.create_category(&NewCategory {
                name: fields.name,
                display_name: fields.display_name,
                description: fields.description,
                icon: fields.icon,
                color: fields.color,
                folder: fields.folder,
            })?;
            print_json(&category)
        }
        CategoryCommand::Update { id, fields } => {
            let update = CategoryUpdate {
                name: fields.name,
                display_name: fields.display_name,
                description: fields.description,
                icon: fields.icon,
                color: fields.color,
                folder: fields.folder,
            };
            let category = db
                .update_category(id, &update)?
                .ok_or(GateError::CategoryNotFound(id))?;
            print_json(&category)
        }
        CategoryCommand::Remove { id } => {
            if !db.delete_category(id)? {
                return Err(GateError::CategoryNotFound(id));
            }
            println!("deleted category {id}");
            Ok(())
        }
    }
}

pub fn run_card(storage: &StorageConfig, command: CardCommand) -> Result<()> {
    let db = open_db(storage)?;
    match command {
        CardCommand::List { category: Some(id) } => {
            db.get_category(id)?.ok_or(GateError::CategoryNotFound(id))?;
            print_json(&db.list_flash_cards(id)?)
        }
        CardCommand::List { category: None } => print_json(&db.list_all_flash_cards()?),
        CardCommand::Show { id } => {
            let card = db.get_flash_card(id)?.ok_or(GateError::FlashCardNotFound(id))?;
            print_json(&card)
        }
        CardCommand::Add {
            name,
            image_url,
            category,
            image_file,
        } => {
            let card = db.create_flash_card(&NewFlashCard {
                name,
                image_url,
                image_data: read_image(image_file)?,
                category_id: category,
            })?;
            print_json(&card)
        }
        CardCommand::Update {
            id,
            name,
            image_url,
            category,
            image_file,
        } => {
            let update = FlashCardUpdate {
                name,
                image_url,
                image_data: read_image(image_file)?,
                category_id: category,
            };
            let card = db
                .update_flash_card(id, &update)?
                .ok_or(GateError::FlashCardNotFound(id))?;
            print_json(&card)
        }
        CardCommand::Remove { id } => {
            if !db.delete_flash_card(id)? {
                return Err(GateError::FlashCardNotFound(id));
            }
            println!("deleted card {id}");
            Ok(())
        }
    }
}
