use super::render;
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use recipebook::seed::load_seed_file;
use recipebook::validation::{IngredientForm, RecipeForm, StepForm};
use recipebook::{RecipeBook, RecipeFiltersPatch, RecipeTag, SnapshotEncoding, StoreConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recipebook")]
#[command(about = "Manage a local recipe collection")]
pub struct Cli {
    /// Root directory for persisted recipes (overrides RECIPEBOOK_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Snapshot encoding: json or msgpack (overrides RECIPEBOOK_FORMAT)
    #[arg(long, global = true)]
    format: Option<SnapshotEncoding>,

    /// Seed file merged in at startup; stored recipes win on conflicts
    #[arg(long, global = true)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every recipe in collection order
    List,
    /// List recipes matching a text query and/or any of the given tags
    Search {
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long = "tag", short)]
        tags: Vec<RecipeTag>,
    },
    /// Show one recipe in full
    Show { id: String },
    /// Add a recipe
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<RecipeTag>,
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
        #[arg(long = "step")]
        steps: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        servings: Option<String>,
        #[arg(long)]
        prep: Option<String>,
        #[arg(long)]
        cook: Option<String>,
        #[arg(long)]
        total: Option<String>,
    },
    Like { id: String },
    Dislike { id: String },
    ResetReactions { id: String },
    Remove { id: String },
    /// Replace the whole collection with the recipes in a seed file
    Seed { file: PathBuf },
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = StoreConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config = config.data_dir(dir);
    }
    if let Some(format) = cli.format {
        config = config.encoding(format);
    }

    let incoming = match &cli.seed {
        Some(path) => load_seed_file(path)
            .await
            .with_context(|| format!("Failed to load seed file '{}'", path.display()))?,
        None => Vec::new(),
    };

    let book = RecipeBook::new(config);
    let persistence = book.open(incoming).await;
    let outcome = execute(&book, cli.command).await;
    persistence.flush().await;
    outcome
}

async fn execute(book: &RecipeBook, command: Command) -> Result<()> {
    let store = book.store();

    match command {
        Command::List => render::print_list(&book.all()),
        Command::Search { query, tags } => {
            store.set_filters(RecipeFiltersPatch {
                search_query: Some(query.unwrap_or_default()),
                tags: Some(tags),
            });
            render::print_list(&book.filtered());
        }
        Command::Show { id } => {
            let recipe = store.get(&id).ok_or_else(|| anyhow!("No recipe with id '{}'", id))?;
            render::print_recipe(&recipe);
        }
        Command::Add {
            title,
            description,
            author,
            tags,
            ingredients,
            steps,
            notes,
            servings,
            prep,
            cook,
            total,
        } => {
            let form = RecipeForm {
                title,
                description,
                author,
                image_url: None,
                tags,
                ingredients: ingredients.into_iter().map(IngredientForm::new).collect(),
                steps: steps.into_iter().map(StepForm::new).collect(),
                notes,
                servings,
                prep_time_minutes: prep,
                cook_time_minutes: cook,
                total_time_minutes: total,
            };
            let input = form.into_valid_input()?;
            let recipe = store.create(input)?;
            println!("Created {}", recipe.id);
        }
        Command::Like { id } => {
            let recipe = store.like(&id).ok_or_else(|| anyhow!("No recipe with id '{}'", id))?;
            render::print_reactions(&recipe);
        }
        Command::Dislike { id } => {
            let recipe = store.dislike(&id).ok_or_else(|| anyhow!("No recipe with id '{}'", id))?;
            render::print_reactions(&recipe);
        }
        Command::ResetReactions { id } => {
            let recipe = store
                .reset_reactions(&id)
                .ok_or_else(|| anyhow!("No recipe with id '{}'", id))?;
            render::print_reactions(&recipe);
        }
        Command::Remove { id } => {
            store.remove(&id).ok_or_else(|| anyhow!("No recipe with id '{}'", id))?;
            println!("Removed {}", id);
        }
        Command::Seed { file } => {
            let count = book
                .seed_loader()
                .load_file(&file)
                .await
                .with_context(|| format!("Failed to import '{}'", file.display()))?;
            println!("Imported {} recipes", count);
        }
    }

    Ok(())
}
