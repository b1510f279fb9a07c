use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use housing_browse::browse::saved_search::format_price;
use housing_browse::browse::{to_summary, BrowseParams, FavoriteSort};
use housing_browse::config::AppConfig;
use housing_browse::models::{FilterSet, Property, PropertyId};
use housing_browse::session::{BrowseSession, FavoriteChange, SavedSearchBook, TracingNotifier};
use housing_browse::store::Repositories;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "housing-browse", about = "Browse, filter and favorite property listings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List properties matching a query and filters
    Browse {
        /// Free-text search over title, address, city, state and type
        #[arg(long, default_value = "")]
        search: String,
        /// Start from a browse query string, e.g. "search=austin&priceMax=300000"
        #[arg(long)]
        from: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Print JSON instead of a listing table
        #[arg(long)]
        json: bool,
    },
    /// Show one property
    Property {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Toggle the favorite state of one or more properties
    ///
    /// With the mock data source favorites live only for this run; use
    /// HOUSING_DATA_SOURCE=remote to keep them.
    Favorite {
        ids: Vec<String>,
        #[arg(long, value_enum, default_value_t = FavoriteSort::Newest)]
        sort: FavoriteSort,
    },
    /// List favorited properties
    ///
    /// The mock data source starts every run with no favorites, so this is
    /// only useful with HOUSING_DATA_SOURCE=remote.
    Favorites {
        #[arg(long, value_enum, default_value_t = FavoriteSort::Newest)]
        sort: FavoriteSort,
    },
    /// Describe a filter set and print its browse link
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Save a named filter set
    ///
    /// With the mock data source the search lives only for this run; use
    /// HOUSING_DATA_SOURCE=remote to keep it.
    Save {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List saved searches
    ///
    /// The mock data source starts every run with no saved searches, so this
    /// is only useful with HOUSING_DATA_SOURCE=remote.
    Searches,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    price_min: Option<String>,
    #[arg(long)]
    price_max: Option<String>,
    /// Property type; repeat for several (House, Apartment, Condo, Townhouse, Loft)
    #[arg(long = "type")]
    types: Vec<String>,
    #[arg(long)]
    beds: Option<String>,
    #[arg(long)]
    baths: Option<String>,
    #[arg(long)]
    sqft: Option<String>,
    #[arg(long)]
    location: Option<String>,
}

impl FilterArgs {
    /// Flags override whatever the base filter set carries
    fn apply(self, filters: &mut FilterSet) {
        let set = |field: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *field = value;
            }
        };
        set(&mut filters.price_min, self.price_min);
        set(&mut filters.price_max, self.price_max);
        set(&mut filters.bedrooms_min, self.beds);
        set(&mut filters.bathrooms_min, self.baths);
        set(&mut filters.square_feet_min, self.sqft);
        set(&mut filters.location, self.location);
        for property_type in self.types {
            if !filters.property_types.contains(&property_type) {
                filters.toggle_property_type(&property_type);
            }
        }
    }

    fn into_filters(self) -> FilterSet {
        let mut filters = FilterSet::default();
        self.apply(&mut filters);
        filters
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let repos = Repositories::connect(&config).context("Failed to connect to data store")?;
    let notifier = Arc::new(TracingNotifier);

    match cli.command {
        Command::Browse {
            search,
            from,
            filters,
            json,
        } => {
            let mut params = from
                .as_deref()
                .map(BrowseParams::from_query_string)
                .unwrap_or_default();
            if !search.is_empty() {
                params.query = search;
            }
            filters.apply(&mut params.filters);

            let mut session = BrowseSession::new(&repos, notifier);
            session.load().await.context("Failed to load properties")?;
            session.apply_params(params);

            info!("🔎 {}", to_summary(session.filters()));
            let visible = session.visible();
            info!("{} properties found", visible.len());

            if json {
                println!("{}", serde_json::to_string_pretty(&visible)?);
            } else {
                for (i, property) in visible.iter().enumerate() {
                    print_property(i + 1, property, session.is_favorite(&property.id));
                }
            }
        }
        Command::Property { id, json } => {
            let id = PropertyId::from(id);
            let property = repos
                .properties
                .get_by_id(&id)
                .await?
                .with_context(|| format!("Property {} not found", id))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&property)?);
            } else {
                print_property(1, &property, false);
                println!("   {}", property.description);
                println!(
                    "   Built {}, listed {}",
                    property.year_built,
                    property.listing_date.format("%b %-d, %Y")
                );
            }
        }
        Command::Favorite { ids, sort } => {
            let mut session = BrowseSession::new(&repos, notifier);
            session.load().await.context("Failed to load properties")?;

            for id in ids {
                match session.toggle_favorite(&PropertyId::from(id)).await? {
                    FavoriteChange::Added(favorite) => {
                        println!("♥ Added property {}", favorite.property_id)
                    }
                    FavoriteChange::Removed(favorite) => {
                        println!("♡ Removed property {}", favorite.property_id)
                    }
                }
            }
            print_favorites(&session, sort);
        }
        Command::Favorites { sort } => {
            let mut session = BrowseSession::new(&repos, notifier);
            session.load().await.context("Failed to load favorites")?;
            print_favorites(&session, sort);
        }
        Command::Summary { filters } => {
            let filters = filters.into_filters();
            println!("{}", to_summary(&filters));
            println!("{}", housing_browse::browse::browse_path(&filters));
        }
        Command::Save { name, filters } => {
            let mut book = SavedSearchBook::new(&repos, notifier);
            book.load().await.context("Failed to load saved searches")?;
            let created = book.create(&name, filters.into_filters()).await?;
            println!("💾 Saved \"{}\" ({})", created.name, created.id);
            println!("   {}", to_summary(&created.filters));
            println!("   {}", book.run(&created.id)?);
        }
        Command::Searches => {
            let mut book = SavedSearchBook::new(&repos, notifier);
            book.load().await.context("Failed to load saved searches")?;
            if book.searches().is_empty() {
                println!("No saved searches");
            }
            for search in book.searches() {
                println!("{} ({})", search.name, search.id);
                println!("   {}", to_summary(&search.filters));
                println!("   Created {}", search.created_at.format("%b %-d, %Y"));
                println!("   {}", book.run(&search.id)?);
            }
        }
    }

    Ok(())
}

fn print_property(index: usize, property: &Property, favorite: bool) {
    let heart = if favorite { " ♥" } else { "" };
    println!("{}. {} ({}){}", index, property.title, format_price(property.price), heart);
    println!(
        "   {}, {}, {} {}",
        property.address, property.city, property.state, property.zip_code
    );
    println!(
        "   {} · {} bd · {} ba · {} sq ft",
        property.property_type, property.bedrooms, property.bathrooms, property.square_feet
    );
    println!("   ID: {}", property.id);
    if !property.features.is_empty() {
        println!("   Features: {}", property.features.join(", "));
    }
    println!();
}

fn print_favorites(session: &BrowseSession, sort: FavoriteSort) {
    let listings = session.favorite_listings(sort);
    if listings.is_empty() {
        println!("No favorites yet");
        return;
    }
    for (i, listing) in listings.iter().enumerate() {
        print_property(i + 1, &listing.property, true);
        println!("   Added {}", listing.added_at.format("%b %-d, %Y"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_store_backed_commands_mention_remote_source() {
        let cli = Cli::command();
        for name in ["favorite", "favorites", "save", "searches"] {
            let subcommand = cli.find_subcommand(name).unwrap();
            let help = subcommand.get_long_about().unwrap().to_string();
            assert!(help.contains("HOUSING_DATA_SOURCE=remote"), "{}: {}", name, help);
        }
    }
}
