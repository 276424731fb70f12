use anyhow::Result;
use log::info;

use hardstore::{CategoryService, Database, ProductService, Settings};

/// Default hardware tree seeded into an empty store: (category, subcategories)
const DEFAULT_CATALOG: &[(&str, &[&str])] = &[
    ("Processors", &["Intel", "AMD"]),
    ("Graphics Cards", &["NVIDIA", "Radeon"]),
    ("Memory", &["DDR4", "DDR5"]),
    ("Storage", &["SSD", "HDD"]),
    ("Peripherals", &[]),
];

fn seed_default_catalog(categories: &CategoryService) -> Result<()> {
    info!("No categories found. Seeding the default catalog...");
    for (name, children) in DEFAULT_CATALOG {
        let description = format!("{} for desktop builds", name);
        let parent = categories.create_category(name, &description, None)?;
        for child in *children {
            let description = format!("{} {}", child, name.to_lowercase());
            categories.create_category(child, &description, Some(&parent.id))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let settings = Settings::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&settings.log_level),
    )
    .init();
    info!("Starting hardstore catalog...");

    let database = Database::open(&settings)?;
    let categories = CategoryService::new(database.category_repository());
    let products =
        ProductService::new(database.product_repository(), database.category_repository());

    if settings.catalog.seed_defaults && categories.is_empty()? {
        seed_default_catalog(&categories)?;
    }

    database.category_repository().verify_integrity()?;

    if std::env::args().skip(1).any(|arg| arg == "--json") {
        println!("{}", categories.export_tree_json()?);
    } else {
        print!("{}", categories.outline()?);
    }
    info!(
        "{} categories, {} products",
        categories.list_categories()?.len(),
        products.list_products()?.len()
    );

    Ok(())
}
