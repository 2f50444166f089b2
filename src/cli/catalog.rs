use std::{fs, path::PathBuf};

use giftdesk::{CatalogRepository, GiftId, GiftRecord, storage::export_json};
use tracing::instrument;

use super::{
    Workspace, parse_gift_id,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Default, clap::Parser)]
pub struct Catalog {
    /// Only show gifts suited to this occasion
    #[arg(long)]
    occasion: Option<String>,
}

impl Catalog {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        let catalog = workspace.catalog()?;

        let gifts: Vec<&GiftRecord> = catalog
            .list_active()
            .into_iter()
            .filter(|gift| {
                self.occasion.as_ref().is_none_or(|wanted| {
                    gift.occasions
                        .iter()
                        .any(|occasion| occasion.eq_ignore_ascii_case(wanted))
                })
            })
            .collect();

        if gifts.is_empty() {
            println!("{}", "No gifts to show.".dim());
            return Ok(());
        }

        let narrow = is_narrow();
        for gift in gifts {
            println!("{}  {}", gift.name, gift.price_label().info());
            if !narrow {
                println!("  {}", gift.category.label().dim());
                if !gift.occasions.is_empty() {
                    println!("  {}", gift.occasion_summary(2));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct List {}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        workspace.require_admin()?;
        let catalog = workspace.catalog()?;

        if catalog.list().is_empty() {
            println!("{}", "The catalog is empty.".dim());
            return Ok(());
        }

        let active = catalog.list_active().len();
        for gift in catalog.list() {
            let status = if gift.is_active {
                "active".success()
            } else {
                "inactive".warning()
            };
            println!(
                "{}  {:<28} {:<14} {:<20} {status}",
                gift.id.as_str().dim(),
                gift.name,
                gift.category.label(),
                gift.price_label(),
            );
        }
        println!(
            "{}",
            format!("{} gifts, {active} active", catalog.list().len()).dim()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Show {
    /// Identifier of the gift
    #[arg(value_parser = parse_gift_id)]
    id: GiftId,

    /// Print the record as JSON
    #[arg(long)]
    json: bool,
}

impl Show {
    #[instrument(level = "debug", skip(self), fields(id = %self.id))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        workspace.require_admin()?;
        let catalog = workspace.catalog()?;

        let Some(gift) = catalog.get(&self.id) else {
            anyhow::bail!("No gift with id {}", self.id);
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(gift)?);
            return Ok(());
        }

        println!("# {}", gift.name);
        if let Some(description) = &gift.description {
            println!("{description}\n");
        }
        println!("{}", "Details".dim());
        println!("  Id:         {}", gift.id);
        println!("  Category:   {}", gift.category.label());
        println!("  Price:      {}", gift.price_label());
        if !gift.dimensions.is_unset() {
            println!("  Dimensions: {}", gift.dimensions);
        }
        if !gift.occasions.is_empty() {
            println!("  Occasions:  {}", gift.occasions.join(", "));
        }
        if !gift.tags.is_empty() {
            println!("  Tags:       {}", gift.tags.join(", "));
        }
        println!(
            "  Status:     {}",
            if gift.is_active { "active" } else { "inactive" }
        );
        if let Some(url) = &gift.image_url {
            let shown = if url.starts_with("data:") {
                "embedded image"
            } else {
                url.as_str()
            };
            println!("  Image:      {shown}");
        }
        println!(
            "{}",
            format!(
                "  created {}, updated {}",
                gift.created_at.format("%Y-%m-%d %H:%M"),
                gift.updated_at.format("%Y-%m-%d %H:%M")
            )
            .dim()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Export {
    /// Write to this file instead of standard output
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl Export {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        workspace.require_admin()?;
        let catalog = workspace.catalog()?;

        let json = export_json(catalog.list())?;
        match self.output {
            Some(path) => {
                fs::write(&path, format!("{json}\n"))?;
                println!(
                    "{}",
                    format!("✅ Exported {} gifts to {}", catalog.list().len(), path.display())
                        .success()
                );
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}
