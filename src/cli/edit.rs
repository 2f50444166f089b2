use std::path::PathBuf;

use giftdesk::{
    CatalogRepository, GiftDraft, GiftForm, GiftId, ImageFile,
};
use tracing::instrument;

use super::{Workspace, parse_gift_id, terminal::Colorize};

/// Form fields shared by `add` and `edit`.
///
/// Values are taken as typed; numbers that do not parse count as zero.
#[derive(Debug, Default, clap::Args)]
pub struct GiftFields {
    /// Gift name
    #[arg(long)]
    name: Option<String>,

    /// Description
    #[arg(long)]
    description: Option<String>,

    /// Category (Home Decor, Jewelry, Textiles, ...)
    #[arg(long)]
    category: Option<String>,

    /// Lowest price, in rupees
    #[arg(long, value_name = "AMOUNT")]
    min_price: Option<String>,

    /// Highest price, in rupees
    #[arg(long, value_name = "AMOUNT")]
    max_price: Option<String>,

    /// Dimensions as LENGTHxWIDTHxHEIGHT
    #[arg(long, value_name = "LxWxH")]
    size: Option<String>,

    /// Unit of the dimensions (cm or inches)
    #[arg(long)]
    unit: Option<String>,

    /// Occasion the gift suits (repeatable; replaces the current list)
    #[arg(long = "occasion", value_name = "OCCASION")]
    occasions: Vec<String>,

    /// Comma-separated tags
    #[arg(long)]
    tags: Option<String>,

    /// Image URL
    #[arg(long, value_name = "URL")]
    image_url: Option<String>,

    /// Image file to embed as a data URI
    #[arg(long, value_name = "FILE", conflicts_with = "image_url")]
    image: Option<PathBuf>,
}

impl GiftFields {
    fn apply(self, form: &mut GiftForm, max_image_bytes: u64) -> anyhow::Result<()> {
        let set = |field: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *field = value;
            }
        };

        set(&mut form.name, self.name);
        set(&mut form.description, self.description);
        set(&mut form.category, self.category);
        set(&mut form.price_range_min, self.min_price);
        set(&mut form.price_range_max, self.max_price);
        set(&mut form.unit, self.unit);
        set(&mut form.tags, self.tags);
        set(&mut form.image_url, self.image_url);

        if let Some(size) = self.size {
            let mut parts = size.split(['x', 'X', '×']).map(str::trim);
            form.length = parts.next().unwrap_or_default().to_string();
            form.width = parts.next().unwrap_or_default().to_string();
            form.height = parts.next().unwrap_or_default().to_string();
        }
        if !self.occasions.is_empty() {
            form.occasions = self.occasions;
        }
        if let Some(path) = self.image {
            form.image_url = ImageFile::read(&path, max_image_bytes)?.to_data_uri();
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    #[command(flatten)]
    fields: GiftFields,

    /// Hide the gift from the public catalog
    #[arg(long)]
    inactive: bool,
}

impl Add {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        workspace.require_admin()?;

        let mut form = GiftForm::default();
        self.fields
            .apply(&mut form, workspace.config().upload.max_bytes)?;
        form.is_active = !self.inactive;
        let draft = GiftDraft::try_from(form)?;

        let mut catalog = workspace.catalog()?;
        let record = catalog.create(draft)?;

        println!(
            "{}",
            format!("✅ Added {} ({})", record.name, record.id).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Edit {
    /// Identifier of the gift to edit
    #[arg(value_parser = parse_gift_id)]
    id: GiftId,

    #[command(flatten)]
    fields: GiftFields,

    /// Show the gift in the public catalog
    #[arg(long, conflicts_with = "inactive")]
    active: bool,

    /// Hide the gift from the public catalog
    #[arg(long)]
    inactive: bool,
}

impl Edit {
    #[instrument(skip(self), fields(id = %self.id))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        workspace.require_admin()?;

        let mut catalog = workspace.catalog()?;
        let Some(existing) = catalog.get(&self.id) else {
            anyhow::bail!("No gift with id {}", self.id);
        };

        let mut form = GiftForm::from(existing);
        self.fields
            .apply(&mut form, workspace.config().upload.max_bytes)?;
        if self.active {
            form.is_active = true;
        } else if self.inactive {
            form.is_active = false;
        }
        let draft = GiftDraft::try_from(form)?;

        let record = catalog.update(&self.id, draft)?;
        println!("{}", format!("✅ Updated {}", record.name).success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Remove {
    /// Identifier of the gift to remove
    #[arg(value_parser = parse_gift_id)]
    id: GiftId,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Remove {
    #[instrument(skip(self), fields(id = %self.id))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        workspace.require_admin()?;

        let mut catalog = workspace.catalog()?;
        let Some(existing) = catalog.get(&self.id) else {
            println!("{}", format!("No gift with id {}", self.id).warning());
            return Ok(());
        };

        if !self.yes {
            let confirmed = dialoguer::Confirm::new()
                .with_prompt(format!("Remove '{}' from the catalog?", existing.name))
                .default(false)
                .interact()?;
            if !confirmed {
                println!("Cancelled");
                return Ok(());
            }
        }

        if let Some(removed) = catalog.delete(&self.id)? {
            println!("{}", format!("✅ Removed {}", removed.name).success());
        }
        Ok(())
    }
}
