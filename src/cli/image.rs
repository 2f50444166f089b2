use std::path::PathBuf;

use giftdesk::{
    CatalogRepository, DriveClient, GiftDraft, GiftForm, GiftId, ImageFile, ImageStore,
    media::{EndpointUploader, oauth::LoopbackConsent},
};
use tracing::instrument;

use super::{
    Workspace, parse_gift_id,
    terminal::{Colorize, spinner},
};

#[derive(Debug, clap::Subcommand)]
pub enum Image {
    /// Print an image as a data URI
    Preview(Preview),

    /// Upload an image and print its public URL
    Upload(Upload),

    /// List images in the storage folder, newest first
    List,

    /// Delete an image from the storage folder
    Delete(Delete),

    /// Forget the storage sign-in
    SignOut,
}

impl Image {
    pub async fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        match self {
            Self::Preview(command) => command.run(&workspace),
            Self::Upload(command) => command.run(&workspace).await,
            Self::List => list(&workspace).await,
            Self::Delete(command) => command.run(&workspace).await,
            Self::SignOut => {
                drive_client(&workspace).sign_out().await;
                println!("{}", "Signed out of image storage".dim());
                Ok(())
            }
        }
    }
}

fn drive_client(workspace: &Workspace) -> DriveClient {
    let config = workspace.config();
    DriveClient::new(
        config.drive.clone(),
        config.upload.max_bytes,
        LoopbackConsent::default(),
    )
    .with_token_cache(workspace.token_cache())
}

/// A drive client that is already signed in, so consent output is not
/// tangled up with a spinner.
async fn signed_in_drive(workspace: &Workspace) -> anyhow::Result<DriveClient> {
    let mut drive = drive_client(workspace);
    drive.sign_in().await?;
    Ok(drive)
}

#[derive(Debug, clap::Parser)]
pub struct Preview {
    /// The image file
    file: PathBuf,
}

impl Preview {
    fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let file = ImageFile::read(&self.file, workspace.config().upload.max_bytes)?;
        println!("{}", file.to_data_uri());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Upload {
    /// The image file
    file: PathBuf,

    /// Store the uploaded URL on this gift
    #[arg(long, value_parser = parse_gift_id)]
    gift: Option<GiftId>,

    /// Post to the configured upload endpoint instead of cloud storage
    #[arg(long)]
    endpoint: bool,
}

impl Upload {
    #[instrument(skip_all, fields(file = %self.file.display()))]
    async fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        workspace.require_admin()?;
        let config = workspace.config();

        // refuse oversized files before signing in
        let file = ImageFile::read(&self.file, config.upload.max_bytes)?;

        let url = if self.endpoint {
            let Some(endpoint) = &config.upload.endpoint else {
                anyhow::bail!("No upload endpoint configured; set `endpoint` under [upload]");
            };
            let progress = spinner(format!("Uploading {}", file.name));
            let result = EndpointUploader::new(endpoint.clone(), config.upload.max_bytes)
                .upload(&file)
                .await;
            progress.finish_and_clear();
            result?
        } else {
            let mut drive = signed_in_drive(workspace).await?;
            let progress = spinner(format!("Uploading {}", file.name));
            let result = drive.upload_image(&file).await;
            progress.finish_and_clear();
            result?
        };

        if let Some(id) = self.gift {
            let mut catalog = workspace.catalog()?;
            let Some(existing) = catalog.get(&id) else {
                anyhow::bail!("Uploaded to {url}, but there is no gift with id {id}");
            };
            let mut form = GiftForm::from(existing);
            form.image_url.clone_from(&url);
            let record = catalog.update(&id, GiftDraft::try_from(form)?)?;
            println!(
                "{}",
                format!("✅ Image attached to {}", record.name).success()
            );
        }

        println!("{url}");
        Ok(())
    }
}

async fn list(workspace: &Workspace) -> anyhow::Result<()> {
    workspace.require_admin()?;
    let mut drive = signed_in_drive(workspace).await?;

    let progress = spinner("Fetching images");
    let images = drive.list_images().await;
    progress.finish_and_clear();
    let images = images?;

    if images.is_empty() {
        println!("{}", "No images uploaded yet.".dim());
    }
    for image in images {
        println!("{}  {}", image.id.dim(), image.name);
        if let Some(link) = image.web_view_link {
            println!("  {}", link.info());
        }
    }
    Ok(())
}

#[derive(Debug, clap::Parser)]
pub struct Delete {
    /// Storage identifier of the image
    id: String,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument(skip_all, fields(id = %self.id))]
    async fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        workspace.require_admin()?;

        if !self.yes {
            let confirmed = dialoguer::Confirm::new()
                .with_prompt(format!("Delete image {}?", self.id))
                .default(false)
                .interact()?;
            if !confirmed {
                println!("Cancelled");
                return Ok(());
            }
        }

        let mut drive = signed_in_drive(workspace).await?;
        drive.delete_image(&self.id).await?;
        println!("{}", format!("✅ Deleted image {}", self.id).success());
        Ok(())
    }
}
