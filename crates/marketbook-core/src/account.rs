//! Seller account workflows: registration and profile updates.
//!
//! Both flows validate the form first, upload the avatar photo when one is
//! given, then call the API. Registration ends with a regular sign-in.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};

use crate::api::UploadFile;
use crate::auth::SessionManager;
use crate::models::{NewSeller, Seller, SellerUpdate};
use crate::validation::{ProfileForm, SignUpForm};

pub const SIGN_UP_FALLBACK: &str = "Unable to register. Please try again later.";
pub const UPDATE_PROFILE_FALLBACK: &str = "Unable to update profile!";

/// Largest accepted avatar image
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

pub const PHOTO_TOO_LARGE: &str = "This image is too large. Please choose one up to 5MB.";

/// A local image chosen as the seller's avatar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarPhoto {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AvatarPhoto {
    /// Read an image from disk, rejecting files over `MAX_PHOTO_BYTES`
    pub fn from_path(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .len();
        if size > MAX_PHOTO_BYTES {
            bail!(PHOTO_TOO_LARGE);
        }

        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_bytes(path, bytes))
    }

    fn from_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "jpg".to_string());

        Self {
            file_name: format!("user-photo.{}", extension),
            mime_type: mime_for_extension(&extension).to_string(),
            bytes,
        }
    }

    fn to_upload(&self) -> UploadFile {
        UploadFile {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}

/// Upload the photo and return the id of the stored attachment
async fn upload_avatar(session: &SessionManager, photo: &AvatarPhoto) -> Result<String> {
    let attachments = session
        .api()
        .upload_attachments(vec![photo.to_upload()])
        .await
        .context("Failed to upload avatar")?;

    let id = attachments
        .into_iter()
        .next()
        .map(|a| a.id)
        .ok_or_else(|| anyhow!("Upload response did not include an attachment"))?;
    debug!(attachment_id = %id, "Avatar uploaded");
    Ok(id)
}

/// Register a new seller and sign them in
pub async fn sign_up(
    session: &SessionManager,
    form: &SignUpForm,
    photo: Option<&AvatarPhoto>,
) -> Result<Seller> {
    form.validate()?;

    let avatar_id = match photo {
        Some(photo) => Some(upload_avatar(session, photo).await?),
        None => None,
    };

    let body = NewSeller {
        name: form.name.trim().to_string(),
        phone: form.phone.clone(),
        email: form.email.trim().to_string(),
        password: form.password.clone(),
        password_confirmation: form.password_confirmation.clone(),
        avatar_id,
    };

    let created = session
        .api()
        .create_seller(&body)
        .await
        .context("Failed to register seller")?;
    info!(seller_id = %created.id, "Seller registered");

    session.sign_in(&body.email, &body.password).await
}

/// Save profile changes and refresh the signed-in seller
pub async fn update_profile(
    session: &SessionManager,
    form: &ProfileForm,
    photo: Option<&AvatarPhoto>,
) -> Result<Seller> {
    form.validate()?;

    let avatar_id = match photo {
        Some(photo) => Some(upload_avatar(session, photo).await?),
        None => None,
    };

    let (password, new_password) = match form.password_change() {
        Some((current, new)) => (Some(current), Some(new)),
        None => (None, None),
    };

    let body = SellerUpdate {
        name: form.name.trim().to_string(),
        phone: form.phone.clone(),
        email: form.email.trim().to_string(),
        password,
        new_password,
        avatar_id,
    };

    let seller = session
        .api()
        .update_current_seller(&body)
        .await
        .context("Failed to update profile")?;

    session.update_seller_logged(seller.clone()).await?;
    info!(seller_id = %seller.id, "Profile updated");
    Ok(seller)
}
