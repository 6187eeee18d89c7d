use crate::error::{AppError, AppResult};
use crate::models::UpiId;
use crate::repositories::{UpiRepository, UserRepository};
use crate::validation;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use qrcode::render::svg;
use qrcode::QrCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const MAX_DISPLAY_NAME: usize = 100;
const MAX_NOTE: usize = 80;

#[derive(Debug, Deserialize)]
pub struct CreateUpiRequest {
    pub upi_id: String,
    pub display_name: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUpiRequest {
    pub upi_id: Option<String>,
    pub display_name: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QrQuery {
    pub amount: Option<Decimal>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpiQr {
    pub upi_link: String,
    /// `data:image/svg+xml;base64,...`
    pub qr_code: String,
}

/// Build a `upi://pay` deep link
pub fn upi_link(payee: &str, name: &str, amount: Option<Decimal>, note: Option<&str>) -> String {
    let mut link = format!(
        "upi://pay?pa={}&pn={}",
        urlencoding::encode(payee),
        urlencoding::encode(name)
    );
    if let Some(amount) = amount {
        link.push_str(&format!("&am={:.2}", amount));
    }
    link.push_str("&cu=INR");
    if let Some(note) = note {
        link.push_str(&format!("&tn={}", urlencoding::encode(note)));
    }
    link
}

/// Render `content` as an SVG QR code wrapped in a data URL
pub fn qr_data_url(content: &str) -> AppResult<String> {
    let code = QrCode::new(content.as_bytes())
        .map_err(|e| AppError::Message(format!("Failed to encode QR code: {e}")))?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .quiet_zone(true)
        .build();

    Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(image)))
}

fn duplicate_upi(e: crate::error::RepositoryError) -> AppError {
    match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("This UPI ID is already saved".to_string()),
        other => other,
    }
}

/// Saved UPI handles; exactly one of a user's handles is the default
pub struct UpiService {
    upi_repo: Arc<UpiRepository>,
    user_repo: Arc<UserRepository>,
}

impl UpiService {
    pub fn new(upi_repo: Arc<UpiRepository>, user_repo: Arc<UserRepository>) -> Self {
        Self { upi_repo, user_repo }
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<UpiId>> {
        Ok(self.upi_repo.find_by_user(user_id).await?)
    }

    async fn owned(&self, id: Uuid, user_id: Uuid) -> AppResult<UpiId> {
        self.upi_repo
            .find(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("UPI ID not found".to_string()))
    }

    pub async fn create(&self, user_id: Uuid, req: &CreateUpiRequest) -> AppResult<UpiId> {
        let upi_id = validation::upi_id(&req.upi_id)?;
        let display_name =
            validation::optional_text(req.display_name.as_deref(), MAX_DISPLAY_NAME, "Display name")?;

        let first = self.upi_repo.count_by_user(user_id).await? == 0;
        let make_default = first || req.is_default.unwrap_or(false);

        let created = self
            .upi_repo
            .create(user_id, &upi_id, display_name.as_deref(), first)
            .await
            .map_err(duplicate_upi)?;

        let created = if make_default && !first {
            self.upi_repo.set_default(created.id, user_id).await?;
            self.owned(created.id, user_id).await?
        } else {
            created
        };

        info!("Saved UPI ID {} for {}", created.id, user_id);
        Ok(created)
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, req: &UpdateUpiRequest) -> AppResult<UpiId> {
        let current = self.owned(id, user_id).await?;
        let upi_id = req.upi_id.as_deref().map(validation::upi_id).transpose()?;
        let display_name =
            validation::optional_text(req.display_name.as_deref(), MAX_DISPLAY_NAME, "Display name")?;

        self.upi_repo
            .update(id, user_id, upi_id.as_deref(), display_name.as_deref())
            .await
            .map_err(duplicate_upi)?;

        if req.is_default == Some(true) && !current.is_default {
            self.upi_repo.set_default(id, user_id).await?;
        }

        self.owned(id, user_id).await
    }

    /// Delete a handle; if it was the default the oldest remaining one takes over
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let current = self.owned(id, user_id).await?;
        self.upi_repo.delete(id, user_id).await?;

        if current.is_default {
            if let Some(next) = self.upi_repo.find_oldest(user_id).await? {
                self.upi_repo.set_default(next.id, user_id).await?;
                info!("UPI ID {} is now default for {}", next.id, user_id);
            }
        }

        info!("Deleted UPI ID {} for {}", id, user_id);
        Ok(())
    }

    /// Payment link and QR code for one of the caller's handles
    pub async fn qr(&self, user_id: Uuid, id: Uuid, query: &QrQuery) -> AppResult<UpiQr> {
        let upi = self.owned(id, user_id).await?;
        let amount = query.amount.map(validation::amount).transpose()?;
        let note = validation::optional_text(query.note.as_deref(), MAX_NOTE, "Note")?;

        let name = match upi.display_name.clone() {
            Some(name) => name,
            None => self
                .user_repo
                .find_by_id(user_id)
                .await?
                .map(|u| u.display_name())
                .unwrap_or_else(|| upi.upi_id.clone()),
        };

        let link = upi_link(&upi.upi_id, &name, amount, note.as_deref());
        let qr_code = qr_data_url(&link)?;
        Ok(UpiQr {
            upi_link: link,
            qr_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_upi_link_encodes_fields() {
        let link = upi_link(
            "asha.rao@okaxis",
            "Asha Rao",
            Some(Decimal::from_str("250.5").unwrap()),
            Some("Dinner & drinks"),
        );
        assert_eq!(
            link,
            "upi://pay?pa=asha.rao%40okaxis&pn=Asha%20Rao&am=250.50&cu=INR&tn=Dinner%20%26%20drinks"
        );
    }

    #[test]
    fn test_upi_link_without_amount() {
        let link = upi_link("asha@ybl", "Asha", None, None);
        assert_eq!(link, "upi://pay?pa=asha%40ybl&pn=Asha&cu=INR");
    }

    #[test]
    fn test_qr_data_url_is_svg() {
        let url = qr_data_url("upi://pay?pa=asha%40ybl&pn=Asha&cu=INR").unwrap();
        let encoded = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(svg.contains("<svg"));
    }
}
