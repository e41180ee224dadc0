//! Form input and validation.
//!
//! Each `validate` collects every violated rule and returns them together in
//! `LfError::Validation`.

use chrono::NaiveDate;
use std::path::Path;

use lf_core::config::StorageConfig;
use lf_core::error::{LfError, LfResult};

use super::account::Role;
use super::report::{NewReport, ReportKind};

fn min_len(errors: &mut Vec<String>, value: &str, min: usize, message: &str) {
    if value.trim().chars().count() < min {
        errors.push(message.to_string());
    }
}

fn finish(errors: Vec<String>) -> LfResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(LfError::Validation(errors))
    }
}

/// An image attached to a report.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk, guessing the content type from the extension.
    pub fn from_path(path: &Path) -> LfResult<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let content_type = content_type_for(&file_name).to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// File extension, defaulting to the name itself when there is no dot.
    pub fn extension(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or(&self.file_name)
    }

    /// Check type and size, returning one message per problem.
    pub fn problems(&self, max_bytes: u64) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.content_type.starts_with("image/") {
            errors.push(format!("{} is not an image file.", self.file_name));
        }
        if self.bytes.len() as u64 > max_bytes {
            errors.push(format!(
                "{} exceeds the {}MB size limit.",
                self.file_name,
                max_bytes / (1024 * 1024)
            ));
        }
        errors
    }
}

/// Content type guessed from a file name's extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Report submission form.
#[derive(Debug, Clone)]
pub struct ReportForm {
    pub kind: ReportKind,
    pub title: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub date: Option<NaiveDate>,
    pub images: Vec<ImageUpload>,
}

impl ReportForm {
    pub fn validate(&self, storage: &StorageConfig) -> LfResult<()> {
        let mut errors = Vec::new();
        min_len(&mut errors, &self.title, 3, "Title must be at least 3 characters.");
        if self.category.trim().is_empty() {
            errors.push("Please select a category.".to_string());
        }
        min_len(
            &mut errors,
            &self.description,
            10,
            "Description must be at least 10 characters.",
        );
        min_len(&mut errors, &self.location, 3, "Location must be at least 3 characters.");
        if self.date.is_none() {
            errors.push("Please select a date.".to_string());
        }
        if self.images.len() > storage.max_images {
            errors.push(format!(
                "You can attach at most {} images.",
                storage.max_images
            ));
        }
        for image in &self.images {
            errors.extend(image.problems(storage.max_image_bytes));
        }
        finish(errors)
    }

    /// Insert payload for a validated form.
    pub fn to_new_report(&self, user_id: &str, image_url: Option<String>) -> LfResult<NewReport> {
        let date = self
            .date
            .ok_or_else(|| LfError::Validation(vec!["Please select a date.".to_string()]))?;
        Ok(NewReport {
            kind: self.kind,
            user_id: user_id.to_string(),
            name: self.title.trim().to_string(),
            category: self.category.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            date,
            image_url,
        })
    }
}

/// Admin form for creating a user or security account.
#[derive(Debug, Clone)]
pub struct AccountForm {
    pub role: Role,
    pub name: String,
    /// NIM/NIP for users, badge number for security staff.
    pub identifier: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl AccountForm {
    pub fn validate(&self) -> LfResult<()> {
        let mut errors = Vec::new();
        if self.role == Role::Admin {
            errors.push("Please select a role.".to_string());
        }
        min_len(&mut errors, &self.name, 2, "Name must be at least 2 characters.");
        min_len(&mut errors, &self.identifier, 2, "NIM/NIP must be at least 2 characters.");
        min_len(&mut errors, &self.username, 3, "Username must be at least 3 characters.");
        if self.password.chars().count() < 6 {
            errors.push("Password must be at least 6 characters.".to_string());
        }
        if self.password != self.confirm_password {
            errors.push("Passwords do not match".to_string());
        }
        finish(errors)
    }
}

/// Admin form for editing an existing account.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: String,
    pub username: String,
    /// Ignored for admins.
    pub identifier: Option<String>,
    /// Only written when supplied.
    pub password: Option<String>,
}

impl AccountUpdate {
    pub fn validate(&self, role: Role) -> LfResult<()> {
        let mut errors = Vec::new();
        min_len(&mut errors, &self.name, 2, "Name must be at least 2 characters.");
        min_len(&mut errors, &self.username, 3, "Username must be at least 3 characters.");
        if role.identifier_column().is_some() {
            let identifier = self.identifier.as_deref().unwrap_or_default();
            min_len(
                &mut errors,
                identifier,
                2,
                "NIM/NIP/KTA must be at least 2 characters.",
            );
        }
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            if password.chars().count() < 6 {
                errors.push("Password must be at least 6 characters.".to_string());
            }
        }
        finish(errors)
    }

    /// PATCH body for the role's table.
    pub fn to_patch_json(&self, role: Role) -> serde_json::Value {
        let mut body = serde_json::json!({
            "name": self.name.trim(),
            "username": self.username.trim(),
        });
        if let (Some(col), Some(identifier)) = (role.identifier_column(), &self.identifier) {
            body[col] = serde_json::json!(identifier.trim());
        }
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            body["password"] = serde_json::json!(password);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ReportForm {
        ReportForm {
            kind: ReportKind::Lost,
            title: "Wallet".into(),
            category: "accessories".into(),
            description: "Brown leather wallet".into(),
            location: "Gym".into(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1),
            images: Vec::new(),
        }
    }

    fn image(name: &str, ct: &str, len: usize) -> ImageUpload {
        ImageUpload {
            file_name: name.into(),
            content_type: ct.into(),
            bytes: vec![0; len],
        }
    }

    fn messages(result: LfResult<()>) -> Vec<String> {
        match result {
            Err(LfError::Validation(m)) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_report_form() {
        assert!(form().validate(&StorageConfig::default()).is_ok());
    }

    #[test]
    fn test_report_form_collects_all_errors() {
        let bad = ReportForm {
            title: "ab".into(),
            category: " ".into(),
            description: "short".into(),
            location: "x".into(),
            date: None,
            ..form()
        };
        let errors = messages(bad.validate(&StorageConfig::default()));
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0], "Title must be at least 3 characters.");
    }

    #[test]
    fn test_image_rules() {
        let storage = StorageConfig::default();
        let mut f = form();
        f.images = vec![
            image("a.png", "image/png", 10),
            image("b.pdf", "application/pdf", 10),
            image("c.jpg", "image/jpeg", 6 * 1024 * 1024),
            image("d.png", "image/png", 10),
        ];
        let errors = messages(f.validate(&storage));
        assert!(errors.contains(&"You can attach at most 3 images.".to_string()));
        assert!(errors.contains(&"b.pdf is not an image file.".to_string()));
        assert!(errors.contains(&"c.jpg exceeds the 5MB size limit.".to_string()));
    }

    #[test]
    fn test_extension_and_content_type() {
        assert_eq!(image("photo.final.JPG", "image/jpeg", 1).extension(), "JPG");
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("notes"), "application/octet-stream");
    }

    #[test]
    fn test_account_form_rules() {
        let mut f = AccountForm {
            role: Role::User,
            name: "Ana".into(),
            identifier: "2201".into(),
            username: "ana".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        };
        assert!(f.validate().is_ok());

        f.confirm_password = "secret2".into();
        f.role = Role::Admin;
        let errors = messages(f.validate());
        assert_eq!(errors, vec!["Please select a role.", "Passwords do not match"]);
    }

    #[test]
    fn test_account_update_patch() {
        let update = AccountUpdate {
            name: "Budi".into(),
            username: "budi".into(),
            identifier: Some("SEC-9".into()),
            password: Some(String::new()),
        };
        assert!(update.validate(Role::Security).is_ok());
        let body = update.to_patch_json(Role::Security);
        assert_eq!(body["badge_number"], "SEC-9");
        assert!(body.get("password").is_none());

        let admin_body = update.to_patch_json(Role::Admin);
        assert!(admin_body.get("badge_number").is_none());
    }

    #[test]
    fn test_account_update_requires_identifier_for_users() {
        let update = AccountUpdate {
            name: "Ana".into(),
            username: "ana".into(),
            identifier: None,
            password: Some("123".into()),
        };
        let errors = messages(update.validate(Role::User));
        assert_eq!(errors.len(), 2);
        assert!(update.validate(Role::Admin).is_err());
    }
}
