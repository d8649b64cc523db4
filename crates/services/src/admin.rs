//! Admin CRUD for catalog entries.
//!
//! The role check here only decides whether the portal offers the forms;
//! the remote API authorizes every call on its own.

use std::sync::Arc;

use domains::{find_category, AdminCatalogApi, AppDraft, AppItem, Attachment, DomainError, Session};
use secrecy::SecretString;
use tracing::info;

pub struct AdminService {
    api: Arc<dyn AdminCatalogApi>,
}

impl AdminService {
    pub fn new(api: Arc<dyn AdminCatalogApi>) -> Self {
        Self { api }
    }

    pub async fn create(
        &self,
        session: &Session,
        draft: AppDraft,
        attachments: Vec<Attachment>,
    ) -> Result<AppItem, DomainError> {
        let token = admin_token(session)?;
        let draft = validate_draft(draft)?;
        for attachment in &attachments {
            validate_attachment(attachment)?;
        }

        let created = self.api.create_app(token, &draft, attachments).await?;
        info!(app_id = %created.id, category = %draft.category, "catalog entry created");
        Ok(created)
    }

    pub async fn edit(
        &self,
        session: &Session,
        id: &str,
        draft: AppDraft,
    ) -> Result<AppItem, DomainError> {
        let token = admin_token(session)?;
        let draft = validate_draft(draft)?;

        let updated = self.api.edit_app(token, id, &draft).await?;
        info!(app_id = %updated.id, "catalog entry updated");
        Ok(updated)
    }

    pub async fn get(&self, session: &Session, id: &str) -> Result<AppItem, DomainError> {
        let token = admin_token(session)?;
        self.api.get_app(token, id).await
    }
}

/// The caller's token, if the session is an admin one.
pub fn admin_token(session: &Session) -> Result<&SecretString, DomainError> {
    match session.token() {
        Some(token) if session.is_admin() => Ok(token),
        _ => Err(DomainError::Unauthorized("admin access required".into())),
    }
}

/// Normalises and checks a draft before it is sent.
pub fn validate_draft(mut draft: AppDraft) -> Result<AppDraft, DomainError> {
    draft.title = draft.title.trim().to_string();
    if draft.title.is_empty() {
        return Err(DomainError::Validation("title is required".into()));
    }

    let category = find_category(&draft.category)
        .ok_or_else(|| DomainError::Validation(format!("unknown category '{}'", draft.category)))?;
    draft.category = category.slug.to_string();

    if draft.is_paid && !draft.price.is_some_and(|p| p > 0.0) {
        return Err(DomainError::Validation("paid entries need a positive price".into()));
    }
    if !draft.is_paid {
        draft.price = None;
    }

    draft.tags = draft
        .tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    Ok(draft)
}

fn validate_attachment(attachment: &Attachment) -> Result<(), DomainError> {
    if attachment.data.is_empty() {
        return Err(DomainError::Validation(format!(
            "file '{}' is empty",
            attachment.file_name
        )));
    }
    if attachment.field == "thumbnail" && attachment.content_type.type_() != mime::IMAGE {
        return Err(DomainError::Validation("thumbnail must be an image".into()));
    }
    Ok(())
}
