use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{DeliveryEdit, DeliveryFile},
    traits::MarketplaceError,
};

pub const MIN_FEEDBACK_CHARS: usize = 10;

/// A file that has already been uploaded to external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
}

impl FileUpload {
    fn validate(&self) -> Result<(), MarketplaceError> {
        if self.filename.trim().is_empty() {
            return Err(MarketplaceError::InvalidRequest("Every file needs a name".into()));
        }
        if self.url.trim().is_empty() {
            return Err(MarketplaceError::InvalidRequest(format!("{} has no storage URL", self.filename)));
        }
        if self.size < 0 {
            return Err(MarketplaceError::InvalidRequest(format!("{} has a negative size", self.filename)));
        }
        Ok(())
    }

    /// Assigns a fresh id. File ids are only unique within a delivery, but random ones make them hard to guess.
    pub fn into_delivery_file(self) -> DeliveryFile {
        DeliveryFile { id: new_file_id(), filename: self.filename, mime_type: self.mime_type, size: self.size, url: self.url }
    }
}

fn new_file_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeliveryRequest {
    pub order_id: i64,
    pub description: Option<String>,
    pub files: Vec<FileUpload>,
}

impl NewDeliveryRequest {
    pub fn validate(&self) -> Result<(), MarketplaceError> {
        if self.files.is_empty() {
            return Err(MarketplaceError::InvalidRequest("A delivery needs at least one file".into()));
        }
        self.files.iter().try_for_each(FileUpload::validate)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeliveryRequest {
    pub description: Option<String>,
    #[serde(default)]
    pub add_files: Vec<FileUpload>,
    #[serde(default)]
    pub remove_file_ids: Vec<String>,
}

impl UpdateDeliveryRequest {
    pub fn into_edit(self) -> Result<DeliveryEdit, MarketplaceError> {
        self.add_files.iter().try_for_each(FileUpload::validate)?;
        let edit = DeliveryEdit {
            description: self.description,
            add_files: self.add_files.into_iter().map(FileUpload::into_delivery_file).collect(),
            remove_file_ids: self.remove_file_ids,
        };
        if edit.is_empty() {
            return Err(MarketplaceError::InvalidRequest("Nothing to update".into()));
        }
        Ok(edit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRequest {
    pub feedback: String,
}

impl RevisionRequest {
    /// Returns the trimmed feedback, if it is long enough to be useful to the seller.
    pub fn feedback(&self) -> Result<&str, MarketplaceError> {
        let feedback = self.feedback.trim();
        if feedback.chars().count() < MIN_FEEDBACK_CHARS {
            return Err(MarketplaceError::InvalidRequest(format!(
                "Feedback must be at least {MIN_FEEDBACK_CHARS} characters long"
            )));
        }
        Ok(feedback)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn upload(name: &str) -> FileUpload {
        FileUpload {
            filename: name.into(),
            mime_type: "audio/mpeg".into(),
            size: 2048,
            url: format!("https://files.example.com/{name}"),
        }
    }

    #[test]
    fn deliveries_need_files() {
        let req = NewDeliveryRequest { order_id: 1, description: None, files: vec![] };
        assert!(req.validate().is_err());
        let req = NewDeliveryRequest { order_id: 1, description: None, files: vec![upload("mix.mp3")] };
        assert!(req.validate().is_ok());
        let req = NewDeliveryRequest { order_id: 1, description: None, files: vec![upload(" ")] };
        assert!(req.validate().is_err());
    }

    #[test]
    fn file_ids_are_assigned() {
        let a = upload("a.mp3").into_delivery_file();
        let b = upload("a.mp3").into_delivery_file();
        assert_eq!(a.id.len(), 16);
        assert!(hex::decode(&a.id).is_ok());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn feedback_is_trimmed_before_measuring() {
        let req = RevisionRequest { feedback: "   too short   ".into() };
        assert!(req.feedback().is_err());
        let req = RevisionRequest { feedback: "   ten chars!   ".into() };
        assert!(req.feedback().is_ok());
        let req = RevisionRequest { feedback: "    short    ".into() };
        assert!(req.feedback().is_err());
        let req = RevisionRequest { feedback: "  Please raise the vocals  ".into() };
        assert_eq!(req.feedback().unwrap(), "Please raise the vocals");
    }

    #[test]
    fn empty_updates_are_rejected() {
        assert!(UpdateDeliveryRequest::default().into_edit().is_err());
        let req = UpdateDeliveryRequest { remove_file_ids: vec!["abc".into()], ..Default::default() };
        assert_eq!(req.into_edit().unwrap().remove_file_ids, vec!["abc".to_string()]);
    }
}
