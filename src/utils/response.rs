use log::warn;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use serde::{Deserialize, Serialize};

use crate::services::GatewayError;
use crate::views::ViewError;

pub const TRY_AGAIN: &str = "Please try again later.";

/// Transient notification shown once on the next rendered page.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Toast {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub destructive: bool,
}

impl Toast {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Toast {
            title: title.into(),
            description: Some(description.into()),
            destructive: false,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Toast {
            title: title.into(),
            description: Some(description.into()),
            destructive: true,
        }
    }

    /// Every backend failure reads the same to the user.
    pub fn try_again(title: impl Into<String>) -> Self {
        Toast::error(title, TRY_AGAIN)
    }

    /// Map a failed view action to what the user is told.
    pub fn for_view_error(title: &str, err: &ViewError) -> Self {
        match err {
            ViewError::Gateway(e) => {
                warn!("{}: {}", title, e);
                Toast::try_again(title)
            }
            ViewError::ActionUnavailable => Toast::error(
                title,
                "This action is not available for the current status.",
            ),
            ViewError::NotFound(what) => Toast::error(title, format!("{} not found.", what)),
            ViewError::Invalid(message) => Toast::error(title, message.clone()),
        }
    }

    pub fn for_gateway_error(title: &str, err: &GatewayError) -> Self {
        warn!("{}: {}", title, err);
        Toast::try_again(title)
    }

    fn kind(&self) -> &'static str {
        if self.destructive { "error" } else { "success" }
    }

    /// Post/Redirect/Get with this toast carried in the flash cookie.
    pub fn redirect(self, to: impl Into<String>) -> Flash<Redirect> {
        let kind = self.kind();
        let message = serde_json::to_string(&self).unwrap_or_else(|_| self.title.clone());
        Flash::new(Redirect::to(to.into()), kind, message)
    }

    pub fn from_flash(flash: Option<FlashMessage<'_>>) -> Option<Toast> {
        let flash = flash?;
        match serde_json::from_str::<Toast>(flash.message()) {
            Ok(toast) => Some(toast),
            Err(_) => Some(Toast {
                title: flash.message().to_string(),
                description: None,
                destructive: flash.kind() == "error",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_failures_collapse_to_one_message() {
        let toast = Toast::for_view_error(
            "Error assigning worker",
            &ViewError::Gateway(GatewayError::Status(500)),
        );
        assert_eq!(toast.title, "Error assigning worker");
        assert_eq!(toast.description.as_deref(), Some(TRY_AGAIN));
        assert!(toast.destructive);

        let toast = Toast::for_gateway_error("Error loading data", &GatewayError::Unavailable);
        assert_eq!(toast.description.as_deref(), Some(TRY_AGAIN));
    }

    #[test]
    fn validation_messages_pass_through() {
        let toast = Toast::for_view_error(
            "Invalid amount",
            &ViewError::Invalid("Please enter a positive number of credits.".to_string()),
        );
        assert_eq!(
            toast.description.as_deref(),
            Some("Please enter a positive number of credits.")
        );
    }

    #[test]
    fn serialized_form_skips_missing_description() {
        let toast = Toast {
            title: "Welcome back!".to_string(),
            description: None,
            destructive: false,
        };
        let json = serde_json::to_string(&toast).unwrap();
        assert_eq!(json, r#"{"title":"Welcome back!","destructive":false}"#);
        assert_eq!(serde_json::from_str::<Toast>(&json).unwrap(), toast);
    }
}
