use serde_json::Value;

use crate::{
    controller::controller::AutoFillController,
    mapping::profile::UserProfile,
    messaging::protocol::{Request, Response},
};

pub const NOT_INITIALIZED: &str = "autoFiller not initialized";

/// Answers runtime messages against a controller's page and filler.
///
/// Every path yields a `Response`; nothing is left unanswered.
pub struct MessageHandler;

impl MessageHandler {
    /// Decode a raw message first. Unknown actions are answered with an error.
    pub fn handle_value(controller: &mut AutoFillController, raw: Value) -> Response {
        let action = raw
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("<missing>")
            .to_string();
        match serde_json::from_value::<Request>(raw) {
            Ok(request) => Self::handle(controller, request),
            Err(e) => {
                controller
                    .logger()
                    .warn(&format!("Rejected message '{}': {}", action, e));
                Response::error(format!("Unknown or malformed action: {}", action))
            }
        }
    }

    pub fn handle(controller: &mut AutoFillController, request: Request) -> Response {
        let logger = controller.logger();
        let (filler, document) = controller.filler_and_document();
        let Some(filler) = filler else {
            logger.error(&format!("{} for {:?}", NOT_INITIALIZED, request));
            return Response::error(NOT_INITIALIZED);
        };

        match request {
            Request::FillForm { user_data } => {
                match user_data {
                    Some(data) => match UserProfile::from_json(&data) {
                        Ok(profile) => {
                            logger.info("Profile data received with fill request");
                            filler.update_user_profile(profile);
                        }
                        Err(e) => {
                            logger.error(&format!("Error filling form: {}", e));
                            return Response::failure(format!(
                                "Error occurred while filling form: {}",
                                e
                            ));
                        }
                    },
                    None => logger.warn("No userData provided in message"),
                }

                let outcome = filler.fill_form(document);
                Response {
                    success: outcome.success,
                    results: Some(outcome),
                    ..Response::default()
                }
            }

            Request::GetUserProfile => Response {
                profile: Some(filler.get_user_profile().clone()),
                ..Response::ok()
            },

            Request::GetFieldMappings => match serde_json::to_value(filler.get_field_mappings()) {
                Ok(mappings) => Response {
                    mappings: Some(mappings),
                    ..Response::ok()
                },
                Err(e) => Response::error(format!("Could not serialize mappings: {}", e)),
            },

            Request::HighlightUnfilledFields => {
                let result = filler.highlight_unfilled_fields(document);
                logger.info(&format!("Highlighted {} fields", result.highlighted_count));
                Response {
                    success: result.success,
                    highlighted_count: Some(result.highlighted_count),
                    ..Response::default()
                }
            }

            Request::RemoveHighlights => {
                let result = filler.remove_highlights(document);
                Response {
                    success: result.success,
                    removed_count: Some(result.removed_count),
                    ..Response::default()
                }
            }
        }
    }
}
