use crate::appointment::AppointmentDraft;

/// The appointment form, reduced to a single request/response exchange:
/// show the form (optionally pre-filled), get back a draft or a
/// cancellation (`None`). No intermediate edit events.
pub trait InputPort {
    fn request(
        &mut self,
        initial: Option<AppointmentDraft>,
    ) -> anyhow::Result<Option<AppointmentDraft>>;
}

/// Form values taken from command-line arguments. Fields left blank fall
/// back to the pre-filled values; a blank title after that is a validation
/// error, not a cancellation.
#[derive(Debug, Clone)]
pub struct ArgsInput {
    title: String,
    description: String,
}

impl ArgsInput {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

impl InputPort for ArgsInput {
    fn request(
        &mut self,
        initial: Option<AppointmentDraft>,
    ) -> anyhow::Result<Option<AppointmentDraft>> {
        let (initial_title, initial_description) = initial
            .map(|draft| (draft.title, draft.description))
            .unwrap_or_default();

        let title = if self.title.trim().is_empty() {
            initial_title
        } else {
            self.title.clone()
        };
        let description = if self.description.is_empty() {
            initial_description
        } else {
            self.description.clone()
        };

        AppointmentDraft::new(title, description).map(Some)
    }
}
