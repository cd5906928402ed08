//! Localization collaborator.
//!
//! Specification documents name the fields whose display strings must be
//! localized; the mechanics live with the host. The engine only calls
//! [`Localizer::translate`] for those fields, with its configured text
//! domain.

/// Translates display strings into the active locale.
pub trait Localizer {
    fn translate(&self, text: &str, domain: &str) -> String;
}

/// Identity localizer for hosts without translation.
pub struct NoLocalization;

impl Localizer for NoLocalization {
    fn translate(&self, text: &str, _domain: &str) -> String {
        text.to_string()
    }
}
