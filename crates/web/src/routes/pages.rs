//! Static informational pages.

use askama::Template;
use askama_web::WebTemplate;

use crate::filters;
use crate::middleware::OptionalIdentity;

/// Privacy policy template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/privacy.html")]
pub struct PrivacyTemplate {
    pub signed_in: bool,
}

/// Terms of service template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/tos.html")]
pub struct TermsTemplate {
    pub signed_in: bool,
}

/// Data deletion instructions template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/deletion.html")]
pub struct DeletionTemplate {
    pub signed_in: bool,
}

/// Display the privacy policy.
pub async fn privacy(OptionalIdentity(identity): OptionalIdentity) -> PrivacyTemplate {
    PrivacyTemplate {
        signed_in: identity.is_some(),
    }
}

/// Display the terms of service.
pub async fn tos(OptionalIdentity(identity): OptionalIdentity) -> TermsTemplate {
    TermsTemplate {
        signed_in: identity.is_some(),
    }
}

/// Display how to have account data deleted.
pub async fn deletion(OptionalIdentity(identity): OptionalIdentity) -> DeletionTemplate {
    DeletionTemplate {
        signed_in: identity.is_some(),
    }
}
