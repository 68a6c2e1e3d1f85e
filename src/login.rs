use std::collections::BTreeMap;

use scraper::Html;
use tracing::{debug, info, warn};

use crate::{
    selector, session::Session, Result, LOGIN_FORM, LOGIN_PATH, SUBMIT_FIELD, SUBMIT_VALUE,
};

/// Credential values written into whichever form fields look like username/password.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// The login form as it will be posted.
///
/// Every input found on the page is kept as-is (hidden view-state tokens and the like have
/// names that change between deployments), then the credentials are laid over the fields
/// whose names mention `UserName` or `Password`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    fields: BTreeMap<String, String>,
}

impl LoginForm {
    pub fn from_page(html: &str, credentials: Credentials<'_>) -> Result<Self> {
        let doc = Html::parse_document(html);
        let form_sel = selector(LOGIN_FORM)?;
        let input_sel = selector("input")?;

        let mut fields = BTreeMap::new();
        fields.insert(SUBMIT_FIELD.to_string(), SUBMIT_VALUE.to_string());

        let Some(form) = doc.select(&form_sel).next() else {
            warn!("login form {LOGIN_FORM} not found, posting submit marker only");
            return Ok(Self { fields });
        };

        for input in form.select(&input_sel) {
            let el = input.value();
            if el.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("submit")) {
                continue;
            }
            let Some(name) = el.attr("name") else {
                continue;
            };
            let value = if name.contains("UserName") {
                credentials.username
            } else if name.contains("Password") {
                credentials.password
            } else if let Some(default) = el.attr("value") {
                default
            } else {
                // No default value, so nothing to send (an unticked checkbox stays unticked).
                continue;
            };
            fields.insert(name.to_string(), value.to_string());
        }
        debug!(fields = fields.len(), "login form assembled");
        Ok(Self { fields })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

/// Fetches the login page, fills in the form and posts it back.
/// Returns the body of the page the site lands on; login success is not checked here.
pub fn login(session: &Session, credentials: Credentials<'_>) -> Result<String> {
    info!("fetching login page");
    let page = session.get(LOGIN_PATH)?;
    let form = LoginForm::from_page(&page, credentials)?;
    info!("submitting login form");
    session.post_form(LOGIN_PATH, form.fields())
}
